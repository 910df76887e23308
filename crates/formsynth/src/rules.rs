//! Human-authored generation rules, one per question label.
//!
//! The rules document is a JSON object whose values are either an
//! `option -> weight` object or a rule string (`random_text`,
//! `random_int:<low>-<high>`, `fixed:<literal>`). Every value is parsed
//! into a [`Rule`] once, when the document is loaded.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::types::{FormError, FormResult, FormSchema};

const RANDOM_TEXT: &str = "random_text";
const RANDOM_INT_PREFIX: &str = "random_int:";
const FIXED_PREFIX: &str = "fixed:";

/// How to produce one answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Pick one option, proportional to weight; uniform when all are zero.
    WeightedOptions(IndexMap<String, f64>),
    /// Uniform integer in `[low, high]`.
    RandomInt { low: i64, high: i64 },
    /// Twelve random ASCII letters.
    RandomText,
    /// The literal, verbatim.
    Fixed { literal: String },
    /// Any other document value. Answers with the empty string; the
    /// original value is kept so the document round-trips.
    Unrecognized(Value),
}

impl Rule {
    /// Parse a single document value.
    pub fn parse(label: &str, value: &Value) -> FormResult<Self> {
        match value {
            Value::Object(map) => parse_weights(label, map),
            Value::String(rule) => parse_rule_string(label, rule),
            other => {
                tracing::warn!("rule for '{label}' is not an object or string; answering blank");
                Ok(Self::Unrecognized(other.clone()))
            }
        }
    }

    /// Render back into the document form.
    pub fn to_value(&self) -> Value {
        match self {
            Self::WeightedOptions(weights) => Value::Object(
                weights
                    .iter()
                    .map(|(option, w)| {
                        let n = Number::from_f64(*w).unwrap_or_else(|| Number::from(0));
                        (option.clone(), Value::Number(n))
                    })
                    .collect::<Map<String, Value>>(),
            ),
            Self::RandomInt { low, high } => {
                Value::String(format!("{RANDOM_INT_PREFIX}{low}-{high}"))
            }
            Self::RandomText => Value::String(RANDOM_TEXT.to_string()),
            Self::Fixed { literal } => Value::String(format!("{FIXED_PREFIX}{literal}")),
            Self::Unrecognized(value) => value.clone(),
        }
    }
}

fn parse_weights(label: &str, map: &Map<String, Value>) -> FormResult<Rule> {
    if map.is_empty() {
        return Err(FormError::EmptyOptions {
            label: label.to_string(),
        });
    }

    let mut weights = IndexMap::with_capacity(map.len());
    for (option, raw) in map {
        let weight = raw.as_f64().ok_or_else(|| FormError::RuleSyntax {
            label: label.to_string(),
            rule: format!("{option}: {raw}"),
        })?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(FormError::InvalidWeight {
                label: label.to_string(),
                option: option.clone(),
                weight,
            });
        }
        weights.insert(option.clone(), weight);
    }
    Ok(Rule::WeightedOptions(weights))
}

fn int_range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(-?\d+)\s*-\s*(-?\d+)\s*$").expect("valid regex")
    })
}

fn parse_rule_string(label: &str, rule: &str) -> FormResult<Rule> {
    if rule == RANDOM_TEXT {
        return Ok(Rule::RandomText);
    }
    if let Some(literal) = rule.strip_prefix(FIXED_PREFIX) {
        return Ok(Rule::Fixed {
            literal: literal.to_string(),
        });
    }
    if let Some(range) = rule.strip_prefix(RANDOM_INT_PREFIX) {
        let syntax_error = || FormError::RuleSyntax {
            label: label.to_string(),
            rule: rule.to_string(),
        };
        let caps = int_range_pattern()
            .captures(range)
            .ok_or_else(syntax_error)?;
        let low: i64 = caps[1].parse().map_err(|_| syntax_error())?;
        let high: i64 = caps[2].parse().map_err(|_| syntax_error())?;
        if low > high {
            return Err(syntax_error());
        }
        return Ok(Rule::RandomInt { low, high });
    }

    tracing::warn!("unrecognised rule '{rule}' for '{label}'; answering blank");
    Ok(Rule::Unrecognized(Value::String(rule.to_string())))
}

/// Parsed rules document, keyed by question label in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, Value>",
    into = "IndexMap<String, Value>"
)]
pub struct RuleConfig {
    rules: IndexMap<String, Rule>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default rules for a schema: zero weight for every option of a choice
    /// question, `random_text` for everything else.
    pub fn template(schema: &FormSchema) -> Self {
        let rules = schema
            .iter()
            .map(|(label, question)| {
                let rule = if question.has_options() {
                    Rule::WeightedOptions(
                        question
                            .options
                            .iter()
                            .map(|option| (option.clone(), 0.0))
                            .collect(),
                    )
                } else {
                    Rule::RandomText
                };
                (label.to_string(), rule)
            })
            .collect();
        Self { rules }
    }

    /// Parse a rules document value.
    pub fn from_document(doc: &Value) -> FormResult<Self> {
        let map: IndexMap<String, Value> = serde_json::from_value(doc.clone())?;
        Self::try_from(map)
    }

    pub fn insert(&mut self, label: impl Into<String>, rule: Rule) {
        self.rules.insert(label.into(), rule);
    }

    pub fn get(&self, label: &str) -> Option<&Rule> {
        self.rules.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Schema labels that have no rule.
    pub fn missing_labels<'a>(&self, schema: &'a FormSchema) -> Vec<&'a str> {
        schema
            .labels()
            .filter(|label| !self.rules.contains_key(*label))
            .collect()
    }
}

impl TryFrom<IndexMap<String, Value>> for RuleConfig {
    type Error = FormError;

    fn try_from(doc: IndexMap<String, Value>) -> FormResult<Self> {
        let rules = doc
            .iter()
            .map(|(label, value)| {
                let rule = Rule::parse(label, value)?;
                Ok::<_, FormError>((label.clone(), rule))
            })
            .collect::<FormResult<IndexMap<_, _>>>()?;
        Ok(Self { rules })
    }
}

impl From<RuleConfig> for IndexMap<String, Value> {
    fn from(config: RuleConfig) -> Self {
        config
            .rules
            .iter()
            .map(|(label, rule)| (label.clone(), rule.to_value()))
            .collect()
    }
}
