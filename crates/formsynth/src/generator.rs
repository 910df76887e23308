//! Resolve a [`RuleConfig`] against a [`FormSchema`] into one [`Payload`].

use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::rules::{Rule, RuleConfig};
use crate::types::{FormError, FormResult, FormSchema, Payload};

/// Length of generated free-text answers.
pub const RANDOM_TEXT_LEN: usize = 12;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate one payload using the thread-local RNG.
pub fn generate_payload(schema: &FormSchema, rules: &RuleConfig) -> FormResult<Payload> {
    generate_payload_with(schema, rules, &mut rand::thread_rng())
}

/// Generate one payload, drawing from `rng`.
///
/// Every schema question must have a rule; the first one without aborts the
/// whole payload with [`FormError::MissingRule`]. Rules for labels the
/// schema does not have are ignored.
pub fn generate_payload_with<R: Rng + ?Sized>(
    schema: &FormSchema,
    rules: &RuleConfig,
    rng: &mut R,
) -> FormResult<Payload> {
    let mut payload = Payload::new();
    for (label, question) in schema.iter() {
        let rule = rules.get(label).ok_or_else(|| FormError::MissingRule {
            label: label.to_string(),
        })?;
        let value = resolve_rule(label, rule, rng)?;
        payload.insert(question.field_id.clone(), value);
    }
    Ok(payload)
}

/// Produce one answer for one rule.
pub fn resolve_rule<R: Rng + ?Sized>(label: &str, rule: &Rule, rng: &mut R) -> FormResult<String> {
    match rule {
        Rule::WeightedOptions(weights) => weighted_choice(label, weights, rng),
        Rule::RandomInt { low, high } => {
            if low > high {
                return Err(FormError::RuleSyntax {
                    label: label.to_string(),
                    rule: format!("random_int:{low}-{high}"),
                });
            }
            Ok(rng.gen_range(*low..=*high).to_string())
        }
        Rule::RandomText => Ok(random_text(rng, RANDOM_TEXT_LEN)),
        Rule::Fixed { literal } => Ok(literal.clone()),
        Rule::Unrecognized(_) => Ok(String::new()),
    }
}

/// Pick one option key. All-zero weights fall back to a uniform pick.
pub fn weighted_choice<R: Rng + ?Sized>(
    label: &str,
    weights: &IndexMap<String, f64>,
    rng: &mut R,
) -> FormResult<String> {
    if weights.is_empty() {
        return Err(FormError::EmptyOptions {
            label: label.to_string(),
        });
    }
    if let Some((option, &weight)) = weights
        .iter()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(FormError::InvalidWeight {
            label: label.to_string(),
            option: option.clone(),
            weight,
        });
    }

    let total: f64 = weights.values().sum();
    let index = if total == 0.0 {
        rng.gen_range(0..weights.len())
    } else {
        // Finite weights can still overflow when summed; rescale by the
        // largest so the proportions survive.
        let scale = if total.is_finite() {
            1.0
        } else {
            weights.values().copied().fold(0.0, f64::max)
        };
        let dist = WeightedIndex::new(weights.values().map(|w| w / scale)).map_err(|_| {
            FormError::InvalidWeight {
                label: label.to_string(),
                option: String::new(),
                weight: total,
            }
        })?;
        dist.sample(rng)
    };

    let (option, _) = weights
        .get_index(index)
        .ok_or_else(|| FormError::EmptyOptions {
            label: label.to_string(),
        })?;
    Ok(option.clone())
}

/// `len` letters drawn independently from `A-Z` and `a-z`.
pub fn random_text<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}
