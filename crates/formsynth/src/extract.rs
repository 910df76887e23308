//! Turn the decoded load-data blob into a typed [`FormSchema`].
//!
//! The blob is a positionally-typed nested array. All index knowledge lives
//! in the accessor functions below; the extraction logic only ever asks for
//! named parts and gets `None` when a part is absent or has the wrong shape.

use serde_json::Value;

use crate::types::{FormError, FormResult, FormSchema, QuestionSchema};

/// Why a question entry produced no schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSkip {
    /// Absent or not list-shaped (layout items, nulls).
    NotAnEntry,
    MissingLabel,
    MissingType,
    /// No answer metadata block, so nothing can be submitted for it.
    NoAnswerBlock,
    MissingFieldId,
}

/// A successfully extracted question and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuestion {
    pub label: String,
    pub question: QuestionSchema,
}

// ── Accessors ──

/// `root[1][1]`: the list of question entries.
pub fn question_entries(root: &Value) -> Option<&Vec<Value>> {
    root.get(1)?.get(1)?.as_array()
}

/// `entry[1]`: the question text.
pub fn question_text(entry: &Value) -> Option<&str> {
    entry
        .get(1)?
        .as_str()
        .filter(|text| !text.trim().is_empty())
}

/// `entry[3]`: the question type code.
pub fn question_type(entry: &Value) -> Option<i64> {
    entry.get(3)?.as_i64()
}

/// `entry[4][0]`: the first answer descriptor, present only when the
/// metadata block is a non-empty list.
pub fn answer_descriptor(entry: &Value) -> Option<&Vec<Value>> {
    entry.get(4)?.as_array()?.first()?.as_array()
}

/// `descriptor[0]`: the numeric entry id, rendered as a payload key.
pub fn field_id(descriptor: &[Value]) -> Option<String> {
    let digits = match descriptor.first()? {
        Value::Number(n) => {
            let id = n.as_u64()?;
            if id == 0 {
                return None;
            }
            id.to_string()
        }
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s.clone(),
        _ => return None,
    };
    Some(format!("entry.{digits}"))
}

/// `descriptor[1][*][0]`: option labels in declared order.
pub fn option_labels(descriptor: &[Value]) -> Vec<String> {
    let Some(items) = descriptor.get(1).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_array()?.first().and_then(option_label))
        .collect()
}

fn option_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ── Extraction ──

/// Extract one question entry.
pub fn extract_question(entry: &Value) -> Result<ExtractedQuestion, ExtractionSkip> {
    if !entry.is_array() {
        return Err(ExtractionSkip::NotAnEntry);
    }
    let label = question_text(entry).ok_or(ExtractionSkip::MissingLabel)?;
    let question_type = question_type(entry).ok_or(ExtractionSkip::MissingType)?;
    let descriptor = answer_descriptor(entry).ok_or(ExtractionSkip::NoAnswerBlock)?;
    let field_id = field_id(descriptor).ok_or(ExtractionSkip::MissingFieldId)?;

    Ok(ExtractedQuestion {
        label: label.to_string(),
        question: QuestionSchema {
            field_id,
            question_type,
            options: option_labels(descriptor),
        },
    })
}

/// Run [`extract_question`] over every entry of a decoded blob.
pub fn extract_entries(root: &Value) -> Vec<Result<ExtractedQuestion, ExtractionSkip>> {
    question_entries(root)
        .map(|entries| entries.iter().map(extract_question).collect())
        .unwrap_or_default()
}

/// Build a schema from a decoded blob, dropping skipped entries.
pub fn schema_from_value(root: &Value) -> FormSchema {
    if question_entries(root).is_none() {
        tracing::warn!("load data has no question list; schema is empty");
    }

    let mut schema = FormSchema::new();
    let mut skipped = 0usize;
    for (index, result) in extract_entries(root).into_iter().enumerate() {
        match result {
            Ok(ExtractedQuestion { label, question }) => {
                tracing::debug!(
                    "question '{label}' -> {} ({:?}, {} options)",
                    question.field_id,
                    question.kind(),
                    question.options.len()
                );
                if let Some(previous) = schema.insert(label.clone(), question) {
                    tracing::debug!(
                        "duplicate label '{label}': {} replaced by later entry",
                        previous.field_id
                    );
                }
            }
            Err(reason) => {
                skipped += 1;
                tracing::debug!("skipping entry {index}: {reason:?}");
            }
        }
    }

    tracing::info!(
        "extracted {} questions ({skipped} entries skipped)",
        schema.len()
    );
    schema
}

/// Decode the array literal text and extract its schema.
pub fn extract_schema(source: &str) -> FormResult<FormSchema> {
    let root: Value = serde_json::from_str(source).map_err(FormError::SchemaSourceInvalid)?;
    Ok(schema_from_value(&root))
}
