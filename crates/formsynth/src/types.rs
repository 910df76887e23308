//! Core data types for form schemas, payloads, and errors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One question of a form, as needed to answer it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSchema {
    /// Payload key on submission, `entry.<digits>`.
    #[serde(rename = "id")]
    pub field_id: String,
    /// Raw question type code, carried through unchanged.
    #[serde(rename = "type")]
    pub question_type: i64,
    /// Declared option labels in form order. Empty for free-text questions.
    #[serde(default)]
    pub options: Vec<String>,
}

impl QuestionSchema {
    /// Interpret the raw type code.
    pub fn kind(&self) -> QuestionKind {
        QuestionKind::from_code(self.question_type)
    }

    /// Whether the question offers a fixed option set.
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }
}

/// The closed set of question type codes a form declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    ShortText,
    Paragraph,
    MultipleChoice,
    Checkboxes,
    Dropdown,
    LinearScale,
    Other(i64),
}

impl QuestionKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::ShortText,
            1 => Self::Paragraph,
            2 => Self::MultipleChoice,
            3 => Self::Checkboxes,
            4 => Self::Dropdown,
            5 => Self::LinearScale,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::ShortText => 0,
            Self::Paragraph => 1,
            Self::MultipleChoice => 2,
            Self::Checkboxes => 3,
            Self::Dropdown => 4,
            Self::LinearScale => 5,
            Self::Other(code) => code,
        }
    }
}

/// Extracted form structure, keyed by question label in source order.
///
/// Serialises as the persisted schema document:
/// `label -> {"id": ..., "type": ..., "options": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSchema {
    questions: IndexMap<String, QuestionSchema>,
}

impl FormSchema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a question. A repeated label replaces the earlier question
    /// in place and returns it.
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        question: QuestionSchema,
    ) -> Option<QuestionSchema> {
        self.questions.insert(label.into(), question)
    }

    /// Look up a question by label.
    pub fn get(&self, label: &str) -> Option<&QuestionSchema> {
        self.questions.get(label)
    }

    /// Iterate `(label, question)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QuestionSchema)> {
        self.questions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Question labels in source order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.questions.keys().map(String::as_str)
    }

    /// Return the number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// One concrete set of answers, keyed by field identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload {
    fields: IndexMap<String, String>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field_id.into(), value.into());
    }

    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten into form-encodable `(name, value)` pairs.
    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Errors that can occur while extracting, generating, or submitting.
#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("No script contains the schema marker '{marker}'")]
    SchemaSourceNotFound { marker: String },

    #[error("Schema marker '{marker}' found but no array literal is assigned to it")]
    MalformedSchemaSource { marker: String },

    #[error("Schema source is not valid structured data: {0}")]
    SchemaSourceInvalid(#[source] serde_json::Error),

    #[error("Malformed rule for '{label}': {rule:?}")]
    RuleSyntax { label: String, rule: String },

    #[error("Invalid weight {weight} for option '{option}' of '{label}'")]
    InvalidWeight {
        label: String,
        option: String,
        weight: f64,
    },

    #[error("Weighted rule for '{label}' has no options")]
    EmptyOptions { label: String },

    #[error("No rule configured for question '{label}'")]
    MissingRule { label: String },

    #[error("Not a form view URL: {0}")]
    InvalidFormUrl(String),

    #[error("Form page request failed with status {status}")]
    FetchStatus { status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type FormResult<T> = Result<T, FormError>;
