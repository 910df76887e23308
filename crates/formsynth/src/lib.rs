//! formsynth: survey form schema extraction and rule-driven synthetic
//! response generation.

pub mod extract;
pub mod generator;
pub mod http_client;
pub mod locator;
pub mod pipeline;
pub mod rules;
pub mod storage;
pub mod submit;
pub mod types;

pub use extract::{extract_schema, ExtractionSkip};
pub use generator::{generate_payload, generate_payload_with};
pub use http_client::{FormTransport, HttpClient};
pub use locator::{locate_schema_source, LocatorConfig, DEFAULT_MARKER};
pub use pipeline::{fetch_schema, schema_from_html};
pub use rules::{Rule, RuleConfig};
pub use storage::{read_document, write_document, write_document_if_absent};
pub use submit::{response_endpoint, submit_payload, SubmitOutcome};
pub use types::*;
