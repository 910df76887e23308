//! Locate the embedded schema blob inside raw form markup.
//!
//! The form page ships its structure as a JavaScript assignment
//! `FB_PUBLIC_LOAD_DATA_ = [...];` inside an inline `<script>`. Scripts are
//! pulled out with `scraper`; the array literal is then cut out by a
//! bracket-matching scan so that brackets inside string literals do not end
//! it early.

use regex::Regex;
use scraper::{Html, Selector};

use crate::types::{FormError, FormResult};

/// Marker the form page assigns its load data to.
pub const DEFAULT_MARKER: &str = "FB_PUBLIC_LOAD_DATA_";

/// Settings for blob location.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub marker: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// Return the text content of every `<script>` element, in document order.
pub fn script_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("script").expect("valid selector");
    document
        .select(&sel)
        .map(|el| el.text().collect::<String>())
        .collect()
}

/// Find the array literal assigned to the marker in the first script that
/// mentions it.
pub fn locate_schema_source(html: &str, config: &LocatorConfig) -> FormResult<String> {
    let script = script_texts(html)
        .into_iter()
        .find(|text| text.contains(&config.marker))
        .ok_or_else(|| FormError::SchemaSourceNotFound {
            marker: config.marker.clone(),
        })?;

    extract_assigned_array(&script, &config.marker)
        .map(str::to_string)
        .ok_or_else(|| FormError::MalformedSchemaSource {
            marker: config.marker.clone(),
        })
}

/// Slice out `[ ... ]` following `<marker> =` in a script body.
fn extract_assigned_array<'a>(script: &'a str, marker: &str) -> Option<&'a str> {
    let re = Regex::new(&format!(r"{}\s*=\s*\[", regex::escape(marker))).ok()?;
    let m = re.find(script)?;
    let start = m.end() - 1;
    let end = matching_bracket(&script[start..])?;
    Some(&script[start..start + end + 1])
}

/// Byte offset of the `]` closing the `[` at offset 0.
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => in_string = Some(c),
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
