//! Command-level tests with an in-memory transport.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use formsynth::{read_document, write_document, FormResult, FormTransport, LocatorConfig};
use formsynth_cli::commands;
use formsynth_cli::{DocumentPaths, SubmitTally};

// ─────────────────────── helpers ───────────────────────

/// Serves one page and answers posts from a fixed status list.
struct FakeTransport {
    page: String,
    statuses: Mutex<Vec<u16>>,
    posts: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeTransport {
    fn new(page: &str, statuses: &[u16]) -> Self {
        Self {
            page: page.to_string(),
            statuses: Mutex::new(statuses.iter().rev().copied().collect()),
            posts: Mutex::new(Vec::new()),
        }
    }

    fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormTransport for FakeTransport {
    async fn fetch(&self, _url: &str) -> FormResult<String> {
        Ok(self.page.clone())
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> FormResult<u16> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), fields.to_vec()));
        Ok(self.statuses.lock().unwrap().pop().unwrap_or(200))
    }
}

const FORM_URL: &str = "https://docs.google.com/forms/d/e/XYZ/viewform";

fn page() -> String {
    let blob = json!([
        null,
        [
            "",
            [
                [1, "Name", null, 0, [[10]]],
                [2, "Color", null, 2, [[20, [["Red"], ["Blue"]]]]]
            ]
        ]
    ]);
    format!("<html><script>var FB_PUBLIC_LOAD_DATA_ = {blob};</script></html>")
}

fn paths(dir: &tempfile::TempDir) -> DocumentPaths {
    DocumentPaths {
        schema: dir.path().join("data.json"),
        rules: dir.path().join("responses.json"),
    }
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn extract_writes_schema_and_template() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let transport = FakeTransport::new(&page(), &[]);

    let schema = commands::extract(&transport, FORM_URL, &paths, &LocatorConfig::default())
        .await
        .unwrap();
    assert_eq!(schema.len(), 2);

    let saved: Value = read_document(&paths.schema).unwrap();
    assert_eq!(
        saved,
        json!({
            "Name": { "id": "entry.10", "type": 0, "options": [] },
            "Color": { "id": "entry.20", "type": 2, "options": ["Red", "Blue"] }
        })
    );
    let rules: Value = read_document(&paths.rules).unwrap();
    assert_eq!(
        rules,
        json!({ "Name": "random_text", "Color": { "Red": 0.0, "Blue": 0.0 } })
    );
}

#[tokio::test]
async fn failed_extraction_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let transport = FakeTransport::new("<html><body>gone</body></html>", &[]);

    let result = commands::extract(&transport, FORM_URL, &paths, &LocatorConfig::default()).await;
    assert!(result.is_err());
    assert!(!paths.schema.exists());
    assert!(!paths.rules.exists());
}

#[test]
fn template_keeps_hand_edited_rules() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    write_document(
        &paths.schema,
        &json!({ "Name": { "id": "entry.10", "type": 0, "options": [] } }),
    )
    .unwrap();

    assert!(commands::template(&paths).unwrap());
    write_document(&paths.rules, &json!({ "Name": "fixed:Grace" })).unwrap();
    assert!(!commands::template(&paths).unwrap());

    let rules: Value = read_document(&paths.rules).unwrap();
    assert_eq!(rules, json!({ "Name": "fixed:Grace" }));
}

#[test]
fn generate_prints_one_line_per_payload() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    write_document(
        &paths.schema,
        &json!({ "Age": { "id": "entry.3", "type": 0, "options": [] } }),
    )
    .unwrap();
    write_document(&paths.rules, &json!({ "Age": "random_int:7-7" })).unwrap();

    let mut out = Vec::new();
    commands::generate(&paths, 3, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().collect::<Vec<_>>(), vec![r#"{"entry.3":"7"}"#; 3]);
}

#[tokio::test]
async fn submit_counts_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let transport = FakeTransport::new(&page(), &[200, 500, 200]);
    commands::extract(&transport, FORM_URL, &paths, &LocatorConfig::default())
        .await
        .unwrap();
    write_document(
        &paths.rules,
        &json!({ "Name": "fixed:Bob", "Color": { "Red": 0.0, "Blue": 2.0 } }),
    )
    .unwrap();

    let tally = commands::submit(&transport, FORM_URL, &paths, 3, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(
        tally,
        SubmitTally {
            accepted: 2,
            rejected: 1
        }
    );

    let posts = transport.posts();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].0, "https://docs.google.com/forms/d/e/XYZ/formResponse");
    assert_eq!(
        posts[0].1,
        vec![
            ("entry.10".to_string(), "Bob".to_string()),
            ("entry.20".to_string(), "Blue".to_string()),
        ]
    );
}

#[tokio::test]
async fn submit_stops_before_posting_on_bad_rules() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    let transport = FakeTransport::new(&page(), &[]);
    commands::extract(&transport, FORM_URL, &paths, &LocatorConfig::default())
        .await
        .unwrap();
    write_document(&paths.rules, &json!({ "Name": "random_text" })).unwrap();

    let result = commands::submit(&transport, FORM_URL, &paths, 2, Duration::ZERO).await;
    assert!(result.is_err());
    assert!(transport.posts().is_empty());
}

#[test]
fn generate_names_every_uncovered_label() {
    let dir = tempfile::tempdir().unwrap();
    let paths = paths(&dir);
    write_document(
        &paths.schema,
        &json!({
            "Name": { "id": "entry.1", "type": 0, "options": [] },
            "Email": { "id": "entry.2", "type": 0, "options": [] },
            "Color": { "id": "entry.3", "type": 2, "options": ["Red"] }
        }),
    )
    .unwrap();
    write_document(&paths.rules, &json!({ "Name": "random_text" })).unwrap();

    let err = commands::generate_one(&paths).unwrap_err().to_string();
    assert!(err.contains("Email, Color"), "{err}");
}
