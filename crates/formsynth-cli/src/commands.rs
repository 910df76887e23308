//! Subcommand implementations.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use formsynth::{
    fetch_schema, generate_payload, read_document, submit_payload, write_document,
    write_document_if_absent, FormSchema, FormTransport, LocatorConfig, Payload, RuleConfig,
    SubmitOutcome,
};

/// Where the schema and rules documents live.
#[derive(Debug, Clone)]
pub struct DocumentPaths {
    pub schema: PathBuf,
    pub rules: PathBuf,
}

impl DocumentPaths {
    pub fn load_schema(&self) -> Result<FormSchema> {
        read_document(&self.schema)
            .with_context(|| format!("read schema {}", self.schema.display()))
    }

    /// Read and parse the rules document. Called before every generation
    /// so edits made between submissions take effect.
    pub fn load_rules(&self) -> Result<RuleConfig> {
        read_document(&self.rules).with_context(|| format!("read rules {}", self.rules.display()))
    }

    /// Write a rules template for `schema` unless a rules file exists.
    pub fn ensure_template(&self, schema: &FormSchema) -> Result<bool> {
        let created = write_document_if_absent(&self.rules, &RuleConfig::template(schema))
            .with_context(|| format!("write rules template {}", self.rules.display()))?;
        if created {
            tracing::info!("created rules template {}", self.rules.display());
        } else {
            tracing::info!("keeping existing rules {}", self.rules.display());
        }
        Ok(created)
    }
}

/// Fetch the form, persist its schema, and seed a rules template.
pub async fn extract<T: FormTransport + ?Sized>(
    transport: &T,
    form_url: &str,
    paths: &DocumentPaths,
    locator: &LocatorConfig,
) -> Result<FormSchema> {
    let schema = fetch_schema(transport, form_url, locator)
        .await
        .with_context(|| format!("extract schema from {form_url}"))?;
    write_document(&paths.schema, &schema)
        .with_context(|| format!("write schema {}", paths.schema.display()))?;
    tracing::info!(
        "saved {} questions to {}",
        schema.len(),
        paths.schema.display()
    );
    paths.ensure_template(&schema)?;
    Ok(schema)
}

/// Seed a rules template from the stored schema.
pub fn template(paths: &DocumentPaths) -> Result<bool> {
    let schema = paths.load_schema()?;
    paths.ensure_template(&schema)
}

/// Generate one payload from freshly read documents.
pub fn generate_one(paths: &DocumentPaths) -> Result<Payload> {
    let schema = paths.load_schema()?;
    let rules = paths.load_rules()?;
    let missing = rules.missing_labels(&schema);
    if !missing.is_empty() {
        bail!(
            "{} has no rule for: {}",
            paths.rules.display(),
            missing.join(", ")
        );
    }
    let payload = generate_payload(&schema, &rules).context("generate payload")?;
    Ok(payload)
}

/// Print `count` payloads as JSON lines.
pub fn generate<W: Write>(paths: &DocumentPaths, count: u32, out: &mut W) -> Result<()> {
    for _ in 0..count {
        let payload = generate_one(paths)?;
        writeln!(out, "{}", serde_json::to_string(&payload)?)?;
    }
    Ok(())
}

/// Counts of submissions the server answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitTally {
    pub accepted: u32,
    pub rejected: u32,
}

/// Generate and submit `count` payloads, one after another.
///
/// Stops at the first generation or transport error; rejected submissions
/// are counted and the run continues.
pub async fn submit<T: FormTransport + ?Sized>(
    transport: &T,
    form_url: &str,
    paths: &DocumentPaths,
    count: u32,
    delay: Duration,
) -> Result<SubmitTally> {
    let mut tally = SubmitTally::default();
    for i in 0..count {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let payload = generate_one(paths)?;
        tracing::debug!("submission {}/{count}: {} fields", i + 1, payload.len());

        match submit_payload(transport, form_url, &payload)
            .await
            .with_context(|| format!("submit response {}", i + 1))?
        {
            SubmitOutcome::Accepted => tally.accepted += 1,
            SubmitOutcome::Rejected { .. } => tally.rejected += 1,
        }
    }
    tracing::info!(
        "{} accepted, {} rejected",
        tally.accepted,
        tally.rejected
    );
    Ok(tally)
}
