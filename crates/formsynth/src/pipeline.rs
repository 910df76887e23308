//! End-to-end steps composed from the individual modules.

use crate::extract::extract_schema;
use crate::http_client::FormTransport;
use crate::locator::{locate_schema_source, LocatorConfig};
use crate::types::{FormResult, FormSchema};

/// Extract a schema from already-fetched form markup.
pub fn schema_from_html(html: &str, config: &LocatorConfig) -> FormResult<FormSchema> {
    let source = locate_schema_source(html, config)?;
    extract_schema(&source)
}

/// Fetch the form page at `form_url` and extract its schema.
pub async fn fetch_schema<T: FormTransport + ?Sized>(
    transport: &T,
    form_url: &str,
    config: &LocatorConfig,
) -> FormResult<FormSchema> {
    tracing::info!("fetching form {form_url}");
    let html = transport.fetch(form_url).await?;
    schema_from_html(&html, config)
}
