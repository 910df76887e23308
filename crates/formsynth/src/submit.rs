//! Post a payload to the form's response endpoint.

use url::Url;

use crate::http_client::FormTransport;
use crate::types::{FormError, FormResult, Payload};

const VIEW_SEGMENT: &str = "viewform";
const RESPONSE_SEGMENT: &str = "formResponse";

/// Result of a submission that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { status: u16 },
}

impl SubmitOutcome {
    pub fn from_status(status: u16) -> Self {
        if status == 200 {
            Self::Accepted
        } else {
            Self::Rejected { status }
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Map a form view URL to its submission endpoint.
///
/// The final `viewform` path segment becomes `formResponse`; query and
/// fragment are dropped. A URL that already ends in `formResponse` is
/// accepted unchanged.
pub fn response_endpoint(form_url: &str) -> FormResult<String> {
    let invalid = || FormError::InvalidFormUrl(form_url.to_string());
    let mut url = Url::parse(form_url).map_err(|_| invalid())?;

    let last = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .ok_or_else(invalid)?;
    if last != VIEW_SEGMENT && last != RESPONSE_SEGMENT {
        return Err(invalid());
    }

    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .pop()
        .push(RESPONSE_SEGMENT);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Submit one payload for the form at `form_url`.
///
/// Non-200 statuses come back as [`SubmitOutcome::Rejected`]; only transport
/// failures are errors.
pub async fn submit_payload<T: FormTransport + ?Sized>(
    transport: &T,
    form_url: &str,
    payload: &Payload,
) -> FormResult<SubmitOutcome> {
    let endpoint = response_endpoint(form_url)?;
    let status = transport
        .post_form(&endpoint, &payload.to_form_fields())
        .await?;

    let outcome = SubmitOutcome::from_status(status);
    match outcome {
        SubmitOutcome::Accepted => tracing::info!("response submitted to {endpoint}"),
        SubmitOutcome::Rejected { status } => {
            tracing::warn!("submission to {endpoint} failed with status {status}")
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_url_maps_to_response_endpoint() {
        assert_eq!(
            response_endpoint("https://docs.google.com/forms/d/e/ABC123/viewform?usp=sf_link")
                .unwrap(),
            "https://docs.google.com/forms/d/e/ABC123/formResponse"
        );
        assert_eq!(
            response_endpoint("https://docs.google.com/forms/d/e/ABC123/viewform/").unwrap(),
            "https://docs.google.com/forms/d/e/ABC123/formResponse"
        );
    }

    #[test]
    fn test_response_endpoint_is_idempotent() {
        let url = "https://docs.google.com/forms/d/e/ABC123/formResponse";
        assert_eq!(response_endpoint(url).unwrap(), url);
    }

    #[test]
    fn test_non_form_urls_rejected() {
        for bad in [
            "not a url",
            "https://docs.google.com/forms/d/e/ABC123/edit",
            "https://example.com/",
        ] {
            assert!(
                matches!(response_endpoint(bad), Err(FormError::InvalidFormUrl(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_outcome_from_status() {
        assert!(SubmitOutcome::from_status(200).is_accepted());
        assert_eq!(
            SubmitOutcome::from_status(400),
            SubmitOutcome::Rejected { status: 400 }
        );
        assert!(!SubmitOutcome::from_status(204).is_accepted());
    }
}
