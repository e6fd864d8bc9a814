//! Remote store client.
//!
//! The remote store is a single HTTP endpoint holding one JSON document: GET
//! returns the slide array (or nothing yet), POST replaces it. In practice it is
//! a Google Apps Script web app bound to a spreadsheet, which answers with a
//! login page instead of data when it was not deployed for anonymous access.

pub mod http;

use crate::deck::Slide;

pub use http::HttpStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no store endpoint configured")]
    EmptyEndpoint,

    #[error("could not reach the store: {0}")]
    Network(String),

    /// The endpoint answered with an HTML page (usually a sign-in page).
    #[error(
        "the store returned a web page instead of data; deploy the script as a web app with access set to \"Anyone\""
    )]
    AccessDenied,

    #[error("the store answered with HTTP {0}")]
    Http(u16),

    #[error("the store returned malformed data: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }
}

pub trait RemoteStore {
    /// Fetch the stored slides. An empty list means nothing was saved yet.
    fn load(&self, endpoint: &str) -> Result<Vec<Slide>, StoreError>;

    fn save(&self, endpoint: &str, slides: &[Slide]) -> Result<(), StoreError>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn load(&self, endpoint: &str) -> Result<Vec<Slide>, StoreError> {
        (**self).load(endpoint)
    }

    fn save(&self, endpoint: &str, slides: &[Slide]) -> Result<(), StoreError> {
        (**self).save(endpoint, slides)
    }
}

/// Trim an endpoint, failing before any network call when it is blank.
pub fn clean_endpoint(endpoint: &str) -> Result<&str, StoreError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        Err(StoreError::EmptyEndpoint)
    } else {
        Ok(trimmed)
    }
}

/// Classify a response from its status and declared content type, before the
/// body is looked at. HTML wins over the status code.
pub fn classify(status: u16, content_type: Option<&str>) -> Result<(), StoreError> {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return Err(StoreError::AccessDenied);
    }
    if !(200..300).contains(&status) {
        return Err(StoreError::Http(status));
    }
    Ok(())
}

/// Parse a load response body. Anything that is not a JSON array counts as
/// "no document yet".
pub fn parse_document(body: &str) -> Result<Vec<Slide>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| StoreError::Malformed(e.to_string()))?;
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| StoreError::Malformed(e.to_string()))
        }
        _ => Ok(Vec::new()),
    }
}

/// Check a save acknowledgement. The store replies with a small JSON object.
pub fn parse_ack(body: &str) -> Result<(), StoreError> {
    if body.trim().is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(body)
        .map(|_| ())
        .map_err(|e| StoreError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_is_access_denied_regardless_of_status() {
        for status in [200, 302, 401, 404, 500] {
            assert_eq!(
                classify(status, Some("text/html; charset=utf-8")),
                Err(StoreError::AccessDenied)
            );
        }
        assert_eq!(
            classify(200, Some("TEXT/HTML")),
            Err(StoreError::AccessDenied)
        );
    }

    #[test]
    fn test_non_2xx_json_is_http_error() {
        assert_eq!(
            classify(500, Some("application/json")),
            Err(StoreError::Http(500))
        );
        assert_eq!(classify(404, None), Err(StoreError::Http(404)));
    }

    #[test]
    fn test_2xx_json_is_ok() {
        assert_eq!(classify(200, Some("application/json")), Ok(()));
        assert_eq!(classify(204, None), Ok(()));
    }

    #[test]
    fn test_blank_endpoint() {
        assert_eq!(clean_endpoint("   "), Err(StoreError::EmptyEndpoint));
        assert_eq!(clean_endpoint(" https://x "), Ok("https://x"));
    }

    #[test]
    fn test_parse_document() {
        assert!(parse_document("").unwrap().is_empty());
        assert!(parse_document("[]").unwrap().is_empty());
        assert!(parse_document("null").unwrap().is_empty());
        assert!(parse_document(r#"{"result":"success"}"#).unwrap().is_empty());

        let slides =
            parse_document(r#"[{"id":"1","type":"TITLE","title":"Hi","content":[]}]"#).unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Hi");
    }

    #[test]
    fn test_parse_document_malformed() {
        assert!(matches!(
            parse_document("<html>"),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            parse_document(r#"[{"id":"1","type":"NOPE","title":"x"}]"#),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_ack() {
        assert!(parse_ack(r#"{"result":"success"}"#).is_ok());
        assert!(parse_ack("").is_ok());
        assert!(matches!(parse_ack("ok!"), Err(StoreError::Malformed(_))));
    }
}
