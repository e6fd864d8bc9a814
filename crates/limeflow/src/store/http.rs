use std::time::Duration;

use ureq::Agent;
use ureq::http::Response;

use super::{RemoteStore, StoreError, classify, clean_endpoint, parse_ack, parse_document};
use crate::deck::Slide;

/// `text/plain` is a CORS "simple" content type, so browsers never send a
/// pre-flight for it. Apps Script web apps cannot answer pre-flights.
pub const SAVE_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpStore {
    agent: Agent,
}

impl HttpStore {
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Default for HttpStore {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn read_checked(mut response: Response<ureq::Body>) -> Result<String, StoreError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    classify(status, content_type.as_deref())?;
    response
        .body_mut()
        .read_to_string()
        .map_err(StoreError::network)
}

impl RemoteStore for HttpStore {
    fn load(&self, endpoint: &str) -> Result<Vec<Slide>, StoreError> {
        let endpoint = clean_endpoint(endpoint)?;
        tracing::debug!(endpoint, "loading document");
        let response = self
            .agent
            .get(endpoint)
            .call()
            .map_err(StoreError::network)?;
        let body = read_checked(response)?;
        parse_document(&body)
    }

    fn save(&self, endpoint: &str, slides: &[Slide]) -> Result<(), StoreError> {
        let endpoint = clean_endpoint(endpoint)?;
        let body =
            serde_json::to_string(slides).map_err(|e| StoreError::Malformed(e.to_string()))?;
        tracing::debug!(endpoint, bytes = body.len(), "saving document");
        let response = self
            .agent
            .post(endpoint)
            .header("Content-Type", SAVE_CONTENT_TYPE)
            .send(body.as_str())
            .map_err(StoreError::network)?;
        let ack = read_checked(response)?;
        parse_ack(&ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::default_deck;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Answer exactly one request with `response`, returning the raw request.
    fn serve_once(status: &str, content_type: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/exec", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            request.push_str(&String::from_utf8(body).unwrap());
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            request
        });
        (url, handle)
    }

    fn store() -> HttpStore {
        HttpStore::new(Duration::from_secs(5))
    }

    #[test]
    fn test_load_json_array() {
        let body = serde_json::to_string(&default_deck()).unwrap();
        let (url, server) = serve_once("200 OK", "application/json", &body);
        let slides = store().load(&url).unwrap();
        assert_eq!(slides.len(), 4);
        assert!(server.join().unwrap().starts_with("GET /exec"));
    }

    #[test]
    fn test_load_html_is_access_denied() {
        let (url, server) = serve_once("200 OK", "text/html; charset=utf-8", "<html>login</html>");
        assert_eq!(store().load(&url), Err(StoreError::AccessDenied));
        server.join().unwrap();
    }

    #[test]
    fn test_load_http_error() {
        let (url, server) = serve_once("503 Service Unavailable", "application/json", "{}");
        assert_eq!(store().load(&url), Err(StoreError::Http(503)));
        server.join().unwrap();
    }

    #[test]
    fn test_save_sends_plain_text_json() {
        let (url, server) = serve_once("200 OK", "application/json", r#"{"result":"success"}"#);
        let deck = default_deck();
        store().save(&url, deck.slides()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /exec"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("content-type: text/plain;charset=utf-8")
        );
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let sent: Vec<Slide> = serde_json::from_str(body).unwrap();
        assert_eq!(sent, deck.slides());
    }

    #[test]
    fn test_unreachable_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/exec", listener.local_addr().unwrap());
        drop(listener);
        assert!(matches!(store().load(&url), Err(StoreError::Network(_))));
    }

    #[test]
    fn test_blank_endpoint_fails_fast() {
        assert_eq!(store().load("  "), Err(StoreError::EmptyEndpoint));
        assert_eq!(
            store().save("", default_deck().slides()),
            Err(StoreError::EmptyEndpoint)
        );
    }
}
