//! Share tokens, launch parameters and share links.
//!
//! A store endpoint travels inside links as a share token: its UTF-8 bytes in
//! unpadded URL-safe base64. Decoding is lenient about the alphabet and padding
//! so links built by other tools still open.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use url::Url;

pub const DATA_PARAM: &str = "data";
pub const SHEET_PARAM: &str = "sheet";
pub const VIEW_PARAM: &str = "view";
pub const VIEW_PRESENT: &str = "present";

/// Encode `s` as a URL-safe, padding-free token.
pub fn encode(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    URL_SAFE_NO_PAD.encode(s.as_bytes())
}

/// Inverse of [`encode`]. Malformed tokens decode to an empty string.
pub fn decode(token: &str) -> String {
    let token = token.trim();
    if token.is_empty() {
        return String::new();
    }
    let normalized: String = token
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    match URL_SAFE_NO_PAD.decode(normalized.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(s) => s,
            // Legacy byte-oriented links: one char per byte.
            Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
        },
        Err(e) => {
            tracing::warn!(token, error = %e, "could not decode share token");
            String::new()
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("invalid base address {0:?}: {1}")]
    InvalidBase(String, String),
}

/// The query parameters a session is launched with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Encoded endpoint, preferred over `sheet`.
    pub data: Option<String>,
    /// Legacy raw endpoint.
    pub sheet: Option<String>,
    pub present: bool,
}

impl LaunchParams {
    pub fn from_url(url: &str) -> Result<Self, LinkError> {
        let parsed =
            Url::parse(url).map_err(|e| LinkError::InvalidBase(url.to_string(), e.to_string()))?;
        Ok(Self::from_pairs(parsed.query_pairs()))
    }

    /// Parse a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            match key.as_ref() {
                DATA_PARAM if !value.is_empty() => params.data = Some(value.to_string()),
                SHEET_PARAM if !value.is_empty() => params.sheet = Some(value.to_string()),
                VIEW_PARAM => params.present = value == VIEW_PRESENT,
                _ => {}
            }
        }
        params
    }

    /// Endpoint carried by the URL itself: decoded `data`, else `sheet`.
    pub fn endpoint(&self) -> Option<String> {
        if let Some(token) = &self.data {
            let decoded = decode(token);
            if !decoded.trim().is_empty() {
                return Some(decoded.trim().to_string());
            }
            tracing::warn!("share token did not decode to an endpoint, ignoring it");
        }
        self.sheet.clone()
    }
}

/// The two links a session can hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    /// Opens the deck for editing against the same endpoint.
    pub collaborate: String,
    /// Opens the deck read-only in presentation mode.
    pub present: String,
}

pub fn share_links(base: &str, endpoint: &str) -> Result<ShareLinks, LinkError> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| LinkError::InvalidBase(base.to_string(), e.to_string()))?;
    url.set_query(None);
    url.set_fragment(None);

    let token = encode(endpoint.trim());
    if !token.is_empty() {
        url.query_pairs_mut().append_pair(DATA_PARAM, &token);
    }
    let collaborate = url.to_string();

    url.query_pairs_mut().append_pair(VIEW_PARAM, VIEW_PRESENT);
    let present = url.to_string();

    Ok(ShareLinks {
        collaborate,
        present,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for s in [
            "",
            "a",
            "ab",
            "abc",
            "https://script.google.com/macros/s/AKfycbz/exec",
            "모둠 소개 및 프로젝트 명",
            "emoji 🚀 and ümlauts",
            "?&=+/ reserved",
        ] {
            assert_eq!(decode(&encode(s)), s, "round trip failed for {s:?}");
        }
    }

    #[test]
    fn test_token_alphabet() {
        for s in ["???>>>", "ÿÿÿÿ", "https://x.example/a?b=c", "한국어 텍스트"] {
            let token = encode(s);
            assert!(
                !token.contains(['+', '/', '=']),
                "token {token} for {s:?} is not URL-safe"
            );
        }
    }

    #[test]
    fn test_empty() {
        assert_eq!(encode(""), "");
        assert_eq!(decode(""), "");
    }

    #[test]
    fn test_decode_accepts_standard_alphabet_and_padding() {
        // "???>" in standard base64 is "Pz8/Pg==", URL-safe "Pz8_Pg"
        assert_eq!(decode("Pz8/Pg=="), "???>");
        assert_eq!(decode("Pz8_Pg=="), "???>");
        assert_eq!(decode("Pz8_Pg"), "???>");
    }

    #[test]
    fn test_decode_invalid_is_empty() {
        assert_eq!(decode("!!!not base64!!!"), "");
        assert_eq!(decode("a"), "");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // 0xE9 alone is not valid UTF-8
        let token = URL_SAFE_NO_PAD.encode([b'c', b'a', b'f', 0xE9]);
        assert_eq!(decode(&token), "café");
    }

    #[test]
    fn test_data_takes_precedence_over_sheet() {
        let url = format!(
            "https://app.example/?data={}&sheet=https://y",
            encode("https://x")
        );
        let params = LaunchParams::from_url(&url).unwrap();
        assert_eq!(params.endpoint().as_deref(), Some("https://x"));
        assert!(!params.present);
    }

    #[test]
    fn test_bad_token_falls_back_to_sheet() {
        let params = LaunchParams::from_query("?data=%25%25&sheet=https://y&view=present");
        assert_eq!(params.endpoint().as_deref(), Some("https://y"));
        assert!(params.present);
    }

    #[test]
    fn test_no_params() {
        let params = LaunchParams::from_query("");
        assert_eq!(params, LaunchParams::default());
        assert_eq!(params.endpoint(), None);
    }

    #[test]
    fn test_share_links_strip_query_and_fragment() {
        let links =
            share_links("https://app.example/deck?data=old&view=present#s3", "https://x").unwrap();
        let token = encode("https://x");
        assert_eq!(
            links.collaborate,
            format!("https://app.example/deck?data={token}")
        );
        assert_eq!(
            links.present,
            format!("https://app.example/deck?data={token}&view=present")
        );

        let reopened = LaunchParams::from_url(&links.present).unwrap();
        assert!(reopened.present);
        assert_eq!(reopened.endpoint().as_deref(), Some("https://x"));
    }

    #[test]
    fn test_share_links_without_endpoint() {
        let links = share_links("https://app.example/", "  ").unwrap();
        assert_eq!(links.collaborate, "https://app.example/");
        assert_eq!(links.present, "https://app.example/?view=present");
    }

    #[test]
    fn test_share_links_invalid_base() {
        assert!(matches!(
            share_links("not a url", "https://x"),
            Err(LinkError::InvalidBase(..))
        ));
    }
}
