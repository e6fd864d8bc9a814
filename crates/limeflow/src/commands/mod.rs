pub mod completion;
pub mod config;
pub mod connect;
pub mod logout;
pub mod open;
pub mod setup;
pub mod share;
pub mod token;

use anyhow::{Context, Result};

use crate::cache::FileCache;
use crate::config::Config;
use crate::link::LaunchParams;
use crate::session::{Inline, Session, SessionOptions};
use crate::store::HttpStore;

/// Session used by one-shot commands: store calls run on the calling thread.
pub(crate) type OneShot = Session<Inline<HttpStore>, FileCache>;

pub(crate) fn open_cache() -> Result<FileCache> {
    FileCache::open_default().context("Failed to open the local cache")
}

pub(crate) fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        debounce: config.debounce(),
    }
}

pub(crate) fn one_shot(config: &Config, params: &LaunchParams) -> Result<OneShot> {
    let store = HttpStore::new(config.store_timeout());
    let mut session = Session::bootstrap(
        params,
        open_cache()?,
        Inline::new(store),
        session_options(config),
    );
    session.pump(std::time::Instant::now());
    Ok(session)
}

/// Accepts a full share link or a bare query string.
pub(crate) fn parse_link(link: &str) -> Result<LaunchParams> {
    let link = link.trim();
    if link.contains("://") {
        LaunchParams::from_url(link).with_context(|| format!("Invalid link: {link}"))
    } else {
        Ok(LaunchParams::from_query(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_forms() {
        let token = crate::link::encode("https://x");
        let full = parse_link(&format!("https://app.example/?data={token}&view=present")).unwrap();
        assert!(full.present);
        assert_eq!(full.endpoint().as_deref(), Some("https://x"));

        let bare = parse_link(&format!("?data={token}")).unwrap();
        assert!(!bare.present);
        assert_eq!(bare.endpoint().as_deref(), Some("https://x"));

        assert!(parse_link("https://").is_err());
    }
}
