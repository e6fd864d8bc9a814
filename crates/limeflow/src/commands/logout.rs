use anyhow::{Context, Result};
use colored::Colorize;

use crate::cache::LocalCache;

/// Run the logout command.
pub fn run() -> Result<()> {
    let mut cache = super::open_cache()?;
    cache
        .clear()
        .with_context(|| format!("Failed to clear {}", cache.dir().display()))?;
    println!("{}", "Logged out. The local deck and endpoint were removed.".green());
    Ok(())
}
