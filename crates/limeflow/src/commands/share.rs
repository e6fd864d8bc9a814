use anyhow::Result;
use colored::Colorize;

use crate::cache::{ENDPOINT_KEY, LocalCache};
use crate::config::Config;
use crate::link;

/// Run the share command.
pub fn run(base: Option<&str>) -> Result<()> {
    let config = Config::load_or_default();
    let cache = super::open_cache()?;
    let endpoint = cache.get(ENDPOINT_KEY).unwrap_or_default();
    if endpoint.trim().is_empty() {
        println!(
            "{}",
            "No store connected; these links open a local-only deck. Run `limeflow connect <ENDPOINT>` first."
                .yellow()
        );
    }

    let base = base.unwrap_or(config.share_base());
    let links = link::share_links(base, &endpoint)?;
    println!("{}", "Collaborate (edit):".bold());
    println!("  {}", links.collaborate);
    println!("{}", "Present (read-only):".bold());
    println!("  {}", links.present);
    Ok(())
}
