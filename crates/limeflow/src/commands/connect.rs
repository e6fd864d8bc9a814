use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::config::Config;
use crate::link::LaunchParams;
use crate::session::SyncState;

/// Run the connect command.
pub fn run(endpoint: &str) -> Result<()> {
    let config = Config::load_or_default();
    let mut session = super::one_shot(&config, &LaunchParams::default())?;

    println!("Connecting to {}...", endpoint.trim());
    session.connect(endpoint)?;
    session.pump(Instant::now());

    let status = session.status();
    if status.state == SyncState::Error {
        anyhow::bail!("{}", status.message);
    }

    println!(
        "{}",
        format!(
            "Connected. The deck has {} slide(s).",
            session.document().len()
        )
        .green()
        .bold()
    );
    let links = session.share_links(config.share_base())?;
    println!("  Collaborate: {}", links.collaborate);
    println!("  Present:     {}", links.present);
    Ok(())
}
