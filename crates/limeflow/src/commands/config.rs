use anyhow::Result;
use colored::Colorize;

use crate::cache::FileCache;
use crate::cli::ConfigCommands;
use crate::config::Config;

/// Run the config command.
pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set(&key, &value)?;
            let path = config.save()?;
            println!(
                "{}",
                format!("Set {key} = {value} in {}", path.display()).green()
            );
            Ok(())
        }
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    let config = match Config::load_from(&path) {
        Ok(config) => {
            println!("{} {}", "Config file:".bold(), path.display());
            config
        }
        Err(_) => {
            println!(
                "{} {} {}",
                "Config file:".bold(),
                path.display(),
                "(not created yet, showing defaults)".dimmed()
            );
            Config::default()
        }
    };
    if let Ok(dir) = FileCache::default_dir() {
        println!("{} {}", "Local cache:".bold(), dir.display());
    }
    println!();

    let ai_key = if config.ai_api_key().is_some() {
        "set".green()
    } else {
        "not set".yellow()
    };
    println!("  defaults.theme        {}", config.theme());
    println!("  share.base_url        {}", config.share_base());
    println!(
        "  store.endpoint        {}",
        config.default_endpoint().unwrap_or("(none)")
    );
    println!("  store.timeout_secs    {}", config.store_timeout().as_secs());
    println!("  autosave.debounce_ms  {}", config.debounce().as_millis());
    println!("  ai.model              {}", config.ai_model());
    println!("  ai.api_key            {ai_key}");
    Ok(())
}
