use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "limeflow")]
#[command(author, version, about)]
#[command(long_about = "A slide-deck editor and presenter that keeps its deck in a spreadsheet.\n\n\
    The deck lives behind a Google Apps Script web app; share links carry that\n\
    endpoint so anyone with the link opens the same deck.\n\n\
    Examples:\n  \
    limeflow                          Open the last deck (or the welcome screen)\n  \
    limeflow 'https://host/?data=…'   Open a shared deck for editing\n  \
    limeflow '?data=…' --present      Present a shared deck read-only\n  \
    limeflow setup                    Print the Apps Script to deploy")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Share link (or bare query string) to open
    pub link: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Open read-only in presentation mode
    #[arg(long, global = false)]
    pub present: bool,

    /// Store endpoint to use, bypassing any share token
    #[arg(long, global = false, value_name = "URL")]
    pub sheet: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a store endpoint and load its deck
    Connect {
        /// Apps Script web app URL
        endpoint: String,
    },

    /// Forget the cached deck and endpoint
    Logout,

    /// Print the collaborate and present links for the current deck
    Share {
        /// Address of the hosted app (defaults to share.base_url)
        #[arg(long, value_name = "URL")]
        base: Option<String>,
    },

    /// Encode or decode share tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Print the Apps Script that turns a spreadsheet into a store
    Setup,

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Encode a value (usually an endpoint) as a share token
    Encode { value: String },

    /// Decode a share token
    Decode { token: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, share.base_url, autosave.debounce_ms)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Connect { endpoint }) => crate::commands::connect::run(&endpoint),
            Some(Commands::Logout) => crate::commands::logout::run(),
            Some(Commands::Share { base }) => crate::commands::share::run(base.as_deref()),
            Some(Commands::Token { command }) => crate::commands::token::run(command),
            Some(Commands::Setup) => {
                crate::commands::setup::run();
                Ok(())
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                println!("limeflow {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None => crate::commands::open::run(crate::commands::open::OpenArgs {
                link: self.link,
                present: self.present,
                sheet: self.sheet,
                quiet: self.quiet,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_link_and_flags() {
        let cli = Cli::try_parse_from(["limeflow", "https://h/?data=abc", "--present", "-vv"])
            .unwrap();
        assert_eq!(cli.link.as_deref(), Some("https://h/?data=abc"));
        assert!(cli.present);
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_token_subcommand() {
        let cli = Cli::try_parse_from(["limeflow", "token", "encode", "https://x"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Token {
                command: TokenCommands::Encode { .. }
            })
        ));
    }
}
