use anyhow::Result;

use crate::cli::TokenCommands;
use crate::link;

/// Run the token command.
pub fn run(command: TokenCommands) -> Result<()> {
    match command {
        TokenCommands::Encode { value } => println!("{}", link::encode(value.trim())),
        TokenCommands::Decode { token } => {
            let decoded = link::decode(&token);
            if decoded.is_empty() && !token.trim().is_empty() {
                anyhow::bail!("Not a valid share token: {token}");
            }
            println!("{decoded}");
        }
    }
    Ok(())
}
