///! Config file commands

use anyhow::{bail, Result};

use super::Context;
use crate::config::Config;
use crate::output;
use crate::ConfigCommands;

pub fn handle_config_command(command: ConfigCommands, ctx: &Context) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let mut shown = ctx.config.clone();
            if shown.token.is_some() {
                shown.token = Some("********".to_string());
            }
            output::print_single(&shown, ctx.format)?;
        }

        ConfigCommands::Init { force } => {
            let path = Config::config_path()?;
            if path.exists() && !force {
                bail!("{} already exists; pass --force to replace it", path.display());
            }
            let path = Config::default().save()?;
            output::print_success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}
