use std::path::Path;

use anyhow::Result;

use super::{ConfigArgs, ConfigCommands, ConfigKeyArg};
use crate::config::CliConfig;
use crate::output::Output;

pub fn handle(args: &ConfigArgs, path: &Path, output: &Output) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => output.emit_json(&CliConfig::load_from(path)?.redacted()),
        ConfigCommands::Set { key, value } => {
            let mut config = CliConfig::load_from(path)?;
            match key {
                ConfigKeyArg::Url => config.url = Some(value.clone()),
                ConfigKeyArg::Session => config.session = Some(value.clone()),
            }
            config.save_to(path)?;
            output.emit_json(&config.redacted())
        }
        ConfigCommands::Reset => {
            CliConfig::reset_at(path)?;
            output.emit_text("Config reset")
        }
    }
}
