//! Config command handler

use std::path::Path;

use super::{confirm, CommandResult};
use crate::args::ConfigSubcommand;
use nomosdb::config::Config;

/// Dispatch config subcommands
///
/// `config_file` is where changes are written: the `--config` file when
/// given, otherwise the user config file.
pub fn run(
    subcommand: Option<ConfigSubcommand>,
    config: &mut Config,
    defaults: &Config,
    config_file: &Path,
) -> CommandResult {
    match subcommand {
        None | Some(ConfigSubcommand::Show) => handle_config_get(config, None),
        Some(ConfigSubcommand::Get { key }) => handle_config_get(config, key),
        Some(ConfigSubcommand::Set { key, value }) => {
            handle_config_set(config, &key, &value, config_file)
        }
        Some(ConfigSubcommand::Unset { key }) => {
            handle_config_unset(config, defaults, &key, config_file)
        }
        Some(ConfigSubcommand::Reset { yes }) => handle_config_reset(config_file, yes),
    }
}

/// Handle the config get subcommand
pub fn handle_config_get(config: &Config, key: Option<String>) -> CommandResult {
    if let Some(k) = key {
        let value = config
            .get(&k)
            .ok_or_else(|| format!("Unknown config key: '{k}'"))?;
        println!("{value}");
    } else {
        println!("\n=== Configuration ===\n");
        print!("{config}");
    }
    Ok(())
}

/// Handle the config set subcommand
pub fn handle_config_set(
    config: &mut Config,
    key: &str,
    value: &str,
    config_file: &Path,
) -> CommandResult {
    config.set(key, value)?;
    config
        .save_to(config_file)
        .map_err(|e| format!("Failed to save config: {e}"))?;
    println!("✓ Set {key} = {value}");
    Ok(())
}

/// Handle the config unset subcommand
pub fn handle_config_unset(
    config: &mut Config,
    defaults: &Config,
    key: &str,
    config_file: &Path,
) -> CommandResult {
    config.unset(key, defaults)?;
    config
        .save_to(config_file)
        .map_err(|e| format!("Failed to save config: {e}"))?;
    println!("✓ Reset {key} to default");
    Ok(())
}

/// Handle the config reset subcommand
pub fn handle_config_reset(config_file: &Path, yes: bool) -> CommandResult {
    if !config_file.exists() {
        println!("✓ Config is already at defaults");
        return Ok(());
    }
    if confirm("Are you sure you want to reset config to defaults?", yes) {
        Config::reset(config_file).map_err(|e| format!("Failed to remove config file: {e}"))?;
        println!("✓ Config reset to defaults");
    } else {
        println!("✗ Reset cancelled");
    }
    Ok(())
}
