//! `warashi config` - read and edit the settings file.
//!
//! `set` checks the key's own range and the cross-key rules before the file
//! is written, so a rejected value never reaches disk.

use clap::Subcommand;
use warashi::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., ticket.group_size)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., ticket.group_size)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'warashi config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load()?;
    println!("{}", config_key.get(&config));
    Ok(())
}

fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load()?;
    config_key.set(&mut config, value)?;
    config.validate()?;
    config.save()?;

    println!("Set {} = {}", config_key, config_key.get(&config));
    Ok(())
}

fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    print!("{}", format_listing(&config));
    Ok(())
}

/// One line per key under its section header: `name = value  (accepted)`.
fn format_listing(config: &ConfigFile) -> String {
    let rows: Vec<(ConfigKey, String)> = ConfigKey::all()
        .iter()
        .map(|&key| (key, key.get(config)))
        .collect();
    let width = rows
        .iter()
        .map(|(key, value)| key.key_name().len() + value.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let mut section = None;
    for (key, value) in &rows {
        if section != Some(key.section()) {
            if section.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", key.section()));
            section = Some(key.section());
        }
        let pad = width - key.key_name().len() - value.len();
        out.push_str(&format!(
            "  {} = {}{}  ({})\n",
            key.key_name(),
            value,
            " ".repeat(pad),
            key.hint()
        ));
    }
    out
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
