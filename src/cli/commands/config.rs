//! `tagscope config` command - Configuration management
//!
//! Reads and writes the global (`config.yaml` in the user config directory)
//! and local (`.tagscope.yaml` in the working directory) config files.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::core::config::{validate_key, yaml_value, LOCAL_CONFIG_FILE, VALID_KEYS};
use crate::core::Config;

/// Keys whose values are masked by `config show`
const SECRET_KEYS: &[&str] = &["access_token", "api_key"];

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value (unmasked)
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (see `tagscope config keys`)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of the local file
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of the local file
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        return match config.get(key).map_err(|e| miette::miette!("{}", e))? {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        let value = config.get(key).map_err(|e| miette::miette!("{}", e))?;
        print_config_value(key, value.as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (TAGSCOPE_ACCESS_TOKEN, TAGSCOPE_PROPERTY, ...)");
    println!("  2. Local config ({})", LOCAL_CONFIG_FILE);
    println!("  3. Global config ({})", global_config_path()?.display());

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let value = yaml_value(&args.key, &args.value).map_err(|e| miette::miette!("{}", e))?;
    let config_path = config_path(args.global)?;

    let mut config_map = read_mapping(&config_path)?;
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(masked(&args.key, &args.value)).yellow(),
        scope(args.global)
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    validate_key(&args.key).map_err(|e| miette::miette!("{}", e))?;
    let config_path = config_path(args.global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope(args.global)
    );

    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();
    for (label, path) in [("Global:", config_path(true)?), ("Local:", config_path(false)?)] {
        println!("  {:<8} {}", style(label).cyan(), path.display());
        if path.exists() {
            println!("           {}", style("(exists)").green());
        } else {
            println!("           {}", style("(not created)").dim());
        }
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'tagscope config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn config_path(global: bool) -> Result<PathBuf> {
    if global {
        global_config_path()
    } else {
        Ok(std::env::current_dir()
            .into_diagnostic()?
            .join(LOCAL_CONFIG_FILE))
    }
}

fn scope(global: bool) -> &'static str {
    if global {
        "global"
    } else {
        "local"
    }
}

/// Existing file as a YAML mapping; missing, empty or non-mapping files start fresh
fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
    if parsed.is_mapping() {
        Ok(parsed)
    } else {
        Ok(serde_yml::Value::Mapping(Default::default()))
    }
}

/// Value for display; secrets keep only their last four characters
fn masked(key: &str, value: &str) -> String {
    if !SECRET_KEYS.contains(&key) {
        return value.to_string();
    }
    let count = value.chars().count();
    if count <= 4 {
        "****".to_string()
    } else {
        let tail: String = value.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(masked(key, v)).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_masked() {
        assert_eq!(masked("access_token", "eyJhbGciOiJSUzI1NiJ9.abcd"), "****abcd");
        assert_eq!(masked("api_key", "abc"), "****");
        assert_eq!(masked("property", "PR1234"), "PR1234");
    }

    #[test]
    fn test_read_mapping_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(read_mapping(&path).unwrap().is_mapping());
        assert!(read_mapping(&dir.path().join("missing.yaml"))
            .unwrap()
            .is_mapping());
    }
}
