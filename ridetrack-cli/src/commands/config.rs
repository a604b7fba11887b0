//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path`.

use clap::Subcommand;
use ridetrack::config::{config_file_path, ConfigFile};

use super::common::mask_secret;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration (file plus environment)
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(force),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(force: bool) -> Result<(), CliError> {
    let path = config_file_path();
    if path.exists() && !force {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Set api_key under [maps] to enable ETAs, search and routes.");
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?.with_env_overrides()?;
    let api_key = config
        .maps
        .api_key
        .as_deref()
        .map(mask_secret)
        .unwrap_or_else(|| "(not set)".to_string());
    let actor_id = config
        .session
        .actor_id
        .clone()
        .unwrap_or_else(|| "(generated per session)".to_string());
    let server_url = if config.server.url.is_empty() {
        "(disabled)".to_string()
    } else {
        config.server.url.clone()
    };

    println!("Configuration Settings");
    println!("======================");
    println!();
    println!("[server]");
    println!("  url = {}", server_url);
    println!();
    println!("[maps]");
    println!("  api_key = {}", api_key);
    println!("  base_url = {}", config.maps.base_url);
    println!("  timeout_secs = {}", config.maps.timeout_secs);
    println!();
    println!("[location]");
    println!("  high_accuracy = {}", config.location.high_accuracy);
    println!("  timeout_ms = {}", config.location.timeout_ms);
    println!("  max_age_ms = {}", config.location.max_age_ms);
    println!("  update_interval_ms = {}", config.location.update_interval_ms);
    println!("  min_distance_m = {}", config.location.min_distance_m);
    println!("  accuracy_threshold_m = {}", config.location.accuracy_threshold_m);
    println!();
    println!("[channel]");
    println!("  max_reconnect_attempts = {}", config.channel.max_reconnect_attempts);
    println!("  reconnect_delay_ms = {}", config.channel.reconnect_delay_ms);
    println!("  reconnect_delay_max_ms = {}", config.channel.reconnect_delay_max_ms);
    println!("  connect_timeout_ms = {}", config.channel.connect_timeout_ms);
    println!("  platform = {}", config.channel.platform);
    println!();
    println!("[session]");
    println!("  role = {}", config.session.role);
    println!("  actor_id = {}", actor_id);
    println!("  eta_refresh_secs = {}", config.session.eta_refresh_secs);
    println!("  search_debounce_ms = {}", config.session.search_debounce_ms);
    println!(
        "  route_update_min_distance_m = {}",
        config.session.route_update_min_distance_m
    );
    println!();
    println!("[logging]");
    println!("  file = {}", config.logging.file.display());
    Ok(())
}

fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
