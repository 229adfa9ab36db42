//! Eldom CLI - Command-line tool for Eldom IoT devices
//!
//! Lists the devices of an account and reads or changes the state of
//! convector heaters and flat boilers through the direct-request relay.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eldom_client::{ClientConfig, DeviceFamily, EldomClient};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "eldom-cli")]
#[command(author, version, about = "Eldom IoT device CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL
    #[arg(short, long, env = "ELDOM_BASE_URL")]
    base_url: Option<String>,

    /// Account username
    #[arg(short, long, env = "ELDOM_USERNAME")]
    username: Option<String>,

    /// Account password
    #[arg(short, long, env = "ELDOM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "ELDOM_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Device family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Family {
    /// Convector heater (plain JSON)
    Convector,
    /// Flat boiler (encrypted)
    FlatBoiler,
}

impl From<Family> for DeviceFamily {
    fn from(family: Family) -> Self {
        match family {
            Family::Convector => DeviceFamily::ConvectorHeater,
            Family::FlatBoiler => DeviceFamily::FlatBoiler,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the logged-in account
    User,

    /// List devices registered to the account
    Devices,

    /// Show device status
    Status {
        /// Device UUID, pair token or name
        device: String,

        /// Device family
        #[arg(short, long, value_enum, default_value = "convector")]
        family: Family,
    },

    /// Change device state
    State {
        /// Device UUID, pair token or name
        device: String,

        /// New state: convector 0/16 or off/on; flat boiler 0-5 or
        /// off, on, eco, smart, extrasafe, powerful
        value: String,

        /// Device family
        #[arg(short, long, value_enum, default_value = "convector")]
        family: Family,
    },

    /// Set convector target temperature
    Temperature {
        /// Device UUID, pair token or name
        device: String,

        /// Target temperature in whole °C
        #[arg(allow_negative_numbers = true)]
        degrees: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.base_url.as_deref(),
        cli.username.as_deref(),
        cli.password.as_deref(),
        cli.output,
        cli.no_color,
    );

    // Create output context
    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);
    debug!(base_url = %merged.base_url, "Using Eldom API");
    let client = create_client(&merged)?;

    // Execute command
    match &cli.command {
        Commands::User => {
            commands::user(&client, &ctx).await?;
        }

        Commands::Devices => {
            commands::devices(&client, &ctx).await?;
        }

        Commands::Status { device, family } => {
            commands::status(&client, device, (*family).into(), &ctx).await?;
        }

        Commands::State {
            device,
            value,
            family,
        } => {
            commands::state(&client, device, value, (*family).into(), &ctx).await?;
        }

        Commands::Temperature { device, degrees } => {
            commands::temperature(&client, device, *degrees, &ctx).await?;
        }
    }

    Ok(())
}

/// Create an Eldom client from the merged configuration
fn create_client(merged: &MergedConfig) -> Result<EldomClient> {
    let username = merged
        .username
        .as_deref()
        .context("No username given (use --username, ELDOM_USERNAME or the config file)")?;
    let password = merged
        .password
        .as_deref()
        .context("No password given (use --password, ELDOM_PASSWORD or the config file)")?;

    let config = ClientConfig::new(&merged.base_url).context("Invalid base URL")?;
    EldomClient::with_config(config, username, password).context("Failed to create Eldom client")
}
