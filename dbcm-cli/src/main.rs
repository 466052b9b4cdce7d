///! dbcm CLI
///!
///! Cluster-manager resource registration and cluster health inspection

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dbcm_core::DbcmConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to $DBCM_CONFIG, /etc/dbcm/config.toml, ./dbcm.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster-manager resources
    Res {
        #[command(subcommand)]
        command: ResCommands,
    },
    /// Cluster health inspection
    Inspect {
        #[command(subcommand)]
        command: InspectCommands,
    },
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ResCommands {
    /// Register a resource (cm_ctl res --add)
    Add {
        /// Resource name
        #[arg(short, long)]
        name: String,
        /// Control script
        #[arg(short, long)]
        script: PathBuf,
        /// Resource type (DN, APP)
        #[arg(short = 't', long = "type", default_value = "DN")]
        res_type: String,
        /// Health check interval in seconds
        #[arg(long, default_value_t = 1)]
        check_interval: u32,
        /// Script timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u32,
        /// Restart attempts before giving up
        #[arg(long, default_value_t = 5)]
        restart_times: u32,
        /// Delay before a restart, in seconds
        #[arg(long, default_value_t = 1)]
        restart_delay: u32,
        /// Restart counting period, in seconds
        #[arg(long, default_value_t = 1)]
        restart_period: u32,
        /// Run the command instead of only printing it
        #[arg(long)]
        execute: bool,
    },
    /// Add an instance to a resource (cm_ctl res --edit)
    Edit {
        /// Resource name
        #[arg(short, long)]
        name: String,
        /// Node ID
        #[arg(long)]
        node_id: u32,
        /// Resource instance ID
        #[arg(long)]
        instance_id: u32,
        /// Instance arguments, usually the home directory (';' separates values)
        #[arg(short, long)]
        args: String,
        /// Run the command instead of only printing it
        #[arg(long)]
        execute: bool,
    },
}

#[derive(Subcommand)]
enum InspectCommands {
    /// Ping every address of a node
    Ping {
        /// Node host name (defaults to the local host name)
        #[arg(long)]
        host: Option<String>,
        /// Cluster topology file (TOML, JSON or YAML)
        #[arg(short, long)]
        topology: PathBuf,
        /// Concurrent probes (overrides configuration)
        #[arg(short, long)]
        parallelism: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print a sample configuration file
    Sample,
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load config
    let config = match &cli.config {
        Some(path) => DbcmConfig::load_with_file(path)?,
        None => DbcmConfig::load()?,
    };
    config.validate()?;

    let _log_guard = dbcm_core::logging::init(&config.logging)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("failed to initialize logging")?;
    tracing::debug!(
        config_file = ?cli.config,
        parallelism = config.inspection.parallelism,
        "Configuration loaded"
    );

    // Execute command
    match cli.command {
        Commands::Res { command } => {
            commands::res::handle_res_command(command, &config, &cli.output).await?
        }
        Commands::Inspect { command } => {
            let passed =
                commands::inspect::handle_inspect_command(command, &config, &cli.output).await?;
            if !passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config { command } => {
            commands::config::handle_config_command(command, &config, &cli.output)?
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_res_add() {
        let cli = Cli::try_parse_from([
            "dbcm", "res", "add", "--name", "dn1", "--script", "/opt/dn_ctl.sh", "--timeout", "60",
        ])
        .unwrap();
        match cli.command {
            Commands::Res {
                command: ResCommands::Add { name, timeout, res_type, execute, .. },
            } => {
                assert_eq!(name, "dn1");
                assert_eq!(timeout, 60);
                assert_eq!(res_type, "DN");
                assert!(!execute);
            }
            _ => panic!("expected res add"),
        }
    }

    #[test]
    fn test_parse_inspect_ping() {
        let cli = Cli::try_parse_from([
            "dbcm", "-o", "json", "inspect", "ping", "--host", "db1", "--topology", "cluster.toml",
        ])
        .unwrap();
        assert_eq!(cli.output, "json");
        assert!(matches!(
            cli.command,
            Commands::Inspect { command: InspectCommands::Ping { parallelism: None, .. } }
        ));
    }
}
