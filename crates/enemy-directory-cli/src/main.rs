// crates/enemy-directory-cli/src/main.rs
// ============================================================================
// Module: Enemy Directory CLI Entry Point
// Description: Command dispatcher for the enemy directory server and client.
// Purpose: Run the server, validate configuration, and call a running server.
// Dependencies: clap, enemy-directory-{cli, config, rpc}, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! `enemy-directory serve` loads configuration, opens and migrates the store,
//! and serves JSON-RPC until SIGINT or SIGTERM. `enemy-directory config
//! validate` checks a configuration file without starting anything. The
//! `enemy` subcommands call a running server and print the JSON result.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use enemy_directory_cli::rpc_client::DEFAULT_ENDPOINT;
use enemy_directory_cli::rpc_client::DEFAULT_MAX_RESPONSE_BYTES;
use enemy_directory_cli::rpc_client::RpcClient;
use enemy_directory_cli::rpc_client::RpcClientConfig;
use enemy_directory_config::DirectoryConfig;
use enemy_directory_rpc::AddEnemyRequest;
use enemy_directory_rpc::GetEnemyRequest;
use enemy_directory_rpc::RpcServer;
use enemy_directory_rpc::UpdateEnemyRequest;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "enemy-directory", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the enemy directory server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Call a running server.
    Enemy {
        /// Selected enemy subcommand.
        #[command(subcommand)]
        command: EnemyCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to enemy-directory.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an enemy directory configuration file.
    Validate(ConfigValidateCommand),
}

/// Configuration for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to enemy-directory.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Connection options shared by client subcommands.
#[derive(Args, Debug, Clone)]
struct ClientArgs {
    /// Server `/rpc` URL.
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Per-call timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 5_000)]
    timeout_ms: u64,
    /// Largest response body to accept, in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_RESPONSE_BYTES)]
    max_response_bytes: usize,
}

/// Enemy client subcommands.
#[derive(Subcommand, Debug)]
enum EnemyCommand {
    /// Create a record.
    Add(EnemyAddCommand),
    /// Fetch a record by id.
    Get(EnemyGetCommand),
    /// Replace a record's name, email, and rating.
    Update(EnemyUpdateCommand),
    /// List every record.
    List(EnemyListCommand),
}

/// Arguments for `enemy add`.
#[derive(Args, Debug)]
struct EnemyAddCommand {
    /// Connection options.
    #[command(flatten)]
    client: ClientArgs,
    /// Display name.
    #[arg(long)]
    name: String,
    /// Contact address.
    #[arg(long)]
    email: String,
    /// Threat rating.
    #[arg(long)]
    rating: f64,
}

/// Arguments for `enemy get`.
#[derive(Args, Debug)]
struct EnemyGetCommand {
    /// Connection options.
    #[command(flatten)]
    client: ClientArgs,
    /// Record identifier.
    #[arg(long)]
    id: String,
}

/// Arguments for `enemy update`.
///
/// Omitted fields are sent empty and overwrite the stored values.
#[derive(Args, Debug)]
struct EnemyUpdateCommand {
    /// Connection options.
    #[command(flatten)]
    client: ClientArgs,
    /// Record identifier.
    #[arg(long)]
    id: String,
    /// Replacement name.
    #[arg(long, default_value = "")]
    name: String,
    /// Replacement email.
    #[arg(long, default_value = "")]
    email: String,
    /// Replacement rating.
    #[arg(long, default_value_t = 0.0)]
    rating: f64,
}

/// Arguments for `enemy list`.
#[derive(Args, Debug)]
struct EnemyListCommand {
    /// Connection options.
    #[command(flatten)]
    client: ClientArgs,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
        Commands::Enemy {
            command,
        } => command_enemy(command).await,
    }
}

// ============================================================================
// SECTION: Serve and Config Commands
// ============================================================================

/// Loads configuration, opens the store, and serves until shutdown.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = DirectoryConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let server = tokio::task::spawn_blocking(move || RpcServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Validates a configuration file.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = DirectoryConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Enemy Commands
// ============================================================================

/// Dispatches enemy client subcommands.
async fn command_enemy(command: EnemyCommand) -> CliResult<ExitCode> {
    match command {
        EnemyCommand::Add(command) => {
            let mut client = build_client(&command.client)?;
            let record = client
                .add_enemy(&AddEnemyRequest {
                    name: command.name,
                    email: command.email,
                    rating: command.rating,
                })
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            write_json(&record)?;
        }
        EnemyCommand::Get(command) => {
            let mut client = build_client(&command.client)?;
            let record = client
                .get_enemy(&GetEnemyRequest {
                    id: command.id,
                })
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            write_json(&record)?;
        }
        EnemyCommand::Update(command) => {
            let mut client = build_client(&command.client)?;
            let record = client
                .update_enemy(&UpdateEnemyRequest {
                    id: command.id,
                    name: command.name,
                    email: command.email,
                    rating: command.rating,
                })
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            write_json(&record)?;
        }
        EnemyCommand::List(command) => {
            let mut client = build_client(&command.client)?;
            let records =
                client.list_enemies().await.map_err(|err| CliError::new(err.to_string()))?;
            write_json(&records)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Builds an RPC client from connection options.
fn build_client(args: &ClientArgs) -> CliResult<RpcClient> {
    RpcClient::new(client_config(args)).map_err(|err| CliError::new(err.to_string()))
}

/// Translates connection options into client configuration.
fn client_config(args: &ClientArgs) -> RpcClientConfig {
    RpcClientConfig {
        endpoint: args.endpoint.clone(),
        timeout: Duration::from_millis(args.timeout_ms),
        max_response_bytes: args.max_response_bytes,
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value to stdout as pretty-printed JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, err: &std::io::Error) -> String {
    format!("failed to write to {stream}: {err}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
