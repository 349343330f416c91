//! # Command Line Interface
//!
//! Provides CLI commands for mounting auth methods and managing the cert auth
//! method: CA certificate roles, method configuration, CRLs and login.

pub mod auth;
pub mod cert;
pub mod config;
pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::observability::{init_logging, LogFormat};
use crate::VaultClient;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "vaultcert")]
#[command(about = "Certificate auth method tooling for Vault-compatible secrets servers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Output format: json or table
    #[arg(short, long, global = true, default_value = "table")]
    pub output: OutputFormat,

    /// Server address (VAULT_ADDR)
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// Client token (VAULT_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Namespace (VAULT_NAMESPACE)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// CA bundle used to verify the server (VAULT_CACERT)
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Default client certificate (VAULT_CLIENT_CERT)
    #[arg(long, global = true)]
    pub client_cert: Option<PathBuf>,

    /// Default client private key (VAULT_CLIENT_KEY)
    #[arg(long, global = true)]
    pub client_key: Option<PathBuf>,

    /// Accept any server certificate (VAULT_SKIP_VERIFY)
    #[arg(long, global = true)]
    pub skip_verify: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Config file path; defaults to ~/.vaultcert/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Auth method mount commands
    Auth {
        #[command(subcommand)]
        command: auth::AuthCommands,
    },

    /// CA certificate role commands
    Role {
        #[command(subcommand)]
        command: cert::RoleCommands,
    },

    /// Configure the cert auth method
    Configure(cert::ConfigureArgs),

    /// Certificate revocation list commands
    Crl {
        #[command(subcommand)]
        command: cert::CrlCommands,
    },

    /// Log in with a client certificate
    Login(cert::LoginArgs),
}

impl Cli {
    fn connection_flags(&self) -> config::ConnectionFlags {
        config::ConnectionFlags {
            address: self.address.clone(),
            token: self.token.clone(),
            namespace: self.namespace.clone(),
            ca_cert: self.ca_cert.clone(),
            client_cert: self.client_cert.clone(),
            client_key: self.client_key.clone(),
            skip_verify: self.skip_verify,
            timeout: self.timeout,
        }
    }

    fn file_config(&self) -> anyhow::Result<config::CliConfig> {
        match &self.config {
            Some(path) => config::CliConfig::load_from_path(path),
            None => config::CliConfig::load(),
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose, cli.log_json);

    let client = create_client(&cli)?;
    execute(cli.command, &client, cli.output).await
}

/// Dispatch a parsed command against a client.
pub async fn execute(
    command: Commands,
    client: &VaultClient,
    output: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Auth { command } => auth::handle_auth_command(command, client, output).await,
        Commands::Role { command } => cert::handle_role_command(command, client, output).await,
        Commands::Configure(args) => cert::handle_configure_command(args, client).await,
        Commands::Crl { command } => cert::handle_crl_command(command, client, output).await,
        Commands::Login(args) => cert::handle_login_command(args, client, output).await,
    }
}

fn initialise_logging(verbose: bool, json: bool) {
    let format = if json { LogFormat::Json } else { LogFormat::Pretty };
    // Already installed elsewhere (e.g. integration tests); keep that subscriber.
    let _ = init_logging(verbose, format);
}

/// Create the client with resolved connection settings
fn create_client(cli: &Cli) -> anyhow::Result<VaultClient> {
    let file = cli.file_config()?;
    let config = config::resolve_client_config(cli.connection_flags(), file)?;

    VaultClient::new(config).context("Failed to create client")
}
