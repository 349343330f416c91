//! Auth method mount commands (`vaultcert auth ...`)

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::{print_json, print_table, OutputFormat};
use crate::{api::system::EnableAuthMethod, VaultClient};

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Enable an auth method
    Enable {
        /// Auth method type, e.g. `cert`
        #[arg(long = "type", default_value = "cert")]
        method_type: String,

        /// Mount path; defaults to the method type
        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Mount as local-only (not replicated)
        #[arg(long)]
        local: bool,
    },

    /// Disable an auth method
    Disable {
        /// Mount path
        path: String,
    },

    /// List enabled auth methods
    List,
}

pub async fn handle_auth_command(
    command: AuthCommands,
    client: &VaultClient,
    output: OutputFormat,
) -> Result<()> {
    let sys = client.sys();

    match command {
        AuthCommands::Enable { method_type, path, description, local } => {
            let path = path.unwrap_or_else(|| method_type.clone());
            let options = EnableAuthMethod { description, local, ..Default::default() };
            sys.enable_auth_method(&method_type, &path, &options)
                .await
                .with_context(|| {
                    format!("Failed to enable {} auth method at {}", method_type, path)
                })?;
            println!("Enabled {} auth method at: {}/", method_type, path.trim_matches('/'));
        }
        AuthCommands::Disable { path } => {
            sys.disable_auth_method(&path)
                .await
                .with_context(|| format!("Failed to disable auth method at {}", path))?;
            println!("Disabled auth method at: {}/", path.trim_matches('/'));
        }
        AuthCommands::List => {
            let mounts = sys
                .list_auth_methods()
                .await
                .context("Failed to list auth methods")?
                .data
                .unwrap_or_default();

            match output {
                OutputFormat::Json => print_json(&mounts)?,
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = mounts
                        .iter()
                        .map(|(path, mount)| {
                            vec![
                                path.clone(),
                                mount.method_type.clone(),
                                mount.accessor.clone(),
                                mount.description.clone(),
                            ]
                        })
                        .collect();
                    print_table(
                        &[("PATH", 24), ("TYPE", 10), ("ACCESSOR", 28), ("DESCRIPTION", 40)],
                        &rows,
                    );
                }
            }
        }
    }

    Ok(())
}
