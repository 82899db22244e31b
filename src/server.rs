//! MCP server initialization over stdio.

use crate::config::VaultConfig;
use crate::tools::VaultTools;
use crate::vault::{Tier, Vault};
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Open the vault described by `config`. The global tier is created on
/// first use; the project tier waits for `ctx_init`.
fn open_vault(config: &VaultConfig) -> Result<Arc<Mutex<Vault>>> {
    let vault = Vault::open(config);
    vault.ensure_initialized(Tier::Global)?;
    tracing::info!(project_ready = vault.exists(Tier::Project), "vault ready");
    Ok(Arc::new(Mutex::new(vault)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: &VaultConfig) -> Result<()> {
    tracing::info!("starting ContextVault MCP server on stdio");

    let vault = open_vault(config)?;
    let tools = VaultTools::new(vault);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
