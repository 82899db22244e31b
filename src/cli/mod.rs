//! Terminal subcommands and the crates.io update check.

use anyhow::{Context, Result};
use contextvault::config::VaultConfig;
use contextvault::tools::manage::{self, ImportParams};
use contextvault::vault::Vault;
use serde::Deserialize;
use std::time::Duration;

/// Print the same status table `ctx_status` returns.
pub fn status(config: &VaultConfig) -> Result<()> {
    let vault = Vault::open(config);
    println!("{}", manage::status(&vault)?);
    Ok(())
}

/// Print the health report for every initialized tier.
pub fn health(config: &VaultConfig) -> Result<()> {
    let vault = Vault::open(config);
    println!("{}", manage::health(&vault));
    Ok(())
}

/// Import a directory, a single `.md` file, or `legacy`.
pub fn import(config: &VaultConfig, source: &str) -> Result<()> {
    let vault = Vault::open(config);
    let report = manage::import(
        &vault,
        &ImportParams {
            source_path: source.to_string(),
        },
    )?;
    println!("{report}");
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    max_version: String,
}

fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
    let core = raw.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    let mut parts = core.split('.').map(|p| p.parse::<u64>().ok());
    Some((parts.next()??, parts.next()??, parts.next().flatten().unwrap_or(0)))
}

/// True when `latest` is a strictly newer semantic version than `current`.
fn is_newer(latest: &str, current: &str) -> bool {
    match (parse_version(latest), parse_version(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => false,
    }
}

/// Ask the registry for the newest published version. Returns it only when
/// it is newer than the running binary.
pub async fn latest_version(config: &VaultConfig) -> Result<Option<String>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("contextvault/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.server.update_timeout_secs))
        .build()
        .context("failed to build http client")?;

    let response = client
        .get(&config.server.update_url)
        .send()
        .await
        .with_context(|| format!("HTTP request failed for {}", config.server.update_url))?;

    anyhow::ensure!(
        response.status().is_success(),
        "update check failed with HTTP {}",
        response.status()
    );

    let body: CrateResponse = response
        .json()
        .await
        .context("failed to parse registry response")?;
    let latest = body.krate.max_stable_version.unwrap_or(body.krate.max_version);

    Ok(is_newer(&latest, env!("CARGO_PKG_VERSION")).then_some(latest))
}

fn upgrade_hint(latest: &str) -> String {
    format!(
        "ContextVault {latest} is available (running {}). Run `cargo install contextvault` to upgrade.",
        env!("CARGO_PKG_VERSION")
    )
}

/// Foreground check for `contextvault check-update`.
pub async fn check_update(config: &VaultConfig) -> Result<()> {
    match latest_version(config).await? {
        Some(latest) => println!("{}", upgrade_hint(&latest)),
        None => println!(
            "ContextVault {} is up to date.",
            env!("CARGO_PKG_VERSION")
        ),
    }
    Ok(())
}

/// Fire-and-forget check while the server runs. Failures are logged at
/// debug level only.
pub fn spawn_update_check(config: VaultConfig) {
    if !config.server.check_updates {
        return;
    }
    tokio::spawn(async move {
        match latest_version(&config).await {
            Ok(Some(latest)) => tracing::warn!("{}", upgrade_hint(&latest)),
            Ok(None) => tracing::debug!("no update available"),
            Err(e) => tracing::debug!(error = %format!("{e:#}"), "update check skipped"),
        }
    });
}
