//! Vault management tools: `ctx_init`, `ctx_status`, `ctx_mode`,
//! `ctx_health`, `ctx_review`, `ctx_bootstrap`, `ctx_import` and `ctx_upgrade`.

use anyhow::{bail, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vault::review::DEFAULT_STALE_DAYS;
use crate::vault::settings::{Enforcement, Mode};
use crate::vault::types::Tier;
use crate::vault::{bootstrap, health, migrate, review, Vault};

/// Parameters for the `ctx_init` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct InitParams {
    #[schemars(description = "Force reinitialize even if vault exists (default: false)")]
    pub force: Option<bool>,
}

/// Parameters for the `ctx_mode` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ModeParams {
    #[schemars(description = "Vault mode: local, global or full")]
    pub mode: Option<String>,

    #[schemars(description = "Enforcement level: light, balanced or strict")]
    pub enforcement: Option<String>,
}

/// Parameters for the `ctx_review` MCP tool.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReviewParams {
    #[schemars(description = "Which vault to review: global or project (default: project)")]
    pub vault: Option<String>,

    #[schemars(description = "Days without update to consider stale (default: 30)")]
    pub stale_days: Option<u64>,
}

/// Parameters for the `ctx_import` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImportParams {
    #[schemars(
        description = "Path to import from: a directory, a .md file, or \"legacy\" for .claude/vault/"
    )]
    pub source_path: String,
}

const CLIENT_CONFIG: &str = r#"```json
{
  "mcpServers": {
    "contextvault": {
      "command": "contextvault",
      "args": ["serve"]
    }
  }
}
```"#;

pub fn init(vault: &Vault, params: &InitParams) -> Result<String> {
    let outcome = vault.init_project(params.force.unwrap_or(false))?;
    let stats = vault.stats()?;

    Ok(format!(
        "## Setup Complete\n\n{outcome}\n\n**Vault Paths:**\n- Global: {}\n- Project: {}\n\n**Mode:** {} | **Enforcement:** {}\n\n### Client Configuration\n\nAdd this to your MCP client config to connect ContextVault:\n\n{CLIENT_CONFIG}\n\nThe vault indexes are available as MCP resources and will auto-load in supported clients.",
        stats.global_path.display(),
        stats.project_path.display(),
        stats.mode,
        stats.enforcement,
    ))
}

pub fn status(vault: &Vault) -> Result<String> {
    let stats = vault.stats()?;
    let tier_cell = |exists: bool, docs: usize, max: usize| {
        if exists {
            format!("{docs}/{max} docs")
        } else {
            "Not initialized".to_string()
        }
    };

    let tracker = vault.enforcement();
    let mut out = format!(
        "# ContextVault Status\n\n| | Status |\n|---|---|\n| **Global Vault** | {} |\n| **Project Vault** | {} |\n| **Mode** | {} |\n| **Enforcement** | {} |\n| **Global Path** | {} |\n| **Project Path** | {} |\n| **Session** | {} edits, {} lookups since last doc |\n",
        tier_cell(stats.global_exists, stats.global_docs, stats.global_max_docs),
        tier_cell(stats.project_exists, stats.project_docs, stats.project_max_docs),
        stats.mode,
        stats.enforcement,
        stats.global_path.display(),
        stats.project_path.display(),
        tracker.edit_count(),
        tracker.research_count(),
    );
    if !stats.project_exists {
        out += "\n> **Tip:** Run ctx_init to initialize the project vault.";
    }
    if let Some(reminder) = vault.edit_reminder() {
        out += &reminder;
    }
    Ok(out.trim_end().to_string())
}

/// Show settings, or apply the recognised values. Unknown values are ignored.
pub fn mode(vault: &Vault, params: &ModeParams) -> Result<String> {
    let requested_mode = params.mode.as_deref().filter(|m| !m.is_empty());
    let requested_level = params.enforcement.as_deref().filter(|e| !e.is_empty());

    if requested_mode.is_none() && requested_level.is_none() {
        let settings = vault.settings();
        return Ok(format!(
            "Current mode: **{}** | Enforcement: **{}**\n\nUse mode parameter (local/global/full) or enforcement parameter (light/balanced/strict) to change.",
            settings.mode, settings.enforcement
        ));
    }

    let mode = requested_mode.and_then(|m| m.parse::<Mode>().ok());
    let level = requested_level.and_then(|e| e.parse::<Enforcement>().ok());
    if mode.is_none() && requested_mode.is_some() {
        tracing::warn!(value = ?requested_mode, "ignoring unknown mode");
    }
    if level.is_none() && requested_level.is_some() {
        tracing::warn!(value = ?requested_level, "ignoring unknown enforcement level");
    }

    let updated = vault.settings_store().update(mode, level)?;
    Ok(format!(
        "Settings updated:\n- **Mode:** {}\n- **Enforcement:** {}",
        updated.mode, updated.enforcement
    ))
}

pub fn health(vault: &Vault) -> String {
    health::check(vault).to_markdown()
}

pub fn review(vault: &Vault, params: &ReviewParams) -> Result<String> {
    let tier = match params.vault.as_deref().filter(|v| !v.is_empty()) {
        Some(v) => v.parse::<Tier>().map_err(anyhow::Error::msg)?,
        None => Tier::Project,
    };
    let stale_days = params.stale_days.unwrap_or(DEFAULT_STALE_DAYS);
    Ok(review::review(vault, tier, stale_days)?.to_markdown())
}

/// Scan the project root; the project vault is created first if missing.
pub fn bootstrap(vault: &Vault) -> Result<String> {
    vault.ensure_initialized(Tier::Project)?;
    Ok(bootstrap::scan_project(&vault.paths().project_root).to_markdown())
}

pub fn import(vault: &Vault, params: &ImportParams) -> Result<String> {
    let source = params.source_path.trim();
    if source.is_empty() {
        bail!("source_path is required. Use \"legacy\" to import from .claude/vault/");
    }
    migrate::import(vault, source)
}

pub fn upgrade(vault: &Vault) -> Result<String> {
    let fixes = migrate::upgrade(vault)?;
    Ok(migrate::upgrade_report(&fixes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::enforcement::DomainClassifier;
    use crate::vault::manager::VaultPaths;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        let paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
        (tmp, Vault::new(paths, DomainClassifier::default()))
    }

    #[test]
    fn init_then_status() {
        let (_tmp, v) = vault();
        let before = status(&v).unwrap();
        assert!(before.contains("| **Project Vault** | Not initialized |"));
        assert!(before.ends_with("> **Tip:** Run ctx_init to initialize the project vault."));

        let reply = init(&v, &InitParams::default()).unwrap();
        assert!(reply.starts_with("## Setup Complete\n\nVault initialized at "));
        assert!(reply.contains("**Mode:** local | **Enforcement:** balanced"));

        let again = init(&v, &InitParams::default()).unwrap();
        assert!(again.contains("Project vault already initialized."));

        let after = status(&v).unwrap();
        assert!(after.contains("| **Project Vault** | 0/50 docs |"));
        assert!(!after.contains("Tip:"));
    }

    #[test]
    fn mode_shows_and_updates() {
        let (_tmp, v) = vault();
        let shown = mode(&v, &ModeParams::default()).unwrap();
        assert!(shown.starts_with("Current mode: **local** | Enforcement: **balanced**"));

        let updated = mode(
            &v,
            &ModeParams {
                mode: Some("full".into()),
                enforcement: Some("extreme".into()),
            },
        )
        .unwrap();
        assert_eq!(
            updated,
            "Settings updated:\n- **Mode:** full\n- **Enforcement:** balanced"
        );
        assert_eq!(v.settings().mode, Mode::Full);
    }

    #[test]
    fn review_requires_initialized_tier() {
        let (_tmp, v) = vault();
        let err = review(&v, &ReviewParams::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "project vault not initialized. Use ctx_init to create it."
        );

        v.init_project(false).unwrap();
        let out = review(&v, &ReviewParams::default()).unwrap();
        assert!(out.contains("**Documents reviewed:** 0"));
        assert!(out.contains("**All clear!**"));
    }

    #[test]
    fn bootstrap_initializes_project() {
        let (_tmp, v) = vault();
        std::fs::create_dir_all(&v.paths().project_root).unwrap();
        std::fs::write(v.paths().project_root.join("Cargo.toml"), "[package]").unwrap();

        let out = bootstrap(&v).unwrap();
        assert!(v.exists(Tier::Project));
        assert!(out.contains("- **Languages:** Rust"));
    }

    #[test]
    fn import_requires_source() {
        let (_tmp, v) = vault();
        let err = import(&v, &ImportParams { source_path: " ".into() }).unwrap_err();
        assert!(err.to_string().starts_with("source_path is required."));
    }

    #[test]
    fn upgrade_is_idempotent() {
        let (_tmp, v) = vault();
        assert!(upgrade(&v).unwrap().starts_with("# Vault Upgraded"));
        assert!(upgrade(&v).unwrap().starts_with("# Vault Up to Date"));
    }
}
