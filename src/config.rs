use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VaultConfig {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub enforcement: EnforcementConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
    pub check_updates: bool,
    pub update_url: String,
    pub update_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub global_dir: String,
    /// Empty means the process working directory.
    pub project_root: String,
    pub legacy_global_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EnforcementConfig {
    /// Ordered domain rules; the first rule with a matching pattern wins.
    pub domains: Vec<DomainRule>,
}

/// One entry of the domain categorisation table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DomainRule {
    pub name: String,
    pub patterns: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            check_updates: true,
            update_url: "https://crates.io/api/v1/crates/contextvault".into(),
            update_timeout_secs: 5,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            global_dir: "~/.contextvault".into(),
            project_root: String::new(),
            legacy_global_dir: "~/.claude/vault".into(),
        }
    }
}

impl Default for EnforcementConfig {
    fn default() -> Self {
        Self {
            domains: default_domain_rules(),
        }
    }
}

fn rule(name: &str, patterns: &[&str]) -> DomainRule {
    DomainRule {
        name: name.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

/// Built-in categories used when the config file does not override them.
pub fn default_domain_rules() -> Vec<DomainRule> {
    vec![
        rule(
            "frontend",
            &[
                r"/(components?|ui|views?|pages?|layouts?|widgets?)/",
                r"\.(tsx|jsx|vue|svelte)$",
                r"css|style|theme|tailwind",
            ],
        ),
        rule(
            "backend",
            &[
                r"/(api|routes?|controllers?|handlers?|middleware|endpoints?)/",
                r"server|express|fastify|nest",
            ],
        ),
        rule(
            "database",
            &[
                r"/(models?|schemas?|migrations?|seeds?|entities|repositories)/",
                r"prisma|drizzle|typeorm|sequelize|mongoose|sql|database",
            ],
        ),
        rule(
            "testing",
            &[
                r"/(tests?|__tests__|spec|e2e|integration|unit)/",
                r"\.(test|spec)\.(ts|js|tsx|jsx)$",
                r"jest|vitest|mocha|cypress|playwright",
            ],
        ),
        rule(
            "config",
            &[
                r"/(config|configs|\.config|settings)/",
                r"dockerfile|docker-compose|\.yml$|\.yaml$|webpack|vite|tsconfig|package\.json",
            ],
        ),
        rule("utils", &[r"/(utils?|helpers?|lib|common|shared)/"]),
        rule("services", &[r"/(services?|usecases?|domains?|core)/"]),
        rule("types", &[r"/(types?|interfaces?|dtos?)/", r"\.d\.ts$"]),
        rule(
            "docs",
            &[r"\.(md|mdx|txt|rst)$", r"/(docs?|documentation|content)/"],
        ),
    ]
}

/// Returns `~/.contextvault/`
pub fn default_vault_dir() -> PathBuf {
    expand_tilde("~/.contextvault")
}

/// Returns the default config file path: `~/.contextvault/config.toml`
pub fn default_config_path() -> PathBuf {
    default_vault_dir().join("config.toml")
}

impl VaultConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            VaultConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (CONTEXTVAULT_HOME, CONTEXTVAULT_PROJECT, CONTEXTVAULT_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CONTEXTVAULT_HOME") {
            self.paths.global_dir = val;
        }
        if let Ok(val) = std::env::var("CONTEXTVAULT_PROJECT") {
            self.paths.project_root = val;
        }
        if let Ok(val) = std::env::var("CONTEXTVAULT_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the global vault directory, expanding `~` if needed.
    pub fn resolved_global_dir(&self) -> PathBuf {
        expand_tilde(&self.paths.global_dir)
    }

    pub fn resolved_legacy_global_dir(&self) -> PathBuf {
        expand_tilde(&self.paths.legacy_global_dir)
    }

    /// Resolve the project root; falls back to the working directory.
    pub fn resolved_project_root(&self) -> PathBuf {
        if self.paths.project_root.is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            expand_tilde(&self.paths.project_root)
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = VaultConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert!(config.server.check_updates);
        assert_eq!(config.server.update_timeout_secs, 5);
        assert!(config.paths.global_dir.ends_with(".contextvault"));
        assert_eq!(config.enforcement.domains.len(), 9);
        assert_eq!(config.enforcement.domains[0].name, "frontend");
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
check_updates = false

[paths]
global_dir = "/tmp/vault-home"

[[enforcement.domains]]
name = "infra"
patterns = ["terraform", "\\.tf$"]
"#;
        let config: VaultConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert!(!config.server.check_updates);
        assert_eq!(config.paths.global_dir, "/tmp/vault-home");
        assert_eq!(config.enforcement.domains.len(), 1);
        assert_eq!(config.enforcement.domains[0].name, "infra");
        // defaults still apply for unset fields
        assert_eq!(config.server.update_timeout_secs, 5);
        assert_eq!(config.paths.legacy_global_dir, "~/.claude/vault");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = VaultConfig::default();
        std::env::set_var("CONTEXTVAULT_HOME", "/tmp/override-home");
        std::env::set_var("CONTEXTVAULT_PROJECT", "/tmp/override-project");
        std::env::set_var("CONTEXTVAULT_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.paths.global_dir, "/tmp/override-home");
        assert_eq!(config.paths.project_root, "/tmp/override-project");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("CONTEXTVAULT_HOME");
        std::env::remove_var("CONTEXTVAULT_PROJECT");
        std::env::remove_var("CONTEXTVAULT_LOG_LEVEL");
    }

    #[test]
    fn project_root_override_is_used() {
        let mut config = VaultConfig::default();
        config.paths.project_root = "/srv/app".into();
        assert_eq!(config.resolved_project_root(), PathBuf::from("/srv/app"));
    }
}
