//! Operational settings persisted as `settings.json` in the global vault.
//!
//! Loading never fails. The file is merged into [`Settings::default`] field by
//! field, so a missing or invalid value only resets that one field, and a
//! missing or unparseable file yields the defaults.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Which tiers participate in cross-tier search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Project tier only.
    #[default]
    Local,
    /// Global tier only.
    Global,
    /// Both tiers.
    Full,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Full => "full",
        }
    }

    pub fn includes_project(&self) -> bool {
        !matches!(self, Self::Global)
    }

    pub fn includes_global(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "global" => Ok(Self::Global),
            "full" => Ok(Self::Full),
            _ => Err(format!("unknown mode: {s}")),
        }
    }
}

/// How aggressively documentation reminders fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    Light,
    #[default]
    Balanced,
    Strict,
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Balanced => "balanced",
            Self::Strict => "strict",
        }
    }
}

impl std::fmt::Display for Enforcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Enforcement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "balanced" => Ok(Self::Balanced),
            "strict" => Ok(Self::Strict),
            _ => Err(format!("unknown enforcement level: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_global_docs: usize,
    pub max_project_docs: usize,
    pub max_doc_lines: usize,
    pub max_summary_words: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_global_docs: 50,
            max_project_docs: 50,
            max_doc_lines: 100,
            max_summary_words: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
    pub enforcement: Enforcement,
    pub limits: Limits,
}

/// `obj[key]` when present and of the right shape.
fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    let value = obj.get(key)?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(field = key, error = %e, "ignoring invalid setting");
            None
        }
    }
}

impl Limits {
    fn merged(obj: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            max_global_docs: field(obj, "max_global_docs").unwrap_or(defaults.max_global_docs),
            max_project_docs: field(obj, "max_project_docs").unwrap_or(defaults.max_project_docs),
            max_doc_lines: field(obj, "max_doc_lines").unwrap_or(defaults.max_doc_lines),
            max_summary_words: field(obj, "max_summary_words")
                .unwrap_or(defaults.max_summary_words),
        }
    }
}

impl Settings {
    /// Overlay the recognised fields of a parsed settings object on the defaults.
    pub fn merged(obj: &Map<String, Value>) -> Self {
        let limits = match obj.get("limits") {
            Some(Value::Object(limits)) => Limits::merged(limits),
            _ => Limits::default(),
        };
        Self {
            mode: field(obj, "mode").unwrap_or_default(),
            enforcement: field(obj, "enforcement").unwrap_or_default(),
            limits,
        }
    }
}

/// Reads and writes the global `settings.json`.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(global_dir: &Path) -> Self {
        Self {
            path: global_dir.join("settings.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Settings {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Settings::default(),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(obj)) => Settings::merged(&obj),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "settings is not a JSON object, using defaults");
                Settings::default()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(settings).context("failed to serialize settings")?;
        std::fs::write(&self.path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), mode = %settings.mode, enforcement = %settings.enforcement, "settings saved");
        Ok(())
    }

    /// Change mode and/or enforcement, persisting the result.
    pub fn update(&self, mode: Option<Mode>, enforcement: Option<Enforcement>) -> Result<Settings> {
        let mut current = self.load();
        if let Some(mode) = mode {
            current.mode = mode;
        }
        if let Some(enforcement) = enforcement {
            current.enforcement = enforcement;
        }
        self.save(&current)?;
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::new(tmp.path());
        let settings = store.load();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mode, Mode::Local);
        assert_eq!(settings.enforcement, Enforcement::Balanced);
        assert_eq!(settings.limits.max_project_docs, 50);
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("settings.json"),
            r#"{ "mode": "full", "limits": { "max_project_docs": 3 } }"#,
        )
        .unwrap();
        let settings = SettingsStore::new(tmp.path()).load();
        assert_eq!(settings.mode, Mode::Full);
        assert_eq!(settings.enforcement, Enforcement::Balanced);
        assert_eq!(settings.limits.max_project_docs, 3);
        assert_eq!(settings.limits.max_global_docs, 50);
        assert_eq!(settings.limits.max_doc_lines, 100);
    }

    #[test]
    fn invalid_field_only_resets_that_field() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("settings.json"),
            r#"{ "mode": "everything", "enforcement": "strict",
                 "limits": { "max_project_docs": "lots", "max_global_docs": 7 } }"#,
        )
        .unwrap();
        let settings = SettingsStore::new(tmp.path()).load();
        assert_eq!(settings.mode, Mode::Local);
        assert_eq!(settings.enforcement, Enforcement::Strict);
        assert_eq!(settings.limits.max_project_docs, 50);
        assert_eq!(settings.limits.max_global_docs, 7);
    }

    #[test]
    fn garbage_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("settings.json"), "{ not json").unwrap();
        assert_eq!(SettingsStore::new(tmp.path()).load(), Settings::default());
        std::fs::write(tmp.path().join("settings.json"), "[1, 2]").unwrap();
        assert_eq!(SettingsStore::new(tmp.path()).load(), Settings::default());
    }

    #[test]
    fn save_writes_legacy_json_shape() {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::new(&tmp.path().join("nested"));
        store.save(&Settings::default()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["mode"], "local");
        assert_eq!(value["enforcement"], "balanced");
        assert_eq!(value["limits"]["max_global_docs"], 50);
        assert_eq!(value["limits"]["max_summary_words"], 15);
    }

    #[test]
    fn update_persists_changes() {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::new(tmp.path());
        let updated = store.update(Some(Mode::Global), None).unwrap();
        assert_eq!(updated.mode, Mode::Global);
        assert_eq!(updated.enforcement, Enforcement::Balanced);

        store.update(None, Some(Enforcement::Strict)).unwrap();
        let reloaded = store.load();
        assert_eq!(reloaded.mode, Mode::Global);
        assert_eq!(reloaded.enforcement, Enforcement::Strict);
    }
}
