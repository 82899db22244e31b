//! Imports (legacy `.claude/vault`, directories, single files) and in-place
//! format upgrades.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use super::manager::{ImportCounts, Vault};
use super::types::Tier;

/// Where an import reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// Both legacy `.claude/vault` locations.
    Legacy,
    Directory(PathBuf),
    File(PathBuf),
}

impl ImportSource {
    pub fn parse(source: &str) -> Result<Self> {
        if source == "legacy" {
            return Ok(Self::Legacy);
        }
        let path = PathBuf::from(source);
        if !path.exists() {
            bail!("Source path not found: {source}");
        }
        if path.is_dir() {
            return Ok(Self::Directory(path));
        }
        if source.ends_with(".md") {
            return Ok(Self::File(path));
        }
        bail!("Unsupported source: {source}. Provide a directory path, .md file, or use \"legacy\".")
    }
}

/// Per-tier outcome of a legacy import; `None` when no legacy vault exists.
#[derive(Debug, Clone, Default)]
pub struct LegacyImport {
    pub global: Option<(PathBuf, ImportCounts)>,
    pub project: Option<(PathBuf, ImportCounts)>,
}

impl LegacyImport {
    pub fn totals(&self) -> ImportCounts {
        [&self.global, &self.project]
            .into_iter()
            .flatten()
            .fold(ImportCounts::default(), |acc, (_, c)| ImportCounts {
                imported: acc.imported + c.imported,
                skipped: acc.skipped + c.skipped,
            })
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Legacy Import\n\n");
        let sections = [
            ("Global", &self.global, "~/.claude/vault/"),
            ("Project", &self.project, "./.claude/vault/"),
        ];
        for (label, result, hint) in sections {
            match result {
                Some((source, counts)) => {
                    out += &format!(
                        "**{label}** ({}):\n- Imported: {} files\n- Skipped: {} (already exist)\n\n",
                        source.display(),
                        counts.imported,
                        counts.skipped
                    );
                }
                None => out += &format!("**{label}**: No legacy vault found at {hint}\n\n"),
            }
        }

        let totals = self.totals();
        out += &format!(
            "---\n**Total:** {} imported, {} skipped",
            totals.imported, totals.skipped
        );
        if totals.imported > 0 {
            out += "\n\n> **Note:** Imported files include index.md and settings.json. You may want to run **ctx_health** to verify vault integrity.";
        }
        out
    }
}

/// Copy both legacy vaults into place. Runs before any initialisation so an
/// imported `index.md` is never clobbered by a fresh one.
pub fn import_legacy(vault: &Vault) -> Result<LegacyImport> {
    let mut report = LegacyImport::default();

    for tier in [Tier::Global, Tier::Project] {
        let Some(source) = vault.legacy_dir(tier) else {
            continue;
        };
        let target = vault.dir(tier);
        std::fs::create_dir_all(target.join("archive"))
            .with_context(|| format!("failed to create {}", target.display()))?;

        let counts = vault.import_from_legacy(&source, tier)?;
        if tier == Tier::Global && !vault.settings_store().exists() {
            vault.settings_store().save(&vault.settings())?;
        }

        match tier {
            Tier::Global => report.global = Some((source, counts)),
            Tier::Project => report.project = Some((source, counts)),
        }
    }
    Ok(report)
}

/// Copy every `*.md` in `dir` into the project tier, skipping existing names.
pub fn import_directory(vault: &Vault, dir: &Path) -> Result<ImportCounts> {
    let target = vault.dir(Tier::Project);
    std::fs::create_dir_all(target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    let mut names: Vec<String> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".md"))
        .collect();
    names.sort();

    let mut counts = ImportCounts::default();
    for name in names {
        let dest = target.join(&name);
        if dest.exists() {
            counts.skipped += 1;
            continue;
        }
        std::fs::copy(dir.join(&name), &dest)
            .with_context(|| format!("failed to copy {name}"))?;
        counts.imported += 1;
    }
    tracing::info!(source = %dir.display(), imported = counts.imported, skipped = counts.skipped, "directory import finished");
    Ok(counts)
}

/// Copy one markdown file into the project tier. Returns `false` when a file
/// of the same name is already there.
pub fn import_file(vault: &Vault, file: &Path) -> Result<bool> {
    vault.ensure_initialized(Tier::Project)?;
    let name = file
        .file_name()
        .with_context(|| format!("not a file: {}", file.display()))?;
    let dest = vault.dir(Tier::Project).join(name);
    if dest.exists() {
        return Ok(false);
    }
    std::fs::copy(file, &dest).with_context(|| format!("failed to copy {}", file.display()))?;
    tracing::info!(file = %dest.display(), "file imported");
    Ok(true)
}

/// Run an import and describe the result.
pub fn import(vault: &Vault, source: &str) -> Result<String> {
    match ImportSource::parse(source)? {
        ImportSource::Legacy => Ok(import_legacy(vault)?.to_markdown()),
        ImportSource::Directory(dir) => {
            let counts = import_directory(vault, &dir)?;
            Ok(format!(
                "Imported {} files from {}\nSkipped: {} (already exist)\n\nRun **ctx_health** to verify vault integrity.",
                counts.imported,
                dir.display(),
                counts.skipped
            ))
        }
        ImportSource::File(file) => {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if import_file(vault, &file)? {
                Ok(format!(
                    "Imported **{name}** to project vault.\n\nRun **ctx_health** to verify."
                ))
            } else {
                Ok(format!(
                    "File {name} already exists in project vault. Use ctx_update to modify it."
                ))
            }
        }
    }
}

/// Whether the settings file on disk lacks any field.
fn settings_incomplete(path: &Path) -> bool {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
        return true;
    };
    let has = |v: &serde_json::Value, key: &str| v.get(key).is_some();
    let limits_complete = value.get("limits").is_some_and(|limits| {
        [
            "max_global_docs",
            "max_project_docs",
            "max_doc_lines",
            "max_summary_words",
        ]
        .iter()
        .all(|k| has(limits, k))
    });
    !(has(&value, "mode") && has(&value, "enforcement") && limits_complete)
}

/// Bring the on-disk layout up to date. Returns the fixes applied.
pub fn upgrade(vault: &Vault) -> Result<Vec<String>> {
    let mut fixes = Vec::new();

    if !vault.exists(Tier::Global) {
        vault.init_global()?;
        fixes.push("Initialized global vault".to_string());
    }

    let mut tiers = vec![Tier::Global];
    if vault.exists(Tier::Project) {
        tiers.push(Tier::Project);
    }
    for tier in tiers {
        let archive = vault.index(tier).archive_dir();
        if !archive.exists() {
            std::fs::create_dir_all(&archive)
                .with_context(|| format!("failed to create {}", archive.display()))?;
            fixes.push(format!("Created {tier} archive directory"));
        }
    }

    if settings_incomplete(vault.settings_store().path()) {
        vault.settings_store().save(&vault.settings())?;
        fixes.push("Updated settings with missing fields".to_string());
    }

    Ok(fixes)
}

pub fn upgrade_report(fixes: &[String]) -> String {
    if fixes.is_empty() {
        return "# Vault Up to Date\n\nNo upgrades needed. Everything looks good.".to_string();
    }
    let list: Vec<String> = fixes.iter().map(|f| format!("- {f}")).collect();
    format!("# Vault Upgraded\n\n{}", list.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::enforcement::DomainClassifier;
    use crate::vault::manager::VaultPaths;
    use tempfile::TempDir;

    fn vault(tmp: &TempDir) -> Vault {
        Vault::new(
            VaultPaths::new(tmp.path().join("home"), tmp.path().join("proj")),
            DomainClassifier::default(),
        )
    }

    #[test]
    fn parse_sources() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("note.md");
        let txt = tmp.path().join("note.txt");
        std::fs::write(&file, "# hi").unwrap();
        std::fs::write(&txt, "hi").unwrap();

        assert_eq!(ImportSource::parse("legacy").unwrap(), ImportSource::Legacy);
        assert_eq!(
            ImportSource::parse(tmp.path().to_str().unwrap()).unwrap(),
            ImportSource::Directory(tmp.path().to_path_buf())
        );
        assert_eq!(
            ImportSource::parse(file.to_str().unwrap()).unwrap(),
            ImportSource::File(file.clone())
        );
        assert!(ImportSource::parse(txt.to_str().unwrap()).is_err());
        assert!(ImportSource::parse("/no/such/path").is_err());
    }

    #[test]
    fn directory_and_file_import() {
        let tmp = TempDir::new().unwrap();
        let v = vault(&tmp);
        let src = tmp.path().join("src-docs");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("a.md"), "a").unwrap();
        std::fs::write(src.join("b.md"), "b").unwrap();
        std::fs::write(src.join("c.txt"), "c").unwrap();

        let counts = import_directory(&v, &src).unwrap();
        assert_eq!(counts, ImportCounts { imported: 2, skipped: 0 });
        let counts = import_directory(&v, &src).unwrap();
        assert_eq!(counts, ImportCounts { imported: 0, skipped: 2 });

        let single = tmp.path().join("extra.md");
        std::fs::write(&single, "x").unwrap();
        assert!(import_file(&v, &single).unwrap());
        assert!(!import_file(&v, &single).unwrap());
    }

    #[test]
    fn upgrade_repairs_layout() {
        let tmp = TempDir::new().unwrap();
        let v = vault(&tmp);
        let fixes = upgrade(&v).unwrap();
        assert_eq!(fixes, vec!["Initialized global vault"]);
        assert!(upgrade(&v).unwrap().is_empty());

        std::fs::remove_dir(v.index(Tier::Global).archive_dir()).unwrap();
        std::fs::write(v.settings_store().path(), r#"{ "mode": "full" }"#).unwrap();
        let fixes = upgrade(&v).unwrap();
        assert_eq!(
            fixes,
            vec!["Created global archive directory", "Updated settings with missing fields"]
        );
        let raw = std::fs::read_to_string(v.settings_store().path()).unwrap();
        assert!(raw.contains("\"mode\": \"full\""));
        assert!(raw.contains("\"max_summary_words\": 15"));
        assert!(upgrade_report(&fixes).starts_with("# Vault Upgraded\n\n- Created"));
    }
}
