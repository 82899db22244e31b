//! The vault facade: both tiers, settings, documents and enforcement state,
//! owned by one long-lived instance per server process.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::documents::{self, generate_content, DocumentStore, Sections};
use super::enforcement::{DomainClassifier, EnforcementTracker};
use super::error::VaultError;
use super::index::{ArchiveOutcome, IndexStore};
use super::settings::{Settings, SettingsStore};
use super::types::{is_doc_filename, today, DocId, DocType, EntryUpdate, IndexEntry, Tier};
use crate::config::VaultConfig;

/// Resolved on-disk locations.
#[derive(Debug, Clone)]
pub struct VaultPaths {
    pub global_dir: PathBuf,
    pub project_root: PathBuf,
    pub project_dir: PathBuf,
    pub legacy_global_dir: PathBuf,
}

impl VaultPaths {
    /// Plain layout: `global_dir` and `<project_root>/.contextvault`.
    pub fn new(global_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            global_dir: global_dir.into(),
            project_dir: project_root.join(".contextvault"),
            legacy_global_dir: PathBuf::new(),
            project_root,
        }
    }

    /// Layout from config, preferring a legacy `.claude/vault` location that
    /// already holds an index.
    pub fn detect(config: &VaultConfig) -> Self {
        let legacy_global_dir = config.resolved_legacy_global_dir();
        let project_root = config.resolved_project_root();

        let global_dir = if legacy_global_dir.join("index.md").exists() {
            legacy_global_dir.clone()
        } else {
            config.resolved_global_dir()
        };

        let legacy_project_dir = legacy_project_dir(&project_root);
        let project_dir = if legacy_project_dir.join("index.md").exists() {
            legacy_project_dir
        } else {
            project_root.join(".contextvault")
        };

        Self {
            global_dir,
            project_root,
            project_dir,
            legacy_global_dir,
        }
    }
}

fn legacy_project_dir(project_root: &Path) -> PathBuf {
    project_root.join(".claude").join("vault")
}

/// Result of `init_project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyInitialized,
    Initialized(PathBuf),
}

impl fmt::Display for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => f.write_str(
                "Project vault already initialized. Use force=true to reinitialize.",
            ),
            Self::Initialized(path) => write!(f, "Vault initialized at {}", path.display()),
        }
    }
}

/// A cross-tier search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: DocId,
    pub topic: String,
    pub summary: String,
    pub tier: Tier,
    pub score: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultStats {
    pub global_docs: usize,
    pub project_docs: usize,
    pub global_max_docs: usize,
    pub project_max_docs: usize,
    pub global_path: PathBuf,
    pub project_path: PathBuf,
    pub global_exists: bool,
    pub project_exists: bool,
    pub mode: String,
    pub enforcement: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub imported: usize,
    pub skipped: usize,
}

/// Everything needed to create a new indexed document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub tier: Tier,
    pub doc_type: DocType,
    /// Filename infix between id and slug (`error`, `plan`, ...).
    pub kind: Option<&'static str>,
    pub slug: String,
    pub title: String,
    /// Index topic; defaults to the title.
    pub topic: Option<String>,
    pub summary: String,
    pub sections: Sections,
    pub related_terms: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedDocument {
    pub id: DocId,
    pub filename: String,
    pub path: PathBuf,
}

pub struct Vault {
    paths: VaultPaths,
    settings: SettingsStore,
    global_index: IndexStore,
    project_index: IndexStore,
    docs: DocumentStore,
    enforcement: EnforcementTracker,
}

impl Vault {
    pub fn new(paths: VaultPaths, classifier: DomainClassifier) -> Self {
        let project_name = paths
            .project_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        Self {
            settings: SettingsStore::new(&paths.global_dir),
            global_index: IndexStore::global(&paths.global_dir),
            project_index: IndexStore::project(&paths.project_dir, project_name),
            docs: DocumentStore::new(&paths.global_dir, &paths.project_dir),
            enforcement: EnforcementTracker::new(classifier),
            paths,
        }
    }

    /// Build from config: detected paths plus the configured domain table.
    pub fn open(config: &VaultConfig) -> Self {
        let paths = VaultPaths::detect(config);
        tracing::info!(
            global = %paths.global_dir.display(),
            project = %paths.project_dir.display(),
            "vault opened"
        );
        Self::new(paths, DomainClassifier::new(&config.enforcement.domains))
    }

    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    pub fn dir(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Global => &self.paths.global_dir,
            Tier::Project => &self.paths.project_dir,
        }
    }

    pub fn index(&self, tier: Tier) -> &IndexStore {
        match tier {
            Tier::Global => &self.global_index,
            Tier::Project => &self.project_index,
        }
    }

    pub fn docs(&self) -> &DocumentStore {
        &self.docs
    }

    pub fn settings_store(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings(&self) -> Settings {
        self.settings.load()
    }

    pub fn exists(&self, tier: Tier) -> bool {
        self.index(tier).exists()
    }

    // ── Initialisation ───────────────────────────────────────────────────────

    /// Create the global index and settings when missing. Never overwrites.
    pub fn init_global(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.global_dir).with_context(|| {
            format!("failed to create {}", self.paths.global_dir.display())
        })?;
        if !self.global_index.exists() {
            self.global_index.initialize()?;
        }
        if !self.settings.exists() {
            self.settings.save(&Settings::default())?;
        }
        Ok(())
    }

    pub fn init_project(&self, force: bool) -> Result<InitOutcome> {
        if self.project_index.exists() && !force {
            return Ok(InitOutcome::AlreadyInitialized);
        }
        self.init_global()?;
        self.project_index.initialize()?;
        Ok(InitOutcome::Initialized(self.paths.project_dir.clone()))
    }

    /// Initialise `tier` if its index is missing.
    pub fn ensure_initialized(&self, tier: Tier) -> Result<()> {
        if self.exists(tier) {
            return Ok(());
        }
        match tier {
            Tier::Global => self.init_global(),
            Tier::Project => self.init_project(false).map(|_| ()),
        }
    }

    /// Fail with [`VaultError::NotInitialized`] when `tier` has no index.
    pub fn require(&self, tier: Tier) -> Result<&IndexStore> {
        if !self.exists(tier) {
            return Err(VaultError::NotInitialized(tier).into());
        }
        Ok(self.index(tier))
    }

    // ── Documents ────────────────────────────────────────────────────────────

    pub fn max_docs(&self, tier: Tier) -> usize {
        let limits = self.settings().limits;
        match tier {
            Tier::Global => limits.max_global_docs,
            Tier::Project => limits.max_project_docs,
        }
    }

    /// Capacity counts active and archived rows alike.
    pub fn check_capacity(&self, tier: Tier) -> Result<()> {
        let count = self.index(tier).entry_count()?;
        let max = self.max_docs(tier);
        if count >= max {
            return Err(VaultError::CapacityExceeded { tier, count, max }.into());
        }
        Ok(())
    }

    /// Write a document file and reset the enforcement counters.
    pub fn write_document(&mut self, tier: Tier, filename: &str, content: &str) -> Result<PathBuf> {
        let path = self.docs.write(tier, filename, content)?;
        self.enforcement.reset();
        Ok(path)
    }

    /// Allocate an id, render, write and index a new document.
    pub fn create_document(&mut self, doc: NewDocument) -> Result<CreatedDocument> {
        self.ensure_initialized(doc.tier)?;
        self.check_capacity(doc.tier)?;

        let index = self.index(doc.tier).clone();
        let id = index.next_id()?;
        let filename = documents::doc_filename(id, doc.kind, &doc.slug);
        let content = generate_content(id, &doc.title, doc.doc_type, &doc.sections, &today());
        let path = self.write_document(doc.tier, &filename, &content)?;

        let topic = doc.topic.unwrap_or(doc.title);
        index.add_entry(&IndexEntry::active(id, topic, doc.summary))?;
        // The document and its row are already saved; a missing hint table
        // must not turn that into a failure.
        if let Some(terms) = doc.related_terms.filter(|t| !t.is_empty()) {
            if let Err(e) = index.add_related_terms(&terms, id) {
                tracing::warn!(id = %id, error = %format!("{e:#}"), "related terms not recorded");
            }
        }

        tracing::info!(id = %id, tier = %doc.tier, file = %filename, "document created");
        Ok(CreatedDocument { id, filename, path })
    }

    pub fn find_doc_path(&self, id: DocId) -> Option<PathBuf> {
        self.docs.find_path(id)
    }

    pub fn read_document(&self, id: DocId) -> Result<Option<String>> {
        self.docs.read(id)
    }

    pub fn list_doc_files(&self, tier: Tier) -> Vec<String> {
        self.docs.list(tier)
    }

    /// Splice content into a document, stamp it, record history, mark its
    /// index row Active and reset enforcement.
    pub fn update_document(&mut self, id: DocId, section: Option<&str>, content: &str) -> Result<()> {
        let date = today();
        let section = section.filter(|s| !s.is_empty());
        let change = match section {
            Some(section) => format!("Updated {section}"),
            None => "Updated".to_string(),
        };

        let rewritten = self.docs.rewrite(id, |text| {
            let text = documents::append_to_section(text, section, content);
            let text = documents::touch_last_updated(&text, &date);
            documents::add_history_row(&text, &date, &change)
        })?;
        if rewritten.is_none() {
            return Err(VaultError::NotFound {
                id: id.to_string(),
                tier: id.tier,
            }
            .into());
        }

        if self.exists(id.tier) {
            let update = EntryUpdate {
                status: Some("Active".to_string()),
                ..Default::default()
            };
            self.index(id.tier).update_entry(id, &update)?;
        }
        self.enforcement.reset();
        Ok(())
    }

    /// Add Related Documents links in both directions. Returns `false` when
    /// `from` already links to `to`.
    pub fn link_documents(&self, from: DocId, to: DocId) -> Result<bool> {
        for id in [from, to] {
            if self.docs.find_path(id).is_none() {
                return Err(VaultError::NotFound {
                    id: id.to_string(),
                    tier: id.tier,
                }
                .into());
            }
        }

        let date = today();
        let from_text = self.docs.read(from)?.unwrap_or_default();
        if documents::add_related_link(&from_text, to).is_none() {
            return Ok(false);
        }

        for (doc, target) in [(from, to), (to, from)] {
            self.docs.rewrite(doc, |text| {
                let text = documents::add_related_link(text, target).unwrap_or_else(|| text.to_string());
                documents::touch_last_updated(&text, &date)
            })?;
        }
        tracing::info!(from = %from, to = %to, "documents linked");
        Ok(true)
    }

    pub fn archive(&self, id: DocId, reason: &str) -> Result<ArchiveOutcome> {
        self.require(id.tier)?.archive_entry(id, reason)
    }

    // ── Search & stats ───────────────────────────────────────────────────────

    /// Mode-aware search: project hits first, then global.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mode = self.settings().mode;
        let mut results = Vec::new();

        let tiers = [
            (Tier::Project, mode.includes_project()),
            (Tier::Global, mode.includes_global()),
        ];
        for (tier, included) in tiers {
            if !included || !self.exists(tier) {
                continue;
            }
            for hit in self.index(tier).search(query)? {
                results.push(SearchResult {
                    id: hit.entry.id,
                    topic: hit.entry.topic,
                    summary: hit.entry.summary,
                    tier,
                    score: hit.score,
                });
            }
        }
        Ok(results)
    }

    pub fn stats(&self) -> Result<VaultStats> {
        let settings = self.settings();
        let count = |tier: Tier| -> Result<usize> {
            if self.exists(tier) {
                self.index(tier).entry_count()
            } else {
                Ok(0)
            }
        };
        Ok(VaultStats {
            global_docs: count(Tier::Global)?,
            project_docs: count(Tier::Project)?,
            global_max_docs: settings.limits.max_global_docs,
            project_max_docs: settings.limits.max_project_docs,
            global_path: self.paths.global_dir.clone(),
            project_path: self.paths.project_dir.clone(),
            global_exists: self.exists(Tier::Global),
            project_exists: self.exists(Tier::Project),
            mode: settings.mode.to_string(),
            enforcement: settings.enforcement.to_string(),
        })
    }

    // ── Enforcement ──────────────────────────────────────────────────────────

    pub fn enforcement(&self) -> &EnforcementTracker {
        &self.enforcement
    }

    /// Record a non-vault edit forwarded by the host.
    pub fn track_edit(&mut self, file: Option<&str>) {
        self.enforcement.track_edit(file);
    }

    pub fn track_research(&mut self, identifier: Option<&str>) {
        self.enforcement.track_research(identifier);
    }

    pub fn reset_enforcement(&mut self) {
        self.enforcement.reset();
    }

    pub fn edit_reminder(&self) -> Option<String> {
        self.enforcement.edit_reminder(self.settings().enforcement)
    }

    pub fn research_reminder(&self) -> Option<String> {
        self.enforcement.research_reminder(self.settings().enforcement)
    }

    // ── Legacy migration ─────────────────────────────────────────────────────

    /// The legacy `.claude/vault` directory for `tier`, if present.
    pub fn legacy_dir(&self, tier: Tier) -> Option<PathBuf> {
        let dir = match tier {
            Tier::Global => self.paths.legacy_global_dir.clone(),
            Tier::Project => legacy_project_dir(&self.paths.project_root),
        };
        (!dir.as_os_str().is_empty() && dir.is_dir() && dir != self.dir(tier)).then_some(dir)
    }

    /// Copy documents, `index.md` and `settings.json` from `source` into the
    /// tier directory. Existing destination files are skipped, never merged.
    pub fn import_from_legacy(&self, source: &Path, tier: Tier) -> Result<ImportCounts> {
        let mut counts = ImportCounts::default();
        if !source.is_dir() {
            return Ok(counts);
        }
        let target = self.dir(tier);

        let mut names: Vec<String> = std::fs::read_dir(source)
            .with_context(|| format!("failed to list {}", source.display()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| is_doc_filename(name) || name == "index.md" || name == "settings.json")
            .collect();
        names.sort();

        for name in names {
            let dest = target.join(&name);
            if dest.exists() {
                counts.skipped += 1;
                continue;
            }
            std::fs::create_dir_all(target)
                .with_context(|| format!("failed to create {}", target.display()))?;
            std::fs::copy(source.join(&name), &dest)
                .with_context(|| format!("failed to copy {name} into {}", target.display()))?;
            counts.imported += 1;
        }

        tracing::info!(
            source = %source.display(),
            tier = %tier,
            imported = counts.imported,
            skipped = counts.skipped,
            "legacy import finished"
        );
        Ok(counts)
    }
}
