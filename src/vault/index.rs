//! Per-tier `index.md` catalog.
//!
//! The index is a human-readable markdown file holding three tables (Active
//! Documents, Related Terms Map, Archived) plus a Quick Stats block. It is read
//! whole, transformed in memory and written whole. Table rows are recognised by
//! a small line scanner ([`scan_rows`]) rather than a markdown parser so that
//! hand-edited files keep working: cells are `|`-split, trimmed, and empty
//! cells dropped. A `\|` inside a cell is a literal pipe; writers escape with
//! [`table_cell`](super::types::table_cell) and never emit an empty cell.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::error::VaultError;
use super::types::{
    doc_id_of_filename, table_cell, today, ArchivedEntry, DocId, EntryUpdate, IndexEntry, Tier,
};

/// Placeholder row of an empty Archived table.
const ARCHIVED_SENTINEL: &str = "| - | - | - | - |";

// ── Line scanner ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    BeforeTable,
    InHeader,
    InRows,
}

/// Which entry tables a scan visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableScope {
    /// Every `| ID | Topic ...` table (Active and Archived).
    All,
    /// Only the first table after the "Active Documents" heading.
    Active,
    /// Only the `| ID | Topic | Archived | Reason |` table.
    Archived,
}

fn is_entry_header(line: &str) -> bool {
    line.contains("| ID") && line.contains("| Topic")
}

fn is_archived_header(line: &str) -> bool {
    is_entry_header(line) && line.contains("| Archived") && line.contains("| Reason")
}

fn is_active_heading(line: &str) -> bool {
    line.contains("Active Documents") || line.contains("## Active")
}

/// `^\|[-\s|]+\|$`
fn is_separator(line: &str) -> bool {
    line.len() >= 3
        && line.starts_with('|')
        && line.ends_with('|')
        && line[1..line.len() - 1]
            .chars()
            .all(|c| c == '-' || c == '|' || c.is_whitespace())
}

fn cells(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => out.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    out.push(cell);
    out.into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_row(line: &str) -> Option<IndexEntry> {
    let cells = cells(line);
    if cells.len() < 4 {
        return None;
    }
    let mut cells = cells.into_iter();
    let id: DocId = cells.next()?.parse().ok()?;
    Some(IndexEntry {
        id,
        topic: cells.next()?,
        status: cells.next()?,
        summary: cells.next()?,
    })
}

/// Scan `lines` and return each recognised data row with its line index.
fn scan_rows(lines: &[&str], scope: TableScope) -> Vec<(usize, IndexEntry)> {
    let mut rows = Vec::new();
    let mut state = ScanState::BeforeTable;
    let mut seen_active_heading = false;

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim_end_matches('\r');
        match state {
            ScanState::BeforeTable => {
                let header = match scope {
                    TableScope::All => is_entry_header(line),
                    TableScope::Archived => is_archived_header(line),
                    TableScope::Active => {
                        if !seen_active_heading && is_active_heading(line) {
                            seen_active_heading = true;
                            continue;
                        }
                        seen_active_heading && is_entry_header(line)
                    }
                };
                if header {
                    state = ScanState::InHeader;
                }
            }
            ScanState::InHeader => {
                if is_separator(line) {
                    state = ScanState::InRows;
                }
            }
            ScanState::InRows => {
                if line.starts_with('|') {
                    if let Some(entry) = parse_row(line) {
                        rows.push((idx, entry));
                    }
                } else if !line.trim().is_empty() {
                    if scope != TableScope::All {
                        break;
                    }
                    state = ScanState::BeforeTable;
                }
            }
        }
    }

    rows
}

/// Index of the first line after the table whose header is at `header_idx`.
fn table_end(lines: &[&str], header_idx: usize) -> usize {
    (header_idx + 2..lines.len())
        .find(|&j| {
            let line = lines[j].trim_end_matches('\r');
            !line.starts_with('|') || line.trim().is_empty()
        })
        .unwrap_or(lines.len())
}

// ── Text transforms ──────────────────────────────────────────────────────────

fn entries_stat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Entries:\*\*\s*\d+\s*/\s*\d+\s*max").expect("valid regex"))
}

fn last_updated_stat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Last updated:\*\*\s*\S+").expect("valid regex"))
}

/// Recompute the Quick Stats block: active entry count and last-updated date.
fn refresh_stats(text: &str, date: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let count = scan_rows(&lines, TableScope::Active).len();
    let text = entries_stat_re().replace(text, format!("**Entries:** {count} / 50 max"));
    last_updated_stat_re()
        .replace(&text, format!("**Last updated:** {date}"))
        .into_owned()
}

/// Append a row at the end of the Active Documents table.
fn insert_active_row(text: &str, row: &str) -> Result<String, VaultError> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let header = lines
        .iter()
        .position(|l| is_entry_header(l))
        .ok_or(VaultError::MissingTable("Active Documents"))?;
    let at = table_end(&lines, header);
    lines.insert(at, row);
    Ok(lines.join("\n"))
}

/// Append a row at the end of the Related Terms Map table.
fn insert_related_row(text: &str, row: &str) -> Result<String, VaultError> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    let header = lines
        .iter()
        .position(|l| l.contains("If searching for...") && l.contains("Check doc..."))
        .ok_or(VaultError::MissingTable("Related Terms Map"))?;
    let at = table_end(&lines, header);
    lines.insert(at, row);
    Ok(lines.join("\n"))
}

/// Put an archived row into the Archived table, replacing the sentinel row
/// when present.
fn insert_archived_row(lines: &mut Vec<String>, row: String) -> Result<(), VaultError> {
    let header = lines
        .iter()
        .position(|l| is_archived_header(l))
        .ok_or(VaultError::MissingTable("Archived"))?;

    for j in header + 2..lines.len() {
        let line = lines[j].trim_end_matches('\r');
        if line.contains(ARCHIVED_SENTINEL) {
            lines[j] = row;
            return Ok(());
        }
        if !line.starts_with('|') || line.trim().is_empty() {
            lines.insert(j, row);
            return Ok(());
        }
    }
    lines.push(row);
    Ok(())
}

// ── Store ────────────────────────────────────────────────────────────────────

/// A ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub entry: IndexEntry,
    /// Number of query terms found in `id + topic + summary`.
    pub score: usize,
}

/// Result of a successful archive transition.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub id: DocId,
    pub topic: String,
    /// Where the document file now lives, if one existed.
    pub archived_file: Option<PathBuf>,
    pub message: String,
}

/// Owns one tier's `index.md` and its `archive/` directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
    tier: Tier,
    project_name: String,
}

impl IndexStore {
    pub fn global(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tier: Tier::Global,
            project_name: String::new(),
        }
    }

    pub fn project(dir: impl Into<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            tier: Tier::Project,
            project_name: project_name.into(),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join("index.md")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.dir.join("archive")
    }

    pub fn exists(&self) -> bool {
        self.index_path().exists()
    }

    /// Raw index text; empty when the index does not exist.
    pub fn read_raw(&self) -> Result<String> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(String::new());
        }
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read index {}", path.display()))
    }

    fn write_raw(&self, text: &str) -> Result<()> {
        let path = self.index_path();
        std::fs::write(&path, text)
            .with_context(|| format!("failed to write index {}", path.display()))
    }

    fn lines_of(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    /// Write a fresh, empty index (overwrites an existing one).
    pub fn initialize(&self) -> Result<()> {
        std::fs::create_dir_all(self.archive_dir())
            .with_context(|| format!("failed to create {}", self.archive_dir().display()))?;
        self.write_raw(&self.template(&today()))?;
        tracing::info!(tier = %self.tier, path = %self.index_path().display(), "index initialized");
        Ok(())
    }

    fn template(&self, date: &str) -> String {
        let (label, blurb, read_first, own_note, cross_note) = match self.tier {
            Tier::Global => (
                "Global".to_string(),
                "Cross-project knowledge. Reusable patterns and best practices.",
                "",
                "G### prefix = Global docs (this folder)",
                "P### prefix = Project docs (./.contextvault/)",
            ),
            Tier::Project => (
                format!("Project ({})", self.project_name),
                "Project-specific knowledge. Only relevant to THIS project.",
                "> Read global index (~/.contextvault/index.md) FIRST.\n",
                "P### prefix = Project docs (this folder)",
                "G### prefix = Global docs (~/.contextvault/)",
            ),
        };

        format!(
            "# ContextVault Index - {label}

> **{blurb}**
{read_first}
---

## Active Documents

| ID   | Topic | Status | Summary (15 words max) |
|------|-------|--------|------------------------|

---

## Related Terms Map

> Find existing docs when search terms vary

| If searching for... | Check doc... |
|---------------------|--------------|

---

## Archived

| ID | Topic | Archived | Reason |
|----|-------|----------|--------|
{ARCHIVED_SENTINEL}

---

## Quick Stats

- **Entries:** 0 / 50 max
- **Last updated:** {date}

---

## Notes

- {own_note}
- {cross_note}
- Always search BOTH indexes before creating
"
        )
    }

    /// Entries from every entry table, Active and Archived alike.
    pub fn parse_all_entries(&self) -> Result<Vec<IndexEntry>> {
        let text = self.read_raw()?;
        Ok(scan_rows(&Self::lines_of(&text), TableScope::All)
            .into_iter()
            .map(|(_, e)| e)
            .collect())
    }

    /// Entries of the Active Documents table only.
    pub fn parse_active_entries(&self) -> Result<Vec<IndexEntry>> {
        let text = self.read_raw()?;
        Ok(scan_rows(&Self::lines_of(&text), TableScope::Active)
            .into_iter()
            .map(|(_, e)| e)
            .collect())
    }

    pub fn parse_archived_entries(&self) -> Result<Vec<ArchivedEntry>> {
        let text = self.read_raw()?;
        Ok(scan_rows(&Self::lines_of(&text), TableScope::Archived)
            .into_iter()
            .map(|(_, e)| ArchivedEntry {
                id: e.id,
                topic: e.topic,
                archived_date: e.status,
                reason: e.summary,
            })
            .collect())
    }

    /// `max(existing numbers) + 1` over archived rows and over document
    /// files on disk as well, so an id is never handed out twice.
    pub fn next_id(&self) -> Result<DocId> {
        let indexed = self.parse_all_entries()?.into_iter().map(|e| e.id);
        let on_disk = doc_ids_in(&self.dir)
            .into_iter()
            .chain(doc_ids_in(&self.archive_dir()));
        let max = indexed
            .chain(on_disk)
            .filter(|id| id.tier == self.tier)
            .map(|id| id.number)
            .max()
            .unwrap_or(0);
        Ok(DocId::new(self.tier, max + 1))
    }

    /// Active + archived rows; the figure capacity limits are checked against.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.parse_all_entries()?.len())
    }

    pub fn add_entry(&self, entry: &IndexEntry) -> Result<()> {
        let text = self.read_raw()?;
        let updated = insert_active_row(&text, &entry.to_row())?;
        self.write_raw(&refresh_stats(&updated, &today()))?;
        tracing::info!(id = %entry.id, topic = %entry.topic, "index entry added");
        Ok(())
    }

    /// Apply a partial update to an Active row. Returns `false` when `id` has no
    /// active row.
    pub fn update_entry(&self, id: DocId, update: &EntryUpdate) -> Result<bool> {
        let text = self.read_raw()?;
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();

        let found = {
            let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
            scan_rows(&borrowed, TableScope::Active)
                .into_iter()
                .find(|(_, e)| e.id == id)
        };

        let Some((idx, mut entry)) = found else {
            return Ok(false);
        };

        if let Some(topic) = &update.topic {
            entry.topic = topic.clone();
        }
        if let Some(status) = &update.status {
            entry.status = status.clone();
        }
        if let Some(summary) = &update.summary {
            entry.summary = summary.clone();
        }
        lines[idx] = entry.to_row();

        self.write_raw(&refresh_stats(&lines.join("\n"), &today()))?;
        tracing::debug!(id = %id, "index entry updated");
        Ok(true)
    }

    /// Append a `| terms | id |` hint row. No dedup.
    pub fn add_related_terms(&self, terms: &str, id: DocId) -> Result<()> {
        let text = self.read_raw()?;
        let updated = insert_related_row(&text, &format!("| {} | {id} |", table_cell(terms)))?;
        self.write_raw(&updated)
    }

    /// Score every entry (active + archived) by the number of whitespace
    /// separated query terms contained in `id topic summary`; highest first,
    /// ties in index order.
    pub fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let query = query.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .parse_all_entries()?
            .into_iter()
            .filter_map(|entry| {
                let haystack =
                    format!("{} {} {}", entry.id, entry.topic, entry.summary).to_lowercase();
                let score = terms.iter().filter(|t| haystack.contains(**t)).count();
                (score > 0).then_some(SearchHit { entry, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(hits)
    }

    /// Move `id` from the Active table to the Archived table and relocate its
    /// document under `archive/` with an ARCHIVED banner.
    pub fn archive_entry(&self, id: DocId, reason: &str) -> Result<ArchiveOutcome> {
        let text = self.read_raw()?;
        let all_lines = Self::lines_of(&text);

        let entry = scan_rows(&all_lines, TableScope::All)
            .into_iter()
            .map(|(_, e)| e)
            .find(|e| e.id == id)
            .ok_or(VaultError::NotFound {
                id: id.to_string(),
                tier: self.tier,
            })?;

        let active_idx = scan_rows(&all_lines, TableScope::Active)
            .into_iter()
            .find(|(_, e)| e.id == id)
            .map(|(idx, _)| idx)
            .ok_or(VaultError::NotActive {
                id: id.to_string(),
                tier: self.tier,
            })?;

        let date = today();
        let mut lines: Vec<String> = all_lines.iter().map(|l| l.to_string()).collect();
        lines.remove(active_idx);

        let archived = ArchivedEntry {
            id,
            topic: entry.topic.clone(),
            archived_date: date.clone(),
            reason: reason.to_string(),
        };
        insert_archived_row(&mut lines, archived.to_row())?;

        let archived_file = self.move_to_archive(id, &date, reason)?;

        self.write_raw(&refresh_stats(&lines.join("\n"), &date))?;
        tracing::info!(id = %id, tier = %self.tier, reason = %reason, "document archived");

        Ok(ArchiveOutcome {
            id,
            topic: entry.topic.clone(),
            archived_file,
            message: format!("Archived {id}: {}", entry.topic),
        })
    }

    fn move_to_archive(&self, id: DocId, date: &str, reason: &str) -> Result<Option<PathBuf>> {
        let Some(src) = find_doc_file(&self.dir, id) else {
            return Ok(None);
        };
        let archive_dir = self.archive_dir();
        std::fs::create_dir_all(&archive_dir)
            .with_context(|| format!("failed to create {}", archive_dir.display()))?;

        let content = std::fs::read_to_string(&src)
            .with_context(|| format!("failed to read {}", src.display()))?;
        let banner = format!("> **ARCHIVED:** {date}\n> **Reason:** {reason}\n\n---\n\n");

        let dest = archive_dir.join(src.file_name().unwrap_or_default());
        std::fs::write(&dest, format!("{banner}{content}"))
            .with_context(|| format!("failed to write {}", dest.display()))?;
        std::fs::remove_file(&src)
            .with_context(|| format!("failed to remove {}", src.display()))?;
        Ok(Some(dest))
    }
}

/// Ids of every document file directly inside `dir`.
fn doc_ids_in(dir: &Path) -> Vec<DocId> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    read.filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|name| doc_id_of_filename(&name))
        .collect()
}

/// First `{id}_*.md` file directly inside `dir`.
pub fn find_doc_file(dir: &Path, id: DocId) -> Option<PathBuf> {
    let prefix = format!("{id}_");
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix) && name.ends_with(".md"))
        .collect();
    names.sort();
    names.first().map(|name| dir.join(name))
}
