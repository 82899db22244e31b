//! Core vault type definitions.
//!
//! Defines [`Tier`] (the two document collections), [`DocId`] (the `G###` / `P###`
//! identifier), [`DocType`] (document templates), and the index row types
//! [`IndexEntry`] and [`ArchivedEntry`].

use serde::{Deserialize, Serialize};

use super::error::VaultError;

/// One of the two independent document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Cross-project knowledge, rooted in the per-user vault directory.
    Global,
    /// Knowledge about the current working directory only.
    Project,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Project => "project",
        }
    }

    /// Single-letter id prefix owned by this tier.
    pub fn prefix(&self) -> char {
        match self {
            Self::Global => 'G',
            Self::Project => 'P',
        }
    }

    /// Resolve the tier that owns a document id. This is the only place the
    /// id prefix is inspected.
    pub fn of_id(id: &str) -> Result<Self, VaultError> {
        id.parse::<DocId>().map(|doc_id| doc_id.tier)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "project" => Ok(Self::Project),
            _ => Err(format!("unknown vault: {s} (expected 'global' or 'project')")),
        }
    }
}

/// Document identifier: tier prefix plus a number zero-padded to at least
/// three digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId {
    pub tier: Tier,
    pub number: u32,
}

impl DocId {
    pub fn new(tier: Tier, number: u32) -> Self {
        Self { tier, number }
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:03}", self.tier.prefix(), self.number)
    }
}

impl std::str::FromStr for DocId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let tier = match chars.next() {
            Some('G') => Tier::Global,
            Some('P') => Tier::Project,
            _ => return Err(VaultError::InvalidId(s.to_string())),
        };
        let digits = chars.as_str();
        // Padding only ever reaches three digits, so longer forms never lead with 0.
        let canonical = digits.len() == 3 || (digits.len() > 3 && !digits.starts_with('0'));
        if !canonical || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VaultError::InvalidId(s.to_string()));
        }
        let number = digits
            .parse()
            .map_err(|_| VaultError::InvalidId(s.to_string()))?;
        Ok(Self { tier, number })
    }
}

impl TryFrom<String> for DocId {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocId> for String {
    fn from(value: DocId) -> Self {
        value.to_string()
    }
}

/// True when `s` is a well-formed id such as `G001` or `P1000`.
pub fn is_doc_id(s: &str) -> bool {
    s.parse::<DocId>().is_ok()
}

/// True for document filenames: `<id>_<slug>.md`.
pub fn is_doc_filename(name: &str) -> bool {
    doc_id_of_filename(name).is_some()
}

/// The id a document filename starts with.
pub fn doc_id_of_filename(name: &str) -> Option<DocId> {
    if !name.ends_with(".md") {
        return None;
    }
    let (id, _) = name.split_once('_')?;
    id.parse().ok()
}

/// Make `text` safe for a single markdown table cell. Pipes are escaped,
/// line breaks are folded, and an empty value becomes `-` so the row keeps
/// all of its columns.
pub fn table_cell(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ").replace('|', "\\|");
    let flat = flat.trim();
    if flat.is_empty() {
        "-".to_string()
    } else {
        flat.to_string()
    }
}

/// Template layout of a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Doc,
    Error,
    Decision,
    Plan,
    Snippet,
    Intel,
    Handoff,
    Explain,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Error => "error",
            Self::Decision => "decision",
            Self::Plan => "plan",
            Self::Snippet => "snippet",
            Self::Intel => "intel",
            Self::Handoff => "handoff",
            Self::Explain => "explain",
        }
    }

    /// Parse a type name, falling back to the generic layout for anything
    /// unrecognised (including `learning`).
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Self::Doc)
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doc" => Ok(Self::Doc),
            "error" => Ok(Self::Error),
            "decision" => Ok(Self::Decision),
            "plan" => Ok(Self::Plan),
            "snippet" => Ok(Self::Snippet),
            "intel" => Ok(Self::Intel),
            "handoff" => Ok(Self::Handoff),
            "explain" => Ok(Self::Explain),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// A row of the Active Documents (or, via `parse_all_entries`, Archived) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: DocId,
    pub topic: String,
    /// Conventionally `"Active"`; holds the archive date for archived rows.
    pub status: String,
    /// Conventionally ≤ 80 chars; holds the archive reason for archived rows.
    pub summary: String,
}

impl IndexEntry {
    pub fn active(id: DocId, topic: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id,
            topic: topic.into(),
            status: "Active".to_string(),
            summary: summary.into(),
        }
    }

    /// Render as a markdown table row.
    pub fn to_row(&self) -> String {
        format!(
            "| {} | {} | {} | {} |",
            self.id,
            table_cell(&self.topic),
            table_cell(&self.status),
            table_cell(&self.summary)
        )
    }
}

/// A row of the Archived table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedEntry {
    pub id: DocId,
    pub topic: String,
    pub archived_date: String,
    pub reason: String,
}

impl ArchivedEntry {
    pub fn to_row(&self) -> String {
        format!(
            "| {} | {} | {} | {} |",
            self.id,
            table_cell(&self.topic),
            table_cell(&self.archived_date),
            table_cell(&self.reason)
        )
    }
}

/// Partial update applied by `IndexStore::update_entry`.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub topic: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
}

/// Today's date as `YYYY-MM-DD` (local time).
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Lowercase, punctuation-stripped, underscore-joined filename fragment.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// First `max` characters of `text` (char-boundary safe).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
