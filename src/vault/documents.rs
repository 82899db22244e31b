//! Per-document markdown files: templated generation, lookup by id, and the
//! line-oriented section surgery used by update and link operations.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::index::find_doc_file;
use super::types::{is_doc_filename, DocId, DocType, Tier};

/// Section values keyed by template slot (`content`, `root_cause`, ...).
pub type Sections = HashMap<&'static str, String>;

/// Render a full document for `doc_type`. Missing slots fall back to `N/A`
/// (or the slot's own default).
pub fn generate_content(
    id: DocId,
    title: &str,
    doc_type: DocType,
    sections: &Sections,
    date: &str,
) -> String {
    let slot = |key: &str, default: &str| -> String {
        sections
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };
    let section = |heading: &str, body: String| format!("## {heading}\n\n{body}\n\n");

    let mut out = format!(
        "# {id} - {title}\n\n> **Status:** Active\n> **Created:** {date}\n> **Last Updated:** {date}\n\n---\n\n"
    );

    match doc_type {
        DocType::Error => {
            out += &section("Error", slot("error_message", "N/A"));
            out += &section("Root Cause", slot("root_cause", "N/A"));
            out += &section("Solution", slot("solution", "N/A"));
            out += &section("Prevention", slot("prevention", "N/A"));
        }
        DocType::Decision => {
            out += &section("Decision", slot("decision", "N/A"));
            out += &section("Options Considered", slot("options", "N/A"));
            out += &section("Reasoning", slot("reasoning", "N/A"));
            out += &section("Trade-offs", slot("tradeoffs", "N/A"));
        }
        DocType::Plan => {
            out += &section("Goal", slot("goal", "N/A"));
            out += &section("Steps", slot("steps", "N/A"));
            out += &section("Status", slot("status", "In Progress"));
        }
        DocType::Snippet => {
            out += &section("Use Case", slot("use_case", "N/A"));
            let fenced = format!("```{}\n{}\n```", slot("language", ""), slot("code", ""));
            out += &section("Code", fenced);
        }
        DocType::Intel => {
            out += &section("Area Explored", slot("area", "N/A"));
            out += &section("Findings", slot("findings", "N/A"));
        }
        DocType::Handoff => {
            out += &section("Completed", slot("completed", "N/A"));
            out += &section("In Progress", slot("in_progress", "N/A"));
            out += &section("Next Steps", slot("next_steps", "N/A"));
        }
        DocType::Explain => {
            out += &section("Concept", slot("concept", "N/A"));
            out += &section("Explanation", slot("explanation", "N/A"));
        }
        DocType::Doc => {
            out += &section("Summary", slot("content", "N/A"));
            out += &section("Key Points", slot("key_points", "- See summary above"));
        }
    }

    out += &format!(
        "---\n\n## History\n\n| Date | Change |\n|------|--------|\n| {date} | Initial creation |\n\n---\n"
    );
    out
}

/// Document files of both tiers.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    global_dir: PathBuf,
    project_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(global_dir: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_dir: global_dir.into(),
            project_dir: project_dir.into(),
        }
    }

    pub fn dir(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Global => &self.global_dir,
            Tier::Project => &self.project_dir,
        }
    }

    /// Write `content` to `filename` inside the tier directory (overwrites).
    pub fn write(&self, tier: Tier, filename: &str, content: &str) -> Result<PathBuf> {
        let dir = self.dir(tier);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(filename);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(tier = %tier, file = %filename, "document written");
        Ok(path)
    }

    pub fn find_path(&self, id: DocId) -> Option<PathBuf> {
        find_doc_file(self.dir(id.tier), id)
    }

    /// Document text, or `None` when no file exists for `id`.
    pub fn read(&self, id: DocId) -> Result<Option<String>> {
        let Some(path) = self.find_path(id) else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(text))
    }

    /// Sorted document filenames of a tier; empty when the directory is unreadable.
    pub fn list(&self, tier: Tier) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.dir(tier)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| is_doc_filename(name) && !name.starts_with("index"))
            .collect();
        names.sort();
        names
    }

    /// Read, transform and rewrite a document in place.
    pub fn rewrite<F>(&self, id: DocId, transform: F) -> Result<Option<PathBuf>>
    where
        F: FnOnce(&str) -> String,
    {
        let Some(path) = self.find_path(id) else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        std::fs::write(&path, transform(&text))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(id = %id, "document rewritten");
        Ok(Some(path))
    }
}

/// Filename for a new document: `{id}_{slug}.md` or `{id}_{kind}_{slug}.md`.
pub fn doc_filename(id: DocId, kind: Option<&str>, slug: &str) -> String {
    match kind {
        Some(kind) => format!("{id}_{kind}_{slug}.md"),
        None => format!("{id}_{slug}.md"),
    }
}

// ── Section surgery ──────────────────────────────────────────────────────────

/// Byte offset of the first `\n## ` or `\n---` at or after `from`.
fn next_boundary(text: &str, from: usize) -> Option<usize> {
    let rest = &text[from..];
    [rest.find("\n## "), rest.find("\n---")]
        .into_iter()
        .flatten()
        .min()
        .map(|off| from + off)
}

/// Splice `content` into a document.
///
/// With a section name, content goes at the end of `## {section}`; a missing
/// section is created just before `## History`. Without one, the first of
/// Current Understanding / Summary / Key Points receives it; failing all of
/// those, it is appended.
pub fn append_to_section(text: &str, section: Option<&str>, content: &str) -> String {
    match section.filter(|s| !s.is_empty()) {
        Some(section) => {
            let header = format!("## {section}");
            match text.find(&header) {
                Some(idx) => match next_boundary(text, idx + header.len()) {
                    Some(at) => format!("{}\n{content}\n{}", &text[..at], &text[at..]),
                    None => format!("{text}\n{content}\n"),
                },
                None => match text.find("## History") {
                    Some(at) => format!(
                        "{}## {section}\n\n{content}\n\n---\n\n{}",
                        &text[..at],
                        &text[at..]
                    ),
                    None => format!("{text}\n## {section}\n\n{content}\n\n---\n"),
                },
            }
        }
        None => {
            for target in ["## Current Understanding", "## Summary", "## Key Points"] {
                if let Some(idx) = text.find(target) {
                    return match next_boundary(text, idx + target.len()) {
                        Some(at) => format!("{}\n{content}\n{}", &text[..at], &text[at..]),
                        None => format!("{text}\n\n{content}"),
                    };
                }
            }
            format!("{text}\n\n{content}\n")
        }
    }
}

fn last_updated_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*Last Updated:\*\*\s*\S+").expect("valid regex"))
}

/// Rewrite the header's `**Last Updated:**` date.
pub fn touch_last_updated(text: &str, date: &str) -> String {
    last_updated_re()
        .replace(text, format!("**Last Updated:** {date}"))
        .into_owned()
}

/// Insert `| {date} | {change} |` as the newest History row.
pub fn add_history_row(text: &str, date: &str, change: &str) -> String {
    let Some(history) = text.find("## History") else {
        return text.to_string();
    };
    let Some(sep) = text[history..].find("|------|").map(|off| history + off) else {
        return text.to_string();
    };
    let line_end = text[sep..].find('\n').map_or(text.len(), |off| sep + off);
    format!("{}\n| {date} | {change} |{}", &text[..line_end], &text[line_end..])
}

/// Add `- Related: **{id}**` to the Related Documents section, creating the
/// section before History when absent. `None` when the link already exists.
pub fn add_related_link(text: &str, id: DocId) -> Option<String> {
    let marker = format!("Related: **{id}**");
    if text.contains(&marker) {
        return None;
    }
    let link = format!("- {marker}");

    let mut lines: Vec<&str> = text.split('\n').collect();
    if let Some(header) = lines.iter().position(|l| l.trim_end() == "## Related Documents") {
        let mut at = header + 1;
        for (i, line) in lines.iter().enumerate().skip(header + 1) {
            if line.starts_with("---") || line.starts_with("## ") {
                break;
            }
            if line.starts_with("- ") {
                at = i + 1;
            }
        }
        if at == header + 1 {
            lines.insert(at, "");
            at += 1;
        }
        lines.insert(at, &link);
        return Some(lines.join("\n"));
    }

    let block = format!("## Related Documents\n\n{link}\n\n---\n\n");
    Some(match text.find("## History") {
        Some(at) => format!("{}{block}{}", &text[..at], &text[at..]),
        None => format!("{text}\n{}", block.trim_end_matches('\n')),
    })
}

/// Text before the first `.`, trimmed.
pub fn first_sentence(text: &str) -> &str {
    text.split('.').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DATE: &str = "2026-01-02";

    fn pid(n: u32) -> DocId {
        DocId::new(Tier::Project, n)
    }

    fn doc(content: &str) -> String {
        let sections = Sections::from([("content", content.to_string())]);
        generate_content(pid(1), "Auth System", DocType::Doc, &sections, DATE)
    }

    #[test]
    fn generic_doc_layout() {
        let text = doc("Uses JWT.");
        assert!(text.starts_with(
            "# P001 - Auth System\n\n> **Status:** Active\n> **Created:** 2026-01-02\n> **Last Updated:** 2026-01-02\n\n---\n\n## Summary\n\nUses JWT.\n\n## Key Points\n\n- See summary above\n\n---\n\n## History"
        ));
        assert!(text.ends_with("| 2026-01-02 | Initial creation |\n\n---\n"));
    }

    #[test]
    fn typed_layouts_keep_section_order() {
        let sections = Sections::from([
            ("error_message", "boom".to_string()),
            ("solution", "retry".to_string()),
        ]);
        let text = generate_content(pid(2), "Error: boom", DocType::Error, &sections, DATE);
        let order: Vec<usize> = ["## Error", "## Root Cause", "## Solution", "## Prevention"]
            .iter()
            .map(|h| text.find(h).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("## Root Cause\n\nN/A\n\n"));

        let plan = generate_content(pid(3), "Plan", DocType::Plan, &Sections::new(), DATE);
        assert!(plan.contains("## Status\n\nIn Progress\n\n"));

        let snippet = generate_content(
            pid(4),
            "Snip",
            DocType::Snippet,
            &Sections::from([("language", "rust".to_string()), ("code", "fn main() {}".to_string())]),
            DATE,
        );
        assert!(snippet.contains("## Code\n\n```rust\nfn main() {}\n```\n\n"));
    }

    #[test]
    fn store_write_read_list() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path().join("g"), tmp.path().join("p"));
        let text = doc("Tokens rotate hourly.");
        store.write(Tier::Project, "P001_auth_system.md", &text).unwrap();
        std::fs::write(tmp.path().join("p").join("index.md"), "x").unwrap();
        std::fs::write(tmp.path().join("p").join("notes.md"), "x").unwrap();

        let read = store.read(pid(1)).unwrap().unwrap();
        assert!(read.contains("Tokens rotate hourly."));
        assert!(store.read(pid(2)).unwrap().is_none());
        assert!(store.read(DocId::new(Tier::Global, 1)).unwrap().is_none());
        assert_eq!(store.list(Tier::Project), vec!["P001_auth_system.md"]);
        assert!(store.list(Tier::Global).is_empty());
    }

    #[test]
    fn append_into_named_section() {
        let text = append_to_section(&doc("Uses JWT."), Some("Summary"), "Also refresh tokens.");
        assert!(text.contains("Uses JWT.\n\nAlso refresh tokens.\n\n## Key Points"));
    }

    #[test]
    fn append_creates_missing_section_before_history() {
        let text = append_to_section(&doc("x"), Some("Gotchas"), "Clock skew.");
        assert!(text.contains("## Gotchas\n\nClock skew.\n\n---\n\n## History"));
    }

    #[test]
    fn append_defaults_to_summary() {
        let text = append_to_section(&doc("x"), None, "More detail.");
        assert!(text.contains("x\n\nMore detail.\n\n## Key Points"));
        let bare = append_to_section("plain text", None, "tail");
        assert_eq!(bare, "plain text\n\ntail\n");
    }

    #[test]
    fn history_and_last_updated() {
        let text = touch_last_updated(&doc("x"), "2026-03-04");
        assert!(text.contains("> **Last Updated:** 2026-03-04"));
        assert!(text.contains("> **Created:** 2026-01-02"));

        let text = add_history_row(&text, "2026-03-04", "Updated Summary");
        assert!(text.contains("|------|--------|\n| 2026-03-04 | Updated Summary |\n| 2026-01-02 | Initial creation |"));
    }

    #[test]
    fn related_links_are_added_once() {
        let text = add_related_link(&doc("x"), pid(2)).unwrap();
        assert!(text.contains("## Related Documents\n\n- Related: **P002**\n\n---\n\n## History"));

        let text = add_related_link(&text, DocId::new(Tier::Global, 7)).unwrap();
        assert!(text.contains("- Related: **P002**\n- Related: **G007**\n\n---"));

        assert!(add_related_link(&text, pid(2)).is_none());
    }

    #[test]
    fn first_sentence_cuts_at_period() {
        assert_eq!(first_sentence("Use JWT. Rotate often."), "Use JWT");
        assert_eq!(first_sentence("  no terminator "), "no terminator");
    }
}
