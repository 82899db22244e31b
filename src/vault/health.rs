//! Vault health scoring.
//!
//! Four categories of 25 points each. Scanning is advisory: unreadable files
//! are skipped rather than reported as failures.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::manager::Vault;
use super::types::{IndexEntry, Tier};

const CATEGORY_MAX: i32 = 25;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub name: &'static str,
    pub max: i32,
    pub score: i32,
    pub issues: Vec<String>,
}

impl CategoryScore {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            max: CATEGORY_MAX,
            score: CATEGORY_MAX,
            issues: Vec::new(),
        }
    }

    fn penalize(&mut self, points: i32, issue: String) {
        self.score -= points;
        self.issues.push(issue);
    }

    pub fn status(&self) -> &'static str {
        if self.score == self.max {
            "Pass"
        } else if self.score as f64 >= self.max as f64 * 0.7 {
            "Fair"
        } else {
            "Fail"
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub index: CategoryScore,
    pub files: CategoryScore,
    pub size: CategoryScore,
    pub drift: CategoryScore,
}

impl HealthReport {
    fn new() -> Self {
        Self {
            index: CategoryScore::new("Index Consistency"),
            files: CategoryScore::new("File Integrity"),
            size: CategoryScore::new("Size Compliance"),
            drift: CategoryScore::new("Code Drift"),
        }
    }

    pub fn categories(&self) -> [&CategoryScore; 4] {
        [&self.index, &self.files, &self.size, &self.drift]
    }

    pub fn total(&self) -> i32 {
        self.categories().iter().map(|c| c.score).sum()
    }

    pub fn verdict(&self) -> &'static str {
        match self.total() {
            t if t >= 90 => "Healthy",
            t if t >= 70 => "Fair",
            _ => "Needs Attention",
        }
    }

    pub fn issue_count(&self) -> usize {
        self.categories().iter().map(|c| c.issues.len()).sum()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Vault Health Check\n\n**Score:** {}/100 {}\n\n## Score Breakdown\n\n| Category | Score | Status |\n|----------|-------|--------|\n",
            self.total(),
            self.verdict()
        );
        for cat in self.categories() {
            out += &format!("| {} | {}/{} | {} |\n", cat.name, cat.score, cat.max, cat.status());
        }
        out.push('\n');

        if self.issue_count() == 0 {
            out += "No issues found. Vault is in great shape.\n";
            return out;
        }

        out += &format!("## Issues Found ({})\n\n", self.issue_count());
        for cat in self.categories() {
            if cat.issues.is_empty() {
                continue;
            }
            out += &format!("### {}\n", cat.name);
            for issue in &cat.issues {
                out += &format!("- {issue}\n");
            }
            out.push('\n');
        }

        if !self.drift.issues.is_empty() {
            out += "**Tip:** Update or archive docs with code drift to keep documentation accurate.\n";
        }
        out
    }
}

/// Score both tiers of `vault`. The global tier is skipped in `local` mode.
pub fn check(vault: &Vault) -> HealthReport {
    let settings = vault.settings();
    let mut report = HealthReport::new();
    let root = vault.paths().project_root.clone();

    if settings.mode.includes_global() {
        if vault.exists(Tier::Global) {
            check_tier(vault, Tier::Global, &root, settings.limits.max_doc_lines, &mut report);
        } else {
            report.files.penalize(10, "Global vault not initialized".to_string());
        }
    }

    if vault.exists(Tier::Project) {
        check_tier(vault, Tier::Project, &root, settings.limits.max_doc_lines, &mut report);
    } else {
        report.files.penalize(5, "Project vault not initialized".to_string());
    }

    for cat in [&mut report.index, &mut report.files, &mut report.size, &mut report.drift] {
        cat.score = cat.score.max(0);
    }
    report
}

fn check_tier(vault: &Vault, tier: Tier, root: &Path, max_lines: usize, report: &mut HealthReport) {
    let entries: Vec<IndexEntry> = vault
        .index(tier)
        .parse_active_entries()
        .unwrap_or_default();
    let files = vault.list_doc_files(tier);

    for file in &files {
        let id = file.split('_').next().unwrap_or_default();
        if !entries.iter().any(|e| e.id.to_string() == id) {
            report
                .index
                .penalize(5, format!("Orphaned file: {file} (not in {tier} index)"));
        }
    }

    for entry in &entries {
        let prefix = format!("{}_", entry.id);
        if !files.iter().any(|f| f.starts_with(&prefix)) {
            report.files.penalize(
                10,
                format!("Missing file for {tier} index entry: {} - {}", entry.id, entry.topic),
            );
        }
    }

    for file in &files {
        let Ok(content) = std::fs::read_to_string(vault.dir(tier).join(file)) else {
            continue;
        };
        let lines = content.split('\n').count();
        if lines > max_lines {
            report.size.penalize(
                3,
                format!("{file}: {lines} lines (exceeds {max_lines}-line limit)"),
            );
        }

        for reference in extract_file_references(&content) {
            if let Some(problem) = check_reference(&reference, root) {
                report.drift.penalize(2, format!("{file}: {problem}"));
            }
        }
    }
}

/// A source path mentioned in a document, optionally with a line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub path: String,
    pub line: Option<usize>,
}

fn reference_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"`([a-zA-Z0-9_\-./]+\.[a-zA-Z0-9]+):(\d+)`",
            r"`([a-zA-Z0-9_\-./]+\.[a-zA-Z0-9]+)`",
            r"\*\*File:\*\*\s*`?([a-zA-Z0-9_\-./]+\.[a-zA-Z0-9]+)`?",
            r"(?m)(?:^|\s)((?:src|lib|app|components|utils|hooks|services|api)/[a-zA-Z0-9_\-./]+\.[a-zA-Z0-9]+)(?::(\d+))?",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

fn bare_dotted_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+\.\w+$").expect("valid regex"))
}

fn is_false_positive(path: &str) -> bool {
    path.contains("example")
        || path.contains("placeholder")
        || path.starts_with("http")
        || path.starts_with("www.")
        || path.starts_with("window.")
        || path.starts_with("document.")
        || path.starts_with("console.")
        || path.contains("your-")
        || path.contains("your_")
        || (bare_dotted_name().is_match(path) && !path.contains('/'))
        || path.len() < 5
}

/// Distinct file references in `content`, first occurrence order.
pub fn extract_file_references(content: &str) -> Vec<FileReference> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for pattern in reference_patterns() {
        for caps in pattern.captures_iter(content) {
            let Some(path) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if is_false_positive(path) {
                continue;
            }
            let line = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if seen.insert((path.to_string(), line)) {
                refs.push(FileReference {
                    path: path.to_string(),
                    line,
                });
            }
        }
    }
    refs
}

/// Resolve against the project root, its parent, then as given. Returns a
/// description of the problem, if any.
pub fn check_reference(reference: &FileReference, root: &Path) -> Option<String> {
    let mut candidates: Vec<PathBuf> = vec![root.join(&reference.path)];
    if let Some(parent) = root.parent() {
        candidates.push(parent.join(&reference.path));
    }
    candidates.push(PathBuf::from(&reference.path));

    let Some(found) = candidates.iter().find(|p| p.exists()) else {
        let suffix = reference.line.map(|l| format!(":{l}")).unwrap_or_default();
        return Some(format!("Referenced file not found: {}{suffix}", reference.path));
    };

    let line = reference.line?;
    let text = std::fs::read_to_string(found).ok()?;
    let count = text.split('\n').count();
    (line > count).then(|| {
        format!(
            "Reference to {}:{line} - file only has {count} lines",
            reference.path
        )
    })
}
