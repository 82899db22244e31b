//! Curation review: stale docs, thin docs, and merge candidates.

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use super::index::find_doc_file;
use super::manager::Vault;
use super::types::{IndexEntry, Tier};

pub const DEFAULT_STALE_DAYS: u64 = 30;
const HIGH_PRIORITY_DAYS: u64 = 90;
const SHORT_DOC_LINES: usize = 15;
const MIN_SHARED_KEYWORDS: usize = 3;
const MIN_OVERLAP: f64 = 0.3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "from", "with", "that", "this", "have", "has", "had", "are", "was",
    "were", "been", "being", "will", "would", "could", "should", "not", "but", "its", "into",
    "than", "then", "when", "what", "where", "which", "each", "every", "some", "more", "also",
    "just", "about", "over", "after", "before", "between", "under", "above", "such", "only",
    "other", "very", "used", "use", "using", "uses", "file", "files", "code", "docs",
    "document", "current", "understanding", "summary", "last", "updated", "date", "topic",
    "learning", "intel", "snippet", "error", "decision", "plan", "type", "content", "section",
    "key", "points", "details", "notes", "history",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub id: String,
    pub topic: String,
    pub issue: String,
    pub suggestion: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
    pub tier: Tier,
    pub reviewed: usize,
    pub stale_days: u64,
    /// Sorted high → low; ties keep discovery order.
    pub items: Vec<ReviewItem>,
}

impl ReviewReport {
    pub fn count(&self, priority: Priority) -> usize {
        self.items.iter().filter(|i| i.priority == priority).count()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Vault Curation Review\n\n**Vault:** {}\n**Documents reviewed:** {}\n**Stale threshold:** {} days\n\n---\n\n## Summary\n\n| Priority | Count |\n|----------|-------|\n",
            self.tier, self.reviewed, self.stale_days
        );
        for p in [Priority::High, Priority::Medium, Priority::Low] {
            out += &format!("| {} | {} |\n", p.label(), self.count(p));
        }
        out.push('\n');

        if self.items.is_empty() {
            out += "**All clear!** No issues found. Your vault is well-maintained.\n";
            return out;
        }

        out += "---\n\n## Action Items\n\n";
        for item in &self.items {
            out += &format!(
                "### [{}] {} - {}\n**Issue:** {}\n**Suggestion:** {}\n\n",
                item.priority.label(),
                item.id,
                item.topic,
                item.issue,
                item.suggestion
            );
        }
        out += "---\n\n## Quick Actions\n\n";
        out += "- To update a doc: `ctx_update id=\"P001\"`\n";
        out += "- To archive a doc: `ctx_archive id=\"P001\" reason=\"...\"`\n";
        out += "- To read a doc: `ctx_read id=\"P001\"`\n";
        out
    }
}

fn markdown_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[#*`_\[\](){}|>~]").expect("valid regex"))
}

fn url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid regex"))
}

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s]").expect("valid regex"))
}

/// Distinct content words: longer than three chars, not stop words, not numbers.
pub fn extract_keywords(topic: &str, content: &str) -> Vec<String> {
    let text = format!("{topic} {content}").to_lowercase();
    let text = markdown_noise().replace_all(&text, " ");
    let text = url().replace_all(&text, " ");
    let text = non_word().replace_all(&text, " ");

    let mut seen = HashSet::new();
    text.split_whitespace()
        .filter(|w| w.len() > 3)
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| !w.bytes().all(|b| b.is_ascii_digit()))
        .filter(|w| seen.insert(*w))
        .map(str::to_string)
        .collect()
}

pub fn review(vault: &Vault, tier: Tier, stale_days: u64) -> Result<ReviewReport> {
    review_at(vault, tier, stale_days, SystemTime::now())
}

/// Review `tier` as of `now`. Unreadable documents are skipped.
pub fn review_at(vault: &Vault, tier: Tier, stale_days: u64, now: SystemTime) -> Result<ReviewReport> {
    let entries = vault.require(tier)?.parse_active_entries()?;
    let dir = vault.dir(tier);

    let mut items = Vec::new();
    let mut keywords: Vec<(&IndexEntry, Vec<String>)> = Vec::new();

    for entry in &entries {
        let Some(path) = find_doc_file(dir, entry.id) else {
            continue;
        };
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };

        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        if let Some(modified) = modified {
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            let days = age.as_secs() / 86_400;
            if days > stale_days {
                items.push(ReviewItem {
                    id: entry.id.to_string(),
                    topic: entry.topic.clone(),
                    issue: format!("Not updated in {days} days"),
                    suggestion: "Review for relevance. Update, merge, or archive.".to_string(),
                    priority: if days > HIGH_PRIORITY_DAYS {
                        Priority::High
                    } else {
                        Priority::Medium
                    },
                });
            }
        }

        let lines = content.split('\n').count();
        if lines < SHORT_DOC_LINES {
            items.push(ReviewItem {
                id: entry.id.to_string(),
                topic: entry.topic.clone(),
                issue: format!("Very short ({lines} lines)"),
                suggestion: "Consider merging with related doc or expanding.".to_string(),
                priority: Priority::Low,
            });
        }

        keywords.push((entry, extract_keywords(&entry.topic, &content)));
    }

    for (i, (a, kw_a)) in keywords.iter().enumerate() {
        for (b, kw_b) in keywords.iter().skip(i + 1) {
            let shared: Vec<&String> = kw_a.iter().filter(|w| kw_b.contains(w)).collect();
            let smaller = kw_a.len().min(kw_b.len());
            if shared.len() < MIN_SHARED_KEYWORDS
                || smaller == 0
                || (shared.len() as f64 / smaller as f64) < MIN_OVERLAP
            {
                continue;
            }
            let sample: Vec<&str> = shared.iter().take(5).map(|s| s.as_str()).collect();
            items.push(ReviewItem {
                id: a.id.to_string(),
                topic: "Related docs".to_string(),
                issue: format!("{} shared keywords between {} and {}", shared.len(), a.id, b.id),
                suggestion: format!(
                    "Consider merging: {}: {}, {}: {} (shared: {})",
                    a.id,
                    a.topic,
                    b.id,
                    b.topic,
                    sample.join(", ")
                ),
                priority: Priority::Low,
            });
        }
    }

    items.sort_by_key(|item| item.priority);
    tracing::debug!(tier = %tier, items = items.len(), "review finished");

    Ok(ReviewReport {
        tier,
        reviewed: entries.len(),
        stale_days,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::documents::Sections;
    use crate::vault::enforcement::DomainClassifier;
    use crate::vault::manager::{NewDocument, VaultPaths};
    use crate::vault::types::{slugify, DocType};
    use tempfile::TempDir;

    const DAY: u64 = 86_400;

    /// Create a project doc, then replace its file with `body` verbatim.
    fn seed(v: &mut Vault, title: &str, body: &str) -> String {
        let created = v
            .create_document(NewDocument {
                tier: Tier::Project,
                doc_type: DocType::Doc,
                kind: None,
                slug: slugify(title),
                title: title.to_string(),
                topic: None,
                summary: title.to_string(),
                sections: Sections::from([("content", body.to_string())]),
                related_terms: None,
            })
            .unwrap();
        std::fs::write(&created.path, body).unwrap();
        created.id.to_string()
    }

    fn long_body(title: &str, word: &str) -> String {
        let mut body = format!("# {title}\n\n");
        for i in 0..20 {
            body += &format!("{word} {i} redis cache eviction memory\n");
        }
        body
    }

    fn seeded() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        let paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
        let mut v = Vault::new(paths, DomainClassifier::default());
        v.init_project(false).unwrap();
        seed(&mut v, "Cache Layer", &long_body("Cache Layer", "line"));
        seed(&mut v, "Eviction Notes", &long_body("Eviction Notes", "step"));
        seed(&mut v, "Tiny", "# Tiny\n\nhello world\n");
        (tmp, v)
    }

    fn issues(report: &ReviewReport) -> Vec<(String, Priority, String)> {
        report
            .items
            .iter()
            .map(|i| (i.id.clone(), i.priority, i.issue.clone()))
            .collect()
    }

    #[test]
    fn fresh_vault_flags_short_docs_and_merge_candidates() {
        let (_tmp, v) = seeded();
        let report = review_at(&v, Tier::Project, DEFAULT_STALE_DAYS, SystemTime::now()).unwrap();
        assert_eq!(report.reviewed, 3);
        assert_eq!(report.count(Priority::High), 0);
        assert_eq!(report.count(Priority::Medium), 0);

        let found = issues(&report);
        assert!(found.contains(&("P003".into(), Priority::Low, "Very short (4 lines)".into())));
        assert!(!found.iter().any(|(id, _, issue)| id != "P003" && issue.starts_with("Very short")));

        let merge = report
            .items
            .iter()
            .find(|i| i.topic == "Related docs")
            .expect("merge candidate");
        assert_eq!(merge.id, "P001");
        assert_eq!(merge.issue, "4 shared keywords between P001 and P002");
        assert!(merge.suggestion.contains("P001: Cache Layer, P002: Eviction Notes"));
        assert!(!report.items.iter().any(|i| i.issue.contains("P003")));
    }

    #[test]
    fn stale_docs_are_ranked_by_age() {
        let (_tmp, v) = seeded();

        let later = SystemTime::now() + Duration::from_secs(40 * DAY);
        let report = review_at(&v, Tier::Project, 30, later).unwrap();
        let stale: Vec<_> = issues(&report)
            .into_iter()
            .filter(|(_, _, issue)| issue.starts_with("Not updated in"))
            .collect();
        assert_eq!(stale.len(), 3);
        assert!(stale.iter().all(|(_, p, _)| *p == Priority::Medium));
        assert_eq!(stale[0].2, "Not updated in 40 days");

        let much_later = SystemTime::now() + Duration::from_secs(100 * DAY);
        let report = review_at(&v, Tier::Project, 30, much_later).unwrap();
        assert_eq!(report.count(Priority::High), 3);
        assert_eq!(report.items[0].priority, Priority::High);

        // Below the threshold nothing is stale.
        let report = review_at(&v, Tier::Project, 60, later).unwrap();
        assert_eq!(report.count(Priority::Medium), 0);
    }

    #[test]
    fn review_needs_an_initialized_tier() {
        let tmp = TempDir::new().unwrap();
        let paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
        let v = Vault::new(paths, DomainClassifier::default());
        assert!(review(&v, Tier::Project, DEFAULT_STALE_DAYS).is_err());
    }

    #[test]
    fn clean_report_says_all_clear() {
        let report = ReviewReport {
            tier: Tier::Global,
            reviewed: 0,
            stale_days: 30,
            items: Vec::new(),
        };
        let md = report.to_markdown();
        assert!(md.contains("**All clear!**"));
        assert!(md.contains("| High | 0 |"));
    }

    #[test]
    fn keywords_drop_noise() {
        let kw = extract_keywords(
            "Auth Tokens",
            "## Summary\n\nThe **refresh** tokens rotate every 3600 seconds. See https://auth.example.com/docs for tokens.",
        );
        assert_eq!(kw, vec!["auth", "tokens", "refresh", "rotate", "seconds"]);
    }

    #[test]
    fn priorities_sort_high_first() {
        let mut p = vec![Priority::Low, Priority::High, Priority::Medium];
        p.sort();
        assert_eq!(p, vec![Priority::High, Priority::Medium, Priority::Low]);
    }
}
