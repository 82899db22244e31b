//! Session-scoped documentation nudges.
//!
//! Counters live only for the lifetime of the server process. Any document
//! write resets them. Research lookups are weighted by how many distinct code
//! domains they touched, so five lookups across five subsystems count for more
//! than five lookups in one file.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use super::settings::Enforcement;
use crate::config::DomainRule;

/// Category reported when no rule matches.
pub const FALLBACK_DOMAIN: &str = "other";

/// Trigger points for one enforcement level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub edits: usize,
    pub files: usize,
    pub research: usize,
    pub areas: usize,
    pub minutes_since_doc: i64,
}

impl Thresholds {
    /// `None` for [`Enforcement::Light`], which never nudges.
    pub fn for_level(level: Enforcement) -> Option<Self> {
        match level {
            Enforcement::Light => None,
            Enforcement::Balanced => Some(Self {
                edits: 8,
                files: 2,
                research: 10,
                areas: 4,
                minutes_since_doc: 10,
            }),
            Enforcement::Strict => Some(Self {
                edits: 4,
                files: 2,
                research: 6,
                areas: 3,
                minutes_since_doc: 5,
            }),
        }
    }
}

/// Ordered regex table mapping a path or query to a code domain.
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    rules: Vec<(String, Vec<Regex>)>,
}

impl DomainClassifier {
    pub fn new(rules: &[DomainRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .filter_map(|p| match Regex::new(p) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            tracing::warn!(domain = %rule.name, pattern = %p, error = %e, "skipping invalid domain pattern");
                            None
                        }
                    })
                    .collect();
                (rule.name.clone(), patterns)
            })
            .collect();
        Self { rules }
    }

    /// First rule with a matching pattern wins.
    pub fn categorize(&self, identifier: &str) -> &str {
        let lower = identifier.to_lowercase();
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(&lower)))
            .map(|(name, _)| name.as_str())
            .unwrap_or(FALLBACK_DOMAIN)
    }
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self::new(&crate::config::default_domain_rules())
    }
}

/// 1.0 for a single domain, rising by 0.25 per extra domain up to 2.0.
pub fn diversity_multiplier(domain_count: usize) -> f64 {
    match domain_count {
        0 | 1 => 1.0,
        2 => 1.25,
        3 => 1.5,
        4 => 1.75,
        _ => 2.0,
    }
}

#[derive(Debug, Clone)]
pub struct EnforcementTracker {
    classifier: DomainClassifier,
    edit_count: usize,
    files_edited: Vec<String>,
    research_count: usize,
    /// Distinct lookup identifiers in first-seen order.
    areas_explored: Vec<String>,
    last_doc_time: DateTime<Utc>,
}

impl EnforcementTracker {
    pub fn new(classifier: DomainClassifier) -> Self {
        Self {
            classifier,
            edit_count: 0,
            files_edited: Vec::new(),
            research_count: 0,
            areas_explored: Vec::new(),
            last_doc_time: Utc::now(),
        }
    }

    pub fn edit_count(&self) -> usize {
        self.edit_count
    }

    pub fn research_count(&self) -> usize {
        self.research_count
    }

    pub fn areas_explored(&self) -> &[String] {
        &self.areas_explored
    }

    pub fn track_edit(&mut self, file: Option<&str>) {
        self.edit_count += 1;
        if let Some(file) = file.filter(|f| !f.is_empty()) {
            if !self.files_edited.iter().any(|f| f == file) {
                self.files_edited.push(file.to_string());
            }
        }
    }

    pub fn track_research(&mut self, identifier: Option<&str>) {
        self.research_count += 1;
        if let Some(id) = identifier.filter(|i| !i.is_empty()) {
            if !self.areas_explored.iter().any(|a| a == id) {
                self.areas_explored.push(id.to_string());
            }
        }
    }

    /// A document was produced: zero every counter.
    pub fn reset(&mut self) {
        self.edit_count = 0;
        self.files_edited.clear();
        self.research_count = 0;
        self.areas_explored.clear();
        self.last_doc_time = Utc::now();
    }

    /// Distinct domains touched by research, in first-seen order.
    pub fn domains_explored(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = Vec::new();
        for area in &self.areas_explored {
            let domain = self.classifier.categorize(area);
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }
        domains
    }

    pub fn effective_research_count(&self) -> usize {
        let weighted =
            self.research_count as f64 * diversity_multiplier(self.domains_explored().len());
        weighted.round() as usize
    }

    pub fn edit_reminder(&self, level: Enforcement) -> Option<String> {
        let t = Thresholds::for_level(level)?;
        if self.edit_count >= t.edits && self.files_edited.len() >= t.files {
            return Some(format!(
                "\n\n---\n**ContextVault Reminder:** You've made {} edits across {} files without documenting. Consider using ctx_doc, ctx_error, or ctx_decision to capture what you've learned.",
                self.edit_count,
                self.files_edited.len()
            ));
        }
        None
    }

    pub fn research_reminder(&self, level: Enforcement) -> Option<String> {
        self.research_reminder_at(level, Utc::now())
    }

    /// Research nudge evaluated as of `now`; all three conditions must hold.
    pub fn research_reminder_at(&self, level: Enforcement, now: DateTime<Utc>) -> Option<String> {
        let t = Thresholds::for_level(level)?;
        let since_doc = now.signed_duration_since(self.last_doc_time);

        if self.effective_research_count() < t.research
            || self.areas_explored.len() < t.areas
            || since_doc < Duration::minutes(t.minutes_since_doc)
        {
            return None;
        }

        let domains = self.domains_explored();
        let across = if domains.len() > 1 {
            let listed: Vec<&str> = domains.iter().take(4).copied().collect();
            format!(" across {} domains ({})", domains.len(), listed.join(", "))
        } else {
            String::new()
        };

        Some(format!(
            "\n\n---\n**ContextVault Nudge:** You've explored {} areas{across} with {} lookups without documenting findings. Consider using ctx_doc (type=intel) to capture what you've discovered.",
            self.areas_explored.len(),
            self.research_count
        ))
    }
}

impl Default for EnforcementTracker {
    fn default() -> Self {
        Self::new(DomainClassifier::default())
    }
}
