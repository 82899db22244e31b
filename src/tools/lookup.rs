//! Read-side tools: `ctx_search`, `ctx_read`, `ctx_quiz` and `ctx_share`.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vault::types::{DocId, IndexEntry, Tier};
use crate::vault::Vault;

const QUIZ_SIZE: usize = 5;

/// Parameters for the `ctx_search` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Search query")]
    pub query: String,
}

/// Parameters for the `ctx_read` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReadParams {
    #[schemars(description = "Document ID (e.g. \"P001\", \"G003\")")]
    pub id: String,
}

/// Parameters for the `ctx_quiz` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QuizParams {
    #[schemars(description = "Optional topic to quiz on")]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShareFormat {
    #[default]
    Md,
    Json,
}

/// Parameters for the `ctx_share` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ShareParams {
    #[schemars(description = "Document IDs to export (e.g. [\"P001\", \"P003\"])")]
    pub ids: Vec<String>,

    #[schemars(description = "Export format: md (default) or json")]
    pub format: Option<ShareFormat>,
}

pub fn search(vault: &Vault, params: &SearchParams) -> Result<String> {
    let query = params.query.trim();
    if query.is_empty() {
        bail!("query is required.");
    }

    let results = vault.search(query)?;
    tracing::debug!(query, hits = results.len(), "search finished");
    if results.is_empty() {
        return Ok(format!(
            "No results found for \"{query}\". Try different keywords or check vault status with ctx_status."
        ));
    }

    let mut out = format!(
        "# Search Results for \"{query}\"\n\nFound {} result(s):\n\n| ID | Topic | Vault | Summary |\n|----|-------|-------|----------|\n",
        results.len()
    );
    for r in &results {
        out += &format!("| {} | {} | {} | {} |\n", r.id, r.topic, r.tier, r.summary);
    }
    out += "\nUse **ctx_read** with the ID to read the full document.";
    Ok(out)
}

/// Document text. An id without a file is a plain reply, not a failure.
pub fn read(vault: &Vault, params: &ReadParams) -> Result<String> {
    let raw = params.id.trim();
    if raw.is_empty() {
        bail!("id is required (e.g. \"P001\" or \"G003\").");
    }
    let id: DocId = raw.parse()?;

    Ok(vault.read_document(id)?.unwrap_or_else(|| {
        format!(
            "Document {id} not found. Use ctx_search to find documents or ctx_status to check vault."
        )
    }))
}

/// Active entries of the tiers the current mode searches, project first.
fn quiz_pool(vault: &Vault) -> Result<Vec<IndexEntry>> {
    let mode = vault.settings().mode;
    let mut entries = Vec::new();
    if mode.includes_project() && vault.exists(Tier::Project) {
        entries.extend(vault.index(Tier::Project).parse_active_entries()?);
    }
    if mode.includes_global() && vault.exists(Tier::Global) {
        entries.extend(vault.index(Tier::Global).parse_active_entries()?);
    }
    Ok(entries)
}

pub fn quiz(vault: &Vault, params: &QuizParams) -> Result<String> {
    let entries = quiz_pool(vault)?;
    if entries.is_empty() {
        return Ok("No documents in vault to quiz on. Create some docs first.".to_string());
    }

    let topic = params.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let mut pool: Vec<&IndexEntry> = match topic {
        Some(topic) => {
            let needle = topic.to_lowercase();
            entries
                .iter()
                .filter(|e| {
                    e.topic.to_lowercase().contains(&needle)
                        || e.summary.to_lowercase().contains(&needle)
                })
                .collect()
        }
        None => entries.iter().collect(),
    };

    if let Some(topic) = topic.filter(|_| pool.is_empty()) {
        let available: Vec<String> = entries
            .iter()
            .map(|e| format!("- {}: {}", e.id, e.topic))
            .collect();
        return Ok(format!(
            "No documents found matching topic \"{topic}\". Available topics:\n{}",
            available.join("\n")
        ));
    }

    pool.shuffle(&mut rand::thread_rng());
    pool.truncate(QUIZ_SIZE);

    let mut out = String::from("# Knowledge Quiz\n\n");
    out += &match topic {
        Some(topic) => format!("Topic: **{topic}**\n\n"),
        None => "All vault topics\n\n".to_string(),
    };
    out += "Answer these questions based on your vault knowledge:\n\n";
    for (i, entry) in pool.iter().enumerate() {
        out += &format!(
            "**Q{}.** What is documented in **{}** about \"{}\"?\n> Hint: {}\n\n",
            i + 1,
            entry.id,
            entry.topic,
            entry.summary
        );
    }
    out += "\n---\nUse **ctx_read** with each ID to check your answers.";
    Ok(out)
}

#[derive(Debug, Serialize)]
struct SharedDocument {
    id: String,
    content: String,
}

/// Export documents; fails listing every id without a file.
pub fn share(vault: &Vault, params: &ShareParams) -> Result<String> {
    if params.ids.is_empty() {
        bail!("ids array is required (e.g. [\"P001\", \"P003\"]).");
    }

    let mut docs = Vec::new();
    let mut missing = Vec::new();
    for raw in &params.ids {
        let content = match raw.parse::<DocId>() {
            Ok(id) => vault.read_document(id)?,
            Err(_) => None,
        };
        match content {
            Some(content) => docs.push(SharedDocument {
                id: raw.clone(),
                content,
            }),
            None => missing.push(raw.as_str()),
        }
    }

    if !missing.is_empty() {
        bail!(
            "Documents not found: {}. Use ctx_search to find valid IDs.",
            missing.join(", ")
        );
    }

    if params.format.unwrap_or_default() == ShareFormat::Json {
        return Ok(serde_json::to_string_pretty(&docs)?);
    }

    let mut out = format!("# Exported Documents\n\nExported {} document(s)\n\n", docs.len());
    for doc in &docs {
        out += &format!("---\n\n{}\n\n", doc.content);
    }
    Ok(out)
}
