//! MCP resources: both raw indexes, the settings JSON, the instructions text,
//! and single documents via `contextvault://doc/{id}`.

use anyhow::Result;

use super::help::INSTRUCTIONS;
use crate::vault::types::{DocId, Tier};
use crate::vault::Vault;

pub const GLOBAL_INDEX_URI: &str = "contextvault://global/index";
pub const PROJECT_INDEX_URI: &str = "contextvault://project/index";
pub const SETTINGS_URI: &str = "contextvault://settings";
pub const INSTRUCTIONS_URI: &str = "contextvault://instructions";
pub const DOC_URI_PREFIX: &str = "contextvault://doc/";

/// Static description of a listed resource or template.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        uri: GLOBAL_INDEX_URI,
        name: "Global Vault Index",
        description: "Index of all global vault documents (cross-project knowledge)",
        mime_type: "text/markdown",
    },
    ResourceSpec {
        uri: PROJECT_INDEX_URI,
        name: "Project Vault Index",
        description: "Index of all project-specific vault documents",
        mime_type: "text/markdown",
    },
    ResourceSpec {
        uri: SETTINGS_URI,
        name: "Vault Settings",
        description: "Current vault mode, enforcement level, and limits",
        mime_type: "application/json",
    },
    ResourceSpec {
        uri: INSTRUCTIONS_URI,
        name: "ContextVault Instructions",
        description: "Documentation rules and enforcement instructions for the AI assistant",
        mime_type: "text/markdown",
    },
];

pub const DOC_TEMPLATE: ResourceSpec = ResourceSpec {
    uri: "contextvault://doc/{id}",
    name: "Vault Document",
    description: "Read a specific vault document by ID (e.g. P001, G003)",
    mime_type: "text/markdown",
};

fn index_text(vault: &Vault, tier: Tier) -> Result<String> {
    if !vault.exists(tier) {
        let label = match tier {
            Tier::Global => "Global",
            Tier::Project => "Project",
        };
        return Ok(format!(
            "{label} vault not initialized. Use ctx_init to create it."
        ));
    }
    vault.index(tier).read_raw()
}

/// Text behind `uri`. Unknown URIs and missing documents yield explanatory
/// text rather than an error.
pub fn read(vault: &Vault, uri: &str) -> Result<String> {
    match uri {
        GLOBAL_INDEX_URI => index_text(vault, Tier::Global),
        PROJECT_INDEX_URI => index_text(vault, Tier::Project),
        SETTINGS_URI => Ok(serde_json::to_string_pretty(&vault.settings())?),
        INSTRUCTIONS_URI => Ok(INSTRUCTIONS.to_string()),
        _ => {
            let Some(id) = uri
                .strip_prefix(DOC_URI_PREFIX)
                .and_then(|raw| raw.parse::<DocId>().ok())
            else {
                return Ok(format!("Unknown resource: {uri}"));
            };
            Ok(vault
                .read_document(id)?
                .unwrap_or_else(|| format!("Document {id} not found.")))
        }
    }
}
