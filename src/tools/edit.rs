//! In-place edits: `ctx_update`, `ctx_link` and `ctx_archive`.

use anyhow::{bail, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vault::types::DocId;
use crate::vault::Vault;

/// Parameters for the `ctx_update` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateParams {
    #[schemars(description = "Document ID to update")]
    pub id: String,

    #[schemars(description = "New content to add to the section")]
    pub content: String,

    #[schemars(
        description = "Section name to update (e.g. \"Current Understanding\", \"Key Points\", \"Notes\")"
    )]
    pub section: Option<String>,
}

/// Parameters for the `ctx_link` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LinkParams {
    #[schemars(description = "Source document ID")]
    pub from_id: String,

    #[schemars(description = "Target document ID")]
    pub to_id: String,
}

/// Parameters for the `ctx_archive` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ArchiveParams {
    #[schemars(description = "Document ID to archive (e.g. \"P001\", \"G003\")")]
    pub id: String,

    #[schemars(
        description = "Reason for archiving (e.g. \"Replaced by new auth system\", \"Feature deprecated\")"
    )]
    pub reason: String,
}

pub fn update(vault: &mut Vault, params: &UpdateParams) -> Result<String> {
    if params.id.trim().is_empty() || params.content.trim().is_empty() {
        bail!("id and content are required.");
    }
    let id: DocId = params.id.trim().parse()?;
    let section = params
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    vault.update_document(id, section, &params.content)?;
    tracing::info!(id = %id, section = section.unwrap_or("-"), "document updated");

    let suffix = section
        .map(|s| format!(" (section: {s})"))
        .unwrap_or_default();
    Ok(format!(
        "Updated **{id}**{suffix}\n\nContent appended successfully."
    ))
}

pub fn link(vault: &Vault, params: &LinkParams) -> Result<String> {
    if params.from_id.trim().is_empty() || params.to_id.trim().is_empty() {
        bail!("from_id and to_id are required.");
    }
    let from: DocId = params.from_id.trim().parse()?;
    let to: DocId = params.to_id.trim().parse()?;
    if from == to {
        bail!("cannot link {from} to itself.");
    }

    if vault.link_documents(from, to)? {
        Ok(format!("Linked **{from}** ↔ **{to}** (bidirectional)"))
    } else {
        Ok(format!("Link already exists between **{from}** and **{to}**."))
    }
}

pub fn archive(vault: &Vault, params: &ArchiveParams) -> Result<String> {
    if params.id.trim().is_empty() {
        bail!("Document ID is required (e.g., \"P001\", \"G003\").");
    }
    if params.reason.trim().is_empty() {
        bail!("Reason for archiving is required.");
    }
    let id: DocId = params.id.trim().parse()?;
    let reason = params.reason.trim();

    let outcome = vault.archive(id, reason)?;
    let moved = match &outcome.archived_file {
        Some(_) => "1. Moved to `archive/` folder with archive header",
        None => "1. No document file was found, so only the index changed",
    };

    Ok(format!(
        "**Archived successfully**\n\n**Document:** {id} - {topic}\n**Reason:** {reason}\n**Location:** {tier} vault → archive/\n\nThe document has been:\n{moved}\n2. Removed from Active Documents table\n3. Added to Archived table in index\n\nTo restore, manually move the file back and update the index.",
        topic = outcome.topic,
        tier = id.tier,
    ))
}
