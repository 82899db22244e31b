//! Vault error taxonomy.

use thiserror::Error;

use super::types::Tier;

/// Failures that callers branch on. Everything else travels as `anyhow::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Identifier is not a tier letter followed by a padded number
    #[error("invalid document id: {0} (expected e.g. \"P001\" or \"G003\")")]
    InvalidId(String),

    /// Unknown document id
    #[error("Document {id} not found in {tier} vault index")]
    NotFound { id: String, tier: Tier },

    /// Id is indexed but has no row in the Active Documents table
    #[error("Document {id} is not active in the {tier} vault (already archived?)")]
    NotActive { id: String, tier: Tier },

    /// Tier index file does not exist yet
    #[error("{0} vault not initialized. Use ctx_init to create it.")]
    NotInitialized(Tier),

    /// Tier is at its configured document ceiling
    #[error("{tier} vault is full ({count}/{max} docs). Archive old docs first.")]
    CapacityExceeded { tier: Tier, count: usize, max: usize },

    /// Index file has no table where one was expected
    #[error("Could not find {0} table in index")]
    MissingTable(&'static str),
}
