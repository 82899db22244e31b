//! The two-tier markdown knowledge base.
//!
//! A vault tier is a directory holding an `index.md` catalog plus one markdown
//! file per document. [`Vault`] composes both tiers with the shared settings
//! file and the in-memory enforcement counters.

pub mod bootstrap;
pub mod documents;
pub mod enforcement;
pub mod error;
pub mod health;
pub mod index;
pub mod manager;
pub mod migrate;
pub mod review;
pub mod settings;
pub mod types;

pub use error::VaultError;
pub use manager::{Vault, VaultPaths};
pub use types::{DocId, DocType, Tier};
