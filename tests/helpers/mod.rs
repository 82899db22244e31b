#![allow(dead_code)]

use contextvault::vault::documents::Sections;
use contextvault::vault::enforcement::DomainClassifier;
use contextvault::vault::manager::{CreatedDocument, NewDocument};
use contextvault::vault::{DocType, Tier, Vault, VaultPaths};
use std::path::PathBuf;
use tempfile::TempDir;

/// A vault rooted in a fresh temp dir: global tier under `home/`, project
/// root at `app/`. Nothing is initialised yet.
pub fn test_vault() -> (TempDir, Vault) {
    let tmp = TempDir::new().unwrap();
    let paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
    (tmp, Vault::new(paths, DomainClassifier::default()))
}

/// Same as [`test_vault`] but with a legacy global location at `legacy/`.
pub fn test_vault_with_legacy() -> (TempDir, Vault, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let legacy = tmp.path().join("legacy");
    let mut paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
    paths.legacy_global_dir = legacy.clone();
    (tmp, Vault::new(paths, DomainClassifier::default()), legacy)
}

/// Create a plain project document titled `title`.
pub fn add_doc(vault: &mut Vault, tier: Tier, title: &str, body: &str) -> CreatedDocument {
    vault
        .create_document(NewDocument {
            tier,
            doc_type: DocType::Doc,
            kind: None,
            slug: title.to_lowercase().replace(' ', "_"),
            title: title.to_string(),
            topic: None,
            summary: format!("{title} notes"),
            sections: Sections::from([("content", body.to_string())]),
            related_terms: None,
        })
        .unwrap()
}
