mod helpers;

use contextvault::vault::migrate;
use contextvault::vault::Tier;
use helpers::test_vault_with_legacy;

#[test]
fn legacy_import_copies_then_skips() {
    let (_tmp, vault, legacy) = test_vault_with_legacy();
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(legacy.join("G001_rust-errors.md"), "# G001 - Rust errors\n").unwrap();
    std::fs::write(legacy.join("G002_git-tips.md"), "# G002 - Git tips\n").unwrap();
    std::fs::write(legacy.join("index.md"), "# Legacy index\n").unwrap();
    std::fs::write(legacy.join("notes.txt"), "ignored").unwrap();

    let project_legacy = vault.paths().project_root.join(".claude").join("vault");
    std::fs::create_dir_all(&project_legacy).unwrap();
    std::fs::write(project_legacy.join("P001_setup.md"), "# P001 - Setup\n").unwrap();

    let first = migrate::import_legacy(&vault).unwrap();
    let (_, global) = first.global.clone().unwrap();
    let (_, project) = first.project.clone().unwrap();
    assert_eq!((global.imported, global.skipped), (3, 0));
    assert_eq!((project.imported, project.skipped), (1, 0));
    assert!(vault.dir(Tier::Global).join("G002_git-tips.md").exists());
    assert!(vault.dir(Tier::Project).join("P001_setup.md").exists());
    assert!(!vault.dir(Tier::Global).join("notes.txt").exists());

    let report = first.to_markdown();
    assert!(report.contains("**Total:** 4 imported, 0 skipped"));

    let second = migrate::import_legacy(&vault).unwrap();
    let totals = second.totals();
    assert_eq!(totals.imported, 0);
    assert_eq!(totals.skipped, 4);
}

#[test]
fn missing_legacy_is_reported() {
    let (_tmp, vault, _legacy) = test_vault_with_legacy();
    let report = migrate::import_legacy(&vault).unwrap();
    assert!(report.global.is_none());
    assert!(report.project.is_none());
    assert!(report
        .to_markdown()
        .contains("**Global**: No legacy vault found at ~/.claude/vault/"));
}
