mod helpers;

use contextvault::tools::unrouted_call;
use contextvault::vault::settings::Enforcement;
use contextvault::vault::Tier;
use helpers::{add_doc, test_vault};

#[test]
fn light_level_stays_quiet() {
    let (_tmp, mut vault) = test_vault();
    vault.init_global().unwrap();
    vault
        .settings_store()
        .update(None, Some(Enforcement::Light))
        .unwrap();

    for i in 0..30 {
        vault.track_edit(Some(&format!("src/file{i}.rs")));
        vault.track_research(Some(&format!("area{i}")));
    }
    assert!(vault.edit_reminder().is_none());
    assert!(vault.research_reminder().is_none());
}

#[test]
fn balanced_edit_reminder_resets_on_document() {
    let (_tmp, mut vault) = test_vault();
    vault.init_project(false).unwrap();

    for i in 0..7 {
        vault.track_edit(Some(if i % 2 == 0 { "src/a.rs" } else { "src/b.rs" }));
    }
    assert!(vault.edit_reminder().is_none());

    vault.track_edit(Some("src/a.rs"));
    let reminder = vault.edit_reminder().unwrap();
    assert!(reminder.contains("Reminder"));
    assert!(reminder.contains("8 edits across 2 files"));

    add_doc(&mut vault, Tier::Project, "Edits", "what changed");
    assert_eq!(vault.enforcement().edit_count(), 0);
    assert!(vault.edit_reminder().is_none());
}

#[test]
fn research_nudge_waits_for_quiet_period() {
    let (_tmp, mut vault) = test_vault();
    vault.init_global().unwrap();
    for area in ["src/api/a.rs", "src/models/b.rs", "tests/c.rs", "docs/d.md"] {
        for _ in 0..3 {
            vault.track_research(Some(area));
        }
    }
    assert_eq!(vault.enforcement().research_count(), 12);
    // A document was "written" at session start, under ten minutes ago.
    assert!(vault.research_reminder().is_none());
}

#[test]
fn host_edit_calls_feed_the_edit_reminder() {
    let (_tmp, mut vault) = test_vault();
    vault.init_project(false).unwrap();

    let args = |path: &str| {
        let mut map = serde_json::Map::new();
        map.insert("file_path".into(), serde_json::Value::from(path));
        map
    };

    for i in 0..7 {
        let path = if i % 2 == 0 { "src/a.rs" } else { "src/b.rs" };
        let reply = unrouted_call(&mut vault, "Edit", Some(&args(path)));
        assert_eq!(reply, "Unknown tool: Edit");
    }
    assert_eq!(vault.enforcement().edit_count(), 7);

    let reply = unrouted_call(&mut vault, "Write", Some(&args("src/a.rs")));
    assert!(reply.starts_with("Unknown tool: Write"));
    assert!(reply.contains("8 edits across 2 files"), "{reply}");

    // Misspelled vault tools are not edits.
    let reply = unrouted_call(&mut vault, "ctx_nope", None);
    assert_eq!(reply, "Unknown tool: ctx_nope");
    assert_eq!(vault.enforcement().edit_count(), 8);
}
