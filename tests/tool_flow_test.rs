mod helpers;

use contextvault::tools::capture::{self, DocParams, ErrorParams, NewParams};
use contextvault::tools::edit::{self, ArchiveParams, LinkParams, UpdateParams};
use contextvault::tools::lookup::{self, ReadParams, SearchParams, ShareFormat, ShareParams};
use contextvault::tools::manage::{self, InitParams};
use contextvault::tools::resources;
use contextvault::vault::{health, Tier};
use helpers::test_vault;

fn learning(topic: &str, content: &str) -> DocParams {
    DocParams {
        content: content.into(),
        topic: Some(topic.into()),
        r#type: None,
        vault: None,
        language: None,
        area: None,
        use_case: None,
    }
}

#[test]
fn document_search_read_update_archive() {
    let (_tmp, mut vault) = test_vault();
    let setup = manage::init(&vault, &InitParams::default()).unwrap();
    assert!(setup.starts_with("## Setup Complete"));

    let reply = capture::doc(
        &mut vault,
        learning("Retry Policy", "Use exponential backoff. Cap at five attempts."),
    )
    .unwrap();
    assert_eq!(
        reply,
        "Documented to **P001_retry_policy.md** (project vault)\n\nID: P001 | Topic: Retry Policy"
    );

    let dup = capture::doc(&mut vault, learning("Retry Policy", "again")).unwrap();
    assert!(dup.starts_with("Found existing document **P001**"));
    assert!(dup.contains("Existing summary: Use exponential backoff"));

    let reply = capture::error(
        &mut vault,
        ErrorParams {
            error_message: "connection reset by peer".into(),
            root_cause: "idle timeout on the load balancer".into(),
            solution: "enable TCP keepalive".into(),
            prevention: None,
        },
    )
    .unwrap();
    assert!(reply.contains("ID: P002"));

    let found = lookup::search(&vault, &SearchParams { query: "backoff".into() }).unwrap();
    assert!(found.contains("| P001 | Retry Policy | project |"));
    assert!(!found.contains("| P002 |"));

    edit::update(
        &mut vault,
        &UpdateParams {
            id: "P001".into(),
            content: "Jitter avoids thundering herds.".into(),
            section: Some("Key Points".into()),
        },
    )
    .unwrap();
    edit::link(
        &vault,
        &LinkParams {
            from_id: "P001".into(),
            to_id: "P002".into(),
        },
    )
    .unwrap();

    let text = lookup::read(&vault, &ReadParams { id: "P001".into() }).unwrap();
    assert!(text.contains("Jitter avoids thundering herds."));
    assert!(text.contains("P002"));
    let via_resource = resources::read(&vault, "contextvault://doc/P001").unwrap();
    assert_eq!(via_resource, text);

    let shared = lookup::share(
        &vault,
        &ShareParams {
            ids: vec!["P001".into(), "P002".into()],
            format: Some(ShareFormat::Json),
        },
    )
    .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&shared).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 2);

    edit::archive(
        &vault,
        &ArchiveParams {
            id: "P002".into(),
            reason: "Load balancer replaced".into(),
        },
    )
    .unwrap();
    let missing = lookup::read(&vault, &ReadParams { id: "P002".into() }).unwrap();
    assert!(missing.starts_with("Document P002 not found."));

    let status = manage::status(&vault).unwrap();
    assert!(status.contains("| **Project Vault** | 2/50 docs |"));

    // One linked active document with its file present: no index or file issues.
    let report = health::check(&vault);
    assert!(report.index.issues.is_empty(), "{:?}", report.index.issues);
    assert!(report.files.issues.is_empty(), "{:?}", report.files.issues);
    assert_eq!(vault.index(Tier::Project).parse_active_entries().unwrap().len(), 1);
}

#[test]
fn validation_errors_surface_as_messages() {
    let (_tmp, mut vault) = test_vault();
    let err = capture::doc(&mut vault, learning("Topic", "  ")).unwrap_err();
    assert_eq!(err.to_string(), "content is required.");

    let err = lookup::search(&vault, &SearchParams { query: String::new() }).unwrap_err();
    assert_eq!(err.to_string(), "query is required.");

    let err = lookup::share(
        &vault,
        &ShareParams {
            ids: vec!["P404".into(), "nope".into()],
            format: None,
        },
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Documents not found: P404, nope. Use ctx_search to find valid IDs."
    );
}

#[test]
fn awkward_summaries_and_titles_keep_ids_unique() {
    let (_tmp, mut vault) = test_vault();
    manage::init(&vault, &InitParams::default()).unwrap();

    // First sentence of ".env holds secrets" is empty.
    let first = capture::doc(&mut vault, learning("Alpha", ".env holds secrets")).unwrap();
    assert!(first.contains("ID: P001"), "{first}");
    let second = capture::doc(&mut vault, learning("Beta", "Plain summary.")).unwrap();
    assert!(second.contains("ID: P002"), "{second}");

    let third = capture::new(
        &mut vault,
        NewParams {
            title: "A | B".into(),
            content: "Pipes in titles.".into(),
            vault: None,
        },
    )
    .unwrap();
    assert!(third.contains("ID: P003"), "{third}");

    let active = vault.index(Tier::Project).parse_active_entries().unwrap();
    let ids: Vec<String> = active.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, ["P001", "P002", "P003"]);
    assert_eq!(active[2].topic, "A | B");
    assert_eq!(active[2].status, "Active");

    let read = lookup::read(&vault, &ReadParams { id: "P001".into() }).unwrap();
    assert!(read.contains("Alpha"));
}
