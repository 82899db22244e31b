//! Document-creating tools: `ctx_doc`, `ctx_error`, `ctx_decision`,
//! `ctx_plan`, `ctx_handoff` and `ctx_new`.
//!
//! Every handler here ends in [`Vault::create_document`], which initialises
//! the tier on demand and enforces the tier's document ceiling.

use anyhow::{bail, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vault::documents::{first_sentence, Sections};
use crate::vault::manager::NewDocument;
use crate::vault::types::{slugify, today, truncate_chars, DocType, Tier};
use crate::vault::Vault;

/// Parameters for the `ctx_doc` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DocParams {
    #[schemars(description = "What you learned, explored, or the code snippet")]
    pub content: String,

    #[schemars(description = "Topic name (e.g. \"Auth System\", \"Docker Setup\")")]
    pub topic: Option<String>,

    /// `learning` (default), `intel` or `snippet`.
    #[schemars(
        description = "Document type: learning (default), intel (exploration), snippet (code)"
    )]
    pub r#type: Option<String>,

    #[schemars(
        description = "Which vault: global or project (snippets default to global, others to project)"
    )]
    pub vault: Option<String>,

    #[schemars(description = "Programming language (for snippets)")]
    pub language: Option<String>,

    #[schemars(description = "Area explored (alias for topic, for intel type)")]
    pub area: Option<String>,

    #[schemars(description = "When to use this snippet (for snippets)")]
    pub use_case: Option<String>,
}

/// Parameters for the `ctx_error` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorParams {
    #[schemars(description = "The error message encountered")]
    pub error_message: String,

    #[schemars(description = "What caused the error")]
    pub root_cause: String,

    #[schemars(description = "How the error was fixed")]
    pub solution: String,

    #[schemars(description = "How to prevent this in the future")]
    pub prevention: Option<String>,
}

/// Parameters for the `ctx_decision` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DecisionParams {
    #[schemars(description = "What was decided")]
    pub decision: String,

    #[schemars(description = "Why this option was chosen")]
    pub reasoning: String,

    #[schemars(description = "Options that were considered")]
    pub options: Option<String>,

    #[schemars(description = "Trade-offs and downsides")]
    pub tradeoffs: Option<String>,
}

/// Parameters for the `ctx_plan` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PlanParams {
    #[schemars(description = "What the plan aims to achieve")]
    pub goal: String,

    #[schemars(description = "Implementation steps (markdown list)")]
    pub steps: String,

    #[schemars(description = "Current status (default: In Progress)")]
    pub status: Option<String>,
}

/// Parameters for the `ctx_handoff` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HandoffParams {
    #[schemars(description = "What was completed this session")]
    pub completed: String,

    #[schemars(description = "What should be done next")]
    pub next_steps: String,

    #[schemars(description = "What is still in progress")]
    pub in_progress: Option<String>,
}

/// Parameters for the `ctx_new` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NewParams {
    #[schemars(description = "Document title")]
    pub title: String,

    #[schemars(description = "Document content")]
    pub content: String,

    #[schemars(description = "Which vault: global or project (default: project)")]
    pub vault: Option<String>,
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Non-empty optional parameter.
fn given(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !blank(v))
}

fn parse_tier(value: &Option<String>, default: Tier) -> Result<Tier> {
    match given(value) {
        Some(v) => v.parse().map_err(anyhow::Error::msg),
        None => Ok(default),
    }
}

/// Comma-joined lowercase words of `text`, for the Related Terms table.
pub fn search_terms(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reply for a create request that matches an existing entry. `action` names
/// what the caller should do with ctx_update instead.
fn existing_reply(
    vault: &Vault,
    tier: Tier,
    query: &str,
    action: &str,
    with_summary: bool,
) -> Result<Option<String>> {
    vault.ensure_initialized(tier)?;
    let hits = vault.index(tier).search(query)?;
    Ok(hits.into_iter().next().map(|hit| {
        tracing::info!(id = %hit.entry.id, query, "duplicate document detected");
        let mut reply = format!(
            "Found existing document **{}** on \"{}\". Use **ctx_update** to {action} instead of creating a duplicate.",
            hit.entry.id, hit.entry.topic
        );
        if with_summary {
            reply += &format!("\n\nExisting summary: {}", hit.entry.summary);
        }
        reply
    }))
}

pub fn doc(vault: &mut Vault, params: DocParams) -> Result<String> {
    if blank(&params.content) {
        bail!("content is required.");
    }
    match given(&params.r#type).unwrap_or("learning") {
        "intel" => intel(vault, params),
        "snippet" => snippet(vault, params),
        _ => learning(vault, params),
    }
}

fn learning(vault: &mut Vault, params: DocParams) -> Result<String> {
    let Some(topic) = given(&params.topic).or(given(&params.area)).map(str::to_string) else {
        bail!("topic and content are required.");
    };
    let tier = parse_tier(&params.vault, Tier::Project)?;

    if let Some(reply) = existing_reply(vault, tier, &topic, "update it", true)? {
        return Ok(reply);
    }

    let lead = first_sentence(&params.content).to_string();
    let created = vault.create_document(NewDocument {
        tier,
        doc_type: DocType::Doc,
        kind: None,
        slug: slugify(&topic),
        title: topic.clone(),
        topic: None,
        summary: truncate_chars(&lead, 80).to_string(),
        sections: Sections::from([
            ("content", params.content.clone()),
            ("key_points", format!("- {lead}")),
        ]),
        related_terms: Some(search_terms(&topic)),
    })?;

    Ok(format!(
        "Documented to **{}** ({tier} vault)\n\nID: {} | Topic: {topic}",
        created.filename, created.id
    ))
}

fn intel(vault: &mut Vault, params: DocParams) -> Result<String> {
    let Some(area) = given(&params.area).or(given(&params.topic)).map(str::to_string) else {
        bail!("area and findings are required.");
    };
    let tier = parse_tier(&params.vault, Tier::Project)?;

    if let Some(reply) = existing_reply(vault, tier, &area, "add findings", false)? {
        return Ok(reply);
    }

    let topic = format!("Intel: {area}");
    let created = vault.create_document(NewDocument {
        tier,
        doc_type: DocType::Intel,
        kind: Some("intel"),
        slug: slugify(truncate_chars(&area, 40)),
        title: topic.clone(),
        topic: None,
        summary: format!("Explored: {}", truncate_chars(&area, 50)),
        sections: Sections::from([("area", area.clone()), ("findings", params.content)]),
        related_terms: None,
    })?;

    Ok(format!(
        "Intel documented to **{}**\n\nID: {} | Area: {area}",
        created.filename, created.id
    ))
}

fn snippet(vault: &mut Vault, params: DocParams) -> Result<String> {
    let Some(name) = given(&params.topic).or(given(&params.area)).map(str::to_string) else {
        bail!("name and code are required.");
    };
    let tier = parse_tier(&params.vault, Tier::Global)?;
    let language = given(&params.language).unwrap_or_default().to_string();

    let mut sections = Sections::from([
        ("code", params.content),
        ("language", language.clone()),
    ]);
    if let Some(use_case) = given(&params.use_case) {
        sections.insert("use_case", use_case.to_string());
    }

    let lang_prefix = if language.is_empty() {
        String::new()
    } else {
        format!("{language} ")
    };
    let created = vault.create_document(NewDocument {
        tier,
        doc_type: DocType::Snippet,
        kind: Some("snippet"),
        slug: slugify(&name),
        title: format!("Snippet: {name}"),
        topic: None,
        summary: format!("{lang_prefix}snippet: {}", truncate_chars(&name, 40)),
        sections,
        related_terms: None,
    })?;

    Ok(format!(
        "Snippet saved to **{}** ({tier} vault)\n\nID: {} | Name: {name}",
        created.filename, created.id
    ))
}

pub fn error(vault: &mut Vault, params: ErrorParams) -> Result<String> {
    if blank(&params.error_message) || blank(&params.root_cause) || blank(&params.solution) {
        bail!("error_message, root_cause, and solution are required.");
    }

    let slug = slugify(truncate_chars(&params.error_message, 40));
    let mut sections = Sections::from([
        ("error_message", params.error_message.clone()),
        ("root_cause", params.root_cause.clone()),
        ("solution", params.solution.clone()),
    ]);
    if let Some(prevention) = given(&params.prevention) {
        sections.insert("prevention", prevention.to_string());
    }

    let created = vault.create_document(NewDocument {
        tier: Tier::Project,
        doc_type: DocType::Error,
        kind: Some("error"),
        related_terms: Some(format!("error, bug, {}", search_terms(&slug))),
        slug,
        title: format!("Error: {}", truncate_chars(&params.error_message, 60)),
        topic: None,
        summary: format!(
            "{} → {}",
            truncate_chars(&params.root_cause, 40),
            truncate_chars(&params.solution, 30)
        ),
        sections,
    })?;

    Ok(format!(
        "Documented error to **{}**\n\nID: {} | Root cause: {}",
        created.filename,
        created.id,
        truncate_chars(&params.root_cause, 60)
    ))
}

pub fn decision(vault: &mut Vault, params: DecisionParams) -> Result<String> {
    if blank(&params.decision) || blank(&params.reasoning) {
        bail!("decision and reasoning are required.");
    }

    let slug = slugify(truncate_chars(&params.decision, 40));
    let mut sections = Sections::from([
        ("decision", params.decision.clone()),
        ("reasoning", params.reasoning.clone()),
    ]);
    if let Some(options) = given(&params.options) {
        sections.insert("options", options.to_string());
    }
    if let Some(tradeoffs) = given(&params.tradeoffs) {
        sections.insert("tradeoffs", tradeoffs.to_string());
    }

    let created = vault.create_document(NewDocument {
        tier: Tier::Project,
        doc_type: DocType::Decision,
        kind: Some("decision"),
        related_terms: Some(format!("decision, {}", search_terms(&slug))),
        slug,
        title: format!("Decision: {}", truncate_chars(&params.decision, 60)),
        topic: None,
        summary: format!("Chose: {}", truncate_chars(&params.decision, 50)),
        sections,
    })?;

    Ok(format!(
        "Documented decision to **{}**\n\nID: {} | Decision: {}",
        created.filename,
        created.id,
        truncate_chars(&params.decision, 80)
    ))
}

pub fn plan(vault: &mut Vault, params: PlanParams) -> Result<String> {
    if blank(&params.goal) || blank(&params.steps) {
        bail!("goal and steps are required.");
    }

    let status = given(&params.status).unwrap_or("In Progress").to_string();
    let created = vault.create_document(NewDocument {
        tier: Tier::Project,
        doc_type: DocType::Plan,
        kind: Some("plan"),
        slug: slugify(truncate_chars(&params.goal, 40)),
        title: format!("Plan: {}", truncate_chars(&params.goal, 60)),
        topic: None,
        summary: format!("Plan: {}", truncate_chars(&params.goal, 50)),
        sections: Sections::from([
            ("goal", params.goal.clone()),
            ("steps", params.steps),
            ("status", status),
        ]),
        related_terms: None,
    })?;

    Ok(format!(
        "Plan documented to **{}**\n\nID: {} | Goal: {}",
        created.filename,
        created.id,
        truncate_chars(&params.goal, 80)
    ))
}

pub fn handoff(vault: &mut Vault, params: HandoffParams) -> Result<String> {
    if blank(&params.completed) || blank(&params.next_steps) {
        bail!("completed and next_steps are required.");
    }

    let date = today();
    let in_progress = given(&params.in_progress).unwrap_or("None").to_string();
    let created = vault.create_document(NewDocument {
        tier: Tier::Project,
        doc_type: DocType::Handoff,
        kind: Some("handoff"),
        slug: date.clone(),
        title: format!("Handoff {date}"),
        topic: None,
        summary: format!("Session handoff: {}", truncate_chars(&params.next_steps, 40)),
        sections: Sections::from([
            ("completed", params.completed),
            ("in_progress", in_progress),
            ("next_steps", params.next_steps.clone()),
        ]),
        related_terms: None,
    })?;

    Ok(format!(
        "Session handoff saved to **{}**\n\nID: {}\n\n**Next session should:**\n{}",
        created.filename, created.id, params.next_steps
    ))
}

pub fn new(vault: &mut Vault, params: NewParams) -> Result<String> {
    if blank(&params.title) || blank(&params.content) {
        bail!("title and content are required.");
    }
    let tier = parse_tier(&params.vault, Tier::Project)?;

    let created = vault.create_document(NewDocument {
        tier,
        doc_type: DocType::Doc,
        kind: None,
        slug: slugify(truncate_chars(&params.title, 40)),
        title: params.title.clone(),
        topic: None,
        summary: truncate_chars(first_sentence(&params.content), 80).to_string(),
        sections: Sections::from([("content", params.content)]),
        related_terms: None,
    })?;

    Ok(format!(
        "Created **{}** ({tier} vault)\n\nID: {} | Title: {}",
        created.filename, created.id, params.title
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::enforcement::DomainClassifier;
    use crate::vault::manager::VaultPaths;
    use crate::vault::VaultError;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        let paths = VaultPaths::new(tmp.path().join("home"), tmp.path().join("app"));
        (tmp, Vault::new(paths, DomainClassifier::default()))
    }

    fn learning_params(topic: &str, content: &str) -> DocParams {
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
    fn search_terms_split_on_punctuation() {
        assert_eq!(search_terms("Auth System (JWT)"), "auth, system, jwt");
        assert_eq!(search_terms("---"), "");
    }

    #[test]
    fn learning_doc_is_indexed_once() {
        let (_tmp, mut v) = vault();
        let reply = doc(&mut v, learning_params("Auth System", "Uses JWT. Tokens rotate.")).unwrap();
        assert_eq!(
            reply,
            "Documented to **P001_auth_system.md** (project vault)\n\nID: P001 | Topic: Auth System"
        );

        let entries = v.index(Tier::Project).parse_active_entries().unwrap();
        assert_eq!(entries[0].summary, "Uses JWT");
        let text = v.read_document("P001".parse().unwrap()).unwrap().unwrap();
        assert!(text.contains("## Key Points\n\n- Uses JWT"));
        assert!(v.index(Tier::Project).read_raw().unwrap().contains("| auth, system | P001 |"));

        let again = doc(&mut v, learning_params("Auth System", "More.")).unwrap();
        assert!(again.starts_with("Found existing document **P001**"));
        assert!(again.ends_with("Existing summary: Uses JWT"));
        assert_eq!(v.list_doc_files(Tier::Project).len(), 1);
    }

    #[test]
    fn learning_doc_requires_topic() {
        let (_tmp, mut v) = vault();
        let mut params = learning_params("", "body");
        params.topic = None;
        let err = doc(&mut v, params).unwrap_err();
        assert_eq!(err.to_string(), "topic and content are required.");
    }

    #[test]
    fn snippet_defaults_to_global() {
        let (_tmp, mut v) = vault();
        let params = DocParams {
            content: "fn main() {}".into(),
            topic: Some("Entry point".into()),
            r#type: Some("snippet".into()),
            vault: None,
            language: Some("rust".into()),
            area: None,
            use_case: Some("Starting a binary".into()),
        };
        let reply = doc(&mut v, params).unwrap();
        assert!(reply.starts_with("Snippet saved to **G001_snippet_entry_point.md** (global vault)"));

        let text = v.read_document("G001".parse().unwrap()).unwrap().unwrap();
        assert!(text.contains("```rust\nfn main() {}\n```"));
        let entries = v.index(Tier::Global).parse_active_entries().unwrap();
        assert_eq!(entries[0].summary, "rust snippet: Entry point");
    }

    #[test]
    fn intel_uses_area_alias() {
        let (_tmp, mut v) = vault();
        let params = DocParams {
            content: "Routes live in src/api.".into(),
            topic: None,
            r#type: Some("intel".into()),
            vault: None,
            language: None,
            area: Some("API layer".into()),
            use_case: None,
        };
        let reply = doc(&mut v, params).unwrap();
        assert_eq!(reply, "Intel documented to **P001_intel_api_layer.md**\n\nID: P001 | Area: API layer");
        let entries = v.index(Tier::Project).parse_active_entries().unwrap();
        assert_eq!(entries[0].topic, "Intel: API layer");
    }

    #[test]
    fn error_doc_layout() {
        let (_tmp, mut v) = vault();
        let reply = error(
            &mut v,
            ErrorParams {
                error_message: "Cannot read property 'id' of undefined".into(),
                root_cause: "User not loaded".into(),
                solution: "Guard the access".into(),
                prevention: None,
            },
        )
        .unwrap();
        assert!(reply.starts_with("Documented error to **P001_error_cannot_read_property_id_of_undefined.md**"));

        let text = v.read_document("P001".parse().unwrap()).unwrap().unwrap();
        assert!(text.contains("## Prevention\n\nN/A"));
        let raw = v.index(Tier::Project).read_raw().unwrap();
        assert!(raw.contains("| P001 | Error: Cannot read property 'id' of undefined | Active | User not loaded → Guard the access |"));
        assert!(raw.contains("| error, bug, cannot, read, property, id, of, undefined | P001 |"));
    }

    #[test]
    fn missing_required_fields_are_rejected_before_io() {
        let (_tmp, mut v) = vault();
        let err = decision(
            &mut v,
            DecisionParams {
                decision: "Use Postgres".into(),
                reasoning: " ".into(),
                options: None,
                tradeoffs: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "decision and reasoning are required.");
        assert!(!v.exists(Tier::Project));
    }

    #[test]
    fn plan_and_handoff_defaults() {
        let (_tmp, mut v) = vault();
        plan(
            &mut v,
            PlanParams {
                goal: "Ship search".into(),
                steps: "1. index\n2. rank".into(),
                status: None,
            },
        )
        .unwrap();
        let text = v.read_document("P001".parse().unwrap()).unwrap().unwrap();
        assert!(text.contains("## Status\n\nIn Progress"));

        let reply = handoff(
            &mut v,
            HandoffParams {
                completed: "Search".into(),
                next_steps: "Write docs".into(),
                in_progress: None,
            },
        )
        .unwrap();
        assert!(reply.contains(&format!("P002_handoff_{}.md", today())));
        assert!(reply.ends_with("**Next session should:**\nWrite docs"));
        let text = v.read_document("P002".parse().unwrap()).unwrap().unwrap();
        assert!(text.contains("## In Progress\n\nNone"));
    }

    #[test]
    fn new_respects_capacity() {
        let (_tmp, mut v) = vault();
        v.init_project(false).unwrap();
        let mut settings = v.settings();
        settings.limits.max_global_docs = 1;
        v.settings_store().save(&settings).unwrap();

        let params = |title: &str| NewParams {
            title: title.into(),
            content: "Body. More.".into(),
            vault: Some("global".into()),
        };
        let reply = new(&mut v, params("First note")).unwrap();
        assert_eq!(reply, "Created **G001_first_note.md** (global vault)\n\nID: G001 | Title: First note");

        let err = new(&mut v, params("Second note")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VaultError>(),
            Some(VaultError::CapacityExceeded { count: 1, max: 1, .. })
        ));
    }

    #[test]
    fn unknown_vault_is_rejected() {
        let (_tmp, mut v) = vault();
        let err = new(
            &mut v,
            NewParams {
                title: "x".into(),
                content: "y".into(),
                vault: Some("team".into()),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown vault: team"));
    }
}
