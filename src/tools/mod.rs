pub mod capture;
pub mod edit;
pub mod help;
pub mod lookup;
pub mod manage;
pub mod resources;

use capture::{DecisionParams, DocParams, ErrorParams, HandoffParams, NewParams, PlanParams};
use edit::{ArchiveParams, LinkParams, UpdateParams};
use lookup::{QuizParams, ReadParams, SearchParams, ShareParams};
use manage::{ImportParams, InitParams, ModeParams, ReviewParams};
use resources::ResourceSpec;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, JsonObject,
    ListResourceTemplatesResult, ListResourcesResult, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
    ResourceTemplate, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler};
use std::sync::{Arc, Mutex};

use crate::vault::Vault;

/// The ContextVault MCP tool handler. Holds the one long-lived [`Vault`] and
/// exposes every `ctx_*` tool via the `#[tool_router]` macro. Calls to any
/// other tool name go through [`unrouted_call`].
#[derive(Clone)]
pub struct VaultTools {
    tool_router: ToolRouter<Self>,
    vault: Arc<Mutex<Vault>>,
}

/// Append the research nudge, when due, to a successful reply.
fn with_research_nudge(vault: &Vault, reply: anyhow::Result<String>) -> anyhow::Result<String> {
    let mut text = reply?;
    if let Some(nudge) = vault.research_reminder() {
        text += &nudge;
    }
    Ok(text)
}

/// Reply for a tool name with no route. Names outside the `ctx_` namespace
/// are host edits forwarded to this server: each one counts toward the edit
/// reminder, which is appended once due.
pub fn unrouted_call(vault: &mut Vault, name: &str, args: Option<&JsonObject>) -> String {
    let mut text = format!("Unknown tool: {name}");
    if name.starts_with("ctx_") {
        return text;
    }
    let file = args
        .and_then(|a| a.get("file_path").or_else(|| a.get("path")))
        .and_then(|v| v.as_str());
    vault.track_edit(file);
    tracing::debug!(tool = name, file, "host edit tracked");
    if let Some(reminder) = vault.edit_reminder() {
        text += &reminder;
    }
    text
}

#[tool_router]
impl VaultTools {
    pub fn new(vault: Arc<Mutex<Vault>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            vault,
        }
    }

    /// Run `op` against the vault on the blocking pool (all vault work is
    /// synchronous file I/O). Failures become error-flagged tool results.
    async fn with_vault<F>(&self, tool: &'static str, op: F) -> Result<String, String>
    where
        F: FnOnce(&mut Vault) -> anyhow::Result<String> + Send + 'static,
    {
        tracing::info!(tool, "tool called");
        let vault = Arc::clone(&self.vault);
        let result = tokio::task::spawn_blocking(move || {
            let mut vault = vault
                .lock()
                .map_err(|e| anyhow::anyhow!("vault lock poisoned: {e}"))?;
            op(&mut vault)
        })
        .await
        .map_err(|e| format!("vault task failed: {e}"))?;

        result.map_err(|e| {
            tracing::warn!(tool, error = %format!("{e:#}"), "tool failed");
            format!("Error: {e:#}")
        })
    }

    #[tool(description = "Initialize ContextVault in the current project. Creates .contextvault/ directory with index and settings.")]
    async fn ctx_init(&self, Parameters(params): Parameters<InitParams>) -> Result<String, String> {
        self.with_vault("ctx_init", move |vault| manage::init(vault, &params))
            .await
    }

    #[tool(description = "Show ContextVault status: document counts, paths, mode, enforcement level.")]
    async fn ctx_status(&self) -> Result<String, String> {
        self.with_vault("ctx_status", |vault| manage::status(vault))
            .await
    }

    #[tool(description = "Document a learning, exploration finding, or code snippet. Use type=\"intel\" for codebase exploration, type=\"snippet\" for reusable code patterns.")]
    async fn ctx_doc(&self, Parameters(params): Parameters<DocParams>) -> Result<String, String> {
        self.with_vault("ctx_doc", move |vault| capture::doc(vault, params))
            .await
    }

    #[tool(description = "Document a bug fix: error message, root cause, solution, and prevention.")]
    async fn ctx_error(&self, Parameters(params): Parameters<ErrorParams>) -> Result<String, String> {
        self.with_vault("ctx_error", move |vault| capture::error(vault, params))
            .await
    }

    #[tool(description = "Document an architectural or technical decision with reasoning.")]
    async fn ctx_decision(
        &self,
        Parameters(params): Parameters<DecisionParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_decision", move |vault| capture::decision(vault, params))
            .await
    }

    #[tool(description = "Document an implementation plan for a multi-step task.")]
    async fn ctx_plan(&self, Parameters(params): Parameters<PlanParams>) -> Result<String, String> {
        self.with_vault("ctx_plan", move |vault| capture::plan(vault, params))
            .await
    }

    #[tool(description = "Create a session handoff summary for the next session to continue seamlessly.")]
    async fn ctx_handoff(
        &self,
        Parameters(params): Parameters<HandoffParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_handoff", move |vault| capture::handoff(vault, params))
            .await
    }

    #[tool(description = "Create a new vault document with custom title and content.")]
    async fn ctx_new(&self, Parameters(params): Parameters<NewParams>) -> Result<String, String> {
        self.with_vault("ctx_new", move |vault| capture::new(vault, params))
            .await
    }

    #[tool(description = "Search across vault documents by keyword.")]
    async fn ctx_search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_search", move |vault| {
            let reply = lookup::search(vault, &params);
            vault.track_research(Some(params.query.trim()));
            with_research_nudge(vault, reply)
        })
        .await
    }

    #[tool(description = "Read a vault document by ID (e.g. \"P001\", \"G003\").")]
    async fn ctx_read(&self, Parameters(params): Parameters<ReadParams>) -> Result<String, String> {
        self.with_vault("ctx_read", move |vault| {
            let reply = lookup::read(vault, &params);
            vault.track_research(Some(params.id.trim()));
            with_research_nudge(vault, reply)
        })
        .await
    }

    #[tool(description = "Update an existing vault document by appending to a section.")]
    async fn ctx_update(
        &self,
        Parameters(params): Parameters<UpdateParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_update", move |vault| edit::update(vault, &params))
            .await
    }

    #[tool(description = "Link two related documents together.")]
    async fn ctx_link(&self, Parameters(params): Parameters<LinkParams>) -> Result<String, String> {
        self.with_vault("ctx_link", move |vault| edit::link(vault, &params))
            .await
    }

    #[tool(description = "Archive a vault document. Moves doc to archive folder, removes from active index, adds to archived table.")]
    async fn ctx_archive(
        &self,
        Parameters(params): Parameters<ArchiveParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_archive", move |vault| edit::archive(vault, &params))
            .await
    }

    #[tool(description = "Switch vault mode or enforcement level. Without parameters, shows the current settings.")]
    async fn ctx_mode(&self, Parameters(params): Parameters<ModeParams>) -> Result<String, String> {
        self.with_vault("ctx_mode", move |vault| manage::mode(vault, &params))
            .await
    }

    #[tool(description = "Check vault health: orphaned docs, index mismatches, size limits, code drift.")]
    async fn ctx_health(&self) -> Result<String, String> {
        self.with_vault("ctx_health", |vault| Ok(manage::health(vault)))
            .await
    }

    #[tool(description = "Run curation review on vault. Finds stale docs, suggests merges, identifies cleanup opportunities.")]
    async fn ctx_review(
        &self,
        Parameters(params): Parameters<ReviewParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_review", move |vault| manage::review(vault, &params))
            .await
    }

    #[tool(description = "Scan the codebase and suggest documentation: languages, frameworks, package managers, config files, source directories.")]
    async fn ctx_bootstrap(&self) -> Result<String, String> {
        self.with_vault("ctx_bootstrap", |vault| manage::bootstrap(vault))
            .await
    }

    #[tool(description = "Test knowledge retention from vault documents. Generates questions based on stored docs.")]
    async fn ctx_quiz(&self, Parameters(params): Parameters<QuizParams>) -> Result<String, String> {
        self.with_vault("ctx_quiz", move |vault| lookup::quiz(vault, &params))
            .await
    }

    #[tool(description = "Export vault documents for sharing.")]
    async fn ctx_share(&self, Parameters(params): Parameters<ShareParams>) -> Result<String, String> {
        self.with_vault("ctx_share", move |vault| lookup::share(vault, &params))
            .await
    }

    #[tool(description = "Import documents from a directory, a single .md file, or the legacy .claude/vault/ location.")]
    async fn ctx_import(
        &self,
        Parameters(params): Parameters<ImportParams>,
    ) -> Result<String, String> {
        self.with_vault("ctx_import", move |vault| manage::import(vault, &params))
            .await
    }

    #[tool(description = "Upgrade vault format to latest version. Fixes structure issues.")]
    async fn ctx_upgrade(&self) -> Result<String, String> {
        self.with_vault("ctx_upgrade", |vault| manage::upgrade(vault))
            .await
    }

    #[tool(description = "Show all ContextVault commands and their descriptions.")]
    async fn ctx_help(&self) -> Result<String, String> {
        Ok(help::HELP.to_string())
    }

    #[tool(description = "Show ContextVault version history and changelog.")]
    async fn ctx_changelog(&self) -> Result<String, String> {
        Ok(help::CHANGELOG.to_string())
    }
}

fn listing_json(spec: &ResourceSpec, uri_key: &str) -> serde_json::Value {
    serde_json::json!({
        uri_key: spec.uri,
        "name": spec.name,
        "description": spec.description,
        "mimeType": spec.mime_type,
    })
}

fn internal(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

impl ServerHandler for VaultTools {
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if self.tool_router.has_route(&request.name) {
            let tcc = ToolCallContext::new(self, request, context);
            return self.tool_router.call(tcc).await;
        }

        let vault = Arc::clone(&self.vault);
        let text = tokio::task::spawn_blocking(move || {
            let mut vault = vault
                .lock()
                .map_err(|e| anyhow::anyhow!("vault lock poisoned: {e}"))?;
            Ok::<_, anyhow::Error>(unrouted_call(
                &mut vault,
                &request.name,
                request.arguments.as_ref(),
            ))
        })
        .await
        .map_err(internal)?
        .map_err(|e| internal(format!("{e:#}")))?;
        Ok(CallToolResult::error(vec![Content::text(text)]))
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tool_router.get(name).cloned()
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            instructions: Some(help::INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: "contextvault".to_string(),
                title: Some("ContextVault".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let listed: Vec<Resource> = resources::RESOURCES
            .iter()
            .map(|spec| serde_json::from_value(listing_json(spec, "uri")))
            .collect::<Result<_, _>>()
            .map_err(internal)?;
        Ok(ListResourcesResult::with_all_items(listed))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let template: ResourceTemplate =
            serde_json::from_value(listing_json(&resources::DOC_TEMPLATE, "uriTemplate"))
                .map_err(internal)?;
        Ok(ListResourceTemplatesResult::with_all_items(vec![template]))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let uri = request.uri;
        let vault = Arc::clone(&self.vault);
        let target = uri.clone();
        let text = tokio::task::spawn_blocking(move || {
            let vault = vault
                .lock()
                .map_err(|e| anyhow::anyhow!("vault lock poisoned: {e}"))?;
            resources::read(&vault, &target)
        })
        .await
        .map_err(internal)?
        .map_err(|e| internal(format!("{e:#}")))?;

        tracing::debug!(uri = %uri, "resource read");
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}
