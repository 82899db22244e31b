//! A local markdown knowledge base for AI assistants, served over MCP.
//!
//! ContextVault keeps two tiers of documents: a **global** vault under
//! `~/.contextvault/` for knowledge that travels between projects, and a
//! **project** vault under `./.contextvault/` for everything specific to the
//! current codebase. Each tier is a directory of plain markdown files plus an
//! `index.md` table that the assistant reads at session start.
//!
//! | Document type | Purpose |
//! |---------------|---------|
//! | **doc** | Learnings and general notes |
//! | **error** | Bug fixes: error, root cause, solution, prevention |
//! | **decision** | Choices with options, reasoning and trade-offs |
//! | **plan** | Multi-step implementation plans |
//! | **snippet** | Reusable code with language and use case |
//! | **intel** | Codebase exploration findings |
//! | **handoff** | Session summaries for the next session |
//!
//! # Architecture
//!
//! - **Storage**: plain files; no database, no background process
//! - **Index**: a line-oriented markdown table per tier, rewritten whole on change
//! - **Enforcement**: in-process counters that append reminders to tool replies
//! - **Transport**: MCP over stdio
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and environment variables
//! - [`vault`] - Index, documents, settings, health, review and migration
//! - [`tools`] - The `ctx_*` MCP tools and resources
//! - [`server`] - stdio server startup

pub mod config;
pub mod server;
pub mod tools;
pub mod vault;
