//! Static texts: `ctx_help`, `ctx_changelog` and the assistant instructions
//! served as a resource and in the server info.

pub const HELP: &str = "# ContextVault MCP Commands

## Document Your Work
| Command | Description |
|---------|-------------|
| **ctx_doc** | Quick document a learning (type=intel for exploration, type=snippet for code) |
| **ctx_error** | Document a bug fix (error, cause, solution) |
| **ctx_decision** | Document a decision with reasoning |
| **ctx_plan** | Document an implementation plan |
| **ctx_handoff** | Create session handoff summary |

## Manage Documents
| Command | Description |
|---------|-------------|
| **ctx_search** | Search vault documents by keyword |
| **ctx_read** | Read a document by ID (P001, G003) |
| **ctx_update** | Append to a document section (section=\"Notes\" for quick notes) |
| **ctx_new** | Create a new document with custom content |
| **ctx_link** | Link two related documents |
| **ctx_archive** | Archive a deprecated document |
| **ctx_review** | Run curation review |

## Vault Management
| Command | Description |
|---------|-------------|
| **ctx_init** | Initialize vault in current project |
| **ctx_status** | Show vault status and stats |
| **ctx_mode** | Switch mode (local/global/full) or enforcement |
| **ctx_health** | Check vault health |
| **ctx_bootstrap** | Scan the codebase and suggest first documents |
| **ctx_upgrade** | Upgrade vault format |
| **ctx_changelog** | Show version history |

## Share & Import
| Command | Description |
|---------|-------------|
| **ctx_share** | Export documents for sharing |
| **ctx_import** | Import from a directory, a .md file, or the legacy vault |
| **ctx_quiz** | Test knowledge retention |

## Resources (Auto-loaded)
- `contextvault://global/index` - Global vault index
- `contextvault://project/index` - Project vault index
- `contextvault://settings` - Current settings
- `contextvault://instructions` - Documentation rules
- `contextvault://doc/{id}` - Individual document
";

pub const CHANGELOG: &str = "# ContextVault Changelog

## v1.0.5
- Configurable domain table for research nudges (`[enforcement] domains` in config.toml)
- `contextvault status`, `health` and `import` subcommands
- Update check against crates.io with a bounded timeout

## v1.0.0 (MCP Server)
- Initial MCP server release
- 23 tools covering the whole documentation workflow
- 4 MCP resources (global index, project index, settings, instructions)
- Resource template for individual documents
- Server-side enforcement engine (no hooks needed)
- CLI-agnostic vault paths (~/.contextvault/, ./.contextvault/)
- Backward compatible with legacy .claude/vault/ locations
";

pub const INSTRUCTIONS: &str = "# ContextVault - Documentation Rules

## After EVERY task, document what you learned:

- Fixed a bug? Use **ctx_error** (error_message, root_cause, solution, prevention)
- Made a decision? Use **ctx_decision** (decision, options, reasoning, tradeoffs)
- Learned something? Use **ctx_doc** (topic, content)
- Found useful code? Use **ctx_doc** with type=\"snippet\" (topic, content, language, use_case)
- Explored codebase? Use **ctx_doc** with type=\"intel\" (area, content)
- Ending session? Use **ctx_handoff** (completed, in_progress, next_steps)

## Rules:
1. ALWAYS search before creating (use ctx_search)
2. NEVER create duplicates - update existing docs instead (use ctx_update)
3. Keep documents under 100 lines
4. Keep index summaries under 15 words
5. Route correctly: global = reusable patterns, project = this codebase only
6. Document at meaningful milestones, not every trivial edit

## At session start:
- Read the vault indexes (available as resources)
- Use that knowledge throughout the session
";
