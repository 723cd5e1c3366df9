//! PAI Plugin - policy and audit layer for AI coding-agent hosts
//!
//! This crate sits between a coding agent and the tools it runs. Every shell
//! command and file access is classified against a security policy before it
//! executes, and every session leaves a redacted, append-only audit trail plus
//! a small knowledge archive of the agent's structured answers.
//!
//! # Overview
//!
//! - Security policy: deny/ask/allow decisions for commands and paths
//! - Redaction: secret scrubbing for everything that reaches disk or feedback
//! - Session roles: which subagent is acting in each session, shared through a file
//! - Event logging: day-bucketed JSONL audit lines, typed artifacts, session summaries
//! - Host hooks: event, tool execution, permission and system-prompt callbacks
//!
//! # Example
//!
//! ```rust,no_run
//! use pai_plugin::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PaiError> {
//!     let config = PluginConfig::builder()
//!         .pai_dir("/tmp/pai")
//!         .time_zone("Europe/Berlin")
//!         .build()?;
//!     let plugin = PaiPlugin::new(config).await;
//!
//!     plugin
//!         .event(RawEvent::new("session.created", json!({ "info": { "id": "ses_1" } })))
//!         .await;
//!
//!     let call = ToolCallInput::new("bash", "ses_1", json!({ "command": "rm -rf /" }));
//!     match plugin.tool_execute_before(&call).await {
//!         Err(PaiError::Blocked { feedback, .. }) => println!("{feedback}"),
//!         other => other?,
//!     }
//!
//!     plugin
//!         .event(RawEvent::new("session.deleted", json!({ "info": { "id": "ses_1" } })))
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! The policy engine can also be used on its own:
//!
//! ```rust
//! use pai_plugin::security::{DecisionStatus, PolicyEngine};
//!
//! let engine = PolicyEngine::default();
//! assert_eq!(engine.validate_command("git push --force").status, DecisionStatus::Ask);
//! assert_eq!(engine.validate_command("cargo build").status, DecisionStatus::Allow);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error types and utilities
///
/// This module defines the `PaiError` enum:
///
/// - `Io` - Filesystem operations (auto-converts from `std::io::Error`)
/// - `JsonDecode` - JSON encoding/decoding (auto-converts from `serde_json::Error`)
/// - `Config` - Invalid plugin configuration
/// - `InvalidTimeZone` - Unknown IANA zone name
/// - `Blocked` - A tool call denied by the security policy
/// - `HookPayload` - A host payload that cannot be decoded
pub mod error;

/// Plugin configuration, environment loading and the zone-aware clock
pub mod config;

/// Directory layout under `PAI_DIR` and first-run bootstrap
pub mod paths;

/// Secret redaction for strings and structured values
pub mod redaction;

/// Security policy engine
///
/// `PolicyEngine` classifies commands and paths using ordered tables of
/// `PatternCategory` values. See `rules` for the default tables.
pub mod security;

/// Permission handling for `permission.ask`
///
/// This module provides the `PermissionHandler` trait and the built-in
/// `PolicyPermissionHandler`.
pub mod permissions;

/// Host boundary types
///
/// Key types:
/// - `RawEvent` / `HostEvent` - Host events before and after decoding
/// - `ToolCallInput` / `ToolOutput` - Tool execution hook payloads
/// - `PermissionRequest` / `PermissionReply` - Permission prompt payloads
/// - `SystemTransformInput` / `SystemTransformOutput` - System prompt transform payloads
pub mod hooks;

/// Audit logging, role tracking and artifact archival
pub mod history;

/// Identity context injected into system prompts
pub mod context;

/// Host adapter tying the hooks together
pub mod plugin;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for pai_plugin users
    //!
    //! Use `use pai_plugin::prelude::*;` to import commonly used types.

    pub use crate::config::{PluginConfig, PluginConfigBuilder};
    pub use crate::context::SkillContext;
    pub use crate::error::PaiError;
    pub use crate::history::{AuditEvent, CaptureType, EventLogger, SessionRoleStore};
    pub use crate::hooks::{
        HostEvent, PermissionReply, PermissionRequest, RawEvent, SystemTransformInput,
        SystemTransformOutput, ToolCallInput, ToolOutput,
    };
    pub use crate::paths::HistoryLayout;
    pub use crate::permissions::{PermissionHandler, PolicyPermissionHandler};
    pub use crate::plugin::PaiPlugin;
    pub use crate::redaction::{redact_json, redact_string};
    pub use crate::security::{AccessMode, DecisionStatus, PolicyEngine, SecurityDecision};
}
