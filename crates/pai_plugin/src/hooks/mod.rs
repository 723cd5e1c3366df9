//! Host hook payloads and replies.
//!
//! The host invokes five hooks: `event`, `tool.execute.before`,
//! `tool.execute.after`, `permission.ask`, and
//! `experimental.chat.system.transform`. This module holds the typed shapes of
//! their inputs and outputs; dispatch lives in [`crate::plugin::PaiPlugin`].
//!
//! Decoding never fails. A [`RawEvent`] keeps the host's
//! property bag verbatim for audit logging, and [`RawEvent::decode`] maps it onto
//! the closed [`HostEvent`] union, falling back to [`HostEvent::Other`].
//!
//! # Example
//!
//! ```
//! use pai_plugin::hooks::{HostEvent, RawEvent};
//! use serde_json::json;
//!
//! let raw: RawEvent = serde_json::from_value(json!({
//!     "type": "session.idle",
//!     "properties": { "sessionID": "ses_42" }
//! })).unwrap();
//!
//! match raw.decode() {
//!     HostEvent::SessionIdle { session_id } => assert_eq!(session_id, "ses_42"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod response;
pub mod types;

pub use response::PermissionReply;
pub use types::{
    AgentInfo, HostEvent, MessageInfo, PermissionRequest, RawEvent, SystemTransformInput,
    SystemTransformOutput, ToolCallInput, ToolOutput,
};
