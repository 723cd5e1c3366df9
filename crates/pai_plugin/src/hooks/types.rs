//! Host boundary types.
//!
//! The host hands the plugin loosely-shaped JSON. Everything is decoded here.
//! Missing fields become `None` and unknown event kinds become
//! [`HostEvent::Other`]. The raw property bag is kept for pass-through logging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event exactly as the host delivered it
///
/// # Examples
///
/// ```
/// use pai_plugin::hooks::{HostEvent, RawEvent};
/// use serde_json::json;
///
/// let raw = RawEvent::new("session.created", json!({ "info": { "id": "ses_1" } }));
/// assert_eq!(raw.decode(), HostEvent::SessionCreated { session_id: "ses_1".to_string() });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event name (e.g., `session.created`, `tool.call`)
    #[serde(rename = "type")]
    pub kind: String,

    /// Event-specific property bag
    #[serde(default)]
    pub properties: Value,

    /// Host-assigned timestamp in epoch millis, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl RawEvent {
    /// Create an event with the given kind and properties
    pub fn new(kind: impl Into<String>, properties: Value) -> Self {
        Self {
            kind: kind.into(),
            properties,
            timestamp: None,
        }
    }

    /// Decode into the known event kinds
    pub fn decode(&self) -> HostEvent {
        let props = &self.properties;
        match self.kind.as_str() {
            "session.created" | "session.deleted" => {
                match str_at(props, &["info", "id"]).or_else(|| str_at(props, &["sessionID"])) {
                    Some(session_id) if self.kind == "session.created" => {
                        HostEvent::SessionCreated { session_id }
                    }
                    Some(session_id) => HostEvent::SessionDeleted { session_id },
                    None => self.other(),
                }
            }
            "session.idle" => match str_at(props, &["sessionID"]) {
                Some(session_id) => HostEvent::SessionIdle { session_id },
                None => self.other(),
            },
            "message.updated" => match props.get("info") {
                Some(info) => HostEvent::MessageUpdated {
                    info: MessageInfo::from_value(info),
                },
                None => self.other(),
            },
            "message.part.updated" => {
                let is_text = str_at(props, &["part", "type"]).as_deref() == Some("text");
                HostEvent::MessagePartUpdated {
                    session_id: str_at(props, &["part", "sessionID"]),
                    message_id: str_at(props, &["part", "messageID"]),
                    text: str_at(props, &["part", "text"])
                        .filter(|t| is_text && !t.is_empty()),
                }
            }
            "file.watcher.updated" => match str_at(props, &["file"]) {
                Some(file) => HostEvent::FileWatcherUpdated { file },
                None => self.other(),
            },
            "tool.call" | "tool.execute.before" => {
                let tool = str_at(props, &["tool"]).or_else(|| str_at(props, &["tool_name"]));
                match tool {
                    Some(tool) => HostEvent::ToolCall {
                        session_id: str_at(props, &["sessionID"]),
                        tool,
                        input: props
                            .get("input")
                            .or_else(|| props.get("tool_input"))
                            .cloned()
                            .unwrap_or(Value::Null),
                    },
                    None => self.other(),
                }
            }
            _ => self.other(),
        }
    }

    /// Best-effort session id for routing, from any of the host's known locations
    pub fn session_id(&self) -> Option<String> {
        let props = &self.properties;
        match self.kind.as_str() {
            "session.created" | "session.deleted" | "session.updated" => {
                str_at(props, &["info", "id"]).or_else(|| str_at(props, &["sessionID"]))
            }
            _ => str_at(props, &["sessionID"])
                .or_else(|| str_at(props, &["info", "sessionID"]))
                .or_else(|| str_at(props, &["part", "sessionID"])),
        }
    }

    fn other(&self) -> HostEvent {
        HostEvent::Other {
            kind: self.kind.clone(),
        }
    }
}

/// Known host events
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A new session started
    SessionCreated {
        /// New session id
        session_id: String,
    },
    /// A session was deleted
    SessionDeleted {
        /// Deleted session id
        session_id: String,
    },
    /// A session went idle
    SessionIdle {
        /// Idle session id
        session_id: String,
    },
    /// A chat message changed
    MessageUpdated {
        /// Decoded message metadata
        info: MessageInfo,
    },
    /// A streaming update for part of a message
    MessagePartUpdated {
        /// Owning session, when the host supplies it
        session_id: Option<String>,
        /// Owning message
        message_id: Option<String>,
        /// Accumulated text of a text part (not a delta)
        text: Option<String>,
    },
    /// A file changed on disk
    FileWatcherUpdated {
        /// Path reported by the watcher
        file: String,
    },
    /// A tool is about to run
    ToolCall {
        /// Owning session, when the host supplies it
        session_id: Option<String>,
        /// Tool name
        tool: String,
        /// Tool arguments
        input: Value,
    },
    /// Any other event kind
    Other {
        /// Raw event name
        kind: String,
    },
}

/// Metadata carried by a `message.updated` event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageInfo {
    /// Message id
    pub id: Option<String>,
    /// Owning session
    pub session_id: Option<String>,
    /// `assistant`, `user`, ...
    pub role: Option<String>,
    /// Full text, when the host inlines it
    pub content: Option<String>,
    /// Files named in the message's change summary
    pub diff_files: Vec<String>,
}

impl MessageInfo {
    /// Decode from the `info` object of a `message.updated` event
    pub fn from_value(info: &Value) -> Self {
        let diff_files = info
            .pointer("/summary/diffs")
            .and_then(Value::as_array)
            .map(|diffs| {
                diffs
                    .iter()
                    .filter_map(|d| d.get("file").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: str_at(info, &["id"]),
            session_id: str_at(info, &["sessionID"]),
            role: str_at(info, &["role"]).or_else(|| str_at(info, &["author"])),
            content: message_text(info),
            diff_files,
        }
    }

    /// True for assistant-authored messages
    pub fn is_assistant(&self) -> bool {
        self.role.as_deref() == Some("assistant")
    }
}

/// Input of `tool.execute.before` / `tool.execute.after`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallInput {
    /// Tool name
    pub tool: String,

    /// Owning session
    #[serde(rename = "sessionID", default)]
    pub session_id: String,

    /// Host call id
    #[serde(rename = "callID", default)]
    pub call_id: String,

    /// Tool arguments (the host sends `args` or `input`)
    #[serde(default, alias = "input", skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl ToolCallInput {
    /// Create a call input
    pub fn new(tool: impl Into<String>, session_id: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            session_id: session_id.into(),
            call_id: String::new(),
            args,
        }
    }

    /// Set the call id
    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = call_id.into();
        self
    }

    /// `args.command` for shell tools
    pub fn command(&self) -> Option<&str> {
        self.args.get("command").and_then(Value::as_str)
    }

    /// File path from `filePath`, `file_path` or `path`
    pub fn file_path(&self) -> Option<&str> {
        file_path_arg(&self.args)
    }
}

/// Output of `tool.execute.after`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Tool output text
    #[serde(default)]
    pub output: String,
    /// Tool-declared metadata
    #[serde(default)]
    pub metadata: Value,
}

impl ToolOutput {
    /// Create an output record
    pub fn new(title: impl Into<String>, output: impl Into<String>, metadata: Value) -> Self {
        Self {
            title: title.into(),
            output: output.into(),
            metadata,
        }
    }
}

/// Input of `permission.ask`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Tool requesting permission
    #[serde(default)]
    pub tool: String,
    /// Tool arguments
    #[serde(default)]
    pub arguments: Value,
}

impl PermissionRequest {
    /// Create a request
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }

    /// `arguments.command`, or empty
    pub fn command(&self) -> &str {
        self.arguments
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// File path from `filePath`, `file_path` or `path`
    pub fn file_path(&self) -> Option<&str> {
        file_path_arg(&self.arguments)
    }
}

/// The agent a system prompt is being built for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Agent name (e.g., `build`, `title`)
    #[serde(default)]
    pub name: String,
}

/// Input of `experimental.chat.system.transform`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemTransformInput {
    /// Target agent, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentInfo>,
}

impl SystemTransformInput {
    /// Input for a named agent
    pub fn for_agent(name: impl Into<String>) -> Self {
        Self {
            agent: Some(AgentInfo { name: name.into() }),
        }
    }
}

/// Mutable output of `experimental.chat.system.transform`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemTransformOutput {
    /// System prompt segments
    #[serde(default)]
    pub system: Vec<String>,
}

/// Inline message text: a string, or an array of strings / `{text}` / `{content}` parts
fn message_text(info: &Value) -> Option<String> {
    let content = info.get("content").or_else(|| info.get("text"))?;
    let text = match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| match p {
                Value::String(s) => Some(s.as_str()),
                other => other
                    .get("text")
                    .or_else(|| other.get("content"))
                    .and_then(Value::as_str),
            })
            .collect(),
        _ => return None,
    };
    Some(text).filter(|t| !t.is_empty())
}

fn file_path_arg(args: &Value) -> Option<&str> {
    ["filePath", "file_path", "path"]
        .iter()
        .find_map(|key| args.get(*key).and_then(Value::as_str))
}

fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_session_lifecycle() {
        let created = RawEvent::new("session.created", json!({ "info": { "id": "s1" } }));
        assert_eq!(
            created.decode(),
            HostEvent::SessionCreated {
                session_id: "s1".to_string()
            }
        );

        let deleted = RawEvent::new("session.deleted", json!({ "info": { "id": "s1" } }));
        assert_eq!(
            deleted.decode(),
            HostEvent::SessionDeleted {
                session_id: "s1".to_string()
            }
        );

        let idle = RawEvent::new("session.idle", json!({ "sessionID": "s1" }));
        assert_eq!(
            idle.decode(),
            HostEvent::SessionIdle {
                session_id: "s1".to_string()
            }
        );
    }

    #[test]
    fn test_decode_missing_fields_is_other() {
        let event = RawEvent::new("session.created", json!({}));
        assert_eq!(
            event.decode(),
            HostEvent::Other {
                kind: "session.created".to_string()
            }
        );

        let event = RawEvent::new("something.new", json!({ "x": 1 }));
        assert!(matches!(event.decode(), HostEvent::Other { .. }));
    }

    #[test]
    fn test_decode_message_updated() {
        let event = RawEvent::new(
            "message.updated",
            json!({
                "info": {
                    "id": "msg_1",
                    "sessionID": "s1",
                    "role": "assistant",
                    "content": "SUMMARY: done",
                    "summary": { "diffs": [{ "file": "history/s1.md" }, { "other": 1 }] }
                }
            }),
        );
        let HostEvent::MessageUpdated { info } = event.decode() else {
            panic!("expected MessageUpdated");
        };
        assert_eq!(info.id.as_deref(), Some("msg_1"));
        assert!(info.is_assistant());
        assert_eq!(info.content.as_deref(), Some("SUMMARY: done"));
        assert_eq!(info.diff_files, vec!["history/s1.md".to_string()]);
    }

    #[test]
    fn test_message_content_parts() {
        let info = MessageInfo::from_value(&json!({
            "content": ["SUMMARY: a\n", { "text": "ANALYSIS: b" }, { "type": "tool" }]
        }));
        assert_eq!(info.content.as_deref(), Some("SUMMARY: a\nANALYSIS: b"));

        let info = MessageInfo::from_value(&json!({ "content": "" }));
        assert!(info.content.is_none());
    }

    #[test]
    fn test_decode_text_part() {
        let event = RawEvent::new(
            "message.part.updated",
            json!({ "part": { "sessionID": "s1", "messageID": "m1", "type": "text", "text": "SUMMARY: x" } }),
        );
        assert_eq!(
            event.decode(),
            HostEvent::MessagePartUpdated {
                session_id: Some("s1".to_string()),
                message_id: Some("m1".to_string()),
                text: Some("SUMMARY: x".to_string()),
            }
        );

        let event = RawEvent::new(
            "message.part.updated",
            json!({ "part": { "messageID": "m1", "type": "tool", "text": "ignored" } }),
        );
        let HostEvent::MessagePartUpdated { text, .. } = event.decode() else {
            panic!("expected MessagePartUpdated");
        };
        assert!(text.is_none());
    }

    #[test]
    fn test_message_author_fallback() {
        let info = MessageInfo::from_value(&json!({ "author": "assistant" }));
        assert!(info.is_assistant());
    }

    #[test]
    fn test_decode_tool_call() {
        let event = RawEvent::new(
            "tool.call",
            json!({ "tool": "bash", "sessionID": "s1", "input": { "command": "ls" } }),
        );
        let HostEvent::ToolCall { tool, input, session_id } = event.decode() else {
            panic!("expected ToolCall");
        };
        assert_eq!(tool, "bash");
        assert_eq!(session_id.as_deref(), Some("s1"));
        assert_eq!(input["command"], "ls");
    }

    #[test]
    fn test_raw_event_serde() {
        let raw: RawEvent =
            serde_json::from_value(json!({ "type": "file.watcher.updated", "properties": { "file": "a.rs" } }))
                .unwrap();
        assert_eq!(raw.kind, "file.watcher.updated");
        assert_eq!(
            raw.decode(),
            HostEvent::FileWatcherUpdated {
                file: "a.rs".to_string()
            }
        );

        let raw: RawEvent = serde_json::from_value(json!({ "type": "server.connected" })).unwrap();
        assert!(raw.properties.is_null());
    }

    #[test]
    fn test_session_id_lookup() {
        let raw = RawEvent::new("message.updated", json!({ "info": { "sessionID": "s9" } }));
        assert_eq!(raw.session_id().as_deref(), Some("s9"));

        let raw = RawEvent::new("message.part.updated", json!({ "part": { "sessionID": "s8" } }));
        assert_eq!(raw.session_id().as_deref(), Some("s8"));

        let raw = RawEvent::new("session.created", json!({ "info": { "id": "s7" } }));
        assert_eq!(raw.session_id().as_deref(), Some("s7"));
    }

    #[test]
    fn test_tool_call_input_aliases() {
        let input: ToolCallInput = serde_json::from_value(json!({
            "tool": "edit",
            "sessionID": "s1",
            "callID": "c1",
            "input": { "filePath": "/tmp/a.rs" }
        }))
        .unwrap();
        assert_eq!(input.call_id, "c1");
        assert_eq!(input.file_path(), Some("/tmp/a.rs"));
        assert_eq!(input.command(), None);
    }

    #[test]
    fn test_permission_request_accessors() {
        let req = PermissionRequest::new("bash", json!({ "command": "ls" }));
        assert_eq!(req.command(), "ls");
        let req = PermissionRequest::new("write", json!({ "file_path": "x" }));
        assert_eq!(req.command(), "");
        assert_eq!(req.file_path(), Some("x"));
    }
}
