//! Session → agent role mapping.
//!
//! The map lives in a single JSON object file shared by every session logger in
//! the process and across restarts. Writes go through a temp file and a rename so
//! a reader never sees a half-written map. There is no lock: two writers racing
//! on the same session id can lose an update, and the last rename wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::DEFAULT_ROLE;
use crate::error::PaiError;

static DEV_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdev\b").expect("dev pattern is valid"));

/// Collapse a declared subagent type onto a canonical role.
///
/// Strips a `subagents/` prefix, lowercases, then maps by keyword (first hit
/// wins). Unrecognized names pass through lowercased; an empty name yields the
/// default role.
///
/// # Examples
///
/// ```
/// use pai_plugin::history::normalize_agent_role;
///
/// assert_eq!(normalize_agent_role("subagents/researcher-claude"), "researcher");
/// assert_eq!(normalize_agent_role("sparc-dev"), "engineer");
/// assert_eq!(normalize_agent_role("Explore"), "researcher");
/// assert_eq!(normalize_agent_role("Writer"), "writer");
/// assert_eq!(normalize_agent_role(""), "pai");
/// ```
pub fn normalize_agent_role(agent_type: &str) -> String {
    let trimmed = agent_type.trim();
    if trimmed.is_empty() {
        return DEFAULT_ROLE.to_string();
    }

    let lowered = trimmed.to_lowercase();
    let role = lowered.strip_prefix("subagents/").unwrap_or(&lowered);

    let mapped = if role.contains("research") {
        "researcher"
    } else if role.contains("architect") {
        "architect"
    } else if role.contains("engineer") || DEV_WORD.is_match(role) {
        "engineer"
    } else if role.contains("designer") {
        "designer"
    } else if role.contains("pentester") {
        "pentester"
    } else if role.contains("analyst")
        || role.contains("explorer")
        || role == "explore"
        || role == "intern"
    {
        "researcher"
    } else {
        return role.to_string();
    };
    mapped.to_string()
}

/// File-backed session id → role map
#[derive(Debug, Clone)]
pub struct SessionRoleStore {
    path: PathBuf,
    default_role: String,
}

impl SessionRoleStore {
    /// Store at `path` with the given fallback role
    pub fn new(path: impl Into<PathBuf>, default_role: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            default_role: default_role.into(),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Role returned when a session has none recorded
    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    /// Current role for a session.
    ///
    /// A missing file, unreadable file, malformed JSON, or absent entry all yield
    /// the default role.
    pub async fn get(&self, session_id: &str) -> String {
        match self.load().await {
            Ok(map) => map
                .get(session_id)
                .and_then(Value::as_str)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.default_role.clone()),
            Err(e) => {
                debug!("Role map unreadable, using default role: {}", e);
                self.default_role.clone()
            }
        }
    }

    /// Record `role` for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing map cannot be parsed or the new map cannot
    /// be written. A malformed map is left untouched.
    pub async fn set(&self, session_id: &str, role: &str) -> Result<(), PaiError> {
        let mut map = self.load().await?;
        map.insert(session_id.to_string(), Value::String(role.to_string()));
        self.store(&map).await?;
        debug!(session_id, role, "Updated session role");
        Ok(())
    }

    /// Put a session back on the default role
    pub async fn reset(&self, session_id: &str) -> Result<(), PaiError> {
        let role = self.default_role.clone();
        self.set(session_id, &role).await
    }

    async fn load(&self) -> Result<Map<String, Value>, PaiError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(PaiError::Config(format!(
                "role map {} is not a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, map: &Map<String, Value>) -> Result<(), PaiError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "agent-sessions.json".to_string());
        let tmp = self.path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        let json = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            warn!("Failed to move role map into place: {}", e);
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
