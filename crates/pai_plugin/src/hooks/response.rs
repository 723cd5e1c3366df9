//! Reply returned from the `permission.ask` hook.

use serde::{Deserialize, Serialize};

use crate::security::{DecisionStatus, SecurityDecision};

/// Reply to a permission request
///
/// # Examples
///
/// ```
/// use pai_plugin::hooks::PermissionReply;
///
/// let reply = PermissionReply::deny("SECURITY: Blocked reverse_shell pattern.");
/// assert_eq!(
///     serde_json::to_string(&reply).unwrap(),
///     r#"{"status":"deny","feedback":"SECURITY: Blocked reverse_shell pattern."}"#
/// );
///
/// let reply = PermissionReply::allow();
/// assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"status":"allow"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionReply {
    /// Allow, deny, or ask
    pub status: DecisionStatus,

    /// Explanation shown to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl PermissionReply {
    /// Let the tool run
    pub fn allow() -> Self {
        Self {
            status: DecisionStatus::Allow,
            feedback: None,
        }
    }

    /// Refuse the tool call
    pub fn deny(feedback: impl Into<String>) -> Self {
        Self {
            status: DecisionStatus::Deny,
            feedback: Some(feedback.into()),
        }
    }

    /// Ask the user, with no explanation
    pub fn ask() -> Self {
        Self {
            status: DecisionStatus::Ask,
            feedback: None,
        }
    }

    /// Attach or replace the feedback text
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

impl From<SecurityDecision> for PermissionReply {
    fn from(decision: SecurityDecision) -> Self {
        Self {
            status: decision.status,
            feedback: decision.feedback,
        }
    }
}
