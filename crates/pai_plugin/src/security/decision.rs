//! Policy decision types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a policy check
///
/// # Examples
///
/// ```
/// use pai_plugin::security::DecisionStatus;
///
/// let status = DecisionStatus::Ask;
/// assert_eq!(serde_json::to_string(&status).unwrap(), r#""ask""#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    /// Let the action proceed
    Allow,
    /// Block the action
    Deny,
    /// Require human confirmation
    Ask,
}

impl DecisionStatus {
    /// Evaluation tier: deny categories run before ask categories
    pub(crate) fn priority(self) -> u8 {
        match self {
            DecisionStatus::Deny => 0,
            DecisionStatus::Ask => 1,
            DecisionStatus::Allow => 2,
        }
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionStatus::Allow => "allow",
            DecisionStatus::Deny => "deny",
            DecisionStatus::Ask => "ask",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access mode requested for a filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Discovery access; low risk
    Read,
    /// Mutating access; checked against protected infrastructure
    Write,
}

/// Result of a command or path check
///
/// Constructed fresh per check and never persisted. `category` is `None` exactly
/// when the status is `Allow`. Feedback text is already redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityDecision {
    /// Allow, deny, or ask
    pub status: DecisionStatus,
    /// Name of the matched rule group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl SecurityDecision {
    /// Nothing matched
    pub fn allow() -> Self {
        Self {
            status: DecisionStatus::Allow,
            category: None,
            feedback: None,
        }
    }

    /// A deny-tier category matched
    pub fn deny(category: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            status: DecisionStatus::Deny,
            category: Some(category.into()),
            feedback: Some(feedback.into()),
        }
    }

    /// An ask-tier category matched
    pub fn ask(category: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            status: DecisionStatus::Ask,
            category: Some(category.into()),
            feedback: Some(feedback.into()),
        }
    }

    /// Shorthand for `status == Allow`
    pub fn is_allowed(&self) -> bool {
        self.status == DecisionStatus::Allow
    }

    /// Shorthand for `status == Deny`
    pub fn is_denied(&self) -> bool {
        self.status == DecisionStatus::Deny
    }
}
