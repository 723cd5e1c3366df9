//! Rule evaluation for shell commands and file paths.

use std::path::Path;
use tracing::{debug, warn};

use super::decision::{AccessMode, DecisionStatus, SecurityDecision};
use super::rules::{self, Matcher, PATH_PROTECTION, PatternCategory};
use crate::redaction::redact_string;

/// Longest command excerpt echoed back in feedback
const FEEDBACK_EXCERPT_CHARS: usize = 50;

/// Stateless policy engine
///
/// Holds immutable rule tables; checks are pure functions of their input and can be
/// made concurrently from any number of tasks.
///
/// # Example
///
/// ```
/// use pai_plugin::security::{DecisionStatus, PolicyEngine};
///
/// let engine = PolicyEngine::default();
/// assert_eq!(engine.validate_command("ls -la").status, DecisionStatus::Allow);
/// assert_eq!(engine.validate_command("rm -rf /").status, DecisionStatus::Deny);
/// ```
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    categories: Vec<PatternCategory>,
    sensitive_paths: Vec<Matcher>,
    protected_paths: Vec<Matcher>,
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(
            rules::command_categories(),
            rules::sensitive_path_matchers(),
            rules::protected_path_matchers(),
        )
    }
}

impl PolicyEngine {
    /// Build an engine from explicit rule tables.
    ///
    /// Categories are stably sorted into tiers (all deny categories, then all ask
    /// categories) so a deny always wins over an ask regardless of table order.
    pub fn new(
        mut categories: Vec<PatternCategory>,
        sensitive_paths: Vec<Matcher>,
        protected_paths: Vec<Matcher>,
    ) -> Self {
        categories.sort_by_key(|c| c.status.priority());
        if categories.iter().any(|c| c.status == DecisionStatus::Allow) {
            warn!("Allow-status categories never change a decision and are ignored");
            categories.retain(|c| c.status != DecisionStatus::Allow);
        }
        Self {
            categories,
            sensitive_paths,
            protected_paths,
        }
    }

    /// Default rules plus protection for a plugin root outside `~/.config/opencode`
    pub fn for_config_root(root: &Path) -> Self {
        let mut engine = Self::default();
        let (sensitive, protected) = rules::root_matchers(root);
        if let Some(category) = engine.categories.iter_mut().find(|c| c.name == PATH_PROTECTION) {
            category.matchers.extend(sensitive.iter().cloned());
        }
        engine.sensitive_paths.extend(sensitive);
        engine.protected_paths.extend(protected);
        engine
    }

    /// Command categories in evaluation order
    pub fn categories(&self) -> &[PatternCategory] {
        &self.categories
    }

    /// Classify a shell command.
    ///
    /// The first matching category decides. Deny-tier categories are always tried
    /// before ask-tier ones. No match means allow.
    pub fn validate_command(&self, command: &str) -> SecurityDecision {
        for category in &self.categories {
            if !category.matches(command) {
                continue;
            }
            let excerpt = excerpt(command);
            debug!(category = %category.name, status = %category.status, "Command matched policy");
            return match category.status {
                DecisionStatus::Deny => SecurityDecision::deny(
                    &category.name,
                    format!(
                        "SECURITY: Blocked {} pattern. Command: {}...",
                        category.name, excerpt
                    ),
                ),
                _ => SecurityDecision::ask(
                    &category.name,
                    format!(
                        "DANGEROUS: {} operation requires confirmation. Command: {}...",
                        category.name, excerpt
                    ),
                ),
            };
        }
        SecurityDecision::allow()
    }

    /// Classify a file access.
    ///
    /// Sensitive files ask in any mode; protected infrastructure asks for writes.
    /// Reads of anything else are allowed.
    pub fn validate_path(&self, path: &str, mode: AccessMode) -> SecurityDecision {
        if self.sensitive_paths.iter().any(|m| m.is_match(path)) {
            debug!(path = %path, "Sensitive path access");
            return SecurityDecision::ask(
                PATH_PROTECTION,
                format!("DANGEROUS: Accessing sensitive path {}...", redact_string(path)),
            );
        }

        if mode == AccessMode::Write && self.protected_paths.iter().any(|m| m.is_match(path)) {
            debug!(path = %path, "Protected path write");
            return SecurityDecision::ask(
                PATH_PROTECTION,
                format!("DANGEROUS: Writing to protected path {}...", redact_string(path)),
            );
        }

        SecurityDecision::allow()
    }
}

/// Redact, then keep at most [`FEEDBACK_EXCERPT_CHARS`] characters
fn excerpt(command: &str) -> String {
    redact_string(command)
        .chars()
        .take(FEEDBACK_EXCERPT_CHARS)
        .collect()
}
