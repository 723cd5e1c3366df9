//! Policy-backed permission handler.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PaiError;
use crate::hooks::{PermissionReply, PermissionRequest};
use crate::security::{AccessMode, DecisionStatus, PolicyEngine, SecurityDecision};

/// Decides `permission.ask` requests
///
/// Implement this to replace the built-in policy, for example to consult an
/// external approval service.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use pai_plugin::prelude::*;
///
/// struct ReadOnly;
///
/// #[async_trait]
/// impl PermissionHandler for ReadOnly {
///     async fn check(&self, request: &PermissionRequest) -> Result<PermissionReply, PaiError> {
///         if request.tool == "read" {
///             Ok(PermissionReply::allow())
///         } else {
///             Ok(PermissionReply::deny("read-only session"))
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait PermissionHandler: Send + Sync {
    /// Decide a single request
    async fn check(&self, request: &PermissionRequest) -> Result<PermissionReply, PaiError>;
}

/// Built-in permission handler backed by the [`PolicyEngine`].
///
/// Requests are evaluated in layers:
///
/// 1. **Shell tools** - the command runs through `validate_command`; deny and
///    ask results are returned with their feedback
/// 2. **File tools** - `read` is checked in read mode; `edit`, `write` and
///    `patch` in write mode; ask results are returned with their feedback
/// 3. **Default** - anything not stopped above is allowed only in dangerous
///    mode, otherwise the user is asked
///
/// # Examples
///
/// ```rust
/// use pai_plugin::permissions::PolicyPermissionHandler;
///
/// let handler = PolicyPermissionHandler::builder()
///     .dangerous_mode(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct PolicyPermissionHandler {
    engine: Arc<PolicyEngine>,
    dangerous_mode: bool,
}

impl Default for PolicyPermissionHandler {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PolicyPermissionHandler {
    /// Create a new builder for configuring the handler.
    pub fn builder() -> PolicyPermissionHandlerBuilder {
        PolicyPermissionHandlerBuilder::default()
    }

    /// Whether non-blocked requests are allowed without asking
    pub fn dangerous_mode(&self) -> bool {
        self.dangerous_mode
    }

    /// Shared policy engine
    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    fn policy_check(&self, request: &PermissionRequest) -> Option<SecurityDecision> {
        let tool = request.tool.to_lowercase();
        match tool.as_str() {
            "bash" => Some(self.engine.validate_command(request.command())),
            "read" => request
                .file_path()
                .map(|path| self.engine.validate_path(path, AccessMode::Read)),
            "edit" | "write" | "patch" => request
                .file_path()
                .map(|path| self.engine.validate_path(path, AccessMode::Write)),
            _ => None,
        }
    }

    fn default_reply(&self) -> PermissionReply {
        if self.dangerous_mode {
            PermissionReply::allow()
        } else {
            PermissionReply::ask()
        }
    }
}

#[async_trait]
impl PermissionHandler for PolicyPermissionHandler {
    async fn check(&self, request: &PermissionRequest) -> Result<PermissionReply, PaiError> {
        // 1-2. Policy engine for shell and file tools
        if let Some(decision) = self.policy_check(request) {
            match decision.status {
                DecisionStatus::Deny | DecisionStatus::Ask => {
                    warn!(
                        tool = %request.tool,
                        category = decision.category.as_deref().unwrap_or_default(),
                        status = %decision.status,
                        "Permission request blocked by policy"
                    );
                    return Ok(decision.into());
                }
                DecisionStatus::Allow => {}
            }
        }

        // 3. Human in the loop unless dangerous mode is on
        debug!(tool = %request.tool, dangerous_mode = self.dangerous_mode, "Default permission policy");
        Ok(self.default_reply())
    }
}

/// Builder for [`PolicyPermissionHandler`].
///
/// # Examples
///
/// ```rust
/// use pai_plugin::permissions::PolicyPermissionHandler;
/// use pai_plugin::security::PolicyEngine;
/// use std::path::Path;
///
/// let handler = PolicyPermissionHandler::builder()
///     .engine(PolicyEngine::for_config_root(Path::new("/srv/pai")))
///     .dangerous_mode(false)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct PolicyPermissionHandlerBuilder {
    engine: Option<Arc<PolicyEngine>>,
    dangerous_mode: bool,
}

impl PolicyPermissionHandlerBuilder {
    /// Use a specific engine
    pub fn engine(mut self, engine: PolicyEngine) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Share an engine with other components
    pub fn shared_engine(mut self, engine: Arc<PolicyEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Allow non-blocked requests without asking
    pub fn dangerous_mode(mut self, enabled: bool) -> Self {
        self.dangerous_mode = enabled;
        self
    }

    /// Build the permission handler.
    pub fn build(self) -> PolicyPermissionHandler {
        PolicyPermissionHandler {
            engine: self.engine.unwrap_or_default(),
            dangerous_mode: self.dangerous_mode,
        }
    }
}
