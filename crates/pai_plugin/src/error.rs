//! Error types for the PAI plugin
//!
//! This module defines the error hierarchy for the pai_plugin crate using `thiserror`.
//! Internal operations that can fail return `Result<T, PaiError>`.
//!
//! Most of these errors never reach the host: persistence failures are caught at the
//! write site and redirected to the best-effort error log. The one error that is
//! meant to travel back to the host is [`PaiError::Blocked`], which aborts a tool
//! execution the policy engine denied.
//!
//! # Error Variants
//!
//! - [`PaiError::Io`]: Filesystem operations (auto-converts from `std::io::Error`)
//! - [`PaiError::JsonDecode`]: JSON encoding/decoding (auto-converts from `serde_json::Error`)
//! - [`PaiError::Config`]: Invalid plugin configuration
//! - [`PaiError::InvalidTimeZone`]: `TIME_ZONE` is not a known IANA zone name
//! - [`PaiError::Blocked`]: A tool call was denied by the security policy
//! - [`PaiError::HookPayload`]: A host payload could not be decoded
//!
//! # Example
//!
//! ```rust
//! use pai_plugin::error::PaiError;
//!
//! fn example() -> Result<(), PaiError> {
//!     // Auto-conversion from std::io::Error
//!     let _file = std::fs::read_to_string("/nonexistent")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for all pai_plugin operations
#[derive(Error, Debug)]
pub enum PaiError {
    /// I/O operation failed
    ///
    /// Automatically converted from `std::io::Error` for audit-log appends,
    /// artifact writes, and role-map reads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to encode or decode JSON
    #[error("JSON error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Plugin configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configured time zone is not a known IANA zone name
    #[error("Unknown time zone: {value}")]
    InvalidTimeZone {
        /// The rejected zone name (e.g., "Mars/Olympus")
        value: String,
    },

    /// A tool call was denied by the security policy
    ///
    /// Returned from the `tool.execute.before` hook so the host aborts the call.
    /// The feedback text is already redacted.
    #[error("{feedback}")]
    Blocked {
        /// Name of the policy category that matched (e.g., "reverse_shell")
        category: String,
        /// Human-readable, redacted explanation
        feedback: String,
    },

    /// A host payload was missing a field the hook needs
    #[error("Malformed hook payload: {reason}")]
    HookPayload {
        /// Description of what was missing or malformed
        reason: String,
    },
}

impl PaiError {
    /// True when this error is a policy denial rather than a failure
    pub fn is_blocked(&self) -> bool {
        matches!(self, PaiError::Blocked { .. })
    }
}
