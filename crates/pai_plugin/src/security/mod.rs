//! Security policy engine.
//!
//! Classifies shell commands and file paths as allow, deny, or ask using ordered
//! tables of named pattern categories. The engine never touches the filesystem or
//! the network; the same input always yields the same decision.
//!
//! # Evaluation
//!
//! Commands are checked against every deny category first (reverse shells,
//! instruction overrides, catastrophic deletion, dangerous file operations,
//! protected paths, exfiltration, remote code execution), then the ask categories
//! (destructive git). The first match wins. Paths are checked against credential
//! files (ask in any mode) and then plugin infrastructure (ask on write).
//!
//! Feedback strings echo at most 50 characters of the command, redacted first.

pub mod decision;
pub mod engine;
pub mod rules;

pub use decision::{AccessMode, DecisionStatus, SecurityDecision};
pub use engine::PolicyEngine;
pub use rules::{Matcher, PatternCategory};
