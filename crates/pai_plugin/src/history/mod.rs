//! Audit trail and knowledge archive.
//!
//! Everything the plugin persists about a session goes through this module:
//!
//! - [`EventLogger`] appends redacted [`AuditEvent`] lines to
//!   `history/raw-outputs/<date>_all-events.jsonl`
//! - [`SessionRoleStore`] tracks which subagent role is acting in each session
//! - [`parse_sections`] and [`classify`] turn structured assistant replies into
//!   typed artifacts under `history/<type-dir>/<YYYY-MM>/`
//! - [`extract_lineage`] tags spawning calls with the spawned agent's identity

pub mod capture;
pub mod lineage;
pub mod logger;
pub mod roles;

pub use capture::{CaptureType, SectionKind, Sections, classify, parse_sections, slugify};
pub use lineage::{AgentLineage, extract_lineage, is_agent_spawning_call};
pub use logger::{AuditEvent, EventLogger, LoggerState};
pub use roles::{SessionRoleStore, normalize_agent_role};
