//! Directory layout under `PAI_DIR` and first-run bootstrap.
//!
//! ```text
//! $PAI_DIR/
//!   agent-sessions.json            session id -> agent role
//!   skills/core/SKILL.md           core identity prompt
//!   history/
//!     raw-outputs/                 <date>_all-events.jsonl audit trail
//!     system-logs/                 <date>_errors.log
//!     sessions/<YYYY-MM>/          session summaries and WORK artifacts
//!     decisions/ research/ learnings/
//!     execution/{features,bugs,refactors}/
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default core skill written on first run
pub const DEFAULT_SKILL: &str = "# PAI Core Identity\nYou are {{DA}}, a Personal AI Infrastructure.\nYour primary engineer is {{ENGINEER_NAME}}.\n";

/// Resolved paths for everything the plugin reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLayout {
    pai_dir: PathBuf,
}

impl HistoryLayout {
    /// Layout rooted at `pai_dir`
    pub fn new(pai_dir: impl Into<PathBuf>) -> Self {
        Self {
            pai_dir: pai_dir.into(),
        }
    }

    /// Plugin root
    pub fn pai_dir(&self) -> &Path {
        &self.pai_dir
    }

    /// `history/`
    pub fn history_dir(&self) -> PathBuf {
        self.pai_dir.join("history")
    }

    /// Audit trail directory
    pub fn raw_outputs_dir(&self) -> PathBuf {
        self.history_dir().join("raw-outputs")
    }

    /// Error log directory
    pub fn system_logs_dir(&self) -> PathBuf {
        self.history_dir().join("system-logs")
    }

    /// Session summaries
    pub fn sessions_dir(&self) -> PathBuf {
        self.history_dir().join("sessions")
    }

    /// Any history sub-tree, e.g. `execution/bugs`
    pub fn history_subdir(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .fold(self.history_dir(), |path, part| path.join(part))
    }

    /// `agent-sessions.json`
    pub fn role_map_file(&self) -> PathBuf {
        self.pai_dir.join("agent-sessions.json")
    }

    /// `skills/core/SKILL.md`
    pub fn core_skill_file(&self) -> PathBuf {
        self.pai_dir.join("skills").join("core").join("SKILL.md")
    }

    /// `raw-outputs/<date>_all-events.jsonl`
    pub fn events_file(&self, date: &str) -> PathBuf {
        self.raw_outputs_dir().join(format!("{date}_all-events.jsonl"))
    }

    /// `system-logs/<date>_errors.log`
    pub fn error_log_file(&self, date: &str) -> PathBuf {
        self.system_logs_dir().join(format!("{date}_errors.log"))
    }

    /// Directories created on startup
    pub fn bootstrap_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.pai_dir.join("skills").join("core"),
            self.raw_outputs_dir(),
            self.sessions_dir(),
            self.system_logs_dir(),
        ]
    }

    /// Create the bootstrap directories and a default core skill if missing.
    ///
    /// Returns the paths that were newly created. Failures are logged and skipped so
    /// a read-only home directory never prevents the plugin from loading.
    pub fn ensure_structure(&self) -> Vec<PathBuf> {
        let mut created = Vec::new();

        for dir in self.bootstrap_dirs() {
            if dir.exists() {
                continue;
            }
            match std::fs::create_dir_all(&dir) {
                Ok(()) => {
                    debug!("Created directory {}", dir.display());
                    created.push(dir);
                }
                Err(e) => warn!("Failed to create directory {}: {}", dir.display(), e),
            }
        }

        let skill = self.core_skill_file();
        if !skill.exists() {
            match std::fs::write(&skill, DEFAULT_SKILL) {
                Ok(()) => {
                    debug!("Created default SKILL.md at {}", skill.display());
                    created.push(skill);
                }
                Err(e) => warn!("Failed to create default SKILL.md: {}", e),
            }
        }

        created
    }

    /// True if `path` points inside the plugin's own history tree.
    ///
    /// Used to drop file-watcher events caused by the logger's own writes.
    pub fn is_own_output(&self, path: &str) -> bool {
        let history = self.history_dir();
        Path::new(path).starts_with(&history)
            || path.contains("raw-outputs/")
            || path.contains("history/")
    }
}
