//! Identity context injected into the host's system prompt.
//!
//! The core skill file (`<pai_dir>/skills/core/SKILL.md`) is personalized with
//! the configured assistant name, color and engineer name, and optionally
//! followed by a project's `.opencode/dynamic-requirements.md`.

use std::path::Path;
use tracing::{debug, warn};

use crate::config::PluginConfig;
use crate::hooks::{SystemTransformInput, SystemTransformOutput};
use crate::paths::HistoryLayout;

/// Internal host agents whose prompts are left alone
pub const SKIPPED_AGENTS: &[&str] = &["title", "summary", "compaction"];

/// Personalized skill text plus optional project requirements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillContext {
    skill: String,
    requirements: Option<String>,
}

impl SkillContext {
    /// Build a context from already-loaded text
    pub fn new(skill: impl Into<String>, requirements: Option<String>) -> Self {
        Self {
            skill: skill.into(),
            requirements: requirements.filter(|r| !r.trim().is_empty()),
        }
    }

    /// Load and personalize the skill file, and the worktree's requirements if any.
    ///
    /// Missing or unreadable files yield empty content.
    pub async fn load(config: &PluginConfig) -> Self {
        let layout = HistoryLayout::new(config.pai_dir.clone());
        let raw = read_optional(&layout.core_skill_file()).await.unwrap_or_default();
        let skill = personalize(&raw, config);

        let requirements = match &config.worktree {
            Some(worktree) => {
                let path = worktree.join(".opencode").join("dynamic-requirements.md");
                let loaded = read_optional(&path).await;
                if loaded.is_some() {
                    debug!(path = %path.display(), "Loaded project requirements");
                }
                loaded
            }
            None => None,
        };

        Self::new(skill, requirements)
    }

    /// Personalized skill text
    pub fn skill(&self) -> &str {
        &self.skill
    }

    /// Project requirements, when the worktree has them
    pub fn requirements(&self) -> Option<&str> {
        self.requirements.as_deref()
    }

    /// Text prepended to the system prompt
    pub fn injection(&self) -> String {
        let mut block = format!(
            "\n\n--- PAI CORE IDENTITY ---\n{}\n--- END PAI CORE IDENTITY ---\n\n",
            self.skill
        );
        if let Some(requirements) = &self.requirements {
            block.push_str(&format!(
                "\n\n--- PROJECT DYNAMIC REQUIREMENTS ---\n{requirements}\n--- END PROJECT DYNAMIC REQUIREMENTS ---\n\n"
            ));
        }
        block
    }

    /// Inject the identity block into `output.system`.
    ///
    /// `system[0]` is left untouched for prompt caching: the block is prepended to
    /// `system[1]` when it exists and pushed otherwise.
    pub fn inject(&self, input: &SystemTransformInput, output: &mut SystemTransformOutput) {
        if let Some(agent) = &input.agent {
            if SKIPPED_AGENTS.contains(&agent.name.as_str()) {
                return;
            }
        }
        if self.skill.is_empty() || output.system.is_empty() {
            return;
        }

        let block = self.injection();
        match output.system.get_mut(1) {
            Some(second) => second.insert_str(0, &block),
            None => output.system.push(block),
        }
    }
}

fn personalize(raw: &str, config: &PluginConfig) -> String {
    raw.replace("{{DA}}", &config.da_name)
        .replace("{{DA_COLOR}}", &config.da_color)
        .replace("{{ENGINEER_NAME}}", &config.engineer_name)
}

async fn read_optional(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), "Failed to read context file: {}", e);
            None
        }
    }
}
