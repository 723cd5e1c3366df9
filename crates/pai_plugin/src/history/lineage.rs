//! Agent lineage metadata for spawning calls.
//!
//! When a session spawns a subagent through the `Task` tool, the audit record is
//! tagged with whatever identity the caller embedded in the call. Extraction
//! never fails; anything that doesn't look like a plain identifier is dropped.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static DESCRIPTION_INSTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([a-z][a-z-]*)-(\d+)\]").expect("description pattern is valid")
});
static INSTANCE_MARKER: LazyLock<Regex> = LazyLock::new(|| marker("AGENT_INSTANCE"));
static PARENT_SESSION_MARKER: LazyLock<Regex> = LazyLock::new(|| marker("PARENT_SESSION"));
static PARENT_TASK_MARKER: LazyLock<Regex> = LazyLock::new(|| marker("PARENT_TASK"));
static INSTANCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z-]+)-(\d+)$").expect("instance id pattern is valid"));
static VALID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id pattern is valid"));

fn marker(name: &str) -> Regex {
    Regex::new(&format!(r"\[{name}:\s*([^\]]+)\]")).expect("marker pattern is valid")
}

/// Identity of a spawned agent, flattened into the audit record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLineage {
    /// `<type>-<n>`, e.g. `perplexity-researcher-1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_instance_id: Option<String>,
    /// Agent type without the instance number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Instance number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_number: Option<u32>,
    /// Session that spawned this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<String>,
    /// Task that spawned this agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
}

impl AgentLineage {
    /// True when nothing was extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// True for a `Task` call that declares a subagent type
pub fn is_agent_spawning_call(tool: &str, input: &Value) -> bool {
    tool.eq_ignore_ascii_case("task")
        && input
            .get("subagent_type")
            .is_some_and(|v| !v.is_null())
}

/// True when `id` contains only ASCII letters, digits, `-` and `_`
pub fn is_valid_id(id: &str) -> bool {
    VALID_ID.is_match(id)
}

/// Extract lineage from a spawning call.
///
/// Instance identity comes from, in order: a `[type-N]` tag in `description`, an
/// `[AGENT_INSTANCE: id]` marker in the prompt, and finally the declared
/// `subagent_type` alone. Parent ids come from `[PARENT_SESSION: id]` and
/// `[PARENT_TASK: id]` prompt markers.
///
/// # Examples
///
/// ```
/// use pai_plugin::history::extract_lineage;
/// use serde_json::json;
///
/// let input = json!({
///     "subagent_type": "researcher",
///     "prompt": "[PARENT_SESSION: ses_parent] Find sources"
/// });
/// let lineage = extract_lineage(&input, Some("Research topic [perplexity-researcher-2]"));
/// assert_eq!(lineage.agent_instance_id.as_deref(), Some("perplexity-researcher-2"));
/// assert_eq!(lineage.instance_number, Some(2));
/// assert_eq!(lineage.parent_session_id.as_deref(), Some("ses_parent"));
/// ```
pub fn extract_lineage(input: &Value, description: Option<&str>) -> AgentLineage {
    let mut lineage = AgentLineage::default();
    let prompt = input.get("prompt").and_then(Value::as_str);

    if let Some((agent_type, number)) = description
        .and_then(|d| DESCRIPTION_INSTANCE.captures(d))
        .and_then(|caps| split_instance(&caps[1], &caps[2]))
    {
        lineage.agent_instance_id = Some(format!("{agent_type}-{number}"));
        lineage.agent_type = Some(agent_type);
        lineage.instance_number = Some(number);
    }

    if lineage.agent_instance_id.is_none() {
        if let Some(id) = prompt.and_then(|p| marked_id(&INSTANCE_MARKER, p)) {
            if let Some((agent_type, number)) = INSTANCE_ID
                .captures(&id)
                .and_then(|parts| split_instance(&parts[1], &parts[2]))
            {
                lineage.agent_type = Some(agent_type);
                lineage.instance_number = Some(number);
            }
            lineage.agent_instance_id = Some(id);
        }
    }

    if let Some(prompt) = prompt {
        lineage.parent_session_id = marked_id(&PARENT_SESSION_MARKER, prompt);
        lineage.parent_task_id = marked_id(&PARENT_TASK_MARKER, prompt);
    }

    if lineage.agent_type.is_none() {
        lineage.agent_type = input
            .get("subagent_type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    lineage
}

fn split_instance(agent_type: &str, number: &str) -> Option<(String, u32)> {
    number.parse().ok().map(|n| (agent_type.to_string(), n))
}

fn marked_id(marker: &Regex, text: &str) -> Option<String> {
    marker
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|id| is_valid_id(id))
}
