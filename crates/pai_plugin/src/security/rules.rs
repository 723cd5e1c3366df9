//! Declarative rule tables for the policy engine.
//!
//! Each [`PatternCategory`] is plain data: a name, the status it produces, and an
//! ordered list of matchers. The engine walks categories in table order within each
//! tier, so the order of the functions' vectors below is the evaluation order.

use regex::Regex;
use std::path::Path;

use super::decision::DecisionStatus;

/// Sub-trees of the plugin root that agents may write freely.
///
/// Matched as prefixes of the first path segment under the root, so `skill`
/// also covers `skills`.
pub const SAFE_SUBTREES: &[&str] = &[
    "history",
    "skill",
    "agents",
    "commands",
    "hooks",
    "sessions",
    "learnings",
    "decisions",
    "raw-outputs",
    "system-logs",
];

/// A single test applied to a command or path
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Fires when the regex matches anywhere in the text
    Pattern(Regex),
    /// Fires for anything under `root` whose first segment is not an exempt prefix
    ProtectedRoot {
        /// Matches the root directory including its trailing `/`
        root: Regex,
        /// Lowercase segment prefixes that stay writable
        exempt: Vec<String>,
    },
}

impl Matcher {
    /// Compile a regex matcher
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(pattern)?))
    }

    /// Protect everything under `root` except the given sub-trees
    pub fn protected_root(root: &str, exempt: &[&str]) -> Result<Self, regex::Error> {
        Ok(Matcher::ProtectedRoot {
            root: Regex::new(root)?,
            exempt: exempt.iter().map(|s| s.to_lowercase()).collect(),
        })
    }

    /// Test the matcher against `text`
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::ProtectedRoot { root, exempt } => root.find_iter(text).any(|m| {
                let rest = &text[m.end()..];
                let segment: String = rest
                    .chars()
                    .take_while(|c| *c != '/' && !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase();
                !exempt.iter().any(|safe| segment.starts_with(safe.as_str()))
            }),
        }
    }
}

/// A named, ordered list of matchers and the status it produces
#[derive(Debug, Clone)]
pub struct PatternCategory {
    /// Category name reported in decisions (e.g., `reverse_shell`)
    pub name: String,
    /// Status produced when any matcher fires
    pub status: DecisionStatus,
    /// Matchers, tried in order
    pub matchers: Vec<Matcher>,
}

impl PatternCategory {
    /// Create a category
    pub fn new(name: impl Into<String>, status: DecisionStatus, matchers: Vec<Matcher>) -> Self {
        Self {
            name: name.into(),
            status,
            matchers,
        }
    }

    /// Build a category from regex sources.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn from_patterns(
        name: impl Into<String>,
        status: DecisionStatus,
        patterns: &[&str],
    ) -> Result<Self, regex::Error> {
        let matchers = patterns
            .iter()
            .map(|p| Matcher::pattern(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, status, matchers))
    }

    /// True if any matcher fires
    pub fn matches(&self, text: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(text))
    }
}

/// Category name for command and path access to protected files
pub const PATH_PROTECTION: &str = "path_protection";

const REVERSE_SHELL: &[&str] = &[
    r"/dev/(?:tcp|udp)/[0-9]",
    r"\bbash\s+-i\s+>&?\s*/dev/",
    r"\b(?:nc|ncat|netcat)\b[^|;&]*\s-[ec]\s",
];

const INSTRUCTION_OVERRIDE: &[&str] = &[
    r"(?i)ignore\s+(?:all\s+)?(?:previous|prior)\s+(?:instructions?|rules?)",
    r"(?i)disregard\s+(?:all\s+)?(?:prior|previous)\s+(?:instructions?|rules?)",
];

const CATASTROPHIC_DELETION: &[&str] = &[
    // home directory as first or later target
    r"\brm\s+(?:-[a-zA-Z]+\s+)*(?:~|\$HOME|\$\{HOME\})/?\*?(?:\s|$)",
    r"\brm\s+(?:-[a-zA-Z]+\s+)*\S+\s+(?:~|\$HOME|\$\{HOME\})/?\*?(?:\s|$)",
    // current or parent directory
    r"\brm\s+(?:-[a-zA-Z]+\s+)*\.\.?/?(?:\s*$|\s*[;&|])",
    // filesystem root
    r"\brm\s+(?:-[a-zA-Z]+\s+)*/\*?(?:\s*$|\s*[;&|])",
    r"\brm\s+.*--no-preserve-root",
];

const DANGEROUS_FILE_OPS: &[&str] = &[r"\bchmod\s+(?:-R\s+)?(?:0?777|a\+rwx|0{3,})\b"];

const DATA_EXFILTRATION: &[&str] = &[
    r"(?i)(?:^|[\s;&|(`])(?:ping|dig|nslookup|host|wget|nc|netcat|ncat|telnet|socat|ftp|tftp)\s+",
    r"(?i)\bcurl\b.*(?:@|--upload-file|\s-T\s)",
];

const REMOTE_CODE_EXECUTION: &[&str] = &[
    r"(?i)\bfind\b.*\s-exec(?:dir)?\b",
    r"(?i)(?:^|[\s;&|(`])strings\s+",
];

const DANGEROUS_GIT: &[&str] = &[
    r"(?i)\bgit\s+push\b.*(?:\s-f\b|--force)",
    r"(?i)\bgit\s+reset\s+--hard",
];

const SENSITIVE_PATHS: &[&str] = &[
    r"(?i)\.config/opencode/(?:opencode\.json|credentials[^/\s]*|[^/\s]*\.key|[^/\s]*\.token|\.env)",
    r"(?i)opencode-pai-plugin/src",
    r"\.ssh/id_[A-Za-z0-9_]+",
    r"\.aws/credentials",
];

fn compiled(name: &str, status: DecisionStatus, patterns: &[&str]) -> PatternCategory {
    PatternCategory::from_patterns(name, status, patterns).expect("built-in rule compiles")
}

/// Credential files and the plugin source tree; `ask` in any mode
pub fn sensitive_path_matchers() -> Vec<Matcher> {
    SENSITIVE_PATHS
        .iter()
        .map(|p| Matcher::pattern(p).expect("built-in rule compiles"))
        .collect()
}

/// Plugin infrastructure; `ask` for writes
pub fn protected_path_matchers() -> Vec<Matcher> {
    vec![
        Matcher::protected_root(r"(?i)\.config/opencode/", SAFE_SUBTREES)
            .expect("built-in rule compiles"),
        Matcher::pattern(r"(?i)opencode-pai-plugin").expect("built-in rule compiles"),
    ]
}

/// Matchers protecting a custom plugin root (when `PAI_DIR` is not the XDG default)
pub fn root_matchers(root: &Path) -> (Vec<Matcher>, Vec<Matcher>) {
    let escaped = regex::escape(root.to_string_lossy().trim_end_matches('/'));
    let sensitive = Matcher::pattern(&format!(
        r"{escaped}/(?:opencode\.json|credentials[^/\s]*|[^/\s]*\.key|[^/\s]*\.token|\.env)"
    ))
    .expect("escaped root compiles");
    let protected = Matcher::protected_root(&format!("{escaped}/"), SAFE_SUBTREES)
        .expect("escaped root compiles");
    (vec![sensitive], vec![protected])
}

/// The built-in command categories in evaluation order
pub fn command_categories() -> Vec<PatternCategory> {
    vec![
        compiled("reverse_shell", DecisionStatus::Deny, REVERSE_SHELL),
        compiled("instruction_override", DecisionStatus::Deny, INSTRUCTION_OVERRIDE),
        compiled("catastrophic_deletion", DecisionStatus::Deny, CATASTROPHIC_DELETION),
        compiled("dangerous_file_ops", DecisionStatus::Deny, DANGEROUS_FILE_OPS),
        PatternCategory::new(PATH_PROTECTION, DecisionStatus::Deny, sensitive_path_matchers()),
        compiled("data_exfiltration", DecisionStatus::Deny, DATA_EXFILTRATION),
        compiled("remote_code_execution", DecisionStatus::Deny, REMOTE_CODE_EXECUTION),
        compiled("dangerous_git", DecisionStatus::Ask, DANGEROUS_GIT),
    ]
}
