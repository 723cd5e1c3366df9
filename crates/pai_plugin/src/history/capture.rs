//! Structured-response parsing and artifact classification.
//!
//! Assistants are prompted to answer in a fixed section format:
//!
//! ```text
//! 🎯 SUMMARY: what was done
//! ANALYSIS: ...
//! RESULTS: ...
//! COMPLETED: one-line outcome
//! ```
//!
//! Messages in that shape are archived as typed knowledge artifacts. Anything
//! else is ordinary chat and is ignored.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::roles::normalize_agent_role;

/// Longest slug used in artifact filenames
pub const MAX_SLUG_CHARS: usize = 50;

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    let names = SectionKind::ALL
        .iter()
        .map(|k| regex::escape(k.header()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?m)^[^\w\n]*({names})\*{{0,2}}[ \t]*:\*{{0,2}}[ \t]*"))
        .expect("section header pattern is valid")
});

static BUG_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:fix(?:e[sd])?|fixing|bugs?|issues?|errors?|broken)\b")
        .expect("bug pattern is valid")
});

static REFACTOR_LANGUAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:refactor\w*|clean[ -]?up\w*|restructur\w*)\b")
        .expect("refactor pattern is valid")
});

/// Troubleshooting vocabulary; two distinct hits make a LEARNING
const LEARNING_KEYWORDS: &[&str] = &[
    "fixed",
    "solved",
    "discovered",
    "lesson",
    "troubleshoot",
    "debug",
    "root cause",
    "learning",
    "bug",
    "issue",
    "resolved",
];

static LEARNING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LEARNING_KEYWORDS
        .iter()
        .map(|kw| {
            let words = kw.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+");
            Regex::new(&format!(r"(?i)\b{words}")).expect("keyword pattern is valid")
        })
        .collect()
});

/// Recognized section headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// `SUMMARY`
    Summary,
    /// `ANALYSIS`
    Analysis,
    /// `ACTIONS`
    Actions,
    /// `RESULTS`
    Results,
    /// `STATUS`
    Status,
    /// `CAPTURE`
    Capture,
    /// `NEXT`
    Next,
    /// `STORY EXPLANATION`
    StoryExplanation,
    /// `COMPLETED`
    Completed,
}

impl SectionKind {
    /// Every header, in documentation order
    pub const ALL: [SectionKind; 9] = [
        SectionKind::Summary,
        SectionKind::Analysis,
        SectionKind::Actions,
        SectionKind::Results,
        SectionKind::Status,
        SectionKind::Capture,
        SectionKind::Next,
        SectionKind::StoryExplanation,
        SectionKind::Completed,
    ];

    /// Header text as it appears in a message
    pub fn header(self) -> &'static str {
        match self {
            SectionKind::Summary => "SUMMARY",
            SectionKind::Analysis => "ANALYSIS",
            SectionKind::Actions => "ACTIONS",
            SectionKind::Results => "RESULTS",
            SectionKind::Status => "STATUS",
            SectionKind::Capture => "CAPTURE",
            SectionKind::Next => "NEXT",
            SectionKind::StoryExplanation => "STORY EXPLANATION",
            SectionKind::Completed => "COMPLETED",
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.header() == header)
    }
}

/// Sections of one message, in the order they appear
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    entries: Vec<(SectionKind, String)>,
}

impl Sections {
    /// Body of a section, if present
    pub fn get(&self, kind: SectionKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, body)| body.as_str())
    }

    /// True if the section is present
    pub fn contains(&self, kind: SectionKind) -> bool {
        self.get(kind).is_some()
    }

    /// Number of distinct sections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no header was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in message order
    pub fn iter(&self) -> impl Iterator<Item = (SectionKind, &str)> {
        self.entries.iter().map(|(k, body)| (*k, body.as_str()))
    }

    /// SUMMARY or COMPLETED, plus at least one other section
    pub fn is_structured(&self) -> bool {
        (self.contains(SectionKind::Summary) || self.contains(SectionKind::Completed))
            && self.len() >= 2
    }

    /// SUMMARY, falling back to COMPLETED
    pub fn summary(&self) -> Option<&str> {
        self.get(SectionKind::Summary)
            .or_else(|| self.get(SectionKind::Completed))
            .filter(|s| !s.is_empty())
    }
}

/// Split a message into its recognized sections.
///
/// A header counts only at the start of a line, optionally after an emoji,
/// bullet or heading marker, and optionally wrapped in `*`/`**`. Matching is
/// case-sensitive. Each body runs to the next header or the end of the text. A
/// repeated header keeps its first body.
///
/// # Examples
///
/// ```
/// use pai_plugin::history::{parse_sections, SectionKind};
///
/// let sections = parse_sections("🎯 **SUMMARY:** Fixed the build\nRESULTS: green");
/// assert_eq!(sections.get(SectionKind::Summary), Some("Fixed the build"));
/// assert_eq!(sections.get(SectionKind::Results), Some("green"));
/// assert!(sections.is_structured());
/// ```
pub fn parse_sections(text: &str) -> Sections {
    let headers: Vec<_> = SECTION_HEADER.captures_iter(text).collect();
    let mut sections = Sections::default();

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(kind) = SectionKind::from_header(name.as_str()) else {
            continue;
        };
        if sections.contains(kind) {
            continue;
        }
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = text[whole.end()..end].trim().to_string();
        sections.entries.push((kind, body));
    }

    sections
}

/// Kind of knowledge artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CaptureType {
    /// Architectural decision
    Decision,
    /// Research findings
    Research,
    /// New functionality
    Feature,
    /// Bug fix
    Bug,
    /// Refactoring
    Refactor,
    /// Troubleshooting lesson
    Learning,
    /// General work log
    Work,
}

impl CaptureType {
    /// Upper-case name used in front matter and filenames
    pub fn as_str(self) -> &'static str {
        match self {
            CaptureType::Decision => "DECISION",
            CaptureType::Research => "RESEARCH",
            CaptureType::Feature => "FEATURE",
            CaptureType::Bug => "BUG",
            CaptureType::Refactor => "REFACTOR",
            CaptureType::Learning => "LEARNING",
            CaptureType::Work => "WORK",
        }
    }

    /// History sub-directory, relative to `history/`
    pub fn directory(self) -> &'static str {
        match self {
            CaptureType::Decision => "decisions",
            CaptureType::Research => "research",
            CaptureType::Feature => "execution/features",
            CaptureType::Bug => "execution/bugs",
            CaptureType::Refactor => "execution/refactors",
            CaptureType::Learning => "learnings",
            CaptureType::Work => "sessions",
        }
    }
}

impl fmt::Display for CaptureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a structured message for the session's current role.
///
/// The role decides first: architects record decisions, researchers and
/// pentesters record research, engineers and designers record bugs, refactors
/// or features depending on the summary. Other roles record a learning when
/// the analysis and results use enough troubleshooting vocabulary, otherwise
/// plain work.
pub fn classify(role: &str, sections: &Sections) -> CaptureType {
    match normalize_agent_role(role).as_str() {
        "architect" => CaptureType::Decision,
        "researcher" | "pentester" => CaptureType::Research,
        "engineer" | "designer" => {
            let summary = sections.summary().unwrap_or_default();
            if BUG_LANGUAGE.is_match(summary) {
                CaptureType::Bug
            } else if REFACTOR_LANGUAGE.is_match(summary) {
                CaptureType::Refactor
            } else {
                CaptureType::Feature
            }
        }
        _ => {
            if learning_keyword_count(sections) >= 2 {
                CaptureType::Learning
            } else {
                CaptureType::Work
            }
        }
    }
}

/// Distinct troubleshooting keywords in ANALYSIS and RESULTS
pub fn learning_keyword_count(sections: &Sections) -> usize {
    let text = [SectionKind::Analysis, SectionKind::Results]
        .iter()
        .filter_map(|k| sections.get(*k))
        .collect::<Vec<_>>()
        .join("\n");
    LEARNING_PATTERNS.iter().filter(|re| re.is_match(&text)).count()
}

/// Filename-safe slug: lowercase ASCII words joined by `-`, at most
/// [`MAX_SLUG_CHARS`] characters, `untitled` when nothing is left.
///
/// # Examples
///
/// ```
/// use pai_plugin::history::slugify;
///
/// assert_eq!(slugify("This is a test summary."), "this-is-a-test-summary");
/// assert_eq!(slugify("¡¿!"), "untitled");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_CHARS {
            break;
        }
    }

    slug.truncate(MAX_SLUG_CHARS);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UOCS_MESSAGE: &str = "
SUMMARY: This is a test summary.
ANALYSIS: I analyzed the problem and found a bug. I fixed it.
ACTIONS: Edited logger.rs.
RESULTS: The bug is fixed and tests pass.
STATUS: Completed.
CAPTURE: Learned about the capture format.
NEXT: Implement more features.
STORY EXPLANATION:
1. Step one
2. Step two
COMPLETED: Done correctly.
";

    #[test]
    fn test_parse_all_sections() {
        let sections = parse_sections(UOCS_MESSAGE);
        assert_eq!(sections.len(), 9);
        assert_eq!(sections.get(SectionKind::Summary), Some("This is a test summary."));
        assert_eq!(
            sections.get(SectionKind::StoryExplanation),
            Some("1. Step one\n2. Step two")
        );
        assert_eq!(sections.get(SectionKind::Completed), Some("Done correctly."));
        assert!(sections.is_structured());
    }

    #[test]
    fn test_parse_emphasis_and_markers() {
        let text = "🎯 **COMPLETED:** shipped\n- *STATUS*: green\n## NEXT: rest";
        let sections = parse_sections(text);
        assert_eq!(sections.get(SectionKind::Completed), Some("shipped"));
        assert_eq!(sections.get(SectionKind::Status), Some("green"));
        assert_eq!(sections.get(SectionKind::Next), Some("rest"));
    }

    #[test]
    fn test_header_must_start_line_and_match_case() {
        let sections = parse_sections("The SUMMARY: is here\nsummary: lower\nAnalysis: mixed");
        assert!(sections.is_empty());
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let sections = parse_sections("SUMMARY: first\nRESULTS: r\nSUMMARY: second");
        assert_eq!(sections.get(SectionKind::Summary), Some("first"));
        assert_eq!(sections.get(SectionKind::Results), Some("r"));
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn test_structure_requirements() {
        assert!(!parse_sections("SUMMARY: only one").is_structured());
        assert!(!parse_sections("ANALYSIS: a\nRESULTS: b").is_structured());
        assert!(parse_sections("COMPLETED: x\nNEXT: y").is_structured());
        assert!(!parse_sections("just chatting").is_structured());
    }

    #[test]
    fn test_classify_by_role() {
        let sections = parse_sections(UOCS_MESSAGE);
        assert_eq!(classify("architect", &sections), CaptureType::Decision);
        assert_eq!(classify("subagents/sparc-architect", &sections), CaptureType::Decision);
        assert_eq!(classify("researcher", &sections), CaptureType::Research);
        assert_eq!(classify("pentester", &sections), CaptureType::Research);
    }

    #[test]
    fn test_classify_engineer_by_summary() {
        let bug = parse_sections("SUMMARY: Fix crash on empty input\nRESULTS: ok");
        assert_eq!(classify("engineer", &bug), CaptureType::Bug);

        let refactor = parse_sections("SUMMARY: Refactored the parser\nRESULTS: ok");
        assert_eq!(classify("engineer", &refactor), CaptureType::Refactor);

        let feature = parse_sections("SUMMARY: Add new feature X.\nRESULTS: Feature X is ready.");
        assert_eq!(classify("designer", &feature), CaptureType::Feature);

        let completed_only = parse_sections("COMPLETED: cleanup of old modules\nNEXT: none");
        assert_eq!(classify("engineer", &completed_only), CaptureType::Refactor);
    }

    #[test]
    fn test_classify_learning_vs_work() {
        let sections = parse_sections(UOCS_MESSAGE);
        assert_eq!(classify("pai", &sections), CaptureType::Learning);

        let one_keyword = parse_sections("SUMMARY: s\nANALYSIS: found a bug\nRESULTS: all good");
        assert_eq!(learning_keyword_count(&one_keyword), 1);
        assert_eq!(classify("pai", &one_keyword), CaptureType::Work);

        let repeated = parse_sections("SUMMARY: s\nANALYSIS: bug bug bug\nRESULTS: bug");
        assert_eq!(classify("pai", &repeated), CaptureType::Work);

        let root_cause = parse_sections("SUMMARY: s\nANALYSIS: root  cause found\nRESULTS: resolved");
        assert_eq!(classify("pai", &root_cause), CaptureType::Learning);
    }

    #[test]
    fn test_keywords_respect_word_start() {
        let sections = parse_sections("SUMMARY: s\nANALYSIS: debugger tissue\nRESULTS: unfixed");
        // `debug` matches as a word start; `issue` inside `tissue` and `fixed` inside `unfixed` do not
        assert_eq!(learning_keyword_count(&sections), 1);
    }

    #[test]
    fn test_capture_type_directories() {
        assert_eq!(CaptureType::Bug.directory(), "execution/bugs");
        assert_eq!(CaptureType::Work.directory(), "sessions");
        assert_eq!(CaptureType::Learning.to_string(), "LEARNING");
        assert_eq!(serde_json::to_string(&CaptureType::Refactor).unwrap(), r#""REFACTOR""#);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add new feature X."), "add-new-feature-x");
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("Café déjà vu"), "caf-d-j-vu");

        let long = slugify(&"word ".repeat(30));
        assert!(long.len() <= MAX_SLUG_CHARS);
        assert!(!long.ends_with('-'));
    }
}
