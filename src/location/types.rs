//! Location type definitions and activity inference.

use serde::{Deserialize, Serialize};

/// What the caller was doing when they touched a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Reading,
    Writing,
    Debugging,
    Refactoring,
    Reviewing,
    Unknown,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Debugging => "debugging",
            Self::Refactoring => "refactoring",
            Self::Reviewing => "reviewing",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(Self::Reading),
            "writing" => Ok(Self::Writing),
            "debugging" => Ok(Self::Debugging),
            "refactoring" => Ok(Self::Refactoring),
            "reviewing" => Ok(Self::Reviewing),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("unknown activity type: {s}")),
        }
    }
}

/// How an activity type was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceSource {
    Explicit,
    Keyword,
    Tool,
    Default,
}

/// Result of activity inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityInference {
    pub activity: ActivityType,
    pub source: InferenceSource,
    pub confidence: f64,
}

/// A known file path with learned familiarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    /// Absolute path.
    pub path: String,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub access_count: u32,
    pub direct_access_count: u32,
    /// Accesses that skipped a search because the path was already known.
    pub searches_saved: u32,
    /// Current familiarity in `[0.0, 1.0]`.
    pub familiarity: f64,
    /// Historical maximum; drives the sticky decay floor.
    pub peak_familiarity: f64,
    /// Pinned locations never decay and are excluded from orphan detection.
    pub pinned: bool,
    pub last_accessed_ms: Option<i64>,
    pub last_decayed_ms: Option<i64>,
    pub created_at: String,
}

/// One recorded access to a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAccess {
    pub location_id: String,
    pub context: String,
    pub activity: ActivityType,
    pub direct: bool,
    pub task: Option<String>,
    pub accessed_at_ms: i64,
}

/// A co-access edge between two locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAssociation {
    pub source_id: String,
    pub target_id: String,
    pub strength: f64,
    pub co_access_count: u32,
}

/// Infer the activity type for a new access.
///
/// Precedence, first match wins:
/// 1. Explicit — the caller said what they were doing
/// 2. Keyword — intent indicators in the context string
/// 3. Tool — the tool name indicates the action taken
/// 4. Default — unknown
///
/// Keywords outrank tool names: "reading this file to fix the bug" is
/// debugging even though the tool was Read.
pub fn infer_activity(
    context: &str,
    tool: Option<&str>,
    explicit: Option<ActivityType>,
) -> ActivityInference {
    if let Some(activity) = explicit {
        if activity != ActivityType::Unknown {
            return ActivityInference {
                activity,
                source: InferenceSource::Explicit,
                confidence: 1.0,
            };
        }
    }

    let lower = context.to_lowercase();
    let keyword_rules: &[(ActivityType, &[&str], f64)] = &[
        (
            ActivityType::Debugging,
            &["debug", "fix", "bug", "issue", "error", "trace"],
            0.9,
        ),
        (
            ActivityType::Refactoring,
            &["refactor", "clean up", "reorganize", "restructure"],
            0.9,
        ),
        (
            ActivityType::Reviewing,
            &["review", "understand", "check", "examine", "audit"],
            0.8,
        ),
        (
            ActivityType::Writing,
            &["implement", "add", "create", "write", "build"],
            0.7,
        ),
        (
            ActivityType::Reading,
            &["read", "look", "see", "view", "inspect"],
            0.6,
        ),
    ];

    for (activity, keywords, confidence) in keyword_rules {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return ActivityInference {
                activity: *activity,
                source: InferenceSource::Keyword,
                confidence: *confidence,
            };
        }
    }

    if let Some(tool) = tool {
        let from_tool = match tool {
            "Read" | "Grep" | "Glob" => Some(ActivityType::Reading),
            "Edit" | "Write" => Some(ActivityType::Writing),
            _ => None,
        };
        if let Some(activity) = from_tool {
            return ActivityInference {
                activity,
                source: InferenceSource::Tool,
                confidence: 0.5,
            };
        }
    }

    ActivityInference {
        activity: ActivityType::Unknown,
        source: InferenceSource::Default,
        confidence: 0.0,
    }
}
