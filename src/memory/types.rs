//! Core memory type definitions.
//!
//! Defines [`MemoryKind`] (the six content categories), [`Memory`] (a full
//! record), [`Association`] (weighted graph edges), and [`Project`]
//! (path-scoped grouping).

use serde::{Deserialize, Serialize};

/// What kind of content a memory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// Something figured out — an insight worth keeping.
    Learning,
    /// A choice that was made and why.
    Decision,
    /// Background knowledge about the working environment.
    Context,
    /// A defect that was encountered.
    Bug,
    /// How a problem was resolved.
    Solution,
    /// A notable exchange worth recalling later.
    Conversation,
}

impl MemoryKind {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Decision => "decision",
            Self::Context => "context",
            Self::Bug => "bug",
            Self::Solution => "solution",
            Self::Conversation => "conversation",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learning" => Ok(Self::Learning),
            "decision" => Ok(Self::Decision),
            "context" => Ok(Self::Context),
            "bug" => Ok(Self::Bug),
            "solution" => Ok(Self::Solution),
            "conversation" => Ok(Self::Conversation),
            _ => Err(format!("unknown memory kind: {s}")),
        }
    }
}

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Content category.
    pub kind: MemoryKind,
    /// The full text content.
    pub content: String,
    /// Short summary (≤150 chars), derived from content when not supplied.
    pub gist: String,
    /// Salience in `[0.0, 1.0]`; 0.5 is neutral.
    pub emotional_weight: f64,
    /// Free-form tag set.
    pub tags: Vec<String>,
    /// Owning project, if scoped.
    pub project_id: Option<String>,
    /// Total number of accesses, including the creating one.
    pub access_count: u32,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// A weighted directed edge between two memories.
///
/// Stored directed, but retrieval treats edges symmetrically: an edge
/// (a → b) spreads activation toward both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    pub source_id: String,
    pub target_id: String,
    /// Strength in `[0.0, 1.0]`.
    pub strength: f64,
    /// Edge kind, e.g. `"semantic"` or `"temporal"`.
    pub kind: String,
    /// ISO 8601 timestamp of the last reinforcement.
    pub reinforced_at: String,
}

/// A named scope grouping memories and locations by an absolute path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Absolute path; unique across projects.
    pub path: String,
    pub created_at: String,
}
