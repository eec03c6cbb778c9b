use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StageId
// ---------------------------------------------------------------------------

/// Identifier of one wizard stage. The set is closed: ad-hoc stages invented
/// by a completion port are not representable here and are rejected at the
/// catalog boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Start,
    ClarifyIntent,
    NotBuilder,
    MvpScoper,
    StackSelector,
    Reasoner,
    FileMapBuilder,
    TaskPlanner,
    Export,
}

impl StageId {
    pub fn all() -> &'static [StageId] {
        &[
            StageId::Start,
            StageId::ClarifyIntent,
            StageId::NotBuilder,
            StageId::MvpScoper,
            StageId::StackSelector,
            StageId::Reasoner,
            StageId::FileMapBuilder,
            StageId::TaskPlanner,
            StageId::Export,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Start => "start",
            StageId::ClarifyIntent => "clarify_intent",
            StageId::NotBuilder => "not_builder",
            StageId::MvpScoper => "mvp_scoper",
            StageId::StackSelector => "stack_selector",
            StageId::Reasoner => "reasoner",
            StageId::FileMapBuilder => "file_map_builder",
            StageId::TaskPlanner => "task_planner",
            StageId::Export => "export",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageId {
    type Err = crate::error::ClarityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::all()
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| crate::error::ClarityError::UnknownStage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    MultiSelect,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::MultiSelect => "multiselect",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ResponseValue
// ---------------------------------------------------------------------------

/// A submitted value for one prompt field: free text / single choice, or a
/// multi-choice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Text(String),
    Choices(Vec<String>),
}

impl ResponseValue {
    pub fn text(s: impl Into<String>) -> Self {
        ResponseValue::Text(s.into())
    }

    pub fn choices<I: IntoIterator<Item = S>, S: Into<String>>(items: I) -> Self {
        ResponseValue::Choices(items.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(s) => Some(s),
            ResponseValue::Choices(_) => None,
        }
    }

    /// Flatten to a single string for validation and transcripts.
    pub fn joined(&self) -> String {
        match self {
            ResponseValue::Text(s) => s.clone(),
            ResponseValue::Choices(items) => items.join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResponseValue::Text(s) => s.trim().is_empty(),
            ResponseValue::Choices(items) => items.is_empty(),
        }
    }
}

impl Default for ResponseValue {
    fn default() -> Self {
        ResponseValue::Text(String::new())
    }
}

// ---------------------------------------------------------------------------
// PlannedTask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTask {
    pub title: String,
    pub file: String,
    pub estimate: String,
    pub priority: u8,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
