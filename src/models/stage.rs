use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pipeline stage.
///
/// Stages are user-configurable records, so this is an open set: a `StageId`
/// only means something relative to a loaded board or stage list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(pub i64);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Colours cycled for stages that have none configured
pub const DEFAULT_STAGE_COLORS: &[&str] = &[
    "#eab308", "#f97316", "#10b981", "#3b82f6", "#8b5cf6", "#ec4899", "#06b6d4",
];

/// A named pipeline column a lead can occupy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, alias = "position")]
    pub order: i64,
}

impl Stage {
    /// Configured colour, or the palette colour for this column position
    pub fn display_color(&self, index: usize) -> &str {
        match self.color.as_deref() {
            Some(color) if !color.trim().is_empty() => color,
            _ => DEFAULT_STAGE_COLORS[index % DEFAULT_STAGE_COLORS.len()],
        }
    }
}

/// Body for stage create/update requests
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// One entry of a stage reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOrder {
    pub id: StageId,
    pub order: i64,
}

impl StageOrder {
    /// Assign positions 0..n in the given id order
    pub fn sequence(ids: &[StageId]) -> Vec<StageOrder> {
        ids.iter()
            .enumerate()
            .map(|(idx, id)| StageOrder { id: *id, order: idx as i64 })
            .collect()
    }
}
