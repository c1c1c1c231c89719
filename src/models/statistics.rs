use serde::{Deserialize, Serialize};

/// Aggregate lead counts shown above the board.
/// Missing counters decode as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub today: u64,
    #[serde(default)]
    pub converted: u64,
    #[serde(default)]
    pub answered: u64,
}
