//! Replay input configuration.

use serde::{Deserialize, Serialize};

use super::observability::default_true;

/// Where ticks come from and what the run records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON tick file: `{ "<contract>": [["<timestamp>", "<price>"], ...] }`.
    pub ticks_path: String,
    /// Record a PnL point per tick.
    #[serde(default = "default_true")]
    pub record_history: bool,
}
