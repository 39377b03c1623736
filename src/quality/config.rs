use serde::{Deserialize, Serialize};

/// Tunable thresholds for the signal-quality heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityConfig {
    /// Mean brightness below this reads as no usable light at all.
    pub dark_threshold: f64,

    /// Red must exceed green and blue by this margin before the region
    /// counts as a perfused finger.
    pub redness_margin: f64,

    /// Maximum representable channel value.
    pub max_channel: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            dark_threshold: 10.0,
            redness_margin: 10.0,
            max_channel: 255.0,
        }
    }
}
