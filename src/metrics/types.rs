use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickMetrics {
    pub timestamp: DateTime<Utc>,
    pub acquire_ms: u64,
    pub classify_ms: u64,
    pub frame_skipped: bool,
    pub sample_accepted: bool,
    pub quality_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub recent_ticks: Vec<TickMetrics>,
    pub tick_count: u64,
    pub skipped_frame_count: u64,
    pub accepted_sample_count: u64,
    pub render_failure_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            recent_ticks: Vec::new(),
            tick_count: 0,
            skipped_frame_count: 0,
            accepted_sample_count: 0,
            render_failure_count: 0,
        }
    }
}
