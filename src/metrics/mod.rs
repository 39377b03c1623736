mod types;

pub use types::{MetricsSnapshot, TickMetrics};

use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_TICKS: usize = 20;

/// Rolling observability for the acquisition loop.
pub struct PipelineMetrics {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_ticks: Vec<TickMetrics>,
    tick_count: u64,
    skipped_frame_count: u64,
    accepted_sample_count: u64,
    render_failure_count: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_ticks: Vec::with_capacity(MAX_RECENT_TICKS),
                tick_count: 0,
                skipped_frame_count: 0,
                accepted_sample_count: 0,
                render_failure_count: 0,
            })),
        }
    }

    pub async fn record_tick(&self, metrics: TickMetrics) {
        let mut state = self.inner.lock().await;

        state.tick_count += 1;
        if metrics.frame_skipped {
            state.skipped_frame_count += 1;
        }
        if metrics.sample_accepted {
            state.accepted_sample_count += 1;
        }

        state.recent_ticks.push(metrics);
        if state.recent_ticks.len() > MAX_RECENT_TICKS {
            state.recent_ticks.remove(0);
        }
    }

    pub async fn record_render_failure(&self) {
        self.inner.lock().await.render_failure_count += 1;
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let state = self.inner.lock().await;
        MetricsSnapshot {
            recent_ticks: state.recent_ticks.clone(),
            tick_count: state.tick_count,
            skipped_frame_count: state.skipped_frame_count,
            accepted_sample_count: state.accepted_sample_count,
            render_failure_count: state.render_failure_count,
        }
    }

    /// Cleared on every scan start.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.recent_ticks.clear();
        state.tick_count = 0;
        state.skipped_frame_count = 0;
        state.accepted_sample_count = 0;
        state.render_failure_count = 0;
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
