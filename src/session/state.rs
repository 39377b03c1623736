use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::VitalsResult;
use crate::quality::QualityReading;
use crate::signal::SignalBuffer;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScanPhase {
    Idle,
    Scanning,
    Finalizing,
    Result,
    Error,
}

impl Default for ScanPhase {
    fn default() -> Self {
        ScanPhase::Idle
    }
}

/// Full session state for one acquisition widget instance.
///
/// Mutated only through the named transition methods below; the preview
/// loop additionally refreshes `quality` on every tick regardless of phase.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pub phase: ScanPhase,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub quality: QualityReading,
    pub progress_percent: f32,
    pub buffer: SignalBuffer,
    /// Elapsed seconds frozen at the moment scanning stopped.
    pub stopped_elapsed_secs: Option<f64>,
    /// Sampling rate derived at the moment scanning stopped.
    pub effective_fs: Option<f32>,
    pub result: Option<VitalsResult>,
    pub error: Option<String>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, ScanPhase::Scanning | ScanPhase::Finalizing)
    }

    /// Idle/Result/Error → Scanning. Full reset: fresh buffer and anchors,
    /// previous result and error cleared.
    pub fn begin_session(
        &mut self,
        session_id: String,
        started_at: DateTime<Utc>,
        now: Instant,
    ) {
        self.phase = ScanPhase::Scanning;
        self.session_id = Some(session_id);
        self.started_at = Some(started_at);
        self.progress_percent = 0.0;
        self.buffer.begin(now);
        self.stopped_elapsed_secs = None;
        self.effective_fs = None;
        self.result = None;
        self.error = None;
    }

    /// Scanning → Scanning: append one accepted sample and recompute
    /// progress against the target duration.
    pub fn accept_sample(&mut self, red: f32, now: Instant, target_secs: f64) {
        self.buffer.push(red);
        self.progress_percent = if target_secs > 0.0 {
            ((self.buffer.elapsed_secs(now) / target_secs) * 100.0).min(100.0) as f32
        } else {
            100.0
        };
    }

    /// Scanning → Finalizing. The effective sampling rate is fixed here,
    /// from the real elapsed time and the real sample count at this moment.
    pub fn begin_finalizing(&mut self, now: Instant) {
        self.stopped_elapsed_secs = Some(self.buffer.elapsed_secs(now));
        self.effective_fs = self.buffer.sample_rate(now);
        self.phase = ScanPhase::Finalizing;
    }

    /// Finalizing → Result. The buffer is retained alongside the vitals.
    pub fn complete(&mut self, result: VitalsResult) {
        self.result = Some(result);
        self.error = None;
        self.phase = ScanPhase::Result;
    }

    /// Finalizing → Error. The buffer is retained for inspection but is
    /// never resubmitted; recovery requires a fresh start.
    pub fn fail(&mut self, message: String) {
        self.error = Some(message);
        self.phase = ScanPhase::Error;
    }

    /// Scanning → Idle. The in-progress buffer is discarded outright.
    pub fn cancel(&mut self) {
        *self = Self {
            quality: self.quality,
            ..Self::default()
        };
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.stopped_elapsed_secs
            .unwrap_or_else(|| self.buffer.elapsed_secs(now))
    }

    pub fn snapshot(&self, now: Instant) -> ScanSnapshot {
        ScanSnapshot {
            phase: self.phase,
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            quality: self.quality,
            progress_percent: self.progress_percent,
            sample_count: self.buffer.len(),
            elapsed_secs: self.elapsed_secs(now),
            effective_fs: self.effective_fs,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Serializable view of the session handed to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub phase: ScanPhase,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub quality: QualityReading,
    pub progress_percent: f32,
    pub sample_count: usize,
    pub elapsed_secs: f64,
    pub effective_fs: Option<f32>,
    pub result: Option<VitalsResult>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VitalsStatus;
    use std::time::Duration;

    fn vitals() -> VitalsResult {
        VitalsResult {
            heart_rate: 70,
            spo2: 97,
            confidence: 88,
            status: VitalsStatus::Normal,
        }
    }

    #[test]
    fn begin_session_resets_everything() {
        let start = Instant::now();
        let mut state = ScanState::new();
        state.begin_session("a".into(), Utc::now(), start);
        state.accept_sample(120.0, start + Duration::from_secs(1), 30.0);
        state.begin_finalizing(start + Duration::from_secs(1));
        state.fail("boom".into());

        state.begin_session("b".into(), Utc::now(), start + Duration::from_secs(2));
        assert_eq!(state.phase, ScanPhase::Scanning);
        assert_eq!(state.session_id.as_deref(), Some("b"));
        assert!(state.buffer.is_empty());
        assert_eq!(state.progress_percent, 0.0);
        assert!(state.result.is_none());
        assert!(state.error.is_none());
        assert!(state.effective_fs.is_none());
    }

    #[test]
    fn progress_tracks_elapsed_over_target() {
        let start = Instant::now();
        let mut state = ScanState::new();
        state.begin_session("a".into(), Utc::now(), start);

        state.accept_sample(120.0, start + Duration::from_secs(15), 30.0);
        assert!((state.progress_percent - 50.0).abs() < 1e-3);

        state.accept_sample(120.0, start + Duration::from_secs(45), 30.0);
        assert_eq!(state.progress_percent, 100.0);
    }

    #[test]
    fn finalizing_freezes_rate_and_elapsed() {
        let start = Instant::now();
        let mut state = ScanState::new();
        state.begin_session("a".into(), Utc::now(), start);
        for _ in 0..150 {
            state.buffer.push(120.0);
        }

        let stop = start + Duration::from_secs(5);
        state.begin_finalizing(stop);
        assert_eq!(state.phase, ScanPhase::Finalizing);
        assert!((state.effective_fs.unwrap() - 30.0).abs() < 1e-6);
        assert!((state.stopped_elapsed_secs.unwrap() - 5.0).abs() < 1e-9);

        // Later snapshots keep reporting the stop-time elapsed value.
        let snapshot = state.snapshot(stop + Duration::from_secs(60));
        assert!((snapshot.elapsed_secs - 5.0).abs() < 1e-9);
    }

    #[test]
    fn terminal_phases_retain_the_buffer() {
        let start = Instant::now();
        let mut state = ScanState::new();
        state.begin_session("a".into(), Utc::now(), start);
        state.buffer.push(120.0);
        state.begin_finalizing(start + Duration::from_secs(1));

        state.fail("low confidence".into());
        assert_eq!(state.phase, ScanPhase::Error);
        assert_eq!(state.error.as_deref(), Some("low confidence"));
        assert_eq!(state.buffer.len(), 1);

        state.complete(vitals());
        assert_eq!(state.phase, ScanPhase::Result);
        assert_eq!(state.buffer.len(), 1);
        assert!(state.result.is_some());
    }

    #[test]
    fn cancel_discards_the_buffer_but_keeps_live_quality() {
        let start = Instant::now();
        let mut state = ScanState::new();
        state.begin_session("a".into(), Utc::now(), start);
        state.buffer.push(120.0);
        state.quality.score = 77.0;

        state.cancel();
        assert_eq!(state.phase, ScanPhase::Idle);
        assert!(state.buffer.is_empty());
        assert!(state.session_id.is_none());
        assert_eq!(state.quality.score, 77.0);
    }
}
