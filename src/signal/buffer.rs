use std::time::Instant;

/// Append-only store of accepted red-channel samples for one session,
/// anchored to the wall-clock moment scanning began.
///
/// Frame delivery follows the display refresh, not a fixed timer, so the
/// sampling rate handed downstream is always derived from the real elapsed
/// time and the real sample count at the moment of stop. It is never the
/// configured nominal rate.
#[derive(Debug, Clone, Default)]
pub struct SignalBuffer {
    samples: Vec<f32>,
    anchor: Option<Instant>,
}

impl SignalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all samples and re-anchor. Called on every transition into
    /// Scanning; the buffer is never reused across sessions.
    pub fn begin(&mut self, now: Instant) {
        self.samples.clear();
        self.anchor = Some(now);
    }

    /// Drop samples and the anchor (cancel path).
    pub fn discard(&mut self) {
        self.samples.clear();
        self.anchor = None;
    }

    pub fn push(&mut self, sample: f32) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn elapsed_secs(&self, now: Instant) -> f64 {
        self.anchor
            .map(|anchor| now.duration_since(anchor).as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Effective sampling rate at `now`: sample count over true elapsed
    /// seconds. `None` until any time has elapsed.
    pub fn sample_rate(&self, now: Instant) -> Option<f32> {
        let elapsed = self.elapsed_secs(now);
        if elapsed > 0.0 {
            Some((self.samples.len() as f64 / elapsed) as f32)
        } else {
            None
        }
    }
}
