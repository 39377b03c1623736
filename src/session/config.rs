use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::quality::QualityConfig;

/// Tunable parameters for one acquisition widget instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Scan auto-stops once this much wall-clock time has elapsed.
    pub target_duration_secs: u64,

    /// Drives the tick cadence of the preview loop. The effective sampling
    /// rate reported downstream is always derived from real elapsed time,
    /// never from this value.
    pub nominal_fps: u32,

    /// A finalized buffer must hold at least this many seconds worth of
    /// samples at the nominal rate.
    pub min_signal_secs: u64,

    /// Edge length of the centered square ROI.
    pub roi_edge: u32,

    /// Number of trailing samples shown in the scrolling waveform.
    pub waveform_window: usize,

    pub quality: QualityConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_duration_secs: 30,
            nominal_fps: 30,
            min_signal_secs: 5,
            roi_edge: 50,
            waveform_window: 100,
            quality: QualityConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.nominal_fps.max(1)))
    }

    /// Minimum accepted sample count for a finalizable buffer. The boundary
    /// is inclusive: exactly this many samples proceeds to estimation.
    pub fn min_samples(&self) -> usize {
        (u64::from(self.nominal_fps) * self.min_signal_secs) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_minimum_is_five_seconds_at_nominal_rate() {
        let config = ScanConfig::default();
        assert_eq!(config.min_samples(), 150);
    }

    #[test]
    fn frame_interval_follows_nominal_fps() {
        let config = ScanConfig {
            nominal_fps: 60,
            ..ScanConfig::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_secs_f64(1.0 / 60.0));
    }
}
