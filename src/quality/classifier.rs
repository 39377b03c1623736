use serde::Serialize;

use crate::quality::config::QualityConfig;
use crate::roi::ChannelMeans;

/// Live feedback shown to the user while the preview runs.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FingerFeedback {
    TooDark,
    NoFingerDetected,
    Good,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QualityReading {
    /// 0-100.
    pub score: f32,
    pub feedback: FingerFeedback,
}

impl Default for QualityReading {
    fn default() -> Self {
        Self {
            score: 0.0,
            feedback: FingerFeedback::NoFingerDetected,
        }
    }
}

/// Classify one ROI reading.
///
/// Both failure checks run before any positive score is awarded: the
/// darkness gate first, then redness dominance.
pub fn classify(means: &ChannelMeans, config: &QualityConfig) -> QualityReading {
    if means.brightness() < config.dark_threshold {
        return QualityReading {
            score: 0.0,
            feedback: FingerFeedback::TooDark,
        };
    }

    let red_dominant = means.red > means.green + config.redness_margin
        && means.red > means.blue + config.redness_margin;
    if !red_dominant {
        return QualityReading {
            score: 0.0,
            feedback: FingerFeedback::NoFingerDetected,
        };
    }

    let score = (means.red / config.max_channel * 100.0).min(100.0) as f32;
    QualityReading {
        score,
        feedback: FingerFeedback::Good,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn means(red: f64, green: f64, blue: f64) -> ChannelMeans {
        ChannelMeans { red, green, blue }
    }

    #[test]
    fn darkness_wins_regardless_of_channel_balance() {
        let config = QualityConfig::default();
        // Strongly red-dominant but nearly black.
        let reading = classify(&means(20.0, 2.0, 2.0), &config);
        assert_eq!(reading.feedback, FingerFeedback::TooDark);
        assert_eq!(reading.score, 0.0);
    }

    #[test]
    fn brightness_boundary_is_exclusive() {
        let config = QualityConfig::default();
        // brightness = 9.99.. stays dark; exactly 10 moves on to the
        // dominance check.
        let dark = classify(&means(19.0, 5.0, 5.9), &config);
        assert_eq!(dark.feedback, FingerFeedback::TooDark);

        let at_threshold = classify(&means(20.0, 5.0, 5.0), &config);
        assert_ne!(at_threshold.feedback, FingerFeedback::TooDark);
    }

    #[test]
    fn bright_but_not_red_means_no_finger() {
        let config = QualityConfig::default();
        let reading = classify(&means(120.0, 115.0, 118.0), &config);
        assert_eq!(reading.feedback, FingerFeedback::NoFingerDetected);
        assert_eq!(reading.score, 0.0);
    }

    #[test]
    fn dominance_requires_margin_over_both_channels() {
        let config = QualityConfig::default();
        // Beats green by the margin but not blue.
        let reading = classify(&means(100.0, 80.0, 95.0), &config);
        assert_eq!(reading.feedback, FingerFeedback::NoFingerDetected);
    }

    #[test]
    fn good_reading_scores_from_red_fraction() {
        let config = QualityConfig::default();
        let reading = classify(&means(204.0, 60.0, 50.0), &config);
        assert_eq!(reading.feedback, FingerFeedback::Good);
        assert!((reading.score - 80.0).abs() < 1e-4);
    }

    #[test]
    fn score_caps_at_one_hundred() {
        let config = QualityConfig {
            max_channel: 200.0,
            ..QualityConfig::default()
        };
        let reading = classify(&means(255.0, 10.0, 10.0), &config);
        assert_eq!(reading.score, 100.0);
    }

    #[test]
    fn score_is_monotonic_in_red() {
        let config = QualityConfig::default();
        let mut last = 0.0f32;
        for red in [60.0, 90.0, 150.0, 210.0, 255.0] {
            let reading = classify(&means(red, 20.0, 20.0), &config);
            assert_eq!(reading.feedback, FingerFeedback::Good);
            assert!(reading.score >= last);
            last = reading.score;
        }
    }
}
