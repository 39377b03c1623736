use serde::{Deserialize, Serialize};

/// Overall classification attached to an estimation result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VitalsStatus {
    Normal,
    Abnormal,
}

impl VitalsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalsStatus::Normal => "normal",
            VitalsStatus::Abnormal => "abnormal",
        }
    }
}

/// Vitals produced by the remote estimator from one finalized scan.
///
/// Owned by the session once attached; immutable thereafter and replaced
/// wholesale by the next successful finalize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VitalsResult {
    pub heart_rate: i32,
    pub spo2: i32,
    /// Estimator confidence, 0-100.
    pub confidence: i32,
    pub status: VitalsStatus,
}

impl VitalsResult {
    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= 80
    }
}
