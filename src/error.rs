//! Error taxonomy for the acquisition pipeline.
//!
//! Device and render failures are recoverable and stay local to the tick
//! that hit them; insufficient-data and estimation failures move the
//! session into its `Error` phase and require a fresh start.

use thiserror::Error;

/// Camera enumeration, stream, or torch failure.
///
/// Never fatal for session start/stop; surfaced as advisory text.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no video input device available")]
    NoDevice,

    #[error("video input {0} not found")]
    DeviceNotFound(String),

    #[error("video stream is closed")]
    StreamClosed,

    #[error("torch is not supported on this device")]
    TorchUnsupported,

    #[error("device backend error: {0}")]
    Backend(String),
}

/// Failure of the single outbound estimation call.
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("estimation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("estimation service returned HTTP {0}")]
    Status(u16),

    /// Server answered `success = false`; the message is surfaced verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("estimation service returned a malformed response")]
    MalformedResponse,
}

/// Session-level failures raised while finalizing a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Raised before any network call when the buffer holds fewer samples
    /// than the configured minimum. The estimator is never invoked.
    #[error("insufficient signal data: {got} samples collected, {need} required")]
    InsufficientData { got: usize, need: usize },

    #[error(transparent)]
    Estimation(#[from] EstimationError),
}

/// Visualization-only failure. Swallowed at the loop, never propagated
/// to session state.
#[derive(Debug, Error)]
#[error("waveform render failed: {0}")]
pub struct RenderError(pub String);
