//! Real-time photoplethysmographic (PPG) signal acquisition.
//!
//! Turns a live camera feed into a validated, timed sample buffer and hands
//! it to a remote vitals estimator. The pipeline is one cooperative loop:
//! pull the latest frame, crop a centered region of interest, compute mean
//! channel intensities, and classify signal quality for live feedback.
//! While a scan session is running, each tick also appends the red-channel
//! mean to the session buffer. On stop the effective sampling rate is
//! derived from the real elapsed time and sample count, never from the
//! nominal frame rate.
//!
//! Hosts provide the camera through [`device::FrameSource`], receive
//! [`session::ScanEvent`]s over a channel, and may draw the live waveform
//! through [`signal::TraceSink`]. The estimation algorithm itself runs on a
//! remote service behind [`estimation::VitalsEstimator`]; only its wire
//! contract lives here.

pub mod device;
pub mod error;
pub mod estimation;
pub mod metrics;
pub mod models;
pub mod quality;
pub mod roi;
pub mod session;
pub mod settings;
pub mod signal;

pub use device::{Frame, FrameSource, StreamHandle, TorchController, VideoInput};
pub use error::{DeviceError, EstimationError, RenderError, ScanError};
pub use estimation::{EstimationConfig, HttpEstimationClient, VitalsEstimator};
pub use models::{VitalsResult, VitalsStatus};
pub use quality::{FingerFeedback, QualityConfig, QualityReading};
pub use session::{ScanConfig, ScanController, ScanEvent, ScanPhase, ScanSnapshot};
pub use settings::{ConfigStore, PipelineConfig};
pub use signal::{SignalBuffer, Trace, TraceSink};
