//! Camera device boundary.
//!
//! The pipeline never owns the camera; it reads frames and requests torch
//! toggles through these traits. Concrete backends live with the host
//! (browser media stack, V4L2, AVFoundation); `sim` provides a synthetic
//! source for tests and demos.

pub mod sim;
pub mod torch;

use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

pub use torch::TorchController;

/// One enumerable camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub id: String,
    pub label: String,
}

/// A decoded RGB video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Device enumeration and stream acquisition.
pub trait FrameSource: Send + Sync {
    fn enumerate_video_inputs(&self) -> Result<Vec<VideoInput>, DeviceError>;

    /// Open a live stream on the given device, or the default device when
    /// `device_id` is `None`.
    fn open_stream(&self, device_id: Option<&str>) -> Result<Arc<dyn StreamHandle>, DeviceError>;
}

/// An open camera stream.
///
/// `latest_frame` returns `Ok(None)` while the stream has no decodable
/// frame yet; callers skip that tick and reschedule rather than fail.
pub trait StreamHandle: Send + Sync + std::fmt::Debug {
    fn latest_frame(&self) -> Result<Option<Frame>, DeviceError>;

    /// Queried lazily from the active stream, never assumed.
    fn query_torch_capability(&self) -> Result<bool, DeviceError>;

    fn set_torch(&self, on: bool) -> Result<(), DeviceError>;

    fn video_input(&self) -> VideoInput;
}
