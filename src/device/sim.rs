//! Synthetic camera source.
//!
//! Generates finger-occlusion-like frames: a red-dominant field with a
//! sinusoidal pulsatile component and sensor noise. Used by the test suite
//! and by hosts that want to exercise the pipeline without camera hardware.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use rand::Rng;

use super::{Frame, FrameSource, StreamHandle, VideoInput};
use crate::error::DeviceError;

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Number of initial pulls that report no decodable frame yet.
    pub warmup_frames: u64,
    pub base_red: f64,
    pub base_green: f64,
    pub base_blue: f64,
    /// Peak deviation of the pulsatile red component.
    pub pulse_amplitude: f64,
    pub pulse_hz: f64,
    /// Uniform noise amplitude added to every channel.
    pub noise: f64,
    pub torch_capable: bool,
    /// Pulse phase advances as if frames were pulled at this rate.
    pub nominal_fps: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 120,
            warmup_frames: 0,
            base_red: 180.0,
            base_green: 60.0,
            base_blue: 50.0,
            pulse_amplitude: 12.0,
            pulse_hz: 1.2,
            noise: 1.5,
            torch_capable: true,
            nominal_fps: 30.0,
        }
    }
}

#[derive(Default, Debug)]
struct SimStats {
    frames_served: AtomicU64,
    torch_queries: AtomicU64,
    torch_on: AtomicBool,
}

pub struct SyntheticCamera {
    config: SyntheticConfig,
    stats: Arc<SimStats>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            stats: Arc::new(SimStats::default()),
        }
    }

    pub fn video_input() -> VideoInput {
        VideoInput {
            id: "sim-0".to_string(),
            label: "Synthetic Camera".to_string(),
        }
    }

    pub fn torch_capability_queries(&self) -> u64 {
        self.stats.torch_queries.load(Ordering::SeqCst)
    }

    pub fn torch_is_on(&self) -> bool {
        self.stats.torch_on.load(Ordering::SeqCst)
    }
}

impl FrameSource for SyntheticCamera {
    fn enumerate_video_inputs(&self) -> Result<Vec<VideoInput>, DeviceError> {
        Ok(vec![Self::video_input()])
    }

    fn open_stream(&self, device_id: Option<&str>) -> Result<Arc<dyn StreamHandle>, DeviceError> {
        if let Some(id) = device_id {
            if id != Self::video_input().id {
                return Err(DeviceError::DeviceNotFound(id.to_string()));
            }
        }
        Ok(Arc::new(SyntheticStream {
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }))
    }
}

#[derive(Debug)]
pub struct SyntheticStream {
    config: SyntheticConfig,
    stats: Arc<SimStats>,
}

impl SyntheticStream {
    fn channel_value(&self, base: f64, pulse: f64) -> u8 {
        let noise = if self.config.noise > 0.0 {
            rand::thread_rng().gen_range(-self.config.noise..=self.config.noise)
        } else {
            0.0
        };
        (base + pulse + noise).clamp(0.0, 255.0).round() as u8
    }
}

impl StreamHandle for SyntheticStream {
    fn latest_frame(&self) -> Result<Option<Frame>, DeviceError> {
        let served = self.stats.frames_served.fetch_add(1, Ordering::SeqCst);
        if served < self.config.warmup_frames {
            return Ok(None);
        }

        let t = (served - self.config.warmup_frames) as f64 / self.config.nominal_fps.max(1.0);
        let pulse =
            self.config.pulse_amplitude * (2.0 * std::f64::consts::PI * self.config.pulse_hz * t).sin();

        let pixel = Rgb([
            self.channel_value(self.config.base_red, pulse),
            self.channel_value(self.config.base_green, 0.0),
            self.channel_value(self.config.base_blue, 0.0),
        ]);
        let pixels = RgbImage::from_pixel(self.config.width, self.config.height, pixel);
        Ok(Some(Frame::new(pixels)))
    }

    fn query_torch_capability(&self) -> Result<bool, DeviceError> {
        self.stats.torch_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.config.torch_capable)
    }

    fn set_torch(&self, on: bool) -> Result<(), DeviceError> {
        if !self.config.torch_capable {
            return Err(DeviceError::TorchUnsupported);
        }
        self.stats.torch_on.store(on, Ordering::SeqCst);
        Ok(())
    }

    fn video_input(&self) -> VideoInput {
        SyntheticCamera::video_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_frames_are_not_decodable() {
        let camera = SyntheticCamera::new(SyntheticConfig {
            warmup_frames: 2,
            ..SyntheticConfig::default()
        });
        let stream = camera.open_stream(None).unwrap();

        assert!(stream.latest_frame().unwrap().is_none());
        assert!(stream.latest_frame().unwrap().is_none());
        assert!(stream.latest_frame().unwrap().is_some());
    }

    #[test]
    fn frames_are_red_dominant() {
        let camera = SyntheticCamera::new(SyntheticConfig {
            noise: 0.0,
            ..SyntheticConfig::default()
        });
        let stream = camera.open_stream(None).unwrap();
        let frame = stream.latest_frame().unwrap().unwrap();
        let pixel = frame.pixels().get_pixel(0, 0);
        assert!(pixel[0] > pixel[1]);
        assert!(pixel[0] > pixel[2]);
    }

    #[test]
    fn unknown_device_id_is_rejected() {
        let camera = SyntheticCamera::new(SyntheticConfig::default());
        let err = camera.open_stream(Some("usb-7")).unwrap_err();
        assert!(matches!(err, DeviceError::DeviceNotFound(id) if id == "usb-7"));
    }
}
