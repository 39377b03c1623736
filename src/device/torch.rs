use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

use super::StreamHandle;
use crate::error::DeviceError;

/// Torch negotiation for one stream acquisition.
///
/// Capability is queried once per stream and cached; every toggle is
/// fallible with a narrow error. `force_off` swallows failures because
/// device teardown races are expected.
pub struct TorchController {
    stream: Arc<dyn StreamHandle>,
    capability: Mutex<Option<bool>>,
    on: AtomicBool,
}

impl TorchController {
    pub fn new(stream: Arc<dyn StreamHandle>) -> Self {
        Self {
            stream,
            capability: Mutex::new(None),
            on: AtomicBool::new(false),
        }
    }

    /// Whether the active stream supports a torch. First call queries the
    /// device; later calls return the cached answer.
    pub fn capability(&self) -> Result<bool, DeviceError> {
        let mut cached = self.capability.lock().unwrap();
        if let Some(capable) = *cached {
            return Ok(capable);
        }
        let capable = self.stream.query_torch_capability()?;
        *cached = Some(capable);
        Ok(capable)
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn set(&self, on: bool) -> Result<(), DeviceError> {
        if !self.capability()? {
            return Err(DeviceError::TorchUnsupported);
        }
        self.stream.set_torch(on)?;
        self.on.store(on, Ordering::SeqCst);
        Ok(())
    }

    /// User-invocable toggle. Returns the new torch state.
    pub fn toggle(&self) -> Result<bool, DeviceError> {
        let next = !self.is_on();
        self.set(next)?;
        Ok(next)
    }

    /// Auto-torch at scan start. Failure must not block the start; the
    /// caller only surfaces an advisory.
    pub fn enable_best_effort(&self) -> Option<DeviceError> {
        if self.is_on() {
            return None;
        }
        match self.set(true) {
            Ok(()) => None,
            Err(err) => {
                warn!("auto-torch failed: {err}");
                Some(err)
            }
        }
    }

    /// Best-effort torch off for every termination path.
    pub fn force_off(&self) {
        if let Err(err) = self.stream.set_torch(false) {
            warn!("torch off failed during teardown: {err}");
        }
        self.on.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sim::{SyntheticCamera, SyntheticConfig};
    use crate::device::FrameSource;

    fn stream_with_torch(capable: bool) -> Arc<dyn StreamHandle> {
        let camera = SyntheticCamera::new(SyntheticConfig {
            torch_capable: capable,
            ..SyntheticConfig::default()
        });
        camera.open_stream(None).unwrap()
    }

    #[test]
    fn capability_is_queried_once() {
        let camera = SyntheticCamera::new(SyntheticConfig::default());
        let stream = camera.open_stream(None).unwrap();
        let torch = TorchController::new(stream);

        assert!(torch.capability().unwrap());
        assert!(torch.capability().unwrap());
        assert_eq!(camera.torch_capability_queries(), 1);
    }

    #[test]
    fn toggle_without_capability_is_a_device_error() {
        let torch = TorchController::new(stream_with_torch(false));
        let err = torch.toggle().unwrap_err();
        assert!(matches!(err, DeviceError::TorchUnsupported));
        assert!(!torch.is_on());
    }

    #[test]
    fn toggle_flips_state() {
        let torch = TorchController::new(stream_with_torch(true));
        assert!(torch.toggle().unwrap());
        assert!(torch.is_on());
        assert!(!torch.toggle().unwrap());
        assert!(!torch.is_on());
    }

    #[test]
    fn force_off_swallows_failures() {
        let torch = TorchController::new(stream_with_torch(false));
        torch.force_off();
        assert!(!torch.is_on());
    }
}
