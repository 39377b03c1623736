use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::device::{FrameSource, StreamHandle, TorchController, VideoInput};
use crate::error::{DeviceError, ScanError};
use crate::estimation::VitalsEstimator;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::models::VitalsResult;
use crate::quality::QualityReading;
use crate::session::loop_worker::{preview_loop, PreviewContext};
use crate::session::state::{ScanPhase, ScanSnapshot, ScanState};
use crate::session::ScanConfig;
use crate::signal::TraceSink;

/// Events delivered to the host over the widget callback channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "type")]
pub enum ScanEvent {
    StateChanged {
        state: ScanSnapshot,
    },
    Heartbeat {
        quality: QualityReading,
        progress_percent: f32,
        elapsed_secs: f64,
        sample_count: usize,
    },
    /// Fired exactly once per successful finalize.
    SessionCompleted {
        session_id: String,
        result: VitalsResult,
    },
    /// Non-fatal device notice, e.g. auto-torch unavailable.
    TorchAdvisory {
        message: String,
    },
}

/// The stream/torch pairing that exclusively owns the camera for the
/// lifetime of the widget. Replaced as a unit on device switch so torch
/// capability is re-queried per stream acquisition.
pub(crate) struct ActiveDevice {
    pub stream: Arc<dyn StreamHandle>,
    pub torch: Arc<TorchController>,
}

impl ActiveDevice {
    fn open(source: &dyn FrameSource, device_id: Option<&str>) -> Result<Self, DeviceError> {
        let stream = source.open_stream(device_id)?;
        let torch = Arc::new(TorchController::new(Arc::clone(&stream)));
        Ok(Self { stream, torch })
    }
}

/// Orchestrates one acquisition widget instance: the always-on preview
/// loop plus the start/stop/cancel session lifecycle.
pub struct ScanController {
    state: Arc<Mutex<ScanState>>,
    device: Arc<Mutex<ActiveDevice>>,
    source: Arc<dyn FrameSource>,
    estimator: Arc<dyn VitalsEstimator>,
    events: mpsc::UnboundedSender<ScanEvent>,
    config: ScanConfig,
    metrics: PipelineMetrics,
    preview: Mutex<Option<JoinHandle<()>>>,
    cancel_token: CancellationToken,
    torn_down: AtomicBool,
}

impl ScanController {
    /// Open the camera stream and start the preview loop. The loop runs
    /// until [`teardown`](Self::teardown), regardless of session phase.
    pub fn attach(
        source: Arc<dyn FrameSource>,
        device_id: Option<&str>,
        estimator: Arc<dyn VitalsEstimator>,
        sink: Box<dyn TraceSink>,
        events: mpsc::UnboundedSender<ScanEvent>,
        config: ScanConfig,
    ) -> Result<Self, DeviceError> {
        let debug_mode = std::env::var("PULSECAM_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let device = Arc::new(Mutex::new(ActiveDevice::open(source.as_ref(), device_id)?));
        let state = Arc::new(Mutex::new(ScanState::new()));
        let metrics = PipelineMetrics::new();
        let cancel_token = CancellationToken::new();

        let ctx = PreviewContext {
            state: Arc::clone(&state),
            device: Arc::clone(&device),
            estimator: Arc::clone(&estimator),
            events: events.clone(),
            config: config.clone(),
            metrics: metrics.clone(),
            heartbeat_every_ticks: if debug_mode { 1 } else { 10 },
        };
        let handle = tokio::spawn(preview_loop(ctx, sink, cancel_token.clone()));

        Ok(Self {
            state,
            device,
            source,
            estimator,
            events,
            config,
            metrics,
            preview: Mutex::new(Some(handle)),
            cancel_token,
            torn_down: AtomicBool::new(false),
        })
    }

    pub async fn snapshot(&self) -> ScanSnapshot {
        self.state.lock().await.snapshot(Instant::now())
    }

    /// Buffered red-channel samples. Retained through Result and Error for
    /// inspection; cleared on cancel and on the next start.
    pub async fn signal(&self) -> Vec<f32> {
        self.state.lock().await.buffer.samples().to_vec()
    }

    pub async fn effective_sample_rate(&self) -> Option<f32> {
        self.state.lock().await.effective_fs
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot().await
    }

    pub fn list_video_inputs(&self) -> Result<Vec<VideoInput>, DeviceError> {
        self.source.enumerate_video_inputs()
    }

    /// Idle/Result/Error → Scanning. Clears the previous buffer, result,
    /// and error; records fresh anchors; attempts auto-torch best-effort.
    pub async fn start_scan(&self) -> Result<ScanSnapshot> {
        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let snapshot = {
            let mut state = self.state.lock().await;
            if state.is_active() {
                bail!("scan already active");
            }
            state.begin_session(session_id.clone(), started_at, Instant::now());
            state.snapshot(Instant::now())
        };

        self.metrics.reset().await;

        // Auto-torch must never block or fail the start; failure only
        // surfaces an advisory.
        let device = Arc::clone(&self.device);
        let events = self.events.clone();
        tokio::spawn(async move {
            let torch = Arc::clone(&device.lock().await.torch);
            if let Some(err) = torch.enable_best_effort() {
                let _ = events.send(ScanEvent::TorchAdvisory {
                    message: format!("auto light unavailable ({err}); use an external light source"),
                });
            }
        });

        info!("scan {session_id} started");
        let _ = self.events.send(ScanEvent::StateChanged {
            state: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Manual stop: Scanning → Finalizing, then the finalize routine runs
    /// to completion and the terminal snapshot is returned.
    pub async fn stop_scan(&self) -> Result<ScanSnapshot> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if state.phase != ScanPhase::Scanning {
                bail!("no active scan to stop");
            }
            let now = Instant::now();
            state.begin_finalizing(now);
            state.snapshot(now)
        };
        let _ = self.events.send(ScanEvent::StateChanged { state: snapshot });

        run_finalize(
            Arc::clone(&self.state),
            Arc::clone(&self.device),
            Arc::clone(&self.estimator),
            self.events.clone(),
            self.config.clone(),
        )
        .await;

        Ok(self.snapshot().await)
    }

    /// Scanning → Idle. Discards the buffer, turns the torch off, never
    /// finalizes. A no-op outside of Scanning, except while Finalizing:
    /// a resolving session cannot be cancelled.
    pub async fn cancel_scan(&self) -> Result<()> {
        let session_id = {
            let mut state = self.state.lock().await;
            match state.phase {
                ScanPhase::Scanning => {}
                ScanPhase::Finalizing => bail!("cannot cancel while a scan is finalizing"),
                ScanPhase::Idle | ScanPhase::Result | ScanPhase::Error => return Ok(()),
            }
            let session_id = state.session_id.clone();
            state.cancel();
            session_id
        };

        let torch = Arc::clone(&self.device.lock().await.torch);
        torch.force_off();

        info!("scan {} cancelled", session_id.as_deref().unwrap_or("?"));
        let _ = self.events.send(ScanEvent::StateChanged {
            state: self.snapshot().await,
        });
        Ok(())
    }

    /// User-invocable torch toggle. Device failures never touch session
    /// state. Returns the new torch state.
    pub async fn toggle_torch(&self) -> Result<bool, DeviceError> {
        let torch = Arc::clone(&self.device.lock().await.torch);
        torch.toggle()
    }

    /// Switch the active camera. Allowed only while idle; the new stream
    /// gets its own torch controller so capability is queried afresh.
    pub async fn switch_device(&self, device_id: Option<&str>) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.phase != ScanPhase::Idle {
                bail!("cameras can only be switched while idle");
            }
        }

        let next = ActiveDevice::open(self.source.as_ref(), device_id)?;
        let mut device = self.device.lock().await;
        device.torch.force_off();
        *device = next;
        info!("switched to video input {}", device.stream.video_input().id);
        Ok(())
    }

    /// Idempotent teardown invoked from every exit path: cancels the
    /// preview loop, awaits it, and leaves the torch off. The only path
    /// that stops frame sampling entirely.
    pub async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cancel_token.cancel();
        if let Some(handle) = self.preview.lock().await.take() {
            if let Err(err) = handle.await {
                error!("preview loop task failed to join: {err}");
            }
        }

        let torch = Arc::clone(&self.device.lock().await.torch);
        torch.force_off();

        self.state.lock().await.cancel();
        info!("acquisition pipeline torn down");
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        // Backstop for hosts that never called teardown.
        if !self.torn_down.swap(true, Ordering::SeqCst) {
            self.cancel_token.cancel();
            if let Ok(device) = self.device.try_lock() {
                device.torch.force_off();
            }
        }
    }
}

/// Resolve a Finalizing session to Result or Error. Callers transition
/// Scanning → Finalizing under the state lock first, which makes this run
/// at most once per session.
pub(crate) async fn run_finalize(
    state: Arc<Mutex<ScanState>>,
    device: Arc<Mutex<ActiveDevice>>,
    estimator: Arc<dyn VitalsEstimator>,
    events: mpsc::UnboundedSender<ScanEvent>,
    config: ScanConfig,
) {
    let (session_id, samples, effective_fs) = {
        let state = state.lock().await;
        if state.phase != ScanPhase::Finalizing {
            return;
        }
        (
            state.session_id.clone().unwrap_or_default(),
            state.buffer.samples().to_vec(),
            state.effective_fs,
        )
    };

    // Torch off on every termination path, before the network call.
    {
        let torch = Arc::clone(&device.lock().await.torch);
        torch.force_off();
    }

    let need = config.min_samples();
    let fs = match effective_fs {
        Some(fs) if samples.len() >= need && fs > 0.0 => fs,
        _ => {
            let message = ScanError::InsufficientData {
                got: samples.len(),
                need,
            }
            .to_string();
            warn!("session {session_id}: {message}");
            fail_session(&state, &events, message).await;
            return;
        }
    };

    info!(
        "session {session_id}: estimating from {} samples at {fs:.2} Hz",
        samples.len()
    );

    match estimator.estimate(&samples, fs).await {
        Ok(result) => {
            let snapshot = {
                let mut state = state.lock().await;
                state.complete(result.clone());
                state.snapshot(Instant::now())
            };
            info!(
                "session {session_id}: estimation complete (hr {}, spo2 {})",
                result.heart_rate, result.spo2
            );
            let _ = events.send(ScanEvent::StateChanged { state: snapshot });
            let _ = events.send(ScanEvent::SessionCompleted { session_id, result });
        }
        Err(err) => {
            error!("session {session_id}: estimation failed: {err}");
            fail_session(&state, &events, err.to_string()).await;
        }
    }
}

async fn fail_session(
    state: &Arc<Mutex<ScanState>>,
    events: &mpsc::UnboundedSender<ScanEvent>,
    message: String,
) {
    let snapshot = {
        let mut state = state.lock().await;
        state.fail(message);
        state.snapshot(Instant::now())
    };
    let _ = events.send(ScanEvent::StateChanged { state: snapshot });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::sim::{SyntheticCamera, SyntheticConfig};
    use crate::error::EstimationError;
    use crate::models::VitalsStatus;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct CountingEstimator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VitalsEstimator for CountingEstimator {
        async fn estimate(
            &self,
            _signal: &[f32],
            _fs: f32,
        ) -> Result<VitalsResult, EstimationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VitalsResult {
                heart_rate: 70,
                spo2: 97,
                confidence: 85,
                status: VitalsStatus::Normal,
            })
        }
    }

    /// A Finalizing state holding `samples` accepted over five seconds.
    fn finalizing_state(samples: usize) -> Arc<Mutex<ScanState>> {
        let start = Instant::now() - Duration::from_secs(5);
        let mut state = ScanState::new();
        state.begin_session("s".into(), Utc::now(), start);
        for _ in 0..samples {
            state.buffer.push(120.0);
        }
        state.begin_finalizing(Instant::now());
        Arc::new(Mutex::new(state))
    }

    fn device() -> Arc<Mutex<ActiveDevice>> {
        let camera = SyntheticCamera::new(SyntheticConfig::default());
        let device = ActiveDevice::open(&camera, None).unwrap();
        Arc::new(Mutex::new(device))
    }

    async fn finalize(samples: usize) -> (ScanPhase, usize) {
        let state = finalizing_state(samples);
        let estimator = Arc::new(CountingEstimator {
            calls: AtomicUsize::new(0),
        });
        let (events, _rx) = mpsc::unbounded_channel();

        run_finalize(
            Arc::clone(&state),
            device(),
            Arc::clone(&estimator) as Arc<dyn VitalsEstimator>,
            events,
            ScanConfig::default(),
        )
        .await;

        let phase = state.lock().await.phase;
        (phase, estimator.calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn below_the_minimum_fails_without_an_estimation_call() {
        let (phase, calls) = finalize(149).await;
        assert_eq!(phase, ScanPhase::Error);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn exactly_the_minimum_proceeds_to_estimation() {
        // nominal_fps * min_signal_secs = 150; the boundary is inclusive.
        let (phase, calls) = finalize(150).await;
        assert_eq!(phase, ScanPhase::Result);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn finalize_is_a_no_op_outside_finalizing() {
        let state = Arc::new(Mutex::new(ScanState::new()));
        let estimator = Arc::new(CountingEstimator {
            calls: AtomicUsize::new(0),
        });
        let (events, _rx) = mpsc::unbounded_channel();

        run_finalize(
            Arc::clone(&state),
            device(),
            Arc::clone(&estimator) as Arc<dyn VitalsEstimator>,
            events,
            ScanConfig::default(),
        )
        .await;

        assert_eq!(state.lock().await.phase, ScanPhase::Idle);
        assert_eq!(estimator.calls.load(Ordering::SeqCst), 0);
    }
}
