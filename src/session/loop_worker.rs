use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::metrics::{PipelineMetrics, TickMetrics};
use crate::quality::classify;
use crate::roi;
use crate::session::controller::{run_finalize, ActiveDevice, ScanEvent};
use crate::session::state::{ScanPhase, ScanState};
use crate::session::ScanConfig;
use crate::signal::{render_trace, TraceSink};

/// Shared handles the preview loop needs each tick.
#[derive(Clone)]
pub(crate) struct PreviewContext {
    pub state: Arc<Mutex<ScanState>>,
    pub device: Arc<Mutex<ActiveDevice>>,
    pub estimator: Arc<dyn crate::estimation::VitalsEstimator>,
    pub events: mpsc::UnboundedSender<ScanEvent>,
    pub config: ScanConfig,
    pub metrics: PipelineMetrics,
    pub heartbeat_every_ticks: u32,
}

/// Display-cadence loop driving the whole pipeline.
///
/// Runs from attach to teardown in every phase so the user always sees
/// live signal quality; only buffer append, progress, and auto-stop are
/// gated on Scanning. Cancel and stop leave it running, teardown ends it.
pub(crate) async fn preview_loop(
    ctx: PreviewContext,
    mut sink: Box<dyn TraceSink>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(ctx.config.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks: u32 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ticks = ticks.wrapping_add(1);
                run_tick(&ctx, sink.as_mut(), ticks).await;
            }
            _ = cancel_token.cancelled() => {
                info!("preview loop shutting down");
                break;
            }
        }
    }
}

async fn run_tick(ctx: &PreviewContext, sink: &mut dyn TraceSink, ticks: u32) {
    let timestamp = Utc::now();
    let acquire_start = Instant::now();

    let stream = ctx.device.lock().await.stream.clone();
    let frame = match stream.latest_frame() {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            // Stream not decodable yet; reschedule without doing work.
            record_skip(ctx, timestamp, acquire_start).await;
            return;
        }
        Err(err) => {
            warn!("frame acquisition failed: {err}");
            record_skip(ctx, timestamp, acquire_start).await;
            return;
        }
    };
    let acquire_ms = acquire_start.elapsed().as_millis() as u64;

    let classify_start = Instant::now();
    let Some(means) = roi::channel_means(&frame, ctx.config.roi_edge) else {
        record_skip(ctx, timestamp, acquire_start).await;
        return;
    };
    let quality = classify(&means, &ctx.config.quality);
    let classify_ms = classify_start.elapsed().as_millis() as u64;

    let now = Instant::now();
    let target_secs = ctx.config.target_duration_secs as f64;

    let (trace, heartbeat, accepted, finalize_snapshot) = {
        let mut state = ctx.state.lock().await;
        state.quality = quality;

        let mut accepted = false;
        let mut finalize_snapshot = None;
        if state.phase == ScanPhase::Scanning {
            state.accept_sample(means.red as f32, now, target_secs);
            accepted = true;

            // Auto-stop purely on elapsed wall-clock time, never on a
            // sample count.
            if target_secs > 0.0 && state.elapsed_secs(now) >= target_secs {
                state.begin_finalizing(now);
                finalize_snapshot = Some(state.snapshot(now));
            }
        }

        let trace = render_trace(state.buffer.samples(), ctx.config.waveform_window);
        let heartbeat = ScanEvent::Heartbeat {
            quality,
            progress_percent: state.progress_percent,
            elapsed_secs: state.elapsed_secs(now),
            sample_count: state.buffer.len(),
        };
        (trace, heartbeat, accepted, finalize_snapshot)
    };

    if let Err(err) = sink.draw(&trace) {
        // Visualization failures never reach session state.
        warn!("waveform render failed (ignored): {err}");
        ctx.metrics.record_render_failure().await;
    }

    if ticks % ctx.heartbeat_every_ticks.max(1) == 0 {
        let _ = ctx.events.send(heartbeat);
    }

    ctx.metrics
        .record_tick(TickMetrics {
            timestamp,
            acquire_ms,
            classify_ms,
            frame_skipped: false,
            sample_accepted: accepted,
            quality_score: Some(quality.score),
        })
        .await;

    if let Some(snapshot) = finalize_snapshot {
        info!(
            "target duration reached after {} samples; finalizing",
            snapshot.sample_count
        );
        let _ = ctx.events.send(ScanEvent::StateChanged { state: snapshot });

        // Finalize on its own task so the preview keeps running while the
        // estimation call is in flight.
        let ctx = ctx.clone();
        tokio::spawn(async move {
            run_finalize(
                ctx.state,
                ctx.device,
                ctx.estimator,
                ctx.events,
                ctx.config,
            )
            .await;
        });
    }
}

async fn record_skip(ctx: &PreviewContext, timestamp: chrono::DateTime<Utc>, start: Instant) {
    ctx.metrics
        .record_tick(TickMetrics {
            timestamp,
            acquire_ms: start.elapsed().as_millis() as u64,
            classify_ms: 0,
            frame_skipped: true,
            sample_accepted: false,
            quality_score: None,
        })
        .await;
}
