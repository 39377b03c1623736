use serde::Serialize;

use crate::error::RenderError;

/// Normalized scrolling trace of the most recent samples, oldest first.
/// Values are in 0..=1 with the y axis inverted for screen coordinates.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub points: Vec<f32>,
}

impl Trace {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Host-provided drawing surface. Draw failures are logged and swallowed
/// by the acquisition loop; they never reach session state.
pub trait TraceSink: Send {
    fn draw(&mut self, trace: &Trace) -> Result<(), RenderError>;
}

/// Sink for hosts that render nothing.
pub struct NullSink;

impl TraceSink for NullSink {
    fn draw(&mut self, _trace: &Trace) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Normalize the last `window` samples into a trace.
///
/// A flat window (max == min) is treated as range 1 so the trace stays
/// defined instead of dividing by zero.
pub fn render_trace(samples: &[f32], window: usize) -> Trace {
    if samples.is_empty() || window == 0 {
        return Trace::default();
    }

    let start = samples.len().saturating_sub(window);
    let recent = &samples[start..];

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in recent {
        min = min.min(value);
        max = max.max(value);
    }

    let range = if max > min { max - min } else { 1.0 };
    let points = recent
        .iter()
        .map(|&value| 1.0 - (value - min) / range)
        .collect();

    Trace { points }
}
