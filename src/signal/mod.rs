pub mod buffer;
pub mod waveform;

pub use buffer::SignalBuffer;
pub use waveform::{render_trace, NullSink, Trace, TraceSink};
