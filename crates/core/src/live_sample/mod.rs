//! Live plate sample: the unsaved weight triple pushed over telemetry.

mod live_sample_buffer;
mod live_sample_model;

pub use live_sample_buffer::LiveSampleBuffer;
pub use live_sample_model::{parse_sample_payload, LiveSample};
