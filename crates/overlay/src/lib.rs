//! Camera overlay pipeline.
//!
//! Frames flow from a [`video::CaptureSession`] through a single-slot
//! [`FrameGate`] into a worker task that converts them to NV21, compresses
//! them to JPEG and hands them to a [`com::Connection`]. Labels coming back
//! from the backend are trimmed and passed to the display callback.

pub mod config;
mod error;
mod gate;
mod labels;
mod pipeline;
mod stats;

pub use config::OverlayConfig;
pub use error::OverlayError;
pub use gate::{Admission, FrameGate};
pub use labels::{trim_label, trim_labels};
pub use pipeline::{CapturedFrame, LabelCallback, Pipeline};
pub use stats::{PipelineStats, StatsSnapshot};
