//! Camera capture for the overlay.
//!
//! A [`CaptureSession`] binds one sensor at a time on a dedicated capture
//! thread and hands every frame to a callback as a borrowed
//! [`image::RawFrame`]. The camera buffer behind the frame is released as soon
//! as the callback returns.

mod error;
mod lease;
mod sensor;
pub mod videoin;

pub use error::VideoError;
pub use lease::FrameLease;
pub use sensor::Sensor;
pub use videoin::{
    CAPTURE_TIMEOUT_MS, CameraDevice, CaptureBackend, CaptureFormat, CaptureSession,
    synthetic::{CaptureCounters, SyntheticConfig},
};

#[cfg(feature = "v4l2")]
pub use videoin::v4l2::V4l2Config;
