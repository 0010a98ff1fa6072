//! Pixel conversion and JPEG compression for camera frames.
//!
//! Frames arrive as planar Y/U/V 4:2:0 views ([`RawFrame`]) with arbitrary row
//! and pixel strides, are packed into NV21 ([`PackedFrame`]) and compressed
//! into JPEG ([`EncodedFrame`]).

mod error;
mod jpeg;
mod nv21;
mod pixelformat;
mod planar;

pub use error::ImageError;
pub use jpeg::{DEFAULT_QUALITY, EncodedFrame, RgbImage, decode_jpeg, encode_jpeg};
pub use nv21::{PackedFrame, convert, nv21_to_rgb};
pub use planar::{OwnedFrame, OwnedPlane, Plane, PlaneLayout, RawFrame};

pub(crate) use nv21::check_dimensions;
pub(crate) use pixelformat::yuv_to_rgb;

/// Convert and compress an owned frame.
///
/// The CPU-bound work runs on tokio's blocking thread pool.
///
/// # Errors
///
/// Returns `ImageError::Conversion` or `ImageError::Encoding` from the failing stage.
pub async fn transcode(frame: OwnedFrame, quality: u8) -> Result<EncodedFrame, ImageError> {
    tokio::task::spawn_blocking(move || {
        let packed = convert(&frame.as_raw())?;
        encode_jpeg(&packed, quality)
    })
    .await
    .map_err(|e| ImageError::Encoding(e.to_string()))?
}
