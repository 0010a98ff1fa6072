use {
    crate::*,
    base::Vec2,
    crates_image::ImageFormat,
};

/// JPEG quality used on the wire unless configured otherwise.
pub const DEFAULT_QUALITY: u8 = 60;

/// Compressed JPEG bytes of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
}

/// Decoded RGB8 image, rows packed without padding.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.size.x + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Per-channel mean over the whole image.
    pub fn mean(&self) -> [f64; 3] {
        let mut sum = [0u64; 3];
        for px in self.data.chunks_exact(3) {
            for c in 0..3 {
                sum[c] += px[c] as u64;
            }
        }
        let n = self.size.area().max(1) as f64;
        sum.map(|s| s as f64 / n)
    }
}

/// Compress an NV21 frame into a baseline JPEG with 4:2:0 chroma subsampling.
///
/// Deterministic for a fixed frame and quality.
///
/// # Errors
///
/// Returns `ImageError::Encoding` if the dimensions are zero or odd, the buffer
/// length does not match the dimensions, or `quality` is outside 1..=100.
pub fn encode_jpeg(packed: &PackedFrame, quality: u8) -> Result<EncodedFrame, ImageError> {
    check_dimensions(packed.size).map_err(ImageError::Encoding)?;
    if !(1..=100).contains(&quality) {
        return Err(ImageError::Encoding(format!(
            "quality {quality} outside 1..=100"
        )));
    }
    let expected = PackedFrame::expected_len(packed.size);
    if packed.data.len() != expected {
        return Err(ImageError::Encoding(format!(
            "{} frame needs {expected} bytes, got {}",
            packed.size,
            packed.data.len()
        )));
    }

    // 4:2:0 planar input keeps the chroma subsampled in the JPEG itself
    let i420 = packed.to_i420();
    let image = turbojpeg::YuvImage {
        pixels: i420.as_slice(),
        width: packed.size.x,
        align: 1,
        height: packed.size.y,
        subsamp: turbojpeg::Subsamp::Sub2x2,
    };
    let buffer = turbojpeg::compress_yuv(image, i32::from(quality))
        .map_err(|e| ImageError::Encoding(e.to_string()))?
        .to_vec();

    Ok(EncodedFrame {
        size: packed.size,
        data: buffer,
    })
}

/// Decode JPEG bytes into RGB8.
pub fn decode_jpeg(data: &[u8]) -> Result<RgbImage, ImageError> {
    let decoded = crates_image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(RgbImage {
        size: Vec2::new(width as usize, height as usize),
        data: rgb.into_raw(),
    })
}
