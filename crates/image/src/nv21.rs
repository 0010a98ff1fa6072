use {crate::*, base::Vec2};

/// Semi-planar 4:2:0 frame: full-resolution luma followed by interleaved `V, U` pairs (NV21).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    pub size: Vec2<usize>,
    pub data: Vec<u8>,
}

impl PackedFrame {
    /// Length of an NV21 buffer for `size`: `w*h + 2*(w/2)*(h/2)`.
    pub fn expected_len(size: Vec2<usize>) -> usize {
        size.area() + 2 * size.halved().area()
    }

    pub fn luma(&self) -> &[u8] {
        &self.data[..self.size.area()]
    }

    /// Interleaved `V, U, V, U, ...` segment.
    pub fn chroma(&self) -> &[u8] {
        &self.data[self.size.area()..]
    }

    /// Reorder into I420: luma, then the U plane, then the V plane.
    pub fn to_i420(&self) -> Vec<u8> {
        let chroma = self.chroma();
        let mut out = Vec::with_capacity(self.data.len());
        out.extend_from_slice(self.luma());
        out.extend(chroma.iter().skip(1).step_by(2));
        out.extend(chroma.iter().step_by(2));
        out
    }

    /// `(u, v)` of the chroma sample covering pixel (`x`, `y`).
    pub fn chroma_at(&self, x: usize, y: usize) -> (u8, u8) {
        let i = self.size.area() + ((y / 2) * (self.size.x / 2) + x / 2) * 2;
        (self.data[i + 1], self.data[i])
    }
}

pub(crate) fn check_dimensions(size: Vec2<usize>) -> Result<(), String> {
    if size.x == 0 || size.y == 0 {
        return Err(format!("empty frame {size}"));
    }
    if !size.is_even() {
        return Err(format!("{size} cannot be subsampled 4:2:0"));
    }
    Ok(())
}

// A plane must hold `row_stride` bytes for every row it covers, the last one included.
fn check_plane(
    name: &str,
    plane: &Plane,
    samples_per_row: usize,
    rows: usize,
) -> Result<(), ImageError> {
    if plane.pixel_stride == 0 {
        return Err(ImageError::Conversion(format!(
            "{name} plane has zero pixel stride"
        )));
    }
    let row_span = (samples_per_row - 1) * plane.pixel_stride + 1;
    if plane.row_stride < row_span {
        return Err(ImageError::Conversion(format!(
            "{name} plane row stride {} is shorter than a row ({row_span} bytes)",
            plane.row_stride
        )));
    }
    let required = plane.row_stride * rows;
    if plane.size_bytes() < required {
        return Err(ImageError::Conversion(format!(
            "{name} plane holds {} bytes, {required} needed",
            plane.size_bytes()
        )));
    }
    Ok(())
}

/// Convert a planar Y/U/V 4:2:0 frame into packed NV21.
///
/// Every sample is addressed through the plane's row and pixel strides, so row
/// padding and interleaved chroma buffers are both handled. Chroma pairs are
/// written V first, then U.
///
/// # Errors
///
/// Returns `ImageError::Conversion` if the dimensions are zero or odd, the luma
/// plane is not contiguous within a row, or a plane holds fewer than
/// `row_stride * rows` bytes (`height` rows for luma, `(height + 1) / 2` for chroma).
pub fn convert(frame: &RawFrame) -> Result<PackedFrame, ImageError> {
    let size = frame.size;
    check_dimensions(size).map_err(ImageError::Conversion)?;
    if frame.y.pixel_stride != 1 {
        return Err(ImageError::Conversion(format!(
            "luma pixel stride must be 1, got {}",
            frame.y.pixel_stride
        )));
    }
    let chroma = size.halved();
    let chroma_rows = size.y.div_ceil(2);
    check_plane("Y", &frame.y, size.x, size.y)?;
    check_plane("U", &frame.u, chroma.x, chroma_rows)?;
    check_plane("V", &frame.v, chroma.x, chroma_rows)?;

    let mut data = Vec::with_capacity(PackedFrame::expected_len(size));

    // luma, one row at a time through the row stride
    for row in 0..size.y {
        let start = row * frame.y.row_stride;
        data.extend_from_slice(&frame.y.data[start..start + size.x]);
    }

    // chroma, V before U
    for row in 0..chroma.y {
        for col in 0..chroma.x {
            data.push(frame.v.data[frame.v.offset(col, row)]);
            data.push(frame.u.data[frame.u.offset(col, row)]);
        }
    }

    Ok(PackedFrame { size, data })
}

/// Expand NV21 into packed RGB8 using BT.601, one chroma pair per 2x2 luma block.
pub fn nv21_to_rgb(packed: &PackedFrame) -> Vec<u8> {
    let (width, height) = (packed.size.x, packed.size.y);
    let luma = packed.luma();
    let chroma = packed.chroma();
    let mut rgb = Vec::with_capacity(packed.size.area() * 3);

    for row in 0..height {
        let chroma_row = &chroma[(row / 2) * width..];
        for col in 0..width {
            let pair = (col / 2) * 2;
            let (v, u) = (chroma_row[pair], chroma_row[pair + 1]);
            let (r, g, b) = yuv_to_rgb(luma[row * width + col], u, v);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    rgb
}
