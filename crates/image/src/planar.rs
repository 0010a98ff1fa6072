use base::Vec2;

// filler for row padding and interleave gaps, so stride mistakes show up as wrong pixels
const PADDING_BYTE: u8 = 0xEE;

/// One color channel of a planar frame, indexed through its strides.
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Byte offset of sample (`col`, `row`) relative to the start of the plane.
    pub fn offset(&self, col: usize, row: usize) -> usize {
        row * self.row_stride + col * self.pixel_stride
    }

    pub fn to_owned_plane(&self) -> OwnedPlane {
        OwnedPlane {
            data: self.data.to_vec(),
            row_stride: self.row_stride,
            pixel_stride: self.pixel_stride,
        }
    }
}

/// Borrowed view over a Y/U/V 4:2:0 frame as delivered by a camera.
///
/// The view is only valid while the camera lends its buffer, so anything that
/// must outlive the capture callback has to go through [`RawFrame::to_owned_frame`].
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub size: Vec2<usize>,
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl RawFrame<'_> {
    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    /// Copy the plane bytes verbatim, strides included.
    pub fn to_owned_frame(&self) -> OwnedFrame {
        OwnedFrame {
            size: self.size,
            y: self.y.to_owned_plane(),
            u: self.u.to_owned_plane(),
            v: self.v.to_owned_plane(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPlane {
    pub data: Vec<u8>,
    pub row_stride: usize,
    pub pixel_stride: usize,
}

impl OwnedPlane {
    pub fn as_plane(&self) -> Plane<'_> {
        Plane::new(&self.data, self.row_stride, self.pixel_stride)
    }
}

/// Owned copy of a [`RawFrame`] that can cross threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    pub size: Vec2<usize>,
    pub y: OwnedPlane,
    pub u: OwnedPlane,
    pub v: OwnedPlane,
}

impl OwnedFrame {
    pub fn as_raw(&self) -> RawFrame<'_> {
        RawFrame {
            size: self.size,
            y: self.y.as_plane(),
            u: self.u.as_plane(),
            v: self.v.as_plane(),
        }
    }

    /// Build a frame with the given memory layout from per-pixel generators.
    ///
    /// `luma(x, y)` is called for every pixel, `chroma(cx, cy)` returns `(u, v)` for
    /// every chroma sample of the half-resolution grid.
    pub fn from_fn(
        size: Vec2<usize>,
        layout: PlaneLayout,
        luma: impl Fn(usize, usize) -> u8,
        chroma: impl Fn(usize, usize) -> (u8, u8),
    ) -> Self {
        let chroma_size = Vec2::new(size.x.div_ceil(2), size.y.div_ceil(2));
        let y_stride = size.x + layout.luma_padding;
        let c_pixel_stride = layout.chroma_pixel_stride.max(1);
        let c_stride = chroma_size.x * c_pixel_stride + layout.chroma_padding;

        let mut y = vec![PADDING_BYTE; y_stride * size.y];
        for row in 0..size.y {
            for col in 0..size.x {
                y[row * y_stride + col] = luma(col, row);
            }
        }

        let mut u = vec![PADDING_BYTE; c_stride * chroma_size.y];
        let mut v = vec![PADDING_BYTE; c_stride * chroma_size.y];
        for row in 0..chroma_size.y {
            for col in 0..chroma_size.x {
                let (cu, cv) = chroma(col, row);
                let offset = row * c_stride + col * c_pixel_stride;
                u[offset] = cu;
                v[offset] = cv;
            }
        }

        Self {
            size,
            y: OwnedPlane {
                data: y,
                row_stride: y_stride,
                pixel_stride: 1,
            },
            u: OwnedPlane {
                data: u,
                row_stride: c_stride,
                pixel_stride: c_pixel_stride,
            },
            v: OwnedPlane {
                data: v,
                row_stride: c_stride,
                pixel_stride: c_pixel_stride,
            },
        }
    }

    /// Frame with constant Y, U and V.
    pub fn uniform(size: Vec2<usize>, layout: PlaneLayout, y: u8, u: u8, v: u8) -> Self {
        Self::from_fn(size, layout, |_, _| y, |_, _| (u, v))
    }
}

/// Memory layout used when synthesizing frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Extra bytes at the end of every luma row.
    pub luma_padding: usize,
    /// Extra bytes at the end of every chroma row.
    pub chroma_padding: usize,
    /// Distance between chroma samples; 1 for I420, 2 for interleaved chroma.
    pub chroma_pixel_stride: usize,
}

impl Default for PlaneLayout {
    fn default() -> Self {
        Self::tight()
    }
}

impl PlaneLayout {
    /// I420: no padding, chroma samples adjacent.
    pub fn tight() -> Self {
        Self {
            luma_padding: 0,
            chroma_padding: 0,
            chroma_pixel_stride: 1,
        }
    }

    /// Padded rows with interleaved chroma, the common layout of mobile sensors.
    pub fn padded_interleaved(padding: usize) -> Self {
        Self {
            luma_padding: padding,
            chroma_padding: padding,
            chroma_pixel_stride: 2,
        }
    }
}
