use {
    base::Vec2,
    image::{ImageError, OwnedFrame, PackedFrame, Plane, PlaneLayout, RawFrame, convert},
};

fn gradient(size: Vec2<usize>, layout: PlaneLayout) -> OwnedFrame {
    OwnedFrame::from_fn(
        size,
        layout,
        |x, y| ((x * 7 + y * 13) % 256) as u8,
        |cx, cy| (((cx * 3 + cy) % 256) as u8, ((cx + cy * 5 + 100) % 256) as u8),
    )
}

#[test]
fn test_packed_length_for_even_sizes() {
    for (w, h) in [(2, 2), (4, 2), (6, 10), (480, 640), (640, 480)] {
        let frame = gradient(Vec2::new(w, h), PlaneLayout::tight());
        let packed = convert(&frame.as_raw()).expect("convert");
        assert_eq!(packed.data.len(), w * h + w * h / 2, "{w}x{h}");
        assert_eq!(packed.data.len(), PackedFrame::expected_len(Vec2::new(w, h)));
    }
}

#[test]
fn test_chroma_is_v_before_u() {
    let frame = OwnedFrame::uniform(Vec2::new(8, 6), PlaneLayout::tight(), 50, 10, 20);
    let packed = convert(&frame.as_raw()).expect("convert");

    assert!(packed.luma().iter().all(|&y| y == 50));
    for (i, &b) in packed.chroma().iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(b, 20, "even chroma byte {i} should be V");
        } else {
            assert_eq!(b, 10, "odd chroma byte {i} should be U");
        }
    }
}

#[test]
fn test_stride_robustness() {
    let size = Vec2::new(16, 12);
    let tight = gradient(size, PlaneLayout::tight());
    let padded = gradient(size, PlaneLayout::padded_interleaved(24));
    let wide = gradient(
        size,
        PlaneLayout {
            luma_padding: 3,
            chroma_padding: 5,
            chroma_pixel_stride: 4,
        },
    );

    let expected = convert(&tight.as_raw()).expect("tight");
    assert_eq!(convert(&padded.as_raw()).expect("padded"), expected);
    assert_eq!(convert(&wide.as_raw()).expect("wide"), expected);
}

#[test]
fn test_chroma_sample_positions() {
    let size = Vec2::new(4, 4);
    let frame = OwnedFrame::from_fn(
        size,
        PlaneLayout::padded_interleaved(2),
        |_, _| 0,
        |cx, cy| ((10 * cy + cx) as u8, (100 + 10 * cy + cx) as u8),
    );
    let packed = convert(&frame.as_raw()).expect("convert");

    assert_eq!(packed.chroma(), &[100, 0, 101, 1, 110, 10, 111, 11]);
    assert_eq!(packed.chroma_at(3, 3), (11, 111));
}

#[test]
fn test_interleaved_planes_sharing_one_buffer() {
    // U and V read one VU-interleaved buffer, offset by one byte
    let size = Vec2::new(4, 2);
    let y = [1u8; 8];
    let vu = [20u8, 10, 21, 11, 0xEE];
    let frame = RawFrame {
        size,
        y: Plane::new(&y, 4, 1),
        u: Plane::new(&vu[1..], 4, 2),
        v: Plane::new(&vu[..4], 4, 2),
    };
    let packed = convert(&frame).expect("convert");
    assert_eq!(packed.chroma(), &[20, 10, 21, 11]);
}

#[test]
fn test_rejects_unpadded_last_chroma_row() {
    // 4x4 needs two chroma rows of 4 bytes each, 6 bytes only reach the last sample
    let size = Vec2::new(4, 4);
    let y = [1u8; 16];
    let u = [10u8; 6];
    let v = [20u8; 6];
    let frame = RawFrame {
        size,
        y: Plane::new(&y, 4, 1),
        u: Plane::new(&u, 4, 2),
        v: Plane::new(&v, 4, 2),
    };
    assert!(matches!(convert(&frame), Err(ImageError::Conversion(_))));
}

#[test]
fn test_rejects_zero_and_odd_dimensions() {
    for (w, h) in [(0, 4), (4, 0), (3, 4), (4, 5)] {
        let frame = OwnedFrame::uniform(Vec2::new(w, h), PlaneLayout::tight(), 0, 0, 0);
        let result = convert(&frame.as_raw());
        assert!(
            matches!(result, Err(ImageError::Conversion(_))),
            "{w}x{h} should be rejected"
        );
    }
}

#[test]
fn test_rejects_short_luma() {
    let frame = OwnedFrame::uniform(Vec2::new(4, 4), PlaneLayout::tight(), 0, 0, 0);
    let mut raw = frame.as_raw();
    raw.y.data = &frame.y.data[..15];
    assert!(matches!(convert(&raw), Err(ImageError::Conversion(_))));
}

#[test]
fn test_rejects_short_chroma() {
    let frame = OwnedFrame::uniform(Vec2::new(8, 8), PlaneLayout::padded_interleaved(4), 0, 0, 0);
    let mut raw = frame.as_raw();
    let needed = raw.v.row_stride * 4;
    raw.v.data = &frame.v.data[..needed - 1];
    assert!(matches!(convert(&raw), Err(ImageError::Conversion(_))));

    raw.v.data = &frame.v.data[..needed];
    assert!(convert(&raw).is_ok());
}

#[test]
fn test_rejects_row_stride_shorter_than_row() {
    let frame = OwnedFrame::uniform(Vec2::new(8, 8), PlaneLayout::tight(), 0, 0, 0);
    let mut raw = frame.as_raw();
    raw.u.row_stride = 3;
    assert!(matches!(convert(&raw), Err(ImageError::Conversion(_))));
}

#[test]
fn test_rejects_zero_pixel_stride() {
    let frame = OwnedFrame::uniform(Vec2::new(4, 4), PlaneLayout::tight(), 0, 0, 0);
    let mut raw = frame.as_raw();
    raw.u.pixel_stride = 0;
    assert!(matches!(convert(&raw), Err(ImageError::Conversion(_))));
}
