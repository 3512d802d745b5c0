use super::*;

fn pattern(w: u32, h: u32) -> PreparedImage {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[(x * 50 + 5) as u8, (y * 50 + 5) as u8, 99, 255]);
        }
    }
    PreparedImage::from_premul(w, h, data).unwrap()
}

fn rot(deg: f64) -> Geometry {
    Geometry {
        rotation_degrees: deg,
        scale: 1.0,
    }
}

#[test]
fn untouched_geometry_and_filter_copy_the_source() {
    let src = pattern(3, 2);
    let out = render_single(&src, &ColorFilter::default(), Geometry::default()).unwrap();
    assert_eq!((out.width(), out.height()), (3, 2));
    assert_eq!(out.data(), src.rgba8_premul.as_slice());
}

#[test]
fn quarter_turn_rotates_clockwise_about_center() {
    let src = pattern(2, 2);
    let out = render_single(&src, &ColorFilter::default(), rot(90.0)).unwrap();
    // [A B; C D] -> [C A; D B]
    assert_eq!(out.pixel(0, 0), Some([5, 55, 99, 255]));
    assert_eq!(out.pixel(1, 0), Some([5, 5, 99, 255]));
    assert_eq!(out.pixel(0, 1), Some([55, 55, 99, 255]));
    assert_eq!(out.pixel(1, 1), Some([55, 5, 99, 255]));
}

#[test]
fn rotate_forward_then_back_is_pixel_identical() {
    let src = pattern(4, 4);
    let turned = render_single(&src, &ColorFilter::default(), rot(90.0)).unwrap();
    assert_ne!(turned.data(), src.rgba8_premul.as_slice());
    let back = render_single(&turned.into_image(), &ColorFilter::default(), rot(-90.0)).unwrap();
    assert_eq!(back.data(), src.rgba8_premul.as_slice());
}

#[test]
fn rotation_is_taken_modulo_full_turns() {
    let src = pattern(4, 4);
    let a = render_single(&src, &ColorFilter::default(), rot(90.0)).unwrap();
    let b = render_single(&src, &ColorFilter::default(), rot(450.0)).unwrap();
    let c = render_single(&src, &ColorFilter::default(), rot(-270.0)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn non_square_rotation_keeps_native_dimensions() {
    let src = pattern(4, 2);
    let out = render_single(&src, &ColorFilter::default(), rot(90.0)).unwrap();
    assert_eq!((out.width(), out.height()), (4, 2));
    // The rotated content is 2 wide, centered, so the outer columns are empty.
    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(out.pixel(3, 1), Some([0, 0, 0, 0]));
    assert_eq!(out.pixel(1, 0).map(|p| p[3]), Some(255));
}

#[test]
fn downscale_pivots_on_center() {
    let src = pattern(4, 4);
    let geometry = Geometry {
        rotation_degrees: 0.0,
        scale: 0.5,
    };
    let out = render_single(&src, &ColorFilter::default(), geometry).unwrap();
    assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(out.pixel(3, 3), Some([0, 0, 0, 0]));
    assert_eq!(out.pixel(1, 1).map(|p| p[3]), Some(255));
    assert_eq!(out.pixel(2, 2).map(|p| p[3]), Some(255));
}

#[test]
fn invalid_scale_is_geometry_error() {
    let src = pattern(2, 2);
    for scale in [0.0, -1.0, f64::INFINITY] {
        let geometry = Geometry {
            rotation_degrees: 0.0,
            scale,
        };
        let err = render_single(&src, &ColorFilter::default(), geometry).unwrap_err();
        assert!(matches!(err, ForgeError::CompositeGeometry(_)));
    }
}

#[test]
fn filter_is_applied_to_output() {
    let src = PreparedImage::from_premul(1, 1, vec![100, 50, 0, 255]).unwrap();
    let filter = ColorFilter {
        brightness: 2.0,
        ..ColorFilter::default()
    };
    let out = render_single(&src, &filter, Geometry::default()).unwrap();
    assert_eq!(out.pixel(0, 0), Some([200, 100, 0, 255]));
}
