use super::*;

#[test]
fn fnv_hash_is_stable_across_split_writes() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"layerforge");
    let mut b = Fnv1a64::new_default();
    b.write_u8(b'l');
    b.write_bytes(b"ayerforge");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_write_str_is_length_prefixed() {
    let mut a = Fnv1a64::new_default();
    a.write_str("ab");
    a.write_str("c");
    let mut b = Fnv1a64::new_default();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_zeroes_transparent_and_keeps_opaque() {
    let mut px = vec![200u8, 100, 50, 0, 10, 20, 30, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 10, 20, 30, 255]);
}

#[test]
fn unpremultiply_inverts_half_alpha_within_one_step() {
    let mut px = vec![200u8, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    let back = unpremultiply_px([px[0], px[1], px[2], px[3]]);
    for (orig, got) in [200u8, 100, 50].iter().zip(back.iter()) {
        assert!((i16::from(*orig) - i16::from(*got)).abs() <= 1);
    }
    assert_eq!(back[3], 128);
}
