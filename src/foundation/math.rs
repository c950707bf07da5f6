pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Convert straight-alpha RGBA8 to premultiplied RGBA8 in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

/// Source-over composite of premultiplied RGBA8 `src` onto `dst`.
///
/// Buffers must have equal length; pixels with zero source alpha are skipped.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> bool {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return false;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3];
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            d[c] = add_sat_u8(s[c], mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    true
}

/// Flatten premultiplied RGBA8 over an opaque background color into opaque RGBA8.
pub(crate) fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgb: [u8; 3]) -> bool {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return false;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for c in 0..3 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(bg_rgb[c]), inv);
            d[c] = v.min(255) as u8;
        }
        d[3] = 255;
    }
    true
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
