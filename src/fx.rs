//! Pixel operations on premultiplied RGBA8 buffers: gaussian blur (glows and
//! drop shadows), source-over compositing between full-canvas passes, and the
//! brightness filter.

use crate::error::{ThumbError, ThumbResult};

fn expect_rgba8(buf: &[u8], width: u32, height: u32, what: &str) -> ThumbResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ThumbError::render(format!("{what}: buffer size overflow")))?;
    if buf.len() != expected {
        return Err(ThumbError::render(format!(
            "{what}: expected {expected} bytes for {width}x{height} rgba8, got {}",
            buf.len()
        )));
    }
    Ok(())
}

/// Separable gaussian blur. Edge pixels clamp (no energy wraps around).
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> ThumbResult<Vec<u8>> {
    expect_rgba8(src, width, height, "blur")?;
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];
    convolve_axis(src, &mut tmp, width, height, &kernel, Axis::X);
    convolve_axis(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

enum Axis {
    X,
    Y,
}

/// Normalized gaussian weights in Q16 fixed point, summing to exactly 1<<16.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ThumbResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ThumbError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|w| (((w / sum) * 65536.0).round() as i64).clamp(0, 65536) as u32)
        .collect();

    // Push rounding error into the center tap so the kernel stays normalized.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + (65536 - acc)).clamp(0, 65536) as u32;

    Ok(weights)
}

fn convolve_axis(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    (((acc + 32768) >> 16).min(255)) as u8
}

/// Source-over one premultiplied pass onto another of the same size.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> ThumbResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ThumbError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = u16::from(s[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        for c in 0..4 {
            d[c] = s[c].saturating_add(mul_div255(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Multiply color channels by `factor`, keeping premultiplied validity by
/// clamping each channel to its alpha.
pub fn brighten_in_place(buf: &mut [u8], factor: f64) -> ThumbResult<()> {
    if !buf.len().is_multiple_of(4) {
        return Err(ThumbError::render("brighten expects an rgba8 buffer"));
    }
    if !factor.is_finite() || factor < 0.0 {
        return Err(ThumbError::validation("brightness factor must be >= 0"));
    }
    // Q8.8 fixed point is plenty for a 0.5..1.5 slider.
    let f = (factor * 256.0).round() as u64;
    for px in buf.chunks_exact_mut(4) {
        let a = px[3];
        for c in 0..3 {
            let v = ((u64::from(px[c]) * f + 128) >> 8).min(255) as u8;
            px[c] = v.min(a);
        }
    }
    Ok(())
}

/// Tint every covered pixel to the given premultiplied color, preserving the
/// coverage (alpha) channel. Used to recolor a rendered silhouette before
/// blurring it into a glow.
pub fn tint_in_place(buf: &mut [u8], rgb: [u8; 3]) -> ThumbResult<()> {
    if !buf.len().is_multiple_of(4) {
        return Err(ThumbError::render("tint expects an rgba8 buffer"));
    }
    for px in buf.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in 0..3 {
            px[c] = mul_div255(u16::from(rgb[c]), a);
        }
    }
    Ok(())
}

/// Scale all four channels by `factor` in 0..=1, fading the pass out.
pub fn fade_in_place(buf: &mut [u8], factor: f64) -> ThumbResult<()> {
    if !buf.len().is_multiple_of(4) {
        return Err(ThumbError::render("fade expects an rgba8 buffer"));
    }
    if !(0.0..=1.0).contains(&factor) {
        return Err(ThumbError::validation("fade factor must be in 0..=1"));
    }
    let f = ((factor * 255.0).round() as u16).min(255);
    for b in buf.iter_mut() {
        *b = mul_div255(u16::from(*b), f);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
