//! 3x3 stencils over `f32` images with border mapping.
//!
//! Out-of-range reads go through [`map_index`]. Reads that land on a
//! non-finite (no-data) sample are replaced by the center sample, so a hole
//! in the raster does not bleed NaN into its neighbors. No-data centers
//! produce zero responses.

use lw_core::{BorderMode, Image, map_index};

pub(crate) fn neighborhood3(
    src: &Image<f32>,
    x: usize,
    y: usize,
    border: BorderMode,
) -> [[f32; 3]; 3] {
    let w = src.width();
    let h = src.height();
    let data = src.data();
    let center = data[y * w + x];

    let mut out = [[center; 3]; 3];
    for (r, dy) in (-1isize..=1).enumerate() {
        let Some(yy) = map_index(y as isize + dy, h, border) else {
            continue;
        };
        for (c, dx) in (-1isize..=1).enumerate() {
            let Some(xx) = map_index(x as isize + dx, w, border) else {
                continue;
            };
            let v = data[yy * w + xx];
            if v.is_finite() {
                out[r][c] = v;
            }
        }
    }
    out
}

pub fn smooth_binomial3(src: &Image<f32>, border: BorderMode) -> Image<f32> {
    let (w, h) = (src.width(), src.height());
    let mut out = Image::new_fill(w, h, 0.0f32);
    let dst = out.data_mut();

    const K: [f32; 3] = [1.0, 2.0, 1.0];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let center = src.data()[idx];
            if !center.is_finite() {
                dst[idx] = center;
                continue;
            }

            let n = neighborhood3(src, x, y, border);
            let mut s = 0.0f32;
            for r in 0..3 {
                for c in 0..3 {
                    s += K[r] * K[c] * n[r][c];
                }
            }
            dst[idx] = s / 16.0;
        }
    }
    out
}

/// Scharr derivatives. Returns `(gx, gy, magnitude)`.
pub fn scharr(src: &Image<f32>, border: BorderMode) -> (Image<f32>, Image<f32>, Image<f32>) {
    let (w, h) = (src.width(), src.height());
    let mut gx_img = Image::new_fill(w, h, 0.0f32);
    let mut gy_img = Image::new_fill(w, h, 0.0f32);
    let mut mag_img = Image::new_fill(w, h, 0.0f32);

    {
        let gx = gx_img.data_mut();
        let gy = gy_img.data_mut();
        let mag = mag_img.data_mut();

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                if !src.data()[idx].is_finite() {
                    continue;
                }

                let n = neighborhood3(src, x, y, border);
                let gxx = (3.0 * n[0][2] + 10.0 * n[1][2] + 3.0 * n[2][2])
                    - (3.0 * n[0][0] + 10.0 * n[1][0] + 3.0 * n[2][0]);
                let gyy = (3.0 * n[2][0] + 10.0 * n[2][1] + 3.0 * n[2][2])
                    - (3.0 * n[0][0] + 10.0 * n[0][1] + 3.0 * n[0][2]);

                gx[idx] = gxx;
                gy[idx] = gyy;
                mag[idx] = (gxx * gxx + gyy * gyy).sqrt();
            }
        }
    }

    (gx_img, gy_img, mag_img)
}

/// 4-neighbor discrete Laplacian.
pub fn laplacian4(src: &Image<f32>, border: BorderMode) -> Image<f32> {
    let (w, h) = (src.width(), src.height());
    let mut out = Image::new_fill(w, h, 0.0f32);
    let dst = out.data_mut();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if !src.data()[idx].is_finite() {
                continue;
            }
            let n = neighborhood3(src, x, y, border);
            dst[idx] = n[0][1] + n[2][1] + n[1][0] + n[1][2] - 4.0 * n[1][1];
        }
    }
    out
}
