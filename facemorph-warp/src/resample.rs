use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::raster::RasterImage;

/// Noise amplitude per unit of `noiseLevel`.
pub const NOISE_SCALE: f32 = 2.5;

/// Where the resampler's noise comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseSeed {
    /// Fresh randomness on every run.
    #[default]
    Entropy,
    /// Reproducible noise; identical seeds give identical output.
    Fixed(u64),
}

impl NoiseSeed {
    /// Resolve to a concrete base seed for one run.
    pub fn resolve(self) -> u64 {
        match self {
            NoiseSeed::Entropy => rand::thread_rng().gen(),
            NoiseSeed::Fixed(seed) => seed,
        }
    }
}

/// Generator for one output row. Rows are independent, so any partitioning
/// of rows across threads draws the same numbers.
pub fn row_rng(base_seed: u64, row: u32) -> StdRng {
    StdRng::seed_from_u64(base_seed ^ (row as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Sample `source` at (x - dx, y - dy) with bilinear interpolation.
///
/// Coordinates are clamped into the image and the far neighbours are clamped
/// to the last row/column, so edges replicate. Alpha comes from the top-left
/// neighbour unmodified. RGB channels receive uniform noise scaled by
/// `noise_level` and are clamped to [0, 255].
pub fn sample<R: Rng + ?Sized>(
    source: &RasterImage,
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    noise_level: f32,
    rng: &mut R,
) -> [u8; 4] {
    let (w, h) = source.dimensions();
    let sx = (x - dx).max(0.0).min((w - 1) as f32);
    let sy = (y - dy).max(0.0).min((h - 1) as f32);

    let x0 = sx.floor() as u32;
    let y0 = sy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = sx - x0 as f32;
    let fy = sy - y0 as f32;

    let p00 = source.pixel(x0, y0);
    let p10 = source.pixel(x1, y0);
    let p01 = source.pixel(x0, y1);
    let p11 = source.pixel(x1, y1);

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = [0u8, 0, 0, p00[3]];
    for c in 0..3 {
        let mut v = p00[c] as f32 * w00
            + p10[c] as f32 * w10
            + p01[c] as f32 * w01
            + p11[c] as f32 * w11;
        if noise_level > 0.0 {
            v += (rng.gen::<f32>() - 0.5) * noise_level * NOISE_SCALE;
        }
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> RasterImage {
        // 4x2, red ramps along x, green along y
        let mut data = Vec::new();
        for y in 0..2u8 {
            for x in 0..4u8 {
                data.extend_from_slice(&[x * 60, y * 100, 7, 200 + x]);
            }
        }
        RasterImage::new(4, 2, data).unwrap()
    }

    #[test]
    fn test_integer_sample_is_exact() {
        let img = gradient();
        let mut rng = row_rng(1, 0);
        for y in 0..2 {
            for x in 0..4 {
                let p = sample(&img, x as f32, y as f32, 0.0, 0.0, 0.0, &mut rng);
                assert_eq!(p, img.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_half_pixel_interpolates() {
        let img = gradient();
        let mut rng = row_rng(1, 0);
        // sample at x = 1.5
        let p = sample(&img, 1.0, 0.0, -0.5, 0.0, 0.0, &mut rng);
        assert_eq!(p[0], 90);
        // alpha is not interpolated
        assert_eq!(p[3], 201);
    }

    #[test]
    fn test_out_of_bounds_clamps_to_edge() {
        let img = gradient();
        let mut rng = row_rng(1, 0);
        let far = sample(&img, 3.0, 1.0, -40.0, -40.0, 0.0, &mut rng);
        assert_eq!(far, img.pixel(3, 1));
        let near = sample(&img, 0.0, 0.0, 12.0, 9.0, 0.0, &mut rng);
        assert_eq!(near, img.pixel(0, 0));
    }

    #[test]
    fn test_noise_clamps_and_spares_alpha() {
        let img = RasterImage::filled(1, 1, [255, 0, 250, 77]).unwrap();
        let mut rng = row_rng(99, 0);
        for _ in 0..200 {
            let p = sample(&img, 0.0, 0.0, 0.0, 0.0, 30.0, &mut rng);
            assert_eq!(p[3], 77);
            assert!(p[0] >= 255 - 38);
            assert!(p[1] <= 38);
        }
    }

    #[test]
    fn test_row_rng_deterministic() {
        let a: f32 = row_rng(5, 3).gen();
        let b: f32 = row_rng(5, 3).gen();
        let c: f32 = row_rng(5, 4).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
