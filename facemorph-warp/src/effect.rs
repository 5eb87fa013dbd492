//! Privacy overlays composited over the warped face.

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::raster::RasterImage;
use crate::region::FaceRegion;

pub const MAX_INTENSITY: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectType {
    #[default]
    None,
    Blur,
    Pixelate,
    Mask,
}

impl std::str::FromStr for EffectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(EffectType::None),
            "blur" => Ok(EffectType::Blur),
            "pixelate" => Ok(EffectType::Pixelate),
            "mask" => Ok(EffectType::Mask),
            other => Err(format!("unknown effect type {:?}", other)),
        }
    }
}

/// Mask placement relative to the region centre, in half-extent units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectOptions {
    pub effect_type: EffectType,
    pub effect_intensity: u8,
    #[serde(skip)]
    pub mask_image: Option<RasterImage>,
    pub mask_position: MaskOffset,
    pub mask_scale: f32,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            effect_type: EffectType::None,
            effect_intensity: 0,
            mask_image: None,
            mask_position: MaskOffset::default(),
            mask_scale: 1.0,
        }
    }
}

impl EffectOptions {
    pub fn blur(intensity: u8) -> Self {
        Self {
            effect_type: EffectType::Blur,
            effect_intensity: intensity,
            ..Self::default()
        }
    }

    pub fn pixelate(intensity: u8) -> Self {
        Self {
            effect_type: EffectType::Pixelate,
            effect_intensity: intensity,
            ..Self::default()
        }
    }

    pub fn mask(image: Option<RasterImage>, position: MaskOffset, scale: f32) -> Self {
        Self {
            effect_type: EffectType::Mask,
            mask_image: image,
            mask_position: position,
            mask_scale: scale,
            ..Self::default()
        }
    }

    fn intensity(&self) -> u32 {
        self.effect_intensity.min(MAX_INTENSITY) as u32
    }
}

/// Compositor output plus anything it had to recover from.
#[derive(Debug, Clone)]
pub struct Composited {
    pub image: RasterImage,
    pub warnings: Vec<Warning>,
}

/// Apply the selected effect to `image` inside `region`.
pub fn apply_effect(image: RasterImage, region: &FaceRegion, options: &EffectOptions) -> Composited {
    let mut warnings = Vec::new();
    let out = match options.effect_type {
        EffectType::None => None,
        EffectType::Blur => blur_region(image.as_rgba(), region, options.intensity()),
        EffectType::Pixelate => pixelate_region(image.as_rgba(), region, options.intensity()),
        EffectType::Mask => match &options.mask_image {
            Some(mask) => Some(overlay_mask(
                image.as_rgba(),
                region,
                mask,
                options.mask_position,
                options.mask_scale,
            )),
            None => {
                log::warn!("{}, skipping effect", Warning::MissingMaskAsset);
                warnings.push(Warning::MissingMaskAsset);
                None
            }
        },
    };

    let image = match out.map(RasterImage::from_rgba) {
        Some(Ok(img)) => img,
        // compositing preserves dimensions, so a rebuilt raster is never empty
        _ => image,
    };
    Composited { image, warnings }
}

fn inside(region: &FaceRegion, x: u32, y: u32) -> bool {
    region.distance(x as f32, y as f32) <= 1.0
}

/// Gaussian blur confined to the face ellipse. Radius equals intensity in pixels.
fn blur_region(src: &RgbaImage, region: &FaceRegion, radius: u32) -> Option<RgbaImage> {
    if radius == 0 {
        return None;
    }
    let (w, h) = src.dimensions();
    let (x0, y0, x1, y1) = region.bounds(1.0, w, h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    // blur a padded patch so edge pixels see real neighbours
    let pad = radius * 2;
    let px0 = x0.saturating_sub(pad);
    let py0 = y0.saturating_sub(pad);
    let px1 = (x1 + pad).min(w);
    let py1 = (y1 + pad).min(h);
    let patch = imageops::crop_imm(src, px0, py0, px1 - px0, py1 - py0).to_image();
    let blurred = imageops::blur(&patch, radius as f32 / 2.0);

    let mut out = src.clone();
    for y in y0..y1 {
        for x in x0..x1 {
            if inside(region, x, y) {
                out.put_pixel(x, y, *blurred.get_pixel(x - px0, y - py0));
            }
        }
    }
    Some(out)
}

/// Block-average pixelation inside the face ellipse. Block edge equals intensity.
fn pixelate_region(src: &RgbaImage, region: &FaceRegion, block: u32) -> Option<RgbaImage> {
    if block < 2 {
        return None;
    }
    let (w, h) = src.dimensions();
    let (x0, y0, x1, y1) = region.bounds(1.0, w, h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let mut out = src.clone();
    for by in (y0..y1).step_by(block as usize) {
        for bx in (x0..x1).step_by(block as usize) {
            let ex = (bx + block).min(w);
            let ey = (by + block).min(h);

            let mut sum = [0u64; 4];
            for y in by..ey {
                for x in bx..ex {
                    let p = src.get_pixel(x, y);
                    for c in 0..4 {
                        sum[c] += p[c] as u64;
                    }
                }
            }
            let n = ((ex - bx) * (ey - by)) as u64;
            let avg = Rgba(sum.map(|s| ((s + n / 2) / n) as u8));

            for y in by..ey {
                for x in bx..ex {
                    if inside(region, x, y) {
                        out.put_pixel(x, y, avg);
                    }
                }
            }
        }
    }
    Some(out)
}

/// Alpha-blend `mask` over the region. Width spans the region diameter times
/// `scale`, height follows the mask's aspect ratio.
///
/// Shrinking masks are resized whole. Enlarged masks are sampled only over the
/// part of the placement that lands on the canvas, so work stays bounded by
/// the image size whatever the scale.
fn overlay_mask(
    src: &RgbaImage,
    region: &FaceRegion,
    mask: &RasterImage,
    position: MaskOffset,
    scale: f32,
) -> RgbaImage {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let (mw, mh) = mask.dimensions();
    let target_w = (2.0 * region.half_width * scale).round().max(1.0);
    let target_h = (target_w * mh as f32 / mw as f32).round().max(1.0);

    let cx = region.center.x + position.x * region.half_width;
    let cy = region.center.y + position.y * region.half_height;
    let left = (cx - target_w / 2.0).round() as i64;
    let top = (cy - target_h / 2.0).round() as i64;

    let mut out = src.clone();
    if target_w <= mw as f32 && target_h <= mh as f32 {
        let resized = imageops::resize(
            mask.as_rgba(),
            target_w as u32,
            target_h as u32,
            FilterType::Triangle,
        );
        imageops::overlay(&mut out, &resized, left, top);
        return out;
    }

    let (w, h) = src.dimensions();
    let vx0 = left.clamp(0, w as i64) as u32;
    let vy0 = top.clamp(0, h as i64) as u32;
    let vx1 = (left as f64 + target_w as f64).clamp(0.0, w as f64) as u32;
    let vy1 = (top as f64 + target_h as f64).clamp(0.0, h as f64) as u32;
    if vx1 <= vx0 || vy1 <= vy0 {
        return out;
    }

    let sx = mw as f32 / target_w;
    let sy = mh as f32 / target_h;
    for y in vy0..vy1 {
        let v = ((y as i64 - top) as f32 + 0.5) * sy - 0.5;
        for x in vx0..vx1 {
            let u = ((x as i64 - left) as f32 + 0.5) * sx - 0.5;
            out.get_pixel_mut(x, y).blend(&bilinear(mask, u, v));
        }
    }
    out
}

/// Edge-clamped bilinear lookup, all four channels interpolated.
fn bilinear(img: &RasterImage, u: f32, v: f32) -> Rgba<u8> {
    let (w, h) = img.dimensions();
    let u = u.clamp(0.0, (w - 1) as f32);
    let v = v.clamp(0.0, (h - 1) as f32);
    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f32;
    let fy = v - y0 as f32;

    let (p00, p10) = (img.pixel(x0, y0), img.pixel(x1, y0));
    let (p01, p11) = (img.pixel(x0, y1), img.pixel(x1, y1));
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;

    fn checker(size: u32) -> RasterImage {
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let v = if (x + y) % 2 == 0 { 0 } else { 255 };
                data.extend_from_slice(&[v, v, v, 255]);
            }
        }
        RasterImage::new(size, size, data).unwrap()
    }

    fn region() -> FaceRegion {
        FaceRegion {
            center: Point::new(20.0, 20.0),
            half_width: 10.0,
            half_height: 10.0,
        }
    }

    #[test]
    fn test_none_is_passthrough() {
        let img = checker(40);
        let out = apply_effect(img.clone(), &region(), &EffectOptions::default());
        assert_eq!(out.image, img);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_blur_confined_to_region() {
        let img = checker(40);
        let out = apply_effect(img.clone(), &region(), &EffectOptions::blur(6)).image;
        // centre is smoothed toward mid-grey
        let c = out.pixel(20, 20)[0];
        assert!(c > 60 && c < 195, "centre {}", c);
        // corners untouched
        assert_eq!(out.pixel(0, 0), img.pixel(0, 0));
        assert_eq!(out.pixel(39, 38), img.pixel(39, 38));
    }

    #[test]
    fn test_pixelate_blocks_share_colour() {
        let img = checker(40);
        let out = apply_effect(img.clone(), &region(), &EffectOptions::pixelate(4)).image;
        // bounds start at x0 = y0 = 10, so (18..22, 18..22) is one block
        let p = out.pixel(18, 18);
        assert_eq!(p, [128, 128, 128, 255]);
        assert_eq!(out.pixel(19, 20), p);
        assert_eq!(out.pixel(21, 21), p);
        assert_eq!(out.pixel(2, 3), img.pixel(2, 3));
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let img = checker(40);
        assert_eq!(apply_effect(img.clone(), &region(), &EffectOptions::blur(0)).image, img);
        assert_eq!(apply_effect(img.clone(), &region(), &EffectOptions::pixelate(0)).image, img);
    }

    #[test]
    fn test_mask_overlays_centre() {
        let img = checker(40);
        let mask = RasterImage::filled(4, 2, [200, 10, 10, 255]).unwrap();
        let opts = EffectOptions::mask(Some(mask), MaskOffset::default(), 1.0);
        let out = apply_effect(img.clone(), &region(), &opts);
        assert!(out.warnings.is_empty());
        // 20x10 mask centred on (20, 20)
        let p = out.image.pixel(20, 20);
        assert!(p[0] > 190 && p[1] < 20, "{:?}", p);
        assert_eq!(out.image.pixel(20, 12), img.pixel(20, 12));
    }

    #[test]
    fn test_huge_mask_scale_stays_bounded() {
        let img = checker(100);
        let region = FaceRegion {
            center: Point::new(50.0, 50.0),
            half_width: 25.0,
            half_height: 25.0,
        };
        let mask = RasterImage::filled(4, 4, [10, 200, 30, 255]).unwrap();

        let start = std::time::Instant::now();
        let opts = EffectOptions::mask(Some(mask.clone()), MaskOffset::default(), 1.0e6);
        let out = apply_effect(img.clone(), &region, &opts);
        assert!(start.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(out.image.dimensions(), (100, 100));
        // the mask covers the whole canvas
        assert_eq!(out.image.pixel(0, 0), [10, 200, 30, 255]);
        assert_eq!(out.image.pixel(99, 99), [10, 200, 30, 255]);

        // pushed fully off-canvas: nothing drawn
        let opts = EffectOptions::mask(Some(mask), MaskOffset { x: 40.0, y: 0.0 }, 20.0);
        assert_eq!(apply_effect(img.clone(), &region, &opts).image, img);
    }

    #[test]
    fn test_shrunk_mask_resized_whole() {
        let img = checker(40);
        let mask = RasterImage::filled(64, 64, [0, 0, 250, 255]).unwrap();
        let opts = EffectOptions::mask(Some(mask), MaskOffset::default(), 0.5);
        let out = apply_effect(img.clone(), &region(), &opts).image;
        // 10x10 mask centred on (20, 20)
        let p = out.pixel(20, 20);
        assert!(p[0] < 5 && p[2] > 245, "{:?}", p);
        assert_eq!(out.pixel(14, 20), img.pixel(14, 20));
    }

    #[test]
    fn test_missing_mask_warns() {
        let img = checker(40);
        let opts = EffectOptions::mask(None, MaskOffset::default(), 1.0);
        let out = apply_effect(img.clone(), &region(), &opts);
        assert_eq!(out.image, img);
        assert_eq!(out.warnings, vec![Warning::MissingMaskAsset]);
    }

    #[test]
    fn test_effect_type_parse() {
        assert_eq!("Pixelate".parse::<EffectType>(), Ok(EffectType::Pixelate));
        assert!("sepia".parse::<EffectType>().is_err());
    }
}
