use crate::detection::{FaceBox, Point};

/// Padding applied to a detector box so the warp fades out past its edges.
const BOX_PADDING: f32 = 1.25;
/// Heuristic region size, as a fraction of the image, when no face was found.
const FALLBACK_WIDTH_FRACTION: f32 = 0.6;
const FALLBACK_HEIGHT_FRACTION: f32 = 0.7;

/// Elliptical face region used to gate and normalise displacement math.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceRegion {
    pub center: Point,
    pub half_width: f32,
    pub half_height: f32,
}

impl FaceRegion {
    /// Coordinates of (x, y) relative to the centre, scaled by the half extents.
    #[inline]
    pub fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.center.x) / self.half_width,
            (y - self.center.y) / self.half_height,
        )
    }

    /// Normalised elliptical distance from the centre; 1.0 lies on the ellipse.
    #[inline]
    pub fn distance(&self, x: f32, y: f32) -> f32 {
        let (nx, ny) = self.normalize(x, y);
        (nx * nx + ny * ny).sqrt()
    }

    /// Integer bounding rectangle of the region scaled by `scale`, clipped to
    /// the image. Returns `(x0, y0, x1, y1)` with exclusive upper bounds.
    pub fn bounds(&self, scale: f32, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let hw = self.half_width * scale;
        let hh = self.half_height * scale;
        let clip = |v: f32, max: u32| v.max(0.0).min(max as f32) as u32;
        let x0 = clip((self.center.x - hw).floor(), width);
        let y0 = clip((self.center.y - hh).floor(), height);
        let x1 = clip((self.center.x + hw).ceil() + 1.0, width);
        let y1 = clip((self.center.y + hh).ceil() + 1.0, height);
        (x0, y0, x1, y1)
    }
}

/// Derive the face region for an image.
///
/// With a detector box the region is the padded box; without one it is a
/// generous centred ellipse so sliders still have a visible effect.
/// Callers guarantee `image_width, image_height > 0`.
pub fn derive_region(image_width: u32, image_height: u32, detection: Option<&FaceBox>) -> FaceRegion {
    let region = match detection {
        Some(b) if b.width > 0.0 && b.height > 0.0 => FaceRegion {
            center: b.center(),
            half_width: b.width * BOX_PADDING / 2.0,
            half_height: b.height * BOX_PADDING / 2.0,
        },
        _ => {
            if let Some(b) = detection {
                log::warn!(
                    "ignoring degenerate detection box {}x{}, using heuristic region",
                    b.width,
                    b.height
                );
            }
            FaceRegion {
                center: Point::new(image_width as f32 / 2.0, image_height as f32 / 2.0),
                half_width: image_width as f32 * FALLBACK_WIDTH_FRACTION / 2.0,
                half_height: image_height as f32 * FALLBACK_HEIGHT_FRACTION / 2.0,
            }
        }
    };
    log::debug!(
        "face region: center=({:.1}, {:.1}) half=({:.1}, {:.1})",
        region.center.x,
        region.center.y,
        region.half_width,
        region.half_height
    );
    region
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_box() {
        let b = FaceBox::new(10.0, 10.0, 100.0, 100.0);
        let r = derive_region(640, 480, Some(&b));
        assert_eq!(r.center, Point::new(60.0, 60.0));
        assert_eq!(r.half_width, 62.5);
        assert_eq!(r.half_height, 62.5);
    }

    #[test]
    fn test_region_fallback() {
        let r = derive_region(200, 100, None);
        assert_eq!(r.center, Point::new(100.0, 50.0));
        assert!((r.half_width - 60.0).abs() < 1e-4);
        assert!((r.half_height - 35.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_box_falls_back() {
        let b = FaceBox::new(5.0, 5.0, 0.0, 10.0);
        let r = derive_region(100, 100, Some(&b));
        assert_eq!(r.center, Point::new(50.0, 50.0));
        assert!(r.half_width > 0.0 && r.half_height > 0.0);
    }

    #[test]
    fn test_distance_and_bounds() {
        let r = FaceRegion {
            center: Point::new(50.0, 50.0),
            half_width: 10.0,
            half_height: 20.0,
        };
        assert!((r.distance(60.0, 50.0) - 1.0).abs() < 1e-6);
        assert!((r.distance(50.0, 30.0) - 1.0).abs() < 1e-6);
        assert_eq!(r.bounds(1.0, 100, 100), (40, 30, 61, 71));
        assert_eq!(r.bounds(10.0, 100, 100), (0, 0, 100, 100));
    }
}
