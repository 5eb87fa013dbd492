//! Debug overlay: landmark points, feature contours and the face region.

use image::Rgba;
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_ellipse_mut, draw_line_segment_mut};

use crate::detection::{LandmarkGroup, LandmarkSet};
use crate::error::Result;
use crate::raster::RasterImage;
use crate::region::FaceRegion;

#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub point_radius: i32,
    pub draw_contours: bool,
    pub region_color: Option<Rgba<u8>>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            point_radius: 2,
            draw_contours: true,
            region_color: Some(Rgba([255, 255, 0, 255])),
        }
    }
}

fn group_color(group: LandmarkGroup) -> Rgba<u8> {
    match group {
        LandmarkGroup::Jaw => Rgba([0, 200, 255, 255]),
        LandmarkGroup::Brows => Rgba([255, 140, 0, 255]),
        LandmarkGroup::Nose => Rgba([0, 255, 120, 255]),
        LandmarkGroup::Eyes => Rgba([255, 0, 200, 255]),
        LandmarkGroup::Mouth => Rgba([255, 40, 40, 255]),
    }
}

/// Index ranges joined into contours, with whether each one closes.
const CONTOURS: [(usize, usize, bool); 9] = [
    (0, 17, false),  // jaw
    (17, 22, false), // right brow
    (22, 27, false), // left brow
    (27, 31, false), // nose bridge
    (31, 36, false), // nostrils
    (36, 42, true),  // right eye
    (42, 48, true),  // left eye
    (48, 60, true),  // outer lip
    (60, 68, true),  // inner lip
];

fn group_of(index: usize) -> LandmarkGroup {
    LandmarkGroup::ALL
        .into_iter()
        .find(|g| g.indices().contains(&index))
        .unwrap_or(LandmarkGroup::Jaw)
}

/// Draw `landmarks` and `region` onto a copy of `image`. Either may be absent.
pub fn render_landmark_overlay(
    image: &RasterImage,
    landmarks: Option<&LandmarkSet>,
    region: Option<&FaceRegion>,
    style: &OverlayStyle,
) -> Result<RasterImage> {
    let mut canvas = image.as_rgba().clone();
    let points = landmarks.map(|l| l.points()).unwrap_or(&[]);

    if let (Some(region), Some(color)) = (region, style.region_color) {
        draw_hollow_ellipse_mut(
            &mut canvas,
            (region.center.x.round() as i32, region.center.y.round() as i32),
            region.half_width.round() as i32,
            region.half_height.round() as i32,
            color,
        );
    }

    if style.draw_contours && !points.is_empty() {
        for &(start, end, closed) in CONTOURS.iter() {
            let color = group_color(group_of(start));
            for i in start..end - 1 {
                draw_line_segment_mut(
                    &mut canvas,
                    (points[i].x, points[i].y),
                    (points[i + 1].x, points[i + 1].y),
                    color,
                );
            }
            if closed {
                draw_line_segment_mut(
                    &mut canvas,
                    (points[end - 1].x, points[end - 1].y),
                    (points[start].x, points[start].y),
                    color,
                );
            }
        }
    }

    for (i, p) in points.iter().enumerate() {
        draw_filled_circle_mut(
            &mut canvas,
            (p.x.round() as i32, p.y.round() as i32),
            style.point_radius,
            group_color(group_of(i)),
        );
    }

    RasterImage::from_rgba(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Point;

    fn grid_landmarks() -> LandmarkSet {
        let pts = (0..68)
            .map(|i| Point::new(10.0 + (i % 10) as f32 * 8.0, 10.0 + (i / 10) as f32 * 8.0))
            .collect();
        LandmarkSet::new(pts).unwrap()
    }

    #[test]
    fn test_points_drawn_source_untouched() {
        let src = RasterImage::filled(100, 100, [0, 0, 0, 255]).unwrap();
        let out = render_landmark_overlay(&src, Some(&grid_landmarks()), None, &OverlayStyle::default())
            .unwrap();
        // landmark 0 is on the jaw
        assert_eq!(out.pixel(10, 10), [0, 200, 255, 255]);
        // landmark 48 (row 4, col 8) is on the mouth
        assert_eq!(out.pixel(74, 42), [255, 40, 40, 255]);
        assert_eq!(src.pixel(10, 10), [0, 0, 0, 255]);
    }

    #[test]
    fn test_region_outline() {
        let src = RasterImage::filled(100, 100, [0, 0, 0, 255]).unwrap();
        let region = FaceRegion {
            center: Point::new(50.0, 50.0),
            half_width: 30.0,
            half_height: 40.0,
        };
        let style = OverlayStyle {
            draw_contours: false,
            ..OverlayStyle::default()
        };
        let corner = LandmarkSet::new(vec![Point::new(95.0, 95.0); 68]).unwrap();
        let out = render_landmark_overlay(&src, Some(&corner), Some(&region), &style).unwrap();
        assert_eq!(out.pixel(80, 50), [255, 255, 0, 255]);
        assert_eq!(out.pixel(50, 50), [0, 0, 0, 255]);
        // last point drawn wins
        assert_eq!(out.pixel(95, 95), [255, 40, 40, 255]);

        let bare = render_landmark_overlay(&src, None, Some(&region), &style).unwrap();
        assert_eq!(bare.pixel(80, 50), [255, 255, 0, 255]);
        assert_eq!(bare.pixel(95, 95), [0, 0, 0, 255]);
    }
}
