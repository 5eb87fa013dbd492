//! Per-pixel displacement field.
//!
//! Each feature rule is a `(predicate, contribution)` pair over normalised
//! coordinates. Rule windows overlap on purpose (eyes and brows, face width
//! and jaw): every rule is evaluated and the contributions are summed.

use crate::region::FaceRegion;
use crate::sliders::{Slider, SliderValues};

/// Scales every slider-driven displacement.
pub const AMPLIFICATION: f32 = 3.5;
/// Pixels further than this (normalised) from the centre are left untouched.
pub const CUTOFF_DISTANCE: f32 = 1.3;

/// Backward-mapping offset for one output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub dx: f32,
    pub dy: f32,
    pub outside_region: bool,
}

impl Displacement {
    pub fn magnitude_l1(&self) -> f32 {
        self.dx.abs() + self.dy.abs()
    }
}

/// Normalised view of a pixel relative to the face region.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub nx: f32,
    pub ny: f32,
    pub dist: f32,
    pub half_width: f32,
}

/// Zero maps to the negative branch.
#[inline]
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else {
        -1.0
    }
}

pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&Probe) -> bool,
    pub contribute: fn(&Probe, &SliderValues) -> (f32, f32),
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "eyes",
        applies: |p| p.ny > -0.65 && p.ny < -0.15 && p.nx.abs() > 0.1 && p.nx.abs() < 0.45,
        contribute: |p, s| {
            let size = s.unit(Slider::EyeSize) * AMPLIFICATION;
            let spacing = s.unit(Slider::EyeSpacing) * sign(p.nx) * AMPLIFICATION;
            (size * p.nx + spacing, size * p.ny)
        },
    },
    Rule {
        name: "eyebrows",
        applies: |p| p.ny > -0.75 && p.ny < -0.25 && p.nx.abs() > 0.05 && p.nx.abs() < 0.5,
        contribute: |_, s| (0.0, -s.unit(Slider::EyebrowHeight) * AMPLIFICATION),
    },
    Rule {
        name: "nose",
        applies: |p| p.nx.abs() < 0.25 && p.ny > -0.4 && p.ny < 0.25,
        contribute: |p, s| {
            (
                s.unit(Slider::NoseWidth) * p.nx * AMPLIFICATION,
                s.unit(Slider::NoseLength) * sign(p.ny) * AMPLIFICATION,
            )
        },
    },
    Rule {
        name: "mouth",
        applies: |p| p.nx.abs() < 0.35 && p.ny > 0.05 && p.ny < 0.45,
        contribute: |p, s| {
            (
                s.unit(Slider::MouthWidth) * p.nx * AMPLIFICATION,
                s.unit(Slider::MouthHeight) * (p.ny - 0.25) * AMPLIFICATION,
            )
        },
    },
    Rule {
        name: "face-width",
        applies: |p| p.dist > 0.4 && p.dist < 1.1,
        contribute: |p, s| (s.unit(Slider::FaceWidth) * p.nx * AMPLIFICATION, 0.0),
    },
    Rule {
        name: "chin",
        applies: |p| p.ny > 0.35 && p.nx.abs() < 0.35,
        contribute: |p, s| (0.0, s.unit(Slider::ChinShape) * (p.ny - 0.4) * AMPLIFICATION),
    },
    Rule {
        name: "jawline",
        applies: |p| p.ny > 0.15 && p.nx.abs() > 0.25 && p.nx.abs() < 0.65,
        contribute: |p, s| (s.unit(Slider::Jawline) * sign(p.nx) * AMPLIFICATION, 0.0),
    },
    Rule {
        name: "face-shift",
        applies: |p| p.dist < 1.0,
        contribute: |_, s| {
            (
                s.unit(Slider::FaceShiftX) * AMPLIFICATION,
                s.unit(Slider::FaceShiftY) * AMPLIFICATION,
            )
        },
    },
    Rule {
        name: "mirror",
        applies: |p| p.dist < 1.0,
        contribute: |p, s| {
            if s.get(Slider::Mirror) > 0 {
                (2.0 * p.nx * p.half_width, 0.0)
            } else {
                (0.0, 0.0)
            }
        },
    },
];

/// Displacement for output pixel (x, y).
pub fn compute_displacement(x: f32, y: f32, region: &FaceRegion, sliders: &SliderValues) -> Displacement {
    let (nx, ny) = region.normalize(x, y);
    let dist = (nx * nx + ny * ny).sqrt();
    if dist > CUTOFF_DISTANCE {
        return Displacement {
            dx: 0.0,
            dy: 0.0,
            outside_region: true,
        };
    }

    let probe = Probe {
        nx,
        ny,
        dist,
        half_width: region.half_width,
    };
    let (dx, dy) = RULES
        .iter()
        .filter(|rule| (rule.applies)(&probe))
        .map(|rule| (rule.contribute)(&probe, sliders))
        .fold((0.0, 0.0), |(ax, ay), (cx, cy)| (ax + cx, ay + cy));

    Displacement {
        dx,
        dy,
        outside_region: false,
    }
}
