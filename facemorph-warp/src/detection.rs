//! Face detection results as supplied by an external detector.
//!
//! The warp core only reads the bounding box (for the region model) and the
//! landmarks (for overlays). Descriptors are carried through for callers that
//! want to compare pre- and post-warp embeddings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};

pub const LANDMARK_COUNT: usize = 68;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Detector bounding box: top-left corner plus size, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Landmark groups in the conventional 68-point layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkGroup {
    Jaw,
    Brows,
    Nose,
    Eyes,
    Mouth,
}

impl LandmarkGroup {
    pub const ALL: [LandmarkGroup; 5] = [
        LandmarkGroup::Jaw,
        LandmarkGroup::Brows,
        LandmarkGroup::Nose,
        LandmarkGroup::Eyes,
        LandmarkGroup::Mouth,
    ];

    pub fn indices(self) -> std::ops::Range<usize> {
        match self {
            LandmarkGroup::Jaw => 0..17,
            LandmarkGroup::Brows => 17..27,
            LandmarkGroup::Nose => 27..36,
            LandmarkGroup::Eyes => 36..48,
            LandmarkGroup::Mouth => 48..68,
        }
    }
}

/// Exactly 68 landmark points in source image space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(WarpError::InvalidInput(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn group(&self, group: LandmarkGroup) -> &[Point] {
        &self.points[group.indices()]
    }

    pub fn jaw(&self) -> &[Point] {
        self.group(LandmarkGroup::Jaw)
    }

    pub fn brows(&self) -> &[Point] {
        self.group(LandmarkGroup::Brows)
    }

    pub fn nose(&self) -> &[Point] {
        self.group(LandmarkGroup::Nose)
    }

    pub fn eyes(&self) -> &[Point] {
        self.group(LandmarkGroup::Eyes)
    }

    pub fn mouth(&self) -> &[Point] {
        self.group(LandmarkGroup::Mouth)
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = WarpError;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

/// One detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: FaceBox,
    #[serde(default)]
    pub landmarks: Option<LandmarkSet>,
    #[serde(default)]
    pub descriptor: Option<Vec<f32>>,
}

impl Detection {
    pub fn from_box(bbox: FaceBox) -> Self {
        Self {
            bbox,
            landmarks: None,
            descriptor: None,
        }
    }
}

/// Euclidean distance between two face descriptors.
///
/// Returns `None` when the lengths differ.
pub fn descriptor_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    Some(sum.sqrt())
}

/// Load state of an external detector's model weights.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

impl ModelState {
    /// Move to `Loading`. Only valid from `Unloaded` or `Failed` (retry).
    pub fn begin_loading(&mut self) -> Result<()> {
        match self {
            ModelState::Unloaded | ModelState::Failed(_) => {
                *self = ModelState::Loading;
                Ok(())
            }
            other => Err(WarpError::InvalidInput(format!(
                "cannot start loading from state {:?}",
                other
            ))),
        }
    }

    /// Finish a load started with [`ModelState::begin_loading`].
    pub fn finish(&mut self, outcome: std::result::Result<(), String>) -> Result<()> {
        if *self != ModelState::Loading {
            return Err(WarpError::InvalidInput(format!(
                "cannot finish loading from state {:?}",
                self
            )));
        }
        *self = match outcome {
            Ok(()) => ModelState::Ready,
            Err(reason) => ModelState::Failed(reason),
        };
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready)
    }
}
