use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Every slider the warp understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slider {
    EyeSize,
    EyeSpacing,
    EyebrowHeight,
    NoseWidth,
    NoseLength,
    MouthWidth,
    MouthHeight,
    FaceWidth,
    ChinShape,
    Jawline,
    NoiseLevel,
    FaceShiftX,
    FaceShiftY,
    Mirror,
}

impl Slider {
    pub const COUNT: usize = 14;

    pub const ALL: [Slider; Slider::COUNT] = [
        Slider::EyeSize,
        Slider::EyeSpacing,
        Slider::EyebrowHeight,
        Slider::NoseWidth,
        Slider::NoseLength,
        Slider::MouthWidth,
        Slider::MouthHeight,
        Slider::FaceWidth,
        Slider::ChinShape,
        Slider::Jawline,
        Slider::NoiseLevel,
        Slider::FaceShiftX,
        Slider::FaceShiftY,
        Slider::Mirror,
    ];

    /// Key used in configuration maps.
    pub fn name(self) -> &'static str {
        match self {
            Slider::EyeSize => "eyeSize",
            Slider::EyeSpacing => "eyeSpacing",
            Slider::EyebrowHeight => "eyebrowHeight",
            Slider::NoseWidth => "noseWidth",
            Slider::NoseLength => "noseLength",
            Slider::MouthWidth => "mouthWidth",
            Slider::MouthHeight => "mouthHeight",
            Slider::FaceWidth => "faceWidth",
            Slider::ChinShape => "chinShape",
            Slider::Jawline => "jawline",
            Slider::NoiseLevel => "noiseLevel",
            Slider::FaceShiftX => "faceShiftX",
            Slider::FaceShiftY => "faceShiftY",
            Slider::Mirror => "mirror",
        }
    }

    pub fn from_name(name: &str) -> Option<Slider> {
        Slider::ALL.iter().copied().find(|s| s.name() == name)
    }

    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            Slider::NoiseLevel => 0..=30,
            Slider::Mirror => 0..=1,
            _ => -50..=50,
        }
    }

    pub fn default_value(self) -> i32 {
        match self {
            Slider::NoiseLevel => 10,
            _ => 0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named slider values, always complete and always within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, i32>", into = "BTreeMap<String, i32>")]
pub struct SliderValues {
    values: [i32; Slider::COUNT],
}

impl Default for SliderValues {
    fn default() -> Self {
        let mut values = [0; Slider::COUNT];
        for s in Slider::ALL {
            values[s.index()] = s.default_value();
        }
        Self { values }
    }
}

impl SliderValues {
    /// Every slider at zero, including noise: the identity configuration.
    pub fn neutral() -> Self {
        Self {
            values: [0; Slider::COUNT],
        }
    }

    /// Defaults overridden by `(name, value)` pairs. Unknown names are skipped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        let mut out = Self::default();
        out.apply_pairs(pairs);
        out
    }

    pub fn apply_pairs<'a, I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        for (name, value) in pairs {
            match Slider::from_name(name) {
                Some(slider) => self.set(slider, value),
                None => log::debug!("ignoring unknown slider {:?}", name),
            }
        }
    }

    #[inline]
    pub fn get(&self, slider: Slider) -> i32 {
        self.values[slider.index()]
    }

    /// Set a slider, clamping into its range.
    pub fn set(&mut self, slider: Slider, value: i32) {
        let range = slider.range();
        self.values[slider.index()] = value.clamp(*range.start(), *range.end());
    }

    pub fn with(mut self, slider: Slider, value: i32) -> Self {
        self.set(slider, value);
        self
    }

    /// Slider value divided by 50, the unit every displacement rule scales by.
    #[inline]
    pub fn unit(&self, slider: Slider) -> f32 {
        self.get(slider) as f32 / 50.0
    }

    pub fn noise_level(&self) -> f32 {
        self.get(Slider::NoiseLevel) as f32
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slider, i32)> + '_ {
        Slider::ALL.iter().map(move |&s| (s, self.get(s)))
    }
}

impl From<BTreeMap<String, i32>> for SliderValues {
    fn from(map: BTreeMap<String, i32>) -> Self {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

impl From<SliderValues> for BTreeMap<String, i32> {
    fn from(values: SliderValues) -> Self {
        values
            .iter()
            .map(|(s, v)| (s.name().to_string(), v))
            .collect()
    }
}
