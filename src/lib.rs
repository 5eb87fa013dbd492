pub mod config;
pub mod detection_file;
pub mod presets;

// Re-export warp types for convenience
pub use facemorph_warp::{
    detection, effect, overlay, pipeline, Detection, EffectOptions, NoiseSeed, Pipeline,
    RasterImage, Slider, SliderValues,
};
