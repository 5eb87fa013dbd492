pub mod detection;
pub mod displacement;
pub mod effect;
pub mod error;
pub mod executor;
pub mod overlay;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod resample;
pub mod sliders;
pub mod worker;

// Re-export commonly used types
pub use detection::{Detection, FaceBox, LandmarkSet, ModelState, Point};
pub use effect::{EffectOptions, EffectType, MaskOffset};
pub use error::{Result, WarpError, Warning};
pub use executor::{Executor, ParallelExecutor, SequentialExecutor};
pub use pipeline::{Pipeline, RunOutput, RunState};
pub use raster::RasterImage;
pub use region::FaceRegion;
pub use resample::NoiseSeed;
pub use sliders::{Slider, SliderValues};
pub use worker::{RunRequest, RunTicket, Worker};
