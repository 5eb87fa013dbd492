use std::sync::Arc;

use crate::detection::Detection;
use crate::effect::{apply_effect, Composited, EffectOptions};
use crate::error::{Result, WarpError, Warning};
use crate::executor::{Executor, ParallelExecutor, WarpTask};
use crate::raster::RasterImage;
use crate::region::{derive_region, FaceRegion};
use crate::resample::NoiseSeed;
use crate::sliders::SliderValues;

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Warping,
    Compositing,
    Done,
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub image: RasterImage,
    pub region: FaceRegion,
    pub warnings: Vec<Warning>,
}

/// Full pipeline: region → displacement + resample → effect
#[derive(Clone)]
pub struct Pipeline {
    executor: Arc<dyn Executor>,
    seed: NoiseSeed,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("executor", &self.executor.name())
            .field("seed", &self.seed)
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_executor(ParallelExecutor::new())
    }

    pub fn with_executor<E: Executor + 'static>(executor: E) -> Self {
        Self {
            executor: Arc::new(executor),
            seed: NoiseSeed::Entropy,
        }
    }

    pub fn seed(mut self, seed: NoiseSeed) -> Self {
        self.seed = seed;
        self
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    /// Warp `source` according to `sliders`, then composite `effect` on top.
    pub fn run(
        &self,
        source: &RasterImage,
        sliders: &SliderValues,
        detection: Option<&Detection>,
        effect: Option<&EffectOptions>,
    ) -> Result<RunOutput> {
        self.run_observed(source, sliders, detection, effect, |_| {})
    }

    /// Like [`Pipeline::run`], reporting each state transition to `observe`.
    pub fn run_observed<F>(
        &self,
        source: &RasterImage,
        sliders: &SliderValues,
        detection: Option<&Detection>,
        effect: Option<&EffectOptions>,
        mut observe: F,
    ) -> Result<RunOutput>
    where
        F: FnMut(RunState),
    {
        observe(RunState::Idle);
        validate(source, detection)?;

        let (width, height) = source.dimensions();
        let region = derive_region(width, height, detection.map(|d| &d.bbox));
        let seed = self.seed.resolve();
        log::debug!(
            "warping {}x{} with {} executor, detection={}, seed={}",
            width,
            height,
            self.executor.name(),
            detection.is_some(),
            seed
        );

        observe(RunState::Warping);
        let task = WarpTask {
            source: source.clone(),
            region,
            sliders: *sliders,
            seed,
        };
        let warped = self.executor.execute(&task)?;

        observe(RunState::Compositing);
        let composited = match effect {
            Some(options) => apply_effect(warped, &region, options),
            None => Composited {
                image: warped,
                warnings: Vec::new(),
            },
        };

        observe(RunState::Done);
        Ok(RunOutput {
            image: composited.image,
            region,
            warnings: composited.warnings,
        })
    }
}

fn validate(source: &RasterImage, detection: Option<&Detection>) -> Result<()> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(WarpError::InvalidInput(format!(
            "source image is {}x{}",
            width, height
        )));
    }
    if let Some(det) = detection {
        let b = &det.bbox;
        if ![b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite()) {
            return Err(WarpError::InvalidInput(format!(
                "detection box has non-finite coordinates: {:?}",
                b
            )));
        }
    }
    Ok(())
}
