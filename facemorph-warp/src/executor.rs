//! Execution strategies for the per-pixel warp.
//!
//! Every output pixel depends only on the read-only source and the fixed
//! parameters, so rows can be rendered in any order on any thread.

use rayon::prelude::*;

use crate::displacement::compute_displacement;
use crate::error::{Result, WarpError};
use crate::raster::RasterImage;
use crate::region::FaceRegion;
use crate::resample::{row_rng, sample};
use crate::sliders::SliderValues;

/// Everything needed to render the warped image.
#[derive(Debug, Clone)]
pub struct WarpTask {
    pub source: RasterImage,
    pub region: FaceRegion,
    pub sliders: SliderValues,
    /// Base noise seed; each row derives its own generator from it.
    pub seed: u64,
}

impl WarpTask {
    fn stride(&self) -> usize {
        self.source.width() as usize * 4
    }

    /// Render output row `y` into `row` (`width * 4` bytes).
    pub fn render_row(&self, y: u32, row: &mut [u8]) {
        let mut rng = row_rng(self.seed, y);
        let noise = self.sliders.noise_level();
        for (x, out) in row.chunks_exact_mut(4).enumerate() {
            let x = x as u32;
            let d = compute_displacement(x as f32, y as f32, &self.region, &self.sliders);
            let px = if d.outside_region {
                self.source.pixel(x, y)
            } else {
                sample(&self.source, x as f32, y as f32, d.dx, d.dy, noise, &mut rng)
            };
            out.copy_from_slice(&px);
        }
    }

    fn finish(&self, buf: Vec<u8>) -> Result<RasterImage> {
        RasterImage::new(self.source.width(), self.source.height(), buf)
    }
}

/// Strategy that turns a [`WarpTask`] into pixels.
pub trait Executor: Send + Sync {
    fn execute(&self, task: &WarpTask) -> Result<RasterImage>;

    fn name(&self) -> &'static str;
}

/// Renders rows in order on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn execute(&self, task: &WarpTask) -> Result<RasterImage> {
        let stride = task.stride();
        let mut buf = vec![0u8; stride * task.source.height() as usize];
        for (y, row) in buf.chunks_exact_mut(stride).enumerate() {
            task.render_row(y as u32, row);
        }
        task.finish(buf)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Renders rows across a rayon pool.
#[derive(Debug, Default)]
pub struct ParallelExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl ParallelExecutor {
    /// Use the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Use a dedicated pool with `threads` workers; 0 means the global pool.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Ok(Self::new());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("facemorph-row-{}", i))
            .build()
            .map_err(|e| WarpError::Worker(format!("building thread pool: {}", e)))?;
        Ok(Self { pool: Some(pool) })
    }

    fn render(task: &WarpTask) -> Vec<u8> {
        let stride = task.stride();
        let mut buf = vec![0u8; stride * task.source.height() as usize];
        buf.par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| task.render_row(y as u32, row));
        buf
    }
}

impl Executor for ParallelExecutor {
    fn execute(&self, task: &WarpTask) -> Result<RasterImage> {
        let buf = match &self.pool {
            Some(pool) => pool.install(|| Self::render(task)),
            None => Self::render(task),
        };
        task.finish(buf)
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}
