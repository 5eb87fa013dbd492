//! Background worker that runs the pipeline off the calling thread.
//!
//! Only the most recently submitted job is authoritative. Jobs queued behind
//! a newer one are skipped, and results for superseded tickets are dropped
//! on the receiving side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::detection::Detection;
use crate::effect::EffectOptions;
use crate::error::{Result, WarpError};
use crate::pipeline::{Pipeline, RunOutput};
use crate::raster::RasterImage;
use crate::sliders::SliderValues;

/// Owned inputs for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: RasterImage,
    pub sliders: SliderValues,
    pub detection: Option<Detection>,
    pub effect: Option<EffectOptions>,
}

impl RunRequest {
    pub fn new(source: RasterImage, sliders: SliderValues) -> Self {
        Self {
            source,
            sliders,
            detection: None,
            effect: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

struct Job {
    ticket: u64,
    request: RunRequest,
}

struct Completed {
    ticket: u64,
    result: Result<RunOutput>,
}

pub struct Worker {
    jobs: Option<Sender<Job>>,
    results: Receiver<Completed>,
    latest: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(pipeline: Pipeline) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (result_tx, result_rx) = mpsc::channel::<Completed>();
        let latest = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&latest);

        let handle = std::thread::Builder::new()
            .name("facemorph-worker".into())
            .spawn(move || worker_loop(pipeline, job_rx, result_tx, seen))
            .map_err(|e| WarpError::Worker(format!("spawning worker thread: {}", e)))?;

        Ok(Self {
            jobs: Some(job_tx),
            results: result_rx,
            latest,
            handle: Some(handle),
        })
    }

    /// Queue a run. Any earlier run that has not finished becomes stale.
    pub fn submit(&self, request: RunRequest) -> Result<RunTicket> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let sender = self
            .jobs
            .as_ref()
            .ok_or_else(|| WarpError::Worker("worker is shut down".into()))?;
        sender
            .send(Job { ticket, request })
            .map_err(|_| WarpError::Worker("worker thread has exited".into()))?;
        log::debug!("submitted run {}", ticket);
        Ok(RunTicket(ticket))
    }

    pub fn latest_ticket(&self) -> Option<RunTicket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            t => Some(RunTicket(t)),
        }
    }

    fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest.load(Ordering::SeqCst)
    }

    /// Non-blocking poll for the newest run's result.
    pub fn try_latest(&self) -> Option<Result<RunOutput>> {
        loop {
            match self.results.try_recv() {
                Ok(done) if self.is_current(done.ticket) => return Some(done.result),
                Ok(done) => log::debug!("discarding stale run {}", done.ticket),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return Some(Err(WarpError::Worker("worker thread has exited".into())))
                }
            }
        }
    }

    /// Block until the newest run finishes, or `timeout` passes.
    pub fn wait_latest_timeout(&self, timeout: Duration) -> Option<Result<RunOutput>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(done) if self.is_current(done.ticket) => return Some(done.result),
                Ok(done) => log::debug!("discarding stale run {}", done.ticket),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    return Some(Err(WarpError::Worker("worker thread has exited".into())))
                }
            }
        }
    }

    /// Block until the newest run finishes.
    pub fn wait_latest(&self) -> Result<RunOutput> {
        if self.latest_ticket().is_none() {
            return Err(WarpError::Worker("no run submitted".into()));
        }
        loop {
            let done = self
                .results
                .recv()
                .map_err(|_| WarpError::Worker("worker thread has exited".into()))?;
            if self.is_current(done.ticket) {
                return done.result;
            }
            log::debug!("discarding stale run {}", done.ticket);
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // closing the job channel ends the loop
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("worker thread panicked");
            }
        }
    }
}

fn worker_loop(
    pipeline: Pipeline,
    jobs: Receiver<Job>,
    results: Sender<Completed>,
    latest: Arc<AtomicU64>,
) {
    while let Ok(mut job) = jobs.recv() {
        // coalesce: jump to the newest queued job
        while let Ok(newer) = jobs.try_recv() {
            log::debug!("skipping superseded run {}", job.ticket);
            job = newer;
        }
        if job.ticket < latest.load(Ordering::SeqCst) {
            // a newer job is already on its way
            continue;
        }

        let req = &job.request;
        let result = pipeline.run(
            &req.source,
            &req.sliders,
            req.detection.as_ref(),
            req.effect.as_ref(),
        );
        if results
            .send(Completed {
                ticket: job.ticket,
                result,
            })
            .is_err()
        {
            break;
        }
    }
}
