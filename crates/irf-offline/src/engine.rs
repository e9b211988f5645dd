//! Background job controller
//!
//! One worker thread per run. The caller configures a job, starts it, and
//! polls [`ConvolutionEngine::status`] for a `(phase, message)` snapshot;
//! both fields live behind one lock so a reader never sees a message from a
//! different phase. Cancellation is cooperative: the worker checks a shared
//! flag at every stage boundary and per convolution channel, and a cancelled
//! run exits without reaching a terminal phase or writing output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use irf_dsp::{ConvolutionPlan, Sample};

use crate::buffer::AudioBuffer;
use crate::decoder::decode_audio;
use crate::error::{InputSlot, OfflineError, OfflineResult};
use crate::job::{ConvolutionJob, JobReport};
use crate::normalize::normalize_peak;
use crate::writer::write_wav;

/// How long teardown waits for the worker to observe cancellation
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Job execution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No run started yet
    Idle,
    /// Worker is running (also the resting state of a cancelled run)
    Processing,
    /// Output written successfully
    Done,
    /// A stage failed; the message names it
    Error,
}

/// Phase plus human-readable message, updated and read as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub phase: Phase,
    pub message: String,
}

impl Status {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            message: "Idle".to_string(),
        }
    }
}

struct Worker {
    handle: thread::JoinHandle<()>,
    done: Receiver<()>,
}

/// Offline convolution engine: runs one job at a time on a background
/// worker, with polled status and cooperative cancellation.
pub struct ConvolutionEngine {
    job: Option<ConvolutionJob>,
    status: Arc<RwLock<Status>>,
    cancel: Arc<AtomicBool>,
    report: Arc<Mutex<Option<JobReport>>>,
    worker: Option<Worker>,
}

impl ConvolutionEngine {
    pub fn new() -> Self {
        Self {
            job: None,
            status: Arc::new(RwLock::new(Status::idle())),
            cancel: Arc::new(AtomicBool::new(false)),
            report: Arc::new(Mutex::new(None)),
            worker: None,
        }
    }

    /// Set the files for the next run. Rejected while a run is in flight.
    pub fn configure(&mut self, job: ConvolutionJob) -> OfflineResult<()> {
        if self.is_running() {
            return Err(OfflineError::InvalidConfig(
                "cannot reconfigure while a job is running".to_string(),
            ));
        }

        self.job = Some(job);
        Ok(())
    }

    /// Start the configured job on the background worker.
    ///
    /// Rejected when no job is configured or a run is still in flight; a
    /// rejected start leaves the in-flight run untouched.
    pub fn start(&mut self) -> OfflineResult<()> {
        if self.is_running() {
            return Err(OfflineError::InvalidConfig(
                "a job is already running".to_string(),
            ));
        }

        let job = self
            .job
            .clone()
            .ok_or_else(|| OfflineError::InvalidConfig("no job configured".to_string()))?;

        self.cancel.store(false, Ordering::SeqCst);
        *self.report.lock() = None;
        set_status(&self.status, Phase::Processing, "Reading input files...");

        let status = Arc::clone(&self.status);
        let cancel = Arc::clone(&self.cancel);
        let report = Arc::clone(&self.report);
        let (done_tx, done_rx) = bounded(1);

        log::info!(
            "starting convolution: {} * {} -> {}",
            job.input_a.display(),
            job.input_b.display(),
            job.output.display()
        );

        let handle = thread::spawn(move || {
            match run_job(&job, &status, &cancel) {
                Ok(job_report) => {
                    let name = job
                        .output
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| job.output.display().to_string());
                    log::info!(
                        "convolution finished: {} frames in {:?}",
                        job_report.frames,
                        job_report.elapsed
                    );
                    set_status(&status, Phase::Done, format!("Done! Exported to: {name}"));
                    *report.lock() = Some(job_report);
                }
                // A cancelled run never reaches a terminal phase
                Err(OfflineError::Cancelled) => {
                    log::info!("convolution cancelled");
                }
                Err(e) => {
                    log::error!("convolution failed: {e}");
                    set_status(&status, Phase::Error, format!("Error: {e}"));
                }
            }
            let _ = done_tx.send(());
        });

        self.worker = Some(Worker {
            handle,
            done: done_rx,
        });
        Ok(())
    }

    /// True while the worker thread is alive
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Snapshot of the current phase and message
    pub fn status(&self) -> Status {
        self.status.read().clone()
    }

    /// Request cooperative cancellation of the in-flight run
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Report of the most recent successful run, if any
    pub fn last_report(&self) -> Option<JobReport> {
        self.report.lock().clone()
    }

    /// Request cancellation and wait for the worker, up to `timeout`.
    ///
    /// Returns false when the worker had to be detached. A detached worker
    /// still holds its own handles on the status storage, so late writes
    /// stay well-formed.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let Some(worker) = self.worker.take() else {
            return true;
        };

        self.cancel.store(true, Ordering::SeqCst);

        match worker.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.handle.join();
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("worker did not stop within {timeout:?}, detaching");
                false
            }
        }
    }
}

impl Default for ConvolutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConvolutionEngine {
    fn drop(&mut self) {
        self.shutdown(SHUTDOWN_TIMEOUT);
    }
}

fn set_status(status: &RwLock<Status>, phase: Phase, message: impl Into<String>) {
    let mut guard = status.write();
    guard.phase = phase;
    guard.message = message.into();
}

fn check_cancel(cancel: &AtomicBool) -> OfflineResult<()> {
    if cancel.load(Ordering::SeqCst) {
        Err(OfflineError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run the full pipeline once. The caller maps the outcome onto the
/// terminal status; `Err(Cancelled)` maps onto no transition at all.
fn run_job(
    job: &ConvolutionJob,
    status: &RwLock<Status>,
    cancel: &AtomicBool,
) -> OfflineResult<JobReport> {
    let started = Instant::now();

    job.validate()?;

    let input_a = decode_audio(&job.input_a, InputSlot::A)?;
    check_cancel(cancel)?;
    let input_b = decode_audio(&job.input_b, InputSlot::B)?;
    check_cancel(cancel)?;

    set_status(status, Phase::Processing, "Convolving...");
    let mut result = convolve_buffers(&input_a, &input_b, cancel)?;
    check_cancel(cancel)?;

    set_status(status, Phase::Processing, "Writing output file...");
    let peak = normalize_peak(&mut result);

    check_cancel(cancel)?;
    write_wav(&job.output, &result)?;

    Ok(JobReport {
        output: job.output.clone(),
        channels: result.num_channels(),
        frames: result.num_frames(),
        sample_rate: result.sample_rate,
        peak,
        elapsed: started.elapsed(),
    })
}

/// Convolve every output channel of the pair.
///
/// Output channel count is `max(Ca, Cb)`; narrower inputs repeat their last
/// channel. Channels are independent, so they fan out on the rayon pool,
/// sharing only the read-only FFT plan; each task owns its scratch buffers
/// and checks the cancellation flag before doing any work.
fn convolve_buffers(
    a: &AudioBuffer,
    b: &AudioBuffer,
    cancel: &AtomicBool,
) -> OfflineResult<AudioBuffer> {
    let num_channels = a.num_channels().max(b.num_channels());
    let plan = ConvolutionPlan::for_lengths(a.num_frames(), b.num_frames())?;

    let channels = (0..num_channels)
        .into_par_iter()
        .map(|ch| -> OfflineResult<Vec<Sample>> {
            check_cancel(cancel)?;
            Ok(plan.convolve(a.channel_or_last(ch), b.channel_or_last(ch))?)
        })
        .collect::<OfflineResult<Vec<_>>>()?;

    // The output inherits input A's sample rate
    Ok(AudioBuffer::from_channels(channels, a.sample_rate))
}
