//! Convolution job definitions

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

/// One offline convolution: two input files and one output location.
///
/// A job is configured before the run starts and consumed entirely by that
/// run; configuring a new job replaces the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvolutionJob {
    /// First input (its sample rate becomes the output sample rate)
    pub input_a: PathBuf,
    /// Second input
    pub input_b: PathBuf,
    /// Output file location (written as 24-bit WAV)
    pub output: PathBuf,
}

impl ConvolutionJob {
    pub fn new<A, B, O>(input_a: A, input_b: B, output: O) -> Self
    where
        A: Into<PathBuf>,
        B: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            input_a: input_a.into(),
            input_b: input_b.into(),
            output: output.into(),
        }
    }

    /// Check that both inputs exist and the output directory is in place.
    pub fn validate(&self) -> OfflineResult<()> {
        if !self.input_a.exists() {
            return Err(OfflineError::InputNotFound(
                self.input_a.display().to_string(),
            ));
        }

        if !self.input_b.exists() {
            return Err(OfflineError::InputNotFound(
                self.input_b.display().to_string(),
            ));
        }

        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(OfflineError::Write(format!(
                    "output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        Ok(())
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Output file that was written
    pub output: PathBuf,
    /// Channels in the output
    pub channels: usize,
    /// Frames in the output (`La + Lb - 1`)
    pub frames: usize,
    /// Output sample rate (input A's rate)
    pub sample_rate: u32,
    /// Peak amplitude measured before the clip guard ran
    pub peak: f64,
    /// Wall time for the whole run
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("b.wav");
        std::fs::write(&existing, b"stub").unwrap();

        let job = ConvolutionJob::new(dir.path().join("missing.wav"), &existing, dir.path().join("out.wav"));
        assert!(matches!(
            job.validate(),
            Err(OfflineError::InputNotFound(_))
        ));
    }

    #[test]
    fn missing_output_directory_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        std::fs::write(&a, b"stub").unwrap();
        std::fs::write(&b, b"stub").unwrap();

        let job = ConvolutionJob::new(&a, &b, dir.path().join("nope").join("out.wav"));
        assert!(matches!(job.validate(), Err(OfflineError::Write(_))));
    }

    #[test]
    fn complete_job_validates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        std::fs::write(&a, b"stub").unwrap();
        std::fs::write(&b, b"stub").unwrap();

        let job = ConvolutionJob::new(&a, &b, dir.path().join("out.wav"));
        assert!(job.validate().is_ok());
    }
}
