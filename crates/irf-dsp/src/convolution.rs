//! FFT-based linear convolution
//!
//! Convolves two real signals by zero-padding both to a shared power-of-two
//! transform size, multiplying their half-spectra, and inverse transforming.
//! The transform size is the smallest power of two that can hold the full
//! linear result, so circular convolution equals linear convolution and no
//! wraparound aliasing can occur.

use std::sync::Arc;

use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use thiserror::Error;

use crate::Sample;

/// Spectral convolution errors
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Signal is empty")]
    EmptySignal,

    #[error("Signal length {actual} does not match plan length {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Transform failed: {0}")]
    Transform(String),
}

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;

/// FFT plan pair sized for one linear convolution.
///
/// Built once per pair of signal lengths and shared read-only across
/// channels; every [`convolve`](Self::convolve) call owns its scratch
/// buffers, so concurrent calls never share mutable state.
pub struct ConvolutionPlan {
    len_a: usize,
    len_b: usize,
    fft_size: usize,
    forward: Arc<dyn RealToComplex<Sample>>,
    inverse: Arc<dyn ComplexToReal<Sample>>,
}

impl ConvolutionPlan {
    /// Plan transforms for signals of length `len_a` and `len_b`.
    pub fn for_lengths(len_a: usize, len_b: usize) -> DspResult<Self> {
        if len_a == 0 || len_b == 0 {
            return Err(DspError::EmptySignal);
        }

        // Smallest power of two holding the full linear result. Floor of 2
        // keeps the transform length even, which realfft requires.
        let output_len = len_a + len_b - 1;
        let fft_size = output_len.next_power_of_two().max(2);

        let mut planner = RealFftPlanner::<Sample>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        log::debug!(
            "convolution plan: {} + {} - 1 = {} samples, FFT size {}",
            len_a,
            len_b,
            output_len,
            fft_size
        );

        Ok(Self {
            len_a,
            len_b,
            fft_size,
            forward,
            inverse,
        })
    }

    /// Transform size in samples (power of two).
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Length of the linear convolution this plan produces.
    pub fn output_len(&self) -> usize {
        self.len_a + self.len_b - 1
    }

    /// Convolve one channel pair.
    ///
    /// Returns exactly [`output_len`](Self::output_len) samples. Inputs must
    /// match the planned lengths.
    pub fn convolve(&self, a: &[Sample], b: &[Sample]) -> DspResult<Vec<Sample>> {
        if a.len() != self.len_a {
            return Err(DspError::LengthMismatch {
                expected: self.len_a,
                actual: a.len(),
            });
        }
        if b.len() != self.len_b {
            return Err(DspError::LengthMismatch {
                expected: self.len_b,
                actual: b.len(),
            });
        }

        let spectrum_len = self.fft_size / 2 + 1;

        // Zero-pad both signals to the transform size
        let mut padded_a = vec![0.0; self.fft_size];
        padded_a[..a.len()].copy_from_slice(a);
        let mut padded_b = vec![0.0; self.fft_size];
        padded_b[..b.len()].copy_from_slice(b);

        let mut spectrum_a = vec![Complex::new(0.0, 0.0); spectrum_len];
        let mut spectrum_b = vec![Complex::new(0.0, 0.0); spectrum_len];

        self.forward
            .process(&mut padded_a, &mut spectrum_a)
            .map_err(|e| DspError::Transform(e.to_string()))?;
        self.forward
            .process(&mut padded_b, &mut spectrum_b)
            .map_err(|e| DspError::Transform(e.to_string()))?;

        // Pointwise complex product: (re_a*re_b - im_a*im_b, re_a*im_b + im_a*re_b)
        for (bin_a, bin_b) in spectrum_a.iter_mut().zip(&spectrum_b) {
            *bin_a *= *bin_b;
        }

        let mut output = vec![0.0; self.fft_size];
        self.inverse
            .process(&mut spectrum_a, &mut output)
            .map_err(|e| DspError::Transform(e.to_string()))?;

        // realfft leaves the inverse unscaled
        let scale = 1.0 / self.fft_size as Sample;
        output.truncate(self.output_len());
        for sample in &mut output {
            *sample *= scale;
        }

        Ok(output)
    }
}

/// One-shot linear convolution of two signals.
///
/// Output length is `a.len() + b.len() - 1`.
pub fn linear_convolve(a: &[Sample], b: &[Sample]) -> DspResult<Vec<Sample>> {
    ConvolutionPlan::for_lengths(a.len(), b.len())?.convolve(a, b)
}
