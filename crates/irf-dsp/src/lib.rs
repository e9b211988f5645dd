//! irf-dsp: Spectral convolution core for IRForge
//!
//! Computes full linear convolution of arbitrary-length real signals in the
//! frequency domain: zero-pad to a power-of-two transform size, real-input
//! forward FFT, pointwise complex multiply, inverse FFT, truncate.
//!
//! ## Modules
//! - `convolution` - FFT plan sizing and linear convolution

pub mod convolution;

pub use convolution::{ConvolutionPlan, DspError, DspResult, linear_convolve};

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;
