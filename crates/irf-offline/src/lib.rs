//! IRF-Offline — Offline Convolution Pipeline
//!
//! Renders the full linear convolution of two audio files to disk:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     ConvolutionEngine                          │
//! │                                                                │
//! │  ┌─────────┐   ┌──────────────┐   ┌────────────┐   ┌────────┐ │
//! │  │ Decoder │ → │ Spectral     │ → │ Normalizer │ → │ Writer │ │
//! │  │ (A, B)  │   │ convolution  │   │ (clip      │   │ (24-bit│ │
//! │  │         │   │ per channel  │   │  guard)    │   │  WAV)  │ │
//! │  └─────────┘   └──────────────┘   └────────────┘   └────────┘ │
//! │                                                                │
//! │  background worker thread · polled status · cooperative cancel│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This path is deliberately offline: it trades latency for the exact full
//! `La + Lb - 1` result, and may take seconds on long inputs. The caller
//! polls [`ConvolutionEngine::status`] until the run reaches a terminal
//! phase.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use irf_offline::{ConvolutionEngine, ConvolutionJob, Phase};
//!
//! let mut engine = ConvolutionEngine::new();
//! engine.configure(ConvolutionJob::new("a.wav", "b.flac", "out.wav"))?;
//! engine.start()?;
//!
//! while engine.is_running() {
//!     let status = engine.status();
//!     println!("{:?}: {}", status.phase, status.message);
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! ```

mod buffer;
mod decoder;
mod engine;
mod error;
mod job;
mod normalize;
mod writer;

pub use buffer::*;
pub use decoder::*;
pub use engine::*;
pub use error::*;
pub use job::*;
pub use normalize::*;
pub use writer::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
