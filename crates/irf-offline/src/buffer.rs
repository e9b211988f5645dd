//! Multichannel sample buffer

use irf_dsp::Sample;

/// Multichannel audio, one `Vec` of samples per channel (not interleaved).
///
/// Invariant: every channel holds the same number of frames, and a decoded
/// buffer always has at least one channel.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Audio samples, one Vec per channel
    pub channels: Vec<Vec<Sample>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_channels: usize, num_frames: usize, sample_rate: u32) -> Self {
        Self {
            channels: vec![vec![0.0; num_frames]; num_channels],
            sample_rate,
        }
    }

    /// Wrap existing channel data
    pub fn from_channels(channels: Vec<Vec<Sample>>, sample_rate: u32) -> Self {
        debug_assert!(
            channels.windows(2).all(|w| w[0].len() == w[1].len()),
            "all channels must have the same length"
        );
        Self {
            channels,
            sample_rate,
        }
    }

    /// Create from interleaved samples
    pub fn from_interleaved(samples: &[Sample], num_channels: usize, sample_rate: u32) -> Self {
        let num_frames = samples.len() / num_channels;
        let mut channels = vec![vec![0.0; num_frames]; num_channels];

        for (i, frame) in samples.chunks_exact(num_channels).enumerate() {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch][i] = sample;
            }
        }

        Self {
            channels,
            sample_rate,
        }
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of sample frames
    pub fn num_frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.num_frames() as f64 / self.sample_rate as f64
        }
    }

    /// Resolve an output channel index against this buffer's channel count.
    ///
    /// Channels past the end map to the last available channel, so a mono
    /// input feeds every output channel of a wider mix identically. This is
    /// the documented reconciliation rule, not an error case.
    pub fn channel_or_last(&self, ch: usize) -> &[Sample] {
        &self.channels[ch.min(self.channels.len() - 1)]
    }

    /// Peak absolute amplitude over all channels and frames
    pub fn peak(&self) -> Sample {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .map(|s| s.abs())
            .fold(0.0, Sample::max)
    }

    /// Apply uniform gain in place
    pub fn apply_gain(&mut self, gain: Sample) {
        for channel in &mut self.channels {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }
}
