//! Clip-guard normalization
//!
//! Convolution can grow amplitudes well past full scale, so the result is
//! scanned for its peak and pulled down uniformly when it would clip at the
//! output bit depth. Quiet results are left untouched; attenuating loud ones
//! is deterministic, documented behavior.

use irf_dsp::Sample;

use crate::buffer::AudioBuffer;

/// Apply `1/peak` gain when the buffer's peak exceeds 1.0.
///
/// Returns the peak measured before any gain was applied.
pub fn normalize_peak(buffer: &mut AudioBuffer) -> Sample {
    let peak = buffer.peak();

    if peak > 1.0 {
        let gain = 1.0 / peak;
        log::debug!("peak {peak:.4} above full scale, applying gain {gain:.4}");
        buffer.apply_gain(gain);
    }

    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hot_buffer_is_scaled_to_unity_peak() {
        let mut buffer =
            AudioBuffer::from_channels(vec![vec![2.0, -1.0], vec![0.5, -4.0]], 44100);

        let peak = normalize_peak(&mut buffer);

        assert_abs_diff_eq!(peak, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.peak(), 1.0, epsilon = 1e-12);
        // Every sample scaled by exactly 1/peak
        assert_abs_diff_eq!(buffer.channels[0][0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.channels[0][1], -0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.channels[1][0], 0.125, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.channels[1][1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn in_range_buffer_is_untouched() {
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5, -0.8, 0.3]], 44100);
        let before = buffer.channels.clone();

        let peak = normalize_peak(&mut buffer);

        assert_abs_diff_eq!(peak, 0.8, epsilon = 1e-12);
        assert_eq!(buffer.channels, before);
    }

    #[test]
    fn unity_peak_is_the_boundary_and_stays_unchanged() {
        let mut buffer = AudioBuffer::from_channels(vec![vec![1.0, 0.0]], 44100);

        let peak = normalize_peak(&mut buffer);

        assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-12);
        assert_eq!(buffer.channels[0], vec![1.0, 0.0]);
    }

    #[test]
    fn silence_is_untouched() {
        let mut buffer = AudioBuffer::new(1, 16, 44100);
        let peak = normalize_peak(&mut buffer);
        assert_eq!(peak, 0.0);
        assert!(buffer.channels[0].iter().all(|&s| s == 0.0));
    }
}
