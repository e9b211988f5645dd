//! Output serialization
//!
//! The export format is fixed: 24-bit integer PCM WAV at the buffer's sample
//! rate. The file is encoded completely in memory and written to disk in one
//! step, so a failed encode never leaves a half-written file behind.

use std::io::Cursor;
use std::path::Path;

use crate::buffer::AudioBuffer;
use crate::error::{OfflineError, OfflineResult};

/// Export bit depth
pub const OUTPUT_BIT_DEPTH: u16 = 24;

const INT24_MAX: f64 = 8388607.0;

/// Write the buffer to `path` as 24-bit PCM WAV.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> OfflineResult<()> {
    let encoded = encode_wav(buffer)?;
    std::fs::write(path, &encoded).map_err(|e| OfflineError::Write(e.to_string()))?;

    log::info!(
        "wrote {} ch x {} frames @ {} Hz to {}",
        buffer.num_channels(),
        buffer.num_frames(),
        buffer.sample_rate,
        path.display()
    );

    Ok(())
}

/// Encode the buffer into an in-memory WAV file
fn encode_wav(buffer: &AudioBuffer) -> OfflineResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: OUTPUT_BIT_DEPTH,
        sample_format: hound::SampleFormat::Int,
    };

    let mut output = Vec::new();
    let mut writer = hound::WavWriter::new(Cursor::new(&mut output), spec)
        .map_err(|e| OfflineError::Write(e.to_string()))?;

    for frame in 0..buffer.num_frames() {
        for channel in &buffer.channels {
            let sample = (channel[frame].clamp(-1.0, 1.0) * INT24_MAX) as i32;
            writer
                .write_sample(sample)
                .map_err(|e| OfflineError::Write(e.to_string()))?;
        }
    }

    writer
        .finalize()
        .map_err(|e| OfflineError::Write(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_audio;
    use crate::error::InputSlot;

    #[test]
    fn round_trip_within_24_bit_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let original = AudioBuffer::from_channels(
            vec![vec![0.0, 0.25, -0.5, 1.0], vec![-1.0, 0.125, 0.75, 0.0]],
            48000,
        );
        write_wav(&path, &original).unwrap();

        let decoded = decode_audio(&path, InputSlot::A).unwrap();
        assert_eq!(decoded.num_channels(), 2);
        assert_eq!(decoded.num_frames(), 4);
        assert_eq!(decoded.sample_rate, 48000);

        for (got, want) in decoded.channels.iter().zip(&original.channels) {
            for (g, w) in got.iter().zip(want) {
                assert!((g - w).abs() < 2.0 / INT24_MAX, "{g} vs {w}");
            }
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.wav");

        let buffer = AudioBuffer::from_channels(vec![vec![2.0, -3.0]], 44100);
        write_wav(&path, &buffer).unwrap();

        let decoded = decode_audio(&path, InputSlot::A).unwrap();
        assert!(decoded.channels[0][0] <= 1.0);
        assert!(decoded.channels[0][1] >= -1.0);
    }

    #[test]
    fn missing_destination_directory_is_a_write_error() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5]], 44100);
        let err = write_wav(Path::new("/nonexistent/dir/out.wav"), &buffer).unwrap_err();
        assert!(matches!(err, OfflineError::Write(_)));
    }
}
