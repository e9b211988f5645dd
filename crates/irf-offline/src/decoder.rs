//! Audio decoding
//!
//! WAV goes through hound directly; everything else (FLAC, MP3, OGG, AAC,
//! AIFF, M4A) is probed and decoded with symphonia. All sample widths are
//! converted to f64 in [-1, 1).

use std::fs::File;
use std::path::Path;

use irf_dsp::Sample;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::buffer::AudioBuffer;
use crate::error::{InputSlot, OfflineError, OfflineResult};

/// Decode an input file into a multichannel buffer.
///
/// Fails with [`OfflineError::Decode`] naming `slot` when the file is
/// missing, not a decodable audio stream, or holds zero frames.
pub fn decode_audio(path: &Path, slot: InputSlot) -> OfflineResult<AudioBuffer> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
        .unwrap_or(false);

    let buffer = if is_wav {
        decode_wav(path, slot)?
    } else {
        decode_compressed(path, slot)?
    };

    if buffer.num_channels() == 0 || buffer.num_frames() == 0 {
        return Err(OfflineError::Decode(
            slot,
            "audio stream is empty".to_string(),
        ));
    }

    log::debug!(
        "decoded sample {}: {} ch, {} frames @ {} Hz ({})",
        slot,
        buffer.num_channels(),
        buffer.num_frames(),
        buffer.sample_rate,
        path.display()
    );

    Ok(buffer)
}

/// Fast path for WAV files
fn decode_wav(path: &Path, slot: InputSlot) -> OfflineResult<AudioBuffer> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| OfflineError::Decode(slot, e.to_string()))?;
    let spec = reader.spec();

    let num_channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let samples: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.unwrap_or(0.0) as Sample)
            .collect(),
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as Sample;
            reader
                .into_samples::<i32>()
                .map(|s| s.unwrap_or(0) as Sample / max_value)
                .collect()
        }
    };

    Ok(AudioBuffer::from_interleaved(
        &samples,
        num_channels,
        sample_rate,
    ))
}

/// Symphonia path for compressed containers
fn decode_compressed(path: &Path, slot: InputSlot) -> OfflineResult<AudioBuffer> {
    let file =
        File::open(path).map_err(|e| OfflineError::Decode(slot, e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| OfflineError::Decode(slot, e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| OfflineError::Decode(slot, "no audio track found".to_string()))?;

    let track_id = track.id;
    let num_channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| OfflineError::Decode(slot, e.to_string()))?;

    let mut channels: Vec<Vec<Sample>> = vec![Vec::new(); num_channels];

    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }

                match decoder.decode(&packet) {
                    Ok(decoded) => append_planar(&decoded, &mut channels),
                    // Corrupt packets are skipped; a stream that yields
                    // nothing at all is caught by the empty check above
                    Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
                    Err(e) => return Err(OfflineError::Decode(slot, e.to_string())),
                }
            }
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(OfflineError::Decode(slot, e.to_string())),
        }
    }

    // A truncated last packet can leave the planes uneven; trim to the shortest
    let min_frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    for channel in &mut channels {
        channel.truncate(min_frames);
    }

    Ok(AudioBuffer::from_channels(channels, sample_rate))
}

/// Append one decoded packet to the planar output, converting to f64
fn append_planar(decoded: &AudioBufferRef, channels: &mut [Vec<Sample>]) {
    macro_rules! extend {
        ($buf:expr, $conv:expr) => {{
            let buf = $buf;
            let available = buf.spec().channels.count();
            for (ch, out) in channels.iter_mut().enumerate() {
                if ch < available {
                    out.extend(buf.chan(ch).iter().map($conv));
                }
            }
        }};
    }

    match decoded {
        AudioBufferRef::F32(buf) => extend!(buf, |&s| s as Sample),
        AudioBufferRef::F64(buf) => extend!(buf, |&s| s),
        AudioBufferRef::S8(buf) => extend!(buf, |&s| s as Sample / 128.0),
        AudioBufferRef::S16(buf) => extend!(buf, |&s| s as Sample / 32768.0),
        AudioBufferRef::S24(buf) => extend!(buf, |s| s.inner() as Sample / 8388608.0),
        AudioBufferRef::S32(buf) => extend!(buf, |&s| s as Sample / 2147483648.0),
        AudioBufferRef::U8(buf) => extend!(buf, |&s| (s as Sample - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => extend!(buf, |&s| (s as Sample - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => {
            extend!(buf, |s| (s.inner() as Sample - 8388608.0) / 8388608.0)
        }
        AudioBufferRef::U32(buf) => {
            extend!(buf, |&s| (s as Sample - 2147483648.0) / 2147483648.0)
        }
    }
}
