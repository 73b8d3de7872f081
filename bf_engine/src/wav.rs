use std::path::Path;

use hound::SampleFormat;

use crate::wav::WavError::{ReadError, WriteError};

const SPEC_BITS_PER_SAMPLE: u16 = 16;

#[derive(thiserror::Error, Debug)]
pub enum WavError {
    #[error("failed to read audio file: {source}")]
    ReadError {
        source: hound::Error,
    },

    #[error("failed to write audio file: {source}")]
    WriteError {
        source: hound::Error,
    },

    #[error("unsupported sample format: {bits_per_sample} bit {format:?}")]
    UnsupportedSampleFormat {
        format: SampleFormat,
        bits_per_sample: u16,
    },
}

/// Decodes a WAV file into mono samples in `[-1, 1]` and its sample rate. Channels are averaged.
pub fn read<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32), WavError> {
    let mut reader = hound::WavReader::open(path).map_err(|e| ReadError { source: e })?;
    let spec = reader.spec();

    let interleaved = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ReadError { source: e })?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader.samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ReadError { source: e })?
        }
        (format, bits_per_sample) => {
            return Err(WavError::UnsupportedSampleFormat { format, bits_per_sample });
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((samples, spec.sample_rate))
}

/// Encodes mono samples as 16 bit PCM. Samples outside `[-1, 1]` are clipped.
pub fn write<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<(), WavError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: SPEC_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| WriteError { source: e })?;

    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .map_err(|e| WriteError { source: e })?;
    }

    writer.finalize().map_err(|e| WriteError { source: e })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let samples: Vec<f32> = (0..64).map(|i| i as f32 / 64.0 - 0.5).collect();

        write(&path, &samples, 22050).unwrap();
        let (read_back, sample_rate) = read(&path).unwrap();

        assert_eq!(sample_rate, 22050);
        assert_eq!(read_back.len(), samples.len());
        for (a, b) in read_back.iter().zip(&samples) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_write_clips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loud.wav");

        write(&path, &[2.0, -2.0], 44100).unwrap();
        let (read_back, _) = read(&path).unwrap();

        assert_abs_diff_eq!(read_back[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(read_back[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_read_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(1.0f32, 0.0f32), (0.5, 0.5), (-1.0, 0.0)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, sample_rate) = read(&path).unwrap();
        assert_eq!(sample_rate, 8000);
        assert_eq!(samples, vec![0.5, 0.5, -0.5]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read(dir.path().join("missing.wav"));
        assert!(matches!(result, Err(ReadError { .. })));
    }
}
