use dasp::{interpolate::linear::Linear, signal, Signal};

/// Converts `samples` from `from_hz` to `to_hz` with linear interpolation.
pub fn resample(samples: &[f32], from_hz: u32, to_hz: u32) -> Vec<f32> {
    if from_hz == to_hz || from_hz == 0 || to_hz == 0 || samples.len() < 2 {
        return samples.to_vec();
    }

    let target_len = (samples.len() as f64 * to_hz as f64 / from_hz as f64).round() as usize;

    let mut source = signal::from_iter(samples.iter().copied());
    let left = source.next();
    let right = source.next();
    let interpolator = Linear::new(left, right);

    source.from_hz_to_hz(interpolator, from_hz as f64, to_hz as f64)
        .take(target_len)
        .collect()
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3];
        assert_eq!(resample(&samples, 22050, 22050), samples);
    }

    #[test]
    fn test_lengths() {
        let samples = vec![0.0f32; 44100];
        assert_eq!(resample(&samples, 44100, 22050).len(), 22050);
        assert_eq!(resample(&samples, 44100, 48000).len(), 48000);
    }

    #[test]
    fn test_upsample_interpolates() {
        let samples = vec![0.0f32, 1.0, 0.0, 1.0];
        let upsampled = resample(&samples, 1, 2);
        assert_eq!(upsampled.len(), 8);
        assert_abs_diff_eq!(upsampled[0], 0.0);
        assert_abs_diff_eq!(upsampled[1], 0.5);
        assert_abs_diff_eq!(upsampled[2], 1.0);
    }

    #[test]
    fn test_short_input() {
        assert_eq!(resample(&[0.5], 44100, 22050), vec![0.5]);
    }
}
