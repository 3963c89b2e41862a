use anyhow::Context;
use rubato::Resampler;

/// Upload rate for recorded turns.
pub const UPLOAD_SAMPLE_RATE_HZ: u32 = 16_000;

/// Resample mono f32 audio to a target sample rate.
///
/// Input is expected to be PCM samples in [-1, 1] with a known sample rate.
pub fn resample_mono_f32(
    input_samples: &[f32],
    input_sample_rate_hz: u32,
    target_sample_rate_hz: u32,
) -> anyhow::Result<Vec<f32>> {
    if input_sample_rate_hz == target_sample_rate_hz || input_samples.is_empty() {
        return Ok(input_samples.to_vec());
    }
    if input_sample_rate_hz == 0 || target_sample_rate_hz == 0 {
        anyhow::bail!(
            "invalid sample rates: {input_sample_rate_hz} -> {target_sample_rate_hz}"
        );
    }

    let params = rubato::SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: rubato::SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: rubato::WindowFunction::BlackmanHarris2,
    };

    let mut resampler = rubato::SincFixedIn::<f32>::new(
        f64::from(target_sample_rate_hz) / f64::from(input_sample_rate_hz),
        2.0,
        params,
        input_samples.len(),
        1,
    )
    .context("create resampler")?;

    let input = vec![input_samples.to_vec()];
    let out = resampler.process(&input, None).context("resample")?;
    Ok(out.into_iter().next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_returns_same() {
        let x = vec![0.0, 0.5, -0.5, 0.25];
        let y = resample_mono_f32(&x, 16_000, 16_000).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn empty_input_stays_empty() {
        let y = resample_mono_f32(&[], 48_000, UPLOAD_SAMPLE_RATE_HZ).unwrap();
        assert!(y.is_empty());
    }

    #[test]
    fn downsampling_shrinks_by_ratio() {
        let x: Vec<f32> = (0..4_800).map(|i| ((i as f32) * 0.01).sin() * 0.5).collect();
        let y = resample_mono_f32(&x, 48_000, UPLOAD_SAMPLE_RATE_HZ).unwrap();
        assert!(y.len().abs_diff(1_600) <= 4, "got {} samples", y.len());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_mono_f32(&[0.1], 0, 16_000).is_err());
    }
}
