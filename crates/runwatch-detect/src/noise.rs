//! Noise level from audio magnitudes.
//!
//! `40 + mean(magnitudes) / 2` is a linear heuristic, not a calibrated dB
//! measurement. Thresholds are tuned against it.

/// Reported level when no audio is available.
pub const BASELINE_NOISE_LEVEL: f64 = 40.0;

/// Noise level for one frequency-domain magnitude frame.
///
/// `None` or an empty frame (microphone unavailable) gives the baseline.
pub fn noise_level(magnitudes: Option<&[u8]>) -> f64 {
    match magnitudes {
        Some(m) if !m.is_empty() => {
            let sum: u64 = m.iter().map(|&v| u64::from(v)).sum();
            BASELINE_NOISE_LEVEL + (sum as f64 / m.len() as f64) / 2.0
        }
        _ => BASELINE_NOISE_LEVEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_without_audio() {
        assert_eq!(noise_level(None), 40.0);
        assert_eq!(noise_level(Some(&[])), 40.0);
    }

    #[test]
    fn test_linear_mapping() {
        assert_eq!(noise_level(Some(&[0, 0, 0, 0])), 40.0);
        assert_eq!(noise_level(Some(&[60, 80])), 75.0);
        assert_eq!(noise_level(Some(&[255; 8])), 167.5);
    }
}
