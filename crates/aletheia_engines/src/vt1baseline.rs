#![forbid(unsafe_code)]

use aletheia_kernel_contracts::vt1baseline::UserVoiceBaseline;
use aletheia_kernel_contracts::vt1voice::AcousticFeatureVector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vt1BaselineConfig {
    /// Small positive floor preventing division by zero when a stored
    /// spread collapses to zero.
    pub sigma_floor: f64,
    /// Deviations are clipped at this many sigmas before normalization.
    pub max_sigma_distance: f64,
    /// The baseline store carries no spread for speech rate; this constant
    /// stands in for it.
    pub speech_rate_sigma: f64,
}

impl Vt1BaselineConfig {
    pub fn mvp_v1() -> Self {
        Self {
            sigma_floor: 1e-6,
            max_sigma_distance: 2.0,
            speech_rate_sigma: 0.5,
        }
    }
}

/// Normalized distance of the current turn's acoustic statistics from the
/// user's personal historical normal.
#[derive(Debug, Clone)]
pub struct Vt1BaselineRuntime {
    config: Vt1BaselineConfig,
}

impl Vt1BaselineRuntime {
    pub fn new(config: Vt1BaselineConfig) -> Self {
        Self { config }
    }

    /// Deviation in [0, 1]. An absent or unestablished baseline yields 0.0:
    /// no deviation can be claimed without data. Callers that need to
    /// distinguish "no data" from "no deviation" must check `established`
    /// separately.
    pub fn deviate(
        &self,
        features: &AcousticFeatureVector,
        baseline: Option<&UserVoiceBaseline>,
    ) -> f64 {
        let baseline = match baseline {
            Some(b) if b.established => b,
            _ => return 0.0,
        };

        let mut total = 0.0;
        let mut compared = 0u32;
        let per_feature = [
            (
                features.pitch_mean_hz,
                baseline.typical_pitch_mean_hz,
                baseline.typical_pitch_std_hz,
            ),
            (
                features.energy_mean,
                baseline.typical_energy_mean,
                baseline.typical_energy_std,
            ),
            (
                features.speech_rate_sps,
                baseline.typical_speech_rate_sps,
                self.config.speech_rate_sigma,
            ),
        ];
        for (current, typical, sigma) in per_feature {
            if let Some(current) = current {
                total += self.feature_deviation(current, typical, sigma);
                compared += 1;
            }
        }

        if compared == 0 {
            return 0.0;
        }
        total / f64::from(compared)
    }

    fn feature_deviation(&self, current: f64, typical: f64, sigma: f64) -> f64 {
        let spread = sigma.max(self.config.sigma_floor);
        let distance = ((current - typical).abs() / spread).min(self.config.max_sigma_distance);
        distance / self.config.max_sigma_distance
    }
}
