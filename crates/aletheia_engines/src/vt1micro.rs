#![forbid(unsafe_code)]

use aletheia_kernel_contracts::vt1micro::MicroMomentMap;
use aletheia_kernel_contracts::vt1voice::AcousticFeatureVector;
use aletheia_kernel_contracts::ContractViolation;

/// Fixed thresholds for the involuntary-marker flags. Tunable constants,
/// not per-deployment hard-codes; `mvp_v1()` carries the shipped values.
///
/// Pitch-variability bands: flat prosody below `flat_pitch_std_max_hz`,
/// tremor above `tremor_pitch_std_min_hz`, nothing in between. The gap
/// keeps the two flags mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vt1MicroConfig {
    pub tremor_pitch_std_min_hz: f64,
    pub flat_pitch_std_max_hz: f64,
    pub crack_pitch_range_min_hz: f64,
    pub sigh_energy_std_min: f64,
    pub hesitation_pause_ratio_min: f64,
    pub harsh_zcr_min: f64,
}

impl Vt1MicroConfig {
    pub fn mvp_v1() -> Self {
        Self {
            tremor_pitch_std_min_hz: 30.0,
            flat_pitch_std_max_hz: 10.0,
            crack_pitch_range_min_hz: 180.0,
            sigh_energy_std_min: 0.15,
            hesitation_pause_ratio_min: 0.35,
            harsh_zcr_min: 0.12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vt1MicroRuntime {
    config: Vt1MicroConfig,
}

impl Vt1MicroRuntime {
    pub fn new(config: Vt1MicroConfig) -> Result<Self, ContractViolation> {
        if config.flat_pitch_std_max_hz >= config.tremor_pitch_std_min_hz {
            return Err(ContractViolation::InvalidValue {
                field: "micro_config",
                reason: "flat-prosody band must end below the tremor band",
            });
        }
        Ok(Self { config })
    }

    /// Each flag is computed independently from one named statistic; a
    /// missing statistic yields false, never an error.
    pub fn analyze(&self, features: &AcousticFeatureVector) -> MicroMomentMap {
        let voice_tremor = above(features.pitch_std_hz, self.config.tremor_pitch_std_min_hz);
        let flat_prosody = below(features.pitch_std_hz, self.config.flat_pitch_std_max_hz);
        let voice_crack = above(features.pitch_range_hz, self.config.crack_pitch_range_min_hz);
        let sigh_detected = above(features.energy_std, self.config.sigh_energy_std_min);
        let hesitation = above(features.pause_ratio, self.config.hesitation_pause_ratio_min);
        let harsh_voice = above(
            features.zero_crossing_rate,
            self.config.harsh_zcr_min,
        );

        MicroMomentMap::v1(
            voice_tremor,
            voice_crack,
            flat_prosody,
            sigh_detected,
            hesitation,
            harsh_voice,
        )
        .expect("disjoint pitch-variability bands cannot assert tremor and flat prosody together")
    }
}

fn above(value: Option<f64>, threshold: f64) -> bool {
    matches!(value, Some(v) if v > threshold)
}

fn below(value: Option<f64>, threshold: f64) -> bool {
    matches!(value, Some(v) if v < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Vt1MicroRuntime {
        Vt1MicroRuntime::new(Vt1MicroConfig::mvp_v1()).unwrap()
    }

    fn features() -> AcousticFeatureVector {
        AcousticFeatureVector::empty()
    }

    #[test]
    fn at_micro_01_overlapping_bands_are_rejected_at_construction() {
        let mut config = Vt1MicroConfig::mvp_v1();
        config.flat_pitch_std_max_hz = 30.0;
        assert!(Vt1MicroRuntime::new(config).is_err());
    }

    #[test]
    fn at_micro_02_missing_features_assert_nothing() {
        let out = runtime().analyze(&features());
        assert_eq!(out.count(), 0);
    }

    #[test]
    fn at_micro_03_pitch_variability_band_boundaries() {
        let mut f = features();
        f.pitch_std_hz = Some(9.9);
        let out = runtime().analyze(&f);
        assert!(out.flat_prosody);
        assert!(!out.voice_tremor);

        // The band edges themselves belong to the neutral gap.
        f.pitch_std_hz = Some(10.0);
        let out = runtime().analyze(&f);
        assert!(!out.flat_prosody);
        assert!(!out.voice_tremor);

        f.pitch_std_hz = Some(30.0);
        let out = runtime().analyze(&f);
        assert!(!out.flat_prosody);
        assert!(!out.voice_tremor);

        f.pitch_std_hz = Some(30.1);
        let out = runtime().analyze(&f);
        assert!(!out.flat_prosody);
        assert!(out.voice_tremor);
    }

    #[test]
    fn at_micro_04_each_flag_tracks_its_own_statistic() {
        let mut f = features();
        f.pitch_range_hz = Some(200.0);
        f.energy_std = Some(0.2);
        f.pause_ratio = Some(0.4);
        f.zero_crossing_rate = Some(0.15);
        let out = runtime().analyze(&f);
        assert!(out.voice_crack);
        assert!(out.sigh_detected);
        assert!(out.hesitation);
        assert!(out.harsh_voice);
        assert!(!out.voice_tremor);
        assert!(!out.flat_prosody);
        assert_eq!(out.count(), 4);
    }

    #[test]
    fn at_micro_05_thresholds_are_exclusive_at_the_boundary() {
        let mut f = features();
        f.pause_ratio = Some(0.35);
        assert!(!runtime().analyze(&f).hesitation);
        f.pause_ratio = Some(0.36);
        assert!(runtime().analyze(&f).hesitation);
    }
}
