#![forbid(unsafe_code)]

use aletheia_kernel_contracts::vt1content::{ContentClassification, StatedEmotion};
use aletheia_kernel_contracts::vt1dissonance::{
    DissonanceResult, DissonanceType, DISSONANCE_CONGRUENT_CEILING,
};
use aletheia_kernel_contracts::vt1micro::MicroMomentMap;
use aletheia_kernel_contracts::vt1voice::VoiceEmotionSignal;
use aletheia_kernel_contracts::ContractViolation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vt1DissonanceConfig {
    /// Base score when stated and voice valence are opposite polarities.
    pub polar_mismatch_base: f64,
    /// Base score for any other mismatch (one side neutral).
    pub partial_mismatch_base: f64,
    pub amplification_per_moment: f64,
    pub amplification_cap: f64,
    /// Floor applied to the base score, before amplification, when a
    /// claimed-positive statement co-occurs with clustered stress markers.
    pub concealment_floor: f64,
    pub concealment_min_moments: u8,
    /// Scores in [congruent_ceiling, elevated_ceiling) are moderate
    /// dissonance; at or above elevated_ceiling the voice is trusted with
    /// moment-scaled confidence.
    pub congruent_ceiling: f64,
    pub elevated_ceiling: f64,
}

impl Vt1DissonanceConfig {
    pub fn mvp_v1() -> Self {
        Self {
            polar_mismatch_base: 0.8,
            partial_mismatch_base: 0.4,
            amplification_per_moment: 0.1,
            amplification_cap: 0.3,
            concealment_floor: 0.7,
            concealment_min_moments: 2,
            congruent_ceiling: DISSONANCE_CONGRUENT_CEILING,
            elevated_ceiling: 0.6,
        }
    }
}

/// Fuses the stated emotion, the voice-emotion label, and the involuntary
/// markers into a dissonance score, a dissonance type, and the truth
/// signal. Pure over its inputs; `baseline_deviation` is caller-attached
/// pass-through and never influences the score.
#[derive(Debug, Clone)]
pub struct Vt1DissonanceRuntime {
    config: Vt1DissonanceConfig,
}

impl Vt1DissonanceRuntime {
    pub fn new(config: Vt1DissonanceConfig) -> Self {
        Self { config }
    }

    pub fn detect(
        &self,
        stated: &ContentClassification,
        voice: &VoiceEmotionSignal,
        micro_moments: &MicroMomentMap,
        baseline_deviation: f64,
    ) -> Result<DissonanceResult, ContractViolation> {
        let voice_valence = voice.label.valence();
        let moment_count = micro_moments.count();

        let mut base = match (stated.stated_emotion, voice_valence) {
            (s, v) if s == v => 0.0,
            (StatedEmotion::Positive, StatedEmotion::Negative)
            | (StatedEmotion::Negative, StatedEmotion::Positive) => {
                self.config.polar_mismatch_base
            }
            _ => self.config.partial_mismatch_base,
        };

        // Two or more involuntary stress signals under a claimed-positive
        // statement are treated as near-certain concealment regardless of
        // the raw valence mismatch.
        if stated.stated_emotion == StatedEmotion::Positive
            && moment_count >= self.config.concealment_min_moments
        {
            base = base.max(self.config.concealment_floor);
        }

        let amplification = (self.config.amplification_per_moment * f64::from(moment_count))
            .min(self.config.amplification_cap);
        let dissonance_score = (base + amplification).min(1.0);

        // Tie-break rule: once dissonance crosses the congruent ceiling the
        // voice is always trusted over the stated text.
        let truth_confidence = if dissonance_score < self.config.congruent_ceiling {
            0.9
        } else if dissonance_score < self.config.elevated_ceiling {
            0.75
        } else {
            (0.6 + 0.1 * f64::from(moment_count)).min(0.95)
        };

        let dissonance_type = if dissonance_score < self.config.congruent_ceiling {
            DissonanceType::Congruent
        } else {
            match (stated.stated_emotion, voice_valence) {
                (StatedEmotion::Positive, StatedEmotion::Negative) => {
                    DissonanceType::DefensiveConcealment
                }
                (StatedEmotion::Negative, StatedEmotion::Positive) => DissonanceType::Exaggeration,
                (StatedEmotion::Neutral, StatedEmotion::Negative) => DissonanceType::Minimization,
                _ => DissonanceType::MixedSignals,
            }
        };

        DissonanceResult::v1(
            stated.stated_emotion,
            stated.confidence,
            voice.label,
            voice.confidence,
            dissonance_score,
            dissonance_type,
            voice.label,
            truth_confidence,
            *micro_moments,
            baseline_deviation,
        )
    }
}
