#![forbid(unsafe_code)]

use crate::common::{validate_unit_interval, ContractViolation, SchemaVersion, Validate};
use crate::vt1content::StatedEmotion;
use crate::vt1micro::MicroMomentMap;
use crate::vt1voice::VoiceEmotionLabel;

pub const VT1DISSONANCE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Scores below this value are congruent: words and voice agree closely
/// enough that neither signal needs to be distrusted.
pub const DISSONANCE_CONGRUENT_CEILING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DissonanceType {
    Congruent,
    DefensiveConcealment,
    Exaggeration,
    Minimization,
    MixedSignals,
}

impl DissonanceType {
    pub fn as_str(self) -> &'static str {
        match self {
            DissonanceType::Congruent => "congruent",
            DissonanceType::DefensiveConcealment => "defensive_concealment",
            DissonanceType::Exaggeration => "exaggeration",
            DissonanceType::Minimization => "minimization",
            DissonanceType::MixedSignals => "mixed_signals",
        }
    }
}

/// Per-turn verdict on whether words and voice disagree, and which signal
/// to trust. Transient: assembled per turn and handed downstream, never
/// persisted by this core.
#[derive(Debug, Clone, PartialEq)]
pub struct DissonanceResult {
    pub schema_version: SchemaVersion,
    pub stated_emotion: StatedEmotion,
    pub stated_confidence: f64,
    pub voice_emotion: VoiceEmotionLabel,
    pub voice_confidence: f64,
    pub dissonance_score: f64,
    pub dissonance_type: DissonanceType,
    pub truth_signal: VoiceEmotionLabel,
    pub truth_confidence: f64,
    pub micro_moments: MicroMomentMap,
    pub baseline_deviation: f64,
}

impl DissonanceResult {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        stated_emotion: StatedEmotion,
        stated_confidence: f64,
        voice_emotion: VoiceEmotionLabel,
        voice_confidence: f64,
        dissonance_score: f64,
        dissonance_type: DissonanceType,
        truth_signal: VoiceEmotionLabel,
        truth_confidence: f64,
        micro_moments: MicroMomentMap,
        baseline_deviation: f64,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1DISSONANCE_CONTRACT_VERSION,
            stated_emotion,
            stated_confidence,
            voice_emotion,
            voice_confidence,
            dissonance_score,
            dissonance_type,
            truth_signal,
            truth_confidence,
            micro_moments,
            baseline_deviation,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for DissonanceResult {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1DISSONANCE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "dissonance.schema_version",
                reason: "must match VT1DISSONANCE_CONTRACT_VERSION",
            });
        }
        validate_unit_interval("dissonance.stated_confidence", self.stated_confidence)?;
        validate_unit_interval("dissonance.voice_confidence", self.voice_confidence)?;
        validate_unit_interval("dissonance.dissonance_score", self.dissonance_score)?;
        validate_unit_interval("dissonance.truth_confidence", self.truth_confidence)?;
        validate_unit_interval("dissonance.baseline_deviation", self.baseline_deviation)?;
        self.micro_moments.validate()?;

        // Words are assumed more susceptible to conscious concealment than
        // involuntary acoustic signals; the truth signal is the voice label.
        if self.truth_signal != self.voice_emotion {
            return Err(ContractViolation::InvalidValue {
                field: "dissonance.truth_signal",
                reason: "must equal the voice emotion label",
            });
        }

        let congruent = self.dissonance_score < DISSONANCE_CONGRUENT_CEILING;
        if congruent != (self.dissonance_type == DissonanceType::Congruent) {
            return Err(ContractViolation::InvalidValue {
                field: "dissonance.dissonance_type",
                reason: "congruent iff dissonance_score < 0.3",
            });
        }
        match self.dissonance_type {
            DissonanceType::DefensiveConcealment if self.stated_emotion != StatedEmotion::Positive => {
                return Err(ContractViolation::InvalidValue {
                    field: "dissonance.dissonance_type",
                    reason: "defensive_concealment requires a positive stated emotion",
                });
            }
            DissonanceType::Exaggeration if self.stated_emotion != StatedEmotion::Negative => {
                return Err(ContractViolation::InvalidValue {
                    field: "dissonance.dissonance_type",
                    reason: "exaggeration requires a negative stated emotion",
                });
            }
            DissonanceType::Minimization if self.stated_emotion != StatedEmotion::Neutral => {
                return Err(ContractViolation::InvalidValue {
                    field: "dissonance.dissonance_type",
                    reason: "minimization requires a neutral stated emotion",
                });
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_result() -> DissonanceResult {
        DissonanceResult {
            schema_version: VT1DISSONANCE_CONTRACT_VERSION,
            stated_emotion: StatedEmotion::Positive,
            stated_confidence: 0.8,
            voice_emotion: VoiceEmotionLabel::Sad,
            voice_confidence: 0.9,
            dissonance_score: 0.8,
            dissonance_type: DissonanceType::DefensiveConcealment,
            truth_signal: VoiceEmotionLabel::Sad,
            truth_confidence: 0.8,
            micro_moments: MicroMomentMap::none(),
            baseline_deviation: 0.0,
        }
    }

    #[test]
    fn at_dissonance_contract_01_truth_signal_must_be_voice_label() {
        let mut r = base_result();
        r.truth_signal = VoiceEmotionLabel::Happy;
        assert!(r.validate().is_err());
    }

    #[test]
    fn at_dissonance_contract_02_congruent_type_must_match_score_band() {
        let mut r = base_result();
        r.dissonance_type = DissonanceType::Congruent;
        assert!(r.validate().is_err());

        let mut r = base_result();
        r.dissonance_score = 0.1;
        assert!(r.validate().is_err());
    }

    #[test]
    fn at_dissonance_contract_03_type_requires_matching_stated_polarity() {
        let mut r = base_result();
        r.stated_emotion = StatedEmotion::Neutral;
        assert!(r.validate().is_err());

        r.dissonance_type = DissonanceType::Minimization;
        assert!(r.validate().is_ok());
    }
}
