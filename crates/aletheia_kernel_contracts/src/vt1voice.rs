#![forbid(unsafe_code)]

use crate::common::{validate_unit_interval, ContractViolation, SchemaVersion, Validate};
use crate::vt1content::StatedEmotion;

pub const VT1VOICE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Coarse emotion label emitted by the acoustic emotion classifier
/// collaborator. This core never re-derives it from audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceEmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
}

impl VoiceEmotionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceEmotionLabel::Neutral => "neutral",
            VoiceEmotionLabel::Happy => "happy",
            VoiceEmotionLabel::Sad => "sad",
            VoiceEmotionLabel::Angry => "angry",
            VoiceEmotionLabel::Fear => "fear",
            VoiceEmotionLabel::Surprise => "surprise",
            VoiceEmotionLabel::Disgust => "disgust",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "neutral" => Some(VoiceEmotionLabel::Neutral),
            "happy" => Some(VoiceEmotionLabel::Happy),
            "sad" => Some(VoiceEmotionLabel::Sad),
            "angry" => Some(VoiceEmotionLabel::Angry),
            "fear" => Some(VoiceEmotionLabel::Fear),
            "surprise" => Some(VoiceEmotionLabel::Surprise),
            "disgust" => Some(VoiceEmotionLabel::Disgust),
            _ => None,
        }
    }

    /// Fixed valence table: happy/surprise are positive, sad/angry/fear/disgust
    /// are negative, neutral is neutral.
    pub fn valence(self) -> StatedEmotion {
        match self {
            VoiceEmotionLabel::Happy | VoiceEmotionLabel::Surprise => StatedEmotion::Positive,
            VoiceEmotionLabel::Sad
            | VoiceEmotionLabel::Angry
            | VoiceEmotionLabel::Fear
            | VoiceEmotionLabel::Disgust => StatedEmotion::Negative,
            VoiceEmotionLabel::Neutral => StatedEmotion::Neutral,
        }
    }
}

/// Named scalar statistics from the acoustic front end. Every field is
/// optional: a collaborator that could not compute a statistic hands over
/// `None`, and downstream flags derived from it stay false.
///
/// Invariant: present values are finite; `pause_ratio` and
/// `zero_crossing_rate` are fractions in [0, 1]. Raw collaborator output is
/// passed through `sanitized()` at the ingestion boundary so that a single
/// bad statistic degrades to "missing" instead of failing the turn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcousticFeatureVector {
    pub pitch_mean_hz: Option<f64>,
    pub pitch_std_hz: Option<f64>,
    pub pitch_range_hz: Option<f64>,
    pub energy_mean: Option<f64>,
    pub energy_std: Option<f64>,
    pub speech_rate_sps: Option<f64>,
    pub pause_ratio: Option<f64>,
    pub zero_crossing_rate: Option<f64>,
}

impl AcousticFeatureVector {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces non-finite or out-of-range statistics with `None`.
    pub fn sanitized(&self) -> Self {
        Self {
            pitch_mean_hz: keep_finite(self.pitch_mean_hz),
            pitch_std_hz: keep_non_negative(self.pitch_std_hz),
            pitch_range_hz: keep_non_negative(self.pitch_range_hz),
            energy_mean: keep_finite(self.energy_mean),
            energy_std: keep_non_negative(self.energy_std),
            speech_rate_sps: keep_non_negative(self.speech_rate_sps),
            pause_ratio: keep_fraction(self.pause_ratio),
            zero_crossing_rate: keep_fraction(self.zero_crossing_rate),
        }
    }
}

impl Validate for AcousticFeatureVector {
    fn validate(&self) -> Result<(), ContractViolation> {
        crate::common::validate_finite_opt("acoustic_features.pitch_mean_hz", self.pitch_mean_hz)?;
        crate::common::validate_finite_opt("acoustic_features.pitch_std_hz", self.pitch_std_hz)?;
        crate::common::validate_finite_opt(
            "acoustic_features.pitch_range_hz",
            self.pitch_range_hz,
        )?;
        crate::common::validate_finite_opt("acoustic_features.energy_mean", self.energy_mean)?;
        crate::common::validate_finite_opt("acoustic_features.energy_std", self.energy_std)?;
        crate::common::validate_finite_opt(
            "acoustic_features.speech_rate_sps",
            self.speech_rate_sps,
        )?;
        if let Some(v) = self.pause_ratio {
            validate_unit_interval("acoustic_features.pause_ratio", v)?;
        }
        if let Some(v) = self.zero_crossing_rate {
            validate_unit_interval("acoustic_features.zero_crossing_rate", v)?;
        }
        Ok(())
    }
}

fn keep_finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn keep_non_negative(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x >= 0.0)
}

fn keep_fraction(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && (0.0..=1.0).contains(x))
}

/// The acoustic emotion classifier's verdict for one turn. Absence of this
/// block is the single fatal input error of the whole core.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceEmotionSignal {
    pub schema_version: SchemaVersion,
    pub label: VoiceEmotionLabel,
    pub confidence: f64,
    pub features: AcousticFeatureVector,
}

impl VoiceEmotionSignal {
    pub fn v1(
        label: VoiceEmotionLabel,
        confidence: f64,
        features: AcousticFeatureVector,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1VOICE_CONTRACT_VERSION,
            label,
            confidence,
            features,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for VoiceEmotionSignal {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1VOICE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "voice_emotion.schema_version",
                reason: "must match VT1VOICE_CONTRACT_VERSION",
            });
        }
        validate_unit_interval("voice_emotion.confidence", self.confidence)?;
        self.features.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_voice_contract_01_sanitize_maps_non_finite_to_missing() {
        let raw = AcousticFeatureVector {
            pitch_mean_hz: Some(f64::NAN),
            pitch_std_hz: Some(f64::INFINITY),
            pitch_range_hz: Some(-4.0),
            energy_mean: Some(0.4),
            energy_std: Some(0.1),
            speech_rate_sps: Some(3.2),
            pause_ratio: Some(1.4),
            zero_crossing_rate: Some(0.08),
        };
        let clean = raw.sanitized();
        assert_eq!(clean.pitch_mean_hz, None);
        assert_eq!(clean.pitch_std_hz, None);
        assert_eq!(clean.pitch_range_hz, None);
        assert_eq!(clean.pause_ratio, None);
        assert_eq!(clean.energy_mean, Some(0.4));
        assert_eq!(clean.zero_crossing_rate, Some(0.08));
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn at_voice_contract_02_validate_rejects_non_finite_statistic() {
        let raw = AcousticFeatureVector {
            pitch_mean_hz: Some(f64::NAN),
            ..AcousticFeatureVector::empty()
        };
        assert!(matches!(
            raw.validate(),
            Err(ContractViolation::NotFinite { .. })
        ));
    }

    #[test]
    fn at_voice_contract_03_signal_confidence_must_be_unit_interval() {
        assert!(
            VoiceEmotionSignal::v1(VoiceEmotionLabel::Sad, 1.2, AcousticFeatureVector::empty())
                .is_err()
        );
        assert!(
            VoiceEmotionSignal::v1(VoiceEmotionLabel::Sad, 0.9, AcousticFeatureVector::empty())
                .is_ok()
        );
    }

    #[test]
    fn at_voice_contract_04_valence_table_is_fixed() {
        assert_eq!(VoiceEmotionLabel::Happy.valence(), StatedEmotion::Positive);
        assert_eq!(
            VoiceEmotionLabel::Surprise.valence(),
            StatedEmotion::Positive
        );
        assert_eq!(VoiceEmotionLabel::Sad.valence(), StatedEmotion::Negative);
        assert_eq!(VoiceEmotionLabel::Angry.valence(), StatedEmotion::Negative);
        assert_eq!(VoiceEmotionLabel::Fear.valence(), StatedEmotion::Negative);
        assert_eq!(
            VoiceEmotionLabel::Disgust.valence(),
            StatedEmotion::Negative
        );
        assert_eq!(VoiceEmotionLabel::Neutral.valence(), StatedEmotion::Neutral);
    }

    #[test]
    fn at_voice_contract_05_label_parse_round_trips() {
        for label in [
            VoiceEmotionLabel::Neutral,
            VoiceEmotionLabel::Happy,
            VoiceEmotionLabel::Sad,
            VoiceEmotionLabel::Angry,
            VoiceEmotionLabel::Fear,
            VoiceEmotionLabel::Surprise,
            VoiceEmotionLabel::Disgust,
        ] {
            assert_eq!(VoiceEmotionLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(VoiceEmotionLabel::parse("bored"), None);
    }
}
