#![forbid(unsafe_code)]

use aletheia_kernel_contracts::vt1content::{ContentClassification, StatedEmotion, Transcript};
use aletheia_kernel_contracts::vt1lexicon::PhraseTable;
use aletheia_kernel_contracts::ContractViolation;
use aletheia_kernel_contracts::Validate;

use crate::lexicon::{contains_phrase, normalize_text};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vt1ContentConfig {
    /// Deliberately lower than a genuine positive: deflection is
    /// inherently ambiguous.
    pub deflection_confidence: f64,
    pub polar_confidence: f64,
    pub neutral_confidence: f64,
}

impl Vt1ContentConfig {
    pub fn mvp_v1() -> Self {
        Self {
            deflection_confidence: 0.6,
            polar_confidence: 0.8,
            neutral_confidence: 0.5,
        }
    }
}

/// Stated-emotion classifier over the transcript: phrase-table aware, with
/// culturally coded deflections checked ahead of the plain polarity lists.
/// Pure over text + injected tables.
#[derive(Debug, Clone)]
pub struct Vt1ContentRuntime {
    config: Vt1ContentConfig,
    table: PhraseTable,
}

impl Vt1ContentRuntime {
    pub fn new(config: Vt1ContentConfig, table: PhraseTable) -> Result<Self, ContractViolation> {
        for (field, value) in [
            ("content_config.deflection_confidence", config.deflection_confidence),
            ("content_config.polar_confidence", config.polar_confidence),
            ("content_config.neutral_confidence", config.neutral_confidence),
        ] {
            aletheia_kernel_contracts::common::validate_unit_interval(field, value)?;
        }
        table.validate()?;
        Ok(Self { config, table })
    }

    pub fn classify(&self, transcript: &Transcript) -> ContentClassification {
        if transcript.is_silent() {
            // Zero confidence, not absence of a value.
            return classification(StatedEmotion::Neutral, 0.0);
        }

        let text = normalize_text(&transcript.text);
        if contains_phrase(&text, &self.table.deflection).is_some() {
            return classification(StatedEmotion::Positive, self.config.deflection_confidence);
        }
        if contains_phrase(&text, &self.table.positive).is_some() {
            return classification(StatedEmotion::Positive, self.config.polar_confidence);
        }
        if contains_phrase(&text, &self.table.negative).is_some() {
            return classification(StatedEmotion::Negative, self.config.polar_confidence);
        }
        classification(StatedEmotion::Neutral, self.config.neutral_confidence)
    }
}

fn classification(stated_emotion: StatedEmotion, confidence: f64) -> ContentClassification {
    ContentClassification::v1(stated_emotion, confidence)
        .expect("content classification confidences are fixed unit-interval constants")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Vt1ContentRuntime {
        Vt1ContentRuntime::new(Vt1ContentConfig::mvp_v1(), PhraseTable::mvp_v1()).unwrap()
    }

    fn transcript(text: &str) -> Transcript {
        Transcript::v1(text, Some("en".to_string())).unwrap()
    }

    #[test]
    fn at_content_01_empty_transcript_is_neutral_with_zero_confidence() {
        let out = runtime().classify(&transcript(""));
        assert_eq!(out.stated_emotion, StatedEmotion::Neutral);
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn at_content_02_deflection_short_circuits_at_lower_confidence() {
        let out = runtime().classify(&transcript("I'm fine, really, feeling great"));
        assert_eq!(out.stated_emotion, StatedEmotion::Positive);
        assert_eq!(out.confidence, 0.6);
    }

    #[test]
    fn at_content_03_plain_positive_scores_higher_than_deflection() {
        let out = runtime().classify(&transcript("Things are going well lately"));
        assert_eq!(out.stated_emotion, StatedEmotion::Positive);
        assert_eq!(out.confidence, 0.8);
    }

    #[test]
    fn at_content_04_negative_phrases_classify_negative() {
        let out = runtime().classify(&transcript("Everything feels hopeless"));
        assert_eq!(out.stated_emotion, StatedEmotion::Negative);
        assert_eq!(out.confidence, 0.8);
    }

    #[test]
    fn at_content_05_unmatched_text_defaults_to_weak_neutral() {
        let out = runtime().classify(&transcript("The meeting moved to Tuesday"));
        assert_eq!(out.stated_emotion, StatedEmotion::Neutral);
        assert_eq!(out.confidence, 0.5);
    }

    #[test]
    fn at_content_06_matching_is_case_and_apostrophe_insensitive() {
        let out = runtime().classify(&transcript("I\u{2019}M FINE"));
        assert_eq!(out.stated_emotion, StatedEmotion::Positive);
        assert_eq!(out.confidence, 0.6);
    }

    #[test]
    fn at_content_07_out_of_range_confidences_are_rejected_at_construction() {
        let mut config = Vt1ContentConfig::mvp_v1();
        config.polar_confidence = 1.2;
        assert!(Vt1ContentRuntime::new(config, PhraseTable::mvp_v1()).is_err());
    }
}
