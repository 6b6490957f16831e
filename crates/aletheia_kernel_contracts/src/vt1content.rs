#![forbid(unsafe_code)]

use crate::common::{
    validate_token, validate_unit_interval, ContractViolation, SchemaVersion, Validate,
};

pub const VT1CONTENT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const TRANSCRIPT_MAX_CHARS: usize = 8192;

/// One transcribed utterance from the speech-to-text collaborator.
/// Empty text is a valid state (silence), not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: Option<String>,
}

impl Transcript {
    pub fn v1(
        text: impl Into<String>,
        language: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            text: text.into(),
            language,
        };
        v.validate()?;
        Ok(v)
    }

    pub fn is_silent(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl Validate for Transcript {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.text.chars().count() > TRANSCRIPT_MAX_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "transcript.text",
                reason: "exceeds max length",
            });
        }
        if let Some(lang) = &self.language {
            validate_token("transcript.language", lang, 32)?;
        }
        Ok(())
    }
}

/// Coarse valence of what the speaker said, as opposed to how they sounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatedEmotion {
    Positive,
    Negative,
    Neutral,
}

impl StatedEmotion {
    pub fn as_str(self) -> &'static str {
        match self {
            StatedEmotion::Positive => "positive",
            StatedEmotion::Negative => "negative",
            StatedEmotion::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentClassification {
    pub schema_version: SchemaVersion,
    pub stated_emotion: StatedEmotion,
    pub confidence: f64,
}

impl ContentClassification {
    pub fn v1(stated_emotion: StatedEmotion, confidence: f64) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1CONTENT_CONTRACT_VERSION,
            stated_emotion,
            confidence,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for ContentClassification {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1CONTENT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "content_classification.schema_version",
                reason: "must match VT1CONTENT_CONTRACT_VERSION",
            });
        }
        validate_unit_interval("content_classification.confidence", self.confidence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_content_contract_01_empty_transcript_is_valid_silence() {
        let t = Transcript::v1("", None).unwrap();
        assert!(t.is_silent());
        let t = Transcript::v1("   ", None).unwrap();
        assert!(t.is_silent());
    }

    #[test]
    fn at_content_contract_02_language_token_is_validated_when_present() {
        assert!(Transcript::v1("hello", Some("".to_string())).is_err());
        assert!(Transcript::v1("hello", Some("en".to_string())).is_ok());
    }

    #[test]
    fn at_content_contract_03_oversized_transcript_is_rejected() {
        let long = "a".repeat(TRANSCRIPT_MAX_CHARS + 1);
        assert!(Transcript::v1(long, None).is_err());
    }

    #[test]
    fn at_content_contract_04_classification_confidence_bounds() {
        assert!(ContentClassification::v1(StatedEmotion::Neutral, 0.0).is_ok());
        assert!(ContentClassification::v1(StatedEmotion::Positive, -0.1).is_err());
    }
}
