#![forbid(unsafe_code)]

use crate::common::{ContractViolation, SchemaVersion, Validate};

pub const VT1CULTURAL_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CulturalSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CulturalSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            CulturalSeverity::Low => "low",
            CulturalSeverity::Medium => "medium",
            CulturalSeverity::High => "high",
            CulturalSeverity::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(CulturalSeverity::Low),
            "medium" => Some(CulturalSeverity::Medium),
            "high" => Some(CulturalSeverity::High),
            "critical" => Some(CulturalSeverity::Critical),
            _ => None,
        }
    }
}

/// One phrase match produced by the external cultural knowledge store:
/// a phrase that is lexically mild but culturally coded for concealment or
/// distress, with the store's severity judgment attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CulturalPatternMatch {
    pub schema_version: SchemaVersion,
    pub phrase: String,
    pub severity: CulturalSeverity,
    pub cultural_meaning: String,
}

impl CulturalPatternMatch {
    pub fn v1(
        phrase: impl Into<String>,
        severity: CulturalSeverity,
        cultural_meaning: impl Into<String>,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1CULTURAL_CONTRACT_VERSION,
            phrase: phrase.into(),
            severity,
            cultural_meaning: cultural_meaning.into(),
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for CulturalPatternMatch {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1CULTURAL_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "cultural_match.schema_version",
                reason: "must match VT1CULTURAL_CONTRACT_VERSION",
            });
        }
        if self.phrase.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "cultural_match.phrase",
                reason: "must not be empty",
            });
        }
        if self.phrase.chars().count() > 256 {
            return Err(ContractViolation::InvalidValue {
                field: "cultural_match.phrase",
                reason: "exceeds max length",
            });
        }
        if self.cultural_meaning.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "cultural_match.cultural_meaning",
                reason: "must not be empty",
            });
        }
        if self.cultural_meaning.chars().count() > 512 {
            return Err(ContractViolation::InvalidValue {
                field: "cultural_match.cultural_meaning",
                reason: "exceeds max length",
            });
        }
        Ok(())
    }
}
