#![forbid(unsafe_code)]

use crate::common::{validate_unit_interval, ContractViolation, SchemaVersion, Validate};

pub const VT1RISK_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Additive-score floors for the risk bands. The critical floor is hard:
/// a score at or above it can never be presented below critical, and the
/// two tagged overrides reach critical regardless of the score.
pub const RISK_CRITICAL_FLOOR: f64 = 0.8;
pub const RISK_HIGH_FLOOR: f64 = 0.6;
pub const RISK_MEDIUM_FLOOR: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Numeric rank used by the session trajectory comparison (low=1 ..
    /// critical=4).
    pub fn rank(self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }
}

/// The hard overrides as tagged, auditable variants rather than values
/// re-derived from the numeric score at presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskOverrideReason {
    CriticalCulturalPattern,
    CrisisKeyword,
}

impl RiskOverrideReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskOverrideReason::CriticalCulturalPattern => "critical_cultural_pattern",
            RiskOverrideReason::CrisisKeyword => "crisis_keyword",
        }
    }
}

/// Ordered audit trail of everything that contributed to a risk verdict.
/// A triggered factor is never dropped, even when an override decides the
/// final level on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFactor {
    NegativeTruthSignal,
    MicroMomentCluster,
    BaselineDeviationHigh,
    CulturalPatternHigh,
    CulturalPatternCritical,
    CrisisKeyword,
    PostDecisionCalm,
}

impl RiskFactor {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskFactor::NegativeTruthSignal => "negative_truth_signal",
            RiskFactor::MicroMomentCluster => "micro_moment_cluster",
            RiskFactor::BaselineDeviationHigh => "baseline_deviation_high",
            RiskFactor::CulturalPatternHigh => "cultural_pattern_high",
            RiskFactor::CulturalPatternCritical => "cultural_pattern_critical",
            RiskFactor::CrisisKeyword => "crisis_keyword",
            RiskFactor::PostDecisionCalm => "post_decision_calm",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub schema_version: SchemaVersion,
    pub risk_level: RiskLevel,
    pub override_reason: Option<RiskOverrideReason>,
    pub risk_score: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub interpretation: String,
    pub recommended_action: String,
}

impl RiskAssessment {
    pub fn v1(
        risk_level: RiskLevel,
        override_reason: Option<RiskOverrideReason>,
        risk_score: f64,
        risk_factors: Vec<RiskFactor>,
        interpretation: impl Into<String>,
        recommended_action: impl Into<String>,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1RISK_CONTRACT_VERSION,
            risk_level,
            override_reason,
            risk_score,
            risk_factors,
            interpretation: interpretation.into(),
            recommended_action: recommended_action.into(),
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for RiskAssessment {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1RISK_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "risk.schema_version",
                reason: "must match VT1RISK_CONTRACT_VERSION",
            });
        }
        validate_unit_interval("risk.risk_score", self.risk_score)?;

        for (idx, factor) in self.risk_factors.iter().enumerate() {
            if self.risk_factors[..idx].contains(factor) {
                return Err(ContractViolation::InvalidValue {
                    field: "risk.risk_factors",
                    reason: "must not contain duplicates",
                });
            }
        }

        match self.override_reason {
            Some(reason) => {
                if self.risk_level != RiskLevel::Critical {
                    return Err(ContractViolation::InvalidValue {
                        field: "risk.override_reason",
                        reason: "an override forces risk_level critical",
                    });
                }
                let required = match reason {
                    RiskOverrideReason::CriticalCulturalPattern => {
                        RiskFactor::CulturalPatternCritical
                    }
                    RiskOverrideReason::CrisisKeyword => RiskFactor::CrisisKeyword,
                };
                if !self.risk_factors.contains(&required) {
                    return Err(ContractViolation::InvalidValue {
                        field: "risk.risk_factors",
                        reason: "override reason must appear in the factor trail",
                    });
                }
            }
            None => {
                // The critical floor is never reachable by averaging or
                // softening: without an override, critical iff score >= 0.8.
                if self.risk_score >= RISK_CRITICAL_FLOOR && self.risk_level != RiskLevel::Critical
                {
                    return Err(ContractViolation::InvalidValue {
                        field: "risk.risk_level",
                        reason: "score at or above the critical floor must be critical",
                    });
                }
                if self.risk_level == RiskLevel::Critical && self.risk_score < RISK_CRITICAL_FLOOR
                {
                    return Err(ContractViolation::InvalidValue {
                        field: "risk.risk_level",
                        reason: "critical requires an override or score >= 0.8",
                    });
                }
                if self.risk_factors.contains(&RiskFactor::CulturalPatternCritical)
                    || self.risk_factors.contains(&RiskFactor::CrisisKeyword)
                {
                    return Err(ContractViolation::InvalidValue {
                        field: "risk.override_reason",
                        reason: "hard-override factors require a tagged override",
                    });
                }
            }
        }

        if self.interpretation.trim().is_empty() || self.interpretation.chars().count() > 512 {
            return Err(ContractViolation::InvalidValue {
                field: "risk.interpretation",
                reason: "must be non-empty and within max length",
            });
        }
        if self.recommended_action.trim().is_empty()
            || self.recommended_action.chars().count() > 512
        {
            return Err(ContractViolation::InvalidValue {
                field: "risk.recommended_action",
                reason: "must be non-empty and within max length",
            });
        }
        Ok(())
    }
}

/// Session-level trend of successive per-turn risk levels. Informational
/// only: it never overrides or softens the current turn's own level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrajectoryState {
    InsufficientData,
    Improving,
    Stable,
    Escalating,
}

impl TrajectoryState {
    pub fn as_str(self) -> &'static str {
        match self {
            TrajectoryState::InsufficientData => "insufficient_data",
            TrajectoryState::Improving => "improving",
            TrajectoryState::Stable => "stable",
            TrajectoryState::Escalating => "escalating",
        }
    }
}
