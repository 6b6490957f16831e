#![forbid(unsafe_code)]

use crate::common::{
    validate_token, ContractViolation, CorrelationId, MonotonicTimeNs, ReasonCodeId,
    SchemaVersion, SessionId, TurnId, Validate,
};
use crate::vt1baseline::UserVoiceBaseline;
use crate::vt1content::Transcript;
use crate::vt1cultural::CulturalPatternMatch;
use crate::vt1dissonance::DissonanceResult;
use crate::vt1risk::{RiskAssessment, TrajectoryState};
use crate::vt1voice::VoiceEmotionSignal;

pub const VT1TURN_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);
pub const VT1TURN_ENGINE_ID: &str = "VT1.TURN";

pub const TURN_MAX_CULTURAL_MATCHES: usize = 32;
pub const TURN_MAX_CRISIS_HITS: usize = 64;

/// Everything the core needs for one conversational turn. All collaborator
/// outputs are already fetched; nothing here triggers I/O.
///
/// `voice_emotion` is structurally required: a turn without any acoustic
/// signal is refused at the ingestion boundary, because risk assessment
/// without it is defined to be unsafe to attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Vt1TurnRequest {
    pub schema_version: SchemaVersion,
    pub correlation_id: CorrelationId,
    pub turn_id: TurnId,
    pub now: MonotonicTimeNs,
    pub session_id: SessionId,
    pub transcript: Transcript,
    pub voice_emotion: VoiceEmotionSignal,
    pub baseline: Option<UserVoiceBaseline>,
    pub cultural_matches: Vec<CulturalPatternMatch>,
    pub crisis_keyword_hits: Vec<String>,
}

impl Vt1TurnRequest {
    /// Copy of the request with collaborator feature statistics scrubbed of
    /// non-finite or out-of-range values. Run before `validate()` at the
    /// ingestion boundary so one bad statistic degrades to "missing"
    /// instead of failing the turn.
    pub fn sanitized(&self) -> Self {
        let mut req = self.clone();
        req.voice_emotion.features = req.voice_emotion.features.sanitized();
        req
    }
}

impl Validate for Vt1TurnRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1TURN_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "turn_request.schema_version",
                reason: "must match VT1TURN_CONTRACT_VERSION",
            });
        }
        self.correlation_id.validate()?;
        self.turn_id.validate()?;
        if self.now.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "turn_request.now",
                reason: "must be > 0",
            });
        }
        self.session_id.validate()?;
        self.transcript.validate()?;
        self.voice_emotion.validate()?;
        if let Some(baseline) = &self.baseline {
            baseline.validate()?;
        }
        if self.cultural_matches.len() > TURN_MAX_CULTURAL_MATCHES {
            return Err(ContractViolation::InvalidValue {
                field: "turn_request.cultural_matches",
                reason: "exceeds max entry count",
            });
        }
        for m in &self.cultural_matches {
            m.validate()?;
        }
        if self.crisis_keyword_hits.len() > TURN_MAX_CRISIS_HITS {
            return Err(ContractViolation::InvalidValue {
                field: "turn_request.crisis_keyword_hits",
                reason: "exceeds max entry count",
            });
        }
        for hit in &self.crisis_keyword_hits {
            if hit.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "turn_request.crisis_keyword_hits",
                    reason: "entries must not be empty",
                });
            }
            if hit.chars().count() > 64 {
                return Err(ContractViolation::InvalidValue {
                    field: "turn_request.crisis_keyword_hits",
                    reason: "entry exceeds max length",
                });
            }
        }
        Ok(())
    }
}

/// The complete per-turn output record: dissonance verdict, risk verdict,
/// and the session trend, plus a deterministic reference for downstream
/// audit joins.
#[derive(Debug, Clone, PartialEq)]
pub struct Vt1TurnOk {
    pub schema_version: SchemaVersion,
    pub engine_id: String,
    pub reason_code: ReasonCodeId,
    pub dissonance: DissonanceResult,
    pub risk: RiskAssessment,
    pub trajectory: TrajectoryState,
    pub assessment_ref: String,
}

impl Vt1TurnOk {
    pub fn v1(
        reason_code: ReasonCodeId,
        dissonance: DissonanceResult,
        risk: RiskAssessment,
        trajectory: TrajectoryState,
        assessment_ref: String,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1TURN_CONTRACT_VERSION,
            engine_id: VT1TURN_ENGINE_ID.to_string(),
            reason_code,
            dissonance,
            risk,
            trajectory,
            assessment_ref,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for Vt1TurnOk {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1TURN_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "turn_ok.schema_version",
                reason: "must match VT1TURN_CONTRACT_VERSION",
            });
        }
        if self.engine_id != VT1TURN_ENGINE_ID {
            return Err(ContractViolation::InvalidValue {
                field: "turn_ok.engine_id",
                reason: "must match VT1TURN_ENGINE_ID",
            });
        }
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "turn_ok.reason_code",
                reason: "must be > 0",
            });
        }
        self.dissonance.validate()?;
        self.risk.validate()?;
        validate_token("turn_ok.assessment_ref", &self.assessment_ref, 64)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vt1TurnRefuse {
    pub schema_version: SchemaVersion,
    pub reason_code: ReasonCodeId,
    pub message: String,
}

impl Vt1TurnRefuse {
    pub fn v1(reason_code: ReasonCodeId, message: String) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1TURN_CONTRACT_VERSION,
            reason_code,
            message,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for Vt1TurnRefuse {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1TURN_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "turn_refuse.schema_version",
                reason: "must match VT1TURN_CONTRACT_VERSION",
            });
        }
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "turn_refuse.reason_code",
                reason: "must be > 0",
            });
        }
        validate_token("turn_refuse.message", &self.message, 256)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Vt1TurnResponse {
    Ok(Vt1TurnOk),
    Refuse(Vt1TurnRefuse),
}

impl Validate for Vt1TurnResponse {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            Vt1TurnResponse::Ok(v) => v.validate(),
            Vt1TurnResponse::Refuse(v) => v.validate(),
        }
    }
}
