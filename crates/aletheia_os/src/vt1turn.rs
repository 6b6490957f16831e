#![forbid(unsafe_code)]

use sha2::{Digest, Sha256};

use aletheia_engines::vt1risk::Vt1RiskInput;
use aletheia_kernel_contracts::vt1baseline::UserVoiceBaseline;
use aletheia_kernel_contracts::vt1content::{ContentClassification, Transcript};
use aletheia_kernel_contracts::vt1cultural::CulturalSeverity;
use aletheia_kernel_contracts::vt1dissonance::DissonanceResult;
use aletheia_kernel_contracts::vt1micro::MicroMomentMap;
use aletheia_kernel_contracts::vt1risk::{RiskAssessment, RiskLevel};
use aletheia_kernel_contracts::vt1turn::{Vt1TurnOk, Vt1TurnRefuse, Vt1TurnRequest};
use aletheia_kernel_contracts::vt1voice::{AcousticFeatureVector, VoiceEmotionSignal};
use aletheia_kernel_contracts::{ContractViolation, Validate};

use crate::trajectory::{TrajectoryConfig, TrajectoryStore};

pub mod reason_codes {
    use aletheia_kernel_contracts::ReasonCodeId;

    // VT1.TURN reason-code namespace.
    pub const VT1_TURN_OK_ASSESSED: ReasonCodeId = ReasonCodeId(0x5654_0001);

    pub const VT1_TURN_SCHEMA_INVALID: ReasonCodeId = ReasonCodeId(0x5654_00F1);
    pub const VT1_TURN_VOICE_SIGNAL_MISSING: ReasonCodeId = ReasonCodeId(0x5654_00F2);
    pub const VT1_TURN_INTERNAL_PIPELINE_ERROR: ReasonCodeId = ReasonCodeId(0x5654_00F3);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vt1TurnWiringConfig {
    pub turn_enabled: bool,
}

impl Vt1TurnWiringConfig {
    pub fn mvp_v1(turn_enabled: bool) -> Self {
        Self { turn_enabled }
    }
}

pub trait Vt1ContentEngine {
    fn classify(&self, transcript: &Transcript) -> ContentClassification;
}

pub trait Vt1MicroEngine {
    fn analyze(&self, features: &AcousticFeatureVector) -> MicroMomentMap;
}

pub trait Vt1BaselineEngine {
    fn deviate(
        &self,
        features: &AcousticFeatureVector,
        baseline: Option<&UserVoiceBaseline>,
    ) -> f64;
}

pub trait Vt1DissonanceEngine {
    fn detect(
        &self,
        stated: &ContentClassification,
        voice: &VoiceEmotionSignal,
        micro_moments: &MicroMomentMap,
        baseline_deviation: f64,
    ) -> Result<DissonanceResult, ContractViolation>;
}

pub trait Vt1RiskEngine {
    fn assess(&self, input: &Vt1RiskInput<'_>) -> Result<RiskAssessment, ContractViolation>;
}

impl Vt1ContentEngine for aletheia_engines::vt1content::Vt1ContentRuntime {
    fn classify(&self, transcript: &Transcript) -> ContentClassification {
        Self::classify(self, transcript)
    }
}

impl Vt1MicroEngine for aletheia_engines::vt1micro::Vt1MicroRuntime {
    fn analyze(&self, features: &AcousticFeatureVector) -> MicroMomentMap {
        Self::analyze(self, features)
    }
}

impl Vt1BaselineEngine for aletheia_engines::vt1baseline::Vt1BaselineRuntime {
    fn deviate(
        &self,
        features: &AcousticFeatureVector,
        baseline: Option<&UserVoiceBaseline>,
    ) -> f64 {
        Self::deviate(self, features, baseline)
    }
}

impl Vt1DissonanceEngine for aletheia_engines::vt1dissonance::Vt1DissonanceRuntime {
    fn detect(
        &self,
        stated: &ContentClassification,
        voice: &VoiceEmotionSignal,
        micro_moments: &MicroMomentMap,
        baseline_deviation: f64,
    ) -> Result<DissonanceResult, ContractViolation> {
        Self::detect(self, stated, voice, micro_moments, baseline_deviation)
    }
}

impl Vt1RiskEngine for aletheia_engines::vt1risk::Vt1RiskRuntime {
    fn assess(&self, input: &Vt1RiskInput<'_>) -> Result<RiskAssessment, ContractViolation> {
        Self::assess(self, input)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Vt1TurnOutcome {
    NotInvokedDisabled,
    Refused(Vt1TurnRefuse),
    Assessed(Vt1TurnOk),
}

/// Leaf-first per-turn evaluation: content, micro-moments, and baseline
/// deviation feed the dissonance engine, whose verdict feeds the risk
/// engine; the session trajectory is recorded last. Data flows strictly
/// forward and no engine mutates another's inputs.
#[derive(Debug, Clone)]
pub struct Vt1TurnPipeline<C, M, B, D, R>
where
    C: Vt1ContentEngine,
    M: Vt1MicroEngine,
    B: Vt1BaselineEngine,
    D: Vt1DissonanceEngine,
    R: Vt1RiskEngine,
{
    config: Vt1TurnWiringConfig,
    content: C,
    micro: M,
    baseline: B,
    dissonance: D,
    risk: R,
    trajectories: TrajectoryStore,
}

impl<C, M, B, D, R> Vt1TurnPipeline<C, M, B, D, R>
where
    C: Vt1ContentEngine,
    M: Vt1MicroEngine,
    B: Vt1BaselineEngine,
    D: Vt1DissonanceEngine,
    R: Vt1RiskEngine,
{
    pub fn new(
        config: Vt1TurnWiringConfig,
        content: C,
        micro: M,
        baseline: B,
        dissonance: D,
        risk: R,
    ) -> Self {
        Self {
            config,
            content,
            micro,
            baseline,
            dissonance,
            risk,
            trajectories: TrajectoryStore::new(TrajectoryConfig::mvp_v1()),
        }
    }

    pub fn trajectories(&self) -> &TrajectoryStore {
        &self.trajectories
    }

    pub fn end_session(&mut self, session_id: &aletheia_kernel_contracts::SessionId) {
        self.trajectories.discard_session(session_id);
    }

    pub fn run_turn(
        &mut self,
        req: &Vt1TurnRequest,
    ) -> Result<Vt1TurnOutcome, ContractViolation> {
        // Non-finite collaborator statistics degrade to "missing" before
        // validation; a single bad feature must not block the assessment.
        let req = req.sanitized();
        req.validate()?;

        if !self.config.turn_enabled {
            return Ok(Vt1TurnOutcome::NotInvokedDisabled);
        }

        let stated = self.content.classify(&req.transcript);
        let micro_moments = self.micro.analyze(&req.voice_emotion.features);
        let baseline_deviation = self
            .baseline
            .deviate(&req.voice_emotion.features, req.baseline.as_ref());

        let dissonance =
            self.dissonance
                .detect(&stated, &req.voice_emotion, &micro_moments, baseline_deviation)?;

        let risk_input = Vt1RiskInput {
            truth_signal: dissonance.truth_signal,
            dissonance_score: dissonance.dissonance_score,
            micro_moments: &micro_moments,
            baseline_deviation,
            baseline_established: req.baseline.map(|b| b.established).unwrap_or(false),
            cultural_matches: &req.cultural_matches,
            transcript_text: &req.transcript.text,
            crisis_keyword_hits: &req.crisis_keyword_hits,
        };
        let risk = self.risk.assess(&risk_input)?;

        // Fail closed on engine drift: a hard-override input that did not
        // surface as a critical verdict must never be forwarded.
        let must_be_critical = !req.crisis_keyword_hits.is_empty()
            || req
                .cultural_matches
                .iter()
                .any(|m| m.severity == CulturalSeverity::Critical);
        if must_be_critical && risk.risk_level != RiskLevel::Critical {
            return Ok(Vt1TurnOutcome::Refused(Vt1TurnRefuse::v1(
                reason_codes::VT1_TURN_INTERNAL_PIPELINE_ERROR,
                "critical-override drift detected in risk output".to_string(),
            )?));
        }

        self.trajectories
            .update_trajectory(&req.session_id, risk.risk_level);
        let trajectory = self.trajectories.classify(&req.session_id);

        let assessment_ref = assessment_ref(&req, risk.risk_level);
        let ok = Vt1TurnOk::v1(
            reason_codes::VT1_TURN_OK_ASSESSED,
            dissonance,
            risk,
            trajectory,
            assessment_ref,
        )?;
        ok.validate()?;
        Ok(Vt1TurnOutcome::Assessed(ok))
    }
}

fn assessment_ref(req: &Vt1TurnRequest, level: RiskLevel) -> String {
    let mut hasher = Sha256::new();
    hasher.update(req.session_id.as_str().as_bytes());
    hasher.update(req.turn_id.0.to_be_bytes());
    hasher.update(req.correlation_id.0.to_be_bytes());
    hasher.update(level.as_str().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::from("vt1_asmt_");
    for byte in digest.iter().take(8) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
