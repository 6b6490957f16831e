#![forbid(unsafe_code)]

use serde_json::{json, Map, Value};

use aletheia_engines::vt1baseline::{Vt1BaselineConfig, Vt1BaselineRuntime};
use aletheia_engines::vt1content::{Vt1ContentConfig, Vt1ContentRuntime};
use aletheia_engines::vt1dissonance::{Vt1DissonanceConfig, Vt1DissonanceRuntime};
use aletheia_engines::vt1micro::{Vt1MicroConfig, Vt1MicroRuntime};
use aletheia_engines::vt1risk::{Vt1RiskConfig, Vt1RiskRuntime};
use aletheia_kernel_contracts::vt1baseline::{UserVoiceBaseline, BASELINE_MIN_SESSIONS};
use aletheia_kernel_contracts::vt1content::Transcript;
use aletheia_kernel_contracts::vt1cultural::{CulturalPatternMatch, CulturalSeverity};
use aletheia_kernel_contracts::vt1lexicon::{PhraseTable, RiskLexicon};
use aletheia_kernel_contracts::vt1turn::{
    Vt1TurnOk, Vt1TurnRefuse, Vt1TurnRequest, VT1TURN_CONTRACT_VERSION,
};
use aletheia_kernel_contracts::vt1voice::{
    AcousticFeatureVector, VoiceEmotionLabel, VoiceEmotionSignal, VT1VOICE_CONTRACT_VERSION,
};
use aletheia_kernel_contracts::{
    CorrelationId, MonotonicTimeNs, ReasonCodeId, SessionId, TurnId,
};
use aletheia_os::vt1turn::{
    reason_codes, Vt1TurnOutcome, Vt1TurnPipeline, Vt1TurnWiringConfig,
};

pub type MvpPipeline = Vt1TurnPipeline<
    Vt1ContentRuntime,
    Vt1MicroRuntime,
    Vt1BaselineRuntime,
    Vt1DissonanceRuntime,
    Vt1RiskRuntime,
>;

/// Pipeline over the shipped configs and starter lexicons; a deployment
/// injects store-supplied tables instead.
pub fn mvp_pipeline() -> MvpPipeline {
    Vt1TurnPipeline::new(
        Vt1TurnWiringConfig::mvp_v1(true),
        Vt1ContentRuntime::new(Vt1ContentConfig::mvp_v1(), PhraseTable::mvp_v1())
            .expect("starter phrase table is contract-valid"),
        Vt1MicroRuntime::new(Vt1MicroConfig::mvp_v1())
            .expect("shipped micro-moment bands are disjoint"),
        Vt1BaselineRuntime::new(Vt1BaselineConfig::mvp_v1()),
        Vt1DissonanceRuntime::new(Vt1DissonanceConfig::mvp_v1()),
        Vt1RiskRuntime::new(Vt1RiskConfig::mvp_v1(), RiskLexicon::mvp_v1())
            .expect("starter risk lexicon is contract-valid"),
    )
}

fn refuse(reason_code: ReasonCodeId, message: &'static str) -> Vt1TurnRefuse {
    Vt1TurnRefuse::v1(reason_code, message.to_string())
        .expect("Vt1TurnRefuse::v1 must construct for static messages")
}

fn schema_refuse(message: &'static str) -> Vt1TurnRefuse {
    refuse(reason_codes::VT1_TURN_SCHEMA_INVALID, message)
}

/// Parses one turn request from untrusted JSON. An absent or
/// null `voice_emotion` block is the single fatal input error and is
/// refused here with its own reason code; everything else malformed is a
/// schema refusal.
pub fn parse_turn_request(raw: &str) -> Result<Vt1TurnRequest, Vt1TurnRefuse> {
    let v: Value = serde_json::from_str(raw)
        .map_err(|_| schema_refuse("turn request is not valid json"))?;
    let obj = v
        .as_object()
        .ok_or_else(|| schema_refuse("turn request must be a json object"))?;

    let voice_obj = match obj.get("voice_emotion") {
        Some(Value::Object(o)) => o,
        Some(Value::Null) | None => {
            return Err(refuse(
                reason_codes::VT1_TURN_VOICE_SIGNAL_MISSING,
                "voice_emotion block is required; risk assessment without an acoustic signal is refused",
            ));
        }
        Some(_) => return Err(schema_refuse("voice_emotion must be a json object")),
    };
    let voice_emotion = parse_voice_emotion(voice_obj)?;

    let session_id = obj
        .get("session_id")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_refuse("session_id is required"))?;
    let session_id =
        SessionId::new(session_id).map_err(|_| schema_refuse("session_id is not a valid token"))?;

    let transcript = parse_transcript(obj)?;
    let baseline = parse_baseline(obj)?;
    let cultural_matches = parse_cultural_matches(obj)?;
    let crisis_keyword_hits = parse_crisis_hits(obj)?;

    Ok(Vt1TurnRequest {
        schema_version: VT1TURN_CONTRACT_VERSION,
        correlation_id: CorrelationId(u128::from(read_u64_or(obj, "correlation_id", 1))),
        turn_id: TurnId(read_u64_or(obj, "turn_id", 1)),
        now: MonotonicTimeNs(read_u64_or(obj, "now", 1)),
        session_id,
        transcript,
        voice_emotion,
        baseline,
        cultural_matches,
        crisis_keyword_hits,
    })
}

fn read_u64_or(obj: &Map<String, Value>, key: &str, default: u64) -> u64 {
    obj.get(key).and_then(Value::as_u64).unwrap_or(default)
}

fn read_f64(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn parse_voice_emotion(obj: &Map<String, Value>) -> Result<VoiceEmotionSignal, Vt1TurnRefuse> {
    let label = obj
        .get("label")
        .and_then(Value::as_str)
        .and_then(VoiceEmotionLabel::parse)
        .ok_or_else(|| schema_refuse("voice_emotion.label is not a known emotion label"))?;
    let confidence = read_f64(obj, "confidence")
        .ok_or_else(|| schema_refuse("voice_emotion.confidence is required"))?;

    let features = match obj.get("features") {
        Some(Value::Object(f)) => AcousticFeatureVector {
            pitch_mean_hz: read_f64(f, "pitch_mean"),
            pitch_std_hz: read_f64(f, "pitch_std"),
            pitch_range_hz: read_f64(f, "pitch_range"),
            energy_mean: read_f64(f, "energy_mean"),
            energy_std: read_f64(f, "energy_std"),
            speech_rate_sps: read_f64(f, "speech_rate"),
            pause_ratio: read_f64(f, "pause_ratio"),
            zero_crossing_rate: read_f64(f, "zero_crossing_rate"),
        },
        Some(Value::Null) | None => AcousticFeatureVector::empty(),
        Some(_) => return Err(schema_refuse("voice_emotion.features must be a json object")),
    };

    // Collaborator statistics are sanitized rather than policed here; only
    // the confidence is structural.
    let signal = VoiceEmotionSignal {
        schema_version: VT1VOICE_CONTRACT_VERSION,
        label,
        confidence,
        features: features.sanitized(),
    };
    if !(0.0..=1.0).contains(&confidence) || !confidence.is_finite() {
        return Err(schema_refuse("voice_emotion.confidence must be in [0, 1]"));
    }
    Ok(signal)
}

fn parse_transcript(obj: &Map<String, Value>) -> Result<Transcript, Vt1TurnRefuse> {
    let t = match obj.get("transcript") {
        Some(Value::Object(t)) => t,
        Some(Value::Null) | None => {
            return Transcript::v1("", None)
                .map_err(|_| schema_refuse("empty transcript failed contract validation"));
        }
        Some(_) => return Err(schema_refuse("transcript must be a json object")),
    };
    let text = t.get("text").and_then(Value::as_str).unwrap_or("");
    let language = t
        .get("language")
        .and_then(Value::as_str)
        .filter(|lang| *lang != "unknown" && !lang.is_empty())
        .map(str::to_string);
    Transcript::v1(text, language).map_err(|_| schema_refuse("transcript failed contract validation"))
}

fn parse_baseline(obj: &Map<String, Value>) -> Result<Option<UserVoiceBaseline>, Vt1TurnRefuse> {
    let b = match obj.get("baseline") {
        Some(Value::Object(b)) => b,
        Some(Value::Null) | None => return Ok(None),
        Some(_) => return Err(schema_refuse("baseline must be a json object or null")),
    };
    let established = b
        .get("established")
        .and_then(Value::as_bool)
        .ok_or_else(|| schema_refuse("baseline.established is required"))?;
    let sessions_analyzed = read_u64_or(
        b,
        "sessions_analyzed",
        if established {
            u64::from(BASELINE_MIN_SESSIONS)
        } else {
            0
        },
    );
    let baseline = UserVoiceBaseline::v1(
        u32::try_from(sessions_analyzed)
            .map_err(|_| schema_refuse("baseline.sessions_analyzed is out of range"))?,
        established,
        read_f64(b, "typical_pitch_mean")
            .ok_or_else(|| schema_refuse("baseline.typical_pitch_mean is required"))?,
        read_f64(b, "typical_pitch_std")
            .ok_or_else(|| schema_refuse("baseline.typical_pitch_std is required"))?,
        read_f64(b, "typical_energy_mean")
            .ok_or_else(|| schema_refuse("baseline.typical_energy_mean is required"))?,
        read_f64(b, "typical_energy_std")
            .ok_or_else(|| schema_refuse("baseline.typical_energy_std is required"))?,
        read_f64(b, "typical_speech_rate")
            .ok_or_else(|| schema_refuse("baseline.typical_speech_rate is required"))?,
        read_f64(b, "typical_pause_ratio").unwrap_or(0.0),
    )
    .map_err(|_| schema_refuse("baseline failed contract validation"))?;
    Ok(Some(baseline))
}

fn parse_cultural_matches(
    obj: &Map<String, Value>,
) -> Result<Vec<CulturalPatternMatch>, Vt1TurnRefuse> {
    let entries = match obj.get("cultural_matches") {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => return Err(schema_refuse("cultural_matches must be a json array")),
    };
    let mut matches = Vec::with_capacity(entries.len());
    for entry in entries {
        let m = entry
            .as_object()
            .ok_or_else(|| schema_refuse("cultural_matches entries must be json objects"))?;
        let phrase = m
            .get("phrase")
            .and_then(Value::as_str)
            .ok_or_else(|| schema_refuse("cultural_matches.phrase is required"))?;
        let severity = m
            .get("severity")
            .and_then(Value::as_str)
            .and_then(CulturalSeverity::parse)
            .ok_or_else(|| schema_refuse("cultural_matches.severity is not a known severity"))?;
        let meaning = m
            .get("cultural_meaning")
            .and_then(Value::as_str)
            .ok_or_else(|| schema_refuse("cultural_matches.cultural_meaning is required"))?;
        matches.push(
            CulturalPatternMatch::v1(phrase, severity, meaning)
                .map_err(|_| schema_refuse("cultural match failed contract validation"))?,
        );
    }
    Ok(matches)
}

fn parse_crisis_hits(obj: &Map<String, Value>) -> Result<Vec<String>, Vt1TurnRefuse> {
    let entries = match obj.get("crisis_keywords_hit") {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(_) => return Err(schema_refuse("crisis_keywords_hit must be a json array")),
    };
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| schema_refuse("crisis_keywords_hit entries must be strings"))
        })
        .collect()
}

pub fn render_ok(ok: &Vt1TurnOk) -> String {
    let micro = &ok.dissonance.micro_moments;
    let value = json!({
        "dissonance": {
            "stated_emotion": ok.dissonance.stated_emotion.as_str(),
            "stated_confidence": ok.dissonance.stated_confidence,
            "voice_emotion": ok.dissonance.voice_emotion.as_str(),
            "voice_confidence": ok.dissonance.voice_confidence,
            "dissonance_score": ok.dissonance.dissonance_score,
            "dissonance_type": ok.dissonance.dissonance_type.as_str(),
            "truth_signal": ok.dissonance.truth_signal.as_str(),
            "truth_confidence": ok.dissonance.truth_confidence,
            "micro_moments": {
                "voice_tremor": micro.voice_tremor,
                "voice_crack": micro.voice_crack,
                "flat_prosody": micro.flat_prosody,
                "sigh_detected": micro.sigh_detected,
                "hesitation": micro.hesitation,
                "harsh_voice": micro.harsh_voice,
            },
            "baseline_deviation": ok.dissonance.baseline_deviation,
        },
        "risk": {
            "risk_level": ok.risk.risk_level.as_str(),
            "override_reason": ok.risk.override_reason.map(|r| r.as_str()),
            "risk_score": ok.risk.risk_score,
            "risk_factors": ok
                .risk
                .risk_factors
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>(),
            "interpretation": ok.risk.interpretation.as_str(),
            "recommended_action": ok.risk.recommended_action.as_str(),
        },
        "trajectory": ok.trajectory.as_str(),
        "assessment_ref": ok.assessment_ref.as_str(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

/// One full turn over a caller-owned pipeline: parse, assess, render.
/// Refusals and contract errors surface as `Err` for the binary to report.
pub fn execute_turn_command(
    pipeline: &mut MvpPipeline,
    raw: &str,
) -> Result<String, String> {
    let req = match parse_turn_request(raw) {
        Ok(req) => req,
        Err(refusal) => return Err(format_refusal(&refusal)),
    };
    let outcome = pipeline
        .run_turn(&req)
        .map_err(|violation| format!("turn request rejected: {violation:?}"))?;
    match outcome {
        Vt1TurnOutcome::Assessed(ok) => Ok(render_ok(&ok)),
        Vt1TurnOutcome::Refused(refusal) => Err(format_refusal(&refusal)),
        Vt1TurnOutcome::NotInvokedDisabled => Err("turn wiring is disabled".to_string()),
    }
}

fn format_refusal(refusal: &Vt1TurnRefuse) -> String {
    format!(
        "turn refused (reason 0x{:08x}): {}",
        refusal.reason_code.0, refusal.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_request_json() -> String {
        json!({
            "session_id": "session_cli",
            "transcript": { "text": "hello there", "language": "en" },
            "voice_emotion": {
                "label": "neutral",
                "confidence": 0.8,
                "features": { "pitch_mean": 180.0, "pitch_std": 20.0 }
            }
        })
        .to_string()
    }

    #[test]
    fn at_turn_cli_01_missing_voice_emotion_is_the_fatal_refusal() {
        let raw = json!({
            "session_id": "session_cli",
            "transcript": { "text": "hello", "language": "en" }
        })
        .to_string();
        let err = parse_turn_request(&raw).unwrap_err();
        assert_eq!(
            err.reason_code,
            reason_codes::VT1_TURN_VOICE_SIGNAL_MISSING
        );

        let raw = json!({
            "session_id": "session_cli",
            "voice_emotion": null
        })
        .to_string();
        let err = parse_turn_request(&raw).unwrap_err();
        assert_eq!(
            err.reason_code,
            reason_codes::VT1_TURN_VOICE_SIGNAL_MISSING
        );
    }

    #[test]
    fn at_turn_cli_02_malformed_json_is_a_schema_refusal() {
        let err = parse_turn_request("{not json").unwrap_err();
        assert_eq!(err.reason_code, reason_codes::VT1_TURN_SCHEMA_INVALID);
    }

    #[test]
    fn at_turn_cli_03_minimal_request_parses_with_defaults() {
        let req = parse_turn_request(&minimal_request_json()).unwrap();
        assert_eq!(req.turn_id, TurnId(1));
        assert_eq!(req.correlation_id, CorrelationId(1));
        assert!(req.baseline.is_none());
        assert!(req.cultural_matches.is_empty());
        assert!(req.crisis_keyword_hits.is_empty());
        assert_eq!(req.voice_emotion.features.pitch_mean_hz, Some(180.0));
    }

    #[test]
    fn at_turn_cli_04_full_turn_renders_the_assessment_blocks() {
        let mut pipeline = mvp_pipeline();
        let out = execute_turn_command(&mut pipeline, &minimal_request_json()).unwrap();
        assert!(out.contains("\"risk_level\": \"low\""));
        assert!(out.contains("\"trajectory\": \"insufficient_data\""));
        assert!(out.contains("\"assessment_ref\": \"vt1_asmt_"));
    }

    #[test]
    fn at_turn_cli_05_crisis_keywords_render_a_critical_verdict() {
        let raw = json!({
            "session_id": "session_cli",
            "transcript": { "text": "i am fine, do not worry", "language": "en" },
            "voice_emotion": { "label": "sad", "confidence": 0.9 },
            "crisis_keywords_hit": ["want to die"]
        })
        .to_string();
        let mut pipeline = mvp_pipeline();
        let out = execute_turn_command(&mut pipeline, &raw).unwrap();
        assert!(out.contains("\"risk_level\": \"critical\""));
        assert!(out.contains("\"override_reason\": \"crisis_keyword\""));
        assert!(out.contains("immediate safety assessment"));
    }

    #[test]
    fn at_turn_cli_06_unknown_language_normalizes_to_none() {
        let raw = json!({
            "session_id": "session_cli",
            "transcript": { "text": "hello", "language": "unknown" },
            "voice_emotion": { "label": "neutral", "confidence": 0.5 }
        })
        .to_string();
        let req = parse_turn_request(&raw).unwrap();
        assert_eq!(req.transcript.language, None);
    }

    #[test]
    fn at_turn_cli_07_baseline_block_parses_established_snapshot() {
        let raw = json!({
            "session_id": "session_cli",
            "transcript": { "text": "hello", "language": "en" },
            "voice_emotion": { "label": "neutral", "confidence": 0.5 },
            "baseline": {
                "established": true,
                "sessions_analyzed": 6,
                "typical_pitch_mean": 175.0,
                "typical_pitch_std": 18.0,
                "typical_energy_mean": 0.5,
                "typical_energy_std": 0.1,
                "typical_speech_rate": 3.4
            }
        })
        .to_string();
        let req = parse_turn_request(&raw).unwrap();
        let baseline = req.baseline.unwrap();
        assert!(baseline.established);
        assert_eq!(baseline.sessions_analyzed, 6);
        assert_eq!(baseline.typical_pause_ratio, 0.0);
    }
}
