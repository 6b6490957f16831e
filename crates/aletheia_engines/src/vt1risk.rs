#![forbid(unsafe_code)]

use aletheia_kernel_contracts::vt1cultural::{CulturalPatternMatch, CulturalSeverity};
use aletheia_kernel_contracts::vt1lexicon::RiskLexicon;
use aletheia_kernel_contracts::vt1micro::MicroMomentMap;
use aletheia_kernel_contracts::vt1risk::{
    RiskAssessment, RiskFactor, RiskLevel, RiskOverrideReason, RISK_CRITICAL_FLOOR,
    RISK_HIGH_FLOOR, RISK_MEDIUM_FLOOR,
};
use aletheia_kernel_contracts::vt1voice::VoiceEmotionLabel;
use aletheia_kernel_contracts::{ContractViolation, Validate};

use crate::lexicon::{contains_phrase, normalize_text};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vt1RiskConfig {
    pub negative_truth_weight: f64,
    pub micro_cluster_weight: f64,
    pub micro_cluster_min: u8,
    pub baseline_weight: f64,
    pub baseline_deviation_min: f64,
    pub cultural_high_weight: f64,
    /// The single largest non-override increment: an eerily calm, flat
    /// voice after high dissonance is a critical marker, not recovery.
    pub post_decision_calm_weight: f64,
    pub calm_dissonance_min: f64,
    pub critical_floor: f64,
    pub high_floor: f64,
    pub medium_floor: f64,
}

impl Vt1RiskConfig {
    pub fn mvp_v1() -> Self {
        Self {
            negative_truth_weight: 0.3,
            micro_cluster_weight: 0.3,
            micro_cluster_min: 3,
            baseline_weight: 0.2,
            baseline_deviation_min: 0.6,
            cultural_high_weight: 0.3,
            post_decision_calm_weight: 0.6,
            calm_dissonance_min: 0.6,
            critical_floor: RISK_CRITICAL_FLOOR,
            high_floor: RISK_HIGH_FLOOR,
            medium_floor: RISK_MEDIUM_FLOOR,
        }
    }
}

/// Per-turn inputs to the risk verdict. Everything has already been
/// evaluated by the upstream engines; this is fusion, not re-derivation.
#[derive(Debug, Clone)]
pub struct Vt1RiskInput<'a> {
    pub truth_signal: VoiceEmotionLabel,
    pub dissonance_score: f64,
    pub micro_moments: &'a MicroMomentMap,
    pub baseline_deviation: f64,
    pub baseline_established: bool,
    pub cultural_matches: &'a [CulturalPatternMatch],
    pub transcript_text: &'a str,
    pub crisis_keyword_hits: &'a [String],
}

#[derive(Debug, Clone)]
pub struct Vt1RiskRuntime {
    config: Vt1RiskConfig,
    lexicon: RiskLexicon,
}

impl Vt1RiskRuntime {
    pub fn new(config: Vt1RiskConfig, lexicon: RiskLexicon) -> Result<Self, ContractViolation> {
        lexicon.validate()?;
        Ok(Self { config, lexicon })
    }

    /// Additive scoring with two tagged hard overrides. Every triggered
    /// factor lands in the audit trail even when an override decides the
    /// level on its own; the trail is never pruned to match the headline.
    pub fn assess(&self, input: &Vt1RiskInput<'_>) -> Result<RiskAssessment, ContractViolation> {
        let text = normalize_text(input.transcript_text);
        let mut factors: Vec<RiskFactor> = Vec::new();
        let mut score = 0.0;

        if matches!(
            input.truth_signal,
            VoiceEmotionLabel::Sad | VoiceEmotionLabel::Fear | VoiceEmotionLabel::Angry
        ) {
            score += self.config.negative_truth_weight;
            factors.push(RiskFactor::NegativeTruthSignal);
        }

        if input.micro_moments.count() >= self.config.micro_cluster_min {
            score += self.config.micro_cluster_weight;
            factors.push(RiskFactor::MicroMomentCluster);
        }

        if input.baseline_established
            && input.baseline_deviation > self.config.baseline_deviation_min
        {
            score += self.config.baseline_weight;
            factors.push(RiskFactor::BaselineDeviationHigh);
        }

        if input
            .cultural_matches
            .iter()
            .any(|m| m.severity == CulturalSeverity::High)
        {
            score += self.config.cultural_high_weight;
            factors.push(RiskFactor::CulturalPatternHigh);
        }

        let cultural_critical = input
            .cultural_matches
            .iter()
            .any(|m| m.severity == CulturalSeverity::Critical);
        if cultural_critical {
            factors.push(RiskFactor::CulturalPatternCritical);
        }

        let crisis_hit = !input.crisis_keyword_hits.is_empty()
            || contains_phrase(&text, &self.lexicon.crisis_keywords).is_some();
        if crisis_hit {
            factors.push(RiskFactor::CrisisKeyword);
        }

        if input.dissonance_score > self.config.calm_dissonance_min
            && input.micro_moments.flat_prosody
            && contains_phrase(&text, &self.lexicon.resolution_phrases).is_some()
        {
            score += self.config.post_decision_calm_weight;
            factors.push(RiskFactor::PostDecisionCalm);
        }

        let risk_score = score.min(1.0);

        // Overrides bypass the additive score entirely; cultural critical
        // is reported as the tagged reason when both fire on one turn.
        let override_reason = if cultural_critical {
            Some(RiskOverrideReason::CriticalCulturalPattern)
        } else if crisis_hit {
            Some(RiskOverrideReason::CrisisKeyword)
        } else {
            None
        };

        let risk_level = if override_reason.is_some() {
            RiskLevel::Critical
        } else if risk_score >= self.config.critical_floor {
            RiskLevel::Critical
        } else if risk_score >= self.config.high_floor {
            RiskLevel::High
        } else if risk_score >= self.config.medium_floor {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        RiskAssessment::v1(
            risk_level,
            override_reason,
            risk_score,
            factors,
            interpretation_for(risk_level),
            action_for(risk_level),
        )
    }
}

fn interpretation_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => {
            "No acute risk markers detected; words and voice are broadly consistent."
        }
        RiskLevel::Medium => {
            "Elevated stress signals are present; the voice carries more strain than the words concede."
        }
        RiskLevel::High => {
            "Significant distress markers across voice and context; the trusted signal points to real difficulty."
        }
        RiskLevel::Critical => {
            "Critical risk markers are present; treat the calm or positive surface of the words as unreliable."
        }
    }
}

fn action_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Continue the conversation normally and keep listening.",
        RiskLevel::Medium => {
            "Check in gently about how the speaker is really doing and watch the next turns."
        }
        RiskLevel::High => {
            "Prioritize a direct, supportive check-in and surface help resources now."
        }
        RiskLevel::Critical => {
            "Conduct an immediate safety assessment: ask directly about self-harm intent, means, and timeframe, and engage the crisis escalation path."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Vt1RiskRuntime {
        Vt1RiskRuntime::new(Vt1RiskConfig::mvp_v1(), RiskLexicon::mvp_v1()).unwrap()
    }

    fn calm_input<'a>(micro: &'a MicroMomentMap) -> Vt1RiskInput<'a> {
        Vt1RiskInput {
            truth_signal: VoiceEmotionLabel::Neutral,
            dissonance_score: 0.0,
            micro_moments: micro,
            baseline_deviation: 0.0,
            baseline_established: false,
            cultural_matches: &[],
            transcript_text: "the meeting moved to tuesday",
            crisis_keyword_hits: &[],
        }
    }

    #[test]
    fn at_risk_01_quiet_turn_scores_low_with_empty_trail() {
        let micro = MicroMomentMap::none();
        let out = runtime().assess(&calm_input(&micro)).unwrap();
        assert_eq!(out.risk_level, RiskLevel::Low);
        assert_eq!(out.risk_score, 0.0);
        assert!(out.risk_factors.is_empty());
        assert!(out.override_reason.is_none());
    }

    #[test]
    fn at_risk_02_crisis_keyword_overrides_a_low_additive_score() {
        let micro = MicroMomentMap::none();
        let mut input = calm_input(&micro);
        input.transcript_text = "sometimes i just want to end it all";
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_level, RiskLevel::Critical);
        assert_eq!(out.override_reason, Some(RiskOverrideReason::CrisisKeyword));
        assert!(out.risk_factors.contains(&RiskFactor::CrisisKeyword));
        assert!(out.risk_score < 0.4);
        assert!(out
            .recommended_action
            .contains("immediate safety assessment"));
    }

    #[test]
    fn at_risk_03_caller_supplied_hits_trigger_without_a_transcript_match() {
        let micro = MicroMomentMap::none();
        let hits = vec!["end it all".to_string()];
        let mut input = calm_input(&micro);
        input.crisis_keyword_hits = &hits;
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_level, RiskLevel::Critical);
        assert_eq!(out.override_reason, Some(RiskOverrideReason::CrisisKeyword));
    }

    #[test]
    fn at_risk_04_critical_cultural_pattern_overrides_and_outranks_crisis_tag() {
        let micro = MicroMomentMap::none();
        let matches = vec![CulturalPatternMatch::v1(
            "i have made my peace",
            CulturalSeverity::Critical,
            "farewell phrasing coded as serenity",
        )
        .unwrap()];
        let hits = vec!["end it all".to_string()];
        let mut input = calm_input(&micro);
        input.cultural_matches = &matches;
        input.crisis_keyword_hits = &hits;
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_level, RiskLevel::Critical);
        assert_eq!(
            out.override_reason,
            Some(RiskOverrideReason::CriticalCulturalPattern)
        );
        // Both hard factors stay in the trail.
        assert!(out.risk_factors.contains(&RiskFactor::CulturalPatternCritical));
        assert!(out.risk_factors.contains(&RiskFactor::CrisisKeyword));
    }

    #[test]
    fn at_risk_05_additive_factors_accumulate_to_high() {
        let micro = MicroMomentMap::v1(true, true, false, true, false, false).unwrap();
        let mut input = calm_input(&micro);
        input.truth_signal = VoiceEmotionLabel::Sad;
        // 0.3 negative truth + 0.3 cluster = 0.6.
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_level, RiskLevel::High);
        assert!((out.risk_score - 0.6).abs() < 1e-9);
        assert_eq!(
            out.risk_factors,
            vec![
                RiskFactor::NegativeTruthSignal,
                RiskFactor::MicroMomentCluster
            ]
        );
    }

    #[test]
    fn at_risk_06_baseline_deviation_counts_only_when_established() {
        let micro = MicroMomentMap::none();
        let mut input = calm_input(&micro);
        input.baseline_deviation = 0.9;
        input.baseline_established = false;
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_score, 0.0);

        input.baseline_established = true;
        let out = runtime().assess(&input).unwrap();
        assert!((out.risk_score - 0.2).abs() < 1e-9);
        assert_eq!(out.risk_factors, vec![RiskFactor::BaselineDeviationHigh]);
    }

    #[test]
    fn at_risk_07_post_decision_calm_requires_all_three_conditions() {
        let flat = MicroMomentMap::v1(false, false, true, false, false, false).unwrap();
        let mut input = calm_input(&flat);
        input.transcript_text = "it's all sorted now, honestly";
        input.dissonance_score = 0.7;
        let out = runtime().assess(&input).unwrap();
        assert!(out.risk_factors.contains(&RiskFactor::PostDecisionCalm));
        assert!((out.risk_score - 0.6).abs() < 1e-9);
        assert_eq!(out.risk_level, RiskLevel::High);

        // Without flat prosody the pattern does not fire.
        let not_flat = MicroMomentMap::none();
        let mut input = calm_input(&not_flat);
        input.transcript_text = "it's all sorted now, honestly";
        input.dissonance_score = 0.7;
        let out = runtime().assess(&input).unwrap();
        assert!(!out.risk_factors.contains(&RiskFactor::PostDecisionCalm));

        // Without the resolution language it does not fire either.
        let mut input = calm_input(&flat);
        input.dissonance_score = 0.7;
        let out = runtime().assess(&input).unwrap();
        assert!(!out.risk_factors.contains(&RiskFactor::PostDecisionCalm));
    }

    #[test]
    fn at_risk_08_additive_critical_reaches_the_floor_without_an_override() {
        let flat = MicroMomentMap::v1(false, true, true, true, false, false).unwrap();
        let mut input = calm_input(&flat);
        input.truth_signal = VoiceEmotionLabel::Sad;
        input.dissonance_score = 0.8;
        input.transcript_text = "i've made my decision, everything is settled";
        // 0.3 truth + 0.3 cluster + 0.6 calm = 1.2, clamped to 1.0.
        let out = runtime().assess(&input).unwrap();
        assert_eq!(out.risk_score, 1.0);
        assert_eq!(out.risk_level, RiskLevel::Critical);
        assert!(out.override_reason.is_none());
    }

    #[test]
    fn at_risk_09_assess_is_idempotent_over_identical_inputs() {
        let micro = MicroMomentMap::v1(true, true, false, true, false, false).unwrap();
        let mut input = calm_input(&micro);
        input.truth_signal = VoiceEmotionLabel::Fear;
        let first = runtime().assess(&input).unwrap();
        let second = runtime().assess(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn at_risk_10_high_cultural_severity_adds_without_overriding() {
        let micro = MicroMomentMap::none();
        let matches = vec![CulturalPatternMatch::v1(
            "no need to trouble anyone",
            CulturalSeverity::High,
            "duty-bound minimization of own distress",
        )
        .unwrap()];
        let mut input = calm_input(&micro);
        input.cultural_matches = &matches;
        let out = runtime().assess(&input).unwrap();
        assert!((out.risk_score - 0.3).abs() < 1e-9);
        assert_eq!(out.risk_level, RiskLevel::Low);
        assert!(out.override_reason.is_none());
        assert_eq!(out.risk_factors, vec![RiskFactor::CulturalPatternHigh]);
    }

    #[test]
    fn at_risk_11_critical_floor_cannot_be_softened_by_other_inputs() {
        let micro = MicroMomentMap::none();
        let matches = vec![CulturalPatternMatch::v1(
            "i have made my peace",
            CulturalSeverity::Critical,
            "farewell phrasing coded as serenity",
        )
        .unwrap()];
        for truth in [
            VoiceEmotionLabel::Neutral,
            VoiceEmotionLabel::Happy,
            VoiceEmotionLabel::Sad,
        ] {
            for established in [false, true] {
                let mut input = calm_input(&micro);
                input.cultural_matches = &matches;
                input.truth_signal = truth;
                input.baseline_established = established;
                let out = runtime().assess(&input).unwrap();
                assert_eq!(out.risk_level, RiskLevel::Critical);
            }
        }
    }
}
