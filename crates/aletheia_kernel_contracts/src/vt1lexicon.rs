#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::common::{ContractViolation, SchemaVersion, Validate};

pub const VT1LEXICON_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const LEXICON_MAX_ENTRIES: usize = 256;
pub const LEXICON_MAX_PHRASE_CHARS: usize = 64;

/// Phrase tables consumed by the content classifier. Data-driven: the
/// cultural-context collaborator can ship replacement tables as JSON
/// documents without touching the scoring engine. Entries are stored
/// pre-normalized (lowercase); match order is deflection, positive,
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseTable {
    pub schema_version: SchemaVersion,
    pub deflection: Vec<String>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl PhraseTable {
    /// Starter tables so the core runs stand-alone before a store-supplied
    /// document is injected.
    pub fn mvp_v1() -> Self {
        Self {
            schema_version: VT1LEXICON_CONTRACT_VERSION,
            deflection: to_owned(&[
                "i'm fine",
                "im fine",
                "it's nothing",
                "its nothing",
                "it is nothing",
                "don't worry about me",
                "dont worry about me",
                "no big deal",
                "i'll manage",
                "ill manage",
                "i'm okay, really",
                "it is what it is",
                "can't complain",
                "cant complain",
            ]),
            positive: to_owned(&[
                "i'm happy",
                "im happy",
                "i feel good",
                "feeling great",
                "really good",
                "wonderful",
                "i'm excited",
                "im excited",
                "things are going well",
                "i'm proud",
                "im proud",
            ]),
            negative: to_owned(&[
                "i'm sad",
                "im sad",
                "i'm angry",
                "im angry",
                "i'm scared",
                "im scared",
                "terrible",
                "awful",
                "miserable",
                "hopeless",
                "worthless",
                "exhausted",
                "i hate",
                "i can't cope",
                "i cant cope",
                "overwhelmed",
            ]),
        }
    }
}

impl Validate for PhraseTable {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1LEXICON_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "phrase_table.schema_version",
                reason: "must match VT1LEXICON_CONTRACT_VERSION",
            });
        }
        validate_phrase_list("phrase_table.deflection", &self.deflection)?;
        validate_phrase_list("phrase_table.positive", &self.positive)?;
        validate_phrase_list("phrase_table.negative", &self.negative)?;
        Ok(())
    }
}

/// Lexicon consumed by the risk assessor: direct crisis expressions and the
/// resolution/relief language used by the post-decision-calm pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLexicon {
    pub schema_version: SchemaVersion,
    pub crisis_keywords: Vec<String>,
    pub resolution_phrases: Vec<String>,
}

impl RiskLexicon {
    pub fn mvp_v1() -> Self {
        Self {
            schema_version: VT1LEXICON_CONTRACT_VERSION,
            crisis_keywords: to_owned(&[
                "kill myself",
                "end my life",
                "end it all",
                "suicide",
                "hurt myself",
                "harm myself",
                "not be here anymore",
                "no reason to live",
                "better off without me",
                "want to die",
                "want to disappear",
            ]),
            resolution_phrases: to_owned(&[
                "it's all sorted now",
                "its all sorted now",
                "everything is settled",
                "i've made my decision",
                "ive made my decision",
                "made my peace",
                "everything will be over soon",
                "it will all be over soon",
                "don't have to worry anymore",
                "dont have to worry anymore",
                "won't matter soon",
                "wont matter soon",
                "given everything away",
            ]),
        }
    }
}

impl Validate for RiskLexicon {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1LEXICON_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "risk_lexicon.schema_version",
                reason: "must match VT1LEXICON_CONTRACT_VERSION",
            });
        }
        validate_phrase_list("risk_lexicon.crisis_keywords", &self.crisis_keywords)?;
        validate_phrase_list("risk_lexicon.resolution_phrases", &self.resolution_phrases)?;
        Ok(())
    }
}

fn validate_phrase_list(
    field: &'static str,
    phrases: &[String],
) -> Result<(), ContractViolation> {
    if phrases.len() > LEXICON_MAX_ENTRIES {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds max entry count",
        });
    }
    for phrase in phrases {
        if phrase.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "entries must not be empty",
            });
        }
        if phrase.chars().count() > LEXICON_MAX_PHRASE_CHARS {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "entry exceeds max length",
            });
        }
        if phrase.chars().any(|c| c.is_uppercase()) {
            return Err(ContractViolation::InvalidValue {
                field,
                reason: "entries must be pre-normalized lowercase",
            });
        }
    }
    Ok(())
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_lexicon_contract_01_starter_tables_are_schema_valid() {
        assert!(PhraseTable::mvp_v1().validate().is_ok());
        assert!(RiskLexicon::mvp_v1().validate().is_ok());
    }

    #[test]
    fn at_lexicon_contract_02_uppercase_entries_are_rejected() {
        let mut table = PhraseTable::mvp_v1();
        table.positive.push("I'm Happy".to_string());
        assert!(table.validate().is_err());
    }

    #[test]
    fn at_lexicon_contract_03_empty_entries_are_rejected() {
        let mut lexicon = RiskLexicon::mvp_v1();
        lexicon.crisis_keywords.push("  ".to_string());
        assert!(lexicon.validate().is_err());
    }
}
