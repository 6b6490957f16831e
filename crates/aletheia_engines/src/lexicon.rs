#![forbid(unsafe_code)]

use unicode_normalization::UnicodeNormalization;

use aletheia_kernel_contracts::vt1lexicon::{PhraseTable, RiskLexicon};
use aletheia_kernel_contracts::{ContractViolation, Validate};

/// JSON loaders for store-supplied lexicon documents. The scoring engines
/// only ever see validated tables; a malformed document is rejected here,
/// before it can reach a live turn.
#[derive(Debug)]
pub enum LexiconError {
    Json(serde_json::Error),
    Contract(ContractViolation),
}

impl std::fmt::Display for LexiconError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "lexicon json error: {err}"),
            Self::Contract(violation) => write!(f, "lexicon contract error: {violation:?}"),
        }
    }
}

impl std::error::Error for LexiconError {}

impl From<serde_json::Error> for LexiconError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ContractViolation> for LexiconError {
    fn from(value: ContractViolation) -> Self {
        Self::Contract(value)
    }
}

pub fn load_phrase_table(raw: &str) -> Result<PhraseTable, LexiconError> {
    let table: PhraseTable = serde_json::from_str(raw)?;
    table.validate()?;
    Ok(table)
}

pub fn load_risk_lexicon(raw: &str) -> Result<RiskLexicon, LexiconError> {
    let lexicon: RiskLexicon = serde_json::from_str(raw)?;
    lexicon.validate()?;
    Ok(lexicon)
}

/// Canonical text form shared by every phrase matcher in the core: NFKC,
/// lowercase, curly apostrophes folded, whitespace collapsed to single
/// spaces.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text
        .nfkc()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            _ => c,
        })
        .collect();
    let lowered = folded.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = true;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Substring containment over normalized text; phrases are stored
/// pre-normalized lowercase.
pub fn contains_phrase(normalized_text: &str, phrases: &[String]) -> Option<usize> {
    phrases
        .iter()
        .position(|phrase| normalized_text.contains(phrase.as_str()))
}
