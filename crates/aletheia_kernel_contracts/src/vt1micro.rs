#![forbid(unsafe_code)]

use crate::common::{ContractViolation, SchemaVersion, Validate};

pub const VT1MICRO_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Involuntary acoustic markers for one turn, each derived independently
/// from a named feature statistic. A flag whose feature was missing is false.
///
/// Invariant: `voice_tremor` and `flat_prosody` are mutually exclusive;
/// they are cut from disjoint pitch-variability bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroMomentMap {
    pub schema_version: SchemaVersion,
    pub voice_tremor: bool,
    pub voice_crack: bool,
    pub flat_prosody: bool,
    pub sigh_detected: bool,
    pub hesitation: bool,
    pub harsh_voice: bool,
}

impl MicroMomentMap {
    pub fn v1(
        voice_tremor: bool,
        voice_crack: bool,
        flat_prosody: bool,
        sigh_detected: bool,
        hesitation: bool,
        harsh_voice: bool,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1MICRO_CONTRACT_VERSION,
            voice_tremor,
            voice_crack,
            flat_prosody,
            sigh_detected,
            hesitation,
            harsh_voice,
        };
        v.validate()?;
        Ok(v)
    }

    pub fn none() -> Self {
        Self {
            schema_version: VT1MICRO_CONTRACT_VERSION,
            voice_tremor: false,
            voice_crack: false,
            flat_prosody: false,
            sigh_detected: false,
            hesitation: false,
            harsh_voice: false,
        }
    }

    /// Number of asserted flags; used by the dissonance and risk engines
    /// for amplification.
    pub fn count(&self) -> u8 {
        u8::from(self.voice_tremor)
            + u8::from(self.voice_crack)
            + u8::from(self.flat_prosody)
            + u8::from(self.sigh_detected)
            + u8::from(self.hesitation)
            + u8::from(self.harsh_voice)
    }
}

impl Validate for MicroMomentMap {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1MICRO_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "micro_moments.schema_version",
                reason: "must match VT1MICRO_CONTRACT_VERSION",
            });
        }
        if self.voice_tremor && self.flat_prosody {
            return Err(ContractViolation::InvalidValue {
                field: "micro_moments",
                reason: "voice_tremor and flat_prosody are mutually exclusive",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_micro_contract_01_tremor_and_flat_prosody_cannot_coexist() {
        assert!(MicroMomentMap::v1(true, false, true, false, false, false).is_err());
        assert!(MicroMomentMap::v1(true, false, false, false, false, false).is_ok());
        assert!(MicroMomentMap::v1(false, false, true, false, false, false).is_ok());
    }

    #[test]
    fn at_micro_contract_02_count_sums_asserted_flags() {
        assert_eq!(MicroMomentMap::none().count(), 0);
        let m = MicroMomentMap::v1(true, true, false, true, false, false).unwrap();
        assert_eq!(m.count(), 3);
        let m = MicroMomentMap::v1(true, true, false, true, true, true).unwrap();
        assert_eq!(m.count(), 5);
    }
}
