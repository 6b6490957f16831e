#![forbid(unsafe_code)]

use crate::common::{
    validate_finite, validate_unit_interval, ContractViolation, SchemaVersion, Validate,
};

pub const VT1BASELINE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Minimum analyzed sessions before the external baseline store may mark a
/// baseline established.
pub const BASELINE_MIN_SESSIONS: u32 = 3;

/// Snapshot of a user's rolling personal voice baseline, owned and written
/// by the external baseline store. This core only reads it.
///
/// `established == false` means "no baseline" regardless of the other
/// fields; the comparator returns zero deviation in that state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserVoiceBaseline {
    pub schema_version: SchemaVersion,
    pub sessions_analyzed: u32,
    pub established: bool,
    pub typical_pitch_mean_hz: f64,
    pub typical_pitch_std_hz: f64,
    pub typical_energy_mean: f64,
    pub typical_energy_std: f64,
    pub typical_speech_rate_sps: f64,
    pub typical_pause_ratio: f64,
}

impl UserVoiceBaseline {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        sessions_analyzed: u32,
        established: bool,
        typical_pitch_mean_hz: f64,
        typical_pitch_std_hz: f64,
        typical_energy_mean: f64,
        typical_energy_std: f64,
        typical_speech_rate_sps: f64,
        typical_pause_ratio: f64,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: VT1BASELINE_CONTRACT_VERSION,
            sessions_analyzed,
            established,
            typical_pitch_mean_hz,
            typical_pitch_std_hz,
            typical_energy_mean,
            typical_energy_std,
            typical_speech_rate_sps,
            typical_pause_ratio,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for UserVoiceBaseline {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VT1BASELINE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "baseline.schema_version",
                reason: "must match VT1BASELINE_CONTRACT_VERSION",
            });
        }
        if self.established && self.sessions_analyzed < BASELINE_MIN_SESSIONS {
            return Err(ContractViolation::InvalidValue {
                field: "baseline.established",
                reason: "requires sessions_analyzed >= 3",
            });
        }
        validate_finite("baseline.typical_pitch_mean_hz", self.typical_pitch_mean_hz)?;
        validate_finite("baseline.typical_pitch_std_hz", self.typical_pitch_std_hz)?;
        validate_finite("baseline.typical_energy_mean", self.typical_energy_mean)?;
        validate_finite("baseline.typical_energy_std", self.typical_energy_std)?;
        validate_finite(
            "baseline.typical_speech_rate_sps",
            self.typical_speech_rate_sps,
        )?;
        validate_unit_interval("baseline.typical_pause_ratio", self.typical_pause_ratio)?;
        if self.typical_pitch_std_hz < 0.0 {
            return Err(ContractViolation::InvalidValue {
                field: "baseline.typical_pitch_std_hz",
                reason: "must be >= 0",
            });
        }
        if self.typical_energy_std < 0.0 {
            return Err(ContractViolation::InvalidValue {
                field: "baseline.typical_energy_std",
                reason: "must be >= 0",
            });
        }
        Ok(())
    }
}
