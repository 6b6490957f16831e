#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use aletheia_kernel_contracts::vt1risk::{RiskLevel, TrajectoryState};
use aletheia_kernel_contracts::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrajectoryConfig {
    /// Observations retained per session; older entries roll off and the
    /// trajectory comparison anchors on the first retained one.
    pub retained_window: usize,
}

impl TrajectoryConfig {
    pub fn mvp_v1() -> Self {
        Self {
            retained_window: 64,
        }
    }
}

/// Append-only arena of per-session risk observations, indexed by session
/// id, with the trajectory computed by a pure function over a read-only
/// slice. The store embeds no lock: turns within one session are sequential
/// by construction, and callers that can legitimately receive concurrent
/// turns must serialize access themselves.
#[derive(Debug, Clone)]
pub struct TrajectoryStore {
    config: TrajectoryConfig,
    sessions: BTreeMap<SessionId, Vec<RiskLevel>>,
}

impl TrajectoryStore {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self {
            config,
            sessions: BTreeMap::new(),
        }
    }

    pub fn update_trajectory(&mut self, session_id: &SessionId, risk_level: RiskLevel) {
        let log = self.sessions.entry(session_id.clone()).or_default();
        log.push(risk_level);
        if log.len() > self.config.retained_window {
            let excess = log.len() - self.config.retained_window;
            log.drain(..excess);
        }
    }

    pub fn observations(&self, session_id: &SessionId) -> &[RiskLevel] {
        self.sessions
            .get(session_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn classify(&self, session_id: &SessionId) -> TrajectoryState {
        classify_trajectory(self.observations(session_id))
    }

    /// Drops a session's log at session end; the surrounding system owns
    /// any longer-lived persistence.
    pub fn discard_session(&mut self, session_id: &SessionId) {
        self.sessions.remove(session_id);
    }
}

/// Trajectory over the retained window: with at least two observations,
/// the latest rank against the first decides the trend. Informational
/// only; it never changes a turn's own risk level.
pub fn classify_trajectory(observations: &[RiskLevel]) -> TrajectoryState {
    if observations.len() < 2 {
        return TrajectoryState::InsufficientData;
    }
    let first = observations[0].rank();
    let latest = observations[observations.len() - 1].rank();
    if latest > first {
        TrajectoryState::Escalating
    } else if latest < first {
        TrajectoryState::Improving
    } else {
        TrajectoryState::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(name: &str) -> SessionId {
        SessionId::new(name).unwrap()
    }

    #[test]
    fn at_trajectory_01_fewer_than_two_observations_is_insufficient() {
        let mut store = TrajectoryStore::new(TrajectoryConfig::mvp_v1());
        let s = session("session_a");
        assert_eq!(store.classify(&s), TrajectoryState::InsufficientData);
        store.update_trajectory(&s, RiskLevel::Low);
        assert_eq!(store.classify(&s), TrajectoryState::InsufficientData);
    }

    #[test]
    fn at_trajectory_02_rising_rank_over_ten_turns_escalates() {
        let mut store = TrajectoryStore::new(TrajectoryConfig::mvp_v1());
        let s = session("session_b");
        let ladder = [
            RiskLevel::Low,
            RiskLevel::Low,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::Medium,
            RiskLevel::Medium,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::High,
            RiskLevel::High,
        ];
        for level in ladder {
            store.update_trajectory(&s, level);
        }
        assert_eq!(store.classify(&s), TrajectoryState::Escalating);
    }

    #[test]
    fn at_trajectory_03_falling_and_flat_ranks_classify_accordingly() {
        assert_eq!(
            classify_trajectory(&[RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]),
            TrajectoryState::Improving
        );
        assert_eq!(
            classify_trajectory(&[RiskLevel::Medium, RiskLevel::High, RiskLevel::Medium]),
            TrajectoryState::Stable
        );
    }

    #[test]
    fn at_trajectory_04_sessions_are_independent() {
        let mut store = TrajectoryStore::new(TrajectoryConfig::mvp_v1());
        let a = session("session_a");
        let b = session("session_b");
        store.update_trajectory(&a, RiskLevel::Low);
        store.update_trajectory(&a, RiskLevel::High);
        store.update_trajectory(&b, RiskLevel::High);
        store.update_trajectory(&b, RiskLevel::Low);
        assert_eq!(store.classify(&a), TrajectoryState::Escalating);
        assert_eq!(store.classify(&b), TrajectoryState::Improving);
    }

    #[test]
    fn at_trajectory_05_window_rolls_off_oldest_observations() {
        let mut store = TrajectoryStore::new(TrajectoryConfig { retained_window: 3 });
        let s = session("session_c");
        store.update_trajectory(&s, RiskLevel::Critical);
        store.update_trajectory(&s, RiskLevel::Low);
        store.update_trajectory(&s, RiskLevel::Low);
        store.update_trajectory(&s, RiskLevel::Medium);
        // The critical first turn has rolled off; the window is low..medium.
        assert_eq!(store.observations(&s).len(), 3);
        assert_eq!(store.classify(&s), TrajectoryState::Escalating);
    }

    #[test]
    fn at_trajectory_06_discard_resets_a_session() {
        let mut store = TrajectoryStore::new(TrajectoryConfig::mvp_v1());
        let s = session("session_d");
        store.update_trajectory(&s, RiskLevel::Low);
        store.update_trajectory(&s, RiskLevel::High);
        store.discard_session(&s);
        assert_eq!(store.classify(&s), TrajectoryState::InsufficientData);
    }
}
