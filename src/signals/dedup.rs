use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;
use tracing::info;
use crate::signals::types::Signal;

/// Last accepted timestamp per `(symbol, strategy)`
pub type CooldownState = HashMap<(String, String), NaiveDateTime>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    Accepted,
    /// Rejected; `since` is the signed gap to the last accepted signal
    Duplicate { since: Duration },
}

impl DedupDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DedupDecision::Accepted)
    }
}

/// Suppresses repeats of the same symbol/strategy inside a cooldown window.
///
/// The gap is measured between signal timestamps only, never against the
/// wall clock. It is signed: a signal older than the last accepted one for
/// its key is always inside the window and gets rejected.
pub struct Deduplicator {
    cooldown: Duration,
    last_accepted: CooldownState,
}

impl Deduplicator {
    pub fn new(cooldown: Duration, state: CooldownState) -> Self {
        Self {
            cooldown,
            last_accepted: state,
        }
    }

    /// Build from a cooldown in (fractional) minutes
    pub fn with_cooldown_minutes(minutes: f64) -> Self {
        let millis = (minutes * 60_000.0).round() as i64;
        Self::new(Duration::milliseconds(millis), CooldownState::new())
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether `signal` is new, recording it when accepted
    pub fn check(&mut self, signal: &Signal) -> DedupDecision {
        let key = (signal.symbol().to_string(), signal.strategy().to_string());

        if let Some(last) = self.last_accepted.get(&key) {
            let since = signal.timestamp() - *last;
            if since < self.cooldown {
                info!("Duplicate signal ignored for {}.", signal.key_label());
                return DedupDecision::Duplicate { since };
            }
        }

        self.last_accepted.insert(key, signal.timestamp());
        DedupDecision::Accepted
    }

    pub fn last_accepted(&self, symbol: &str, strategy: &str) -> Option<NaiveDateTime> {
        self.last_accepted
            .get(&(symbol.to_string(), strategy.to_string()))
            .copied()
    }

    pub fn tracked_keys(&self) -> usize {
        self.last_accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::types::signal_at;

    #[test]
    fn test_first_signal_accepted() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);
        let signal = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London");

        assert_eq!(dedup.check(&signal), DedupDecision::Accepted);
        assert_eq!(dedup.last_accepted("EURUSD", "OB"), Some(signal.timestamp()));
    }

    #[test]
    fn test_repeat_within_cooldown_rejected() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);
        let first = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London");
        let second = signal_at("2024-01-15 09:32:00", "EURUSD", "OB", "London");

        assert!(dedup.check(&first).is_accepted());
        assert_eq!(
            dedup.check(&second),
            DedupDecision::Duplicate { since: Duration::minutes(2) }
        );
        // Rejection leaves the stored timestamp alone
        assert_eq!(dedup.last_accepted("EURUSD", "OB"), Some(first.timestamp()));
    }

    #[test]
    fn test_rejected_regardless_of_arrival_order() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);
        let later = signal_at("2024-01-15 09:32:00", "EURUSD", "OB", "");
        let earlier = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "");

        assert!(dedup.check(&later).is_accepted());
        assert!(!dedup.check(&earlier).is_accepted());
        assert_eq!(dedup.last_accepted("EURUSD", "OB"), Some(later.timestamp()));
    }

    #[test]
    fn test_far_earlier_signal_still_rejected() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);
        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "")).is_accepted());

        let decision = dedup.check(&signal_at("2024-01-14 09:30:00", "EURUSD", "OB", ""));
        assert_eq!(decision, DedupDecision::Duplicate { since: Duration::days(-1) });
    }

    #[test]
    fn test_cooldown_boundary_is_inclusive_for_acceptance() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);
        let first = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "");
        let second = signal_at("2024-01-15 09:35:00", "EURUSD", "OB", "");
        let third = signal_at("2024-01-15 09:47:10", "EURUSD", "OB", "");

        assert!(dedup.check(&first).is_accepted());
        assert!(dedup.check(&second).is_accepted());
        assert!(dedup.check(&third).is_accepted());
        assert_eq!(dedup.last_accepted("EURUSD", "OB"), Some(third.timestamp()));
    }

    #[test]
    fn test_fractional_cooldown() {
        let mut dedup = Deduplicator::with_cooldown_minutes(0.5);
        assert_eq!(dedup.cooldown(), Duration::seconds(30));

        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "")).is_accepted());
        assert!(!dedup.check(&signal_at("2024-01-15 09:30:29", "EURUSD", "OB", "")).is_accepted());
        assert!(dedup.check(&signal_at("2024-01-15 09:30:30", "EURUSD", "OB", "")).is_accepted());
    }

    #[test]
    fn test_keys_are_independent_and_case_sensitive() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);

        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "")).is_accepted());
        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "EURUSD", "FVG", "")).is_accepted());
        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "GBPUSD", "OB", "")).is_accepted());
        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "eurusd", "OB", "")).is_accepted());
        assert_eq!(dedup.tracked_keys(), 4);
    }

    #[test]
    fn test_session_does_not_affect_key() {
        let mut dedup = Deduplicator::with_cooldown_minutes(5.0);

        assert!(dedup.check(&signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "London")).is_accepted());
        assert!(!dedup.check(&signal_at("2024-01-15 09:31:00", "EURUSD", "OB", "NewYork")).is_accepted());
    }

    #[test]
    fn test_injected_state_is_honoured() {
        let mut state = CooldownState::new();
        let seeded = signal_at("2024-01-15 09:30:00", "EURUSD", "OB", "");
        state.insert(("EURUSD".to_string(), "OB".to_string()), seeded.timestamp());

        let mut dedup = Deduplicator::new(Duration::minutes(5), state);
        assert!(!dedup.check(&signal_at("2024-01-15 09:33:00", "EURUSD", "OB", "")).is_accepted());
    }
}
