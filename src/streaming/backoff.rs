use std::time::Duration;

pub const BASE_DELAY_MS: u64 = 1_000;
pub const MAX_DELAY_MS: u64 = 16_000;

/// Reconnect delay before retry `attempt` (1-based).
///
/// `1s, 2s, 4s, 8s, 16s, 16s, ...`
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let ms = BASE_DELAY_MS.saturating_mul(1u64 << exp).min(MAX_DELAY_MS);
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_doubles_then_caps() {
        let delays: Vec<u64> = (1..=8).map(|n| backoff_delay(n).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 16000, 16000, 16000]);
    }

    #[test]
    fn never_decreases_and_never_exceeds_cap() {
        let mut prev = Duration::ZERO;
        for n in 1..200 {
            let d = backoff_delay(n);
            assert!(d >= prev);
            assert!(d <= Duration::from_millis(MAX_DELAY_MS));
            prev = d;
        }
    }

    #[test]
    fn attempt_zero_is_treated_as_first() {
        assert_eq!(backoff_delay(0), Duration::from_millis(1000));
    }
}
