//! Reconnect delay policy.

use std::time::Duration;

/// Doubling reconnect delay, capped at a ceiling.
///
/// The delay handed out by [`Backoff::next_delay`] is the current value;
/// the stored value then doubles. [`Backoff::reset`] restores the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        let base = base.min(ceiling);
        Self {
            base,
            ceiling,
            current: base,
        }
    }

    /// Delay the next reconnect will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Take the current delay and advance to the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_doubles_then_caps() {
        let mut backoff = Backoff::new(secs(1), secs(30));
        let delays: Vec<u64> = (0..8).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn test_reset_restores_base() {
        let mut backoff = Backoff::new(secs(1), secs(30));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.current(), secs(4));

        backoff.reset();
        assert_eq!(backoff.next_delay(), secs(1));
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let mut backoff = Backoff::new(Duration::from_millis(750), secs(30));
        let mut previous = Duration::ZERO;
        for _ in 0..64 {
            let delay = backoff.next_delay();
            assert!(delay >= previous);
            assert!(delay <= secs(30));
            previous = delay;
        }
    }

    #[test]
    fn test_base_above_ceiling_is_clamped() {
        let mut backoff = Backoff::new(secs(60), secs(30));
        assert_eq!(backoff.next_delay(), secs(30));
    }
}
