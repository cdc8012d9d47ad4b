use std::hint;
use std::thread;
use std::time::{Duration, Instant};

/// Adaptive backoff for polling the other side of the channel.
///
/// Progression: spin with PAUSE hints → yield to the OS → short sleeps.
/// The channel itself never waits; callers that want blocking semantics
/// wrap `consume_one`/`publish_byte` in a loop driven by this type.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding
    const YIELD_LIMIT: u32 = 10; // then sleep
    const SLEEP_LIMIT: u32 = 14; // then report completion
    const MAX_SLEEP: Duration = Duration::from_millis(1);

    #[inline]
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        let spins = 1 << self.step.min(Self::SPIN_LIMIT);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin, then yield, then sleep up to 1ms.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= Self::SPIN_LIMIT {
            self.spin();
            return;
        }
        if self.step <= Self::YIELD_LIMIT {
            thread::yield_now();
        } else {
            let exp = (self.step - Self::YIELD_LIMIT).min(4);
            thread::sleep((Self::MAX_SLEEP / 16) * (1 << exp));
        }
        if self.step <= Self::SLEEP_LIMIT {
            self.step += 1;
        }
    }

    /// True once the sleep stage is exhausted; a bounded retry should give up here.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.step > Self::SLEEP_LIMIT
    }

    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls `attempt` until it yields `Some`, or `timeout` elapses.
///
/// Backoff saturates at its sleep stage instead of giving up, so the
/// deadline alone bounds the wait.
pub fn poll_until<T, E>(
    timeout: Duration,
    mut attempt: impl FnMut() -> Result<Option<T>, E>,
) -> Result<Option<T>, E> {
    let deadline = Instant::now() + timeout;
    let mut backoff = Backoff::new();
    loop {
        if let Some(value) = attempt()? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        backoff.snooze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let mut b = Backoff::new();
        assert_eq!(b.step, 0);

        b.spin();
        assert!(b.step > 0);

        while !b.is_completed() {
            b.snooze();
        }
        assert!(b.step > Backoff::SLEEP_LIMIT);

        b.reset();
        assert_eq!(b.step, 0);
    }

    #[test]
    fn test_poll_until_returns_first_value() {
        let mut calls = 0;
        let got: Result<Option<u32>, ()> = poll_until(Duration::from_secs(5), || {
            calls += 1;
            Ok((calls == 3).then_some(7))
        });
        assert_eq!(got, Ok(Some(7)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_poll_until_times_out() {
        let got: Result<Option<u32>, ()> = poll_until(Duration::from_millis(5), || Ok(None));
        assert_eq!(got, Ok(None));
    }

    #[test]
    fn test_poll_until_propagates_errors() {
        let got: Result<Option<u32>, &str> = poll_until(Duration::from_secs(1), || Err("boom"));
        assert_eq!(got, Err("boom"));
    }
}
