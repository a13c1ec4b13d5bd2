//! Warm-up
//!
//! Drives the payload until the runtime's adaptive compiler has plausibly
//! reached steady state. Both an iteration floor and a wall-time floor must be
//! met; whichever takes longer decides.

use crate::executor::TimedExecutor;
use crate::measure::Timer;
use std::hash::Hash;
use std::time::Duration;

/// What warm-up did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupReport {
    /// Payload invocations
    pub iterations: u64,
    /// Wall time spent
    pub elapsed: Duration,
}

/// Invoke `payload` until at least `min_iterations` calls have been made and
/// `min_time` has elapsed.
pub fn warm_up<T, F>(
    executor: &mut TimedExecutor,
    payload: &mut F,
    min_iterations: u32,
    min_time: Duration,
    verbose: bool,
) -> WarmupReport
where
    F: FnMut() -> T,
    T: Hash,
{
    narrate!(verbose, min_iterations, ?min_time, "warming up");

    let timer = Timer::start();
    let mut iterations = 0u64;
    while iterations < u64::from(min_iterations) || timer.stop() < min_time {
        executor.execute_once(payload);
        iterations += 1;
    }

    let elapsed = timer.stop();
    narrate!(verbose, iterations, ?elapsed, "warm-up complete");
    WarmupReport {
        iterations,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_payload_meets_both_floors() {
        let mut executor = TimedExecutor::new();
        let mut payload = || 1u8;

        let report = warm_up(
            &mut executor,
            &mut payload,
            10,
            Duration::from_millis(50),
            false,
        );

        assert!(report.iterations >= 10);
        assert!(report.elapsed >= Duration::from_millis(50));
        // An instant payload needs far more than ten calls to fill 50ms.
        assert!(report.iterations > 10);
    }

    #[test]
    fn test_slow_payload_stops_at_iteration_floor() {
        let mut executor = TimedExecutor::new();
        let mut payload = || std::thread::sleep(Duration::from_millis(2));

        let report = warm_up(&mut executor, &mut payload, 5, Duration::from_millis(1), false);
        assert_eq!(report.iterations, 5);
    }

    #[test]
    fn test_zero_floors_skip_warm_up() {
        let mut executor = TimedExecutor::new();
        let mut calls = 0u32;
        let mut payload = || calls += 1;

        let report = warm_up(&mut executor, &mut payload, 0, Duration::ZERO, false);
        assert_eq!(report.iterations, 0);
        assert_eq!(calls, 0);
    }
}
