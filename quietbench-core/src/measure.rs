//! Timing Primitives
//!
//! Monotonic wall-clock timing for trials, expressed in fractional
//! milliseconds, plus the blocking settle pause and thread pinning used by
//! the measurement protocol.

use std::time::{Duration, Instant};

/// Convert a duration to fractional milliseconds.
#[inline]
pub fn to_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

/// Convert fractional milliseconds to a duration. Negative and NaN inputs clamp to zero.
pub fn from_millis(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::from_secs_f64(millis / 1_000.0)
    } else {
        Duration::ZERO
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Timer around one timed region
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since start
    #[inline(always)]
    pub fn stop(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Block the current thread for the settle pause.
///
/// This is a plain sleep: asynchronous interference signals get time to
/// land, and nothing else runs on this thread meanwhile.
pub fn settle(pause: Duration) {
    if !pause.is_zero() {
        std::thread::sleep(pause);
    }
}

/// Set CPU affinity to pin the current thread to a specific core
///
/// Keeps the measuring thread from migrating between cores mid-trial.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is not supported on this platform; always succeeds.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        assert!(elapsed >= Duration::from_millis(10));
        // Generous upper bound for scheduling noise
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_millis_conversion() {
        assert!((to_millis(Duration::from_micros(1500)) - 1.5).abs() < 1e-12);
        assert_eq!(from_millis(250.0), Duration::from_millis(250));
        assert_eq!(from_millis(-1.0), Duration::ZERO);
        assert_eq!(from_millis(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_settle_zero_is_immediate() {
        let timer = Timer::start();
        settle(Duration::ZERO);
        assert!(timer.stop() < Duration::from_millis(50));
    }
}
