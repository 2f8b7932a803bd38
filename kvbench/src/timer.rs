use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Registry of named stopwatches.
///
/// Each event accumulates the time spent between matching [`Timer::start`] and
/// [`Timer::end`] calls. Calling `end` without a running `start` is a no-op, so
/// the same event can be closed from several exit paths safely.
///
/// `Timer` is a cheap `Clone` handle; clones share the same registry. Reads
/// take a shared lock and may run concurrently, while `start`/`end` serialise
/// on the write lock.
///
/// # Examples
///
/// ```rust
/// use kvbench::timer::Timer;
///
/// let timer = Timer::new();
/// {
///     let _guard = timer.scoped("Experiment");
///     // measured work
/// }
/// assert!(timer.total_elapsed("Experiment") >= 0.0);
/// assert!(timer.print("Experiment").starts_with("Timer.End: event (Experiment)"));
/// ```
#[derive(Clone, Default)]
pub struct Timer {
    inner: Arc<RwLock<TimerInner>>,
}

#[derive(Default)]
struct TimerInner {
    total_elapsed: HashMap<String, f64>,
    running: HashMap<String, Instant>,
}

impl Timer {
    pub fn new() -> Timer {
        Timer::default()
    }

    /// Starts (or restarts) the stopwatch for `event`.
    ///
    /// A first start registers the event with zero elapsed time. Restarting a
    /// running event discards the unfinished interval.
    pub fn start(&self, event: &str) {
        let mut inner = self.inner.write();
        inner.total_elapsed.entry(event.to_string()).or_insert(0.0);
        inner.running.insert(event.to_string(), Instant::now());
    }

    /// Stops the stopwatch for `event` and adds the interval to its total.
    pub fn end(&self, event: &str) {
        let mut inner = self.inner.write();
        if let Some(started) = inner.running.remove(event) {
            let elapsed = started.elapsed().as_secs_f64();
            *inner.total_elapsed.entry(event.to_string()).or_insert(0.0) += elapsed;
        }
    }

    /// Accumulated seconds for `event`, `0.0` if it was never started.
    pub fn total_elapsed(&self, event: &str) -> f64 {
        let inner = self.inner.read();
        inner.total_elapsed.get(event).copied().unwrap_or(0.0)
    }

    pub fn is_running(&self, event: &str) -> bool {
        self.inner.read().running.contains_key(event)
    }

    /// Summary line for `event`.
    pub fn print(&self, event: &str) -> String {
        format!(
            "Timer.End: event ({}) total elapsed time ({})",
            event,
            self.total_elapsed(event)
        )
    }

    /// Starts `event` and returns a guard that ends it when dropped.
    pub fn scoped(&self, event: &str) -> TimerGuard {
        self.start(event);
        TimerGuard {
            timer: self.clone(),
            event: event.to_string(),
        }
    }
}

/// Ends its event on drop, including while unwinding.
pub struct TimerGuard {
    timer: Timer,
    event: String,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.timer.end(&self.event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_unknown_event_is_zero() {
        let timer = Timer::new();
        assert_eq!(timer.total_elapsed("missing"), 0.0);
        assert_eq!(
            timer.print("missing"),
            "Timer.End: event (missing) total elapsed time (0)"
        );
    }

    #[test]
    fn test_end_without_start_is_noop() {
        let timer = Timer::new();
        timer.end("event");
        assert_eq!(timer.total_elapsed("event"), 0.0);
        assert!(!timer.is_running("event"));
    }

    #[test]
    fn test_start_end_accumulates() {
        let timer = Timer::new();
        timer.start("event");
        thread::sleep(Duration::from_millis(5));
        timer.end("event");
        let first = timer.total_elapsed("event");
        assert!(first >= 0.005);

        timer.start("event");
        thread::sleep(Duration::from_millis(5));
        timer.end("event");
        assert!(timer.total_elapsed("event") >= first + 0.005);
    }

    #[test]
    fn test_double_end_counts_once() {
        let timer = Timer::new();
        timer.start("event");
        timer.end("event");
        let total = timer.total_elapsed("event");
        thread::sleep(Duration::from_millis(5));
        timer.end("event");
        assert_eq!(timer.total_elapsed("event"), total);
    }

    #[test]
    fn test_scoped_guard_ends_on_drop() {
        let timer = Timer::new();
        {
            let _guard = timer.scoped("scoped");
            assert!(timer.is_running("scoped"));
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!timer.is_running("scoped"));
        assert!(timer.total_elapsed("scoped") > 0.0);
    }

    #[test]
    fn test_scoped_guard_ends_on_unwind() {
        let timer = Timer::new();
        let cloned = timer.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.scoped("panicking");
            panic!("batch failed");
        }));
        assert!(result.is_err());
        assert!(!timer.is_running("panicking"));
    }

    #[test]
    fn test_concurrent_events() {
        let timer = Timer::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let timer = timer.clone();
                thread::spawn(move || {
                    let event = format!("event-{}", i);
                    timer.start(&event);
                    thread::sleep(Duration::from_millis(1));
                    timer.end(&event);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for i in 0..4 {
            assert!(timer.total_elapsed(&format!("event-{}", i)) > 0.0);
        }
    }
}
