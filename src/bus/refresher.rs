//! Reload debouncing
//!
//! Views reload their data when events arrive, but bursts of events must
//! not turn into bursts of backend fetches. The refresher admits at most
//! one reload at a time and at most one per configured interval.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// State shared between the refresher and its outstanding permit
#[derive(Debug)]
struct RefreshState {
    last_finished: Option<Instant>,
    in_flight: bool,
}

/// Admission control for view reloads
///
/// A reload may start only when no other reload is in flight and at least
/// the minimum interval has passed since the previous one finished.
#[derive(Debug)]
pub struct DebouncedRefresher {
    min_interval: Duration,
    state: Mutex<RefreshState>,
}

impl DebouncedRefresher {
    /// Create a refresher admitting one reload per `min_interval`
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(RefreshState {
                last_finished: None,
                in_flight: false,
            }),
        }
    }

    fn state_guard(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask to start a reload
    ///
    /// Returns a permit when the reload is admitted. The reload counts as
    /// finished when the permit drops, which also starts the next
    /// debounce interval. Returns `None` while another reload is in
    /// flight or the interval has not yet elapsed.
    pub fn try_begin(&self) -> Option<RefreshPermit<'_>> {
        let mut state = self.state_guard();
        if state.in_flight {
            return None;
        }
        let debounced = state
            .last_finished
            .map(|finished| finished.elapsed() < self.min_interval)
            .unwrap_or(false);
        if debounced {
            return None;
        }
        state.in_flight = true;
        Some(RefreshPermit { state: &self.state })
    }

    /// Run `reload` if a reload is admitted right now
    ///
    /// Returns whether the reload ran.
    pub fn try_run(&self, reload: impl FnOnce()) -> bool {
        match self.try_begin() {
            Some(_permit) => {
                reload();
                true
            }
            None => false,
        }
    }
}

/// Marks one admitted reload as running until dropped
#[derive(Debug)]
pub struct RefreshPermit<'a> {
    state: &'a Mutex<RefreshState>,
}

impl Drop for RefreshPermit<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = false;
        state.last_finished = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_first_reload_is_admitted() {
        let refresher = DebouncedRefresher::new(Duration::from_millis(50));
        assert!(refresher.try_run(|| {}));
    }

    #[test]
    fn test_second_reload_within_interval_is_refused() {
        let refresher = DebouncedRefresher::new(Duration::from_millis(200));

        assert!(refresher.try_run(|| {}));
        assert!(!refresher.try_run(|| {}));
    }

    #[test]
    fn test_reload_is_admitted_again_after_the_interval() {
        let refresher = DebouncedRefresher::new(Duration::from_millis(20));

        assert!(refresher.try_run(|| {}));
        thread::sleep(Duration::from_millis(30));
        assert!(refresher.try_run(|| {}));
    }

    #[test]
    fn test_overlapping_reload_is_refused_while_permit_lives() {
        let refresher = DebouncedRefresher::new(Duration::ZERO);

        let permit = refresher.try_begin();
        assert!(permit.is_some());
        assert!(refresher.try_begin().is_none());

        drop(permit);
        assert!(refresher.try_begin().is_some());
    }

    #[test]
    fn test_refused_reload_does_not_run_the_callback() {
        let refresher = DebouncedRefresher::new(Duration::from_millis(200));
        let mut runs = 0;

        refresher.try_run(|| runs += 1);
        refresher.try_run(|| runs += 1);

        assert_eq!(runs, 1);
    }

    #[test]
    fn test_zero_interval_only_guards_overlap() {
        let refresher = DebouncedRefresher::new(Duration::ZERO);

        assert!(refresher.try_run(|| {}));
        assert!(refresher.try_run(|| {}));
    }
}
