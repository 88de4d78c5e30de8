//! Event-driven view reloading
//!
//! A view registers one reload callback against the channels it cares
//! about. Events arriving while the view is hidden are not acted on; the
//! reload runs once when the view becomes visible or regains focus, so a
//! backgrounded view catches up without replaying every missed event.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::bus::broadcaster::Subscription;
use crate::bus::event::Channel;
use crate::bus::refresher::DebouncedRefresher;
use crate::bus::EventBus;

struct RefreshDriver {
    refresher: DebouncedRefresher,
    reload: Box<dyn Fn() + Send + Sync>,
    visible: AtomicBool,
}

impl RefreshDriver {
    fn maybe_reload(&self) -> bool {
        self.refresher.try_run(|| (self.reload)())
    }

    fn on_event(&self) -> bool {
        if !self.visible.load(Ordering::SeqCst) {
            return false;
        }
        self.maybe_reload()
    }
}

/// Keeps one view's data fresh from bus events
///
/// Subscriptions live as long as the refresher; dropping it detaches them.
pub struct ViewRefresher {
    driver: Arc<RefreshDriver>,
    subscriptions: Vec<Subscription>,
}

impl ViewRefresher {
    /// Subscribe `reload` to every channel in `channels`
    ///
    /// The view starts out visible. Reloads are debounced to one per
    /// `min_interval`.
    pub fn new<F>(bus: &EventBus, channels: &[Channel], min_interval: Duration, reload: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let driver = Arc::new(RefreshDriver {
            refresher: DebouncedRefresher::new(min_interval),
            reload: Box::new(reload),
            visible: AtomicBool::new(true),
        });

        let subscriptions = channels
            .iter()
            .map(|&channel| {
                let driver = Arc::clone(&driver);
                bus.subscribe(channel, move |_| {
                    driver.on_event();
                })
            })
            .collect();

        Self {
            driver,
            subscriptions,
        }
    }

    /// Record a visibility change; reloads on the hidden-to-visible edge
    ///
    /// Returns whether a reload ran.
    pub fn handle_visibility(&self, visible: bool) -> bool {
        let was_visible = self.driver.visible.swap(visible, Ordering::SeqCst);
        if visible && !was_visible {
            self.driver.maybe_reload()
        } else {
            false
        }
    }

    /// Record that the view regained focus; reloads under the debounce
    ///
    /// Returns whether a reload ran.
    pub fn handle_focus(&self) -> bool {
        self.driver.maybe_reload()
    }
}

impl fmt::Debug for ViewRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRefresher")
            .field("channels", &self.subscriptions.len())
            .field("visible", &self.driver.visible.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
