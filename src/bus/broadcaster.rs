//! In-process synchronous event dispatch
//!
//! A channel-keyed listener registry. Dispatch happens on the caller's
//! stack; listeners run one after another in subscription order.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::bus::event::{Channel, RoomEvent};

/// Callback invoked with every event on a subscribed channel
pub type Listener = Arc<dyn Fn(&RoomEvent) + Send + Sync>;

/// Channel-keyed registry delivering events to listeners in process
pub struct Broadcaster {
    listeners: DashMap<Channel, Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener on a channel and return its registration id
    pub fn attach(&self, channel: Channel, listener: Listener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.entry(channel).or_default().push((id, listener));
        id
    }

    /// Register a listener whose lifetime is owned by the returned guard
    ///
    /// Dropping the [`Subscription`] removes the listener, so a view that
    /// goes away cannot leave a dangling callback behind.
    pub fn subscribe<F>(self: &Arc<Self>, channel: Channel, listener: F) -> Subscription
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        let id = self.attach(channel, Arc::new(listener));
        Subscription {
            broadcaster: Arc::downgrade(self),
            channel,
            id,
        }
    }

    /// Remove the listener registered under `id`, if still present
    pub fn detach(&self, channel: Channel, id: u64) {
        if let Some(mut entry) = self.listeners.get_mut(&channel) {
            entry.retain(|(listener_id, _)| *listener_id != id);
        }
    }

    /// Deliver an event to every listener on its channel
    ///
    /// The registry lock is released before any callback runs, so
    /// listeners may attach or detach subscriptions from inside a
    /// callback. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &RoomEvent) -> usize {
        let snapshot: Vec<Listener> = match self.listeners.get(&event.channel()) {
            Some(entry) => entry.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };

        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    /// Number of listeners currently registered on a channel
    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners
            .get(&channel)
            .map(|entry| entry.len())
            .unwrap_or(0)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("channels", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

/// Guard keeping one listener registered
///
/// The listener stays attached for as long as the guard lives. Dropping
/// the guard after the broadcaster itself is gone is a no-op.
#[derive(Debug)]
pub struct Subscription {
    broadcaster: Weak<Broadcaster>,
    channel: Channel,
    id: u64,
}

impl Subscription {
    /// The channel this subscription listens on
    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(broadcaster) = self.broadcaster.upgrade() {
            broadcaster.detach(self.channel, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let listener = {
            let count = Arc::clone(&count);
            Arc::new(move |_: &RoomEvent| {
                count.fetch_add(1, Ordering::SeqCst);
            }) as Listener
        };
        (listener, count)
    }

    #[test]
    fn test_dispatch_reaches_attached_listeners() {
        let broadcaster = Broadcaster::new();
        let (listener, count) = counting_listener();
        broadcaster.attach(Channel::StatsReload, listener);

        let invoked = broadcaster.dispatch(&RoomEvent::StatsReload);

        assert_eq!(invoked, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_without_listeners_is_noop() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.dispatch(&RoomEvent::ScheduleUpdated), 0);
    }

    #[test]
    fn test_dispatch_only_hits_the_events_channel() {
        let broadcaster = Broadcaster::new();
        let (stats, stats_count) = counting_listener();
        let (schedule, schedule_count) = counting_listener();
        broadcaster.attach(Channel::StatsReload, stats);
        broadcaster.attach(Channel::ScheduleUpdated, schedule);

        broadcaster.dispatch(&RoomEvent::StatsReload);

        assert_eq!(stats_count.load(Ordering::SeqCst), 1);
        assert_eq!(schedule_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detached_listener_no_longer_fires() {
        let broadcaster = Broadcaster::new();
        let (listener, count) = counting_listener();
        let id = broadcaster.attach(Channel::StatsReload, listener);

        broadcaster.dispatch(&RoomEvent::StatsReload);
        broadcaster.detach(Channel::StatsReload, id);
        broadcaster.dispatch(&RoomEvent::StatsReload);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(broadcaster.listener_count(Channel::StatsReload), 0);
    }

    #[test]
    fn test_listener_may_attach_during_dispatch() {
        let broadcaster = Arc::new(Broadcaster::new());
        let (inner, inner_count) = counting_listener();

        let registrar = {
            let broadcaster = Arc::clone(&broadcaster);
            Arc::new(move |_: &RoomEvent| {
                broadcaster.attach(Channel::StatsReload, Arc::clone(&inner));
            }) as Listener
        };
        broadcaster.attach(Channel::StatsReload, registrar);

        // First dispatch registers the inner listener without deadlocking
        broadcaster.dispatch(&RoomEvent::StatsReload);
        assert_eq!(inner_count.load(Ordering::SeqCst), 0);

        broadcaster.dispatch(&RoomEvent::StatsReload);
        assert_eq!(inner_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listeners_run_in_subscription_order() {
        let broadcaster = Broadcaster::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            broadcaster.attach(
                Channel::StatsReload,
                Arc::new(move |_: &RoomEvent| order.lock().unwrap().push(label)),
            );
        }

        broadcaster.dispatch(&RoomEvent::StatsReload);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dropping_the_subscription_detaches() {
        let broadcaster = Arc::new(Broadcaster::new());
        let (listener, count) = counting_listener();

        let subscription = broadcaster.subscribe(Channel::StatsReload, move |event| {
            listener(event);
        });
        assert_eq!(subscription.channel(), Channel::StatsReload);

        broadcaster.dispatch(&RoomEvent::StatsReload);
        drop(subscription);
        broadcaster.dispatch(&RoomEvent::StatsReload);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(broadcaster.listener_count(Channel::StatsReload), 0);
    }

    #[test]
    fn test_subscription_outliving_the_broadcaster_is_harmless() {
        let broadcaster = Arc::new(Broadcaster::new());
        let subscription = broadcaster.subscribe(Channel::StatsReload, |_| {});

        drop(broadcaster);
        drop(subscription);
    }
}
