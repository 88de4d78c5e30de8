//! Realtime event propagation
//!
//! This module keeps every open view consistent after a mutation, without
//! server push. It provides:
//!
//! - **Events**: typed events on named channels ([`RoomEvent`], [`Channel`])
//! - **Broadcaster**: synchronous in-process dispatch with RAII
//!   subscriptions
//! - **Relay**: file-backed cross-process fan-out, deduplicated by origin
//!   and sequence number
//! - **Refreshers**: debounced view reloading driven by events,
//!   visibility and focus
//!
//! # Usage Example
//!
//! ```rust
//! use labrooms::bus::{Channel, EventBus, RoomEvent};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let _subscription = bus.subscribe(Channel::StatsReload, move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! bus.publish(RoomEvent::StatsReload);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

pub mod broadcaster;
pub mod consumer;
pub mod event;
pub mod refresher;
pub mod relay;

pub use broadcaster::*;
pub use consumer::*;
pub use event::*;
pub use refresher::*;
pub use relay::*;

use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use crate::types::OriginId;

/// Event fan-out for one process
///
/// Publishing delivers to the local listeners synchronously and, when a
/// relay store is attached, writes a record other processes pick up by
/// polling [`EventBus::pump_relay`]. The pump skips records written by
/// this process; local listeners are fed directly by `publish`.
pub struct EventBus {
    origin: OriginId,
    broadcaster: Arc<Broadcaster>,
    relay: Option<Arc<dyn RelayStore>>,
    seq: AtomicU64,
    cursors: Mutex<HashMap<Channel, (OriginId, u64)>>,
}

impl EventBus {
    /// Create a bus delivering to this process only
    pub fn new() -> Self {
        Self {
            origin: OriginId::new(),
            broadcaster: Arc::new(Broadcaster::new()),
            relay: None,
            seq: AtomicU64::new(0),
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// Create a bus that also relays events through the given store
    ///
    /// Records already in the store describe the past; they prime the
    /// dedupe cursor and are not replayed to local listeners.
    pub fn with_relay(store: Arc<dyn RelayStore>) -> Self {
        let bus = Self {
            relay: Some(Arc::clone(&store)),
            ..Self::new()
        };

        match store.load_all() {
            Ok(records) => {
                let mut cursors = bus.cursors_guard();
                for record in records {
                    cursors.insert(record.channel, (record.origin, record.seq));
                }
            }
            Err(err) => warn!(error = %err, "Could not prime relay cursor"),
        }
        bus
    }

    /// Identifier distinguishing this process on the relay
    pub fn origin(&self) -> OriginId {
        self.origin
    }

    fn cursors_guard(&self) -> MutexGuard<'_, HashMap<Channel, (OriginId, u64)>> {
        self.cursors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish an event to local listeners and the relay
    ///
    /// A relay write failure is logged and does not stop local delivery.
    /// Returns the number of local listeners reached.
    pub fn publish(&self, event: RoomEvent) -> usize {
        let channel = event.channel();

        if let Some(store) = &self.relay {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let record = RelayRecord {
                channel,
                event: event.clone(),
                origin: self.origin,
                seq,
                sent_at: Utc::now(),
            };
            if let Err(err) = store.store(&record) {
                warn!(channel = %channel, error = %err, "Relay write failed");
            }
        }

        debug!(channel = %channel, "Publishing event");
        self.broadcaster.dispatch(&event)
    }

    /// Register a listener on a channel
    ///
    /// The listener receives both locally published and relayed events
    /// until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, channel: Channel, listener: F) -> Subscription
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(channel, listener)
    }

    /// Dispatch relayed events this process has not seen yet
    ///
    /// Loads the latest record per channel, skips records originating
    /// here, deduplicates on (origin, sequence) and delivers the rest to
    /// local listeners. Returns the number of events dispatched.
    pub fn pump_relay(&self) -> usize {
        let Some(store) = &self.relay else {
            return 0;
        };

        let records = match store.load_all() {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Relay poll failed");
                return 0;
            }
        };

        let mut dispatched = 0;
        for record in records {
            if record.origin == self.origin {
                continue;
            }
            {
                let mut cursors = self.cursors_guard();
                if cursors.get(&record.channel) == Some(&(record.origin, record.seq)) {
                    continue;
                }
                // Marked before dispatch so a re-entrant pump cannot
                // deliver the same record twice
                cursors.insert(record.channel, (record.origin, record.seq));
            }
            debug!(
                channel = %record.channel,
                origin = %record.origin,
                seq = record.seq,
                "Dispatching relayed event"
            );
            self.broadcaster.dispatch(&record.event);
            dispatched += 1;
        }
        dispatched
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("origin", &self.origin)
            .field("relayed", &self.relay.is_some())
            .finish_non_exhaustive()
    }
}
