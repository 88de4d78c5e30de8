//! Integration tests for cross-session event propagation
//!
//! Two [`EventBus`] instances share a relay directory the way two running
//! sessions would: one publishes, the other pumps. The suites pin the
//! exactly-once delivery rules and the on-disk channel layout other
//! sessions depend on.

mod common;

use labrooms::{
    Channel, EntryId, EventBus, FileRelayStore, RelayStore, RoomEvent, Subscription, ViewRefresher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

fn relay_bus(dir: &std::path::Path) -> EventBus {
    let store = FileRelayStore::new(dir).unwrap();
    EventBus::with_relay(Arc::new(store))
}

fn channel_counter(bus: &EventBus, channel: Channel) -> (Subscription, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let subscription = bus.subscribe(channel, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (subscription, counter)
}

fn sample_entry_event() -> RoomEvent {
    RoomEvent::EntryAdded {
        id: EntryId(41),
        room_name: "Laboratorio 2".to_string(),
        user_name: "jperez".to_string(),
    }
}

/// Publishing dispatches to this bus's own listeners before returning
#[test]
fn test_publish_reaches_local_subscribers_synchronously() {
    let bus = EventBus::new();
    let (_subscription, count) = channel_counter(&bus, Channel::EntryAdded);

    let delivered = bus.publish(sample_entry_event());

    assert_eq!(delivered, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// A second bus on the same relay directory sees the event exactly once
#[test]
fn test_relay_delivers_foreign_events_exactly_once() {
    let dir = tempdir().unwrap();
    let publisher = relay_bus(dir.path());
    let consumer = relay_bus(dir.path());

    let captured: Arc<Mutex<Vec<RoomEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let _subscription = consumer.subscribe(Channel::EntryAdded, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    publisher.publish(sample_entry_event());

    assert_eq!(consumer.pump_relay(), 1);
    assert_eq!(*captured.lock().unwrap(), vec![sample_entry_event()]);

    // The same record is never delivered twice
    assert_eq!(consumer.pump_relay(), 0);
    assert_eq!(captured.lock().unwrap().len(), 1);
}

/// A bus never re-delivers records it published itself
#[test]
fn test_pump_skips_records_this_bus_published() {
    let dir = tempdir().unwrap();
    let bus = relay_bus(dir.path());
    let (_subscription, count) = channel_counter(&bus, Channel::EntryAdded);

    bus.publish(sample_entry_event());
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert_eq!(bus.pump_relay(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// A bus starting on a populated directory does not replay history
#[test]
fn test_startup_primes_without_replaying() {
    let dir = tempdir().unwrap();
    let publisher = relay_bus(dir.path());
    publisher.publish(sample_entry_event());

    // This session starts after the event was relayed
    let late_joiner = relay_bus(dir.path());
    let (_subscription, count) = channel_counter(&late_joiner, Channel::EntryAdded);

    assert_eq!(late_joiner.pump_relay(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // New records on the primed channel still come through
    publisher.publish(sample_entry_event());
    assert_eq!(late_joiner.pump_relay(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// Each channel relays through its own stable file name
#[test]
fn test_channels_relay_through_separate_files() {
    let dir = tempdir().unwrap();
    let publisher = relay_bus(dir.path());
    let consumer = relay_bus(dir.path());
    let (_added_sub, added) = channel_counter(&consumer, Channel::EntryAdded);
    let (_stats_sub, stats) = channel_counter(&consumer, Channel::StatsReload);

    publisher.publish(sample_entry_event());
    publisher.publish(RoomEvent::StatsReload);

    assert_eq!(consumer.pump_relay(), 2);
    assert_eq!(added.load(Ordering::SeqCst), 1);
    assert_eq!(stats.load(Ordering::SeqCst), 1);

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["room-entry-added.json", "room-stats-reload.json"]);
}

/// Relayed records carry this bus's origin and a growing sequence
#[test]
fn test_relay_records_are_sequenced_by_origin() {
    let dir = tempdir().unwrap();
    let bus = relay_bus(dir.path());

    bus.publish(RoomEvent::StatsReload);
    bus.publish(RoomEvent::StatsReload);

    let store = FileRelayStore::new(dir.path()).unwrap();
    let records = store.load_all().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].channel, Channel::StatsReload);
    assert_eq!(records[0].origin, bus.origin());
    // The file keeps only the latest record for the channel
    assert_eq!(records[0].seq, 2);
}

/// A burst of relayed events collapses into one debounced view reload
#[test]
fn test_relayed_events_drive_one_view_reload() {
    let dir = tempdir().unwrap();
    let publisher = relay_bus(dir.path());
    let consumer = relay_bus(dir.path());

    let reloads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reloads);
    let _refresher = ViewRefresher::new(
        &consumer,
        &[Channel::EntryAdded, Channel::StatsReload],
        Duration::from_secs(1),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    // An entry registration publishes both the entry event and a stats nudge
    publisher.publish(sample_entry_event());
    publisher.publish(RoomEvent::StatsReload);

    assert_eq!(consumer.pump_relay(), 2);
    assert_eq!(reloads.load(Ordering::SeqCst), 1);
}
