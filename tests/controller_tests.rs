//! Integration tests for the role-gated session controller
//!
//! Covers the monitor-only gate, event publication on successful entries
//! and exits, and the pass-through of backend denial reasons.

mod common;

use common::*;
use labrooms::error::BackendError;
use labrooms::{
    messages, AccessController, Channel, EventBus, RoomEvent, RoomId, RoomsBackend, Subscription,
    User,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

async fn controller_for(user: User, backend: Arc<FakeBackend>) -> (AccessController, Arc<EventBus>) {
    let bus = Arc::new(EventBus::new());
    let controller = AccessController::bootstrap(
        user,
        backend as Arc<dyn RoomsBackend>,
        Arc::clone(&bus),
    )
    .await
    .unwrap();
    (controller, bus)
}

fn channel_counter(bus: &EventBus, channel: Channel) -> (Subscription, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let subscription = bus.subscribe(channel, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (subscription, counter)
}

/// Accounts without room rights are answered locally on every operation
#[tokio::test]
async fn test_admin_is_denied_without_backend_traffic() {
    let backend = Arc::new(FakeBackend::new());
    let (controller, _bus) = controller_for(admin(), Arc::clone(&backend)).await;

    let summary = controller.check_access(RoomId(3)).await;
    assert!(!summary.can_access);
    assert_eq!(summary.reason, messages::MONITORS_ONLY);

    let entry = controller.handle_entry(RoomId(3), None).await;
    assert!(!entry.success);
    assert_eq!(entry.message, messages::MONITORS_ONLY);

    let exit = controller.handle_exit(None).await;
    assert!(!exit.success);
    assert_eq!(exit.message, messages::MONITORS_ONLY);

    assert!(controller.schedules_for_room(RoomId(3)).await.is_empty());
    assert!(controller.my_schedules().await.is_empty());
    assert!(!controller.has_schedule_in_room(RoomId(3)).await);

    // The gate answers before any request leaves the process
    assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.entry_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.exit_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.room_access_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.schedule_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.active_entry_calls.load(Ordering::SeqCst), 0);
}

/// The entry announcement carries the names views render
#[tokio::test]
async fn test_entry_event_carries_room_and_user_names() {
    let backend = Arc::new(FakeBackend::new());
    let (controller, bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let captured: Arc<Mutex<Vec<RoomEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let _added_sub = bus.subscribe(Channel::EntryAdded, move |event| {
        sink.lock().unwrap().push(event.clone());
    });
    let (_stats_sub, stats) = channel_counter(&bus, Channel::StatsReload);

    let outcome = controller.handle_entry(RoomId(3), None).await;
    assert!(outcome.success);

    let events = captured.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        RoomEvent::EntryAdded {
            id,
            room_name,
            user_name,
        } => {
            assert_eq!(*id, outcome.entry.as_ref().unwrap().id);
            assert_eq!(room_name, "Laboratorio 3");
            // The backend sent no user name, so the session's own fills in
            assert_eq!(user_name, "jperez");
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(stats.load(Ordering::SeqCst), 1);
}

/// A closed entry is announced on the exit and stats channels
#[tokio::test]
async fn test_exit_announces_on_exited_and_stats_channels() {
    let backend = Arc::new(
        FakeBackend::new().with_active_entry(Ok(Some(open_entry(41, 3, ts(14, 2))))),
    );
    let (controller, bus) = controller_for(monitor(), Arc::clone(&backend)).await;
    assert!(controller.active_entry().is_some());

    let (_exited_sub, exited) = channel_counter(&bus, Channel::EntryExited);
    let (_stats_sub, stats) = channel_counter(&bus, Channel::StatsReload);

    let outcome = controller.handle_exit(None).await;
    assert!(outcome.success);

    assert_eq!(exited.load(Ordering::SeqCst), 1);
    assert_eq!(stats.load(Ordering::SeqCst), 1);
    assert_eq!(controller.active_entry(), None);
}

/// A refused entry publishes nothing
#[tokio::test]
async fn test_refused_entry_publishes_no_events() {
    let backend = Arc::new(
        FakeBackend::new().with_validation(Ok(denied("Fuera de tu horario asignado"))),
    );
    let (controller, bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let (_added_sub, added) = channel_counter(&bus, Channel::EntryAdded);
    let (_stats_sub, stats) = channel_counter(&bus, Channel::StatsReload);

    let outcome = controller.handle_entry(RoomId(3), None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Fuera de tu horario asignado");
    assert_eq!(added.load(Ordering::SeqCst), 0);
    assert_eq!(stats.load(Ordering::SeqCst), 0);
}

/// A denial the backend leaves unexplained falls back to the shift message
#[tokio::test]
async fn test_unexplained_denial_mentions_shift() {
    let backend = Arc::new(FakeBackend::new().with_validation(Ok(denied_without_reason())));
    let (controller, _bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let outcome = controller.handle_entry(RoomId(3), None).await;

    assert!(!outcome.success);
    assert!(outcome.message.contains("turno"));
}

/// Validation failures on the wire collapse into a fail-closed denial
#[tokio::test]
async fn test_validation_transport_failure_denies() {
    let backend = Arc::new(
        FakeBackend::new().with_validation(Err(BackendError::transport("timed out"))),
    );
    let (controller, _bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let outcome = controller.handle_entry(RoomId(3), None).await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, messages::VALIDATION_ERROR);
    // Registration is never attempted without a grant
    assert_eq!(backend.entry_calls.load(Ordering::SeqCst), 0);
}

/// Passive room checks pass the backend's reason through verbatim
#[tokio::test]
async fn test_check_access_passes_reason_verbatim() {
    let backend = Arc::new(FakeBackend::new().with_room_access(Ok(
        labrooms::backend::RoomAccessCheck {
            can_access: false,
            reason: Some("Fuera de horario".to_string()),
            schedule: None,
        },
    )));
    let (controller, _bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let summary = controller.check_access(RoomId(3)).await;

    assert!(!summary.can_access);
    assert_eq!(summary.reason, "Fuera de horario");
    assert_eq!(backend.room_access_calls.load(Ordering::SeqCst), 1);
}

/// Bootstrapping a monitor session adopts the backend's open entry
#[tokio::test]
async fn test_bootstrap_restores_open_entry() {
    let backend = Arc::new(
        FakeBackend::new().with_active_entry(Ok(Some(open_entry(41, 3, ts(14, 2))))),
    );
    let (controller, _bus) = controller_for(monitor(), Arc::clone(&backend)).await;

    let active = controller.active_entry().unwrap();
    assert_eq!(active.room.id, RoomId(3));
    assert_eq!(active.room.name, "Laboratorio 3");
    assert_eq!(backend.active_entry_calls.load(Ordering::SeqCst), 1);
}

/// A refresh picks up an entry another session opened after bootstrap
#[tokio::test]
async fn test_refresh_adopts_entry_opened_elsewhere() {
    let backend = Arc::new(FakeBackend::new());
    let (controller, _bus) = controller_for(monitor(), Arc::clone(&backend)).await;
    assert_eq!(controller.active_entry(), None);

    backend.script_active_entry(Ok(Some(open_entry(41, 3, ts(14, 2)))));
    let refreshed = controller.refresh_active_entry().await.unwrap();

    assert_eq!(refreshed.map(|a| a.room.id), Some(RoomId(3)));
    assert_eq!(controller.active_entry().unwrap().room.name, "Laboratorio 3");
    // Bootstrap plus the explicit refresh
    assert_eq!(backend.active_entry_calls.load(Ordering::SeqCst), 2);
}
