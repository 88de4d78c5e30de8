// Room Access & Attendance Engine - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/labrooms --config labrooms.json check 3
// ```
//
// Or with the identity given inline:
//
// ```console
// $ ./target/release/labrooms --username jperez --user-id 8 --role monitor enter 3
// ```

use chrono::{DateTime, Local, Utc};
use clap::Parser;
use labrooms::types::config::CliArgs;
use labrooms::{
    AccessController, AttendanceService, Channel, ClientConfig, Command, EventBus, FileRelayStore,
    HttpBackend, LoggingConfig, RoomId, RoomsBackend, Schedule, Subscription,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        let default_config = ClientConfig::default();
        match default_config.print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // Initialize logging based on CLI flags
    let logging_result = if args.debug {
        LoggingConfig::init_debug()
    } else if args.verbose {
        LoggingConfig::init_verbose()
    } else {
        // Default: minimal logging for normal users
        LoggingConfig::new().with_level(tracing::Level::WARN).init()
    };

    if let Err(e) = logging_result {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Starting room access engine");

    // Load configuration from CLI arguments and optional config file
    let command = args.command.clone();
    let config = match ClientConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    // Handle dry run mode
    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - the backend will not be contacted.");
        print_configuration_summary(&config);
        return;
    }

    // Write the resolved configuration back to disk when asked
    if let Some(path) = &args.save_config {
        if let Err(e) = config.save_to_file(path) {
            error!("Failed to write configuration: {}", e);
            eprintln!("Failed to write configuration: {}", e);
            process::exit(1);
        }
        eprintln!("Configuration written to {}", path.display());
        return;
    }

    let Some(command) = command else {
        eprintln!("No command given. Run with --help for the list of commands.");
        process::exit(1);
    };

    // Connect the engine to the configured backend
    let (controller, backend, bus) = match initialize_engine(&config).await {
        Ok(components) => components,
        Err(e) => {
            error!("Failed to initialize engine: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(command, &config, controller, backend, bus).await {
        error!("Command failed: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("Room access engine completed successfully");
}

/// Build the backend client, the event bus, and the session controller
async fn initialize_engine(
    config: &ClientConfig,
) -> Result<(AccessController, Arc<dyn RoomsBackend>, Arc<EventBus>), String> {
    let user = config
        .require_user()
        .map_err(|e| format!("Failed to resolve the signed-in account: {}", e))?;

    let backend = HttpBackend::from_config(config)
        .map_err(|e| format!("Failed to create the backend client: {}", e))?;
    let backend: Arc<dyn RoomsBackend> = Arc::new(backend);

    let bus = match &config.relay_dir {
        Some(dir) => {
            let store = FileRelayStore::new(dir)
                .map_err(|e| format!("Failed to open relay directory: {}", e))?;
            Arc::new(EventBus::with_relay(Arc::new(store)))
        }
        None => Arc::new(EventBus::new()),
    };

    info!(
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        "Session starting"
    );

    let controller = AccessController::bootstrap(user, Arc::clone(&backend), Arc::clone(&bus))
        .await
        .map_err(|e| format!("Failed to restore the session state: {}", e))?;

    if let Some(active) = controller.active_entry() {
        eprintln!("Open entry: {} (#{})", active.room.name, active.entry_id);
    }

    Ok((controller, backend, bus))
}

/// Dispatch the requested operation
async fn run_command(
    command: Command,
    config: &ClientConfig,
    controller: AccessController,
    backend: Arc<dyn RoomsBackend>,
    bus: Arc<EventBus>,
) -> Result<(), String> {
    match command {
        Command::Check { room } => run_check(&controller, room).await,
        Command::Enter { room, at } => run_enter(&controller, room, at).await,
        Command::Exit { at } => run_exit(&controller, at).await,
        Command::Schedules { room } => run_schedules(&controller, room).await,
        Command::Stats { month, date } => {
            run_stats(backend, config.grace_minutes, month, date).await
        }
        Command::Watch { interval_ms } => run_watch(config, bus, interval_ms).await,
    }
}

/// Ask whether the room can be entered right now
async fn run_check(controller: &AccessController, room: RoomId) -> Result<(), String> {
    let summary = controller.check_access(room).await;

    if summary.can_access {
        println!("Room {} can be entered right now.", room);
        if let Some(schedule) = &summary.schedule {
            println!("Covered by {}", describe_schedule(schedule));
        }
    } else {
        println!("Room {} cannot be entered: {}", room, summary.reason);
    }
    Ok(())
}

/// Validate and register an entry
async fn run_enter(
    controller: &AccessController,
    room: RoomId,
    at: Option<DateTime<Utc>>,
) -> Result<(), String> {
    let outcome = controller.handle_entry(room, at).await;
    println!("{}", outcome.message);

    if let Some(entry) = &outcome.entry {
        println!(
            "Entry #{} into {} at {}",
            entry.id,
            entry.room_label(),
            entry
                .entry_time
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Close the currently open entry
async fn run_exit(controller: &AccessController, at: Option<DateTime<Utc>>) -> Result<(), String> {
    let outcome = controller.handle_exit(at).await;
    println!("{}", outcome.message);

    if let Some(entry) = &outcome.entry {
        if let Some(exit_time) = entry.exit_time {
            println!(
                "Exit from {} at {}",
                entry.room_label(),
                exit_time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
        }
    }
    Ok(())
}

/// List the signed-in monitor's schedules
async fn run_schedules(controller: &AccessController, room: Option<RoomId>) -> Result<(), String> {
    let schedules = match room {
        Some(room) => controller.schedules_for_room(room).await,
        None => controller.my_schedules().await,
    };

    if schedules.is_empty() {
        println!("No schedules found.");
        return Ok(());
    }

    println!("Schedules:");
    for schedule in &schedules {
        println!("  {}", describe_schedule(schedule));
    }
    Ok(())
}

/// Summarize attendance for the week or month containing the reference date
async fn run_stats(
    backend: Arc<dyn RoomsBackend>,
    grace_minutes: i64,
    month: bool,
    date: Option<chrono::NaiveDate>,
) -> Result<(), String> {
    let service = AttendanceService::new(backend, grace_minutes);
    let reference = date.unwrap_or_else(|| Local::now().date_naive());

    let summary = if month {
        service.month_summary(reference, &Local).await
    } else {
        service.week_summary(reference, &Local).await
    }
    .map_err(|e| format!("Failed to load attendance data: {}", e))?;

    println!(
        "Attendance {} .. {}",
        summary.range.start.format("%Y-%m-%d"),
        summary.range.end.format("%Y-%m-%d")
    );
    println!("  Time in rooms: {}", summary.formatted_total());
    println!("  Entries: {}", summary.entry_count);
    println!("  Late arrivals: {}", summary.late_count);
    Ok(())
}

/// Follow events other sessions publish through the relay directory
async fn run_watch(
    config: &ClientConfig,
    bus: Arc<EventBus>,
    interval_ms: u64,
) -> Result<(), String> {
    if config.relay_dir.is_none() {
        warn!("No relay directory configured; only events from this process will appear");
    }

    // Print every event any channel delivers
    let _subscriptions: Vec<Subscription> = Channel::all()
        .into_iter()
        .map(|channel| {
            bus.subscribe(channel, move |event| match serde_json::to_string(event) {
                Ok(json) => println!("{} {}", channel, json),
                Err(e) => warn!(channel = %channel, error = %e, "Event not serializable"),
            })
        })
        .collect();

    eprintln!("Watching room events (Ctrl-C to stop)...");

    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                bus.pump_relay();
            }
            result = tokio::signal::ctrl_c() => {
                result.map_err(|e| format!("Failed to listen for Ctrl-C: {}", e))?;
                eprintln!("Stopped.");
                return Ok(());
            }
        }
    }
}

/// One-line schedule description for terminal output
fn describe_schedule(schedule: &Schedule) -> String {
    let room = schedule
        .room_name
        .clone()
        .unwrap_or_else(|| format!("sala {}", schedule.room));
    format!(
        "#{} {} {} .. {}",
        schedule.id,
        room,
        schedule
            .start_datetime
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M"),
        schedule
            .end_datetime
            .with_timezone(&Local)
            .format("%H:%M")
    )
}

/// Print configuration summary
fn print_configuration_summary(config: &ClientConfig) {
    eprintln!("Configuration:");
    eprintln!("  Base URL: {}", config.base_url);
    eprintln!(
        "  Auth Token: {}",
        if config.auth_token.is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    eprintln!("  Grace Minutes: {}", config.grace_minutes);
    eprintln!("  Reload Debounce: {} ms", config.reload_debounce_ms);
    match &config.relay_dir {
        Some(dir) => eprintln!("  Relay Directory: {}", dir.display()),
        None => eprintln!("  Relay Directory: not set (events stay in-process)"),
    }
    eprintln!("  Request Timeout: {} s", config.request_timeout_secs);
    match &config.user {
        Some(user) => eprintln!(
            "  User: {} (#{}) role={} verified={}",
            user.username, user.id, user.role, user.verified
        ),
        None => eprintln!("  User: not set"),
    }
    eprintln!();
}
