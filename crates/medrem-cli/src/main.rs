//! `medrem-cli` – offline medication reminders in the terminal.
//!
//! This binary is the composition root for the reminder store.  It:
//!
//! 1. Loads `~/.medrem/config.toml`, writing defaults on first run.
//! 2. Opens the on-device SQLite slot and initializes the
//!    [`ReminderStore`] from it (once, for the whole session).
//! 3. Drops the user into an **interactive REPL** (`/add`, `/list`,
//!    `/vitals`, `/import`, `/schema`, `/help`, `/quit`).
//! 4. Intercepts **Ctrl-C**; the REPL exits at its next prompt or the next
//!    line read.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use medrem_store::{KeyValueSlot, LoadOutcome, MemorySlot, ReminderStore, SqliteSlot};
use medrem_vitals::InsightEngine;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG sets the filter (default "info").  MEDREM_LOG_FORMAT=json
    // switches to newline-delimited JSON.  User-facing output uses println!.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("MEDREM_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – press Enter to exit.".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load_or_init() {
        Ok((cfg, created)) => {
            let verb = if created { "Config written to" } else { "Config loaded from" };
            println!(
                "  {} {}",
                verb,
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    // ── Reminder store ────────────────────────────────────────────────────
    let slot = open_slot(&cfg.db_path);
    let mut store = ReminderStore::initialize(slot, &cfg.slot_key);
    match store.load_outcome() {
        LoadOutcome::Empty => println!("  No saved reminders yet."),
        LoadOutcome::Restored(n) => println!("  {} saved reminder(s) loaded.", n.to_string().bold()),
        // Already logged by the store; the user just sees an empty list.
        LoadOutcome::Recovered(_) => {}
    }

    let thresholds = cfg.thresholds();
    let engine = InsightEngine::from_thresholds(thresholds);

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&mut store, &engine, &thresholds, shutdown);
}

/// Open the on-device database, falling back to a session-only slot.
fn open_slot(db_path: &str) -> Box<dyn KeyValueSlot> {
    if let Some(parent) = std::path::Path::new(db_path).parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %parent.display(), error = %e, "Could not create data directory");
    }

    match SqliteSlot::open(db_path) {
        Ok(slot) => Box::new(slot),
        Err(e) => {
            warn!(path = db_path, error = %e, "Could not open reminder database");
            println!(
                "  {} reminders will not survive a restart ({}).",
                "Warning:".yellow().bold(),
                e
            );
            Box::new(MemorySlot::new())
        }
    }
}

fn print_banner() {
    println!();
    println!("  {} {}",
        "medrem".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Offline medication reminders");
    println!();
}
