//! REPL – the interactive reminder shell.
//!
//! Supported commands:
//!   /add <name>   – add a medication reminder (prompts when name is omitted)
//!   /list         – show saved reminders
//!   /vitals       – enter a vitals reading and show insights
//!   /import <csv> – summarize a CSV of vitals readings
//!   /schema       – print the JSON schema of the stored reminder list
//!   /help         – show this list
//!   /quit | /exit – exit the shell
//!
//! Text without a leading `/` is treated as `/add <text>`.

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use medrem_store::{AddOutcome, KeyValueSlot, ReminderStore, StoreError, codec};
use medrem_types::VitalsReading;
use medrem_vitals::{InsightEngine, Thresholds};

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `None` when the user typed `/add` with no name.
    Add(Option<String>),
    List,
    Vitals,
    /// `None` when the user typed `/import` with no path.
    Import(Option<String>),
    Schema,
    Help,
    Quit,
    Unknown(String),
}

/// Parse one line of input.  Returns `None` for blank lines.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if !line.starts_with('/') {
        return Some(Command::Add(Some(line.to_string())));
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let cmd = match head {
        "/add" if rest.is_empty() => Command::Add(None),
        "/add" => Command::Add(Some(rest.to_string())),
        "/list" => Command::List,
        "/vitals" => Command::Vitals,
        "/import" if rest.is_empty() => Command::Import(None),
        "/import" => Command::Import(Some(rest.to_string())),
        "/schema" => Command::Schema,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(cmd)
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is checked before each prompt and again after each line is
/// read, so a Ctrl-C while waiting for input exits on the next Enter without
/// running that line.
pub fn run<S: KeyValueSlot>(
    store: &mut ReminderStore<S>,
    engine: &InsightEngine,
    thresholds: &Thresholds,
    shutdown: Arc<AtomicBool>,
) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "medrem>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let Some(cmd) = parse_command(&line) else {
            continue;
        };

        match cmd {
            Command::Add(Some(name)) => cmd_add(store, &name),
            Command::Add(None) => {
                let name = prompt_str("  Medication name: ");
                cmd_add(store, &name);
            }
            Command::List => cmd_list(store),
            Command::Vitals => cmd_vitals(engine),
            Command::Import(Some(path)) => cmd_import(&path, thresholds),
            Command::Import(None) => {
                let path = prompt_str("  CSV path: ");
                if !path.is_empty() {
                    cmd_import(&path, thresholds);
                }
            }
            Command::Schema => cmd_schema(),
            Command::Help => cmd_help(),
            Command::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Command::Unknown(other) => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "medrem Commands".bold().underline());
    println!("  {}  – add a medication reminder", "/add <name>".bold().cyan());
    println!("  {}        – show saved reminders", "/list".bold().cyan());
    println!("  {}      – enter vitals and get insights", "/vitals".bold().cyan());
    println!("  {} – summarize a CSV of vitals", "/import <path>".bold().cyan());
    println!("  {}      – show the stored data format", "/schema".bold().cyan());
    println!("  {} – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_add<S: KeyValueSlot>(store: &mut ReminderStore<S>, name: &str) {
    let result = store.add(name);
    let Some(feedback) = add_feedback(name, &result) else {
        return;
    };
    if feedback.saved {
        println!("{} {}", "✓".green().bold(), feedback.headline.green().bold());
        println!("  {}", feedback.detail);
    } else {
        println!("{} {}", "✗".red().bold(), feedback.headline.red().bold());
        println!("  {}", feedback.detail.dimmed());
    }
}

fn cmd_list<S: KeyValueSlot>(store: &ReminderStore<S>) {
    let reminders = store.list();
    if reminders.is_empty() {
        println!("  {}", "No reminders yet. Add one with /add <name>.".dimmed());
        return;
    }
    println!("{}", "Reminders".bold().underline());
    for reminder in reminders {
        println!("  {}", reminder.name.bold());
        println!("    Schedule: {}", reminder.schedule.yellow());
    }
}

fn cmd_vitals(engine: &InsightEngine) {
    println!("{}", "Vitals Entry".bold().underline());
    println!("  {}", "Press Enter to skip a value.".dimmed());
    let reading = VitalsReading {
        heart_rate: prompt_f32("  Heart rate (bpm)      : "),
        glucose_mg_dl: prompt_f32("  Glucose (mg/dL)       : "),
        systolic_bp: prompt_f32("  Systolic BP (mmHg)    : "),
        diastolic_bp: prompt_f32("  Diastolic BP (mmHg)   : "),
    };
    if reading.is_empty() {
        println!("  {}", "No values entered.".dimmed());
        return;
    }

    let insights = engine.evaluate(&reading);
    if insights.is_empty() {
        println!("  {} No concerns in this reading.", "✓".green().bold());
    } else {
        for insight in &insights {
            println!("  {} {}", "!".yellow().bold(), insight.message);
        }
    }
}

fn cmd_import(path: &str, thresholds: &Thresholds) {
    let readings = match medrem_vitals::read_csv_path(path) {
        Ok(readings) => readings,
        Err(e) => {
            println!("{} {}: {}", "✗ Could not import".red().bold(), path.yellow(), e);
            return;
        }
    };
    let summary = medrem_vitals::summarize(&readings, thresholds);

    println!("{} ({} rows)", "Vitals Summary".bold().underline(), summary.rows);
    for reading in readings.iter().take(3) {
        println!("  {}", describe_reading(reading).dimmed());
    }
    if readings.len() > 3 {
        println!("  {}", "…".dimmed());
    }

    let counts = [
        ("High glucose", summary.high_glucose_count),
        ("Elevated heart rate", summary.tachy_count),
        ("Hypertensive BP", summary.hypertensive_count),
    ];
    for (label, count) in counts {
        if let Some(n) = count {
            println!("  {:<20}: {}", label, n.to_string().bold());
        }
    }

    if summary.insights.is_empty() {
        println!("  {} No readings over the thresholds.", "✓".green().bold());
    } else {
        for insight in &summary.insights {
            println!("  {} {}", "!".yellow().bold(), insight);
        }
    }
}

fn cmd_schema() {
    match serde_json::to_string_pretty(&codec::schema()) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("{}: {}", "Error rendering schema".red(), e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// What to tell the user after an add attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddFeedback {
    pub saved: bool,
    pub headline: String,
    pub detail: String,
}

/// Build the user-facing result of `/add`.  `None` when the name was empty
/// and nothing happened.
pub(crate) fn add_feedback(
    name: &str,
    result: &Result<AddOutcome, StoreError>,
) -> Option<AddFeedback> {
    match result {
        Ok(AddOutcome::Added(reminder)) => Some(AddFeedback {
            saved: true,
            headline: format!("Saved {} ({})", reminder.name, reminder.schedule),
            detail: "Medication reminder saved locally for offline use.".to_string(),
        }),
        Ok(AddOutcome::Ignored) => None,
        Err(e) => Some(AddFeedback {
            saved: false,
            headline: format!("Not saved: {}", name.trim()),
            detail: e.to_string(),
        }),
    }
}

/// One-line rendering of a reading; missing values show as `-`.
fn describe_reading(r: &VitalsReading) -> String {
    let v = |x: Option<f32>| x.map_or_else(|| "-".to_string(), |x| x.to_string());
    format!(
        "HR {}  Glucose {}  BP {}/{}",
        v(r.heart_rate),
        v(r.glucose_mg_dl),
        v(r.systolic_bp),
        v(r.diastolic_bp)
    )
}

/// Parse an optional numeric answer.  Blank input is `None`.
pub(crate) fn parse_optional_f32(raw: &str) -> Result<Option<f32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(format!("'{raw}' is not a valid measurement")),
    }
}

/// Prompt for a measurement.  Invalid input is reported and skipped.
fn prompt_f32(msg: &str) -> Option<f32> {
    let raw = prompt_str(msg);
    match parse_optional_f32(&raw) {
        Ok(v) => v,
        Err(e) => {
            println!("  {} {}, skipping", "Warning:".yellow(), e);
            None
        }
    }
}

/// Prompt for a line of text.  Returns an empty string on read errors.
fn prompt_str(msg: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => line.trim().to_string(),
        Err(_) => String::new(),
    }
}
