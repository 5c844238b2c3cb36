//! studydash-focus - focus timer
//!
//! Counts down one focus interval, logs it as a study session when it
//! completes, then optionally counts down a break. Ctrl+C abandons the
//! current phase; an interrupted focus interval is not logged.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use studydash_core::analytics::minutes_on_day;
use studydash_core::format::{format_countdown, format_study_minutes};
use studydash_core::timer::{FocusTimer, TimerEvent, TimerPhase};
use studydash_core::{Config, Database, SessionFilter};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "studydash-focus")]
#[command(about = "Focus timer - logs a study session for every completed interval")]
#[command(version)]
struct Args {
    /// Focus length in minutes (default from config)
    #[arg(long, short)]
    minutes: Option<u32>,

    /// Subject id to credit the session to
    #[arg(long)]
    subject: Option<String>,

    /// Module id
    #[arg(long)]
    module: Option<String>,

    /// Subtopic id
    #[arg(long)]
    topic: Option<String>,

    /// Skip the break after the focus interval
    #[arg(long)]
    no_break: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = studydash_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let subject_name = match &args.subject {
        Some(id) => Some(db.get_subject(id)?.name),
        None => None,
    };
    if let Some(id) = &args.module {
        db.get_module(id)?;
    }
    if let Some(id) = &args.topic {
        db.get_subtopic(id)?;
    }

    let mut timer = FocusTimer::new(&config.timer);
    if let Some(minutes) = args.minutes {
        timer.set_duration(minutes)?;
    }
    if args.no_break {
        timer.set_auto_break(false);
    }
    timer.select(args.subject.clone(), args.module.clone(), args.topic.clone())?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    println!(
        "Focus: {} on {}. Press Ctrl+C to stop.",
        format_study_minutes(timer.focus_minutes() as u64),
        subject_name.as_deref().unwrap_or("general study")
    );

    timer.start(Utc::now())?;
    let session = match countdown(&mut timer, &running, "focus") {
        Some(TimerEvent::FocusComplete(session)) => session,
        _ => {
            println!("Focus interrupted, nothing logged.");
            tracing::info!("Focus interval abandoned");
            return Ok(());
        }
    };

    db.add_session(&session).context("failed to log session")?;
    tracing::info!(
        session_id = %session.id,
        minutes = session.duration_minutes,
        "Logged focus session"
    );

    let today = db.list_sessions(&SessionFilter {
        since: Some(Utc::now() - chrono::Duration::days(1)),
        ..Default::default()
    })?;
    println!(
        "Logged {} ({})",
        format_study_minutes(session.duration_minutes as u64),
        subject_name.as_deref().unwrap_or("general study")
    );
    println!(
        "Studied today: {}",
        format_study_minutes(minutes_on_day(&today, &Local::now()))
    );

    if timer.phase() == TimerPhase::Break {
        println!(
            "Break: {}. Press Ctrl+C to skip.",
            format_study_minutes(timer.break_minutes() as u64)
        );
        match countdown(&mut timer, &running, "break") {
            Some(TimerEvent::BreakComplete) => println!("Break over."),
            _ => println!("Break skipped."),
        }
    }

    Ok(())
}

/// Drive the timer until the current phase ends or Ctrl+C is pressed.
///
/// Returns the phase-ending event, or `None` when interrupted.
fn countdown(timer: &mut FocusTimer, running: &AtomicBool, label: &str) -> Option<TimerEvent> {
    let total = timer.remaining(Utc::now()).num_seconds().max(1) as u64;

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template("{prefix:>5} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_prefix(label.to_string());

    while running.load(Ordering::SeqCst) {
        match timer.tick(Utc::now()) {
            TimerEvent::Running { remaining } => {
                let secs = remaining.num_seconds();
                pb.set_position(total.saturating_sub(secs.max(0) as u64));
                pb.set_message(format_countdown(secs));
                std::thread::sleep(TICK_INTERVAL);
            }
            TimerEvent::Idle => {
                pb.finish_and_clear();
                return None;
            }
            event => {
                pb.finish_and_clear();
                return Some(event);
            }
        }
    }

    pb.abandon_with_message("stopped");
    timer.stop();
    // the same flag gates the next phase
    running.store(true, Ordering::SeqCst);
    None
}
