//! studydash - syllabus checklist, session log and daily planner
//!
//! Commands mutate the local store; analytics live in `studydash-report`
//! and the focus timer in `studydash-focus`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use studydash_core::analytics::{minutes_on_day, SyllabusProgress};
use studydash_core::format::{bar, format_relative_time, format_study_minutes};
use studydash_core::planner::week_dates;
use studydash_core::{
    seed, Config, Cycle, CycleData, Database, NewAttachment, SessionFilter, StudySession,
};

#[derive(Parser, Debug)]
#[command(name = "studydash")]
#[command(about = "Study tracker - syllabus checklist, session log and planner")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and seed the syllabus
    Init {
        /// Seed from this catalog file instead of the built-in syllabus
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show the syllabus with completion progress
    Syllabus {
        /// Only show one cycle (physics or chemistry)
        #[arg(long)]
        cycle: Option<Cycle>,

        /// Print module and subtopic ids
        #[arg(long)]
        ids: bool,
    },

    /// Check off or add subtopics
    Topic {
        #[command(subcommand)]
        action: TopicCommand,
    },

    /// Manage study files attached to modules
    Attach {
        #[command(subcommand)]
        action: AttachCommand,
    },

    /// Log a study session manually
    Log {
        /// Duration in minutes
        #[arg(long)]
        minutes: u32,

        /// Subject id
        #[arg(long)]
        subject: Option<String>,

        /// Module id
        #[arg(long)]
        module: Option<String>,

        /// Subtopic id
        #[arg(long)]
        topic: Option<String>,

        /// When the session ended (RFC 3339, default: now)
        #[arg(long)]
        ended_at: Option<String>,
    },

    /// List logged sessions, oldest first
    Sessions {
        /// Show only the most recent N sessions
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only sessions for this subject
        #[arg(long)]
        subject: Option<String>,
    },

    /// Daily task planner
    Plan {
        #[command(subcommand)]
        action: PlanCommand,
    },

    /// Manage the access flag
    Access {
        #[command(subcommand)]
        action: AccessCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TopicCommand {
    /// Flip a subtopic between done and not done
    Toggle { id: String },
    /// Append a subtopic to a module
    Add { module_id: String, title: String },
}

#[derive(Subcommand, Debug)]
enum AttachCommand {
    /// Record a file against a module (metadata only)
    Add {
        module_id: String,
        file: PathBuf,
        /// MIME type (default: guessed from the extension)
        #[arg(long)]
        mime: Option<String>,
    },
    /// Remove an attachment
    Rm { id: String },
    /// Store notes or a summary for an attachment
    Note { id: String, text: String },
}

#[derive(Subcommand, Debug)]
enum PlanCommand {
    /// Show the plan for a day or its week
    Show {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Show the Monday-to-Sunday week containing the date
        #[arg(long)]
        week: bool,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark a task done or not done
    Toggle {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a task
    Rm {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
enum AccessCommand {
    Grant,
    Revoke,
    Status,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = studydash_core::logging::init(&config.logging).ok();

    let db = open_database()?;

    match args.command {
        Command::Init { catalog } => cmd_init(&db, catalog.as_deref()),
        Command::Syllabus { cycle, ids } => cmd_syllabus(&db, cycle, ids),
        Command::Topic { action } => cmd_topic(&db, action),
        Command::Attach { action } => cmd_attach(&db, action),
        Command::Log {
            minutes,
            subject,
            module,
            topic,
            ended_at,
        } => cmd_log(&db, minutes, subject, module, topic, ended_at.as_deref()),
        Command::Sessions { limit, subject } => cmd_sessions(&db, limit, subject),
        Command::Plan { action } => cmd_plan(&db, action),
        Command::Access { action } => cmd_access(&db, action),
    }
}

fn open_database() -> Result<Database> {
    let db_path = Config::database_path();
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("failed to run database migrations")?;
    Ok(db)
}

fn require_seeded(db: &Database) -> Result<()> {
    if !db.is_seeded()? {
        anyhow::bail!("No syllabus found. Run `studydash init` first.");
    }
    Ok(())
}

// ============================================
// init / syllabus
// ============================================

fn cmd_init(db: &Database, catalog: Option<&Path>) -> Result<()> {
    if db.is_seeded()? {
        println!("Syllabus already initialized at {}", Config::database_path().display());
        return Ok(());
    }

    let cycles = match catalog {
        Some(path) => seed::load_catalog(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => seed::default_syllabus().context("built-in syllabus is invalid")?,
    };
    db.seed_syllabus(&cycles).context("failed to seed syllabus")?;

    let progress = SyllabusProgress::from_subjects(&CycleData::flatten(&cycles));
    println!(
        "Initialized {} subjects, {} modules, {} subtopics",
        progress.total_subjects, progress.total_modules, progress.total_topics
    );
    println!("Database: {}", Config::database_path().display());
    Ok(())
}

fn cmd_syllabus(db: &Database, only: Option<Cycle>, show_ids: bool) -> Result<()> {
    require_seeded(db)?;
    let cycles = db.load_cycles()?;

    for cycle in cycles.iter().filter(|c| only.map_or(true, |o| o == c.id)) {
        let progress = SyllabusProgress::from_subjects(&cycle.subjects);
        println!();
        println!(
            "{}  {}% ({}/{} topics)",
            cycle.name, progress.percent, progress.completed_topics, progress.total_topics
        );
        println!("{}", "─".repeat(60));

        for subject in &cycle.subjects {
            let subject_progress = SyllabusProgress::from_subjects(std::slice::from_ref(subject));
            println!(
                "{:<9} {:<34} {:<10} {:>3}%",
                subject.course_code,
                subject.name,
                bar(subject_progress.percent as u64, 100, 10),
                subject_progress.percent
            );
            if show_ids {
                println!("          id: {}", subject.id);
            }

            for module in &subject.modules {
                let mark = if module.is_complete() { "✓" } else { " " };
                println!(
                    "  {} {}. {:<40} {}/{}",
                    mark,
                    module.number,
                    module.title,
                    module.completed_count(),
                    module.subtopics.len()
                );
                if show_ids {
                    println!("       id: {}", module.id);
                    for topic in &module.subtopics {
                        let check = if topic.completed { "x" } else { " " };
                        println!("       [{}] {}  ({})", check, topic.title, topic.id);
                    }
                }
            }
        }
    }
    println!();
    Ok(())
}

// ============================================
// topic / attach
// ============================================

fn cmd_topic(db: &Database, action: TopicCommand) -> Result<()> {
    require_seeded(db)?;
    match action {
        TopicCommand::Toggle { id } => {
            let topic = db.get_subtopic(&id)?;
            let completed = db.toggle_subtopic(&id)?;
            let state = if completed { "done" } else { "not done" };
            println!("{}: {}", topic.title, state);
        }
        TopicCommand::Add { module_id, title } => {
            let title = title.trim();
            if title.is_empty() {
                anyhow::bail!("Subtopic title must not be empty");
            }
            let topic = db.add_subtopic(&module_id, title)?;
            println!("Added subtopic {} ({})", topic.title, topic.id);
        }
    }
    Ok(())
}

fn cmd_attach(db: &Database, action: AttachCommand) -> Result<()> {
    match action {
        AttachCommand::Add {
            module_id,
            file,
            mime,
        } => {
            require_seeded(db)?;
            let metadata = std::fs::metadata(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .with_context(|| format!("{} has no file name", file.display()))?;
            let mime_type = mime.unwrap_or_else(|| {
                mime_guess::from_path(&file)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

            let attachment = db.add_attachment(
                &module_id,
                NewAttachment {
                    file_name,
                    file_size: metadata.len(),
                    mime_type,
                },
            )?;
            println!(
                "Attached {} ({}, {} bytes) as {}",
                attachment.file_name, attachment.mime_type, attachment.file_size, attachment.id
            );
        }
        AttachCommand::Rm { id } => {
            db.remove_attachment(&id)?;
            println!("Removed attachment {}", id);
        }
        AttachCommand::Note { id, text } => {
            db.set_attachment_analysis(&id, &text)?;
            println!("Saved notes for attachment {}", id);
        }
    }
    Ok(())
}

// ============================================
// log / sessions
// ============================================

fn cmd_log(
    db: &Database,
    minutes: u32,
    subject: Option<String>,
    module: Option<String>,
    topic: Option<String>,
    ended_at: Option<&str>,
) -> Result<()> {
    if minutes == 0 {
        anyhow::bail!("--minutes must be at least 1");
    }

    let ended_at = match ended_at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("invalid --ended-at {:?}, expected RFC 3339", s))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let subject_name = match &subject {
        Some(id) => Some(db.get_subject(id)?.name),
        None => None,
    };
    if let Some(id) = &module {
        db.get_module(id)?;
    }
    if let Some(id) = &topic {
        db.get_subtopic(id)?;
    }

    let mut session = StudySession::ending_at(ended_at, minutes);
    session.subject_id = subject;
    session.module_id = module;
    session.topic_id = topic;
    db.add_session(&session).context("failed to log session")?;

    println!(
        "Logged {} ({})",
        format_study_minutes(minutes as u64),
        subject_name.as_deref().unwrap_or("general study")
    );

    let today = db.list_sessions(&SessionFilter {
        since: Some(Utc::now() - chrono::Duration::days(1)),
        ..Default::default()
    })?;
    println!(
        "Studied today: {}",
        format_study_minutes(minutes_on_day(&today, &Local::now()))
    );
    Ok(())
}

fn cmd_sessions(db: &Database, limit: usize, subject: Option<String>) -> Result<()> {
    let sessions = db.list_sessions(&SessionFilter {
        subject_id: subject,
        limit: Some(limit),
        ..Default::default()
    })?;

    if sessions.is_empty() {
        println!("No sessions logged yet.");
        return Ok(());
    }

    let names: std::collections::HashMap<String, String> = db
        .load_subjects()?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let now = Utc::now();

    println!(
        "{:<17} {:>8}  {:<30} {}",
        "STARTED", "DURATION", "SUBJECT", "WHEN"
    );
    for session in &sessions {
        let subject = session
            .subject_id
            .as_ref()
            .map(|id| names.get(id).cloned().unwrap_or_else(|| id.clone()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<17} {:>8}  {:<30} {}",
            session
                .started_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M"),
            format_study_minutes(session.duration_minutes as u64),
            subject,
            format_relative_time(session.started_at, now)
        );
    }
    Ok(())
}

// ============================================
// plan
// ============================================

fn cmd_plan(db: &Database, action: PlanCommand) -> Result<()> {
    let today = Local::now().date_naive();
    match action {
        PlanCommand::Show { date, week } => {
            let date = date.unwrap_or(today);
            let planner = db.load_planner()?;
            if week {
                for day in week_dates(date) {
                    let plan = planner.plan_for(day);
                    let marker = if day == today { "*" } else { " " };
                    println!(
                        "{} {}  {:>3}%  {} task(s)",
                        marker,
                        day.format("%a %Y-%m-%d"),
                        plan.progress(),
                        plan.tasks.len()
                    );
                }
            } else {
                let plan = planner.plan_for(date);
                println!("{}  {}% done", date.format("%A %Y-%m-%d"), plan.progress());
                if plan.tasks.is_empty() {
                    println!("  No tasks planned.");
                }
                for task in &plan.tasks {
                    let check = if task.completed { "x" } else { " " };
                    println!("  [{}] {}  ({})", check, task.title, task.id);
                }
            }
        }
        PlanCommand::Add { title, date } => {
            let title = title.trim();
            if title.is_empty() {
                anyhow::bail!("Task title must not be empty");
            }
            let date = date.unwrap_or(today);
            let task = db.add_task(date, title)?;
            println!("Added task for {}: {} ({})", date, task.title, task.id);
        }
        PlanCommand::Toggle { id, date } => {
            let completed = db.toggle_task(date.unwrap_or(today), &id)?;
            println!("Task {}: {}", id, if completed { "done" } else { "not done" });
        }
        PlanCommand::Rm { id, date } => {
            db.delete_task(date.unwrap_or(today), &id)?;
            println!("Deleted task {}", id);
        }
    }
    Ok(())
}

// ============================================
// access
// ============================================

fn cmd_access(db: &Database, action: AccessCommand) -> Result<()> {
    match action {
        AccessCommand::Grant => {
            db.grant_access()?;
            println!("Access granted");
        }
        AccessCommand::Revoke => {
            db.revoke_access()?;
            println!("Access revoked");
        }
        AccessCommand::Status => {
            let state = if db.has_access()? { "granted" } else { "not granted" };
            println!("Access: {}", state);
        }
    }
    Ok(())
}
