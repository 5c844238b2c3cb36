//! studydash-report - study analytics summary
//!
//! Computes every metric from the current store snapshot and prints it to
//! the terminal, as markdown, or as JSON.

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use studydash_core::analytics::{BurnStatus, StudyReport, Trend, UNKNOWN_DAYS_LEFT};
use studydash_core::format::{bar, format_relative_time, format_study_minutes};
use studydash_core::{Config, Database, SessionFilter};

#[derive(Parser, Debug)]
#[command(name = "studydash-report")]
#[command(about = "Study analytics - consistency, focus, momentum and more")]
#[command(version)]
struct Args {
    /// Export format (md = markdown, json = JSON)
    #[arg(long)]
    export: Option<String>,

    /// Plain headings without emoji
    #[arg(long)]
    serious: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = studydash_core::logging::init(&config.logging).ok();

    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let sessions = db
        .list_sessions(&SessionFilter::default())
        .context("failed to load sessions")?;
    let subjects = db.load_subjects().context("failed to load syllabus")?;
    let report = StudyReport::compute(&sessions, &subjects, &Local::now());

    tracing::info!(
        sessions = report.session_count,
        consistency = report.consistency,
        "Generated study report"
    );

    let export = args
        .export
        .as_deref()
        .or(config.report.default_export.as_deref());
    match export {
        Some("json") => println!("{}", report.to_json()?),
        Some("md") => print_markdown(&report),
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
        None => print_terminal(&report, !args.serious),
    }

    Ok(())
}

fn heading(fun_mode: bool, emoji: &str, title: &str) -> String {
    if fun_mode {
        format!("{} {}", emoji, title)
    } else {
        title.to_string()
    }
}

fn momentum_display(report: &StudyReport) -> String {
    let sign = match report.momentum.trend {
        Trend::Up => "+",
        Trend::Down => "-",
        Trend::Stable => "",
    };
    format!(
        "{} {}{}%",
        report.momentum.trend.arrow(),
        sign,
        report.momentum.value
    )
}

fn prediction_display(report: &StudyReport) -> String {
    match report.prediction.completion_date {
        None => "Not enough data yet".to_string(),
        Some(_) if report.prediction.days_left == 0 => "Syllabus complete".to_string(),
        Some(date) => format!(
            "{} days (around {})",
            report.prediction.days_left,
            date.with_timezone(&Local).format("%b %d, %Y")
        ),
    }
}

fn burn_display(report: &StudyReport, fun_mode: bool) -> String {
    let icon = match report.burn_risk.status {
        BurnStatus::Safe => "🟢",
        BurnStatus::Warning => "🟡",
        BurnStatus::Risk => "🔴",
    };
    if fun_mode {
        format!("{} {}", icon, report.burn_risk.reason)
    } else {
        format!("{} ({})", report.burn_risk.status.as_str(), report.burn_risk.reason)
    }
}

fn print_terminal(report: &StudyReport, fun_mode: bool) {
    let title = if fun_mode {
        "📚 YOUR STUDY DASHBOARD 📚"
    } else {
        "Study Report"
    };

    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();

    let progress = &report.progress;
    println!("{}", heading(fun_mode, "🎯", "SYLLABUS"));
    println!(
        "   Topics:   {:<12} Modules: {}/{}",
        format!("{}/{}", progress.completed_topics, progress.total_topics),
        progress.completed_modules,
        progress.total_modules
    );
    println!(
        "   Complete: {:<12} Subjects: {}/{}",
        format!("{}%", progress.percent),
        progress.completed_subjects,
        progress.total_subjects
    );
    println!();

    println!("{}", heading(fun_mode, "⏱️", "TIME"));
    println!(
        "   Today:    {:<12} Total: {}",
        format_study_minutes(report.minutes_today),
        format_study_minutes(report.total_minutes)
    );
    println!(
        "   Sessions: {:<12} Last studied: {}",
        report.session_count,
        report
            .last_studied
            .map(|ts| format_relative_time(ts, Utc::now()))
            .unwrap_or_else(|| "never".to_string())
    );
    println!();

    if !report.has_sessions() {
        println!("  No study sessions logged yet.");
        println!("  Run `studydash-focus` or `studydash log --minutes 25` to get started.");
        println!();
        return;
    }

    println!("{}", heading(fun_mode, "📊", "INSIGHTS"));
    println!(
        "   Consistency: {:>3}%        Focus:      {:>3} ({})",
        report.consistency, report.focus.score, report.focus.label
    );
    println!(
        "   Balance:     {:>3}%        Confidence: {:>3}%",
        report.balance, report.confidence
    );
    println!(
        "   Revisits:    {:>3}%        Efficiency: {} topics/hour",
        report.revisit_rate, report.efficiency
    );
    println!(
        "   Momentum:    {:<12} Burn risk:  {}",
        momentum_display(report),
        burn_display(report, fun_mode)
    );
    println!();

    println!("{}", heading(fun_mode, "🔮", "FORECAST"));
    println!("   Finish in: {}", prediction_display(report));
    if let Some(band) = report.peak_time {
        let label = if fun_mode {
            format!("{} {}", band.emoji(), band.label())
        } else {
            band.label().to_string()
        };
        println!("   Peak time: {}", label);
    }
    println!();

    if !report.weak_modules.is_empty() {
        println!("{}", heading(fun_mode, "⚠️", "NEEDS ATTENTION"));
        for title in &report.weak_modules {
            println!("   • {}", title);
        }
        println!();
    }

    println!("{}", heading(fun_mode, "📅", "BY WEEKDAY"));
    for (day, minutes) in report.weekday.days.iter().zip(report.weekday.totals.iter()) {
        println!(
            "   {} {:<24} {}",
            day,
            bar(*minutes, report.weekday.max_val, 24),
            format_study_minutes(*minutes)
        );
    }
    println!();

    let studied: Vec<_> = report.subject_time.iter().filter(|s| s.minutes > 0).collect();
    if !studied.is_empty() {
        println!("{}", heading(fun_mode, "📖", "BY SUBJECT"));
        let max = studied.iter().map(|s| s.minutes).max().unwrap_or(0);
        for subject in studied {
            println!(
                "   {:<32} {:<16} {}",
                subject.name,
                bar(subject.minutes, max, 16),
                format_study_minutes(subject.minutes)
            );
        }
        println!();
    }
}

fn print_markdown(report: &StudyReport) {
    println!("# Study Report");
    println!();
    println!(
        "*Generated {}*",
        report.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!();

    let progress = &report.progress;
    println!("## Syllabus");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!(
        "| Topics | {}/{} ({}%) |",
        progress.completed_topics, progress.total_topics, progress.percent
    );
    println!(
        "| Modules | {}/{} |",
        progress.completed_modules, progress.total_modules
    );
    println!(
        "| Subjects | {}/{} |",
        progress.completed_subjects, progress.total_subjects
    );
    println!(
        "| Studied Today | {} |",
        format_study_minutes(report.minutes_today)
    );
    println!(
        "| Total Time | {} |",
        format_study_minutes(report.total_minutes)
    );
    println!("| Sessions | {} |", report.session_count);
    println!();

    if !report.has_sessions() {
        println!("*No study sessions logged yet.*");
        return;
    }

    println!("## Insights");
    println!();
    println!("| Metric | Value |");
    println!("|--------|-------|");
    println!("| Consistency | {}% |", report.consistency);
    println!(
        "| Focus Quality | {} ({}, {}) |",
        report.focus.score,
        report.focus.rating.as_str(),
        report.focus.label
    );
    println!("| Efficiency | {} topics/hour |", report.efficiency);
    println!("| Momentum | {} |", momentum_display(report));
    println!("| Burn Risk | {} |", burn_display(report, false));
    println!("| Revisit Rate | {}% |", report.revisit_rate);
    println!("| Balance | {}% |", report.balance);
    println!("| Confidence | {}% |", report.confidence);
    println!("| Peak Time | {} |", report.peak_label());
    let days_left = if report.prediction.days_left == UNKNOWN_DAYS_LEFT {
        "unknown".to_string()
    } else {
        report.prediction.days_left.to_string()
    };
    println!("| Days Left | {} |", days_left);
    println!();

    if !report.weak_modules.is_empty() {
        println!("## Needs Attention");
        println!();
        for title in &report.weak_modules {
            println!("- {}", title);
        }
        println!();
    }

    println!("## By Weekday");
    println!();
    println!("| Day | Time |");
    println!("|-----|------|");
    for (day, minutes) in report.weekday.days.iter().zip(report.weekday.totals.iter()) {
        println!("| {} | {} |", day, format_study_minutes(*minutes));
    }
    println!();
}
