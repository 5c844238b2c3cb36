//! Study metrics computed from session and syllabus snapshots.
//!
//! Every function here is pure: the same snapshot and the same `now` give
//! the same result. Calendar days and hours of day are evaluated in the
//! time zone of the `now` (or `tz`) argument, so the CLI passes
//! `chrono::Local::now()` and tests pass fixed UTC instants.
//!
//! No function returns an error. Empty or degenerate input maps to a
//! defined sentinel (`0`, `"No Data"`, [`UNKNOWN_DAYS_LEFT`], `None`).

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::types::{StudySession, Subject};

// ============================================
// Tuning constants
// ============================================

/// Days considered by [`consistency_score`].
pub const CONSISTENCY_WINDOW_DAYS: i64 = 14;
/// Length of each period compared by [`momentum_index`].
pub const MOMENTUM_WINDOW_DAYS: i64 = 7;
/// Average session length that earns a full duration score.
pub const FOCUS_TARGET_MINUTES: f64 = 45.0;
/// Sessions at least this long count as long sessions.
pub const LONG_SESSION_MINUTES: u32 = 25;
/// Share of long sessions that earns a full ratio score.
pub const LONG_SESSION_TARGET_RATIO: f64 = 0.8;
pub const FOCUS_DURATION_WEIGHT: f64 = 0.6;
pub const FOCUS_RATIO_WEIGHT: f64 = 0.4;
/// Below this many logged minutes the efficiency index is 0.
pub const EFFICIENCY_MIN_MINUTES: u64 = 10;
/// Idle days that count as a sudden stop for a consistent learner.
pub const SUDDEN_STOP_DAYS: i64 = 3;
pub const WEAK_TIME_FACTOR: f64 = 1.1;
pub const WEAK_PROGRESS_FACTOR: f64 = 0.9;
pub const CONFIDENCE_COMPLETION_WEIGHT: f64 = 0.5;
pub const CONFIDENCE_FOCUS_WEIGHT: f64 = 0.3;
pub const CONFIDENCE_REVISIT_WEIGHT: f64 = 0.2;
/// Sentinel for "no completion estimate available".
pub const UNKNOWN_DAYS_LEFT: i64 = 999;
/// Lower bound for the weekday chart scale, in minutes.
pub const WEEKDAY_CHART_FLOOR: u64 = 60;

/// Weekday labels in chart order.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// ============================================
// Helpers
// ============================================

fn total_minutes(sessions: &[StudySession]) -> u64 {
    sessions.iter().map(|s| s.duration_minutes as u64).sum()
}

/// Minutes of sessions whose start falls in `[start, end]` (or `[start, end)`).
fn minutes_in_window(
    sessions: &[StudySession],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_end: bool,
) -> u64 {
    sessions
        .iter()
        .filter(|s| {
            s.started_at >= start && (s.started_at < end || (include_end && s.started_at == end))
        })
        .map(|s| s.duration_minutes as u64)
        .sum()
}

fn local_date<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Returns (total, completed) subtopic counts across all subjects.
pub(crate) fn topic_counts(subjects: &[Subject]) -> (usize, usize) {
    subjects
        .iter()
        .flat_map(|s| s.subtopics())
        .fold((0, 0), |(total, done), t| {
            (total + 1, done + usize::from(t.completed))
        })
}

/// Completion percentage of all subtopics (0 when there are none).
pub fn completion_percent(subjects: &[Subject]) -> f64 {
    let (total, completed) = topic_counts(subjects);
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

// ============================================
// 1. Consistency
// ============================================

/// Percentage of the last 14 calendar days with at least one session.
pub fn consistency_score<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let now_utc = now.with_timezone(&Utc);
    let window_start = now_utc - Duration::days(CONSISTENCY_WINDOW_DAYS);

    let days: BTreeSet<NaiveDate> = sessions
        .iter()
        .filter(|s| s.started_at >= window_start && s.started_at <= now_utc)
        .map(|s| local_date(&s.started_at, &tz))
        .collect();

    let ratio = (days.len() as f64 / CONSISTENCY_WINDOW_DAYS as f64).min(1.0);
    (ratio * 100.0).round() as u32
}

// ============================================
// 2. Focus quality
// ============================================

/// Focus rating band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FocusRating {
    Low,
    Medium,
    High,
}

impl FocusRating {
    fn from_score(score: u32) -> Self {
        if score > 75 {
            FocusRating::High
        } else if score > 40 {
            FocusRating::Medium
        } else {
            FocusRating::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusRating::High => "Deep Work",
            FocusRating::Medium => "Balanced",
            FocusRating::Low => "Fragmented",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusRating::Low => "LOW",
            FocusRating::Medium => "MEDIUM",
            FocusRating::High => "HIGH",
        }
    }
}

/// Blend of average session length and share of long sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusQuality {
    pub score: u32,
    pub rating: FocusRating,
    pub label: &'static str,
}

impl FocusQuality {
    fn no_data() -> Self {
        Self {
            score: 0,
            rating: FocusRating::Low,
            label: "No Data",
        }
    }
}

pub fn focus_quality(sessions: &[StudySession]) -> FocusQuality {
    if sessions.is_empty() {
        return FocusQuality::no_data();
    }

    let count = sessions.len() as f64;
    let avg_duration = total_minutes(sessions) as f64 / count;
    let duration_score = (avg_duration / FOCUS_TARGET_MINUTES * 100.0).min(100.0);

    let long_sessions = sessions
        .iter()
        .filter(|s| s.duration_minutes >= LONG_SESSION_MINUTES)
        .count() as f64;
    let ratio_score = (long_sessions / count / LONG_SESSION_TARGET_RATIO * 100.0).min(100.0);

    let score =
        (duration_score * FOCUS_DURATION_WEIGHT + ratio_score * FOCUS_RATIO_WEIGHT).round() as u32;
    let rating = FocusRating::from_score(score);

    FocusQuality {
        score,
        rating,
        label: rating.label(),
    }
}

// ============================================
// 3. Efficiency
// ============================================

/// Completed topics per logged hour, rounded to one decimal.
///
/// The completed-topic count is global, not limited to the logged sessions.
pub fn efficiency_index(sessions: &[StudySession], subjects: &[Subject]) -> f64 {
    let minutes = total_minutes(sessions);
    if minutes < EFFICIENCY_MIN_MINUTES {
        return 0.0;
    }

    let (_, completed) = topic_counts(subjects);
    let hours = minutes as f64 / 60.0;
    (completed as f64 / hours * 10.0).round() / 10.0
}

// ============================================
// 4. Momentum
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Stable => "→",
        }
    }
}

/// Week-over-week change in logged minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Momentum {
    /// Absolute change in percent
    pub value: u32,
    pub trend: Trend,
}

/// Compare minutes in `[now-7d, now]` against `[now-14d, now-7d)`.
pub fn momentum_index<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> Momentum {
    let now_utc = now.with_timezone(&Utc);
    let current_start = now_utc - Duration::days(MOMENTUM_WINDOW_DAYS);
    let previous_start = now_utc - Duration::days(MOMENTUM_WINDOW_DAYS * 2);

    let current = minutes_in_window(sessions, current_start, now_utc, true);
    let previous = minutes_in_window(sessions, previous_start, current_start, false);

    if previous == 0 {
        return if current > 0 {
            Momentum {
                value: 100,
                trend: Trend::Up,
            }
        } else {
            Momentum {
                value: 0,
                trend: Trend::Stable,
            }
        };
    }

    let delta = (current as f64 - previous as f64) / previous as f64 * 100.0;
    Momentum {
        value: delta.abs().round() as u32,
        trend: if delta >= 0.0 { Trend::Up } else { Trend::Down },
    }
}

// ============================================
// 5. Burn risk
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BurnStatus {
    Safe,
    Warning,
    Risk,
}

impl BurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurnStatus::Safe => "SAFE",
            BurnStatus::Warning => "WARNING",
            BurnStatus::Risk => "RISK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurnRisk {
    pub status: BurnStatus,
    pub reason: &'static str,
}

/// Heuristic flag for declining study engagement.
///
/// Rules are checked in order; the first match wins.
pub fn burn_risk<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> BurnRisk {
    let now_utc = now.with_timezone(&Utc);
    let studied_recently = sessions
        .iter()
        .any(|s| (now_utc - s.started_at).num_days() <= SUDDEN_STOP_DAYS);

    classify_burn_risk(
        consistency_score(sessions, now),
        momentum_index(sessions, now),
        studied_recently,
    )
}

fn classify_burn_risk(consistency: u32, momentum: Momentum, studied_recently: bool) -> BurnRisk {
    let falling = momentum.trend == Trend::Down;

    let (status, reason) = if consistency < 30 && falling && momentum.value > 50 {
        (BurnStatus::Risk, "Crash Detected")
    } else if falling && momentum.value > 25 {
        (BurnStatus::Warning, "Slowing Down")
    } else if consistency > 80 && !studied_recently {
        (BurnStatus::Warning, "Sudden Stop")
    } else {
        (BurnStatus::Safe, "Steady Pace")
    };

    BurnRisk { status, reason }
}

// ============================================
// 6. Weak modules
// ============================================

/// Titles of modules with above-average time but below-average completion.
///
/// Only sessions carrying a `module_id` count. Fewer than two modules with
/// logged time is not enough to compare, so the result is empty.
pub fn weak_modules(sessions: &[StudySession], subjects: &[Subject]) -> Vec<String> {
    let mut module_time: HashMap<&str, u64> = HashMap::new();
    for session in sessions {
        if let Some(module_id) = session.module_id.as_deref() {
            *module_time.entry(module_id).or_insert(0) += session.duration_minutes as u64;
        }
    }

    let studied: Vec<(&str, f64, f64)> = subjects
        .iter()
        .flat_map(|s| s.modules.iter())
        .filter_map(|m| {
            let time = module_time.get(m.id.as_str()).copied().unwrap_or(0);
            (time > 0).then(|| (m.title.as_str(), time as f64, m.progress()))
        })
        .collect();

    if studied.len() < 2 {
        return Vec::new();
    }

    let n = studied.len() as f64;
    let mean_time = studied.iter().map(|(_, t, _)| t).sum::<f64>() / n;
    let mean_progress = studied.iter().map(|(_, _, p)| p).sum::<f64>() / n;

    studied
        .into_iter()
        .filter(|(_, time, progress)| {
            *time > mean_time * WEAK_TIME_FACTOR && *progress < mean_progress * WEAK_PROGRESS_FACTOR
        })
        .map(|(title, _, _)| title.to_string())
        .collect()
}

// ============================================
// 7. Topic revisit rate
// ============================================

/// Percentage of distinct studied topics that were studied more than once.
///
/// Only sessions carrying a `topic_id` count.
pub fn topic_revisit_rate(sessions: &[StudySession]) -> u32 {
    let mut visits: HashMap<&str, u32> = HashMap::new();
    for session in sessions {
        if let Some(topic_id) = session.topic_id.as_deref() {
            *visits.entry(topic_id).or_insert(0) += 1;
        }
    }

    if visits.is_empty() {
        return 0;
    }

    let revisited = visits.values().filter(|&&count| count > 1).count();
    (revisited as f64 / visits.len() as f64 * 100.0).round() as u32
}

// ============================================
// 8. Balance
// ============================================

/// Ratio of least-studied to most-studied subject, in percent.
///
/// Every subject starts at zero minutes. Sessions without a `subject_id`, or
/// with one not in `subjects`, are ignored. No subjects scores 0.
pub fn balance_score(sessions: &[StudySession], subjects: &[Subject]) -> u32 {
    if subjects.is_empty() {
        return 0;
    }

    let mut subject_time: HashMap<&str, u64> =
        subjects.iter().map(|s| (s.id.as_str(), 0)).collect();
    for session in sessions {
        if let Some(total) = session
            .subject_id
            .as_deref()
            .and_then(|id| subject_time.get_mut(id))
        {
            *total += session.duration_minutes as u64;
        }
    }

    let max = subject_time.values().copied().max().unwrap_or(0).max(1);
    let min = subject_time.values().copied().min().unwrap_or(0);
    (min as f64 / max as f64 * 100.0).round() as u32
}

// ============================================
// 9. Confidence
// ============================================

/// Weighted blend of completion, focus quality and revisit rate.
pub fn confidence_score(sessions: &[StudySession], subjects: &[Subject]) -> u32 {
    let completion = completion_percent(subjects);
    let focus = focus_quality(sessions).score as f64;
    let revisit = topic_revisit_rate(sessions) as f64;

    (completion * CONFIDENCE_COMPLETION_WEIGHT
        + focus * CONFIDENCE_FOCUS_WEIGHT
        + revisit * CONFIDENCE_REVISIT_WEIGHT)
        .round() as u32
}

// ============================================
// 10. Syllabus prediction
// ============================================

/// Estimated time to finish the remaining subtopics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllabusPrediction {
    /// Days until completion, [`UNKNOWN_DAYS_LEFT`] when there is no signal
    pub days_left: i64,
    pub completion_date: Option<DateTime<Utc>>,
}

impl SyllabusPrediction {
    fn unknown() -> Self {
        Self {
            days_left: UNKNOWN_DAYS_LEFT,
            completion_date: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.completion_date.is_none()
    }
}

/// Project the completion date from the topics-per-day rate since the first session.
pub fn syllabus_prediction<Tz: TimeZone>(
    sessions: &[StudySession],
    subjects: &[Subject],
    now: &DateTime<Tz>,
) -> SyllabusPrediction {
    let now_utc = now.with_timezone(&Utc);
    let (total, completed) = topic_counts(subjects);
    let remaining = total as i64 - completed as i64;

    if remaining <= 0 {
        return SyllabusPrediction {
            days_left: 0,
            completion_date: Some(now_utc),
        };
    }
    if completed == 0 {
        return SyllabusPrediction::unknown();
    }
    let Some(first_started) = sessions.iter().map(|s| s.started_at).min() else {
        return SyllabusPrediction::unknown();
    };

    let days_active = (now_utc - first_started).num_days().max(1);
    let rate = completed as f64 / days_active as f64;
    let days_left = (remaining as f64 / rate).ceil() as i64;

    // an ancient first session can push the date past chrono's range
    match Duration::try_days(days_left).and_then(|d| now_utc.checked_add_signed(d)) {
        Some(date) => SyllabusPrediction {
            days_left,
            completion_date: Some(date),
        },
        None => SyllabusPrediction::unknown(),
    }
}

// ============================================
// 11. Peak study time
// ============================================

/// Time-of-day band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudyBand {
    Morning,
    Afternoon,
    Evening,
    #[serde(rename = "Late Night")]
    LateNight,
}

impl StudyBand {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => StudyBand::Morning,
            12..=16 => StudyBand::Afternoon,
            17..=21 => StudyBand::Evening,
            _ => StudyBand::LateNight,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StudyBand::Morning => "Morning",
            StudyBand::Afternoon => "Afternoon",
            StudyBand::Evening => "Evening",
            StudyBand::LateNight => "Late Night",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StudyBand::Morning => "🌅",
            StudyBand::Afternoon => "☀️",
            StudyBand::Evening => "🌇",
            StudyBand::LateNight => "🦉",
        }
    }
}

/// Minutes per local hour of day, by session start.
pub fn hourly_minutes<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> [u64; 24] {
    let mut buckets = [0u64; 24];
    for session in sessions {
        let hour = session.started_at.with_timezone(tz).hour() as usize;
        buckets[hour] += session.duration_minutes as u64;
    }
    buckets
}

/// Band containing the hour with the most logged minutes.
///
/// Ties go to the earliest hour. `None` when there are no sessions.
pub fn peak_study_time<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> Option<StudyBand> {
    if sessions.is_empty() {
        return None;
    }

    let buckets = hourly_minutes(sessions, tz);
    let mut peak_hour = 0;
    for (hour, &minutes) in buckets.iter().enumerate() {
        if minutes > buckets[peak_hour] {
            peak_hour = hour;
        }
    }

    Some(StudyBand::from_hour(peak_hour as u32))
}

/// Display label for the peak band, `"N/A"` without sessions.
pub fn peak_study_label<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> &'static str {
    peak_study_time(sessions, tz)
        .map(|band| band.label())
        .unwrap_or("N/A")
}

// ============================================
// 12. Weekday chart
// ============================================

/// Minutes per weekday, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayData {
    pub days: [&'static str; 7],
    pub totals: [u64; 7],
    /// Chart scale, never below [`WEEKDAY_CHART_FLOOR`]
    pub max_val: u64,
}

pub fn weekday_data<Tz: TimeZone>(sessions: &[StudySession], tz: &Tz) -> WeekdayData {
    let mut totals = [0u64; 7];
    for session in sessions {
        let weekday = session.started_at.with_timezone(tz).weekday();
        totals[weekday.num_days_from_monday() as usize] += session.duration_minutes as u64;
    }

    let max_val = totals
        .iter()
        .copied()
        .max()
        .unwrap_or(0)
        .max(WEEKDAY_CHART_FLOOR);

    WeekdayData {
        days: WEEKDAY_LABELS,
        totals,
        max_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cycle, Module, Subtopic};

    /// Wednesday 2025-03-12 18:00 UTC
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 18, 0, 0).unwrap()
    }

    fn session(days_ago: i64, minutes: u32) -> StudySession {
        let started = now() - Duration::days(days_ago) - Duration::hours(2);
        StudySession {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: None,
            module_id: None,
            topic_id: None,
            duration_minutes: minutes,
            started_at: started,
            ended_at: started + Duration::minutes(minutes as i64),
        }
    }

    fn module(id: &str, title: &str, done: usize, total: usize) -> Module {
        Module {
            id: id.to_string(),
            number: 1,
            title: title.to_string(),
            description: None,
            subtopics: (0..total)
                .map(|i| Subtopic {
                    id: format!("{}-t{}", id, i),
                    title: format!("Topic {}", i),
                    completed: i < done,
                })
                .collect(),
            attachments: vec![],
        }
    }

    fn subject(id: &str, modules: Vec<Module>) -> Subject {
        Subject {
            id: id.to_string(),
            course_code: format!("25{}", id.to_uppercase()),
            name: id.to_string(),
            cycle: Cycle::Physics,
            credits: 4,
            modules,
        }
    }

    #[test]
    fn test_consistency_every_day_is_full_score() {
        let sessions: Vec<_> = (0..14).map(|d| session(d, 30)).collect();
        assert_eq!(consistency_score(&sessions, &now()), 100);
    }

    #[test]
    fn test_consistency_counts_distinct_days() {
        let sessions = vec![session(0, 30), session(0, 20), session(1, 30), session(20, 30)];
        // 2 distinct days in window
        assert_eq!(consistency_score(&sessions, &now()), 14);
        assert_eq!(consistency_score(&[], &now()), 0);
    }

    #[test]
    fn test_consistency_ignores_future_sessions() {
        let mut future = session(0, 30);
        future.started_at = now() + Duration::days(1);
        assert_eq!(consistency_score(&[future], &now()), 0);
    }

    #[test]
    fn test_focus_quality_no_data() {
        let focus = focus_quality(&[]);
        assert_eq!(focus.score, 0);
        assert_eq!(focus.rating, FocusRating::Low);
        assert_eq!(focus.label, "No Data");
    }

    #[test]
    fn test_focus_quality_bands() {
        // avg 45 and all long: 100
        let deep = vec![session(0, 45), session(1, 45)];
        let focus = focus_quality(&deep);
        assert_eq!(focus.score, 100);
        assert_eq!(focus.rating, FocusRating::High);
        assert_eq!(focus.label, "Deep Work");

        // avg 30 → 66.67*0.6 = 40, all long → 100*0.4 = 40 → 80
        let focus = focus_quality(&[session(0, 30)]);
        assert_eq!(focus.score, 80);

        // avg 10, none long → round(13.33) = 13
        let focus = focus_quality(&[session(0, 10), session(1, 10)]);
        assert_eq!(focus.score, 13);
        assert_eq!(focus.label, "Fragmented");

        // avg 25 → 55.56*0.6 = 33.3, half long → 62.5*0.4 = 25 → 58
        let focus = focus_quality(&[session(0, 40), session(1, 10)]);
        assert_eq!(focus.score, 58);
        assert_eq!(focus.rating, FocusRating::Medium);
    }

    #[test]
    fn test_efficiency_requires_minimum_minutes() {
        let subjects = vec![subject("maths", vec![module("m1", "Algebra", 4, 4)])];
        assert_eq!(efficiency_index(&[session(0, 9)], &subjects), 0.0);
        // 4 topics in 2 hours
        assert_eq!(efficiency_index(&[session(0, 120)], &subjects), 2.0);
        // 4 topics in 0.75 hours = 5.333...
        assert_eq!(efficiency_index(&[session(0, 45)], &subjects), 5.3);
    }

    #[test]
    fn test_momentum_without_previous_period() {
        assert_eq!(
            momentum_index(&[], &now()),
            Momentum {
                value: 0,
                trend: Trend::Stable
            }
        );
        assert_eq!(
            momentum_index(&[session(1, 30)], &now()),
            Momentum {
                value: 100,
                trend: Trend::Up
            }
        );
    }

    #[test]
    fn test_momentum_delta() {
        let sessions = vec![session(1, 30), session(9, 60)];
        assert_eq!(
            momentum_index(&sessions, &now()),
            Momentum {
                value: 50,
                trend: Trend::Down
            }
        );

        let sessions = vec![session(1, 60), session(9, 60)];
        assert_eq!(
            momentum_index(&sessions, &now()),
            Momentum {
                value: 0,
                trend: Trend::Up
            }
        );
    }

    #[test]
    fn test_momentum_window_boundaries() {
        let mut at_week_start = session(0, 30);
        at_week_start.started_at = now() - Duration::days(7);
        let mut at_two_weeks = session(0, 60);
        at_two_weeks.started_at = now() - Duration::days(14);

        // now-7d belongs to the current period, now-14d to the previous one
        let sessions = vec![at_week_start, at_two_weeks];
        assert_eq!(
            momentum_index(&sessions, &now()),
            Momentum {
                value: 50,
                trend: Trend::Down
            }
        );
    }

    #[test]
    fn test_burn_risk_crash() {
        // consistency 2/14 = 14, momentum down 90%
        let sessions = vec![session(1, 10), session(8, 100)];
        let risk = burn_risk(&sessions, &now());
        assert_eq!(risk.status, BurnStatus::Risk);
        assert_eq!(risk.reason, "Crash Detected");
    }

    #[test]
    fn test_burn_risk_slowing_down() {
        // every day studied, current week at 60% of previous week
        let mut sessions: Vec<_> = (0..7).map(|d| session(d, 30)).collect();
        sessions.extend((7..14).map(|d| session(d, 50)));
        let risk = burn_risk(&sessions, &now());
        assert_eq!(risk.status, BurnStatus::Warning);
        assert_eq!(risk.reason, "Slowing Down");
    }

    #[test]
    fn test_burn_risk_idle_learner_below_threshold() {
        // Every day from 4 to 13 days ago: 10 distinct days → consistency 71,
        // under the sudden-stop threshold, and momentum is up
        let mut sessions: Vec<_> = (4..7).map(|d| session(d, 200)).collect();
        sessions.extend((7..14).map(|d| session(d, 30)));
        assert_eq!(consistency_score(&sessions, &now()), 71);
        let risk = burn_risk(&sessions, &now());
        assert_eq!(risk.status, BurnStatus::Safe);
    }

    #[test]
    fn test_burn_risk_steady_pace() {
        let sessions: Vec<_> = (0..14).map(|d| session(d, 30)).collect();
        let risk = burn_risk(&sessions, &now());
        assert_eq!(risk.status, BurnStatus::Safe);
        assert_eq!(risk.reason, "Steady Pace");
    }

    #[test]
    fn test_burn_risk_rule_order() {
        let down = |value| Momentum {
            value,
            trend: Trend::Down,
        };
        let up = Momentum {
            value: 40,
            trend: Trend::Up,
        };

        let risk = classify_burn_risk(20, down(60), true);
        assert_eq!((risk.status, risk.reason), (BurnStatus::Risk, "Crash Detected"));

        // a steep drop with good consistency is only slowing down
        let risk = classify_burn_risk(90, down(60), false);
        assert_eq!((risk.status, risk.reason), (BurnStatus::Warning, "Slowing Down"));

        let risk = classify_burn_risk(86, up, false);
        assert_eq!((risk.status, risk.reason), (BurnStatus::Warning, "Sudden Stop"));

        let risk = classify_burn_risk(86, up, true);
        assert_eq!((risk.status, risk.reason), (BurnStatus::Safe, "Steady Pace"));

        // exactly 80 is not above the threshold
        let risk = classify_burn_risk(80, down(10), false);
        assert_eq!(risk.status, BurnStatus::Safe);
    }

    #[test]
    fn test_weak_modules_needs_two_modules() {
        let subjects = vec![subject(
            "physics",
            vec![module("m1", "Quantum", 0, 4), module("m2", "Lasers", 4, 4)],
        )];
        let sessions = vec![session(0, 300).with_module("m1")];
        assert!(weak_modules(&sessions, &subjects).is_empty());
    }

    #[test]
    fn test_weak_modules_flags_slow_progress() {
        let subjects = vec![subject(
            "physics",
            vec![
                module("m1", "Quantum", 1, 4),
                module("m2", "Lasers", 4, 4),
                module("m3", "Sensors", 3, 4),
            ],
        )];
        let sessions = vec![
            session(0, 300).with_module("m1"),
            session(1, 60).with_module("m2"),
            session(2, 60).with_module("m3"),
            session(3, 500),
        ];
        assert_eq!(weak_modules(&sessions, &subjects), vec!["Quantum".to_string()]);
    }

    #[test]
    fn test_topic_revisit_rate() {
        assert_eq!(topic_revisit_rate(&[session(0, 30)]), 0);
        let sessions = vec![
            session(0, 30).with_topic("a"),
            session(1, 30).with_topic("a"),
            session(2, 30).with_topic("b"),
            session(3, 30),
        ];
        assert_eq!(topic_revisit_rate(&sessions), 50);
    }

    #[test]
    fn test_balance_score() {
        let subjects = vec![subject("maths", vec![]), subject("physics", vec![])];
        let even = vec![
            session(0, 30).with_subject("maths"),
            session(1, 30).with_subject("physics"),
        ];
        assert_eq!(balance_score(&even, &subjects), 100);

        let neglected = vec![session(0, 30).with_subject("maths")];
        assert_eq!(balance_score(&neglected, &subjects), 0);

        let uneven = vec![
            session(0, 30).with_subject("maths"),
            session(1, 120).with_subject("physics"),
            session(2, 500).with_subject("unknown"),
        ];
        assert_eq!(balance_score(&uneven, &subjects), 25);

        assert_eq!(balance_score(&even, &[]), 0);
    }

    #[test]
    fn test_confidence_score() {
        let subjects = vec![subject("maths", vec![module("m1", "Algebra", 2, 4)])];
        // completion 50 → 25, focus 80 → 24, revisit 0
        assert_eq!(confidence_score(&[session(0, 30)], &subjects), 49);
        assert_eq!(confidence_score(&[], &[]), 0);
    }

    #[test]
    fn test_prediction_complete_syllabus() {
        let subjects = vec![subject("maths", vec![module("m1", "Algebra", 4, 4)])];
        let prediction = syllabus_prediction(&[], &subjects, &now());
        assert_eq!(prediction.days_left, 0);
        assert_eq!(prediction.completion_date, Some(now()));

        // No subtopics at all also counts as nothing remaining
        let prediction = syllabus_prediction(&[], &[], &now());
        assert_eq!(prediction.days_left, 0);
        assert!(prediction.completion_date.is_some());
    }

    #[test]
    fn test_prediction_without_signal() {
        let none_done = vec![subject("maths", vec![module("m1", "Algebra", 0, 4)])];
        let prediction = syllabus_prediction(&[session(3, 30)], &none_done, &now());
        assert_eq!(prediction.days_left, UNKNOWN_DAYS_LEFT);
        assert!(prediction.is_unknown());

        let some_done = vec![subject("maths", vec![module("m1", "Algebra", 1, 4)])];
        let prediction = syllabus_prediction(&[], &some_done, &now());
        assert_eq!(prediction.days_left, UNKNOWN_DAYS_LEFT);
    }

    #[test]
    fn test_prediction_with_ancient_first_session() {
        let subjects = vec![subject("physics", vec![module("m1", "Optics", 1, 177)])];
        let ended = Utc.with_ymd_and_hms(1, 1, 1, 0, 30, 0).unwrap();
        let ancient = StudySession::ending_at(ended, 30);

        let prediction = syllabus_prediction(&[ancient, session(1, 30)], &subjects, &now());
        assert!(prediction.is_unknown());
        assert_eq!(prediction.days_left, UNKNOWN_DAYS_LEFT);
    }

    #[test]
    fn test_prediction_rate() {
        // 2 done over 4 days → 0.5/day, 6 remaining → 12 days
        let subjects = vec![subject("maths", vec![module("m1", "Algebra", 2, 8)])];
        let mut first = session(0, 30);
        first.started_at = now() - Duration::days(4);
        let prediction = syllabus_prediction(&[session(1, 30), first], &subjects, &now());
        assert_eq!(prediction.days_left, 12);
        assert_eq!(prediction.completion_date, Some(now() + Duration::days(12)));
    }

    #[test]
    fn test_peak_study_time() {
        assert_eq!(peak_study_time(&[], &Utc), None);
        assert_eq!(peak_study_label(&[], &Utc), "N/A");

        // session() starts at 16:00 UTC
        assert_eq!(peak_study_time(&[session(0, 30)], &Utc), Some(StudyBand::Afternoon));

        let mut morning = session(0, 30);
        morning.started_at = Utc.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap();
        let mut night = session(0, 30);
        night.started_at = Utc.with_ymd_and_hms(2025, 3, 11, 23, 0, 0).unwrap();
        // tie goes to the earliest hour
        assert_eq!(
            peak_study_time(&[night.clone(), morning], &Utc),
            Some(StudyBand::Morning)
        );
        assert_eq!(peak_study_label(&[night], &Utc), "Late Night");
    }

    #[test]
    fn test_study_band_edges() {
        assert_eq!(StudyBand::from_hour(4), StudyBand::LateNight);
        assert_eq!(StudyBand::from_hour(5), StudyBand::Morning);
        assert_eq!(StudyBand::from_hour(12), StudyBand::Afternoon);
        assert_eq!(StudyBand::from_hour(17), StudyBand::Evening);
        assert_eq!(StudyBand::from_hour(22), StudyBand::LateNight);
    }

    #[test]
    fn test_weekday_data_starts_monday() {
        let data = weekday_data(&[], &Utc);
        assert_eq!(data.days, ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]);
        assert_eq!(data.totals, [0; 7]);
        assert_eq!(data.max_val, 60);

        // now() is a Wednesday; 3 days earlier is Sunday
        let data = weekday_data(&[session(0, 30), session(3, 90)], &Utc);
        assert_eq!(data.totals, [0, 0, 30, 0, 0, 0, 90]);
        assert_eq!(data.max_val, 90);
    }

    #[test]
    fn test_local_day_follows_time_zone() {
        let tz = chrono::FixedOffset::east_opt(9 * 3600).unwrap();
        let mut late = session(0, 30);
        // 20:00 UTC Tuesday is 05:00 Wednesday in UTC+9
        late.started_at = Utc.with_ymd_and_hms(2025, 3, 11, 20, 0, 0).unwrap();
        assert_eq!(weekday_data(&[late.clone()], &Utc).totals[1], 30);
        assert_eq!(weekday_data(&[late.clone()], &tz).totals[2], 30);
        assert_eq!(peak_study_time(&[late], &tz), Some(StudyBand::Morning));
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let subjects = vec![subject("maths", vec![module("m1", "Algebra", 1, 4)])];
        let sessions = vec![session(0, 30).with_module("m1"), session(8, 45)];
        assert_eq!(consistency_score(&sessions, &now()), consistency_score(&sessions, &now()));
        assert_eq!(focus_quality(&sessions), focus_quality(&sessions));
        assert_eq!(
            syllabus_prediction(&sessions, &subjects, &now()),
            syllabus_prediction(&sessions, &subjects, &now())
        );
        assert_eq!(weekday_data(&sessions, &Utc), weekday_data(&sessions, &Utc));
    }
}
