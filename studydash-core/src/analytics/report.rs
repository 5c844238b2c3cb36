//! Study report: every metric for one snapshot, computed in a single pass.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::metrics::{
    balance_score, burn_risk, confidence_score, consistency_score, efficiency_index,
    focus_quality, hourly_minutes, momentum_index, peak_study_time, syllabus_prediction,
    topic_revisit_rate, weak_modules, weekday_data, BurnRisk, FocusQuality, Momentum,
    StudyBand, SyllabusPrediction, WeekdayData,
};
use super::progress::{last_studied, minutes_by_subject, minutes_on_day, SyllabusProgress};
use crate::types::{StudySession, Subject};

/// Time logged against one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectTime {
    pub name: String,
    pub minutes: u64,
}

/// Snapshot of all study analytics.
///
/// Built from scratch by [`StudyReport::compute`]; nothing is cached between calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyReport {
    pub generated_at: DateTime<Utc>,
    pub session_count: usize,
    pub total_minutes: u64,
    pub minutes_today: u64,
    pub last_studied: Option<DateTime<Utc>>,

    pub progress: SyllabusProgress,
    pub subject_time: Vec<SubjectTime>,

    pub consistency: u32,
    pub focus: FocusQuality,
    pub efficiency: f64,
    pub momentum: Momentum,
    pub burn_risk: BurnRisk,
    pub weak_modules: Vec<String>,
    pub revisit_rate: u32,
    pub balance: u32,
    pub confidence: u32,
    pub prediction: SyllabusPrediction,
    pub peak_time: Option<StudyBand>,
    pub hourly: [u64; 24],
    pub weekday: WeekdayData,
}

impl StudyReport {
    /// Compute the report for `now`. Local days and hours use `now`'s time zone.
    pub fn compute<Tz: TimeZone>(
        sessions: &[StudySession],
        subjects: &[Subject],
        now: &DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        tracing::debug!(
            sessions = sessions.len(),
            subjects = subjects.len(),
            "Computing study report"
        );

        StudyReport {
            generated_at: now.with_timezone(&Utc),
            session_count: sessions.len(),
            total_minutes: sessions.iter().map(|s| s.duration_minutes as u64).sum(),
            minutes_today: minutes_on_day(sessions, now),
            last_studied: last_studied(sessions),
            progress: SyllabusProgress::from_subjects(subjects),
            subject_time: minutes_by_subject(sessions, subjects)
                .into_iter()
                .map(|(name, minutes)| SubjectTime { name, minutes })
                .collect(),
            consistency: consistency_score(sessions, now),
            focus: focus_quality(sessions),
            efficiency: efficiency_index(sessions, subjects),
            momentum: momentum_index(sessions, now),
            burn_risk: burn_risk(sessions, now),
            weak_modules: weak_modules(sessions, subjects),
            revisit_rate: topic_revisit_rate(sessions),
            balance: balance_score(sessions, subjects),
            confidence: confidence_score(sessions, subjects),
            prediction: syllabus_prediction(sessions, subjects, now),
            peak_time: peak_study_time(sessions, &tz),
            hourly: hourly_minutes(sessions, &tz),
            weekday: weekday_data(sessions, &tz),
        }
    }

    pub fn has_sessions(&self) -> bool {
        self.session_count > 0
    }

    /// Peak band label, `"N/A"` without sessions.
    pub fn peak_label(&self) -> &'static str {
        self.peak_time.map(|band| band.label()).unwrap_or("N/A")
    }

    /// Pretty-printed JSON export.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
