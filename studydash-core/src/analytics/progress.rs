//! Syllabus completion counts and daily time totals.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::types::{Cycle, CycleData, StudySession, Subject};

/// Completion counts across a set of subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyllabusProgress {
    pub total_topics: usize,
    pub completed_topics: usize,
    pub total_modules: usize,
    pub completed_modules: usize,
    pub total_subjects: usize,
    pub completed_subjects: usize,
    /// Rounded topic completion percentage
    pub percent: u32,
}

impl SyllabusProgress {
    pub fn from_subjects(subjects: &[Subject]) -> Self {
        let mut progress = SyllabusProgress {
            total_subjects: subjects.len(),
            ..Default::default()
        };

        for subject in subjects {
            if subject.is_complete() {
                progress.completed_subjects += 1;
            }
            for module in &subject.modules {
                progress.total_modules += 1;
                if module.is_complete() {
                    progress.completed_modules += 1;
                }
                progress.total_topics += module.subtopics.len();
                progress.completed_topics += module.completed_count();
            }
        }

        if progress.total_topics > 0 {
            progress.percent = (progress.completed_topics as f64 / progress.total_topics as f64
                * 100.0)
                .round() as u32;
        }
        progress
    }

    /// Progress for each cycle, in catalog order.
    pub fn by_cycle(cycles: &[CycleData]) -> Vec<(Cycle, SyllabusProgress)> {
        cycles
            .iter()
            .map(|c| (c.id, Self::from_subjects(&c.subjects)))
            .collect()
    }

    pub fn remaining_topics(&self) -> usize {
        self.total_topics - self.completed_topics
    }
}

/// Minutes of sessions started on the same local calendar date as `now`.
pub fn minutes_on_day<Tz: TimeZone>(sessions: &[StudySession], now: &DateTime<Tz>) -> u64 {
    let tz = now.timezone();
    let today = now.date_naive();
    sessions
        .iter()
        .filter(|s| s.started_at.with_timezone(&tz).date_naive() == today)
        .map(|s| s.duration_minutes as u64)
        .sum()
}

/// Minutes logged per subject, in subject order. Unscoped sessions are skipped.
pub fn minutes_by_subject(sessions: &[StudySession], subjects: &[Subject]) -> Vec<(String, u64)> {
    subjects
        .iter()
        .map(|subject| {
            let minutes = sessions
                .iter()
                .filter(|s| s.subject_id.as_deref() == Some(subject.id.as_str()))
                .map(|s| s.duration_minutes as u64)
                .sum();
            (subject.name.clone(), minutes)
        })
        .collect()
}

/// Most recent session start, if any.
pub fn last_studied(sessions: &[StudySession]) -> Option<DateTime<Utc>> {
    sessions.iter().map(|s| s.started_at).max()
}
