//! Core domain types for studydash
//!
//! These types represent the three aggregates owned by the store:
//! the session log, the syllabus tree and the planner state.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Cycle** | A curriculum track grouping subjects (physics or chemistry cycle) |
//! | **Subject** | A course with a code, credits and an ordered list of modules |
//! | **Module** | A numbered unit of a subject holding checklist subtopics |
//! | **Subtopic** | A leaf checklist item; the unit of completion tracking |
//! | **Session** | One completed focus interval with an optional subject/module/topic scope |
//! | **Plan** | The ordered task list for one calendar date |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Session Log
// ============================================

/// One completed focus interval.
///
/// Sessions are append-only: the store never updates or deletes them.
/// `duration_minutes` is the nominal duration logged by the timer and is
/// what analytics use; it is not recomputed from the timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    /// Unique identifier
    pub id: String,
    /// Subject this session was scoped to (None = general study)
    pub subject_id: Option<String>,
    /// Module this session was scoped to
    pub module_id: Option<String>,
    /// Subtopic this session was scoped to
    pub topic_id: Option<String>,
    /// Logged focus duration in minutes
    pub duration_minutes: u32,
    /// When the interval started
    pub started_at: DateTime<Utc>,
    /// When the interval ended
    pub ended_at: DateTime<Utc>,
}

impl StudySession {
    /// Create an unscoped session that ended at `ended_at` and lasted `duration_minutes`.
    pub fn ending_at(ended_at: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: None,
            module_id: None,
            topic_id: None,
            duration_minutes,
            started_at: ended_at - chrono::Duration::minutes(duration_minutes as i64),
            ended_at,
        }
    }

    /// Scope the session to a subject.
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    /// Scope the session to a module.
    pub fn with_module(mut self, module_id: impl Into<String>) -> Self {
        self.module_id = Some(module_id.into());
        self
    }

    /// Scope the session to a subtopic.
    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    /// Check the session invariants enforced at the store boundary.
    pub fn validate(&self) -> crate::Result<()> {
        if self.duration_minutes == 0 {
            return Err(crate::Error::InvalidSession(format!(
                "session {} has zero duration",
                self.id
            )));
        }
        if self.started_at > self.ended_at {
            return Err(crate::Error::InvalidSession(format!(
                "session {} ends before it starts",
                self.id
            )));
        }
        Ok(())
    }
}

// ============================================
// Syllabus Tree
// ============================================

/// Curriculum track a subject belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    Physics,
    Chemistry,
}

impl Cycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Physics => "physics",
            Cycle::Chemistry => "chemistry",
        }
    }

    /// Display name used for cycle headings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Cycle::Physics => "Physics Cycle",
            Cycle::Chemistry => "Chemistry Cycle",
        }
    }

    pub fn all() -> [Cycle; 2] {
        [Cycle::Physics, Cycle::Chemistry]
    }
}

impl std::str::FromStr for Cycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "physics" => Ok(Cycle::Physics),
            "chemistry" => Ok(Cycle::Chemistry),
            _ => Err(format!("unknown cycle: {}", s)),
        }
    }
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf checklist item within a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// Metadata for a study file attached to a module.
///
/// File contents are not stored; only what is needed to list the file
/// and show any analysis text produced for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    /// Generated summary of the file, if one was recorded
    pub analysis: Option<String>,
}

/// Input for [`crate::Database::add_attachment`].
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

/// A numbered unit of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    /// Display ordinal, unique within the subject
    pub number: u32,
    pub title: String,
    pub description: Option<String>,
    /// Checklist items in insertion order
    pub subtopics: Vec<Subtopic>,
    pub attachments: Vec<Attachment>,
}

impl Module {
    /// Number of completed subtopics.
    pub fn completed_count(&self) -> usize {
        self.subtopics.iter().filter(|t| t.completed).count()
    }

    /// Completion ratio in `0.0..=1.0` (0 when the module has no subtopics).
    pub fn progress(&self) -> f64 {
        if self.subtopics.is_empty() {
            0.0
        } else {
            self.completed_count() as f64 / self.subtopics.len() as f64
        }
    }

    /// A module is complete when it has subtopics and all of them are done.
    pub fn is_complete(&self) -> bool {
        !self.subtopics.is_empty() && self.completed_count() == self.subtopics.len()
    }
}

/// A course within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub course_code: String,
    pub name: String,
    pub cycle: Cycle,
    pub credits: u32,
    pub modules: Vec<Module>,
}

impl Subject {
    /// Iterate over every subtopic of every module.
    pub fn subtopics(&self) -> impl Iterator<Item = &Subtopic> {
        self.modules.iter().flat_map(|m| m.subtopics.iter())
    }

    /// A subject is complete when it has modules and every module is complete.
    pub fn is_complete(&self) -> bool {
        !self.modules.is_empty() && self.modules.iter().all(Module::is_complete)
    }
}

/// Subjects grouped under one curriculum cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleData {
    pub id: Cycle,
    pub name: String,
    pub subjects: Vec<Subject>,
}

impl CycleData {
    /// Flatten cycles into the subject list analytics operate on.
    pub fn flatten(cycles: &[CycleData]) -> Vec<Subject> {
        cycles
            .iter()
            .flat_map(|c| c.subjects.iter().cloned())
            .collect()
    }
}

// ============================================
// Planner
// ============================================

/// A single planner task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Tasks planned for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: NaiveDate,
    pub tasks: Vec<PlanTask>,
}

/// All daily plans, keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerState {
    pub daily_plans: BTreeMap<NaiveDate, DailyPlan>,
}
