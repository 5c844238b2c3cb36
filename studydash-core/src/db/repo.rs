//! Repository layer for database operations
//!
//! Every read returns an owned snapshot; callers never see live rows.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const ACCESS_KEY: &str = "has_access";

/// Filter for [`Database::list_sessions`].
#[derive(Debug, Default, Clone)]
pub struct SessionFilter {
    /// Only sessions scoped to this subject
    pub subject_id: Option<String>,
    /// Only sessions started at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Keep only the most recent N sessions (still returned oldest first)
    pub limit: Option<usize>,
}

/// Database handle holding a single SQLite connection
pub struct Database {
    conn: Mutex<Connection>,
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, message.into())
}

fn parse_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("invalid timestamp {:?}: {}", value, e)))
}

fn parse_date(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let value: String = row.get(idx)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("invalid date {:?}: {}", value, e)))
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ============================================
    // Syllabus: seeding
    // ============================================

    /// Whether any subjects have been stored.
    pub fn is_seeded(&self) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM subjects", [], |r| r.get(0))?;
        Ok(count > 0)
    }

    /// Insert a full syllabus tree in one transaction.
    ///
    /// Fails with [`Error::Catalog`] if a syllabus is already stored.
    pub fn seed_syllabus(&self, cycles: &[CycleData]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM subjects", [], |r| r.get(0))?;
        if existing > 0 {
            return Err(Error::Catalog("syllabus is already seeded".to_string()));
        }

        let mut subject_count = 0;
        let mut topic_count = 0;
        for cycle in cycles {
            for subject in &cycle.subjects {
                tx.execute(
                    "INSERT INTO subjects (id, course_code, name, cycle, credits, position)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        subject.id,
                        subject.course_code,
                        subject.name,
                        cycle.id.as_str(),
                        subject.credits,
                        subject_count,
                    ],
                )?;
                subject_count += 1;

                for module in &subject.modules {
                    tx.execute(
                        "INSERT INTO modules (id, subject_id, number, title, description)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            module.id,
                            subject.id,
                            module.number,
                            module.title,
                            module.description,
                        ],
                    )?;

                    for (position, topic) in module.subtopics.iter().enumerate() {
                        tx.execute(
                            "INSERT INTO subtopics (id, module_id, position, title, completed)
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                            params![
                                topic.id,
                                module.id,
                                position as i64,
                                topic.title,
                                topic.completed,
                            ],
                        )?;
                        topic_count += 1;
                    }

                    for attachment in &module.attachments {
                        Self::insert_attachment(&tx, &module.id, attachment)?;
                    }
                }
            }
        }

        tx.commit()?;
        tracing::info!(
            subjects = subject_count,
            subtopics = topic_count,
            "Seeded syllabus"
        );
        Ok(())
    }

    // ============================================
    // Syllabus: snapshot queries
    // ============================================

    /// Load the syllabus tree grouped by cycle.
    ///
    /// Cycles without subjects are omitted. Subjects keep their seed order,
    /// modules are ordered by number and subtopics by insertion.
    pub fn load_cycles(&self) -> Result<Vec<CycleData>> {
        let conn = self.lock()?;
        let mut modules = Self::load_modules(&conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, course_code, name, cycle, credits FROM subjects ORDER BY position",
        )?;
        let subjects = stmt
            .query_map([], Self::row_to_subject)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut cycles: Vec<CycleData> = Vec::new();
        for cycle in Cycle::all() {
            let cycle_subjects: Vec<Subject> = subjects
                .iter()
                .filter(|s| s.cycle == cycle)
                .cloned()
                .map(|mut s| {
                    s.modules = modules.remove(&s.id).unwrap_or_default();
                    s
                })
                .collect();
            if !cycle_subjects.is_empty() {
                cycles.push(CycleData {
                    id: cycle,
                    name: cycle.display_name().to_string(),
                    subjects: cycle_subjects,
                });
            }
        }

        Ok(cycles)
    }

    /// Load all subjects, flattened across cycles.
    pub fn load_subjects(&self) -> Result<Vec<Subject>> {
        Ok(CycleData::flatten(&self.load_cycles()?))
    }

    /// Get one subject with its modules.
    pub fn get_subject(&self, id: &str) -> Result<Subject> {
        self.load_subjects()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::SubjectNotFound(id.to_string()))
    }

    /// Get one module with its subtopics and attachments.
    pub fn get_module(&self, id: &str) -> Result<Module> {
        self.load_subjects()?
            .into_iter()
            .flat_map(|s| s.modules)
            .find(|m| m.id == id)
            .ok_or_else(|| Error::ModuleNotFound(id.to_string()))
    }

    /// Get one subtopic.
    pub fn get_subtopic(&self, id: &str) -> Result<Subtopic> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, title, completed FROM subtopics WHERE id = ?",
            [id],
            Self::row_to_subtopic,
        )
        .optional()?
        .ok_or_else(|| Error::SubtopicNotFound(id.to_string()))
    }

    /// Modules keyed by subject id, each with subtopics and attachments.
    fn load_modules(conn: &Connection) -> Result<HashMap<String, Vec<Module>>> {
        let mut subtopics: HashMap<String, Vec<Subtopic>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT id, title, completed, module_id FROM subtopics ORDER BY module_id, position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(3)?, Self::row_to_subtopic(row)?))
        })?;
        for row in rows {
            let (module_id, topic) = row?;
            subtopics.entry(module_id).or_default().push(topic);
        }

        let mut attachments: HashMap<String, Vec<Attachment>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT id, file_name, file_size, mime_type, created_at, analysis, module_id
             FROM attachments ORDER BY created_at, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(6)?, Self::row_to_attachment(row)?))
        })?;
        for row in rows {
            let (module_id, attachment) = row?;
            attachments.entry(module_id).or_default().push(attachment);
        }

        let mut modules: HashMap<String, Vec<Module>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT id, number, title, description, subject_id FROM modules
             ORDER BY subject_id, number",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(4)?,
                Module {
                    id: row.get(0)?,
                    number: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    subtopics: Vec::new(),
                    attachments: Vec::new(),
                },
            ))
        })?;
        for row in rows {
            let (subject_id, mut module) = row?;
            module.subtopics = subtopics.remove(&module.id).unwrap_or_default();
            module.attachments = attachments.remove(&module.id).unwrap_or_default();
            modules.entry(subject_id).or_default().push(module);
        }

        Ok(modules)
    }

    fn row_to_subject(row: &Row) -> rusqlite::Result<Subject> {
        let cycle_str: String = row.get(3)?;
        Ok(Subject {
            id: row.get(0)?,
            course_code: row.get(1)?,
            name: row.get(2)?,
            cycle: cycle_str.parse().map_err(|e| conversion_error(3, e))?,
            credits: row.get(4)?,
            modules: Vec::new(),
        })
    }

    fn row_to_subtopic(row: &Row) -> rusqlite::Result<Subtopic> {
        Ok(Subtopic {
            id: row.get(0)?,
            title: row.get(1)?,
            completed: row.get(2)?,
        })
    }

    fn row_to_attachment(row: &Row) -> rusqlite::Result<Attachment> {
        let file_size: i64 = row.get(2)?;
        Ok(Attachment {
            id: row.get(0)?,
            file_name: row.get(1)?,
            file_size: file_size.max(0) as u64,
            mime_type: row.get(3)?,
            created_at: parse_ts(row, 4)?,
            analysis: row.get(5)?,
        })
    }

    // ============================================
    // Syllabus: commands
    // ============================================

    /// Flip a subtopic's completion flag, returning the new state.
    pub fn toggle_subtopic(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let completed: Option<bool> = conn
            .query_row(
                "UPDATE subtopics SET completed = NOT completed WHERE id = ? RETURNING completed",
                [id],
                |r| r.get(0),
            )
            .optional()?;

        let completed = completed.ok_or_else(|| Error::SubtopicNotFound(id.to_string()))?;
        tracing::debug!(subtopic_id = id, completed, "Toggled subtopic");
        Ok(completed)
    }

    /// Append a new, incomplete subtopic to a module.
    pub fn add_subtopic(&self, module_id: &str, title: &str) -> Result<Subtopic> {
        let conn = self.lock()?;
        Self::ensure_module(&conn, module_id)?;

        let position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM subtopics WHERE module_id = ?",
            [module_id],
            |r| r.get(0),
        )?;

        let topic = Subtopic {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
        };
        conn.execute(
            "INSERT INTO subtopics (id, module_id, position, title, completed)
             VALUES (?1, ?2, ?3, ?4, 0)",
            params![topic.id, module_id, position, topic.title],
        )?;

        tracing::debug!(module_id, subtopic_id = %topic.id, position, "Added subtopic");
        Ok(topic)
    }

    /// Record attachment metadata on a module.
    pub fn add_attachment(&self, module_id: &str, file: NewAttachment) -> Result<Attachment> {
        let conn = self.lock()?;
        Self::ensure_module(&conn, module_id)?;

        let attachment = Attachment {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file.file_name,
            file_size: file.file_size,
            mime_type: file.mime_type,
            created_at: Utc::now(),
            analysis: None,
        };
        Self::insert_attachment(&conn, module_id, &attachment)?;

        tracing::debug!(module_id, attachment_id = %attachment.id, "Added attachment");
        Ok(attachment)
    }

    fn insert_attachment(
        conn: &Connection,
        module_id: &str,
        attachment: &Attachment,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO attachments
                 (id, module_id, file_name, file_size, mime_type, created_at, analysis)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                attachment.id,
                module_id,
                attachment.file_name,
                i64::try_from(attachment.file_size).unwrap_or(i64::MAX),
                attachment.mime_type,
                fmt_ts(&attachment.created_at),
                attachment.analysis,
            ],
        )?;
        Ok(())
    }

    pub fn remove_attachment(&self, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM attachments WHERE id = ?", [id])?;
        if removed == 0 {
            return Err(Error::AttachmentNotFound(id.to_string()));
        }
        tracing::debug!(attachment_id = id, "Removed attachment");
        Ok(())
    }

    /// Store analysis text for an attachment, replacing any earlier text.
    pub fn set_attachment_analysis(&self, id: &str, analysis: &str) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE attachments SET analysis = ?1 WHERE id = ?2",
            params![analysis, id],
        )?;
        if updated == 0 {
            return Err(Error::AttachmentNotFound(id.to_string()));
        }
        Ok(())
    }

    fn ensure_module(conn: &Connection, module_id: &str) -> Result<()> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM modules WHERE id = ?)",
            [module_id],
            |r| r.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::ModuleNotFound(module_id.to_string()))
        }
    }

    // ============================================
    // Session log
    // ============================================

    /// Validate and append a session.
    ///
    /// Subject, module and topic ids are stored as given; they are not
    /// checked against the syllabus.
    pub fn add_session(&self, session: &StudySession) -> Result<()> {
        session.validate()?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO study_sessions
                (id, subject_id, module_id, topic_id, duration_minutes, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id,
                session.subject_id,
                session.module_id,
                session.topic_id,
                session.duration_minutes,
                fmt_ts(&session.started_at),
                fmt_ts(&session.ended_at),
            ],
        )?;

        tracing::debug!(
            session_id = %session.id,
            minutes = session.duration_minutes,
            subject_id = session.subject_id.as_deref().unwrap_or("-"),
            "Logged study session"
        );
        Ok(())
    }

    /// List sessions in insertion order.
    ///
    /// Rows that fail to decode are skipped with a warning.
    pub fn list_sessions(&self, filter: &SessionFilter) -> Result<Vec<StudySession>> {
        let conn = self.lock()?;

        let mut sql = String::from(
            "SELECT id, subject_id, module_id, topic_id, duration_minutes, started_at, ended_at, seq
             FROM study_sessions WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(subject_id) = &filter.subject_id {
            sql.push_str(" AND subject_id = ?");
            params.push(Box::new(subject_id.clone()));
        }

        if let Some(since) = &filter.since {
            sql.push_str(" AND started_at >= ?");
            params.push(Box::new(fmt_ts(since)));
        }

        if let Some(limit) = filter.limit {
            sql = format!(
                "SELECT * FROM ({} ORDER BY seq DESC LIMIT {}) ORDER BY seq",
                sql, limit
            );
        } else {
            sql.push_str(" ORDER BY seq");
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), Self::row_to_session)?;

        let mut sessions = Vec::new();
        for row in rows {
            match row {
                Ok(session) => sessions.push(session),
                Err(rusqlite::Error::FromSqlConversionFailure(idx, _, e)) => {
                    tracing::warn!(column = idx, error = %e, "Skipping unreadable session row");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(sessions)
    }

    fn row_to_session(row: &Row) -> rusqlite::Result<StudySession> {
        Ok(StudySession {
            id: row.get(0)?,
            subject_id: row.get(1)?,
            module_id: row.get(2)?,
            topic_id: row.get(3)?,
            duration_minutes: row.get(4)?,
            started_at: parse_ts(row, 5)?,
            ended_at: parse_ts(row, 6)?,
        })
    }

    // ============================================
    // Planner
    // ============================================

    /// Append a task to the plan for `date`, creating the plan if needed.
    pub fn add_task(&self, date: NaiveDate, title: &str) -> Result<PlanTask> {
        let conn = self.lock()?;
        let date_str = date.to_string();

        let position: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM plan_tasks WHERE plan_date = ?",
            [&date_str],
            |r| r.get(0),
        )?;

        let task = PlanTask {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
        };
        conn.execute(
            "INSERT INTO plan_tasks (id, plan_date, position, title, completed, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![task.id, date_str, position, task.title, fmt_ts(&task.created_at)],
        )?;

        tracing::debug!(date = %date, task_id = %task.id, "Added plan task");
        Ok(task)
    }

    /// Flip a task's completion flag, returning the new state.
    pub fn toggle_task(&self, date: NaiveDate, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let completed: Option<bool> = conn
            .query_row(
                "UPDATE plan_tasks SET completed = NOT completed
                 WHERE id = ?1 AND plan_date = ?2 RETURNING completed",
                params![id, date.to_string()],
                |r| r.get(0),
            )
            .optional()?;

        let completed = completed.ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        tracing::debug!(date = %date, task_id = id, completed, "Toggled plan task");
        Ok(completed)
    }

    pub fn delete_task(&self, date: NaiveDate, id: &str) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM plan_tasks WHERE id = ?1 AND plan_date = ?2",
            params![id, date.to_string()],
        )?;
        if removed == 0 {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        tracing::debug!(date = %date, task_id = id, "Deleted plan task");
        Ok(())
    }

    /// The stored plan for `date`, if it has any tasks.
    pub fn get_daily_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, completed, created_at FROM plan_tasks
             WHERE plan_date = ? ORDER BY position",
        )?;
        let tasks = stmt
            .query_map([date.to_string()], Self::row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((!tasks.is_empty()).then_some(DailyPlan { date, tasks }))
    }

    /// All plans, keyed by date.
    pub fn load_planner(&self) -> Result<PlannerState> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, completed, created_at, plan_date FROM plan_tasks
             ORDER BY plan_date, position",
        )?;
        let rows = stmt.query_map([], |row| Ok((parse_date(row, 4)?, Self::row_to_task(row)?)))?;

        let mut state = PlannerState::default();
        for row in rows {
            let (date, task) = row?;
            state
                .daily_plans
                .entry(date)
                .or_insert_with(|| DailyPlan {
                    date,
                    tasks: Vec::new(),
                })
                .tasks
                .push(task);
        }
        Ok(state)
    }

    fn row_to_task(row: &Row) -> rusqlite::Result<PlanTask> {
        Ok(PlanTask {
            id: row.get(0)?,
            title: row.get(1)?,
            completed: row.get(2)?,
            created_at: parse_ts(row, 3)?,
        })
    }

    // ============================================
    // Access flag
    // ============================================

    pub fn grant_access(&self) -> Result<()> {
        self.set_access(true)
    }

    pub fn revoke_access(&self) -> Result<()> {
        self.set_access(false)
    }

    /// Whether access has been granted. Defaults to false.
    pub fn has_access(&self) -> Result<bool> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                [ACCESS_KEY],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("true"))
    }

    fn set_access(&self, granted: bool) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![ACCESS_KEY, if granted { "true" } else { "false" }],
        )?;
        tracing::info!(granted, "Updated access flag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn create_test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn create_test_cycles() -> Vec<CycleData> {
        let module = |id: &str, number: u32, topics: &[&str]| Module {
            id: id.to_string(),
            number,
            title: format!("Module {}", number),
            description: Some(format!("About {}", id)),
            subtopics: topics
                .iter()
                .enumerate()
                .map(|(i, title)| Subtopic {
                    id: format!("{}-t{}", id, i),
                    title: title.to_string(),
                    completed: false,
                })
                .collect(),
            attachments: vec![],
        };

        vec![
            CycleData {
                id: Cycle::Physics,
                name: "Physics Cycle".to_string(),
                subjects: vec![Subject {
                    id: "physics".to_string(),
                    course_code: "25PHY12".to_string(),
                    name: "Applied Physics".to_string(),
                    cycle: Cycle::Physics,
                    credits: 4,
                    // inserted out of order on purpose
                    modules: vec![
                        module("phy-2", 2, &["Lasers", "Fibres"]),
                        module("phy-1", 1, &["Wave function", "Tunnelling", "Eigenvalues"]),
                    ],
                }],
            },
            CycleData {
                id: Cycle::Chemistry,
                name: "Chemistry Cycle".to_string(),
                subjects: vec![Subject {
                    id: "chemistry".to_string(),
                    course_code: "25CHE12".to_string(),
                    name: "Applied Chemistry".to_string(),
                    cycle: Cycle::Chemistry,
                    credits: 4,
                    modules: vec![module("che-1", 1, &["Batteries"])],
                }],
            },
        ]
    }

    fn test_session(minutes: u32) -> StudySession {
        let end = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        StudySession::ending_at(end, minutes)
    }

    #[test]
    fn test_seed_and_load_round_trip() {
        let db = create_test_db();
        assert!(!db.is_seeded().unwrap());

        db.seed_syllabus(&create_test_cycles()).unwrap();
        assert!(db.is_seeded().unwrap());

        let cycles = db.load_cycles().unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].id, Cycle::Physics);
        assert_eq!(cycles[0].name, "Physics Cycle");

        let physics = &cycles[0].subjects[0];
        assert_eq!(physics.course_code, "25PHY12");
        assert_eq!(physics.modules.len(), 2);
        assert_eq!(physics.modules[0].number, 1);
        assert_eq!(physics.modules[0].description.as_deref(), Some("About phy-1"));
        let titles: Vec<_> = physics.modules[0]
            .subtopics
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Wave function", "Tunnelling", "Eigenvalues"]);

        let subjects = db.load_subjects().unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[1].id, "chemistry");
    }

    #[test]
    fn test_seed_twice_fails() {
        let db = create_test_db();
        db.seed_syllabus(&create_test_cycles()).unwrap();
        let result = db.seed_syllabus(&create_test_cycles());
        assert!(matches!(result, Err(Error::Catalog(_))));
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        let db = create_test_db();
        assert!(db.load_cycles().unwrap().is_empty());
        assert!(db.list_sessions(&SessionFilter::default()).unwrap().is_empty());
        assert!(db.load_planner().unwrap().daily_plans.is_empty());
    }

    #[test]
    fn test_toggle_subtopic() {
        let db = create_test_db();
        db.seed_syllabus(&create_test_cycles()).unwrap();

        assert!(db.toggle_subtopic("phy-1-t0").unwrap());
        let module = db.get_module("phy-1").unwrap();
        assert!(module.subtopics[0].completed);
        assert!(!module.subtopics[1].completed);

        assert!(!db.toggle_subtopic("phy-1-t0").unwrap());
        assert!(!db.get_subtopic("phy-1-t0").unwrap().completed);

        assert!(matches!(
            db.toggle_subtopic("missing"),
            Err(Error::SubtopicNotFound(_))
        ));
    }

    #[test]
    fn test_add_subtopic_appends() {
        let db = create_test_db();
        db.seed_syllabus(&create_test_cycles()).unwrap();

        let topic = db.add_subtopic("phy-2", "Holography").unwrap();
        assert!(!topic.completed);

        let module = db.get_module("phy-2").unwrap();
        assert_eq!(module.subtopics.len(), 3);
        assert_eq!(module.subtopics[2].id, topic.id);

        assert!(matches!(
            db.add_subtopic("missing", "x"),
            Err(Error::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_attachments() {
        let db = create_test_db();
        db.seed_syllabus(&create_test_cycles()).unwrap();

        let attachment = db
            .add_attachment(
                "che-1",
                NewAttachment {
                    file_name: "notes.pdf".to_string(),
                    file_size: 2048,
                    mime_type: "application/pdf".to_string(),
                },
            )
            .unwrap();

        db.set_attachment_analysis(&attachment.id, "Covers electrode potentials")
            .unwrap();
        let module = db.get_module("che-1").unwrap();
        assert_eq!(module.attachments.len(), 1);
        assert_eq!(module.attachments[0].file_size, 2048);
        assert_eq!(
            module.attachments[0].analysis.as_deref(),
            Some("Covers electrode potentials")
        );

        db.remove_attachment(&attachment.id).unwrap();
        assert!(db.get_module("che-1").unwrap().attachments.is_empty());
        assert!(matches!(
            db.remove_attachment(&attachment.id),
            Err(Error::AttachmentNotFound(_))
        ));
    }

    #[test]
    fn test_add_session_rejects_invalid() {
        let db = create_test_db();

        let mut zero = test_session(25);
        zero.duration_minutes = 0;
        assert!(matches!(db.add_session(&zero), Err(Error::InvalidSession(_))));

        let mut backwards = test_session(25);
        backwards.started_at = backwards.ended_at + Duration::minutes(5);
        assert!(matches!(
            db.add_session(&backwards),
            Err(Error::InvalidSession(_))
        ));

        assert!(db.list_sessions(&SessionFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_list_sessions_insertion_order_and_filters() {
        let db = create_test_db();

        let first = test_session(30).with_subject("physics");
        let mut second = test_session(45);
        // earlier start, logged later
        second.started_at = second.started_at - Duration::days(2);
        second.ended_at = second.ended_at - Duration::days(2);
        let third = test_session(15).with_subject("physics").with_topic("phy-1-t0");

        for session in [&first, &second, &third] {
            db.add_session(session).unwrap();
        }

        let all = db.list_sessions(&SessionFilter::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], first);
        assert_eq!(all[1].id, second.id);
        assert_eq!(all[2].topic_id.as_deref(), Some("phy-1-t0"));

        let physics = db
            .list_sessions(&SessionFilter {
                subject_id: Some("physics".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(physics.len(), 2);

        let recent = db
            .list_sessions(&SessionFilter {
                since: Some(first.started_at - Duration::days(1)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(recent.len(), 2);

        let last_two = db
            .list_sessions(&SessionFilter {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].id, second.id);
        assert_eq!(last_two[1].id, third.id);
    }

    #[test]
    fn test_planner_tasks() {
        let db = create_test_db();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        assert!(db.get_daily_plan(date).unwrap().is_none());
        assert!(matches!(
            db.toggle_task(date, "missing"),
            Err(Error::TaskNotFound(_))
        ));

        let read = db.add_task(date, "Read module 1").unwrap();
        let solve = db.add_task(date, "Solve problems").unwrap();
        db.add_task(date.succ_opt().unwrap(), "Revise").unwrap();

        assert!(db.toggle_task(date, &read.id).unwrap());
        // task exists, but not under this date
        assert!(matches!(
            db.toggle_task(date.succ_opt().unwrap(), &read.id),
            Err(Error::TaskNotFound(_))
        ));

        let plan = db.get_daily_plan(date).unwrap().unwrap();
        assert_eq!(plan.tasks.len(), 2);
        assert!(plan.tasks[0].completed);
        assert_eq!(plan.tasks[1].id, solve.id);

        db.delete_task(date, &solve.id).unwrap();
        assert!(matches!(
            db.delete_task(date, &solve.id),
            Err(Error::TaskNotFound(_))
        ));

        let planner = db.load_planner().unwrap();
        assert_eq!(planner.daily_plans.len(), 2);
        assert_eq!(planner.daily_plans[&date].tasks.len(), 1);
    }

    #[test]
    fn test_access_flag() {
        let db = create_test_db();
        assert!(!db.has_access().unwrap());
        db.grant_access().unwrap();
        assert!(db.has_access().unwrap());
        db.grant_access().unwrap();
        assert!(db.has_access().unwrap());
        db.revoke_access().unwrap();
        assert!(!db.has_access().unwrap());
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("studydash.db");
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        db.add_session(&test_session(20)).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        reopened.migrate().unwrap();
        assert_eq!(
            reopened.list_sessions(&SessionFilter::default()).unwrap().len(),
            1
        );
    }
}
