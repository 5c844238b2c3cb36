//! Study analytics
//!
//! Pure functions over session and syllabus snapshots:
//! - [`metrics`]: the individual scores (consistency, focus, momentum, ...)
//! - [`progress`]: syllabus completion counts and daily time totals
//! - [`report`]: every metric for one snapshot in a single serializable struct
//!
//! Nothing here touches the database or keeps state between calls. Callers
//! load owned snapshots from [`crate::Database`] and pass them in.

pub mod metrics;
pub mod progress;
pub mod report;

pub use metrics::{
    balance_score, burn_risk, completion_percent, confidence_score, consistency_score,
    efficiency_index, focus_quality, hourly_minutes, momentum_index, peak_study_label,
    peak_study_time, syllabus_prediction, topic_revisit_rate, weak_modules, weekday_data, BurnRisk,
    BurnStatus, FocusQuality, FocusRating, Momentum, StudyBand, SyllabusPrediction, Trend,
    WeekdayData, UNKNOWN_DAYS_LEFT,
};
pub use progress::{minutes_on_day, SyllabusProgress};
pub use report::{StudyReport, SubjectTime};
