//! Daily planner helpers.

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{DailyPlan, PlannerState};

impl DailyPlan {
    /// A plan with no tasks.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            tasks: Vec::new(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Rounded percentage of completed tasks (0 for an empty plan).
    pub fn progress(&self) -> u32 {
        if self.tasks.is_empty() {
            return 0;
        }
        (self.completed_count() as f64 / self.tasks.len() as f64 * 100.0).round() as u32
    }
}

impl PlannerState {
    /// The stored plan for `date`, or an empty one.
    pub fn plan_for(&self, date: NaiveDate) -> DailyPlan {
        self.daily_plans
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyPlan::empty(date))
    }

    /// Plans for each day of the week containing `date`, Monday first.
    pub fn week_of(&self, date: NaiveDate) -> Vec<DailyPlan> {
        week_dates(date)
            .into_iter()
            .map(|d| self.plan_for(d))
            .collect()
    }
}

/// The Monday-to-Sunday week containing `today`.
pub fn week_dates(today: NaiveDate) -> [NaiveDate; 7] {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}
