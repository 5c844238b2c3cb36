//! Focus timer state machine
//!
//! The timer never reads the clock itself. Every transition takes the
//! current instant, so a caller can drive it from a real clock, a test, or a
//! replay.
//!
//! ```text
//! Idle --start--> Focusing --tick (elapsed)--> Break --tick (elapsed)--> Idle
//!                    |                          (or Idle when auto_break is off)
//!                    +--stop--> Idle (nothing logged)
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::config::TimerConfig;
use crate::error::{Error, Result};
use crate::types::StudySession;

/// Current timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Focusing,
    Break,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Focusing => "focusing",
            TimerPhase::Break => "break",
        }
    }
}

/// Result of [`FocusTimer::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Nothing is running
    Idle,
    /// A phase is in progress (or paused) with this much time left
    Running { remaining: Duration },
    /// A focus interval finished; the session should be logged
    FocusComplete(StudySession),
    /// A break finished and the timer is idle again
    BreakComplete,
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    Running { deadline: DateTime<Utc> },
    Paused { remaining: Duration },
}

/// Countdown timer for focus intervals and breaks.
#[derive(Debug, Clone)]
pub struct FocusTimer {
    focus_minutes: u32,
    break_minutes: u32,
    auto_break: bool,
    subject_id: Option<String>,
    module_id: Option<String>,
    topic_id: Option<String>,
    phase: TimerPhase,
    clock: Option<Clock>,
}

impl FocusTimer {
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            focus_minutes: config.default_minutes,
            break_minutes: config.break_minutes,
            auto_break: config.auto_break,
            subject_id: None,
            module_id: None,
            topic_id: None,
            phase: TimerPhase::Idle,
            clock: None,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn focus_minutes(&self) -> u32 {
        self.focus_minutes
    }

    pub fn break_minutes(&self) -> u32 {
        self.break_minutes
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.clock, Some(Clock::Paused { .. }))
    }

    /// Change the focus length. Only allowed while idle.
    pub fn set_duration(&mut self, minutes: u32) -> Result<()> {
        self.ensure_idle("change the duration")?;
        if minutes == 0 {
            return Err(Error::Timer("focus duration must be at least 1 minute".to_string()));
        }
        self.focus_minutes = minutes;
        Ok(())
    }

    pub fn set_auto_break(&mut self, auto_break: bool) {
        self.auto_break = auto_break;
    }

    /// Scope the next completed session. Only allowed while idle.
    pub fn select(
        &mut self,
        subject_id: Option<String>,
        module_id: Option<String>,
        topic_id: Option<String>,
    ) -> Result<()> {
        self.ensure_idle("change the selection")?;
        self.subject_id = subject_id;
        self.module_id = module_id;
        self.topic_id = topic_id;
        Ok(())
    }

    /// Begin a focus interval.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_idle("start")?;
        self.phase = TimerPhase::Focusing;
        self.clock = Some(Clock::Running {
            deadline: now + minutes(self.focus_minutes),
        });
        tracing::debug!(minutes = self.focus_minutes, "Focus started");
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.clock {
            Some(Clock::Running { deadline }) => {
                let remaining = (deadline - now).max(Duration::zero());
                self.clock = Some(Clock::Paused { remaining });
                Ok(())
            }
            Some(Clock::Paused { .. }) => Err(Error::Timer("timer is already paused".to_string())),
            None => Err(Error::Timer("timer is not running".to_string())),
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.clock {
            Some(Clock::Paused { remaining }) => {
                self.clock = Some(Clock::Running {
                    deadline: now + remaining,
                });
                Ok(())
            }
            Some(Clock::Running { .. }) => Err(Error::Timer("timer is not paused".to_string())),
            None => Err(Error::Timer("timer is not running".to_string())),
        }
    }

    /// Abandon the current phase without logging anything.
    pub fn stop(&mut self) {
        if self.phase != TimerPhase::Idle {
            tracing::debug!(phase = self.phase.as_str(), "Timer stopped");
        }
        self.phase = TimerPhase::Idle;
        self.clock = None;
    }

    /// Time left in the current phase. Idle reports the full focus length.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.clock {
            None => minutes(self.focus_minutes),
            Some(Clock::Paused { remaining }) => remaining,
            Some(Clock::Running { deadline }) => (deadline - now).max(Duration::zero()),
        }
    }

    /// Advance the state machine to `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerEvent {
        let deadline = match self.clock {
            None => return TimerEvent::Idle,
            Some(Clock::Paused { remaining }) => return TimerEvent::Running { remaining },
            Some(Clock::Running { deadline }) => deadline,
        };

        if now < deadline {
            return TimerEvent::Running {
                remaining: deadline - now,
            };
        }

        match self.phase {
            TimerPhase::Focusing => {
                let mut session = StudySession::ending_at(now, self.focus_minutes);
                session.subject_id = self.subject_id.clone();
                session.module_id = self.module_id.clone();
                session.topic_id = self.topic_id.clone();

                if self.auto_break {
                    self.phase = TimerPhase::Break;
                    self.clock = Some(Clock::Running {
                        deadline: now + minutes(self.break_minutes),
                    });
                } else {
                    self.stop();
                }
                tracing::info!(minutes = self.focus_minutes, "Focus interval complete");
                TimerEvent::FocusComplete(session)
            }
            TimerPhase::Break => {
                self.stop();
                TimerEvent::BreakComplete
            }
            TimerPhase::Idle => TimerEvent::Idle,
        }
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        if self.phase == TimerPhase::Idle {
            Ok(())
        } else {
            Err(Error::Timer(format!(
                "cannot {} while {}",
                action,
                self.phase.as_str()
            )))
        }
    }
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(m as i64)
}
