//! Debounces stillness into a single "gesture complete" trigger.
//!
//! There is at most one pending deadline. The driving loop owns the clock and
//! calls [`PauseScheduler::poll`] to find out whether the deadline has passed.

use std::time::{Duration, Instant};

use crate::config::PauseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Armed,
    Waiting { deadline: Instant },
}

pub struct PauseScheduler {
    pause: Duration,
    state: PauseState,
}

impl PauseScheduler {
    pub fn new(pause: Duration) -> Self {
        Self {
            pause,
            state: PauseState::Armed,
        }
    }

    pub fn from_config(config: &PauseConfig) -> Self {
        Self::new(Duration::from_millis(config.pause_ms))
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            PauseState::Waiting { deadline } => Some(deadline),
            PauseState::Armed => None,
        }
    }

    /// Armed → Waiting. Already waiting: no-op, returns false.
    pub fn arm(&mut self, now: Instant) -> bool {
        match self.state {
            PauseState::Armed => {
                self.state = PauseState::Waiting {
                    deadline: now + self.pause,
                };
                true
            }
            PauseState::Waiting { .. } => false,
        }
    }

    /// Waiting → Armed without firing. Returns whether a trigger was pending.
    pub fn cancel(&mut self) -> bool {
        let pending = matches!(self.state, PauseState::Waiting { .. });
        self.state = PauseState::Armed;
        pending
    }

    /// Fires (once) if the deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            PauseState::Waiting { deadline } if now >= deadline => {
                self.state = PauseState::Armed;
                true
            }
            _ => false,
        }
    }
}
