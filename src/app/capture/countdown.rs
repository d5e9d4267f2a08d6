// SPDX-License-Identifier: GPL-3.0-only

//! Capture countdown
//!
//! Pure state: the controller schedules ticks, this type decides what each
//! tick means. Every run gets its own id so a tick from a cancelled run can
//! never drive a newer one.

use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Inactive,
    Counting { remaining: u32, run: Uuid },
}

/// Result of [`Countdown::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStart {
    /// A run is already active; nothing changed
    AlreadyRunning,
    /// Configured start value is zero: grab right away
    Immediate,
    /// New run; schedule its first tick
    Started { run: Uuid },
}

/// Result of [`Countdown::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Tick belongs to a run that is no longer active
    Stale,
    /// Still counting; schedule another tick
    Continue { remaining: u32 },
    /// Terminal tick: grab the frame. The countdown is already inactive.
    Fire,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    start_value: u32,
    state: CountdownState,
}

impl Countdown {
    pub fn new(start_value: u32) -> Self {
        Self {
            start_value,
            state: CountdownState::Inactive,
        }
    }

    pub fn start(&mut self) -> CountdownStart {
        if self.is_active() {
            debug!("Countdown already running");
            return CountdownStart::AlreadyRunning;
        }
        if self.start_value == 0 {
            return CountdownStart::Immediate;
        }

        let run = Uuid::new_v4();
        info!(seconds = self.start_value, "Starting capture countdown");
        self.state = CountdownState::Counting {
            remaining: self.start_value,
            run,
        };
        CountdownStart::Started { run }
    }

    pub fn tick(&mut self, run: Uuid) -> TickOutcome {
        match self.state {
            CountdownState::Counting {
                remaining,
                run: active,
            } if active == run => {
                if remaining <= 1 {
                    info!("Countdown complete - capturing");
                    self.state = CountdownState::Inactive;
                    TickOutcome::Fire
                } else {
                    let remaining = remaining - 1;
                    info!(remaining, "Countdown tick");
                    self.state = CountdownState::Counting { remaining, run };
                    TickOutcome::Continue { remaining }
                }
            }
            _ => {
                debug!(%run, "Ignoring tick from an inactive countdown");
                TickOutcome::Stale
            }
        }
    }

    /// Cancel any run; returns whether one was active
    pub fn reset(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            info!("Countdown aborted");
        }
        self.state = CountdownState::Inactive;
        was_active
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CountdownState::Counting { .. })
    }

    /// Value to display, if counting
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            CountdownState::Counting { remaining, .. } => Some(remaining),
            CountdownState::Inactive => None,
        }
    }

    pub fn current_run(&self) -> Option<Uuid> {
        match self.state {
            CountdownState::Counting { run, .. } => Some(run),
            CountdownState::Inactive => None,
        }
    }
}
