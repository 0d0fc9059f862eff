use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    #[default]
    Idle,
    Countdown,
    Racing,
    Finished,
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RaceStatus::Idle => "idle",
            RaceStatus::Countdown => "countdown",
            RaceStatus::Racing => "racing",
            RaceStatus::Finished => "finished",
        };
        f.pad(name)
    }
}

/// StateHandler tracks the race status and the countdown value. Transitions that can only be
/// requested by the race itself panic when called in the wrong status, since reaching them means
/// the race logic is broken.
#[derive(Debug)]
pub struct StateHandler {
    // parameters
    countdown_start: u32,

    // state machine variables
    status: RaceStatus,
    countdown: Option<u32>,
}

impl StateHandler {
    pub fn new(countdown_start: u32) -> StateHandler {
        if countdown_start == 0 {
            panic!("Countdown must start at 1 or higher!")
        }

        StateHandler {
            countdown_start,
            status: RaceStatus::default(),
            countdown: None,
        }
    }

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    /// is_live returns true while a race is counting down or running, i.e. while the field and
    /// the distance of the race are frozen.
    pub fn is_live(&self) -> bool {
        matches!(self.status, RaceStatus::Countdown | RaceStatus::Racing)
    }

    /// act_countdown (re)starts the countdown. Allowed from every status.
    pub fn act_countdown(&mut self) {
        self.status = RaceStatus::Countdown;
        self.countdown = Some(self.countdown_start);
    }

    /// decrement_countdown counts down by one and returns the remaining value.
    pub fn decrement_countdown(&mut self) -> u32 {
        if !matches!(self.status, RaceStatus::Countdown) {
            panic!("Tried to decrement the countdown without being in countdown state!")
        }

        let remaining = match self.countdown {
            Some(value) if value > 0 => value - 1,
            _ => panic!("Tried to decrement a countdown that already reached zero!"),
        };
        self.countdown = Some(remaining);
        remaining
    }

    /// act_racing switches from a completed countdown to racing.
    pub fn act_racing(&mut self) {
        if !matches!(self.status, RaceStatus::Countdown) || self.countdown != Some(0) {
            panic!("Tried to start racing without a completed countdown!")
        }

        self.status = RaceStatus::Racing;
        self.countdown = None;
    }

    /// act_finished ends a running race.
    pub fn act_finished(&mut self) {
        if !matches!(self.status, RaceStatus::Racing) {
            panic!("Tried to finish a race without racing!")
        }

        self.status = RaceStatus::Finished;
    }

    /// act_idle returns to idle. Allowed from every status.
    pub fn act_idle(&mut self) {
        self.status = RaceStatus::Idle;
        self.countdown = None;
    }
}
