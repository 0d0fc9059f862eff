use crate::core::config::Rejection;
use crate::core::race::{CountdownOutcome, Race};
use crate::core::racer::RacerCatalog;
use crate::core::state_handler::RaceStatus;
use crate::core::timers::{DueTimer, TimerKey, TimerSet};
use crate::interfaces::presenter_interface::{Command, RaceSnapshot, Signal};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SessionPars;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// * `countdown_start` - Countdown value set by a race start
/// * `countdown_interval_ms` - (ms) Time between two countdown ticks
/// * `racing_interval_ms` - (ms) Time between two racing ticks
/// * `boost_display_ms` - (ms) Time a boost message stays visible
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimingPars {
    #[serde(default = "default_countdown_start")]
    pub countdown_start: u32,
    #[serde(default = "default_countdown_interval_ms")]
    pub countdown_interval_ms: u64,
    #[serde(default = "default_racing_interval_ms")]
    pub racing_interval_ms: u64,
    #[serde(default = "default_boost_display_ms")]
    pub boost_display_ms: u64,
}

fn default_countdown_start() -> u32 {
    3
}

fn default_countdown_interval_ms() -> u64 {
    1000
}

fn default_racing_interval_ms() -> u64 {
    180
}

fn default_boost_display_ms() -> u64 {
    1600
}

impl Default for TimingPars {
    fn default() -> Self {
        TimingPars {
            countdown_start: default_countdown_start(),
            countdown_interval_ms: default_countdown_interval_ms(),
            racing_interval_ms: default_racing_interval_ms(),
            boost_display_ms: default_boost_display_ms(),
        }
    }
}

impl TimingPars {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.countdown_start == 0 {
            anyhow::bail!("Countdown must start at 1 or higher!")
        }
        if self.countdown_interval_ms == 0 || self.racing_interval_ms == 0 {
            anyhow::bail!(
                "Tick intervals must be positive, but are {}ms (countdown) and {}ms (racing)!",
                self.countdown_interval_ms,
                self.racing_interval_ms
            )
        }
        Ok(())
    }
}

/// make_rng returns a seeded random number generator, or one seeded from the OS if no seed is
/// given.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// RaceSession hosts a race on a millisecond timeline. Commands are applied immediately, time
/// only passes through `advance` and `advance_to`, which fire the due timers in deadline order.
/// The session itself never looks at a wall clock.
#[derive(Debug)]
pub struct RaceSession {
    race: Race,
    timers: TimerSet,
    timing: TimingPars,
    now_ms: u64,
    // bumped by every applied command and every timer that was not stale
    revision: u64,
}

impl RaceSession {
    pub fn new(race: Race, timing: TimingPars) -> RaceSession {
        RaceSession {
            race,
            timers: TimerSet::new(),
            timing,
            now_ms: 0,
            revision: 0,
        }
    }

    /// from_pars creates a session (catalog, configuration, race) from the session parameters.
    pub fn from_pars(session_pars: &SessionPars, rng: StdRng) -> anyhow::Result<RaceSession> {
        session_pars.validate()?;

        let catalog: Arc<RacerCatalog> = Arc::new(session_pars.build_catalog()?);
        let config = session_pars.build_configuration(&catalog)?;
        let race = Race::new(
            catalog,
            config,
            &session_pars.speed,
            session_pars.timing.countdown_start,
            rng,
        )?;

        Ok(RaceSession::new(race, session_pars.timing.to_owned()))
    }

    // ---------------------------------------------------------------------------------------------
    // COMMANDS ------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// apply executes a controller command at the current time and returns the resulting
    /// signals.
    pub fn apply(&mut self, command: Command) -> Result<Vec<Signal>, Rejection> {
        let mut signals = Vec::new();

        match command {
            Command::ToggleRacer(id) => {
                self.race.toggle_racer(&id)?;
            }
            Command::SetTrackLength(value) => self.race.set_track_length(value)?,
            Command::SetLapCount(value) => self.race.set_lap_count(value)?,
            Command::StartRace => {
                let epoch = self.race.start_race()?;
                self.timers.clear();
                self.timers.schedule(
                    TimerKey::Countdown,
                    self.now_ms + self.timing.countdown_interval_ms,
                    epoch,
                    0,
                );
                signals.push(Signal::CountdownStarted { epoch });
            }
            Command::Reset => {
                self.race.reset();
                self.timers.clear();
                signals.push(Signal::Reset);
            }
            Command::Shutdown => return Ok(signals),
        }

        self.revision += 1;
        Ok(signals)
    }

    // ---------------------------------------------------------------------------------------------
    // TIME ----------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// advance moves the clock forward by delta_ms.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<Signal> {
        self.advance_to(self.now_ms + delta_ms)
    }

    /// advance_to moves the clock to target_ms, firing every timer that becomes due on the way.
    /// Timers scheduled while firing are fired as well if they are due before target_ms. The
    /// clock never moves backwards.
    pub fn advance_to(&mut self, target_ms: u64) -> Vec<Signal> {
        let mut signals = Vec::new();

        while let Some(due) = self.timers.pop_due(target_ms) {
            self.now_ms = self.now_ms.max(due.deadline_ms);
            self.fire(due, &mut signals);
        }
        self.now_ms = self.now_ms.max(target_ms);

        signals
    }

    fn fire(&mut self, due: DueTimer, signals: &mut Vec<Signal>) {
        if due.epoch != self.race.epoch() {
            debug!(
                key = ?due.key,
                timer_epoch = due.epoch,
                epoch = self.race.epoch(),
                "Stale timer ignored"
            );
            return;
        }
        self.revision += 1;

        match due.key {
            TimerKey::Countdown => match self.race.countdown_tick() {
                CountdownOutcome::Inert => {}
                CountdownOutcome::Counting(remaining) => {
                    self.timers.schedule(
                        TimerKey::Countdown,
                        due.deadline_ms + self.timing.countdown_interval_ms,
                        due.epoch,
                        0,
                    );
                    signals.push(Signal::CountdownTick(remaining));
                }
                CountdownOutcome::Go => {
                    self.timers.schedule(
                        TimerKey::Racing,
                        due.deadline_ms + self.timing.racing_interval_ms,
                        due.epoch,
                        0,
                    );
                    signals.push(Signal::Go);
                }
            },
            TimerKey::Racing => {
                let outcome = self.race.tick();

                for boost in outcome.boosts.into_iter() {
                    self.timers.schedule(
                        TimerKey::BoostExpiry(boost.racer.to_owned()),
                        due.deadline_ms + self.timing.boost_display_ms,
                        due.epoch,
                        boost.token,
                    );
                    signals.push(Signal::Boost {
                        racer: boost.racer,
                        message: boost.message,
                    });
                }

                if let Some(winner) = outcome.winner {
                    signals.push(Signal::Finished { winner });
                } else if matches!(self.race.status(), RaceStatus::Racing) {
                    self.timers.schedule(
                        TimerKey::Racing,
                        due.deadline_ms + self.timing.racing_interval_ms,
                        due.epoch,
                        0,
                    );
                }
            }
            TimerKey::BoostExpiry(racer) => {
                if self.race.expire_boost(&racer, due.token) {
                    signals.push(Signal::BoostCleared(racer));
                }
            }
        }
    }

    /// run_race starts a race and runs it on the virtual clock until it is finished. Returns an
    /// error if the race cannot be started or is not finished after max_duration_ms.
    pub fn run_race(&mut self, max_duration_ms: u64) -> anyhow::Result<RaceResult> {
        self.apply(Command::StartRace)?;
        let t_limit = self.now_ms + max_duration_ms;

        while !self.race.is_complete() {
            let next_deadline = match self.timers.next_deadline() {
                Some(deadline) if deadline <= t_limit => deadline,
                _ => anyhow::bail!(
                    "Race did not finish within {}ms (status {})!",
                    max_duration_ms,
                    self.race.status()
                ),
            };
            self.advance_to(next_deadline);
        }

        info!(
            epoch = self.race.epoch(),
            ticks = self.race.cur_tick(),
            time_ms = self.now_ms,
            "Race run finished"
        );
        Ok(self.race.get_race_result())
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// revision changes whenever the snapshot may have changed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn race(&self) -> &Race {
        &self.race
    }

    pub fn timing(&self) -> &TimingPars {
        &self.timing
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        self.race.snapshot(self.now_ms)
    }
}
