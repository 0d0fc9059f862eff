use crate::core::boost::{pick_boost_message, BoostBoard, SpeedModel, SpeedPars};
use crate::core::config::{LapCount, RaceConfiguration, Rejection, Toggled, TrackLength};
use crate::core::placement::{self, FINISH_PROGRESS};
use crate::core::racer::{Racer, RacerCatalog, RacerId};
use crate::core::state_handler::{RaceStatus, StateHandler};
use crate::interfaces::presenter_interface::{PodiumEntry, RaceSnapshot, RacerView};
use crate::post::race_result::{RaceResult, Standing};
use helpers::general::{argsort, SortOrder};
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, info};

pub const CALLOUT_WELCOME: &str = "Pick your favorite racers, set the track, and it's time to zoom!";
pub const CALLOUT_COUNTDOWN: &str = "Engines rumbling! 3...2...1...";
pub const CALLOUT_GO: &str = "GO! Clap and cheer to make them zoom!";
pub const CALLOUT_RESET: &str = "Track reset! Pick racers and press the big button.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostEvent {
    pub racer: RacerId,
    pub message: String,
    pub token: u64,
}

/// TickOutcome reports what happened during one racing tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub boosts: Vec<BoostEvent>,
    // racers that crossed the line in this tick, in field order
    pub finishers: Vec<RacerId>,
    // set in the tick that completes the race
    pub winner: Option<RacerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Inert,
    Counting(u32),
    Go,
}

/// Race is the authoritative race state: configuration, status, per-lane progress and boosts,
/// and placements. It owns no timer; `countdown_tick` and `tick` are driven from outside.
///
/// Lanes are the racers whose progress is tracked. While a race is live (countdown or racing)
/// the lanes are the field captured at start and do not follow selection changes. Otherwise
/// they mirror the current selection.
#[derive(Debug)]
pub struct Race {
    catalog: Arc<RacerCatalog>,
    config: RaceConfiguration,
    sh: StateHandler,
    speed_model: SpeedModel,
    rng: StdRng,
    // bumped by every start and reset
    epoch: u64,
    cur_tick: u32,
    // track dimensions captured at race start
    track_length: TrackLength,
    lap_count: LapCount,
    lanes: Vec<RacerId>,
    progress: Vec<f64>,
    finish_ticks: Vec<Option<u32>>,
    boosts: BoostBoard,
    placements: Vec<RacerId>,
    callout: String,
}

impl Race {
    pub fn new(
        catalog: Arc<RacerCatalog>,
        config: RaceConfiguration,
        speed_pars: &SpeedPars,
        countdown_start: u32,
        rng: StdRng,
    ) -> anyhow::Result<Race> {
        speed_pars.validate()?;

        let lanes = config.selected().to_vec();
        let no_lanes = lanes.len();
        let mut boosts = BoostBoard::default();
        boosts.clear_lanes(no_lanes);

        Ok(Race {
            track_length: config.track_length,
            lap_count: config.lap_count,
            catalog,
            config,
            sh: StateHandler::new(countdown_start),
            speed_model: SpeedModel::new(speed_pars),
            rng,
            epoch: 0,
            cur_tick: 0,
            lanes,
            progress: vec![0.0; no_lanes],
            finish_ticks: vec![None; no_lanes],
            boosts,
            placements: Vec::new(),
            callout: CALLOUT_WELCOME.to_owned(),
        })
    }

    // ---------------------------------------------------------------------------------------------
    // COMMANDS ------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// toggle_racer adds or removes a racer from the selection. A live race keeps its field.
    pub fn toggle_racer(&mut self, id: &RacerId) -> Result<Toggled, Rejection> {
        let toggled = self.config.toggle(&self.catalog, id).map_err(|rejection| {
            info!(racer = %id, "Racer toggle rejected: {}", rejection);
            rejection
        })?;
        debug!(racer = %id, ?toggled, "Selection changed");

        if !self.sh.is_live() {
            self.resync_lanes();
        }
        self.settle();
        Ok(toggled)
    }

    /// set_track_length changes the configured track length. A live race keeps the distance it
    /// started with.
    pub fn set_track_length(&mut self, value: u32) -> Result<(), Rejection> {
        self.config.track_length = TrackLength::try_from(value)?;
        self.after_config_change();
        Ok(())
    }

    /// set_lap_count changes the configured lap count. A live race keeps the distance it started
    /// with.
    pub fn set_lap_count(&mut self, value: u32) -> Result<(), Rejection> {
        self.config.lap_count = LapCount::try_from(value)?;
        self.after_config_change();
        Ok(())
    }

    /// start_race starts the countdown of a new race and returns its epoch. Allowed from every
    /// status as long as enough racers are selected.
    pub fn start_race(&mut self) -> Result<u64, Rejection> {
        if let Err(rejection) = self.config.check_can_start() {
            info!(status = %self.sh.status(), "Race start rejected: {}", rejection);
            self.callout = rejection.to_string();
            return Err(rejection);
        }

        self.epoch += 1;
        self.track_length = self.config.track_length;
        self.lap_count = self.config.lap_count;
        self.clear_lanes();
        self.sh.act_countdown();
        self.callout = CALLOUT_COUNTDOWN.to_owned();

        info!(
            epoch = self.epoch,
            racers = self.lanes.len(),
            total_distance = self.total_distance(),
            "Race countdown started"
        );
        Ok(self.epoch)
    }

    /// reset returns to idle from every status and returns the new epoch.
    pub fn reset(&mut self) -> u64 {
        self.epoch += 1;
        self.sh.act_idle();
        self.track_length = self.config.track_length;
        self.lap_count = self.config.lap_count;
        self.clear_lanes();
        self.callout = CALLOUT_RESET.to_owned();

        info!(epoch = self.epoch, "Race reset");
        self.epoch
    }

    // ---------------------------------------------------------------------------------------------
    // TICKS ---------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// countdown_tick counts down by one. The tick that reaches zero starts the race.
    pub fn countdown_tick(&mut self) -> CountdownOutcome {
        if !matches!(self.sh.status(), RaceStatus::Countdown) {
            return CountdownOutcome::Inert;
        }

        let remaining = self.sh.decrement_countdown();
        if remaining > 0 {
            debug!(epoch = self.epoch, remaining, "Countdown");
            return CountdownOutcome::Counting(remaining);
        }

        self.sh.act_racing();
        self.callout = CALLOUT_GO.to_owned();
        info!(epoch = self.epoch, "GO!");
        CountdownOutcome::Go
    }

    /// tick advances every unfinished racer by one racing step.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !matches!(self.sh.status(), RaceStatus::Racing) {
            return outcome;
        }

        self.cur_tick += 1;
        let total_distance = self.total_distance() as f64;

        for i in 0..self.lanes.len() {
            if self.finish_ticks[i].is_some() {
                continue;
            }

            let draw = self.speed_model.draw(&mut self.rng, total_distance);

            if draw.boost_bonus.is_some() {
                let message = pick_boost_message(&mut self.rng);
                let token = self.boosts.trigger(i, message);
                outcome.boosts.push(BoostEvent {
                    racer: self.lanes[i].to_owned(),
                    message: message.to_owned(),
                    token,
                });
            }

            self.progress[i] = (self.progress[i] + draw.increment()).min(FINISH_PROGRESS);

            if placement::is_finisher(self.progress[i]) {
                self.finish_ticks[i] = Some(self.cur_tick);
                outcome.finishers.push(self.lanes[i].to_owned());
            }
        }

        placement::record_finishers(&mut self.placements, &outcome.finishers);
        debug!(
            epoch = self.epoch,
            tick = self.cur_tick,
            boosts = outcome.boosts.len(),
            finishers = outcome.finishers.len(),
            "Race tick"
        );

        if placement::race_complete(&self.placements, &self.lanes) {
            self.sh.act_finished();
            outcome.winner = placement::winner(&self.placements).cloned();

            if let Some(racer) = outcome.winner.as_ref().and_then(|id| self.catalog.get(id)) {
                self.callout = format!("{} {} zoomed to victory!", racer.emoji, racer.name);
                info!(
                    epoch = self.epoch,
                    winner = %racer.id,
                    ticks = self.cur_tick,
                    "Race finished"
                );
            }
        }

        outcome
    }

    /// expire_boost clears a boost message if it is still the one with the given token.
    pub fn expire_boost(&mut self, id: &RacerId, token: u64) -> bool {
        let expired = match self.lane_of(id) {
            Some(lane) => self.boosts.expire(lane, token),
            None => false,
        };
        debug!(racer = %id, token, expired, "Boost expiry");
        expired
    }

    // ---------------------------------------------------------------------------------------------
    // RACE PARTS ----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// clear_lanes sets the lanes to the selection with zero progress, no boosts and no
    /// placements.
    fn clear_lanes(&mut self) {
        let no_lanes = self.config.selected().len();
        self.lanes = self.config.selected().to_vec();
        self.progress = vec![0.0; no_lanes];
        self.finish_ticks = vec![None; no_lanes];
        self.boosts.clear_lanes(no_lanes);
        self.placements.clear();
        self.cur_tick = 0;
    }

    /// resync_lanes makes the lanes follow the selection, keeping the state of racers that stay.
    fn resync_lanes(&mut self) {
        let lanes = self.config.selected().to_vec();
        let old_idxs: Vec<Option<usize>> = lanes.iter().map(|id| self.lane_of(id)).collect();

        self.progress = old_idxs
            .iter()
            .map(|old_idx| old_idx.map_or(0.0, |idx| self.progress[idx]))
            .collect();
        self.finish_ticks = old_idxs
            .iter()
            .map(|old_idx| old_idx.and_then(|idx| self.finish_ticks[idx]))
            .collect();
        self.boosts.remap(&old_idxs);
        self.lanes = lanes;
    }

    fn after_config_change(&mut self) {
        debug!(
            track_length = self.config.track_length.get(),
            lap_count = self.config.lap_count.get(),
            live = self.sh.is_live(),
            "Track configuration changed"
        );
        self.settle();
    }

    /// settle applies the automatic transitions that follow from the current state.
    fn settle(&mut self) {
        if matches!(self.sh.status(), RaceStatus::Finished) && self.placements.is_empty() {
            info!(epoch = self.epoch, "Finished race without placements, back to idle");
            self.sh.act_idle();
        }
    }

    fn lane_of(&self, id: &RacerId) -> Option<usize> {
        self.lanes.iter().position(|x| x == id)
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn status(&self) -> RaceStatus {
        self.sh.status()
    }

    pub fn countdown(&self) -> Option<u32> {
        self.sh.countdown()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cur_tick(&self) -> u32 {
        self.cur_tick
    }

    pub fn callout(&self) -> &str {
        &self.callout
    }

    pub fn lanes(&self) -> &[RacerId] {
        &self.lanes
    }

    pub fn placements(&self) -> &[RacerId] {
        &self.placements
    }

    pub fn winner(&self) -> Option<&RacerId> {
        placement::winner(&self.placements)
    }

    /// is_complete tells whether every racer of the field has been placed.
    pub fn is_complete(&self) -> bool {
        placement::race_complete(&self.placements, &self.lanes)
    }

    pub fn podium(&self) -> Vec<&Racer> {
        placement::podium(&self.placements, &self.lanes, &self.catalog)
    }

    /// total_distance returns the distance of the current race, or of the configured track while
    /// idle.
    pub fn total_distance(&self) -> u32 {
        match self.sh.status() {
            RaceStatus::Idle => self.config.total_distance(),
            _ => self.track_length.get() * self.lap_count.get(),
        }
    }

    pub fn progress_of(&self, id: &RacerId) -> Option<f64> {
        self.lane_of(id).map(|lane| self.progress[lane])
    }

    pub fn boost_of(&self, id: &RacerId) -> Option<&str> {
        self.lane_of(id)
            .and_then(|lane| self.boosts.get(lane))
            .map(|boost| boost.message.as_str())
    }

    pub fn any_boost_active(&self) -> bool {
        self.boosts.any_active()
    }

    pub fn snapshot(&self, time_ms: u64) -> RaceSnapshot {
        let winner = self.winner().cloned();

        let racers = self
            .lanes
            .iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let racer = self.catalog.get(id)?;
                Some(RacerView {
                    id: id.to_owned(),
                    name: racer.name.to_owned(),
                    emoji: racer.emoji.to_owned(),
                    accent: racer.accent,
                    track_color: racer.track_color,
                    progress: self.progress[i],
                    boost: self.boosts.get(i).map(|boost| boost.message.to_owned()),
                    is_winner: winner.as_ref() == Some(id),
                    place: self.placements.iter().position(|x| x == id).map(|p| p + 1),
                })
            })
            .collect();

        // placed racers in finish order, then the others by progress
        let mut standings: Vec<RacerId> = self
            .placements
            .iter()
            .filter(|&id| self.lanes.contains(id))
            .cloned()
            .collect();
        standings.extend(
            argsort(&self.progress, SortOrder::Descending)
                .into_iter()
                .map(|idx| &self.lanes[idx])
                .filter(|&id| !self.placements.contains(id))
                .cloned(),
        );

        let podium = self
            .podium()
            .into_iter()
            .map(|racer| PodiumEntry {
                id: racer.id.to_owned(),
                name: racer.name.to_owned(),
                emoji: racer.emoji.to_owned(),
                lore: racer.lore.to_owned(),
            })
            .collect();

        RaceSnapshot {
            status: self.sh.status(),
            countdown: self.sh.countdown(),
            racers,
            standings,
            placements: self.placements.to_owned(),
            winner,
            podium,
            callout: self.callout.to_owned(),
            selected: self.config.selected().to_vec(),
            track_length: self.config.track_length.get(),
            lap_count: self.config.lap_count.get(),
            total_distance: self.total_distance(),
            epoch: self.epoch,
            time_ms,
        }
    }

    pub fn get_race_result(&self) -> RaceResult {
        let standings = self
            .placements
            .iter()
            .enumerate()
            .map(|(i, id)| Standing {
                place: i as u32 + 1,
                racer_id: id.to_owned(),
                name: self
                    .catalog
                    .get(id)
                    .map_or_else(|| id.to_string(), |racer| racer.name.to_owned()),
                finish_tick: self.lane_of(id).and_then(|lane| self.finish_ticks[lane]),
            })
            .collect();

        let unfinished = self
            .lanes
            .iter()
            .filter(|&id| !self.placements.contains(id))
            .cloned()
            .collect();

        RaceResult {
            track_length: self.track_length.get(),
            lap_count: self.lap_count.get(),
            total_distance: self.track_length.get() * self.lap_count.get(),
            ticks: self.cur_tick,
            standings,
            unfinished,
        }
    }
}
