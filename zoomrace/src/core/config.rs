use crate::core::racer::{RacerCatalog, RacerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_RACERS: usize = 2;
pub const MAX_RACERS: usize = 4;

pub const TRACK_LENGTH_OPTIONS: [u32; 5] = [60, 80, 100, 120, 140];
pub const LAP_COUNT_OPTIONS: [u32; 4] = [1, 2, 3, 5];

/// Rejection is returned for commands that are invalid in the current state. The display text
/// is meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Pick at least {min} racers to make it exciting!")]
    NotEnoughRacers { min: usize },
    #[error("Only {max} racers fit on the track at once!")]
    TooManyRacers { max: usize },
    #[error("There is no racer called {0}!")]
    UnknownRacer(RacerId),
    #[error("Track length must be 60, 80, 100, 120 or 140 fun-meters, not {0}!")]
    InvalidTrackLength(u32),
    #[error("Lap count must be 1, 2, 3 or 5, not {0}!")]
    InvalidLapCount(u32),
}

/// TrackLength is a track length in fun-meters, restricted to TRACK_LENGTH_OPTIONS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TrackLength(u32);

impl TrackLength {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for TrackLength {
    fn default() -> Self {
        TrackLength(100)
    }
}

impl TryFrom<u32> for TrackLength {
    type Error = Rejection;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if TRACK_LENGTH_OPTIONS.contains(&value) {
            Ok(TrackLength(value))
        } else {
            Err(Rejection::InvalidTrackLength(value))
        }
    }
}

impl From<TrackLength> for u32 {
    fn from(track_length: TrackLength) -> Self {
        track_length.0
    }
}

/// LapCount is the number of laps of a race, restricted to LAP_COUNT_OPTIONS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct LapCount(u32);

impl LapCount {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for LapCount {
    fn default() -> Self {
        LapCount(2)
    }
}

impl TryFrom<u32> for LapCount {
    type Error = Rejection;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if LAP_COUNT_OPTIONS.contains(&value) {
            Ok(LapCount(value))
        } else {
            Err(Rejection::InvalidLapCount(value))
        }
    }
}

impl From<LapCount> for u32 {
    fn from(lap_count: LapCount) -> Self {
        lap_count.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// RaceConfiguration holds what the user picked: racers, track length and lap count. The
/// selection is kept in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceConfiguration {
    selected: Vec<RacerId>,
    pub track_length: TrackLength,
    pub lap_count: LapCount,
}

impl RaceConfiguration {
    /// new creates a configuration from an initial selection. Unknown ids and ids beyond
    /// MAX_RACERS are rejected.
    pub fn new(
        catalog: &RacerCatalog,
        selected: &[RacerId],
        track_length: TrackLength,
        lap_count: LapCount,
    ) -> Result<RaceConfiguration, Rejection> {
        let mut config = RaceConfiguration {
            selected: Vec::with_capacity(MAX_RACERS),
            track_length,
            lap_count,
        };

        for id in selected.iter() {
            if !config.is_selected(id) {
                config.toggle(catalog, id)?;
            }
        }

        Ok(config)
    }

    /// default_for selects the first three racers of the catalog on a 100 fun-meter, 2 lap
    /// track.
    pub fn default_for(catalog: &RacerCatalog) -> RaceConfiguration {
        let mut selected = catalog.first_ids(3);
        selected.truncate(MAX_RACERS);

        RaceConfiguration {
            selected,
            track_length: TrackLength::default(),
            lap_count: LapCount::default(),
        }
    }

    pub fn selected(&self) -> &[RacerId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &RacerId) -> bool {
        self.selected.contains(id)
    }

    /// toggle adds or removes a racer. Adding beyond MAX_RACERS leaves the selection unchanged.
    pub fn toggle(&mut self, catalog: &RacerCatalog, id: &RacerId) -> Result<Toggled, Rejection> {
        if let Some(idx) = self.selected.iter().position(|x| x == id) {
            self.selected.remove(idx);
            return Ok(Toggled::Removed);
        }

        let catalog_idx = catalog
            .position(id)
            .ok_or_else(|| Rejection::UnknownRacer(id.to_owned()))?;

        if self.selected.len() >= MAX_RACERS {
            return Err(Rejection::TooManyRacers { max: MAX_RACERS });
        }

        // keep catalog order
        let insert_idx = self
            .selected
            .iter()
            .position(|x| catalog.position(x).map_or(false, |pos| pos > catalog_idx))
            .unwrap_or(self.selected.len());
        self.selected.insert(insert_idx, id.to_owned());

        Ok(Toggled::Added)
    }

    pub fn check_can_start(&self) -> Result<(), Rejection> {
        if self.selected.len() < MIN_RACERS {
            Err(Rejection::NotEnoughRacers { min: MIN_RACERS })
        } else {
            Ok(())
        }
    }

    /// total_distance returns track length times lap count in fun-meters.
    pub fn total_distance(&self) -> u32 {
        self.track_length.get() * self.lap_count.get()
    }
}
