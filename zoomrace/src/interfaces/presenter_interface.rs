use crate::core::config::Rejection;
use crate::core::racer::RacerId;
use crate::core::state_handler::RaceStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// RacerView is the per-racer part of a snapshot, i.e. everything a renderer needs to draw one
/// lane of the track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RacerView {
    pub id: RacerId,
    pub name: String,
    pub emoji: String,
    pub accent: RgbColor,
    pub track_color: RgbColor,
    pub progress: f64,
    pub boost: Option<String>,
    pub is_winner: bool,
    // 1-based finishing position, None while still racing
    pub place: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodiumEntry {
    pub id: RacerId,
    pub name: String,
    pub emoji: String,
    pub lore: String,
}

/// RaceSnapshot is the read-only view the presentation layer renders. It is rebuilt from the
/// race on every change and never handed back to the simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaceSnapshot {
    pub status: RaceStatus,
    pub countdown: Option<u32>,
    pub racers: Vec<RacerView>,
    // racer ids ordered by current progress, leader first
    pub standings: Vec<RacerId>,
    pub placements: Vec<RacerId>,
    pub winner: Option<RacerId>,
    pub podium: Vec<PodiumEntry>,
    pub callout: String,
    pub selected: Vec<RacerId>,
    pub track_length: u32,
    pub lap_count: u32,
    pub total_distance: u32,
    pub epoch: u64,
    pub time_ms: u64,
}

impl RaceSnapshot {
    pub fn racer(&self, id: &RacerId) -> Option<&RacerView> {
        self.racers.iter().find(|view| &view.id == id)
    }
}

/// Commands issued by the controller. `Shutdown` is only understood by the real-time driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleRacer(RacerId),
    SetTrackLength(u32),
    SetLapCount(u32),
    StartRace,
    Reset,
    Shutdown,
}

/// Signals are one-off notifications for the presenter (banners, sounds, confetti). The
/// snapshot alone is enough to draw the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    CountdownStarted { epoch: u64 },
    CountdownTick(u32),
    Go,
    Boost { racer: RacerId, message: String },
    BoostCleared(RacerId),
    Finished { winner: RacerId },
    Reset,
    Rejected(Rejection),
}

/// RaceUpdate is what the real-time driver sends to the presenter after every change.
#[derive(Debug, Clone, Default)]
pub struct RaceUpdate {
    pub snapshot: RaceSnapshot,
    pub signals: Vec<Signal>,
}
