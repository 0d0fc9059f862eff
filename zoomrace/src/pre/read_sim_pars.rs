use crate::core::boost::SpeedPars;
use crate::core::config::{LapCount, RaceConfiguration, TrackLength};
use crate::core::racer::{RacerCatalog, RacerId, RacerPars};
use crate::core::session::TimingPars;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// SessionPars is used to store all parameters of a race session. Every field is optional in the
/// parameter file.
///
/// * `racers` - Racer catalog, the built-in catalog is used if empty
/// * `selected` - Initial selection, the first three catalog racers if not set
/// * `track_length` - (fun-meters) Initial track length
/// * `lap_count` - Initial lap count
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionPars {
    #[serde(default)]
    pub racers: Vec<RacerPars>,
    #[serde(default)]
    pub selected: Option<Vec<RacerId>>,
    #[serde(default = "default_track_length")]
    pub track_length: u32,
    #[serde(default = "default_lap_count")]
    pub lap_count: u32,
    #[serde(default)]
    pub timing: TimingPars,
    #[serde(default)]
    pub speed: SpeedPars,
}

fn default_track_length() -> u32 {
    TrackLength::default().get()
}

fn default_lap_count() -> u32 {
    LapCount::default().get()
}

impl Default for SessionPars {
    fn default() -> Self {
        SessionPars {
            racers: Vec::new(),
            selected: None,
            track_length: default_track_length(),
            lap_count: default_lap_count(),
            timing: TimingPars::default(),
            speed: SpeedPars::default(),
        }
    }
}

impl SessionPars {
    /// validate checks the parameters that cannot be checked during deserialization.
    pub fn validate(&self) -> anyhow::Result<()> {
        TrackLength::try_from(self.track_length).context("Invalid session parameters!")?;
        LapCount::try_from(self.lap_count).context("Invalid session parameters!")?;
        self.timing
            .validate()
            .context("Invalid timing parameters!")?;
        self.speed.validate().context("Invalid speed parameters!")?;
        Ok(())
    }

    /// build_catalog returns the configured racer catalog or the built-in one.
    pub fn build_catalog(&self) -> anyhow::Result<RacerCatalog> {
        if self.racers.is_empty() {
            Ok(RacerCatalog::builtin())
        } else {
            RacerCatalog::new(&self.racers).context("Invalid racer catalog!")
        }
    }

    /// build_configuration returns the initial race configuration for the catalog.
    pub fn build_configuration(&self, catalog: &RacerCatalog) -> anyhow::Result<RaceConfiguration> {
        let track_length = TrackLength::try_from(self.track_length)?;
        let lap_count = LapCount::try_from(self.lap_count)?;

        let config = match &self.selected {
            Some(selected) => RaceConfiguration::new(catalog, selected, track_length, lap_count)
                .context("Invalid initial racer selection!")?,
            None => {
                let mut config = RaceConfiguration::default_for(catalog);
                config.track_length = track_length;
                config.lap_count = lap_count;
                config
            }
        };

        Ok(config)
    }
}

/// read_session_pars reads the JSON file and decodes the JSON string into the session
/// parameters struct.
pub fn read_session_pars(filepath: &Path) -> anyhow::Result<SessionPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.display()
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.display()
    ))?;
    Ok(pars)
}
