use crate::core::racer::RacerId;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "zoomy",
    about = "A race simulator for kids, played in the terminal"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set number of headless race runs (if larger than 1, the races are simulated without
    /// real-time output and only the win statistics are printed)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to the session parameter file (OPTIONAL: if not set, the built-in racers and the
    /// default session are used)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor of the live race
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set seed of the random number generator (OPTIONAL: random if not set)
    #[clap(short, long)]
    pub seed: Option<u64>,

    /// Set the racers of the race, e.g. --racers turbo-turtle,dizzy-dino
    #[clap(long, value_delimiter = ',')]
    pub racers: Option<Vec<RacerId>>,

    /// Set track length in fun-meters (60, 80, 100, 120 or 140)
    #[clap(short, long)]
    pub track_length: Option<u32>,

    /// Set lap count (1, 2, 3 or 5)
    #[clap(short, long)]
    pub laps: Option<u32>,

    /// Set path of the result file (OPTIONAL: output/last_race.txt if not set)
    #[clap(short, long)]
    pub output_path: Option<PathBuf>,
}
