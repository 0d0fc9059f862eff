use crate::core::racer::RacerId;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;

/// Standing is one line of the final classification.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Standing {
    pub place: u32,
    pub racer_id: RacerId,
    pub name: String,
    // racing tick in which the racer crossed the line
    pub finish_tick: Option<u32>,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RaceResult {
    pub track_length: u32,
    pub lap_count: u32,
    pub total_distance: u32,
    pub ticks: u32,
    pub standings: Vec<Standing>,
    pub unfinished: Vec<RacerId>,
}

impl RaceResult {
    pub fn winner(&self) -> Option<&RacerId> {
        self.standings.first().map(|standing| &standing.racer_id)
    }

    /// format_standings returns the classification as printable text.
    pub fn format_standings(&self, tick_ms: u64) -> anyhow::Result<String> {
        let mut content = String::new();

        writeln!(
            &mut content,
            "RESULT: {} fun-meters x {} {} = {} fun-meters, {} ticks",
            self.track_length,
            self.lap_count,
            if self.lap_count == 1 { "lap" } else { "laps" },
            self.total_distance,
            self.ticks
        )?;
        writeln!(&mut content, "place, racer, finish tick, finish time")?;

        for standing in self.standings.iter() {
            match standing.finish_tick {
                Some(tick) => writeln!(
                    &mut content,
                    "{:5}, {:<16}, {:11}, {:9.2}s",
                    standing.place,
                    standing.name,
                    tick,
                    tick as f64 * tick_ms as f64 / 1000.0
                )?,
                None => writeln!(
                    &mut content,
                    "{:5}, {:<16}, {:>11}, {:>10}",
                    standing.place, standing.name, "-", "-"
                )?,
            }
        }

        for racer_id in self.unfinished.iter() {
            writeln!(&mut content, "  DNF, {:<16}", racer_id)?;
        }

        Ok(content)
    }

    /// print_standings prints the classification to the console output.
    pub fn print_standings(&self, tick_ms: u64) {
        match self.format_standings(tick_ms) {
            Ok(content) => print!("{}", content),
            Err(e) => eprintln!("WARNING: Could not format race result: {}", e),
        }
    }

    /// write_standings_to_file writes the classification to a text file (default
    /// output/last_race.txt). Returns the path to the written file.
    pub fn write_standings_to_file(
        &self,
        path: Option<&Path>,
        tick_ms: u64,
    ) -> anyhow::Result<String> {
        let content = self.format_standings(tick_ms)?;

        let out_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)?;
                out_dir.join("last_race.txt")
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)
            .context(format!("Failed to open result file {}!", out_path.display()))?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    /// write_standings_csv writes one CSV row per placed racer.
    pub fn write_standings_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .context(format!("Failed to open CSV file {}!", path.display()))?;

        for standing in self.standings.iter() {
            writer.serialize(standing)?;
        }
        writer.flush()?;

        Ok(())
    }
}
