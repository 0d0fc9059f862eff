use anyhow::Context;
use clap::Parser;
use helpers::general::argmax;
use rayon::prelude::*;
use std::path::Path;
use std::thread;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zoomrace::core::handle_race::handle_race;
use zoomrace::core::session::{make_rng, RaceSession};
use zoomrace::core::state_handler::RaceStatus;
use zoomrace::interfaces::presenter_interface::{Command, RaceSnapshot, RaceUpdate, Signal};
use zoomrace::post::race_result::RaceResult;
use zoomrace::pre::read_sim_pars::{read_session_pars, SessionPars};
use zoomrace::pre::sim_opts::SimOpts;

const BAR_WIDTH: usize = 40;
// upper limit of simulated time for one headless race
const MAX_RACE_DURATION_MS: u64 = 3_600_000;

fn init_tracing(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout belongs to the race display
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();
    init_tracing(sim_opts.debug);

    // get session parameters
    let mut session_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        info!("Reading session parameters from {:?}", parfile_path);
        read_session_pars(parfile_path)?
    } else {
        SessionPars::default()
    };

    // command line options override the parameter file
    if let Some(racers) = &sim_opts.racers {
        session_pars.selected = Some(racers.to_owned());
    }
    if let Some(track_length) = sim_opts.track_length {
        session_pars.track_length = track_length;
    }
    if let Some(laps) = sim_opts.laps {
        session_pars.lap_count = laps;
    }
    session_pars.validate()?;

    // EXECUTION -----------------------------------------------------------------------------------
    if sim_opts.no_sim_runs > 1 {
        run_batch(&session_pars, &sim_opts)
    } else {
        run_live(&session_pars, &sim_opts)
    }
}

/// run_batch simulates the configured race several times on the virtual clock and prints how
/// often each racer won.
fn run_batch(session_pars: &SessionPars, sim_opts: &SimOpts) -> anyhow::Result<()> {
    info!(
        "Simulating {} races without real-time output...",
        sim_opts.no_sim_runs
    );
    let t_start = Instant::now();

    let race_results = (0..sim_opts.no_sim_runs)
        .into_par_iter()
        .map(|run| {
            let rng = make_rng(sim_opts.seed.map(|seed| seed.wrapping_add(run as u64)));
            let mut session = RaceSession::from_pars(session_pars, rng)?;
            session
                .run_race(MAX_RACE_DURATION_MS)
                .context(format!("Race run {} failed!", run))
        })
        .collect::<anyhow::Result<Vec<RaceResult>>>()?;

    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    // count wins per racer of the field
    let catalog = session_pars.build_catalog()?;
    let config = session_pars.build_configuration(&catalog)?;
    let field = config.selected();

    let mut wins = vec![0u32; field.len()];
    let mut ticks_total = 0u64;
    for race_result in race_results.iter() {
        ticks_total += race_result.ticks as u64;
        if let Some(idx) = race_result
            .winner()
            .and_then(|winner| field.iter().position(|id| id == winner))
        {
            wins[idx] += 1;
        }
    }

    println!(
        "RESULT: {} races, {} fun-meters, {:.1} ticks per race on average",
        race_results.len(),
        config.total_distance(),
        ticks_total as f64 / race_results.len() as f64
    );
    println!("racer, wins, win share");
    for (id, no_wins) in field.iter().zip(wins.iter()) {
        let name = catalog.get(id).map_or(id.as_str(), |racer| racer.name.as_str());
        println!(
            "{:<16}, {:4}, {:8.1}%",
            name,
            no_wins,
            *no_wins as f64 / race_results.len() as f64 * 100.0
        );
    }

    if !field.is_empty() {
        let top_idx = argmax(&wins);
        info!("Most wins: {}", field[top_idx]);
    }

    Ok(())
}

/// run_live runs one race in real-time in a separate thread and renders its updates to the
/// console.
fn run_live(session_pars: &SessionPars, sim_opts: &SimOpts) -> anyhow::Result<()> {
    let session = RaceSession::from_pars(session_pars, make_rng(sim_opts.seed))?;
    let tick_ms = session.timing().racing_interval_ms;

    // create channels for the communication between presenter and simulator
    let (tx_cmd, rx_cmd) = flume::unbounded();
    let (tx_update, rx_update) = flume::unbounded();

    let realtime_factor = sim_opts.realtime_factor;
    let sim_thread =
        thread::spawn(move || handle_race(session, &rx_cmd, &tx_update, realtime_factor));

    tx_cmd
        .send(Command::StartRace)
        .context("Failed to send start command to simulator!")?;

    let mut finished = false;
    for update in rx_update.iter() {
        render_update(&update);

        if update
            .signals
            .iter()
            .any(|signal| matches!(signal, Signal::Finished { .. } | Signal::Rejected(_)))
        {
            finished = matches!(update.snapshot.status, RaceStatus::Finished);
            break;
        }
    }

    // the simulator might have stopped already, then there is nobody to shut down
    let _ = tx_cmd.send(Command::Shutdown);
    let race_result = sim_thread
        .join()
        .map_err(|_| anyhow::anyhow!("Simulator thread panicked!"))??;

    if finished {
        race_result.print_standings(tick_ms);

        let txt_path =
            race_result.write_standings_to_file(sim_opts.output_path.as_deref(), tick_ms)?;
        let csv_path = Path::new(&txt_path).with_extension("csv");
        race_result.write_standings_csv(&csv_path)?;
        info!(
            "Race result written to {} and {}",
            txt_path,
            csv_path.display()
        );
    }

    Ok(())
}

// -------------------------------------------------------------------------------------------------
// PRESENTER ---------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

fn render_update(update: &RaceUpdate) {
    let snapshot = &update.snapshot;

    for signal in update.signals.iter() {
        match signal {
            Signal::CountdownStarted { .. } | Signal::Go | Signal::Reset => {
                println!("\n*** {} ***", snapshot.callout)
            }
            Signal::CountdownTick(value) => println!("  {}...", value),
            Signal::Boost { racer, message } => {
                if let Some(view) = snapshot.racer(racer) {
                    println!("  {} {}: {}", view.emoji, view.name, message);
                }
            }
            Signal::BoostCleared(_) => {}
            Signal::Finished { .. } => {
                render_track(snapshot);
                println!("\n*** {} ***", snapshot.callout);
                render_podium(snapshot);
            }
            Signal::Rejected(rejection) => println!("WARNING: {}", rejection),
        }
    }

    if matches!(snapshot.status, RaceStatus::Racing) {
        render_track(snapshot);
    }
}

fn render_track(snapshot: &RaceSnapshot) {
    println!();
    for view in snapshot.racers.iter() {
        let filled = ((view.progress / 100.0) * BAR_WIDTH as f64).round() as usize;
        let place = view.place.map_or(String::new(), |place| format!(" #{}", place));
        println!(
            "{} {:<16} |{:<width$}| {:5.1}%{}",
            view.emoji,
            view.name,
            "=".repeat(filled.min(BAR_WIDTH)),
            view.progress,
            place,
            width = BAR_WIDTH
        );
    }
}

fn render_podium(snapshot: &RaceSnapshot) {
    for (i, entry) in snapshot.podium.iter().enumerate() {
        println!("  {}. {} {} - {}", i + 1, entry.emoji, entry.name, entry.lore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_mode_runs_seeded_races() {
        let sim_opts = SimOpts::parse_from(["zoomy", "-n", "8", "-s", "7"]);
        let session_pars = SessionPars {
            track_length: 60,
            ..SessionPars::default()
        };
        session_pars.validate().unwrap();

        assert!(run_batch(&session_pars, &sim_opts).is_ok());
    }
}
