use approx::assert_relative_eq;
use zoomrace::core::boost::SpeedPars;
use zoomrace::core::config::Rejection;
use zoomrace::core::racer::RacerId;
use zoomrace::core::session::{make_rng, RaceSession};
use zoomrace::core::state_handler::RaceStatus;
use zoomrace::interfaces::presenter_interface::{Command, Signal};
use zoomrace::pre::read_sim_pars::SessionPars;

fn ids(raw: &[&str]) -> Vec<RacerId> {
    raw.iter().map(|&id| RacerId::from(id)).collect()
}

fn session(
    selection: &[&str],
    track_length: u32,
    lap_count: u32,
    speed: SpeedPars,
) -> RaceSession {
    let session_pars = SessionPars {
        selected: Some(ids(selection)),
        track_length,
        lap_count,
        speed,
        ..SessionPars::default()
    };
    RaceSession::from_pars(&session_pars, make_rng(Some(2024))).unwrap()
}

/// speed parameters without randomness where every racer gets a boost in every tick
fn always_boost(speed: f64, bonus: f64) -> SpeedPars {
    SpeedPars {
        speed_min: speed,
        speed_max: speed,
        boost_threshold: -1.0,
        boost_min: bonus,
        boost_max: bonus,
    }
}

#[test]
fn two_racers_short_track() {
    let mut session = session(&["rocket-raccoon", "bubble-bunny"], 60, 1, SpeedPars::default());

    session.apply(Command::StartRace).unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Countdown);
    assert_eq!(snapshot.countdown, Some(3));
    assert_eq!(snapshot.total_distance, 60);

    session.advance(3000);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Racing);
    assert_eq!(snapshot.countdown, None);

    let mut prog_prev = vec![0.0; 2];
    let mut winner = None;
    for _ in 0..1000 {
        for signal in session.advance(180) {
            if let Signal::Finished { winner: id } = signal {
                winner = Some(id);
            }
        }

        let snapshot = session.snapshot();
        for (i, view) in snapshot.racers.iter().enumerate() {
            assert!(view.progress >= prog_prev[i]);
            assert!(view.progress <= 100.0);
            prog_prev[i] = view.progress;
        }
        if snapshot.status == RaceStatus::Finished {
            break;
        }
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Finished);
    let mut placed = snapshot.placements.to_owned();
    placed.sort();
    assert_eq!(placed, ids(&["bubble-bunny", "rocket-raccoon"]));
    assert_eq!(winner.as_ref(), snapshot.placements.first());
    assert_eq!(snapshot.winner, winner);
    assert!(snapshot.racers.iter().all(|view| view.progress >= 100.0));
}

#[test]
fn boost_message_clears_after_display_time() {
    let mut session = session(
        &["rocket-raccoon", "bubble-bunny"],
        100,
        1,
        always_boost(1000.0, 5.0),
    );
    let id = RacerId::from("rocket-raccoon");

    session.apply(Command::StartRace).unwrap();
    let signals = session.advance_to(3180);
    assert!(signals
        .iter()
        .any(|signal| matches!(signal, Signal::Boost { racer, .. } if racer == &id)));
    assert!(session.snapshot().racer(&id).unwrap().boost.is_some());
    assert_eq!(session.snapshot().status, RaceStatus::Finished);

    session.advance_to(3180 + 1599);
    assert!(session.snapshot().racer(&id).unwrap().boost.is_some());

    let signals = session.advance_to(3180 + 1600);
    assert!(signals.contains(&Signal::BoostCleared(id.to_owned())));
    assert_eq!(session.snapshot().racer(&id).unwrap().boost, None);
}

#[test]
fn newer_boost_extends_display_time() {
    // 2% per tick with a boost in every tick, i.e. 50 racing ticks
    let mut session = session(
        &["rocket-raccoon", "bubble-bunny"],
        100,
        1,
        always_boost(1.0, 1.0),
    );
    let id = RacerId::from("rocket-raccoon");
    session.apply(Command::StartRace).unwrap();

    session.advance_to(3000 + 10 * 180 + 1600);
    assert!(session.snapshot().racer(&id).unwrap().boost.is_some());

    session.advance_to(12_000);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Finished);
    assert_eq!(snapshot.placements, ids(&["rocket-raccoon", "bubble-bunny"]));
    assert_relative_eq!(snapshot.racer(&id).unwrap().progress, 100.0);

    // the boost of the last tick is still shown
    session.advance_to(12_000 + 1599);
    assert!(session.snapshot().racer(&id).unwrap().boost.is_some());
    session.advance_to(12_000 + 1600);
    assert!(session.snapshot().racers.iter().all(|view| view.boost.is_none()));
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn reset_mid_race_leaves_nothing_behind() {
    let mut session = session(
        &["rocket-raccoon", "bubble-bunny", "turbo-turtle"],
        140,
        5,
        always_boost(10.0, 5.0),
    );
    session.apply(Command::StartRace).unwrap();
    session.advance_to(3000 + 3 * 180);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Racing);
    assert!(snapshot.racers.iter().all(|view| view.progress > 0.0));
    assert!(snapshot.racers.iter().all(|view| view.boost.is_some()));

    assert_eq!(session.apply(Command::Reset), Ok(vec![Signal::Reset]));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Idle);
    assert_eq!(snapshot.countdown, None);
    assert!(snapshot.placements.is_empty());
    assert!(snapshot
        .racers
        .iter()
        .all(|view| view.progress == 0.0 && view.boost.is_none()));

    // nothing of the old race fires anymore
    assert!(session.advance(60_000).is_empty());
    assert_eq!(session.snapshot().status, RaceStatus::Idle);
    assert_eq!(session.race().cur_tick(), 0);
}

#[test]
fn fifth_racer_is_rejected() {
    let selection = ["rocket-raccoon", "bubble-bunny", "turbo-turtle", "dizzy-dino"];
    let mut session = session(&selection, 100, 2, SpeedPars::default());

    assert_eq!(
        session.apply(Command::ToggleRacer(RacerId::from("comet-kitty"))),
        Err(Rejection::TooManyRacers { max: 4 })
    );
    assert_eq!(session.snapshot().selected, ids(&selection));

    assert_eq!(
        session.apply(Command::ToggleRacer(RacerId::from("ghost-goat"))),
        Err(Rejection::UnknownRacer(RacerId::from("ghost-goat")))
    );

    // removing one makes room again
    session
        .apply(Command::ToggleRacer(RacerId::from("bubble-bunny")))
        .unwrap();
    session
        .apply(Command::ToggleRacer(RacerId::from("comet-kitty")))
        .unwrap();
    assert_eq!(
        session.snapshot().selected,
        ids(&["rocket-raccoon", "turbo-turtle", "dizzy-dino", "comet-kitty"])
    );
}

#[test]
fn single_racer_cannot_start() {
    let mut session = session(&["zippy-zebra"], 100, 2, SpeedPars::default());

    assert_eq!(
        session.apply(Command::StartRace),
        Err(Rejection::NotEnoughRacers { min: 2 })
    );
    let snapshot = session.snapshot();
    assert_eq!(snapshot.status, RaceStatus::Idle);
    assert_eq!(snapshot.epoch, 0);
    assert_eq!(snapshot.callout, "Pick at least 2 racers to make it exciting!");
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn settings_during_race_apply_to_next_race() {
    let mut session = session(
        &["rocket-raccoon", "bubble-bunny"],
        100,
        1,
        always_boost(10.0, 0.0),
    );
    session.apply(Command::StartRace).unwrap();
    session.advance_to(3180);

    session.apply(Command::SetTrackLength(60)).unwrap();
    session.apply(Command::SetLapCount(3)).unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.total_distance, 100);
    assert_eq!((snapshot.track_length, snapshot.lap_count), (60, 3));
    assert_relative_eq!(snapshot.racers[0].progress, 10.0);

    session.advance_to(3360);
    assert_relative_eq!(session.snapshot().racers[0].progress, 20.0);

    session.apply(Command::StartRace).unwrap();
    assert_eq!(session.snapshot().total_distance, 180);
    assert_eq!(session.snapshot().epoch, 2);
}
