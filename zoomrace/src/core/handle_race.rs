use crate::core::session::RaceSession;
use crate::interfaces::presenter_interface::{Command, RaceUpdate, Signal};
use crate::post::race_result::RaceResult;
use anyhow::Context;
use flume::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// handle_race runs a race session in real-time. It applies the commands received from the
/// presenter, fires the session timers when they are due on the wall clock (scaled by the
/// real-time factor) and sends an update after every change. It returns the result of the last
/// race when the command channel is disconnected or a shutdown command arrives.
pub fn handle_race(
    mut session: RaceSession,
    rx: &Receiver<Command>,
    tx: &Sender<RaceUpdate>,
    realtime_factor: f64,
) -> anyhow::Result<RaceResult> {
    if !(realtime_factor > 0.0 && realtime_factor.is_finite()) {
        anyhow::bail!("Real-time factor must be positive, but is {}!", realtime_factor)
    }

    let t_start = Instant::now();
    let t_sim_start = session.now_ms();
    let sim_now =
        || t_sim_start + (t_start.elapsed().as_secs_f64() * 1000.0 * realtime_factor) as u64;

    send_update(&session, Vec::new(), tx)?;

    loop {
        // fire everything that became due while waiting
        let revision = session.revision();
        let signals = session.advance_to(sim_now());
        if session.revision() != revision {
            send_update(&session, signals, tx)?;
        }

        // wait for a command until the next timer is due
        let received = match session.next_deadline() {
            Some(deadline) => {
                let t_wait_ms =
                    (deadline.saturating_sub(session.now_ms()) as f64 / realtime_factor).ceil();
                rx.recv_timeout(Duration::from_millis(t_wait_ms as u64))
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Command::Shutdown) => {
                info!("Shutdown requested");
                break;
            }
            Ok(command) => {
                // commands act at the time they arrive
                let mut signals = session.advance_to(sim_now());
                debug!(?command, time_ms = session.now_ms(), "Command received");

                match session.apply(command) {
                    Ok(mut cmd_signals) => signals.append(&mut cmd_signals),
                    Err(rejection) => signals.push(Signal::Rejected(rejection)),
                }
                send_update(&session, signals, tx)?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Command channel disconnected");
                break;
            }
        }
    }

    Ok(session.race().get_race_result())
}

fn send_update(
    session: &RaceSession,
    signals: Vec<Signal>,
    tx: &Sender<RaceUpdate>,
) -> anyhow::Result<()> {
    tx.send(RaceUpdate {
        snapshot: session.snapshot(),
        signals,
    })
    .context("Failed to send race update to presenter!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::boost::SpeedPars;
    use crate::core::session::make_rng;
    use crate::core::state_handler::RaceStatus;
    use crate::pre::read_sim_pars::SessionPars;
    use std::thread;

    #[test]
    fn live_race_until_shutdown() {
        let session_pars = SessionPars {
            speed: SpeedPars {
                speed_min: 1000.0,
                speed_max: 1000.0,
                boost_threshold: 1.0,
                ..SpeedPars::default()
            },
            ..SessionPars::default()
        };
        let session = RaceSession::from_pars(&session_pars, make_rng(Some(3))).unwrap();

        let (tx_cmd, rx_cmd) = flume::unbounded();
        let (tx_update, rx_update) = flume::unbounded();
        let handle = thread::spawn(move || handle_race(session, &rx_cmd, &tx_update, 1000.0));

        let initial = rx_update.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(initial.snapshot.status, RaceStatus::Idle);
        assert!(initial.signals.is_empty());

        tx_cmd.send(Command::SetLapCount(4)).unwrap();
        let rejected = rx_update.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(rejected.signals[..], [Signal::Rejected(_)]));

        tx_cmd.send(Command::StartRace).unwrap();
        let mut signals: Vec<Signal> = Vec::new();
        while !signals.iter().any(|signal| matches!(signal, Signal::Finished { .. })) {
            let update = rx_update.recv_timeout(Duration::from_secs(10)).unwrap();
            signals.extend(update.signals);
        }
        assert_eq!(signals[0], Signal::CountdownStarted { epoch: 1 });
        assert!(signals.contains(&Signal::Go));

        tx_cmd.send(Command::Shutdown).unwrap();
        let result = handle.join().unwrap().unwrap();
        assert_eq!(result.standings.len(), 3);
        assert_eq!(result.ticks, 1);
    }

    #[test]
    fn invalid_realtime_factor() {
        let session = RaceSession::from_pars(&SessionPars::default(), make_rng(Some(3))).unwrap();
        let (_tx_cmd, rx_cmd) = flume::unbounded();
        let (tx_update, _rx_update) = flume::unbounded();
        assert!(handle_race(session, &rx_cmd, &tx_update, 0.0).is_err());
    }
}
