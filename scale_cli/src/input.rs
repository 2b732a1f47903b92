//! Line-oriented operator input read from stdin.
//!
//! A reader thread parses each line and forwards it over a channel, so the
//! polling loops never block on the terminal. `load G` lines are applied to
//! the simulated platform only when dequeued, which keeps them ordered with
//! the surrounding commits.

use std::io::BufRead;
use std::time::Instant;

use crossbeam_channel as xch;
use scale_hardware::SimLoad;
use scale_traits::{BoxError, InputEvent, OperatorInput};

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Turn(i32),
    Commit,
    Load(f64),
}

/// Parse one operator line. `None` for anything unrecognised.
pub fn parse_line(line: &str) -> Option<Gesture> {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("c") {
        return Some(Gesture::Commit);
    }
    if let Some(rest) = line.strip_prefix("load") {
        return rest.trim().parse::<f64>().ok().filter(|g| g.is_finite()).map(Gesture::Load);
    }
    if line.starts_with('+') || line.starts_with('-') {
        return line.parse::<i32>().ok().map(Gesture::Turn);
    }
    None
}

pub struct StdinInput {
    rx: xch::Receiver<(Gesture, u64)>,
    sim_load: Option<SimLoad>,
}

impl StdinInput {
    /// Start the reader thread. It ends on EOF or read error, which closes the channel.
    pub fn spawn(sim_load: Option<SimLoad>) -> Self {
        let (tx, rx) = xch::unbounded();
        let epoch = Instant::now();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let Some(gesture) = parse_line(&line) else {
                    tracing::warn!(line = %line.trim(), "ignoring unrecognised input");
                    continue;
                };
                let at_ms = u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
                if tx.send((gesture, at_ms)).is_err() {
                    break;
                }
            }
            tracing::debug!("stdin closed");
        });
        Self { rx, sim_load }
    }
}

impl OperatorInput for StdinInput {
    fn poll_event(&mut self) -> Result<Option<InputEvent>, BoxError> {
        loop {
            match self.rx.try_recv() {
                Ok((Gesture::Turn(delta), at_ms)) => return Ok(Some(InputEvent::Encoder { delta, at_ms })),
                Ok((Gesture::Commit, _)) => return Ok(Some(InputEvent::Commit)),
                Ok((Gesture::Load(grams), _)) => match &self.sim_load {
                    Some(load) => {
                        load.set(grams);
                        tracing::info!(load_g = grams, "simulated load changed");
                    }
                    None => tracing::warn!("`load` only works with the simulated sensor"),
                },
                Err(xch::TryRecvError::Empty) => return Ok(None),
                Err(xch::TryRecvError::Disconnected) => return Err("stdin closed".into()),
            }
        }
    }
}
