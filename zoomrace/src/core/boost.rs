use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

pub const BOOST_MESSAGES: [&str; 5] = [
    "Mega Zoom Boost!",
    "Super Silly Sprint!",
    "Cheer Turbo!",
    "Giggly Jetpack!",
    "Rainbow Rocket!",
];

/// * `speed_min` - Lower bound of the speed factor drawn per racer and tick
/// * `speed_max` - Upper bound of the speed factor
/// * `boost_threshold` - A racer gets a boost if a uniform [0, 1) draw exceeds this value
/// * `boost_min` - (%) Lower bound of the boost bonus
/// * `boost_max` - (%) Upper bound of the boost bonus
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpeedPars {
    #[serde(default = "default_speed_min")]
    pub speed_min: f64,
    #[serde(default = "default_speed_max")]
    pub speed_max: f64,
    #[serde(default = "default_boost_threshold")]
    pub boost_threshold: f64,
    #[serde(default = "default_boost_min")]
    pub boost_min: f64,
    #[serde(default = "default_boost_max")]
    pub boost_max: f64,
}

fn default_speed_min() -> f64 {
    6.0
}

fn default_speed_max() -> f64 {
    18.0
}

fn default_boost_threshold() -> f64 {
    0.94
}

fn default_boost_min() -> f64 {
    6.0
}

fn default_boost_max() -> f64 {
    18.0
}

impl Default for SpeedPars {
    fn default() -> Self {
        SpeedPars {
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
            boost_threshold: default_boost_threshold(),
            boost_min: default_boost_min(),
            boost_max: default_boost_max(),
        }
    }
}

impl SpeedPars {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0 < self.speed_min && self.speed_min <= self.speed_max) {
            anyhow::bail!(
                "Speed range must satisfy 0 < speed_min <= speed_max, but is [{}, {}]!",
                self.speed_min,
                self.speed_max
            )
        }
        if !(0.0 <= self.boost_min && self.boost_min <= self.boost_max) {
            anyhow::bail!(
                "Boost range must satisfy 0 <= boost_min <= boost_max, but is [{}, {}]!",
                self.boost_min,
                self.boost_max
            )
        }
        if !self.boost_threshold.is_finite() {
            anyhow::bail!("Boost threshold must be finite!")
        }
        Ok(())
    }
}

/// StepDraw is the random outcome of one racer in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDraw {
    pub base_speed: f64,
    pub boost_bonus: Option<f64>,
}

impl StepDraw {
    pub fn increment(&self) -> f64 {
        self.base_speed + self.boost_bonus.unwrap_or(0.0)
    }
}

/// SpeedModel draws per-tick progress increments. The base speed scales with the inverse of the
/// total distance, so longer races take proportionally more ticks.
#[derive(Debug, Clone)]
pub struct SpeedModel {
    speed: Uniform<f64>,
    bonus: Uniform<f64>,
    boost_threshold: f64,
}

impl SpeedModel {
    pub fn new(speed_pars: &SpeedPars) -> SpeedModel {
        SpeedModel {
            speed: Uniform::new_inclusive(speed_pars.speed_min, speed_pars.speed_max),
            bonus: Uniform::new_inclusive(speed_pars.boost_min, speed_pars.boost_max),
            boost_threshold: speed_pars.boost_threshold,
        }
    }

    /// draw returns the progress increment (in percent of the total distance) for one racer.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, total_distance: f64) -> StepDraw {
        let base_speed = (100.0 / total_distance) * self.speed.sample(rng);
        let cheer_chance: f64 = rng.gen();

        let boost_bonus = if cheer_chance > self.boost_threshold {
            Some(self.bonus.sample(rng))
        } else {
            None
        };

        StepDraw {
            base_speed,
            boost_bonus,
        }
    }
}

pub fn pick_boost_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    BOOST_MESSAGES.choose(rng).copied().unwrap_or(BOOST_MESSAGES[0])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveBoost {
    pub message: String,
    pub token: u64,
}

/// BoostBoard holds the visible boost message per lane. Every boost gets a fresh token; an
/// expiry only clears the lane if it still shows the boost with that token. Tokens are never
/// reused within a session.
#[derive(Debug, Default)]
pub struct BoostBoard {
    lanes: Vec<Option<ActiveBoost>>,
    next_token: u64,
}

impl BoostBoard {
    /// remap rebuilds the board for new lanes, keeping the messages of lanes that are mapped
    /// to an old lane index.
    pub fn remap(&mut self, old_idxs: &[Option<usize>]) {
        let lanes = old_idxs
            .iter()
            .map(|old_idx| old_idx.and_then(|idx| self.lanes.get(idx).cloned().flatten()))
            .collect();
        self.lanes = lanes;
    }

    /// clear_lanes removes all messages and sets the number of lanes.
    pub fn clear_lanes(&mut self, no_lanes: usize) {
        self.lanes = vec![None; no_lanes];
    }

    pub fn trigger(&mut self, lane: usize, message: &str) -> u64 {
        self.next_token += 1;
        self.lanes[lane] = Some(ActiveBoost {
            message: message.to_owned(),
            token: self.next_token,
        });
        self.next_token
    }

    /// expire clears the lane if it still shows the boost with the given token.
    pub fn expire(&mut self, lane: usize, token: u64) -> bool {
        match self.lanes.get(lane) {
            Some(Some(boost)) if boost.token == token => {
                self.lanes[lane] = None;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, lane: usize) -> Option<&ActiveBoost> {
        self.lanes.get(lane).and_then(|boost| boost.as_ref())
    }

    pub fn any_active(&self) -> bool {
        self.lanes.iter().any(|boost| boost.is_some())
    }
}
