use crate::interfaces::presenter_interface::RgbColor;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// RacerId is the stable identifier of a racer, e.g. `turbo-turtle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RacerId(String);

impl RacerId {
    pub fn new(id: impl Into<String>) -> RacerId {
        RacerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RacerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for RacerId {
    fn from(id: &str) -> Self {
        RacerId::new(id)
    }
}

impl FromStr for RacerId {
    type Err = Infallible;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        Ok(RacerId::new(id.trim()))
    }
}

/// * `id` - Stable racer identifier, e.g. turbo-turtle
/// * `name` - Display name, e.g. Turbo Turtle
/// * `lore` - Flavor text shown on the racer card and the podium
/// * `emoji` - Emoji used in callouts
/// * `accent` - CSS color of the racer card
/// * `track_color` - CSS color of the progress bar
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RacerPars {
    pub id: RacerId,
    pub name: String,
    #[serde(default)]
    pub lore: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    #[serde(default = "default_accent")]
    pub accent: String,
    #[serde(default = "default_track_color")]
    pub track_color: String,
}

fn default_emoji() -> String {
    String::from("🏎️")
}

fn default_accent() -> String {
    String::from("#ffd166")
}

fn default_track_color() -> String {
    String::from("#ff6f61")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Racer {
    pub id: RacerId,
    pub name: String,
    pub lore: String,
    pub emoji: String,
    pub accent: RgbColor,
    pub track_color: RgbColor,
}

impl Racer {
    pub fn new(racer_pars: &RacerPars) -> anyhow::Result<Racer> {
        Ok(Racer {
            id: racer_pars.id.to_owned(),
            name: racer_pars.name.to_owned(),
            lore: racer_pars.lore.to_owned(),
            emoji: racer_pars.emoji.to_owned(),
            accent: parse_color(&racer_pars.accent)
                .context(format!("Invalid accent color of racer {}!", racer_pars.id))?,
            track_color: parse_color(&racer_pars.track_color)
                .context(format!("Invalid track color of racer {}!", racer_pars.id))?,
        })
    }
}

fn parse_color(color: &str) -> anyhow::Result<RgbColor> {
    let tmp_color = color
        .parse::<css_color_parser::Color>()
        .map_err(|e| anyhow::anyhow!("Could not parse color {:?}: {}", color, e))?;

    Ok(RgbColor {
        r: tmp_color.r,
        g: tmp_color.g,
        b: tmp_color.b,
    })
}

/// RacerCatalog is the ordered, read-only list of racers a session can pick from. The catalog
/// order is the selection order used everywhere else (lanes, same-tick finishes).
#[derive(Debug, Clone)]
pub struct RacerCatalog {
    racers: Vec<Racer>,
}

impl RacerCatalog {
    pub fn new(racer_pars_all: &[RacerPars]) -> anyhow::Result<RacerCatalog> {
        if racer_pars_all.is_empty() {
            anyhow::bail!("Racer catalog must contain at least one racer!");
        }

        let mut seen = HashSet::with_capacity(racer_pars_all.len());
        let mut racers = Vec::with_capacity(racer_pars_all.len());

        for racer_pars in racer_pars_all.iter() {
            if !seen.insert(racer_pars.id.to_owned()) {
                anyhow::bail!("Racer id {} is used more than once!", racer_pars.id);
            }
            racers.push(Racer::new(racer_pars)?);
        }

        Ok(RacerCatalog { racers })
    }

    /// builtin returns the six racers of the Zoomy Racers Club.
    pub fn builtin() -> RacerCatalog {
        let racers = builtin_racer_pars()
            .iter()
            .map(Racer::new)
            .collect::<anyhow::Result<Vec<Racer>>>();

        match racers {
            Ok(racers) => RacerCatalog { racers },
            Err(e) => panic!("Built-in racer catalog is invalid: {:#}", e),
        }
    }

    pub fn get(&self, id: &RacerId) -> Option<&Racer> {
        self.racers.iter().find(|racer| &racer.id == id)
    }

    /// position returns the catalog index of a racer.
    pub fn position(&self, id: &RacerId) -> Option<usize> {
        self.racers.iter().position(|racer| &racer.id == id)
    }

    /// first_ids returns the ids of the first n racers (or all if there are fewer).
    pub fn first_ids(&self, n: usize) -> Vec<RacerId> {
        self.racers.iter().take(n).map(|racer| racer.id.to_owned()).collect()
    }
}

fn builtin_racer_pars() -> Vec<RacerPars> {
    let tmp = |id: &str, name: &str, emoji: &str, lore: &str, accent: &str, track_color: &str| {
        RacerPars {
            id: RacerId::new(id),
            name: name.to_owned(),
            lore: lore.to_owned(),
            emoji: emoji.to_owned(),
            accent: accent.to_owned(),
            track_color: track_color.to_owned(),
        }
    };

    vec![
        tmp(
            "rocket-raccoon",
            "Rocket Raccoon",
            "🦝",
            "Builds rockets out of cereal boxes and never forgets a snack.",
            "#ffd6a5",
            "#ff6f61",
        ),
        tmp(
            "bubble-bunny",
            "Bubble Bunny",
            "🐰",
            "Hops so fast that bubbles trail behind her.",
            "#fdffb6",
            "#f4a261",
        ),
        tmp(
            "turbo-turtle",
            "Turbo Turtle",
            "🐢",
            "Slow and steady? Not with a jet-powered shell!",
            "#caffbf",
            "#2a9d8f",
        ),
        tmp(
            "dizzy-dino",
            "Dizzy Dino",
            "🦖",
            "Spins in circles before every race for good luck.",
            "#9bf6ff",
            "#4cc9f0",
        ),
        tmp(
            "zippy-zebra",
            "Zippy Zebra",
            "🦓",
            "Counts stripes instead of laps and still wins.",
            "#bdb2ff",
            "#7b2cbf",
        ),
        tmp(
            "comet-kitty",
            "Comet Kitty",
            "🐱",
            "Naps all day, zooms all night.",
            "#ffc6ff",
            "#e5383b",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_keeps_order() {
        let catalog = RacerCatalog::builtin();
        assert_eq!(catalog.first_ids(10).len(), 6);
        assert_eq!(catalog.position(&RacerId::from("turbo-turtle")), Some(2));
        assert_eq!(
            catalog.first_ids(2),
            vec![RacerId::from("rocket-raccoon"), RacerId::from("bubble-bunny")]
        );
    }

    #[test]
    fn catalog_parses_colors() {
        let catalog = RacerCatalog::builtin();
        let racer = catalog.get(&RacerId::from("rocket-raccoon")).unwrap();
        assert_eq!(racer.track_color, RgbColor { r: 0xff, g: 0x6f, b: 0x61 });
    }

    #[test]
    fn catalog_rejects_duplicates_and_bad_colors() {
        let mut pars = builtin_racer_pars();
        pars.push(pars[0].clone());
        assert!(RacerCatalog::new(&pars).is_err());

        let mut pars = builtin_racer_pars();
        pars[1].accent = String::from("not-a-color");
        assert!(RacerCatalog::new(&pars).is_err());

        assert!(RacerCatalog::new(&[]).is_err());
    }

    #[test]
    fn racer_pars_defaults_apply() {
        let pars: RacerPars =
            serde_json::from_str(r#"{"id": "slow-snail", "name": "Slow Snail"}"#).unwrap();
        let racer = Racer::new(&pars).unwrap();
        assert_eq!(racer.id.as_str(), "slow-snail");
        assert!(racer.lore.is_empty());
        assert_eq!(racer.emoji, "🏎️");
    }
}
