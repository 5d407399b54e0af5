use super::element::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mini-game modes that report scores into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameMode {
    Chain,
    Guard,
    Sort,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Chain, GameMode::Guard, GameMode::Sort];

    pub fn label(self) -> &'static str {
        match self {
            GameMode::Chain => "chain",
            GameMode::Guard => "guard",
            GameMode::Sort => "sort",
        }
    }

    /// Element of the spirit whose mood and proficiency a session of this mode drives.
    pub fn element(self) -> Element {
        match self {
            GameMode::Chain => Element::Wood,
            GameMode::Guard => Element::Fire,
            GameMode::Sort => Element::Earth,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown mode '{value}'"))
    }
}
