use super::game::GameState;
use super::items::Item;
use super::mode::GameMode;
use super::progress::MAX_LEVEL_TIER;
use std::fmt;
use std::str::FromStr;

const STOCKED_DRUGS: u32 = 10;
const STOCKED_FORMULAS: u32 = 3;

/// Bulk state overrides for demos and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPreset {
    /// Back to a first launch. Only the decay clock is kept.
    NewGame,
    /// Every spirit, game slot and tier open with a stocked inventory.
    UnlockAll,
    SpiritsOnly,
    /// The lower half of each item category discovered with one unit, the rest unseen.
    HalfDiscovered,
}

impl ContentPreset {
    pub const ALL: [ContentPreset; 4] = [
        ContentPreset::NewGame,
        ContentPreset::UnlockAll,
        ContentPreset::SpiritsOnly,
        ContentPreset::HalfDiscovered,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContentPreset::NewGame => "new-game",
            ContentPreset::UnlockAll => "unlock-all",
            ContentPreset::SpiritsOnly => "spirits-only",
            ContentPreset::HalfDiscovered => "half-discovered",
        }
    }

    pub fn apply(self, state: &GameState) -> GameState {
        match self {
            ContentPreset::NewGame => GameState::new(state.progress.last_decay_at),
            ContentPreset::UnlockAll => {
                let mut next = state.clone();
                unlock_spirits(&mut next);
                next.progress.games_unlocked = GameMode::ALL.len() as u8;
                for mode in GameMode::ALL {
                    next.progress.track_mut(mode).levels_unlocked = MAX_LEVEL_TIER;
                }
                for drug in next.drugs.values_mut() {
                    stock(drug, STOCKED_DRUGS);
                }
                for formula in next.formulas.values_mut() {
                    stock(&mut formula.item, STOCKED_FORMULAS);
                }
                next
            }
            ContentPreset::SpiritsOnly => {
                let mut next = state.clone();
                unlock_spirits(&mut next);
                next
            }
            ContentPreset::HalfDiscovered => {
                let mut next = state.clone();
                let half = next.drugs.len() / 2;
                for (index, drug) in next.drugs.values_mut().enumerate() {
                    stock(drug, if index < half { 1 } else { 0 });
                }
                let half = next.formulas.len() / 2;
                for (index, formula) in next.formulas.values_mut().enumerate() {
                    stock(&mut formula.item, if index < half { 1 } else { 0 });
                }
                next
            }
        }
    }
}

fn unlock_spirits(state: &mut GameState) {
    for spirit in &mut state.spirits {
        spirit.unlocked = true;
    }
}

fn stock(item: &mut Item, count: u32) {
    item.owned_count = count;
    item.discovered = count > 0;
}

impl fmt::Display for ContentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContentPreset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContentPreset::ALL
            .iter()
            .copied()
            .find(|preset| preset.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown preset '{value}'"))
    }
}
