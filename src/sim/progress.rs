use super::catalog;
use super::mode::GameMode;
use super::requests::SpiritRequest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub const INITIAL_GAMES_UNLOCKED: u8 = 1;
pub const MAX_LEVEL_TIER: u8 = 3;

/// Session number -> mini-game slots available from then on.
pub const GAME_SLOT_MILESTONES: [(u32, u8); 2] = [(1, 2), (2, 3)];

/// Session number -> spirit joining the garden.
pub const SPIRIT_MILESTONES: [(u32, &str); 4] = [
    (2, catalog::KA),
    (4, catalog::DO),
    (6, catalog::KON),
    (8, catalog::SUI),
];

#[derive(Debug, Clone, Copy)]
pub struct LevelMilestone {
    pub mode: GameMode,
    pub easy_level: u32,
    pub medium_level: u32,
    pub easy_clears_needed: u32,
    pub medium_clears_needed: u32,
}

pub const LEVEL_MILESTONES: [LevelMilestone; 2] = [
    LevelMilestone {
        mode: GameMode::Chain,
        easy_level: 9,
        medium_level: 18,
        easy_clears_needed: 1,
        medium_clears_needed: 5,
    },
    LevelMilestone {
        mode: GameMode::Guard,
        easy_level: 1,
        medium_level: 2,
        easy_clears_needed: 1,
        medium_clears_needed: 3,
    },
];

pub fn level_milestone(mode: GameMode) -> Option<&'static LevelMilestone> {
    LEVEL_MILESTONES.iter().find(|milestone| milestone.mode == mode)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockNotice {
    pub title: String,
    pub message: String,
}

impl UnlockNotice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTrack {
    pub levels_unlocked: u8,
    pub easy_clears: u32,
    pub medium_clears: u32,
}

impl Default for ModeTrack {
    fn default() -> Self {
        Self {
            levels_unlocked: 1,
            easy_clears: 0,
            medium_clears: 0,
        }
    }
}

impl ModeTrack {
    /// Counts a clear of `level` and returns the newly reached tier, if any. A tier
    /// fires only on the clear that makes the counter hit its threshold exactly.
    pub fn record_clear(&mut self, level: u32, milestone: &LevelMilestone) -> Option<u8> {
        if level == milestone.easy_level {
            self.easy_clears = self.easy_clears.saturating_add(1);
            if self.easy_clears == milestone.easy_clears_needed {
                return self.raise_to(2);
            }
        } else if level == milestone.medium_level {
            self.medium_clears = self.medium_clears.saturating_add(1);
            if self.medium_clears == milestone.medium_clears_needed {
                return self.raise_to(3);
            }
        }
        None
    }

    fn raise_to(&mut self, tier: u8) -> Option<u8> {
        let tier = tier.min(MAX_LEVEL_TIER);
        if self.levels_unlocked >= tier {
            return None;
        }
        self.levels_unlocked = tier;
        Some(tier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    DebugPanel,
    TutorialCompleted,
    SoundEnabled,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::DebugPanel, Flag::TutorialCompleted, Flag::SoundEnabled];

    pub fn label(self) -> &'static str {
        match self {
            Flag::DebugPanel => "debug-panel",
            Flag::TutorialCompleted => "tutorial-completed",
            Flag::SoundEnabled => "sound",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Flag::ALL
            .iter()
            .copied()
            .find(|flag| flag.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown flag '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub debug_panel: bool,
    pub tutorial_completed: bool,
    pub sound_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            debug_panel: false,
            tutorial_completed: false,
            sound_enabled: true,
        }
    }
}

impl FeatureFlags {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::DebugPanel => self.debug_panel,
            Flag::TutorialCompleted => self.tutorial_completed,
            Flag::SoundEnabled => self.sound_enabled,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        match flag {
            Flag::DebugPanel => self.debug_panel = value,
            Flag::TutorialCompleted => self.tutorial_completed = value,
            Flag::SoundEnabled => self.sound_enabled = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameProgress {
    pub best_scores: BTreeMap<GameMode, u32>,
    pub sessions_played: u32,
    pub games_unlocked: u8,
    #[serde(default = "default_tracks")]
    pub tracks: BTreeMap<GameMode, ModeTrack>,
    #[serde(default)]
    pub cleared_levels: BTreeMap<GameMode, BTreeSet<u32>>,
    pub unlock_notice: Option<UnlockNotice>,
    pub premium_unlocked: bool,
    #[serde(default)]
    pub flags: FeatureFlags,
    pub last_decay_at: i64,
    pub active_request: Option<SpiritRequest>,
    #[serde(skip)]
    pub last_healed: Option<String>,
}

fn default_tracks() -> BTreeMap<GameMode, ModeTrack> {
    GameMode::ALL
        .iter()
        .map(|mode| (*mode, ModeTrack::default()))
        .collect()
}

impl GameProgress {
    pub fn new(now: i64) -> Self {
        Self {
            best_scores: BTreeMap::new(),
            sessions_played: 0,
            games_unlocked: INITIAL_GAMES_UNLOCKED,
            tracks: default_tracks(),
            cleared_levels: BTreeMap::new(),
            unlock_notice: None,
            premium_unlocked: false,
            flags: FeatureFlags::default(),
            last_decay_at: now,
            active_request: None,
            last_healed: None,
        }
    }

    pub fn best_score(&self, mode: GameMode) -> u32 {
        self.best_scores.get(&mode).copied().unwrap_or(0)
    }

    pub fn record_score(&mut self, mode: GameMode, score: u32) {
        let best = self.best_scores.entry(mode).or_insert(0);
        *best = (*best).max(score);
    }

    pub fn levels_unlocked(&self, mode: GameMode) -> u8 {
        self.tracks
            .get(&mode)
            .map(|track| track.levels_unlocked)
            .unwrap_or(1)
    }

    pub fn track_mut(&mut self, mode: GameMode) -> &mut ModeTrack {
        self.tracks.entry(mode).or_default()
    }

    /// Overwrites the single notification slot.
    pub fn notify(&mut self, notice: UnlockNotice) {
        self.unlock_notice = Some(notice);
    }
}
