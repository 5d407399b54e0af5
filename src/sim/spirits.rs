use super::catalog::{self, SpiritSpec};
use super::element::Element;
use serde::{Deserialize, Serialize};

pub const GENKI_MAX: u8 = 100;
pub const KIZUNA_MAX: u8 = 100;
pub const GOOD_MOOD_GENKI: u8 = 70;
pub const BAD_MOOD_GENKI: u8 = 15;

const STARTING_GENKI: u8 = 80;
const STARTING_CHOWA: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mood {
    Good,
    #[default]
    Normal,
    Bad,
}

impl Mood {
    /// Genki-driven mood. Below the lower band is always bad and the upper band is
    /// always good; in between a bad spirit recovers to normal and any other mood
    /// is kept.
    pub fn settle(genki: u8, previous: Mood) -> Mood {
        if genki < BAD_MOOD_GENKI {
            Mood::Bad
        } else if genki >= GOOD_MOOD_GENKI {
            Mood::Good
        } else if previous == Mood::Bad {
            Mood::Normal
        } else {
            previous
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Good => "good",
            Mood::Normal => "normal",
            Mood::Bad => "bad",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spirit {
    pub id: String,
    pub name: String,
    pub element: Element,
    pub genki: u8,
    pub chowa: u8,
    pub jukuren: u32,
    pub kizuna: u8,
    #[serde(default)]
    pub mood: Mood,
    pub unlocked: bool,
}

impl Spirit {
    pub fn from_spec(spec: &SpiritSpec) -> Self {
        Self {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            element: spec.element,
            genki: STARTING_GENKI,
            chowa: STARTING_CHOWA,
            jukuren: 0,
            kizuna: 0,
            mood: Mood::settle(STARTING_GENKI, Mood::Normal),
            unlocked: false,
        }
    }

    pub fn decay(&mut self, units: u64) {
        let loss = units.min(GENKI_MAX as u64) as u8;
        self.genki = self.genki.saturating_sub(loss);
        self.mood = Mood::settle(self.genki, self.mood);
    }

    /// Applies a heal of `recovery` genki and returns the proficiency earned.
    pub fn restore(&mut self, recovery: u32, kizuna_gain: u8) -> u32 {
        let raised = (self.genki as u32 + recovery).min(GENKI_MAX as u32);
        self.genki = raised as u8;
        self.mood = Mood::settle(self.genki, self.mood);
        let exp = recovery / 2;
        self.jukuren = self.jukuren.saturating_add(exp);
        self.kizuna = self.kizuna.saturating_add(kizuna_gain).min(KIZUNA_MAX);
        exp
    }

    pub fn gain_proficiency(&mut self, exp: u32) {
        self.jukuren = self.jukuren.saturating_add(exp);
    }

    /// Clamps stats into range and refreshes catalog-owned fields.
    pub fn ensure_runtime_defaults(&mut self, spec: &SpiritSpec) {
        self.name = spec.name.to_string();
        self.element = spec.element;
        self.genki = self.genki.min(GENKI_MAX);
        self.kizuna = self.kizuna.min(KIZUNA_MAX);
        self.mood = Mood::settle(self.genki, self.mood);
    }
}

/// All five spirits with only the starter unlocked.
pub fn starter_roster() -> Vec<Spirit> {
    catalog::SPIRITS
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let mut spirit = Spirit::from_spec(spec);
            spirit.unlocked = index == 0;
            spirit
        })
        .collect()
}
