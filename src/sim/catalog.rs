//! Static content: spirits, crude drugs, formulas and their recipes.
//!
//! Nothing here changes at runtime. Persisted inventories carry copies of these
//! fields and are refreshed from the tables on load.

use super::element::Element;
use super::items::ItemId;
use super::mode::GameMode;

pub const MOKU: &str = "moku";
pub const KA: &str = "ka";
pub const DO: &str = "do";
pub const KON: &str = "kon";
pub const SUI: &str = "sui";

#[derive(Debug, Clone, Copy)]
pub struct SpiritSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub element: Element,
    pub success_lines: &'static [&'static str],
    pub fail_lines: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct DrugSpec {
    pub id: ItemId,
    pub name: &'static str,
    pub element: Element,
    pub description: &'static str,
    pub effect_value: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct FormulaSpec {
    pub id: ItemId,
    pub name: &'static str,
    pub element: Element,
    pub description: &'static str,
    pub effect_value: u32,
    /// (crude drug id, required count), in the order shown to the player.
    pub recipe: &'static [(ItemId, u32)],
}

/// Roster in unlock order; the first entry is the starter spirit.
pub const SPIRITS: [SpiritSpec; 5] = [
    SpiritSpec {
        id: MOKU,
        name: "Moku",
        element: Element::Wood,
        success_lines: &[
            "The leaves are rustling happily!",
            "You linked them all. I feel taller already.",
            "Let's grow something together again.",
        ],
        fail_lines: &[
            "Roots take time. Try once more?",
            "Hmm, a few branches snapped.",
        ],
    },
    SpiritSpec {
        id: KA,
        name: "Ka",
        element: Element::Fire,
        success_lines: &[
            "That was blazing!",
            "My flame is roaring thanks to you.",
            "Nothing got past us!",
        ],
        fail_lines: &[
            "The embers are a little low...",
            "We'll burn brighter next round.",
        ],
    },
    SpiritSpec {
        id: DO,
        name: "Do",
        element: Element::Earth,
        success_lines: &[
            "Everything is exactly where it belongs.",
            "Solid work. The ground feels steady.",
            "A tidy cabinet is a calm cabinet.",
        ],
        fail_lines: &[
            "Some drawers are still mixed up.",
            "Slow and steady, let's go again.",
        ],
    },
    SpiritSpec {
        id: KON,
        name: "Kon",
        element: Element::Metal,
        success_lines: &[
            "Sharp and precise. Well done.",
            "I can hear a clear bell ringing.",
            "Polished to a shine!",
        ],
        fail_lines: &[
            "A little tarnish here and there.",
            "Let's temper it and retry.",
        ],
    },
    SpiritSpec {
        id: SUI,
        name: "Sui",
        element: Element::Water,
        success_lines: &[
            "It all flowed so smoothly.",
            "The spring is clear and cool again.",
            "Ripples of joy everywhere!",
        ],
        fail_lines: &[
            "The current got a bit muddy.",
            "Water always finds a way. Once more?",
        ],
    },
];

pub const CRUDE_DRUGS: [DrugSpec; 10] = [
    DrugSpec {
        id: 1,
        name: "Bupleurum Root",
        element: Element::Wood,
        description: "Saiko. Eases tension that gathers around the ribs.",
        effect_value: 12,
    },
    DrugSpec {
        id: 2,
        name: "Peony Root",
        element: Element::Wood,
        description: "Shakuyaku. Softens cramps and nourishes the blood.",
        effect_value: 10,
    },
    DrugSpec {
        id: 3,
        name: "Cinnamon Bark",
        element: Element::Fire,
        description: "Keihi. Warms the body and gets circulation moving.",
        effect_value: 12,
    },
    DrugSpec {
        id: 4,
        name: "Coptis Rhizome",
        element: Element::Fire,
        description: "Oren. Bitter and cooling, clears excess heat.",
        effect_value: 10,
    },
    DrugSpec {
        id: 5,
        name: "Licorice Root",
        element: Element::Earth,
        description: "Kanzo. Harmonises the other ingredients of a formula.",
        effect_value: 10,
    },
    DrugSpec {
        id: 6,
        name: "Jujube",
        element: Element::Earth,
        description: "Taiso. Sweet fruit that supports digestion.",
        effect_value: 12,
    },
    DrugSpec {
        id: 7,
        name: "Ephedra Herb",
        element: Element::Metal,
        description: "Mao. Opens the surface and calms coughing.",
        effect_value: 12,
    },
    DrugSpec {
        id: 8,
        name: "Platycodon Root",
        element: Element::Metal,
        description: "Kikyo. Soothes the throat and clears phlegm.",
        effect_value: 10,
    },
    DrugSpec {
        id: 9,
        name: "Poria Sclerotium",
        element: Element::Water,
        description: "Bukuryo. Drains dampness and settles the mind.",
        effect_value: 12,
    },
    DrugSpec {
        id: 10,
        name: "Alisma Rhizome",
        element: Element::Water,
        description: "Takusha. Promotes urination and reduces swelling.",
        effect_value: 10,
    },
];

pub const FORMULAS: [FormulaSpec; 5] = [
    FormulaSpec {
        id: 1,
        name: "Shosaikoto",
        element: Element::Wood,
        description: "Minor Bupleurum Decoction for lingering, alternating fevers.",
        effect_value: 35,
        recipe: &[(1, 2), (5, 1), (6, 1)],
    },
    FormulaSpec {
        id: 2,
        name: "Keishito",
        element: Element::Fire,
        description: "Cinnamon Twig Decoction for mild chills at the first sign of a cold.",
        effect_value: 30,
        recipe: &[(3, 2), (2, 1), (5, 1), (6, 1)],
    },
    FormulaSpec {
        id: 3,
        name: "Shikunshito",
        element: Element::Earth,
        description: "Four Gentlemen Decoction for a tired, weak stomach.",
        effect_value: 30,
        recipe: &[(5, 1), (6, 1), (9, 2)],
    },
    FormulaSpec {
        id: 4,
        name: "Maoto",
        element: Element::Metal,
        description: "Ephedra Decoction for body aches without sweating.",
        effect_value: 35,
        recipe: &[(7, 2), (3, 1), (5, 1)],
    },
    FormulaSpec {
        id: 5,
        name: "Goreisan",
        element: Element::Water,
        description: "Five-Ingredient Poria Powder for thirst and water retention.",
        effect_value: 40,
        recipe: &[(10, 2), (9, 1), (3, 1)],
    },
];

pub fn spirit_spec(id: &str) -> Option<&'static SpiritSpec> {
    SPIRITS.iter().find(|spec| spec.id == id)
}

pub fn starter_spirit() -> &'static SpiritSpec {
    &SPIRITS[0]
}

pub fn drug_spec(id: ItemId) -> Option<&'static DrugSpec> {
    CRUDE_DRUGS.iter().find(|spec| spec.id == id)
}

pub fn formula_spec(id: ItemId) -> Option<&'static FormulaSpec> {
    FORMULAS.iter().find(|spec| spec.id == id)
}

pub fn request_prompt(spirit_name: &str, mode: GameMode) -> String {
    match mode {
        GameMode::Chain => format!("{spirit_name} wants to link a long chain of herbs!"),
        GameMode::Guard => format!("{spirit_name} asks you to guard the garden tonight."),
        GameMode::Sort => format!("{spirit_name} needs help sorting the drug cabinet."),
    }
}
