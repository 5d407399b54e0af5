//! Line-oriented console commands and plain-text views of the store.

use crate::sim::game::{CraftError, GameState};
use crate::sim::items::ItemId;
use crate::sim::mode::GameMode;
use crate::sim::presets::ContentPreset;
use crate::sim::progress::Flag;
use std::fmt::Write;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  status                         spirits, request and progress
  inventory                      crude drugs and formulas
  play <chain|guard|sort> <score> [level]
  heal <spirit> <formula-id>     use a formula on a spirit
  feed <spirit> <drug-id>        use a crude drug on a spirit
  craft <formula-id>             brew a formula from crude drugs
  request                        draw a new spirit request
  preset <new-game|unlock-all|spirits-only|half-discovered>
  flag <debug-panel|tutorial-completed|sound> <on|off>
  notice                         read and dismiss the unlock notice
  checkout                       open the premium checkout page
  quit                           save and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Help,
    Status,
    Inventory,
    Play {
        mode: GameMode,
        score: u32,
        level: Option<u32>,
    },
    Heal { spirit_id: String, formula_id: ItemId },
    Feed { spirit_id: String, drug_id: ItemId },
    Craft { formula_id: ItemId },
    Request,
    Preset(ContentPreset),
    SetFlag { flag: Flag, value: bool },
    Notice,
    Checkout,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("type a command (try 'help')")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

pub fn parse_action(line: &str) -> Result<Action, ParseError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(ParseError::Empty)?.to_ascii_lowercase();
    let action = match command.as_str() {
        "help" | "?" => Action::Help,
        "status" | "s" => Action::Status,
        "inventory" | "inv" | "i" => Action::Inventory,
        "play" => Action::Play {
            mode: parse_arg(words.next(), "mode")?,
            score: parse_arg(words.next(), "score")?,
            level: words
                .next()
                .map(|value| parse_arg(Some(value), "level"))
                .transpose()?,
        },
        "heal" => Action::Heal {
            spirit_id: required(words.next(), "spirit")?.to_ascii_lowercase(),
            formula_id: parse_arg(words.next(), "formula id")?,
        },
        "feed" => Action::Feed {
            spirit_id: required(words.next(), "spirit")?.to_ascii_lowercase(),
            drug_id: parse_arg(words.next(), "drug id")?,
        },
        "craft" => Action::Craft {
            formula_id: parse_arg(words.next(), "formula id")?,
        },
        "request" => Action::Request,
        "preset" => Action::Preset(parse_arg(words.next(), "preset")?),
        "flag" => Action::SetFlag {
            flag: parse_arg(words.next(), "flag")?,
            value: parse_switch(required(words.next(), "on/off")?)?,
        },
        "notice" => Action::Notice,
        "checkout" => Action::Checkout,
        "quit" | "exit" | "q" => Action::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(action)
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ParseError> {
    value.ok_or(ParseError::MissingArgument(name))
}

fn parse_arg<T>(value: Option<&str>, name: &'static str) -> Result<T, ParseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    required(value, name)?
        .parse()
        .map_err(|err: T::Err| ParseError::InvalidArgument {
            name,
            reason: err.to_string(),
        })
}

fn parse_switch(value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(ParseError::InvalidArgument {
            name: "on/off",
            reason: format!("expected on or off, got '{other}'"),
        }),
    }
}

/// Console follow-up for a refused craft, on top of the logged reason.
pub fn craft_hint(err: &CraftError) -> Option<String> {
    match err {
        CraftError::MissingIngredient { name, have, need } => Some(format!(
            "Collect {} more {name} from mini-game sessions.",
            need.saturating_sub(*have)
        )),
        CraftError::UnknownFormula(_) => Some("Type 'inventory' to list formula ids.".to_string()),
        CraftError::UnknownIngredient(_) => None,
    }
}

pub fn status_report(state: &GameState) -> String {
    let progress = &state.progress;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sessions: {}  Games: {}/{}  Proficiency: {}  Premium: {}",
        progress.sessions_played,
        progress.games_unlocked,
        GameMode::ALL.len(),
        state.aggregate_proficiency(),
        if progress.premium_unlocked { "yes" } else { "no" }
    );
    for spirit in &state.spirits {
        if spirit.unlocked {
            let _ = writeln!(
                out,
                "  {:<5} {:<5} genki {:>3}  kizuna {:>3}  jukuren {:>4}  mood {}",
                spirit.id,
                spirit.element.label(),
                spirit.genki,
                spirit.kizuna,
                spirit.jukuren,
                spirit.mood.label()
            );
        } else {
            let _ = writeln!(out, "  {:<5} (locked)", spirit.id);
        }
    }
    for mode in GameMode::ALL {
        let _ = writeln!(
            out,
            "  {:<6} best {:>6}  tiers {}",
            mode.label(),
            progress.best_score(mode),
            progress.levels_unlocked(mode)
        );
    }
    match &progress.active_request {
        Some(request) => {
            let _ = writeln!(out, "Request: {} [{}]", request.prompt, request.mode);
        }
        None => {
            let _ = writeln!(out, "Request: none");
        }
    }
    out
}

pub fn inventory_report(state: &GameState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Crude drugs ({}% discovered):", state.drug_completion());
    for drug in state.drugs.values() {
        if drug.discovered {
            let _ = writeln!(
                out,
                "  #{:<2} {:<18} {:<5} x{}",
                drug.id,
                drug.name,
                drug.element.label(),
                drug.owned_count
            );
        } else {
            let _ = writeln!(out, "  #{:<2} ???", drug.id);
        }
    }
    let _ = writeln!(out, "Formulas ({}% discovered):", state.formula_completion());
    for formula in state.formulas.values() {
        let recipe: Vec<String> = formula
            .recipe
            .iter()
            .map(|entry| {
                let name = state
                    .drugs
                    .get(&entry.drug_id)
                    .filter(|drug| drug.discovered)
                    .map(|drug| drug.name.as_str())
                    .unwrap_or("???");
                format!("{name} x{}", entry.count)
            })
            .collect();
        let _ = writeln!(
            out,
            "  #{:<2} {:<12} x{}  <- {}",
            formula.item.id,
            formula.item.name,
            formula.item.owned_count,
            recipe.join(", ")
        );
    }
    out
}
