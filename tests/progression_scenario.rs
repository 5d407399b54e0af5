//! End-to-end progression through the public store API.

use seirei_garden::sim::catalog::{DO, KA, KON, MOKU, SUI};
use seirei_garden::sim::game::{CraftError, DECAY_INTERVAL_MS, Game};
use seirei_garden::sim::mode::GameMode;
use seirei_garden::sim::presets::ContentPreset;
use seirei_garden::sim::spirits::Mood;

#[test]
fn eight_chain_sessions_unlock_the_full_roster() {
    let mut game = Game::fresh(0).with_seed(2024);
    for _ in 0..8 {
        let reward = game.complete_session(600, GameMode::Chain, None);
        assert_eq!(reward.granted_drug_ids.len(), 1);
        assert_eq!(reward.granted_exp, 10);
    }

    let state = game.state();
    for id in [KA, DO, KON, SUI] {
        assert!(state.spirit(id).is_some_and(|spirit| spirit.unlocked), "{id} locked");
    }
    assert_eq!(state.progress.games_unlocked, 3);
    assert_eq!(state.progress.best_score(GameMode::Chain), 600);
    assert_eq!(state.progress.sessions_played, 8);
    assert!(state.aggregate_proficiency() > 0);
    assert_eq!(state.spirit(MOKU).map(|spirit| spirit.jukuren), Some(80));
    assert_eq!(state.spirit(MOKU).map(|spirit| spirit.mood), Some(Mood::Good));

    let owned: u32 = state.drugs.values().map(|drug| drug.owned_count).sum();
    assert_eq!(owned, 8);
}

#[test]
fn neglected_spirit_is_nursed_back_with_a_brewed_formula() {
    let mut game = Game::fresh(0).with_seed(77);
    game.apply_preset(ContentPreset::UnlockAll);

    // Two weeks away: 70 decay units, so 80 genki drops to 10.
    let two_weeks = DECAY_INTERVAL_MS * 70;
    assert_eq!(game.apply_time_decay(two_weeks), 70);
    let ka = game.state().spirit(KA).expect("ka");
    assert_eq!(ka.genki, 10);
    assert_eq!(ka.mood, Mood::Bad);

    game.craft_formula(2).expect("stocked inventory brews keishito");
    let report = game.heal_spirit(KA, 2).expect("heal");
    assert_eq!(report.recovery, 45);
    let ka = game.state().spirit(KA).expect("ka");
    assert_eq!(ka.genki, 55);
    assert_eq!(ka.mood, Mood::Normal);
    assert_eq!(ka.kizuna, 5);

    game.apply_preset(ContentPreset::NewGame);
    assert!(matches!(
        game.craft_formula(2),
        Err(CraftError::MissingIngredient { .. })
    ));
    assert_eq!(game.state().active_spirits().count(), 1);
}
