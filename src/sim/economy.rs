use super::element::Element;
use super::spirits::Mood;

pub const SCORE_PER_CARD: u32 = 3_500;
pub const MIN_CARDS: u32 = 1;
pub const MAX_CARDS: u32 = 5;
pub const SCORE_PER_EXP: u32 = 60;
pub const GOOD_MOOD_SCORE: u32 = 500;
pub const BAD_MOOD_SCORE: u32 = 150;
pub const SUCCESS_SCORE: u32 = 300;
pub const KIZUNA_PER_HEAL: u8 = 5;

pub fn card_count(score: u32) -> u32 {
    (score / SCORE_PER_CARD).clamp(MIN_CARDS, MAX_CARDS)
}

pub fn proficiency_gain(score: u32) -> u32 {
    score / SCORE_PER_EXP
}

pub fn mood_for_score(score: u32) -> Mood {
    if score >= GOOD_MOOD_SCORE {
        Mood::Good
    } else if score < BAD_MOOD_SCORE {
        Mood::Bad
    } else {
        Mood::Normal
    }
}

pub fn is_success(score: u32) -> bool {
    score >= SUCCESS_SCORE
}

/// Genki restored by an item; matching elements heal half again as much.
pub fn recovery_amount(effect_value: u32, item: Element, spirit: Element) -> u32 {
    if item == spirit {
        effect_value.saturating_mul(3) / 2
    } else {
        effect_value
    }
}

pub fn completion_percent(discovered: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((discovered as f64 / total as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_count_is_clamped() {
        assert_eq!(card_count(0), 1);
        assert_eq!(card_count(3_499), 1);
        assert_eq!(card_count(3_500), 1);
        assert_eq!(card_count(7_000), 2);
        assert_eq!(card_count(17_500), 5);
        assert_eq!(card_count(99_999), 5);
    }

    #[test]
    fn score_mood_thresholds() {
        assert_eq!(mood_for_score(500), Mood::Good);
        assert_eq!(mood_for_score(499), Mood::Normal);
        assert_eq!(mood_for_score(150), Mood::Normal);
        assert_eq!(mood_for_score(149), Mood::Bad);
    }

    #[test]
    fn same_element_recovery_is_floored() {
        assert_eq!(recovery_amount(35, Element::Wood, Element::Wood), 52);
        assert_eq!(recovery_amount(35, Element::Wood, Element::Fire), 35);
    }

    #[test]
    fn completion_rounds_to_nearest_percent() {
        assert_eq!(completion_percent(0, 10), 0);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(5, 5), 100);
        assert_eq!(completion_percent(0, 0), 0);
    }
}
