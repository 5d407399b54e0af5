use super::catalog;
use super::mode::GameMode;
use super::spirits::Spirit;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const REQUEST_TTL_MS: i64 = 60 * 60 * 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiritRequest {
    pub spirit_id: String,
    pub mode: GameMode,
    pub prompt: String,
    pub expires_at: i64,
}

impl SpiritRequest {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Draws a request uniformly over unlocked spirits and modes. `None` when every
/// spirit is locked.
pub fn draw_request(spirits: &[Spirit], now: i64, rng: &mut impl Rng) -> Option<SpiritRequest> {
    let unlocked: Vec<&Spirit> = spirits.iter().filter(|spirit| spirit.unlocked).collect();
    let spirit = unlocked.choose(rng)?;
    let mode = *GameMode::ALL.choose(rng)?;
    Some(SpiritRequest {
        spirit_id: spirit.id.clone(),
        mode,
        prompt: catalog::request_prompt(&spirit.name, mode),
        expires_at: now.saturating_add(REQUEST_TTL_MS),
    })
}
