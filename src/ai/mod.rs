use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::logic::GameState;
use crate::game::rules::available_moves;
use crate::game::types::{Move, Participant};

/// Chooses the computer's move from the observed game state.
pub trait Opponent {
    fn choose_move(&mut self, state: &GameState) -> Move;
}

/// Tunable weights of the adaptive opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentWeights {
    /// Weight of the move that beats the player's habit.
    pub counter: u32,
    /// Weight of the two other standard moves while countering.
    pub other: u32,
    /// Added to the computer's own habit when the player has none.
    pub habit_bonus: u32,
    pub tara_base: u32,
    pub tara_max: u32,
    /// Tara weight while the computer leads on score.
    pub tara_when_ahead: u32,
    pub tara_when_even: u32,
}

impl Default for OpponentWeights {
    fn default() -> Self {
        Self {
            counter: 5,
            other: 2,
            habit_bonus: 2,
            tara_base: 3,
            tara_max: 10,
            tara_when_ahead: 1,
            tara_when_even: 2,
        }
    }
}

/// Weighted-random opponent that counters the player's most common move.
#[derive(Debug, Clone)]
pub struct AdaptiveOpponent<R: Rng> {
    rng: R,
    weights: OpponentWeights,
}

impl AdaptiveOpponent<StdRng> {
    /// Opponent seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible opponent.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AdaptiveOpponent<R> {
    pub fn new(rng: R) -> Self {
        Self::with_weights(rng, OpponentWeights::default())
    }

    pub fn with_weights(rng: R, weights: OpponentWeights) -> Self {
        Self { rng, weights }
    }

    pub fn weights(&self) -> &OpponentWeights {
        &self.weights
    }
}

impl<R: Rng> Opponent for AdaptiveOpponent<R> {
    fn choose_move(&mut self, state: &GameState) -> Move {
        let has_tara = state.tara_count(Participant::Computer) > 0;
        let available = available_moves(has_tara);
        let weights = move_weights(state, &self.weights);
        let pool = weighted_pool(available, &weights);
        log::debug!("opponent weights {:?}, pool of {}", weights, pool.len());
        pick(&pool, &mut self.rng)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Weights
// ════════════════════════════════════════════════════════════════════════════

fn base_weights() -> BTreeMap<Move, u32> {
    BTreeMap::from([
        (Move::Rock, 1),
        (Move::Paper, 1),
        (Move::Scissors, 1),
        (Move::Tara, 0),
    ])
}

/// Standard-move weights by scenario: counter the player's habit if it has
/// one, otherwise lean on the computer's own habit, otherwise uniform.
fn standard_weights(state: &GameState, w: &OpponentWeights) -> BTreeMap<Move, u32> {
    if let Some(counter) = state
        .most_common_move(Participant::Player)
        .and_then(Move::counter)
    {
        return Move::STANDARD
            .iter()
            .map(|&m| (m, if m == counter { w.counter } else { w.other }))
            .collect();
    }

    let mut weights: BTreeMap<Move, u32> =
        Move::STANDARD.iter().map(|&m| (m, 1)).collect();
    if let Some(habit) = state.most_common_move(Participant::Computer) {
        if let Some(weight) = weights.get_mut(&habit) {
            *weight += w.habit_bonus;
        }
    }
    weights
}

/// Tara weight from `player score - computer score`. The further the player
/// leads, the more often Tara is thrown.
pub fn tara_weight(score_diff: i64, w: &OpponentWeights) -> u32 {
    if score_diff > 0 {
        let boosted = i64::from(w.tara_base).saturating_add(score_diff);
        boosted.min(i64::from(w.tara_max)) as u32
    } else if score_diff < 0 {
        w.tara_when_ahead
    } else {
        w.tara_when_even
    }
}

/// Final weight of every move for the current state.
pub fn move_weights(state: &GameState, w: &OpponentWeights) -> BTreeMap<Move, u32> {
    let mut weights = base_weights();
    weights.extend(standard_weights(state, w));

    let has_tara = state.tara_count(Participant::Computer) > 0;
    if available_moves(has_tara).contains(&Move::Tara) {
        let diff = i64::from(state.score(Participant::Player))
            - i64::from(state.score(Participant::Computer));
        weights.insert(Move::Tara, tara_weight(diff, w));
    }
    weights
}

// ════════════════════════════════════════════════════════════════════════════
// Selection
// ════════════════════════════════════════════════════════════════════════════

/// Each available move repeated by its weight. Zero weight excludes a move.
pub fn weighted_pool(available: &[Move], weights: &BTreeMap<Move, u32>) -> Vec<Move> {
    available
        .iter()
        .flat_map(|&m| {
            let n = weights.get(&m).copied().unwrap_or(0) as usize;
            std::iter::repeat(m).take(n)
        })
        .collect()
}

/// Uniform pick from the pool. An empty pool falls back to rock.
pub fn pick<R: Rng>(pool: &[Move], rng: &mut R) -> Move {
    if pool.is_empty() {
        return Move::Rock;
    }
    pool[rng.gen_range(0..pool.len())]
}
