//! Tara: rock-paper-scissors with a trump move, health pools and an
//! adaptive computer opponent.
//!
//! [`game::logic::Engine`] owns the game state and is the only way to change
//! it. The computer's moves come from an [`ai::Opponent`], and every change is
//! mirrored into a [`storage::Store`] so a session can be resumed later.

pub mod ai;
pub mod game;
pub mod i18n;
pub mod storage;

pub use ai::{AdaptiveOpponent, Opponent, OpponentWeights};
pub use game::logic::{Engine, GameState, Side};
pub use game::rules::{available_moves, does_move_beat, is_standard_move};
pub use game::types::{
    Match, MatchPhase, Move, MoveCounts, Participant, RoundOutcome, RoundReport, UnknownMove,
};
pub use storage::{FileStore, MemoryStore, Persistence, Settings, Store};
