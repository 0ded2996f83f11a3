//! Durable key-value persistence of game state.
//!
//! [`Store`] is the raw string backend; [`Persistence`] layers typed fields on
//! top of it. Reads never fail: absent or malformed content resolves to a
//! default. Writes are best effort: failures are logged and swallowed, the
//! in-memory game state stays authoritative.

pub mod backend;
pub mod settings;

use std::io;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::game::rules::TARA_CAP;
use crate::game::types::{Match, Move, MoveCounts, Participant};

pub use backend::{FileStore, MemoryStore};
pub use settings::{load_settings, save_settings, RuleSettings, Settings};

/// A synchronous string key-value store.
pub trait Store {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
    /// Removing an absent key is not an error.
    fn delete(&mut self, key: &str) -> io::Result<()>;
}

pub const CURRENT_MATCH_KEY: &str = "currentMatch";
pub const GLOBAL_MATCH_NUMBER_KEY: &str = "globalMatchNumber";
/// Round counter written by older versions, before matches existed.
pub const LEGACY_ROUND_NUMBER_KEY: &str = "roundNumber";

const SCORE: &str = "Score";
const TARA_COUNT: &str = "TaraCount";
const MOST_COMMON_MOVE: &str = "MostCommonMove";
const MOVE_COUNTS: &str = "MoveCounts";
const HISTORY: &str = "History";

/// Storage key of a per-participant field, e.g. `playerScore`.
pub fn participant_key(who: Participant, field: &str) -> String {
    format!("{}{}", who.key(), field)
}

/// Typed access to every persisted game field.
#[derive(Debug)]
pub struct Persistence<S: Store> {
    store: S,
}

impl<S: Store> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn read_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("ignoring malformed value for {}: {:?}", key, raw);
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring malformed JSON for {}: {}", key, e);
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.write(key, value) {
            log::warn!("failed to persist {}: {}", key, e);
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, &json),
            Err(e) => log::warn!("failed to encode {}: {}", key, e),
        }
    }

    fn remove(&mut self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            log::warn!("failed to remove {}: {}", key, e);
        }
    }

    // ── scores ──

    pub fn get_score(&self, who: Participant) -> u32 {
        self.read_parsed(&participant_key(who, SCORE)).unwrap_or(0)
    }

    pub fn set_score(&mut self, who: Participant, score: u32) {
        self.write(&participant_key(who, SCORE), &score.to_string());
    }

    pub fn remove_score(&mut self, who: Participant) {
        self.remove(&participant_key(who, SCORE));
    }

    // ── Tara charges ──

    /// Stored charges, clamped to the cap.
    pub fn get_tara_count(&self, who: Participant) -> u32 {
        self.read_parsed::<u32>(&participant_key(who, TARA_COUNT))
            .unwrap_or(0)
            .min(TARA_CAP)
    }

    pub fn set_tara_count(&mut self, who: Participant, count: u32) {
        self.write(&participant_key(who, TARA_COUNT), &count.to_string());
    }

    pub fn remove_tara_count(&mut self, who: Participant) {
        self.remove(&participant_key(who, TARA_COUNT));
    }

    // ── most common move ──

    pub fn get_most_common_move(&self, who: Participant) -> Option<Move> {
        let mv: Move = self.read_parsed(&participant_key(who, MOST_COMMON_MOVE))?;
        mv.is_standard().then_some(mv)
    }

    /// `None` clears the cached value.
    pub fn set_most_common_move(&mut self, who: Participant, mv: Option<Move>) {
        match mv {
            Some(mv) => self.write(&participant_key(who, MOST_COMMON_MOVE), mv.as_str()),
            None => self.remove_most_common_move(who),
        }
    }

    pub fn remove_most_common_move(&mut self, who: Participant) {
        self.remove(&participant_key(who, MOST_COMMON_MOVE));
    }

    // ── move counts ──

    pub fn get_move_counts(&self, who: Participant) -> MoveCounts {
        self.read_json(&participant_key(who, MOVE_COUNTS))
            .unwrap_or_default()
    }

    pub fn set_move_counts(&mut self, who: Participant, counts: &MoveCounts) {
        self.write_json(&participant_key(who, MOVE_COUNTS), counts);
    }

    pub fn remove_move_counts(&mut self, who: Participant) {
        self.remove(&participant_key(who, MOVE_COUNTS));
    }

    // ── history ──

    pub fn get_history(&self, who: Participant) -> Vec<Move> {
        self.read_json(&participant_key(who, HISTORY))
            .unwrap_or_default()
    }

    pub fn set_history(&mut self, who: Participant, history: &[Move]) {
        self.write_json(&participant_key(who, HISTORY), &history);
    }

    pub fn remove_history(&mut self, who: Participant) {
        self.remove(&participant_key(who, HISTORY));
    }

    // ── match ──

    pub fn get_match(&self) -> Option<Match> {
        self.read_json(CURRENT_MATCH_KEY)
    }

    /// `None` deletes the stored match.
    pub fn set_match(&mut self, current: Option<&Match>) {
        match current {
            Some(m) => self.write_json(CURRENT_MATCH_KEY, m),
            None => self.remove(CURRENT_MATCH_KEY),
        }
    }

    pub fn get_global_match_number(&self) -> Option<u32> {
        self.read_parsed(GLOBAL_MATCH_NUMBER_KEY)
    }

    /// `None` deletes the stored counter.
    pub fn set_global_match_number(&mut self, number: Option<u32>) {
        match number {
            Some(n) => self.write(GLOBAL_MATCH_NUMBER_KEY, &n.to_string()),
            None => self.remove(GLOBAL_MATCH_NUMBER_KEY),
        }
    }

    // ── legacy ──

    pub fn get_legacy_round_number(&self) -> Option<u32> {
        self.read_parsed(LEGACY_ROUND_NUMBER_KEY)
    }

    pub fn remove_legacy_round_number(&mut self) {
        self.remove(LEGACY_ROUND_NUMBER_KEY);
    }
}
