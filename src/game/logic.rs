use super::rules::{does_move_beat, TARA_CAP};
use super::types::{Match, MatchPhase, Move, MoveCounts, Participant, RoundOutcome, RoundReport};
use crate::ai::Opponent;
use crate::storage::{Persistence, RuleSettings, Store};

/// Everything tracked for one participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Side {
    pub score: u32,
    /// Move registered for the round being played.
    pub current_move: Option<Move>,
    pub tara_count: u32,
    pub most_common_move: Option<Move>,
    pub move_counts: MoveCounts,
    pub history: Vec<Move>,
}

/// In-memory aggregate of the whole game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub player: Side,
    pub computer: Side,
    pub global_match_number: u32,
    pub current_match: Option<Match>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            player: Side::default(),
            computer: Side::default(),
            global_match_number: 1,
            current_match: None,
        }
    }
}

impl GameState {
    pub fn side(&self, who: Participant) -> &Side {
        match who {
            Participant::Player => &self.player,
            Participant::Computer => &self.computer,
        }
    }

    fn side_mut(&mut self, who: Participant) -> &mut Side {
        match who {
            Participant::Player => &mut self.player,
            Participant::Computer => &mut self.computer,
        }
    }

    pub fn score(&self, who: Participant) -> u32 {
        self.side(who).score
    }

    pub fn tara_count(&self, who: Participant) -> u32 {
        self.side(who).tara_count
    }

    pub fn most_common_move(&self, who: Participant) -> Option<Move> {
        self.side(who).most_common_move
    }

    pub fn move_counts(&self, who: Participant) -> MoveCounts {
        self.side(who).move_counts
    }

    pub fn current_move(&self, who: Participant) -> Option<Move> {
        self.side(who).current_move
    }

    pub fn phase(&self) -> MatchPhase {
        match &self.current_match {
            None => MatchPhase::NoMatch,
            Some(m) if m.is_over() => MatchPhase::Over,
            Some(_) => MatchPhase::InProgress,
        }
    }
}

/// Owns the game state, applies the rules and mirrors every change into
/// storage.
pub struct Engine<S: Store, O: Opponent> {
    state: GameState,
    storage: Persistence<S>,
    opponent: O,
    rules: RuleSettings,
    // Outcome of the round whose moves are currently registered
    resolved: Option<RoundOutcome>,
}

impl<S: Store, O: Opponent> Engine<S, O> {
    pub fn new(storage: Persistence<S>, opponent: O) -> Self {
        Self::with_rules(storage, opponent, RuleSettings::default())
    }

    /// Load the persisted game, migrating legacy data if found.
    pub fn with_rules(storage: Persistence<S>, opponent: O, rules: RuleSettings) -> Self {
        let mut state = GameState::default();
        for who in Participant::BOTH {
            let counts = storage.get_move_counts(who);
            let side = state.side_mut(who);
            side.score = storage.get_score(who);
            side.tara_count = storage.get_tara_count(who);
            side.most_common_move = storage
                .get_most_common_move(who)
                .or_else(|| counts.most_common());
            side.move_counts = counts;
            side.history = storage.get_history(who);
        }
        state.global_match_number = storage.get_global_match_number().unwrap_or(1);
        state.current_match = storage.get_match();

        let mut engine = Self {
            state,
            storage,
            opponent,
            rules,
            resolved: None,
        };
        engine.migrate_legacy_round();
        engine
    }

    /// Turn the round counter of older saves into a match.
    fn migrate_legacy_round(&mut self) {
        if self.state.current_match.is_some() {
            return;
        }
        let round = match self.storage.get_legacy_round_number() {
            Some(round) if round > 0 => round,
            _ => return,
        };
        log::info!("migrating legacy round {} into a match", round);
        let m = Match::at_round(round, self.rules.initial_health, self.rules.damage_per_loss);
        self.state.current_match = Some(m);
        self.storage.set_match(Some(&m));
        self.storage.remove_legacy_round_number();
        self.state.global_match_number = 1;
        self.storage.set_global_match_number(Some(1));
    }

    // ── accessors ──

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn storage(&self) -> &Persistence<S> {
        &self.storage
    }

    pub fn into_storage(self) -> Persistence<S> {
        self.storage
    }

    pub fn rules(&self) -> &RuleSettings {
        &self.rules
    }

    pub fn score(&self, who: Participant) -> u32 {
        self.state.score(who)
    }

    pub fn tara_count(&self, who: Participant) -> u32 {
        self.state.tara_count(who)
    }

    pub fn most_common_move(&self, who: Participant) -> Option<Move> {
        self.state.most_common_move(who)
    }

    pub fn move_counts(&self, who: Participant) -> MoveCounts {
        self.state.move_counts(who)
    }

    pub fn history(&self, who: Participant) -> &[Move] {
        &self.state.side(who).history
    }

    pub fn current_move(&self, who: Participant) -> Option<Move> {
        self.state.current_move(who)
    }

    /// Health in the current match, the starting health when none is active.
    pub fn health(&self, who: Participant) -> u32 {
        self.state
            .current_match
            .map(|m| m.health(who))
            .unwrap_or(self.rules.initial_health)
    }

    /// Round of the current match, 1 when none is active.
    pub fn round_number(&self) -> u32 {
        self.state.current_match.map(|m| m.round_number).unwrap_or(1)
    }

    pub fn global_match_number(&self) -> u32 {
        self.state.global_match_number
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.state.current_match.as_ref()
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase()
    }

    pub fn is_match_active(&self) -> bool {
        self.state.current_match.is_some()
    }

    pub fn is_match_over(&self) -> bool {
        self.phase() == MatchPhase::Over
    }

    /// Winner of the finished match, `None` while it is still running.
    pub fn match_winner(&self) -> Option<Participant> {
        self.state.current_match.and_then(|m| m.winner())
    }

    // ── match lifecycle ──

    /// Start a match unless one is already active. Returns `true` if a new
    /// match was created.
    pub fn start_or_resume_match(&mut self) -> bool {
        if self.state.current_match.is_some() {
            return false;
        }
        let m = Match::new(self.rules.initial_health, self.rules.damage_per_loss);
        log::debug!("starting match {}", self.state.global_match_number);
        self.state.current_match = Some(m);
        self.storage.set_match(Some(&m));
        true
    }

    /// Settle a finished match: score the winner, advance the match counter
    /// and clear the match. `None` if the match is not over.
    pub fn consume_match_outcome(&mut self) -> Option<Participant> {
        let winner = self.match_winner()?;

        let score = self.state.side(winner).score + 1;
        self.state.side_mut(winner).score = score;
        self.storage.set_score(winner, score);

        self.state.global_match_number += 1;
        self.storage
            .set_global_match_number(Some(self.state.global_match_number));

        self.state.current_match = None;
        self.storage.set_match(None);
        self.retire_registered_moves();
        log::debug!("match won by {}", winner);
        Some(winner)
    }

    // ── rounds ──

    /// A Tara without charges is replaced by rock.
    fn legalize(&self, who: Participant, mv: Move) -> Move {
        if mv == Move::Tara && self.state.tara_count(who) == 0 {
            log::debug!("{} has no tara charge, playing rock", who);
            Move::Rock
        } else {
            mv
        }
    }

    fn register_move(&mut self, who: Participant, mv: Move) -> Move {
        let mv = self.legalize(who, mv);
        self.state.side_mut(who).current_move = Some(mv);
        self.resolved = None;
        mv
    }

    /// Register the player's move, returning the move that will actually be
    /// played.
    pub fn register_player_move(&mut self, mv: Move) -> Move {
        self.register_move(Participant::Player, mv)
    }

    pub fn register_computer_move(&mut self, mv: Move) -> Move {
        self.register_move(Participant::Computer, mv)
    }

    /// Let the opponent pick and register the computer's move.
    pub fn choose_computer_move(&mut self) -> Move {
        let mv = self.opponent.choose_move(&self.state);
        self.register_computer_move(mv)
    }

    /// Moves still registered when their match goes away belong to no
    /// match; they evaluate as `Invalid` until new moves are registered.
    fn retire_registered_moves(&mut self) {
        let registered = self.state.player.current_move.is_some()
            || self.state.computer.current_move.is_some();
        self.resolved = registered.then_some(RoundOutcome::Invalid);
    }

    /// Clear both registered moves.
    pub fn reset_moves(&mut self) {
        self.state.player.current_move = None;
        self.state.computer.current_move = None;
        self.resolved = None;
    }

    /// Resolve the round for the registered moves.
    ///
    /// Starts a match first if none is active. Evaluating again before new
    /// moves are registered returns the same outcome without applying it
    /// twice, and moves left over from a settled or abandoned match evaluate
    /// as `Invalid`. Moves are left in place. A registered Tara whose charge
    /// is gone by now is played as rock.
    pub fn evaluate_round(&mut self) -> RoundOutcome {
        if let Some(outcome) = self.resolved {
            return outcome;
        }
        let (player_move, computer_move) = match (
            self.state.player.current_move,
            self.state.computer.current_move,
        ) {
            (Some(p), Some(c)) => (p, c),
            _ => return RoundOutcome::Invalid,
        };
        self.start_or_resume_match();
        if self.is_match_over() {
            return RoundOutcome::Invalid;
        }

        let player_move = self.settle_move(Participant::Player, player_move);
        let computer_move = self.settle_move(Participant::Computer, computer_move);

        let outcome = if does_move_beat(player_move, computer_move) {
            RoundOutcome::Win(Participant::Player)
        } else if does_move_beat(computer_move, player_move) {
            RoundOutcome::Win(Participant::Computer)
        } else {
            RoundOutcome::Tie
        };

        if let RoundOutcome::Win(winner) = outcome {
            self.count_move(Participant::Player, player_move);
            self.count_move(Participant::Computer, computer_move);
            let winning_move = if winner == Participant::Player {
                player_move
            } else {
                computer_move
            };
            if winning_move.is_standard() {
                self.credit_tara(winner);
            }
            self.damage(winner.opponent());
        }
        self.advance_round();

        log::debug!(
            "round: {} vs {} -> {:?}",
            player_move,
            computer_move,
            outcome
        );
        self.resolved = Some(outcome);
        outcome
    }

    /// Register `player_move`, let the opponent answer and resolve the round.
    pub fn play_round(&mut self, player_move: Move) -> RoundReport {
        self.reset_moves();
        self.start_or_resume_match();
        let player = self.register_player_move(player_move);
        let computer = self.choose_computer_move();
        let outcome = self.evaluate_round();
        RoundReport {
            player_move: Some(player),
            computer_move: Some(computer),
            outcome,
            match_over: self.is_match_over(),
        }
    }

    /// Check a registered move against the charges held right now, spend
    /// the charge of a Tara and record the move actually played.
    fn settle_move(&mut self, who: Participant, mv: Move) -> Move {
        let mv = self.legalize(who, mv);
        self.state.side_mut(who).current_move = Some(mv);
        if mv == Move::Tara {
            self.spend_tara(who);
        }
        self.record_history(who, mv);
        mv
    }

    fn spend_tara(&mut self, who: Participant) {
        let side = self.state.side_mut(who);
        side.tara_count = side.tara_count.saturating_sub(1);
        let count = side.tara_count;
        self.storage.set_tara_count(who, count);
    }

    fn credit_tara(&mut self, who: Participant) {
        let side = self.state.side_mut(who);
        if side.tara_count >= TARA_CAP {
            return;
        }
        side.tara_count += 1;
        let count = side.tara_count;
        self.storage.set_tara_count(who, count);
    }

    fn record_history(&mut self, who: Participant, mv: Move) {
        let side = self.state.side_mut(who);
        side.history.push(mv);
        self.storage.set_history(who, &self.state.side(who).history);
    }

    fn count_move(&mut self, who: Participant, mv: Move) {
        if !mv.is_standard() {
            return;
        }
        let side = self.state.side_mut(who);
        side.move_counts.increment(mv);
        side.most_common_move = side.move_counts.most_common();
        let (counts, common) = (side.move_counts, side.most_common_move);
        self.storage.set_move_counts(who, &counts);
        self.storage.set_most_common_move(who, common);
    }

    fn damage(&mut self, who: Participant) {
        let fallback = self.rules.damage_per_loss;
        if let Some(m) = self.state.current_match.as_mut() {
            m.damage(who, m.damage_per_loss.unwrap_or(fallback));
        }
    }

    /// Next round number unless the match just ended. Persists the match.
    fn advance_round(&mut self) {
        if let Some(m) = self.state.current_match.as_mut() {
            if !m.is_over() {
                m.round_number += 1;
            }
            let m = *m;
            self.storage.set_match(Some(&m));
        }
    }

    // ── resets ──

    /// Zero both scores.
    pub fn reset_scores(&mut self) {
        for who in Participant::BOTH {
            self.state.side_mut(who).score = 0;
            self.storage.remove_score(who);
        }
    }

    /// Abandon the current match without scoring it.
    pub fn reset_match(&mut self) {
        self.state.current_match = None;
        self.storage.set_match(None);
        self.retire_registered_moves();
    }

    /// Clear every persisted field and start from scratch.
    pub fn reset_all(&mut self) {
        for who in Participant::BOTH {
            *self.state.side_mut(who) = Side::default();
            self.storage.remove_score(who);
            self.storage.remove_tara_count(who);
            self.storage.remove_most_common_move(who);
            self.storage.remove_move_counts(who);
            self.storage.remove_history(who);
        }
        self.reset_match();
        self.resolved = None;
        self.state.global_match_number = 1;
        self.storage.set_global_match_number(None);
        self.storage.remove_legacy_round_number();
        log::info!("game state reset");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::storage::{MemoryStore, Store};
    use proptest::prelude::*;

    /// Plays a fixed list of moves, then rock forever.
    #[derive(Debug, Default)]
    struct Scripted(VecDeque<Move>);

    impl Opponent for Scripted {
        fn choose_move(&mut self, _state: &GameState) -> Move {
            self.0.pop_front().unwrap_or(Move::Rock)
        }
    }

    fn scripted(moves: &[Move]) -> Scripted {
        Scripted(moves.iter().copied().collect())
    }

    fn fresh() -> Engine<MemoryStore, Scripted> {
        Engine::new(Persistence::new(MemoryStore::new()), Scripted::default())
    }

    fn from_store(store: MemoryStore) -> Engine<MemoryStore, Scripted> {
        Engine::new(Persistence::new(store), Scripted::default())
    }

    fn store_with(pairs: &[(&str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (k, v) in pairs {
            store.write(k, v).unwrap();
        }
        store
    }

    fn round(engine: &mut Engine<MemoryStore, Scripted>, p: Move, c: Move) -> RoundOutcome {
        engine.reset_moves();
        engine.register_player_move(p);
        engine.register_computer_move(c);
        engine.evaluate_round()
    }

    #[test]
    fn test_fresh_engine() {
        let engine = fresh();
        assert_eq!(engine.score(Participant::Player), 0);
        assert_eq!(engine.score(Participant::Computer), 0);
        assert_eq!(engine.round_number(), 1);
        assert_eq!(engine.global_match_number(), 1);
        assert!(!engine.is_match_active());
        assert_eq!(engine.phase(), MatchPhase::NoMatch);
        assert_eq!(engine.health(Participant::Player), 100);
    }

    #[test]
    fn test_start_or_resume() {
        let mut engine = fresh();
        assert!(engine.start_or_resume_match());
        assert_eq!(engine.phase(), MatchPhase::InProgress);
        round(&mut engine, Move::Rock, Move::Scissors);
        assert!(!engine.start_or_resume_match());
        assert_eq!(engine.round_number(), 2);
        assert_eq!(engine.health(Participant::Computer), 50);
    }

    #[test]
    fn test_player_wins_round() {
        let mut engine = fresh();
        engine.start_or_resume_match();
        let outcome = round(&mut engine, Move::Rock, Move::Scissors);
        assert_eq!(outcome, RoundOutcome::Win(Participant::Player));
        assert_eq!(engine.health(Participant::Computer), 50);
        assert_eq!(engine.health(Participant::Player), 100);
        assert_eq!(engine.tara_count(Participant::Player), 1);
        assert_eq!(engine.tara_count(Participant::Computer), 0);
        assert_eq!(engine.round_number(), 2);
    }

    #[test]
    fn test_tie_changes_nothing() {
        let mut engine = fresh();
        engine.start_or_resume_match();
        let outcome = round(&mut engine, Move::Scissors, Move::Scissors);
        assert_eq!(outcome, RoundOutcome::Tie);
        for who in Participant::BOTH {
            assert_eq!(engine.score(who), 0);
            assert_eq!(engine.health(who), 100);
            assert_eq!(engine.tara_count(who), 0);
            assert_eq!(engine.move_counts(who), MoveCounts::default());
        }
    }

    #[test]
    fn test_missing_move_is_invalid() {
        let mut engine = fresh();
        engine.register_player_move(Move::Paper);
        assert_eq!(engine.evaluate_round(), RoundOutcome::Invalid);
        assert!(!engine.is_match_active());
        assert!(engine.history(Participant::Player).is_empty());
    }

    #[test]
    fn test_evaluating_twice_applies_once() {
        let mut engine = fresh();
        engine.register_player_move(Move::Paper);
        engine.register_computer_move(Move::Rock);
        let first = engine.evaluate_round();
        let second = engine.evaluate_round();
        assert_eq!(first, second);
        assert_eq!(engine.health(Participant::Computer), 50);
        assert_eq!(engine.tara_count(Participant::Player), 1);
        assert_eq!(engine.round_number(), 2);
        // moves stay registered until the caller clears them
        assert_eq!(engine.current_move(Participant::Player), Some(Move::Paper));
        assert_eq!(engine.current_move(Participant::Computer), Some(Move::Rock));
    }

    #[test]
    fn test_stale_tara_without_charge_plays_rock() {
        let mut engine = from_store(store_with(&[("playerTaraCount", "1")]));
        engine.register_player_move(Move::Tara);
        engine.register_computer_move(Move::Rock);
        assert_eq!(engine.evaluate_round(), RoundOutcome::Win(Participant::Player));
        assert_eq!(engine.tara_count(Participant::Player), 0);

        // the player's Tara is still registered but its charge is gone
        engine.register_computer_move(Move::Paper);
        assert_eq!(engine.evaluate_round(), RoundOutcome::Win(Participant::Computer));
        assert_eq!(engine.current_move(Participant::Player), Some(Move::Rock));
        assert_eq!(engine.history(Participant::Player), &[Move::Tara, Move::Rock]);
        assert_eq!(engine.tara_count(Participant::Player), 0);
        assert_eq!(engine.storage().get_tara_count(Participant::Player), 0);
        assert_eq!(engine.move_counts(Participant::Player).rock, 1);
    }

    #[test]
    fn test_settled_match_is_not_replayed() {
        let mut engine = fresh();
        round(&mut engine, Move::Rock, Move::Scissors);
        round(&mut engine, Move::Rock, Move::Scissors);
        assert_eq!(engine.consume_match_outcome(), Some(Participant::Player));

        assert_eq!(engine.evaluate_round(), RoundOutcome::Invalid);
        assert!(!engine.is_match_active());
        assert_eq!(engine.storage().get_match(), None);
        assert_eq!(engine.health(Participant::Computer), engine.rules().initial_health);
        assert_eq!(engine.tara_count(Participant::Player), 2);
        assert_eq!(engine.history(Participant::Player).len(), 2);
        assert_eq!(engine.score(Participant::Player), 1);
        assert_eq!(engine.global_match_number(), 2);

        // fresh moves open the next match
        engine.register_player_move(Move::Rock);
        assert_eq!(engine.evaluate_round(), RoundOutcome::Win(Participant::Player));
        assert!(engine.is_match_active());
        assert_eq!(engine.history(Participant::Player).len(), 3);
    }

    #[test]
    fn test_abandoned_match_is_not_replayed() {
        let mut engine = fresh();
        round(&mut engine, Move::Paper, Move::Rock);
        engine.reset_match();
        assert_eq!(engine.evaluate_round(), RoundOutcome::Invalid);
        assert!(!engine.is_match_active());
        assert_eq!(engine.history(Participant::Computer), &[Move::Rock]);
    }

    #[test]
    fn test_uncharged_tara_becomes_rock() {
        let mut engine = fresh();
        assert_eq!(engine.register_player_move(Move::Tara), Move::Rock);
        engine.register_computer_move(Move::Scissors);
        assert_eq!(engine.evaluate_round(), RoundOutcome::Win(Participant::Player));
        assert_eq!(engine.history(Participant::Player), &[Move::Rock]);
        // credited for the rock win, never spent
        assert_eq!(engine.tara_count(Participant::Player), 1);
    }

    #[test]
    fn test_tara_spent_on_every_outcome() {
        let mut engine = from_store(store_with(&[
            ("playerTaraCount", "3"),
            ("computerTaraCount", "1"),
            ("currentMatch", r#"{"roundNumber":1,"playerHealth":1000,"computerHealth":1000}"#),
        ]));

        // win with tara: spent, not credited
        assert_eq!(
            round(&mut engine, Move::Tara, Move::Paper),
            RoundOutcome::Win(Participant::Player)
        );
        assert_eq!(engine.tara_count(Participant::Player), 2);

        // tara against tara: both spend
        assert_eq!(round(&mut engine, Move::Tara, Move::Tara), RoundOutcome::Tie);
        assert_eq!(engine.tara_count(Participant::Player), 1);
        assert_eq!(engine.tara_count(Participant::Computer), 0);

        // computer has none left, its tara is rock
        assert_eq!(
            round(&mut engine, Move::Tara, Move::Tara),
            RoundOutcome::Win(Participant::Player)
        );
        assert_eq!(engine.current_move(Participant::Computer), Some(Move::Rock));
        assert_eq!(engine.tara_count(Participant::Player), 0);
        assert_eq!(engine.storage().get_tara_count(Participant::Player), 0);
    }

    #[test]
    fn test_tara_never_counted() {
        let mut engine = from_store(store_with(&[("playerTaraCount", "1")]));
        round(&mut engine, Move::Tara, Move::Rock);
        assert_eq!(engine.move_counts(Participant::Player), MoveCounts::default());
        assert_eq!(engine.move_counts(Participant::Computer).rock, 1);
        assert_eq!(engine.most_common_move(Participant::Computer), Some(Move::Rock));
    }

    #[test]
    fn test_most_common_move_tracking() {
        let mut engine = Engine::with_rules(
            Persistence::new(MemoryStore::new()),
            Scripted::default(),
            RuleSettings {
                initial_health: 1000,
                damage_per_loss: 1,
            },
        );
        assert_eq!(engine.rules().initial_health, 1000);
        round(&mut engine, Move::Rock, Move::Scissors);
        assert_eq!(engine.most_common_move(Participant::Player), Some(Move::Rock));
        round(&mut engine, Move::Paper, Move::Rock);
        assert_eq!(engine.most_common_move(Participant::Player), None);
        round(&mut engine, Move::Paper, Move::Scissors);
        assert_eq!(engine.most_common_move(Participant::Player), Some(Move::Paper));
        assert_eq!(
            engine.storage().get_most_common_move(Participant::Player),
            Some(Move::Paper)
        );
        assert_eq!(engine.most_common_move(Participant::Computer), Some(Move::Scissors));
    }

    #[test]
    fn test_match_lifecycle() {
        let mut engine = fresh();
        engine.start_or_resume_match();
        round(&mut engine, Move::Rock, Move::Paper);
        assert_eq!(engine.round_number(), 2);
        let outcome = round(&mut engine, Move::Scissors, Move::Rock);
        assert_eq!(outcome, RoundOutcome::Win(Participant::Computer));
        assert_eq!(engine.health(Participant::Player), 0);
        assert_eq!(engine.phase(), MatchPhase::Over);
        // no increment on the final round
        assert_eq!(engine.round_number(), 2);
        assert_eq!(engine.match_winner(), Some(Participant::Computer));

        // no further rounds until the outcome is consumed
        assert_eq!(round(&mut engine, Move::Paper, Move::Rock), RoundOutcome::Invalid);
        assert_eq!(engine.health(Participant::Computer), 100);

        assert_eq!(engine.consume_match_outcome(), Some(Participant::Computer));
        assert_eq!(engine.score(Participant::Computer), 1);
        assert_eq!(engine.score(Participant::Player), 0);
        assert_eq!(engine.global_match_number(), 2);
        assert_eq!(engine.phase(), MatchPhase::NoMatch);
        assert_eq!(engine.storage().get_match(), None);
        assert_eq!(engine.storage().get_global_match_number(), Some(2));
        assert_eq!(engine.consume_match_outcome(), None);
    }

    #[test]
    fn test_double_knockout_scores_player() {
        let mut engine = from_store(store_with(&[(
            "currentMatch",
            r#"{"roundNumber":4,"playerHealth":0,"computerHealth":0}"#,
        )]));
        assert!(engine.is_match_over());
        assert_eq!(engine.consume_match_outcome(), Some(Participant::Player));
        assert_eq!(engine.score(Participant::Player), 1);
    }

    #[test]
    fn test_play_round_uses_opponent() {
        let mut engine = Engine::new(
            Persistence::new(MemoryStore::new()),
            scripted(&[Move::Scissors, Move::Scissors]),
        );
        let report = engine.play_round(Move::Rock);
        assert_eq!(report.player_move, Some(Move::Rock));
        assert_eq!(report.computer_move, Some(Move::Scissors));
        assert_eq!(report.outcome, RoundOutcome::Win(Participant::Player));
        assert!(!report.match_over);

        let report = engine.play_round(Move::Rock);
        assert!(report.match_over);
        assert_eq!(engine.consume_match_outcome(), Some(Participant::Player));
    }

    #[test]
    fn test_state_persists_across_sessions() {
        let mut engine = fresh();
        round(&mut engine, Move::Rock, Move::Scissors);
        round(&mut engine, Move::Rock, Move::Scissors);
        engine.consume_match_outcome();
        round(&mut engine, Move::Paper, Move::Rock);

        let reloaded = from_store(engine.into_storage().into_inner());
        assert_eq!(reloaded.score(Participant::Player), 1);
        assert_eq!(reloaded.tara_count(Participant::Player), 3);
        assert_eq!(reloaded.global_match_number(), 2);
        assert_eq!(reloaded.round_number(), 2);
        assert_eq!(reloaded.health(Participant::Computer), 50);
        assert_eq!(reloaded.move_counts(Participant::Player).rock, 2);
        assert_eq!(reloaded.most_common_move(Participant::Player), Some(Move::Rock));
        assert_eq!(
            reloaded.history(Participant::Computer),
            &[Move::Scissors, Move::Scissors, Move::Rock]
        );
    }

    #[test]
    fn test_legacy_round_migration() {
        let engine = from_store(store_with(&[("roundNumber", "7")]));
        let m = engine.current_match().copied().unwrap();
        assert_eq!(m.round_number, 7);
        assert_eq!(m.player_health, 100);
        assert_eq!(m.computer_health, 100);
        assert_eq!(engine.global_match_number(), 1);
        let storage = engine.storage();
        assert_eq!(storage.get_legacy_round_number(), None);
        assert_eq!(storage.get_match(), Some(m));
        assert_eq!(storage.get_global_match_number(), Some(1));
    }

    #[test]
    fn test_legacy_round_ignored_with_current_match() {
        let engine = from_store(store_with(&[
            ("roundNumber", "7"),
            ("currentMatch", r#"{"roundNumber":2,"playerHealth":50,"computerHealth":100}"#),
            ("globalMatchNumber", "5"),
        ]));
        assert_eq!(engine.round_number(), 2);
        assert_eq!(engine.global_match_number(), 5);
    }

    #[test]
    fn test_zero_legacy_round_is_not_migrated() {
        let engine = from_store(store_with(&[("roundNumber", "0")]));
        assert!(!engine.is_match_active());
    }

    #[test]
    fn test_corrupt_storage_degrades_to_defaults() {
        let engine = from_store(store_with(&[
            ("playerScore", "{"),
            ("currentMatch", "not json"),
            ("computerMoveCounts", "17"),
            ("globalMatchNumber", ""),
        ]));
        assert_eq!(engine.score(Participant::Player), 0);
        assert!(!engine.is_match_active());
        assert_eq!(engine.move_counts(Participant::Computer), MoveCounts::default());
        assert_eq!(engine.global_match_number(), 1);
    }

    #[test]
    fn test_reset_all() {
        let mut engine = fresh();
        round(&mut engine, Move::Rock, Move::Scissors);
        round(&mut engine, Move::Rock, Move::Scissors);
        engine.consume_match_outcome();
        round(&mut engine, Move::Paper, Move::Rock);

        engine.reset_all();
        assert_eq!(engine.state(), &GameState::default());
        assert!(engine.storage().store().is_empty());
    }

    #[test]
    fn test_reset_scores_keeps_match() {
        let mut engine = from_store(store_with(&[("playerScore", "4"), ("computerScore", "2")]));
        engine.start_or_resume_match();
        engine.reset_scores();
        assert_eq!(engine.score(Participant::Player), 0);
        assert_eq!(engine.storage().get_score(Participant::Computer), 0);
        assert!(engine.is_match_active());
        engine.reset_match();
        assert!(!engine.is_match_active());
    }

    proptest! {
        #[test]
        fn tara_charges_cap_at_three(n in 0u32..10) {
            let mut engine = Engine::with_rules(
                Persistence::new(MemoryStore::new()),
                Scripted::default(),
                RuleSettings { initial_health: 1000, damage_per_loss: 10 },
            );
            for _ in 0..n {
                round(&mut engine, Move::Scissors, Move::Paper);
            }
            prop_assert_eq!(engine.tara_count(Participant::Player), n.min(TARA_CAP));
            prop_assert_eq!(engine.tara_count(Participant::Computer), 0);
        }

        #[test]
        fn health_never_underflows(damage in 1u32..200, rounds in 1usize..6) {
            let mut engine = Engine::with_rules(
                Persistence::new(MemoryStore::new()),
                Scripted::default(),
                RuleSettings { initial_health: 100, damage_per_loss: damage },
            );
            for _ in 0..rounds {
                round(&mut engine, Move::Paper, Move::Rock);
            }
            let health = engine.health(Participant::Computer);
            prop_assert!(health <= 100);
            prop_assert_eq!(engine.is_match_over(), health == 0);
        }
    }
}
