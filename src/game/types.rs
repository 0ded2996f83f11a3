use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// A move either participant can throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
    /// Resource-gated trump move, beats every standard move.
    Tara,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Rock, Move::Paper, Move::Scissors, Move::Tara];
    pub const STANDARD: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn is_standard(self) -> bool {
        self != Move::Tara
    }

    /// The standard move that defeats this one. Tara has no counter.
    pub fn counter(self) -> Option<Move> {
        match self {
            Move::Rock => Some(Move::Paper),
            Move::Paper => Some(Move::Scissors),
            Move::Scissors => Some(Move::Rock),
            Move::Tara => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
            Move::Tara => "tara",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known move.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("unknown move: {input:?}")]
pub struct UnknownMove {
    pub input: String,
}

impl FromStr for Move {
    type Err = UnknownMove;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            "tara" => Ok(Move::Tara),
            _ => Err(UnknownMove {
                input: s.to_string(),
            }),
        }
    }
}

/// One side of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Player,
    Computer,
}

impl Participant {
    pub const BOTH: [Participant; 2] = [Participant::Player, Participant::Computer];

    pub fn opponent(self) -> Participant {
        match self {
            Participant::Player => Participant::Computer,
            Participant::Computer => Participant::Player,
        }
    }

    /// Prefix used for per-participant storage keys.
    pub fn key(self) -> &'static str {
        match self {
            Participant::Player => "player",
            Participant::Computer => "computer",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Occurrence counter per standard move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounts {
    #[serde(default)]
    pub rock: u32,
    #[serde(default)]
    pub paper: u32,
    #[serde(default)]
    pub scissors: u32,
}

impl MoveCounts {
    pub fn get(&self, mv: Move) -> u32 {
        match mv {
            Move::Rock => self.rock,
            Move::Paper => self.paper,
            Move::Scissors => self.scissors,
            Move::Tara => 0,
        }
    }

    /// Count one more play of `mv`. Tara is not tracked.
    pub fn increment(&mut self, mv: Move) {
        match mv {
            Move::Rock => self.rock += 1,
            Move::Paper => self.paper += 1,
            Move::Scissors => self.scissors += 1,
            Move::Tara => {}
        }
    }

    /// The unique most frequent standard move.
    ///
    /// `None` when nothing has been counted or when two or more moves share
    /// the highest count.
    pub fn most_common(&self) -> Option<Move> {
        let max = Move::STANDARD.iter().map(|&m| self.get(m)).max().unwrap_or(0);
        if max == 0 {
            return None;
        }
        let mut leaders = Move::STANDARD.iter().filter(|&&m| self.get(m) == max);
        match (leaders.next(), leaders.next()) {
            (Some(&mv), None) => Some(mv),
            _ => None,
        }
    }
}

/// Health pools and round counter of the match being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub round_number: u32,
    pub player_health: u32,
    pub computer_health: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_per_loss: Option<u32>,
}

impl Match {
    pub fn new(initial_health: u32, damage_per_loss: u32) -> Self {
        Self::at_round(1, initial_health, damage_per_loss)
    }

    /// A fresh match that starts counting at `round_number`.
    pub fn at_round(round_number: u32, initial_health: u32, damage_per_loss: u32) -> Self {
        Self {
            round_number,
            player_health: initial_health,
            computer_health: initial_health,
            initial_health: Some(initial_health),
            damage_per_loss: Some(damage_per_loss),
        }
    }

    pub fn health(&self, who: Participant) -> u32 {
        match who {
            Participant::Player => self.player_health,
            Participant::Computer => self.computer_health,
        }
    }

    fn health_mut(&mut self, who: Participant) -> &mut u32 {
        match who {
            Participant::Player => &mut self.player_health,
            Participant::Computer => &mut self.computer_health,
        }
    }

    /// Remove `amount` health from `who`, never going below zero.
    pub fn damage(&mut self, who: Participant, amount: u32) {
        let health = self.health_mut(who);
        *health = health.saturating_sub(amount);
    }

    pub fn is_defeated(&self, who: Participant) -> bool {
        self.health(who) == 0
    }

    pub fn is_over(&self) -> bool {
        Participant::BOTH.iter().any(|&p| self.is_defeated(p))
    }

    /// Winner of a finished match. A double knock-out goes to the player.
    pub fn winner(&self) -> Option<Participant> {
        if !self.is_over() {
            return None;
        }
        if self.is_defeated(Participant::Player) && !self.is_defeated(Participant::Computer) {
            Some(Participant::Computer)
        } else {
            Some(Participant::Player)
        }
    }
}

/// Result of evaluating one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Win(Participant),
    Tie,
    /// At least one move was missing, or the match is already decided.
    Invalid,
}

/// Where the current match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    NoMatch,
    InProgress,
    /// A participant is out of health; waiting for the outcome to be consumed.
    Over,
}

/// Everything the presentation layer needs after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub player_move: Option<Move>,
    pub computer_move: Option<Move>,
    pub outcome: RoundOutcome,
    pub match_over: bool,
}
