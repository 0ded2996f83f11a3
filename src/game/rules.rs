use super::types::Move;

/// Health both participants start a match with.
pub const INITIAL_HEALTH: u32 = 100;
/// Health lost by the loser of a decisive round.
pub const DAMAGE_PER_LOSS: u32 = 50;
/// Most Tara charges a participant can hold.
pub const TARA_CAP: u32 = 3;

/// Static rule table: every move and the moves it defeats.
const BEATS: [(Move, &[Move]); 4] = [
    (Move::Rock, &[Move::Scissors]),
    (Move::Paper, &[Move::Rock]),
    (Move::Scissors, &[Move::Paper]),
    (Move::Tara, &[Move::Rock, Move::Paper, Move::Scissors]),
];

/// Moves defeated by `mv`.
pub fn defeats(mv: Move) -> &'static [Move] {
    BEATS
        .iter()
        .find(|(m, _)| *m == mv)
        .map(|(_, beaten)| *beaten)
        .unwrap_or(&[])
}

/// `true` iff `a`'s rule entry lists `b` as defeated.
pub fn does_move_beat(a: Move, b: Move) -> bool {
    defeats(a).contains(&b)
}

pub fn is_standard_move(mv: Move) -> bool {
    mv.is_standard()
}

/// Moves a participant may throw: everything when it holds Tara, otherwise
/// only the standard moves.
pub fn available_moves(has_tara: bool) -> &'static [Move] {
    if has_tara {
        &Move::ALL
    } else {
        &Move::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_move() -> impl Strategy<Value = Move> {
        prop::sample::select(Move::ALL.to_vec())
    }

    fn standard_move() -> impl Strategy<Value = Move> {
        prop::sample::select(Move::STANDARD.to_vec())
    }

    #[test]
    fn test_classic_cycle() {
        assert!(does_move_beat(Move::Rock, Move::Scissors));
        assert!(does_move_beat(Move::Paper, Move::Rock));
        assert!(does_move_beat(Move::Scissors, Move::Paper));
        assert!(!does_move_beat(Move::Scissors, Move::Rock));
        assert!(!does_move_beat(Move::Tara, Move::Tara));
    }

    #[test]
    fn test_available_moves() {
        assert_eq!(available_moves(true), &Move::ALL);
        assert_eq!(available_moves(false), &Move::STANDARD);
        assert!(!available_moves(false).contains(&Move::Tara));
    }

    #[test]
    fn test_counter_beats_its_target() {
        for mv in Move::STANDARD {
            let counter = mv.counter().unwrap();
            assert!(does_move_beat(counter, mv));
            assert!(is_standard_move(counter));
        }
    }

    proptest! {
        #[test]
        fn tara_beats_every_standard_move(x in standard_move()) {
            prop_assert!(does_move_beat(Move::Tara, x));
            prop_assert!(!does_move_beat(x, Move::Tara));
        }

        #[test]
        fn no_move_beats_itself(x in any_move()) {
            prop_assert!(!does_move_beat(x, x));
        }

        #[test]
        fn at_most_one_side_wins(a in any_move(), b in any_move()) {
            prop_assert!(!(does_move_beat(a, b) && does_move_beat(b, a)));
            if a != b {
                prop_assert!(does_move_beat(a, b) || does_move_beat(b, a));
            }
        }
    }
}
