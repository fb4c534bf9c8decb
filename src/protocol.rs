//! Wire grammar: inbound packet parsing and outbound reply formatting.
//!
//! Every packet is one ASCII line.  Inbound lines start with a single
//! command letter followed by whitespace-separated decimal integers;
//! outbound replies render through [`Reply`]'s `Display` implementation
//! (the session appends the trailing newline).

use std::fmt;

/// Leading keyword of an inbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Begin,
    Initialize,
    Shoot,
    Query,
    Forfeit,
}

impl Command {
    /// Classify a line by its first whitespace-separated token.
    /// Unknown or missing keywords are `None`; the phase machine turns
    /// those into the phase error for the current state.
    pub fn keyword(line: &str) -> Option<Self> {
        match line.split_whitespace().next()? {
            "B" => Some(Self::Begin),
            "I" => Some(Self::Initialize),
            "S" => Some(Self::Shoot),
            "Q" => Some(Self::Query),
            "F" => Some(Self::Forfeit),
            _ => None,
        }
    }
}

/// Every token after the keyword, parsed as decimal integers.
/// `None` if any token fails to parse.
pub fn int_args(line: &str) -> Option<Vec<i32>> {
    line.split_whitespace()
        .skip(1)
        .map(|token| token.parse::<i32>().ok())
        .collect()
}

/// Protocol rejection codes, sent to the offending player as `E <code>`.
///
/// The bands are phase-conditioned: 1xx (wrong packet type for the
/// current phase) is checked before 2xx (malformed payload), which is
/// checked before 3xx/4xx (semantic violations).  A rejection never
/// alters phase, turn, or any board state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Only Begin is accepted while the session is in BEGIN.
    ExpectedBegin = 100,
    /// Only Initialize is accepted while the session is in INITIALIZE.
    ExpectedInitialize = 101,
    /// Only Shoot, Query, or Forfeit are accepted during PLAY.
    ExpectedPlay = 102,
    /// Begin with bad dimensions or extraneous payload.
    MalformedBegin = 200,
    /// Initialize without exactly twenty integer parameters.
    MalformedInitialize = 201,
    /// Shoot without exactly two integer parameters.
    MalformedShot = 202,
    /// Piece type outside 1..=7.
    PieceType = 300,
    /// Rotation outside 0..=3.
    PieceRotation = 301,
    /// A ship cell falls outside the board.
    ShipOutOfBounds = 302,
    /// A ship cell is already occupied by an earlier ship.
    ShipOverlap = 303,
    /// Shot coordinates outside the board.
    ShotOutOfBounds = 400,
    /// Cell already targeted by this player.
    ShotRepeated = 401,
}

impl Violation {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// One prior shot, as reported in a Query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotRecord {
    pub hit: bool,
    pub row: i32,
    pub col: i32,
}

/// One outbound line.  `Display` produces the exact wire form without
/// the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `A` — request accepted.
    Ack,
    /// `E <code>` — request rejected.
    Error(Violation),
    /// `R <opponent_ships> <H|M>` — shot resolved.
    Shot { opponent_ships: u8, hit: bool },
    /// `G <opponent_ships>` plus one ` <H|M> <r> <c>` triple per prior
    /// shot, in row-major board order.
    History {
        opponent_ships: u8,
        shots: Vec<ShotRecord>,
    },
    /// `H 1` to the winner, `H 0` to the loser.
    Halt { winner: bool },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ack => write!(f, "A"),
            Reply::Error(violation) => write!(f, "E {}", violation.code()),
            Reply::Shot { opponent_ships, hit } => {
                write!(f, "R {} {}", opponent_ships, if *hit { 'H' } else { 'M' })
            }
            Reply::History { opponent_ships, shots } => {
                write!(f, "G {opponent_ships}")?;
                for shot in shots {
                    let mark = if shot.hit { 'H' } else { 'M' };
                    write!(f, " {} {} {}", mark, shot.row, shot.col)?;
                }
                Ok(())
            }
            Reply::Halt { winner } => write!(f, "H {}", u8::from(*winner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_is_first_token() {
        assert_eq!(Command::keyword("B 10 10"), Some(Command::Begin));
        assert_eq!(Command::keyword("  Q  "), Some(Command::Query));
        assert_eq!(Command::keyword("F"), Some(Command::Forfeit));
        assert_eq!(Command::keyword("I 1 0 0 0"), Some(Command::Initialize));
        assert_eq!(Command::keyword("S 3 4"), Some(Command::Shoot));
    }

    #[test]
    fn keyword_rejects_unknown_and_empty() {
        assert_eq!(Command::keyword("X 1 2"), None);
        assert_eq!(Command::keyword("BB"), None);
        assert_eq!(Command::keyword(""), None);
        assert_eq!(Command::keyword("   "), None);
    }

    #[test]
    fn int_args_parses_trailing_integers() {
        assert_eq!(int_args("S 3 4"), Some(vec![3, 4]));
        assert_eq!(int_args("B"), Some(vec![]));
        assert_eq!(int_args("I 5 0 -1 2"), Some(vec![5, 0, -1, 2]));
    }

    #[test]
    fn int_args_rejects_non_integers() {
        assert_eq!(int_args("S a b"), None);
        assert_eq!(int_args("B 10 1.5"), None);
        assert_eq!(int_args("B 10 99999999999999"), None);
    }

    #[test]
    fn violation_codes_match_taxonomy() {
        assert_eq!(Violation::ExpectedBegin.code(), 100);
        assert_eq!(Violation::ExpectedInitialize.code(), 101);
        assert_eq!(Violation::ExpectedPlay.code(), 102);
        assert_eq!(Violation::MalformedBegin.code(), 200);
        assert_eq!(Violation::MalformedInitialize.code(), 201);
        assert_eq!(Violation::MalformedShot.code(), 202);
        assert_eq!(Violation::PieceType.code(), 300);
        assert_eq!(Violation::PieceRotation.code(), 301);
        assert_eq!(Violation::ShipOutOfBounds.code(), 302);
        assert_eq!(Violation::ShipOverlap.code(), 303);
        assert_eq!(Violation::ShotOutOfBounds.code(), 400);
        assert_eq!(Violation::ShotRepeated.code(), 401);
    }

    #[test]
    fn replies_render_exact_wire_lines() {
        assert_eq!(Reply::Ack.to_string(), "A");
        assert_eq!(Reply::Error(Violation::ShipOutOfBounds).to_string(), "E 302");
        assert_eq!(
            Reply::Shot { opponent_ships: 4, hit: true }.to_string(),
            "R 4 H"
        );
        assert_eq!(
            Reply::Shot { opponent_ships: 5, hit: false }.to_string(),
            "R 5 M"
        );
        assert_eq!(Reply::Halt { winner: true }.to_string(), "H 1");
        assert_eq!(Reply::Halt { winner: false }.to_string(), "H 0");
    }

    #[test]
    fn history_renders_triples_in_given_order() {
        let reply = Reply::History {
            opponent_ships: 5,
            shots: vec![
                ShotRecord { hit: true, row: 0, col: 3 },
                ShotRecord { hit: false, row: 2, col: 7 },
            ],
        };
        assert_eq!(reply.to_string(), "G 5 H 0 3 M 2 7");
        assert_eq!(
            Reply::History { opponent_ships: 3, shots: vec![] }.to_string(),
            "G 3"
        );
    }
}
