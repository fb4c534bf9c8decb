//! Authoritative game state and the phase machine.
//!
//! [`Game`] owns everything for one session: both players' fleets,
//! boards, and shot masks, plus the current phase and turn.  It is pure
//! state — no I/O.  The session controller feeds it one inbound line at
//! a time through [`Game::handle`] and acts on the returned [`Step`].

use std::fmt;

use crate::pieces;
use crate::protocol::{Command, Reply, ShotRecord, Violation, int_args};

/// Ships per fleet.
pub const FLEET_SIZE: usize = 5;

/// Smallest accepted board edge.
pub const MIN_DIM: i32 = 10;

/// Largest accepted board edge.  The protocol has no upper bound, but a
/// Begin beyond this is rejected (code 200) to keep allocation bounded.
pub const MAX_DIM: i32 = 64;

/// One of the two peers.  Player 1 always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    pub fn other(self) -> Self {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Seat::One => 0,
            Seat::Two => 1,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::One => write!(f, "P1"),
            Seat::Two => write!(f, "P2"),
        }
    }
}

/// Global session stage.  Advances monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Initialize,
    Play,
    Terminated,
}

/// Per-player progress marker deciding when the phase may advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Unready,
    Begun,
    Initialized,
}

/// One placed tetromino and how many of its cells have been struck.
#[derive(Debug, Clone)]
struct Ship {
    kind: u8,
    rotation: u8,
    row: i32,
    col: i32,
    hits: u8,
}

impl Ship {
    fn cells(&self) -> [(i32, i32); pieces::CELLS_PER_SHIP] {
        pieces::footprint(self.kind, self.rotation, self.row, self.col)
    }

    fn afloat(&self) -> bool {
        (self.hits as usize) < pieces::CELLS_PER_SHIP
    }
}

/// Per-peer state: own fleet and board, shot mask over the opponent.
///
/// `board` tags each cell with the index of the ship occupying it;
/// `shots` records which opponent cells this player has targeted.  Both
/// are row-major `height × width`, allocated when the fleet is placed.
#[derive(Debug, Default)]
struct Player {
    ships: Vec<Ship>,
    board: Vec<Option<u8>>,
    shots: Vec<bool>,
    ships_remaining: u8,
    readiness: Readiness,
}

/// What the session should do after feeding one packet to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Out-of-turn Shoot or Query: dropped with no reply and no state
    /// change, so a misbehaving client cannot probe out of order.
    Ignored,
    /// One reply to the sender; the session continues.
    Reply(Reply),
    /// The game is over.  `last` (the winning shot result, if any) is
    /// owed to the winner before the halts; the session then delivers
    /// complementary halt messages to both peers and terminates.
    Over { winner: Seat, last: Option<Reply> },
}

pub struct Game {
    width: i32,
    height: i32,
    players: [Player; 2],
    phase: Phase,
    turn: Seat,
}

impl Game {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            players: Default::default(),
            phase: Phase::Begin,
            turn: Seat::One,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    /// Feed one inbound line from `seat` through the phase machine.
    ///
    /// Phase gating runs before any command-specific validation: a packet
    /// whose keyword is not accepted in the current phase draws the phase
    /// error (100/101/102) no matter what its payload looks like.
    pub fn handle(&mut self, seat: Seat, line: &str) -> Step {
        let keyword = match (self.phase, Command::keyword(line)) {
            (Phase::Begin, Some(Command::Begin)) => Command::Begin,
            (Phase::Begin, _) => return reject(Violation::ExpectedBegin),
            (Phase::Initialize, Some(Command::Initialize)) => Command::Initialize,
            (Phase::Initialize, _) => return reject(Violation::ExpectedInitialize),
            (Phase::Play, Some(k @ (Command::Shoot | Command::Query | Command::Forfeit))) => k,
            (Phase::Play, _) => return reject(Violation::ExpectedPlay),
            (Phase::Terminated, _) => return Step::Ignored,
        };

        match keyword {
            Command::Begin => self.begin(seat, line),
            Command::Initialize => self.initialize(seat, line),
            Command::Shoot => self.shoot(seat, line),
            Command::Query => self.query(seat),
            Command::Forfeit => Step::Over {
                winner: self.forfeit(seat),
                last: None,
            },
        }
    }

    /// Concede on behalf of `seat`; the opponent wins.  Also the
    /// disconnect path during PLAY.
    pub fn forfeit(&mut self, seat: Seat) -> Seat {
        self.phase = Phase::Terminated;
        seat.other()
    }

    /// P1's Begin carries the board dimensions; P2's is bare.
    fn begin(&mut self, seat: Seat, line: &str) -> Step {
        let Some(args) = int_args(line) else {
            return reject(Violation::MalformedBegin);
        };
        match seat {
            Seat::One => {
                let &[width, height] = args.as_slice() else {
                    return reject(Violation::MalformedBegin);
                };
                if !(MIN_DIM..=MAX_DIM).contains(&width)
                    || !(MIN_DIM..=MAX_DIM).contains(&height)
                {
                    return reject(Violation::MalformedBegin);
                }
                self.width = width;
                self.height = height;
            }
            Seat::Two => {
                if !args.is_empty() {
                    return reject(Violation::MalformedBegin);
                }
            }
        }
        self.players[seat.index()].readiness = Readiness::Begun;
        if self.players.iter().all(|p| p.readiness == Readiness::Begun) {
            self.phase = Phase::Initialize;
        }
        Step::Reply(Reply::Ack)
    }

    /// Validate and commit a fleet of five ships.
    ///
    /// Diagnostic order is fixed: parameter count, then every piece type,
    /// then every rotation, then cell geometry ship by ship (bounds
    /// before overlap).  Clients probe one defect at a time and rely on
    /// which code comes back first.
    fn initialize(&mut self, seat: Seat, line: &str) -> Step {
        let Some(args) = int_args(line) else {
            return reject(Violation::MalformedInitialize);
        };
        if args.len() != FLEET_SIZE * 4 {
            return reject(Violation::MalformedInitialize);
        }
        if args.chunks_exact(4).any(|s| !(1..=7).contains(&s[0])) {
            return reject(Violation::PieceType);
        }
        if args.chunks_exact(4).any(|s| !(0..=3).contains(&s[1])) {
            return reject(Violation::PieceRotation);
        }

        let area = (self.width * self.height) as usize;
        let mut board = vec![None; area];
        let mut ships = Vec::with_capacity(FLEET_SIZE);
        for (index, spec) in args.chunks_exact(4).enumerate() {
            let ship = Ship {
                kind: spec[0] as u8,
                rotation: spec[1] as u8,
                row: spec[2],
                col: spec[3],
                hits: 0,
            };
            for (row, col) in ship.cells() {
                if !self.in_bounds(row, col) {
                    return reject(Violation::ShipOutOfBounds);
                }
                let cell = &mut board[(row * self.width + col) as usize];
                if cell.is_some() {
                    return reject(Violation::ShipOverlap);
                }
                *cell = Some(index as u8);
            }
            ships.push(ship);
        }

        // A re-sent Initialize before the phase advances replaces the
        // earlier fleet wholesale.
        let player = &mut self.players[seat.index()];
        player.ships = ships;
        player.board = board;
        player.shots = vec![false; area];
        player.ships_remaining = FLEET_SIZE as u8;
        player.readiness = Readiness::Initialized;
        if self.players.iter().all(|p| p.readiness == Readiness::Initialized) {
            self.phase = Phase::Play;
            self.turn = Seat::One;
        }
        Step::Reply(Reply::Ack)
    }

    fn shoot(&mut self, seat: Seat, line: &str) -> Step {
        if seat != self.turn {
            return Step::Ignored;
        }
        let Some(args) = int_args(line) else {
            return reject(Violation::MalformedShot);
        };
        let &[row, col] = args.as_slice() else {
            return reject(Violation::MalformedShot);
        };
        if !self.in_bounds(row, col) {
            return reject(Violation::ShotOutOfBounds);
        }
        let at = self.cell(row, col);
        if self.players[seat.index()].shots[at] {
            return reject(Violation::ShotRepeated);
        }
        self.players[seat.index()].shots[at] = true;

        let rival = &mut self.players[seat.other().index()];
        let hit = match rival.board[at] {
            Some(index) => {
                let ship = &mut rival.ships[index as usize];
                ship.hits += 1;
                if !ship.afloat() {
                    rival.ships_remaining -= 1;
                }
                true
            }
            None => false,
        };
        let remaining = rival.ships_remaining;
        let reply = Reply::Shot { opponent_ships: remaining, hit };
        if remaining == 0 {
            self.phase = Phase::Terminated;
            return Step::Over {
                winner: seat,
                last: Some(reply),
            };
        }
        self.turn = seat.other();
        Step::Reply(reply)
    }

    /// Report every shot the querying player has taken, in row-major
    /// board order.  Consumes no turn; issuing it twice in a row returns
    /// identical responses.
    fn query(&self, seat: Seat) -> Step {
        if seat != self.turn {
            return Step::Ignored;
        }
        let shooter = &self.players[seat.index()];
        let rival = &self.players[seat.other().index()];
        let mut shots = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let at = self.cell(row, col);
                if shooter.shots[at] {
                    shots.push(ShotRecord {
                        hit: rival.board[at].is_some(),
                        row,
                        col,
                    });
                }
            }
        }
        Step::Reply(Reply::History {
            opponent_ships: rival.ships_remaining,
            shots,
        })
    }

    fn in_bounds(&self, row: i32, col: i32) -> bool {
        (0..self.height).contains(&row) && (0..self.width).contains(&col)
    }

    fn cell(&self, row: i32, col: i32) -> usize {
        (row * self.width + col) as usize
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

fn reject(violation: Violation) -> Step {
    Step::Reply(Reply::Error(violation))
}
