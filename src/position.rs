//! The transient Quoridor position and the 16-bit move encoding stored in
//! the oracle tables.

use crate::{BOARD_SIZE, NB_INTER, NB_WALLS};

/// Orientation of a placed wall segment.
///
/// A segment is anchored at an interior intersection `(x, y)` with
/// `x, y < BOARD_SIZE - 1`. A horizontal segment lies between rows `x` and
/// `x + 1` and spans columns `y` and `y + 1`; a vertical segment lies
/// between columns `y` and `y + 1` and spans rows `x` and `x + 1`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One optional wall segment per interior intersection, indexed `[x][y]`.
pub type WallGrid = [[Option<Orientation>; BOARD_SIZE - 1]; BOARD_SIZE - 1];

/// A pawn step direction. `x` is the row index: [`Direction::Down`]
/// increases it, which is the way player 0 races.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Direction {
    Up,
    Right,
    Left,
    Down,
}

impl Direction {
    /// All directions, in move-encoding order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Left,
        Direction::Down,
    ];

    /// Row and column deltas of a single step.
    pub fn offset(self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
        }
    }
}

/// One pawn: board coordinates and the walls left in its owner's hand.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PlayerState {
    pub x: u8,
    pub y: u8,
    pub walls: u8,
}

/// A full game state. Positions are cheap scratch values: the solver
/// mutates one through a rule primitive and rolls it back rather than
/// allocating per successor.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Position {
    pub players: [PlayerState; 2],
    /// Index of the player to move, 0 or 1.
    pub turn: usize,
    pub walls: WallGrid,
}

impl Position {
    /// A zeroed position, the canvas `decode` paints on.
    pub fn empty() -> Self {
        Self {
            players: [PlayerState { x: 0, y: 0, walls: 0 }; 2],
            turn: 0,
            walls: [[None; BOARD_SIZE - 1]; BOARD_SIZE - 1],
        }
    }

    /// The standard opening: both pawns on their back rows in the middle
    /// column, full wall stock, player 0 to move.
    pub fn start() -> Self {
        let middle = (BOARD_SIZE / 2) as u8;
        Self {
            players: [
                PlayerState {
                    x: 0,
                    y: middle,
                    walls: NB_WALLS as u8,
                },
                PlayerState {
                    x: (BOARD_SIZE - 1) as u8,
                    y: middle,
                    walls: NB_WALLS as u8,
                },
            ],
            turn: 0,
            walls: [[None; BOARD_SIZE - 1]; BOARD_SIZE - 1],
        }
    }

    /// The number of wall segments on the board, which is also the index of
    /// the layer this position belongs to.
    pub fn layer(&self) -> usize {
        self.walls
            .iter()
            .flatten()
            .filter(|segment| segment.is_some())
            .count()
    }

    /// Index of the player not on turn.
    pub fn opponent(&self) -> usize {
        (self.turn + 1) % 2
    }

    /// Whether a pawn stands on its own goal row, ending the game. Such
    /// positions are the solver's boundary: their records are written by
    /// the seeder and never recomputed.
    pub fn is_finished(&self) -> bool {
        self.players
            .iter()
            .enumerate()
            .any(|(player, state)| state.x == goal_row(player))
    }
}

/// Goal row of a player. Player 0 starts on row 0 and races to the far
/// side; player 1 races back to row 0.
pub fn goal_row(player: usize) -> u8 {
    if player == 0 {
        (BOARD_SIZE - 1) as u8
    } else {
        0
    }
}

/// A decoded oracle entry.
///
/// # Notes
/// The wire form is a single integer whose two low bits tag the kind:
/// `01` for a pawn move, `11` for a placement. A pawn move carries
/// `direction * 2 + jump` above the tag; a placement carries
/// `anchor * 2 + horizontal` where `anchor = x * (BOARD_SIZE - 1) + y`.
/// The value 0 is reserved for "no decision".
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Move {
    Pawn { direction: Direction, jump: bool },
    Wall { x: u8, y: u8, orientation: Orientation },
}

impl Move {
    pub fn encode(self) -> u16 {
        match self {
            Move::Pawn { direction, jump } => {
                let payload = direction as u16 * 2 + jump as u16;
                payload * 4 + 1
            }
            Move::Wall { x, y, orientation } => {
                let anchor = x as u16 * (BOARD_SIZE as u16 - 1) + y as u16;
                let payload = anchor * 2 + (orientation == Orientation::Horizontal) as u16;
                payload * 4 + 3
            }
        }
    }

    /// Decodes a stored move. Returns `None` for the 0 sentinel and for
    /// payloads outside the board.
    pub fn decode(code: u16) -> Option<Self> {
        let payload = code >> 2;
        match code & 3 {
            1 => {
                if payload > 7 {
                    return None;
                }
                Some(Move::Pawn {
                    direction: Direction::ALL[(payload >> 1) as usize],
                    jump: payload & 1 == 1,
                })
            }
            3 => {
                let anchor = (payload >> 1) as usize;
                if anchor >= NB_INTER {
                    return None;
                }
                Some(Move::Wall {
                    x: (anchor / (BOARD_SIZE - 1)) as u8,
                    y: (anchor % (BOARD_SIZE - 1)) as u8,
                    orientation: if payload & 1 == 1 {
                        Orientation::Horizontal
                    } else {
                        Orientation::Vertical
                    },
                })
            }
            _ => None,
        }
    }
}
