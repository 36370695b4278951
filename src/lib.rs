//! An exhaustive retrograde solver for the board game Quoridor
//!
//! The solver enumerates every position layer by layer (a layer holds the
//! positions with a given number of placed walls), computes each one's
//! game-theoretic value by propagating backwards from the terminal
//! positions, and writes one fixed-width table of optimal moves per layer.
//! Together the tables form an oracle: any legal position maps to its best
//! move with a single indexed read.
//!
//! # Basic Usage
//!
//! ```no_run
//! use quoridor_solver::{LayerStorage, Solver};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let storage = LayerStorage::create(std::path::Path::new("data"))?;
//! let mut solver = Solver::new(storage);
//! solver.run()?;
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod codec;

pub mod oracle;

pub mod pascal;

pub mod position;

pub mod queue;

pub mod rules;

pub mod solver;

pub mod storage;

mod test;

pub use oracle::Oracle;
pub use pascal::Pascal;
pub use position::{Direction, Move, Orientation, PlayerState, Position};
pub use queue::CodeQueue;
pub use solver::Solver;
pub use storage::LayerStorage;

/// The number of squares along each edge of the board
pub const BOARD_SIZE: usize = 4;

/// Each player's wall stock at the start of the game
pub const NB_WALLS: usize = 1;

/// The number of interior intersections where a wall may be anchored
pub const NB_INTER: usize = (BOARD_SIZE - 1) * (BOARD_SIZE - 1);

// every encoded wall placement must fit the 16-bit move field
const_assert!(NB_INTER * 8 < (1 << 16));
// the board cannot hold more walls than it has anchors
const_assert!(2 * NB_WALLS <= NB_INTER);
