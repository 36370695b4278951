//! The layer-by-layer retrograde solver.
//!
//! Layers are solved from the fullest wall count down to the empty board,
//! so that by the time a layer is being computed, every position one wall
//! placement away already has its final value. Within a layer the solver
//! seeds the terminal boundary, then drains a queue of position codes to a
//! fixed point: each pop recomputes the popped position's record from its
//! same-layer pawn successors and its placements into the layer above, and
//! each change re-queues the positions that could have moved there.

use anyhow::Result;
use indicatif::ProgressBar;

use crate::codec::{decode, dimension, encode, wall_count_range};
use crate::pascal::Pascal;
use crate::position::{goal_row, Direction, Move, Orientation, PlayerState, Position, WallGrid};
use crate::queue::CodeQueue;
use crate::rules::{back_move, can_simple_place, move_pawn, place, squares_reaching_goal};
use crate::storage::{LayerStorage, Record, Slot};
use crate::{BOARD_SIZE, NB_INTER, NB_WALLS};

/// Drives the whole computation: owns the combinatorics context, the pair
/// of layer files and the propagation queue.
pub struct Solver {
    pascal: Pascal,
    storage: LayerStorage,
    queue: CodeQueue,
}

impl Solver {
    pub fn new(storage: LayerStorage) -> Self {
        Self {
            pascal: Pascal::new(),
            storage,
            queue: CodeQueue::new(),
        }
    }

    /// Solves every layer from `2 * NB_WALLS` down to the empty board,
    /// leaving one `.quoridor` table per layer in the storage directory.
    pub fn run(&mut self) -> Result<()> {
        let top = 2 * NB_WALLS;
        println!(
            "Number of positions in the top layer: {}.",
            dimension(&self.pascal, top)?
        );

        for layer in (0..=top).rev() {
            let size = dimension(&self.pascal, layer)?;
            self.storage.init_layer(layer, size)?;
            self.seed(layer)?;
            self.propagate(layer, size)?;
            self.storage.compress(layer, size)?;
            self.storage.rotate();
        }
        Ok(())
    }

    /// Seeds a layer by enumerating every wall configuration of exactly
    /// `layer` segments and writing each configuration's terminal boundary.
    fn seed(&mut self, layer: usize) -> Result<()> {
        println!("Initializing layer {}.", layer);
        let mut walls: WallGrid = [[None; BOARD_SIZE - 1]; BOARD_SIZE - 1];
        self.enumerate_wall_sets(&mut walls, layer, 0, layer)
    }

    /// Recursively drops `remaining` segments on anchors at or after
    /// `offset`, then seeds each completed configuration. Anchors ascend,
    /// so each set of walls comes up exactly once.
    fn enumerate_wall_sets(
        &mut self,
        walls: &mut WallGrid,
        layer: usize,
        offset: usize,
        remaining: usize,
    ) -> Result<()> {
        if remaining == 0 {
            return self.seed_configuration(walls, layer);
        }

        for anchor in offset..=NB_INTER - remaining {
            let x = (anchor / (BOARD_SIZE - 1)) as u8;
            let y = (anchor % (BOARD_SIZE - 1)) as u8;
            for &orientation in &[Orientation::Horizontal, Orientation::Vertical] {
                if can_simple_place(walls, x, y, orientation) {
                    walls[x as usize][y as usize] = Some(orientation);
                    self.enumerate_wall_sets(walls, layer, anchor + 1, remaining - 1)?;
                    walls[x as usize][y as usize] = None;
                }
            }
        }
        Ok(())
    }

    /// Seeds one wall configuration.
    ///
    /// Terminal positions, where the winner's pawn has just reached its
    /// goal row, get `move_to_win = 2` written directly: the side to move
    /// has lost and no move will be stored for it. The position the winner
    /// stepped from is queued so propagation picks the win up. For layers
    /// below the top, every playable position is queued as well, so each
    /// reads its wall-placement successors out of the finished layer above
    /// at least once.
    fn seed_configuration(&mut self, walls: &WallGrid, layer: usize) -> Result<()> {
        let reachable = [
            squares_reaching_goal(walls, 0),
            squares_reaching_goal(walls, 1),
        ];
        let (lo, span) = wall_count_range(layer);
        let total = (2 * NB_WALLS - layer) as u8;

        for winner in 0..2usize {
            let loser = 1 - winner;
            let goal = goal_row(winner);
            // the square the winning move started from
            let back_row = if winner == 0 { goal - 1 } else { goal + 1 };

            for goal_y in 0..BOARD_SIZE as u8 {
                for x in 0..BOARD_SIZE as u8 {
                    if x == goal_row(loser) {
                        continue;
                    }
                    for y in 0..BOARD_SIZE as u8 {
                        if !reachable[loser][x as usize][y as usize] {
                            continue;
                        }
                        if x == goal && y == goal_y {
                            continue;
                        }
                        for w0 in lo..lo + span {
                            let mut position = Position::empty();
                            position.walls = *walls;
                            position.players[winner] = PlayerState {
                                x: goal,
                                y: goal_y,
                                walls: 0,
                            };
                            position.players[loser] = PlayerState { x, y, walls: 0 };
                            position.players[0].walls = w0 as u8;
                            position.players[1].walls = total - w0 as u8;
                            position.turn = loser;

                            let code = encode(&self.pascal, &position, layer);
                            self.storage.write(
                                code,
                                Record {
                                    next: 0,
                                    move_to_win: 2,
                                    best_move: 0,
                                },
                            )?;

                            if (back_row, goal_y) != (x, y) {
                                position.players[winner].x = back_row;
                                position.turn = winner;
                                self.queue.enqueue(encode(&self.pascal, &position, layer));
                            }
                        }
                    }
                }
            }
        }

        if layer != 2 * NB_WALLS {
            for x0 in 0..BOARD_SIZE as u8 {
                if x0 == goal_row(0) {
                    continue;
                }
                for y0 in 0..BOARD_SIZE as u8 {
                    if !reachable[0][x0 as usize][y0 as usize] {
                        continue;
                    }
                    for x1 in 0..BOARD_SIZE as u8 {
                        if x1 == goal_row(1) {
                            continue;
                        }
                        for y1 in 0..BOARD_SIZE as u8 {
                            if !reachable[1][x1 as usize][y1 as usize] || (x0, y0) == (x1, y1) {
                                continue;
                            }
                            for w0 in lo..lo + span {
                                for turn in 0..2usize {
                                    let mut position = Position::empty();
                                    position.walls = *walls;
                                    position.players[0] = PlayerState {
                                        x: x0,
                                        y: y0,
                                        walls: w0 as u8,
                                    };
                                    position.players[1] = PlayerState {
                                        x: x1,
                                        y: y1,
                                        walls: total - w0 as u8,
                                    };
                                    position.turn = turn;
                                    self.queue.enqueue(encode(&self.pascal, &position, layer));
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Drains the queue to the layer's fixed point.
    fn propagate(&mut self, layer: usize, size: u64) -> Result<()> {
        println!("Computing layer {}.", layer);
        let spinner = ProgressBar::new_spinner();
        let mut pops: u64 = 0;

        while let Some(code) = self.queue.dequeue() {
            if pops % 100_000 == 0 {
                spinner.set_message(&format!("{} processed, {} queued", pops, self.queue.len()));
                spinner.tick();
            }
            pops += 1;

            let mut position = decode(&self.pascal, code, layer);

            // rewinds can wander past the end of the game; the boundary the
            // seeder wrote must never be recomputed
            if position.is_finished() {
                continue;
            }

            let mut best = Record::unknown();

            // same-layer successors by pawn move
            let mover = position.players[position.turn];
            for &direction in Direction::ALL.iter() {
                for &jump in &[false, true] {
                    if !move_pawn(&mut position, direction, jump) {
                        continue;
                    }
                    let successor = encode(&self.pascal, &position, layer);
                    if self.chain_ends_elsewhere(code, successor, size)? {
                        let mut witness = self.storage.read(successor, Slot::Current)?;
                        witness.best_move = Move::Pawn { direction, jump }.encode();
                        witness.next = successor;
                        best = better(best, witness);
                    }
                    position.turn = (position.turn + 1) % 2;
                    position.players[position.turn].x = mover.x;
                    position.players[position.turn].y = mover.y;
                }
            }

            // successors by placement land in the finished layer above
            if layer != 2 * NB_WALLS {
                for anchor in 0..NB_INTER {
                    let x = (anchor / (BOARD_SIZE - 1)) as u8;
                    let y = (anchor % (BOARD_SIZE - 1)) as u8;
                    for &orientation in &[Orientation::Horizontal, Orientation::Vertical] {
                        if !place(&mut position, x, y, orientation) {
                            continue;
                        }
                        let successor = encode(&self.pascal, &position, layer + 1);
                        let mut witness = self.storage.read(successor, Slot::Previous)?;
                        witness.best_move = Move::Wall { x, y, orientation }.encode();
                        witness.next = successor;
                        best = better(best, witness);

                        position.walls[x as usize][y as usize] = None;
                        position.turn = (position.turn + 1) % 2;
                        position.players[position.turn].walls += 1;
                    }
                }
            }

            // account for the ply spent reaching the chosen successor
            best.move_to_win += 1;

            let stored = self.storage.read(code, Slot::Current)?;
            if best.move_to_win != stored.move_to_win || best.best_move != stored.best_move {
                self.storage.write(code, best)?;

                // everything that could have moved here must reconsider
                let moved = position.players[position.opponent()];
                for &direction in Direction::ALL.iter() {
                    for &jump in &[false, true] {
                        if !back_move(&mut position, direction, jump) {
                            continue;
                        }
                        self.queue.enqueue(encode(&self.pascal, &position, layer));

                        position.turn = (position.turn + 1) % 2;
                        let prev = position.opponent();
                        position.players[prev].x = moved.x;
                        position.players[prev].y = moved.y;
                    }
                }
            }
        }

        spinner.finish_and_clear();
        Ok(())
    }

    /// Whether a candidate witness may be adopted for `code`.
    ///
    /// A same-layer witness is only trusted if following its `next` links
    /// bottoms out at a decided record, one holding a terminal (no move
    /// yet, value at least 2) or a wall placement whose value lives in the
    /// finished layer above, without ever revisiting `code`. This is what
    /// keeps rings of pawn moves from certifying each other. The walk is
    /// capped; a chain long enough to hit the cap can only be a stale
    /// cycle, and discarding it is always safe.
    fn chain_ends_elsewhere(&mut self, code: u64, mut link: u64, size: u64) -> Result<bool> {
        let mut steps = 0u64;
        loop {
            if link == code {
                return Ok(false);
            }
            let record = self.storage.read(link, Slot::Current)?;
            if record.move_to_win < 2 {
                return Ok(false);
            }
            match Move::decode(record.best_move) {
                None => return Ok(true),
                Some(Move::Wall { .. }) => return Ok(true),
                Some(Move::Pawn { .. }) => link = record.next,
            }
            steps += 1;
            if steps > 2 * size {
                return Ok(false);
            }
        }
    }
}

/// Picks the stronger of two candidate records for the same position.
///
/// Candidates hold the successor's stored value, not yet incremented for
/// the ply spent getting there. An even value says the opponent is losing
/// at the successor, which is the best news available, and the smallest
/// such value wins fastest. An odd value says the opponent wins; the
/// largest delays the loss longest. Ties keep `a`, so earlier candidates
/// win and runs stay reproducible.
fn better(a: Record, b: Record) -> Record {
    if a.move_to_win % 2 == 0 {
        if b.move_to_win % 2 == 0 {
            if a.move_to_win <= b.move_to_win {
                a
            } else {
                b
            }
        } else {
            a
        }
    } else if b.move_to_win % 2 == 0 {
        b
    } else if a.move_to_win < b.move_to_win {
        b
    } else {
        a
    }
}
