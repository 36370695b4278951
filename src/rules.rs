//! Move, jump and wall-placement rules, plus the path queries legality
//! checks and seeding rely on.

use crate::position::{goal_row, Direction, Orientation, Position, WallGrid};
use crate::queue::CodeQueue;
use crate::BOARD_SIZE;

/// The square one step from `(x, y)`, or `None` off the board.
fn step(x: u8, y: u8, direction: Direction) -> Option<(u8, u8)> {
    let (dx, dy) = direction.offset();
    let nx = x as i8 + dx;
    let ny = y as i8 + dy;
    if nx < 0 || ny < 0 || nx as usize >= BOARD_SIZE || ny as usize >= BOARD_SIZE {
        None
    } else {
        Some((nx as u8, ny as u8))
    }
}

/// The segment at an anchor, `None` when the anchor is empty or the
/// coordinates fall outside the interior grid.
fn wall_at(walls: &WallGrid, x: i8, y: i8) -> Option<Orientation> {
    if x < 0 || y < 0 || x as usize >= BOARD_SIZE - 1 || y as usize >= BOARD_SIZE - 1 {
        None
    } else {
        walls[x as usize][y as usize]
    }
}

/// Whether a wall segment closes the edge from `(x, y)` toward `direction`.
///
/// Two anchors can hold a segment covering any given edge; blocking is
/// symmetric, crossing the same edge from the other side consults the same
/// two anchors.
fn blocked(walls: &WallGrid, x: u8, y: u8, direction: Direction) -> bool {
    let x = x as i8;
    let y = y as i8;
    let (first, second, orientation) = match direction {
        Direction::Down => ((x, y - 1), (x, y), Orientation::Horizontal),
        Direction::Up => ((x - 1, y - 1), (x - 1, y), Orientation::Horizontal),
        Direction::Right => ((x - 1, y), (x, y), Orientation::Vertical),
        Direction::Left => ((x - 1, y - 1), (x, y - 1), Orientation::Vertical),
    };
    wall_at(walls, first.0, first.1) == Some(orientation)
        || wall_at(walls, second.0, second.1) == Some(orientation)
}

/// True if the pawn at `(x, y)` may step one square toward `direction`,
/// considering walls and the board edge but ignoring the opponent.
pub fn can_simple_move(walls: &WallGrid, x: u8, y: u8, direction: Direction) -> bool {
    step(x, y, direction).is_some() && !blocked(walls, x, y, direction)
}

/// The direction from one square to an orthogonally adjacent one.
fn direction_between(from: (u8, u8), to: (u8, u8)) -> Option<Direction> {
    let dx = to.0 as i8 - from.0 as i8;
    let dy = to.1 as i8 - from.1 as i8;
    Direction::ALL.iter().copied().find(|d| d.offset() == (dx, dy))
}

fn can_move(position: &Position, direction: Direction, jump: bool) -> bool {
    let other = position.players[position.opponent()];
    let (mut x, mut y) = {
        let mover = position.players[position.turn];
        (mover.x, mover.y)
    };

    if jump {
        // the opponent must stand on an adjacent square
        let toward = match direction_between((x, y), (other.x, other.y)) {
            Some(d) => d,
            None => return false,
        };
        // jumping back over the approach square is not a move
        if toward == direction.opposite() {
            return false;
        }
        if blocked(&position.walls, x, y, toward) {
            return false;
        }
        x = other.x;
        y = other.y;
        if can_simple_move(&position.walls, x, y, toward) {
            // the straight continuation is open, so it is the only jump
            return direction == toward;
        }
        // straight continuation shut: a sidestep falls through to the
        // ordinary checks from the opponent's square
    }

    if !can_simple_move(&position.walls, x, y, direction) {
        return false;
    }
    match step(x, y, direction) {
        Some((nx, ny)) => nx != other.x || ny != other.y,
        None => false,
    }
}

/// Attempts to move the side to move one square, or over the opponent when
/// `jump` is set. On success the pawn and the turn are updated.
pub fn move_pawn(position: &mut Position, direction: Direction, jump: bool) -> bool {
    if !can_move(position, direction, jump) {
        return false;
    }

    let turn = position.turn;
    if jump {
        position.players[turn].x = position.players[(turn + 1) % 2].x;
        position.players[turn].y = position.players[(turn + 1) % 2].y;
    }
    let (dx, dy) = direction.offset();
    position.players[turn].x = (position.players[turn].x as i8 + dx) as u8;
    position.players[turn].y = (position.players[turn].y as i8 + dy) as u8;
    position.turn = (turn + 1) % 2;
    true
}

fn can_back_move(position: &Position, direction: Direction, jump: bool) -> bool {
    let other = position.players[position.turn];
    let (mut x, mut y) = {
        let mover = position.players[position.opponent()];
        (mover.x, mover.y)
    };

    if jump {
        let toward = match direction_between((x, y), (other.x, other.y)) {
            Some(d) => d,
            None => return false,
        };
        if toward == direction.opposite() {
            return false;
        }
        if blocked(&position.walls, x, y, toward) {
            return false;
        }
        x = other.x;
        y = other.y;
        if toward != direction {
            // rewinding a sidestep jump: the origin lies `direction`-wards
            // of the jumped pawn, and the jump was only legal because the
            // straight continuation behind that pawn was shut
            return can_simple_move(&position.walls, x, y, direction)
                && !can_simple_move(&position.walls, x, y, direction.opposite());
        }
    }

    if !can_simple_move(&position.walls, x, y, direction) {
        return false;
    }
    match step(x, y, direction) {
        Some((nx, ny)) => nx != other.x || ny != other.y,
        None => false,
    }
}

/// Inverse of [`move_pawn`]: rewinds the previous player's move, putting
/// their pawn back on the square `direction`-wards of where it stands and
/// returning them the turn. Accepts exactly the rewinds that [`move_pawn`]
/// would replay on the resulting position.
pub fn back_move(position: &mut Position, direction: Direction, jump: bool) -> bool {
    if !can_back_move(position, direction, jump) {
        return false;
    }

    let prev = position.opponent();
    if jump {
        position.players[prev].x = position.players[position.turn].x;
        position.players[prev].y = position.players[position.turn].y;
    }
    let (dx, dy) = direction.offset();
    position.players[prev].x = (position.players[prev].x as i8 + dx) as u8;
    position.players[prev].y = (position.players[prev].y as i8 + dy) as u8;
    position.turn = prev;
    true
}

/// True if a segment of `orientation` anchored at `(x, y)` overlaps no
/// same-orientation neighbor along its own line. The anchor itself being
/// free is checked by [`place`].
pub fn can_simple_place(walls: &WallGrid, x: u8, y: u8, orientation: Orientation) -> bool {
    let (dx, dy) = match orientation {
        Orientation::Vertical => (1i8, 0i8),
        Orientation::Horizontal => (0, 1),
    };
    let x = x as i8;
    let y = y as i8;
    wall_at(walls, x - dx, y - dy) != Some(orientation)
        && wall_at(walls, x + dx, y + dy) != Some(orientation)
}

/// Every square from which `player`'s goal row can still be reached.
///
/// Breadth-first from the goal row itself; wall blocking is symmetric, so
/// the flood fill finds exactly the squares with a path to the goal.
pub fn squares_reaching_goal(walls: &WallGrid, player: usize) -> [[bool; BOARD_SIZE]; BOARD_SIZE] {
    let goal = goal_row(player) as usize;
    let mut reachable = [[false; BOARD_SIZE]; BOARD_SIZE];
    let mut frontier = CodeQueue::new();

    for y in 0..BOARD_SIZE {
        reachable[goal][y] = true;
        frontier.enqueue((goal * BOARD_SIZE + y) as u64);
    }

    while let Some(cell) = frontier.dequeue() {
        let x = (cell as usize / BOARD_SIZE) as u8;
        let y = (cell as usize % BOARD_SIZE) as u8;
        for &direction in Direction::ALL.iter() {
            if let Some((nx, ny)) = step(x, y, direction) {
                if !blocked(walls, x, y, direction) && !reachable[nx as usize][ny as usize] {
                    reachable[nx as usize][ny as usize] = true;
                    frontier.enqueue((nx as usize * BOARD_SIZE + ny as usize) as u64);
                }
            }
        }
    }

    reachable
}

fn both_pawns_connected(position: &Position) -> bool {
    (0..2).all(|player| {
        let reachable = squares_reaching_goal(&position.walls, player);
        reachable[position.players[player].x as usize][position.players[player].y as usize]
    })
}

fn can_place(position: &mut Position, x: u8, y: u8, orientation: Orientation) -> bool {
    if x as usize >= BOARD_SIZE - 1 || y as usize >= BOARD_SIZE - 1 {
        return false;
    }
    if position.players[position.turn].walls == 0 {
        return false;
    }
    if position.walls[x as usize][y as usize].is_some() {
        return false;
    }

    // drop the segment in provisionally to test the paths
    position.walls[x as usize][y as usize] = Some(orientation);
    let connected = both_pawns_connected(position);
    position.walls[x as usize][y as usize] = None;

    connected && can_simple_place(&position.walls, x, y, orientation)
}

/// Attempts a wall placement for the side to move: the anchor must be free,
/// a wall must be in hand, the segment may not overlap, and both pawns must
/// keep a path to their goal rows afterwards. On success the grid, the wall
/// stock and the turn are updated.
pub fn place(position: &mut Position, x: u8, y: u8, orientation: Orientation) -> bool {
    if !can_place(position, x, y, orientation) {
        return false;
    }

    position.walls[x as usize][y as usize] = Some(orientation);
    position.players[position.turn].walls -= 1;
    position.turn = (position.turn + 1) % 2;
    true
}
