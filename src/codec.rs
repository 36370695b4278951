//! Bijection between positions and dense per-layer table indices.
//!
//! Layer `l` holds every position with exactly `l` wall segments on the
//! board. Within a layer a position becomes one mixed-radix integer, most
//! significant digit first:
//!
//! - the combinatorial rank of the set of occupied wall anchors, under the
//!   co-lexicographic order (modulo `NB_INTER` choose `l`)
//! - one orientation bit per wall, in anchor order (modulo `2^l`)
//! - the four pawn coordinates `p0.x, p0.y, p1.x, p1.y` (modulo
//!   `BOARD_SIZE` each)
//! - player 0's wall count, shifted into the range the layer allows
//! - the turn bit
//!
//! The mapping is total over `[0, dimension(l))`: indices that decode to
//! unreachable positions are holes in the table and simply keep their
//! initial record.

use anyhow::{anyhow, Result};

use crate::pascal::Pascal;
use crate::position::{Orientation, Position};
use crate::{BOARD_SIZE, NB_INTER, NB_WALLS};

/// The values player 0's wall count may take in a layer, as the inclusive
/// lower bound and the number of values.
///
/// With `l` walls placed the players hold `2 * NB_WALLS - l` between them,
/// each at most `NB_WALLS`, so player 0 holds at least
/// `max(0, NB_WALLS - l)` and at most `min(2 * NB_WALLS - l, NB_WALLS)`.
pub fn wall_count_range(layer: usize) -> (usize, usize) {
    debug_assert!(layer <= 2 * NB_WALLS);
    let lo = NB_WALLS.saturating_sub(layer);
    let hi = (2 * NB_WALLS - layer).min(NB_WALLS);
    (lo, hi - lo + 1)
}

/// The number of table slots in a layer.
///
/// Fails if the product does not fit 64 bits, which means the board
/// parameters are too large to table at all.
pub fn dimension(pascal: &Pascal, layer: usize) -> Result<u64> {
    let (_, span) = wall_count_range(layer);
    let overflow = || anyhow!("layer {} dimension overflows 64 bits", layer);

    let factors = [
        1u64.checked_shl(layer as u32).ok_or_else(overflow)?,
        (BOARD_SIZE as u64).pow(4),
        span as u64,
        2,
    ];

    let mut result = pascal.choose(NB_INTER, layer);
    for &factor in factors.iter() {
        result = result.checked_mul(factor).ok_or_else(overflow)?;
    }
    Ok(result)
}

/// Encodes a position into its layer index.
pub fn encode(pascal: &Pascal, position: &Position, layer: usize) -> u64 {
    debug_assert_eq!(position.layer(), layer);

    let mut anchors = [0usize; NB_INTER];
    let mut horizontal = [false; NB_INTER];
    let mut count = 0;

    for anchor in 0..NB_INTER {
        let x = anchor / (BOARD_SIZE - 1);
        let y = anchor % (BOARD_SIZE - 1);
        if let Some(orientation) = position.walls[x][y] {
            anchors[count] = anchor;
            horizontal[count] = orientation == Orientation::Horizontal;
            count += 1;
        }
    }

    // rank of the anchor subset: count the subsets that order before it
    let mut result = 0u64;
    let mut start = 0;
    for i in 0..count {
        for j in start..anchors[i] {
            result += pascal.choose(NB_INTER - (j + 1), count - (i + 1));
        }
        start = anchors[i] + 1;
    }

    for i in 0..count {
        result = result * 2 + horizontal[i] as u64;
    }

    let side = BOARD_SIZE as u64;
    for player in position.players.iter() {
        result = result * side + player.x as u64;
        result = result * side + player.y as u64;
    }

    let (lo, span) = wall_count_range(layer);
    result = result * span as u64 + (position.players[0].walls as u64 - lo as u64);

    result * 2 + position.turn as u64
}

/// Decodes a layer index back into a position.
///
/// Inverse of [`encode`]: digits come off least significant first, then the
/// anchor rank is unranked greedily against the same coefficients the
/// encoder summed.
pub fn decode(pascal: &Pascal, code: u64, layer: usize) -> Position {
    let mut position = Position::empty();
    let mut code = code;

    position.turn = (code % 2) as usize;
    code /= 2;

    let (lo, span) = wall_count_range(layer);
    position.players[0].walls = (code % span as u64) as u8 + lo as u8;
    position.players[1].walls = (2 * NB_WALLS - layer) as u8 - position.players[0].walls;
    code /= span as u64;

    let side = BOARD_SIZE as u64;
    position.players[1].y = (code % side) as u8;
    code /= side;
    position.players[1].x = (code % side) as u8;
    code /= side;
    position.players[0].y = (code % side) as u8;
    code /= side;
    position.players[0].x = (code % side) as u8;
    code /= side;

    let mut orientations = [Orientation::Vertical; NB_INTER];
    for i in (0..layer).rev() {
        if code % 2 == 1 {
            orientations[i] = Orientation::Horizontal;
        }
        code /= 2;
    }

    let mut start = 0;
    for i in 0..layer {
        for j in start..NB_INTER {
            let below = pascal.choose(NB_INTER - (j + 1), layer - (i + 1));
            if code < below {
                position.walls[j / (BOARD_SIZE - 1)][j % (BOARD_SIZE - 1)] = Some(orientations[i]);
                start = j + 1;
                break;
            }
            code -= below;
        }
    }

    position
}
