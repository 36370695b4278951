//! Read-side access to the shipped layer tables.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use byteorder::{NativeEndian, ReadBytesExt};

use crate::codec::{dimension, encode};
use crate::pascal::Pascal;
use crate::position::{Move, Position};

/// One solved layer, loaded from its `layer_<l>.quoridor` file.
///
/// A consumer computes the index of a position, reads 16 bits at
/// `index * 2` and decodes. A stored 0 means no decision exists there:
/// either the index does not encode a reachable position, or the side to
/// move has no forced line left.
pub struct Oracle {
    layer: usize,
    moves: Vec<u16>,
}

impl Oracle {
    /// Loads the table for `layer` from `dir`.
    pub fn load(dir: &Path, layer: usize, pascal: &Pascal) -> Result<Self> {
        let size = dimension(pascal, layer)?;
        let path = dir.join(format!("layer_{}.quoridor", layer));
        let file =
            File::open(&path).with_context(|| format!("could not open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let mut moves = vec![0u16; size as usize];
        for slot in moves.iter_mut() {
            *slot = reader.read_u16::<NativeEndian>()?;
        }

        Ok(Self { layer, moves })
    }

    /// The optimal move for `position`, or `None` when the table holds no
    /// decision for it. The position must carry exactly this layer's wall
    /// count.
    pub fn lookup(&self, pascal: &Pascal, position: &Position) -> Result<Option<Move>> {
        if position.layer() != self.layer {
            return Err(anyhow!(
                "position has {} walls but the table holds layer {}",
                position.layer(),
                self.layer
            ));
        }
        let index = encode(pascal, position, self.layer);
        Ok(Move::decode(self.moves[index as usize]))
    }
}
