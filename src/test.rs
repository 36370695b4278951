#[cfg(test)]
pub mod test {
    use anyhow::Result;
    use byteorder::{NativeEndian, ReadBytesExt};
    use rayon::prelude::*;
    use std::collections::{HashMap, HashSet};
    use std::fs::{self, File};
    use std::io::{BufReader, Seek, SeekFrom};
    use std::path::{Path, PathBuf};

    use crate::codec::{decode, dimension, encode, wall_count_range};
    use crate::position::goal_row;
    use crate::rules::{back_move, can_simple_move, can_simple_place, move_pawn, place};
    use crate::storage::{Record, Slot, RECORD_BYTES};
    use crate::{
        CodeQueue, Direction, LayerStorage, Move, Oracle, Orientation, Pascal, PlayerState,
        Position, Solver, BOARD_SIZE, NB_INTER, NB_WALLS,
    };

    type WallGrid = crate::position::WallGrid;

    fn empty_grid() -> WallGrid {
        [[None; BOARD_SIZE - 1]; BOARD_SIZE - 1]
    }

    fn scratch_dir(tag: &str) -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!(
            "quoridor_solver_test_{}_{}",
            tag,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn read_temp_record(dir: &Path, layer: usize, index: u64) -> Result<Record> {
        let mut file = File::open(dir.join(format!("layer_{}_memory.temp", layer)))?;
        file.seek(SeekFrom::Start(index * RECORD_BYTES))?;
        Ok(Record::read_from(&mut file)?)
    }

    fn position(players: [(u8, u8, u8); 2], turn: usize, walls: WallGrid) -> Position {
        Position {
            players: [
                PlayerState {
                    x: players[0].0,
                    y: players[0].1,
                    walls: players[0].2,
                },
                PlayerState {
                    x: players[1].0,
                    y: players[1].1,
                    walls: players[1].2,
                },
            ],
            turn,
            walls,
        }
    }

    #[test]
    pub fn pascal_symmetry() {
        let pascal = Pascal::new();
        for n in 0..=NB_INTER {
            for k in 0..=NB_INTER {
                assert_eq!(pascal.choose(n, k), pascal.choose(k, n));
            }
        }
        assert_eq!(pascal.choose(NB_INTER, 0), 1);
        assert_eq!(pascal.choose(NB_INTER, NB_INTER), 1);
        assert_eq!(pascal.choose(0, 5), 1);
        assert_eq!(pascal.choose(9, 2), 36);
        assert_eq!(pascal.choose(8, 3), 56);
    }

    #[test]
    pub fn layer_dimensions() -> Result<()> {
        let pascal = Pascal::new();

        assert_eq!(wall_count_range(0), (1, 1));
        assert_eq!(wall_count_range(1), (0, 2));
        assert_eq!(wall_count_range(2), (0, 1));

        assert_eq!(dimension(&pascal, 0)?, 512);
        assert_eq!(dimension(&pascal, 1)?, 18432);
        assert_eq!(dimension(&pascal, 2)?, 73728);
        Ok(())
    }

    #[test]
    pub fn codec_round_trip() -> Result<()> {
        let pascal = Pascal::new();
        for layer in 0..=2 * NB_WALLS {
            let size = dimension(&pascal, layer)?;
            let consistent = (0..size).into_par_iter().all(|code| {
                let position = decode(&pascal, code, layer);
                let stock =
                    position.players[0].walls as usize + position.players[1].walls as usize;
                position.layer() == layer
                    && stock == 2 * NB_WALLS - layer
                    && encode(&pascal, &position, layer) == code
            });
            assert!(consistent, "round trip failed in layer {}", layer);
        }
        Ok(())
    }

    #[test]
    pub fn queue_is_fifo() {
        let mut queue = CodeQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(3);
        queue.enqueue(1);
        queue.enqueue(3);
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.dequeue(), Some(3));
        assert_eq!(queue.dequeue(), None);
        assert!(queue.is_empty());
    }

    #[test]
    pub fn walls_block_simple_moves() {
        let mut walls = empty_grid();
        walls[1][1] = Some(Orientation::Horizontal);

        // the segment spans columns 1 and 2 between rows 1 and 2
        assert!(!can_simple_move(&walls, 1, 1, Direction::Down));
        assert!(!can_simple_move(&walls, 1, 2, Direction::Down));
        assert!(can_simple_move(&walls, 1, 0, Direction::Down));
        assert!(!can_simple_move(&walls, 2, 1, Direction::Up));
        assert!(!can_simple_move(&walls, 2, 2, Direction::Up));
        assert!(can_simple_move(&walls, 0, 1, Direction::Down));

        let mut walls = empty_grid();
        walls[1][1] = Some(Orientation::Vertical);

        // the segment spans rows 1 and 2 between columns 1 and 2
        assert!(!can_simple_move(&walls, 1, 1, Direction::Right));
        assert!(!can_simple_move(&walls, 2, 1, Direction::Right));
        assert!(!can_simple_move(&walls, 1, 2, Direction::Left));
        assert!(!can_simple_move(&walls, 2, 2, Direction::Left));
        assert!(can_simple_move(&walls, 0, 1, Direction::Right));
        assert!(can_simple_move(&walls, 3, 2, Direction::Left));

        // board edges
        let walls = empty_grid();
        assert!(!can_simple_move(&walls, 0, 0, Direction::Up));
        assert!(!can_simple_move(&walls, 0, 0, Direction::Left));
        assert!(!can_simple_move(&walls, 3, 3, Direction::Down));
        assert!(!can_simple_move(&walls, 3, 3, Direction::Right));
    }

    #[test]
    pub fn jumps_follow_the_blocked_pawn_rule() {
        // pawns face to face in a column
        let base = position([(1, 1, 0), (2, 1, 0)], 0, empty_grid());

        // stepping onto the opponent is not a move
        let mut probe = base.clone();
        assert!(!move_pawn(&mut probe, Direction::Down, false));

        // the straight jump clears the opponent
        let mut probe = base.clone();
        assert!(move_pawn(&mut probe, Direction::Down, true));
        assert_eq!(
            (probe.players[0].x, probe.players[0].y, probe.turn),
            (3, 1, 1)
        );

        // while the straight square is open, sidestep jumps are illegal
        let mut probe = base.clone();
        assert!(!move_pawn(&mut probe, Direction::Left, true));
        let mut probe = base.clone();
        assert!(!move_pawn(&mut probe, Direction::Right, true));

        // ordinary steps remain available
        for &direction in &[Direction::Up, Direction::Left, Direction::Right] {
            let mut probe = base.clone();
            assert!(move_pawn(&mut probe, direction, false));
        }

        // shut the straight square: the jump bends around the pawn
        let mut walls = empty_grid();
        walls[2][0] = Some(Orientation::Horizontal);
        let walled = position([(1, 1, 0), (2, 1, 0)], 0, walls);

        let mut probe = walled.clone();
        assert!(!move_pawn(&mut probe, Direction::Down, true));
        let mut probe = walled.clone();
        assert!(move_pawn(&mut probe, Direction::Left, true));
        assert_eq!((probe.players[0].x, probe.players[0].y), (2, 0));
        let mut probe = walled.clone();
        assert!(move_pawn(&mut probe, Direction::Right, true));
        assert_eq!((probe.players[0].x, probe.players[0].y), (2, 2));

        // jumping back toward the approach square is never a move
        let mut probe = walled.clone();
        assert!(!move_pawn(&mut probe, Direction::Up, true));
    }

    #[test]
    pub fn back_move_inverts_move() -> Result<()> {
        let pascal = Pascal::new();
        let mut walls = empty_grid();
        walls[1][1] = Some(Orientation::Horizontal);
        walls[2][0] = Some(Orientation::Vertical);
        let layer = 2;

        let mut positions = Vec::new();
        for x0 in 0..BOARD_SIZE as u8 {
            for y0 in 0..BOARD_SIZE as u8 {
                for x1 in 0..BOARD_SIZE as u8 {
                    for y1 in 0..BOARD_SIZE as u8 {
                        if (x0, y0) == (x1, y1) {
                            continue;
                        }
                        for turn in 0..2 {
                            positions.push(position(
                                [(x0, y0, 0), (x1, y1, 0)],
                                turn,
                                walls,
                            ));
                        }
                    }
                }
            }
        }

        // forward map: position -> the set of positions that can move there
        let mut forward: HashMap<u64, HashSet<u64>> = HashMap::new();
        for origin in &positions {
            let from = encode(&pascal, origin, layer);
            for &direction in Direction::ALL.iter() {
                for &jump in &[false, true] {
                    let mut successor = origin.clone();
                    if move_pawn(&mut successor, direction, jump) {
                        forward
                            .entry(encode(&pascal, &successor, layer))
                            .or_insert_with(HashSet::new)
                            .insert(from);
                    }
                }
            }
        }

        // rewinding must produce exactly the forward predecessors
        for target in &positions {
            let code = encode(&pascal, target, layer);
            let mut rewound = HashSet::new();
            for &direction in Direction::ALL.iter() {
                for &jump in &[false, true] {
                    let mut predecessor = target.clone();
                    if back_move(&mut predecessor, direction, jump) {
                        rewound.insert(encode(&pascal, &predecessor, layer));
                    }
                }
            }
            let expected = forward.get(&code).cloned().unwrap_or_default();
            assert_eq!(rewound, expected, "predecessor mismatch for code {}", code);
        }
        Ok(())
    }

    #[test]
    pub fn placement_constraints() {
        // neighbors on the same line reject a second segment
        let mut walls = empty_grid();
        walls[1][1] = Some(Orientation::Horizontal);
        assert!(!can_simple_place(&walls, 1, 0, Orientation::Horizontal));
        assert!(!can_simple_place(&walls, 1, 2, Orientation::Horizontal));
        assert!(can_simple_place(&walls, 0, 1, Orientation::Horizontal));
        assert!(can_simple_place(&walls, 1, 0, Orientation::Vertical));

        let mut walls = empty_grid();
        walls[1][1] = Some(Orientation::Vertical);
        assert!(!can_simple_place(&walls, 0, 1, Orientation::Vertical));
        assert!(!can_simple_place(&walls, 2, 1, Orientation::Vertical));
        assert!(can_simple_place(&walls, 1, 0, Orientation::Vertical));

        // an occupied anchor refuses both orientations
        let mut probe = position([(0, 1, 1), (3, 1, 1)], 0, walls);
        assert!(!place(&mut probe, 1, 1, Orientation::Horizontal));
        assert!(!place(&mut probe, 1, 1, Orientation::Vertical));

        // no wall in hand, no placement
        let mut probe = position([(0, 1, 0), (3, 1, 1)], 0, empty_grid());
        assert!(!place(&mut probe, 0, 0, Orientation::Horizontal));
    }

    #[test]
    pub fn placement_must_keep_paths_open() {
        let mut walls = empty_grid();
        walls[2][0] = Some(Orientation::Horizontal);
        let base = position([(0, 1, 0), (3, 1, 1)], 1, walls);

        // completing the barrier across rows 2 and 3 would strand both
        // pawns away from their goal rows
        let mut probe = base.clone();
        assert!(!place(&mut probe, 2, 2, Orientation::Horizontal));
        assert_eq!(probe, base);

        // a harmless placement elsewhere goes through
        let mut probe = base.clone();
        assert!(place(&mut probe, 0, 0, Orientation::Vertical));
        assert_eq!(probe.walls[0][0], Some(Orientation::Vertical));
        assert_eq!(probe.players[1].walls, 0);
        assert_eq!(probe.turn, 0);
    }

    #[test]
    pub fn storage_round_trip() -> Result<()> {
        let root = scratch_dir("storage")?;
        let mut storage = LayerStorage::create(&root)?;

        storage.init_layer(0, 64)?;
        assert_eq!(storage.read(5, Slot::Current)?, Record::unknown());

        let record = Record {
            next: 42,
            move_to_win: 5,
            best_move: 9,
        };
        storage.write(7, record)?;
        assert_eq!(storage.read(7, Slot::Current)?, record);
        assert_eq!(storage.read(8, Slot::Current)?, Record::unknown());

        storage.compress(0, 64)?;
        let shipped = fs::read(storage.dir().join("layer_0.quoridor"))?;
        assert_eq!(shipped.len(), 128);
        assert_eq!(
            u16::from_ne_bytes([shipped[14], shipped[15]]),
            record.best_move
        );
        assert_eq!(u16::from_ne_bytes([shipped[0], shipped[1]]), 0);

        storage.rotate();
        assert_eq!(storage.read(7, Slot::Previous)?, record);
        assert!(storage.read(0, Slot::Current).is_err());
        Ok(())
    }

    #[test]
    pub fn full_solve_matches_known_values() -> Result<()> {
        let root = scratch_dir("solve")?;
        let storage = LayerStorage::create(&root)?;
        let dir = storage.dir().to_path_buf();
        let mut solver = Solver::new(storage);
        solver.run()?;

        let pascal = Pascal::new();

        // the shipped tables are exactly the move columns of the working
        // tables
        for layer in 0..=2 * NB_WALLS {
            let size = dimension(&pascal, layer)?;
            let mut working = BufReader::new(File::open(
                dir.join(format!("layer_{}_memory.temp", layer)),
            )?);
            let mut shipped =
                BufReader::new(File::open(dir.join(format!("layer_{}.quoridor", layer)))?);
            for index in 0..size {
                let record = Record::read_from(&mut working)?;
                let stored = shipped.read_u16::<NativeEndian>()?;
                assert_eq!(record.best_move, stored, "layer {} index {}", layer, index);
            }
        }

        let oracle = Oracle::load(&dir, 0, &pascal)?;

        // one square short of the goal row: step straight in
        let probe = position([(2, 0, 1), (3, 3, 1)], 0, empty_grid());
        assert_eq!(
            oracle.lookup(&pascal, &probe)?,
            Some(Move::Pawn {
                direction: Direction::Down,
                jump: false
            })
        );
        let index = encode(&pascal, &probe, 0);
        assert_eq!(read_temp_record(&dir, 0, index)?.move_to_win, 3);

        // the straight jump over the opponent wins on the spot
        let probe = position([(1, 1, 1), (2, 1, 1)], 0, empty_grid());
        assert_eq!(
            oracle.lookup(&pascal, &probe)?,
            Some(Move::Pawn {
                direction: Direction::Down,
                jump: true
            })
        );
        let index = encode(&pascal, &probe, 0);
        assert_eq!(read_temp_record(&dir, 0, index)?.move_to_win, 3);

        // a finished game holds no decision for the loser
        let probe = position([(3, 1, 1), (2, 1, 1)], 1, empty_grid());
        assert_eq!(oracle.lookup(&pascal, &probe)?, None);
        let index = encode(&pascal, &probe, 0);
        assert_eq!(read_temp_record(&dir, 0, index)?.move_to_win, 2);

        // overlapping pawns never happen, so their slot stays untouched
        let probe = position([(1, 1, 1), (1, 1, 1)], 0, empty_grid());
        assert_eq!(oracle.lookup(&pascal, &probe)?, None);
        let index = encode(&pascal, &probe, 0);
        assert_eq!(read_temp_record(&dir, 0, index)?, Record::unknown());

        Ok(())
    }

    #[test]
    pub fn oracle_self_play_is_consistent() -> Result<()> {
        let root = scratch_dir("selfplay")?;
        let storage = LayerStorage::create(&root)?;
        let dir = storage.dir().to_path_buf();
        let mut solver = Solver::new(storage);
        solver.run()?;

        let pascal = Pascal::new();
        let oracles = (0..=2 * NB_WALLS)
            .map(|layer| Oracle::load(&dir, layer, &pascal))
            .collect::<Result<Vec<_>>>()?;

        let mut current = Position::start();
        let mut value = {
            let layer = current.layer();
            read_temp_record(&dir, layer, encode(&pascal, &current, layer))?.move_to_win
        };
        assert!(value > 2, "the opening position must have a decided line");

        let mut finished = false;
        for _ in 0..500 {
            let layer = current.layer();
            match oracles[layer].lookup(&pascal, &current)? {
                None => {
                    // the stored line may only end on a finished game
                    assert_eq!(value, 2);
                    let winner = current.opponent();
                    assert_eq!(current.players[winner].x, goal_row(winner));
                    finished = true;
                    break;
                }
                Some(Move::Pawn { direction, jump }) => {
                    assert!(move_pawn(&mut current, direction, jump));
                }
                Some(Move::Wall { x, y, orientation }) => {
                    assert!(place(&mut current, x, y, orientation));
                }
            }

            // every optimal move walks one ply down the stored distance
            let layer = current.layer();
            let next = read_temp_record(&dir, layer, encode(&pascal, &current, layer))?.move_to_win;
            assert_eq!(next, value - 1);
            value = next;
        }
        assert!(finished, "self play did not reach a terminal position");
        Ok(())
    }
}
