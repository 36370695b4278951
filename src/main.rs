use anyhow::Result;

use std::path::Path;

use quoridor_solver::*;

fn main() -> Result<()> {
    println!("BOARD_SIZE: {}", BOARD_SIZE);
    println!("NB_WALLS: {}", NB_WALLS);

    let storage = LayerStorage::create(Path::new("data"))?;
    let mut solver = Solver::new(storage);
    solver.run()?;

    println!("All layers solved.");
    Ok(())
}
