use std::collections::HashSet;

use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::Vec2;

pub fn spawn_food(rng: &mut Rng, grid: &Grid, occupied: &HashSet<Vec2>) -> Option<Vec2> {
    let free_cells = grid
        .cell_count()
        .saturating_sub(occupied.iter().filter(|cell| grid.contains(**cell)).count());
    if free_cells == 0 {
        return None;
    }
    loop {
        let candidate = rng.cell(grid.width, grid.height);
        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }
}
