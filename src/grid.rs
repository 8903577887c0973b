use crate::types::{GameConfig, Vec2};

#[derive(Clone, Copy, Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            width: config.grid_width,
            height: config.grid_height,
        }
    }

    pub fn contains(&self, cell: Vec2) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}
