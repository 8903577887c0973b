use crate::types::Direction;

pub const CELL_SIZE: i32 = 20;
pub const CANVAS_WIDTH: i32 = 350;
pub const CANVAS_HEIGHT: i32 = 350;

pub const INITIAL_TICK_MS: u64 = 150;
pub const TICK_DECREMENT_MS: u64 = 10;
pub const MIN_TICK_MS: u64 = 50;

pub const POINTS_PER_FOOD: i32 = 10;
pub const LEVEL_UP_THRESHOLD: i32 = 50;
pub const HIGH_SCORE_CAPACITY: usize = 10;

pub const IDLE_POLL_MS: u64 = 25;

pub const INITIAL_SNAKE: [(i32, i32); 3] = [(10, 10), (9, 10), (8, 10)];
pub const INITIAL_DIRECTION: Direction = Direction::Right;
