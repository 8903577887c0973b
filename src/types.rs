use serde::{Deserialize, Serialize};

use crate::constants::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CELL_SIZE, HIGH_SCORE_CAPACITY, INITIAL_TICK_MS,
    LEVEL_UP_THRESHOLD, MIN_TICK_MS, POINTS_PER_FOOD, TICK_DECREMENT_MS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameConfig {
    #[serde(rename = "cellSize")]
    pub cell_size: i32,
    #[serde(rename = "gridWidth")]
    pub grid_width: i32,
    #[serde(rename = "gridHeight")]
    pub grid_height: i32,
    #[serde(rename = "initialTickMs")]
    pub initial_tick_ms: u64,
    #[serde(rename = "tickDecrementMs")]
    pub tick_decrement_ms: u64,
    #[serde(rename = "minTickMs")]
    pub min_tick_ms: u64,
    #[serde(rename = "pointsPerFood")]
    pub points_per_food: i32,
    #[serde(rename = "levelUpThreshold")]
    pub level_up_threshold: i32,
    #[serde(rename = "highScoreCapacity")]
    pub high_score_capacity: usize,
    #[serde(rename = "strictTailCollision")]
    pub strict_tail_collision: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            grid_width: CANVAS_WIDTH / CELL_SIZE,
            grid_height: CANVAS_HEIGHT / CELL_SIZE,
            initial_tick_ms: INITIAL_TICK_MS,
            tick_decrement_ms: TICK_DECREMENT_MS,
            min_tick_ms: MIN_TICK_MS,
            points_per_food: POINTS_PER_FOOD,
            level_up_threshold: LEVEL_UP_THRESHOLD,
            high_score_capacity: HIGH_SCORE_CAPACITY,
            strict_tail_collision: true,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    Started,
    FoodEaten {
        x: i32,
        y: i32,
        score: i32,
    },
    LevelUp {
        level: i32,
        #[serde(rename = "tickMs")]
        tick_ms: u64,
    },
    GameOver {
        score: i32,
        level: i32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "runState")]
    pub run_state: RunState,
    pub snake: Vec<Vec2>,
    pub food: Vec2,
    pub direction: Direction,
    pub score: i32,
    pub level: i32,
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    #[serde(rename = "finalScore", skip_serializing_if = "Option::is_none")]
    pub final_score: Option<i32>,
    #[serde(rename = "finalLevel", skip_serializing_if = "Option::is_none")]
    pub final_level: Option<i32>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: i32,
    pub level: i32,
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HighScoreResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<HighScoreEntry>,
}
