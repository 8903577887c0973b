use crate::grid::Grid;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepDecision {
    pub new_head: Vec2,
    pub ate_food: bool,
    pub collided: bool,
}

pub fn offset(cell: Vec2, dir: Direction) -> Vec2 {
    match dir {
        Direction::Up => Vec2 {
            x: cell.x,
            y: cell.y - 1,
        },
        Direction::Down => Vec2 {
            x: cell.x,
            y: cell.y + 1,
        },
        Direction::Left => Vec2 {
            x: cell.x - 1,
            y: cell.y,
        },
        Direction::Right => Vec2 {
            x: cell.x + 1,
            y: cell.y,
        },
    }
}

pub fn step(
    snake: &[Vec2],
    direction: Direction,
    food: Vec2,
    grid: &Grid,
    strict_tail: bool,
) -> StepDecision {
    let new_head = offset(snake[0], direction);
    let body = if strict_tail {
        snake
    } else {
        &snake[..snake.len() - 1]
    };
    let collided = !grid.contains(new_head) || body.contains(&new_head);
    let ate_food = !collided && new_head == food;
    StepDecision {
        new_head,
        ate_food,
        collided,
    }
}
