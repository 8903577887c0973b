use std::collections::HashSet;

use crate::constants::{INITIAL_DIRECTION, INITIAL_SNAKE};
use crate::grid::Grid;
use crate::movement;
use crate::progress::Progress;
use crate::rng::Rng;
use crate::spawn::spawn_food;
use crate::types::{Direction, GameConfig, RunState, RuntimeEvent, Snapshot, Vec2};

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: GameConfig,
    grid: Grid,
    rng: Rng,
    run_state: RunState,
    snake: Vec<Vec2>,
    food: Vec2,
    direction: Direction,
    pending_direction: Direction,
    progress: Progress,
    final_score: i32,
    final_level: i32,
    tick_counter: u64,
    events: Vec<RuntimeEvent>,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let grid = Grid::from_config(&config);
        let mut rng = Rng::new(seed);
        let snake = initial_snake();
        let occupied: HashSet<Vec2> = snake.iter().copied().collect();
        let food = spawn_food(&mut rng, &grid, &occupied).unwrap_or(Vec2 { x: 0, y: 0 });
        let progress = Progress::initial(&config);

        Self {
            config,
            grid,
            rng,
            run_state: RunState::Idle,
            snake,
            food,
            direction: INITIAL_DIRECTION,
            pending_direction: INITIAL_DIRECTION,
            progress,
            final_score: 0,
            final_level: 1,
            tick_counter: 0,
            events: Vec::new(),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn tick_ms(&self) -> u64 {
        self.progress.tick_ms
    }

    pub fn final_result(&self) -> Option<(i32, i32)> {
        if self.run_state == RunState::GameOver {
            Some((self.final_score, self.final_level))
        } else {
            None
        }
    }

    pub fn start(&mut self) -> bool {
        if self.run_state != RunState::Idle {
            return false;
        }
        self.reset_board();
        self.run_state = RunState::Running;
        self.events.push(RuntimeEvent::Started);
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.run_state {
            RunState::Running => {
                self.run_state = RunState::Paused;
                true
            }
            RunState::Paused => {
                self.run_state = RunState::Running;
                true
            }
            _ => false,
        }
    }

    pub fn restart(&mut self) {
        self.reset_board();
        self.run_state = RunState::Idle;
    }

    pub fn set_direction(&mut self, requested: Direction) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        if requested == self.direction.opposite() {
            return false;
        }
        self.pending_direction = requested;
        true
    }

    pub fn tick(&mut self) {
        if self.run_state != RunState::Running {
            return;
        }
        self.tick_counter += 1;
        self.direction = self.pending_direction;

        let decision = movement::step(
            &self.snake,
            self.direction,
            self.food,
            &self.grid,
            self.config.strict_tail_collision,
        );
        if decision.collided {
            self.end_run();
            return;
        }

        self.snake.insert(0, decision.new_head);
        if decision.ate_food {
            let outcome = self.progress.on_food_eaten(&self.config);
            self.events.push(RuntimeEvent::FoodEaten {
                x: decision.new_head.x,
                y: decision.new_head.y,
                score: self.progress.score,
            });
            if outcome.leveled_up {
                self.events.push(RuntimeEvent::LevelUp {
                    level: self.progress.level,
                    tick_ms: self.progress.tick_ms,
                });
            }
            let occupied: HashSet<Vec2> = self.snake.iter().copied().collect();
            match spawn_food(&mut self.rng, &self.grid, &occupied) {
                Some(cell) => self.food = cell,
                None => self.end_run(),
            }
        } else {
            self.snake.pop();
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.tick_counter,
            run_state: self.run_state,
            snake: self.snake.clone(),
            food: self.food,
            direction: self.direction,
            score: self.progress.score,
            level: self.progress.level,
            tick_ms: self.progress.tick_ms,
            final_score: self.final_result().map(|(score, _)| score),
            final_level: self.final_result().map(|(_, level)| level),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    fn end_run(&mut self) {
        self.final_score = self.progress.score;
        self.final_level = self.progress.level;
        self.run_state = RunState::GameOver;
        self.events.push(RuntimeEvent::GameOver {
            score: self.final_score,
            level: self.final_level,
        });
    }

    fn reset_board(&mut self) {
        self.snake = initial_snake();
        self.direction = INITIAL_DIRECTION;
        self.pending_direction = INITIAL_DIRECTION;
        let occupied: HashSet<Vec2> = self.snake.iter().copied().collect();
        self.food = spawn_food(&mut self.rng, &self.grid, &occupied).unwrap_or(Vec2 { x: 0, y: 0 });
        self.progress = Progress::initial(&self.config);
        self.final_score = 0;
        self.final_level = 1;
        self.tick_counter = 0;
    }
}

fn initial_snake() -> Vec<Vec2> {
    INITIAL_SNAKE
        .iter()
        .map(|&(x, y)| Vec2 { x, y })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_engine(seed: u32) -> GameEngine {
        let mut engine = GameEngine::new(GameConfig::default(), seed);
        assert!(engine.start());
        engine
    }

    fn snake_cells(engine: &GameEngine) -> Vec<Vec2> {
        engine.snake.clone()
    }

    #[test]
    fn new_engine_is_idle_with_initial_board() {
        let engine = GameEngine::new(GameConfig::default(), 1);
        assert_eq!(engine.run_state(), RunState::Idle);
        assert_eq!(
            engine.snake,
            vec![
                Vec2 { x: 10, y: 10 },
                Vec2 { x: 9, y: 10 },
                Vec2 { x: 8, y: 10 }
            ]
        );
        assert!(!engine.snake.contains(&engine.food));
        assert_eq!(engine.progress.score, 0);
        assert_eq!(engine.progress.level, 1);
        assert_eq!(engine.tick_ms(), 150);
    }

    #[test]
    fn start_is_accepted_only_from_idle() {
        let mut engine = GameEngine::new(GameConfig::default(), 2);
        assert!(engine.start());
        assert!(!engine.start());
        assert_eq!(engine.run_state(), RunState::Running);

        engine.snake = vec![Vec2 { x: 0, y: 5 }, Vec2 { x: 1, y: 5 }];
        engine.pending_direction = Direction::Left;
        engine.direction = Direction::Left;
        engine.tick();
        assert_eq!(engine.run_state(), RunState::GameOver);
        assert!(!engine.start());
        engine.restart();
        assert_eq!(engine.run_state(), RunState::Idle);
        assert!(engine.start());
    }

    #[test]
    fn plain_tick_moves_without_growing() {
        let mut engine = running_engine(3);
        engine.food = Vec2 { x: 0, y: 0 };
        let before = snake_cells(&engine);

        engine.tick();
        let after = snake_cells(&engine);
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0], Vec2 { x: 11, y: 10 });
        assert_eq!(&after[1..], &before[..before.len() - 1]);
        assert_eq!(engine.progress.score, 0);
    }

    #[test]
    fn eating_food_grows_scores_and_respawns() {
        let mut engine = running_engine(4);
        engine.food = Vec2 { x: 11, y: 10 };

        engine.tick();
        assert_eq!(
            engine.snake,
            vec![
                Vec2 { x: 11, y: 10 },
                Vec2 { x: 10, y: 10 },
                Vec2 { x: 9, y: 10 },
                Vec2 { x: 8, y: 10 }
            ]
        );
        assert_eq!(engine.progress.score, 10);
        assert!(!engine.snake.contains(&engine.food));

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::FoodEaten { score: 10, .. })));
    }

    #[test]
    fn wall_collision_ends_the_run_with_final_result() {
        let mut engine = running_engine(5);
        engine.snake = vec![
            Vec2 { x: 0, y: 5 },
            Vec2 { x: 1, y: 5 },
            Vec2 { x: 2, y: 5 },
        ];
        engine.direction = Direction::Left;
        engine.pending_direction = Direction::Left;
        engine.progress.score = 30;
        engine.progress.level = 1;

        engine.tick();
        assert_eq!(engine.run_state(), RunState::GameOver);
        assert_eq!(engine.final_result(), Some((30, 1)));
        assert_eq!(engine.snake.len(), 3);

        engine.tick();
        assert_eq!(engine.final_result(), Some((30, 1)));

        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.final_score, Some(30));
        assert_eq!(snapshot.final_level, Some(1));
        let game_over_events = snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::GameOver { .. }))
            .count();
        assert_eq!(game_over_events, 1);
    }

    #[test]
    fn level_up_on_exact_threshold_rearms_period() {
        let mut engine = running_engine(6);
        engine.progress.score = 40;
        engine.food = Vec2 { x: 11, y: 10 };

        engine.tick();
        assert_eq!(engine.progress.score, 50);
        assert_eq!(engine.progress.level, 2);
        assert_eq!(engine.tick_ms(), 140);

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.iter().any(|event| matches!(
            event,
            RuntimeEvent::LevelUp {
                level: 2,
                tick_ms: 140
            }
        )));
    }

    #[test]
    fn reversal_is_rejected_against_applied_direction() {
        let mut engine = running_engine(7);
        engine.food = Vec2 { x: 0, y: 0 };
        assert_eq!(engine.direction, Direction::Right);

        assert!(!engine.set_direction(Direction::Left));
        assert_eq!(engine.pending_direction, Direction::Right);

        assert!(engine.set_direction(Direction::Up));
        assert!(engine.set_direction(Direction::Down));
        assert_eq!(engine.pending_direction, Direction::Down);

        engine.tick();
        assert_eq!(engine.direction, Direction::Down);
        assert!(!engine.set_direction(Direction::Up));
    }

    #[test]
    fn direction_commands_are_ignored_outside_running() {
        let mut engine = GameEngine::new(GameConfig::default(), 8);
        assert!(!engine.set_direction(Direction::Up));
        engine.start();
        engine.toggle_pause();
        assert!(!engine.set_direction(Direction::Up));
        engine.toggle_pause();
        assert!(engine.set_direction(Direction::Up));
    }

    #[test]
    fn pause_toggles_and_suspends_ticks() {
        let mut engine = running_engine(9);
        engine.food = Vec2 { x: 0, y: 0 };
        assert!(engine.toggle_pause());
        assert_eq!(engine.run_state(), RunState::Paused);

        let before = snake_cells(&engine);
        engine.tick();
        assert_eq!(snake_cells(&engine), before);

        assert!(engine.toggle_pause());
        assert_eq!(engine.run_state(), RunState::Running);
        engine.tick();
        assert_ne!(snake_cells(&engine), before);
    }

    #[test]
    fn pause_is_rejected_while_idle_or_over() {
        let mut engine = GameEngine::new(GameConfig::default(), 10);
        assert!(!engine.toggle_pause());
        engine.start();
        engine.snake = vec![Vec2 { x: 0, y: 5 }, Vec2 { x: 1, y: 5 }];
        engine.direction = Direction::Left;
        engine.pending_direction = Direction::Left;
        engine.tick();
        assert_eq!(engine.run_state(), RunState::GameOver);
        assert!(!engine.toggle_pause());
    }

    #[test]
    fn restart_rebuilds_the_initial_board_from_any_state() {
        let mut engine = running_engine(11);
        engine.food = Vec2 { x: 11, y: 10 };
        engine.tick();
        assert_eq!(engine.progress.score, 10);

        engine.restart();
        assert_eq!(engine.run_state(), RunState::Idle);
        assert_eq!(engine.snake.len(), 3);
        assert_eq!(engine.snake[0], Vec2 { x: 10, y: 10 });
        assert_eq!(engine.progress.score, 0);
        assert_eq!(engine.progress.level, 1);
        assert_eq!(engine.tick_ms(), 150);
        assert_eq!(engine.build_snapshot(false).tick, 0);
        assert!(!engine.snake.contains(&engine.food));
    }

    #[test]
    fn strict_rule_flags_a_move_into_the_vacating_tail_cell() {
        let mut engine = running_engine(12);
        engine.food = Vec2 { x: 0, y: 0 };
        engine.snake = vec![
            Vec2 { x: 5, y: 5 },
            Vec2 { x: 6, y: 5 },
            Vec2 { x: 6, y: 6 },
            Vec2 { x: 5, y: 6 },
        ];
        engine.direction = Direction::Down;
        engine.pending_direction = Direction::Down;

        engine.tick();
        assert_eq!(engine.run_state(), RunState::GameOver);
    }

    #[test]
    fn lenient_rule_allows_chasing_the_tail() {
        let config = GameConfig {
            strict_tail_collision: false,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 12);
        engine.start();
        engine.food = Vec2 { x: 0, y: 0 };
        engine.snake = vec![
            Vec2 { x: 5, y: 5 },
            Vec2 { x: 6, y: 5 },
            Vec2 { x: 6, y: 6 },
            Vec2 { x: 5, y: 6 },
        ];
        engine.direction = Direction::Down;
        engine.pending_direction = Direction::Down;

        engine.tick();
        assert_eq!(engine.run_state(), RunState::Running);
        assert_eq!(engine.snake[0], Vec2 { x: 5, y: 6 });
        assert_eq!(engine.snake.len(), 4);
    }

    #[test]
    fn filling_the_board_completes_the_run() {
        let config = GameConfig {
            grid_width: 2,
            grid_height: 2,
            ..GameConfig::default()
        };
        let mut engine = GameEngine::new(config, 13);
        engine.start();
        engine.snake = vec![
            Vec2 { x: 0, y: 0 },
            Vec2 { x: 0, y: 1 },
            Vec2 { x: 1, y: 1 },
        ];
        engine.food = Vec2 { x: 1, y: 0 };
        engine.direction = Direction::Right;
        engine.pending_direction = Direction::Right;

        engine.tick();
        assert_eq!(engine.run_state(), RunState::GameOver);
        assert_eq!(engine.snake.len(), 4);
        assert_eq!(engine.final_result(), Some((10, 1)));
    }

    #[test]
    fn snake_cells_stay_distinct_over_a_seeded_run() {
        let mut engine = running_engine(424_242);
        for _ in 0..500 {
            if engine.run_state() != RunState::Running {
                break;
            }
            engine.tick();
            let unique: HashSet<Vec2> = engine.snake.iter().copied().collect();
            assert_eq!(unique.len(), engine.snake.len());
            assert!(!engine.snake.contains(&engine.food));
        }
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut a = running_engine(777);
        let mut b = running_engine(777);
        for step in 0..300 {
            if step % 7 == 0 {
                a.set_direction(Direction::Up);
                b.set_direction(Direction::Up);
            }
            if step % 11 == 0 {
                a.set_direction(Direction::Right);
                b.set_direction(Direction::Right);
            }
            a.tick();
            b.tick();
            assert_eq!(a.snake, b.snake);
            assert_eq!(a.food, b.food);
            assert_eq!(a.run_state(), b.run_state());
            assert_eq!(a.progress, b.progress);
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = GameEngine::new(GameConfig::default(), 14);
        engine.start();
        let first = engine.build_snapshot(true);
        assert!(first
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::Started)));
        let second = engine.build_snapshot(true);
        assert!(second.events.is_empty());

        engine.events.push(RuntimeEvent::Started);
        let kept = engine.build_snapshot(false);
        assert!(kept.events.is_empty());
        assert_eq!(engine.events.len(), 1);
    }
}
