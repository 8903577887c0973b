use crate::types::GameConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub score: i32,
    pub level: i32,
    pub tick_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoodOutcome {
    pub leveled_up: bool,
}

impl Progress {
    pub fn initial(config: &GameConfig) -> Self {
        Self {
            score: 0,
            level: 1,
            tick_ms: config.initial_tick_ms,
        }
    }

    pub fn on_food_eaten(&mut self, config: &GameConfig) -> FoodOutcome {
        self.score += config.points_per_food;
        let leveled_up = config.level_up_threshold > 0
            && self.score % config.level_up_threshold == 0;
        if leveled_up {
            self.level += 1;
            self.tick_ms = self
                .tick_ms
                .saturating_sub(config.tick_decrement_ms)
                .max(config.min_tick_ms);
        }
        FoodOutcome { leveled_up }
    }
}
