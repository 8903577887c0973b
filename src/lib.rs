pub mod constants;
pub mod engine;
pub mod grid;
pub mod highscore_store;
pub mod movement;
pub mod progress;
pub mod rng;
pub mod server_protocol;
pub mod spawn;
pub mod types;
