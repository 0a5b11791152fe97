pub mod cli;
pub mod config;
mod heuristic;
pub mod play_cmd;
pub mod players_compare_cmd;
mod ttt_game;

pub use heuristic::LineHeuristic;
pub use ttt_game::*;
