pub mod cache;
pub mod common;
pub mod mcts;
pub mod minimax;
pub mod player;
pub mod players_compare;

pub use common::{Game, GameColor, GameStatus, Move, Position};
