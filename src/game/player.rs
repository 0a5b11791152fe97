use itertools::Itertools;
use rand::prelude::*;

use crate::game::{Game, Position};

pub trait GamePlayer<G: Game> {
    fn next_move(&mut self, pos_history: &[G::Position]) -> Option<G::Move>;
}

/// Plays a uniformly random legal move
pub struct PlayerRand {
    rand: StdRng,
}
impl Default for PlayerRand {
    fn default() -> Self {
        Self::new()
    }
}
impl PlayerRand {
    pub fn new() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rand: StdRng::seed_from_u64(seed),
        }
    }
}

impl<G: Game> GamePlayer<G> for PlayerRand {
    fn next_move(&mut self, pos_history: &[G::Position]) -> Option<G::Move> {
        let moves = pos_history.last()?.legal_moves().collect_vec();
        if moves.is_empty() {
            None
        } else {
            Some(moves[self.rand.gen_range(0..moves.len())])
        }
    }
}
