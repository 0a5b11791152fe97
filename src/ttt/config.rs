use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clap::ValueEnum;

use crate::error::{Error, Result};
use crate::game::cache::SearchCache;
use crate::game::mcts::{MctsParams, MctsPlayer, ValueFunctionRand};
use crate::game::minimax::MinimaxPlayer;
use crate::game::player::{GamePlayer, PlayerRand};
use crate::game::players_compare::PlayerBuilder;
use crate::ttt::{validate_board_size, LineHeuristic, TttGame};

pub const DEFAULT_BOARD_SIZE: usize = 3;
pub const DEFAULT_CACHE_SIZE: usize = 1_000_000;

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum CpuStrategy {
    Minimax,
    Mcts,
    Random,
}

impl fmt::Display for CpuStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuStrategy::Minimax => "minimax",
            CpuStrategy::Mcts => "mcts",
            CpuStrategy::Random => "random",
        };
        write!(f, "{}", name)
    }
}

/// Search depth that keeps a move under a second or so: exhaustive up to 3x3, shallower beyond
pub fn default_minimax_depth(size: usize) -> u32 {
    match size {
        0..=3 => (size * size).max(1) as u32,
        4..=5 => 4,
        _ => 2,
    }
}

/// MCTS simulations per move: every rollout fills the board, so large boards get fewer of them
pub fn default_sim_num(size: usize) -> u32 {
    match size {
        0..=5 => 1000,
        6..=10 => 200,
        _ => 50,
    }
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub strategy: CpuStrategy,
    pub depth: u32,
    pub sim_num: u32,
    pub seed: u64,
}

impl PlayerConfig {
    pub fn new(
        strategy: CpuStrategy,
        size: usize,
        depth: Option<u32>,
        sim_num: Option<u32>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let depth = depth.unwrap_or_else(|| default_minimax_depth(size));
        let sim_num = sim_num.unwrap_or_else(|| default_sim_num(size));
        if depth == 0 {
            return Err(Error::InvalidConfiguration {
                message: "minimax depth must be at least 1".to_string(),
            });
        }
        if sim_num == 0 {
            return Err(Error::InvalidConfiguration {
                message: "mcts simulation number must be at least 1".to_string(),
            });
        }
        Ok(Self {
            strategy,
            depth,
            sim_num,
            seed: seed.unwrap_or_else(rand::random),
        })
    }

    pub fn build(
        &self,
        seed: u64,
        cache: &Arc<SearchCache<TttGame>>,
    ) -> Box<dyn GamePlayer<TttGame> + Send> {
        match self.strategy {
            CpuStrategy::Minimax => Box::new(MinimaxPlayer::new(
                self.depth,
                Arc::new(LineHeuristic),
                Arc::clone(cache),
            )),
            CpuStrategy::Mcts => Box::new(MctsPlayer::new(
                MctsParams::new(self.sim_num),
                Box::new(ValueFunctionRand::new(seed ^ 0xe4655449311aee87)),
                seed,
            )),
            CpuStrategy::Random => Box::new(PlayerRand::from_seed(seed)),
        }
    }
}

/// Builds computer players sharing one search cache, each with its own seed
pub struct CpuPlayerBuilder {
    config: PlayerConfig,
    next_seed: AtomicU64,
    cache: Arc<SearchCache<TttGame>>,
}

impl CpuPlayerBuilder {
    pub fn new(config: PlayerConfig, cache_size: usize) -> Self {
        Self {
            next_seed: AtomicU64::new(config.seed),
            config,
            cache: Arc::new(SearchCache::new(cache_size)),
        }
    }

    pub fn build_player(&self) -> Box<dyn GamePlayer<TttGame> + Send> {
        let seed = self.next_seed.fetch_add(1, Ordering::Relaxed);
        self.config.build(seed, &self.cache)
    }
}

impl PlayerBuilder<TttGame> for CpuPlayerBuilder {
    fn new_player(&self) -> Box<dyn GamePlayer<TttGame>> {
        self.build_player()
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub size: usize,
    /// Computer opponent in the second seat, `None` for two human players
    pub cpu: Option<PlayerConfig>,
}

impl SessionConfig {
    pub fn new(size: usize, cpu: Option<PlayerConfig>) -> Result<Self> {
        validate_board_size(size)?;
        Ok(Self { size, cpu })
    }

    pub fn is_solo(&self) -> bool {
        self.cpu.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ttt::MAX_BOARD_SIZE;

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(
            SessionConfig::new(0, None),
            Err(Error::InvalidBoardSize { size: 0, .. })
        ));
        assert!(SessionConfig::new(MAX_BOARD_SIZE + 1, None).is_err());
        assert!(SessionConfig::new(1, None).is_ok());
        assert!(SessionConfig::new(MAX_BOARD_SIZE, None).is_ok());
    }

    #[test]
    fn rejects_zero_search_limits() {
        assert!(matches!(
            PlayerConfig::new(CpuStrategy::Minimax, 3, Some(0), Some(10), None),
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            PlayerConfig::new(CpuStrategy::Mcts, 3, None, Some(0), None),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn default_depth_depends_on_size() {
        let config = PlayerConfig::new(CpuStrategy::Minimax, 3, None, Some(10), Some(1)).unwrap();
        assert_eq!(config.depth, 9);
        assert_eq!(default_minimax_depth(1), 1);
        assert_eq!(default_minimax_depth(4), 4);
        assert_eq!(default_minimax_depth(12), 2);
    }

    #[test]
    fn default_sim_num_shrinks_with_board() {
        let small = PlayerConfig::new(CpuStrategy::Mcts, 3, None, None, Some(1)).unwrap();
        assert_eq!(small.sim_num, 1000);
        let large = PlayerConfig::new(CpuStrategy::Mcts, 40, None, None, Some(1)).unwrap();
        assert_eq!(large.sim_num, 50);
        let explicit = PlayerConfig::new(CpuStrategy::Mcts, 40, None, Some(7), Some(1)).unwrap();
        assert_eq!(explicit.sim_num, 7);
        assert!(default_sim_num(8) < default_sim_num(5));
    }

    #[test]
    fn builder_hands_out_distinct_seeds() {
        let config = PlayerConfig::new(CpuStrategy::Random, 3, None, Some(10), Some(5)).unwrap();
        let builder = CpuPlayerBuilder::new(config, 16);
        builder.build_player();
        builder.build_player();
        assert_eq!(builder.next_seed.load(Ordering::Relaxed), 7);
    }
}
