use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::error::{Error, Result};
use crate::game::players_compare::{CompareResult, PlayerComparator};
use crate::ttt::config::{
    CpuPlayerBuilder, CpuStrategy, PlayerConfig, DEFAULT_BOARD_SIZE, DEFAULT_CACHE_SIZE,
};
use crate::ttt::{TttGame, TttPosition};

#[derive(Parser, Debug)]
#[clap(about = "Play computer strategies against each other", long_about = None)]
pub struct PlayersCompareArgs {
    /// number of rows/cols on the board
    #[clap(short, long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
    /// start from this position instead of an empty board, e.g. "x___o____x"
    #[clap(long)]
    start: Option<String>,
    #[clap(long, value_enum, default_value_t = CpuStrategy::Minimax)]
    player1: CpuStrategy,
    #[clap(long, value_enum, default_value_t = CpuStrategy::Mcts)]
    player2: CpuStrategy,
    #[clap(long, default_value_t = 10)]
    games_num: u32,
    /// minimax depth limit, chosen from the board size when omitted
    #[clap(long)]
    depth: Option<u32>,
    /// mcts simulations per move, chosen from the board size when omitted
    #[clap(long)]
    sim_num: Option<u32>,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, default_value_t = 1)]
    threads: u32,
    /// write the JSON result here instead of stdout
    #[clap(long)]
    result_file: Option<PathBuf>,
}

impl PlayersCompareArgs {
    fn start_position(&self) -> Result<TttPosition> {
        match &self.start {
            Some(s) => s.parse(),
            None => TttPosition::new(self.size),
        }
    }

    pub fn run(&self) -> Result<CompareResult> {
        if self.threads == 0 {
            return Err(Error::InvalidConfiguration {
                message: "at least one thread is needed".to_string(),
            });
        }
        let start = self.start_position()?;
        let seed = self.seed.unwrap_or_else(rand::random);

        let player_config = |strategy, seed| {
            PlayerConfig::new(strategy, start.size(), self.depth, self.sim_num, Some(seed))
        };
        let player1 =
            CpuPlayerBuilder::new(player_config(self.player1, seed)?, DEFAULT_CACHE_SIZE);
        let player2 = CpuPlayerBuilder::new(
            player_config(self.player2, seed.wrapping_add(1 << 32))?,
            DEFAULT_CACHE_SIZE,
        );

        info!(
            "comparing {} against {} on a {}x{} board over {} games",
            self.player1,
            self.player2,
            start.size(),
            start.size(),
            self.games_num
        );
        let comparator = PlayerComparator::<TttGame>::new(
            Box::new(player1),
            Box::new(player2),
            start,
            self.threads,
        );
        comparator.compare_players(self.games_num)
    }
}

pub fn run_main() -> Result<()> {
    let args = PlayersCompareArgs::parse();
    let result = args.run()?;

    let json_str = result.to_json();
    match &args.result_file {
        Some(path) => fs::write(path, json_str)
            .map_err(|e| Error::io(format!("write result file {}", path.display()), e))?,
        None => println!("{}", json_str),
    }
    Ok(())
}
