use std::io;

use clap::Parser;
use log::info;

use crate::error::Result;
use crate::game::player::GamePlayer;
use crate::ttt::cli::{TttPlayerCmd, TttSession};
use crate::ttt::config::{
    CpuPlayerBuilder, CpuStrategy, PlayerConfig, SessionConfig, DEFAULT_BOARD_SIZE,
    DEFAULT_CACHE_SIZE,
};
use crate::ttt::{color_to_str, TttGame};

#[derive(Parser, Debug)]
#[clap(about = "Interactive N x N tic-tac-toe in the terminal", long_about = None)]
pub struct PlayArgs {
    /// number of rows/cols on the board
    #[clap(short, long, default_value_t = DEFAULT_BOARD_SIZE)]
    size: usize,
    /// single player mode, the computer plays "O"
    #[clap(long)]
    solo: bool,
    /// computer strategy in single player mode
    #[clap(long, value_enum, default_value_t = CpuStrategy::Minimax)]
    cpu: CpuStrategy,
    /// minimax depth limit, chosen from the board size when omitted
    #[clap(long)]
    depth: Option<u32>,
    /// mcts simulations per move, chosen from the board size when omitted
    #[clap(long)]
    sim_num: Option<u32>,
    #[clap(long)]
    seed: Option<u64>,
}

impl PlayArgs {
    pub fn session_config(&self) -> Result<SessionConfig> {
        let cpu = if self.solo {
            Some(PlayerConfig::new(
                self.cpu,
                self.size,
                self.depth,
                self.sim_num,
                self.seed,
            )?)
        } else {
            None
        };
        SessionConfig::new(self.size, cpu)
    }
}

pub fn run_main() -> Result<()> {
    let args = PlayArgs::parse();
    let config = args.session_config()?;

    let mut cpu = config
        .cpu
        .clone()
        .map(|cfg| CpuPlayerBuilder::new(cfg, DEFAULT_CACHE_SIZE).build_player());
    let cpu = cpu
        .as_mut()
        .map(|player| player.as_mut() as &mut dyn GamePlayer<TttGame>);
    let mut human = TttPlayerCmd::stdio();

    let mut session = TttSession::new(config, io::stdout());
    let winner = session.run(&mut human, cpu)?;
    info!("game finished, winner: {}", color_to_str(winner));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ttt::MAX_BOARD_SIZE;

    fn parse(args: &[&str]) -> PlayArgs {
        PlayArgs::parse_from(std::iter::once("play").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_two_player_3x3() {
        let config = parse(&[]).session_config().unwrap();
        assert_eq!(config.size, 3);
        assert!(!config.is_solo());
    }

    #[test]
    fn solo_on_a_larger_board() {
        let config = parse(&["-s", "4", "--solo"]).session_config().unwrap();
        assert_eq!(config.size, 4);
        assert!(config.is_solo());
        let cpu = config.cpu.unwrap();
        assert_eq!(cpu.strategy, CpuStrategy::Minimax);
        assert_eq!(cpu.depth, 4);
    }

    #[test]
    fn cpu_options_reach_the_player_config() {
        let args = parse(&[
            "--size",
            "5",
            "--solo",
            "--cpu",
            "mcts",
            "--sim-num",
            "30",
            "--seed",
            "9",
        ]);
        let cpu = args.session_config().unwrap().cpu.unwrap();
        assert_eq!(cpu.strategy, CpuStrategy::Mcts);
        assert_eq!(cpu.sim_num, 30);
        assert_eq!(cpu.seed, 9);
    }

    #[test]
    fn rejects_out_of_range_sizes() {
        assert!(matches!(
            parse(&["--size", "0"]).session_config(),
            Err(Error::InvalidBoardSize { size: 0, .. })
        ));
        let too_big = (MAX_BOARD_SIZE + 1).to_string();
        assert!(matches!(
            parse(&["--size", &too_big]).session_config(),
            Err(Error::InvalidBoardSize { size: 100, .. })
        ));
        assert!(matches!(
            parse(&["--size", "0", "--solo"]).session_config(),
            Err(Error::InvalidBoardSize { .. })
        ));
    }

    #[test]
    fn rejects_zero_depth() {
        assert!(matches!(
            parse(&["--solo", "--depth", "0"]).session_config(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn rejects_unknown_strategy() {
        assert!(PlayArgs::try_parse_from(["play", "--cpu", "oracle"]).is_err());
    }
}
