use itertools::Itertools;
use log::{debug, info};

use crate::error::Result;
use crate::game::player::GamePlayer;
use crate::game::{Game, GameColor};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

pub trait PlayerBuilder<G: Game>: Sync + Send {
    fn new_player(&self) -> Box<dyn GamePlayer<G>>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CompareResult {
    pub player1_wins: u32,
    pub player2_wins: u32,
    pub draws: u32,
}

impl CompareResult {
    pub fn games_num(&self) -> u32 {
        self.player1_wins + self.player2_wins + self.draws
    }

    pub fn to_json(&self) -> String {
        json::object! {
            player1_wins: self.player1_wins,
            player2_wins: self.player2_wins,
            draws: self.draws,
        }
        .dump()
    }
}

/// Plays games between two players from a common start position, player1 always moving first
pub struct PlayerComparator<G: Game> {
    player1_builder: Arc<dyn PlayerBuilder<G>>,
    player2_builder: Arc<dyn PlayerBuilder<G>>,
    start: G::Position,
    thread_num: u32,
}

impl<G: Game + 'static> PlayerComparator<G> {
    pub fn new(
        player1_builder: Box<dyn PlayerBuilder<G>>,
        player2_builder: Box<dyn PlayerBuilder<G>>,
        start: G::Position,
        thread_num: u32,
    ) -> Self {
        assert!(thread_num > 0);
        Self {
            player1_builder: Arc::from(player1_builder),
            player2_builder: Arc::from(player2_builder),
            start,
            thread_num,
        }
    }

    pub fn compare_players(&self, games_num: u32) -> Result<CompareResult> {
        let player1_wins = Arc::new(AtomicU32::new(0));
        let player2_wins = Arc::new(AtomicU32::new(0));
        let draws = Arc::new(AtomicU32::new(0));

        let job_builder = |thread_idx: u32| {
            let thread_game_num = games_num * (thread_idx + 1) / self.thread_num
                - games_num * thread_idx / self.thread_num;

            let worker = ComparatorWorker::<G> {
                player1_builder: Arc::clone(&self.player1_builder),
                player2_builder: Arc::clone(&self.player2_builder),
                start: self.start.clone(),
                games_num: thread_game_num,
                player1_wins: Arc::clone(&player1_wins),
                player2_wins: Arc::clone(&player2_wins),
                draws: Arc::clone(&draws),
            };

            move || worker.compare_players()
        };

        /* Spawn thread_num-1 to jobs [1..thread_num-1] */
        let threads = (1..self.thread_num)
            .map(|thread_idx| thread::spawn(job_builder(thread_idx)))
            .collect_vec();

        /* Use current thread to do job 0 */
        let mut res = job_builder(0)();

        /* Join all threads */
        for t in threads {
            let thread_res = t.join().unwrap_or_else(|e| std::panic::resume_unwind(e));
            res = res.and(thread_res);
        }
        res?;

        let result = CompareResult {
            player1_wins: player1_wins.load(Ordering::Relaxed),
            player2_wins: player2_wins.load(Ordering::Relaxed),
            draws: draws.load(Ordering::Relaxed),
        };
        info!(
            "compared players over {} games: {:?}",
            result.games_num(),
            result
        );
        Ok(result)
    }
}

struct ComparatorWorker<G: Game> {
    player1_builder: Arc<dyn PlayerBuilder<G>>,
    player2_builder: Arc<dyn PlayerBuilder<G>>,
    start: G::Position,
    games_num: u32,
    player1_wins: Arc<AtomicU32>,
    player2_wins: Arc<AtomicU32>,
    draws: Arc<AtomicU32>,
}

impl<G: Game> ComparatorWorker<G> {
    fn compare_players(&self) -> Result<()> {
        let mut player1 = self.player1_builder.new_player();
        let mut player2 = self.player2_builder.new_player();
        for game_idx in 0..self.games_num {
            let (_final_pos, winner) = G::from_position(self.start.clone())
                .play_until_over(player1.as_mut(), player2.as_mut())?;
            match winner {
                Some(GameColor::Player1) => &self.player1_wins,
                Some(GameColor::Player2) => &self.player2_wins,
                None => &self.draws,
            }
            .fetch_add(1, Ordering::Relaxed);
            debug!("game {} finished, winner {:?}", game_idx, winner);
        }
        Ok(())
    }
}
