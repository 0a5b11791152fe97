use std::sync::Arc;

use log::{debug, trace};

use crate::game::cache::{Bound, CacheEntry, SearchCache};
use crate::game::player::GamePlayer;
use crate::game::{Game, GameStatus, Position};

/// Score of a position where the side to move has already lost, before distance adjustment
pub const WIN_SCORE: i32 = 1_000_000;

/// Scores beyond this are forced wins or losses, anything below is a heuristic estimate
const WIN_THRESHOLD: i32 = WIN_SCORE - 100_000;

/// Static evaluation of non terminal positions at the search horizon
pub trait PositionEvaluator<G: Game>: Send + Sync {
    /// Score from the point of view of the side to move, higher is better
    fn evaluate(&self, position: &G::Position) -> i32;
}

/// Treats every unfinished position as even, only exhaustive searches play well with it
pub struct NeutralEvaluator;

impl<G: Game> PositionEvaluator<G> for NeutralEvaluator {
    fn evaluate(&self, _position: &G::Position) -> i32 {
        0
    }
}

/// Depth limited negamax with alpha-beta pruning and a transposition cache
pub struct MinimaxPlayer<G: Game> {
    max_depth: u32,
    evaluator: Arc<dyn PositionEvaluator<G>>,
    cache: Arc<SearchCache<G>>,
    nodes: u64,
}

impl<G: Game> MinimaxPlayer<G> {
    pub fn new(
        max_depth: u32,
        evaluator: Arc<dyn PositionEvaluator<G>>,
        cache: Arc<SearchCache<G>>,
    ) -> Self {
        assert!(max_depth > 0);
        Self {
            max_depth,
            evaluator,
            cache,
            nodes: 0,
        }
    }

    /// Best move and its score, `None` if the position has no legal moves.
    /// Ties go to the first move in `legal_moves` order.
    pub fn best_move(&mut self, position: &G::Position) -> Option<(G::Move, i32)> {
        self.nodes = 0;
        let mut alpha = -i32::MAX;
        let beta = i32::MAX;
        let mut best: Option<(G::Move, i32)> = None;

        for m in position.legal_moves() {
            let child = position.moved_position(m);
            let score = -self.negamax(&child, self.max_depth - 1, 1, -beta, -alpha);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((m, score));
            }
            alpha = alpha.max(score);
        }

        if let Some((m, score)) = best {
            debug!(
                "minimax chose {} with score {} after {} nodes",
                m, score, self.nodes
            );
        }
        trace!(
            "search cache: {} entries, {} hits, {} misses",
            self.cache.len(),
            self.cache.hits(),
            self.cache.misses()
        );
        best
    }

    fn negamax(
        &mut self,
        position: &G::Position,
        depth: u32,
        ply: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.nodes += 1;

        match position.status() {
            GameStatus::Finished(None) => return 0,
            GameStatus::Finished(Some(winner)) => {
                return if winner == position.turn() {
                    WIN_SCORE - ply
                } else {
                    -(WIN_SCORE - ply)
                };
            }
            GameStatus::Ongoing => {}
        }

        if depth == 0 {
            return self
                .evaluator
                .evaluate(position)
                .clamp(-WIN_THRESHOLD, WIN_THRESHOLD);
        }

        if let Some(entry) = self.cache.get(position, depth) {
            let score = score_from_cache(entry.score, ply);
            match entry.bound {
                Bound::Exact => return score,
                Bound::Lower => alpha = alpha.max(score),
                Bound::Upper => beta = beta.min(score),
            }
            if alpha >= beta {
                return score;
            }
        }

        let alpha_orig = alpha;
        let mut best = -i32::MAX;
        for m in position.legal_moves() {
            let child = position.moved_position(m);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha);
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.cache.insert(
            position,
            CacheEntry {
                depth,
                score: score_to_cache(best, ply),
                bound,
            },
        );
        best
    }
}

/// Forced results are cached relative to the cached position instead of the search root
fn score_to_cache(score: i32, ply: i32) -> i32 {
    if score > WIN_THRESHOLD {
        score + ply
    } else if score < -WIN_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_cache(score: i32, ply: i32) -> i32 {
    if score > WIN_THRESHOLD {
        score - ply
    } else if score < -WIN_THRESHOLD {
        score + ply
    } else {
        score
    }
}

impl<G: Game> GamePlayer<G> for MinimaxPlayer<G> {
    fn next_move(&mut self, pos_history: &[G::Position]) -> Option<G::Move> {
        let position = pos_history.last()?;
        self.best_move(position).map(|(m, _score)| m)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    use super::*;
    use crate::game::player::PlayerRand;
    use crate::game::GameColor;
    use crate::ttt::{LineHeuristic, TttGame, TttMove, TttPosition};

    fn perfect_player() -> MinimaxPlayer<TttGame> {
        MinimaxPlayer::new(
            9,
            Arc::new(NeutralEvaluator),
            Arc::new(SearchCache::new(100_000)),
        )
    }

    fn pos(s: &str) -> TttPosition {
        s.parse().unwrap()
    }

    #[test]
    fn takes_immediate_win() {
        let mut player = perfect_player();
        let (m, score) = player.best_move(&pos("xx_oo____x")).unwrap();
        assert_eq!(m, TttMove::new(0, 2));
        assert_eq!(score, WIN_SCORE - 1);
    }

    #[test]
    fn blocks_immediate_loss() {
        let mut player = perfect_player();
        let (m, _) = player.best_move(&pos("xx__o____o")).unwrap();
        assert_eq!(m, TttMove::new(0, 2));
    }

    #[test]
    fn prefers_faster_win() {
        // (1, 1) also wins by force, but only a move later
        let mut player = perfect_player();
        let (m, score) = player.best_move(&pos("xx_o_o___x")).unwrap();
        assert_eq!(m, TttMove::new(0, 2));
        assert_eq!(score, WIN_SCORE - 1);
    }

    #[test]
    fn empty_board_is_draw() {
        let mut player = perfect_player();
        let (_, score) = player.best_move(&TttPosition::new(3).unwrap()).unwrap();
        assert_eq!(score, 0);
    }

    #[test]
    fn self_play_is_draw() {
        let mut player1 = perfect_player();
        let mut player2 = perfect_player();
        let mut game = TttGame::new(3).unwrap();
        let (_, winner) = game.play_until_over(&mut player1, &mut player2).unwrap();
        assert_eq!(winner, None);
    }

    #[test]
    fn never_loses_to_random() {
        let mut rand = StdRng::seed_from_u64(0xdecaf);
        for _ in 0..10 {
            let mut minimax = perfect_player();
            let mut random = PlayerRand::from_seed(rand.next_u64());

            let mut game = TttGame::new(3).unwrap();
            let (_, winner) = game.play_until_over(&mut minimax, &mut random).unwrap();
            assert_ne!(winner, Some(GameColor::Player2));

            let mut game = TttGame::new(3).unwrap();
            let (_, winner) = game.play_until_over(&mut random, &mut minimax).unwrap();
            assert_ne!(winner, Some(GameColor::Player1));
        }
    }

    #[test]
    fn shallow_search_on_large_board() {
        let mut player = MinimaxPlayer::<TttGame>::new(
            2,
            Arc::new(LineHeuristic),
            Arc::new(SearchCache::new(10_000)),
        );
        // O must block the fifth X in the top row
        let p = pos("xxxx_ooo_________________o");
        assert_eq!(p.size(), 5);
        let (m, _) = player.best_move(&p).unwrap();
        assert_eq!(m, TttMove::new(0, 4));
    }

    #[test]
    fn no_move_when_finished() {
        let mut player = perfect_player();
        assert!(player.best_move(&pos("xxxoo____o")).is_none());
    }
}
