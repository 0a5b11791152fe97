use itertools::Itertools;
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::game::player::{GamePlayer, PlayerRand};
use crate::game::{Game, GameStatus, Position};

struct MctsNode<P: Position> {
    position: P,

    /// The initial score calculated for this node.
    /// In range [0, 1], "probability"
    init_score: f32,

    /// This is the variable n from UCT formula
    simulations_n: u32,

    /// This is the variable w from UCT formula, from the point of view of the player who
    /// moved into this node. Float because could be half for games with ties
    score_w: f32,
}

impl<P: Position> MctsNode<P> {
    fn from_position(position: P, init_score: f32) -> Self {
        Self {
            position,
            init_score,
            simulations_n: 0,
            score_w: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MctsParams {
    pub sim_num: u32,
    pub explore_factor: f32,
    /// Zero picks the most visited move, higher values sample moves by visit count
    pub temperature: f32,
}

impl MctsParams {
    pub fn new(sim_num: u32) -> Self {
        Self {
            sim_num,
            explore_factor: std::f32::consts::SQRT_2,
            temperature: 0.0,
        }
    }
}

/// Monte Carlo Tree Search (MCTS) player, the tree is rebuilt from scratch for every move
pub struct MctsPlayer<G: Game> {
    search_tree: DiGraph<MctsNode<G::Position>, G::Move>,
    params: MctsParams,
    value_func: Box<dyn ValueFunction<G> + Send>,
    rand: StdRng,
}

impl<G: Game> MctsPlayer<G> {
    pub fn new(
        params: MctsParams,
        value_func: Box<dyn ValueFunction<G> + Send>,
        seed: u64,
    ) -> Self {
        assert!(params.sim_num > 0);
        Self {
            search_tree: DiGraph::new(),
            params,
            value_func,
            rand: StdRng::seed_from_u64(seed),
        }
    }

    fn develop_tree(&mut self, root_id: NodeIndex) {
        for _ in 0..self.params.sim_num {
            /* Select a leaf node */
            let path_to_selection = self.select(root_id);
            let leaf_id = path_to_selection[path_to_selection.len() - 1];

            /* Run value function once to obtain "simulation" value and initial children
             * scores (probabilities) */
            let (value, per_move_init_score) = self.simulate(leaf_id);

            /* Expand leaf */
            self.create_children(leaf_id, per_move_init_score);

            /* back propagate the score to the parents */
            self.backpropagate(&path_to_selection, value);
        }
    }

    /* Return path to selected leaf node */
    fn select(&self, root_id: NodeIndex) -> Vec<NodeIndex> {
        let mut path = vec![];

        let mut node_id = root_id;
        loop {
            path.push(node_id);
            let node = &self.search_tree[node_id];

            /* Node is leaf, done */
            let best_child = self
                .search_tree
                .edges(node_id)
                .map(|edge| edge.target())
                .max_by(|&child1_id, &child2_id| {
                    let val1 = self.calc_selection_heuristic(node, &self.search_tree[child1_id]);
                    let val2 = self.calc_selection_heuristic(node, &self.search_tree[child2_id]);
                    val1.total_cmp(&val2)
                });
            match best_child {
                None => return path,
                /* Node is not a leaf, choose best child and continue in it's sub tree */
                Some(child_id) => node_id = child_id,
            }
        }
    }

    fn calc_selection_heuristic(
        &self,
        parent: &MctsNode<G::Position>,
        child: &MctsNode<G::Position>,
    ) -> f32 {
        let exploit = if child.simulations_n == 0 {
            0.0
        } else {
            child.score_w / child.simulations_n as f32
        };

        let explore = self.params.explore_factor
            * child.init_score
            * ((parent.simulations_n as f32).sqrt() / (1 + child.simulations_n) as f32);

        exploit + explore
    }

    fn create_children(&mut self, parent_id: NodeIndex, per_move_init_score: Vec<(G::Move, f32)>) {
        let parent_pos = self.search_tree[parent_id].position.clone();
        if parent_pos.status().is_finished() || self.search_tree.edges(parent_id).next().is_some() {
            return;
        }
        for (m, p) in per_move_init_score {
            let leaf_pos = parent_pos.moved_position(m);
            let leaf_id = self
                .search_tree
                .add_node(MctsNode::from_position(leaf_pos, p));
            self.search_tree.add_edge(parent_id, leaf_id, m);
        }
    }

    fn simulate(&mut self, leaf_id: NodeIndex) -> (f32, Vec<(G::Move, f32)>) {
        self.value_func.evaluate(&self.search_tree[leaf_id].position)
    }

    /// `value` is from the point of view of the side to move at the leaf
    fn backpropagate(&mut self, path: &[NodeIndex], value: f32) {
        let mut applied_score = 1.0 - value;
        for &node_id in path.iter().rev() {
            let node = &mut self.search_tree[node_id];
            node.simulations_n += 1;
            node.score_w += applied_score;
            applied_score = 1.0 - applied_score;
        }
    }

    /// Visit count of every root move after developing the search tree
    pub fn calc_moves_visits(&mut self, position: &G::Position) -> Vec<(G::Move, u32)> {
        self.search_tree.clear();
        let root_id = self
            .search_tree
            .add_node(MctsNode::from_position(position.clone(), 1.0));

        self.develop_tree(root_id);

        let mut moves = self
            .search_tree
            .edges(root_id)
            .map(|edge| (*edge.weight(), self.search_tree[edge.target()].simulations_n))
            .collect_vec();
        /* petgraph iterates edges newest first */
        moves.reverse();
        moves
    }

    pub fn choose_move(&mut self, moves_visits: &[(G::Move, u32)]) -> Option<G::Move> {
        if moves_visits.is_empty() {
            return None;
        }

        if self.params.temperature <= 0.0 {
            return moves_visits
                .iter()
                .rev()
                .max_by_key(|&&(_, n)| n)
                .map(|&(m, _)| m);
        }

        let weights = moves_visits
            .iter()
            .map(|&(_, n)| (n as f64).powf(1.0 / self.params.temperature as f64))
            .collect_vec();
        match WeightedIndex::new(&weights) {
            Ok(distribution) => Some(moves_visits[distribution.sample(&mut self.rand)].0),
            /* All weights are zero, fall back to a uniform choice */
            Err(_) => moves_visits.choose(&mut self.rand).map(|&(m, _)| m),
        }
    }
}

impl<G: Game> GamePlayer<G> for MctsPlayer<G> {
    fn next_move(&mut self, pos_history: &[G::Position]) -> Option<G::Move> {
        let position = pos_history.last()?;
        let moves_visits = self.calc_moves_visits(position);
        let chosen = self.choose_move(&moves_visits);
        if let Some(m) = chosen {
            debug!("mcts chose {} from visits {:?}", m, moves_visits);
        }
        self.search_tree.clear();
        chosen
    }
}

pub trait ValueFunction<G: Game> {
    /// Value of `position` for its side to move in range [0, 1], and a prior for each legal move
    fn evaluate(&mut self, position: &G::Position) -> (f32, Vec<(G::Move, f32)>);
}

/// Estimates positions by playing a single random game to the end
pub struct ValueFunctionRand {
    player: PlayerRand,
}

impl ValueFunctionRand {
    pub fn new(seed: u64) -> Self {
        Self {
            player: PlayerRand::from_seed(seed),
        }
    }
}

impl<G: Game> ValueFunction<G> for ValueFunctionRand {
    fn evaluate(&mut self, position: &G::Position) -> (f32, Vec<(G::Move, f32)>) {
        let mut current = position.clone();
        let winner = loop {
            if let GameStatus::Finished(winner) = current.status() {
                break winner;
            }
            let next_move =
                <_ as GamePlayer<G>>::next_move(&mut self.player, std::slice::from_ref(&current));
            match next_move {
                Some(m) => current = current.moved_position(m),
                None => break None,
            }
        };

        let val = match winner {
            Some(color) if color == position.turn() => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        };

        /* We don't have anything smart to say per move */
        /* Assign uniform probabilities to all legal moves */
        let moves = position.legal_moves().collect_vec();
        let move_prob = 1.0 / moves.len().max(1) as f32;
        let moves_probs = moves.into_iter().map(|m| (m, move_prob)).collect_vec();

        (val, moves_probs)
    }
}
