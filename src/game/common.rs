use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::game::player::GamePlayer;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameColor {
    Player1,
    Player2,
}

impl GameColor {
    pub fn opposite(&self) -> GameColor {
        match self {
            GameColor::Player1 => GameColor::Player2,
            GameColor::Player2 => GameColor::Player1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameStatus {
    Ongoing,
    /// The winner, or `None` for a draw
    Finished(Option<GameColor>),
}

impl GameStatus {
    pub fn is_ongoing(&self) -> bool {
        matches!(self, GameStatus::Ongoing)
    }

    pub fn is_finished(&self) -> bool {
        !self.is_ongoing()
    }
}

pub trait Game: Sized {
    type Position: Position<Game = Self>;
    type Move: Move<Game = Self>;

    fn from_position(pos: Self::Position) -> Self;

    /// All positions since the start of the game, never empty
    fn pos_history(&self) -> &[Self::Position];

    fn position(&self) -> &Self::Position;

    fn status(&self) -> GameStatus {
        self.position().status()
    }

    fn play_single_turn(&mut self, next_move: Self::Move) -> Result<()>;

    fn play_until_over(
        &mut self,
        player1: &mut dyn GamePlayer<Self>,
        player2: &mut dyn GamePlayer<Self>,
    ) -> Result<(Self::Position, Option<GameColor>)> {
        loop {
            if let GameStatus::Finished(winner) = self.status() {
                return Ok((self.position().clone(), winner));
            }
            let turn = self.position().turn();
            let player: &mut dyn GamePlayer<Self> = match turn {
                GameColor::Player1 => &mut *player1,
                GameColor::Player2 => &mut *player2,
            };
            let next_move = player
                .next_move(self.pos_history())
                .ok_or_else(|| Error::NoMove {
                    player: format!("{:?}", turn),
                })?;
            self.play_single_turn(next_move)?;
        }
    }
}

pub trait Position: Clone + Eq + Hash + Debug + Send + Sync {
    type Game: Game<Position = Self>;

    fn turn(&self) -> GameColor;
    fn legal_moves(&self) -> impl Iterator<Item = <Self::Game as Game>::Move>;
    /// Position after playing `m`, which must be a legal move
    fn moved_position(&self, m: <Self::Game as Game>::Move) -> Self;
    fn status(&self) -> GameStatus;
    fn flipped(&self) -> Self;
}

pub trait Move: Clone + Copy + Eq + Hash + Display + Debug + Send + Sync {
    type Game: Game<Move = Self>;
}
