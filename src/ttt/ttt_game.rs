use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::game::{Game, GameColor, GameStatus, Move, Position};

pub const MAX_BOARD_SIZE: usize = 99;

pub fn validate_board_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_BOARD_SIZE {
        return Err(Error::InvalidBoardSize {
            size,
            max: MAX_BOARD_SIZE,
        });
    }
    Ok(())
}

pub fn color_to_str(c: Option<GameColor>) -> String {
    match c {
        None => String::from("None"),
        Some(GameColor::Player1) => String::from("X"),
        Some(GameColor::Player2) => String::from("O"),
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TttMove {
    row: usize,
    col: usize,
}

impl TttMove {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.col
    }
}

impl Move for TttMove {
    type Game = TttGame;
}

impl Display for TttMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One bit per cell, row major
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TttBitboard {
    words: Vec<u64>,
}

impl TttBitboard {
    fn new(cells_num: usize) -> Self {
        Self {
            words: vec![0; cells_num.div_ceil(64)],
        }
    }

    pub fn get(&self, idx: usize) -> bool {
        (self.words[idx / 64] & (1u64 << (idx % 64))) != 0
    }

    pub fn set(&mut self, idx: usize, val: bool) {
        let bit = 1u64 << (idx % 64);
        if val {
            self.words[idx / 64] |= bit;
        } else {
            self.words[idx / 64] &= !bit;
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}

fn line_full(board: &TttBitboard, mut cells: impl Iterator<Item = usize>) -> bool {
    cells.all(|idx| board.get(idx))
}

/// Number of marks each side has on every row, column and main diagonal
#[derive(Clone, Debug, Default)]
pub struct LineCounts {
    pub x: usize,
    pub o: usize,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TttPosition {
    size: usize,
    board_x: TttBitboard,
    board_o: TttBitboard,
    turn: GameColor,
    winner: Option<GameColor>,
}

impl TttPosition {
    pub fn new(size: usize) -> Result<Self> {
        validate_board_size(size)?;
        Ok(Self {
            size,
            board_x: TttBitboard::new(size * size),
            board_o: TttBitboard::new(size * size),
            turn: GameColor::Player1,
            winner: None,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, r: usize, c: usize) -> usize {
        r * self.size + c
    }

    pub fn tile(&self, r: usize, c: usize) -> Option<GameColor> {
        assert!(r < self.size && c < self.size);
        let idx = self.idx(r, c);
        if self.board_x.get(idx) {
            return Some(GameColor::Player1);
        }
        if self.board_o.get(idx) {
            return Some(GameColor::Player2);
        }
        None
    }

    pub fn empty_tiles(&self) -> usize {
        self.size * self.size - self.board_x.count() - self.board_o.count()
    }

    pub fn is_valid_move(&self, m: TttMove) -> bool {
        self.check_move(m).is_ok()
    }

    pub fn check_move(&self, m: TttMove) -> Result<()> {
        if m.row >= self.size || m.col >= self.size {
            return Err(Error::OutOfRange {
                row: m.row,
                col: m.col,
                size: self.size,
            });
        }
        if self.status().is_finished() {
            return Err(Error::GameOver);
        }
        if self.tile(m.row, m.col).is_some() {
            return Err(Error::Occupied {
                row: m.row,
                col: m.col,
            });
        }
        Ok(())
    }

    pub fn make_move(&mut self, m: TttMove) -> Result<()> {
        self.check_move(m)?;
        self.place(m);
        Ok(())
    }

    fn place(&mut self, m: TttMove) {
        let idx = self.idx(m.row, m.col);
        match self.turn {
            GameColor::Player1 => &mut self.board_x,
            GameColor::Player2 => &mut self.board_o,
        }
        .set(idx, true);

        if self.completes_line(m, self.turn) {
            self.winner = Some(self.turn);
        }
        self.turn = self.turn.opposite();
    }

    pub fn make_move_new(&self, m: TttMove) -> Result<Self> {
        let mut res = self.clone();
        res.make_move(m)?;
        Ok(res)
    }

    fn board_of(&self, color: GameColor) -> &TttBitboard {
        match color {
            GameColor::Player1 => &self.board_x,
            GameColor::Player2 => &self.board_o,
        }
    }

    /// Only the lines passing through `m` are scanned
    fn completes_line(&self, m: TttMove, color: GameColor) -> bool {
        let board = self.board_of(color);
        let n = self.size;

        line_full(board, (0..n).map(|c| m.row * n + c))
            || line_full(board, (0..n).map(|r| r * n + m.col))
            || (m.row == m.col && line_full(board, (0..n).map(|i| i * n + i)))
            || (m.row + m.col == n - 1 && line_full(board, (0..n).map(|i| i * n + (n - 1 - i))))
    }

    /// Full scan for positions that were not built move by move.
    /// X is checked first when both sides have a line, which can only happen on invalid boards.
    pub fn check_winner(&mut self) {
        let lines = self.line_counts();
        self.winner = if lines.iter().any(|l| l.x == self.size) {
            Some(GameColor::Player1)
        } else if lines.iter().any(|l| l.o == self.size) {
            Some(GameColor::Player2)
        } else {
            None
        };
    }

    /// Mark counts for all `2 * size + 2` lines: rows, then columns, then the two diagonals
    pub fn line_counts(&self) -> Vec<LineCounts> {
        let n = self.size;
        let mut counts = vec![LineCounts::default(); 2 * n + 2];
        for r in 0..n {
            for c in 0..n {
                let Some(color) = self.tile(r, c) else {
                    continue;
                };
                let diag = (r == c).then_some(2 * n);
                let anti_diag = (r + c == n - 1).then_some(2 * n + 1);
                for line in [Some(r), Some(n + c), diag, anti_diag].into_iter().flatten() {
                    match color {
                        GameColor::Player1 => counts[line].x += 1,
                        GameColor::Player2 => counts[line].o += 1,
                    }
                }
            }
        }
        counts
    }
}

impl Position for TttPosition {
    type Game = TttGame;

    fn turn(&self) -> GameColor {
        self.turn
    }

    fn legal_moves(&self) -> impl Iterator<Item = TttMove> {
        let finished = self.status().is_finished();
        (0..self.size)
            .flat_map(move |r| (0..self.size).map(move |c| (r, c)))
            .filter(move |&(r, c)| !finished && self.tile(r, c).is_none())
            .map(|(r, c)| TttMove::new(r, c))
    }

    fn moved_position(&self, m: TttMove) -> Self {
        assert!(self.is_valid_move(m), "illegal move {}", m);
        let mut res = self.clone();
        res.place(m);
        res
    }

    fn status(&self) -> GameStatus {
        if let Some(winner) = self.winner {
            return GameStatus::Finished(Some(winner));
        }
        if self.empty_tiles() == 0 {
            return GameStatus::Finished(None);
        }
        GameStatus::Ongoing
    }

    fn flipped(&self) -> Self {
        Self {
            size: self.size,
            board_x: self.board_o.clone(),
            board_o: self.board_x.clone(),
            turn: self.turn.opposite(),
            winner: self.winner.map(|w| w.opposite()),
        }
    }
}

/// Compact form used by tests and the comparator: one char per cell in row major order
/// (`x`, `o` or `_`), followed by the side to move (`x` or `o`).
impl FromStr for TttPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidPosition {
            input: s.to_string(),
            reason,
        };
        let chars: Vec<char> = s.trim().chars().collect();
        let (turn_char, cells) = chars
            .split_last()
            .ok_or_else(|| invalid("empty string".to_string()))?;

        let size = (1..=MAX_BOARD_SIZE)
            .find(|n| n * n == cells.len())
            .ok_or_else(|| invalid(format!("{} cells is not a square board", cells.len())))?;

        let mut pos = TttPosition::new(size)?;
        for (idx, c) in cells.iter().enumerate() {
            match c {
                'x' | 'X' => pos.board_x.set(idx, true),
                'o' | 'O' => pos.board_o.set(idx, true),
                '_' => {}
                _ => return Err(invalid(format!("unknown board char {:?}", c))),
            }
        }
        pos.turn = match turn_char {
            'x' | 'X' => GameColor::Player1,
            'o' | 'O' => GameColor::Player2,
            _ => return Err(invalid(format!("unknown turn char {:?}", turn_char))),
        };
        pos.check_winner();
        Ok(pos)
    }
}

impl Display for TttPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!("    +{}", "---+".repeat(self.size));

        write!(f, "    ")?;
        for c in 0..self.size {
            write!(f, " {:^3}", c)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", separator)?;

        for r in 0..self.size {
            write!(f, "{:<4}|", r)?;
            for c in 0..self.size {
                let mark = match self.tile(r, c) {
                    Some(GameColor::Player1) => "X",
                    Some(GameColor::Player2) => "O",
                    None => " ",
                };
                write!(f, " {} |", mark)?;
            }
            writeln!(f)?;
            writeln!(f, "{}", separator)?;
        }
        Ok(())
    }
}

pub struct TttGame {
    pos_history: Vec<TttPosition>,
}

impl TttGame {
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self::from_position(TttPosition::new(size)?))
    }
}

impl Game for TttGame {
    type Position = TttPosition;
    type Move = TttMove;

    fn from_position(pos: Self::Position) -> Self {
        Self {
            pos_history: vec![pos],
        }
    }

    fn pos_history(&self) -> &[Self::Position] {
        &self.pos_history
    }

    fn position(&self) -> &Self::Position {
        &self.pos_history[self.pos_history.len() - 1]
    }

    fn play_single_turn(&mut self, next_move: Self::Move) -> Result<()> {
        let next_pos = self.position().make_move_new(next_move)?;
        self.pos_history.push(next_pos);
        Ok(())
    }
}
