use std::fmt;
use std::io::{self, BufRead, Stdin, Stdout, Write};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::game::player::GamePlayer;
use crate::game::{Game, GameColor, GameStatus, Position};
use crate::ttt::config::SessionConfig;
use crate::ttt::{TttGame, TttMove, TttPosition};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerLabel {
    One,
    Two,
    Cpu,
}

impl fmt::Display for PlayerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn mark(color: GameColor) -> &'static str {
    match color {
        GameColor::Player1 => "X",
        GameColor::Player2 => "O",
    }
}

/// Board followed by the turn announcement, printed before every move request
fn write_turn<W: Write>(
    output: &mut W,
    position: &TttPosition,
    label: PlayerLabel,
) -> io::Result<()> {
    let turn = position.turn();
    write!(output, "{}", position)?;
    writeln!(output)?;
    writeln!(output, "TURN: Player {} (\"{}\")", label, mark(turn))?;
    writeln!(output)?;
    output.flush()
}

/// Human player reading a row and then a column per move.
/// In single player mode the human always holds X, so seats map to players One and Two.
pub struct TttPlayerCmd<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl TttPlayerCmd<io::BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

enum Axis {
    Row,
    Col,
}

impl Axis {
    fn name(&self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Col => "col",
        }
    }
}

impl<R: BufRead, W: Write> TttPlayerCmd<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `Ok(None)` once the input is exhausted, `Ok(Some(None))` after rejected input
    fn read_coordinate(
        &mut self,
        axis: Axis,
        position: &TttPosition,
    ) -> Result<Option<Option<usize>>> {
        writeln!(self.output, "select {}:", axis.name())
            .and_then(|()| self.output.flush())
            .map_err(|e| Error::io("write prompt", e))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::io("read move", e))?;
        if read == 0 {
            return Ok(None);
        }

        let error = match line.trim().parse::<usize>() {
            Ok(x) if x < position.size() => return Ok(Some(Some(x))),
            Ok(_) => format!("{} out of range", axis.name()),
            Err(_) => format!("invalid {}", axis.name()),
        };
        self.reject(position, &error)?;
        Ok(Some(None))
    }

    /// Reports the error, then redraws the board and turn before asking again
    fn reject(&mut self, position: &TttPosition, error: &str) -> Result<()> {
        let label = match position.turn() {
            GameColor::Player1 => PlayerLabel::One,
            GameColor::Player2 => PlayerLabel::Two,
        };
        write!(self.output, "\nERROR: {}\n\n", error)
            .and_then(|()| write_turn(&mut self.output, position, label))
            .map_err(|e| Error::io("write error", e))
    }

    /// Prompts until a legal move is entered, `Ok(None)` if the input ends first
    pub fn read_move(&mut self, position: &TttPosition) -> Result<Option<TttMove>> {
        loop {
            let row = match self.read_coordinate(Axis::Row, position)? {
                None => return Ok(None),
                Some(None) => continue,
                Some(Some(row)) => row,
            };
            let col = match self.read_coordinate(Axis::Col, position)? {
                None => return Ok(None),
                Some(None) => continue,
                Some(Some(col)) => col,
            };

            let m = TttMove::new(row, col);
            match position.check_move(m) {
                Ok(()) => return Ok(Some(m)),
                Err(e) => self.reject(position, &e.to_string())?,
            }
        }
    }
}

impl<R: BufRead, W: Write> GamePlayer<TttGame> for TttPlayerCmd<R, W> {
    fn next_move(&mut self, pos_history: &[TttPosition]) -> Option<TttMove> {
        let position = pos_history.last()?;
        match self.read_move(position) {
            Ok(m) => m,
            Err(e) => {
                warn!("failed to read move: {}", e);
                None
            }
        }
    }
}

/// Runs one interactive game, writing the board and announcements to `output`
pub struct TttSession<W: Write> {
    config: SessionConfig,
    output: W,
}

impl<W: Write> TttSession<W> {
    pub fn new(config: SessionConfig, output: W) -> Self {
        Self { config, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn label(&self, color: GameColor) -> PlayerLabel {
        match (color, self.config.is_solo()) {
            (GameColor::Player1, _) => PlayerLabel::One,
            (GameColor::Player2, false) => PlayerLabel::Two,
            (GameColor::Player2, true) => PlayerLabel::Cpu,
        }
    }

    fn print_intro(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{:^80}", "TIC TAC TOE: INTERACTIVE TERMINAL VERSION")?;
        writeln!(self.output)?;
        writeln!(
            self.output,
            "BOARD SIZE: {}x{}",
            self.config.size, self.config.size
        )?;
        let mode = if self.config.is_solo() {
            "single player"
        } else {
            "two player"
        };
        writeln!(self.output, "MODE: {}", mode)?;
        writeln!(self.output)
    }

    fn print_turn(&mut self, position: &TttPosition) -> io::Result<()> {
        let label = self.label(position.turn());
        write_turn(&mut self.output, position, label)
    }

    fn print_game_over(
        &mut self,
        position: &TttPosition,
        winner: Option<GameColor>,
    ) -> io::Result<()> {
        write!(self.output, "{}", position)?;
        writeln!(self.output)?;
        match winner {
            Some(color) => {
                let label = self.label(color);
                writeln!(self.output, "GAME OVER: Player {} wins!", label)?;
            }
            None => {
                writeln!(self.output, "GAME OVER: stalemate")?;
                writeln!(self.output)?;
            }
        }
        self.output.flush()
    }

    /// Seat X is always `human`, seat O is `cpu` in single player mode and `human` otherwise
    pub fn run(
        &mut self,
        human: &mut dyn GamePlayer<TttGame>,
        mut cpu: Option<&mut dyn GamePlayer<TttGame>>,
    ) -> Result<Option<GameColor>> {
        if cpu.is_some() != self.config.is_solo() {
            return Err(Error::InvalidConfiguration {
                message: "a computer player is needed exactly in single player mode".to_string(),
            });
        }

        self.print_intro().map_err(|e| Error::io("write intro", e))?;

        let mut game = TttGame::new(self.config.size)?;
        loop {
            let position = game.position().clone();
            if let GameStatus::Finished(winner) = position.status() {
                self.print_game_over(&position, winner)
                    .map_err(|e| Error::io("write result", e))?;
                return Ok(winner);
            }

            self.print_turn(&position)
                .map_err(|e| Error::io("write board", e))?;

            let label = self.label(position.turn());
            let player: &mut dyn GamePlayer<TttGame> = match (label, cpu.as_deref_mut()) {
                (PlayerLabel::Cpu, Some(cpu)) => cpu,
                _ => &mut *human,
            };
            let next_move = player
                .next_move(game.pos_history())
                .ok_or_else(|| Error::NoMove {
                    player: label.to_string(),
                })?;

            if label == PlayerLabel::Cpu {
                writeln!(
                    self.output,
                    "Player {} plays row {}, col {}",
                    label,
                    next_move.row(),
                    next_move.column()
                )
                .map_err(|e| Error::io("write move", e))?;
                writeln!(self.output).map_err(|e| Error::io("write move", e))?;
            }
            debug!("player {} plays {}", label, next_move);
            game.play_single_turn(next_move)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ttt::config::{CpuStrategy, PlayerConfig};

    /// Plays a fixed list of moves
    struct ScriptedPlayer {
        moves: Vec<TttMove>,
    }

    impl ScriptedPlayer {
        fn new(moves: &[(usize, usize)]) -> Self {
            Self {
                moves: moves.iter().rev().map(|&(r, c)| TttMove::new(r, c)).collect(),
            }
        }
    }

    impl GamePlayer<TttGame> for ScriptedPlayer {
        fn next_move(&mut self, _pos_history: &[TttPosition]) -> Option<TttMove> {
            self.moves.pop()
        }
    }

    fn cmd_player(input: &str) -> TttPlayerCmd<Cursor<Vec<u8>>, Vec<u8>> {
        TttPlayerCmd::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn reads_row_then_column() {
        let pos = TttPosition::new(3).unwrap();
        let mut player = cmd_player("1\n2\n");
        assert_eq!(player.read_move(&pos).unwrap(), Some(TttMove::new(1, 2)));
        let output = String::from_utf8(player.into_output()).unwrap();
        assert_eq!(output, "select row:\nselect col:\n");
    }

    #[test]
    fn reprompts_after_bad_input() {
        let pos: TttPosition = "x________o".parse().unwrap();
        let mut player = cmd_player("abc\n7\n0\nzz\n0\n9\n0\n0\n2\n2\n");
        assert_eq!(player.read_move(&pos).unwrap(), Some(TttMove::new(2, 2)));
        let output = String::from_utf8(player.into_output()).unwrap();
        assert!(output.contains("ERROR: invalid row"));
        assert!(output.contains("ERROR: row out of range"));
        assert!(output.contains("ERROR: invalid col"));
        assert!(output.contains("ERROR: col out of range"));
        assert!(output.contains("ERROR: space at row 0, col 0 already occupied"));
        // Every rejection redraws the board and the turn line before the next prompt
        assert_eq!(output.matches("TURN: Player Two (\"O\")").count(), 5);
        assert!(output.contains(
            "\nERROR: invalid row\n\n      0   1   2 \n    +---+---+---+\n0   | X |   |   |\n"
        ));
    }

    #[test]
    fn end_of_input_yields_no_move() {
        let pos = TttPosition::new(3).unwrap();
        let mut player = cmd_player("1\n");
        assert_eq!(player.read_move(&pos).unwrap(), None);
        assert_eq!(
            <_ as GamePlayer<TttGame>>::next_move(&mut player, &[pos]),
            None
        );
    }

    #[test]
    fn two_player_win() {
        let config = SessionConfig::new(3, None).unwrap();
        let mut session = TttSession::new(config, Vec::new());
        // X takes the left column, O the middle one
        let mut human = ScriptedPlayer::new(&[(0, 0), (0, 1), (1, 0), (1, 1), (2, 0)]);
        let winner = session.run(&mut human, None).unwrap();
        assert_eq!(winner, Some(GameColor::Player1));

        let output = String::from_utf8(session.into_output()).unwrap();
        assert!(output.contains("TIC TAC TOE: INTERACTIVE TERMINAL VERSION"));
        assert!(output.contains("BOARD SIZE: 3x3"));
        assert!(output.contains("MODE: two player"));
        assert!(output.contains("TURN: Player One (\"X\")"));
        assert!(output.contains("TURN: Player Two (\"O\")"));
        assert!(output.ends_with("GAME OVER: Player One wins!\n"));
    }

    #[test]
    fn stalemate() {
        let config = SessionConfig::new(3, None).unwrap();
        let mut session = TttSession::new(config, Vec::new());
        let mut human = ScriptedPlayer::new(&[
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 1),
            (1, 0),
            (1, 2),
            (2, 1),
            (2, 0),
            (2, 2),
        ]);
        assert_eq!(session.run(&mut human, None).unwrap(), None);
        let output = String::from_utf8(session.into_output()).unwrap();
        assert!(output.contains("GAME OVER: stalemate"));
    }

    #[test]
    fn single_player_against_minimax() {
        let cpu_config = PlayerConfig::new(CpuStrategy::Minimax, 3, None, None, Some(1)).unwrap();
        let config = SessionConfig::new(3, Some(cpu_config.clone())).unwrap();
        let builder = crate::ttt::config::CpuPlayerBuilder::new(cpu_config, 100_000);
        let mut cpu = builder.build_player();

        // X opens in a corner, then leaves the computer's diagonal open
        let mut human = cmd_player("0\n0\n0\n1\n2\n2\n2\n0\n1\n0\n1\n2\n");
        let mut session = TttSession::new(config, Vec::new());
        let winner = session.run(&mut human, Some(cpu.as_mut())).unwrap();
        assert_ne!(winner, Some(GameColor::Player1));

        let output = String::from_utf8(session.into_output()).unwrap();
        assert!(output.contains("MODE: single player"));
        assert!(output.contains("TURN: Player Cpu (\"O\")"));
        assert!(output.contains("Player Cpu plays row"));
    }

    #[test]
    fn single_cell_board() {
        let config = SessionConfig::new(1, None).unwrap();
        let mut session = TttSession::new(config, Vec::new());
        let mut human = ScriptedPlayer::new(&[(0, 0)]);
        assert_eq!(
            session.run(&mut human, None).unwrap(),
            Some(GameColor::Player1)
        );
    }

    #[test]
    fn missing_move_ends_session() {
        let config = SessionConfig::new(3, None).unwrap();
        let mut session = TttSession::new(config, Vec::new());
        let mut human = ScriptedPlayer::new(&[(1, 1)]);
        assert!(matches!(
            session.run(&mut human, None),
            Err(Error::NoMove { player }) if player == "Two"
        ));
    }
}
