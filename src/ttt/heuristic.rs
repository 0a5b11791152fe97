use crate::game::minimax::PositionEvaluator;
use crate::game::{GameColor, Position};
use crate::ttt::{TttGame, TttPosition};

/// Scores every line still open for exactly one side by the square of that side's marks on it.
/// Lines holding marks of both sides are dead and score nothing.
pub struct LineHeuristic;

impl PositionEvaluator<TttGame> for LineHeuristic {
    fn evaluate(&self, position: &TttPosition) -> i32 {
        let score_x: i64 = position
            .line_counts()
            .iter()
            .map(|line| match (line.x, line.o) {
                (x, 0) => (x * x) as i64,
                (0, o) => -((o * o) as i64),
                _ => 0,
            })
            .sum();
        let score = match position.turn() {
            GameColor::Player1 => score_x,
            GameColor::Player2 => -score_x,
        };
        score.clamp(i32::MIN as i64 + 1, i32::MAX as i64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(s: &str) -> i32 {
        LineHeuristic.evaluate(&s.parse::<TttPosition>().unwrap())
    }

    #[test]
    fn empty_board_is_even() {
        assert_eq!(eval("_________x"), 0);
    }

    #[test]
    fn center_is_worth_most() {
        // Center touches four lines, a corner three and an edge two
        assert_eq!(eval("____x____o"), -4);
        assert_eq!(eval("x________o"), -3);
        assert_eq!(eval("_x_______o"), -2);
    }

    #[test]
    fn blocked_lines_score_nothing() {
        // Row 0 is dead, X keeps column 0 and the diagonal, O keeps column 1
        assert_eq!(eval("xo_______x"), 1 + 1 - 1);
    }
}
