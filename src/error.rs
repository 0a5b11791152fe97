//! Error types for the tic-tac-toe crate

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid board size {size} (must be between 1 and {max})")]
    InvalidBoardSize { size: usize, max: usize },

    #[error("move at row {row}, col {col} is out of range of a {size}x{size} board")]
    OutOfRange { row: usize, col: usize, size: usize },

    #[error("space at row {row}, col {col} already occupied")]
    Occupied { row: usize, col: usize },

    #[error("game already over")]
    GameOver,

    #[error("player {player} did not provide a move")]
    NoMove { player: String },

    #[error("invalid position string '{input}': {reason}")]
    InvalidPosition { input: String, reason: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            operation: operation.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn io_errors_name_the_operation() {
        let err = Error::io(
            "read move",
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed"),
        );
        assert_eq!(err.to_string(), "failed to read move: closed");
        assert!(err.source().is_some());
    }
}
