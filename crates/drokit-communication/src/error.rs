//! Error types for the communication crate.

use thiserror::Error;

/// Errors raised while interpreting command text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The command line was empty.
    #[error("Empty command")]
    Empty,

    /// A word could not be read as letter + number.
    #[error("Malformed word '{0}'")]
    MalformedWord(String),

    /// A word required by the command is absent.
    #[error("Missing {word} word in '{command}'")]
    MissingWord {
        /// The letter that was expected.
        word: char,
        /// The full command text.
        command: String,
    },

    /// The P word does not name a work offset.
    #[error("Work offset P{0} out of range")]
    BadOffsetNumber(i64),

    /// An axis letter the controller does not have.
    #[error("Unknown axis '{0}'")]
    UnknownAxis(char),
}
