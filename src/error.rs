use thiserror::Error;

use crate::ast::SlotId;

/// A pattern that could not be turned into a node sequence.
///
/// Matching never begins when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("pattern missing end bracket ']' in {pattern:?}")]
    UnterminatedSet { pattern: String },

    #[error("group missing end bracket ')' in {pattern:?}")]
    UnterminatedGroup { pattern: String },

    #[error("unexpected closing bracket at {pattern:?}")]
    UnexpectedClosingBracket { pattern: String },

    #[error("backreference \\{number} refers to an undeclared group ({declared} declared)")]
    UndeclaredBackreference { number: u32, declared: usize },

    #[error("backreference \\{number} refers to a group that has not been closed")]
    OpenGroupBackreference { number: u32 },

    #[error("start of string anchor must be the first character")]
    MisplacedStartAnchor,

    #[error("unhandled pattern {pattern:?}")]
    UnhandledPattern { pattern: String },
}

/// Everything that can abort a match attempt.
///
/// A plain miss is not an error: the matching functions return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("capture {0} was read before it was populated")]
    UnsetCapture(SlotId),

    #[error("capture {slot} is outside the capture arena ({len} slots)")]
    ExpiredSlot { slot: SlotId, len: usize },

    #[error("start of string anchor queried at offset {pos}")]
    MisplacedStartAnchor { pos: usize },

    #[error("gave up after trying {limit} start offsets")]
    TooManyTries { limit: usize },

    #[error("recursion depth exceeded {limit}")]
    DepthExceeded { limit: usize },
}

pub type Result<T> = std::result::Result<T, MatchError>;
