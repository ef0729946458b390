//! A small backtracking regular-expression engine.
//!
//! Patterns are compiled into a flat sequence of matcher nodes and searched
//! with greedy, backtracking evaluation. Supported syntax: literals, `\d`,
//! `\w`, `[...]`, `[^...]`, `.`, `^`, `$`, `+`, `?`, capturing groups,
//! `(a|b)` alternation and `\1`..`\9` backreferences.

pub mod ast;
pub mod captures;
pub mod config;
pub mod engine;
pub mod error;
mod matcher;
pub mod parser;

use bytes::Bytes;

pub use ast::{Node, NodeKind, Program, SlotId};
pub use config::{ClassScan, MatchOptions};
pub use error::{CompileError, MatchError};
pub use parser::compile;

/// End offset of the leftmost match of `pattern` in `input`.
pub fn find_match(input: &str, pattern: &str) -> Result<Option<usize>, MatchError> {
    compile(pattern)?.find(Bytes::copy_from_slice(input.as_bytes()))
}

pub fn find_match_with(
    input: &str,
    pattern: &str,
    options: &MatchOptions,
) -> Result<Option<usize>, MatchError> {
    let program = compile(pattern)?;
    program.find_with(Bytes::copy_from_slice(input.as_bytes()), options)
}

pub fn is_match(input: &str, pattern: &str) -> Result<bool, MatchError> {
    Ok(find_match(input, pattern)?.is_some())
}
