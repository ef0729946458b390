//! Backtracking matcher.
//!
//! Walks a compiled node sequence against an input, one node per recursion
//! level. Greedy `+` retries the same node before moving on, `?` tries the
//! rest of the sequence with and then without the node, and alternation and
//! quantified groups recurse into a fresh compile of their pattern text.
//!
//! Stack use grows with the number of greedy repetitions and with sub-pattern
//! nesting; `MatchOptions::max_depth` turns runaway growth into an error.

use bytes::Bytes;
use log::{debug, trace};

use crate::ast::{Node, Program, SlotId};
use crate::captures::Captures;
use crate::config::MatchOptions;
use crate::error::{MatchError, Result};
use crate::parser::compile;

/// Which query a node is evaluated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Search {
    /// `starts_with`: the node must match exactly at the cursor.
    Anchored,
    /// `find_first_of`: the node may match anywhere at or after the cursor.
    Unanchored,
}

/// Mutable state shared by every node query of one evaluation.
pub(crate) struct Context {
    pub(crate) input: Bytes,
    pub(crate) captures: Captures,
    pub(crate) options: MatchOptions,
    pub(crate) depth: usize,
}

impl Context {
    pub(crate) fn new(input: Bytes, captures: Captures, options: MatchOptions, depth: usize) -> Self {
        Self {
            input,
            captures,
            options,
            depth,
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(MatchError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Evaluate `pattern` against `input[pos..]` and capture what it matched.
    pub(crate) fn group(
        &mut self,
        pattern: &str,
        slot: SlotId,
        pos: usize,
        search: Search,
    ) -> Result<Option<usize>> {
        if pos > self.input.len() {
            return Ok(None);
        }
        let rest = self.input.slice(pos..);
        self.enter()?;
        let result = run_subpattern(pattern, rest, search, self.options, self.depth);
        self.leave();

        match result? {
            Some(len) => {
                let end = pos + len;
                self.captures.record(slot, &self.input, pos, end)?;
                Ok(Some(end))
            }
            None => Ok(None),
        }
    }

    /// Try `option_a`, then `option_b`; the first that matches wins.
    pub(crate) fn alternation(
        &mut self,
        option_a: &str,
        option_b: &str,
        slot: SlotId,
        pos: usize,
        search: Search,
    ) -> Result<Option<usize>> {
        for option in [option_a, option_b] {
            if let Some(end) = self.group(option, slot, pos, search)? {
                return Ok(Some(end));
            }
        }
        Ok(None)
    }
}

/// Recompile `pattern` and make a single attempt at offset 0 of `input`.
///
/// The sub-pattern gets its own capture arena.
fn run_subpattern(
    pattern: &str,
    input: Bytes,
    search: Search,
    options: MatchOptions,
    depth: usize,
) -> Result<Option<usize>> {
    let program = compile(pattern)?;
    trace!("entering {pattern:?} on {:?} ({search:?})", String::from_utf8_lossy(&input));
    let captures = Captures::new(program.slot_count);
    let mut engine = Engine::new(&program.nodes, Context::new(input, captures, options, depth));
    let result = engine.find_from(0, 0, search);
    trace!("leaving {pattern:?} with {result:?}");
    result
}

struct Engine<'p> {
    nodes: &'p [Node],
    cx: Context,
}

impl<'p> Engine<'p> {
    fn new(nodes: &'p [Node], cx: Context) -> Self {
        Self { nodes, cx }
    }

    /// Match `nodes[index..]` starting at `pos`; returns the end offset.
    fn find_from(&mut self, pos: usize, index: usize, search: Search) -> Result<Option<usize>> {
        let nodes = self.nodes;
        let Some(node) = nodes.get(index) else {
            return Ok(Some(pos));
        };
        if pos > self.cx.input.len() {
            return Ok(None);
        }

        self.cx.enter()?;
        let result = self.step(node, pos, index, search);
        self.cx.leave();
        result
    }

    fn step(&mut self, node: &Node, pos: usize, index: usize, search: Search) -> Result<Option<usize>> {
        let found = node.query(search, pos, &mut self.cx)?;
        trace!("node {index} [{node}] at {pos} ({search:?}) -> {found:?}");

        let next = match found {
            None if node.optional => pos,
            None => return Ok(None),
            Some(end) if node.repeatable && end > pos => {
                // Greedy: another repetition first, then settle for this one.
                let saved = self.cx.captures.clone();
                if let Some(done) = self.find_from(end, index, Search::Anchored)? {
                    return Ok(Some(done));
                }
                self.cx.captures = saved;
                end
            }
            Some(end) if node.optional => {
                let saved = self.cx.captures.clone();
                let after = continuation(node, search, pos, end);
                if let Some(done) = self.find_from(end, index + 1, after)? {
                    return Ok(Some(done));
                }
                // Retry the rest of the sequence without this node.
                self.cx.captures = saved;
                pos
            }
            Some(end) => end,
        };

        let after = continuation(node, search, pos, next);
        self.find_from(next, index + 1, after)
    }
}

/// Query mode for the node after `node`.
///
/// Only the leading run of nodes that have not moved the cursor may still be
/// found by scanning; the start anchor pins everything after it.
fn continuation(node: &Node, search: Search, from: usize, to: usize) -> Search {
    if from != to || node.forces_anchored_continuation() {
        Search::Anchored
    } else {
        search
    }
}

impl Program {
    /// Leftmost match of this program in `input`, with default options.
    pub fn find(&self, input: Bytes) -> Result<Option<usize>> {
        self.find_with(input, &MatchOptions::default())
    }

    /// Leftmost match of this program in `input`; returns the end offset.
    ///
    /// A pattern starting with `^` is tried once at offset 0. Anything else is
    /// tried at increasing start offsets until one matches, the input runs out
    /// or `max_start_offsets` is exceeded.
    pub fn find_with(&self, input: Bytes, options: &MatchOptions) -> Result<Option<usize>> {
        debug!(
            "matching [{}] against {:?}",
            self.nodes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
            String::from_utf8_lossy(&input)
        );

        if self.is_anchored() {
            return self.attempt(input, 0, options);
        }

        for (tries, start) in (0..=input.len()).enumerate() {
            if tries >= options.max_start_offsets {
                return Err(MatchError::TooManyTries {
                    limit: options.max_start_offsets,
                });
            }
            if let Some(end) = self.attempt(input.clone(), start, options)? {
                debug!("matched from start offset {start}, ending at {end}");
                return Ok(Some(end));
            }
        }
        Ok(None)
    }

    /// One attempt from `start` with a fresh capture arena.
    fn attempt(&self, input: Bytes, start: usize, options: &MatchOptions) -> Result<Option<usize>> {
        let captures = Captures::new(self.slot_count);
        let mut engine = Engine::new(&self.nodes, Context::new(input, captures, *options, 0));
        engine.find_from(start, 0, Search::Unanchored)
    }
}
