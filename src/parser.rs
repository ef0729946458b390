use log::{debug, trace};

use crate::ast::{Node, NodeKind, Program, SlotId};
use crate::error::CompileError;

/// Compile a pattern into its node sequence.
///
/// Capture slots are numbered from zero for every call, so slot identity never
/// leaks between independent compilations.
pub fn compile(pattern: &str) -> Result<Program, CompileError> {
    Parser::new(pattern).parse()
}

/// Pattern compiler.
///
/// The `Parser` consumes the pattern left to right, classifying the next
/// syntactic unit in a fixed priority order and attaching any trailing
/// quantifier to the node it produced.
pub struct Parser<'a> {
    pattern: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    next_slot: usize,
    /// Slots of groups whose `(` has been seen but not their `)`.
    open_groups: Vec<SlotId>,
    /// Whether each declared slot has been closed.
    closed: Vec<bool>,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            pos: 0,
            nodes: Vec::new(),
            next_slot: 0,
            open_groups: Vec::new(),
            closed: Vec::new(),
        }
    }

    /// Allocate the next capture slot.
    fn alloc_slot(&mut self, closed: bool) -> SlotId {
        let slot = SlotId(self.next_slot);
        self.next_slot += 1;
        self.closed.push(closed);
        slot
    }

    fn rest(&self) -> &'a str {
        &self.pattern[self.pos..]
    }

    fn bytes(&self) -> &'a [u8] {
        self.pattern.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    /// Consume the whole pattern.
    ///
    /// Every iteration must advance; a token that nothing recognises is an
    /// `UnhandledPattern` error rather than an endless loop.
    pub fn parse(mut self) -> Result<Program, CompileError> {
        while self.pos < self.pattern.len() {
            let before = self.pos;
            let mut node = self.parse_atom()?;
            self.parse_quantifier(&mut node);

            if self.pos == before {
                return Err(CompileError::UnhandledPattern {
                    pattern: self.rest().to_string(),
                });
            }
            trace!("added {node}");
            self.nodes.push(node);
        }

        if !self.open_groups.is_empty() {
            return Err(CompileError::UnterminatedGroup {
                pattern: self.pattern.to_string(),
            });
        }

        debug!(
            "compiled {:?} into {} nodes, {} capture slots",
            self.pattern,
            self.nodes.len(),
            self.next_slot
        );
        Ok(Program {
            nodes: self.nodes,
            slot_count: self.next_slot,
        })
    }

    /// Apply a trailing `+` or `?` to `node`. `+` is tested first.
    fn parse_quantifier(&mut self, node: &mut Node) {
        match self.peek() {
            Some(b'+') => {
                self.pos += 1;
                node.repeatable = true;
            }
            Some(b'?') => {
                self.pos += 1;
                node.optional = true;
            }
            _ => {}
        }
    }

    /// Classify and consume the next construct.
    ///
    /// Order matters: the literal fallback accepts almost anything, and `[^`
    /// must be tried before `[`.
    fn parse_atom(&mut self) -> Result<Node, CompileError> {
        let kind = match (self.peek(), self.peek_at(1)) {
            (Some(b'^'), _) => {
                if !self.nodes.is_empty() {
                    return Err(CompileError::MisplacedStartAnchor);
                }
                self.pos += 1;
                NodeKind::StartAnchor
            }
            (Some(b'$'), _) => {
                self.pos += 1;
                NodeKind::EndAnchor
            }
            (Some(b'\\'), Some(b'd')) => {
                self.pos += 2;
                NodeKind::Digit
            }
            (Some(b'\\'), Some(b'w')) => {
                self.pos += 2;
                NodeKind::AlphaNum
            }
            (Some(b'['), Some(b'^')) => NodeKind::NegativeSet(self.parse_set(2)?),
            (Some(b'['), _) => NodeKind::PositiveSet(self.parse_set(1)?),
            (Some(b'.'), _) => {
                self.pos += 1;
                NodeKind::Wildcard
            }
            (Some(b'('), _) => self.parse_group()?,
            (Some(b')'), _) => {
                let slot = self.open_groups.pop().ok_or_else(|| {
                    CompileError::UnexpectedClosingBracket {
                        pattern: self.rest().to_string(),
                    }
                })?;
                self.closed[slot.0] = true;
                self.pos += 1;
                NodeKind::GroupEnd(slot)
            }
            (Some(b'\\'), Some(d)) if d.is_ascii_digit() => self.parse_backreference(d)?,
            (Some(c), _) if is_literal(c) => {
                self.pos += 1;
                NodeKind::Literal(c)
            }
            _ => {
                return Err(CompileError::UnhandledPattern {
                    pattern: self.rest().to_string(),
                })
            }
        };
        Ok(Node::new(kind))
    }

    /// Parse `[...]` or `[^...]`; `skip` is the length of the opener.
    ///
    /// The set runs up to the first `]`, so `[]` is an empty set.
    fn parse_set(&mut self, skip: usize) -> Result<Vec<u8>, CompileError> {
        let body_start = self.pos + skip;
        let Some(len) = self.bytes()[body_start..].iter().position(|&b| b == b']') else {
            return Err(CompileError::UnterminatedSet {
                pattern: self.rest().to_string(),
            });
        };
        let chars = self.bytes()[body_start..body_start + len].to_vec();
        self.pos = body_start + len + 1;
        Ok(chars)
    }

    /// Parse the construct opened by `(`.
    ///
    /// - `(a|b)` becomes an `Alternation` holding both options as text.
    /// - `(ab)+` / `(ab)?` becomes a `Group` holding its body as text, so the
    ///   quantifier covers the whole group.
    /// - `(ab)` only consumes the `(`; its body is compiled inline and the
    ///   matching `)` later emits the `GroupEnd`.
    fn parse_group(&mut self) -> Result<NodeKind, CompileError> {
        let open = self.pos;
        let bytes = self.bytes();
        let Some(close) = find_matching_close(bytes, open) else {
            return Err(CompileError::UnterminatedGroup {
                pattern: self.rest().to_string(),
            });
        };
        let body = &self.pattern[open + 1..close];

        if let Some(divider) = top_level_divider(body.as_bytes()) {
            let option_a = body[..divider].to_string();
            let mut option_b = body[divider + 1..].to_string();
            if top_level_divider(option_b.as_bytes()).is_some() {
                option_b = format!("({option_b})");
            }
            // Surface errors in either branch now rather than mid-match.
            compile(&option_a)?;
            compile(&option_b)?;

            let slot = self.alloc_slot(true);
            self.pos = close + 1;
            return Ok(NodeKind::Alternation {
                option_a,
                option_b,
                slot,
            });
        }

        if matches!(bytes.get(close + 1), Some(b'+' | b'?')) {
            compile(body)?;
            let slot = self.alloc_slot(true);
            self.pos = close + 1;
            return Ok(NodeKind::Group {
                pattern: body.to_string(),
                slot,
            });
        }

        let slot = self.alloc_slot(false);
        self.open_groups.push(slot);
        self.pos = open + 1;
        Ok(NodeKind::GroupStart(slot))
    }

    /// Parse `\N`, where `N` is a 1-based group number.
    fn parse_backreference(&mut self, digit: u8) -> Result<NodeKind, CompileError> {
        let number = u32::from(digit - b'0');
        let declared = self.next_slot;
        let index = match (number as usize).checked_sub(1) {
            Some(index) if index < declared => index,
            _ => return Err(CompileError::UndeclaredBackreference { number, declared }),
        };
        if !self.closed[index] {
            return Err(CompileError::OpenGroupBackreference { number });
        }
        self.pos += 2;
        Ok(NodeKind::Backreference(SlotId(index)))
    }
}

/// Printable ASCII, plus any non-ASCII byte so UTF-8 text matches bytewise.
fn is_literal(c: u8) -> bool {
    c == b' ' || c.is_ascii_graphic() || !c.is_ascii()
}

/// Find the `)` that closes the `(` at `open`, skipping nested pairs.
pub(crate) fn find_matching_close(pattern: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in pattern.iter().enumerate().skip(open + 1) {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(i),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Find the first `|` in `body` that is not inside a nested pair.
pub(crate) fn top_level_divider(body: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in body.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'|' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<NodeKind> {
        compile(pattern)
            .unwrap()
            .nodes
            .into_iter()
            .map(|node| node.kind)
            .collect()
    }

    #[test]
    fn anchors_and_literals() {
        assert_eq!(
            kinds("^log$"),
            vec![
                NodeKind::StartAnchor,
                NodeKind::Literal(b'l'),
                NodeKind::Literal(b'o'),
                NodeKind::Literal(b'g'),
                NodeKind::EndAnchor,
            ]
        );
    }

    #[test]
    fn escapes_sets_and_wildcard() {
        assert_eq!(
            kinds(r"\d\w[^xy][ab]."),
            vec![
                NodeKind::Digit,
                NodeKind::AlphaNum,
                NodeKind::NegativeSet(b"xy".to_vec()),
                NodeKind::PositiveSet(b"ab".to_vec()),
                NodeKind::Wildcard,
            ]
        );
    }

    #[test]
    fn set_ends_at_first_bracket() {
        assert_eq!(
            kinds("[]a]"),
            vec![NodeKind::PositiveSet(vec![]), NodeKind::Literal(b'a'), NodeKind::Literal(b']')]
        );
    }

    #[test]
    fn quantifiers_set_flags() {
        let program = compile("a+b?c").unwrap();
        let flags: Vec<(bool, bool)> = program
            .nodes
            .iter()
            .map(|node| (node.repeatable, node.optional))
            .collect();
        assert_eq!(flags, vec![(true, false), (false, true), (false, false)]);
    }

    #[test]
    fn only_one_quantifier_per_node() {
        let program = compile("a+?").unwrap();
        assert_eq!(program.nodes.len(), 2);
        assert!(program.nodes[0].repeatable);
        assert!(!program.nodes[0].optional);
        assert_eq!(program.nodes[1].kind, NodeKind::Literal(b'?'));
    }

    #[test]
    fn plain_group_is_lowered_inline() {
        assert_eq!(
            kinds(r"(\w+) and \1"),
            vec![
                NodeKind::GroupStart(SlotId(0)),
                NodeKind::AlphaNum,
                NodeKind::GroupEnd(SlotId(0)),
                NodeKind::Literal(b' '),
                NodeKind::Literal(b'a'),
                NodeKind::Literal(b'n'),
                NodeKind::Literal(b'd'),
                NodeKind::Literal(b' '),
                NodeKind::Backreference(SlotId(0)),
            ]
        );
    }

    #[test]
    fn nested_groups_close_innermost_first() {
        assert_eq!(
            kinds("((a)b)"),
            vec![
                NodeKind::GroupStart(SlotId(0)),
                NodeKind::GroupStart(SlotId(1)),
                NodeKind::Literal(b'a'),
                NodeKind::GroupEnd(SlotId(1)),
                NodeKind::Literal(b'b'),
                NodeKind::GroupEnd(SlotId(0)),
            ]
        );
    }

    #[test]
    fn quantified_group_keeps_its_body() {
        let program = compile("(ab)+c").unwrap();
        assert_eq!(
            program.nodes[0].kind,
            NodeKind::Group {
                pattern: "ab".to_string(),
                slot: SlotId(0),
            }
        );
        assert!(program.nodes[0].repeatable);
        assert_eq!(program.nodes[1].kind, NodeKind::Literal(b'c'));
    }

    #[test]
    fn alternation_splits_at_top_level_divider() {
        assert_eq!(
            kinds("(c(a|o)t|dog)s"),
            vec![
                NodeKind::Alternation {
                    option_a: "c(a|o)t".to_string(),
                    option_b: "dog".to_string(),
                    slot: SlotId(0),
                },
                NodeKind::Literal(b's'),
            ]
        );
    }

    #[test]
    fn extra_alternatives_nest_in_second_option() {
        assert_eq!(
            kinds("(a|b|c)"),
            vec![NodeKind::Alternation {
                option_a: "a".to_string(),
                option_b: "(b|c)".to_string(),
                slot: SlotId(0),
            }]
        );
    }

    #[test]
    fn slot_numbering_restarts_per_compile() {
        assert_eq!(compile("(a)(b)").unwrap().slot_count, 2);
        assert_eq!(kinds("(c)")[0], NodeKind::GroupStart(SlotId(0)));
    }

    #[test]
    fn unterminated_set() {
        assert!(matches!(
            compile("[abc"),
            Err(CompileError::UnterminatedSet { .. })
        ));
        assert!(matches!(
            compile("[^abc"),
            Err(CompileError::UnterminatedSet { .. })
        ));
    }

    #[test]
    fn unterminated_group() {
        assert!(matches!(
            compile("(abc"),
            Err(CompileError::UnterminatedGroup { .. })
        ));
        assert!(matches!(
            compile("(a|b"),
            Err(CompileError::UnterminatedGroup { .. })
        ));
        // The only `)` is swallowed by the set.
        assert!(matches!(
            compile("(a[)]"),
            Err(CompileError::UnterminatedGroup { .. })
        ));
    }

    #[test]
    fn stray_closing_bracket() {
        assert!(matches!(
            compile("ab)"),
            Err(CompileError::UnexpectedClosingBracket { .. })
        ));
    }

    #[test]
    fn backreference_must_name_declared_group() {
        assert_eq!(
            compile(r"\1"),
            Err(CompileError::UndeclaredBackreference {
                number: 1,
                declared: 0
            })
        );
        assert_eq!(
            compile(r"(a)\2"),
            Err(CompileError::UndeclaredBackreference {
                number: 2,
                declared: 1
            })
        );
        assert!(matches!(
            compile(r"(a)\0"),
            Err(CompileError::UndeclaredBackreference { number: 0, .. })
        ));
        assert_eq!(
            compile(r"(a\1)"),
            Err(CompileError::OpenGroupBackreference { number: 1 })
        );
    }

    #[test]
    fn branch_errors_surface_at_compile_time() {
        assert!(matches!(
            compile("(a|[b)"),
            Err(CompileError::UnterminatedSet { .. })
        ));
    }

    #[test]
    fn start_anchor_only_first() {
        assert_eq!(compile("a^"), Err(CompileError::MisplacedStartAnchor));
    }

    #[test]
    fn control_characters_are_unhandled() {
        assert!(matches!(
            compile("a\u{1}"),
            Err(CompileError::UnhandledPattern { .. })
        ));
    }

    #[test]
    fn bracket_helpers() {
        assert_eq!(find_matching_close(b"(a(b)c)d", 0), Some(6));
        assert_eq!(find_matching_close(b"((a))(b)", 0), Some(4));
        assert_eq!(find_matching_close(b"(a(b)", 0), None);
        assert_eq!(top_level_divider(b"a(b|c)|d"), Some(6));
        assert_eq!(top_level_divider(b"a(b|c)"), None);
    }
}
