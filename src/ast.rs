use std::fmt;

/// Index of a capture slot, assigned in declaration order by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Literal(u8),
    Digit,
    AlphaNum,
    PositiveSet(Vec<u8>),
    NegativeSet(Vec<u8>),
    Wildcard,
    StartAnchor,
    EndAnchor,
    GroupStart(SlotId),
    GroupEnd(SlotId),
    /// A quantified capturing group, evaluated by recompiling `pattern`.
    Group {
        pattern: String,
        slot: SlotId,
    },
    /// `(option_a|option_b)`; both options are kept as pattern text.
    Alternation {
        option_a: String,
        option_b: String,
        slot: SlotId,
    },
    Backreference(SlotId),
}

/// One compiled pattern construct plus its quantifier flags.
///
/// The parser applies at most one trailing quantifier, so `optional` and
/// `repeatable` are never both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub optional: bool,
    pub repeatable: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            optional: false,
            repeatable: false,
        }
    }

    /// Once this node has matched, every following node is matched anchored.
    pub fn forces_anchored_continuation(&self) -> bool {
        matches!(self.kind, NodeKind::StartAnchor)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Literal(c) => write!(f, "Character Pattern {}", char::from(*c))?,
            NodeKind::Digit => f.write_str("Digit Pattern")?,
            NodeKind::AlphaNum => f.write_str("AlphaNum Pattern")?,
            NodeKind::PositiveSet(chars) => write!(
                f,
                "Positive Character Group Pattern {}",
                String::from_utf8_lossy(chars)
            )?,
            NodeKind::NegativeSet(chars) => write!(
                f,
                "Negative Character Group Pattern {}",
                String::from_utf8_lossy(chars)
            )?,
            NodeKind::Wildcard => f.write_str("Wildcard Pattern")?,
            NodeKind::StartAnchor => f.write_str("Start Anchor Pattern")?,
            NodeKind::EndAnchor => f.write_str("End Anchor Pattern")?,
            NodeKind::GroupStart(slot) => write!(f, "Group Start {slot}")?,
            NodeKind::GroupEnd(slot) => write!(f, "Group End {slot}")?,
            NodeKind::Group { pattern, slot } => write!(f, "Group {slot} ({pattern})")?,
            NodeKind::Alternation {
                option_a,
                option_b,
                slot,
            } => write!(f, "Alternation {slot} ({option_a}|{option_b})")?,
            NodeKind::Backreference(slot) => write!(f, "Backreference {slot}")?,
        }
        if self.repeatable {
            f.write_str(" (one or more)")?;
        }
        if self.optional {
            f.write_str(" (optional)")?;
        }
        Ok(())
    }
}

/// The ordered node sequence produced by one compilation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub nodes: Vec<Node>,
    /// Number of capture slots declared while compiling `nodes`.
    pub slot_count: usize,
}

impl Program {
    /// True when the pattern began with `^`.
    pub fn is_anchored(&self) -> bool {
        self.nodes
            .first()
            .is_some_and(|node| matches!(node.kind, NodeKind::StartAnchor))
    }
}
