use crate::ast::{Node, NodeKind};
use crate::config::ClassScan;
use crate::engine::{Context, Search};
use crate::error::{MatchError, Result};

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_alnum(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

impl Node {
    /// Run the query selected by `search` at `pos`.
    pub(crate) fn query(&self, search: Search, pos: usize, cx: &mut Context) -> Result<Option<usize>> {
        match search {
            Search::Anchored => self.starts_with(pos, cx),
            Search::Unanchored => self.find_first_of(pos, cx),
        }
    }

    /// Anchored query: the node must match beginning exactly at `pos`.
    ///
    /// Returns the offset just past the match.
    pub(crate) fn starts_with(&self, pos: usize, cx: &mut Context) -> Result<Option<usize>> {
        let input = &cx.input;
        let at = input.get(pos).copied();
        let one = |hit: bool| if hit { Some(pos + 1) } else { None };

        let end = match &self.kind {
            NodeKind::Literal(c) => one(at == Some(*c)),
            NodeKind::Digit => one(at.is_some_and(is_digit)),
            NodeKind::AlphaNum => one(at.is_some_and(is_alnum)),
            NodeKind::PositiveSet(chars) => one(at.is_some_and(|b| chars.contains(&b))),
            NodeKind::NegativeSet(chars) => one(at.is_some_and(|b| !chars.contains(&b))),
            NodeKind::Wildcard => one(at.is_some()),
            NodeKind::StartAnchor => {
                if pos != 0 {
                    return Err(MatchError::MisplacedStartAnchor { pos });
                }
                Some(0)
            }
            NodeKind::EndAnchor => (pos == input.len()).then_some(pos),
            NodeKind::GroupStart(slot) => {
                cx.captures.set_start(*slot, pos)?;
                Some(pos)
            }
            NodeKind::GroupEnd(slot) => {
                cx.captures.close(*slot, &cx.input, pos)?;
                Some(pos)
            }
            NodeKind::Group { pattern, slot } => {
                return cx.group(pattern, *slot, pos, Search::Anchored)
            }
            NodeKind::Alternation {
                option_a,
                option_b,
                slot,
            } => return cx.alternation(option_a, option_b, *slot, pos, Search::Anchored),
            NodeKind::Backreference(slot) => {
                let text = cx.captures.text(*slot)?;
                let rest = cx.input.get(pos..).unwrap_or_default();
                rest.starts_with(text).then_some(pos + text.len())
            }
        };
        Ok(end)
    }

    /// Unanchored query: the earliest match starting at or after `pos`.
    ///
    /// Returns the offset just past the match.
    pub(crate) fn find_first_of(&self, pos: usize, cx: &mut Context) -> Result<Option<usize>> {
        let input = &cx.input;
        let rest = input.get(pos..).unwrap_or_default();
        let first = |pred: &dyn Fn(u8) -> bool| rest.iter().position(|&b| pred(b)).map(|i| pos + i + 1);

        let end = match &self.kind {
            NodeKind::Literal(c) => first(&|b| b == *c),
            NodeKind::Digit => scan_class(cx, pos, is_digit),
            NodeKind::AlphaNum => scan_class(cx, pos, is_alnum),
            NodeKind::PositiveSet(chars) => first(&|b| chars.contains(&b)),
            NodeKind::NegativeSet(chars) => first(&|b| !chars.contains(&b)),
            NodeKind::Wildcard => (pos < input.len()).then_some(pos + 1),
            NodeKind::StartAnchor => (pos == 0).then_some(0),
            // The end of input always lies at or after `pos`.
            NodeKind::EndAnchor => Some(input.len()),
            NodeKind::GroupStart(_) | NodeKind::GroupEnd(_) => return self.starts_with(pos, cx),
            NodeKind::Group { pattern, slot } => {
                return cx.group(pattern, *slot, pos, Search::Unanchored)
            }
            NodeKind::Alternation {
                option_a,
                option_b,
                slot,
            } => return cx.alternation(option_a, option_b, *slot, pos, Search::Unanchored),
            NodeKind::Backreference(slot) => {
                // Unlike `starts_with`, this treats the captured text as a set of
                // acceptable bytes: it finds the first byte that occurs anywhere in
                // the capture and assumes the whole capture starts there.
                let text = cx.captures.text(*slot)?;
                rest.iter()
                    .position(|b| text.contains(b))
                    .map(|i| pos + i + text.len())
                    .filter(|&end| end <= input.len())
            }
        };
        Ok(end)
    }
}

/// Unanchored search for `\d` / `\w`.
fn scan_class(cx: &Context, pos: usize, pred: fn(u8) -> bool) -> Option<usize> {
    let input = &cx.input;
    match cx.options.class_scan {
        ClassScan::FromPosition => input[pos..]
            .iter()
            .position(|&b| pred(b))
            .map(|i| pos + i + 1),
        ClassScan::WholeInput => input
            .iter()
            .position(|&b| pred(b))
            .and_then(|i| (i + 1).checked_sub(pos)),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::ast::SlotId;
    use crate::captures::Captures;
    use crate::config::MatchOptions;

    fn cx(input: &'static str) -> Context {
        Context::new(
            Bytes::from_static(input.as_bytes()),
            Captures::new(2),
            MatchOptions::default(),
            0,
        )
    }

    fn node(kind: NodeKind) -> Node {
        Node::new(kind)
    }

    #[test]
    fn literal_queries() {
        let mut cx = cx("apple");
        let a = node(NodeKind::Literal(b'p'));
        assert_eq!(a.starts_with(0, &mut cx), Ok(None));
        assert_eq!(a.starts_with(1, &mut cx), Ok(Some(2)));
        assert_eq!(a.find_first_of(0, &mut cx), Ok(Some(2)));
        assert_eq!(a.find_first_of(3, &mut cx), Ok(None));
    }

    #[test]
    fn sets() {
        let mut cx = cx("cab");
        let negative = node(NodeKind::NegativeSet(b"abc".to_vec()));
        assert_eq!(negative.find_first_of(0, &mut cx), Ok(None));
        let positive = node(NodeKind::PositiveSet(b"b".to_vec()));
        assert_eq!(positive.find_first_of(0, &mut cx), Ok(Some(3)));
        assert_eq!(positive.starts_with(0, &mut cx), Ok(None));
        assert_eq!(positive.starts_with(3, &mut cx), Ok(None));
    }

    #[test]
    fn empty_negative_set_matches_anything() {
        let mut cx = cx("x");
        let negative = node(NodeKind::NegativeSet(vec![]));
        assert_eq!(negative.starts_with(0, &mut cx), Ok(Some(1)));
    }

    #[test]
    fn classes_use_ascii_rules() {
        let mut cx = cx("a_1");
        let word = node(NodeKind::AlphaNum);
        assert_eq!(word.starts_with(1, &mut cx), Ok(None));
        let digit = node(NodeKind::Digit);
        assert_eq!(digit.find_first_of(0, &mut cx), Ok(Some(3)));
    }

    #[test]
    fn whole_input_class_scan() {
        let mut whole = cx("1ab2");
        let digit = node(NodeKind::Digit);
        // The first digit is at 0, reported relative to the query position.
        assert_eq!(digit.find_first_of(0, &mut whole), Ok(Some(1)));
        assert_eq!(digit.find_first_of(1, &mut whole), Ok(Some(0)));
        assert_eq!(digit.find_first_of(2, &mut whole), Ok(None));

        let mut from_pos = cx("1ab2");
        from_pos.options = MatchOptions::default().with_class_scan(ClassScan::FromPosition);
        assert_eq!(digit.find_first_of(2, &mut from_pos), Ok(Some(4)));
    }

    #[test]
    fn anchors() {
        let mut cx = cx("log");
        let start = node(NodeKind::StartAnchor);
        assert_eq!(start.find_first_of(0, &mut cx), Ok(Some(0)));
        assert_eq!(start.find_first_of(1, &mut cx), Ok(None));
        assert_eq!(
            start.starts_with(2, &mut cx),
            Err(MatchError::MisplacedStartAnchor { pos: 2 })
        );
        let end = node(NodeKind::EndAnchor);
        assert_eq!(end.starts_with(2, &mut cx), Ok(None));
        assert_eq!(end.starts_with(3, &mut cx), Ok(Some(3)));
        assert_eq!(end.find_first_of(1, &mut cx), Ok(Some(3)));
    }

    #[test]
    fn wildcard_needs_a_byte() {
        let mut cx = cx("ab");
        let dot = node(NodeKind::Wildcard);
        assert_eq!(dot.starts_with(1, &mut cx), Ok(Some(2)));
        assert_eq!(dot.starts_with(2, &mut cx), Ok(None));
    }

    #[test]
    fn group_markers_are_zero_width() {
        let mut cx = cx("cat and cat");
        let open = node(NodeKind::GroupStart(SlotId(0)));
        let close = node(NodeKind::GroupEnd(SlotId(0)));
        assert_eq!(open.find_first_of(0, &mut cx), Ok(Some(0)));
        assert_eq!(close.starts_with(3, &mut cx), Ok(Some(3)));
        assert_eq!(cx.captures.text(SlotId(0)).map(|t| t.to_vec()), Ok(b"cat".to_vec()));
    }

    #[test]
    fn backreference_modes_differ() {
        let mut cx = cx("xxtac");
        cx.captures
            .record(SlotId(0), &Bytes::from_static(b"cat"), 0, 3)
            .unwrap();
        let back = node(NodeKind::Backreference(SlotId(0)));
        // Literal comparison when anchored.
        assert_eq!(back.starts_with(2, &mut cx), Ok(None));
        // Byte-set search when unanchored: `t` at 2 is one of "cat".
        assert_eq!(back.find_first_of(0, &mut cx), Ok(Some(5)));
    }

    #[test]
    fn backreference_to_unset_slot_is_an_error() {
        let mut cx = cx("abc");
        let back = node(NodeKind::Backreference(SlotId(1)));
        assert_eq!(
            back.starts_with(0, &mut cx),
            Err(MatchError::UnsetCapture(SlotId(1)))
        );
    }

    #[test]
    fn alternation_prefers_first_option() {
        let mut cx = cx("category");
        let alt = node(NodeKind::Alternation {
            option_a: "cat".to_string(),
            option_b: "category".to_string(),
            slot: SlotId(0),
        });
        assert_eq!(alt.starts_with(0, &mut cx), Ok(Some(3)));
        assert_eq!(cx.captures.text(SlotId(0)).map(|t| t.to_vec()), Ok(b"cat".to_vec()));
    }
}
