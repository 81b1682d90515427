//! Line-based text serialization of a grammar.
//!
//! One header line names the root, then one line per rule in postorder-ish
//! sorted order:
//!
//! ```text
//! root 0..4:cat
//! 0..1:leaf(97) := .
//! 1..4:runref(0) := .
//! 0..4:run := 0..1:leaf(97) , 1..4:runref(0)
//! 0..4:cat := 0..4:run
//! ```
//!
//! Leaves end in `.`; a node token is `start..end:tag` matching the
//! [`Node`] display form. The empty grammar serializes as `root .`.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

use crate::grammar::node::{Node, Symbol, Tag};
use crate::grammar::{Children, Grammar};
use crate::{Error, Result};

/// Serialize `grammar` to the line format.
#[must_use]
pub fn serialize(grammar: &Grammar) -> String {
    let mut out = String::new();
    match grammar.root() {
        Some(root) => {
            let _ = writeln!(out, "root {root}");
        }
        None => {
            let _ = writeln!(out, "root .");
            return out;
        }
    }

    let mut nodes: Vec<&Node> = grammar.rules().map(|(node, _)| node).collect();
    nodes.sort_unstable();
    for node in nodes {
        let line = match grammar.children(node) {
            Some(Children::None) | None => format!("{node} := ."),
            Some(Children::Single(inner)) => format!("{node} := {inner}"),
            Some(Children::Pair(left, right)) => format!("{node} := {left} , {right}"),
        };
        let _ = writeln!(out, "{line}");
    }
    out
}

/// Parse the line format back into a grammar.
pub fn parse(input: &str) -> Result<Grammar> {
    let mut lines = input.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| malformed("missing root header"))?;
    let root_token = header
        .strip_prefix("root ")
        .ok_or_else(|| malformed("first line must start with 'root '"))?
        .trim();
    let root = if root_token == "." {
        None
    } else {
        Some(parse_node(root_token)?)
    };

    let mut rules: FxHashMap<Node, Children> = FxHashMap::default();
    for line in lines {
        let (lhs, rhs) = line
            .split_once(" := ")
            .ok_or_else(|| malformed(&format!("rule line without ':=': {line}")))?;
        let node = parse_node(lhs.trim())?;
        let children = match rhs.trim() {
            "." => Children::None,
            single if !single.contains(" , ") => Children::Single(parse_node(single)?),
            pair => {
                let (left, right) = pair
                    .split_once(" , ")
                    .ok_or_else(|| malformed(&format!("bad rule body: {pair}")))?;
                Children::Pair(parse_node(left.trim())?, parse_node(right.trim())?)
            }
        };
        rules.insert(node, children);
    }

    if let Some(root) = root {
        if !rules.contains_key(&root) {
            return Err(malformed("root node has no rule"));
        }
    } else if !rules.is_empty() {
        return Err(malformed("empty grammar with rules"));
    }
    Ok(Grammar::new(root, rules))
}

fn parse_node(token: &str) -> Result<Node> {
    let (span, tag) = token
        .split_once(':')
        .ok_or_else(|| malformed(&format!("node token without ':': {token}")))?;
    let (start, end) = span
        .split_once("..")
        .ok_or_else(|| malformed(&format!("bad interval: {span}")))?;
    let start: usize = start
        .parse()
        .map_err(|_| malformed(&format!("bad interval start: {start}")))?;
    let end: usize = end
        .parse()
        .map_err(|_| malformed(&format!("bad interval end: {end}")))?;
    if end <= start {
        return Err(malformed(&format!("empty interval in node token: {token}")));
    }

    let tag = if tag == "cat" {
        Tag::Concat
    } else if tag == "run" {
        Tag::RunLength
    } else if let Some(args) = strip_call(tag, "leaf") {
        let value: u16 = args
            .parse()
            .map_err(|_| malformed(&format!("bad leaf symbol: {args}")))?;
        let sym = Symbol::try_from(value)
            .map_err(|_| Error::MalformedInput(format!("leaf symbol out of range: {value}")))?;
        Tag::Leaf(sym)
    } else if let Some(args) = strip_call(tag, "runref") {
        Tag::RunRef {
            src: parse_usize(args)?,
        }
    } else if let Some(args) = strip_call(tag, "ref") {
        Tag::ConcatRef {
            src: parse_usize(args)?,
        }
    } else if let Some(args) = strip_call(tag, "cut") {
        let parts: Vec<&str> = args.split(',').collect();
        let [src, src_len, offset] = parts.as_slice() else {
            return Err(malformed(&format!("cut takes three arguments: {args}")));
        };
        Tag::Trunc {
            src: parse_usize(src)?,
            src_len: parse_usize(src_len)?,
            offset: parse_usize(offset)?,
        }
    } else {
        return Err(malformed(&format!("unknown node tag: {tag}")));
    };
    Ok(Node::new(start, end, tag))
}

fn strip_call<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    tag.strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
}

fn parse_usize(token: &str) -> Result<usize> {
    token
        .trim()
        .parse()
        .map_err(|_| malformed(&format!("bad number: {token}")))
}

fn malformed(message: &str) -> Error {
    Error::Serialization(message.to_owned())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;

    use super::{parse, serialize};
    use crate::grammar::node::{Node, Tag};
    use crate::grammar::{Children, Grammar};

    #[test]
    fn round_trips_a_run_grammar() {
        let unit = Node::new(0, 1, Tag::Leaf(b'a'));
        let rest = Node::new(1, 4, Tag::RunRef { src: 0 });
        let run = Node::new(0, 4, Tag::RunLength);
        let root = Node::new(0, 4, Tag::Concat);
        let mut rules = FxHashMap::default();
        rules.insert(unit, Children::None);
        rules.insert(rest, Children::None);
        rules.insert(run, Children::Pair(unit, rest));
        rules.insert(root, Children::Single(run));
        let grammar = Grammar::new(Some(root), rules);

        let text = serialize(&grammar);
        let back = parse(&text).unwrap();
        assert_eq!(back.root(), Some(root));
        assert_eq!(back.node_count(), 4);
        assert_eq!(back.expand().unwrap(), b"aaaa");
    }

    #[test]
    fn round_trips_the_empty_grammar() {
        let text = serialize(&Grammar::default());
        assert_eq!(text, "root .\n");
        let back = parse(&text).unwrap();
        assert_eq!(back.root(), None);
    }

    #[test]
    fn parses_cut_tokens() {
        let text = "root 0..2:cut(3,4,1)\n0..2:cut(3,4,1) := .\n";
        let back = parse(text).unwrap();
        let root = back.root().unwrap();
        assert_eq!(
            root.tag,
            Tag::Trunc {
                src: 3,
                src_len: 4,
                offset: 1
            }
        );
    }

    #[test]
    fn parsed_cycle_fails_expansion_cleanly() {
        // Syntactically valid, but the concat node is its own right child.
        let text = "root 0..2:cat\n0..1:leaf(97) := .\n0..2:cat := 0..1:leaf(97) , 0..2:cat\n";
        let back = parse(text).unwrap();
        assert!(back.expand().is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("root 0..2:nonsense\n").is_err());
        assert!(parse("root 0..1:leaf(97)\n0..1:leaf(500) := .\n").is_err());
        assert!(parse("root 5..2:cat\n").is_err());
    }
}
