//! Binary derivation trees and their reconstruction from solved parses.

pub mod node;
pub mod recover;
pub mod text_format;

pub use node::{postorder_cmp, Node, Symbol, Tag};
pub use recover::{recover, DecodedRefs};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Error, Result};

/// Right-hand side of a grammar rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Children {
    /// A leaf: terminal symbol or reference.
    None,
    /// A concat node wrapping exactly one run node.
    Single(Node),
    /// A binary split.
    Pair(Node, Node),
}

/// A binarized derivation tree. The empty text has no root and no rules.
#[derive(Debug, Default)]
pub struct Grammar {
    root: Option<Node>,
    rules: FxHashMap<Node, Children>,
}

impl Grammar {
    #[must_use]
    pub fn new(root: Option<Node>, rules: FxHashMap<Node, Children>) -> Self {
        Grammar { root, rules }
    }

    #[must_use]
    pub fn root(&self) -> Option<Node> {
        self.root
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> impl Iterator<Item = (&Node, &Children)> {
        self.rules.iter()
    }

    #[must_use]
    pub fn children(&self, node: &Node) -> Option<&Children> {
        self.rules.get(node)
    }

    /// Derive the text this grammar produces.
    ///
    /// A reference chain that reaches a node already being expanded is a
    /// cycle and reported as [`Error::ReconstructionIntegrity`]; parsed
    /// grammar files can contain one.
    pub fn expand(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            let mut active = FxHashSet::default();
            self.expand_node(&root, &mut active, &mut out)?;
        }
        Ok(out)
    }

    fn expand_node(&self, node: &Node, active: &mut FxHashSet<Node>, out: &mut Vec<u8>) -> Result<()> {
        if !active.insert(*node) {
            return Err(integrity(format!("node {node} derives itself")));
        }
        let result = self.expand_children(node, active, out);
        active.remove(node);
        result
    }

    fn expand_children(
        &self,
        node: &Node,
        active: &mut FxHashSet<Node>,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        match node.tag {
            Tag::Leaf(sym) => {
                if node.len() != 1 {
                    return Err(integrity(format!("terminal {node} spans {} symbols", node.len())));
                }
                out.push(sym);
                Ok(())
            }
            Tag::Concat => match self.rules.get(node) {
                Some(Children::Pair(left, right)) => {
                    self.expand_node(left, active, out)?;
                    self.expand_node(right, active, out)
                }
                Some(Children::Single(inner)) if inner.tag == Tag::RunLength => {
                    self.expand_node(inner, active, out)
                }
                _ => Err(integrity(format!("concat node {node} has no binary split"))),
            },
            Tag::RunLength => {
                let Some(Children::Pair(unit, rest)) = self.rules.get(node) else {
                    return Err(integrity(format!("run node {node} has no unit/rest split")));
                };
                let unit_len = unit.len();
                let total = rest.end - unit.start;
                if unit_len == 0 || total % unit_len != 0 {
                    return Err(integrity(format!(
                        "run node {node}: unit of {unit_len} does not divide {total}"
                    )));
                }
                for _ in 0..total / unit_len {
                    self.expand_node(unit, active, out)?;
                }
                Ok(())
            }
            Tag::ConcatRef { src } => {
                let target = self
                    .resolve_internal(src, src + node.len())
                    .ok_or_else(|| integrity(format!("leaf {node} references a missing node")))?;
                self.expand_node(&target, active, out)
            }
            Tag::RunRef { .. } => Err(integrity(format!(
                "run referrer {node} expanded outside its run node"
            ))),
            Tag::Trunc {
                src,
                src_len,
                offset,
            } => {
                let source = self
                    .resolve_internal(src, src + src_len)
                    .ok_or_else(|| integrity(format!("leaf {node} cuts a missing node")))?;
                let mut derived = Vec::with_capacity(src_len);
                self.expand_node(&source, active, &mut derived)?;
                let len = node.len();
                if offset + len > derived.len() {
                    return Err(integrity(format!(
                        "leaf {node} cuts past the end of its source"
                    )));
                }
                out.extend_from_slice(&derived[offset..offset + len]);
                Ok(())
            }
        }
    }

    /// Internal node over `[start, end)`: a concat split, or the run node
    /// that subsumed one.
    fn resolve_internal(&self, start: usize, end: usize) -> Option<Node> {
        let cat = Node::new(start, end, Tag::Concat);
        if self.rules.contains_key(&cat) {
            return Some(cat);
        }
        let run = Node::new(start, end, Tag::RunLength);
        self.rules.contains_key(&run).then_some(run)
    }
}

fn integrity(message: String) -> Error {
    Error::ReconstructionIntegrity(message)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;

    use super::{Children, Grammar, Node, Tag};
    use crate::Error;

    fn leaf(start: usize, sym: u8) -> Node {
        Node::new(start, start + 1, Tag::Leaf(sym))
    }

    #[test]
    fn expands_run_pass_through() {
        // "aaaa": root passes through the run node repeating unit "a".
        let unit = leaf(0, b'a');
        let rest = Node::new(1, 4, Tag::RunRef { src: 0 });
        let run = Node::new(0, 4, Tag::RunLength);
        let root = Node::new(0, 4, Tag::Concat);

        let mut rules = FxHashMap::default();
        rules.insert(unit, Children::None);
        rules.insert(rest, Children::None);
        rules.insert(run, Children::Pair(unit, rest));
        rules.insert(root, Children::Single(run));

        let grammar = Grammar::new(Some(root), rules);
        assert_eq!(grammar.expand().unwrap(), b"aaaa");
    }

    #[test]
    fn expands_cut_leaves() {
        // "abcxab": the trailing "ab" is cut out of the node for "abc".
        let internal = Node::new(0, 3, Tag::Concat);
        let ab = Node::new(0, 2, Tag::Concat);
        let tail = Node::new(4, 6, Tag::Trunc {
            src: 0,
            src_len: 3,
            offset: 0,
        });
        let mut rules = FxHashMap::default();
        rules.insert(leaf(0, b'a'), Children::None);
        rules.insert(leaf(1, b'b'), Children::None);
        rules.insert(leaf(2, b'c'), Children::None);
        rules.insert(leaf(3, b'x'), Children::None);
        rules.insert(ab, Children::Pair(leaf(0, b'a'), leaf(1, b'b')));
        rules.insert(internal, Children::Pair(ab, leaf(2, b'c')));
        rules.insert(tail, Children::None);

        let root = Node::new(0, 6, Tag::Concat);
        let mid = Node::new(0, 4, Tag::Concat);
        rules.insert(mid, Children::Pair(internal, leaf(3, b'x')));
        rules.insert(root, Children::Pair(mid, tail));

        let grammar = Grammar::new(Some(root), rules);
        assert_eq!(grammar.expand().unwrap(), b"abcxab");
    }

    #[test]
    fn empty_grammar_expands_to_nothing() {
        let grammar = Grammar::default();
        assert_eq!(grammar.expand().unwrap(), b"");
    }

    #[test]
    fn cyclic_references_are_an_integrity_error() {
        // A cut of 1..3 out of 4..8 whose child 4..7 copies 0..3, which
        // contains the cut again. Expansion must stop, not recurse forever.
        let cut = Node::new(1, 3, Tag::Trunc {
            src: 4,
            src_len: 4,
            offset: 1,
        });
        let a = Node::new(0, 3, Tag::Concat);
        let copy = Node::new(4, 7, Tag::ConcatRef { src: 0 });
        let b = Node::new(4, 8, Tag::Concat);
        let mid = Node::new(0, 4, Tag::Concat);
        let root = Node::new(0, 8, Tag::Concat);

        let mut rules = FxHashMap::default();
        rules.insert(leaf(0, b'a'), Children::None);
        rules.insert(cut, Children::None);
        rules.insert(a, Children::Pair(leaf(0, b'a'), cut));
        rules.insert(leaf(3, b'x'), Children::None);
        rules.insert(mid, Children::Pair(a, leaf(3, b'x')));
        rules.insert(copy, Children::None);
        rules.insert(leaf(7, b'y'), Children::None);
        rules.insert(b, Children::Pair(copy, leaf(7, b'y')));
        rules.insert(root, Children::Pair(mid, b));

        let grammar = Grammar::new(Some(root), rules);
        assert!(matches!(
            grammar.expand(),
            Err(Error::ReconstructionIntegrity(_))
        ));
    }

    #[test]
    fn dangling_reference_is_an_integrity_error() {
        let referrer = Node::new(2, 4, Tag::ConcatRef { src: 0 });
        let mut rules = FxHashMap::default();
        rules.insert(referrer, Children::None);
        let grammar = Grammar::new(Some(referrer), rules);
        assert!(grammar.expand().is_err());
    }
}
