//! Reconstruction of the derivation tree from a solved parse.
//!
//! The model yields the phrase boundaries plus the chosen reference of every
//! defining phrase. Those intervals form a laminar family by construction,
//! so sorting them in postorder and folding with a stack rebuilds the tree,
//! which is then binarized.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::candidates::{Interval, TruncSource};
use crate::grammar::node::{postorder_cmp, Node, Tag};
use crate::grammar::{Children, Grammar};
use crate::{Error, Result};

/// The rule choices read back from an optimal model.
#[derive(Debug, Default)]
pub struct DecodedRefs {
    /// All phrase boundary positions, ascending, including 0 and n.
    pub pstarts: Vec<usize>,
    /// Concat referrer `(dst, len)` -> chosen source start.
    pub concat: FxHashMap<Interval, usize>,
    /// Run referrer `(dst, len)` -> chosen unit start.
    pub runs: FxHashMap<Interval, usize>,
    /// Cut referrer `(dst, len)` -> chosen source.
    pub cuts: FxHashMap<Interval, TruncSource>,
}

/// Rebuild the binarized derivation tree for `text` from decoded rule
/// choices.
#[tracing::instrument(skip_all, fields(n = text.len(), phrases = refs.pstarts.len().saturating_sub(1)))]
pub fn recover(text: &[u8], refs: &DecodedRefs) -> Result<Grammar> {
    let n = text.len();
    if n == 0 {
        return Ok(Grammar::default());
    }

    let mut nodes: Vec<Node> = Vec::new();
    let mut internals: FxHashSet<Interval> = FxHashSet::default();
    let mut run_wholes: FxHashSet<Interval> = FxHashSet::default();

    for (&(dst, len), &src) in &refs.concat {
        nodes.push(Node::new(dst, dst + len, Tag::ConcatRef { src }));
        internals.insert((src, src + len));
    }
    for (&(dst, len), &src) in &refs.runs {
        nodes.push(Node::new(dst, dst + len, Tag::RunRef { src }));
        run_wholes.insert((src, dst + len));
    }
    for (&(dst, len), source) in &refs.cuts {
        nodes.push(Node::new(
            dst,
            dst + len,
            Tag::Trunc {
                src: source.src,
                src_len: source.src_len,
                offset: source.offset,
            },
        ));
        internals.insert((source.src, source.src + source.src_len));
    }

    // Unit-length phrases are terminal leaves.
    for pair in refs.pstarts.windows(2) {
        if pair[1] - pair[0] == 1 {
            nodes.push(Node::new(pair[0], pair[1], Tag::Leaf(text[pair[0]])));
        }
    }

    // A run whole subsumes a concat split over the same interval.
    for &(start, end) in &internals {
        if !run_wholes.contains(&(start, end)) {
            nodes.push(Node::new(start, end, Tag::Concat));
        }
    }
    for &(start, end) in &run_wholes {
        nodes.push(Node::new(start, end, Tag::RunLength));
    }

    if nodes.len() > 1 {
        nodes.push(Node::new(0, n, Tag::Concat));
    }
    nodes.sort_unstable_by(|a, b| postorder_cmp(a, b));

    let forest = fold_forest(&nodes)?;
    let root = *nodes
        .last()
        .ok_or_else(|| Error::ReconstructionIntegrity("no nodes for a non-empty text".into()))?;
    let rules = binarize(root, &forest)?;
    Ok(Grammar::new(Some(root), rules))
}

/// Fold a postorder-sorted laminar node list into a child map.
fn fold_forest(nodes: &[Node]) -> Result<FxHashMap<Node, Vec<Node>>> {
    let mut children: FxHashMap<Node, Vec<Node>> = FxHashMap::default();
    let mut rest: Vec<Node> = nodes.to_vec();
    let mut stack: Vec<(Node, Vec<Node>)> = Vec::new();

    let Some(outer) = rest.pop() else {
        return Ok(children);
    };
    stack.push((outer, Vec::new()));

    while !rest.is_empty() || stack.len() > 1 {
        if let (Some(&next), Some(top)) = (rest.last(), stack.last()) {
            if next.start >= top.0.start {
                rest.pop();
                stack.push((next, Vec::new()));
                continue;
            }
        }
        let Some((node, mut collected)) = stack.pop() else {
            break;
        };
        collected.reverse();
        children.insert(node, collected);
        match stack.last_mut() {
            Some(parent) => parent.1.push(node),
            None => {
                return Err(Error::ReconstructionIntegrity(format!(
                    "node {node} escaped the outermost interval"
                )))
            }
        }
    }
    if let Some((node, mut collected)) = stack.pop() {
        collected.reverse();
        children.insert(node, collected);
    }
    Ok(children)
}

/// Binarize the child map: pairs stay, longer child lists left-fold through
/// synthetic concat nodes, a lone run child passes through.
fn binarize(root: Node, forest: &FxHashMap<Node, Vec<Node>>) -> Result<FxHashMap<Node, Children>> {
    let mut rules: FxHashMap<Node, Children> = FxHashMap::default();
    let mut work = vec![root];

    while let Some(node) = work.pop() {
        if rules.contains_key(&node) {
            continue;
        }
        let kids = forest.get(&node).map_or(&[][..], Vec::as_slice);
        match kids {
            [] => {
                rules.insert(node, Children::None);
            }
            [only] if only.tag == Tag::RunLength => {
                rules.insert(node, Children::Single(*only));
                work.push(*only);
            }
            [only] => {
                return Err(Error::ReconstructionIntegrity(format!(
                    "node {node} has a single non-run child {only}"
                )))
            }
            [left, right] => {
                rules.insert(node, Children::Pair(*left, *right));
                work.push(*left);
                work.push(*right);
            }
            many => {
                let mut acc = many[0];
                for (k, child) in many.iter().enumerate().skip(1) {
                    let parent = if k + 1 < many.len() {
                        Node::new(node.start, child.end, Tag::Concat)
                    } else {
                        node
                    };
                    rules.insert(parent, Children::Pair(acc, *child));
                    acc = parent;
                }
                work.extend(many.iter().copied());
            }
        }
    }
    Ok(rules)
}
