use std::cmp::Ordering;
use std::fmt::Display;

/// Terminal alphabet of the compressor.
pub type Symbol = u8;

/// What a derivation-tree node produces from its interval.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// A single terminal symbol.
    Leaf(Symbol),
    /// Concatenation of the children, or pass-through to a run node.
    Concat,
    /// Repetition of the first child over the node's whole interval.
    RunLength,
    /// Leaf copying the earlier interval starting at `src` of equal length.
    ConcatRef { src: usize },
    /// Leaf extending the run whose unit starts at `src`; never expanded
    /// directly, only through its enclosing run node.
    RunRef { src: usize },
    /// Leaf slicing `len` symbols at `offset` out of `[src, src+src_len)`.
    Trunc {
        src: usize,
        src_len: usize,
        offset: usize,
    },
}

/// A derivation-tree node: a half-open text interval plus its rule kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub start: usize,
    pub end: usize,
    pub tag: Tag,
}

impl Node {
    #[must_use]
    pub fn new(start: usize, end: usize, tag: Tag) -> Self {
        Node { start, end, tag }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}:", self.start, self.end)?;
        match self.tag {
            Tag::Leaf(sym) => write!(f, "leaf({sym})"),
            Tag::Concat => write!(f, "cat"),
            Tag::RunLength => write!(f, "run"),
            Tag::ConcatRef { src } => write!(f, "ref({src})"),
            Tag::RunRef { src } => write!(f, "runref({src})"),
            Tag::Trunc {
                src,
                src_len,
                offset,
            } => write!(f, "cut({src},{src_len},{offset})"),
        }
    }
}

/// Postorder over a laminar set of intervals: disjoint intervals sort left
/// to right, a contained interval sorts before its container. Equal
/// intervals (a run span wrapped by the root) put the concat node last so
/// it becomes the outer node. Crossing intervals violate the non-crossing
/// guarantee of the solved parse.
///
/// # Panics
///
/// Panics when the two intervals properly cross.
#[must_use]
pub fn postorder_cmp(x: &Node, y: &Node) -> Ordering {
    if x.end <= y.start {
        return Ordering::Less;
    }
    if y.end <= x.start {
        return Ordering::Greater;
    }
    if x.start == y.start && x.end == y.end {
        return tag_rank(x.tag).cmp(&tag_rank(y.tag));
    }
    if y.start <= x.start && x.end <= y.end {
        return Ordering::Less;
    }
    if x.start <= y.start && y.end <= x.end {
        return Ordering::Greater;
    }
    panic!("crossing intervals {x} and {y} in a laminar forest");
}

fn tag_rank(tag: Tag) -> u8 {
    match tag {
        Tag::Leaf(_) | Tag::ConcatRef { .. } | Tag::RunRef { .. } | Tag::Trunc { .. } => 0,
        Tag::RunLength => 1,
        Tag::Concat => 2,
    }
}

#[cfg(test)]
mod test {
    use std::cmp::Ordering;

    use super::{postorder_cmp, Node, Tag};

    #[test]
    fn postorder_sorts_children_before_parents() {
        let leaf = Node::new(0, 1, Tag::Leaf(b'a'));
        let run = Node::new(0, 4, Tag::RunLength);
        let root = Node::new(0, 4, Tag::Concat);
        let late = Node::new(4, 6, Tag::Concat);

        assert_eq!(postorder_cmp(&leaf, &run), Ordering::Less);
        assert_eq!(postorder_cmp(&run, &root), Ordering::Less);
        assert_eq!(postorder_cmp(&root, &late), Ordering::Less);
        assert_eq!(postorder_cmp(&late, &leaf), Ordering::Greater);
    }

    #[test]
    #[should_panic(expected = "crossing intervals")]
    fn crossing_intervals_panic() {
        let a = Node::new(0, 3, Tag::Concat);
        let b = Node::new(2, 5, Tag::Concat);
        let _ = postorder_cmp(&a, &b);
    }
}
