//! Graphviz rendering of derivation trees.

use rustc_hash::FxHashMap;

use crate::grammar::{Children, Grammar, Node, Tag};

pub enum Edge {
    /// Plain parent-to-child edge of a concat split.
    Plain(usize, usize),
    /// Edge from a run node to its unit, labeled with the repeat count.
    Repeat(usize, usize, usize),
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Plain(from, to) => write!(f, "{from} -> {to}"),
            Edge::Repeat(from, to, count) => {
                write!(f, "{from} -> {to} [label=\"x{count}\"]")
            }
        }
    }
}

pub enum NodeType {
    /// Terminal or reference leaf.
    Box(String),
    /// Internal concat or run node.
    Circle(String),
}

impl NodeType {
    fn attributes(&self) -> String {
        match self {
            NodeType::Box(label) => format!("shape=box label=\"{label}\""),
            NodeType::Circle(label) => format!("shape=circle label=\"{label}\""),
        }
    }
}

#[derive(Default)]
pub struct DotWriter {
    graph_name: String,
    nodes: Vec<(usize, NodeType)>,
    edges: Vec<Edge>,
}

impl DotWriter {
    #[must_use]
    pub fn new(graph_name: String) -> DotWriter {
        DotWriter {
            graph_name,
            ..Default::default()
        }
    }

    pub fn add_node(&mut self, node_idx: usize, node_type: NodeType) {
        self.nodes.push((node_idx, node_type));
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// # Errors
    /// Function returns an error if the writing to a file or flushing fails.
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), String> {
        write!(writer, "digraph {} {{\n  overlap=false", self.graph_name)
            .map_err(|err| err.to_string())?;

        for (node, node_type) in &self.nodes {
            write!(writer, "\n  {node} [{}]", node_type.attributes()).map_err(|err| err.to_string())?;
        }

        for edge in &self.edges {
            write!(writer, "\n  {edge}").map_err(|err| err.to_string())?;
        }

        write!(writer, "\n}}").map_err(|err| err.to_string())?;
        writer.flush().map_err(|err| err.to_string())?;
        Ok(())
    }
}

/// Populate a writer with the derivation tree of `grammar`.
#[must_use]
pub fn draw_grammar(grammar: &Grammar) -> DotWriter {
    let mut writer = DotWriter::new("derivation".to_owned());

    let mut ids: FxHashMap<Node, usize> = FxHashMap::default();
    let mut nodes: Vec<Node> = grammar.rules().map(|(node, _)| *node).collect();
    nodes.sort_unstable();
    for (idx, node) in nodes.iter().enumerate() {
        ids.insert(*node, idx);
        writer.add_node(idx, node_type(node));
    }

    for node in &nodes {
        let (Some(&from), Some(children)) = (ids.get(node), grammar.children(node)) else {
            continue;
        };
        match children {
            Children::None => {}
            Children::Single(inner) => {
                if let Some(&to) = ids.get(inner) {
                    writer.add_edge(Edge::Plain(from, to));
                }
            }
            Children::Pair(left, right) => {
                let repeat = (node.tag == Tag::RunLength && !left.is_empty())
                    .then(|| node.len() / left.len());
                if let (Some(&l), Some(&r)) = (ids.get(left), ids.get(right)) {
                    match repeat {
                        Some(count) => {
                            writer.add_edge(Edge::Repeat(from, l, count));
                            writer.add_edge(Edge::Plain(from, r));
                        }
                        None => {
                            writer.add_edge(Edge::Plain(from, l));
                            writer.add_edge(Edge::Plain(from, r));
                        }
                    }
                }
            }
        }
    }
    writer
}

fn node_type(node: &Node) -> NodeType {
    match node.tag {
        Tag::Leaf(sym) => NodeType::Box(format!(
            "{}..{} '{}'",
            node.start,
            node.end,
            sym.escape_ascii()
        )),
        Tag::ConcatRef { src } => {
            NodeType::Box(format!("{}..{} = {}..{}", node.start, node.end, src, src + node.len()))
        }
        Tag::RunRef { src } => NodeType::Box(format!("{}..{} run@{src}", node.start, node.end)),
        Tag::Trunc {
            src,
            src_len,
            offset,
        } => NodeType::Box(format!(
            "{}..{} cut {}..{}@{offset}",
            node.start,
            node.end,
            src,
            src + src_len
        )),
        Tag::Concat => NodeType::Circle(format!("{}..{}", node.start, node.end)),
        Tag::RunLength => NodeType::Circle(format!("{}..{}*", node.start, node.end)),
    }
}

#[cfg(test)]
mod test {
    use rustc_hash::FxHashMap;

    use super::draw_grammar;
    use crate::grammar::{Children, Grammar, Node, Tag};

    #[test]
    fn renders_run_edge_with_repeat_count() {
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

        let mut out = Vec::new();
        draw_grammar(&grammar).write(&mut out).unwrap();
        let dot = String::from_utf8(out).unwrap();
        assert!(dot.starts_with("digraph derivation {"));
        assert!(dot.contains("label=\"x4\""));
        assert!(dot.contains("shape=box"));
    }
}
