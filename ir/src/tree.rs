//! Tree visualization for graphs.
//!
//! Renders the producers of a node as an ASCII tree. Shared producers are
//! expanded once; later occurrences print a back-reference.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use ptree::{Style, TreeItem};

use crate::graph::{Graph, NodeId};
use crate::node::Node;

#[derive(Clone)]
pub struct GraphTree<'g> {
    graph: &'g Graph,
    node: NodeId,
    visited: Rc<RefCell<HashSet<NodeId>>>,
    /// Set by `write_self` when the node was already printed.
    is_backref: Cell<bool>,
}

impl<'g> GraphTree<'g> {
    pub fn new(graph: &'g Graph, node: NodeId) -> Self {
        Self { graph, node, visited: Rc::new(RefCell::new(HashSet::new())), is_backref: Cell::new(false) }
    }

    fn child(&self, node: NodeId) -> Self {
        Self { graph: self.graph, node, visited: self.visited.clone(), is_backref: Cell::new(false) }
    }
}

impl TreeItem for GraphTree<'_> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        let Some(node) = self.graph.get(self.node) else {
            return write!(f, "[{}] <removed>", self.node);
        };
        let mut visited = self.visited.borrow_mut();
        if !visited.insert(self.node) {
            self.is_backref.set(true);
            return write!(f, "[{}] → (see above)", self.node);
        }
        write!(f, "{}", format_node(node))
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        if self.is_backref.get() {
            return Cow::Borrowed(&[]);
        }
        let Some(node) = self.graph.get(self.node) else {
            return Cow::Borrowed(&[]);
        };
        Cow::Owned(node.inputs().iter().map(|input| self.child(input.node)).collect())
    }
}

/// `[id] Kind 'name' : dtype[shape] attrs`
fn format_node(node: &Node) -> String {
    let slots: Vec<String> = node.outputs().iter().map(ToString::to_string).collect();
    let describe = node.op().describe();
    let mut line = format!("[{}] {} '{}' : {}", node.id(), node.type_info().name, node.friendly_name(), slots.join(", "));
    if !describe.is_empty() {
        line.push(' ');
        line.push_str(&describe);
    }
    line
}

/// Render the producers of `root` as a tree.
pub fn render_tree(graph: &Graph, root: NodeId) -> String {
    let tree = GraphTree::new(graph, root);
    let mut buf = Vec::new();
    if let Err(error) = ptree::write_tree(&tree, &mut buf) {
        tracing::warn!(%error, root = %root, "tree rendering failed");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

impl Graph {
    /// Render every result of the graph, in creation order.
    pub fn tree(&self) -> String {
        self.results().iter().map(|&result| render_tree(self, result)).collect()
    }
}
