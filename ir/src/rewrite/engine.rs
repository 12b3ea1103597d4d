//! Pass registry and worklist driver.
//!
//! # Algorithm
//!
//! `run` seeds a FIFO worklist with every live node in topological order (ties
//! broken by node id). For each popped node, passes are tried in registration
//! order:
//!
//! 1. Pattern test; a non-matching pass is skipped silently.
//! 2. Veto hook (`should_skip`); a vetoed match is counted and skipped.
//! 3. Callback with a [`RewriteContext`] bound to the node.
//!
//! When a callback applies, the remaining passes are not tried on that node
//! (it was replaced), and every node the callback registered is appended to the
//! worklist. That is what lets fusions cascade within a single run: a node
//! produced by one pass is offered to every pass, including the one that
//! produced it.
//!
//! Nodes replaced during the run are retired and never offered again, even
//! though they stay in the arena until dead-node elimination.

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::graph::{Graph, NodeId};
use crate::node::Node;
use crate::pattern::{Pattern, Rewrite};
use crate::provenance::PassName;

/// Callback of a registered pass.
pub type PassCallback<'a> = Box<dyn FnMut(&mut RewriteContext<'_>) -> Result<Rewrite> + 'a>;

/// Host veto: return `true` to leave `node` alone.
pub type SkipPredicate<'a> = Box<dyn Fn(&Graph, NodeId) -> bool + 'a>;

struct Pass<'a> {
    name: PassName,
    pattern: Pattern,
    callback: PassCallback<'a>,
}

/// Counters of one [`GraphRewrite::run_with_stats`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Worklist entries processed.
    pub visited: usize,
    /// (node, pass) pairs whose pattern matched.
    pub matched: usize,
    /// Matches vetoed by the skip predicate.
    pub skipped: usize,
    pub applied: usize,
    pub declined: usize,
}

impl RewriteStats {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Mutation context handed to a pass callback.
pub struct RewriteContext<'g> {
    graph: &'g mut Graph,
    root: NodeId,
    pass: PassName,
    new_nodes: Vec<NodeId>,
    retired: Vec<NodeId>,
}

impl<'g> RewriteContext<'g> {
    fn new(graph: &'g mut Graph, root: NodeId, pass: PassName) -> Self {
        Self { graph, root, pass, new_nodes: Vec::new(), retired: Vec::new() }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        self.graph
    }

    /// The match site.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> Result<&Node> {
        self.graph.node(self.root)
    }

    pub fn pass(&self) -> PassName {
        self.pass
    }

    /// Queue `node` for matching later in the same run.
    pub fn register_new_node(&mut self, node: NodeId) {
        if !self.new_nodes.contains(&node) {
            self.new_nodes.push(node);
        }
    }

    /// [`Graph::replace`] recorded under this pass. `old` is retired for the
    /// rest of the run.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        self.graph.replace_in_pass(old, new, self.pass)?;
        self.retired.push(old);
        Ok(())
    }
}

/// Ordered set of rewrite passes plus an optional host veto.
#[derive(Default)]
pub struct GraphRewrite<'a> {
    passes: Vec<Pass<'a>>,
    should_skip: Option<SkipPredicate<'a>>,
}

impl<'a> GraphRewrite<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass. Passes run in registration order.
    ///
    /// Fails when the pattern names an identity with a malformed parent chain.
    pub fn register_pass(
        &mut self,
        name: &'static str,
        pattern: Pattern,
        callback: impl FnMut(&mut RewriteContext<'_>) -> Result<Rewrite> + 'a,
    ) -> Result<&mut Self> {
        pattern.validate()?;
        tracing::debug!(pass = name, ?pattern, "pass registered");
        self.passes.push(Pass { name: PassName(name), pattern, callback: Box::new(callback) });
        Ok(self)
    }

    pub fn set_skip_predicate(&mut self, predicate: impl Fn(&Graph, NodeId) -> bool + 'a) -> &mut Self {
        self.should_skip = Some(Box::new(predicate));
        self
    }

    pub fn with_skip(mut self, predicate: impl Fn(&Graph, NodeId) -> bool + 'a) -> Self {
        self.set_skip_predicate(predicate);
        self
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|pass| pass.name.0)
    }

    /// Run every pass over `graph`. Returns whether any callback applied.
    pub fn run(&mut self, graph: &mut Graph) -> Result<bool> {
        Ok(self.run_with_stats(graph)?.changed())
    }

    pub fn run_with_stats(&mut self, graph: &mut Graph) -> Result<RewriteStats> {
        let Self { passes, should_skip } = self;
        let mut stats = RewriteStats::default();

        let mut worklist: VecDeque<NodeId> = graph.topological_order().into();
        let mut queued: HashSet<NodeId> = worklist.iter().copied().collect();
        let mut retired: HashSet<NodeId> = HashSet::new();

        while let Some(id) = worklist.pop_front() {
            if retired.contains(&id) {
                continue;
            }
            stats.visited += 1;

            for pass in passes.iter_mut() {
                let Some(node) = graph.get(id) else {
                    break;
                };
                if !pass.pattern.matches(node) {
                    continue;
                }
                stats.matched += 1;

                let vetoed = match should_skip.as_ref() {
                    Some(skip) => skip(graph, id),
                    None => false,
                };
                if vetoed {
                    tracing::trace!(node.id = %id, pass = %pass.name, "match vetoed");
                    stats.skipped += 1;
                    continue;
                }

                let mut ctx = RewriteContext::new(graph, id, pass.name);
                let outcome = (pass.callback)(&mut ctx)?;
                let RewriteContext { new_nodes, retired: replaced, .. } = ctx;

                match outcome {
                    Rewrite::Applied => {
                        stats.applied += 1;
                        tracing::debug!(node.id = %id, pass = %pass.name, new_nodes = new_nodes.len(), "pass applied");
                        retired.extend(replaced);
                        for node in new_nodes {
                            if queued.insert(node) {
                                worklist.push_back(node);
                            }
                        }
                        break;
                    }
                    Rewrite::Declined(reason) => {
                        stats.declined += 1;
                        tracing::trace!(node.id = %id, pass = %pass.name, reason, "pass declined");
                    }
                }
            }
        }

        tracing::debug!(
            visited = stats.visited,
            matched = stats.matched,
            applied = stats.applied,
            declined = stats.declined,
            skipped = stats.skipped,
            "rewrite finished"
        );
        if stats.changed() && tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(tree = %graph.tree(), "graph after rewrite");
        }
        Ok(stats)
    }
}
