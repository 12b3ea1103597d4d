//! Arena-backed dataflow graph.
//!
//! The [`Graph`] owns every node. Nodes reference their producers through
//! [`Output`] handles (`NodeId` + output index), so shared producers and
//! rewiring never involve ownership: [`Graph::replace`] is a rewrite of every
//! edge whose producer handle equals the old node.
//!
//! Removed nodes leave a tombstone, so a `NodeId` is never reused within one
//! graph and a stale handle fails with [`Error::NodeNotFound`] instead of
//! silently aliasing a newer node.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::panic::Location;

use derive_more::Display;
use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::node::{Node, Operation, OutputSlot};
use crate::ops::{Parameter, Sink};
use crate::provenance::{PassName, Provenance, ProvenanceEvent};
use crate::type_info::{NodeKind, TypeInfo};

/// Stable handle of a node in one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("#{_0}")]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Handle of output slot `index` of this node.
    pub const fn output(self, index: usize) -> Output {
        Output { node: self, index }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A value edge: output slot `index` of `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{node}:{index}")]
pub struct Output {
    pub node: NodeId,
    pub index: usize,
}

/// A consuming edge: input `index` of `node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{node}.in{index}")]
pub struct Input {
    pub node: NodeId,
    pub index: usize,
}

/// Dataflow graph with arena ownership of all nodes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Option<Node>>,
    parameters: Vec<NodeId>,
    results: Vec<NodeId>,
    /// Identities whose parent chain was already validated.
    known_kinds: HashSet<&'static TypeInfo>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Add a node computing `op` over `inputs`.
    ///
    /// The operation validates its own input contract and infers the output
    /// slots. The first node of each kind also validates the kind's identity
    /// chain.
    #[track_caller]
    pub fn add_node(&mut self, op: impl Operation, inputs: &[Output]) -> Result<NodeId> {
        self.add_boxed(Box::new(op), inputs)
    }

    /// Mark `value` as a graph output by attaching a `Result` node to it.
    #[track_caller]
    pub fn add_result(&mut self, value: Output) -> Result<NodeId> {
        self.add_boxed(Box::new(Sink), &[value])
    }

    #[track_caller]
    pub fn add_boxed(&mut self, op: Box<dyn Operation>, inputs: &[Output]) -> Result<NodeId> {
        let location = Location::caller();
        self.register_kind(op.type_info())?;

        let slots = inputs.iter().map(|input| self.slot(*input).cloned()).collect::<Result<SmallVec<[_; 4]>>>()?;
        let outputs = op.validate_and_infer(&slots)?;

        let id = NodeId(self.nodes.len() as u32);
        let friendly_name = format!("{}_{}", op.type_info().name, id.0);
        let is_parameter = op.type_info() == Parameter::TYPE_INFO;
        let is_result = op.type_info() == Sink::TYPE_INFO;

        tracing::trace!(node.id = %id, node.kind = %op.type_info(), inputs = inputs.len(), "node added");
        self.nodes.push(Some(Node {
            id,
            op,
            inputs: inputs.iter().copied().collect(),
            outputs,
            friendly_name,
            provenance: Provenance::created(location),
        }));

        if is_parameter {
            self.parameters.push(id);
        }
        if is_result {
            self.results.push(id);
        }
        Ok(id)
    }

    /// Add a copy of `node`'s operation over new inputs.
    ///
    /// The clone gets a fresh id and a default friendly name; callers that
    /// substitute it for the original set the name and provenance themselves.
    #[track_caller]
    pub fn clone_with_new_inputs(&mut self, node: NodeId, inputs: &[Output]) -> Result<NodeId> {
        let op = self.node(node)?.op.clone();
        self.add_boxed(op, inputs)
    }

    fn register_kind(&mut self, info: &'static TypeInfo) -> Result<()> {
        if !self.known_kinds.contains(&info) {
            info.validate()?;
            self.known_kinds.insert(info);
        }
        Ok(())
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).context(NodeNotFoundSnafu { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut).context(NodeNotFoundSnafu { node: id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Output slot behind an edge.
    pub fn slot(&self, output: Output) -> Result<&OutputSlot> {
        let node = self.node(output.node)?;
        node.outputs.get(output.index).context(OutputIndexOutOfRangeSnafu {
            node: output.node,
            index: output.index,
            outputs: node.outputs.len(),
        })
    }

    /// Edge feeding input `index` of `node`.
    pub fn input_value(&self, node: NodeId, index: usize) -> Result<Output> {
        let n = self.node(node)?;
        n.input(index).context(InputIndexOutOfRangeSnafu { node, index, inputs: n.inputs.len() })
    }

    /// Producer node feeding input `index` of `node`.
    pub fn input_node(&self, node: NodeId, index: usize) -> Result<&Node> {
        let value = self.input_value(node, index)?;
        self.node(value.node)
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Live nodes castable to `T`, in id order.
    pub fn nodes_of<T: NodeKind>(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|node| node.is_type::<T>())
    }

    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parameters(&self) -> &[NodeId] {
        &self.parameters
    }

    /// Result (sink) nodes, in creation order.
    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    /// Every input edge reading `output`, ordered by consumer id then input index.
    pub fn consumers(&self, output: Output) -> Vec<Input> {
        self.nodes()
            .flat_map(|node| {
                node.inputs.iter().enumerate().filter(move |(_, input)| **input == output).map(move |(index, _)| Input {
                    node: node.id,
                    index,
                })
            })
            .collect()
    }

    /// Every input edge reading any output of `node`.
    pub fn node_consumers(&self, node: NodeId) -> Vec<Input> {
        self.nodes()
            .flat_map(|consumer| {
                consumer.inputs.iter().enumerate().filter(move |(_, input)| input.node == node).map(
                    move |(index, _)| Input { node: consumer.id, index },
                )
            })
            .collect()
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn set_friendly_name(&mut self, node: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_mut(node)?.friendly_name = name.into();
        Ok(())
    }

    /// Merge the provenance of every node in `from` into `to`.
    pub fn copy_provenance(&mut self, from: &[NodeId], to: NodeId) -> Result<()> {
        let sources = from
            .iter()
            .filter(|&&id| id != to)
            .map(|&id| self.node(id).map(|n| (id, n.friendly_name.clone(), n.provenance.clone())))
            .collect::<Result<Vec<_>>>()?;

        let target = self.node_mut(to)?;
        for (id, name, provenance) in sources {
            target.provenance.absorb(id, &name, &provenance);
        }
        Ok(())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Redirect every consumer of `old` to `new`.
    ///
    /// Consumers of output `i` of `old` read output `i` of `new` afterwards; the
    /// two nodes must expose the same number of outputs. `new` inherits the
    /// provenance of `old`. `old` is left without consumers and stays in the
    /// arena until [`Graph::eliminate_dead_nodes`].
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        self.replace_in_pass(old, new, PassName::REPLACE)
    }

    pub(crate) fn replace_in_pass(&mut self, old: NodeId, new: NodeId, pass: PassName) -> Result<()> {
        ensure!(old != new, ReplaceWithSelfSnafu { node: old });
        let old_outputs = self.node(old)?.outputs.len();
        let new_outputs = self.node(new)?.outputs.len();
        ensure!(old_outputs == new_outputs, ReplaceArityMismatchSnafu { old, new, old_outputs, new_outputs });

        let mut rewired = 0usize;
        for node in self.nodes.iter_mut().flatten() {
            // `new` may legitimately consume `old` (e.g. a wrapper inserted after it).
            if node.id == new {
                continue;
            }
            for input in node.inputs.iter_mut().filter(|input| input.node == old) {
                input.node = new;
                rewired += 1;
            }
        }

        let (old_name, old_provenance) = {
            let n = self.node(old)?;
            (n.friendly_name.clone(), n.provenance.clone())
        };
        let target = self.node_mut(new)?;
        target.provenance.absorb(old, &old_name, &old_provenance);
        target.provenance.push(ProvenanceEvent::Replaced { from: old, from_name: old_name, pass });

        tracing::debug!(old = %old, new = %new, rewired, pass = %pass, "node replaced");
        Ok(())
    }

    /// Remove nodes that have no consumers and are neither results nor
    /// parameters. Returns the number of removed nodes.
    pub fn eliminate_dead_nodes(&mut self) -> usize {
        let mut consumer_count: HashMap<NodeId, usize> = HashMap::new();
        for node in self.nodes() {
            for input in &node.inputs {
                *consumer_count.entry(input.node).or_default() += 1;
            }
        }

        let is_root = |node: &Node| node.is_type::<Sink>() || node.is_type::<Parameter>();
        let mut worklist: Vec<NodeId> = self
            .nodes()
            .filter(|n| !is_root(n) && consumer_count.get(&n.id).copied().unwrap_or(0) == 0)
            .map(|n| n.id)
            .collect();

        let mut removed = 0;
        while let Some(id) = worklist.pop() {
            let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) else {
                continue;
            };
            removed += 1;
            for input in &node.inputs {
                let count = consumer_count.entry(input.node).or_default();
                *count = count.saturating_sub(1);
                if *count == 0 && self.get(input.node).is_some_and(|producer| !is_root(producer)) {
                    worklist.push(input.node);
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "dead nodes eliminated");
        }
        removed
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Live nodes with every producer before its consumers.
    ///
    /// Ties are broken by the smallest node id, so the order is deterministic.
    /// Nodes on a cycle (only possible through explicit loop constructs, which
    /// this IR does not model) are appended in id order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut pending: HashMap<NodeId, usize> = HashMap::new();
        let mut users: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in self.nodes() {
            let producers: HashSet<NodeId> =
                node.inputs.iter().map(|input| input.node).filter(|id| self.contains(*id)).collect();
            pending.insert(node.id, producers.len());
            for producer in producers {
                users.entry(producer).or_default().push(node.id);
            }
        }

        let mut ready: BinaryHeap<Reverse<NodeId>> =
            pending.iter().filter(|(_, count)| **count == 0).map(|(id, _)| Reverse(*id)).collect();
        let mut order = Vec::with_capacity(pending.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for user in users.get(&id).into_iter().flatten() {
                if let Some(count) = pending.get_mut(user) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(Reverse(*user));
                    }
                }
            }
        }

        if order.len() < pending.len() {
            let placed: HashSet<NodeId> = order.iter().copied().collect();
            let mut rest: Vec<NodeId> = pending.keys().filter(|id| !placed.contains(id)).copied().collect();
            rest.sort();
            order.extend(rest);
        }
        order
    }
}
