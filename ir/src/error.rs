use smallvec::SmallVec;
use snafu::Snafu;
use tessera_dtype::DType;

use crate::graph::NodeId;
use crate::shape::PartialShape;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // =========================================================================
    // Configuration errors (malformed registrations)
    // =========================================================================
    /// A parent chain revisits a type it already passed through.
    #[snafu(display("cyclic type hierarchy: {name} reaches itself through its parent chain {chain:?}"))]
    CyclicTypeHierarchy { name: String, chain: Vec<String> },

    /// A parent chain is longer than the castability walk supports.
    #[snafu(display("type hierarchy of {name} is deeper than {max_depth} levels"))]
    TypeHierarchyTooDeep { name: String, max_depth: usize },

    /// Replacement node exposes a different number of outputs.
    #[snafu(display("cannot replace {old} ({old_outputs} outputs) with {new} ({new_outputs} outputs)"))]
    ReplaceArityMismatch { old: NodeId, new: NodeId, old_outputs: usize, new_outputs: usize },

    /// A node cannot replace itself.
    #[snafu(display("cannot replace {node} with itself"))]
    ReplaceWithSelf { node: NodeId },

    // =========================================================================
    // Graph handle errors
    // =========================================================================
    /// Handle does not point at a live node.
    #[snafu(display("node {node} does not exist in this graph"))]
    NodeNotFound { node: NodeId },

    /// Output index past the producer's output count.
    #[snafu(display("{node} has {outputs} outputs, output {index} requested"))]
    OutputIndexOutOfRange { node: NodeId, index: usize, outputs: usize },

    /// Input index past the consumer's input count.
    #[snafu(display("{node} has {inputs} inputs, input {index} requested"))]
    InputIndexOutOfRange { node: NodeId, index: usize, inputs: usize },

    // =========================================================================
    // Operation contract violations (raised by `validate_and_infer`)
    // =========================================================================
    /// Wrong number of inputs for an operation.
    #[snafu(display("{op} expects {expected} inputs, got {actual}"))]
    InputCountMismatch { op: &'static str, expected: usize, actual: usize },

    /// Input element types differ where the operation requires them equal.
    #[snafu(display("{op}: dtype mismatch between {lhs} and {rhs}"))]
    DTypeMismatch { op: &'static str, lhs: DType, rhs: DType },

    /// Element type not accepted by an operation.
    #[snafu(display("{op}: input {index} has unsupported dtype {dtype}"))]
    UnsupportedDType { op: &'static str, index: usize, dtype: DType },

    /// Shapes cannot be broadcast together.
    #[snafu(display("cannot broadcast shapes {lhs} and {rhs}"))]
    BroadcastShapeMismatch { lhs: Box<PartialShape>, rhs: Box<PartialShape> },

    /// Rank requirement of an operation not met.
    #[snafu(display("{op}: input {index} must have rank {expected}, got {actual}"))]
    RankMismatch { op: &'static str, index: usize, expected: usize, actual: usize },

    /// Constant payload length does not match its shape.
    #[snafu(display("constant of shape {shape:?} needs {expected} values, got {actual}"))]
    ConstantSizeMismatch { shape: SmallVec<[usize; 4]>, expected: usize, actual: usize },

    /// Operation attribute out of its valid range.
    #[snafu(display("{op}: invalid attribute {attribute}: {reason}"))]
    InvalidAttribute { op: &'static str, attribute: &'static str, reason: String },
}
