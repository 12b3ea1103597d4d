//! Nodes and the operation trait.
//!
//! A [`Node`] is the graph's record for one operation instance: the operation
//! itself (a boxed [`Operation`]), its input edges, its inferred output slots,
//! a friendly name and accumulated provenance. Nodes do not own their producers;
//! edges are [`Output`] handles into the graph arena.

use std::any::Any;
use std::fmt;

use smallvec::SmallVec;
use tessera_dtype::DType;

use crate::error::Result;
use crate::graph::{NodeId, Output};
use crate::provenance::Provenance;
use crate::shape::PartialShape;
use crate::type_info::{NodeKind, TypeInfo};

/// Element type and shape of one output slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputSlot {
    pub dtype: DType,
    pub shape: PartialShape,
}

impl OutputSlot {
    pub fn new(dtype: DType, shape: impl Into<PartialShape>) -> Self {
        Self { dtype, shape: shape.into() }
    }
}

impl fmt::Display for OutputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dtype, self.shape)
    }
}

pub type OutputSlots = SmallVec<[OutputSlot; 1]>;

/// Identity lookup and typed views, shared by concrete operations and the
/// abstract attribute blocks they embed.
pub trait KindView: 'static {
    fn type_info(&self) -> &'static TypeInfo;

    /// View `self` as the kind identified by `target`.
    ///
    /// Returns `self` when `target` is this kind's own identity and delegates to
    /// the embedded parent block otherwise. Callers go through [`as_type`], which
    /// checks castability first.
    fn view(&self, target: &TypeInfo) -> Option<&dyn Any>;
}

/// Object-safe cloning and attribute comparison, implemented for every
/// `Operation + Clone + PartialEq`.
pub trait OperationClone {
    fn clone_box(&self) -> Box<dyn Operation>;

    /// True when `other` is the exact same kind with equal attributes.
    fn attributes_eq(&self, other: &dyn Operation) -> bool;
}

impl<T> OperationClone for T
where
    T: Operation + NodeKind + Clone + PartialEq,
{
    fn clone_box(&self) -> Box<dyn Operation> {
        Box::new(self.clone())
    }

    fn attributes_eq(&self, other: &dyn Operation) -> bool {
        other.type_info() == T::TYPE_INFO && as_type::<T>(other).is_some_and(|other| self == other)
    }
}

/// An operation kind.
///
/// The operation owns its arity and element-type contract: the graph calls
/// [`Operation::validate_and_infer`] with the resolved input slots whenever a
/// node is created, and stores the returned output slots.
pub trait Operation: KindView + OperationClone + fmt::Debug {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots>;

    /// Short attribute summary for graph dumps.
    fn describe(&self) -> String {
        String::new()
    }
}

impl Clone for Box<dyn Operation> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Whether `op` can be viewed as kind `T`.
pub fn is_type<T: NodeKind>(op: &dyn Operation) -> bool {
    op.type_info().is_castable(T::TYPE_INFO)
}

/// View `op` as kind `T`, or `None` when its identity is not castable to `T`.
pub fn as_type<T: NodeKind>(op: &dyn Operation) -> Option<&T> {
    if !is_type::<T>(op) {
        return None;
    }
    op.view(T::TYPE_INFO)?.downcast_ref::<T>()
}

/// A node stored in the graph arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) op: Box<dyn Operation>,
    pub(crate) inputs: SmallVec<[Output; 4]>,
    pub(crate) outputs: OutputSlots,
    pub(crate) friendly_name: String,
    pub(crate) provenance: Provenance,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op(&self) -> &dyn Operation {
        self.op.as_ref()
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.op.type_info()
    }

    pub fn is_type<T: NodeKind>(&self) -> bool {
        is_type::<T>(self.op())
    }

    pub fn as_type<T: NodeKind>(&self) -> Option<&T> {
        as_type::<T>(self.op())
    }

    pub fn inputs(&self) -> &[Output] {
        &self.inputs
    }

    pub fn input(&self, index: usize) -> Option<Output> {
        self.inputs.get(index).copied()
    }

    pub fn outputs(&self) -> &[OutputSlot] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Output {
        self.id.output(index)
    }

    pub fn output_dtype(&self, index: usize) -> Option<DType> {
        self.outputs.get(index).map(|slot| slot.dtype)
    }

    pub fn output_shape(&self, index: usize) -> Option<&PartialShape> {
        self.outputs.get(index).map(|slot| &slot.shape)
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} '{}'", self.id, self.type_info().name, self.friendly_name)
    }
}
