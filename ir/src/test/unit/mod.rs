mod compare;
mod graph;
mod provenance;
mod tree;
mod type_info;

use crate::graph::{Graph, NodeId};
use crate::ops::{Constant, Parameter};
use crate::shape::PartialShape;
use tessera_dtype::DType;

/// `f32` parameter of a static shape.
pub(crate) fn parameter(graph: &mut Graph, shape: &[usize]) -> NodeId {
    graph.add_node(Parameter::new(DType::Float32, PartialShape::from_static(shape)), &[]).unwrap()
}

/// `f32` constant of a static shape.
pub(crate) fn constant(graph: &mut Graph, shape: &[usize], values: &[f32]) -> NodeId {
    graph.add_node(Constant::from_slice(shape, values).unwrap(), &[]).unwrap()
}
