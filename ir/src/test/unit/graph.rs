use smallvec::smallvec;
use tessera_dtype::DType;

use super::{constant, parameter};
use crate::error::{Error, Result};
use crate::graph::{Graph, Input, NodeId};
use crate::node::{Operation, OutputSlot, OutputSlots};
use crate::ops::*;
use crate::shape::PartialShape;

/// Two-output test operation.
#[derive(Debug, Clone, PartialEq)]
struct Split2;

crate::node_kind!(Split2, "Split2", "test");

impl Operation for Split2 {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        Ok(smallvec![inputs[0].clone(), inputs[0].clone()])
    }
}

#[test]
fn test_add_infers_outputs_and_names() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[1, 3, 4, 4]);
    let k = constant(&mut graph, &[1, 3, 1, 1], &[1.0, 2.0, 3.0]);
    let mul = graph.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();

    let node = graph.node(mul).unwrap();
    assert_eq!(node.outputs(), &[OutputSlot::new(DType::Float32, PartialShape::from_static(&[1, 3, 4, 4]))]);
    assert_eq!(node.friendly_name(), format!("Multiply_{}", mul.index()));
    assert_eq!(graph.parameters(), &[x]);
}

#[test]
fn test_add_rejects_invalid_inputs() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[2, 3]);
    let i = graph.add_node(Constant::from_slice(&[1], &[1i32]).unwrap(), &[]).unwrap();
    let y = parameter(&mut graph, &[4, 3]);

    let err = graph.add_node(Add::new(), &[x.output(0), i.output(0)]).unwrap_err();
    assert!(matches!(err, Error::DTypeMismatch { op: "Add", .. }), "{err}");

    let err = graph.add_node(Add::new(), &[x.output(0), y.output(0)]).unwrap_err();
    assert!(matches!(err, Error::BroadcastShapeMismatch { .. }), "{err}");

    let err = graph.add_node(Relu, &[x.output(0), y.output(0)]).unwrap_err();
    assert!(matches!(err, Error::InputCountMismatch { expected: 1, actual: 2, .. }));

    let err = graph.add_node(Relu, &[x.output(1)]).unwrap_err();
    assert!(matches!(err, Error::OutputIndexOutOfRange { index: 1, outputs: 1, .. }));
}

#[test]
fn test_stale_handle() {
    let graph = Graph::new();
    assert!(matches!(graph.node(NodeId(7)), Err(Error::NodeNotFound { .. })));
    assert!(graph.get(NodeId(7)).is_none());
}

#[test]
fn test_consumers() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let a = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let b = graph.add_node(Add::new(), &[x.output(0), a.output(0)]).unwrap();
    let c = graph.add_node(Multiply::new(), &[b.output(0), b.output(0)]).unwrap();

    assert_eq!(graph.consumers(x.output(0)), vec![Input { node: a, index: 0 }, Input { node: b, index: 0 }]);
    assert_eq!(graph.consumers(b.output(0)), vec![Input { node: c, index: 0 }, Input { node: c, index: 1 }]);
    assert!(graph.consumers(c.output(0)).is_empty());
    assert_eq!(graph.input_node(b, 1).unwrap().id(), a);
}

#[test]
fn test_replace_redirects_every_consumer() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let add = graph.add_node(Add::new(), &[old.output(0), old.output(0)]).unwrap();
    let sink = graph.add_result(old.output(0)).unwrap();
    let new = graph.add_node(Relu, &[x.output(0)]).unwrap();

    graph.replace(old, new).unwrap();

    assert!(graph.node_consumers(old).is_empty());
    assert_eq!(graph.node(add).unwrap().inputs(), &[new.output(0), new.output(0)]);
    assert_eq!(graph.node(sink).unwrap().inputs(), &[new.output(0)]);
    assert_eq!(graph.node_consumers(new).len(), 3);
}

#[test]
fn test_replace_keeps_edges_of_new_on_old() {
    // A wrapper inserted after `old` keeps reading it.
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let sink = graph.add_result(old.output(0)).unwrap();
    let wrapper = graph.add_node(Relu, &[old.output(0)]).unwrap();

    graph.replace(old, wrapper).unwrap();

    assert_eq!(graph.node(wrapper).unwrap().inputs(), &[old.output(0)]);
    assert_eq!(graph.node(sink).unwrap().inputs(), &[wrapper.output(0)]);
}

#[test]
fn test_replace_preserves_output_index() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Split2, &[x.output(0)]).unwrap();
    let sink = graph.add_result(old.output(1)).unwrap();
    let new = graph.add_node(Split2, &[x.output(0)]).unwrap();

    graph.replace(old, new).unwrap();
    assert_eq!(graph.node(sink).unwrap().inputs(), &[new.output(1)]);
}

#[test]
fn test_replace_arity_mismatch_is_fatal() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let split = graph.add_node(Split2, &[x.output(0)]).unwrap();
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let sink = graph.add_result(split.output(0)).unwrap();

    let err = graph.replace(split, relu).unwrap_err();
    assert!(matches!(err, Error::ReplaceArityMismatch { old_outputs: 2, new_outputs: 1, .. }), "{err}");
    // Nothing was rewired.
    assert_eq!(graph.node(sink).unwrap().inputs(), &[split.output(0)]);
}

#[test]
fn test_replace_with_self_is_fatal() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    assert!(matches!(graph.replace(x, x), Err(Error::ReplaceWithSelf { .. })));
}

#[test]
fn test_eliminate_dead_nodes() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let k = constant(&mut graph, &[1], &[2.0]);
    let mul = graph.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();
    let sink = graph.add_result(mul.output(0)).unwrap();
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();

    graph.replace(mul, relu).unwrap();
    let removed = graph.eliminate_dead_nodes();

    // `mul` and the constant only it consumed.
    assert_eq!(removed, 2);
    assert!(!graph.contains(mul));
    assert!(!graph.contains(k));
    assert!(graph.contains(x));
    assert_eq!(graph.node(sink).unwrap().inputs(), &[relu.output(0)]);
    assert_eq!(graph.results(), &[sink]);
}

#[test]
fn test_unused_parameter_survives_elimination() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    assert_eq!(graph.eliminate_dead_nodes(), 0);
    assert!(graph.contains(x));
}

#[test]
fn test_topological_order() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let sink = graph.add_result(old.output(0)).unwrap();
    let new = graph.add_node(Relu, &[x.output(0)]).unwrap();
    graph.replace(old, new).unwrap();

    // `sink` now reads a node created after it.
    assert_eq!(graph.topological_order(), vec![x, old, new, sink]);
}

#[test]
fn test_clone_with_new_inputs() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[1, 3, 4, 4]);
    let y = parameter(&mut graph, &[1, 3, 4, 4]);
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();

    let clone = graph.clone_with_new_inputs(relu, &[y.output(0)]).unwrap();
    let node = graph.node(clone).unwrap();
    assert!(node.is_type::<Relu>());
    assert_eq!(node.inputs(), &[y.output(0)]);
    assert_ne!(clone, relu);
}

#[test]
fn test_nodes_of_uses_castability() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let k = constant(&mut graph, &[1], &[2.0]);
    graph.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();
    graph.add_node(Subtract::new(), &[x.output(0), k.output(0)]).unwrap();
    graph.add_node(Relu, &[x.output(0)]).unwrap();

    assert_eq!(graph.nodes_of::<BinaryElementwiseArithmetic>().count(), 2);
    assert_eq!(graph.nodes_of::<Multiply>().count(), 1);
    assert_eq!(graph.len(), 5);
}
