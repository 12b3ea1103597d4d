
use tessera_dtype::DType;
use tessera_ir::graph::{Graph, NodeId, Output};
use tessera_ir::ops::{Constant, FakeQuantize, Parameter};
use tessera_ir::shape::PartialShape;

use crate::fold::constant_at;

pub(crate) fn parameter(graph: &mut Graph, dtype: DType, shape: &[usize]) -> NodeId {
    graph.add_node(Parameter::new(dtype, PartialShape::from_static(shape)), &[]).unwrap()
}

/// `f32` constant of a static shape.
pub(crate) fn constant(graph: &mut Graph, shape: &[usize], values: &[f32]) -> NodeId {
    graph.add_node(Constant::from_slice(shape, values).unwrap(), &[]).unwrap()
}

/// 256-level FakeQuantize over `data` with input interval `[low, high]` and
/// output interval `[0, 255]`, all of shape `[1]`.
pub(crate) fn fake_quantize(graph: &mut Graph, data: Output, low: f32, high: f32) -> NodeId {
    let il = constant(graph, &[1], &[low]);
    let ih = constant(graph, &[1], &[high]);
    let ol = constant(graph, &[1], &[0.0]);
    let oh = constant(graph, &[1], &[255.0]);
    let inputs = [data, il.output(0), ih.output(0), ol.output(0), oh.output(0)];
    graph.add_node(FakeQuantize::new(256), &inputs).unwrap()
}

/// The interval constant feeding input `index` of `fake_quantize`.
pub(crate) fn boundary(graph: &Graph, fake_quantize: NodeId, index: usize) -> &Constant {
    constant_at(graph, graph.input_value(fake_quantize, index).unwrap()).unwrap()
}

/// `[il, ih, ol, oh]` of `fake_quantize` as `f32` values.
pub(crate) fn boundaries(graph: &Graph, fake_quantize: NodeId) -> [Vec<f32>; 4] {
    [FakeQuantize::INPUT_LOW, FakeQuantize::INPUT_HIGH, FakeQuantize::OUTPUT_LOW, FakeQuantize::OUTPUT_HIGH]
        .map(|index| boundary(graph, fake_quantize, index).to_f32_vec())
}

/// The single FakeQuantize left in `graph`.
pub(crate) fn only_fake_quantize(graph: &Graph) -> NodeId {
    let mut nodes = graph.nodes_of::<FakeQuantize>();
    let node = nodes.next().expect("no FakeQuantize in graph").id();
    assert!(nodes.next().is_none(), "more than one FakeQuantize in graph");
    node
}
