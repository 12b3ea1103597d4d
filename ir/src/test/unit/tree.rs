use super::{constant, parameter};
use crate::graph::Graph;
use crate::ops::*;
use crate::tree::render_tree;

#[test]
fn test_render_shared_producer_once() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[1, 3]);
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let mul = graph.add_node(Multiply::new(), &[relu.output(0), relu.output(0)]).unwrap();
    let sink = graph.add_result(mul.output(0)).unwrap();

    let tree = render_tree(&graph, sink);
    assert!(tree.contains("Result"));
    assert!(tree.contains("Multiply 'Multiply_2' : f32[1,3] broadcast=numpy"), "{tree}");
    assert_eq!(tree.matches("Relu 'Relu_1'").count(), 1, "{tree}");
    assert!(tree.contains(&format!("[{relu}] → (see above)")), "{tree}");
}

#[test]
fn test_graph_tree_covers_every_result() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[2]);
    let k = constant(&mut graph, &[1], &[0.5]);
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();
    graph.add_result(relu.output(0)).unwrap();
    graph.add_result(k.output(0)).unwrap();

    let tree = graph.tree();
    assert_eq!(tree.matches("] Result '").count(), 2, "{tree}");
    assert!(tree.contains("[0.5]"), "{tree}");
}
