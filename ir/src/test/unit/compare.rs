use super::{constant, parameter};
use crate::compare::{CompareOptions, compare};
use crate::graph::Graph;
use crate::ops::*;

fn scaled(scale: f32) -> Graph {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[1, 3]);
    let k = constant(&mut graph, &[1], &[scale]);
    let mul = graph.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();
    let relu = graph.add_node(Relu, &[mul.output(0)]).unwrap();
    graph.add_result(relu.output(0)).unwrap();
    graph
}

#[test]
fn test_equal_graphs() {
    assert_eq!(compare(&scaled(2.0), &scaled(2.0), CompareOptions::default()), Ok(()));
}

#[test]
fn test_constant_values_differ() {
    let mismatch = compare(&scaled(2.0), &scaled(3.0), CompareOptions::default()).unwrap_err();
    assert!(mismatch.reason.starts_with("attributes"), "{mismatch}");
}

#[test]
fn test_ids_may_differ() {
    let lhs = scaled(2.0);
    let mut rhs = Graph::new();
    // Same structure, different creation order.
    let k = constant(&mut rhs, &[1], &[2.0]);
    let x = parameter(&mut rhs, &[1, 3]);
    let mul = rhs.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();
    let relu = rhs.add_node(Relu, &[mul.output(0)]).unwrap();
    rhs.add_result(relu.output(0)).unwrap();

    assert_eq!(compare(&lhs, &rhs, CompareOptions::default()), Ok(()));
    let mismatch = compare(&lhs, &rhs, CompareOptions { friendly_names: true }).unwrap_err();
    assert!(mismatch.reason.starts_with("name"), "{mismatch}");
}

#[test]
fn test_kind_differs() {
    let lhs = scaled(2.0);
    let mut rhs = Graph::new();
    let x = parameter(&mut rhs, &[1, 3]);
    let k = constant(&mut rhs, &[1], &[2.0]);
    let add = rhs.add_node(Add::new(), &[x.output(0), k.output(0)]).unwrap();
    let relu = rhs.add_node(Relu, &[add.output(0)]).unwrap();
    rhs.add_result(relu.output(0)).unwrap();

    let mismatch = compare(&lhs, &rhs, CompareOptions::default()).unwrap_err();
    assert_eq!(mismatch.reason, "kind Multiply_opset1 vs Add_opset1");
}
