//! Unit tests for provenance tracking.

use std::panic::Location;

use super::{constant, parameter};
use crate::graph::Graph;
use crate::ops::*;
use crate::provenance::{PassName, ProvenanceEvent, format_chain, get_relative_location};

#[test]
fn test_created_event_points_at_caller() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();

    let events = graph.node(relu).unwrap().provenance().events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ProvenanceEvent::Created { location } => {
            assert!(location.file.ends_with("provenance.rs"), "{}", location.file);
            assert!(location.line > 0);
        }
        other => panic!("expected Created event, got {other}"),
    }
}

#[test]
fn test_replace_merges_history() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Relu, &[x.output(0)]).unwrap();
    graph.set_friendly_name(old, "activation").unwrap();
    graph.add_result(old.output(0)).unwrap();
    let new = graph.add_node(Relu, &[x.output(0)]).unwrap();

    graph.replace(old, new).unwrap();

    let provenance = graph.node(new).unwrap().provenance();
    assert_eq!(provenance.fused_names().collect::<Vec<_>>(), ["activation"]);
    assert!(provenance.events().iter().any(|event| matches!(
        event,
        ProvenanceEvent::Replaced { from, from_name, pass } if *from == old && from_name == "activation" && *pass == PassName::REPLACE
    )));
}

#[test]
fn test_fused_names_name_original_nodes() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let k = constant(&mut graph, &[1], &[2.0]);
    let mul = graph.add_node(Multiply::new(), &[x.output(0), k.output(0)]).unwrap();
    graph.set_friendly_name(mul, "scale").unwrap();
    let add = graph.add_node(Add::new(), &[x.output(0), k.output(0)]).unwrap();
    graph.set_friendly_name(add, "shift").unwrap();
    let relu = graph.add_node(Relu, &[x.output(0)]).unwrap();

    // First merge: `add` absorbs `mul`.
    graph.copy_provenance(&[mul], add).unwrap();
    // Second merge carries `scale` through, not the intermediate name.
    graph.copy_provenance(&[add, relu], relu).unwrap();

    let names: Vec<&str> = graph.node(relu).unwrap().provenance().fused_names().collect();
    assert_eq!(names, ["scale"]);
}

#[test]
fn test_format_chain_lists_events() {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, &[4]);
    let old = graph.add_node(Relu, &[x.output(0)]).unwrap();
    let new = graph.add_node(Relu, &[x.output(0)]).unwrap();
    graph.replace(old, new).unwrap();

    let chain = format_chain(graph.node(new).unwrap().provenance());
    assert!(chain.contains("[0] created at"));
    assert!(chain.contains(&format!("replaced {old}")));
}

#[test]
fn test_relative_location() {
    let location = get_relative_location(Location::caller());
    assert!(location.starts_with("ir/src/") || location.starts_with("ir\\src\\"), "{location}");
}
