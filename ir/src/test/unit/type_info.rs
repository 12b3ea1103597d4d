use test_case::test_case;

use crate::error::Error;
use crate::graph::Graph;
use crate::node::{KindView, Operation, OutputSlot, OutputSlots, as_type, is_type};
use crate::ops::*;
use crate::type_info::{MAX_HIERARCHY_DEPTH, NodeKind, TypeInfo};
use crate::types::AutoBroadcast;

static A: TypeInfo = TypeInfo::new("A", "test");
static B: TypeInfo = TypeInfo::with_parent("B", "test", &A);
static C: TypeInfo = TypeInfo::with_parent("C", "test", &B);

static LOOP_X: TypeInfo = TypeInfo::with_parent("LoopX", "test", &LOOP_Y);
static LOOP_Y: TypeInfo = TypeInfo::with_parent("LoopY", "test", &LOOP_X);

// =============================================================================
// Equality and ordering
// =============================================================================

#[test]
fn test_equality_is_exact() {
    assert_eq!(*Multiply::TYPE_INFO, TypeInfo::new("Multiply", "opset1"));
    assert_ne!(*Multiply::TYPE_INFO, TypeInfo::new("Multiply", "opset2"));
    assert_ne!(*Multiply::TYPE_INFO, *Add::TYPE_INFO);
}

#[test]
fn test_equality_ignores_parent() {
    let orphan = TypeInfo::new("B", "test");
    assert_eq!(B, orphan);
    assert!(B.is_castable(&A));
    assert!(!orphan.is_castable(&A));
}

#[test]
fn test_order_by_name_then_version() {
    let mut kinds = [TypeInfo::new("b", "v1"), TypeInfo::new("a", "v2"), TypeInfo::new("a", "v1")];
    kinds.sort();
    let names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
    assert_eq!(names, ["a_v1", "a_v2", "b_v1"]);
}

#[test_case(Multiply::TYPE_INFO, "Multiply_opset1"; "multiply")]
#[test_case(FakeQuantize::TYPE_INFO, "FakeQuantize_opset1"; "fake_quantize")]
#[test_case(ConvolutionBase::TYPE_INFO, "ConvolutionBase_util"; "abstract_base")]
#[test_case(Sink::TYPE_INFO, "Result_opset1"; "result")]
fn test_display(info: &TypeInfo, expected: &str) {
    assert_eq!(info.to_string(), expected);
    assert_eq!(info.version(), info.version_id);
}

// =============================================================================
// Castability
// =============================================================================

#[test]
fn test_cast_reachability() {
    assert!(C.is_castable(&A));
    assert!(C.is_castable(&B));
    assert!(C.is_castable(&C));
    assert!(B.is_castable(&A));
    assert!(!A.is_castable(&B));
    assert!(!A.is_castable(&C));
    assert!(!B.is_castable(&C));
}

#[test]
fn test_ancestors_walk_parent_chain() {
    let names: Vec<&str> = C.ancestors().map(|info| info.name).collect();
    assert_eq!(names, ["C", "B", "A"]);
}

#[test_case(Add::TYPE_INFO; "add")]
#[test_case(Subtract::TYPE_INFO; "subtract")]
#[test_case(Multiply::TYPE_INFO; "multiply")]
#[test_case(Divide::TYPE_INFO; "divide")]
fn test_arithmetic_family(info: &TypeInfo) {
    assert!(info.is_castable(BinaryElementwiseArithmetic::TYPE_INFO));
    assert!(!info.is_castable(ConvolutionBase::TYPE_INFO));
    assert!(!BinaryElementwiseArithmetic::TYPE_INFO.is_castable(info));
}

#[test_case(Convolution::TYPE_INFO; "convolution")]
#[test_case(GroupConvolution::TYPE_INFO; "group_convolution")]
#[test_case(ConvolutionBackpropData::TYPE_INFO; "backprop")]
#[test_case(GroupConvolutionBackpropData::TYPE_INFO; "group_backprop")]
fn test_convolution_family(info: &TypeInfo) {
    assert!(info.is_castable(ConvolutionBase::TYPE_INFO));
    assert!(!info.is_castable(BinaryElementwiseArithmetic::TYPE_INFO));
}

#[test]
fn test_cyclic_chain_rejected_and_bounded() {
    let err = LOOP_X.validate().unwrap_err();
    assert!(matches!(err, Error::CyclicTypeHierarchy { .. }), "{err}");
    // Query-time walk still terminates.
    assert!(!LOOP_X.is_castable(&A));
    assert!(LOOP_X.is_castable(&LOOP_Y));
}

#[test]
fn test_too_deep_chain_rejected() {
    let mut info: &'static TypeInfo = Box::leak(Box::new(TypeInfo::new("L0", "deep")));
    for depth in 1..=MAX_HIERARCHY_DEPTH {
        let name: &'static str = Box::leak(format!("L{depth}").into_boxed_str());
        info = Box::leak(Box::new(TypeInfo::with_parent(name, "deep", info)));
    }
    assert!(matches!(info.validate(), Err(Error::TypeHierarchyTooDeep { .. })));
}

// =============================================================================
// Typed views
// =============================================================================

#[test]
fn test_view_as_parent_block() {
    let op = Multiply::with_broadcast(AutoBroadcast::None);
    let base = as_type::<BinaryElementwiseArithmetic>(&op).unwrap();
    assert_eq!(base.auto_broadcast, AutoBroadcast::None);
    assert!(as_type::<Multiply>(&op).is_some());
}

#[test]
fn test_view_as_unrelated_kind_is_none() {
    let op = Relu;
    assert!(!is_type::<Add>(&op));
    assert!(as_type::<Add>(&op).is_none());
    assert!(as_type::<BinaryElementwiseArithmetic>(&op).is_none());
}

#[test]
fn test_view_convolution_base() {
    let op = GroupConvolution::new(ConvolutionBase { strides: [2, 2].into(), ..Default::default() });
    let base = as_type::<ConvolutionBase>(&op).unwrap();
    assert_eq!(base.strides.as_slice(), &[2, 2]);
    assert!(as_type::<Convolution>(&op).is_none());
}

// =============================================================================
// Registration-time validation
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Looped;

impl NodeKind for Looped {
    const TYPE_INFO: &'static TypeInfo = &LOOP_X;
}

impl KindView for Looped {
    fn type_info(&self) -> &'static TypeInfo {
        Self::TYPE_INFO
    }

    fn view(&self, target: &TypeInfo) -> Option<&dyn std::any::Any> {
        (target == Self::TYPE_INFO).then_some(self as &dyn std::any::Any)
    }
}

impl Operation for Looped {
    fn validate_and_infer(&self, _inputs: &[OutputSlot]) -> crate::error::Result<OutputSlots> {
        Ok(OutputSlots::new())
    }
}

#[test]
fn test_cyclic_kind_rejected_when_added() {
    let mut graph = Graph::new();
    let err = graph.add_node(Looped, &[]).unwrap_err();
    assert!(matches!(err, Error::CyclicTypeHierarchy { .. }));
    assert!(graph.is_empty());
}
