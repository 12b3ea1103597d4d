use proptest::prelude::*;
use tessera_ir::prelude::*;

use crate::fake_quantize::FakeQuantizeTransformation;
use crate::test::unit::{boundaries, constant, fake_quantize, only_fake_quantize, parameter};

fn fold_once(op: impl Operation, k: f32, low: f32, high: f32) -> (bool, [f32; 2]) {
    let mut graph = Graph::new();
    let x = parameter(&mut graph, DType::Float32, &[1, 4]);
    let k = constant(&mut graph, &[1], &[k]);
    let eltwise = graph.add_node(op, &[x.output(0), k.output(0)]).unwrap();
    let fq = fake_quantize(&mut graph, eltwise.output(0), low, high);
    graph.add_result(fq.output(0)).unwrap();

    let changed = FakeQuantizeTransformation::default().run(&mut graph).unwrap();
    let [il, ih, ..] = boundaries(&graph, only_fake_quantize(&graph));
    (changed, [il[0], ih[0]])
}

proptest! {
    #[test]
    fn positive_scale_divides_interval(k in 1e-3f32..1e3, low in -1e3f32..0.0, high in 0.0f32..1e3) {
        let (changed, folded) = fold_once(Multiply::new(), k, low, high);
        prop_assert!(changed);
        prop_assert_eq!(folded, [low / k, high / k]);
    }

    #[test]
    fn non_positive_scale_is_kept(k in -1e3f32..=0.0, low in -1e3f32..0.0, high in 0.0f32..1e3) {
        let (changed, folded) = fold_once(Multiply::new(), k, low, high);
        prop_assert!(!changed);
        prop_assert_eq!(folded, [low, high]);
    }

    #[test]
    fn shifts_move_interval(k in -1e3f32..1e3, low in -1e3f32..0.0, high in 0.0f32..1e3) {
        let (_, subtracted) = fold_once(Subtract::new(), k, low, high);
        prop_assert_eq!(subtracted, [low + k, high + k]);

        let (_, added) = fold_once(Add::new(), k, low, high);
        prop_assert_eq!(added, [low - k, high - k]);
    }
}

proptest! {
    #[test]
    fn deq_precision_must_be_float(dtype in DType::any_generator()) {
        let built = crate::config::TransformationParams::builder().deq_precision(dtype).build();
        prop_assert_eq!(built.is_ok(), dtype.is_float());
    }
}
