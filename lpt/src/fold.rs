//! Compile-time folding of constant tensors.
//!
//! All arithmetic is done in `f32` and produces `f32` constants, whatever the
//! element types of the operands.

use tessera_dtype::DType;
use tessera_ir::graph::{Graph, Output};
use tessera_ir::ops::Constant;
use tessera_ir::shape::{PartialShape, align_left, broadcast_static, shape_size};
use tessera_ir::{ConstValue, Result};

/// The constant behind `output`, if its producer is a `Constant` node.
pub fn constant_at(graph: &Graph, output: Output) -> Option<&Constant> {
    graph.get(output.node)?.as_type::<Constant>()
}

/// `constant` converted to `dtype`.
pub fn fold_convert(constant: &Constant, dtype: DType) -> Constant {
    constant.cast(dtype)
}

/// Elementwise `op(lhs, rhs)` with numpy broadcasting.
pub fn fold_binary(lhs: &Constant, rhs: &Constant, op: impl Fn(f32, f32) -> f32) -> Result<Constant> {
    let shape = broadcast_static(lhs.shape(), rhs.shape())?;
    let rank = shape.len();
    let (lhs_shape, rhs_shape) = (align_left(lhs.shape(), rank), align_left(rhs.shape(), rank));
    let (lhs_values, rhs_values) = (lhs.to_f32_vec(), rhs.to_f32_vec());

    let values = (0..shape_size(&shape)).map(|flat| {
        let l = lhs_values[source_index(flat, &shape, &lhs_shape)];
        let r = rhs_values[source_index(flat, &shape, &rhs_shape)];
        ConstValue::from(op(l, r))
    });
    Constant::new(DType::Float32, &shape, values)
}

/// Row-major index into an operand of `source` shape (already aligned to the
/// rank of `target`) for flat position `flat` of the broadcast result.
fn source_index(mut flat: usize, target: &[usize], source: &[usize]) -> usize {
    let mut index = 0;
    let mut stride = 1;
    for (&dim, &src) in target.iter().zip(source).rev() {
        let coord = flat % dim;
        flat /= dim;
        if src != 1 {
            index += coord * stride;
        }
        stride *= src;
    }
    index
}

/// Give a folded boundary one leading unit dimension when its rank is above 1
/// but below the rank of the quantized output.
pub fn update_shape(constant: Constant, target: &PartialShape) -> Result<Constant> {
    let rank = constant.shape().len();
    match target.rank() {
        Some(target_rank) if rank > 1 && rank < target_rank => {
            let mut shape = Vec::with_capacity(rank + 1);
            shape.push(1);
            shape.extend_from_slice(constant.shape());
            constant.reshape(&shape)
        }
        _ => Ok(constant),
    }
}
