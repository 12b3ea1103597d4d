//! FakeQuantize elementwise fusion.
//!
//! Folds the scale, shift, bias and convert nodes that feed a `FakeQuantize`
//! into its input interval, one producer at a time, until the producer is no
//! longer foldable:
//!
//! ```text
//! x -> Multiply(k) -> FakeQuantize(il, ih, ol, oh)
//!   =>  x -> FakeQuantize(il / k, ih / k, ol, oh)
//! ```
//!
//! | producer | input interval becomes |
//! |---|---|
//! | `Multiply(k)`, `k > 0` | `[il / k, ih / k]` |
//! | `Subtract(k)` | `[il + k, ih + k]` |
//! | `Add(k)` | `[il - k, ih - k]` |
//! | `Convert` | unchanged |

use snafu::ResultExt;
use strum::{Display, IntoStaticStr};
use tessera_dtype::DType;
use tessera_ir::graph::{Graph, NodeId, Output};
use tessera_ir::ops::{Add, Constant, ConvolutionBase, Convert, FakeQuantize, Multiply, Subtract};
use tessera_ir::shape::align_left;
use tessera_ir::{GraphRewrite, Node, Pattern, Rewrite, RewriteContext};

use crate::config::TransformationParams;
use crate::error::*;
use crate::fold::{constant_at, fold_binary, fold_convert, update_shape};

/// Why a fusion step did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DeclineReason {
    /// A boundary input is not produced by a constant.
    UnsupportedLayout,
    /// The data producer is not a foldable kind.
    NotElementwise,
    /// The producer has no constant operand.
    NoConstantOperand,
    /// Both operands of the producer are constants.
    NoDataOperand,
    /// The constant is neither a single value nor a per-channel vector.
    UnsupportedBroadcast,
    /// A scale is zero, negative or NaN.
    NonPositiveScale,
    /// Folding produced an infinite or NaN boundary.
    NonFiniteBoundary,
    /// The producer is a bias add on a convolution output.
    ConvolutionBias,
    /// `i32 -> f16/f32` conversions are kept.
    ExcludedConvert,
    /// The Convert source type cannot feed a FakeQuantize.
    UnsupportedDataType,
    /// Fusion is turned off in the parameters.
    Disabled,
}

/// Outcome of one fusion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// The producer was folded; the argument is the replacement FakeQuantize.
    Fused(NodeId),
    Declined(DeclineReason),
}

/// Early exit of a fusion step: a decline or a structural error.
enum Stop {
    Decline(DeclineReason),
    Fatal(tessera_ir::Error),
}

impl From<DeclineReason> for Stop {
    fn from(reason: DeclineReason) -> Self {
        Self::Decline(reason)
    }
}

impl From<tessera_ir::Error> for Stop {
    fn from(error: tessera_ir::Error) -> Self {
        Self::Fatal(error)
    }
}

/// Data edge and constant operand of a foldable binary producer.
struct Operands<'g> {
    data: Output,
    constant: &'g Constant,
}

#[derive(Debug, Clone, Default)]
pub struct FakeQuantizeTransformation {
    params: TransformationParams,
}

impl FakeQuantizeTransformation {
    pub const NAME: &'static str = "FakeQuantizeTransformation";

    pub fn new(params: TransformationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TransformationParams {
        &self.params
    }

    /// Register the fusion as a pass on every `FakeQuantize`.
    pub fn register<'a>(&'a self, rewrite: &mut GraphRewrite<'a>) -> Result<()> {
        rewrite
            .register_pass(Self::NAME, Pattern::kind::<FakeQuantize>(), |ctx| self.transform(ctx))
            .context(IrSnafu)?;
        Ok(())
    }

    /// Run the fusion alone over `graph`. Returns whether anything was fused.
    ///
    /// Replaced quantization nodes and their folded producers are removed
    /// afterwards, so a second run over the result reports no change.
    pub fn run(&self, graph: &mut Graph) -> Result<bool> {
        let mut rewrite = GraphRewrite::new();
        self.register(&mut rewrite)?;
        let changed = rewrite.run(graph).context(IrSnafu)?;
        if changed {
            graph.eliminate_dead_nodes();
        }
        Ok(changed)
    }

    /// Fuse producers into the matched FakeQuantize until none is foldable.
    #[tracing::instrument(skip_all, fields(node.id = %ctx.root()))]
    pub fn transform(&self, ctx: &mut RewriteContext<'_>) -> tessera_ir::Result<Rewrite> {
        if !self.params.fake_quantize_fusion {
            return Ok(Rewrite::Declined(DeclineReason::Disabled.into()));
        }
        let mut fake_quantize = ctx.root();
        if !output_layout_is_supported(ctx.graph(), fake_quantize)? {
            tracing::trace!(reason = %DeclineReason::UnsupportedLayout, "fusion declined");
            return Ok(Rewrite::Declined(DeclineReason::UnsupportedLayout.into()));
        }

        let mut fused = 0usize;
        let reason = loop {
            match self.fuse_elementwise(ctx, fake_quantize)? {
                Fold::Fused(new) => {
                    fake_quantize = new;
                    fused += 1;
                }
                Fold::Declined(reason) => break reason,
            }
        };

        tracing::trace!(fused, stop = %reason, "fusion finished");
        if fused > 0 { Ok(Rewrite::Applied) } else { Ok(Rewrite::Declined(reason.into())) }
    }

    /// Try to fold the producer of `fake_quantize`'s data input into it.
    pub fn fuse_elementwise(&self, ctx: &mut RewriteContext<'_>, fake_quantize: NodeId) -> tessera_ir::Result<Fold> {
        match self.try_fuse(ctx, fake_quantize) {
            Ok(new) => Ok(Fold::Fused(new)),
            Err(Stop::Decline(reason)) => Ok(Fold::Declined(reason)),
            Err(Stop::Fatal(error)) => Err(error),
        }
    }

    /// Low precision consumers may not treat this node as keeping precision.
    pub fn is_precision_preserved(&self, _node: &Node) -> bool {
        false
    }

    fn try_fuse(&self, ctx: &mut RewriteContext<'_>, fake_quantize: NodeId) -> Result<NodeId, Stop> {
        let graph = ctx.graph();
        let fq_node = graph.node(fake_quantize)?;
        let fq_op = *fq_node.as_type::<FakeQuantize>().ok_or(DeclineReason::UnsupportedLayout)?;
        let output_shape = fq_node.outputs()[0].shape.clone();
        let output_dtype = fq_node.outputs()[0].dtype;

        let eltwise = graph.input_node(fake_quantize, FakeQuantize::DATA)?;
        let input_low = fold_convert(boundary(graph, fake_quantize, FakeQuantize::INPUT_LOW)?, DType::Float32);
        let input_high = fold_convert(boundary(graph, fake_quantize, FakeQuantize::INPUT_HIGH)?, DType::Float32);

        let (data, input_low, input_high) = if eltwise.is_type::<Multiply>() {
            let Operands { data, constant } = check_elementwise(graph, eltwise)?;
            let scale = fold_convert(constant, DType::Float32);
            if scale.to_f32_vec().iter().any(|&k| k.is_nan() || k <= 0.0) {
                return Err(DeclineReason::NonPositiveScale.into());
            }
            let low = fold_binary(&input_low, &scale, |a, b| a / b)?;
            let high = fold_binary(&input_high, &scale, |a, b| a / b)?;
            if low.to_f32_vec().iter().chain(&high.to_f32_vec()).any(|v| !v.is_finite()) {
                return Err(DeclineReason::NonFiniteBoundary.into());
            }
            (data, update_shape(low, &output_shape)?, update_shape(high, &output_shape)?)
        } else if eltwise.is_type::<Subtract>() {
            let Operands { data, constant } = check_elementwise(graph, eltwise)?;
            let shift = fold_convert(constant, DType::Float32);
            let low = fold_binary(&input_low, &shift, |a, b| a + b)?;
            let high = fold_binary(&input_high, &shift, |a, b| a + b)?;
            (data, update_shape(low, &output_shape)?, update_shape(high, &output_shape)?)
        } else if eltwise.is_type::<Add>() {
            let Operands { data, constant } = check_elementwise(graph, eltwise)?;
            if graph.node(data.node)?.is_type::<ConvolutionBase>() {
                return Err(DeclineReason::ConvolutionBias.into());
            }
            let bias = fold_convert(constant, DType::Float32);
            let low = fold_binary(&input_low, &bias, |a, b| a - b)?;
            let high = fold_binary(&input_high, &bias, |a, b| a - b)?;
            (data, update_shape(low, &output_shape)?, update_shape(high, &output_shape)?)
        } else if let Some(convert) = eltwise.as_type::<Convert>() {
            let data = graph.input_value(eltwise.id(), 0)?;
            let source = graph.slot(data)?.dtype;
            if !source.is_float() && !source.is_int() {
                return Err(DeclineReason::UnsupportedDataType.into());
            }
            if source == DType::Int32 && matches!(convert.destination, DType::Float16 | DType::Float32) {
                return Err(DeclineReason::ExcludedConvert.into());
            }
            (data, input_low, input_high)
        } else {
            return Err(DeclineReason::NotElementwise.into());
        };

        let deq_precision = self.params.deq_precision;
        let output_low = fold_convert(boundary(graph, fake_quantize, FakeQuantize::OUTPUT_LOW)?, deq_precision);
        let output_high = fold_convert(boundary(graph, fake_quantize, FakeQuantize::OUTPUT_HIGH)?, deq_precision);

        // Consumers keep seeing the original element type even when the new
        // data input (e.g. the source of a Convert) has another one.
        let mut op = fq_op;
        if graph.slot(data)?.dtype != output_dtype {
            op.output_type = Some(output_dtype);
        }

        let friendly_name = fq_node.friendly_name().to_string();
        let eltwise_id = eltwise.id();
        let eltwise_kind = eltwise.type_info();

        let graph = ctx.graph_mut();
        let boundaries = [input_low, input_high, output_low, output_high]
            .into_iter()
            .map(|constant| graph.add_node(constant, &[]).map(|id| id.output(0)))
            .collect::<tessera_ir::Result<Vec<_>>>()?;
        let inputs = [data, boundaries[0], boundaries[1], boundaries[2], boundaries[3]];
        let new = graph.add_node(op, &inputs)?;

        ctx.register_new_node(new);
        ctx.replace(fake_quantize, new)?;
        let graph = ctx.graph_mut();
        graph.copy_provenance(&[eltwise_id], new)?;
        graph.set_friendly_name(new, friendly_name)?;

        tracing::debug!(old = %fake_quantize, new = %new, folded = %eltwise_kind, "producer fused into FakeQuantize");
        Ok(new)
    }
}

/// Every interval boundary of `fake_quantize` is a constant.
fn output_layout_is_supported(graph: &Graph, fake_quantize: NodeId) -> tessera_ir::Result<bool> {
    for index in FakeQuantize::INPUT_LOW..=FakeQuantize::OUTPUT_HIGH {
        if !graph.input_node(fake_quantize, index)?.is_type::<Constant>() {
            return Ok(false);
        }
    }
    Ok(true)
}

fn boundary(graph: &Graph, fake_quantize: NodeId, index: usize) -> Result<&Constant, Stop> {
    let value = graph.input_value(fake_quantize, index)?;
    Ok(constant_at(graph, value).ok_or(DeclineReason::UnsupportedLayout)?)
}

/// Check a binary producer can be folded and split its operands.
///
/// The producer must keep the shape of its data operand. A constant of more
/// than one element additionally needs static ranks and, left-padded with 1s
/// to the output rank, must be 1 on every axis from 2 on.
fn check_elementwise<'g>(graph: &'g Graph, eltwise: &Node) -> Result<Operands<'g>, Stop> {
    let constant = constant_operand(graph, eltwise).ok_or(DeclineReason::NoConstantOperand)?;
    let data = data_operand(graph, eltwise).ok_or(DeclineReason::NoDataOperand)?;

    let input = &graph.slot(data)?.shape;
    let output = &eltwise.outputs()[0].shape;
    if input != output {
        return Err(DeclineReason::UnsupportedBroadcast.into());
    }

    if constant.len() != 1 {
        let Some(rank) = output.rank() else {
            return Err(DeclineReason::UnsupportedBroadcast.into());
        };
        if align_left(constant.shape(), rank).iter().skip(2).any(|&dim| dim != 1) {
            return Err(DeclineReason::UnsupportedBroadcast.into());
        }
    }

    Ok(Operands { data, constant })
}

/// Second operand if it is constant, else the first.
fn constant_operand<'g>(graph: &'g Graph, eltwise: &Node) -> Option<&'g Constant> {
    let [lhs, rhs] = eltwise.inputs() else {
        return None;
    };
    constant_at(graph, *rhs).or_else(|| constant_at(graph, *lhs))
}

/// First non-constant operand.
fn data_operand(graph: &Graph, eltwise: &Node) -> Option<Output> {
    eltwise.inputs().iter().copied().find(|&input| constant_at(graph, input).is_none())
}
