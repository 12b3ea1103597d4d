use smallvec::smallvec;
use snafu::ensure;
use tessera_dtype::DType;

use super::check_arity;
use crate::error::*;
use crate::node::{Operation, OutputSlot, OutputSlots};
use crate::shape::broadcast_shapes;
use crate::types::AutoBroadcast;

/// Clamp-and-quantize.
///
/// Inputs: `X, input_low, input_high, output_low, output_high`. Values of `X`
/// are clamped to `[input_low, input_high]`, snapped to one of `levels` evenly
/// spaced points and mapped onto `[output_low, output_high]`. The four
/// boundary tensors broadcast against `X`.
///
/// `output_type` overrides the element type of the result. By default the
/// output keeps the element type of `X`; low precision passes set it when they
/// change the type of the data input but must keep the type seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeQuantize {
    pub levels: usize,
    pub auto_broadcast: AutoBroadcast,
    pub output_type: Option<DType>,
}

impl FakeQuantize {
    pub const DATA: usize = 0;
    pub const INPUT_LOW: usize = 1;
    pub const INPUT_HIGH: usize = 2;
    pub const OUTPUT_LOW: usize = 3;
    pub const OUTPUT_HIGH: usize = 4;

    pub fn new(levels: usize) -> Self {
        Self { levels, auto_broadcast: AutoBroadcast::Numpy, output_type: None }
    }

    pub fn with_output_type(mut self, dtype: DType) -> Self {
        self.output_type = Some(dtype);
        self
    }
}

node_kind!(FakeQuantize, "FakeQuantize", "opset1");

impl Operation for FakeQuantize {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        const OP: &str = "FakeQuantize";
        check_arity(OP, inputs, 5)?;
        ensure!(
            self.levels >= 2,
            InvalidAttributeSnafu { op: OP, attribute: "levels", reason: format!("{} < 2", self.levels) }
        );

        let data = &inputs[Self::DATA];
        ensure!(
            data.dtype.is_float() || data.dtype.is_int(),
            UnsupportedDTypeSnafu { op: OP, index: Self::DATA, dtype: data.dtype }
        );

        for (index, boundary) in inputs.iter().enumerate().skip(1) {
            ensure!(!boundary.dtype.is_bool(), UnsupportedDTypeSnafu { op: OP, index, dtype: boundary.dtype });
            if self.auto_broadcast == AutoBroadcast::Numpy {
                // Boundaries may not grow the data shape.
                let merged = broadcast_shapes(&data.shape, &boundary.shape)?;
                if let (Some(merged_rank), Some(data_rank)) = (merged.rank(), data.shape.rank()) {
                    ensure!(
                        merged_rank == data_rank,
                        RankMismatchSnafu { op: OP, index, expected: data_rank, actual: boundary.shape.rank().unwrap_or(0) }
                    );
                }
            } else {
                ensure!(
                    boundary.shape == data.shape,
                    BroadcastShapeMismatchSnafu {
                        lhs: Box::new(data.shape.clone()),
                        rhs: Box::new(boundary.shape.clone())
                    }
                );
            }
        }

        let dtype = self.output_type.unwrap_or(data.dtype);
        Ok(smallvec![OutputSlot { dtype, shape: data.shape.clone() }])
    }

    fn describe(&self) -> String {
        match self.output_type {
            Some(dtype) => format!("levels={} broadcast={} out={dtype}", self.levels, self.auto_broadcast),
            None => format!("levels={} broadcast={}", self.levels, self.auto_broadcast),
        }
    }
}
