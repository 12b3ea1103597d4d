use smallvec::smallvec;
use snafu::ensure;
use tessera_dtype::DType;

use super::check_arity;
use crate::error::*;
use crate::node::{Operation, OutputSlot, OutputSlots};

/// Element type conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convert {
    pub destination: DType,
}

impl Convert {
    pub fn new(destination: DType) -> Self {
        Self { destination }
    }
}

node_kind!(Convert, "Convert", "opset1");

impl Operation for Convert {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity("Convert", inputs, 1)?;
        Ok(smallvec![OutputSlot { dtype: self.destination, shape: inputs[0].shape.clone() }])
    }

    fn describe(&self) -> String {
        format!("to={}", self.destination)
    }
}

/// `max(x, 0)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relu;

node_kind!(Relu, "Relu", "opset1");

impl Operation for Relu {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity("Relu", inputs, 1)?;
        let dtype = inputs[0].dtype;
        ensure!(dtype.is_signed_numeric(), UnsupportedDTypeSnafu { op: "Relu", index: 0usize, dtype });
        Ok(smallvec![inputs[0].clone()])
    }
}
