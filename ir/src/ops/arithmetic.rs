//! Binary elementwise arithmetic.
//!
//! `Add`, `Subtract`, `Multiply` and `Divide` share one attribute block,
//! [`BinaryElementwiseArithmetic`], which is also their common parent kind.

use smallvec::smallvec;
use snafu::ensure;

use super::check_arity;
use crate::error::*;
use crate::node::{Operation, OutputSlot, OutputSlots};
use crate::shape::broadcast_shapes;
use crate::types::AutoBroadcast;

/// Attributes and shape rules shared by the binary arithmetic kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinaryElementwiseArithmetic {
    pub auto_broadcast: AutoBroadcast,
}

node_kind!(BinaryElementwiseArithmetic, "BinaryElementwiseArithmetic", "util");

impl BinaryElementwiseArithmetic {
    fn infer(&self, op: &'static str, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity(op, inputs, 2)?;
        let (lhs, rhs) = (&inputs[0], &inputs[1]);
        ensure!(lhs.dtype == rhs.dtype, DTypeMismatchSnafu { op, lhs: lhs.dtype, rhs: rhs.dtype });
        ensure!(!lhs.dtype.is_bool(), UnsupportedDTypeSnafu { op, index: 0usize, dtype: lhs.dtype });

        let shape = match self.auto_broadcast {
            AutoBroadcast::Numpy => broadcast_shapes(&lhs.shape, &rhs.shape)?,
            AutoBroadcast::None => {
                ensure!(
                    lhs.shape == rhs.shape,
                    BroadcastShapeMismatchSnafu { lhs: Box::new(lhs.shape.clone()), rhs: Box::new(rhs.shape.clone()) }
                );
                lhs.shape.clone()
            }
        };
        Ok(smallvec![OutputSlot { dtype: lhs.dtype, shape }])
    }
}

macro_rules! binary_arithmetic {
    ($(#[$meta:meta])* $ty:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $ty {
            pub base: BinaryElementwiseArithmetic,
        }

        impl $ty {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn with_broadcast(auto_broadcast: AutoBroadcast) -> Self {
                Self { base: BinaryElementwiseArithmetic { auto_broadcast } }
            }
        }

        node_kind!($ty, $name, "opset1", parent = BinaryElementwiseArithmetic, base = base);

        impl Operation for $ty {
            fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
                self.base.infer($name, inputs)
            }

            fn describe(&self) -> String {
                format!("broadcast={}", self.base.auto_broadcast)
            }
        }
    };
}

binary_arithmetic!(
    /// `a + b`
    Add,
    "Add"
);
binary_arithmetic!(
    /// `a - b`
    Subtract,
    "Subtract"
);
binary_arithmetic!(
    /// `a * b`
    Multiply,
    "Multiply"
);
binary_arithmetic!(
    /// `a / b`
    Divide,
    "Divide"
);
