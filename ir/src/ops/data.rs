//! Graph inputs, constants and results.

use std::sync::Arc;

use smallvec::smallvec;
use snafu::ensure;
use tessera_dtype::DType;
use tessera_dtype::ext::HasDType;

use super::check_arity;
use crate::error::*;
use crate::node::{Operation, OutputSlot, OutputSlots};
use crate::shape::{PartialShape, Shape, shape_size};
use crate::types::ConstValue;

/// Graph input.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub dtype: DType,
    pub shape: PartialShape,
}

impl Parameter {
    pub fn new(dtype: DType, shape: impl Into<PartialShape>) -> Self {
        Self { dtype, shape: shape.into() }
    }
}

node_kind!(Parameter, "Parameter", "opset1");

impl Operation for Parameter {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity("Parameter", inputs, 0)?;
        Ok(smallvec![OutputSlot { dtype: self.dtype, shape: self.shape.clone() }])
    }

    fn describe(&self) -> String {
        format!("{}{}", self.dtype, self.shape)
    }
}

/// Immutable tensor known at compile time.
///
/// Values are stored widened (see [`ConstValue`]) and normalized to `dtype` on
/// construction, so `values()` already reflects the declared element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    dtype: DType,
    shape: Shape,
    values: Arc<[ConstValue]>,
}

impl Constant {
    /// Build a constant of `shape` from `values`.
    ///
    /// A single value is splatted over the whole shape; any other count must
    /// match the shape's element count.
    pub fn new(dtype: DType, shape: &[usize], values: impl IntoIterator<Item = ConstValue>) -> Result<Self> {
        let values: Vec<ConstValue> = values.into_iter().map(|v| v.cast(dtype)).collect();
        let expected = shape_size(shape);
        let values = match values.as_slice() {
            [single] if expected != 1 => vec![*single; expected],
            _ => values,
        };
        ensure!(
            values.len() == expected,
            ConstantSizeMismatchSnafu { shape: Shape::from_slice(shape), expected, actual: values.len() }
        );
        Ok(Self { dtype, shape: Shape::from_slice(shape), values: values.into() })
    }

    pub fn from_slice<T>(shape: &[usize], values: &[T]) -> Result<Self>
    where
        T: HasDType + Copy + Into<ConstValue>,
    {
        Self::new(T::DTYPE, shape, values.iter().map(|&v| v.into()))
    }

    /// Rank-0 constant.
    pub fn scalar<T>(value: T) -> Self
    where
        T: HasDType + Into<ConstValue>,
    {
        Self { dtype: T::DTYPE, shape: Shape::new(), values: Arc::from([value.into().cast(T::DTYPE)]) }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[ConstValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.values.iter().map(ConstValue::as_f32).collect()
    }

    /// Same values converted to `dtype`.
    pub fn cast(&self, dtype: DType) -> Self {
        if dtype == self.dtype {
            return self.clone();
        }
        Self { dtype, shape: self.shape.clone(), values: self.values.iter().map(|v| v.cast(dtype)).collect() }
    }

    /// Same values under a new shape with the same element count.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let expected = shape_size(shape);
        ensure!(
            expected == self.values.len(),
            ConstantSizeMismatchSnafu { shape: Shape::from_slice(shape), expected, actual: self.values.len() }
        );
        Ok(Self { dtype: self.dtype, shape: Shape::from_slice(shape), values: self.values.clone() })
    }
}

node_kind!(Constant, "Constant", "opset1");

impl Operation for Constant {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity("Constant", inputs, 0)?;
        Ok(smallvec![OutputSlot { dtype: self.dtype, shape: PartialShape::from_static(&self.shape) }])
    }

    fn describe(&self) -> String {
        const PREVIEW: usize = 4;
        let mut preview: Vec<String> = self.values.iter().take(PREVIEW).map(ToString::to_string).collect();
        if self.values.len() > PREVIEW {
            preview.push("...".to_string());
        }
        format!("{}{} [{}]", self.dtype, PartialShape::from_static(&self.shape), preview.join(", "))
    }
}

/// Graph result: marks its input as an output of the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sink;

node_kind!(Sink, "Result", "opset1");

impl Operation for Sink {
    fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
        check_arity("Result", inputs, 1)?;
        Ok(smallvec![inputs[0].clone()])
    }
}
