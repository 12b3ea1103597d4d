//! Convolution family.
//!
//! Four concrete kinds share the [`ConvolutionBase`] attribute block and parent
//! kind, so a pass can ask "is this any kind of convolution" with a single
//! `is_type::<ConvolutionBase>()`.
//!
//! Layouts (channels first):
//!
//! | kind | data | filters | output channels |
//! |---|---|---|---|
//! | `Convolution` | `[N, C_in, ...]` | `[C_out, C_in, k...]` | `C_out` |
//! | `GroupConvolution` | `[N, C_in, ...]` | `[G, C_out/G, C_in/G, k...]` | `G * C_out/G` |
//! | `ConvolutionBackpropData` | `[N, C_in, ...]` | `[C_in, C_out, k...]` | `C_out` |
//! | `GroupConvolutionBackpropData` | `[N, C_in, ...]` | `[G, C_in/G, C_out/G, k...]` | `G * C_out/G` |

use smallvec::{SmallVec, smallvec};
use snafu::ensure;

use super::check_arity;
use crate::error::*;
use crate::node::{Operation, OutputSlot, OutputSlots};
use crate::shape::{Dimension, PartialShape};

/// Spatial attributes shared by every convolution kind.
///
/// An empty attribute list means the neutral value (stride 1, dilation 1,
/// padding 0) for every spatial axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvolutionBase {
    pub strides: SmallVec<[usize; 2]>,
    pub pads_begin: SmallVec<[usize; 2]>,
    pub pads_end: SmallVec<[usize; 2]>,
    pub dilations: SmallVec<[usize; 2]>,
}

node_kind!(ConvolutionBase, "ConvolutionBase", "util");

/// Which spatial formula and filter layout a kind uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backprop,
}

impl ConvolutionBase {
    fn attr(values: &[usize], axis: usize, default: usize) -> usize {
        values.get(axis).copied().unwrap_or(default)
    }

    fn check_attributes(&self, op: &'static str, spatial: usize) -> Result<()> {
        let lists: [(&'static str, &[usize]); 4] = [
            ("strides", &self.strides),
            ("pads_begin", &self.pads_begin),
            ("pads_end", &self.pads_end),
            ("dilations", &self.dilations),
        ];
        for (attribute, values) in lists {
            ensure!(
                values.is_empty() || values.len() == spatial,
                InvalidAttributeSnafu {
                    op,
                    attribute,
                    reason: format!("expected {spatial} values, got {}", values.len()),
                }
            );
        }
        ensure!(
            self.strides.iter().chain(&self.dilations).all(|&v| v > 0),
            InvalidAttributeSnafu { op, attribute: "strides", reason: "strides and dilations must be positive" }
        );
        Ok(())
    }

    fn spatial_dim(&self, direction: Direction, axis: usize, input: Dimension, kernel: Dimension) -> Dimension {
        let (Dimension::Static(input), Dimension::Static(kernel)) = (input, kernel) else {
            return Dimension::Dynamic;
        };
        let stride = Self::attr(&self.strides, axis, 1);
        let dilation = Self::attr(&self.dilations, axis, 1);
        let pads = Self::attr(&self.pads_begin, axis, 0) + Self::attr(&self.pads_end, axis, 0);
        let effective_kernel = dilation * (kernel.saturating_sub(1)) + 1;

        match direction {
            Direction::Forward => {
                let padded = input + pads;
                Dimension::Static(padded.saturating_sub(effective_kernel) / stride + 1)
            }
            Direction::Backprop => {
                Dimension::Static((stride * input.saturating_sub(1) + effective_kernel).saturating_sub(pads))
            }
        }
    }

    /// Shared inference. `grouped` says whether the filter carries a leading
    /// group axis.
    fn infer(
        &self,
        op: &'static str,
        inputs: &[OutputSlot],
        direction: Direction,
        grouped: bool,
    ) -> Result<OutputSlots> {
        check_arity(op, inputs, 2)?;
        let (data, filters) = (&inputs[0], &inputs[1]);
        ensure!(data.dtype == filters.dtype, DTypeMismatchSnafu { op, lhs: data.dtype, rhs: filters.dtype });

        let (Some(data_dims), Some(filter_dims)) = (data.shape.dims(), filters.shape.dims()) else {
            return Ok(smallvec![OutputSlot { dtype: data.dtype, shape: PartialShape::dynamic() }]);
        };
        ensure!(data_dims.len() >= 3, RankMismatchSnafu { op, index: 0usize, expected: 3usize, actual: data_dims.len() });
        let spatial = data_dims.len() - 2;
        let filter_rank = data_dims.len() + usize::from(grouped);
        ensure!(
            filter_dims.len() == filter_rank,
            RankMismatchSnafu { op, index: 1usize, expected: filter_rank, actual: filter_dims.len() }
        );
        self.check_attributes(op, spatial)?;

        // Output-channel axes in the filter layout (see module docs).
        let channel_axes: &[usize] = match (direction, grouped) {
            (Direction::Forward, false) => &[0],
            (Direction::Forward, true) => &[0, 1],
            (Direction::Backprop, false) => &[1],
            (Direction::Backprop, true) => &[0, 2],
        };
        let channels = channel_axes.iter().try_fold(1usize, |acc, &axis| filter_dims[axis].as_static().map(|d| acc * d));

        let kernel_offset = filter_rank - spatial;
        let mut dims: SmallVec<[Dimension; 4]> = smallvec![data_dims[0]];
        dims.push(channels.map_or(Dimension::Dynamic, Dimension::Static));
        for axis in 0..spatial {
            dims.push(self.spatial_dim(direction, axis, data_dims[axis + 2], filter_dims[kernel_offset + axis]));
        }

        Ok(smallvec![OutputSlot { dtype: data.dtype, shape: PartialShape::new(dims) }])
    }
}

macro_rules! convolution_kind {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $direction:expr, grouped = $grouped:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $ty {
            pub base: ConvolutionBase,
        }

        impl $ty {
            pub fn new(base: ConvolutionBase) -> Self {
                Self { base }
            }
        }

        node_kind!($ty, $name, "opset1", parent = ConvolutionBase, base = base);

        impl Operation for $ty {
            fn validate_and_infer(&self, inputs: &[OutputSlot]) -> Result<OutputSlots> {
                self.base.infer($name, inputs, $direction, $grouped)
            }

            fn describe(&self) -> String {
                format!(
                    "strides={:?} pads=({:?}, {:?}) dilations={:?}",
                    self.base.strides, self.base.pads_begin, self.base.pads_end, self.base.dilations
                )
            }
        }
    };
}

convolution_kind!(
    /// Regular convolution.
    Convolution,
    "Convolution",
    Direction::Forward,
    grouped = false
);
convolution_kind!(
    /// Grouped convolution.
    GroupConvolution,
    "GroupConvolution",
    Direction::Forward,
    grouped = true
);
convolution_kind!(
    /// Transposed convolution (gradient of convolution w.r.t. its data).
    ConvolutionBackpropData,
    "ConvolutionBackpropData",
    Direction::Backprop,
    grouped = false
);
convolution_kind!(
    /// Grouped transposed convolution.
    GroupConvolutionBackpropData,
    "GroupConvolutionBackpropData",
    Direction::Backprop,
    grouped = true
);
