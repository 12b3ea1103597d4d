//! Operation set of the IR.
//!
//! Each operation is a plain struct holding its attributes. [`node_kind!`]
//! binds it to a `'static` [`TypeInfo`](crate::type_info::TypeInfo) and wires
//! its [`KindView`](crate::node::KindView) implementation. Kinds with a
//! parent embed the parent's attribute block in a field, which is what a
//! cast to the parent kind returns.
//!
//! Abstract kinds ([`BinaryElementwiseArithmetic`], [`ConvolutionBase`]) are
//! never graph nodes on their own; they exist as cast targets for families of
//! concrete kinds.

/// Bind a type to a node-kind identity.
///
/// ```ignore
/// node_kind!(Relu, "Relu", "opset1");
/// node_kind!(Add, "Add", "opset1", parent = BinaryElementwiseArithmetic, base = base);
/// ```
#[macro_export]
macro_rules! node_kind {
    ($ty:ty, $name:literal, $version:literal) => {
        impl $crate::type_info::NodeKind for $ty {
            const TYPE_INFO: &'static $crate::type_info::TypeInfo = &$crate::type_info::TypeInfo::new($name, $version);
        }

        impl $crate::node::KindView for $ty {
            fn type_info(&self) -> &'static $crate::type_info::TypeInfo {
                <Self as $crate::type_info::NodeKind>::TYPE_INFO
            }

            fn view(&self, target: &$crate::type_info::TypeInfo) -> Option<&dyn ::std::any::Any> {
                (target == <Self as $crate::type_info::NodeKind>::TYPE_INFO).then_some(self as &dyn ::std::any::Any)
            }
        }
    };
    ($ty:ty, $name:literal, $version:literal, parent = $parent:ty, base = $field:ident) => {
        impl $crate::type_info::NodeKind for $ty {
            const TYPE_INFO: &'static $crate::type_info::TypeInfo = &$crate::type_info::TypeInfo::with_parent(
                $name,
                $version,
                <$parent as $crate::type_info::NodeKind>::TYPE_INFO,
            );
        }

        impl $crate::node::KindView for $ty {
            fn type_info(&self) -> &'static $crate::type_info::TypeInfo {
                <Self as $crate::type_info::NodeKind>::TYPE_INFO
            }

            fn view(&self, target: &$crate::type_info::TypeInfo) -> Option<&dyn ::std::any::Any> {
                if target == <Self as $crate::type_info::NodeKind>::TYPE_INFO {
                    return Some(self as &dyn ::std::any::Any);
                }
                $crate::node::KindView::view(&self.$field, target)
            }
        }
    };
}

pub mod arithmetic;
pub mod convolution;
pub mod data;
pub mod quantize;
pub mod unary;

pub use arithmetic::{Add, BinaryElementwiseArithmetic, Divide, Multiply, Subtract};
pub use convolution::{
    Convolution, ConvolutionBackpropData, ConvolutionBase, GroupConvolution, GroupConvolutionBackpropData,
};
pub use data::{Constant, Parameter, Sink};
pub use quantize::FakeQuantize;
pub use unary::{Convert, Relu};

use snafu::ensure;

use crate::error::*;

/// Fail with `InputCountMismatch` unless exactly `expected` inputs were given.
pub(crate) fn check_arity(op: &'static str, inputs: &[crate::node::OutputSlot], expected: usize) -> Result<()> {
    ensure!(inputs.len() == expected, InputCountMismatchSnafu { op, expected, actual: inputs.len() });
    Ok(())
}
