//! Element types carried by graph values.
//!
//! Every output slot of a graph node has exactly one [`DType`]. The set is fixed:
//! it only covers scalar element types, vectors and pointers live below the graph
//! level and are owned by the execution layer.

pub mod ext;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


/// Scalar element type of a tensor value.
///
/// Variant order follows element width with signed/unsigned interleaved, the
/// display name is the short lowercase form used in graph dumps (`f32`, `i8`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::EnumCount, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    #[strum(to_string = "boolean", serialize = "bool")]
    Bool,

    #[strum(serialize = "i8")]
    Int8,
    #[strum(serialize = "u8")]
    UInt8,
    #[strum(serialize = "i16")]
    Int16,
    #[strum(serialize = "u16")]
    UInt16,
    #[strum(serialize = "i32")]
    Int32,
    #[strum(serialize = "u32")]
    UInt32,
    #[strum(serialize = "i64")]
    Int64,
    #[strum(serialize = "u64")]
    UInt64,

    #[strum(serialize = "f16")]
    Float16,
    #[strum(serialize = "bf16")]
    BFloat16,
    #[strum(serialize = "f32")]
    Float32,
    #[strum(serialize = "f64")]
    Float64,
}

impl DType {
    pub const fn bytes(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    pub const fn bitwidth(&self) -> usize {
        self.bytes() * 8
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub const fn is_int(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    /// True for every floating-point type, `bf16` included.
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64)
    }

    /// Types a number can be stored in without losing its sign.
    pub const fn is_signed_numeric(&self) -> bool {
        self.is_signed() || self.is_float()
    }
}
