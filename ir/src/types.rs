//! Constant values stored in graph constants.

use std::fmt;

use tessera_dtype::DType;

/// A single element of a constant buffer.
///
/// Storage is widened to 64 bits; the declared [`DType`] of the owning constant
/// decides how the value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

/// Cast to the target width and back to the storage type (truncation/extension).
macro_rules! cast_via {
    ($v:expr, $target:ty, $storage:ty) => {
        ($v as $target) as $storage
    };
}

#[inline]
fn cast_bool(v: bool, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v),
        Int8 | Int16 | Int32 | Int64 => ConstValue::Int(v as i64),
        UInt8 | UInt16 | UInt32 | UInt64 => ConstValue::UInt(v as u64),
        Float16 | BFloat16 | Float32 | Float64 => ConstValue::Float(v as u8 as f64),
    }
}

#[inline]
fn cast_int(v: i64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v as u64),
        Float16 | BFloat16 | Float32 | Float64 => cast_float(v as f64, to),
    }
}

#[inline]
fn cast_uint(v: u64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        UInt8 => ConstValue::UInt(cast_via!(v, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v, u32, u64)),
        UInt64 => ConstValue::UInt(v),
        Float16 | BFloat16 | Float32 | Float64 => cast_float(v as f64, to),
    }
}

#[inline]
fn cast_float(v: f64, to: DType) -> ConstValue {
    use DType::*;
    match to {
        Bool => ConstValue::Bool(v != 0.0),
        Int8 => ConstValue::Int(cast_via!(v, i8, i64)),
        Int16 => ConstValue::Int(cast_via!(v, i16, i64)),
        Int32 => ConstValue::Int(cast_via!(v, i32, i64)),
        Int64 => ConstValue::Int(v as i64),
        UInt8 => ConstValue::UInt(cast_via!(v as i64, u8, u64)),
        UInt16 => ConstValue::UInt(cast_via!(v as i64, u16, u64)),
        UInt32 => ConstValue::UInt(cast_via!(v as i64, u32, u64)),
        UInt64 => ConstValue::UInt((v as i64) as u64),
        // Narrow floats are stored at f32 precision; f16/bf16 rounding belongs to the kernels.
        Float16 | BFloat16 | Float32 => ConstValue::Float(v as f32 as f64),
        Float64 => ConstValue::Float(v),
    }
}

impl ConstValue {
    /// Storage dtype of the widened value.
    pub const fn dtype(&self) -> DType {
        match self {
            ConstValue::Int(_) => DType::Int64,
            ConstValue::UInt(_) => DType::UInt64,
            ConstValue::Float(_) => DType::Float64,
            ConstValue::Bool(_) => DType::Bool,
        }
    }

    pub const fn zero(dtype: DType) -> Self {
        use DType::*;
        match dtype {
            Bool => Self::Bool(false),
            Int8 | Int16 | Int32 | Int64 => Self::Int(0),
            UInt8 | UInt16 | UInt32 | UInt64 => Self::UInt(0),
            Float16 | BFloat16 | Float32 | Float64 => Self::Float(0.0),
        }
    }

    /// Cast this value to `dtype`.
    ///
    /// All casts are allowed, lossy ones included, and follow `as` semantics:
    /// truncation for narrowing integer casts, truncation toward zero for
    /// float-to-int.
    pub fn cast(&self, dtype: DType) -> Self {
        match *self {
            ConstValue::Bool(v) => cast_bool(v, dtype),
            ConstValue::Int(v) => cast_int(v, dtype),
            ConstValue::UInt(v) => cast_uint(v, dtype),
            ConstValue::Float(v) => cast_float(v, dtype),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            ConstValue::Int(v) => v as f64,
            ConstValue::UInt(v) => v as f64,
            ConstValue::Float(v) => v,
            ConstValue::Bool(v) => v as u8 as f64,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.as_f64() as f32
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::UInt(v) => write!(f, "{v}"),
            ConstValue::Float(v) => write!(f, "{v}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<f32> for ConstValue {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<f64> for ConstValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u8> for ConstValue {
    fn from(value: u8) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Broadcasting rule attached to elementwise and quantization nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, derive_more::Display)]
pub enum AutoBroadcast {
    /// Shapes must match exactly.
    #[display("none")]
    None,
    /// Numpy-style right-aligned broadcasting.
    #[default]
    #[display("numpy")]
    Numpy,
}
