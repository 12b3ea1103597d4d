//! Parameters shared by low precision transformations.
//!
//! Built explicitly with [`TransformationParams::builder`] or read from the
//! environment with [`TransformationParams::from_env`].

use bon::bon;
use snafu::ensure;
use tessera_dtype::DType;

use crate::error::*;

/// Knobs of the low precision passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformationParams {
    /// Element type of the output interval constants written by fusions.
    pub deq_precision: DType,
    /// Run FakeQuantize elementwise fusion. When off, the pass declines every
    /// match.
    pub fake_quantize_fusion: bool,
}

impl Default for TransformationParams {
    fn default() -> Self {
        Self { deq_precision: DType::Float32, fake_quantize_fusion: true }
    }
}

#[bon]
impl TransformationParams {
    /// Create parameters with the builder pattern.
    #[builder]
    pub fn new(
        #[builder(default = DType::Float32)] deq_precision: DType,
        #[builder(default = true)] fake_quantize_fusion: bool,
    ) -> Result<Self> {
        ensure!(deq_precision.is_float(), UnsupportedPrecisionSnafu { dtype: deq_precision });
        Ok(Self { deq_precision, fake_quantize_fusion })
    }

    /// Create parameters from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSERA_LPT_DISABLE_FQ_FUSION=1` - Disable FakeQuantize fusion
    /// * `TESSERA_LPT_DEQ_PRECISION=f16|f32|f64` - Dequantization precision (default: f32)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fake_quantize_fusion =
            !matches!(lookup("TESSERA_LPT_DISABLE_FQ_FUSION").as_deref(), Some("1" | "true"));

        let deq_precision = match lookup("TESSERA_LPT_DEQ_PRECISION") {
            None => DType::Float32,
            Some(value) => match value.parse::<DType>() {
                Ok(dtype) if dtype.is_float() => dtype,
                _ => {
                    tracing::warn!(%value, "ignoring TESSERA_LPT_DEQ_PRECISION, expected a float type");
                    DType::Float32
                }
            },
        };

        Self { deq_precision, fake_quantize_fusion }
    }
}
