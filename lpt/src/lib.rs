//! Low precision transformations over the tessera graph IR.
//!
//! - [`fake_quantize`] - Folding of elementwise producers into `FakeQuantize`
//! - [`fold`] - Constant arithmetic used by the folds
//! - [`config`] - Parameters shared by the passes

pub mod config;
pub mod error;
pub mod fake_quantize;
pub mod fold;


pub use config::TransformationParams;
pub use error::{Error, Result};
pub use fake_quantize::{DeclineReason, FakeQuantizeTransformation, Fold};
