//! Pass registry and the worklist engine that drives it.

pub mod engine;

pub use engine::{GraphRewrite, PassCallback, RewriteContext, RewriteStats, SkipPredicate};
