//! Graph intermediate representation for the tessera compiler.
//!
//! # Module Organization
//!
//! - [`type_info`] - Node-kind identities and castability
//! - [`node`] - The `Operation` trait, typed views and graph nodes
//! - [`graph`] - Arena graph, edges and `replace`
//! - [`ops`] - Operation set
//! - [`shape`] - Partial shapes and broadcasting
//! - [`types`] - Constant values and attribute enums
//! - [`provenance`] - Per-node history of creation and rewrites
//! - [`pattern`] / [`rewrite`] - Match predicates and the pass engine
//! - [`tree`] / [`compare`] - Debug rendering and structural comparison

pub mod compare;
pub mod error;
pub mod graph;
pub mod node;
#[macro_use]
pub mod ops;
pub mod pattern;
pub mod prelude;
pub mod provenance;
pub mod rewrite;
pub mod shape;
pub mod tree;
pub mod type_info;
pub mod types;


pub use error::{Error, Result};
pub use graph::{Graph, Input, NodeId, Output};
pub use node::{Node, Operation, OutputSlot, as_type, is_type};
pub use pattern::{Pattern, Rewrite};
pub use rewrite::{GraphRewrite, RewriteContext, RewriteStats};
pub use shape::{Dimension, PartialShape, Shape};
pub use type_info::{NodeKind, TypeInfo};
pub use types::{AutoBroadcast, ConstValue};

pub use tessera_dtype::DType;
