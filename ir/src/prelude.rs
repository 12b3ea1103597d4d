//! Common imports for building and rewriting graphs.
//!
//! ```rust,ignore
//! use tessera_ir::prelude::*;
//! ```

pub use crate::graph::{Graph, Input, NodeId, Output};
pub use crate::node::{Node, Operation, OutputSlot};
pub use crate::ops::*;
pub use crate::pattern::{Pattern, Rewrite};
pub use crate::rewrite::{GraphRewrite, RewriteContext};
pub use crate::shape::{Dimension, PartialShape};
pub use crate::type_info::{NodeKind, TypeInfo};
pub use crate::types::{AutoBroadcast, ConstValue};

pub use tessera_dtype::DType;
