//! Match predicates for rewrite passes.
//!
//! A [`Pattern`] decides whether a node is a match site for a pass. Kind
//! patterns match through castability, so a pattern on
//! `BinaryElementwiseArithmetic` matches every `Add`, `Subtract`, `Multiply`
//! and `Divide`.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::Result;
use crate::graph::{Graph, NodeId};
use crate::node::Node;
use crate::type_info::{NodeKind, TypeInfo};

/// Arbitrary match predicate.
pub type NodePredicate = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// What a pass matches on.
#[derive(Clone)]
pub enum Pattern {
    /// Nodes castable to this identity.
    Kind(&'static TypeInfo),
    /// Nodes castable to any of these identities.
    AnyOf(SmallVec<[&'static TypeInfo; 4]>),
    /// Nodes accepted by a predicate.
    Predicate(NodePredicate),
}

impl Pattern {
    pub fn kind<T: NodeKind>() -> Self {
        Self::Kind(T::TYPE_INFO)
    }

    pub fn any_of(kinds: impl IntoIterator<Item = &'static TypeInfo>) -> Self {
        Self::AnyOf(kinds.into_iter().collect())
    }

    pub fn predicate(f: impl Fn(&Node) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Check every identity the pattern refers to has a well-formed parent
    /// chain.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Kind(info) => info.validate(),
            Self::AnyOf(infos) => infos.iter().try_for_each(|info| info.validate()),
            Self::Predicate(_) => Ok(()),
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Self::Kind(target) => node.type_info().is_castable(target),
            Self::AnyOf(targets) => targets.iter().any(|target| node.type_info().is_castable(target)),
            Self::Predicate(f) => f(node),
        }
    }

    /// Match sites in `graph`, in topological order.
    pub fn scan(&self, graph: &Graph) -> Vec<NodeId> {
        graph.topological_order().into_iter().filter(|&id| graph.get(id).is_some_and(|node| self.matches(node))).collect()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(info) => f.debug_tuple("Kind").field(&info.to_string()).finish(),
            Self::AnyOf(infos) => {
                f.debug_tuple("AnyOf").field(&infos.iter().map(ToString::to_string).collect::<Vec<_>>()).finish()
            }
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Outcome of a pass callback on one match site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// The graph was mutated.
    Applied,
    /// Preconditions unmet; the graph is untouched.
    Declined(&'static str),
}

impl Rewrite {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
