//! Node-kind identities.
//!
//! Every operation kind owns one `'static` [`TypeInfo`]. Passes never inspect a
//! node's concrete Rust type directly: they ask whether the node's identity is
//! *castable* to a target identity and only then view it as that kind
//! (see [`crate::node::as_type`]).
//!
//! Two relations are kept apart:
//!
//! - **Equality** is exact: same `name` and same `version_id`. The parent link
//!   never takes part in it, so two unrelated kinds never compare equal.
//! - **Castability** is directional reachability along `parent` links. A
//!   `GroupConvolution` is castable to `ConvolutionBase`; the reverse is false.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use snafu::ensure;

use crate::error::*;

/// Longest parent chain a castability walk follows.
pub const MAX_HIERARCHY_DEPTH: usize = 64;

/// Identity of a node kind: name, version namespace and an optional parent used
/// for cast traversal.
#[derive(Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    pub version_id: &'static str,
    pub parent: Option<&'static TypeInfo>,
}

impl TypeInfo {
    pub const fn new(name: &'static str, version_id: &'static str) -> Self {
        Self { name, version_id, parent: None }
    }

    pub const fn with_parent(name: &'static str, version_id: &'static str, parent: &'static TypeInfo) -> Self {
        Self { name, version_id, parent: Some(parent) }
    }

    pub fn version(&self) -> &'static str {
        self.version_id
    }

    /// Whether a node of this kind can be viewed as `target`.
    ///
    /// Walks `self`, then `self.parent`, and so on. The walk stops after
    /// [`MAX_HIERARCHY_DEPTH`] links, so a malformed cyclic hierarchy that slipped
    /// past [`TypeInfo::validate`] answers `false` instead of spinning.
    pub fn is_castable(&self, target: &TypeInfo) -> bool {
        self.ancestors().take(MAX_HIERARCHY_DEPTH + 1).any(|info| info == target)
    }

    /// Iterate over this identity followed by its parents.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Check the parent chain is finite and acyclic.
    ///
    /// Called when a node kind is first added to a graph and when a pass is
    /// registered against an identity; a cycle there is a configuration bug.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut chain = Vec::new();
        for info in self.ancestors() {
            chain.push(info.to_string());
            ensure!(
                seen.insert((info.name, info.version_id)),
                CyclicTypeHierarchySnafu { name: self.to_string(), chain }
            );
            ensure!(
                chain.len() <= MAX_HIERARCHY_DEPTH,
                TypeHierarchyTooDeepSnafu { name: self.to_string(), max_depth: MAX_HIERARCHY_DEPTH }
            );
        }
        Ok(())
    }
}

/// Iterator over an identity and its parent chain.
pub struct Ancestors<'a> {
    next: Option<&'a TypeInfo>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version_id == other.version_id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version_id.hash(state);
    }
}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then_with(|| self.version_id.cmp(other.version_id))
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.version_id)
    }
}

/// A Rust type bound to a node-kind identity.
///
/// Implemented by every concrete operation and by the abstract attribute blocks
/// (such as [`crate::ops::BinaryElementwiseArithmetic`]) that several concrete
/// kinds share.
pub trait NodeKind: 'static {
    const TYPE_INFO: &'static TypeInfo;
}
