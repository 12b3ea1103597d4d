//! Structural graph comparison.
//!
//! Two graphs are equivalent when walking both from their results in lockstep
//! visits nodes of the same kind with equal attributes, equal output slots and
//! pairwise-equivalent producers. Node ids may differ. Constant payloads are
//! compared through operation attribute equality.

use std::collections::HashMap;
use std::fmt;

use crate::graph::{Graph, NodeId};

/// What to compare besides structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    pub friendly_names: bool,
}

/// First difference found between two graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub lhs: Option<NodeId>,
    pub rhs: Option<NodeId>,
    pub reason: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |id: Option<NodeId>| id.map_or_else(|| "-".to_string(), |id| id.to_string());
        write!(f, "{} vs {}: {}", show(self.lhs), show(self.rhs), self.reason)
    }
}

/// Compare `lhs` and `rhs` structurally. `Ok(())` when equivalent.
pub fn compare(lhs: &Graph, rhs: &Graph, options: CompareOptions) -> Result<(), Mismatch> {
    let (l_results, r_results) = (lhs.results(), rhs.results());
    if l_results.len() != r_results.len() {
        return Err(Mismatch {
            lhs: None,
            rhs: None,
            reason: format!("{} results vs {}", l_results.len(), r_results.len()),
        });
    }

    let mut matched: HashMap<NodeId, NodeId> = HashMap::new();
    let mut stack: Vec<(NodeId, NodeId)> = l_results.iter().copied().zip(r_results.iter().copied()).collect();

    while let Some((l, r)) = stack.pop() {
        if let Some(&seen) = matched.get(&l) {
            if seen != r {
                return Err(mismatch(l, r, format!("shared producer maps to {seen} elsewhere")));
            }
            continue;
        }

        let (Some(ln), Some(rn)) = (lhs.get(l), rhs.get(r)) else {
            return Err(mismatch(l, r, "dangling node handle".to_string()));
        };
        if ln.type_info() != rn.type_info() {
            return Err(mismatch(l, r, format!("kind {} vs {}", ln.type_info(), rn.type_info())));
        }
        if !ln.op().attributes_eq(rn.op()) {
            return Err(mismatch(l, r, format!("attributes '{}' vs '{}'", ln.op().describe(), rn.op().describe())));
        }
        if ln.outputs() != rn.outputs() {
            return Err(mismatch(l, r, format!("outputs {:?} vs {:?}", ln.outputs(), rn.outputs())));
        }
        if options.friendly_names && ln.friendly_name() != rn.friendly_name() {
            return Err(mismatch(l, r, format!("name '{}' vs '{}'", ln.friendly_name(), rn.friendly_name())));
        }
        if ln.inputs().len() != rn.inputs().len() {
            return Err(mismatch(l, r, format!("{} inputs vs {}", ln.inputs().len(), rn.inputs().len())));
        }
        for (index, (li, ri)) in ln.inputs().iter().zip(rn.inputs()).enumerate() {
            if li.index != ri.index {
                return Err(mismatch(l, r, format!("input {index} reads output {} vs {}", li.index, ri.index)));
            }
            stack.push((li.node, ri.node));
        }
        matched.insert(l, r);
    }
    Ok(())
}

fn mismatch(lhs: NodeId, rhs: NodeId, reason: String) -> Mismatch {
    Mismatch { lhs: Some(lhs), rhs: Some(rhs), reason }
}
