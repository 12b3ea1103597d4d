//! Provenance tracking for graph nodes.
//!
//! Every node carries a [`Provenance`] record: the chain of events describing
//! where it was created and which rewrites produced it, plus the set of
//! friendly names of the original nodes that were fused into it.
//!
//! Provenance lives on the node itself (not in a side table), so it follows the
//! node through arena moves and is dropped together with it. Rewrites merge the
//! records of every node they consume into the replacement.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use derive_more::Display;

use crate::graph::NodeId;

/// Source code location with a workspace-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{file}:{line}:{column}")]
pub struct SourceLocation<'i> {
    /// Path relative to workspace root (e.g., "lpt/src/fake_quantize.rs")
    pub file: Cow<'i, str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation<'static> {
    pub fn from_caller(loc: &'static Location<'static>) -> Self {
        Self { file: Cow::Borrowed(get_relative_location(loc)), line: loc.line(), column: loc.column() }
    }
}

/// Name of the pass that produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0}")]
pub struct PassName(pub &'static str);

impl PassName {
    /// `Graph::replace` called outside of any registered pass.
    pub const REPLACE: Self = Self("replace");
}

/// Individual event in a node's history.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ProvenanceEvent {
    /// Node was created at this source location.
    #[display("created at {location}")]
    Created { location: SourceLocation<'static> },

    /// Node took over the consumers of `from`.
    #[display("replaced {from} ({from_name}) in {pass}")]
    Replaced { from: NodeId, from_name: String, pass: PassName },

    /// Metadata of `from` was merged into this node.
    #[display("absorbed {from} ({from_name})")]
    Absorbed { from: NodeId, from_name: String },
}

/// Provenance record attached to every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    events: Vec<ProvenanceEvent>,
    fused_names: BTreeSet<String>,
}

impl Provenance {
    pub(crate) fn created(location: &'static Location<'static>) -> Self {
        Self { events: vec![ProvenanceEvent::Created { location: SourceLocation::from_caller(location) }], ..Default::default() }
    }

    pub fn events(&self) -> &[ProvenanceEvent] {
        &self.events
    }

    /// Friendly names of every original node folded into this one.
    pub fn fused_names(&self) -> impl Iterator<Item = &str> {
        self.fused_names.iter().map(String::as_str)
    }

    pub fn push(&mut self, event: ProvenanceEvent) {
        self.events.push(event);
    }

    /// Merge `other` (the record of node `from`, named `from_name`) into `self`.
    ///
    /// A node that has no fused names of its own contributes its friendly name,
    /// so the set always names original nodes rather than intermediate ones.
    pub fn absorb(&mut self, from: NodeId, from_name: &str, other: &Provenance) {
        if other.fused_names.is_empty() {
            self.fused_names.insert(from_name.to_string());
        } else {
            self.fused_names.extend(other.fused_names.iter().cloned());
        }
        self.events.extend(other.events.iter().cloned());
        self.events.push(ProvenanceEvent::Absorbed { from, from_name: from_name.to_string() });
    }
}

/// Workspace root, derived from CARGO_MANIFEST_DIR of this crate.
fn workspace_root() -> &'static Path {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        let manifest_dir = env!("CARGO_MANIFEST_DIR");
        let path = Path::new(manifest_dir);
        path.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| PathBuf::from(manifest_dir))
    })
    .as_path()
}

/// Location string relative to the workspace root, or the full path when the
/// file lives outside the workspace.
pub(crate) fn get_relative_location(loc: &'static Location<'static>) -> &'static str {
    let file = loc.file();
    let Some(root) = workspace_root().to_str() else {
        return file;
    };

    match file.strip_prefix(root) {
        Some(stripped) => stripped.strip_prefix('/').or_else(|| stripped.strip_prefix('\\')).unwrap_or(stripped),
        None => file,
    }
}

/// Format a provenance record for display.
pub fn format_chain(provenance: &Provenance) -> String {
    let mut output = String::new();

    for (i, event) in provenance.events().iter().enumerate() {
        output.push_str(&format!("\n  [{}] {}", i, event));
    }

    output
}
