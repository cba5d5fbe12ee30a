use crate::{
    core::{NodeId, PropertyId},
    error::LoweringError,
};

/// A non-fatal problem found during a pass. The pass still returns its
/// best-effort output alongside these.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// Submenu hosts whose parents loop back onto themselves; pruned with
    /// everything below them.
    CircularReference { nodes: Vec<NodeId> },
    /// A property set declares one property twice with different values.
    MalformedPropertySet {
        node: NodeId,
        entry: usize,
        property: PropertyId,
    },
    MissingBaseline {
        node: NodeId,
        entry: usize,
        property: PropertyId,
    },
    /// An explicit parent that does not take part in the pass; the node was
    /// placed at the root instead.
    InactiveParent { node: NodeId, parent: NodeId },
}

impl Diagnostic {
    pub fn from_lowering(node: &NodeId, entry: usize, err: LoweringError) -> Self {
        match err {
            LoweringError::DuplicateProperty { property } => Self::MalformedPropertySet {
                node: node.clone(),
                entry,
                property,
            },
            LoweringError::MissingBaseline { property } => Self::MissingBaseline {
                node: node.clone(),
                entry,
                property,
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(?diagnostic, "diagnostic recorded");
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
