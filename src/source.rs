//! Seams to the collaborators that own the object graph and the scene state.
//!
//! The core never walks a scene itself. It asks an [`ObjectGraph`] for nodes and
//! hierarchy, a [`BaselineSource`] for resting values, and [`HostCapabilities`]
//! for what the target host can express.

use crate::{
    core::{NodeId, ObjectId, PropertyId, Value},
    model::MenuNode,
};

pub trait ObjectGraph {
    /// Participating nodes in declaration order.
    fn nodes(&self) -> Vec<&MenuNode>;

    /// Any declared node, participating or not.
    fn node(&self, id: &NodeId) -> Option<&MenuNode>;

    /// Whether the node takes part in this pass (enabled, not editor-only).
    fn is_active(&self, id: &NodeId) -> bool;

    /// Position of the node in the declaration sequence.
    fn position(&self, id: &NodeId) -> Option<usize>;

    fn object_parent(&self, object: &ObjectId) -> Option<&ObjectId>;

    /// Participating nodes attached to `object`, in declaration order.
    fn nodes_on(&self, object: &ObjectId) -> Vec<&MenuNode>;
}

pub trait BaselineSource {
    /// The value `property` holds when nothing animates it.
    fn baseline(&self, property: &PropertyId) -> Option<Value>;
}

pub trait HostCapabilities {
    /// Whether a continuous blend primitive can be driven by `parameter`.
    fn supports_blend(&self, parameter: &str) -> bool;

    fn write_defaults(&self) -> bool {
        true
    }
}

impl HostCapabilities for bool {
    fn supports_blend(&self, _parameter: &str) -> bool {
        *self
    }
}

impl<F> BaselineSource for F
where
    F: Fn(&PropertyId) -> Option<Value>,
{
    fn baseline(&self, property: &PropertyId) -> Option<Value> {
        self(property)
    }
}
