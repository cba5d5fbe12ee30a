use std::collections::BTreeSet;

use crate::{
    core::NodeId,
    model::{Costume, MenuNode},
    source::ObjectGraph,
};

/// Where a menu entry goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// An external host owns the entry; nothing is emitted here.
    External,
    Root,
    Under(NodeId),
    /// The explicit parent does not take part in the pass; the entry falls
    /// back to the root.
    Orphaned { parent: NodeId },
}

impl Placement {
    /// The parent in the compiled tree; `None` means the root.
    pub fn parent(&self) -> Option<&NodeId> {
        match self {
            Self::Under(p) => Some(p),
            Self::External | Self::Root | Self::Orphaned { .. } => None,
        }
    }
}

/// Resolves effective parents. Purely structural: the same graph always
/// yields the same placements.
pub struct Resolver<'g> {
    graph: &'g dyn ObjectGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g dyn ObjectGraph) -> Self {
        Self { graph }
    }

    pub fn resolve(&self, node: &MenuNode) -> Placement {
        if node.external {
            return Placement::External;
        }
        match &node.parent {
            Some(parent) => self.explicit(parent),
            None => self
                .hierarchy_folder(node)
                .map_or(Placement::Root, Placement::Under),
        }
    }

    /// Costume entries sit in their changer's submenu unless redirected.
    pub fn resolve_costume(&self, changer: &MenuNode, costume: &Costume) -> Placement {
        if costume.external {
            return Placement::External;
        }
        match &costume.parent {
            Some(parent) => self.explicit(parent),
            None => Placement::Under(changer.id.clone()),
        }
    }

    fn explicit(&self, parent: &NodeId) -> Placement {
        if self.graph.is_active(parent) {
            Placement::Under(parent.clone())
        } else {
            Placement::Orphaned {
                parent: parent.clone(),
            }
        }
    }

    /// Nearest folder on an ancestor object, starting above the node's own
    /// object.
    pub fn hierarchy_folder(&self, node: &MenuNode) -> Option<NodeId> {
        let mut seen = BTreeSet::new();
        let mut cur = self.graph.object_parent(&node.object);
        while let Some(object) = cur {
            if !seen.insert(object.clone()) {
                return None;
            }
            if let Some(folder) = self
                .graph
                .nodes_on(object)
                .into_iter()
                .find(|n| n.is_folder())
            {
                return Some(folder.id.clone());
            }
            cur = self.graph.object_parent(object);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{ProjectBuilder, folder, toggler};

    #[test]
    fn hierarchy_skips_own_object_and_non_folders() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("outfit", Some("root"))
            .object("shirt", Some("outfit"))
            .node(folder("Outfit", "outfit"))
            .node(toggler("Helper", "outfit"))
            .node(folder("Same", "shirt"))
            .node(toggler("Shirt", "shirt"))
            .build()
            .unwrap();
        let index = project.index().unwrap();
        let resolver = Resolver::new(&index);
        let shirt = index.node(&"Shirt".into()).unwrap();
        assert_eq!(resolver.resolve(shirt), Placement::Under("Outfit".into()));
        let outfit = index.node(&"Outfit".into()).unwrap();
        assert_eq!(resolver.resolve(outfit), Placement::Root);
    }

    #[test]
    fn explicit_parent_and_external_flag() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .object("a", Some("root"))
            .node(folder("A", "a"))
            .node(folder("B", "root"))
            .node(toggler("Shirt", "a").parent("B"))
            .node(toggler("Hat", "a").external())
            .build()
            .unwrap();
        let index = project.index().unwrap();
        let resolver = Resolver::new(&index);
        let shirt = index.node(&"Shirt".into()).unwrap();
        assert_eq!(resolver.resolve(shirt), Placement::Under("B".into()));
        let hat = index.node(&"Hat".into()).unwrap();
        assert_eq!(resolver.resolve(hat), Placement::External);
    }

    #[test]
    fn inactive_explicit_parent_is_orphaned() {
        let project = ProjectBuilder::new("avatar")
            .object("root", None)
            .node(folder("Hidden", "root").disabled())
            .node(toggler("Shirt", "root").parent("Hidden"))
            .build()
            .unwrap();
        let index = project.index().unwrap();
        let resolver = Resolver::new(&index);
        let shirt = index.node(&"Shirt".into()).unwrap();
        let placement = resolver.resolve(shirt);
        assert_eq!(
            placement,
            Placement::Orphaned {
                parent: "Hidden".into()
            }
        );
        assert_eq!(placement.parent(), None);
    }
}
