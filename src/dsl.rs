//! Builders for assembling projects in code.

use crate::{
    core::{ObjectId, PropertyId, Value},
    error::{MenuclipError, MenuclipResult},
    model::{
        Costume, CostumeChanger, Keyframe, MenuNode, NodeKind, ObjectNode, Preset, Project,
        PropertyEntry, SmoothChanger, Toggler,
    },
};

pub struct ProjectBuilder {
    name: String,
    objects: Vec<ObjectNode>,
    nodes: Vec<MenuNode>,
    baseline: Vec<PropertyEntry>,
}

impl ProjectBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            nodes: Vec::new(),
            baseline: Vec::new(),
        }
    }

    pub fn object(mut self, id: &str, parent: Option<&str>) -> Self {
        self.objects.push(ObjectNode {
            id: id.into(),
            parent: parent.map(ObjectId::from),
            editor_only: false,
        });
        self
    }

    pub fn editor_only_object(mut self, id: &str, parent: Option<&str>) -> Self {
        self.objects.push(ObjectNode {
            id: id.into(),
            parent: parent.map(ObjectId::from),
            editor_only: true,
        });
        self
    }

    pub fn node(mut self, node: NodeBuilder) -> Self {
        self.nodes.push(node.node);
        self
    }

    pub fn baseline(mut self, property: PropertyId, value: Value) -> Self {
        self.baseline.push(PropertyEntry { property, value });
        self
    }

    pub fn build(self) -> MenuclipResult<Project> {
        if self.name.trim().is_empty() {
            return Err(MenuclipError::validation("project name must be non-empty"));
        }
        let project = Project {
            name: self.name,
            objects: self.objects,
            nodes: self.nodes,
            baseline: self.baseline,
        };
        project.validate()?;
        Ok(project)
    }
}

pub fn entry(property: PropertyId, value: Value) -> PropertyEntry {
    PropertyEntry { property, value }
}

/// A node under construction. Kind-specific setters have no effect on nodes
/// of other kinds.
pub struct NodeBuilder {
    node: MenuNode,
}

fn node(id: &str, object: &str, kind: NodeKind) -> NodeBuilder {
    NodeBuilder {
        node: MenuNode {
            id: id.into(),
            object: object.into(),
            name: id.to_string(),
            icon: None,
            parent: None,
            external: false,
            enabled: true,
            kind,
        },
    }
}

pub fn folder(id: &str, object: &str) -> NodeBuilder {
    node(id, object, NodeKind::Folder)
}

pub fn toggler(id: &str, object: &str) -> NodeBuilder {
    node(
        id,
        object,
        NodeKind::Toggler(Toggler {
            saved: true,
            ..Toggler::default()
        }),
    )
}

pub fn smooth_changer(id: &str, object: &str) -> NodeBuilder {
    node(
        id,
        object,
        NodeKind::SmoothChanger(SmoothChanger {
            saved: true,
            ..SmoothChanger::default()
        }),
    )
}

pub fn costume_changer(id: &str, object: &str) -> NodeBuilder {
    node(
        id,
        object,
        NodeKind::CostumeChanger(CostumeChanger {
            saved: true,
            ..CostumeChanger::default()
        }),
    )
}

pub fn preset(id: &str, object: &str) -> NodeBuilder {
    node(id, object, NodeKind::Preset(Preset::default()))
}

impl NodeBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.node.name = name.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.node.icon = Some(icon.into());
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.node.parent = Some(parent.into());
        self
    }

    pub fn external(mut self) -> Self {
        self.node.external = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.node.enabled = false;
        self
    }

    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        match &mut self.node.kind {
            NodeKind::Folder => {}
            NodeKind::Toggler(t) => t.parameter = name,
            NodeKind::SmoothChanger(c) => c.parameter = name,
            NodeKind::CostumeChanger(c) => c.parameter = name,
            NodeKind::Preset(p) => p.parameter = name,
        }
        self
    }

    pub fn local_only(mut self) -> Self {
        match &mut self.node.kind {
            NodeKind::Toggler(t) => t.local_only = true,
            NodeKind::SmoothChanger(c) => c.local_only = true,
            NodeKind::CostumeChanger(c) => c.local_only = true,
            NodeKind::Folder | NodeKind::Preset(_) => {}
        }
        self
    }

    pub fn unsaved(mut self) -> Self {
        match &mut self.node.kind {
            NodeKind::Toggler(t) => t.saved = false,
            NodeKind::SmoothChanger(c) => c.saved = false,
            NodeKind::CostumeChanger(c) => c.saved = false,
            NodeKind::Folder | NodeKind::Preset(_) => {}
        }
        self
    }

    /// Toggler: a value applied while on.
    pub fn set(mut self, property: PropertyId, value: Value) -> Self {
        if let NodeKind::Toggler(t) = &mut self.node.kind {
            t.properties.push(entry(property, value));
        }
        self
    }

    pub fn default_on(mut self) -> Self {
        if let NodeKind::Toggler(t) = &mut self.node.kind {
            t.default_on = true;
        }
        self
    }

    /// Smooth changer: a keyframe at `frame`.
    pub fn keyframe(mut self, frame: f64, properties: Vec<PropertyEntry>) -> Self {
        if let NodeKind::SmoothChanger(c) = &mut self.node.kind {
            c.frames.push(Keyframe { frame, properties });
        }
        self
    }

    pub fn default_frame(mut self, frame: f64) -> Self {
        if let NodeKind::SmoothChanger(c) = &mut self.node.kind {
            c.default_frame = frame;
        }
        self
    }

    pub fn costume(mut self, costume: CostumeBuilder) -> Self {
        if let NodeKind::CostumeChanger(c) = &mut self.node.kind {
            c.costumes.push(costume.costume);
        }
        self
    }

    pub fn default_costume(mut self, index: u32) -> Self {
        if let NodeKind::CostumeChanger(c) = &mut self.node.kind {
            c.default_costume = index;
        }
        self
    }

    pub fn build(self) -> MenuNode {
        self.node
    }
}

pub struct CostumeBuilder {
    costume: Costume,
}

pub fn costume(name: &str) -> CostumeBuilder {
    CostumeBuilder {
        costume: Costume {
            name: name.to_string(),
            icon: None,
            parent: None,
            external: false,
            properties: Vec::new(),
        },
    }
}

impl CostumeBuilder {
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.costume.icon = Some(icon.into());
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.costume.parent = Some(parent.into());
        self
    }

    pub fn external(mut self) -> Self {
        self.costume.external = true;
        self
    }

    pub fn set(mut self, property: PropertyId, value: Value) -> Self {
        self.costume.properties.push(entry(property, value));
        self
    }
}
