use std::collections::{BTreeMap, BTreeSet};

use crate::{
    core::{NodeId, ObjectId, PropertyId, Value},
    error::{MenuclipError, MenuclipResult},
    source::{BaselineSource, ObjectGraph},
};

/// One compilation input: the authoring hierarchy, the menu nodes attached to
/// it, and the resting value of every animatable property.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub name: String,
    pub objects: Vec<ObjectNode>,
    pub nodes: Vec<MenuNode>, // declaration order
    #[serde(default)]
    pub baseline: Vec<PropertyEntry>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ObjectNode {
    pub id: ObjectId,
    #[serde(default)]
    pub parent: Option<ObjectId>,
    /// Stripped from builds along with everything below it.
    #[serde(default)]
    pub editor_only: bool,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MenuNode {
    pub id: NodeId,
    pub object: ObjectId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Explicit parent folder, overriding the hierarchy.
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// An external host owns this node's placement.
    #[serde(default)]
    pub external: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    Toggler(Toggler),
    SmoothChanger(SmoothChanger),
    CostumeChanger(CostumeChanger),
    Preset(Preset),
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Toggler {
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub default_on: bool,
    #[serde(default = "default_true")]
    pub saved: bool,
    #[serde(default)]
    pub local_only: bool,
    /// Values applied while the toggle is on.
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SmoothChanger {
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub default_frame: f64,
    #[serde(default = "default_true")]
    pub saved: bool,
    #[serde(default)]
    pub local_only: bool,
    pub frames: Vec<Keyframe>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CostumeChanger {
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub default_costume: u32,
    #[serde(default = "default_true")]
    pub saved: bool,
    #[serde(default)]
    pub local_only: bool,
    pub costumes: Vec<Costume>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Costume {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Preset {
    #[serde(default)]
    pub parameter: Option<String>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Position on the driving parameter; clamped into [0, 1] at synthesis.
    pub frame: f64,
    pub properties: Vec<PropertyEntry>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PropertyEntry {
    pub property: PropertyId,
    pub value: Value,
}

fn default_true() -> bool {
    true
}

impl MenuNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    /// Name of the driving parameter this node registers, if any.
    pub fn parameter_name(&self) -> Option<&str> {
        let explicit = match &self.kind {
            NodeKind::Folder => return None,
            NodeKind::Toggler(t) => t.parameter.as_deref(),
            NodeKind::SmoothChanger(c) => c.parameter.as_deref(),
            NodeKind::CostumeChanger(c) => c.parameter.as_deref(),
            NodeKind::Preset(p) => p.parameter.as_deref(),
        };
        Some(explicit.unwrap_or(&self.name))
    }
}

impl Project {
    pub fn validate(&self) -> MenuclipResult<()> {
        let mut objects = BTreeMap::new();
        for obj in &self.objects {
            if objects.insert(&obj.id, obj).is_some() {
                return Err(MenuclipError::validation(format!(
                    "duplicate object id '{}'",
                    obj.id
                )));
            }
        }
        for obj in &self.objects {
            let mut seen = BTreeSet::new();
            let mut cur = Some(obj);
            while let Some(o) = cur {
                if !seen.insert(&o.id) {
                    return Err(MenuclipError::validation(format!(
                        "object hierarchy loops through '{}'",
                        o.id
                    )));
                }
                cur = match &o.parent {
                    Some(p) => Some(objects.get(p).copied().ok_or_else(|| {
                        MenuclipError::validation(format!(
                            "object '{}' references missing parent '{}'",
                            o.id, p
                        ))
                    })?),
                    None => None,
                };
            }
        }

        let mut nodes = BTreeMap::new();
        for node in &self.nodes {
            if nodes.insert(&node.id, node).is_some() {
                return Err(MenuclipError::validation(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if !objects.contains_key(&node.object) {
                return Err(MenuclipError::validation(format!(
                    "node '{}' is attached to missing object '{}'",
                    node.id, node.object
                )));
            }
        }

        let check_parent = |owner: &NodeId, parent: &Option<NodeId>| -> MenuclipResult<()> {
            let Some(parent) = parent else {
                return Ok(());
            };
            match nodes.get(parent) {
                None => Err(MenuclipError::validation(format!(
                    "node '{owner}' references missing parent '{parent}'"
                ))),
                Some(p) if !p.is_folder() => Err(MenuclipError::validation(format!(
                    "node '{owner}' names '{parent}' as parent, which is not a folder"
                ))),
                Some(_) => Ok(()),
            }
        };

        let mut parameters = BTreeSet::new();
        for node in &self.nodes {
            check_parent(&node.id, &node.parent)?;
            match &node.kind {
                NodeKind::SmoothChanger(c) => {
                    if !c.default_frame.is_finite() {
                        return Err(MenuclipError::validation(format!(
                            "smooth changer '{}' has a non-finite default frame",
                            node.id
                        )));
                    }
                    if let Some(i) = c.frames.iter().position(|f| !f.frame.is_finite()) {
                        return Err(MenuclipError::validation(format!(
                            "smooth changer '{}' keyframe {i} has a non-finite frame",
                            node.id
                        )));
                    }
                }
                NodeKind::CostumeChanger(c) => {
                    for costume in &c.costumes {
                        check_parent(&node.id, &costume.parent)?;
                    }
                }
                NodeKind::Folder | NodeKind::Toggler(_) | NodeKind::Preset(_) => {}
            }
            if let Some(name) = node.parameter_name() {
                if name.trim().is_empty() {
                    return Err(MenuclipError::validation(format!(
                        "node '{}' has an empty parameter name",
                        node.id
                    )));
                }
                if !parameters.insert(name) {
                    return Err(MenuclipError::validation(format!(
                        "parameter '{name}' is driven by more than one node"
                    )));
                }
            }
        }

        let mut baseline = BTreeSet::new();
        for entry in &self.baseline {
            if !baseline.insert(&entry.property) {
                return Err(MenuclipError::validation(format!(
                    "baseline declares '{}' more than once",
                    entry.property
                )));
            }
        }

        Ok(())
    }

    /// Validate and build the lookup structures the compiler walks.
    pub fn index(&self) -> MenuclipResult<ProjectIndex<'_>> {
        self.validate()?;
        Ok(ProjectIndex::build(self))
    }

    pub fn baseline_table(&self) -> BaselineTable {
        BaselineTable(
            self.baseline
                .iter()
                .map(|e| (e.property.clone(), e.value.clone()))
                .collect(),
        )
    }
}

/// A validated project with its lookups resolved.
#[derive(Debug)]
pub struct ProjectIndex<'a> {
    project: &'a Project,
    positions: BTreeMap<&'a NodeId, usize>,
    parents: BTreeMap<&'a ObjectId, &'a ObjectId>,
    stripped: BTreeSet<&'a ObjectId>,
    by_object: BTreeMap<&'a ObjectId, Vec<usize>>,
}

impl<'a> ProjectIndex<'a> {
    fn build(project: &'a Project) -> Self {
        let parents: BTreeMap<&ObjectId, &ObjectId> = project
            .objects
            .iter()
            .filter_map(|o| Some((&o.id, o.parent.as_ref()?)))
            .collect();
        let editor_only: BTreeSet<&ObjectId> = project
            .objects
            .iter()
            .filter(|o| o.editor_only)
            .map(|o| &o.id)
            .collect();

        let mut stripped = BTreeSet::new();
        for obj in &project.objects {
            let mut cur = Some(&obj.id);
            while let Some(id) = cur {
                if editor_only.contains(id) {
                    stripped.insert(&obj.id);
                    break;
                }
                cur = parents.get(id).copied();
            }
        }

        let mut by_object: BTreeMap<&ObjectId, Vec<usize>> = BTreeMap::new();
        let mut positions = BTreeMap::new();
        for (i, node) in project.nodes.iter().enumerate() {
            positions.insert(&node.id, i);
            by_object.entry(&node.object).or_default().push(i);
        }

        Self {
            project,
            positions,
            parents,
            stripped,
            by_object,
        }
    }

    fn node_active(&self, node: &MenuNode) -> bool {
        node.enabled && !self.stripped.contains(&node.object)
    }
}

impl ObjectGraph for ProjectIndex<'_> {
    fn nodes(&self) -> Vec<&MenuNode> {
        self.project
            .nodes
            .iter()
            .filter(|n| self.node_active(n))
            .collect()
    }

    fn node(&self, id: &NodeId) -> Option<&MenuNode> {
        self.positions.get(id).map(|&i| &self.project.nodes[i])
    }

    fn is_active(&self, id: &NodeId) -> bool {
        self.node(id).is_some_and(|n| self.node_active(n))
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    fn object_parent(&self, object: &ObjectId) -> Option<&ObjectId> {
        self.parents.get(object).copied()
    }

    fn nodes_on(&self, object: &ObjectId) -> Vec<&MenuNode> {
        self.by_object
            .get(object)
            .map(|idxs| {
                idxs.iter()
                    .map(|&i| &self.project.nodes[i])
                    .filter(|n| self.node_active(n))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Resting values keyed by property.
#[derive(Clone, Debug, Default)]
pub struct BaselineTable(pub BTreeMap<PropertyId, Value>);

impl BaselineSource for BaselineTable {
    fn baseline(&self, property: &PropertyId) -> Option<Value> {
        self.0.get(property).cloned()
    }
}
