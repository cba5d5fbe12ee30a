//! The compile pass: synthesize animations, register parameters, build the
//! menu, and collect every diagnostic along the way.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    anim_graph::{
        Parameter, ParameterKind, SynthesizedAnimation, build_costume_changer,
        build_smooth_changer, build_toggler,
    },
    core::{NodeId, clamp01},
    diagnostics::{Diagnostic, Diagnostics},
    error::MenuclipResult,
    menu::{CompiledMenu, build_menu},
    model::{MenuNode, NodeKind, Project},
    source::{BaselineSource, HostCapabilities, ObjectGraph},
};

/// Host-facing knobs. Every field has a default so a partial JSON file works.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompileSettings {
    /// The host has a continuous blend primitive.
    pub blend_trees: bool,
    /// Parameters that must use the layered automaton even when blends exist.
    pub no_blend_parameters: BTreeSet<String>,
    pub write_defaults: bool,
    pub root_menu_name: String,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            blend_trees: true,
            no_blend_parameters: BTreeSet::new(),
            write_defaults: true,
            root_menu_name: "Root".to_string(),
        }
    }
}

impl HostCapabilities for CompileSettings {
    fn supports_blend(&self, parameter: &str) -> bool {
        self.blend_trees && !self.no_blend_parameters.contains(parameter)
    }

    fn write_defaults(&self) -> bool {
        self.write_defaults
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CompileOutput {
    pub project: String,
    pub menu: CompiledMenu,
    pub animations: Vec<SynthesizedAnimation>,
    /// Parameters in node declaration order.
    pub parameters: Vec<Parameter>,
    /// Animation diagnostics first, then menu diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn animation(&self, owner: &NodeId) -> Option<&SynthesizedAnimation> {
        self.animations.iter().find(|a| &a.owner == owner)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Validate and compile a project. Fails only on invalid input; everything
/// recoverable ends up in [`CompileOutput::diagnostics`].
pub fn compile(project: &Project, settings: &CompileSettings) -> MenuclipResult<CompileOutput> {
    let index = project.index()?;
    let baseline = project.baseline_table();
    Ok(compile_with(
        &project.name,
        &index,
        &baseline,
        settings,
        &settings.root_menu_name,
    ))
}

/// Compile against caller-supplied collaborators. The graph is trusted to be
/// valid.
#[tracing::instrument(skip_all, fields(project = %name))]
pub fn compile_with(
    name: &str,
    graph: &dyn ObjectGraph,
    baseline: &dyn BaselineSource,
    host: &dyn HostCapabilities,
    root_menu_name: &str,
) -> CompileOutput {
    let mut diagnostics = Diagnostics::new();
    let mut animations = Vec::new();
    let mut parameters = Vec::new();

    for node in graph.nodes() {
        let Some(parameter) = parameter_for(node) else {
            continue;
        };
        let animation = synthesize(node, parameter.clone(), baseline, host, &mut diagnostics);
        // Changers without an animation have nothing to drive.
        let registered = animation.is_some()
            || !matches!(
                node.kind,
                NodeKind::SmoothChanger(_) | NodeKind::CostumeChanger(_)
            );
        if registered {
            parameters.push(parameter);
        }
        animations.extend(animation);
    }

    let animated: BTreeSet<NodeId> = animations.iter().map(|a| a.owner.clone()).collect();
    let menu = build_menu(graph, &animated, root_menu_name);
    let mut diagnostics = diagnostics.into_vec();
    diagnostics.extend(menu.diagnostics.iter().cloned());

    tracing::debug!(
        animations = animations.len(),
        parameters = parameters.len(),
        diagnostics = diagnostics.len(),
        "compile finished"
    );

    CompileOutput {
        project: name.to_string(),
        menu,
        animations,
        parameters,
        diagnostics,
    }
}

/// The parameter a node drives, or `None` for nodes that drive nothing.
pub fn parameter_for(node: &MenuNode) -> Option<Parameter> {
    let name = node.parameter_name()?.to_string();
    let parameter = match &node.kind {
        NodeKind::Folder => return None,
        NodeKind::Toggler(t) => Parameter {
            name,
            kind: ParameterKind::Bool,
            default: if t.default_on { 1.0 } else { 0.0 },
            saved: t.saved,
            local_only: t.local_only,
        },
        NodeKind::SmoothChanger(c) => Parameter {
            name,
            kind: ParameterKind::Float,
            default: clamp01(c.default_frame),
            saved: c.saved,
            local_only: c.local_only,
        },
        NodeKind::CostumeChanger(c) => {
            if c.costumes.is_empty() {
                return None;
            }
            Parameter {
                name,
                kind: ParameterKind::Int,
                default: f64::from(c.default_costume),
                saved: c.saved,
                local_only: c.local_only,
            }
        }
        NodeKind::Preset(_) => Parameter {
            name,
            kind: ParameterKind::Bool,
            default: 0.0,
            saved: false,
            local_only: false,
        },
    };
    Some(parameter)
}

fn synthesize(
    node: &MenuNode,
    parameter: Parameter,
    baseline: &dyn BaselineSource,
    host: &dyn HostCapabilities,
    diagnostics: &mut Diagnostics,
) -> Option<SynthesizedAnimation> {
    let base_name = parameter.name.clone();
    match &node.kind {
        NodeKind::Toggler(t) => build_toggler(
            &node.id,
            &base_name,
            &t.properties,
            parameter,
            baseline,
            host,
            diagnostics,
        ),
        NodeKind::SmoothChanger(c) => build_smooth_changer(
            &node.id,
            &base_name,
            &c.frames,
            parameter,
            baseline,
            host,
            diagnostics,
        ),
        NodeKind::CostumeChanger(c) => build_costume_changer(
            &node.id,
            &base_name,
            &c.costumes,
            parameter,
            baseline,
            host,
            diagnostics,
        ),
        NodeKind::Folder | NodeKind::Preset(_) => None,
    }
}

/// Diagnostic counts by kind, for summaries.
pub fn diagnostic_summary(diagnostics: &[Diagnostic]) -> BTreeMap<&'static str, usize> {
    let mut out = BTreeMap::new();
    for d in diagnostics {
        let kind = match d {
            Diagnostic::CircularReference { .. } => "CircularReference",
            Diagnostic::MalformedPropertySet { .. } => "MalformedPropertySet",
            Diagnostic::MissingBaseline { .. } => "MissingBaseline",
            Diagnostic::InactiveParent { .. } => "InactiveParent",
        };
        *out.entry(kind).or_insert(0) += 1;
    }
    out
}
