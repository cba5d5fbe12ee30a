//! Animation synthesis: lowered presets become merged clips, and merged clips
//! become either a blend graph or a layered automaton on the driving parameter.

use std::collections::BTreeMap;

use crate::{
    clip::{Clip, overlay, restrict_to_baseline, segment},
    core::{Lerp, NodeId, PropertyId, Value, clamp01},
    diagnostics::{Diagnostic, Diagnostics},
    lower::{LoweredClips, lower_property_set},
    model::{Costume, Keyframe, PropertyEntry},
    source::{BaselineSource, HostCapabilities},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
}

/// A parameter the host must register so controls and graphs can drive it.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default: f64,
    pub saved: bool,
    pub local_only: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type")]
pub enum AnimationArtifact {
    BlendGraph(BlendGraph),
    LayeredAutomaton(LayeredAutomaton),
}

/// A 1D blend over clips placed at thresholds of the driving parameter.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BlendGraph {
    pub name: String,
    pub parameter: String,
    pub children: Vec<BlendChild>, // stably sorted by threshold
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BlendChild {
    pub threshold: f64,
    pub clip: String,
}

/// A layer of discrete states entered through conditions on the driving
/// parameter. Transitions are checked in order from any state.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayeredAutomaton {
    pub name: String,
    pub parameter: String,
    pub default_state: usize,
    pub states: Vec<AutomatonState>,
    pub transitions: Vec<Transition>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AutomatonState {
    pub name: String,
    pub clip: String,
    /// Parameter range mapped onto the clip's normalized time. `None` plays
    /// the clip's first frame.
    pub motion_range: Option<[f64; 2]>,
    pub write_defaults: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Transition {
    pub to: usize,
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "mode", content = "threshold")]
pub enum Condition {
    AtLeast(f64),
    Below(f64),
    If,
    IfNot,
    Equals(i64),
}

impl Condition {
    pub fn holds(self, value: f64) -> bool {
        match self {
            Self::AtLeast(t) => value >= t,
            Self::Below(t) => value < t,
            Self::If => value != 0.0,
            Self::IfNot => value == 0.0,
            Self::Equals(i) => value.round() as i64 == i,
        }
    }
}

impl LayeredAutomaton {
    /// The state the layer settles in for a parameter value.
    pub fn select(&self, value: f64) -> usize {
        self.transitions
            .iter()
            .find(|t| t.conditions.iter().all(|c| c.holds(value)))
            .map(|t| t.to)
            .unwrap_or(self.default_state)
    }

    pub fn motion_time(state: &AutomatonState, value: f64) -> f64 {
        match state.motion_range {
            Some([a, b]) if b > a => clamp01((value - a) / (b - a)),
            _ => 0.0,
        }
    }
}

/// Everything synthesized for one node: the artifact and the clips it names.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SynthesizedAnimation {
    pub owner: NodeId,
    pub parameter: Parameter,
    pub clips: Vec<Clip>,
    pub artifact: AnimationArtifact,
}

impl SynthesizedAnimation {
    pub fn clip(&self, name: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.name == name)
    }

    /// Property values the artifact produces for a parameter value.
    pub fn sample(&self, value: f64) -> BTreeMap<PropertyId, Value> {
        match &self.artifact {
            AnimationArtifact::BlendGraph(graph) => self.sample_blend(graph, value),
            AnimationArtifact::LayeredAutomaton(layer) => {
                let Some(state) = layer.states.get(layer.select(value)) else {
                    return BTreeMap::new();
                };
                self.clip(&state.clip)
                    .map(|c| c.sample(LayeredAutomaton::motion_time(state, value)))
                    .unwrap_or_default()
            }
        }
    }

    fn sample_blend(&self, graph: &BlendGraph, value: f64) -> BTreeMap<PropertyId, Value> {
        let children = &graph.children;
        let (Some(first), Some(last)) = (children.first(), children.last()) else {
            return BTreeMap::new();
        };
        let v = if value.is_nan() {
            first.threshold
        } else {
            value.clamp(first.threshold, last.threshold)
        };
        let idx = children.partition_point(|c| c.threshold <= v);
        let at = |i: usize| {
            self.clip(&children[i].clip)
                .map(|c| c.sample(0.0))
                .unwrap_or_default()
        };
        if idx >= children.len() {
            return at(children.len() - 1);
        }

        let a = &children[idx - 1];
        let b = &children[idx];
        let t = (v - a.threshold) / (b.threshold - a.threshold);
        let left = at(idx - 1);
        let right = at(idx);
        left.into_iter()
            .map(|(p, va)| {
                let out = match right.get(&p) {
                    Some(vb) => Value::lerp(&va, vb, t),
                    None => va,
                };
                (p, out)
            })
            .collect()
    }
}

/// Lowered keyframe, kept with its declared index and clamped frame.
struct LoweredFrame {
    index: usize,
    frame: f64,
    clips: LoweredClips,
}

fn lower_all<'a>(
    owner: &NodeId,
    base_name: &str,
    sets: impl Iterator<Item = (usize, f64, &'a [PropertyEntry])>,
    baseline: &dyn BaselineSource,
    diagnostics: &mut Diagnostics,
) -> Vec<LoweredFrame> {
    let mut out = Vec::new();
    for (index, frame, entries) in sets {
        match lower_property_set(base_name, index, entries, baseline) {
            Ok(clips) => out.push(LoweredFrame {
                index,
                frame,
                clips,
            }),
            Err(err) => diagnostics.push(Diagnostic::from_lowering(owner, index, err)),
        }
    }
    out
}

fn baseline_of(base_name: &str, lowered: &[LoweredFrame]) -> Clip {
    let defaults: Vec<Clip> = lowered.iter().map(|l| l.clips.default.clone()).collect();
    restrict_to_baseline(format!("{base_name}_Default"), &defaults)
}

/// Keyframes to a blend graph (host has a continuous primitive) or to a
/// layer with one state per adjacent keyframe pair.
#[tracing::instrument(skip_all, fields(owner = %owner))]
pub fn build_smooth_changer(
    owner: &NodeId,
    base_name: &str,
    frames: &[Keyframe],
    parameter: Parameter,
    baseline: &dyn BaselineSource,
    host: &dyn HostCapabilities,
    diagnostics: &mut Diagnostics,
) -> Option<SynthesizedAnimation> {
    let lowered = lower_all(
        owner,
        base_name,
        frames
            .iter()
            .enumerate()
            .map(|(i, k)| (i, clamp01(k.frame), k.properties.as_slice())),
        baseline,
        diagnostics,
    );
    if lowered.is_empty() {
        tracing::debug!("no keyframes survived lowering; skipping");
        return None;
    }

    let base = baseline_of(base_name, &lowered);
    let mut merged: Vec<(usize, f64, Clip)> = lowered
        .iter()
        .map(|l| {
            let clip = overlay(&base, &l.clips.changed)
                .with_name(format!("{base_name}_{}_Merged", l.index));
            (l.index, l.frame, clip)
        })
        .collect();
    merged.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut clips = vec![base];
    let artifact = if host.supports_blend(&parameter.name) {
        tracing::debug!(children = merged.len(), "emitting blend graph");
        let children = merged
            .iter()
            .map(|(_, frame, clip)| BlendChild {
                threshold: *frame,
                clip: clip.name.clone(),
            })
            .collect();
        clips.extend(merged.into_iter().map(|(_, _, clip)| clip));
        AnimationArtifact::BlendGraph(BlendGraph {
            name: base_name.to_string(),
            parameter: parameter.name.clone(),
            children,
        })
    } else {
        let write_defaults = host.write_defaults();
        let mut states = Vec::new();
        let mut segments = Vec::new();
        for pair in merged.windows(2) {
            let (ia, fa, ca) = &pair[0];
            let (ib, fb, cb) = &pair[1];
            if fb - fa <= 0.0 {
                continue;
            }
            let seg = segment(format!("{base_name}_{ia}_{ib}"), ca, cb);
            states.push(AutomatonState {
                name: seg.name.clone(),
                clip: seg.name.clone(),
                motion_range: Some([*fa, *fb]),
                write_defaults,
            });
            segments.push(seg);
        }

        let mut transitions = Vec::with_capacity(states.len() + 1);
        if states.is_empty() {
            // Every keyframe sits at one position; the last declared wins.
            let Some((_, _, last)) = merged.last() else {
                return None;
            };
            states.push(AutomatonState {
                name: last.name.clone(),
                clip: last.name.clone(),
                motion_range: None,
                write_defaults,
            });
        } else {
            let n = states.len();
            // Keyframes tied at the far end: the last declared one owns that
            // exact position, so it gets a state of its own.
            let end = match merged.as_slice() {
                [.., (_, fa, _), (_, fb, last)] if fa == fb => Some((*fb, last.name.clone())),
                _ => None,
            };
            for (k, state) in states.iter().enumerate() {
                let mut conditions = Vec::new();
                if let Some([a, b]) = state.motion_range {
                    if k > 0 {
                        conditions.push(Condition::AtLeast(a));
                    }
                    if k + 1 < n || end.is_some() {
                        conditions.push(Condition::Below(b));
                    }
                }
                transitions.push(Transition { to: k, conditions });
            }
            if let Some((frame, clip)) = end {
                transitions.push(Transition {
                    to: n,
                    conditions: vec![Condition::AtLeast(frame)],
                });
                states.push(AutomatonState {
                    name: clip.clone(),
                    clip,
                    motion_range: None,
                    write_defaults,
                });
            }
        }
        tracing::debug!(states = states.len(), "emitting layered automaton");

        clips.extend(merged.into_iter().map(|(_, _, clip)| clip));
        clips.extend(segments);
        AnimationArtifact::LayeredAutomaton(LayeredAutomaton {
            name: base_name.to_string(),
            parameter: parameter.name.clone(),
            default_state: 0,
            states,
            transitions,
        })
    };

    Some(SynthesizedAnimation {
        owner: owner.clone(),
        parameter,
        clips,
        artifact,
    })
}

/// An on/off layer: `Off` holds the baseline, `On` overlays the toggled values.
#[tracing::instrument(skip_all, fields(owner = %owner))]
pub fn build_toggler(
    owner: &NodeId,
    base_name: &str,
    properties: &[PropertyEntry],
    parameter: Parameter,
    baseline: &dyn BaselineSource,
    host: &dyn HostCapabilities,
    diagnostics: &mut Diagnostics,
) -> Option<SynthesizedAnimation> {
    if properties.is_empty() {
        return None;
    }
    let lowered = lower_all(
        owner,
        base_name,
        std::iter::once((0, 0.0, properties)),
        baseline,
        diagnostics,
    );
    let first = lowered.first()?;

    let off = restrict_to_baseline(format!("{base_name}_Off"), &[first.clips.default.clone()]);
    let on = overlay(&off, &first.clips.changed).with_name(format!("{base_name}_On"));
    let write_defaults = host.write_defaults();
    let state = |clip: &Clip| AutomatonState {
        name: clip.name.clone(),
        clip: clip.name.clone(),
        motion_range: None,
        write_defaults,
    };
    let layer = LayeredAutomaton {
        name: base_name.to_string(),
        parameter: parameter.name.clone(),
        default_state: usize::from(parameter.default != 0.0),
        states: vec![state(&off), state(&on)],
        transitions: vec![
            Transition {
                to: 1,
                conditions: vec![Condition::If],
            },
            Transition {
                to: 0,
                conditions: vec![Condition::IfNot],
            },
        ],
    };

    Some(SynthesizedAnimation {
        owner: owner.clone(),
        parameter,
        clips: vec![off, on],
        artifact: AnimationArtifact::LayeredAutomaton(layer),
    })
}

/// One state per costume, entered when the parameter equals its index.
/// Costumes that fail to lower get no state.
#[tracing::instrument(skip_all, fields(owner = %owner))]
pub fn build_costume_changer(
    owner: &NodeId,
    base_name: &str,
    costumes: &[Costume],
    parameter: Parameter,
    baseline: &dyn BaselineSource,
    host: &dyn HostCapabilities,
    diagnostics: &mut Diagnostics,
) -> Option<SynthesizedAnimation> {
    let lowered = lower_all(
        owner,
        base_name,
        costumes
            .iter()
            .enumerate()
            .map(|(i, c)| (i, i as f64, c.properties.as_slice())),
        baseline,
        diagnostics,
    );
    if lowered.is_empty() {
        return None;
    }

    let base = baseline_of(base_name, &lowered);
    let write_defaults = host.write_defaults();
    let mut clips = vec![base.clone()];
    let mut states = Vec::with_capacity(lowered.len());
    let mut transitions = Vec::with_capacity(lowered.len());
    let mut default_state = 0;
    for l in &lowered {
        let clip = overlay(&base, &l.clips.changed)
            .with_name(format!("{base_name}_{}_Merged", l.index));
        if l.frame == parameter.default {
            default_state = states.len();
        }
        transitions.push(Transition {
            to: states.len(),
            conditions: vec![Condition::Equals(l.index as i64)],
        });
        states.push(AutomatonState {
            name: costumes[l.index].name.clone(),
            clip: clip.name.clone(),
            motion_range: None,
            write_defaults,
        });
        clips.push(clip);
    }

    Some(SynthesizedAnimation {
        owner: owner.clone(),
        artifact: AnimationArtifact::LayeredAutomaton(LayeredAutomaton {
            name: base_name.to_string(),
            parameter: parameter.name.clone(),
            default_state,
            states,
            transitions,
        }),
        parameter,
        clips,
    })
}
