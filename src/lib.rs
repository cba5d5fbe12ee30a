#![forbid(unsafe_code)]

pub mod anim_graph;
pub mod clip;
pub mod compile;
pub mod core;
pub mod diagnostics;
pub mod dsl;
pub mod error;
pub mod fingerprint;
pub mod guide;
pub mod lower;
pub mod menu;
pub mod model;
pub mod source;

pub use anim_graph::{
    AnimationArtifact, BlendGraph, LayeredAutomaton, Parameter, ParameterKind,
    SynthesizedAnimation,
};
pub use clip::{Clip, Curve};
pub use compile::{CompileOutput, CompileSettings, compile, compile_with};
pub use core::{NodeId, ObjectId, PropertyId, PropertyKind, Value};
pub use diagnostics::Diagnostic;
pub use error::{LoweringError, MenuclipError, MenuclipResult};
pub use fingerprint::{OutputFingerprint, fingerprint_output};
pub use menu::{CompiledMenu, Control, ControlKind, MenuTree, build_menu};
pub use model::{MenuNode, NodeKind, Project};
pub use source::{BaselineSource, HostCapabilities, ObjectGraph};
