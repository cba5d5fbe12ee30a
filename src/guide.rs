//! # menuclip guide
//!
//! A walkthrough of how a project turns into a menu tree, animations and
//! parameters.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`Project`](crate::Project): the authoring hierarchy (objects), the menu
//!   nodes attached to it, and the resting value of every animatable property
//! - [`MenuNode`](crate::MenuNode): a folder, toggler, smooth changer, costume
//!   changer or preset button
//! - [`Clip`](crate::Clip): a named set of curves, one per
//!   [`PropertyId`](crate::PropertyId)
//! - [`AnimationArtifact`](crate::AnimationArtifact): a blend graph or a
//!   layered automaton driven by one parameter
//! - [`CompiledMenu`](crate::CompiledMenu): the control tree, plus trees for
//!   externally placed folders
//! - [`Diagnostic`](crate::Diagnostic): a recoverable problem; the pass keeps
//!   going and reports it
//!
//! A compile is staged:
//!
//! 1. Validate the project: [`Project::validate`](crate::Project::validate)
//! 2. Synthesize one animation per animated node
//! 3. Build the menu, knowing which smooth changers ended up with an animation
//!
//! [`compile`](crate::compile) runs all three. [`compile_with`](crate::compile_with)
//! skips validation and takes the collaborators directly, for hosts that keep
//! their own object graph.
//!
//! ---
//!
//! ## Where a node goes
//!
//! - an external node is left to its host
//! - an explicit parent wins; if that parent does not take part in the pass the
//!   node lands at the root with an `InactiveParent` diagnostic
//! - otherwise the nearest folder on an ancestor object (not the node's own
//!   object)
//! - otherwise the root
//!
//! Siblings keep their declaration order.
//! Folders whose parents loop are dropped together with everything below them
//! and reported once per loop.
//!
//! ---
//!
//! ## Building a project (Rust DSL)
//!
//! ```rust
//! use menuclip::{
//!     CompileSettings, ControlKind, PropertyId, Value, compile,
//!     dsl::{ProjectBuilder, entry, folder, smooth_changer, toggler},
//! };
//!
//! # fn main() -> menuclip::MenuclipResult<()> {
//! let smile = PropertyId::blend_shape("Body", "smile");
//! let project = ProjectBuilder::new("avatar")
//!     .object("root", None)
//!     .object("face", Some("root"))
//!     .baseline(smile.clone(), Value::Float(0.0))
//!     .baseline(PropertyId::active("Glasses"), Value::Bool(false))
//!     .node(folder("Face", "face"))
//!     .node(
//!         smooth_changer("Smile", "face")
//!             .parent("Face")
//!             .keyframe(0.0, vec![])
//!             .keyframe(1.0, vec![entry(smile.clone(), Value::Float(100.0))]),
//!     )
//!     .node(toggler("Glasses", "face").set(PropertyId::active("Glasses"), Value::Bool(true)))
//!     .build()?;
//!
//! let out = compile(&project, &CompileSettings::default())?;
//! assert!(out.diagnostics.is_empty());
//!
//! let smile_anim = out.animation(&"Smile".into()).expect("smile is animated");
//! assert_eq!(smile_anim.sample(0.5)[&smile], Value::Float(50.0));
//!
//! let face = &out.menu.root.controls[0];
//! assert!(matches!(face.kind, ControlKind::Submenu { .. }));
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! ## Blend graph or automaton
//!
//! With [`CompileSettings::blend_trees`](crate::CompileSettings) on, a smooth
//! changer becomes a 1D blend over its merged keyframe clips. Otherwise (or for
//! parameters listed in `no_blend_parameters`) it becomes a layer with one state
//! per adjacent keyframe pair; each state plays a two-key segment clip whose
//! time tracks the parameter across the pair. Both produce the same values.
//!
//! Every merged clip animates the union of all properties the changer touches,
//! so moving between keyframes never leaves a property stuck at an old value.
//!
//! ---
//!
//! ## Determinism
//!
//! All maps are ordered and sibling sorts are stable, so the same project
//! always compiles to the same bytes. [`fingerprint_output`](crate::fingerprint_output)
//! digests an output for quick comparisons; `menuclip check` prints it.
