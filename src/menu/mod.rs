//! Menu compilation: resolve where each node goes, then assemble the control
//! tree with deterministic sibling order and loop pruning.

pub mod resolve;
pub mod tree;

pub use resolve::{Placement, Resolver};
pub use tree::{CompiledMenu, Control, ControlKind, MenuTree, build_menu};
