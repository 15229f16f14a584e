//! Location hierarchy use cases.
//!
//! `HierarchyStore` is the entry point. It serializes structural writes per
//! top-level tree and delegates the two cascades:
//!
//! - `DescendantPropagator` re-derives admin levels below a node
//! - `ParentReassigner` moves a node and rewrites its subtree's paths

mod error;
mod locks;
mod propagate;
mod reassign;
mod store;
mod tree;

#[cfg(test)]
mod test_support;

pub use error::HierarchyError;
pub use locks::{SubtreeGuard, SubtreeLocks};
pub use propagate::{DescendantPropagator, PropagationReport};
pub use reassign::ParentReassigner;
pub use store::{HierarchyStore, NewLocation};
