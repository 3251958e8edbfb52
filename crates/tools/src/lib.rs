//! Operator tooling: read-only views of a lifecycle context and of saved data.
//!
//! # Invariants
//! - Inspection never mutates the context it reads.

pub mod inspector;

pub use inspector::{DimensionInfo, LifecycleInspector, LifecycleSummary, SavedIdMap};
