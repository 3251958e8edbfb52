//! World Kernel: which dimensions exist, which ids they hold, which are live.
//!
//! # Invariants
//! - Every registered dimension id `>= 0` is marked in the id allocator.
//! - At most one live world per dimension id.
//! - Tick order always starts with the loaded built-ins as `[-1, 0, 1]`.
//! - Registration is additive; nothing is unregistered at runtime.

mod alloc;
mod context;
mod error;
mod host;
mod leak;
mod registry;
mod table;

pub use alloc::IdAllocator;
pub use context::WorldLifecycleContext;
pub use error::LifecycleError;
pub use host::{DimensionCatalog, NullCatalog, WorldFactory, WorldInstance};
pub use leak::{LeakTracker, LeakWarning};
pub use registry::{
    BUILT_IN_PROVIDERS, DimensionDescriptor, DimensionRegistry, ProviderKind, symbolic_name,
};
pub use table::{TickTimes, WorldInstanceTable};
