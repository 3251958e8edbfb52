//! Shared fakes for multiverse tests.

mod catalog;
mod host;
mod sinks;
mod world;

pub use catalog::RecordingCatalog;
pub use host::{FakeHost, HostCall};
pub use sinks::{RecordingEvents, RecordingSync};
pub use world::{FakeWorld, surface_context};
