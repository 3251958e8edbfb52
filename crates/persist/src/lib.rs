//! Persistence of the dimension id map in a side-channel save file.
//!
//! # Invariants
//! - Saving writes `.dat_new`, deletes `.dat_old`, renames `.dat` to
//!   `.dat_old`, then renames `.dat_new` to `.dat`, in that order.
//! - A crash after any single step leaves a generation `load` can read.
//! - Root keys other than the id map's own path survive a save.

pub mod bridge;
pub mod document;
pub mod store;

pub use bridge::PersistenceBridge;
pub use document::{DimensionData, SideChannelRoot};
pub use fastnbt::{IntArray, Value};
pub use store::{SideChannelStore, StoreError};
