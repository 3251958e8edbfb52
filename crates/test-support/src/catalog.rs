use std::sync::{Arc, Mutex};

use multiverse_kernel::{DimensionCatalog, DimensionDescriptor};

/// A catalog that records every announced descriptor.
///
/// Clones share the record, so a test can keep one clone while the context
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingCatalog {
    entries: Arc<Mutex<Vec<DimensionDescriptor>>>,
}

impl RecordingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all announced descriptors.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entries(&self) -> Vec<DimensionDescriptor> {
        self.entries.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries().into_iter().map(|d| d.name).collect()
    }
}

impl DimensionCatalog for RecordingCatalog {
    fn register_dimension_type(&mut self, descriptor: &DimensionDescriptor) {
        self.entries.lock().unwrap().push(descriptor.clone());
    }
}
