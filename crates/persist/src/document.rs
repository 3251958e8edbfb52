//! Typed view of the side-channel document.
//!
//! The file is one NBT root compound. Each ecosystem owns a top-level key;
//! the id map lives at `<ecosystem>/Forge/DimensionData`.

use std::collections::HashMap;

use fastnbt::{IntArray, Value};
use serde::{Deserialize, Serialize};

/// Top-level compound of a side-channel file.
pub type SideChannelRoot = HashMap<String, Value>;

/// The `DimensionData` compound: the id bitmap packed into 32-bit words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionData {
    #[serde(rename = "DimensionArray", default = "empty_array")]
    pub dimension_array: IntArray,
}

fn empty_array() -> IntArray {
    IntArray::new(Vec::new())
}

impl DimensionData {
    pub fn new(words: Vec<i32>) -> Self {
        Self {
            dimension_array: IntArray::new(words),
        }
    }

    pub fn words(&self) -> Vec<i32> {
        self.dimension_array.clone().into_inner()
    }
}

impl Default for DimensionData {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
