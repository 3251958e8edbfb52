use std::collections::HashMap;

use fastnbt::Value;
use multiverse_common::EngineConfig;
use multiverse_kernel::{WorldInstance, WorldLifecycleContext};

use crate::document::{DimensionData, SideChannelRoot};
use crate::store::{SideChannelStore, StoreError};

const FORGE_KEY: &str = "Forge";
const DIMENSION_DATA_KEY: &str = "DimensionData";

/// Moves the dimension id map between a lifecycle context and save data.
///
/// The blob lives at `<ecosystem>/Forge/DimensionData` in the side-channel
/// root; everything else in the root is left untouched.
#[derive(Debug, Clone)]
pub struct PersistenceBridge {
    ecosystem: String,
    file_name: String,
}

impl PersistenceBridge {
    pub fn new(ecosystem: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            ecosystem: ecosystem.into(),
            file_name: file_name.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.ecosystem_name, &config.side_channel_name)
    }

    pub fn ecosystem(&self) -> &str {
        &self.ecosystem
    }

    /// Snapshot the allocator as a `DimensionData` compound.
    pub fn export_blob<W: WorldInstance>(ctx: &WorldLifecycleContext<W>) -> DimensionData {
        DimensionData::new(ctx.id_map_words())
    }

    /// Replace the allocator state from a `DimensionData` compound.
    ///
    /// No blob seeds the map from registered dimensions.
    pub fn import_blob<W: WorldInstance>(
        ctx: &mut WorldLifecycleContext<W>,
        blob: Option<&DimensionData>,
    ) {
        match blob {
            Some(blob) => ctx.restore_id_map(Some(blob.words().as_slice())),
            None => ctx.restore_id_map(None),
        }
    }

    /// Place `blob` into `root`, creating intermediate compounds as needed.
    ///
    /// A non-compound value on the path is replaced.
    pub fn embed(
        &self,
        root: &mut SideChannelRoot,
        blob: &DimensionData,
    ) -> Result<(), fastnbt::error::Error> {
        let mut ecosystem = take_compound(root, &self.ecosystem);
        let mut forge = take_compound(&mut ecosystem, FORGE_KEY);
        forge.insert(DIMENSION_DATA_KEY.to_string(), fastnbt::to_value(blob)?);
        ecosystem.insert(FORGE_KEY.to_string(), Value::Compound(forge));
        root.insert(self.ecosystem.clone(), Value::Compound(ecosystem));
        Ok(())
    }

    /// Read the `DimensionData` compound inside `root`, if present.
    pub fn extract(
        &self,
        root: &SideChannelRoot,
    ) -> Result<Option<DimensionData>, fastnbt::error::Error> {
        compound(root.get(&self.ecosystem))
            .and_then(|ecosystem| compound(ecosystem.get(FORGE_KEY)))
            .and_then(|forge| forge.get(DIMENSION_DATA_KEY))
            .map(fastnbt::from_value)
            .transpose()
    }

    /// Side-channel store in the surface world's save directory, if it has one.
    pub fn store_for<W: WorldInstance>(
        &self,
        ctx: &WorldLifecycleContext<W>,
    ) -> Option<SideChannelStore> {
        ctx.save_root_dir()
            .map(|dir| SideChannelStore::new(dir, self.file_name.clone()))
    }

    /// Write the id map into `store`, keeping other root keys intact.
    ///
    /// Best-effort: failures are logged and reported as `false`.
    pub fn save<W: WorldInstance>(
        &self,
        ctx: &WorldLifecycleContext<W>,
        store: &SideChannelStore,
    ) -> bool {
        let mut root = match store.load() {
            Ok(Some(root)) => root,
            Ok(None) => SideChannelRoot::new(),
            Err(e) => {
                tracing::warn!(error = %e, "existing side-channel data unreadable, starting fresh");
                SideChannelRoot::new()
            }
        };
        if let Err(e) = self.embed(&mut root, &Self::export_blob(ctx)) {
            tracing::error!(error = %e, "failed to encode dimension id map");
            return false;
        }
        let saved = store.save(&root);
        if saved {
            tracing::debug!(dir = %store.dir().display(), "saved dimension id map");
        }
        saved
    }

    /// Restore the id map from `store`. A missing file seeds from registered dimensions.
    pub fn load<W: WorldInstance>(
        &self,
        ctx: &mut WorldLifecycleContext<W>,
        store: &SideChannelStore,
    ) -> Result<(), StoreError> {
        let blob = match store.load()? {
            Some(root) => self.extract(&root)?,
            None => None,
        };
        if blob.is_none() {
            tracing::info!(dir = %store.dir().display(), "no saved dimension id map");
        }
        Self::import_blob(ctx, blob.as_ref());
        Ok(())
    }
}

fn compound(value: Option<&Value>) -> Option<&HashMap<String, Value>> {
    match value {
        Some(Value::Compound(inner)) => Some(inner),
        _ => None,
    }
}

fn take_compound(map: &mut HashMap<String, Value>, key: &str) -> HashMap<String, Value> {
    match map.remove(key) {
        Some(Value::Compound(inner)) => inner,
        _ => HashMap::new(),
    }
}
