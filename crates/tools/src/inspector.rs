use std::time::Duration;

use multiverse_common::DimensionId;
use multiverse_kernel::{IdAllocator, WorldInstance, WorldLifecycleContext};
use multiverse_persist::{PersistenceBridge, SideChannelRoot, StoreError};

/// Lifecycle inspector for operator tooling.
///
/// Provides read-only queries against a lifecycle context for debugging
/// and command-line reports.
pub struct LifecycleInspector;

impl LifecycleInspector {
    /// Produce a summary of the context.
    pub fn summary<W: WorldInstance>(ctx: &WorldLifecycleContext<W>) -> LifecycleSummary {
        LifecycleSummary {
            registered: ctx.registry().dimension_count(),
            live: ctx.worlds().len(),
            allocated: ctx.allocator().ids().count(),
            next_free: Self::peek_next_free(ctx),
            watched_instances: ctx.worlds().leak_tracker().observed_count(),
            tick_order: ctx.tick_order().iter().map(|(id, _)| *id).collect(),
        }
    }

    /// The id `next_free_id` would return, without repairing the allocator.
    pub fn peek_next_free<W: WorldInstance>(ctx: &WorldLifecycleContext<W>) -> DimensionId {
        let mut allocator = ctx.allocator().clone();
        allocator.next_free_id(|id| ctx.is_registered(id))
    }

    /// Details for one registered dimension.
    pub fn inspect_dimension<W: WorldInstance>(
        ctx: &WorldLifecycleContext<W>,
        dimension: DimensionId,
    ) -> Option<DimensionInfo> {
        let descriptor = ctx.descriptor_for(dimension).ok()?;
        let world = ctx.world(dimension);
        Some(DimensionInfo {
            dimension,
            provider: descriptor.id,
            name: descriptor.name.clone(),
            kind: descriptor.kind.type_name().to_string(),
            keep_loaded: descriptor.keep_loaded,
            world_name: world.map(|w| w.world_name().to_string()),
            average_tick: ctx
                .tick_times(dimension)
                .filter(|t| t.count() > 0)
                .map(|t| t.average()),
        })
    }

    /// Every registered dimension, ascending by id.
    pub fn list_dimensions<W: WorldInstance>(ctx: &WorldLifecycleContext<W>) -> Vec<DimensionInfo> {
        ctx.registered_ids()
            .into_iter()
            .filter_map(|id| Self::inspect_dimension(ctx, id))
            .collect()
    }

    /// Decode the id map stored in a side-channel root.
    pub fn saved_ids(
        bridge: &PersistenceBridge,
        root: &SideChannelRoot,
    ) -> Result<Option<SavedIdMap>, StoreError> {
        let Some(blob) = bridge.extract(root)? else {
            return Ok(None);
        };
        let words = blob.words();
        let mut allocator = IdAllocator::new();
        allocator.restore(&words);
        Ok(Some(SavedIdMap {
            ids: allocator.ids().collect(),
            words,
        }))
    }
}

/// Summary of a lifecycle context for the inspector.
#[derive(Debug, Clone)]
pub struct LifecycleSummary {
    pub registered: usize,
    pub live: usize,
    pub allocated: usize,
    pub next_free: DimensionId,
    pub watched_instances: usize,
    pub tick_order: Vec<DimensionId>,
}

impl std::fmt::Display for LifecycleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order: Vec<String> = self.tick_order.iter().map(|id| id.to_string()).collect();
        write!(
            f,
            "Dimensions: registered={} live={} allocated={} next_free={} watched={} tick_order=[{}]",
            self.registered,
            self.live,
            self.allocated,
            self.next_free,
            self.watched_instances,
            order.join(", ")
        )
    }
}

/// Detailed info about a single dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionInfo {
    pub dimension: DimensionId,
    pub provider: i32,
    pub name: String,
    pub kind: String,
    pub keep_loaded: bool,
    /// Name of the live world, if loaded.
    pub world_name: Option<String>,
    pub average_tick: Option<Duration>,
}

impl std::fmt::Display for DimensionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dimension [{:>3}] {} provider={} ({}) keep_loaded={}",
            self.dimension.get(),
            self.name,
            self.provider,
            self.kind,
            self.keep_loaded
        )?;
        match &self.world_name {
            Some(world) => write!(f, " live as {world:?}")?,
            None => write!(f, " unloaded")?,
        }
        if let Some(avg) = self.average_tick {
            write!(f, " avg_tick={:.2}ms", avg.as_secs_f64() * 1000.0)?;
        }
        Ok(())
    }
}

/// An id map read back from saved data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedIdMap {
    pub words: Vec<i32>,
    pub ids: Vec<DimensionId>,
}

impl std::fmt::Display for SavedIdMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.ids.iter().map(|id| id.to_string()).collect();
        write!(f, "Saved ids ({} words): [{}]", self.words.len(), ids.join(", "))
    }
}
