use multiverse_common::DimensionId;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::host::WorldInstance;

/// A world instance seen alive after leaving the live table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakWarning {
    /// Stable serial assigned when the instance was first observed.
    pub serial: u64,
    /// Dimension the instance was last set live for.
    pub dimension: DimensionId,
    pub world_name: String,
    /// How many sweeps have found this instance orphaned so far.
    pub occurrences: u32,
    /// True for the first report of this instance.
    pub first: bool,
}

struct Observed<W> {
    serial: u64,
    dimension: DimensionId,
    world_name: String,
    handle: Weak<W>,
}

/// Remembers every world instance ever set live, without keeping it alive.
///
/// Detection is best-effort: an instance only counts as leaked when a sweep
/// finds it still reachable from somewhere outside the live table. Dropped
/// instances are forgotten at the next sweep.
pub struct LeakTracker<W> {
    observed: Vec<Observed<W>>,
    sightings: HashMap<u64, u32>,
    next_serial: u64,
    interval: u32,
}

impl<W: WorldInstance> LeakTracker<W> {
    /// `interval` is the sighting count of the first report and the spacing of repeats.
    pub fn new(interval: u32) -> Self {
        Self {
            observed: Vec::new(),
            sightings: HashMap::new(),
            next_serial: 0,
            interval: interval.max(1),
        }
    }

    /// Start tracking `world`. Observing the same instance again only updates its dimension.
    pub fn observe(&mut self, dimension: DimensionId, world: &Arc<W>) {
        let handle = Arc::downgrade(world);
        if let Some(existing) = self.observed.iter_mut().find(|o| o.handle.ptr_eq(&handle)) {
            existing.dimension = dimension;
            return;
        }
        self.next_serial += 1;
        self.observed.push(Observed {
            serial: self.next_serial,
            dimension,
            world_name: world.world_name().to_string(),
            handle,
        });
    }

    /// Count every observed instance that is still alive but not live.
    ///
    /// `is_live` decides membership in the live table by instance identity.
    pub fn sweep(&mut self, is_live: impl Fn(&Arc<W>) -> bool) -> Vec<LeakWarning> {
        let sightings = &mut self.sightings;
        self.observed.retain(|o| {
            let alive = o.handle.strong_count() > 0;
            if !alive {
                sightings.remove(&o.serial);
            }
            alive
        });

        let mut warnings = Vec::new();
        for observed in &self.observed {
            // Upgrade fails if the last strong handle went away since retain.
            let Some(world) = observed.handle.upgrade() else {
                continue;
            };
            if is_live(&world) {
                continue;
            }
            let count = self.sightings.entry(observed.serial).or_insert(0);
            *count += 1;
            let occurrences = *count;
            if occurrences % self.interval != 0 {
                continue;
            }
            let first = occurrences == self.interval;
            if first {
                tracing::warn!(
                    serial = observed.serial,
                    dimension = %observed.dimension,
                    world = %observed.world_name,
                    occurrences,
                    "world may have leaked: first encounter"
                );
            } else {
                tracing::warn!(
                    serial = observed.serial,
                    dimension = %observed.dimension,
                    world = %observed.world_name,
                    occurrences,
                    "world may have leaked: seen again"
                );
            }
            warnings.push(LeakWarning {
                serial: observed.serial,
                dimension: observed.dimension,
                world_name: observed.world_name.clone(),
                occurrences,
                first,
            });
        }
        warnings
    }

    /// Number of instances still being watched.
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Sighting count for an instance serial, zero if never orphaned.
    pub fn sightings(&self, serial: u64) -> u32 {
        self.sightings.get(&serial).copied().unwrap_or(0)
    }
}
