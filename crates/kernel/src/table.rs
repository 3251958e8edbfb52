use multiverse_common::DimensionId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::host::WorldInstance;
use crate::leak::{LeakTracker, LeakWarning};

/// Ring buffer of recent tick durations for one loaded dimension.
#[derive(Debug, Clone)]
pub struct TickTimes {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl TickTimes {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn average(&self) -> Duration {
        let count = self.count();
        if count == 0 {
            return Duration::ZERO;
        }
        let total: Duration = self.history[..count].iter().sum();
        total / count as u32
    }

    pub fn max(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.history[..self.count()]
            .iter()
            .copied()
            .min()
            .unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        if self.filled {
            self.capacity
        } else {
            self.index
        }
    }
}

/// Live world instances keyed by dimension id.
///
/// The table is the single source of truth for "is dimension X loaded".
/// Every change republishes the tick order: built-ins first as
/// `[-1, 0, 1]`, then custom dimensions in ascending id order. The host's
/// tick driver iterates that list and relies on the order.
pub struct WorldInstanceTable<W> {
    worlds: BTreeMap<DimensionId, Arc<W>>,
    tick_times: BTreeMap<DimensionId, TickTimes>,
    tick_order: Vec<(DimensionId, Arc<W>)>,
    leaks: LeakTracker<W>,
    tick_history: usize,
}

impl<W: WorldInstance> WorldInstanceTable<W> {
    pub fn new(leak_warning_interval: u32, tick_history: usize) -> Self {
        Self {
            worlds: BTreeMap::new(),
            tick_times: BTreeMap::new(),
            tick_order: Vec::new(),
            leaks: LeakTracker::new(leak_warning_interval),
            tick_history,
        }
    }

    /// Mark a dimension live (`Some`) or unloaded (`None`).
    ///
    /// Returns the handle that was previously live for the dimension.
    pub fn set(&mut self, dimension: DimensionId, world: Option<Arc<W>>) -> Option<Arc<W>> {
        let previous = match world {
            Some(world) => {
                tracing::info!(%dimension, world = world.world_name(), "loading dimension");
                self.leaks.observe(dimension, &world);
                self.tick_times
                    .insert(dimension, TickTimes::new(self.tick_history));
                self.worlds.insert(dimension, world)
            }
            None => {
                tracing::info!(%dimension, "unloading dimension");
                self.tick_times.remove(&dimension);
                self.worlds.remove(&dimension)
            }
        };
        self.publish_tick_order();
        previous
    }

    pub fn get(&self, dimension: DimensionId) -> Option<&Arc<W>> {
        self.worlds.get(&dimension)
    }

    pub fn is_loaded(&self, dimension: DimensionId) -> bool {
        self.worlds.contains_key(&dimension)
    }

    /// Ids of every loaded dimension, ascending.
    pub fn live_ids(&self) -> Vec<DimensionId> {
        self.worlds.keys().copied().collect()
    }

    /// Loaded worlds in tick order.
    pub fn tick_order(&self) -> &[(DimensionId, Arc<W>)] {
        &self.tick_order
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Sweep for instances that are still alive after leaving the table.
    pub fn check_leaks(&mut self) -> Vec<LeakWarning> {
        let worlds = &self.worlds;
        self.leaks
            .sweep(|candidate| worlds.values().any(|live| Arc::ptr_eq(live, candidate)))
    }

    pub fn leak_tracker(&self) -> &LeakTracker<W> {
        &self.leaks
    }

    pub fn record_tick_time(&mut self, dimension: DimensionId, dt: Duration) -> bool {
        match self.tick_times.get_mut(&dimension) {
            Some(times) => {
                times.record(dt);
                true
            }
            None => false,
        }
    }

    pub fn tick_times(&self, dimension: DimensionId) -> Option<&TickTimes> {
        self.tick_times.get(&dimension)
    }

    fn publish_tick_order(&mut self) {
        let built_ins = DimensionId::BUILT_INS
            .iter()
            .filter_map(|id| self.worlds.get(id).map(|w| (*id, Arc::clone(w))));
        let custom = self
            .worlds
            .iter()
            .filter(|(id, _)| !id.is_built_in())
            .map(|(id, w)| (*id, Arc::clone(w)));
        self.tick_order = built_ins.chain(custom).collect();
        tracing::trace!(worlds = self.tick_order.len(), "tick order published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestWorld(String);

    impl WorldInstance for TestWorld {
        fn world_name(&self) -> &str {
            &self.0
        }
    }

    fn world(name: &str) -> Arc<TestWorld> {
        Arc::new(TestWorld(name.into()))
    }

    fn order(table: &WorldInstanceTable<TestWorld>) -> Vec<i32> {
        table.tick_order().iter().map(|(id, _)| id.get()).collect()
    }

    #[test]
    fn tick_order_puts_builtins_first() {
        let mut table = WorldInstanceTable::new(5, 100);
        table.set(DimensionId(7), Some(world("seven")));
        table.set(DimensionId(1), Some(world("end")));
        table.set(DimensionId(3), Some(world("three")));
        table.set(DimensionId(0), Some(world("surface")));
        table.set(DimensionId(-1), Some(world("nether")));

        assert_eq!(order(&table), vec![-1, 0, 1, 3, 7]);
    }

    #[test]
    fn tick_order_skips_missing_builtins() {
        let mut table = WorldInstanceTable::new(5, 100);
        table.set(DimensionId(4), Some(world("four")));
        table.set(DimensionId(0), Some(world("surface")));
        assert_eq!(order(&table), vec![0, 4]);

        table.set(DimensionId(0), None);
        assert_eq!(order(&table), vec![4]);
    }

    #[test]
    fn at_most_one_handle_per_dimension() {
        let mut table = WorldInstanceTable::new(5, 100);
        let first = world("first");
        table.set(DimensionId(2), Some(Arc::clone(&first)));
        let previous = table.set(DimensionId(2), Some(world("second")));

        assert!(Arc::ptr_eq(&previous.unwrap(), &first));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(DimensionId(2)).unwrap().world_name(), "second");
    }

    #[test]
    fn unload_removes_tick_times() {
        let mut table = WorldInstanceTable::new(5, 100);
        table.set(DimensionId(0), Some(world("surface")));
        assert!(table.record_tick_time(DimensionId(0), Duration::from_millis(5)));
        assert_eq!(table.tick_times(DimensionId(0)).unwrap().count(), 1);

        table.set(DimensionId(0), None);
        assert!(table.tick_times(DimensionId(0)).is_none());
        assert!(!table.record_tick_time(DimensionId(0), Duration::from_millis(5)));
    }

    #[test]
    fn held_instance_leaks_after_unload() {
        let mut table = WorldInstanceTable::new(5, 100);
        let held = world("mining");
        table.set(DimensionId(2), Some(Arc::clone(&held)));

        for _ in 0..4 {
            assert!(table.check_leaks().is_empty());
        }
        table.set(DimensionId(2), None);
        let mut warnings = Vec::new();
        for _ in 0..5 {
            warnings.extend(table.check_leaks());
        }
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].first);
        assert_eq!(warnings[0].occurrences, 5);
    }

    #[test]
    fn released_instance_does_not_leak() {
        let mut table = WorldInstanceTable::new(1, 100);
        table.set(DimensionId(2), Some(world("released")));
        table.set(DimensionId(2), None);
        assert!(table.check_leaks().is_empty());
        assert_eq!(table.leak_tracker().observed_count(), 0);
    }

    #[test]
    fn tick_times_track_history() {
        let mut times = TickTimes::new(3);
        times.record(Duration::from_millis(10));
        times.record(Duration::from_millis(20));
        times.record(Duration::from_millis(30));

        assert_eq!(times.count(), 3);
        assert_eq!(times.average(), Duration::from_millis(20));
        assert_eq!(times.max(), Duration::from_millis(30));
        assert_eq!(times.min(), Duration::from_millis(10));
    }

    #[test]
    fn tick_times_wrap_around() {
        let mut times = TickTimes::new(2);
        times.record(Duration::from_millis(10));
        times.record(Duration::from_millis(20));
        times.record(Duration::from_millis(30));

        assert_eq!(times.count(), 2);
        assert_eq!(times.average(), Duration::from_millis(25));
    }
}
