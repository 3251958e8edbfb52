use multiverse_common::{DimensionId, EngineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::alloc::IdAllocator;
use crate::error::LifecycleError;
use crate::host::{DimensionCatalog, WorldFactory, WorldInstance};
use crate::leak::LeakWarning;
use crate::registry::{BUILT_IN_PROVIDERS, DimensionDescriptor, DimensionRegistry, ProviderKind};
use crate::table::{TickTimes, WorldInstanceTable};

/// All dimension bookkeeping for one host process.
///
/// Constructed once by the host and passed to whatever needs it. The three
/// built-in provider types and dimensions (`-1`, `0`, `1`) are registered on
/// construction. Mutation is single-writer: the host serializes registration
/// during startup, before any transition runs.
pub struct WorldLifecycleContext<W> {
    registry: DimensionRegistry,
    allocator: IdAllocator,
    worlds: WorldInstanceTable<W>,
    unload_queue: Vec<DimensionId>,
    catalog: Box<dyn DimensionCatalog>,
    config: EngineConfig,
}

impl<W: WorldInstance> WorldLifecycleContext<W> {
    pub fn new(config: EngineConfig, catalog: Box<dyn DimensionCatalog>) -> Self {
        let registry = DimensionRegistry::with_built_ins();
        let mut allocator = IdAllocator::new();
        let mut catalog = catalog;
        for (dimension, _) in BUILT_IN_PROVIDERS {
            if let Some(descriptor) = registry.provider(dimension.get()) {
                catalog.register_dimension_type(descriptor);
            }
            allocator.mark(dimension);
        }
        tracing::debug!("registered built-in dimensions");

        Self {
            registry,
            allocator,
            worlds: WorldInstanceTable::new(config.leak_warning_interval, config.tick_history),
            unload_queue: Vec::new(),
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a provider type and announce it to the host catalog.
    pub fn register_provider(
        &mut self,
        id: i32,
        kind: ProviderKind,
        keep_loaded: bool,
    ) -> Result<(), LifecycleError> {
        let descriptor = self.registry.register_provider(id, kind, keep_loaded)?;
        self.catalog.register_dimension_type(descriptor);
        Ok(())
    }

    /// Bind `dimension` to a provider type and mark its id in use.
    pub fn register_dimension(
        &mut self,
        dimension: DimensionId,
        provider: i32,
    ) -> Result<(), LifecycleError> {
        self.registry.register_dimension(dimension, provider)?;
        self.allocator.mark(dimension);
        Ok(())
    }

    /// Mark the id of an already registered dimension in use.
    pub fn register_fixed(&mut self, dimension: DimensionId) -> Result<(), LifecycleError> {
        if !dimension.is_allocatable() {
            return Ok(());
        }
        let provider = self.registry.provider_type(dimension).map_err(|_| {
            LifecycleError::UnknownProviderKind {
                dimension,
                provider: dimension.get(),
            }
        })?;
        if self.registry.provider(provider).is_none() {
            return Err(LifecycleError::UnknownProviderKind {
                dimension,
                provider,
            });
        }
        self.allocator.claim(dimension)
    }

    /// Lowest id not claimed by any registered dimension.
    pub fn next_free_id(&mut self) -> DimensionId {
        let registry = &self.registry;
        let id = self.allocator.next_free_id(|id| registry.is_registered(id));
        tracing::debug!(%id, "next free dimension id");
        id
    }

    // --- Lookup ---

    pub fn provider_kind(&self, dimension: DimensionId) -> Result<&ProviderKind, LifecycleError> {
        self.registry.provider_kind(dimension)
    }

    pub fn descriptor_for(
        &self,
        dimension: DimensionId,
    ) -> Result<&DimensionDescriptor, LifecycleError> {
        self.registry.descriptor_for(dimension)
    }

    pub fn should_keep_loaded(&self, dimension: DimensionId) -> bool {
        self.registry.should_keep_loaded(dimension)
    }

    pub fn is_registered(&self, dimension: DimensionId) -> bool {
        self.registry.is_registered(dimension)
    }

    /// Every registered dimension, loaded or not.
    pub fn registered_ids(&self) -> Vec<DimensionId> {
        self.registry.dimension_ids().collect()
    }

    pub fn registry(&self) -> &DimensionRegistry {
        &self.registry
    }

    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    // --- Persistence hooks ---

    /// Allocator bitmap as persisted words.
    pub fn id_map_words(&self) -> Vec<i32> {
        self.allocator.snapshot()
    }

    /// Replace the allocator state from persisted words.
    ///
    /// Without saved words the bitmap is seeded from every registered
    /// non-negative id, so a fresh save stays consistent with code-registered
    /// dimensions.
    pub fn restore_id_map(&mut self, words: Option<&[i32]>) {
        match words {
            Some(words) => {
                self.allocator.restore(words);
                tracing::debug!(words = words.len(), "restored dimension id map");
            }
            None => {
                self.allocator.seed(self.registry.dimension_ids());
                tracing::debug!("seeded dimension id map from registered dimensions");
            }
        }
    }

    // --- Live worlds ---

    /// Mark a dimension live or unloaded. Returns the previously live handle.
    pub fn set_world(&mut self, dimension: DimensionId, world: Option<Arc<W>>) -> Option<Arc<W>> {
        self.worlds.set(dimension, world)
    }

    pub fn world(&self, dimension: DimensionId) -> Option<&Arc<W>> {
        self.worlds.get(dimension)
    }

    pub fn live_ids(&self) -> Vec<DimensionId> {
        self.worlds.live_ids()
    }

    /// Live ids, optionally sweeping for leaked instances first.
    pub fn live_ids_checked(&mut self, check: bool) -> Vec<DimensionId> {
        if check {
            self.check_leaks();
        }
        self.live_ids()
    }

    pub fn check_leaks(&mut self) -> Vec<LeakWarning> {
        self.worlds.check_leaks()
    }

    /// Loaded worlds in the order the tick driver must run them.
    pub fn tick_order(&self) -> &[(DimensionId, Arc<W>)] {
        self.worlds.tick_order()
    }

    pub fn worlds(&self) -> &WorldInstanceTable<W> {
        &self.worlds
    }

    pub fn record_tick_time(&mut self, dimension: DimensionId, dt: Duration) -> bool {
        self.worlds.record_tick_time(dimension, dt)
    }

    pub fn tick_times(&self, dimension: DimensionId) -> Option<&TickTimes> {
        self.worlds.tick_times(dimension)
    }

    /// Save directory of the surface world, if it is loaded and has one.
    pub fn save_root_dir(&self) -> Option<PathBuf> {
        self.world(DimensionId::SURFACE)
            .and_then(|w| w.save_dir())
            .map(|p| p.to_path_buf())
    }

    // --- Hotload / unload ---

    /// Instantiate and set live a registered dimension at runtime.
    ///
    /// Requires the surface dimension to be live: other worlds share its save
    /// data. Loading the surface itself just re-announces the existing world.
    pub fn init_dimension(
        &mut self,
        dimension: DimensionId,
        factory: &mut dyn WorldFactory<W>,
    ) -> Result<Arc<W>, LifecycleError> {
        let Some(surface) = self.world(DimensionId::SURFACE).cloned() else {
            tracing::error!(%dimension, "cannot hotload dimension: surface is not loaded");
            return Err(LifecycleError::SurfaceNotLoaded(dimension));
        };
        let descriptor = match self.registry.descriptor_for(dimension) {
            Ok(d) => d.clone(),
            Err(e) => {
                tracing::error!(%dimension, error = %e, "cannot hotload dimension");
                return Err(e);
            }
        };

        let world = if dimension == DimensionId::SURFACE {
            surface
        } else {
            let world = factory.create_world(dimension, &descriptor, &surface)?;
            self.set_world(dimension, Some(Arc::clone(&world)));
            world
        };
        factory.world_loaded(dimension, &world);
        Ok(world)
    }

    /// Queue a dimension for unloading at the host's next convenient point.
    pub fn queue_unload(&mut self, dimension: DimensionId) {
        self.unload_queue.push(dimension);
    }

    /// Take queued dimensions in queue order, skipping keep-loaded ones.
    pub fn drain_unload_queue(&mut self) -> Vec<DimensionId> {
        let queued = std::mem::take(&mut self.unload_queue);
        queued
            .into_iter()
            .filter(|id| {
                let keep = self.registry.should_keep_loaded(*id);
                if keep {
                    tracing::debug!(%id, "not unloading keep-loaded dimension");
                }
                !keep
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullCatalog;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Debug)]
    struct TestWorld {
        name: String,
        dir: Option<PathBuf>,
    }

    impl WorldInstance for TestWorld {
        fn world_name(&self) -> &str {
            &self.name
        }

        fn save_dir(&self) -> Option<&Path> {
            self.dir.as_deref()
        }
    }

    fn world(name: &str) -> Arc<TestWorld> {
        Arc::new(TestWorld {
            name: name.into(),
            dir: None,
        })
    }

    fn ctx() -> WorldLifecycleContext<TestWorld> {
        WorldLifecycleContext::new(EngineConfig::default(), Box::new(NullCatalog))
    }

    struct SharedCatalog(Rc<RefCell<Vec<String>>>);

    impl DimensionCatalog for SharedCatalog {
        fn register_dimension_type(&mut self, descriptor: &DimensionDescriptor) {
            self.0.borrow_mut().push(descriptor.name.clone());
        }
    }

    #[derive(Default)]
    struct TestFactory {
        created: Vec<DimensionId>,
        loaded: Vec<DimensionId>,
    }

    impl WorldFactory<TestWorld> for TestFactory {
        fn create_world(
            &mut self,
            dimension: DimensionId,
            descriptor: &DimensionDescriptor,
            _surface: &Arc<TestWorld>,
        ) -> Result<Arc<TestWorld>, LifecycleError> {
            self.created.push(dimension);
            Ok(world(&descriptor.name))
        }

        fn world_loaded(&mut self, dimension: DimensionId, _world: &Arc<TestWorld>) {
            self.loaded.push(dimension);
        }
    }

    fn register_mining(ctx: &mut WorldLifecycleContext<TestWorld>) -> DimensionId {
        ctx.register_provider(2, ProviderKind::Custom("MiningWorldProvider".into()), false)
            .unwrap();
        let id = ctx.next_free_id();
        ctx.register_dimension(id, 2).unwrap();
        id
    }

    #[test]
    fn builtins_registered_on_construction() {
        let ctx = ctx();
        assert_eq!(
            ctx.registered_ids(),
            vec![DimensionId(-1), DimensionId(0), DimensionId(1)]
        );
        assert_eq!(ctx.provider_kind(DimensionId::NETHER).unwrap(), &ProviderKind::NetherLike);
        assert!(ctx.should_keep_loaded(DimensionId::END));
        assert!(ctx.allocator().contains(DimensionId(0)));
        assert!(ctx.allocator().contains(DimensionId(1)));
    }

    #[test]
    fn catalog_hears_every_provider() {
        let names = Rc::new(RefCell::new(Vec::new()));
        let mut ctx: WorldLifecycleContext<TestWorld> = WorldLifecycleContext::new(
            EngineConfig::default(),
            Box::new(SharedCatalog(Rc::clone(&names))),
        );
        ctx.register_provider(2, ProviderKind::Custom("FooWorldProvider".into()), false)
            .unwrap();
        assert_eq!(*names.borrow(), vec!["OVERWORLD", "NETHER", "END", "foo"]);
    }

    #[test]
    fn registered_id_never_handed_out_again() {
        let mut ctx = ctx();
        let first = ctx.next_free_id();
        assert_eq!(first, DimensionId(2));
        ctx.register_provider(2, ProviderKind::Custom("MiningWorldProvider".into()), false)
            .unwrap();
        ctx.register_dimension(first, 2).unwrap();
        for _ in 0..3 {
            assert_ne!(ctx.next_free_id(), first);
        }
    }

    #[test]
    fn mining_scenario_allocates_three_next() {
        let mut ctx = ctx();
        let id = register_mining(&mut ctx);
        assert_eq!(id, DimensionId(2));
        assert_eq!(ctx.next_free_id(), DimensionId(3));
    }

    #[test]
    fn register_dimension_twice_fails() {
        let mut ctx = ctx();
        let err = ctx.register_dimension(DimensionId(0), 0).unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateDimension(DimensionId(0)));
    }

    #[test]
    fn register_dimension_with_unknown_provider_fails() {
        let mut ctx = ctx();
        let err = ctx.register_dimension(DimensionId(5), 42).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::UnknownProviderKind {
                dimension: DimensionId(5),
                provider: 42
            }
        );
        assert!(!ctx.allocator().contains(DimensionId(5)));
    }

    #[test]
    fn register_fixed_requires_registered_dimension() {
        let mut ctx = ctx();
        assert!(matches!(
            ctx.register_fixed(DimensionId(9)),
            Err(LifecycleError::UnknownProviderKind { .. })
        ));
        assert_eq!(
            ctx.register_fixed(DimensionId(0)),
            Err(LifecycleError::AlreadyRegistered(DimensionId(0)))
        );
        assert!(ctx.register_fixed(DimensionId(-1)).is_ok());
    }

    #[test]
    fn register_fixed_after_restore_marks_bit() {
        let mut ctx = ctx();
        let id = register_mining(&mut ctx);
        ctx.restore_id_map(Some(&[0b11]));
        assert!(!ctx.allocator().contains(id));
        ctx.register_fixed(id).unwrap();
        assert!(ctx.allocator().contains(id));
    }

    #[test]
    fn restore_without_words_seeds_registered_ids() {
        let mut ctx = ctx();
        let id = register_mining(&mut ctx);
        ctx.restore_id_map(Some(&[]));
        assert!(ctx.allocator().is_empty());

        ctx.restore_id_map(None);
        let marked: Vec<_> = ctx.allocator().ids().collect();
        assert_eq!(marked, vec![DimensionId(0), DimensionId(1), id]);
    }

    #[test]
    fn persisted_words_roundtrip_keeps_next_free() {
        let mut ctx = ctx();
        register_mining(&mut ctx);
        let words = ctx.id_map_words();

        let mut reloaded = self::ctx();
        reloaded.restore_id_map(Some(&words));
        assert!(reloaded.allocator().contains(DimensionId(2)));
        assert_eq!(reloaded.next_free_id(), DimensionId(3));
    }

    #[test]
    fn hotload_requires_surface() {
        let mut ctx = ctx();
        let mut factory = TestFactory::default();
        let err = ctx
            .init_dimension(DimensionId::END, &mut factory)
            .unwrap_err();
        assert_eq!(err, LifecycleError::SurfaceNotLoaded(DimensionId::END));
        assert!(factory.created.is_empty());
    }

    #[test]
    fn hotload_unknown_dimension_fails() {
        let mut ctx = ctx();
        ctx.set_world(DimensionId::SURFACE, Some(world("surface")));
        let mut factory = TestFactory::default();
        let err = ctx
            .init_dimension(DimensionId(12), &mut factory)
            .unwrap_err();
        assert_eq!(err, LifecycleError::UnknownDimension(DimensionId(12)));
    }

    #[test]
    fn hotload_sets_world_live_and_announces() {
        let mut ctx = ctx();
        ctx.set_world(DimensionId::SURFACE, Some(world("surface")));
        let id = register_mining(&mut ctx);
        let mut factory = TestFactory::default();

        let created = ctx.init_dimension(id, &mut factory).unwrap();
        assert_eq!(created.world_name(), "mining");
        assert!(ctx.world(id).is_some());
        assert_eq!(factory.created, vec![id]);
        assert_eq!(factory.loaded, vec![id]);
        assert_eq!(ctx.live_ids(), vec![DimensionId(0), id]);
    }

    #[test]
    fn hotload_surface_reuses_instance() {
        let mut ctx = ctx();
        let surface = world("surface");
        ctx.set_world(DimensionId::SURFACE, Some(Arc::clone(&surface)));
        let mut factory = TestFactory::default();

        let loaded = ctx
            .init_dimension(DimensionId::SURFACE, &mut factory)
            .unwrap();
        assert!(Arc::ptr_eq(&loaded, &surface));
        assert!(factory.created.is_empty());
        assert_eq!(factory.loaded, vec![DimensionId::SURFACE]);
    }

    #[test]
    fn unload_queue_skips_keep_loaded() {
        let mut ctx = ctx();
        let id = register_mining(&mut ctx);
        ctx.queue_unload(DimensionId::END);
        ctx.queue_unload(id);
        assert_eq!(ctx.drain_unload_queue(), vec![id]);
        assert!(ctx.drain_unload_queue().is_empty());
    }

    #[test]
    fn save_root_comes_from_surface() {
        let mut ctx = ctx();
        assert!(ctx.save_root_dir().is_none());
        ctx.set_world(
            DimensionId::SURFACE,
            Some(Arc::new(TestWorld {
                name: "surface".into(),
                dir: Some(PathBuf::from("/saves/world")),
            })),
        );
        assert_eq!(ctx.save_root_dir(), Some(PathBuf::from("/saves/world")));
    }

    #[test]
    fn live_ids_checked_sweeps() {
        let mut ctx = ctx();
        let held = world("held");
        ctx.set_world(DimensionId(4), Some(Arc::clone(&held)));
        ctx.set_world(DimensionId(4), None);
        for _ in 0..5 {
            assert!(ctx.live_ids_checked(true).is_empty());
        }
        assert_eq!(ctx.worlds().leak_tracker().sightings(1), 5);
    }
}
