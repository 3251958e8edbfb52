use multiverse_common::{DimensionId, EngineConfig};
use multiverse_kernel::{ProviderKind, WorldLifecycleContext};
use multiverse_persist::{IntArray, PersistenceBridge, Value};
use multiverse_test_support::{FakeWorld, RecordingCatalog};

fn context_in(
    dir: &std::path::Path,
    catalog: RecordingCatalog,
) -> WorldLifecycleContext<FakeWorld> {
    let mut ctx = WorldLifecycleContext::new(EngineConfig::default(), Box::new(catalog));
    ctx.set_world(
        DimensionId::SURFACE,
        Some(
            FakeWorld::new("overworld", DimensionId::SURFACE)
                .with_save_dir(dir)
                .shared(),
        ),
    );
    ctx
}

#[test]
fn mining_dimension_survives_save_and_reload() {
    let tmp = tempfile::tempdir().unwrap();
    let catalog = RecordingCatalog::new();
    let bridge = PersistenceBridge::from_config(&EngineConfig::default());

    let mut ctx = context_in(tmp.path(), catalog.clone());
    ctx.register_provider(2, ProviderKind::Custom("MiningWorldProvider".into()), false)
        .unwrap();
    let mining = ctx.next_free_id();
    assert_eq!(mining, DimensionId(2));
    ctx.register_dimension(mining, 2).unwrap();
    assert_eq!(ctx.next_free_id(), DimensionId(3));
    assert_eq!(catalog.names(), vec!["OVERWORLD", "NETHER", "END", "mining"]);

    let store = bridge.store_for(&ctx).unwrap();
    assert!(bridge.save(&ctx, &store));
    assert!(tmp.path().join("level_multiverse.dat").exists());

    let mut reloaded = context_in(tmp.path(), RecordingCatalog::new());
    let reloaded_store = bridge.store_for(&reloaded).unwrap();
    bridge.load(&mut reloaded, &reloaded_store).unwrap();
    assert!(reloaded.allocator().contains(mining));
    assert_eq!(reloaded.next_free_id(), DimensionId(3));
}

#[test]
fn saved_file_has_namespaced_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let bridge = PersistenceBridge::new("Sponge", "level_sponge");
    let ctx = context_in(tmp.path(), RecordingCatalog::new());

    let store = bridge.store_for(&ctx).unwrap();
    assert!(bridge.save(&ctx, &store));

    let root = store.load().unwrap().unwrap();
    let mut node = root.get("Sponge");
    for key in ["Forge", "DimensionData", "DimensionArray"] {
        node = match node {
            Some(Value::Compound(inner)) => inner.get(key),
            _ => None,
        };
    }
    assert_eq!(node, Some(&Value::IntArray(IntArray::new(vec![0b11]))));
}

#[test]
fn no_store_without_surface_save_dir() {
    let ctx: WorldLifecycleContext<FakeWorld> = multiverse_test_support::surface_context();
    let bridge = PersistenceBridge::from_config(&EngineConfig::default());
    assert!(bridge.store_for(&ctx).is_none());
}
