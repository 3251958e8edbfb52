use multiverse_common::DimensionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LifecycleError;

/// Simulation strategy a dimension runs with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Surface,
    NetherLike,
    EndLike,
    /// Host-defined strategy identified by its type name, e.g. `MiningWorldProvider`.
    Custom(String),
}

impl ProviderKind {
    /// Type name the symbolic dimension name is derived from.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Surface => "WorldProviderSurface",
            Self::NetherLike => "WorldProviderHell",
            Self::EndLike => "WorldProviderEnd",
            Self::Custom(name) => name,
        }
    }
}

/// Immutable description of a registered provider type.
///
/// Doubles as the entry announced to the host's dimension-type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    /// Provider type id.
    pub id: i32,
    /// Symbolic name, e.g. `OVERWORLD` or `mining`.
    pub name: String,
    pub kind: ProviderKind,
    /// Whether dimensions of this type keep their spawn area loaded.
    pub keep_loaded: bool,
}

/// Derive the symbolic name of a provider type.
///
/// The three built-in type ids have fixed names. Everything else uses the
/// lowercased type name with `worldprovider` and then `provider` removed.
pub fn symbolic_name(id: i32, kind: &ProviderKind) -> String {
    match id {
        -1 => "NETHER".into(),
        0 => "OVERWORLD".into(),
        1 => "END".into(),
        _ => kind
            .type_name()
            .to_lowercase()
            .replace("worldprovider", "")
            .replace("provider", ""),
    }
}

/// Maps provider type ids to descriptors and dimension ids to provider types.
///
/// Registration is additive: nothing is ever removed at runtime.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    providers: BTreeMap<i32, DimensionDescriptor>,
    dimensions: BTreeMap<DimensionId, i32>,
}

/// Built-in provider types in announcement order. Each is bound to the
/// dimension with the same id.
pub const BUILT_IN_PROVIDERS: [(DimensionId, ProviderKind); 3] = [
    (DimensionId::SURFACE, ProviderKind::Surface),
    (DimensionId::NETHER, ProviderKind::NetherLike),
    (DimensionId::END, ProviderKind::EndLike),
];

impl DimensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in provider types and dimensions, all
    /// flagged keep-loaded.
    pub fn with_built_ins() -> Self {
        let mut registry = Self::new();
        for (dimension, kind) in BUILT_IN_PROVIDERS {
            let id = dimension.get();
            let descriptor = DimensionDescriptor {
                id,
                name: symbolic_name(id, &kind),
                kind,
                keep_loaded: true,
            };
            registry.providers.insert(id, descriptor);
            registry.dimensions.insert(dimension, id);
        }
        registry
    }

    /// Register a provider type. Returns the stored descriptor.
    pub fn register_provider(
        &mut self,
        id: i32,
        kind: ProviderKind,
        keep_loaded: bool,
    ) -> Result<&DimensionDescriptor, LifecycleError> {
        if self.providers.contains_key(&id) {
            return Err(LifecycleError::DuplicateProvider(id));
        }
        let name = symbolic_name(id, &kind);
        if self.providers.values().any(|d| d.name == name) {
            return Err(LifecycleError::DuplicateTypeName { id, name });
        }
        tracing::info!(id, %name, keep_loaded, "registered provider type");
        let descriptor = DimensionDescriptor {
            id,
            name,
            kind,
            keep_loaded,
        };
        Ok(self.providers.entry(id).or_insert(descriptor))
    }

    /// Bind a dimension id to a registered provider type.
    pub fn register_dimension(
        &mut self,
        dimension: DimensionId,
        provider: i32,
    ) -> Result<(), LifecycleError> {
        if !self.providers.contains_key(&provider) {
            return Err(LifecycleError::UnknownProviderKind {
                dimension,
                provider,
            });
        }
        if self.dimensions.contains_key(&dimension) {
            return Err(LifecycleError::DuplicateDimension(dimension));
        }
        self.dimensions.insert(dimension, provider);
        tracing::info!(%dimension, provider, "registered dimension");
        Ok(())
    }

    /// Provider type id bound to a dimension.
    pub fn provider_type(&self, dimension: DimensionId) -> Result<i32, LifecycleError> {
        self.dimensions
            .get(&dimension)
            .copied()
            .ok_or(LifecycleError::UnknownDimension(dimension))
    }

    pub fn descriptor_for(
        &self,
        dimension: DimensionId,
    ) -> Result<&DimensionDescriptor, LifecycleError> {
        let provider = self.provider_type(dimension)?;
        self.providers
            .get(&provider)
            .ok_or(LifecycleError::UnknownProviderKind {
                dimension,
                provider,
            })
    }

    pub fn provider_kind(&self, dimension: DimensionId) -> Result<&ProviderKind, LifecycleError> {
        self.descriptor_for(dimension).map(|d| &d.kind)
    }

    pub fn provider(&self, id: i32) -> Option<&DimensionDescriptor> {
        self.providers.get(&id)
    }

    /// Keep-loaded flag of the dimension's provider; false when unknown.
    pub fn should_keep_loaded(&self, dimension: DimensionId) -> bool {
        self.descriptor_for(dimension)
            .map(|d| d.keep_loaded)
            .unwrap_or(false)
    }

    pub fn is_registered(&self, dimension: DimensionId) -> bool {
        self.dimensions.contains_key(&dimension)
    }

    /// All registered dimension ids, loaded or not, ascending.
    pub fn dimension_ids(&self) -> impl Iterator<Item = DimensionId> + '_ {
        self.dimensions.keys().copied()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &DimensionDescriptor> {
        self.providers.values()
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str) -> ProviderKind {
        ProviderKind::Custom(name.into())
    }

    #[test]
    fn builtin_names_are_fixed() {
        assert_eq!(symbolic_name(-1, &ProviderKind::NetherLike), "NETHER");
        assert_eq!(symbolic_name(0, &ProviderKind::Surface), "OVERWORLD");
        assert_eq!(symbolic_name(1, &ProviderKind::EndLike), "END");
    }

    #[test]
    fn custom_names_strip_provider_suffixes() {
        assert_eq!(symbolic_name(7, &custom("FooWorldProvider")), "foo");
        assert_eq!(symbolic_name(7, &custom("MiningProvider")), "mining");
        assert_eq!(symbolic_name(7, &custom("WorldProviderMoon")), "moon");
        assert_eq!(symbolic_name(7, &ProviderKind::Surface), "surface");
    }

    #[test]
    fn built_ins_present_and_kept_loaded() {
        let reg = DimensionRegistry::with_built_ins();
        assert_eq!(reg.dimension_count(), 3);
        for (dimension, kind) in BUILT_IN_PROVIDERS {
            assert_eq!(reg.provider_kind(dimension).unwrap(), &kind);
            assert!(reg.should_keep_loaded(dimension));
        }
        assert_eq!(reg.provider(-1).unwrap().name, "NETHER");
        let mut reg = reg;
        let err = reg
            .register_provider(0, custom("FooWorldProvider"), false)
            .unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateProvider(0));
    }

    #[test]
    fn duplicate_provider_rejected() {
        let mut reg = DimensionRegistry::new();
        reg.register_provider(2, custom("MiningWorldProvider"), false)
            .unwrap();
        let err = reg
            .register_provider(2, custom("OtherWorldProvider"), false)
            .unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateProvider(2));
    }

    #[test]
    fn duplicate_type_name_rejected() {
        let mut reg = DimensionRegistry::new();
        reg.register_provider(2, custom("MiningWorldProvider"), false)
            .unwrap();
        let err = reg
            .register_provider(3, custom("MiningProvider"), false)
            .unwrap_err();
        assert_eq!(
            err,
            LifecycleError::DuplicateTypeName {
                id: 3,
                name: "mining".into()
            }
        );
    }

    #[test]
    fn dimension_needs_known_provider() {
        let mut reg = DimensionRegistry::new();
        let err = reg.register_dimension(DimensionId(4), 9).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::UnknownProviderKind {
                dimension: DimensionId(4),
                provider: 9
            }
        );
    }

    #[test]
    fn duplicate_dimension_rejected() {
        let mut reg = DimensionRegistry::new();
        reg.register_provider(0, ProviderKind::Surface, true).unwrap();
        reg.register_dimension(DimensionId(0), 0).unwrap();
        let err = reg.register_dimension(DimensionId(0), 0).unwrap_err();
        assert_eq!(err, LifecycleError::DuplicateDimension(DimensionId(0)));
    }

    #[test]
    fn lookup_unknown_dimension_fails() {
        let reg = DimensionRegistry::new();
        assert_eq!(
            reg.provider_kind(DimensionId(12)).unwrap_err(),
            LifecycleError::UnknownDimension(DimensionId(12))
        );
    }

    #[test]
    fn keep_loaded_follows_provider_flag() {
        let mut reg = DimensionRegistry::new();
        reg.register_provider(0, ProviderKind::Surface, true).unwrap();
        reg.register_provider(5, custom("LazyWorldProvider"), false)
            .unwrap();
        reg.register_dimension(DimensionId(0), 0).unwrap();
        reg.register_dimension(DimensionId(5), 5).unwrap();

        assert!(reg.should_keep_loaded(DimensionId(0)));
        assert!(!reg.should_keep_loaded(DimensionId(5)));
        assert!(!reg.should_keep_loaded(DimensionId(99)));
    }

    #[test]
    fn several_dimensions_share_a_provider() {
        let mut reg = DimensionRegistry::new();
        reg.register_provider(0, ProviderKind::Surface, true).unwrap();
        reg.register_dimension(DimensionId(0), 0).unwrap();
        reg.register_dimension(DimensionId(8), 0).unwrap();
        assert_eq!(
            reg.provider_kind(DimensionId(8)).unwrap(),
            &ProviderKind::Surface
        );
        assert_eq!(
            reg.dimension_ids().collect::<Vec<_>>(),
            vec![DimensionId(0), DimensionId(8)]
        );
    }
}
