use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Integer block coordinate inside a dimension.
pub type BlockPos = IVec3;

/// Identifier of a dimension. Negative ids are reserved for built-ins and
/// never take part in id allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DimensionId(pub i32);

impl DimensionId {
    /// Built-in hell-like dimension.
    pub const NETHER: Self = Self(-1);
    /// Built-in surface dimension. Everything else depends on it being loaded.
    pub const SURFACE: Self = Self(0);
    /// Built-in end-like (terminal) dimension.
    pub const END: Self = Self(1);

    /// The three built-ins in the order the tick driver expects them.
    pub const BUILT_INS: [Self; 3] = [Self::NETHER, Self::SURFACE, Self::END];

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_built_in(self) -> bool {
        (-1..=1).contains(&self.0)
    }

    /// Whether this id participates in bitmap allocation.
    pub fn is_allocatable(self) -> bool {
        self.0 >= 0
    }
}

impl From<i32> for DimensionId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DimensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an actor (a connected player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// A precise position bound to a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub dimension: DimensionId,
    pub position: DVec3,
}

impl Location {
    pub fn new(dimension: DimensionId, position: DVec3) -> Self {
        Self {
            dimension,
            position,
        }
    }

    /// Location at the corner of a block, without any centring offset.
    pub fn at_block(dimension: DimensionId, block: BlockPos) -> Self {
        Self::new(dimension, block.as_dvec3())
    }
}
