use std::collections::BTreeMap;

use multiverse_common::{ActorId, BlockPos, DVec3, DimensionId, Location};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// A bed-like personal spawn recorded for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedSpawn {
    pub position: BlockPos,
    /// Forced spawns are used even when the bed block itself is gone.
    pub forced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Experience {
    /// Progress towards the next level, `0.0..1.0`.
    pub progress: f32,
    pub total: i32,
    pub level: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Abilities {
    pub invulnerable: bool,
    pub flying: bool,
    pub may_fly: bool,
    pub instant_build: bool,
    pub fly_speed: f32,
    pub walk_speed: f32,
}

impl Default for Abilities {
    fn default() -> Self {
        Self {
            invulnerable: false,
            flying: false,
            may_fly: false,
            instant_build: false,
            fly_speed: 0.05,
            walk_speed: 0.1,
        }
    }
}

/// Host-owned state of a connected actor that transitions read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub dimension: DimensionId,
    pub position: DVec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Personal respawn location, independent of beds.
    pub respawn_point: Option<Location>,
    pub bed_spawns: BTreeMap<DimensionId, BedSpawn>,
    pub experience: Experience,
    pub abilities: Abilities,
    pub selected_slot: u8,
    pub game_mode: GameMode,
    pub health: f32,
    pub max_health: f32,
    /// Whether the remote endpoint understands the full dimension id space.
    pub capability_aware: bool,
}

impl ActorState {
    pub fn new(name: impl Into<String>, dimension: DimensionId, position: DVec3) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            dimension,
            position,
            yaw: 0.0,
            pitch: 0.0,
            respawn_point: None,
            bed_spawns: BTreeMap::new(),
            experience: Experience::default(),
            abilities: Abilities::default(),
            selected_slot: 0,
            game_mode: GameMode::default(),
            health: 20.0,
            max_health: 20.0,
            capability_aware: false,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.dimension, self.position)
    }

    pub fn bed_spawn(&self, dimension: DimensionId) -> Option<BedSpawn> {
        self.bed_spawns.get(&dimension).copied()
    }

    pub fn set_bed_spawn(&mut self, dimension: DimensionId, position: BlockPos, forced: bool) {
        self.bed_spawns
            .insert(dimension, BedSpawn { position, forced });
    }

    pub fn clear_bed_spawn(&mut self, dimension: DimensionId) {
        self.bed_spawns.remove(&dimension);
    }

    /// Restore the state of a freshly respawned actor.
    ///
    /// Identity, spawn points, abilities and the endpoint flag survive.
    pub fn reset(&mut self) {
        self.health = self.max_health;
        self.experience = Experience::default();
        self.yaw = 0.0;
        self.pitch = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_keeps_spawn_points() {
        let mut actor = ActorState::new("steve", DimensionId::SURFACE, DVec3::ZERO);
        actor.health = 3.0;
        actor.experience.level = 12;
        actor.set_bed_spawn(DimensionId::SURFACE, BlockPos::new(1, 70, 1), false);
        actor.respawn_point = Some(Location::new(DimensionId::SURFACE, DVec3::ONE));

        actor.reset();
        assert_eq!(actor.health, actor.max_health);
        assert_eq!(actor.experience, Experience::default());
        assert!(actor.bed_spawn(DimensionId::SURFACE).is_some());
        assert!(actor.respawn_point.is_some());
    }

    #[test]
    fn bed_spawns_are_per_dimension() {
        let mut actor = ActorState::new("alex", DimensionId::SURFACE, DVec3::ZERO);
        actor.set_bed_spawn(DimensionId(2), BlockPos::new(5, 10, 5), true);
        assert!(actor.bed_spawn(DimensionId::SURFACE).is_none());
        assert_eq!(
            actor.bed_spawn(DimensionId(2)),
            Some(BedSpawn {
                position: BlockPos::new(5, 10, 5),
                forced: true
            })
        );
        actor.clear_bed_spawn(DimensionId(2));
        assert!(actor.bed_spawns.is_empty());
    }
}
