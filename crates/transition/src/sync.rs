//! State-sync updates delivered to an actor's remote endpoint.

use multiverse_common::{ActorId, BlockPos, DVec3, DimensionId};
use multiverse_kernel::ProviderKind;
use serde::{Deserialize, Serialize};

use crate::actor::{Abilities, Experience, GameMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Peaceful,
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderState {
    pub center_x: f64,
    pub center_z: f64,
    pub diameter: f64,
    pub warning_distance: i32,
    pub warning_time: i32,
}

impl Default for BorderState {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_z: 0.0,
            diameter: 60_000_000.0,
            warning_distance: 5,
            warning_time: 15,
        }
    }
}

/// Host-reported state of a world that actors must see on arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConditions {
    pub difficulty: Difficulty,
    pub difficulty_locked: bool,
    pub hardcore: bool,
    pub terrain: String,
    pub border: BorderState,
    pub total_time: i64,
    pub day_time: i64,
    pub daylight_cycle: bool,
    pub raining: bool,
    pub rain_strength: f32,
    pub thunder_strength: f32,
}

impl Default for WorldConditions {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            difficulty_locked: false,
            hardcore: false,
            terrain: "default".into(),
            border: BorderState::default(),
            total_time: 0,
            day_time: 0,
            daylight_cycle: true,
            raining: false,
            rain_strength: 0.0,
            thunder_strength: 0.0,
        }
    }
}

/// One typed update for the remote endpoint. Order of delivery matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyncUpdate {
    /// Announces a dimension id and its provider type to capability-aware endpoints.
    DimensionRegistration {
        dimension: DimensionId,
        provider: i32,
    },
    JoinGame {
        dimension: DimensionId,
        game_mode: GameMode,
        hardcore: bool,
        difficulty: Difficulty,
        max_players: u32,
        terrain: String,
    },
    Respawn {
        dimension: DimensionId,
        difficulty: Difficulty,
        game_mode: GameMode,
        terrain: String,
    },
    Brand(String),
    Difficulty {
        difficulty: Difficulty,
        locked: bool,
    },
    WorldBorder(BorderState),
    Time {
        total: i64,
        day: i64,
        daylight_cycle: bool,
    },
    BeginRain,
    RainStrength(f32),
    ThunderStrength(f32),
    PlayerPosition {
        position: DVec3,
        yaw: f32,
        pitch: f32,
    },
    SpawnPosition(BlockPos),
    Experience(Experience),
    Abilities(Abilities),
    HeldItem(u8),
    /// The actor's bed spawn could not be used.
    SpawnPointInvalid,
}

impl SyncUpdate {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DimensionRegistration { .. } => "dimension_registration",
            Self::JoinGame { .. } => "join_game",
            Self::Respawn { .. } => "respawn",
            Self::Brand(_) => "brand",
            Self::Difficulty { .. } => "difficulty",
            Self::WorldBorder(_) => "world_border",
            Self::Time { .. } => "time",
            Self::BeginRain => "begin_rain",
            Self::RainStrength(_) => "rain_strength",
            Self::ThunderStrength(_) => "thunder_strength",
            Self::PlayerPosition { .. } => "player_position",
            Self::SpawnPosition(_) => "spawn_position",
            Self::Experience(_) => "experience",
            Self::Abilities(_) => "abilities",
            Self::HeldItem(_) => "held_item",
            Self::SpawnPointInvalid => "spawn_point_invalid",
        }
    }
}

/// Delivers updates to remote endpoints in the order given.
pub trait SyncSink {
    fn send(&mut self, actor: ActorId, update: SyncUpdate);
}

/// Dimension id to advertise to an endpoint.
///
/// Baseline endpoints only know the three built-in ids, so custom
/// dimensions are mapped onto the built-in that shares their provider kind.
pub fn client_dimension(
    dimension: DimensionId,
    kind: &ProviderKind,
    capability_aware: bool,
) -> DimensionId {
    if capability_aware || dimension.is_built_in() {
        return dimension;
    }
    match kind {
        ProviderKind::NetherLike => DimensionId::NETHER,
        ProviderKind::EndLike => DimensionId::END,
        ProviderKind::Surface | ProviderKind::Custom(_) => DimensionId::SURFACE,
    }
}

/// Border, time and weather updates, in delivery order.
pub fn time_and_weather(conditions: &WorldConditions) -> Vec<SyncUpdate> {
    let mut updates = vec![
        SyncUpdate::WorldBorder(conditions.border),
        SyncUpdate::Time {
            total: conditions.total_time,
            day: conditions.day_time,
            daylight_cycle: conditions.daylight_cycle,
        },
    ];
    if conditions.raining {
        updates.push(SyncUpdate::BeginRain);
        updates.push(SyncUpdate::RainStrength(conditions.rain_strength));
        updates.push(SyncUpdate::ThunderStrength(conditions.thunder_strength));
    }
    updates
}
