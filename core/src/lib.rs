#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lawn Defence simulation.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pure gameplay systems and the host application. The world stores
//! entities built from the closed [`components::Component`] set, systems
//! mutate them once per frame, and every observable side effect leaves the
//! simulation as an [`Event`] that the host drains after the tick.

pub mod components;
pub mod config;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use components::{
    AttackerProfile, Collectable, Component, ComponentKind, DefenderProfile, Explosive, Health,
    Projectile, Shooter, SunProducer, TimedLife, Transform,
};
pub use config::{
    AttackerGroup, AttackerStats, CombatConfig, ConfigError, DefenderRole, DefenderStats,
    EconomyConfig, GridConfig, SimConfig, TimingConfig, WaveDescriptor,
};

/// Generation-checked handle that names an entity slot inside the store.
///
/// Handles are weak: the store may recycle the slot once the entity is
/// flushed, at which point the generation no longer matches and every lookup
/// through the stale handle resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from a slot index and generation counter.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the entity arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot carried when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Broad classification applied to every entity at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Player-placed entity occupying a grid cell.
    Defender,
    /// Hostile entity advancing along a lane toward the house.
    Attacker,
    /// Shot travelling down a lane.
    Projectile,
    /// Collectable resource lying on or falling onto the lawn.
    Pickup,
}

/// Types of defenders the player can place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenderKind {
    /// Ranged defender that fires projectiles down its lane.
    Peashooter,
    /// Economic defender that periodically produces sun.
    Sunflower,
    /// High-health defender that only blocks.
    WallNut,
    /// Single-use explosive that detonates shortly after placement.
    CherryBomb,
}

impl DefenderKind {
    /// Every defender kind in display order.
    pub const ALL: [Self; 4] = [Self::Peashooter, Self::Sunflower, Self::WallNut, Self::CherryBomb];

    /// Stable lowercase name used by configuration files and adapters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Peashooter => "peashooter",
            Self::Sunflower => "sunflower",
            Self::WallNut => "wall_nut",
            Self::CherryBomb => "cherry_bomb",
        }
    }

    /// Resolves a kind from its stable name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Types of attackers that waves may spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackerKind {
    /// Baseline attacker.
    Basic,
    /// Armoured attacker with extra health.
    Conehead,
    /// Heavily armoured attacker.
    Buckethead,
    /// Fast, fragile attacker.
    Runner,
}

impl AttackerKind {
    /// Stable lowercase name used by configuration files and adapters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Conehead => "conehead",
            Self::Buckethead => "buckethead",
            Self::Runner => "runner",
        }
    }
}

/// Types of collectable pickups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    /// Spendable sun.
    Sun,
}

/// Category plus subtype, used when asking the presentation layer for a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subtype {
    /// A defender of the given kind.
    Defender(DefenderKind),
    /// An attacker of the given kind.
    Attacker(AttackerKind),
    /// A projectile.
    Projectile,
    /// A pickup of the given kind.
    Pickup(PickupKind),
}

impl Subtype {
    /// Category shared by every entity with this subtype.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Defender(_) => Category::Defender,
            Self::Attacker(_) => Category::Attacker,
            Self::Projectile => Category::Projectile,
            Self::Pickup(_) => Category::Pickup,
        }
    }
}

/// Location of a single lawn cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row (lane) index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell, counted from the house side.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Behaviour state of an attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BehaviorState {
    /// Advancing toward the house.
    Walking,
    /// Stopped in front of a defender and biting it.
    Attacking,
    /// Terminal marker set by death processing.
    Dying,
}

/// Discrete audio/visual feedback cues emitted by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// A ranged defender fired.
    Shoot,
    /// A projectile struck an attacker.
    Hit,
    /// An explosive detonated.
    Explosion,
    /// An attacker died.
    EnemyDeath,
    /// A defender died.
    DefenderDeath,
    /// Sun was collected.
    SunCollected,
    /// A defender was placed.
    Placed,
}

impl Cue {
    /// Event name understood by audio and VFX sinks.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shoot => "shoot",
            Self::Hit => "hit",
            Self::Explosion => "explosion",
            Self::EnemyDeath => "enemyDeath",
            Self::DefenderDeath => "defenderDeath",
            Self::SunCollected => "sunCollected",
            Self::Placed => "placed",
        }
    }
}

/// Final or pending result of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The game is still being played.
    Running,
    /// Every wave was spawned and defeated.
    Won,
    /// An attacker reached the house.
    Lost,
}

/// Reasons a placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum PlacementError {
    /// No defender type is selected.
    #[error("no defender selected")]
    NoSelection,
    /// The position does not map to a lawn cell.
    #[error("position is outside the lawn")]
    InvalidCell,
    /// The cell already holds a defender.
    #[error("cell is already occupied")]
    Occupied,
    /// The ledger cannot cover the defender's cost.
    #[error("not enough sun")]
    InsufficientSun,
    /// The defender kind is still recharging since its last placement.
    #[error("defender is still recharging")]
    Recharging,
    /// The configuration holds no stats for the requested kind.
    #[error("defender kind has no configured stats")]
    UnknownDefender,
    /// The session already ended.
    #[error("the game is over")]
    GameOver,
}

/// Events broadcast by the simulation while processing a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Fire-and-forget feedback for audio and VFX sinks.
    Feedback {
        /// Cue that occurred.
        cue: Cue,
        /// Optional strength of the occurrence.
        intensity: Option<f32>,
    },
    /// The sun ledger changed to a new amount.
    SunChanged {
        /// Amount held after the change.
        amount: u32,
    },
    /// A defender was placed on the lawn.
    DefenderPlaced {
        /// Entity created for the defender.
        defender: EntityId,
        /// Kind of defender placed.
        kind: DefenderKind,
        /// Cell the defender occupies.
        cell: CellCoord,
    },
    /// A defender left the lawn without dying (shovel or detonation).
    DefenderRemoved {
        /// Entity that was removed.
        defender: EntityId,
        /// Cell that was released.
        cell: CellCoord,
    },
    /// A defender was destroyed by damage.
    DefenderDestroyed {
        /// Entity that died.
        defender: EntityId,
        /// Cell that was released, if the defender still held one.
        cell: Option<CellCoord>,
    },
    /// An attacker entered the field.
    AttackerSpawned {
        /// Entity created for the attacker.
        attacker: EntityId,
        /// Kind of attacker.
        kind: AttackerKind,
        /// Lane the attacker walks along.
        lane: u32,
    },
    /// An attacker was killed.
    AttackerDefeated {
        /// Entity that died.
        attacker: EntityId,
        /// Kind of attacker.
        kind: AttackerKind,
        /// Sun credited for the kill.
        reward: u32,
    },
    /// An attacker walked past the house boundary.
    GoalReached {
        /// Entity that reached the goal.
        attacker: EntityId,
        /// Lane it walked along.
        lane: u32,
    },
    /// A sun pickup appeared.
    PickupSpawned {
        /// Entity created for the pickup.
        pickup: EntityId,
        /// Sun granted when collected.
        value: u32,
    },
    /// A pickup was collected by the player.
    PickupCollected {
        /// Entity that was collected.
        pickup: EntityId,
        /// Sun credited.
        value: u32,
    },
    /// A pickup timed out before being collected.
    PickupExpired {
        /// Entity that expired.
        pickup: EntityId,
    },
    /// A wave became active.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Every spawn of the wave fired and no attacker remains.
    WaveCompleted {
        /// One-based wave number.
        wave: u32,
    },
    /// The session reached a final outcome.
    OutcomeDecided {
        /// Outcome that was reached.
        outcome: Outcome,
    },
}

/// Opaque handle to a presentation object owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresentationHandle(u64);

impl PresentationHandle {
    /// Wraps a host-defined handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Host-defined handle value.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Read-only view of an entity handed to the presentation animation pass.
#[derive(Clone, Copy, Debug)]
pub struct EntityView<'a> {
    /// Entity being presented.
    pub id: EntityId,
    /// Category of the entity.
    pub category: Category,
    /// Current transform, if the entity has one.
    pub transform: Option<&'a Transform>,
    /// Current health, if the entity has one.
    pub health: Option<&'a Health>,
    /// Behaviour state for attackers.
    pub state: Option<BehaviorState>,
}

/// Presentation factory the simulation drives without inspecting handles.
///
/// Implementations live in the host; the simulation only creates, attaches,
/// parks and disposes handles at well-defined points of the frame.
pub trait Presenter {
    /// Creates a presentation object for the subtype, if the host has one.
    fn create(&mut self, subtype: Subtype) -> Option<PresentationHandle>;

    /// Binds a handle to an entity.
    fn attach(&mut self, entity: EntityId, handle: PresentationHandle);

    /// Unbinds and destroys a handle owned by an entity.
    fn detach_and_dispose(&mut self, handle: PresentationHandle);

    /// Hides a pooled handle returned to its pool. It stays allocated.
    fn park(&mut self, _handle: PresentationHandle) {}

    /// Animation pass invoked once per frame for each presented entity.
    fn animate(&mut self, _handle: PresentationHandle, _view: EntityView<'_>) {}
}
