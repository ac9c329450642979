//! Closed component set attached to entities.
//!
//! Every entity owns at most one value of each component type. Systems reach
//! components through the typed accessors exposed by the entity store, so a
//! missing component is an `Option` at the call site rather than a failed
//! string lookup.

use std::time::Duration;

use glam::Vec3;

use crate::{AttackerKind, BehaviorState, CellCoord, DefenderKind, EntityId, PickupKind};

/// World-space placement of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Position in world units. `x` runs along the lane, `z` across rows.
    pub position: Vec3,
    /// Rotation around the vertical axis in radians.
    pub rotation: f32,
}

impl Transform {
    /// Creates an unrotated transform at the given position.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }
}

/// Hit points of a damageable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    max: i32,
    current: i32,
}

impl Health {
    /// Creates full health with the provided maximum.
    #[must_use]
    pub const fn full(max: i32) -> Self {
        Self { max, current: max }
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Remaining hit points; zero or below means dead.
    #[must_use]
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Reports whether the entity has no hit points left.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current <= 0
    }

    /// Subtracts damage and reports whether this call depleted the health.
    ///
    /// Returns `true` only on the transition from alive to depleted, so the
    /// caller can run death processing exactly once.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        if self.is_depleted() {
            return false;
        }
        self.current = self.current.saturating_sub(amount.max(0)).min(self.max);
        self.is_depleted()
    }
}

/// Static and dynamic state of a placed defender.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderProfile {
    /// Defender subtype.
    pub kind: DefenderKind,
    /// Cell the defender was placed on.
    pub cell: CellCoord,
    /// Simulation time of the defender's most recent action.
    pub last_action: Duration,
}

/// Static and dynamic state of an attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackerProfile {
    /// Attacker subtype.
    pub kind: AttackerKind,
    /// Lane (row) the attacker walks along.
    pub lane: u32,
    /// Behaviour state machine position.
    pub state: BehaviorState,
    /// Weak reference to the defender being bitten. Re-validate before use.
    pub target: Option<EntityId>,
    /// Simulation time of the last bite, or of the block that started biting.
    pub last_attack: Duration,
    /// Set once the attacker crossed the goal line.
    pub reached_goal: bool,
}

impl AttackerProfile {
    /// Creates a walking attacker assigned to a lane.
    #[must_use]
    pub const fn walking(kind: AttackerKind, lane: u32) -> Self {
        Self {
            kind,
            lane,
            state: BehaviorState::Walking,
            target: None,
            last_attack: Duration::ZERO,
            reached_goal: false,
        }
    }
}

/// Ranged attack capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shooter {
    /// Minimum time between shots.
    pub interval: Duration,
    /// Damage carried by each projectile.
    pub damage: i32,
    /// Time of the last shot; `None` until the first shot.
    pub last_shot: Option<Duration>,
}

impl Shooter {
    /// Reports whether the cooldown has elapsed at time `now`.
    #[must_use]
    pub fn is_ready(&self, now: Duration) -> bool {
        self.last_shot
            .map_or(true, |last| now.saturating_sub(last) >= self.interval)
    }
}

/// Periodic sun production.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SunProducer {
    /// Time between productions.
    pub interval: Duration,
    /// Sun carried by each produced pickup.
    pub value: u32,
    /// Time of the last production (placement time initially).
    pub last_produced: Duration,
}

/// Projectile flight parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Damage dealt on hit.
    pub damage: i32,
    /// Speed in world units per second.
    pub speed: f32,
    /// Normalised flight direction.
    pub direction: Vec3,
}

/// Delayed area-damage charge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Explosive {
    /// Blast radius measured in cells.
    pub radius: f32,
    /// Damage applied to every attacker in the blast.
    pub damage: i32,
    /// Delay between placement and detonation.
    pub fuse: Duration,
    /// Time accumulated since placement.
    pub elapsed: Duration,
    /// Set once the charge detonated.
    pub exploded: bool,
}

/// Collectable resource state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collectable {
    /// Resource category.
    pub kind: PickupKind,
    /// Amount credited on collection.
    pub value: u32,
    /// Set once the pickup was collected.
    pub collected: bool,
    /// Height at which a falling pickup comes to rest.
    pub resting_y: f32,
}

impl Collectable {
    /// Creates an uncollected sun pickup.
    #[must_use]
    pub const fn sun(value: u32, resting_y: f32) -> Self {
        Self {
            kind: PickupKind::Sun,
            value,
            collected: false,
            resting_y,
        }
    }
}

/// Remaining lifetime after which the entity destroys itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedLife {
    /// Time left before expiry.
    pub remaining: Duration,
}

/// Tag naming each component type, used by component queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// [`Transform`].
    Transform,
    /// [`Health`].
    Health,
    /// [`DefenderProfile`].
    DefenderProfile,
    /// [`AttackerProfile`].
    AttackerProfile,
    /// [`Shooter`].
    Shooter,
    /// [`SunProducer`].
    SunProducer,
    /// [`Projectile`].
    Projectile,
    /// [`Explosive`].
    Explosive,
    /// [`Collectable`].
    Collectable,
    /// [`TimedLife`].
    TimedLife,
}

/// Any single component value, used when attaching data to an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Component {
    /// See [`Transform`].
    Transform(Transform),
    /// See [`Health`].
    Health(Health),
    /// See [`DefenderProfile`].
    DefenderProfile(DefenderProfile),
    /// See [`AttackerProfile`].
    AttackerProfile(AttackerProfile),
    /// See [`Shooter`].
    Shooter(Shooter),
    /// See [`SunProducer`].
    SunProducer(SunProducer),
    /// See [`Projectile`].
    Projectile(Projectile),
    /// See [`Explosive`].
    Explosive(Explosive),
    /// See [`Collectable`].
    Collectable(Collectable),
    /// See [`TimedLife`].
    TimedLife(TimedLife),
}
