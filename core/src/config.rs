//! Immutable configuration supplied to the simulation at construction.
//!
//! Durations are expressed in whole milliseconds when serialised so the TOML
//! tables stay readable (`interval_ms = 1400`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AttackerKind, DefenderKind};

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The lawn has no rows or no columns.
    #[error("lawn must have at least one row and one column (got {rows}x{columns})")]
    EmptyGrid {
        /// Configured row count.
        rows: u32,
        /// Configured column count.
        columns: u32,
    },
    /// A quantity that must be strictly positive and finite was not.
    #[error("`{field}` must be positive and finite (got {value})")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value found in the configuration.
        value: f32,
    },
    /// A defender declares a zero-length interval.
    #[error("defender `{}` declares a zero interval", .kind.name())]
    ZeroInterval {
        /// Defender kind with the invalid interval.
        kind: DefenderKind,
    },
    /// The projectile pool cannot cover sustained fire on a full lawn.
    #[error("projectile pool holds {capacity} handles but sustained fire needs {required}")]
    ProjectilePoolTooSmall {
        /// Minimum capacity derived from fire rates and lane length.
        required: usize,
        /// Configured capacity.
        capacity: usize,
    },
}

/// Complete static configuration of a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for lane selection, spawn jitter and sky sun placement.
    pub seed: u64,
    /// Lawn dimensions and lane geometry.
    pub grid: GridConfig,
    /// Clock and wave pacing.
    pub timing: TimingConfig,
    /// Sun economy parameters.
    pub economy: EconomyConfig,
    /// Projectile and melee parameters.
    pub combat: CombatConfig,
    /// Defender stat table.
    pub defenders: Vec<DefenderStats>,
    /// Attacker stat table.
    pub attackers: Vec<AttackerStats>,
    /// Wave table in play order.
    pub waves: Vec<WaveDescriptor>,
}

/// Lawn dimensions and lane geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of lanes.
    pub rows: u32,
    /// Number of placement columns per lane.
    pub columns: u32,
    /// Side length of a square cell in world units.
    pub cell_size: f32,
    /// World `(x, z)` of the corner at column 0, row 0 (house side).
    pub origin: [f32; 2],
    /// Distance past the lawn's far edge where attackers appear.
    pub spawn_offset: f32,
    /// Maximum random offset added to each spawn position.
    pub spawn_jitter: f32,
    /// Distance past the house edge an attacker must cover to win.
    pub goal_margin: f32,
    /// Distance past the spawn line after which projectiles are removed.
    pub despawn_margin: f32,
}

/// Clock and wave pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Largest raw frame delta accepted before clamping.
    #[serde(rename = "max_frame_delta_ms", with = "millis")]
    pub max_frame_delta: Duration,
    /// Delay before the first wave starts.
    #[serde(rename = "first_wave_delay_ms", with = "millis")]
    pub first_wave_delay: Duration,
    /// Delay between a completed wave and the next one.
    #[serde(rename = "inter_wave_delay_ms", with = "millis")]
    pub inter_wave_delay: Duration,
}

/// Sun economy parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Sun available when the session starts.
    pub starting_sun: u32,
    /// Time between naturally falling suns.
    #[serde(rename = "sky_sun_interval_ms", with = "millis")]
    pub sky_sun_interval: Duration,
    /// Value of a naturally falling sun.
    pub sky_sun_value: u32,
    /// Height at which sky suns appear.
    pub sky_height: f32,
    /// Falling speed of sky suns in world units per second.
    pub fall_speed: f32,
    /// Time a pickup stays collectable.
    #[serde(rename = "pickup_lifetime_ms", with = "millis")]
    pub pickup_lifetime: Duration,
    /// Number of pickup presentation handles pre-allocated.
    pub pickup_pool_capacity: usize,
    /// Distance from a pickup within which a click collects it.
    pub collect_radius: f32,
    /// Collects pickups as soon as they come to rest.
    #[serde(default)]
    pub auto_collect: bool,
}

/// Projectile and melee parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Distance at which a projectile strikes an attacker.
    pub hit_radius: f32,
    /// Number of projectile presentation handles pre-allocated.
    pub projectile_pool_capacity: usize,
    /// Offset from a shooter's position where projectiles appear.
    pub muzzle_offset: [f32; 3],
    /// Distance in front of a defender within which attackers stop to bite.
    pub block_range: f32,
}

/// Stats of one defender kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderStats {
    /// Kind these stats describe.
    pub kind: DefenderKind,
    /// Sun cost of placement.
    pub cost: u32,
    /// Hit points.
    pub health: i32,
    /// Minimum time between two placements of this kind.
    #[serde(rename = "recharge_ms", with = "millis")]
    pub recharge: Duration,
    /// Behaviour granted to the defender.
    pub role: DefenderRole,
}

/// Behaviour granted to a defender kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefenderRole {
    /// Fires projectiles down its lane.
    Shooter {
        /// Minimum time between shots.
        #[serde(rename = "interval_ms", with = "millis")]
        interval: Duration,
        /// Damage per projectile.
        damage: i32,
    },
    /// Produces sun pickups.
    Producer {
        /// Time between productions.
        #[serde(rename = "interval_ms", with = "millis")]
        interval: Duration,
        /// Sun per produced pickup.
        value: u32,
    },
    /// Only blocks attackers.
    Blocker,
    /// Detonates once after a fuse delay.
    Explosive {
        /// Delay between placement and detonation.
        #[serde(rename = "fuse_ms", with = "millis")]
        fuse: Duration,
        /// Blast radius in cells.
        radius: f32,
        /// Damage dealt to every attacker in the blast.
        damage: i32,
    },
}

/// Stats of one attacker kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackerStats {
    /// Kind these stats describe.
    pub kind: AttackerKind,
    /// Hit points.
    pub health: i32,
    /// Walking speed in world units per second.
    pub speed: f32,
    /// Damage per bite.
    pub melee_damage: i32,
    /// Time between bites.
    #[serde(rename = "attack_interval_ms", with = "millis")]
    pub attack_interval: Duration,
    /// Sun credited when the attacker is killed.
    pub kill_reward: u32,
}

/// Immutable description of one wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDescriptor {
    /// Delay between wave start and the first spawn of every group.
    #[serde(rename = "delay_ms", with = "millis")]
    pub delay: Duration,
    /// Attacker groups spawned by the wave.
    pub groups: Vec<AttackerGroup>,
}

impl WaveDescriptor {
    /// Total number of attackers the wave spawns.
    #[must_use]
    pub fn total_spawns(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Run of identical attackers spawned at a fixed cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackerGroup {
    /// Kind of attacker.
    pub kind: AttackerKind,
    /// Number of attackers.
    pub count: u32,
    /// Time between consecutive spawns of the group.
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
}

impl SimConfig {
    /// Parses a configuration from TOML and validates it.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Stats for a defender kind, if the table has them.
    #[must_use]
    pub fn defender(&self, kind: DefenderKind) -> Option<&DefenderStats> {
        self.defenders.iter().find(|stats| stats.kind == kind)
    }

    /// Stats for an attacker kind, if the table has them.
    #[must_use]
    pub fn attacker(&self, kind: AttackerKind) -> Option<&AttackerStats> {
        self.attackers.iter().find(|stats| stats.kind == kind)
    }

    /// One-based wave lookup.
    #[must_use]
    pub fn wave(&self, number: u32) -> Option<&WaveDescriptor> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        self.waves.get(index)
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Distance a projectile travels from the house edge to its removal bound.
    #[must_use]
    pub fn lane_length(&self) -> f32 {
        let grid = &self.grid;
        grid.columns as f32 * grid.cell_size + grid.spawn_offset + grid.despawn_margin
    }

    /// Smallest projectile pool that never drops shots on a full lawn.
    ///
    /// Every cell holds the fastest shooter, and each shooter keeps
    /// `ceil(traversal / interval)` projectiles in flight.
    #[must_use]
    pub fn required_projectile_capacity(&self) -> usize {
        let fastest = self
            .defenders
            .iter()
            .filter_map(|stats| match stats.role {
                DefenderRole::Shooter { interval, .. } if !interval.is_zero() => Some(interval),
                _ => None,
            })
            .min();
        let Some(interval) = fastest else {
            return 0;
        };
        if self.combat.projectile_speed <= 0.0 {
            return usize::MAX;
        }

        let traversal = self.lane_length() / self.combat.projectile_speed;
        let per_shooter = (traversal / interval.as_secs_f32()).ceil().max(1.0) as usize;
        let cells = self.grid.rows as usize * self.grid.columns as usize;
        per_shooter.saturating_mul(cells)
    }

    /// Checks the structural invariants the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.rows == 0 || self.grid.columns == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.grid.rows,
                columns: self.grid.columns,
            });
        }

        positive("grid.cell_size", self.grid.cell_size)?;
        positive("combat.projectile_speed", self.combat.projectile_speed)?;
        positive("combat.hit_radius", self.combat.hit_radius)?;
        positive("economy.fall_speed", self.economy.fall_speed)?;
        if self.timing.max_frame_delta.is_zero() {
            return Err(ConfigError::NonPositive {
                field: "timing.max_frame_delta_ms",
                value: 0.0,
            });
        }

        for stats in &self.defenders {
            let zero = match stats.role {
                DefenderRole::Shooter { interval, .. } | DefenderRole::Producer { interval, .. } => {
                    interval.is_zero()
                }
                DefenderRole::Blocker | DefenderRole::Explosive { .. } => false,
            };
            if zero {
                return Err(ConfigError::ZeroInterval { kind: stats.kind });
            }
        }

        let required = self.required_projectile_capacity();
        if self.combat.projectile_pool_capacity < required {
            return Err(ConfigError::ProjectilePoolTooSmall {
                required,
                capacity: self.combat.projectile_pool_capacity,
            });
        }

        for (index, wave) in self.waves.iter().enumerate() {
            for group in &wave.groups {
                if self.attacker(group.kind).is_none() {
                    log::warn!(
                        "wave {} spawns `{}` which has no stats; those spawns will be skipped",
                        index + 1,
                        group.kind.name()
                    );
                }
            }
        }

        Ok(())
    }

    /// The classic five-lane, nine-column table with five waves.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            seed: 0x5eed_1a3e_0f5e_ed00,
            grid: GridConfig {
                rows: 5,
                columns: 9,
                cell_size: 1.0,
                origin: [0.0, 0.0],
                spawn_offset: 1.0,
                spawn_jitter: 0.3,
                goal_margin: 0.5,
                despawn_margin: 1.0,
            },
            timing: TimingConfig {
                max_frame_delta: Duration::from_millis(100),
                first_wave_delay: Duration::from_secs(20),
                inter_wave_delay: Duration::from_secs(8),
            },
            economy: EconomyConfig {
                starting_sun: 150,
                sky_sun_interval: Duration::from_secs(10),
                sky_sun_value: 25,
                sky_height: 3.0,
                fall_speed: 0.75,
                pickup_lifetime: Duration::from_secs(12),
                pickup_pool_capacity: 32,
                collect_radius: 0.5,
                auto_collect: false,
            },
            combat: CombatConfig {
                projectile_speed: 5.0,
                hit_radius: 0.3,
                projectile_pool_capacity: 128,
                muzzle_offset: [0.3, 0.5, 0.0],
                block_range: 0.45,
            },
            defenders: vec![
                DefenderStats {
                    kind: DefenderKind::Peashooter,
                    cost: 100,
                    health: 300,
                    recharge: Duration::from_millis(7_500),
                    role: DefenderRole::Shooter {
                        interval: Duration::from_millis(1_400),
                        damage: 20,
                    },
                },
                DefenderStats {
                    kind: DefenderKind::Sunflower,
                    cost: 50,
                    health: 300,
                    recharge: Duration::from_millis(7_500),
                    role: DefenderRole::Producer {
                        interval: Duration::from_secs(24),
                        value: 25,
                    },
                },
                DefenderStats {
                    kind: DefenderKind::WallNut,
                    cost: 50,
                    health: 4_000,
                    recharge: Duration::from_secs(30),
                    role: DefenderRole::Blocker,
                },
                DefenderStats {
                    kind: DefenderKind::CherryBomb,
                    cost: 150,
                    health: 300,
                    recharge: Duration::from_secs(50),
                    role: DefenderRole::Explosive {
                        fuse: Duration::from_millis(1_200),
                        radius: 1.5,
                        damage: 1_800,
                    },
                },
            ],
            attackers: vec![
                AttackerStats {
                    kind: AttackerKind::Basic,
                    health: 200,
                    speed: 0.2,
                    melee_damage: 100,
                    attack_interval: Duration::from_secs(1),
                    kill_reward: 10,
                },
                AttackerStats {
                    kind: AttackerKind::Conehead,
                    health: 560,
                    speed: 0.2,
                    melee_damage: 100,
                    attack_interval: Duration::from_secs(1),
                    kill_reward: 15,
                },
                AttackerStats {
                    kind: AttackerKind::Buckethead,
                    health: 1_300,
                    speed: 0.2,
                    melee_damage: 100,
                    attack_interval: Duration::from_secs(1),
                    kill_reward: 25,
                },
                AttackerStats {
                    kind: AttackerKind::Runner,
                    health: 150,
                    speed: 0.45,
                    melee_damage: 50,
                    attack_interval: Duration::from_millis(500),
                    kill_reward: 10,
                },
            ],
            waves: vec![
                wave(2_000, &[(AttackerKind::Basic, 3, 6_000)]),
                wave(2_000, &[(AttackerKind::Basic, 5, 4_000), (AttackerKind::Runner, 2, 9_000)]),
                wave(
                    3_000,
                    &[(AttackerKind::Basic, 6, 3_000), (AttackerKind::Conehead, 3, 7_000)],
                ),
                wave(
                    3_000,
                    &[
                        (AttackerKind::Basic, 8, 2_500),
                        (AttackerKind::Conehead, 4, 5_000),
                        (AttackerKind::Runner, 4, 6_000),
                    ],
                ),
                wave(
                    4_000,
                    &[
                        (AttackerKind::Basic, 10, 2_000),
                        (AttackerKind::Conehead, 5, 4_000),
                        (AttackerKind::Buckethead, 3, 8_000),
                    ],
                ),
            ],
        }
    }
}

fn wave(delay_ms: u64, groups: &[(AttackerKind, u32, u64)]) -> WaveDescriptor {
    WaveDescriptor {
        delay: Duration::from_millis(delay_ms),
        groups: groups
            .iter()
            .map(|&(kind, count, interval_ms)| AttackerGroup {
                kind,
                count,
                interval: Duration::from_millis(interval_ms),
            })
            .collect(),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}
