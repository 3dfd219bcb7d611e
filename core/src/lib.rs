#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tower defense match simulation.
//!
//! This crate defines the message surface that connects the UI-facing session
//! host, the authoritative world, and the pure systems. Callers submit
//! [`PlayerCommand`] values describing desired mutations, the session validates
//! them into [`Accepted`] or [`Rejection`] outcomes, and every simulation tick
//! produces [`SessionEvent`] values plus an immutable [`Snapshot`] for
//! rendering. Nothing in here performs I/O.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use glam::Vec2;

pub mod tuning;

pub use tuning::{
    EconomyTuning, EnemyProfile, EnemyTuning, SessionTuning, SlowTuning, TowerProfile,
    TowerStats, TowerTuning, Tuning, TuningError, WaveScaling,
};

/// Commands a player (through the UI layer) may issue against a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Purchases a tower of the provided kind and places it on a cell.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Sells an existing tower for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Raises the level of an existing tower by one.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Starts the next pending wave.
    StartWave,
    /// Freezes tick advancement.
    Pause,
    /// Resumes tick advancement after a pause.
    Resume,
    /// Abandons the match.
    Quit,
}

/// Successful outcome of a validated [`PlayerCommand`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accepted {
    /// A tower was purchased and placed.
    TowerPlaced {
        /// Identifier allocated to the new tower.
        tower: TowerId,
        /// Coin balance after the purchase.
        balance: u32,
    },
    /// A tower was sold.
    TowerSold {
        /// Identifier of the removed tower.
        tower: TowerId,
        /// Coins credited back to the ledger.
        refund: u32,
    },
    /// A tower gained a level.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached by the tower.
        level: u32,
    },
    /// The next wave began spawning.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: u32,
    },
    /// The session paused.
    Paused,
    /// The session resumed.
    Resumed,
    /// The session was abandoned.
    Abandoned,
}

/// Reasons a [`PlayerCommand`] may be rejected. Rejections never mutate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Rejection {
    /// Another tower already occupies the requested cell.
    #[error("cell {cell} is already occupied")]
    OccupiedCell {
        /// Cell that was requested.
        cell: CellCoord,
    },
    /// The ledger balance cannot cover the cost.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Coins the command would have cost.
        required: u32,
        /// Coins available at the time of the request.
        available: u32,
    },
    /// The tower kind is not part of the session deck.
    #[error("{kind} is not in the session deck")]
    NotInDeck {
        /// Kind that was requested.
        kind: TowerKind,
    },
    /// The cell lies on the path, outside the map, or is blocked.
    #[error("cell {cell} is not buildable")]
    NotBuildable {
        /// Cell that was requested.
        cell: CellCoord,
    },
    /// No tower with the provided identifier exists.
    #[error("{tower} not found")]
    NotFound {
        /// Identifier that was requested.
        tower: TowerId,
    },
    /// The tower already reached the maximum level.
    #[error("{tower} is already at the maximum level")]
    MaxLevel {
        /// Identifier of the tower.
        tower: TowerId,
    },
    /// A wave is still spawning.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// Every configured wave has already been started.
    #[error("no waves remain")]
    NoWavesRemaining,
    /// The command is not valid in the current session status.
    #[error("command not allowed while {status:?}")]
    InvalidState {
        /// Status the session was in.
        status: SessionStatus,
    },
}

/// Lifecycle status of a match session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Deck chosen, initial placements allowed, clock stopped.
    Setup,
    /// Ticks advance combat and waves.
    Active,
    /// Clock frozen; building still allowed.
    Paused,
    /// A wave cleared and the next one awaits an explicit start.
    WaveIntermission,
    /// The final wave was cleared.
    Victory,
    /// Base health reached zero.
    Defeat,
    /// The player quit.
    Abandoned,
}

impl SessionStatus {
    /// Reports whether the status ends the session.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat | Self::Abandoned)
    }

    /// Reports whether tower commands are accepted in this status.
    #[must_use]
    pub const fn allows_building(self) -> bool {
        matches!(
            self,
            Self::Setup | Self::Active | Self::Paused | Self::WaveIntermission
        )
    }
}

/// Events emitted while a session processes commands and ticks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session moved between lifecycle states.
    StatusChanged {
        /// Status before the transition.
        from: SessionStatus,
        /// Status after the transition.
        to: SessionStatus,
    },
    /// A queued command failed validation.
    CommandRejected {
        /// Command that was rejected.
        command: PlayerCommand,
        /// Reason it was rejected.
        reason: Rejection,
    },
    /// A wave started spawning.
    WaveStarted {
        /// Zero-based wave index.
        wave: u32,
    },
    /// A wave finished.
    WaveCleared {
        /// Zero-based wave index.
        wave: u32,
        /// Coins credited for clearing it.
        bonus: u32,
    },
    /// An enemy entered the path.
    EnemySpawned {
        /// Identifier allocated to the enemy.
        enemy: EnemyId,
        /// Type of enemy.
        kind: EnemyKind,
        /// Wave that produced the enemy.
        wave: u32,
    },
    /// A tower launched a projectile.
    ProjectileFired {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile homes on.
        target: EnemyId,
    },
    /// An enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Coins credited for the kill.
        reward: u32,
    },
    /// An enemy reached the end of the path.
    EnemyBreached {
        /// Identifier of the breaching enemy.
        enemy: EnemyId,
        /// Damage dealt to the base.
        damage: u32,
        /// Base health remaining afterwards.
        base_health: u32,
    },
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TowerKind {
    /// Fast single-target shooter.
    Archer,
    /// Slow shooter dealing splash damage.
    Cannon,
    /// Weak shooter that slows its target.
    Ice,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [Self; 3] = [Self::Archer, Self::Cannon, Self::Ice];
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Archer => "ARCHER",
            Self::Cannon => "CANNON",
            Self::Ice => "ICE",
        };
        f.write_str(label)
    }
}

/// Types of enemies spawned by waves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy.
    Grunt,
    /// Fast, fragile enemy.
    Runner,
    /// Slow, durable enemy.
    Brute,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [Self; 3] = [Self::Grunt, Self::Runner, Self::Brute];
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to a tower.
    TowerId,
    "tower"
);
entity_id!(
    /// Unique identifier assigned to an enemy.
    EnemyId,
    "enemy"
);
entity_id!(
    /// Unique identifier assigned to a projectile.
    ProjectileId,
    "projectile"
);

/// Identifier of a level in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(String);

impl MapId {
    /// Creates a map identifier from its textual name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Textual name of the map.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Centre of the cell in world units, where one cell spans one unit.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Slow status effect carried by a projectile payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlowEffect {
    /// Factor applied to the enemy's base speed, within `(0, 1]`.
    pub multiplier: f32,
    /// Time the effect stays active after being applied.
    pub duration: Duration,
}

/// Damage and effects delivered when a projectile reaches its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Payload {
    /// Damage dealt to the primary target.
    pub damage: u32,
    /// Radius around the impact point receiving reduced splash damage.
    pub splash_radius: Option<f32>,
    /// Status effect applied to the primary target only.
    pub slow: Option<SlowEffect>,
}

/// One group of identical enemies inside a wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Type of enemy to spawn.
    pub kind: EnemyKind,
    /// Number of enemies before difficulty scaling.
    pub count: u32,
    /// Delay between consecutive spawns, in milliseconds.
    pub interval_ms: u64,
}

impl SpawnEntry {
    /// Delay between consecutive spawns.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Ordered list of spawn entries forming one wave.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Entries emitted in order.
    pub entries: Vec<SpawnEntry>,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower.
    pub id: TowerId,
    /// Kind of tower.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Current level, starting at one.
    pub level: u32,
    /// Targeting range in cells at the current level.
    pub range: f32,
    /// Time until the tower may fire again.
    pub cooldown: Duration,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy.
    pub id: EnemyId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Position along the path in world units.
    pub position: Vec2,
    /// Distance travelled along the path.
    pub progress: f32,
    /// Current health.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
    /// Indicates whether a slow effect is active.
    pub slowed: bool,
}

/// Immutable representation of a single projectile's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Tower that fired the projectile.
    pub tower: TowerId,
    /// Enemy the projectile homes on.
    pub target: EnemyId,
    /// Position in world units.
    pub position: Vec2,
}

/// Read-only view of a session between ticks, intended for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Number of fixed ticks simulated so far.
    pub tick: u64,
    /// One-based number of the latest started wave, zero before the first.
    pub wave: u32,
    /// Total number of configured waves.
    pub total_waves: u32,
    /// Remaining base health.
    pub base_health: u32,
    /// Current coin balance.
    pub balance: u32,
    /// Towers in ascending identifier order.
    pub towers: Vec<TowerSnapshot>,
    /// Live enemies in ascending identifier order.
    pub enemies: Vec<EnemySnapshot>,
    /// Live projectiles in ascending identifier order.
    pub projectiles: Vec<ProjectileSnapshot>,
}

/// Terminal, one-shot report of a match outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Coins earned from kills and wave bonuses during the match.
    pub coins_earned: u32,
    /// One-based number of the highest wave reached.
    pub highest_wave: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Whether the match ended in victory.
    pub won: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn cell_center_is_offset_by_half() {
        assert_eq!(CellCoord::new(2, 3).center(), Vec2::new(2.5, 3.5));
    }

    #[test]
    fn summary_round_trips_through_bincode() {
        assert_round_trip(&SessionSummary {
            coins_earned: 120,
            highest_wave: 4,
            kills: 31,
            won: false,
        });
    }

    #[test]
    fn rejection_round_trips_through_bincode() {
        assert_round_trip(&Rejection::InsufficientFunds {
            required: 50,
            available: 20,
        });
    }

    #[test]
    fn place_command_uses_readable_json() {
        let command = PlayerCommand::PlaceTower {
            kind: TowerKind::Archer,
            cell: CellCoord::new(2, 3),
        };
        let json = serde_json::to_string(&command).expect("serialize");
        assert_eq!(
            json,
            r#"{"command":"place_tower","kind":"ARCHER","cell":{"column":2,"row":3}}"#
        );
        let restored: PlayerCommand = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, command);
    }

    #[test]
    fn summary_uses_camel_case_fields() {
        let summary = SessionSummary {
            coins_earned: 5,
            highest_wave: 1,
            kills: 2,
            won: true,
        };
        let json = serde_json::to_string(&summary).expect("serialize");
        assert!(json.contains("coinsEarned"));
        assert!(json.contains("highestWave"));
    }

    #[test]
    fn terminal_statuses_forbid_building() {
        for status in [
            SessionStatus::Victory,
            SessionStatus::Defeat,
            SessionStatus::Abandoned,
        ] {
            assert!(status.is_terminal());
            assert!(!status.allows_building());
        }
        assert!(SessionStatus::Paused.allows_building());
        assert!(!SessionStatus::Paused.is_terminal());
    }

    #[test]
    fn rejection_messages_name_the_entity() {
        let message = Rejection::NotFound {
            tower: TowerId::new(7),
        }
        .to_string();
        assert_eq!(message, "tower#7 not found");
    }
}
