//! Balancing tables for towers, enemies, economy and wave escalation.
//!
//! Every derived stat is a pure function of its inputs (tower kind and level,
//! or wave index) so two sessions fed the same tuning always agree.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EnemyKind, Payload, SlowEffect, TowerKind};

/// Aggregated tuning knobs for a match session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Clock, base and combat constants.
    pub session: SessionTuning,
    /// Coin flow parameters.
    pub economy: EconomyTuning,
    /// Per-kind tower profiles.
    pub towers: TowerTuning,
    /// Per-kind enemy profiles.
    pub enemies: EnemyTuning,
    /// Difficulty escalation per wave.
    pub scaling: WaveScaling,
}

impl Tuning {
    /// Checks the tables for values the simulation cannot honour.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.session.tick_ms == 0 {
            return Err(TuningError::ZeroTick);
        }
        if self.session.base_health == 0 {
            return Err(TuningError::ZeroBaseHealth);
        }
        if self.session.max_tower_level == 0 {
            return Err(TuningError::ZeroMaxLevel);
        }
        if !(self.session.hit_threshold.is_finite() && self.session.hit_threshold >= 0.0) {
            return Err(TuningError::InvalidHitThreshold);
        }
        if self.session.splash_percent > 100 {
            return Err(TuningError::SplashAboveHit(self.session.splash_percent));
        }
        if !(self.session.spawn_jitter.is_finite() && self.session.spawn_jitter >= 0.0) {
            return Err(TuningError::InvalidSpawnJitter);
        }
        if self.economy.refund_percent > 100 {
            return Err(TuningError::RefundAboveSpend(self.economy.refund_percent));
        }
        for kind in TowerKind::ALL {
            let profile = self.towers.profile(kind);
            if profile.fire_interval_ms == 0 || profile.projectile_speed <= 0.0 {
                return Err(TuningError::InvalidTower(kind));
            }
            if let Some(slow) = profile.slow {
                if !(slow.multiplier > 0.0 && slow.multiplier <= 1.0) {
                    return Err(TuningError::InvalidTower(kind));
                }
            }
        }
        for kind in EnemyKind::ALL {
            let profile = self.enemies.profile(kind);
            if profile.health == 0 || profile.speed <= 0.0 {
                return Err(TuningError::InvalidEnemy(kind));
            }
        }
        Ok(())
    }

    /// Fixed simulation step.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.session.tick_ms)
    }

    /// Derives tower stats for the given kind and level.
    #[must_use]
    pub fn tower_stats(&self, kind: TowerKind, level: u32) -> TowerStats {
        self.towers.profile(kind).stats(level)
    }

    /// Cost of raising a tower from `level` to `level + 1`.
    #[must_use]
    pub fn upgrade_cost(&self, kind: TowerKind, level: u32) -> u32 {
        self.towers
            .profile(kind)
            .upgrade_cost
            .saturating_mul(level.max(1))
    }

    /// Splash damage derived from a primary hit.
    #[must_use]
    pub fn splash_damage(&self, damage: u32) -> u32 {
        let scaled = u64::from(damage) * u64::from(self.session.splash_percent) / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }
}

/// Errors reported by [`Tuning::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum TuningError {
    /// The fixed tick duration is zero.
    #[error("tick duration must be positive")]
    ZeroTick,
    /// The base starts with no health.
    #[error("base health must be positive")]
    ZeroBaseHealth,
    /// Towers could never be placed at a valid level.
    #[error("maximum tower level must be at least one")]
    ZeroMaxLevel,
    /// The projectile hit distance is negative or not a number.
    #[error("hit threshold must be a finite, non-negative distance")]
    InvalidHitThreshold,
    /// Splash would hit harder than the primary target.
    #[error("splash percent {0} exceeds 100")]
    SplashAboveHit(u32),
    /// The spawn offset bound is negative or not finite.
    #[error("spawn jitter must be finite and non-negative")]
    InvalidSpawnJitter,
    /// Refunds would exceed the amount spent.
    #[error("refund percent {0} exceeds 100")]
    RefundAboveSpend(u32),
    /// A tower profile has a non-positive interval, speed or slow.
    #[error("tower profile for {0} is invalid")]
    InvalidTower(TowerKind),
    /// An enemy profile has no health or no speed.
    #[error("enemy profile for {0:?} is invalid")]
    InvalidEnemy(EnemyKind),
}

/// Clock, base and combat constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Fixed step length in milliseconds.
    pub tick_ms: u64,
    /// Base health at session start.
    pub base_health: u32,
    /// Highest level a tower may reach.
    pub max_tower_level: u32,
    /// Distance at which a projectile counts as having reached its target.
    pub hit_threshold: f32,
    /// Share of primary damage dealt as splash, in percent.
    pub splash_percent: u32,
    /// Upper bound of the random path offset given to new enemies.
    pub spawn_jitter: f32,
    /// Starts the next wave immediately after one clears.
    pub auto_start_waves: bool,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            base_health: 20,
            max_tower_level: 3,
            hit_threshold: 0.15,
            splash_percent: 50,
            spawn_jitter: 0.2,
            auto_start_waves: false,
        }
    }
}

/// Coin flow parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyTuning {
    /// Balance granted at session start before any bonus.
    pub starting_coins: u32,
    /// Share of cumulative spend refunded on sale, in percent.
    pub refund_percent: u32,
    /// Bonus credited when the first wave clears.
    pub wave_clear_bonus: u32,
    /// Additional bonus per wave index.
    pub wave_clear_bonus_step: u32,
}

impl EconomyTuning {
    /// Bonus credited for clearing the wave at `wave_index`.
    #[must_use]
    pub fn wave_bonus(&self, wave_index: u32) -> u32 {
        self.wave_clear_bonus
            .saturating_add(self.wave_clear_bonus_step.saturating_mul(wave_index))
    }

    /// Refund for a tower that cost `spent` in total.
    #[must_use]
    pub fn refund(&self, spent: u32) -> u32 {
        let refund = u64::from(spent) * u64::from(self.refund_percent.min(100)) / 100;
        u32::try_from(refund).unwrap_or(spent)
    }
}

impl Default for EconomyTuning {
    fn default() -> Self {
        Self {
            starting_coins: 100,
            refund_percent: 50,
            wave_clear_bonus: 20,
            wave_clear_bonus_step: 5,
        }
    }
}

/// Slow effect parameters expressed in configuration units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlowTuning {
    /// Factor applied to the enemy's base speed.
    pub multiplier: f32,
    /// Effect duration in milliseconds.
    pub duration_ms: u64,
}

/// Base stats and per-level growth for one tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerProfile {
    /// Purchase price.
    pub cost: u32,
    /// Upgrade price multiplied by the current level.
    pub upgrade_cost: u32,
    /// Damage per hit at level one.
    pub damage: u32,
    /// Targeting range in cells at level one.
    pub range: f32,
    /// Time between shots at level one, in milliseconds.
    pub fire_interval_ms: u64,
    /// Projectile travel speed in cells per second.
    pub projectile_speed: f32,
    /// Splash radius in cells, if the tower deals area damage.
    pub splash_radius: Option<f32>,
    /// Slow applied to the primary target, if any.
    pub slow: Option<SlowTuning>,
    /// Damage increase per level above one, in percent of base damage.
    pub damage_growth_percent: u32,
    /// Range increase per level above one, in cells.
    pub range_growth: f32,
    /// Fire interval reduction per level above one, in percent.
    pub interval_reduction_percent: u32,
}

impl TowerProfile {
    /// Derives the stats of a tower at `level`.
    #[must_use]
    pub fn stats(&self, level: u32) -> TowerStats {
        let steps = level.max(1) - 1;

        let damage_percent = 100u64 + u64::from(self.damage_growth_percent) * u64::from(steps);
        let damage = u64::from(self.damage) * damage_percent / 100;

        let reduction = u64::from(self.interval_reduction_percent) * u64::from(steps);
        let interval_percent = 100u64.saturating_sub(reduction).max(10);
        let fire_interval = Duration::from_millis(self.fire_interval_ms * interval_percent / 100);

        TowerStats {
            damage: u32::try_from(damage).unwrap_or(u32::MAX),
            range: self.range + self.range_growth * steps as f32,
            fire_interval,
            projectile_speed: self.projectile_speed,
            splash_radius: self.splash_radius,
            slow: self.slow.map(|slow| SlowEffect {
                multiplier: slow.multiplier,
                duration: Duration::from_millis(slow.duration_ms),
            }),
        }
    }
}

/// Stats of a tower at a specific level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Damage per hit.
    pub damage: u32,
    /// Targeting range in cells.
    pub range: f32,
    /// Time between shots.
    pub fire_interval: Duration,
    /// Projectile travel speed in cells per second.
    pub projectile_speed: f32,
    /// Splash radius, if any.
    pub splash_radius: Option<f32>,
    /// Slow applied on hit, if any.
    pub slow: Option<SlowEffect>,
}

impl TowerStats {
    /// Payload carried by projectiles fired with these stats.
    #[must_use]
    pub fn payload(&self) -> Payload {
        Payload {
            damage: self.damage,
            splash_radius: self.splash_radius,
            slow: self.slow,
        }
    }
}

/// Tower profiles keyed by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTuning {
    /// ARCHER profile.
    pub archer: TowerProfile,
    /// CANNON profile.
    pub cannon: TowerProfile,
    /// ICE profile.
    pub ice: TowerProfile,
}

impl TowerTuning {
    /// Profile for the provided kind.
    #[must_use]
    pub fn profile(&self, kind: TowerKind) -> &TowerProfile {
        match kind {
            TowerKind::Archer => &self.archer,
            TowerKind::Cannon => &self.cannon,
            TowerKind::Ice => &self.ice,
        }
    }
}

impl Default for TowerTuning {
    fn default() -> Self {
        Self {
            archer: TowerProfile {
                cost: 50,
                upgrade_cost: 40,
                damage: 10,
                range: 3.0,
                fire_interval_ms: 600,
                projectile_speed: 12.0,
                splash_radius: None,
                slow: None,
                damage_growth_percent: 50,
                range_growth: 0.5,
                interval_reduction_percent: 10,
            },
            cannon: TowerProfile {
                cost: 80,
                upgrade_cost: 60,
                damage: 25,
                range: 2.5,
                fire_interval_ms: 1_500,
                projectile_speed: 6.0,
                splash_radius: Some(1.2),
                slow: None,
                damage_growth_percent: 40,
                range_growth: 0.25,
                interval_reduction_percent: 5,
            },
            ice: TowerProfile {
                cost: 60,
                upgrade_cost: 45,
                damage: 4,
                range: 2.5,
                fire_interval_ms: 1_000,
                projectile_speed: 9.0,
                splash_radius: None,
                slow: Some(SlowTuning {
                    multiplier: 0.5,
                    duration_ms: 1_500,
                }),
                damage_growth_percent: 25,
                range_growth: 0.5,
                interval_reduction_percent: 10,
            },
        }
    }
}

/// Base stats for one enemy kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    /// Health before wave scaling.
    pub health: u32,
    /// Speed in cells per second before wave scaling.
    pub speed: f32,
    /// Base health removed when the enemy breaches.
    pub breach_damage: u32,
    /// Coins credited for a kill.
    pub reward: u32,
}

/// Enemy profiles keyed by kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Grunt profile.
    pub grunt: EnemyProfile,
    /// Runner profile.
    pub runner: EnemyProfile,
    /// Brute profile.
    pub brute: EnemyProfile,
}

impl EnemyTuning {
    /// Profile for the provided kind.
    #[must_use]
    pub fn profile(&self, kind: EnemyKind) -> &EnemyProfile {
        match kind {
            EnemyKind::Grunt => &self.grunt,
            EnemyKind::Runner => &self.runner,
            EnemyKind::Brute => &self.brute,
        }
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            grunt: EnemyProfile {
                health: 30,
                speed: 1.5,
                breach_damage: 1,
                reward: 5,
            },
            runner: EnemyProfile {
                health: 18,
                speed: 2.6,
                breach_damage: 1,
                reward: 6,
            },
            brute: EnemyProfile {
                health: 120,
                speed: 0.9,
                breach_damage: 3,
                reward: 15,
            },
        }
    }
}

/// Per-wave growth rates for enemy health, speed and count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveScaling {
    /// Health increase per wave index, in percent.
    pub health_growth_percent: u32,
    /// Speed increase per wave index, in percent.
    pub speed_growth_percent: u32,
    /// Spawn count increase per wave index, in percent.
    pub count_growth_percent: u32,
}

impl WaveScaling {
    /// Number of enemies an entry of `base` enemies spawns at `wave_index`.
    #[must_use]
    pub fn scaled_count(&self, base: u32, wave_index: u32) -> u32 {
        let percent = 100u64 + u64::from(self.count_growth_percent) * u64::from(wave_index);
        let scaled = (u64::from(base) * percent).div_ceil(100);
        u32::try_from(scaled).unwrap_or(u32::MAX)
    }

    /// Health of an enemy with `base` health at `wave_index`.
    #[must_use]
    pub fn scaled_health(&self, base: u32, wave_index: u32) -> u32 {
        let percent = 100u64 + u64::from(self.health_growth_percent) * u64::from(wave_index);
        let scaled = u64::from(base) * percent / 100;
        u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
    }

    /// Speed of an enemy with `base` speed at `wave_index`.
    #[must_use]
    pub fn scaled_speed(&self, base: f32, wave_index: u32) -> f32 {
        let percent = 100.0 + self.speed_growth_percent as f32 * wave_index as f32;
        base * percent / 100.0
    }
}

impl Default for WaveScaling {
    fn default() -> Self {
        Self {
            health_growth_percent: 15,
            speed_growth_percent: 3,
            count_growth_percent: 10,
        }
    }
}
