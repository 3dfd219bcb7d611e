#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for a tower defense match.
//!
//! The [`World`] owns the map, the entity registry, the coin ledger, the deck
//! and the base. Player-driven mutations (purchase, sell, upgrade) are
//! validated here; tick-driven mutations are performed by the systems through
//! [`CombatParts`] and land via [`registry::PendingMutations`].

pub mod deck;
pub mod economy;
pub mod levels;
pub mod map;
pub mod registry;

use tower_defense_core::{CellCoord, Rejection, TowerId, TowerKind, Tuning};
use tracing::debug;

use crate::{deck::Deck, economy::EconomyLedger, map::Map, registry::Registry};

/// Health pool enemies drain when they breach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Base {
    health: u32,
    max: u32,
}

impl Base {
    /// Creates a base at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { health: max, max }
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Health at session start.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether the base has no health left.
    #[must_use]
    pub const fn has_fallen(&self) -> bool {
        self.health == 0
    }

    /// Removes health, saturating at zero, and returns what remains.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }
}

/// Mutable view handed to the combat resolver for one tick.
#[derive(Debug)]
pub struct CombatParts<'a> {
    /// Level geometry.
    pub map: &'a Map,
    /// Entity storage; structural changes must go through pending mutations.
    pub registry: &'a mut Registry,
    /// Coin balance receiving kill rewards.
    pub ledger: &'a mut EconomyLedger,
    /// Base receiving breach damage.
    pub base: &'a mut Base,
    /// Balancing tables.
    pub tuning: &'a Tuning,
}

/// Represents the authoritative state of one match.
#[derive(Debug)]
pub struct World {
    map: Map,
    registry: Registry,
    ledger: EconomyLedger,
    deck: Deck,
    tuning: Tuning,
    base: Base,
}

impl World {
    /// Creates a world with an empty registry and a full-health base.
    #[must_use]
    pub fn new(map: Map, deck: Deck, tuning: Tuning, starting_coins: u32) -> Self {
        let base = Base::new(tuning.session.base_health);
        Self {
            map,
            registry: Registry::new(),
            ledger: EconomyLedger::new(starting_coins),
            deck,
            tuning,
            base,
        }
    }

    /// Level geometry.
    #[must_use]
    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Entity storage.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Entity storage for applying pending mutations between ticks.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Coin balance.
    #[must_use]
    pub fn ledger(&self) -> &EconomyLedger {
        &self.ledger
    }

    /// Coin balance for crediting wave bonuses.
    pub fn ledger_mut(&mut self) -> &mut EconomyLedger {
        &mut self.ledger
    }

    /// Tower kinds purchasable this session.
    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Balancing tables.
    #[must_use]
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Base health pool.
    #[must_use]
    pub fn base(&self) -> &Base {
        &self.base
    }

    /// Splits the world into the disjoint borrows a combat step needs.
    pub fn combat_parts(&mut self) -> CombatParts<'_> {
        CombatParts {
            map: &self.map,
            registry: &mut self.registry,
            ledger: &mut self.ledger,
            base: &mut self.base,
            tuning: &self.tuning,
        }
    }

    /// Buys a tower and places it on `cell`.
    ///
    /// Checks run in a fixed order and nothing changes when one fails: deck
    /// membership, funds, buildability, occupancy.
    pub fn purchase(&mut self, kind: TowerKind, cell: CellCoord) -> Result<TowerId, Rejection> {
        if !self.deck.contains(kind) {
            return Err(Rejection::NotInDeck { kind });
        }
        let cost = self.tuning.towers.profile(kind).cost;
        self.ledger.ensure_affordable(cost)?;
        if !self.map.is_buildable(cell) {
            return Err(Rejection::NotBuildable { cell });
        }

        self.ledger.debit(cost)?;
        let tower = match self.registry.add_tower(kind, cell, cost) {
            Ok(tower) => tower,
            Err(_) => {
                self.ledger.credit(cost);
                return Err(Rejection::OccupiedCell { cell });
            }
        };
        debug!(%tower, %kind, %cell, cost, balance = self.ledger.balance(), "tower placed");
        Ok(tower)
    }

    /// Removes a tower and refunds part of what was spent on it.
    pub fn sell(&mut self, tower: TowerId) -> Result<u32, Rejection> {
        let removed = self
            .registry
            .remove_tower(tower)
            .map_err(|_| Rejection::NotFound { tower })?;
        let refund = self.tuning.economy.refund(removed.spent());
        self.ledger.credit(refund);
        debug!(%tower, refund, balance = self.ledger.balance(), "tower sold");
        Ok(refund)
    }

    /// Raises a tower by one level and returns the level reached.
    pub fn upgrade(&mut self, tower: TowerId) -> Result<u32, Rejection> {
        let (kind, level) = self
            .registry
            .tower(tower)
            .map(|found| (found.kind(), found.level()))
            .ok_or(Rejection::NotFound { tower })?;
        if level >= self.tuning.session.max_tower_level {
            return Err(Rejection::MaxLevel { tower });
        }
        let cost = self.tuning.upgrade_cost(kind, level);
        self.ledger.debit(cost)?;

        let upgraded = self
            .registry
            .tower_mut(tower)
            .ok_or(Rejection::NotFound { tower })?;
        upgraded.raise_level(cost);
        let level = upgraded.level();
        debug!(%tower, level, cost, balance = self.ledger.balance(), "tower upgraded");
        Ok(level)
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_defense_core::{EnemySnapshot, ProjectileSnapshot, TowerSnapshot};

    use super::World;

    /// Towers in ascending identifier order.
    #[must_use]
    pub fn towers(world: &World) -> Vec<TowerSnapshot> {
        world
            .registry
            .towers()
            .map(|tower| TowerSnapshot {
                id: tower.id(),
                kind: tower.kind(),
                cell: tower.cell(),
                level: tower.level(),
                range: world.tuning.tower_stats(tower.kind(), tower.level()).range,
                cooldown: tower.cooldown(),
            })
            .collect()
    }

    /// Live enemies in ascending identifier order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<EnemySnapshot> {
        world
            .registry
            .live_enemies()
            .map(|enemy| EnemySnapshot {
                id: enemy.id(),
                kind: enemy.kind(),
                position: world.map.point_at(enemy.progress()),
                progress: enemy.progress(),
                health: enemy.health(),
                max_health: enemy.max_health(),
                slowed: enemy.is_slowed(),
            })
            .collect()
    }

    /// Projectiles in ascending identifier order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .registry
            .projectiles()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id(),
                tower: projectile.tower(),
                target: projectile.target(),
                position: projectile.position(),
            })
            .collect()
    }

    /// Coins currently available.
    #[must_use]
    pub fn balance(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Remaining base health.
    #[must_use]
    pub fn base_health(world: &World) -> u32 {
        world.base.health()
    }
}
