//! Authoritative entity storage and identifier allocation.
//!
//! Structural changes (adding or removing entities) made while a tick is in
//! flight are recorded in [`PendingMutations`] and applied by
//! [`Registry::flush`] once per tick, in the order deaths, breaches, spawns,
//! new projectiles. The mutable iterators handed to systems can change entity
//! state but never the set of entities.

use std::{collections::BTreeMap, time::Duration};

use thiserror::Error;
use tower_defense_core::{
    CellCoord, EnemyId, EnemyKind, Payload, ProjectileId, SlowEffect, TowerId, TowerKind, Vec2,
};

/// Tower stored inside the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    cell: CellCoord,
    level: u32,
    cooldown: Duration,
    spent: u32,
}

impl Tower {
    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Kind of tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Cell occupied by the tower.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current level, starting at one.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Time until the tower may fire again.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Coins spent on the tower so far, purchase and upgrades included.
    #[must_use]
    pub const fn spent(&self) -> u32 {
        self.spent
    }

    /// Reports whether the tower may fire this tick.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown.is_zero()
    }

    /// Counts the cooldown down by one step.
    pub fn tick_cooldown(&mut self, dt: Duration) {
        self.cooldown = self.cooldown.saturating_sub(dt);
    }

    /// Restarts the cooldown after firing.
    pub fn reset_cooldown(&mut self, interval: Duration) {
        self.cooldown = interval;
    }

    pub(crate) fn raise_level(&mut self, cost: u32) {
        self.level += 1;
        self.spent = self.spent.saturating_add(cost);
    }
}

/// Lifecycle marker for an enemy inside a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyState {
    /// Walking the path and targetable.
    Alive,
    /// Health reached zero; removal is pending.
    Killed,
    /// Reached the end of the path; removal is pending.
    Breached,
}

/// Result of applying damage to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The enemy was not alive, nothing happened.
    Ignored,
    /// The enemy lost health but survived.
    Wounded,
    /// The enemy's health reached zero with this hit.
    Killed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveSlow {
    multiplier: f32,
    remaining: Duration,
}

/// Enemy stored inside the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    wave: u32,
    max_health: u32,
    health: u32,
    progress: f32,
    speed: f32,
    breach_damage: u32,
    reward: u32,
    slows: Vec<ActiveSlow>,
    state: EnemyState,
}

impl Enemy {
    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Kind of enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Zero-based index of the wave that spawned the enemy.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Health at spawn.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Distance travelled along the path.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Base health removed on breach.
    #[must_use]
    pub const fn breach_damage(&self) -> u32 {
        self.breach_damage
    }

    /// Coins credited on kill.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Lifecycle marker within the current tick.
    #[must_use]
    pub const fn state(&self) -> EnemyState {
        self.state
    }

    /// Reports whether the enemy can still be targeted and damaged.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == EnemyState::Alive
    }

    /// Reports whether any slow effect is active.
    #[must_use]
    pub fn is_slowed(&self) -> bool {
        !self.slows.is_empty()
    }

    /// Base speed scaled by the strongest active slow; slows never stack.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        let strongest = self
            .slows
            .iter()
            .map(|slow| slow.multiplier)
            .fold(1.0_f32, f32::min);
        self.speed * strongest
    }

    /// Subtracts damage, saturating at zero health.
    pub fn apply_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.state = EnemyState::Killed;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Wounded
        }
    }

    /// Applies a slow, refreshing the duration of an equally strong one.
    pub fn apply_slow(&mut self, effect: SlowEffect) {
        if !self.is_alive() {
            return;
        }

        if let Some(existing) = self
            .slows
            .iter_mut()
            .find(|slow| slow.multiplier == effect.multiplier)
        {
            existing.remaining = existing.remaining.max(effect.duration);
            return;
        }

        self.slows.push(ActiveSlow {
            multiplier: effect.multiplier,
            remaining: effect.duration,
        });
    }

    /// Moves the enemy along the path for one step and ages its effects.
    ///
    /// Returns `true` once the enemy stands at the end of the path.
    pub fn advance(&mut self, dt: Duration, path_length: f32) -> bool {
        if !self.is_alive() {
            return false;
        }

        let distance = self.effective_speed() * dt.as_secs_f32();
        self.progress = (self.progress + distance).min(path_length);

        for slow in &mut self.slows {
            slow.remaining = slow.remaining.saturating_sub(dt);
        }
        self.slows.retain(|slow| !slow.remaining.is_zero());

        self.progress >= path_length
    }

    /// Flags the enemy as having reached the end of the path.
    pub fn mark_breached(&mut self) {
        if self.is_alive() {
            self.state = EnemyState::Breached;
        }
    }
}

/// Projectile stored inside the registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    id: ProjectileId,
    tower: TowerId,
    target: EnemyId,
    position: Vec2,
    speed: f32,
    payload: Payload,
}

impl Projectile {
    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Tower that fired the projectile.
    #[must_use]
    pub const fn tower(&self) -> TowerId {
        self.tower
    }

    /// Enemy the projectile homes on. May no longer exist.
    #[must_use]
    pub const fn target(&self) -> EnemyId {
        self.target
    }

    /// Current position in world units.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Damage and effects delivered on hit.
    #[must_use]
    pub const fn payload(&self) -> Payload {
        self.payload
    }

    /// Moves toward `destination` and reports whether it is within `threshold`.
    pub fn advance_toward(&mut self, destination: Vec2, dt: Duration, threshold: f32) -> bool {
        let step = self.speed * dt.as_secs_f32();
        let offset = destination - self.position;
        let distance = offset.length();

        if distance <= step {
            self.position = destination;
        } else {
            self.position += offset / distance * step;
        }

        self.position.distance(destination) <= threshold
    }
}

/// Everything needed to create an enemy at the next flush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Zero-based index of the originating wave.
    pub wave: u32,
    /// Health at spawn, already scaled for the wave.
    pub health: u32,
    /// Base speed in cells per second, already scaled for the wave.
    pub speed: f32,
    /// Base health removed on breach.
    pub breach_damage: u32,
    /// Coins credited on kill.
    pub reward: u32,
    /// Initial distance along the path.
    pub progress: f32,
}

/// Everything needed to create a projectile at the next flush.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileLaunch {
    /// Tower that fired.
    pub tower: TowerId,
    /// Enemy to home on.
    pub target: EnemyId,
    /// Launch position in world units.
    pub position: Vec2,
    /// Travel speed in cells per second.
    pub speed: f32,
    /// Damage and effects delivered on hit.
    pub payload: Payload,
}

/// Structural changes collected during a tick.
#[derive(Clone, Debug, Default)]
pub struct PendingMutations {
    deaths: Vec<EnemyId>,
    breaches: Vec<EnemyId>,
    retired: Vec<ProjectileId>,
    spawns: Vec<EnemySpawn>,
    launches: Vec<ProjectileLaunch>,
}

impl PendingMutations {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues removal of a killed enemy.
    pub fn queue_death(&mut self, enemy: EnemyId) {
        self.deaths.push(enemy);
    }

    /// Queues removal of an enemy that reached the end of the path.
    pub fn queue_breach(&mut self, enemy: EnemyId) {
        self.breaches.push(enemy);
    }

    /// Queues removal of a projectile that hit or lost its target.
    pub fn retire_projectile(&mut self, projectile: ProjectileId) {
        self.retired.push(projectile);
    }

    /// Queues creation of an enemy.
    pub fn queue_spawn(&mut self, spawn: EnemySpawn) {
        self.spawns.push(spawn);
    }

    /// Queues creation of a projectile.
    pub fn queue_launch(&mut self, launch: ProjectileLaunch) {
        self.launches.push(launch);
    }

    /// Number of spawns queued so far.
    #[must_use]
    pub fn spawn_count(&self) -> usize {
        self.spawns.len()
    }

    /// Reports whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deaths.is_empty()
            && self.breaches.is_empty()
            && self.retired.is_empty()
            && self.spawns.is_empty()
            && self.launches.is_empty()
    }
}

/// Entities added or removed by a [`Registry::flush`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlushReport {
    /// Enemies removed as kills, in queue order.
    pub killed: Vec<Enemy>,
    /// Enemies removed as breaches, in queue order.
    pub breached: Vec<Enemy>,
    /// Identifiers of newly created enemies.
    pub spawned: Vec<EnemyId>,
    /// Identifiers of newly created projectiles.
    pub launched: Vec<ProjectileId>,
}

/// Errors reported by registry operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A tower already stands on the cell.
    #[error("cell {cell} is already occupied")]
    OccupiedCell {
        /// Requested cell.
        cell: CellCoord,
    },
    /// No tower with the identifier exists.
    #[error("{0} not found")]
    TowerNotFound(TowerId),
    /// No enemy with the identifier exists.
    #[error("{0} not found")]
    EnemyNotFound(EnemyId),
    /// No projectile with the identifier exists.
    #[error("{0} not found")]
    ProjectileNotFound(ProjectileId),
}

/// Registry that stores live entities and manages identifier allocation.
#[derive(Debug)]
pub struct Registry {
    towers: BTreeMap<TowerId, Tower>,
    occupancy: BTreeMap<CellCoord, TowerId>,
    enemies: BTreeMap<EnemyId, Enemy>,
    projectiles: BTreeMap<ProjectileId, Projectile>,
    next_tower_id: TowerId,
    next_enemy_id: EnemyId,
    next_projectile_id: ProjectileId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with reset identifier counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            towers: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
            next_enemy_id: EnemyId::new(0),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    /// Stores a level-one tower on a free cell.
    pub fn add_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        spent: u32,
    ) -> Result<TowerId, RegistryError> {
        if self.occupancy.contains_key(&cell) {
            return Err(RegistryError::OccupiedCell { cell });
        }

        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get() + 1);
        let _ = self.occupancy.insert(cell, id);
        let _ = self.towers.insert(
            id,
            Tower {
                id,
                kind,
                cell,
                level: 1,
                cooldown: Duration::ZERO,
                spent,
            },
        );
        Ok(id)
    }

    /// Removes a tower and frees its cell.
    pub fn remove_tower(&mut self, id: TowerId) -> Result<Tower, RegistryError> {
        let tower = self
            .towers
            .remove(&id)
            .ok_or(RegistryError::TowerNotFound(id))?;
        let _ = self.occupancy.remove(&tower.cell);
        Ok(tower)
    }

    /// Stores a new enemy.
    pub fn add_enemy(&mut self, spawn: EnemySpawn) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get() + 1);
        let health = spawn.health.max(1);
        let _ = self.enemies.insert(
            id,
            Enemy {
                id,
                kind: spawn.kind,
                wave: spawn.wave,
                max_health: health,
                health,
                progress: spawn.progress.max(0.0),
                speed: spawn.speed,
                breach_damage: spawn.breach_damage,
                reward: spawn.reward,
                slows: Vec::new(),
                state: EnemyState::Alive,
            },
        );
        id
    }

    /// Removes an enemy regardless of its state.
    pub fn remove_enemy(&mut self, id: EnemyId) -> Result<Enemy, RegistryError> {
        self.enemies
            .remove(&id)
            .ok_or(RegistryError::EnemyNotFound(id))
    }

    /// Stores a new projectile.
    pub fn add_projectile(&mut self, launch: ProjectileLaunch) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get() + 1);
        let _ = self.projectiles.insert(
            id,
            Projectile {
                id,
                tower: launch.tower,
                target: launch.target,
                position: launch.position,
                speed: launch.speed,
                payload: launch.payload,
            },
        );
        id
    }

    /// Removes a projectile.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> Result<Projectile, RegistryError> {
        self.projectiles
            .remove(&id)
            .ok_or(RegistryError::ProjectileNotFound(id))
    }

    /// Looks up a tower.
    #[must_use]
    pub fn tower(&self, id: TowerId) -> Option<&Tower> {
        self.towers.get(&id)
    }

    /// Looks up a tower for mutation.
    pub fn tower_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.towers.get_mut(&id)
    }

    /// Returns the tower standing on the cell, if any.
    #[must_use]
    pub fn tower_at(&self, cell: CellCoord) -> Option<TowerId> {
        self.occupancy.get(&cell).copied()
    }

    /// Towers in ascending identifier order.
    pub fn towers(&self) -> impl Iterator<Item = &Tower> {
        self.towers.values()
    }

    /// Mutable towers in ascending identifier order.
    pub fn towers_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.towers.values_mut()
    }

    /// Number of towers.
    #[must_use]
    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    /// Looks up an enemy in any state.
    #[must_use]
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Resolves a weak enemy reference; killed or breached enemies are absent.
    #[must_use]
    pub fn live_enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id).filter(|enemy| enemy.is_alive())
    }

    /// Looks up an enemy for mutation.
    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    /// Enemies in ascending identifier order, including those pending removal.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Alive enemies in ascending identifier order.
    pub fn live_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values().filter(|enemy| enemy.is_alive())
    }

    /// Mutable enemies in ascending identifier order.
    pub fn enemies_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.values_mut()
    }

    /// Number of stored enemies.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Looks up a projectile.
    #[must_use]
    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// Looks up a projectile for mutation.
    pub fn projectile_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.projectiles.get_mut(&id)
    }

    /// Projectiles in ascending identifier order.
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    /// Writes projectile identifiers in ascending order into `out`.
    pub fn projectile_ids(&self, out: &mut Vec<ProjectileId>) {
        out.clear();
        out.extend(self.projectiles.keys().copied());
    }

    /// Applies queued structural changes: deaths, breaches, spawns, projectiles.
    ///
    /// Removals queued more than once are applied once.
    pub fn flush(&mut self, pending: &mut PendingMutations) -> FlushReport {
        let mut report = FlushReport::default();

        for id in pending.deaths.drain(..) {
            if let Ok(enemy) = self.remove_enemy(id) {
                report.killed.push(enemy);
            }
        }
        for id in pending.retired.drain(..) {
            let _ = self.remove_projectile(id);
        }
        for id in pending.breaches.drain(..) {
            if let Ok(enemy) = self.remove_enemy(id) {
                report.breached.push(enemy);
            }
        }
        for spawn in pending.spawns.drain(..) {
            report.spawned.push(self.add_enemy(spawn));
        }
        for launch in pending.launches.drain(..) {
            report.launched.push(self.add_projectile(launch));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(progress: f32) -> EnemySpawn {
        EnemySpawn {
            kind: EnemyKind::Grunt,
            wave: 0,
            health: 10,
            speed: 2.0,
            breach_damage: 1,
            reward: 3,
            progress,
        }
    }

    fn launch(target: EnemyId) -> ProjectileLaunch {
        ProjectileLaunch {
            tower: TowerId::new(0),
            target,
            position: Vec2::ZERO,
            speed: 4.0,
            payload: Payload {
                damage: 5,
                splash_radius: None,
                slow: None,
            },
        }
    }

    #[test]
    fn registry_starts_empty() {
        let registry = Registry::new();
        assert_eq!(registry.tower_count(), 0);
        assert_eq!(registry.enemy_count(), 0);
        assert!(registry.projectiles().next().is_none());
    }

    #[test]
    fn occupied_cell_is_rejected() {
        let mut registry = Registry::new();
        let cell = CellCoord::new(2, 3);
        let first = registry.add_tower(TowerKind::Archer, cell, 50);
        assert_eq!(first, Ok(TowerId::new(0)));
        assert_eq!(
            registry.add_tower(TowerKind::Ice, cell, 60),
            Err(RegistryError::OccupiedCell { cell })
        );
        assert_eq!(registry.tower_at(cell), Some(TowerId::new(0)));
    }

    #[test]
    fn identifiers_are_never_reused() {
        let mut registry = Registry::new();
        let cell = CellCoord::new(1, 1);
        let first = registry.add_tower(TowerKind::Archer, cell, 50).expect("free");
        let _ = registry.remove_tower(first).expect("present");
        let second = registry.add_tower(TowerKind::Archer, cell, 50).expect("free");
        assert_ne!(first, second);

        let enemy = registry.add_enemy(spawn(0.0));
        let _ = registry.remove_enemy(enemy).expect("present");
        assert_ne!(registry.add_enemy(spawn(0.0)), enemy);
    }

    #[test]
    fn removing_unknown_entities_fails() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.remove_tower(TowerId::new(9)).err(),
            Some(RegistryError::TowerNotFound(TowerId::new(9)))
        );
        assert_eq!(
            registry.remove_enemy(EnemyId::new(4)).err(),
            Some(RegistryError::EnemyNotFound(EnemyId::new(4)))
        );
        assert_eq!(
            registry.remove_projectile(ProjectileId::new(1)).err(),
            Some(RegistryError::ProjectileNotFound(ProjectileId::new(1)))
        );
    }

    #[test]
    fn flush_applies_removals_once_and_in_order() {
        let mut registry = Registry::new();
        let doomed = registry.add_enemy(spawn(0.0));
        let runner = registry.add_enemy(spawn(5.0));

        let mut pending = PendingMutations::new();
        pending.queue_death(doomed);
        pending.queue_death(doomed);
        pending.queue_breach(runner);
        pending.queue_spawn(spawn(0.0));
        pending.queue_launch(launch(doomed));

        let report = registry.flush(&mut pending);
        assert!(pending.is_empty());
        assert_eq!(report.killed.len(), 1);
        assert_eq!(report.killed[0].id(), doomed);
        assert_eq!(report.breached.len(), 1);
        assert_eq!(report.spawned, vec![EnemyId::new(2)]);
        assert_eq!(report.launched, vec![ProjectileId::new(0)]);
        assert_eq!(registry.enemy_count(), 1);
    }

    #[test]
    fn live_enemy_hides_killed_enemies_before_flush() {
        let mut registry = Registry::new();
        let id = registry.add_enemy(spawn(0.0));
        let enemy = registry.enemy_mut(id).expect("present");
        assert_eq!(enemy.apply_damage(4), DamageOutcome::Wounded);
        assert_eq!(enemy.apply_damage(6), DamageOutcome::Killed);
        assert_eq!(enemy.apply_damage(6), DamageOutcome::Ignored);
        assert_eq!(enemy.health(), 0);

        assert!(registry.live_enemy(id).is_none());
        assert!(registry.enemy(id).is_some());
    }

    #[test]
    fn strongest_slow_wins_and_expires() {
        let mut registry = Registry::new();
        let id = registry.add_enemy(spawn(0.0));
        let enemy = registry.enemy_mut(id).expect("present");
        enemy.apply_slow(SlowEffect {
            multiplier: 0.5,
            duration: Duration::from_millis(200),
        });
        enemy.apply_slow(SlowEffect {
            multiplier: 0.8,
            duration: Duration::from_millis(400),
        });
        assert!((enemy.effective_speed() - 1.0).abs() < 1e-6);

        let _ = enemy.advance(Duration::from_millis(200), 100.0);
        assert!((enemy.progress() - 0.2).abs() < 1e-5);
        assert!((enemy.effective_speed() - 1.6).abs() < 1e-6);

        let _ = enemy.advance(Duration::from_millis(200), 100.0);
        assert!(!enemy.is_slowed());
    }

    #[test]
    fn reapplying_equal_slow_refreshes_duration() {
        let mut registry = Registry::new();
        let id = registry.add_enemy(spawn(0.0));
        let enemy = registry.enemy_mut(id).expect("present");
        let slow = SlowEffect {
            multiplier: 0.5,
            duration: Duration::from_millis(300),
        };
        enemy.apply_slow(slow);
        let _ = enemy.advance(Duration::from_millis(200), 100.0);
        enemy.apply_slow(slow);
        let _ = enemy.advance(Duration::from_millis(200), 100.0);
        assert!(enemy.is_slowed());
    }

    #[test]
    fn progress_is_clamped_to_path_end() {
        let mut registry = Registry::new();
        let id = registry.add_enemy(spawn(9.5));
        let enemy = registry.enemy_mut(id).expect("present");
        assert!(enemy.advance(Duration::from_secs(1), 10.0));
        assert!((enemy.progress() - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn projectile_snaps_to_close_destination() {
        let mut registry = Registry::new();
        let id = registry.add_projectile(launch(EnemyId::new(0)));
        let projectile = registry.projectile_mut(id).expect("present");
        assert!(!projectile.advance_toward(Vec2::new(4.0, 0.0), Duration::from_millis(500), 0.1));
        assert!((projectile.position().x - 2.0).abs() < 1e-5);
        assert!(projectile.advance_toward(Vec2::new(4.0, 0.0), Duration::from_millis(500), 0.1));
    }
}
