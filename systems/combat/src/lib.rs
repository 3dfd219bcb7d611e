#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution for one fixed simulation step.
//!
//! A step runs four phases in order: towers fire, projectiles home in and
//! hit, kills are credited, enemies walk. Nothing is added to or removed from
//! the registry while the step runs; every structural change is recorded in
//! the caller's [`PendingMutations`] and becomes visible after the flush.

use std::time::Duration;

use tower_defense_core::{EnemyId, Payload, ProjectileId, SessionEvent, Tuning, Vec2};
use tower_defense_system_tower_targeting::{
    TargetingEnemy, TargetingTower, TowerTarget, TowerTargeting,
};
use tower_defense_world::{
    economy::EconomyLedger,
    map::Map,
    registry::{DamageOutcome, Enemy, PendingMutations, ProjectileLaunch, Registry},
    CombatParts,
};
use tracing::debug;

/// Totals produced by one combat step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombatReport {
    /// Projectiles queued for launch.
    pub shots: u32,
    /// Enemies whose health reached zero.
    pub kills: u32,
    /// Enemies that reached the end of the path.
    pub breaches: u32,
    /// Base health reached zero and the step stopped early.
    pub base_fell: bool,
}

/// Combat resolver that reuses scratch buffers across steps.
#[derive(Debug, Default)]
pub struct CombatResolver {
    targeting: TowerTargeting,
    ready: Vec<TargetingTower>,
    candidates: Vec<TargetingEnemy>,
    targets: Vec<TowerTarget>,
    projectile_ids: Vec<ProjectileId>,
    splash: Vec<EnemyId>,
}

impl CombatResolver {
    /// Creates a resolver with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one step of length `dt`.
    ///
    /// Kill and breach events are appended to `events`. When the base falls
    /// the remaining enemies do not move this step.
    pub fn resolve(
        &mut self,
        parts: CombatParts<'_>,
        dt: Duration,
        pending: &mut PendingMutations,
        events: &mut Vec<SessionEvent>,
    ) -> CombatReport {
        let CombatParts {
            map,
            registry,
            ledger,
            base,
            tuning,
        } = parts;
        let mut report = CombatReport::default();

        self.fire(map, registry, tuning, dt, pending, &mut report);

        let mut ids = std::mem::take(&mut self.projectile_ids);
        registry.projectile_ids(&mut ids);
        let mut strike = Strike {
            registry: &mut *registry,
            ledger: &mut *ledger,
            pending: &mut *pending,
            events: &mut *events,
            report: &mut report,
            splash: &mut self.splash,
        };
        for &id in &ids {
            strike.advance_projectile(id, map, tuning, dt);
        }
        self.projectile_ids = ids;

        let path_length = map.path_length();
        for enemy in registry.enemies_mut() {
            if !enemy.advance(dt, path_length) {
                continue;
            }

            enemy.mark_breached();
            pending.queue_breach(enemy.id());
            let base_health = base.take_damage(enemy.breach_damage());
            report.breaches += 1;
            events.push(SessionEvent::EnemyBreached {
                enemy: enemy.id(),
                damage: enemy.breach_damage(),
                base_health,
            });
            debug!(
                enemy = %enemy.id(),
                damage = enemy.breach_damage(),
                base_health,
                "enemy breached"
            );

            if base.has_fallen() {
                report.base_fell = true;
                break;
            }
        }

        report
    }

    fn fire(
        &mut self,
        map: &Map,
        registry: &mut Registry,
        tuning: &Tuning,
        dt: Duration,
        pending: &mut PendingMutations,
        report: &mut CombatReport,
    ) {
        self.ready.clear();
        for tower in registry.towers_mut() {
            tower.tick_cooldown(dt);
            if tower.is_ready() {
                let stats = tuning.tower_stats(tower.kind(), tower.level());
                self.ready.push(TargetingTower {
                    id: tower.id(),
                    center: tower.cell().center(),
                    range: stats.range,
                });
            }
        }
        if self.ready.is_empty() {
            return;
        }

        self.candidates.clear();
        self.candidates
            .extend(registry.live_enemies().map(|enemy| TargetingEnemy {
                id: enemy.id(),
                position: map.point_at(enemy.progress()),
                progress: enemy.progress(),
            }));

        self.targeting
            .handle(&self.ready, &self.candidates, &mut self.targets);

        for target in &self.targets {
            let Some(tower) = registry.tower_mut(target.tower) else {
                continue;
            };
            let stats = tuning.tower_stats(tower.kind(), tower.level());
            tower.reset_cooldown(stats.fire_interval);
            pending.queue_launch(ProjectileLaunch {
                tower: target.tower,
                target: target.enemy,
                position: target.tower_center,
                speed: stats.projectile_speed,
                payload: stats.payload(),
            });
            report.shots += 1;
        }
    }
}

struct Strike<'a> {
    registry: &'a mut Registry,
    ledger: &'a mut EconomyLedger,
    pending: &'a mut PendingMutations,
    events: &'a mut Vec<SessionEvent>,
    report: &'a mut CombatReport,
    splash: &'a mut Vec<EnemyId>,
}

impl Strike<'_> {
    fn advance_projectile(&mut self, id: ProjectileId, map: &Map, tuning: &Tuning, dt: Duration) {
        let Some(target) = self.registry.projectile(id).map(|projectile| projectile.target())
        else {
            return;
        };
        let Some(destination) = self
            .registry
            .live_enemy(target)
            .map(|enemy| map.point_at(enemy.progress()))
        else {
            self.pending.retire_projectile(id);
            return;
        };
        let Some(projectile) = self.registry.projectile_mut(id) else {
            return;
        };
        if !projectile.advance_toward(destination, dt, tuning.session.hit_threshold) {
            return;
        }

        let payload = projectile.payload();
        self.pending.retire_projectile(id);
        self.hit(target, destination, payload, map, tuning);
    }

    fn hit(&mut self, target: EnemyId, impact: Vec2, payload: Payload, map: &Map, tuning: &Tuning) {
        self.damage(target, payload.damage);
        if let (Some(slow), Some(enemy)) = (payload.slow, self.registry.enemy_mut(target)) {
            enemy.apply_slow(slow);
        }

        let Some(radius) = payload.splash_radius else {
            return;
        };
        let splash_damage = tuning.splash_damage(payload.damage);
        if splash_damage == 0 {
            return;
        }

        self.splash.clear();
        self.splash.extend(
            self.registry
                .live_enemies()
                .filter(|enemy| enemy.id() != target)
                .filter(|enemy| map.point_at(enemy.progress()).distance(impact) <= radius)
                .map(Enemy::id),
        );
        for index in 0..self.splash.len() {
            let victim = self.splash[index];
            self.damage(victim, splash_damage);
        }
    }

    fn damage(&mut self, id: EnemyId, amount: u32) {
        let Some(enemy) = self.registry.enemy_mut(id) else {
            return;
        };
        if enemy.apply_damage(amount) != DamageOutcome::Killed {
            return;
        }

        let reward = enemy.reward();
        self.pending.queue_death(id);
        self.ledger.credit_earning(reward);
        self.report.kills += 1;
        self.events
            .push(SessionEvent::EnemyKilled { enemy: id, reward });
        debug!(enemy = %id, reward, "enemy killed");
    }
}
