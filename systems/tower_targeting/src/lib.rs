#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use tower_defense_core::{EnemyId, TowerId, Vec2};

/// Tower as seen by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetingTower {
    /// Identifier of the tower.
    pub id: TowerId,
    /// Centre of the tower's cell in world units.
    pub center: Vec2,
    /// Targeting range at the tower's current level.
    pub range: f32,
}

/// Live enemy as seen by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetingEnemy {
    /// Identifier of the enemy.
    pub id: EnemyId,
    /// Position along the path in world units.
    pub position: Vec2,
    /// Distance travelled along the path.
    pub progress: f32,
}

/// Target chosen for a single tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that should fire.
    pub tower: TowerId,
    /// Enemy the tower should fire at.
    pub enemy: EnemyId,
    /// Centre of the tower in world units.
    pub tower_center: Vec2,
    /// Position of the enemy in world units.
    pub enemy_position: Vec2,
}

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<TargetingEnemy>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks, for every tower, the enemy in range that travelled furthest.
    ///
    /// Ties on progress go to the lowest enemy identifier. Towers with nothing
    /// in range produce no entry. The output buffer is cleared first and is
    /// filled in the order `towers` is given.
    pub fn handle(
        &mut self,
        towers: &[TargetingTower],
        enemies: &[TargetingEnemy],
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for tower in towers {
            let max_distance_sq = tower.range * tower.range;
            let mut best: Option<BestCandidate> = None;

            for candidate in &self.enemy_workspace {
                let distance_sq = tower.center.distance_squared(candidate.position);
                if distance_sq > max_distance_sq {
                    continue;
                }

                let current = BestCandidate {
                    progress: candidate.progress,
                    enemy: candidate.id,
                    position: candidate.position,
                };

                match &mut best {
                    Some(existing) => {
                        if current.precedes(existing) {
                            *existing = current;
                        }
                    }
                    None => best = Some(current),
                }
            }

            if let Some(best_candidate) = best {
                out.push(TowerTarget {
                    tower: tower.id,
                    enemy: best_candidate.enemy,
                    tower_center: tower.center,
                    enemy_position: best_candidate.position,
                });
            }
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &[TargetingEnemy]) {
        self.enemy_workspace.clear();
        self.enemy_workspace.extend(
            enemies
                .iter()
                .filter(|enemy| enemy.progress.is_finite())
                .copied(),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    progress: f32,
    enemy: EnemyId,
    position: Vec2,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.progress != other.progress {
            return self.progress > other.progress;
        }

        self.enemy < other.enemy
    }
}
