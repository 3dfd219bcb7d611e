use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use tower_defense_core::{CellCoord, EnemyId, EnemyKind, MapId, TowerKind, Tuning};
use tower_defense_system_tower_targeting::{
    TargetingEnemy, TargetingTower, TowerTarget, TowerTargeting,
};
use tower_defense_world::{
    deck::Deck,
    levels::LevelCatalog,
    query,
    registry::{EnemySpawn, PendingMutations},
    World,
};

#[test]
fn deterministic_replay_prefers_leading_enemies() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    let opening = &first.rounds[0];
    assert!(opening.is_empty(), "nothing is in range before spawns");

    let crowded = &first.rounds[1];
    assert_eq!(crowded.len(), 2);
    assert!(crowded
        .iter()
        .all(|(_, enemy)| *enemy == EnemyId::new(1).get()));

    let thinned = &first.rounds[2];
    assert_eq!(thinned.len(), 2);
    assert!(thinned
        .iter()
        .all(|(_, enemy)| *enemy == EnemyId::new(2).get()));
}

fn replay() -> ReplayOutcome {
    let catalog = LevelCatalog::builtin();
    let level = catalog.get(&MapId::new("meadow")).expect("builtin level");
    let map = level.build_map().expect("valid map");
    let deck = Deck::new(&[TowerKind::Archer, TowerKind::Ice], &TowerKind::ALL).expect("deck");
    let mut world = World::new(map, deck, Tuning::default(), 500);

    let _ = world
        .purchase(TowerKind::Archer, CellCoord::new(4, 3))
        .expect("placed archer");
    let _ = world
        .purchase(TowerKind::Ice, CellCoord::new(6, 3))
        .expect("placed ice");

    let mut targeting = TowerTargeting::new();
    let mut out = Vec::new();
    let mut rounds = Vec::new();

    rounds.push(assign(&world, &mut targeting, &mut out));

    let mut pending = PendingMutations::new();
    for progress in [5.0, 6.0, 5.5] {
        pending.queue_spawn(EnemySpawn {
            kind: EnemyKind::Grunt,
            wave: 0,
            health: 30,
            speed: 1.5,
            breach_damage: 1,
            reward: 5,
            progress,
        });
    }
    let _ = world.registry_mut().flush(&mut pending);
    rounds.push(assign(&world, &mut targeting, &mut out));

    pending.queue_death(EnemyId::new(1));
    let _ = world.registry_mut().flush(&mut pending);
    rounds.push(assign(&world, &mut targeting, &mut out));

    ReplayOutcome { rounds }
}

fn assign(
    world: &World,
    targeting: &mut TowerTargeting,
    out: &mut Vec<TowerTarget>,
) -> Vec<(u32, u32)> {
    let towers: Vec<TargetingTower> = query::towers(world)
        .into_iter()
        .map(|tower| TargetingTower {
            id: tower.id,
            center: tower.cell.center(),
            range: tower.range,
        })
        .collect();
    let enemies: Vec<TargetingEnemy> = query::enemies(world)
        .into_iter()
        .map(|enemy| TargetingEnemy {
            id: enemy.id,
            position: enemy.position,
            progress: enemy.progress,
        })
        .collect();

    targeting.handle(&towers, &enemies, out);
    out.iter()
        .map(|target| (target.tower.get(), target.enemy.get()))
        .collect()
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    rounds: Vec<Vec<(u32, u32)>>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.rounds.hash(&mut hasher);
        hasher.finish()
    }
}
