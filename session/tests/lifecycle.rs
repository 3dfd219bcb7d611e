use std::time::Duration;

use tower_defense_core::{
    Accepted, CellCoord, EnemyKind, MapId, PlayerCommand, Rejection, SessionEvent, SessionStatus,
    SessionSummary, SpawnEntry, TowerKind, Tuning, TuningError, WaveDefinition,
};
use tower_defense_session::{HostError, SessionHost, SessionId, SessionRequest};
use tower_defense_world::levels::{LevelCatalog, LevelDefinition};

const TICK: Duration = Duration::from_millis(50);
const MAX_TICKS: usize = 10_000;

fn corridor(waves: Vec<WaveDefinition>) -> LevelDefinition {
    LevelDefinition {
        id: MapId::new("corridor"),
        name: String::from("Corridor"),
        columns: 8,
        rows: 3,
        path: vec![CellCoord::new(0, 1), CellCoord::new(7, 1)],
        blocked: Vec::new(),
        waves,
    }
}

fn grunts(count: u32, interval_ms: u64) -> WaveDefinition {
    WaveDefinition {
        entries: vec![SpawnEntry {
            kind: EnemyKind::Grunt,
            count,
            interval_ms,
        }],
    }
}

fn sprinting_tuning(breach_damage: u32) -> Tuning {
    let mut tuning = Tuning::default();
    tuning.session.spawn_jitter = 0.0;
    tuning.enemies.grunt.speed = 7.0;
    tuning.enemies.grunt.breach_damage = breach_damage;
    tuning
}

fn host_with(level: LevelDefinition, tuning: Tuning) -> (SessionHost, SessionId) {
    let mut catalog = LevelCatalog::new();
    catalog.insert(level).expect("valid level");
    let mut host = SessionHost::new(catalog, tuning).expect("valid tuning");
    let id = host
        .start_session(SessionRequest {
            map: MapId::new("corridor"),
            deck: TowerKind::ALL.to_vec(),
            unlocked: TowerKind::ALL.to_vec(),
            starting_bonus_coins: 0,
            seed: 3,
        })
        .expect("session starts");
    (host, id)
}

/// Ticks until the session leaves `Active`, returning the events of each tick.
fn run_while_active(host: &mut SessionHost, id: SessionId) -> Vec<Vec<SessionEvent>> {
    let mut ticks = Vec::new();
    for _ in 0..MAX_TICKS {
        let snapshot = host.tick(id, TICK).expect("hosted");
        ticks.push(host.drain_events(id).expect("hosted"));
        if snapshot.status != SessionStatus::Active {
            return ticks;
        }
    }
    panic!("session never left Active");
}

#[test]
fn fourth_breach_defeats_and_skips_the_clear_bonus() {
    let mut tuning = sprinting_tuning(5);
    tuning.session.base_health = 20;
    let (mut host, id) = host_with(corridor(vec![grunts(4, 500), grunts(1, 0)]), tuning);

    let _ = host
        .submit_command(id, PlayerCommand::StartWave)
        .expect("wave starts");
    let ticks = run_while_active(&mut host, id);

    let events: Vec<&SessionEvent> = ticks.iter().flatten().collect();
    let breach_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| matches!(event, SessionEvent::EnemyBreached { .. }))
        .map(|(index, _)| index)
        .collect();
    assert_eq!(breach_positions.len(), 4);

    let defeat_position = events
        .iter()
        .position(|event| {
            **event
                == SessionEvent::StatusChanged {
                    from: SessionStatus::Active,
                    to: SessionStatus::Defeat,
                }
        })
        .expect("defeat recorded");
    assert!(defeat_position > breach_positions[3]);
    assert!(!events
        .iter()
        .any(|event| matches!(event, SessionEvent::WaveCleared { .. })));

    let last_breach = ticks
        .last()
        .and_then(|tick| {
            tick.iter().find_map(|event| match event {
                SessionEvent::EnemyBreached { base_health, .. } => Some(*base_health),
                _ => None,
            })
        })
        .expect("defeat happens on a breaching tick");
    assert_eq!(last_breach, 0);

    let snapshot = host.snapshot(id).expect("hosted");
    assert_eq!(snapshot.status, SessionStatus::Defeat);
    assert_eq!(snapshot.base_health, 0);
    assert_eq!(
        host.summary(id),
        Ok(SessionSummary {
            coins_earned: 0,
            highest_wave: 1,
            kills: 0,
            won: false,
        })
    );
    assert_eq!(
        host.submit_command(id, PlayerCommand::StartWave),
        Err(HostError::Rejected(Rejection::InvalidState {
            status: SessionStatus::Defeat
        }))
    );
}

#[test]
fn waves_move_through_intermission_to_victory() {
    let (mut host, id) = host_with(
        corridor(vec![grunts(1, 0), grunts(1, 0)]),
        sprinting_tuning(1),
    );

    assert_eq!(
        host.submit_command(id, PlayerCommand::StartWave),
        Ok(Accepted::WaveStarted { wave: 0 })
    );
    assert_eq!(
        host.submit_command(id, PlayerCommand::StartWave),
        Err(HostError::Rejected(Rejection::WaveInProgress))
    );

    let ticks = run_while_active(&mut host, id);
    let final_tick = ticks.last().expect("at least one tick");
    assert!(final_tick
        .iter()
        .any(|event| matches!(event, SessionEvent::EnemyBreached { .. })));
    assert!(final_tick.contains(&SessionEvent::WaveCleared { wave: 0, bonus: 20 }));
    assert!(final_tick.contains(&SessionEvent::StatusChanged {
        from: SessionStatus::Active,
        to: SessionStatus::WaveIntermission,
    }));

    let snapshot = host.snapshot(id).expect("hosted");
    assert_eq!(snapshot.status, SessionStatus::WaveIntermission);
    assert_eq!(snapshot.balance, 120);
    assert_eq!(snapshot.wave, 1);
    assert!(snapshot.enemies.is_empty());
    assert_eq!(host.summary(id), Err(HostError::NotFinished(id)));

    assert_eq!(
        host.submit_command(id, PlayerCommand::StartWave),
        Ok(Accepted::WaveStarted { wave: 1 })
    );
    let ticks = run_while_active(&mut host, id);
    let final_tick = ticks.last().expect("at least one tick");
    assert!(final_tick.contains(&SessionEvent::StatusChanged {
        from: SessionStatus::Active,
        to: SessionStatus::Victory,
    }));

    assert_eq!(
        host.summary(id),
        Ok(SessionSummary {
            coins_earned: 45,
            highest_wave: 2,
            kills: 0,
            won: true,
        })
    );
}

#[test]
fn auto_start_chains_waves_without_intermission() {
    let mut tuning = sprinting_tuning(1);
    tuning.session.auto_start_waves = true;
    let (mut host, id) = host_with(corridor(vec![grunts(1, 0), grunts(1, 0)]), tuning);

    let _ = host
        .submit_command(id, PlayerCommand::StartWave)
        .expect("wave starts");
    let ticks = run_while_active(&mut host, id);
    let events: Vec<&SessionEvent> = ticks.iter().flatten().collect();

    assert!(events.contains(&&SessionEvent::WaveStarted { wave: 1 }));
    assert!(!events.iter().any(|event| matches!(
        event,
        SessionEvent::StatusChanged {
            to: SessionStatus::WaveIntermission,
            ..
        }
    )));
    assert_eq!(
        host.snapshot(id).expect("hosted").status,
        SessionStatus::Victory
    );
}

#[test]
fn placement_funds_edges() {
    let (mut host, id) = host_with(corridor(vec![grunts(1, 0)]), sprinting_tuning(1));

    assert!(matches!(
        host.submit_command(
            id,
            PlayerCommand::PlaceTower {
                kind: TowerKind::Cannon,
                cell: CellCoord::new(2, 0),
            },
        ),
        Ok(Accepted::TowerPlaced { balance: 20, .. })
    ));
    assert_eq!(
        host.submit_command(
            id,
            PlayerCommand::PlaceTower {
                kind: TowerKind::Archer,
                cell: CellCoord::new(3, 0),
            },
        ),
        Err(HostError::Rejected(Rejection::InsufficientFunds {
            required: 50,
            available: 20,
        }))
    );
    assert_eq!(
        host.submit_command(
            id,
            PlayerCommand::PlaceTower {
                kind: TowerKind::Archer,
                cell: CellCoord::new(3, 1),
            },
        ),
        Err(HostError::Rejected(Rejection::InsufficientFunds {
            required: 50,
            available: 20,
        }))
    );

    let snapshot = host.snapshot(id).expect("hosted");
    assert_eq!(snapshot.balance, 20);
    assert_eq!(snapshot.towers.len(), 1);
}

#[test]
fn queued_commands_apply_at_the_next_tick_in_order() {
    let (mut host, id) = host_with(corridor(vec![grunts(3, 1_000)]), sprinting_tuning(1));

    host.queue_command(
        id,
        PlayerCommand::PlaceTower {
            kind: TowerKind::Archer,
            cell: CellCoord::new(2, 0),
        },
    )
    .expect("hosted");
    host.queue_command(
        id,
        PlayerCommand::PlaceTower {
            kind: TowerKind::Archer,
            cell: CellCoord::new(2, 0),
        },
    )
    .expect("hosted");
    host.queue_command(id, PlayerCommand::StartWave)
        .expect("hosted");

    assert!(host.snapshot(id).expect("hosted").towers.is_empty());

    let snapshot = host.tick(id, TICK).expect("hosted");
    assert_eq!(snapshot.towers.len(), 1);
    assert_eq!(snapshot.status, SessionStatus::Active);
    assert_eq!(snapshot.tick, 1);

    let events = host.drain_events(id).expect("hosted");
    assert_eq!(
        events[0],
        SessionEvent::CommandRejected {
            command: PlayerCommand::PlaceTower {
                kind: TowerKind::Archer,
                cell: CellCoord::new(2, 0),
            },
            reason: Rejection::OccupiedCell {
                cell: CellCoord::new(2, 0)
            },
        }
    );
    assert!(events.iter().any(|event| matches!(
        event,
        SessionEvent::EnemySpawned {
            kind: EnemyKind::Grunt,
            wave: 0,
            ..
        }
    )));
}

#[test]
fn pause_freezes_the_clock_until_resume() {
    let (mut host, id) = host_with(corridor(vec![grunts(2, 500)]), sprinting_tuning(1));
    let _ = host
        .submit_command(id, PlayerCommand::StartWave)
        .expect("wave starts");
    let before = host.tick(id, TICK).expect("hosted");

    host.queue_command(id, PlayerCommand::Pause)
        .expect("hosted");
    let paused = host.tick(id, Duration::from_secs(5)).expect("hosted");
    assert_eq!(paused.status, SessionStatus::Paused);
    assert_eq!(paused.tick, before.tick);
    assert_eq!(paused.enemies, before.enemies);

    assert_eq!(
        host.submit_command(id, PlayerCommand::Resume),
        Ok(Accepted::Resumed)
    );
    let resumed = host.tick(id, TICK).expect("hosted");
    assert_eq!(resumed.tick, before.tick + 1);
}

#[test]
fn wide_spawn_jitter_keeps_enemies_on_the_path() {
    let mut tuning = Tuning::default();
    tuning.session.spawn_jitter = 50.0;
    let (mut host, id) = host_with(corridor(vec![grunts(3, 0)]), tuning);

    let _ = host
        .submit_command(id, PlayerCommand::StartWave)
        .expect("wave starts");
    for _ in 0..5 {
        let snapshot = host.tick(id, TICK).expect("hosted");
        for enemy in &snapshot.enemies {
            assert!(
                (0.0..=7.0).contains(&enemy.progress),
                "progress {} is off the path",
                enemy.progress
            );
        }
    }
    let spawned = host
        .drain_events(id)
        .expect("hosted")
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::EnemySpawned { .. }))
        .count();
    assert_eq!(spawned, 3);
}

#[test]
fn host_refuses_tuning_that_stalls_or_breaks_combat() {
    let mut stalled = Tuning::default();
    stalled.session.hit_threshold = -1.0;
    assert_eq!(
        SessionHost::new(LevelCatalog::new(), stalled).err(),
        Some(TuningError::InvalidHitThreshold)
    );

    let mut harsh = Tuning::default();
    harsh.session.splash_percent = 101;
    assert_eq!(
        SessionHost::new(LevelCatalog::new(), harsh).err(),
        Some(TuningError::SplashAboveHit(101))
    );

    let mut endless = Tuning::default();
    endless.session.spawn_jitter = f32::INFINITY;
    assert_eq!(
        SessionHost::new(LevelCatalog::new(), endless).err(),
        Some(TuningError::InvalidSpawnJitter)
    );
}
