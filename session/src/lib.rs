#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Match lifecycle orchestration.
//!
//! A [`Session`] wires the world, the wave director and the combat resolver
//! together behind the session state machine. [`SessionHost`] owns many
//! sessions and exposes the surface the UI layer talks to.

mod host;
pub mod profile;

use std::{collections::VecDeque, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_defense_core::{
    Accepted, PlayerCommand, Rejection, SessionEvent, SessionStatus, SessionSummary, Snapshot,
    Tuning,
};
use tower_defense_system_combat::CombatResolver;
use tower_defense_system_waves::WaveDirector;
use tower_defense_world::{
    deck::Deck,
    levels::LevelDefinition,
    map::MapError,
    query,
    registry::PendingMutations,
    World,
};
use tracing::{debug, info};

pub use host::{HostError, SessionHost, SessionId, SessionRequest, StartError};

/// One match, from setup to its terminal status.
#[derive(Debug)]
pub struct Session {
    world: World,
    director: WaveDirector,
    resolver: CombatResolver,
    rng: ChaCha8Rng,
    status: SessionStatus,
    accumulator: Duration,
    tick: u64,
    kills: u32,
    breaches: u32,
    queued: VecDeque<PlayerCommand>,
    events: Vec<SessionEvent>,
    pending: PendingMutations,
    summary: Option<SessionSummary>,
}

impl Session {
    /// Creates a session in `Setup` for the provided level.
    pub fn new(
        level: &LevelDefinition,
        deck: Deck,
        tuning: Tuning,
        starting_coins: u32,
        seed: u64,
    ) -> Result<Self, MapError> {
        let map = level.build_map()?;
        let path_length = map.path_length();
        Ok(Self {
            world: World::new(map, deck, tuning, starting_coins),
            director: WaveDirector::new(level.waves.clone(), path_length),
            resolver: CombatResolver::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            status: SessionStatus::Setup,
            accumulator: Duration::ZERO,
            tick: 0,
            kills: 0,
            breaches: 0,
            queued: VecDeque::new(),
            events: Vec::new(),
            pending: PendingMutations::new(),
            summary: None,
        })
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Enemies that reached the end of the path so far.
    #[must_use]
    pub fn breaches(&self) -> u32 {
        self.breaches
    }

    /// Terminal report, available once the session ended.
    #[must_use]
    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }

    /// Takes every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Validates and applies a command right away.
    ///
    /// Rejected commands leave the session untouched.
    pub fn submit(&mut self, command: PlayerCommand) -> Result<Accepted, Rejection> {
        let outcome = self.apply(command);
        if let Err(reason) = &outcome {
            debug!(?command, %reason, status = ?self.status, "command rejected");
        }
        outcome
    }

    /// Defers a command to the start of the next tick.
    pub fn queue(&mut self, command: PlayerCommand) {
        self.queued.push_back(command);
    }

    /// Drains queued commands, then advances the clock while `Active`.
    ///
    /// Whole steps of the configured tick duration run; the remainder carries
    /// over to the next call and is dropped when the session leaves `Active`.
    pub fn tick(&mut self, elapsed: Duration) -> Snapshot {
        while let Some(command) = self.queued.pop_front() {
            if let Err(reason) = self.submit(command) {
                self.events
                    .push(SessionEvent::CommandRejected { command, reason });
            }
        }

        if self.status == SessionStatus::Active {
            self.accumulator = self.accumulator.saturating_add(elapsed);
            let step = self.world.tuning().tick_duration();
            while self.status == SessionStatus::Active && self.accumulator >= step {
                self.accumulator -= step;
                self.step(step);
            }
        }
        if self.status != SessionStatus::Active {
            self.accumulator = Duration::ZERO;
        }

        self.snapshot()
    }

    /// Read-only view of the session for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            tick: self.tick,
            wave: self.director.started_waves(),
            total_waves: self.director.total_waves(),
            base_health: query::base_health(&self.world),
            balance: query::balance(&self.world),
            towers: query::towers(&self.world),
            enemies: query::enemies(&self.world),
            projectiles: query::projectiles(&self.world),
        }
    }

    fn apply(&mut self, command: PlayerCommand) -> Result<Accepted, Rejection> {
        let status = self.status;
        if status.is_terminal() {
            return Err(Rejection::InvalidState { status });
        }

        match command {
            PlayerCommand::PlaceTower { kind, cell } => {
                let tower = self.world.purchase(kind, cell)?;
                Ok(Accepted::TowerPlaced {
                    tower,
                    balance: query::balance(&self.world),
                })
            }
            PlayerCommand::SellTower { tower } => {
                let refund = self.world.sell(tower)?;
                Ok(Accepted::TowerSold { tower, refund })
            }
            PlayerCommand::UpgradeTower { tower } => {
                let level = self.world.upgrade(tower)?;
                Ok(Accepted::TowerUpgraded { tower, level })
            }
            PlayerCommand::StartWave => match status {
                SessionStatus::Setup
                | SessionStatus::Active
                | SessionStatus::WaveIntermission => {
                    let wave = self.director.start_next_wave()?;
                    self.events.push(SessionEvent::WaveStarted { wave });
                    self.transition(SessionStatus::Active);
                    Ok(Accepted::WaveStarted { wave })
                }
                _ => Err(Rejection::InvalidState { status }),
            },
            PlayerCommand::Pause => {
                if status != SessionStatus::Active {
                    return Err(Rejection::InvalidState { status });
                }
                self.transition(SessionStatus::Paused);
                Ok(Accepted::Paused)
            }
            PlayerCommand::Resume => {
                if status != SessionStatus::Paused {
                    return Err(Rejection::InvalidState { status });
                }
                self.transition(SessionStatus::Active);
                Ok(Accepted::Resumed)
            }
            PlayerCommand::Quit => {
                self.transition(SessionStatus::Abandoned);
                Ok(Accepted::Abandoned)
            }
        }
    }

    fn step(&mut self, dt: Duration) {
        self.tick += 1;

        let spawned = self
            .director
            .handle(dt, self.world.tuning(), &mut self.rng, &mut self.pending);
        if spawned > 0 {
            debug!(
                tick = self.tick,
                wave = self.director.started_waves(),
                spawned,
                "enemies queued"
            );
        }
        let report = self.resolver.resolve(
            self.world.combat_parts(),
            dt,
            &mut self.pending,
            &mut self.events,
        );
        let flushed = self.world.registry_mut().flush(&mut self.pending);

        self.kills += report.kills;
        self.breaches += report.breaches;
        for enemy in flushed.killed.iter().chain(&flushed.breached) {
            self.director.record_removed(enemy.wave());
        }

        let registry = self.world.registry();
        for id in &flushed.spawned {
            if let Some(enemy) = registry.enemy(*id) {
                self.events.push(SessionEvent::EnemySpawned {
                    enemy: *id,
                    kind: enemy.kind(),
                    wave: enemy.wave(),
                });
            }
        }
        for id in &flushed.launched {
            if let Some(projectile) = registry.projectile(*id) {
                self.events.push(SessionEvent::ProjectileFired {
                    projectile: *id,
                    tower: projectile.tower(),
                    target: projectile.target(),
                });
            }
        }

        if report.base_fell {
            self.transition(SessionStatus::Defeat);
            return;
        }

        if let Some(wave) = self.director.poll_cleared() {
            self.wave_cleared(wave);
        }
    }

    fn wave_cleared(&mut self, wave: u32) {
        let bonus = self.world.tuning().economy.wave_bonus(wave);
        let auto_start = self.world.tuning().session.auto_start_waves;
        self.world.ledger_mut().credit_earning(bonus);
        self.events.push(SessionEvent::WaveCleared { wave, bonus });
        info!(wave, bonus, "wave cleared");

        if self.director.all_cleared() {
            self.transition(SessionStatus::Victory);
            return;
        }

        if auto_start {
            if let Ok(next) = self.director.start_next_wave() {
                self.events.push(SessionEvent::WaveStarted { wave: next });
                return;
            }
        }
        self.transition(SessionStatus::WaveIntermission);
    }

    fn transition(&mut self, to: SessionStatus) {
        let from = self.status;
        if from == to {
            return;
        }

        self.status = to;
        self.events.push(SessionEvent::StatusChanged { from, to });
        info!(?from, ?to, tick = self.tick, "session status changed");

        if to.is_terminal() {
            let summary = SessionSummary {
                coins_earned: self.world.ledger().earned(),
                highest_wave: self.director.started_waves(),
                kills: self.kills,
                won: to == SessionStatus::Victory,
            };
            info!(
                coins_earned = summary.coins_earned,
                highest_wave = summary.highest_wave,
                kills = summary.kills,
                won = summary.won,
                "session finished"
            );
            self.summary = Some(summary);
        }
    }
}
