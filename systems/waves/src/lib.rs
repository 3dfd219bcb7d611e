#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave director responsible for emitting enemy spawns.

use std::time::Duration;

use rand::Rng;
use tower_defense_core::{Rejection, SpawnEntry, Tuning, WaveDefinition};
use tower_defense_world::registry::{EnemySpawn, PendingMutations};
use tracing::info;

/// Lifecycle of a single wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WavePhase {
    /// Not started yet.
    Pending,
    /// Started; enemies are still being emitted or are still alive.
    Spawning,
    /// Nothing left to spawn and every spawned enemy was removed.
    Cleared,
}

#[derive(Clone, Copy, Debug)]
struct ActiveWave {
    index: u32,
    entry: usize,
    emitted_in_entry: u32,
    until_next: Duration,
    spawned: u32,
    removed: u32,
}

/// Pure system that walks the level's waves and emits their enemies.
#[derive(Debug)]
pub struct WaveDirector {
    waves: Vec<WaveDefinition>,
    phases: Vec<WavePhase>,
    active: Option<ActiveWave>,
    path_length: f32,
}

impl WaveDirector {
    /// Creates a director with every wave pending.
    ///
    /// Spawn offsets stay below `path_length`, the length of the level's path.
    #[must_use]
    pub fn new(waves: Vec<WaveDefinition>, path_length: f32) -> Self {
        let phases = vec![WavePhase::Pending; waves.len()];
        Self {
            waves,
            phases,
            active: None,
            path_length,
        }
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Number of waves started so far, which is the one-based number of the
    /// highest wave reached.
    #[must_use]
    pub fn started_waves(&self) -> u32 {
        let started = self
            .phases
            .iter()
            .filter(|phase| **phase != WavePhase::Pending)
            .count();
        u32::try_from(started).unwrap_or(u32::MAX)
    }

    /// Phase of the wave at `index`.
    #[must_use]
    pub fn phase(&self, index: u32) -> Option<WavePhase> {
        self.phases.get(index as usize).copied()
    }

    /// Reports whether a wave is currently in progress.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.active.is_some()
    }

    /// Reports whether every configured wave was cleared.
    #[must_use]
    pub fn all_cleared(&self) -> bool {
        self.phases.iter().all(|phase| *phase == WavePhase::Cleared)
    }

    /// Starts the next pending wave and returns its zero-based index.
    pub fn start_next_wave(&mut self) -> Result<u32, Rejection> {
        if self.active.is_some() {
            return Err(Rejection::WaveInProgress);
        }
        let Some(position) = self
            .phases
            .iter()
            .position(|phase| *phase == WavePhase::Pending)
        else {
            return Err(Rejection::NoWavesRemaining);
        };

        let index = u32::try_from(position).unwrap_or(u32::MAX);
        self.phases[position] = WavePhase::Spawning;
        self.active = Some(ActiveWave {
            index,
            entry: 0,
            emitted_in_entry: 0,
            until_next: Duration::ZERO,
            spawned: 0,
            removed: 0,
        });
        info!(wave = index, "wave started");
        Ok(index)
    }

    /// Advances the spawn clock by `dt` and queues every spawn that falls due.
    ///
    /// Returns the number of enemies queued.
    pub fn handle<R: Rng>(
        &mut self,
        dt: Duration,
        tuning: &Tuning,
        rng: &mut R,
        pending: &mut PendingMutations,
    ) -> u32 {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };
        let Some(wave) = self.waves.get(active.index as usize) else {
            return 0;
        };

        let mut budget = dt;
        let mut emitted = 0;
        while let Some(entry) = wave.entries.get(active.entry) {
            let count = tuning.scaling.scaled_count(entry.count, active.index);
            if active.emitted_in_entry >= count {
                active.entry += 1;
                active.emitted_in_entry = 0;
                continue;
            }
            if active.until_next > budget {
                active.until_next -= budget;
                break;
            }

            budget -= active.until_next;
            pending.queue_spawn(spawn_for(
                entry,
                active.index,
                tuning,
                self.path_length,
                rng,
            ));
            active.emitted_in_entry += 1;
            active.spawned += 1;
            active.until_next = entry.interval();
            emitted += 1;
        }

        emitted
    }

    /// Notes that an enemy from the wave at `wave` left the registry.
    pub fn record_removed(&mut self, wave: u32) {
        if let Some(active) = self.active.as_mut() {
            if active.index == wave {
                active.removed += 1;
            }
        }
    }

    /// Marks the active wave cleared once it has nothing left to do.
    ///
    /// Returns the zero-based index of the wave that just cleared.
    pub fn poll_cleared(&mut self) -> Option<u32> {
        let active = self.active?;
        let wave = self.waves.get(active.index as usize)?;
        if active.entry < wave.entries.len() || active.removed < active.spawned {
            return None;
        }

        self.active = None;
        self.phases[active.index as usize] = WavePhase::Cleared;
        Some(active.index)
    }
}

fn spawn_for<R: Rng>(
    entry: &SpawnEntry,
    wave: u32,
    tuning: &Tuning,
    path_length: f32,
    rng: &mut R,
) -> EnemySpawn {
    let profile = tuning.enemies.profile(entry.kind);
    // Offsets are drawn from [0, span) so a spawn never starts past the path end.
    let span = tuning.session.spawn_jitter.min(path_length);
    let progress = if span > 0.0 {
        rng.gen_range(0.0..span)
    } else {
        0.0
    };

    EnemySpawn {
        kind: entry.kind,
        wave,
        health: tuning.scaling.scaled_health(profile.health, wave),
        speed: tuning.scaling.scaled_speed(profile.speed, wave),
        breach_damage: profile.breach_damage,
        reward: profile.reward,
        progress,
    }
}
