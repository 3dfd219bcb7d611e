//! Player profile and the persistence seam it crosses.
//!
//! The simulation never loads or saves profiles itself. Callers read a
//! profile through a [`ProfileStore`], derive a [`SessionRequest`] from it and
//! fold the terminal [`SessionSummary`] back in before saving.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use tower_defense_core::{MapId, SessionSummary, TowerKind};
use tower_defense_world::deck::{Deck, DeckError};

use crate::SessionRequest;

/// Persistent player state owned by the UI layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerProfile {
    /// Coins banked across matches.
    pub coins: u32,
    /// Tower kinds the player may put in a deck.
    pub unlocked_towers: Vec<TowerKind>,
    /// Deck used for the next match.
    pub active_deck: Vec<TowerKind>,
    /// Matches that reached a terminal status.
    pub total_games_played: u32,
    /// Best wave reached in any match.
    pub highest_wave: u32,
    /// Enemies killed across all matches.
    pub total_kills: u32,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            coins: 0,
            unlocked_towers: TowerKind::ALL.to_vec(),
            active_deck: TowerKind::ALL.to_vec(),
            total_games_played: 0,
            highest_wave: 0,
            total_kills: 0,
        }
    }
}

impl PlayerProfile {
    /// Validates the active deck against the unlocked towers.
    pub fn session_deck(&self) -> Result<Deck, DeckError> {
        Deck::new(&self.active_deck, &self.unlocked_towers)
    }

    /// Builds a request for a match on `map` using this profile's deck.
    #[must_use]
    pub fn session_request(&self, map: MapId, starting_bonus_coins: u32, seed: u64) -> SessionRequest {
        SessionRequest {
            map,
            deck: self.active_deck.clone(),
            unlocked: self.unlocked_towers.clone(),
            starting_bonus_coins,
            seed,
        }
    }

    /// Folds a finished match into the aggregate stats.
    pub fn record_summary(&mut self, summary: &SessionSummary) {
        self.coins = self.coins.saturating_add(summary.coins_earned);
        self.total_games_played = self.total_games_played.saturating_add(1);
        self.highest_wave = self.highest_wave.max(summary.highest_wave);
        self.total_kills = self.total_kills.saturating_add(summary.kills);
    }
}

/// Persistence bridge for [`PlayerProfile`] values.
pub trait ProfileStore {
    /// Error raised by the backing storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Loads the stored profile, or a fresh one when nothing is stored yet.
    fn load(&self) -> Result<PlayerProfile, Self::Error>;

    /// Replaces the stored profile.
    fn save(&mut self, profile: &PlayerProfile) -> Result<(), Self::Error>;
}

/// Store that keeps the profile in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryProfileStore {
    profile: Option<PlayerProfile>,
}

impl ProfileStore for MemoryProfileStore {
    type Error = Infallible;

    fn load(&self) -> Result<PlayerProfile, Self::Error> {
        Ok(self.profile.clone().unwrap_or_default())
    }

    fn save(&mut self, profile: &PlayerProfile) -> Result<(), Self::Error> {
        self.profile = Some(profile.clone());
        Ok(())
    }
}
