use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_defense_core::{
    Accepted, MapId, PlayerCommand, Rejection, SessionEvent, SessionSummary, Snapshot, TowerKind,
    Tuning, TuningError,
};
use tower_defense_world::{
    deck::{Deck, DeckError},
    levels::LevelCatalog,
    map::MapError,
};
use tracing::info;

use crate::Session;

/// Identifier handed out by [`SessionHost::start_session`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates an identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Parameters for opening a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Level to play.
    pub map: MapId,
    /// Tower kinds the player brings.
    pub deck: Vec<TowerKind>,
    /// Tower kinds the player has unlocked.
    pub unlocked: Vec<TowerKind>,
    /// Coins added on top of the configured starting balance.
    #[serde(default)]
    pub starting_bonus_coins: u32,
    /// Seed for every random draw made by the session.
    #[serde(default)]
    pub seed: u64,
}

/// Configuration errors that abort session creation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StartError {
    /// The requested level is not in the catalog.
    #[error("map {0} not found")]
    MapNotFound(MapId),
    /// The deck is empty, repeats a kind or lists a locked kind.
    #[error("invalid deck: {0}")]
    InvalidDeck(#[from] DeckError),
    /// The level's map could not be built.
    #[error("invalid level: {0}")]
    InvalidLevel(#[from] MapError),
}

/// Errors reported by the per-session host operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HostError {
    /// No session with the identifier is hosted.
    #[error("{0} not found")]
    UnknownSession(SessionId),
    /// The session has not reached a terminal status yet.
    #[error("{0} has not finished")]
    NotFinished(SessionId),
    /// The command failed validation.
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Owns running sessions and exposes the surface the UI layer drives.
#[derive(Debug)]
pub struct SessionHost {
    catalog: LevelCatalog,
    tuning: Tuning,
    sessions: BTreeMap<SessionId, Session>,
    next_id: u64,
}

impl SessionHost {
    /// Creates a host after validating the tuning tables.
    pub fn new(catalog: LevelCatalog, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self {
            catalog,
            tuning,
            sessions: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Creates a host serving the built-in levels with default tuning.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            catalog: LevelCatalog::builtin(),
            tuning: Tuning::default(),
            sessions: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Levels sessions may be started on.
    #[must_use]
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Opens a session in `Setup`.
    pub fn start_session(&mut self, request: SessionRequest) -> Result<SessionId, StartError> {
        let level = self
            .catalog
            .get(&request.map)
            .ok_or_else(|| StartError::MapNotFound(request.map.clone()))?;
        let deck = Deck::new(&request.deck, &request.unlocked)?;
        let starting_coins = self
            .tuning
            .economy
            .starting_coins
            .saturating_add(request.starting_bonus_coins);
        let session = Session::new(level, deck, self.tuning.clone(), starting_coins, request.seed)?;

        let id = SessionId::new(self.next_id);
        self.next_id += 1;
        let _ = self.sessions.insert(id, session);
        info!(
            session = %id,
            map = %request.map,
            starting_coins,
            seed = request.seed,
            "session started"
        );
        Ok(id)
    }

    /// Applies a command immediately.
    pub fn submit_command(
        &mut self,
        id: SessionId,
        command: PlayerCommand,
    ) -> Result<Accepted, HostError> {
        Ok(self.session_mut(id)?.submit(command)?)
    }

    /// Defers a command to the start of the next tick.
    pub fn queue_command(&mut self, id: SessionId, command: PlayerCommand) -> Result<(), HostError> {
        self.session_mut(id)?.queue(command);
        Ok(())
    }

    /// Advances a session by `elapsed` wall time.
    pub fn tick(&mut self, id: SessionId, elapsed: Duration) -> Result<Snapshot, HostError> {
        Ok(self.session_mut(id)?.tick(elapsed))
    }

    /// Current view of a session without advancing it.
    pub fn snapshot(&self, id: SessionId) -> Result<Snapshot, HostError> {
        Ok(self.session(id)?.snapshot())
    }

    /// Terminal report of a finished session.
    pub fn summary(&self, id: SessionId) -> Result<SessionSummary, HostError> {
        self.session(id)?
            .summary()
            .ok_or(HostError::NotFinished(id))
    }

    /// Events recorded since the previous drain.
    pub fn drain_events(&mut self, id: SessionId) -> Result<Vec<SessionEvent>, HostError> {
        Ok(self.session_mut(id)?.drain_events())
    }

    /// Removes a session from the host and hands it back.
    pub fn finish(&mut self, id: SessionId) -> Result<Session, HostError> {
        self.sessions
            .remove(&id)
            .ok_or(HostError::UnknownSession(id))
    }

    /// Looks up a hosted session.
    pub fn session(&self, id: SessionId) -> Result<&Session, HostError> {
        self.sessions.get(&id).ok_or(HostError::UnknownSession(id))
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session, HostError> {
        self.sessions
            .get_mut(&id)
            .ok_or(HostError::UnknownSession(id))
    }
}
