//! Tower kinds a player brings into a session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_defense_core::TowerKind;

/// Validated, immutable set of tower kinds purchasable in one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TowerKind>", into = "Vec<TowerKind>")]
pub struct Deck {
    kinds: Vec<TowerKind>,
}

impl Deck {
    /// Validates `kinds` against the player's `unlocked` towers.
    pub fn new(kinds: &[TowerKind], unlocked: &[TowerKind]) -> Result<Self, DeckError> {
        let deck = Self::try_from(kinds.to_vec())?;
        if let Some(kind) = deck.kinds.iter().find(|kind| !unlocked.contains(kind)) {
            return Err(DeckError::Locked(*kind));
        }
        Ok(deck)
    }

    /// Reports whether the kind may be purchased.
    #[must_use]
    pub fn contains(&self, kind: TowerKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Kinds in the order the player listed them.
    #[must_use]
    pub fn kinds(&self) -> &[TowerKind] {
        &self.kinds
    }
}

impl TryFrom<Vec<TowerKind>> for Deck {
    type Error = DeckError;

    fn try_from(kinds: Vec<TowerKind>) -> Result<Self, Self::Error> {
        if kinds.is_empty() {
            return Err(DeckError::Empty);
        }
        let mut seen = BTreeSet::new();
        for kind in &kinds {
            if !seen.insert(*kind) {
                return Err(DeckError::Duplicate(*kind));
            }
        }
        Ok(Self { kinds })
    }
}

impl From<Deck> for Vec<TowerKind> {
    fn from(deck: Deck) -> Self {
        deck.kinds
    }
}

/// Reasons a deck is refused at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DeckError {
    /// No tower kinds were listed.
    #[error("deck must contain at least one tower")]
    Empty,
    /// A kind was listed more than once.
    #[error("{0} appears more than once in the deck")]
    Duplicate(TowerKind),
    /// A kind the player has not unlocked was listed.
    #[error("{0} is not unlocked")]
    Locked(TowerKind),
}
