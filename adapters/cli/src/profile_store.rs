//! JSON file backing for [`PlayerProfile`].

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tower_defense_session::profile::{PlayerProfile, ProfileStore};

/// Failure while reading or writing a profile file.
#[derive(Debug, Error)]
pub(crate) enum ProfileFileError {
    #[error("failed to access profile {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("profile {path} is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Profile stored as pretty-printed JSON at a fixed path.
#[derive(Clone, Debug)]
pub(crate) struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: io::Error) -> ProfileFileError {
        ProfileFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> ProfileFileError {
        ProfileFileError::Json {
            path: self.path.clone(),
            source,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for JsonFileProfileStore {
    type Error = ProfileFileError;

    fn load(&self) -> Result<PlayerProfile, Self::Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(PlayerProfile::default())
            }
            Err(error) => return Err(self.io_error(error)),
        };
        serde_json::from_str(&text).map_err(|error| self.json_error(error))
    }

    fn save(&mut self, profile: &PlayerProfile) -> Result<(), Self::Error> {
        let text = serde_json::to_string_pretty(profile).map_err(|error| self.json_error(error))?;
        fs::write(&self.path, text).map_err(|error| self.io_error(error))
    }
}
