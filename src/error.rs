use std::path::PathBuf;

use thiserror::Error;

use crate::alarm::AlarmId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no alarm with id {0}")]
    NotFound(AlarmId),
    #[error("couldn't play {}: {reason}", sound.display())]
    PlaybackFailure { sound: PathBuf, reason: String },
    #[error("couldn't set the volume: {0}")]
    VolumeControlFailure(String),
    #[error("invalid alarm time `{0}`, expected HH:MM")]
    InvalidTime(String),
    #[error("invalid weekday `{0}`")]
    InvalidDays(String),
    #[error("{0}")]
    InvalidCommand(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn playback(sound: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::PlaybackFailure {
            sound: sound.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config(e.to_string())
    }
}
