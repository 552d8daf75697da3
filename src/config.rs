use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    alarm::{AlarmId, AlarmTime, RepeatDays},
    error::{Error, Result},
    snooze::DEFAULT_SNOOZE_MINUTES,
    sound::CommandPlayer,
    store::AlarmStore,
};

const APP_NAME: &str = "roosty_alarm";
const MAX_POLL_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub snooze_minutes: u32,
    pub poll_interval_ms: u64,
    /// used for alarms that don't name a sound
    pub default_sound: PathBuf,
    /// what a new alarm is prefilled with
    pub default_time: AlarmTime,
    pub force_max_volume: bool,
    /// strftime format of the clock line
    pub time_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerConfig>,
    /// alarms loaded into the store on start up, changes made while running are not written back
    pub alarms: Vec<AlarmConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            poll_interval_ms: 1000,
            default_sound: PathBuf::from("alarm.mp3"),
            default_time: AlarmTime::new(7, 0).unwrap_or_default(),
            force_max_volume: true,
            time_format: "%H:%M:%S".to_string(),
            player: None,
            alarms: vec![],
        }
    }
}

/// external program that plays a sound file given as its last argument
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AlarmConfig {
    pub time: AlarmTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<PathBuf>,
    #[serde(default)]
    pub days: RepeatDays,
    #[serde(default = "always_true")]
    pub enabled: bool,
}

#[inline]
#[must_use]
pub const fn always_true() -> bool {
    true
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&config)?)
    }

    /// the default config when there is no file yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config = toml::to_string(self)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    fn project_dirs() -> Result<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or_else(|| Error::Config("couldn't find a home directory".to_string()))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    pub fn sounds_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("sounds"))
    }

    /// `poll_interval_ms` kept within 1 ms and one minute, so the scheduler neither spins
    /// nor sleeps past a whole minute
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }

    #[must_use]
    pub fn player(&self) -> CommandPlayer {
        self.player
            .as_ref()
            .map_or_else(CommandPlayer::default, |player| {
                CommandPlayer::new(player.program.clone(), player.args.clone())
            })
    }

    /// A relative sound that doesn't exist where we are is looked up in the sounds directory.
    #[must_use]
    pub fn resolve_sound(&self, sound: &Path) -> PathBuf {
        if sound.is_absolute() || sound.exists() {
            return sound.to_path_buf();
        }
        match Self::sounds_path() {
            Ok(dir) if dir.join(sound).exists() => dir.join(sound),
            _ => sound.to_path_buf(),
        }
    }

    /// Puts the configured alarms into `store`, in file order.
    pub fn seed(&self, store: &AlarmStore) -> Result<Vec<AlarmId>> {
        self.alarms
            .iter()
            .map(|alarm| -> Result<AlarmId> {
                let sound = alarm.sound.as_ref().unwrap_or(&self.default_sound);
                let id = store.create(alarm.time, self.resolve_sound(sound), alarm.days);
                if !alarm.enabled {
                    store.set_enabled(id, false)?;
                }
                Ok(id)
            })
            .collect()
    }

    /// adds an alarm to the file, keeping the list sorted by time
    pub fn add_alarm(&mut self, alarm: AlarmConfig) {
        let at = self.alarms.partition_point(|a| a.time <= alarm.time);
        self.alarms.insert(at, alarm);
    }
}
