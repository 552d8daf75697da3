#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! Personal alarm scheduler.
//!
//! Alarms live in an [`AlarmStore`]. A [`Scheduler`] polls it once a second and hands
//! every alarm that is due to a [`Trigger`], which turns up the volume, plays the sound
//! until the shared [`StopSignal`] is raised and asks the user to stop or snooze.
//! Snoozing goes through the [`SnoozeCoordinator`], which writes a new one-time alarm
//! back into the store.

pub mod alarm;
pub mod clock;
pub mod communication;
pub mod config;
/// terminal front end for the `run` command
pub mod console;
pub mod error;
pub mod scheduler;
pub mod snooze;
pub mod sound;
pub mod store;
pub mod trigger;
pub mod volume;

pub use alarm::{Alarm, AlarmId, AlarmTime, AlarmUpdate, RepeatDays};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use snooze::{SnoozeCoordinator, StopSignal};
pub use store::AlarmStore;
pub use trigger::{AlarmTrigger, SoundPlayer, Trigger, VolumeControl};
