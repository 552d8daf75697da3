//! In-memory alarm storage shared by the user interface, the scheduler and snoozing.
//!
//! Every mutation takes the store lock once, and every mutation is announced on the
//! event channel (if there is one) after the lock is released.

use std::{collections::HashMap, path::PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info};
use parking_lot::Mutex;

use crate::{
    alarm::{Alarm, AlarmId, AlarmTime, AlarmUpdate, RepeatDays},
    communication::{self, EventSender, MessageType},
    error::{Error, Result},
};

#[derive(Debug)]
struct Entry {
    alarm: Alarm,
    // insertion order, breaks ties between alarms set for the same time
    seq: u64,
}

#[derive(Debug, Default)]
struct Alarms {
    entries: HashMap<AlarmId, Entry>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct AlarmStore {
    alarms: Mutex<Alarms>,
    events: Option<EventSender>,
}

impl AlarmStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts announcing changes on `events`, earlier changes go unannounced.
    pub fn set_events(&mut self, events: EventSender) {
        self.events = Some(events);
    }

    /// Adds a new enabled alarm and returns its id.
    pub fn create(
        &self,
        time: AlarmTime,
        sound: impl Into<PathBuf>,
        repeat_days: RepeatDays,
    ) -> AlarmId {
        let id = AlarmId::new();
        let alarm = Alarm {
            id,
            time,
            repeat_days,
            sound: sound.into(),
            enabled: true,
        };
        debug!("creating alarm {id} at {time} ({repeat_days})");
        {
            let mut alarms = self.alarms.lock();
            let seq = alarms.next_seq;
            alarms.next_seq += 1;
            alarms.entries.insert(id, Entry { alarm, seq });
        }
        self.notify(MessageType::Created, id);
        id
    }

    /// Replaces the time, sound and repeat days of an alarm.
    ///
    /// The enabled flag is only touched when the update carries one.
    pub fn update(&self, id: AlarmId, update: AlarmUpdate) -> Result<()> {
        {
            let mut alarms = self.alarms.lock();
            let entry = alarms.entries.get_mut(&id).ok_or(Error::NotFound(id))?;
            let alarm = &mut entry.alarm;
            alarm.time = update.time;
            alarm.sound = update.sound;
            alarm.repeat_days = update.repeat_days;
            if let Some(enabled) = update.enabled {
                alarm.enabled = enabled;
            }
            debug!("updated alarm {id} to {} ({})", alarm.time, alarm.repeat_days);
        }
        self.notify(MessageType::Updated, id);
        Ok(())
    }

    /// Removes an alarm, returns whether there was one to remove.
    pub fn delete(&self, id: AlarmId) -> bool {
        let removed = self.alarms.lock().entries.remove(&id).is_some();
        if removed {
            debug!("deleted alarm {id}");
            self.notify(MessageType::Deleted, id);
        }
        removed
    }

    pub fn set_enabled(&self, id: AlarmId, enabled: bool) -> Result<()> {
        self.alarms
            .lock()
            .entries
            .get_mut(&id)
            .ok_or(Error::NotFound(id))?
            .alarm
            .enabled = enabled;
        debug!("alarm {id} enabled: {enabled}");
        self.notify(MessageType::Toggled(enabled), id);
        Ok(())
    }

    pub fn get(&self, id: AlarmId) -> Result<Alarm> {
        self.alarms
            .lock()
            .entries
            .get(&id)
            .map(|entry| entry.alarm.clone())
            .ok_or(Error::NotFound(id))
    }

    /// All alarms, earliest time first, alarms at the same time in the order they were added.
    #[must_use]
    pub fn list(&self) -> Vec<Alarm> {
        let alarms = self.alarms.lock();
        let mut entries: Vec<&Entry> = alarms.entries.values().collect();
        entries.sort_by_key(|entry| (entry.alarm.time, entry.seq));
        entries.into_iter().map(|entry| entry.alarm.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds every alarm due in the minute of `now` and turns off the one-time ones.
    ///
    /// Selection and auto-disable happen under one lock, so an alarm is either
    /// returned here or already gone, never half of both. The returned snapshots
    /// are taken before the auto-disable.
    pub(crate) fn claim_due(&self, now: NaiveDateTime) -> Vec<Alarm> {
        let due: Vec<Alarm> = {
            let mut alarms = self.alarms.lock();
            alarms
                .entries
                .values_mut()
                .filter(|entry| entry.alarm.is_due(now))
                .map(|entry| {
                    let snapshot = entry.alarm.clone();
                    if snapshot.is_one_time() {
                        entry.alarm.enabled = false;
                    }
                    snapshot
                })
                .collect()
        };
        for alarm in due.iter().filter(|alarm| alarm.is_one_time()) {
            info!("one-time alarm {} at {} disabled", alarm.id, alarm.time);
            self.notify(MessageType::AutoDisabled, alarm.id);
        }
        due
    }

    fn notify(&self, kind: MessageType, id: AlarmId) {
        communication::notify(self.events.as_ref(), kind, id);
    }
}
