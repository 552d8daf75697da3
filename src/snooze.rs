//! What happens when the user answers a ringing alarm.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Duration;
use log::info;

use crate::{
    alarm::{Alarm, AlarmId, AlarmTime, RepeatDays},
    clock::Clock,
    communication::{self, EventSender, MessageType},
    store::AlarmStore,
};

pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;

/// Shared "stop the ringing" flag.
///
/// Set when the user stops or snoozes, cleared right before a newly fired alarm starts
/// playing. Playback checks it before every replay.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SnoozeCoordinator {
    store: Arc<AlarmStore>,
    clock: Arc<dyn Clock>,
    stop: StopSignal,
    snooze_minutes: u32,
    events: Option<EventSender>,
}

impl SnoozeCoordinator {
    #[must_use]
    pub fn new(store: Arc<AlarmStore>, clock: Arc<dyn Clock>, stop: StopSignal) -> Self {
        Self {
            store,
            clock,
            stop,
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            events: None,
        }
    }

    #[must_use]
    pub fn with_snooze_minutes(mut self, minutes: u32) -> Self {
        self.snooze_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub const fn snooze_minutes(&self) -> u32 {
        self.snooze_minutes
    }

    /// Silences the alarm. A fired one-time alarm was already turned off by the scheduler.
    pub fn on_stop(&self, alarm: &Alarm) {
        self.stop.set();
        info!("alarm {} at {} stopped", alarm.id, alarm.time);
        communication::notify(self.events.as_ref(), MessageType::Stopped, alarm.id);
    }

    /// Silences the alarm and sets a one-time alarm `offset_minutes` from now with the same sound.
    ///
    /// The new alarm never repeats, whatever the pattern of the snoozed one.
    pub fn on_snooze(&self, alarm: &Alarm, offset_minutes: u32) -> AlarmId {
        self.stop.set();
        let wake = self.clock.now() + Duration::minutes(i64::from(offset_minutes));
        let time = AlarmTime::of(wake);
        let new_alarm = self.store.create(time, alarm.sound.clone(), RepeatDays::ONCE);
        info!(
            "alarm {} snoozed for {offset_minutes} minutes, ringing again at {time} as {new_alarm}",
            alarm.id
        );
        communication::notify(
            self.events.as_ref(),
            MessageType::Snoozed { new_alarm },
            alarm.id,
        );
        new_alarm
    }

    /// snooze for the configured number of minutes
    pub fn snooze(&self, alarm: &Alarm) -> AlarmId {
        self.on_snooze(alarm, self.snooze_minutes)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    use super::*;
    use crate::clock::ManualClock;

    fn setup(hour: u32, minute: u32, second: u32) -> (Arc<AlarmStore>, StopSignal, SnoozeCoordinator) {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap();
        let store = Arc::new(AlarmStore::new());
        let stop = StopSignal::new();
        let snooze = SnoozeCoordinator::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new(now)),
            stop.clone(),
        );
        (store, stop, snooze)
    }

    fn weekday_alarm(store: &AlarmStore) -> Alarm {
        let id = store.create(
            "07:00".parse().unwrap(),
            "birds.mp3",
            "weekdays".parse().unwrap(),
        );
        store.get(id).unwrap()
    }

    #[test]
    fn snooze_sets_a_one_time_alarm_with_the_same_sound() {
        let (store, stop, snooze) = setup(7, 0, 0);
        let alarm = weekday_alarm(&store);

        let id = snooze.on_snooze(&alarm, 5);
        let snoozed = store.get(id).unwrap();
        assert_eq!(snoozed.time.to_string(), "07:05");
        assert!(snoozed.is_one_time());
        assert!(snoozed.enabled);
        assert_eq!(snoozed.sound, PathBuf::from("birds.mp3"));
        assert!(stop.is_set());
        // the original is left alone
        assert_eq!(store.get(alarm.id).unwrap(), alarm);
    }

    #[test]
    fn snooze_drops_seconds_and_wraps_past_midnight() {
        let (store, _stop, snooze) = setup(23, 58, 45);
        let alarm = weekday_alarm(&store);
        let id = snooze.snooze(&alarm);
        assert_eq!(store.get(id).unwrap().time.to_string(), "00:03");
    }

    #[test]
    fn stop_only_raises_the_signal() {
        let (store, stop, snooze) = setup(7, 0, 0);
        let alarm = weekday_alarm(&store);
        snooze.on_stop(&alarm);
        snooze.on_stop(&alarm);
        assert!(stop.is_set());
        assert_eq!(store.len(), 1);
    }
}
