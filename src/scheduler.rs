//! The background loop that decides which alarms go off.
//!
//! Once a second the scheduler reads the clock. The first pass in a new minute scans the
//! whole store, fires everything due and remembers the minute, so later passes in that
//! minute do nothing. All alarms due in the same minute are found by that one scan.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::NaiveDate;
use log::{debug, error, info};

use crate::{
    alarm::{Alarm, AlarmTime},
    clock::Clock,
    communication::{self, EventSender, MessageType},
    error::Result,
    store::AlarmStore,
    trigger::Trigger,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct Scheduler {
    store: Arc<AlarmStore>,
    clock: Arc<dyn Clock>,
    trigger: Arc<dyn Trigger>,
    events: Option<EventSender>,
    poll_interval: Duration,
    last_fired_minute: Option<(NaiveDate, AlarmTime)>,
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Arc<AlarmStore>, clock: Arc<dyn Clock>, trigger: Arc<dyn Trigger>) -> Self {
        Self {
            store,
            clock,
            trigger,
            events: None,
            poll_interval: POLL_INTERVAL,
            last_fired_minute: None,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// where trigger failures get reported
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Runs one evaluation pass and returns the alarms that went off.
    ///
    /// One-time alarms are disabled as they fire, repeating alarms only fire on their
    /// weekdays and stay enabled. A failing trigger is reported and the pass carries on.
    pub fn tick(&mut self) -> Vec<Alarm> {
        let now = self.clock.now();
        let minute = (now.date(), AlarmTime::of(now));
        if self.last_fired_minute == Some(minute) {
            return Vec::new();
        }

        let fired = self.store.claim_due(now);
        for alarm in &fired {
            info!(
                "alarm {} going off at {} ({})",
                alarm.id, alarm.time, alarm.repeat_days
            );
            if let Err(e) = self.trigger.on_alarm_fired(alarm) {
                error!("alarm {} couldn't be triggered: {e}", alarm.id);
                communication::notify(
                    self.events.as_ref(),
                    MessageType::Failed(e.to_string()),
                    alarm.id,
                );
            }
        }
        if !fired.is_empty() {
            self.last_fired_minute = Some(minute);
        }
        fired
    }

    /// Polls until `shutdown` is raised.
    pub fn run(mut self, shutdown: &AtomicBool) {
        debug!("scheduler polling every {:?}", self.poll_interval);
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
            thread::sleep(self.poll_interval);
        }
        debug!("scheduler stopped");
    }

    /// Starts polling on a dedicated thread.
    pub fn spawn(self) -> Result<SchedulerHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("alarm-scheduler".to_string())
            .spawn(move || self.run(&flag))?;
        Ok(SchedulerHandle { shutdown, thread })
    }
}

#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl SchedulerHandle {
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// stops the loop after its current pass and waits for it
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if self.thread.join().is_err() {
            error!("scheduler thread panicked");
        }
    }
}
