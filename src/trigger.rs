//! The seams between the scheduler and the outside world: volume, sound and the user prompt.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use log::{error, info, warn};

use crate::{
    alarm::{Alarm, AlarmId},
    communication::{self, EventSender, MessageType},
    error::Result,
    snooze::StopSignal,
};

/// called by the scheduler for every alarm that goes off
pub trait Trigger: Send + Sync {
    fn on_alarm_fired(&self, alarm: &Alarm) -> Result<()>;
}

impl<F> Trigger for F
where
    F: Fn(&Alarm) -> Result<()> + Send + Sync,
{
    fn on_alarm_fired(&self, alarm: &Alarm) -> Result<()> {
        self(alarm)
    }
}

pub trait VolumeControl: Send + Sync {
    fn set_max_volume(&self) -> Result<()>;
}

pub trait SoundPlayer: Send + Sync {
    /// Plays `sound` through once, blocking until it ends.
    /// Implementations may cut the sound short once `stop` is set.
    fn play(&self, sound: &Path, stop: &StopSignal) -> Result<()>;
}

/// Replays `sound` until `stop` is set, checking the signal before every replay.
/// Returns how many times it was played.
pub fn play_until_stopped(player: &dyn SoundPlayer, sound: &Path, stop: &StopSignal) -> Result<u32> {
    let mut plays = 0;
    while !stop.is_set() {
        player.play(sound, stop)?;
        plays += 1;
    }
    Ok(plays)
}

/// Turns the volume all the way up, starts the sound on its own thread and asks the user
/// (through the event channel) to stop or snooze.
pub struct AlarmTrigger {
    volume: Option<Arc<dyn VolumeControl>>,
    player: Arc<dyn SoundPlayer>,
    stop: StopSignal,
    events: Option<EventSender>,
}

impl AlarmTrigger {
    #[must_use]
    pub fn new(player: Arc<dyn SoundPlayer>, stop: StopSignal) -> Self {
        Self {
            volume: None,
            player,
            stop,
            events: None,
        }
    }

    #[must_use]
    pub fn with_volume(mut self, volume: Arc<dyn VolumeControl>) -> Self {
        self.volume = Some(volume);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Raises the volume and plays on a thread of its own, so a slow mixer or player
    /// never holds up the caller.
    fn spawn_playback(&self, id: AlarmId, sound: PathBuf) -> Result<()> {
        let volume = self.volume.clone();
        let player = Arc::clone(&self.player);
        let stop = self.stop.clone();
        let events = self.events.clone();
        thread::Builder::new()
            .name(format!("alarm-sound-{id}"))
            .spawn(move || {
                if let Some(volume) = volume {
                    // reported, the alarm still rings at whatever volume there is
                    if let Err(e) = volume.set_max_volume() {
                        warn!("alarm {id}: {e}");
                        let failed = MessageType::Failed(e.to_string());
                        communication::notify(events.as_ref(), failed, id);
                    }
                }
                match play_until_stopped(&*player, &sound, &stop) {
                    Ok(plays) => info!("alarm {id} sound stopped after {plays} plays"),
                    Err(e) => {
                        error!("alarm {id}: {e}");
                        let failed = MessageType::Failed(e.to_string());
                        communication::notify(events.as_ref(), failed, id);
                    }
                }
            })?;
        Ok(())
    }
}

impl Trigger for AlarmTrigger {
    fn on_alarm_fired(&self, alarm: &Alarm) -> Result<()> {
        self.stop.clear();
        let spawned = self.spawn_playback(alarm.id, alarm.sound.clone());
        communication::notify(
            self.events.as_ref(),
            MessageType::Fired(alarm.clone()),
            alarm.id,
        );
        spawned
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::{Duration, Instant},
    };

    use super::*;
    use crate::{
        alarm::RepeatDays,
        communication::{channel, Message},
        error::Error,
    };

    /// raises the stop signal itself after `stop_after` plays
    struct CountingPlayer {
        plays: AtomicU32,
        stop_after: u32,
    }

    impl SoundPlayer for CountingPlayer {
        fn play(&self, _sound: &Path, stop: &StopSignal) -> Result<()> {
            if self.plays.fetch_add(1, Ordering::SeqCst) + 1 >= self.stop_after {
                stop.set();
            }
            Ok(())
        }
    }

    struct BrokenPlayer;

    impl SoundPlayer for BrokenPlayer {
        fn play(&self, sound: &Path, _stop: &StopSignal) -> Result<()> {
            Err(Error::playback(sound, "no such file"))
        }
    }

    struct MutedVolume;

    impl VolumeControl for MutedVolume {
        fn set_max_volume(&self) -> Result<()> {
            Err(Error::VolumeControlFailure("mixer not found".to_string()))
        }
    }

    /// a mixer that takes its time, then works
    struct SlowVolume(Duration);

    impl VolumeControl for SlowVolume {
        fn set_max_volume(&self) -> Result<()> {
            thread::sleep(self.0);
            Ok(())
        }
    }

    fn alarm() -> Alarm {
        Alarm {
            id: AlarmId::new(),
            time: "07:00".parse().unwrap(),
            repeat_days: RepeatDays::ONCE,
            sound: PathBuf::from("alarm.mp3"),
            enabled: true,
        }
    }

    #[test]
    fn replays_until_stopped() {
        let player = CountingPlayer {
            plays: AtomicU32::new(0),
            stop_after: 3,
        };
        let plays = play_until_stopped(&player, Path::new("alarm.mp3"), &StopSignal::new()).unwrap();
        assert_eq!(plays, 3);
    }

    #[test]
    fn never_plays_when_already_stopped() {
        let player = CountingPlayer {
            plays: AtomicU32::new(0),
            stop_after: 1,
        };
        let stop = StopSignal::new();
        stop.set();
        assert_eq!(play_until_stopped(&player, Path::new("a.mp3"), &stop).unwrap(), 0);
    }

    #[test]
    fn playback_errors_end_the_loop() {
        let result = play_until_stopped(&BrokenPlayer, Path::new("gone.mp3"), &StopSignal::new());
        assert!(matches!(result, Err(Error::PlaybackFailure { .. })));
    }

    #[test]
    fn fire_clears_stop_and_prompts_even_if_volume_fails() {
        let (tx, rx) = channel();
        let stop = StopSignal::new();
        stop.set();
        let trigger = AlarmTrigger::new(Arc::new(BrokenPlayer), stop.clone())
            .with_volume(Arc::new(MutedVolume))
            .with_events(tx);
        let alarm = alarm();
        trigger.on_alarm_fired(&alarm).unwrap();

        // the sound thread may report before or after the prompt
        let messages: Vec<Message> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert!(messages.iter().all(|m| m.alarm_id == alarm.id));
        assert!(messages
            .iter()
            .any(|m| m.kind == MessageType::Fired(alarm.clone())));
        let failures: Vec<&str> = messages
            .iter()
            .filter_map(|m| match &m.kind {
                MessageType::Failed(e) => Some(e.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().any(|e| e.contains("mixer not found")));
        assert!(failures.iter().any(|e| e.contains("alarm.mp3")));
    }

    #[test]
    fn slow_volume_does_not_hold_up_firing() {
        let (tx, rx) = channel();
        let stop = StopSignal::new();
        let player = CountingPlayer {
            plays: AtomicU32::new(0),
            stop_after: 1,
        };
        let trigger = AlarmTrigger::new(Arc::new(player), stop)
            .with_volume(Arc::new(SlowVolume(Duration::from_millis(1500))))
            .with_events(tx);

        let started = Instant::now();
        let alarms: Vec<Alarm> = (0..3).map(|_| alarm()).collect();
        for alarm in &alarms {
            trigger.on_alarm_fired(alarm).unwrap();
        }
        assert!(started.elapsed() < Duration::from_secs(1));

        let prompts = rx
            .try_iter()
            .filter(|m| matches!(m.kind, MessageType::Fired(_)))
            .count();
        assert_eq!(prompts, 3);
    }
}
