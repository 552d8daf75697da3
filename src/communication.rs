use crossbeam_channel::{Receiver, Sender};

use crate::alarm::{Alarm, AlarmId};

/// something that happened to an alarm, sent to whoever presents alarms to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageType,
    pub alarm_id: AlarmId,
}

impl Message {
    #[must_use]
    pub const fn new(kind: MessageType, alarm_id: AlarmId) -> Self {
        Self { kind, alarm_id }
    }

    /// whether the alarm list on screen is stale after this message
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        matches!(
            self.kind,
            MessageType::Created
                | MessageType::Updated
                | MessageType::Deleted
                | MessageType::Toggled(_)
                | MessageType::AutoDisabled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageType {
    Created,
    Updated,
    Deleted,
    Toggled(bool),
    // a one-time alarm turned itself off after going off
    AutoDisabled,
    // ringing, the user should be asked to stop or snooze
    Fired(Alarm),
    Stopped,
    Snoozed { new_alarm: AlarmId },
    // volume or playback problems, never fatal
    Failed(String),
}

pub type EventSender = Sender<Message>;
pub type EventReceiver = Receiver<Message>;

#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    crossbeam_channel::unbounded()
}

/// Fire and forget: nobody listening is not an error.
pub(crate) fn notify(sender: Option<&EventSender>, kind: MessageType, alarm_id: AlarmId) {
    if let Some(sender) = sender {
        if sender.send(Message::new(kind, alarm_id)).is_err() {
            log::debug!("no one is listening for alarm {alarm_id} events");
        }
    }
}
