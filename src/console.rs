//! Line based terminal front end: reads commands, shows alarms and the stop/snooze prompt.

use std::{fmt::Write as _, path::PathBuf, str::FromStr, sync::Arc};

use crate::{
    alarm::{Alarm, AlarmTime, AlarmUpdate, RepeatDays},
    clock::Clock,
    communication::{Message, MessageType},
    error::{Error, Result},
    snooze::SnoozeCoordinator,
    store::AlarmStore,
};

pub const HELP: &str = "\
commands:
  list                              show all alarms
  add [HH:MM] [DAYS] [SOUND]        new alarm, DAYS like mon,wed or weekdays (default once)
  edit N HH:MM [DAYS] [SOUND]       change alarm N, unspecified parts are kept
  rm N                              delete alarm N
  on N | off N                      enable or disable alarm N
  stop                              silence the ringing alarm
  snooze [MINUTES]                  silence it and ring again later
  help                              this text
  quit                              exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add {
        /// the configured default time when left out
        time: Option<AlarmTime>,
        days: RepeatDays,
        sound: Option<PathBuf>,
    },
    Edit {
        index: usize,
        time: AlarmTime,
        days: Option<RepeatDays>,
        sound: Option<PathBuf>,
    },
    Remove(usize),
    Enable(usize),
    Disable(usize),
    Stop,
    Snooze(Option<u32>),
    Help,
    Quit,
}

fn parse_index(word: Option<&str>) -> Result<usize> {
    let word = word.ok_or_else(|| Error::InvalidCommand("missing alarm number".to_string()))?;
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidCommand(format!("`{word}` is not an alarm number"))),
    }
}

fn parse_time(word: Option<&str>) -> Result<AlarmTime> {
    word.ok_or_else(|| Error::InvalidTime(String::new()))?.parse()
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(Error::InvalidCommand("empty command".to_string()));
        };
        let command = match name.to_ascii_lowercase().as_str() {
            "list" | "ls" => Self::List,
            "add" => {
                let mut next = words.next();
                let time = match next {
                    Some(word) if word.contains(':') => {
                        next = words.next();
                        Some(word.parse()?)
                    }
                    _ => None,
                };
                Self::Add {
                    time,
                    days: next.map(str::parse).transpose()?.unwrap_or_default(),
                    sound: words.next().map(PathBuf::from),
                }
            }
            "edit" => Self::Edit {
                index: parse_index(words.next())?,
                time: parse_time(words.next())?,
                days: words.next().map(str::parse).transpose()?,
                sound: words.next().map(PathBuf::from),
            },
            "rm" | "delete" => Self::Remove(parse_index(words.next())?),
            "on" => Self::Enable(parse_index(words.next())?),
            "off" => Self::Disable(parse_index(words.next())?),
            "stop" => Self::Stop,
            "snooze" => Self::Snooze(
                words
                    .next()
                    .map(|m| {
                        m.parse()
                            .map_err(|_| Error::InvalidCommand(format!("`{m}` is not a number of minutes")))
                    })
                    .transpose()?,
            ),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(Error::InvalidCommand(format!("unknown command `{other}`, try help"))),
        };
        if let Some(extra) = words.next() {
            return Err(Error::InvalidCommand(format!("unexpected `{extra}`")));
        }
        Ok(command)
    }
}

/// what the console wants printed, and whether to keep going
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

pub struct Console {
    store: Arc<AlarmStore>,
    snooze: SnoozeCoordinator,
    clock: Arc<dyn Clock>,
    default_sound: PathBuf,
    default_time: AlarmTime,
    time_format: String,
    ringing: Vec<Alarm>,
}

impl Console {
    #[must_use]
    pub fn new(
        store: Arc<AlarmStore>,
        snooze: SnoozeCoordinator,
        clock: Arc<dyn Clock>,
        default_sound: PathBuf,
        default_time: AlarmTime,
        time_format: String,
    ) -> Self {
        Self {
            store,
            snooze,
            clock,
            default_sound,
            default_time,
            time_format,
            ringing: Vec::new(),
        }
    }

    #[must_use]
    pub fn ringing(&self) -> &[Alarm] {
        &self.ringing
    }

    fn nth(&self, index: usize) -> Result<Alarm> {
        index
            .checked_sub(1)
            .and_then(|i| self.store.list().into_iter().nth(i))
            .ok_or_else(|| Error::InvalidCommand(format!("there is no alarm {index}")))
    }

    pub fn execute(&mut self, command: Command) -> Result<Reply> {
        let reply = match command {
            Command::List => Reply::text(self.render()),
            Command::Add { time, days, sound } => {
                let sound = sound.unwrap_or_else(|| self.default_sound.clone());
                self.store.create(time.unwrap_or(self.default_time), sound, days);
                Reply::default()
            }
            Command::Edit {
                index,
                time,
                days,
                sound,
            } => {
                let alarm = self.nth(index)?;
                let update = AlarmUpdate::new(
                    time,
                    sound.unwrap_or(alarm.sound),
                    days.unwrap_or(alarm.repeat_days),
                );
                self.store.update(alarm.id, update)?;
                Reply::default()
            }
            Command::Remove(index) => {
                let alarm = self.nth(index)?;
                self.store.delete(alarm.id);
                Reply::default()
            }
            Command::Enable(index) => {
                self.store.set_enabled(self.nth(index)?.id, true)?;
                Reply::default()
            }
            Command::Disable(index) => {
                self.store.set_enabled(self.nth(index)?.id, false)?;
                Reply::default()
            }
            Command::Stop => {
                if self.ringing.is_empty() {
                    return Ok(Reply::text("nothing is ringing"));
                }
                for alarm in self.ringing.drain(..) {
                    self.snooze.on_stop(&alarm);
                }
                Reply::text("stopped")
            }
            Command::Snooze(minutes) => {
                if self.ringing.is_empty() {
                    return Ok(Reply::text("nothing is ringing"));
                }
                let minutes = minutes.unwrap_or_else(|| self.snooze.snooze_minutes());
                for alarm in self.ringing.drain(..) {
                    self.snooze.on_snooze(&alarm, minutes);
                }
                Reply::text(format!("snoozed for {minutes} minutes"))
            }
            Command::Help => Reply::text(HELP),
            Command::Quit => Reply {
                text: String::new(),
                quit: true,
            },
        };
        Ok(reply)
    }

    /// Reacts to store and alarm events, returns what should be shown.
    pub fn on_message(&mut self, message: &Message) -> Option<String> {
        match &message.kind {
            MessageType::Fired(alarm) => {
                self.ringing.push(alarm.clone());
                Some(format!(
                    "⏰ it's {}! stop or snooze ({} min)?",
                    alarm.time,
                    self.snooze.snooze_minutes()
                ))
            }
            MessageType::Failed(e) => Some(format!("error: {e}")),
            _ if message.needs_refresh() => Some(self.render()),
            _ => None,
        }
    }

    /// the clock line followed by every alarm, numbered in list order
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("Time: {}\n", self.clock.now().format(&self.time_format));
        let alarms = self.store.list();
        if alarms.is_empty() {
            out.push_str("no alarms set");
            return out;
        }
        for (i, alarm) in alarms.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>2}. {}  {:<27} {:<3}  {}",
                i + 1,
                alarm.time,
                alarm.repeat_days.to_string(),
                if alarm.enabled { "on" } else { "off" },
                alarm.sound.display()
            );
        }
        out.truncate(out.trim_end().len());
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{clock::ManualClock, snooze::StopSignal};

    fn console() -> (Arc<AlarmStore>, StopSignal, Console) {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(7, 0, 10)
            .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(now));
        let store = Arc::new(AlarmStore::new());
        let stop = StopSignal::new();
        let snooze = SnoozeCoordinator::new(Arc::clone(&store), Arc::clone(&clock), stop.clone());
        let console = Console::new(
            Arc::clone(&store),
            snooze,
            clock,
            PathBuf::from("alarm.mp3"),
            "06:15".parse().unwrap(),
            "%H:%M:%S".to_string(),
        );
        (store, stop, console)
    }

    fn run(console: &mut Console, line: &str) -> Reply {
        console.execute(line.parse().unwrap()).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!("list".parse::<Command>().unwrap(), Command::List);
        assert_eq!(
            "add 6:45 weekdays /s/birds.mp3".parse::<Command>().unwrap(),
            Command::Add {
                time: Some("06:45".parse().unwrap()),
                days: "weekdays".parse().unwrap(),
                sound: Some(PathBuf::from("/s/birds.mp3")),
            }
        );
        assert_eq!(
            "edit 2 08:00".parse::<Command>().unwrap(),
            Command::Edit {
                index: 2,
                time: "08:00".parse().unwrap(),
                days: None,
                sound: None,
            }
        );
        assert_eq!("snooze 10".parse::<Command>().unwrap(), Command::Snooze(Some(10)));
        assert_eq!("snooze".parse::<Command>().unwrap(), Command::Snooze(None));
        assert_eq!(
            "add weekdays".parse::<Command>().unwrap(),
            Command::Add {
                time: None,
                days: "weekdays".parse().unwrap(),
                sound: None,
            }
        );
        for bad in ["", "add funday", "add 25:00", "rm 0", "rm x", "on", "dance", "stop now"] {
            assert!(bad.parse::<Command>().is_err(), "`{bad}` should not parse");
        }
    }

    #[test]
    fn manages_alarms_by_list_position() {
        let (store, _stop, mut console) = console();
        run(&mut console, "add 22:00 daily");
        run(&mut console, "add 06:30 mon,fri /s/birds.mp3");
        run(&mut console, "off 2");
        let night = &store.list()[1];
        assert_eq!(night.time.to_string(), "22:00");
        assert!(!night.enabled);
        assert_eq!(night.sound, PathBuf::from("alarm.mp3"));

        run(&mut console, "edit 1 06:45");
        let morning = &store.list()[0];
        assert_eq!(morning.time.to_string(), "06:45");
        assert_eq!(morning.repeat_days, "mon,fri".parse().unwrap());
        assert_eq!(morning.sound, PathBuf::from("/s/birds.mp3"));

        run(&mut console, "rm 2");
        assert_eq!(store.len(), 1);
        assert!(console.execute(Command::Remove(5)).is_err());
    }

    #[test]
    fn position_zero_is_an_error_not_a_panic() {
        let (store, _stop, mut console) = console();
        run(&mut console, "add 07:30");
        for command in [Command::Remove(0), Command::Enable(0), Command::Disable(0)] {
            assert!(matches!(
                console.execute(command),
                Err(Error::InvalidCommand(_))
            ));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_without_a_time_uses_the_default() {
        let (store, _stop, mut console) = console();
        run(&mut console, "add");
        run(&mut console, "add daily");
        let alarms = store.list();
        assert_eq!(alarms.len(), 2);
        assert!(alarms.iter().all(|a| a.time.to_string() == "06:15"));
        assert!(alarms[0].is_one_time());
        assert_eq!(alarms[1].repeat_days, RepeatDays::DAILY);
    }

    #[test]
    fn renders_the_list() {
        let (_store, _stop, mut console) = console();
        assert_eq!(console.render(), "Time: 07:00:10\nno alarms set");
        run(&mut console, "add 07:30");
        let text = run(&mut console, "list").text;
        assert!(text.starts_with("Time: 07:00:10\n 1. 07:30  once"));
        assert!(text.contains(" on "));
        assert!(text.ends_with("alarm.mp3"));
    }

    #[test]
    fn snoozes_what_is_ringing() {
        let (store, stop, mut console) = console();
        assert_eq!(run(&mut console, "snooze").text, "nothing is ringing");

        let id = store.create("07:00".parse().unwrap(), "birds.mp3", RepeatDays::DAILY);
        let alarm = store.get(id).unwrap();
        let prompt = console
            .on_message(&Message::new(MessageType::Fired(alarm), id))
            .unwrap();
        assert!(prompt.contains("07:00"));
        assert_eq!(console.ringing().len(), 1);

        assert_eq!(run(&mut console, "snooze").text, "snoozed for 5 minutes");
        assert!(stop.is_set());
        assert!(console.ringing().is_empty());
        let snoozed = store.list().into_iter().find(|a| a.id != id).unwrap();
        assert_eq!(snoozed.time.to_string(), "07:05");
        assert!(snoozed.is_one_time());
    }

    #[test]
    fn stop_silences_without_new_alarms() {
        let (store, stop, mut console) = console();
        let id = store.create("07:00".parse().unwrap(), "birds.mp3", RepeatDays::ONCE);
        let alarm = store.get(id).unwrap();
        console.on_message(&Message::new(MessageType::Fired(alarm), id));
        assert_eq!(run(&mut console, "stop").text, "stopped");
        assert!(stop.is_set());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn refreshes_on_store_changes() {
        let (store, _stop, mut console) = console();
        let id = store.create("07:00".parse().unwrap(), "a.mp3", RepeatDays::ONCE);
        let shown = console.on_message(&Message::new(MessageType::Created, id));
        assert!(shown.unwrap().contains("07:00"));
        assert!(console
            .on_message(&Message::new(MessageType::Stopped, id))
            .is_none());
    }
}
