use std::{
    error::Error,
    io::{self, BufRead},
    path::PathBuf,
    sync::Arc,
    thread,
};

use clap::{Parser, Subcommand};
use crossbeam_channel::{select, Receiver};
use log::info;
use roosty_alarm::{
    alarm::{AlarmTime, RepeatDays},
    communication::{self, Message},
    config::{AlarmConfig, Config},
    console::{Command as ConsoleCommand, Console},
    volume::SystemVolume,
    AlarmStore, AlarmTrigger, Clock, Scheduler, SnoozeCoordinator, SoundPlayer, StopSignal,
    SystemClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the one in the user config directory
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// add an alarm to the config file
    Add {
        /// the config's default_time if left out
        time: Option<AlarmTime>,
        /// e.g. mon,wed,fri or weekdays, rings once if left out
        #[clap(long, short, default_value = "once")]
        days: RepeatDays,
        #[clap(long, short)]
        sound: Option<PathBuf>,
    },
    /// show the alarms in the config file
    List,
    /// start ringing alarms (the default)
    Run,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("roosty_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                std::fs::create_dir_all(Config::sounds_path()?)?;
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists, use --force to overwrite", config_path.display());
            }
        }
        Some(Command::Add { time, days, sound }) => {
            let mut config = Config::load_or_default(&config_path)?;
            config.add_alarm(AlarmConfig {
                time: time.unwrap_or(config.default_time),
                sound,
                days,
                enabled: true,
            });
            config.save(&config_path)?;
        }
        Some(Command::List) => {
            let config = Config::load_or_default(&config_path)?;
            for alarm in &config.alarms {
                println!(
                    "{}  {:<27} {:<3}  {}",
                    alarm.time,
                    alarm.days.to_string(),
                    if alarm.enabled { "on" } else { "off" },
                    alarm.sound.as_ref().unwrap_or(&config.default_sound).display()
                );
            }
        }
        Some(Command::Run) | None => run(&Config::load_or_default(&config_path)?)?,
    }
    Ok(())
}

enum Input {
    Event(Message),
    Line(Option<String>),
    Closed,
}

fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

#[cfg(feature = "rodio")]
fn player(_config: &Config) -> Arc<dyn SoundPlayer> {
    Arc::new(roosty_alarm::sound::RodioPlayer)
}

#[cfg(not(feature = "rodio"))]
fn player(config: &Config) -> Arc<dyn SoundPlayer> {
    Arc::new(config.player())
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let (events, rx) = communication::channel();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut store = AlarmStore::new();
    config.seed(&store)?;
    info!("loaded {} alarms", store.len());
    // the first render shows the seeded alarms
    store.set_events(events.clone());
    let store = Arc::new(store);

    let stop = StopSignal::new();
    let mut trigger = AlarmTrigger::new(player(config), stop.clone()).with_events(events.clone());
    if config.force_max_volume {
        trigger = trigger.with_volume(Arc::new(SystemVolume));
    }
    let scheduler = Scheduler::new(Arc::clone(&store), Arc::clone(&clock), Arc::new(trigger))
        .with_poll_interval(config.poll_interval())
        .with_events(events.clone())
        .spawn()?;

    let snooze = SnoozeCoordinator::new(Arc::clone(&store), Arc::clone(&clock), stop.clone())
        .with_snooze_minutes(config.snooze_minutes)
        .with_events(events);
    let mut console = Console::new(
        store,
        snooze,
        clock,
        config.resolve_sound(&config.default_sound),
        config.default_time,
        config.time_format.clone(),
    );

    let mut lines = spawn_stdin_reader()?;
    println!("{}\n(type help for commands)", console.render());
    loop {
        let input = select! {
            recv(rx) -> message => match message {
                Ok(message) => Input::Event(message),
                Err(_) => Input::Closed,
            },
            recv(lines) -> line => Input::Line(line.ok()),
        };
        match input {
            // the store keeps a sender alive, so only on the way out
            Input::Closed => break,
            Input::Event(message) => {
                if let Some(text) = console.on_message(&message) {
                    println!("{text}");
                }
            }
            Input::Line(None) => {
                // no terminal, keep ringing alarms anyway
                info!("stdin closed");
                lines = crossbeam_channel::never();
            }
            Input::Line(Some(line)) if line.trim().is_empty() => {}
            Input::Line(Some(line)) => {
                match line
                    .parse::<ConsoleCommand>()
                    .and_then(|command| console.execute(command))
                {
                    Ok(reply) => {
                        if !reply.text.is_empty() {
                            println!("{}", reply.text);
                        }
                        if reply.quit {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    stop.set();
    scheduler.shutdown();
    Ok(())
}
