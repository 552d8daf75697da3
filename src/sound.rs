//! Sound players for a ringing alarm.
//!
//! Both check for the stop signal while the sound plays, so stopping an alarm cuts the
//! current play short instead of waiting for it to end.

use std::{
    path::Path,
    process::{Command, Stdio},
    thread,
    time::Duration,
};

use log::debug;

use crate::{
    error::{Error, Result},
    snooze::StopSignal,
    trigger::SoundPlayer,
};

// how often a playing sound looks at the stop signal
const STOP_POLL: Duration = Duration::from_millis(50);

fn check_exists(sound: &Path) -> Result<()> {
    if sound.is_file() {
        Ok(())
    } else {
        Err(Error::playback(sound, "no such file"))
    }
}

/// Plays sounds with an external program, `afplay` on macOS and `paplay` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl Default for CommandPlayer {
    fn default() -> Self {
        let program = if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "paplay"
        };
        Self::new(program, Vec::new())
    }
}

impl CommandPlayer {
    /// `program` is run with `args` followed by the path of the sound
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SoundPlayer for CommandPlayer {
    fn play(&self, sound: &Path, stop: &StopSignal) -> Result<()> {
        check_exists(sound)?;
        debug!("playing {} with {}", sound.display(), self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::playback(sound, format!("couldn't start {}: {e}", self.program)))?;
        loop {
            if let Some(status) = child.try_wait()? {
                return if status.success() {
                    Ok(())
                } else {
                    Err(Error::playback(
                        sound,
                        format!("{} exited with {status}", self.program),
                    ))
                };
            }
            if stop.is_set() {
                // already gone is fine too
                let _ = child.kill();
                child.wait()?;
                return Ok(());
            }
            thread::sleep(STOP_POLL);
        }
    }
}

/// Decodes and plays sounds in-process on the default output device.
///
/// Each playback thread opens the device once and keeps it for every replay.
#[cfg(feature = "rodio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioPlayer;

#[cfg(feature = "rodio")]
thread_local! {
    static OUTPUT: std::cell::RefCell<Option<rodio::OutputStream>> =
        const { std::cell::RefCell::new(None) };
}

#[cfg(feature = "rodio")]
fn with_output<R>(sound: &Path, f: impl FnOnce(&rodio::OutputStream) -> Result<R>) -> Result<R> {
    OUTPUT.with(|output| {
        let mut output = output.borrow_mut();
        let stream = match output.take() {
            Some(stream) => stream,
            None => {
                let mut stream = rodio::OutputStreamBuilder::open_default_stream()
                    .map_err(|e| Error::playback(sound, e))?;
                stream.log_on_drop(false);
                debug!("opened the default output stream");
                stream
            }
        };
        let result = f(&stream);
        *output = Some(stream);
        result
    })
}

#[cfg(feature = "rodio")]
impl SoundPlayer for RodioPlayer {
    fn play(&self, sound: &Path, stop: &StopSignal) -> Result<()> {
        check_exists(sound)?;
        let file = std::fs::File::open(sound).map_err(|e| Error::playback(sound, e))?;
        with_output(sound, |stream| {
            let sink = rodio::Sink::connect_new(stream.mixer());
            let source = rodio::Decoder::new(std::io::BufReader::new(file))
                .map_err(|e| Error::playback(sound, e))?;
            sink.append(source);
            sink.play();
            while !sink.empty() {
                if stop.is_set() {
                    sink.stop();
                    break;
                }
                thread::sleep(STOP_POLL);
            }
            Ok(())
        })
    }
}
