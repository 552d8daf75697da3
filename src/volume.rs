use std::process::Command;

use log::debug;

use crate::{
    error::{Error, Result},
    trigger::VolumeControl,
};

/// Turns the system output volume to 100% with the platform's mixer command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVolume;

impl SystemVolume {
    fn command() -> Option<Command> {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("osascript");
            cmd.args(["-e", "set volume output volume 100"]);
            Some(cmd)
        } else if cfg!(target_os = "linux") {
            let mut cmd = Command::new("amixer");
            cmd.args(["-D", "pulse", "sset", "Master", "100%"]);
            Some(cmd)
        } else {
            None
        }
    }
}

impl VolumeControl for SystemVolume {
    fn set_max_volume(&self) -> Result<()> {
        let mut cmd = Self::command().ok_or_else(|| {
            Error::VolumeControlFailure(format!(
                "no volume control on {}",
                std::env::consts::OS
            ))
        })?;
        debug!("setting volume with {cmd:?}");
        let output = cmd
            .output()
            .map_err(|e| Error::VolumeControlFailure(format!("{:?}: {e}", cmd.get_program())))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::VolumeControlFailure(format!(
                "{:?} exited with {}: {}",
                cmd.get_program(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
