//! ABOUTME: Audio sinks for the alarm sound
//! ABOUTME: Blocking play calls, re-invoked by the alarm task each cycle

use fw_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

/// Plays the alarm sound once. Blocks until playback ends.
pub trait AudioSink: Send + Sync {
    fn play(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Plays a sound file by running an external player, e.g. `aplay alarm.wav`
#[derive(Debug, Clone)]
pub struct CommandAudioSink {
    program: String,
    sound: PathBuf,
}

impl CommandAudioSink {
    pub fn new<P: AsRef<Path>>(program: &str, sound: P) -> Self {
        Self {
            program: program.to_string(),
            sound: sound.as_ref().to_path_buf(),
        }
    }
}

impl AudioSink for CommandAudioSink {
    fn play(&self) -> Result<()> {
        debug!(program = %self.program, sound = %self.sound.display(), "Playing alarm sound");

        let status = Command::new(&self.program)
            .arg(&self.sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Audio(format!("Failed to run {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Audio(format!("{} exited with {}", self.program, status)))
        }
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// No sound; each cycle just waits so the alarm keeps its pacing
#[derive(Debug, Clone)]
pub struct SilentAudioSink {
    cycle: Duration,
}

impl SilentAudioSink {
    pub fn new(cycle: Duration) -> Self {
        Self { cycle }
    }
}

impl AudioSink for SilentAudioSink {
    fn play(&self) -> Result<()> {
        std::thread::sleep(self.cycle);
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_silent_sink_waits_one_cycle() {
        let sink = SilentAudioSink::new(Duration::from_millis(15));
        let start = Instant::now();
        sink.play().unwrap();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn test_missing_player_is_audio_error() {
        let sink = CommandAudioSink::new("facewatch-no-such-player", "alarm.wav");
        assert!(matches!(sink.play(), Err(Error::Audio(_))));
    }
}
