//! Telling the OS gallery about new files.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// Registers saved files with whatever indexes pictures on this machine.
pub trait MediaIndex {
    /// Announce `path`. Fire-and-forget: nothing waits for the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification could not be sent.
    fn register(&self, path: &Path) -> io::Result<()>;
}

/// Only logs the new file.
#[derive(Debug, Default)]
pub struct LogMediaIndex;

impl MediaIndex for LogMediaIndex {
    fn register(&self, path: &Path) -> io::Result<()> {
        tracing::info!("New picture: {}", path.display());
        Ok(())
    }
}

/// Spawns a command with the new file as its last argument. The child is
/// reaped on a background thread, so the caller never waits for it.
#[derive(Debug, Clone)]
pub struct CommandMediaIndex {
    program: String,
    args: Vec<String>,
}

impl CommandMediaIndex {
    /// Split a command line on whitespace. Returns `None` for a blank line.
    #[must_use]
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl MediaIndex for CommandMediaIndex {
    fn register(&self, path: &Path) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        tracing::debug!("Sent {} to {}", path.display(), self.program);

        let program = self.program.clone();
        thread::Builder::new()
            .name("media-index".to_string())
            .spawn(move || match child.wait() {
                Ok(status) if !status.success() => {
                    tracing::warn!("{program} exited with {status}");
                }
                Ok(_) => {}
                Err(err) => tracing::warn!("Could not wait for {program}: {err}"),
            })?;

        Ok(())
    }
}
