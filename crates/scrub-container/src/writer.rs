//! Atomic event writer.
//!
//! Output is staged in a temporary file next to the destination and renamed
//! into place by [`EventWriter::finish`]. Dropping the writer without finishing
//! deletes the staged file, so a failed run never leaves partial output.

use crate::event::Event;
use crate::header::ContainerHeader;
use crate::{ContainerError, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub struct EventWriter {
    destination: PathBuf,
    staged: BufWriter<NamedTempFile>,
    events_written: u64,
}

impl EventWriter {
    /// Stage a new container for `destination` and write its header.
    pub fn create(destination: &Path, header: &ContainerHeader) -> Result<Self> {
        let dir = match destination.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = NamedTempFile::new_in(&dir)?;
        debug!(staged = %temp.path().display(), "Staging container output");

        let mut staged = BufWriter::new(temp);
        serde_json::to_writer(&mut staged, header)?;
        staged.write_all(b"\n")?;

        Ok(Self {
            destination: destination.to_path_buf(),
            staged,
            events_written: 0,
        })
    }

    /// Append one event.
    pub fn write(&mut self, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.staged, event)?;
        self.staged.write_all(b"\n")?;
        self.events_written += 1;
        Ok(())
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Flush, sync and move the staged file into place.
    pub fn finish(self) -> Result<PathBuf> {
        let temp = self
            .staged
            .into_inner()
            .map_err(|e| ContainerError::Io(e.into_error()))?;
        temp.as_file().sync_all()?;
        temp.persist(&self.destination)
            .map_err(|e| ContainerError::Write {
                path: self.destination.clone(),
                message: e.error.to_string(),
            })?;

        info!(
            path = %self.destination.display(),
            events = self.events_written,
            "Container written"
        );
        Ok(self.destination)
    }
}

/// Write a whole container.
pub fn write_events<'a, I>(destination: &Path, header: &ContainerHeader, events: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut writer = EventWriter::create(destination, header)?;
    for event in events {
        writer.write(event)?;
    }
    writer.finish()
}
