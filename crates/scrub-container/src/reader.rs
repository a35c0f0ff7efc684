//! Streaming event reader.

use crate::event::Event;
use crate::header::{ContainerHeader, FORMAT_NAME, FORMAT_VERSION};
use crate::{ContainerError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads a container one event at a time.
///
/// Blank lines are skipped. A line that fails to decode yields
/// [`ContainerError::Read`] with its 1-based line number.
pub struct EventReader {
    path: PathBuf,
    header: ContainerHeader,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    events_read: u64,
}

impl EventReader {
    /// Open a container and read its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();
        let missing = || ContainerError::MissingHeader {
            path: path.to_path_buf(),
        };

        let first = match lines.next() {
            Some(line) => line?,
            None => return Err(missing()),
        };
        let header: ContainerHeader = serde_json::from_str(&first).map_err(|_| missing())?;
        if header.format != FORMAT_NAME {
            return Err(missing());
        }
        if header.version != FORMAT_VERSION {
            return Err(ContainerError::UnsupportedVersion {
                version: header.version,
                supported: FORMAT_VERSION,
            });
        }

        info!(path = %path.display(), version = header.version, "Container opened");

        Ok(Self {
            path: path.to_path_buf(),
            header,
            lines,
            line_no: 1,
            events_read: 0,
        })
    }

    /// Open the same container again from the start.
    pub fn reopen(&self) -> Result<Self> {
        debug!(path = %self.path.display(), "Reopening container");
        Self::open(&self.path)
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of events yielded so far.
    pub fn events_read(&self) -> u64 {
        self.events_read
    }
}

impl Iterator for EventReader {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<Event>(&line).map_err(|e| ContainerError::Read {
                line: self.line_no,
                message: e.to_string(),
            });
            if parsed.is_ok() {
                self.events_read += 1;
            }
            return Some(parsed);
        }
    }
}

/// Read a whole container into memory.
pub fn read_events(path: &Path) -> Result<(ContainerHeader, Vec<Event>)> {
    let reader = EventReader::open(path)?;
    let header = reader.header().clone();
    let events = reader.collect::<Result<Vec<_>>>()?;
    Ok((header, events))
}
