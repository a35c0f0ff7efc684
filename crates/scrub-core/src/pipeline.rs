//! File-level orchestration: recordings and text files through one run.
//!
//! Fast (or disabled) discovery streams the input once. Comprehensive
//! discovery reads it twice: an observation pass over the whole input, then
//! the processing pass against the frozen discovered set.

use crate::error::{CoreError, Result};
use schemars::JsonSchema;
use scrub_container::{EventReader, EventWriter};
use scrub_redact::{RedactionEngine, RedactionRun, RunStats};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for one invocation.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Accept an input with no events.
    pub allow_empty: bool,
    /// Fixed pseudonym key; a random key per run when unset.
    pub pseudonym_key: Option<[u8; 32]>,
}

/// Outcome of one run, printed by the CLI.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RunReport {
    pub run_id: String,
    pub input: PathBuf,
    /// `None` when the output went to stdout.
    pub output: Option<PathBuf>,
    pub discovery_mode: String,
    /// Number of passes over the input.
    pub passes: u32,
    pub stats: RunStats,
}

fn start_run<'e>(engine: &'e RedactionEngine, options: &PipelineOptions) -> Result<RedactionRun<'e>> {
    let run = match options.pseudonym_key {
        Some(key) => engine.start_run_with_key(key)?,
        None => engine.start_run()?,
    };
    Ok(run)
}

/// Default output path for a recording: `<stem>.redacted.<ext>` next to it.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}.redacted.{}", stem, ext.to_string_lossy()),
        None => format!("{}.redacted", stem),
    };
    input.with_file_name(name)
}

/// Redact an event recording into `output`.
///
/// Nothing is written unless the whole input was processed.
pub fn process_recording(
    engine: &RedactionEngine,
    input: &Path,
    output: &Path,
    run_id: &str,
    options: &PipelineOptions,
) -> Result<RunReport> {
    let mut reader = EventReader::open(input)?;
    let mut run = start_run(engine, options)?;
    let mut passes = 1;

    info!(
        target: "scrub_core::run",
        run_id,
        input = %input.display(),
        discovery_mode = %engine.discovery_mode(),
        "redaction started"
    );

    if run.needs_observation_pass() {
        for event in reader.by_ref() {
            run.observe_event(&event?);
        }
        run.finish_observation();
        debug!(target: "scrub_core::run", run_id, "observation pass done, reopening input");
        reader = reader.reopen()?;
        passes = 2;
    }

    let mut writer = EventWriter::create(output, reader.header())?;
    for event in reader.by_ref() {
        if let Some(kept) = run.process_event(event?) {
            writer.write(&kept)?;
        }
    }

    if run.stats().events_read == 0 && !options.allow_empty {
        // dropping the writer discards the staged output
        return Err(CoreError::EmptyInput {
            path: input.to_path_buf(),
        });
    }
    let written = writer.finish()?;
    let stats = run.into_stats();

    info!(
        target: "scrub_core::run",
        run_id,
        events_read = stats.events_read,
        events_kept = stats.events_kept,
        events_removed = stats.events_removed,
        events_filtered = stats.events_filtered,
        fields_redacted = stats.fields_redacted,
        matches = stats.total_matches(),
        discovered = stats.discovered_values,
        "redaction finished"
    );

    Ok(RunReport {
        run_id: run_id.to_string(),
        input: input.to_path_buf(),
        output: Some(written),
        discovery_mode: engine.discovery_mode().to_string(),
        passes,
        stats,
    })
}

/// Redact a plain text file line by line.
///
/// Writes to `output` atomically, or to `stdout` when `output` is `None`.
/// Line terminators are preserved.
pub fn process_text_file(
    engine: &RedactionEngine,
    input: &Path,
    output: Option<&Path>,
    stdout: &mut dyn Write,
    run_id: &str,
    options: &PipelineOptions,
) -> Result<RunReport> {
    let mut run = start_run(engine, options)?;
    let mut passes = 1;

    if run.needs_observation_pass() {
        for_each_line(input, |line| {
            run.observe_text(line);
            Ok(())
        })?;
        run.finish_observation();
        passes = 2;
    }

    let written = match output {
        Some(path) => {
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let mut staged =
                tempfile::NamedTempFile::new_in(&dir).map_err(|e| CoreError::io(&dir, e))?;
            redact_lines(&mut run, input, staged.as_file_mut(), path)?;
            staged
                .as_file()
                .sync_all()
                .map_err(|e| CoreError::io(path, e))?;
            staged
                .persist(path)
                .map_err(|e| CoreError::io(path, e.error))?;
            Some(path.to_path_buf())
        }
        None => {
            redact_lines(&mut run, input, stdout, Path::new("<stdout>"))?;
            None
        }
    };

    if run.stats().total_matches() == 0 {
        debug!(target: "scrub_core::run", run_id, "no substitutions made");
    }
    let stats = run.into_stats();
    info!(
        target: "scrub_core::run",
        run_id,
        matches = stats.total_matches(),
        discovered = stats.discovered_values,
        "text redaction finished"
    );

    Ok(RunReport {
        run_id: run_id.to_string(),
        input: input.to_path_buf(),
        output: written,
        discovery_mode: engine.discovery_mode().to_string(),
        passes,
        stats,
    })
}

fn redact_lines(
    run: &mut RedactionRun<'_>,
    input: &Path,
    sink: &mut dyn Write,
    sink_path: &Path,
) -> Result<()> {
    let mut write = |bytes: &[u8]| sink.write_all(bytes).map_err(|e| CoreError::io(sink_path, e));
    for_each_raw_line(input, |content, terminator| {
        write(run.redact_text(content).as_bytes())?;
        write(terminator.as_bytes())
    })?;
    sink.flush().map_err(|e| CoreError::io(sink_path, e))
}

fn for_each_line(input: &Path, mut f: impl FnMut(&str) -> Result<()>) -> Result<()> {
    for_each_raw_line(input, |content, _| f(content))
}

/// Call `f` with each line's content and its terminator (`"\n"`, `"\r\n"` or `""`).
fn for_each_raw_line(
    input: &Path,
    mut f: impl FnMut(&str, &str) -> Result<()>,
) -> Result<()> {
    let file = File::open(input).map_err(|e| CoreError::io(input, e))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut number = 0;
    loop {
        line.clear();
        number += 1;
        let n = reader.read_line(&mut line).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => CoreError::InvalidText {
                path: input.to_path_buf(),
                line: number,
            },
            _ => CoreError::io(input, e),
        })?;
        if n == 0 {
            return Ok(());
        }
        let content_len = line
            .strip_suffix("\r\n")
            .or_else(|| line.strip_suffix('\n'))
            .map_or(line.len(), str::len);
        let (content, terminator) = line.split_at(content_len);
        f(content, terminator)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrub_config::{DiscoveryMode, ExtractionUnit, FieldExtraction, RedactionConfig};
    use scrub_container::{read_events, write_events, ContainerHeader, Event};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn engine(f: impl FnOnce(&mut RedactionConfig)) -> RedactionEngine {
        let mut config = RedactionConfig::base();
        f(&mut config);
        RedactionEngine::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/tmp/app.jsonl")),
            PathBuf::from("/tmp/app.redacted.jsonl")
        );
        assert_eq!(
            default_output_path(Path::new("dump")),
            PathBuf::from("dump.redacted")
        );
    }

    #[test]
    fn test_comprehensive_recording_two_passes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        let events: Vec<Event> = (0..3)
            .map(|_| Event::new("app.Job").with_field("owner", "zed"))
            .collect();
        write_events(&input, &ContainerHeader::new(), &events).unwrap();

        let engine = engine(|c| {
            c.discovery.mode = DiscoveryMode::Comprehensive;
            c.discovery.min_occurrences = 3;
            c.discovery.fields = vec![FieldExtraction {
                field: "owner".to_string(),
                unit: ExtractionUnit::Value,
                min_occurrences: None,
            }];
        });
        let report =
            process_recording(&engine, &input, &output, "run-test", &PipelineOptions::default())
                .unwrap();
        assert_eq!(report.passes, 2);
        assert_eq!(report.stats.events_read, 3);

        let (_, out) = read_events(&output).unwrap();
        assert!(out
            .iter()
            .all(|e| e.field("owner").and_then(|f| f.value.as_str()) == Some("***")));
    }

    #[test]
    fn test_empty_input_rejected_without_flag() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("empty.jsonl");
        let output = dir.path().join("out.jsonl");
        let none: Vec<Event> = Vec::new();
        write_events(&input, &ContainerHeader::new(), &none).unwrap();

        let engine = engine(|_| {});
        let err = process_recording(&engine, &input, &output, "r", &PipelineOptions::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyInput { .. }));
        assert!(!output.exists());

        let options = PipelineOptions {
            allow_empty: true,
            ..PipelineOptions::default()
        };
        process_recording(&engine, &input, &output, "r", &options).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_text_preserves_line_endings() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("log.txt");
        std::fs::write(&input, "key secret42\r\nplain\nlast secret1").unwrap();

        let engine = engine(|c| c.strings.rules = vec!["- secret*".to_string()]);
        let mut out = Vec::new();
        let report = process_text_file(
            &engine,
            &input,
            None,
            &mut out,
            "r",
            &PipelineOptions::default(),
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "key ***\r\nplain\nlast ***"
        );
        assert_eq!(report.output, None);
        assert_eq!(report.stats.matches.get("rules"), Some(&2));
    }

    #[test]
    fn test_non_utf8_text_is_input_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bin.txt");
        let output = dir.path().join("bin.out");
        std::fs::write(&input, b"fine\n\xff\xfe broken\n").unwrap();

        let engine = engine(|_| {});
        let mut sink = Vec::new();
        let err = process_text_file(
            &engine,
            &input,
            Some(&output),
            &mut sink,
            "r",
            &PipelineOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidText { line: 2, .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_text_to_file_comprehensive() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("log.txt");
        let output = dir.path().join("log.out");
        std::fs::write(&input, "user carol\n/home/carol/a\n/home/carol/b\n").unwrap();

        let engine = engine(|c| {
            c.discovery.mode = DiscoveryMode::Comprehensive;
            c.strings.user.patterns = vec![r"/home/([^/\s]+)".to_string()];
            c.strings.user.group = Some(1);
            c.strings.user.discovery = Some(scrub_config::CategoryDiscovery {
                enabled: true,
                min_occurrences: Some(2),
                ..Default::default()
            });
        });
        let mut sink = Vec::new();
        let report = process_text_file(
            &engine,
            &input,
            Some(&output),
            &mut sink,
            "r",
            &PipelineOptions::default(),
        )
        .unwrap();
        assert!(sink.is_empty());
        assert_eq!(report.passes, 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "user ***\n/home/***/a\n/home/***/b\n"
        );
    }
}
