//! scrub - redact sensitive values from event recordings and text files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use scrub_config::{
    config_keys, list_presets, CliOptions, ConfigLoader, DiscoveryMode, RedactionConfig,
};
use scrub_core::exit_codes::ExitCode;
use scrub_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat};
use scrub_core::pipeline::{
    default_output_path, process_recording, process_text_file, PipelineOptions, RunReport,
};
use scrub_core::schema::{available_schemas, get_schema};
use scrub_core::CoreError;
use scrub_redact::RedactionEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;

const DEFAULT_CONFIG: &str = "default";

/// Redact and pseudonymize sensitive values in event recordings
#[derive(Parser)]
#[command(name = "scrub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config preset name, file path or file:// URL
    #[arg(long, short = 'c', global = true, env = "SCRUB_CONFIG")]
    config: Option<String>,

    /// Output format for reports and errors
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact an event recording
    Redact(RedactArgs),

    /// Redact a plain text file line by line
    RedactText(RedactTextArgs),

    /// Print the JSON Schema of a document type
    Schema(SchemaArgs),

    /// List built-in presets
    Presets,

    /// Print the resolved configuration
    ShowConfig(ShowConfigArgs),

    /// Check that a configuration loads and compiles
    Validate(ValidateArgs),
}

/// Overrides applied on top of the loaded configuration.
#[derive(Args, Debug, Default)]
struct OverrideArgs {
    /// Only keep events whose type matches (repeatable, comma separated)
    #[arg(long, value_delimiter = ',')]
    include_events: Vec<String>,

    /// Drop events whose type matches
    #[arg(long, value_delimiter = ',')]
    exclude_events: Vec<String>,

    /// Only keep events with a matching category
    #[arg(long, value_delimiter = ',')]
    include_categories: Vec<String>,

    /// Drop events with a matching category
    #[arg(long, value_delimiter = ',')]
    exclude_categories: Vec<String>,

    /// Only keep events on a matching thread
    #[arg(long, value_delimiter = ',')]
    include_threads: Vec<String>,

    /// Drop events on a matching thread
    #[arg(long, value_delimiter = ',')]
    exclude_threads: Vec<String>,

    /// Remove events of this type entirely
    #[arg(long = "remove-event", value_delimiter = ',')]
    remove_events: Vec<String>,

    /// Extra regex to redact in string values
    #[arg(long = "redaction-regex")]
    redaction_regexes: Vec<String>,

    /// Text rule (`- glob`, `+ glob`, `! glob replacement`)
    #[arg(long = "rule", allow_hyphen_values = true)]
    rules: Vec<String>,

    /// Replace matches with stable pseudonyms instead of the redaction text
    #[arg(long)]
    pseudonymize: bool,

    /// Discovery mode (none, fast, comprehensive)
    #[arg(long)]
    discovery: Option<DiscoveryMode>,
}

impl OverrideArgs {
    fn to_cli_options(&self) -> CliOptions {
        CliOptions {
            include_events: self.include_events.clone(),
            exclude_events: self.exclude_events.clone(),
            include_categories: self.include_categories.clone(),
            exclude_categories: self.exclude_categories.clone(),
            include_threads: self.include_threads.clone(),
            exclude_threads: self.exclude_threads.clone(),
            remove_events: self.remove_events.clone(),
            redaction_regexes: self.redaction_regexes.clone(),
            pseudonymize: self.pseudonymize,
            discovery_mode: self.discovery,
            rules: self.rules.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    overrides: OverrideArgs,

    /// Hex-encoded 32-byte pseudonym key (random per run when unset)
    #[arg(long, env = "SCRUB_PSEUDONYM_KEY", hide_env_values = true)]
    pseudonym_key: Option<String>,
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input recording
    input: PathBuf,

    /// Output recording (default: <stem>.redacted.<ext> next to the input)
    output: Option<PathBuf>,

    /// Accept an input without events
    #[arg(long)]
    allow_empty: bool,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct RedactTextArgs {
    /// Input text file
    input: PathBuf,

    /// Output file (default: stdout)
    output: Option<PathBuf>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Schema name (see --list)
    name: Option<String>,

    /// List available schemas
    #[arg(long)]
    list: bool,

    /// List every dotted config key instead
    #[arg(long, conflicts_with_all = ["name", "list"])]
    keys: bool,
}

#[derive(Args, Debug)]
struct ShowConfigArgs {
    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Config to validate (default: --config or `default`)
    identifier: Option<String>,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LevelFilter::ERROR)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LevelFilter::INFO),
            2 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let result = match &cli.command {
        Commands::Redact(args) => run_redact(&cli.global, args),
        Commands::RedactText(args) => run_redact_text(&cli.global, args),
        Commands::Schema(args) => run_schema(&cli.global, args),
        Commands::Presets => run_presets(&cli.global),
        Commands::ShowConfig(args) => run_show_config(&cli.global, args),
        Commands::Validate(args) => run_validate(&cli.global, args),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(e) => output_error(&cli.global, &e),
    };
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn config_identifier(global: &GlobalOpts) -> &str {
    global.config.as_deref().unwrap_or(DEFAULT_CONFIG)
}

fn resolve_config(
    global: &GlobalOpts,
    overrides: &OverrideArgs,
) -> Result<Arc<RedactionConfig>, CoreError> {
    let base = ConfigLoader::global().load(config_identifier(global))?;
    let options = overrides.to_cli_options();
    if options.is_empty() {
        return Ok(base);
    }
    Ok(Arc::new(base.with_cli_options(&options)))
}

fn pipeline_options(args: &RunArgs, allow_empty: bool) -> Result<PipelineOptions, CoreError> {
    let pseudonym_key = match &args.pseudonym_key {
        Some(hex_key) => Some(parse_key(hex_key)?),
        None => None,
    };
    Ok(PipelineOptions {
        allow_empty,
        pseudonym_key,
    })
}

fn parse_key(hex_key: &str) -> Result<[u8; 32], CoreError> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| CoreError::Args(format!("pseudonym key is not hex: {}", e)))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        CoreError::Args(format!(
            "pseudonym key must be 32 bytes, got {}",
            bytes.len()
        ))
    })
}

fn run_redact(global: &GlobalOpts, args: &RedactArgs) -> Result<(), CoreError> {
    let config = resolve_config(global, &args.run.overrides)?;
    let engine = RedactionEngine::new(config)?;
    let options = pipeline_options(&args.run, args.allow_empty)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    if output == args.input {
        return Err(CoreError::Args(
            "output must differ from the input".to_string(),
        ));
    }

    let report = process_recording(&engine, &args.input, &output, &generate_run_id(), &options)?;
    print_report(global, &report);
    Ok(())
}

fn run_redact_text(global: &GlobalOpts, args: &RedactTextArgs) -> Result<(), CoreError> {
    let config = resolve_config(global, &args.run.overrides)?;
    let engine = RedactionEngine::new(config)?;
    let options = pipeline_options(&args.run, false)?;
    if args.output.as_ref() == Some(&args.input) {
        return Err(CoreError::Args(
            "output must differ from the input".to_string(),
        ));
    }

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    let report = process_text_file(
        &engine,
        &args.input,
        args.output.as_deref(),
        &mut stdout,
        &generate_run_id(),
        &options,
    )?;
    // stdout carries the text itself when no output file was given
    if report.output.is_some() {
        print_report(global, &report);
    }
    Ok(())
}

fn print_report(global: &GlobalOpts, report: &RunReport) {
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "ok",
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "report": report,
            });
            print_json(&response);
        }
        OutputFormat::Human => {
            let stats = &report.stats;
            let target = report
                .output
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".to_string());
            println!("Wrote {}", target);
            if stats.events_read > 0 {
                println!(
                    "  events: {} read, {} kept, {} removed, {} filtered",
                    stats.events_read, stats.events_kept, stats.events_removed, stats.events_filtered
                );
                println!("  fields redacted: {}", stats.fields_redacted);
            }
            println!("  substitutions: {}", stats.total_matches());
            for (source, count) in &stats.matches {
                println!("    {}: {}", source, count);
            }
            if stats.discovered_values > 0 {
                println!("  discovered values: {}", stats.discovered_values);
            }
        }
    }
}

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> Result<(), CoreError> {
    if args.keys {
        let keys = config_keys();
        match global.format {
            OutputFormat::Json => print_json(&serde_json::json!({ "keys": keys })),
            OutputFormat::Human => {
                for key in keys {
                    println!("{}", key);
                }
            }
        }
        return Ok(());
    }

    let name = match (&args.name, args.list) {
        (Some(name), false) => name.as_str(),
        _ => {
            for (name, description) in available_schemas() {
                println!("{:<10} {}", name, description);
            }
            return Ok(());
        }
    };
    let schema = get_schema(name)
        .ok_or_else(|| CoreError::Args(format!("unknown schema: {} (see --list)", name)))?;
    print_json(&schema);
    Ok(())
}

fn run_presets(global: &GlobalOpts) -> Result<(), CoreError> {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "presets": presets })),
        OutputFormat::Human => {
            for preset in presets {
                println!("{:<14} {}", preset.name, preset.description);
            }
        }
    }
    Ok(())
}

fn run_show_config(global: &GlobalOpts, args: &ShowConfigArgs) -> Result<(), CoreError> {
    let config = resolve_config(global, &args.overrides)?;
    match global.format {
        OutputFormat::Json => print_json(&serde_json::to_value(config.as_ref()).unwrap_or_default()),
        OutputFormat::Human => {
            let yaml = serde_yaml::to_string(config.as_ref())
                .map_err(|e| CoreError::Args(format!("cannot render config: {}", e)))?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

fn run_validate(global: &GlobalOpts, args: &ValidateArgs) -> Result<(), CoreError> {
    let identifier = args
        .identifier
        .as_deref()
        .unwrap_or_else(|| config_identifier(global));
    let config = ConfigLoader::global().load(identifier)?;
    // compiling catches rule and pattern errors the loader does not see
    let engine = RedactionEngine::new(config)?;

    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "valid",
            "config": identifier,
            "categories": engine.category_names(),
            "discovery_mode": engine.discovery_mode().to_string(),
        })),
        OutputFormat::Human => {
            println!("{}: OK", identifier);
            println!("  categories: {}", engine.category_names().join(", "));
            println!("  discovery: {}", engine.discovery_mode());
        }
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: failed to render JSON: {}", e),
    }
}

/// Report an error on stderr in the requested format.
fn output_error(global: &GlobalOpts, error: &CoreError) -> ExitCode {
    let exit_code = error.exit_code();
    if exit_code.is_internal_error() {
        tracing::error!(code = exit_code.code_name(), "command failed");
    } else {
        tracing::debug!(code = exit_code.code_name(), "command failed");
    }

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "error": {
                    "code": exit_code.code_name(),
                    "exit_code": exit_code.as_i32(),
                    "message": error.to_string(),
                }
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("Error: {}", error),
            }
        }
        OutputFormat::Human => eprintln!("Error: {}", error),
    }
    exit_code
}
