//! Neuromode CLI - Command-line interface for the Neuromode engine
//!
//! Commands:
//! - transform: Process a file of snapshots into results (batch mode)
//! - run: Process streaming snapshots from stdin (streaming mode)
//! - baselines: Print the effective baseline profile
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use neuromode::baseline::BaselineStore;
use neuromode::window::DEFAULT_WINDOW_SIZE;
use neuromode::{
    BaselinesUpdate, ComputeError, FeaturesSnapshot, ModeEngine, ModeEngineResult,
    NEUROMODE_VERSION, PRODUCER_NAME,
};

/// Neuromode - biofeedback metrics and relaxation mode suggestions
#[derive(Parser)]
#[command(name = "neuromode")]
#[command(version = NEUROMODE_VERSION)]
#[command(about = "Turn EEG feature snapshots into wellness metrics and mode suggestions", long_about = None)]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a file of snapshots into results (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Number of snapshots to average over
        #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
        window: usize,

        /// Baseline profile (partial JSON, merged over defaults)
        #[arg(long)]
        baselines: Option<PathBuf>,
    },

    /// Process streaming NDJSON snapshots from stdin (streaming mode)
    Run {
        /// Number of snapshots to average over
        #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
        window: usize,

        /// Baseline profile (partial JSON, merged over defaults)
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Buffer output instead of flushing after each record
        #[arg(long)]
        no_flush: bool,
    },

    /// Print the effective baseline profile as JSON
    Baselines {
        /// Baseline profile (partial JSON, merged over defaults)
        #[arg(long)]
        baselines: Option<PathBuf>,
    },

    /// Diagnose configuration
    Doctor {
        /// Check a baseline profile file
        #[arg(long)]
        baselines: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
    /// JSON array of snapshots
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), NeuromodeCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
            window,
            baselines,
        } => cmd_transform(
            &input,
            &output,
            input_format,
            output_format,
            window,
            baselines.as_deref(),
        ),

        Commands::Run {
            window,
            baselines,
            no_flush,
        } => cmd_run(window, baselines.as_deref(), !no_flush),

        Commands::Baselines { baselines } => cmd_baselines(baselines.as_deref()),

        Commands::Doctor { baselines, json } => cmd_doctor(baselines.as_deref(), json),
    }
}

/// Build an engine, merging an optional partial baseline profile over defaults
fn build_engine(window: usize, baselines: Option<&Path>) -> Result<ModeEngine, NeuromodeCliError> {
    let mut engine = ModeEngine::with_window(window);

    if let Some(path) = baselines {
        let json = fs::read_to_string(path)?;
        let update: BaselinesUpdate = serde_json::from_str(&json)?;
        engine.update_baselines(&update);
        info!(path = %path.display(), "loaded baseline profile");
    }

    Ok(engine)
}

fn read_input(input: &Path) -> Result<String, NeuromodeCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_snapshots(data: &str, format: &InputFormat) -> Result<Vec<FeaturesSnapshot>, NeuromodeCliError> {
    match format {
        InputFormat::Json => Ok(serde_json::from_str(data)?),
        InputFormat::Ndjson => data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line.trim()).map_err(|e| {
                    NeuromodeCliError::ParseError(format!("line {}: {}", index + 1, e))
                })
            })
            .collect(),
    }
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    window: usize,
    baselines: Option<&Path>,
) -> Result<(), NeuromodeCliError> {
    let input_data = read_input(input)?;
    let snapshots = parse_snapshots(&input_data, &input_format)?;

    if snapshots.is_empty() {
        return Err(NeuromodeCliError::NoSnapshots);
    }

    let mut engine = build_engine(window, baselines)?;
    let results: Vec<ModeEngineResult> = snapshots
        .into_iter()
        .map(|snap| engine.push_snapshot(snap))
        .collect();

    debug!(count = results.len(), "processed snapshots");

    let output_data = format_output(&results, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(window: usize, baselines: Option<&Path>, flush: bool) -> Result<(), NeuromodeCliError> {
    let mut engine = build_engine(window, baselines)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let result = engine.process_json(trimmed)?;
        writeln!(stdout, "{}", result)?;
        if flush {
            stdout.flush()?;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_baselines(baselines: Option<&Path>) -> Result<(), NeuromodeCliError> {
    let engine = build_engine(DEFAULT_WINDOW_SIZE, baselines)?;
    println!("{}", engine.save_baselines()?);
    Ok(())
}

fn cmd_doctor(baselines: Option<&Path>, json: bool) -> Result<(), NeuromodeCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Neuromode version {}", NEUROMODE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "window".to_string(),
        status: CheckStatus::Ok,
        message: format!("Default window size {} snapshots", DEFAULT_WINDOW_SIZE),
    });

    if let Some(baselines_path) = baselines {
        checks.push(check_baselines_file(baselines_path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: NEUROMODE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Neuromode Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(NeuromodeCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_baselines_file(path: &Path) -> DoctorCheck {
    let name = "baselines".to_string();

    if !path.exists() {
        return DoctorCheck {
            name,
            status: CheckStatus::Warning,
            message: "Baselines file does not exist".to_string(),
        };
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Cannot read baselines file: {}", e),
            }
        }
    };

    match serde_json::from_str::<BaselinesUpdate>(&content) {
        Ok(update) => {
            let mut store = BaselineStore::default();
            store.update(&update);
            let b = store.get_baselines();
            let all_positive = [b.ba, b.theta, b.beta_rel, b.theta_rel, b.alpha_rel, b.blink_rate, b.emg_rms]
                .iter()
                .all(|v| *v > 0.0);

            if all_positive {
                DoctorCheck {
                    name,
                    status: CheckStatus::Ok,
                    message: "Baselines file valid".to_string(),
                }
            } else {
                DoctorCheck {
                    name,
                    status: CheckStatus::Warning,
                    message: "Baselines contain zero or negative fields; scores will be implausible"
                        .to_string(),
                }
            }
        }
        Err(e) => DoctorCheck {
            name,
            status: CheckStatus::Error,
            message: format!("Invalid baselines JSON: {}", e),
        },
    }
}

fn format_output(results: &[ModeEngineResult], format: &OutputFormat) -> Result<String, NeuromodeCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

// Error types

#[derive(Debug)]
enum NeuromodeCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoSnapshots,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for NeuromodeCliError {
    fn from(e: io::Error) -> Self {
        NeuromodeCliError::Io(e)
    }
}

impl From<ComputeError> for NeuromodeCliError {
    fn from(e: ComputeError) -> Self {
        NeuromodeCliError::Compute(e)
    }
}

impl From<serde_json::Error> for NeuromodeCliError {
    fn from(e: serde_json::Error) -> Self {
        NeuromodeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<NeuromodeCliError> for CliError {
    fn from(e: NeuromodeCliError) -> Self {
        match e {
            NeuromodeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            NeuromodeCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => {
                        ("PARSE_ERROR", "Ensure each line is a feature snapshot object")
                    }
                    ComputeError::EncodingError(_) => {
                        ("ENCODING_ERROR", "Result could not be serialized; please report this")
                    }
                    ComputeError::UnknownHistoryEntry(_) => {
                        ("UNKNOWN_ENTRY", "Check the mode history entry id")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            NeuromodeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            NeuromodeCliError::NoSnapshots => CliError {
                code: "NO_SNAPSHOTS".to_string(),
                message: "No snapshots found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            NeuromodeCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            NeuromodeCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flushes_by_default() {
        let cli = Cli::try_parse_from(["neuromode", "run"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { no_flush: false, .. }));

        let cli = Cli::try_parse_from(["neuromode", "run", "--no-flush"]).unwrap();
        assert!(matches!(cli.command, Commands::Run { no_flush: true, .. }));
    }

    #[test]
    fn test_compute_errors_map_to_distinct_codes() {
        let encoding = CliError::from(NeuromodeCliError::Compute(ComputeError::EncodingError(
            "non-finite value".to_string(),
        )));
        assert_eq!(encoding.code, "ENCODING_ERROR");

        let json_err = serde_json::from_str::<FeaturesSnapshot>("{").unwrap_err();
        let parse = CliError::from(NeuromodeCliError::Compute(ComputeError::from(json_err)));
        assert_eq!(parse.code, "PARSE_ERROR");
        assert_eq!(
            parse.hint.as_deref(),
            Some("Ensure each line is a feature snapshot object")
        );

        let unknown = CliError::from(NeuromodeCliError::Compute(
            ComputeError::UnknownHistoryEntry("abc".to_string()),
        ));
        assert_eq!(unknown.code, "UNKNOWN_ENTRY");
    }

    #[test]
    fn test_printed_baselines_load_into_engine() {
        let engine = build_engine(DEFAULT_WINDOW_SIZE, None).unwrap();
        let printed = engine.save_baselines().unwrap();

        let mut restored = ModeEngine::new();
        restored.load_baselines(&printed).unwrap();
        assert_eq!(restored.baselines(), engine.baselines());
    }
}
