//! sleepbin CLI - Command-line interface for sleep bout analysis
//!
//! Commands:
//! - analyze: Classify bouts from per-animal CSV files and compute cohort statistics
//! - validate: Check per-animal CSV files without running an analysis
//! - config: Print the default configuration

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sleepbin::adapters::{AnimalBouts, CsvBoutAdapter};
use sleepbin::tables::{all_tables, day_bin_count_table, write_tables};
use sleepbin::types::{AnalysisOutput, Category};
use sleepbin::{
    AnalysisConfig, AnalysisError, AnimalInput, Cohort, CohortAssignment, SleepBinProcessor,
    SLEEPBIN_VERSION,
};

/// sleepbin - Sleep bout binning and cohort statistics
#[derive(Parser)]
#[command(name = "sleepbin")]
#[command(version = SLEEPBIN_VERSION)]
#[command(about = "Bin sleep bouts by duration, phase and experimental day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full analysis
    Analyze {
        /// Animal recording, repeatable
        #[arg(long = "animal", value_name = "ID=PATH", value_parser = parse_animal_arg, required = true)]
        animals: Vec<(String, PathBuf)>,

        /// Cohort membership, repeatable
        #[arg(long = "cohort", value_name = "LABEL=ID,ID", value_parser = parse_cohort_arg)]
        cohorts: Vec<Cohort>,

        /// Cohort assignment JSON file (list or label-to-ids map)
        #[arg(long)]
        cohorts_file: Option<PathBuf>,

        /// Analysis configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Also write sheet tables as CSV into this directory
        #[arg(long)]
        tables_dir: Option<PathBuf>,

        /// Include per-day tables in the tables directory
        #[arg(long)]
        per_day: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Check animal CSV files
    Validate {
        /// Animal recording, repeatable
        #[arg(long = "animal", value_name = "ID=PATH", value_parser = parse_animal_arg, required = true)]
        animals: Vec<(String, PathBuf)>,

        /// Analysis configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default configuration
    Config {
        /// Use the ladder starting at 0 seconds
        #[arg(long)]
        zero_based: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), SleepbinCliError> {
    match cli.command {
        Commands::Analyze {
            animals,
            cohorts,
            cohorts_file,
            config,
            output,
            tables_dir,
            per_day,
            pretty,
        } => cmd_analyze(
            &animals,
            cohorts,
            cohorts_file.as_deref(),
            config.as_deref(),
            &output,
            tables_dir.as_deref(),
            per_day,
            pretty,
        ),

        Commands::Validate {
            animals,
            config,
            json,
        } => cmd_validate(&animals, config.as_deref(), json),

        Commands::Config { zero_based } => cmd_config(zero_based),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    animals: &[(String, PathBuf)],
    mut cohorts: Vec<Cohort>,
    cohorts_file: Option<&Path>,
    config: Option<&Path>,
    output: &Path,
    tables_dir: Option<&Path>,
    per_day: bool,
    pretty: bool,
) -> Result<(), SleepbinCliError> {
    let config = load_config(config)?;

    if let Some(path) = cohorts_file {
        let from_file = CohortAssignment::from_json(&fs::read_to_string(path)?)?;
        cohorts.extend(from_file.cohorts().iter().cloned());
    }
    if cohorts.is_empty() {
        return Err(SleepbinCliError::NoCohorts);
    }
    let cohorts = CohortAssignment::new(cohorts)?;

    // Validate configuration before touching any recording
    let processor = SleepBinProcessor::new(config)?;

    let loaded = load_animals(animals, processor.config())?;
    let rejected: BTreeMap<String, usize> = loaded
        .iter()
        .map(|b| (b.input.animal_id.clone(), b.rejected_rows))
        .collect();
    let inputs: Vec<AnimalInput> = loaded.into_iter().map(|b| b.input).collect();

    let result = processor.run(&cohorts, &inputs)?;

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    if output.to_string_lossy() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", json)?;
    } else {
        fs::write(output, json)?;
    }

    if let Some(dir) = tables_dir {
        let mut tables = all_tables(&result);
        if per_day {
            for info in &result.days {
                for category in Category::ALL {
                    tables.push(day_bin_count_table(&result, category, info.day));
                }
            }
        }
        let written = write_tables(&tables, dir)?;
        eprintln!("Wrote {} tables to {}", written.len(), dir.display());
    }

    print_summary(&result, &rejected);
    Ok(())
}

fn cmd_validate(
    animals: &[(String, PathBuf)],
    config: Option<&Path>,
    json: bool,
) -> Result<(), SleepbinCliError> {
    let config = load_config(config)?;
    let resolved = config.resolve()?;
    let loaded = load_animals(animals, &config)?;

    let files: Vec<FileReport> = loaded
        .iter()
        .zip(animals)
        .map(|(bouts, (_, path))| {
            let unparseable_timestamps = bouts
                .input
                .records
                .iter()
                .filter(|r| resolved.parser.parse(&r.timestamp).is_err())
                .count();
            FileReport {
                animal_id: bouts.input.animal_id.clone(),
                path: path.display().to_string(),
                rows: bouts.input.records.len() + bouts.rejected_rows,
                rejected_rows: bouts.rejected_rows,
                unparseable_timestamps,
            }
        })
        .collect();

    let report = ValidationReport {
        timestamp_format: config.timestamp_format.clone(),
        files_with_issues: files.iter().filter(|f| f.has_issues()).count(),
        files,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Timestamp format: {}", report.timestamp_format);
        for file in &report.files {
            println!(
                "  - {} ({}): {} rows, {} rejected, {} unparseable timestamps",
                file.animal_id, file.path, file.rows, file.rejected_rows, file.unparseable_timestamps
            );
        }
    }

    if report.files_with_issues > 0 {
        Err(SleepbinCliError::ValidationFailed(report.files_with_issues))
    } else {
        Ok(())
    }
}

fn cmd_config(zero_based: bool) -> Result<(), SleepbinCliError> {
    let config = if zero_based {
        AnalysisConfig::zero_based()
    } else {
        AnalysisConfig::default()
    };
    println!("{}", config.to_json()?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, SleepbinCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_animals(
    animals: &[(String, PathBuf)],
    config: &AnalysisConfig,
) -> Result<Vec<AnimalBouts>, SleepbinCliError> {
    let adapter = CsvBoutAdapter::new(config.columns.clone());
    animals
        .iter()
        .map(|(id, path)| {
            adapter
                .read_path(id, path)
                .map_err(|e| SleepbinCliError::Input(path.display().to_string(), e))
        })
        .collect()
}

/// Processed vs skipped counts per animal, written to stderr
fn print_summary(result: &AnalysisOutput, rejected: &BTreeMap<String, usize>) {
    eprintln!("Record summary");
    for tally in &result.tallies {
        eprintln!(
            "  {}: {} processed, {} skipped (timestamp), {} rejected (duration)",
            tally.animal_id,
            tally.processed,
            tally.skipped,
            rejected.get(&tally.animal_id).copied().unwrap_or(0)
        );
    }
    for id in &result.excluded_animals {
        eprintln!("  {}: excluded (no cohort)", id);
    }
}

fn parse_animal_arg(s: &str) -> Result<(String, PathBuf), String> {
    let (id, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PATH, got {:?}", s))?;
    let id = id.trim();
    if id.is_empty() || path.trim().is_empty() {
        return Err(format!("expected ID=PATH, got {:?}", s));
    }
    Ok((id.to_string(), PathBuf::from(path.trim())))
}

fn parse_cohort_arg(s: &str) -> Result<Cohort, String> {
    let (label, ids) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=ID,ID, got {:?}", s))?;
    let ids: Vec<&str> = ids
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();
    Ok(Cohort::new(label.trim(), ids))
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    timestamp_format: String,
    files_with_issues: usize,
    files: Vec<FileReport>,
}

#[derive(serde::Serialize)]
struct FileReport {
    animal_id: String,
    path: String,
    rows: usize,
    rejected_rows: usize,
    unparseable_timestamps: usize,
}

impl FileReport {
    fn has_issues(&self) -> bool {
        self.rejected_rows > 0 || self.unparseable_timestamps > 0 || self.rows == 0
    }
}

// Error types

#[derive(Debug)]
enum SleepbinCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Input(String, AnalysisError),
    Json(serde_json::Error),
    NoCohorts,
    ValidationFailed(usize),
}

impl From<io::Error> for SleepbinCliError {
    fn from(e: io::Error) -> Self {
        SleepbinCliError::Io(e)
    }
}

impl From<AnalysisError> for SleepbinCliError {
    fn from(e: AnalysisError) -> Self {
        SleepbinCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for SleepbinCliError {
    fn from(e: serde_json::Error) -> Self {
        SleepbinCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SleepbinCliError> for CliError {
    fn from(e: SleepbinCliError) -> Self {
        match e {
            SleepbinCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SleepbinCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::InvalidEdges(_)
                    | AnalysisError::InvalidHour(_)
                    | AnalysisError::InvalidConfig(_) => "Run 'sleepbin config' for a valid starting point",
                    AnalysisError::CohortConflict { .. } => "Assign each animal to a single cohort",
                    AnalysisError::JsonError(_) => "Check JSON syntax",
                    _ => "Review the input and configuration",
                };
                CliError {
                    code: "ANALYSIS_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SleepbinCliError::Input(path, e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: format!("{}: {}", path, e),
                hint: Some("Run 'sleepbin validate' for details".to_string()),
            },
            SleepbinCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            SleepbinCliError::NoCohorts => CliError {
                code: "NO_COHORTS".to_string(),
                message: "No cohorts configured".to_string(),
                hint: Some("Pass --cohort LABEL=ID,ID or --cohorts-file".to_string()),
            },
            SleepbinCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} files have issues", count),
                hint: Some("Check timestamp format and duration column".to_string()),
            },
        }
    }
}
