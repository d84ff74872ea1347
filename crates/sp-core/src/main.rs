//! Satellite Plane Statistics Core - command line entry point
//!
//! The main entry point for sp-core, handling:
//! - Experiment aggregation and observation tables
//! - Simulation shape tables and n_sat dependence
//! - Jackknife covariance estimation
//! - Gaussian model comparison and artifact output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sp_common::{format_error_human, Error, OutputFormat, StructuredError};
use sp_config::{load_config, AnalysisConfig, ConfigSnapshot, LoadedConfig, ValidationError};
use sp_core::exit_codes::ExitCode;
use sp_core::experiment::AggregationMode;
use sp_core::log_event;
use sp_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use sp_core::report::{self, Envelope, SimulationSource, ToMarkdown};

/// Satellite plane statistics - jackknife covariance and Gaussian model comparison
#[derive(Parser)]
#[command(name = "sp-core")]
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
    /// Analysis config file (.json or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate one directory and show its series and normalized values
    Observe(ObserveArgs),

    /// Observed physical, control and normalized values per n_sat
    ShapeObs(ShapeObsArgs),

    /// Mean and spread of simulated physical values per source and n_sat
    ShapeSim(ShapeSimArgs),

    /// Normalized observation of one field across n_sat
    NDependence(NDependenceArgs),

    /// Jackknife covariance and mean of a simulation
    Covariance(CovarianceArgs),

    /// Gaussian model of a simulation compared with the observation
    Model(ModelArgs),

    /// Configuration management
    Config(ConfigArgs),
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct NSatRangeArgs {
    /// Smallest satellite count (defaults to config n_sat_min)
    #[arg(long)]
    n_sat_min: Option<u32>,

    /// Largest satellite count (defaults to config n_sat_max)
    #[arg(long)]
    n_sat_max: Option<u32>,
}

#[derive(Args, Debug)]
struct ObserveArgs {
    /// Directory with <HOST>_group_<id>_nsat_<n>.dat files
    #[arg(long)]
    obs_dir: PathBuf,

    /// Satellite count
    #[arg(long)]
    n_sat: u32,

    /// Keep every control sample instead of mean/std
    #[arg(long)]
    full_detail: bool,
}

#[derive(Args, Debug)]
struct ShapeObsArgs {
    /// Observation directory
    #[arg(long)]
    obs_dir: PathBuf,

    #[command(flatten)]
    range: NSatRangeArgs,
}

#[derive(Args, Debug)]
struct ShapeSimArgs {
    /// Simulation source as NAME=DIR (repeatable)
    #[arg(long = "source", required = true)]
    sources: Vec<SimulationSource>,

    #[command(flatten)]
    range: NSatRangeArgs,
}

#[derive(Args, Debug)]
struct NDependenceArgs {
    /// Observation directory
    #[arg(long)]
    obs_dir: PathBuf,

    /// Row index into the configured field list
    #[arg(long)]
    field: usize,

    #[command(flatten)]
    range: NSatRangeArgs,
}

#[derive(Args, Debug)]
struct CovarianceArgs {
    /// Simulation directory
    #[arg(long)]
    sim_dir: PathBuf,

    /// Satellite count
    #[arg(long)]
    n_sat: u32,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Simulation directory
    #[arg(long)]
    sim_dir: PathBuf,

    /// Observation directory
    #[arg(long)]
    obs_dir: PathBuf,

    /// Simulation name used in artifact file names
    #[arg(long)]
    simulation: String,

    /// Satellite count
    #[arg(long)]
    n_sat: u32,

    /// Draws per host (overrides config sample_count)
    #[arg(long)]
    samples: Option<usize>,

    /// RNG seed (overrides config seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Write gaussian_model_<sim>_<HOST>_n_<n_sat>.json files here
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    let log_config = LogConfig::from_env(level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Observe(args) => run_observe(&cli.global, args),
        Commands::ShapeObs(args) => run_shape_obs(&cli.global, args),
        Commands::ShapeSim(args) => run_shape_sim(&cli.global, args),
        Commands::NDependence(args) => run_n_dependence(&cli.global, args),
        Commands::Covariance(args) => run_covariance(&cli.global, args),
        Commands::Model(args) => run_model(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Run plumbing
// ============================================================================

/// Why a command failed.
enum Failure {
    Args(String),
    Core(Error),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Failure::Core(err)
    }
}

impl From<ValidationError> for Failure {
    fn from(err: ValidationError) -> Self {
        Failure::Core(err.into())
    }
}

/// Per-run state handed to command bodies.
struct RunContext {
    log: LogContext,
    loaded: LoadedConfig,
    snapshot: ConfigSnapshot,
}

impl RunContext {
    fn config(&self) -> &AnalysisConfig {
        &self.loaded.config
    }

    fn envelope<T>(&self, report: T) -> Envelope<T> {
        Envelope::new(
            self.log.run_id.clone(),
            self.log.command.clone().unwrap_or_default(),
            self.snapshot.config_hash.clone(),
            report,
        )
    }
}

/// Run a command body inside a span carrying the run id and command name,
/// print its payload on stdout and map failures to exit codes.
fn execute(
    global: &GlobalOpts,
    command: &str,
    body: impl FnOnce(&RunContext) -> Result<String, Failure>,
) -> ExitCode {
    let run_id = generate_run_id();
    let log = LogContext::new(run_id.clone()).with_command(command);
    let span = tracing::info_span!("run", run_id = %run_id, command = command);
    let _guard = span.enter();

    log_event!(log, INFO, event_names::RUN_STARTED, Stage::Init, "Starting run");

    let result = load_run_config(global, &log).and_then(|loaded| {
        let snapshot = ConfigSnapshot::new(&loaded);
        let ctx = RunContext {
            log: log.clone(),
            loaded,
            snapshot,
        };
        body(&ctx)
    });

    match result {
        Ok(payload) => {
            println!("{}", payload);
            log_event!(log, INFO, event_names::RUN_FINISHED, Stage::Report, "Run finished");
            ExitCode::Clean
        }
        Err(failure) => output_failure(global, &log, failure),
    }
}

fn load_run_config(global: &GlobalOpts, log: &LogContext) -> Result<LoadedConfig, Failure> {
    let loaded = load_config(global.config.as_deref()).map_err(|e| {
        log_event!(
            log,
            ERROR,
            event_names::CONFIG_ERROR,
            Stage::Init,
            "Failed to load configuration",
            error = e.to_string()
        );
        Failure::from(e)
    })?;

    match &loaded.path {
        Some(path) => log_event!(
            log,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "Loaded configuration",
            path = path.display().to_string(),
            source = loaded.source.to_string()
        ),
        None => log_event!(
            log,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "Using built-in configuration defaults"
        ),
    }
    Ok(loaded)
}

fn output_failure(global: &GlobalOpts, log: &LogContext, failure: Failure) -> ExitCode {
    match failure {
        Failure::Args(message) => {
            log_event!(
                log,
                ERROR,
                event_names::RUN_FAILED,
                Stage::Init,
                "Invalid arguments",
                error = message.clone()
            );
            eprintln!("error: {}", message);
            ExitCode::ArgsError
        }
        Failure::Core(err) => {
            let exit_code = ExitCode::from(&err);
            log_event!(
                log,
                ERROR,
                event_names::RUN_FAILED,
                Stage::Report,
                "Run failed",
                error = err.to_string(),
                code = err.code(),
                exit_code = exit_code.code_name()
            );
            match global.format {
                OutputFormat::Json => {
                    let structured = StructuredError::from(&err);
                    let response = serde_json::json!({
                        "run_id": log.run_id,
                        "command": log.command,
                        "status": "error",
                        "exit_code": exit_code.as_i32(),
                        "error": structured,
                    });
                    eprintln!(
                        "{}",
                        serde_json::to_string_pretty(&response).unwrap_or_else(|_| structured.to_json())
                    );
                }
                OutputFormat::Md => {
                    eprintln!("{}", format_error_human(&err, std::io::stderr().is_terminal()));
                }
            }
            exit_code
        }
    }
}

fn resolve_range(
    range: &NSatRangeArgs,
    config: &AnalysisConfig,
) -> Result<std::ops::RangeInclusive<u32>, Failure> {
    let min = range.n_sat_min.unwrap_or(config.n_sat_min);
    let max = range.n_sat_max.unwrap_or(config.n_sat_max);
    if min > max {
        return Err(Failure::Args(format!(
            "--n-sat-min ({}) must not exceed --n-sat-max ({})",
            min, max
        )));
    }
    Ok(min..=max)
}

fn render<T: Serialize + ToMarkdown>(
    global: &GlobalOpts,
    ctx: &RunContext,
    report: T,
) -> Result<String, Failure> {
    Ok(report::render(&ctx.envelope(report), global.format)?)
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_observe(global: &GlobalOpts, args: &ObserveArgs) -> ExitCode {
    execute(global, "observe", |ctx| {
        let mode = if args.full_detail {
            AggregationMode::FullDetail
        } else {
            AggregationMode::Summary
        };
        let report = report::observe(&args.obs_dir, args.n_sat, mode, ctx.config())?;
        render(global, ctx, report)
    })
}

fn run_shape_obs(global: &GlobalOpts, args: &ShapeObsArgs) -> ExitCode {
    execute(global, "shape-obs", |ctx| {
        let range = resolve_range(&args.range, ctx.config())?;
        let shapes = report::observation_shapes(&args.obs_dir, range, ctx.config())?;
        render(global, ctx, shapes)
    })
}

fn run_shape_sim(global: &GlobalOpts, args: &ShapeSimArgs) -> ExitCode {
    execute(global, "shape-sim", |ctx| {
        let range = resolve_range(&args.range, ctx.config())?;
        let shapes = report::simulation_shapes(&args.sources, range, ctx.config())?;
        render(global, ctx, shapes)
    })
}

fn run_n_dependence(global: &GlobalOpts, args: &NDependenceArgs) -> ExitCode {
    execute(global, "n-dependence", |ctx| {
        let range = resolve_range(&args.range, ctx.config())?;
        let dependence =
            report::normalized_dependence(&args.obs_dir, range, args.field, ctx.config())?;
        render(global, ctx, dependence)
    })
}

fn run_covariance(global: &GlobalOpts, args: &CovarianceArgs) -> ExitCode {
    execute(global, "covariance", |ctx| {
        let report = report::covariance_report(&args.sim_dir, args.n_sat, ctx.config())?;
        render(global, ctx, report)
    })
}

fn run_model(global: &GlobalOpts, args: &ModelArgs) -> ExitCode {
    execute(global, "model", |ctx| {
        let mut config = ctx.config().clone();
        if let Some(samples) = args.samples {
            if samples == 0 {
                return Err(Failure::Args("--samples must be at least 1".to_string()));
            }
            config.sample_count = samples;
        }
        if args.seed.is_some() {
            config.seed = args.seed;
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let comparison = report::gaussian_comparison(
            &args.sim_dir,
            &args.obs_dir,
            &args.simulation,
            args.n_sat,
            &config,
            &mut rng,
        )?;

        if let Some(dir) = &args.output_dir {
            let written = report::write_model_artifacts(&comparison, dir)?;
            log_event!(
                ctx.log,
                INFO,
                event_names::REPORT_ARTIFACT_WRITTEN,
                Stage::Report,
                "Model artifacts written",
                count = written.len()
            );
        }
        render(global, ctx, comparison)
    })
}

/// Resolved configuration and where it came from.
#[derive(Serialize)]
struct ConfigView {
    status: &'static str,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    config_id: String,
    config: AnalysisConfig,
}

impl ConfigView {
    fn new(loaded: &LoadedConfig, snapshot: &ConfigSnapshot, status: &'static str) -> Self {
        ConfigView {
            status,
            source: loaded.source.to_string(),
            path: loaded.path.as_ref().map(|p| p.display().to_string()),
            config_id: snapshot.short_id().to_string(),
            config: loaded.config.clone(),
        }
    }
}

impl ToMarkdown for ConfigView {
    fn to_markdown(&self) -> String {
        let c = &self.config;
        let mut out = format!("## Configuration ({})\n\n", self.status);
        out.push_str(&format!(
            "Source: {}{}\n\n",
            self.source,
            self.path
                .as_ref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default()
        ));
        out.push_str("| key | value |\n|---|---|\n");
        out.push_str(&format!("| schema_version | {} |\n", c.schema_version));
        out.push_str(&format!("| fields | {} |\n", field_list(&c.fields)));
        out.push_str(&format!("| aggregated_fields | {} |\n", field_list(&c.aggregated_fields)));
        out.push_str(&format!("| n_controls | {} |\n", c.n_controls));
        out.push_str(&format!("| mean_error_divisor | {} |\n", c.mean_error_divisor));
        out.push_str(&format!("| sample_count | {} |\n", c.sample_count));
        out.push_str(&format!(
            "| seed | {} |\n",
            c.seed.map(|s| s.to_string()).unwrap_or_else(|| "entropy".to_string())
        ));
        out.push_str(&format!("| quantiles | {:?} |\n", c.quantiles));
        out.push_str(&format!("| n_sat range | {}..={} |\n", c.n_sat_min, c.n_sat_max));
        out
    }
}

fn field_list(list: &[sp_common::Observable]) -> String {
    list.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => execute(global, "config show", |ctx| {
            render(global, ctx, ConfigView::new(&ctx.loaded, &ctx.snapshot, "resolved"))
        }),
        ConfigCommands::Validate { path } => {
            let explicit = GlobalOpts {
                config: path.clone().or_else(|| global.config.clone()),
                format: global.format,
                verbose: global.verbose,
                quiet: global.quiet,
                log_format: global.log_format,
            };
            execute(&explicit, "config validate", |ctx| {
                render(global, ctx, ConfigView::new(&ctx.loaded, &ctx.snapshot, "valid"))
            })
        }
    }
}
