//! ptree - process tree visualizer.
//!
//! The main entry point, handling:
//! - Single-shot tree, subtree, and search views
//! - Continuous monitoring
//! - Text, JSON, and snapshot file output
//! - Configuration inspection and validation

use clap::{Args, Parser, Subcommand, ValueEnum};
use pt_common::{format_error_human, OutputFormat, ProcessId, StructuredError};
use pt_core::collect::{collect_snapshot, MemorySource, ProcessSource, SnapshotOptions};
use pt_core::config::{
    load_config, load_config_file, ConfigOptions, DisplayConfig, ResolvedConfig,
};
use pt_core::exit_codes::ExitCode;
use pt_core::export::{export_text, load_snapshot, save_snapshot, ForestDocument};
use pt_core::interrupt;
use pt_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use pt_core::monitor::{run_monitor, MonitorOptions};
use pt_core::render::{
    not_found_error, not_found_message, select, summary, write_frame, FrameOutcome, FrameRequest, RenderMode,
    RenderOptions, Selection,
};
use pt_core::tree::{build_forest, ForestStats, Query};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, info_span};

/// Process tree visualizer - hierarchical view of running processes
#[derive(Parser)]
#[command(name = "ptree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    view: ViewArgs,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (TOML, or JSON by extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level for stderr diagnostics
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format for stderr diagnostics (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Options for the tree view (the default command)
#[derive(Args, Debug)]
struct ViewArgs {
    /// Show CPU and memory usage
    #[arg(short, long)]
    resources: bool,

    /// Show user, threads, uptime, and command lines
    #[arg(short, long)]
    verbose: bool,

    /// Show only the specified process and its children
    #[arg(short, long, conflicts_with = "search")]
    pid: Option<u32>,

    /// Search processes by name (or exact pid)
    #[arg(short, long)]
    search: Option<String>,

    /// Export the tree to a text file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Display process statistics
    #[arg(long)]
    stats: bool,

    /// Continuous monitoring mode
    #[arg(long, conflicts_with_all = ["output", "save_snapshot", "format"])]
    monitor: bool,

    /// Update interval for monitoring mode (seconds)
    #[arg(long, value_parser = parse_interval)]
    interval: Option<f64>,

    /// Stop monitoring after this many refreshes
    #[arg(long, requires = "monitor")]
    max_cycles: Option<u64>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Tree)]
    format: OutputFormat,

    /// Omit the title block and collection summary
    #[arg(long)]
    no_header: bool,

    /// Read processes from a saved snapshot instead of /proc
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Save the collected snapshot as JSON
    #[arg(long)]
    save_snapshot: Option<PathBuf>,

    /// Read a proc filesystem mounted somewhere other than /proc
    #[arg(long, conflicts_with = "replay")]
    proc_root: Option<PathBuf>,

    /// Include kernel threads
    #[arg(long)]
    kernel_threads: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },

    /// Validate a config file (defaults to the resolved one)
    Validate {
        /// File to validate
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

fn parse_interval(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if secs > 0.0 && secs.is_finite() {
        Ok(secs)
    } else {
        Err(format!("interval must be a positive number of seconds, got {}", value))
    }
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Off)
    } else {
        cli.global.log_level
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let run_id = generate_run_id();
    let run_span = info_span!("run", run_id = %run_id);
    let exit_code = run_span.in_scope(|| match &cli.command {
        Some(Commands::Config(args)) => run_config(&cli.global, args),
        None => run_view(&cli.global, &cli.view),
    });

    debug!(run_id = %run_id, exit_code = %exit_code, "Finished");
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Tree view
// ============================================================================

fn run_view(global: &GlobalOpts, view: &ViewArgs) -> ExitCode {
    let machine = view.format.is_machine();

    let resolved = match load_resolved_config(global) {
        Ok(resolved) => resolved,
        Err(err) => return report_error(err, machine, global),
    };
    debug!(origin = %resolved.origin, "Configuration loaded");

    let mut config = resolved.config;
    if let Some(interval) = view.interval {
        config.interval_secs = interval;
    }
    if let Some(root) = &view.proc_root {
        config.proc_root = root.clone();
    }

    let source = match open_source(view, &config) {
        Ok(source) => source,
        Err(err) => return report_error(err, machine, global),
    };

    let mode = render_mode(view);
    let color = use_color(global, &config);
    let options = RenderOptions {
        resources: view.resources,
        verbose: view.verbose,
        cmdline_width: config.cmdline_width,
        thresholds: config.thresholds,
        now: 0,
    };
    let snapshot_options = SnapshotOptions {
        hide_kernel_threads: !view.kernel_threads && view.replay.is_none(),
    };

    interrupt::install();

    if view.monitor {
        let interval = match Duration::try_from_secs_f64(config.interval_secs) {
            Ok(interval) => interval,
            Err(_) => {
                eprintln!("ptree: interval {} is out of range", config.interval_secs);
                return ExitCode::ArgsError;
            }
        };
        let monitor = MonitorOptions {
            interval,
            clear_screen: io::stdout().is_terminal(),
            max_cycles: view.max_cycles,
            snapshot: snapshot_options,
        };
        return run_monitor_view(global, source.as_ref(), &mode, &options, &monitor, color, view);
    }

    run_single(global, view, source.as_ref(), &snapshot_options, &mode, options, color)
}

fn run_single(
    global: &GlobalOpts,
    view: &ViewArgs,
    source: &dyn ProcessSource,
    snapshot_options: &SnapshotOptions,
    mode: &RenderMode,
    mut options: RenderOptions,
    color: bool,
) -> ExitCode {
    let machine = view.format.is_machine();

    let snapshot = match collect_snapshot(source, snapshot_options) {
        Ok(snapshot) => snapshot,
        Err(err) => return report_error(err.into(), machine, global),
    };
    if let Some(path) = &view.save_snapshot {
        if let Err(err) = save_snapshot(path, &snapshot) {
            return report_error(err.into(), machine, global);
        }
    }

    let forest = build_forest(snapshot.records.clone());
    options.now = snapshot.captured_unix();
    info!(
        processes = forest.len(),
        roots = forest.roots().len(),
        orphans = forest.report().orphans,
        cycles_broken = forest.report().cycles_broken,
        "Forest built"
    );

    let found = match view.format {
        OutputFormat::Json => {
            let document = ForestDocument::new(&snapshot, &forest, mode);
            match document.to_json_pretty() {
                Ok(json) => {
                    if let Err(err) = print_line(&json) {
                        return report_error(err.into(), machine, global);
                    }
                }
                Err(err) => return report_error(err.into(), machine, global),
            }
            select(&forest, mode) != Selection::NotFound
        }
        OutputFormat::Summary => {
            let line = summary::summary_line(
                &snapshot.metadata,
                forest.report(),
                &ForestStats::compute(&forest),
            );
            if let Err(err) = print_line(&line) {
                return report_error(err.into(), machine, global);
            }
            select(&forest, mode) != Selection::NotFound
        }
        OutputFormat::Tree => {
            let request = FrameRequest {
                mode,
                options: &options,
                header: !view.no_header,
                collection_summary: !view.no_header,
                stats: view.stats,
                color,
            };
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match write_frame(&mut out, &snapshot, &forest, &request, interrupt::requested) {
                Ok(FrameOutcome::Rendered { .. }) => true,
                Ok(FrameOutcome::NotFound) => false,
                Ok(FrameOutcome::Interrupted) => {
                    eprintln!("{}", summary::terminated_line(color));
                    return ExitCode::Interrupted;
                }
                Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return ExitCode::Clean,
                Err(err) => return report_error(err.into(), machine, global),
            }
        }
    };

    if let Some(path) = &view.output {
        if let Err(err) = export_text(path, &snapshot, &forest, &options) {
            return report_error(err.into(), machine, global);
        }
        if !machine {
            println!(
                "{}",
                summary::export_confirmation(&path.display().to_string(), color)
            );
        }
    }

    if found {
        return ExitCode::Clean;
    }
    let Some(err) = not_found_error(mode) else {
        return ExitCode::NoMatch;
    };
    if machine {
        return report_error(err, true, global);
    }
    if let Some(message) = not_found_message(mode) {
        eprintln!("{}", message);
    }
    ExitCode::from(&err)
}

fn run_monitor_view(
    global: &GlobalOpts,
    source: &dyn ProcessSource,
    mode: &RenderMode,
    options: &RenderOptions,
    monitor: &MonitorOptions,
    color: bool,
    view: &ViewArgs,
) -> ExitCode {
    let request = FrameRequest {
        mode,
        options,
        header: !view.no_header,
        collection_summary: !view.no_header,
        stats: view.stats,
        color,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run_monitor(source, &mut out, &request, monitor, interrupt::requested) {
        Ok(report) => {
            if report.interrupted {
                let _ = writeln!(out, "\n{}", summary::terminated_line(color));
            }
            ExitCode::Clean
        }
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => ExitCode::Clean,
        Err(err) => report_error(err.into(), false, global),
    }
}

fn render_mode(view: &ViewArgs) -> RenderMode {
    if let Some(query) = &view.search {
        RenderMode::Search(Query::parse(query))
    } else if let Some(pid) = view.pid {
        RenderMode::Subtree(ProcessId(pid))
    } else {
        RenderMode::Full
    }
}

fn open_source(view: &ViewArgs, config: &DisplayConfig) -> pt_common::Result<Box<dyn ProcessSource>> {
    if let Some(path) = &view.replay {
        let file = load_snapshot(path)?;
        info!(path = %path.display(), records = file.records.len(), "Replaying snapshot");
        return Ok(Box::new(MemorySource::from(file)));
    }
    live_source(&config.proc_root)
}

#[cfg(target_os = "linux")]
fn live_source(root: &Path) -> pt_common::Result<Box<dyn ProcessSource>> {
    Ok(Box::new(pt_core::collect::ProcfsSource::new(root)))
}

#[cfg(not(target_os = "linux"))]
fn live_source(_root: &Path) -> pt_common::Result<Box<dyn ProcessSource>> {
    Err(pt_common::Error::UnsupportedPlatform(
        std::env::consts::OS.to_string(),
    ))
}

fn use_color(global: &GlobalOpts, config: &DisplayConfig) -> bool {
    config.color
        && !global.no_color
        && std::env::var_os("NO_COLOR").is_none()
        && io::stdout().is_terminal()
}

fn print_line(text: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", text)?;
    out.flush()
}

/// Print an error to stderr and map it to an exit code.
fn report_error(err: pt_common::Error, machine: bool, global: &GlobalOpts) -> ExitCode {
    let code = ExitCode::from(&err);
    if machine {
        eprintln!("{}", StructuredError::from(&err).to_json());
    } else {
        let color = !global.no_color && io::stderr().is_terminal();
        eprintln!("{}", format_error_human(&err, color));
    }
    debug!(code = err.code(), exit_code = %code, "Command failed");
    code
}

// ============================================================================
// Configuration commands
// ============================================================================

fn load_resolved_config(global: &GlobalOpts) -> pt_common::Result<ResolvedConfig> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
        config_home: None,
    };
    Ok(load_config(&options)?)
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show { format } => run_config_show(global, *format),
        ConfigCommands::Validate { path } => run_config_validate(global, path.as_deref()),
    }
}

/// Display the effective configuration (defaults when no file is present).
fn run_config_show(global: &GlobalOpts, format: ConfigFormat) -> ExitCode {
    let resolved = match load_resolved_config(global) {
        Ok(resolved) => resolved,
        Err(err) => return report_error(err, format == ConfigFormat::Json, global),
    };

    let rendered = match format {
        ConfigFormat::Toml => resolved
            .config
            .to_toml()
            .map(|body| format!("# source: {}\n{}", resolved.origin, body)),
        ConfigFormat::Json => resolved.config.to_json(),
    };

    match rendered {
        Ok(text) => match print_line(text.trim_end()) {
            Ok(()) => ExitCode::Clean,
            Err(err) => report_error(err.into(), false, global),
        },
        Err(err) => report_error(err.into(), false, global),
    }
}

/// Validate one file, or whatever the normal resolution finds.
fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> ExitCode {
    let result = match path {
        Some(path) => load_config_file(path).map(|_| path.display().to_string()),
        None => {
            let options = ConfigOptions {
                config_path: global.config.clone(),
                config_home: None,
            };
            load_config(&options).map(|resolved| resolved.origin.to_string())
        }
    };

    match result {
        Ok(origin) => {
            println!("Configuration valid: {}", origin);
            ExitCode::Clean
        }
        Err(err) => report_error(err.into(), false, global),
    }
}
