//! `ros-license-audit` command line entry point

use clap::Parser;
use ros_license_audit::copyright::write_copyright_file;
use ros_license_audit::engine::{EX_DATAERR, EX_USAGE};
use ros_license_audit::report::{render_report, ReportFormat, Verbosity};
use ros_license_audit::{AuditConfig, Auditor};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ros-license-audit")]
#[command(version, about = "Checks ROS packages for correct license declaration.", long_about = None)]
struct Cli {
    /// Path to a ROS package or a repository containing packages
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Write a Debian copyright file for the package to ./copyright
    #[arg(short = 'c', long, alias = "generate_copyright_file")]
    generate_copyright_file: bool,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable most output
    #[arg(short, long)]
    quiet: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Treat warnings as failures for the exit code
    #[arg(long, conflicts_with = "failures_as_warnings")]
    warnings_as_errors: bool,

    /// Treat failures as warnings for the exit code
    #[arg(long)]
    failures_as_warnings: bool,

    /// Cache scan results by file content between runs
    #[arg(long)]
    scan_cache: bool,

    /// Compare license texts against SPDX reference texts
    #[arg(long)]
    reference_texts: bool,
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    if !cli.path.exists() {
        eprintln!("Path {} does not exist.", cli.path.display());
        return EX_USAGE;
    }

    let config_root = if cli.path.is_dir() {
        cli.path.clone()
    } else {
        cli.path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
    };
    let mut config = AuditConfig::from_project_root(&config_root);
    config.warnings_as_errors |= cli.warnings_as_errors;
    config.failures_as_warnings |= cli.failures_as_warnings;
    config.scan_cache |= cli.scan_cache;
    config.reference_texts.enabled |= cli.reference_texts;

    let auditor = Auditor::from_config(config, &config_root);
    let (report, models) = match auditor.run_with_models(&cli.path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", e);
            return EX_USAGE;
        }
    };

    let format = if cli.json {
        ReportFormat::Json
    } else if cli.quiet {
        ReportFormat::Text(Verbosity::Quiet)
    } else if cli.verbose {
        ReportFormat::Text(Verbosity::Verbose)
    } else {
        ReportFormat::Text(Verbosity::Normal)
    };
    match render_report(&report, format) {
        Ok(rendered) => println!("{}", rendered.trim_end()),
        Err(e) => {
            eprintln!("{}", e);
            return EX_DATAERR;
        }
    }

    if cli.generate_copyright_file {
        if let [model] = models.as_slice() {
            let target = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("copyright");
            if let Err(e) = write_copyright_file(model, &target) {
                eprintln!("{}", e);
                return EX_DATAERR;
            }
        } else if !models.is_empty() {
            eprintln!("Can only generate copyright file for single package");
        }
    }

    auditor.exit_policy().exit_code(&report)
}
