//! TreeSort Runner CLI Entry Point
//!
//! The platform-facing job wrapper: reports pre-flight resource estimates,
//! stages the job, runs the analysis, and publishes results.
//!
//! # Usage
//!
//! ```bash
//! # Run a job
//! treesort-runner job.json
//!
//! # Report the resource request and exit
//! treesort-runner job.json --preflight
//!
//! # Preview commands without executing
//! treesort-runner job.json --dry-run
//!
//! # Keep the temporary directory tree for debugging
//! treesort-runner job.json --keep-workdir
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::info;

use treesort_runner::execution::{JobRunner, ALLOCATION_ENV};
use treesort_runner::job::{load_params, preflight};
use treesort_runner::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    job_path: String,
    preflight: bool,
    dry_run: bool,
    keep_workdir: bool,
    threads: Option<usize>,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME.bold(), VERSION);
    println!("BV-BRC job wrapper for TreeSort");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: treesort-runner [OPTIONS] <JOB_FILE>");
    println!();
    println!("Arguments:");
    println!("  <JOB_FILE>       Path to the JSON job file");
    println!();
    println!("Options:");
    println!("  --preflight      Print the resource request as JSON and exit");
    println!("  --dry-run        Preview commands without execution");
    println!("  --keep-workdir   Retain the temporary job directory for debugging");
    println!("  --threads N      CPU allocation for the analysis (default: {} or core count)", ALLOCATION_ENV);
    println!("  --verbose        Enable debug logging");
    println!("  --help           Show this help message");
    println!("  --version        Show version information");
    println!();
    println!("Examples:");
    println!("  treesort-runner job.json");
    println!("  treesort-runner job.json --preflight");
    println!("  treesort-runner job.json --dry-run --keep-workdir");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--preflight" => {
                config.preflight = true;
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--keep-workdir" => {
                config.keep_workdir = true;
            }
            "--threads" => {
                i += 1;
                if i >= args.len() {
                    return Err("--threads requires a number argument".to_string());
                }
                let threads = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid threads value: {}", args[i]))?;
                config.threads = Some(threads);
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if !config.job_path.is_empty() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.job_path = arg.clone();
            }
        }
        i += 1;
    }

    if config.job_path.is_empty() {
        return Err("A job file is required".to_string());
    }

    Ok(config)
}

/// Resolves the CPU allocation: explicit flag, then the platform's
/// allocation variable, then the machine's core count.
fn allocated_cpus(config: &Config) -> usize {
    if let Some(threads) = config.threads {
        return threads;
    }

    env::var(ALLOCATION_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(num_cpus::get)
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    // Load and validate the job file
    let params = load_params(&config.job_path)?;

    // Pre-flight mode reports the resource request and stops
    if config.preflight {
        let request = preflight(&params);
        println!("{}", request.to_json()?);
        return Ok(());
    }

    print_banner();

    let threads = allocated_cpus(&config);
    info!("Job file: {}", config.job_path);

    // Create and configure the runner
    let mut runner = JobRunner::new(params);
    runner.set_threads(threads);
    runner.set_dry_run(config.dry_run);
    runner.set_keep_workdir(config.keep_workdir);

    if config.dry_run {
        info!("Mode: DRY RUN (commands will not execute)");
        println!();
    }

    // Execute the job
    let report = runner.run()?;

    // Print summary
    println!();
    if report.published {
        println!("{}", "Job completed successfully".green());
    } else {
        println!("{}", "Job completed (results not published)".yellow());
    }
    println!("Result folder: {}", report.result_folder);
    println!("Total execution time: {:.2?}", report.elapsed);

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
