//! Analysis Runner Entry Point
//!
//! Invoked by the job wrapper with the staged directories and the job
//! descriptor:
//!
//! ```bash
//! run-treesort -i <input_dir> -j <job_file> -s <staging_dir> -w <work_dir>
//! ```
//!
//! Prepares the FASTA input, builds the per-segment dataset, and runs the
//! TreeSort CLI. Any failure exits non-zero, which the wrapper treats as a
//! fatal job error.

use std::env;
use std::process::ExitCode;

use log::info;

use treesort_runner::job::load_params;
use treesort_runner::treesort::{TreeSortRunner, DEFAULT_BASE_URL};
use treesort_runner::{APP_NAME, VERSION};

/// Environment variable naming the platform base URL.
const BASE_URL_ENV: &str = "P3_BASE_URL";

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    input_dir: String,
    job_path: String,
    staging_dir: String,
    work_dir: String,
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

/// Prints usage information.
fn print_usage() {
    println!("Usage: run-treesort -i <INPUT_DIR> -j <JOB_FILE> -s <STAGING_DIR> -w <WORK_DIR>");
    println!();
    println!("Options:");
    println!("  -i, --input-directory DIR    Directory containing the FASTA input file(s)");
    println!("  -j, --job-filename FILE      JSON file with the job description");
    println!("  -s, --staging-directory DIR  Directory where output files are created");
    println!("  -w, --work-directory DIR     Directory for generated intermediate files");
    println!("  --verbose                    Enable debug logging");
    println!("  --help                       Show this help message");
    println!("  --version                    Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    let take_value = |i: &mut usize, name: &str| -> Result<String, String> {
        *i += 1;
        if *i >= args.len() {
            return Err(format!("{} requires a value", name));
        }
        Ok(args[*i].clone())
    };

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "-i" | "--input-directory" => {
                config.input_dir = take_value(&mut i, "-i")?;
            }
            "-j" | "--job-filename" => {
                config.job_path = take_value(&mut i, "-j")?;
            }
            "-s" | "--staging-directory" => {
                config.staging_dir = take_value(&mut i, "-s")?;
            }
            "-w" | "--work-directory" => {
                config.work_dir = take_value(&mut i, "-w")?;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}", arg));
            }
        }
        i += 1;
    }

    for (value, name) in [
        (&config.input_dir, "input directory (-i)"),
        (&config.job_path, "job filename (-j)"),
        (&config.staging_dir, "staging directory (-s)"),
        (&config.work_dir, "work directory (-w)"),
    ] {
        if value.trim().is_empty() {
            return Err(format!("The {} parameter is required", name));
        }
    }

    Ok(config)
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    info!("{} analysis runner v{}", APP_NAME, VERSION);

    let params = load_params(&config.job_path)?;

    let mut runner = TreeSortRunner::new(
        params,
        config.input_dir.trim(),
        config.staging_dir.trim(),
        config.work_dir.trim(),
    )?;

    let base_url = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    runner.set_base_url(base_url);

    runner.run()?;

    info!("Analysis completed successfully");
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
