//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Configuration file
	#[clap(short = 'c', long = "config")]
	pub config_file: PathBuf,

	/// Device configuration file
	#[clap(short = 'x', long = "device-config")]
	pub device_config_file: PathBuf,

	/// Ignore cached executables and logs
	#[clap(short = 'f', long = "force")]
	pub force: bool,

	/// Verbosity.
	///
	/// Ignored for stderr if `RUST_LOG` is set.
	#[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
	pub verbosity: u8,

	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Sub-command
	#[command(subcommand)]
	pub sub_cmd: SubCmd,
}

/// Sub-command
#[derive(Debug, clap::Subcommand)]
pub enum SubCmd {
	#[clap(name = "run-strategy")]
	RunStrategy(RunStrategy),

	#[clap(name = "run-strategies")]
	RunStrategies(RunStrategies),

	#[clap(name = "evaluate-strategy")]
	EvaluateStrategy(EvaluateStrategy),

	#[clap(name = "evaluate-strategies")]
	EvaluateStrategies(EvaluateStrategies),
}

/// Builds, runs and evaluates a single strategy
#[derive(Debug, clap::Args)]
pub struct RunStrategy {
	/// Eviction counter
	#[clap(short = 'e', long = "eviction-counter")]
	pub eviction_counter: u32,

	/// Number of accesses in loop
	#[clap(short = 'a', long = "accesses-in-loop")]
	pub accesses_in_loop: u32,

	/// Different addresses in loop
	#[clap(short = 'd', long = "different-addresses-in-loop")]
	pub different_addresses_in_loop: u32,

	/// Step size
	#[clap(short = 's', long = "step-size", default_value_t = 1)]
	pub step_size: u32,

	/// Mirror the access pattern
	#[clap(short = 'm', long = "mirroring")]
	pub mirroring: bool,

	/// Number of runs
	#[clap(short = 'n', long = "number-of-runs", default_value_t = 10000)]
	pub number_of_runs: u64,

	/// Miss threshold.
	///
	/// Defaults to the device threshold.
	#[clap(short = 't', long = "threshold")]
	pub threshold: Option<i64>,
}

/// Builds and runs every strategy up to the given bounds
#[derive(Debug, clap::Args)]
pub struct RunStrategies {
	/// Maximum eviction counter
	#[clap(short = 'e', long = "eviction-counter")]
	pub max_eviction_counter: u32,

	/// Maximum number of accesses in loop
	#[clap(short = 'a', long = "accesses-in-loop")]
	pub max_accesses_in_loop: u32,

	/// Maximum different addresses in loop
	#[clap(short = 'd', long = "different-addresses-in-loop")]
	pub max_different_addresses_in_loop: u32,

	/// Maximum step size
	#[clap(short = 's', long = "step-size", default_value_t = 1)]
	pub max_step_size: u32,

	/// Also run the mirrored version of every strategy
	#[clap(short = 'm', long = "with-mirroring")]
	pub with_mirroring: bool,

	/// Number of runs
	#[clap(short = 'n', long = "number-of-runs", default_value_t = 10000)]
	pub number_of_runs: u64,

	/// Stop on the first failing strategy
	#[clap(long = "fail-fast")]
	pub fail_fast: bool,
}

/// Evaluates a single measurement log
#[derive(Debug, clap::Args)]
pub struct EvaluateStrategy {
	/// Log file
	pub log_file: PathBuf,

	/// Miss threshold
	#[clap(short = 't', long = "threshold")]
	pub threshold: i64,

	/// Json output
	#[clap(short = 'o', long = "output")]
	pub output_file: Option<PathBuf>,
}

/// Evaluates every measurement log in a directory
#[derive(Debug, clap::Args)]
pub struct EvaluateStrategies {
	/// Log directory
	pub log_dir: PathBuf,

	/// Miss threshold
	#[clap(short = 't', long = "threshold")]
	pub threshold: i64,

	/// Csv output
	#[clap(long = "csv", default_value = "strategies.csv")]
	pub csv_file: PathBuf,

	/// Database output
	#[clap(long = "db", default_value = "strategies.db")]
	pub db_file: PathBuf,

	/// Json output
	#[clap(long = "json")]
	pub json_file: Option<PathBuf>,
}
