//! Strategy pipeline

// Imports
use {
	crate::{
		build::Builder,
		cache::CacheStatus,
		command::{CommandError, Runner},
		config::Config,
		device::Device,
		exec::Executor,
		strategy::Strategy,
		sweep::Sweep,
	},
	anyhow::Context,
	std::path::PathBuf,
};

/// Builds and runs strategies on a device
#[derive(Debug)]
pub struct Pipeline<'a, R> {
	/// Builder
	builder: Builder<'a>,

	/// Executor
	executor: Executor<'a>,

	/// Command runner
	runner: R,

	/// Whether to ignore cached artifacts
	force: bool,
}

impl<'a, R: Runner> Pipeline<'a, R> {
	/// Creates a new pipeline
	pub fn new(config: &'a Config, device: &'a Device, runner: R, force: bool) -> Self {
		Self {
			builder: Builder::new(config, device),
			executor: Executor::new(config, device),
			runner,
			force,
		}
	}

	/// Builds `strategy` and runs it `number_of_runs` times
	pub fn run_strategy(&mut self, strategy: &Strategy, number_of_runs: u64) -> Result<StrategyOutput, anyhow::Error> {
		let _span = tracing::info_span!("strategy", name = %strategy).entered();

		let build = self
			.builder
			.ensure_built(&mut self.runner, strategy, self.force)
			.with_context(|| format!("Unable to build strategy {strategy}"))?;
		let run = self
			.executor
			.run(&mut self.runner, strategy, &build.executable, number_of_runs, self.force)
			.with_context(|| format!("Unable to run strategy {strategy}"))?;

		Ok(StrategyOutput {
			executable:   build.executable,
			build_status: build.status,
			log_path:     run.log_path,
			run_status:   run.status,
		})
	}

	/// Builds and runs every strategy of `sweep`.
	///
	/// A failing strategy is reported and the sweep continues, unless `fail_fast` is set.
	/// An interrupted strategy always stops the sweep.
	pub fn run_sweep(&mut self, sweep: &Sweep, number_of_runs: u64, fail_fast: bool) -> Result<SweepSummary, anyhow::Error> {
		let mut summary = SweepSummary::default();
		for strategy in sweep.strategies() {
			match self.run_strategy(&strategy, number_of_runs) {
				Ok(output) => summary.succeeded.push(output),
				Err(err) if fail_fast || CommandError::is_interrupt(&err) => return Err(err),
				Err(err) => {
					tracing::warn!("Strategy failed: {err:#}");
					summary.failed.push((strategy.name().to_owned(), err));
				},
			}
		}

		tracing::info!(
			succeeded = summary.succeeded.len(),
			failed = summary.failed.len(),
			"Finished sweep"
		);

		Ok(summary)
	}
}

/// Output of [`Pipeline::run_strategy`]
#[derive(Clone, Debug)]
pub struct StrategyOutput {
	/// Executable path
	pub executable: PathBuf,

	/// Whether the executable was built
	pub build_status: CacheStatus,

	/// Log path
	pub log_path: PathBuf,

	/// Whether the log was produced
	pub run_status: CacheStatus,
}

/// Summary of [`Pipeline::run_sweep`]
#[derive(Debug, Default)]
pub struct SweepSummary {
	/// Strategies that were built and run
	pub succeeded: Vec<StrategyOutput>,

	/// Strategies that failed, by name
	pub failed: Vec<(String, anyhow::Error)>,
}
