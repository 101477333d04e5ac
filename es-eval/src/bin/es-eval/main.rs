//! Eviction strategy evaluator (`es-eval`)

// Modules
mod args;

// Imports
use {
	self::args::{Args, SubCmd},
	anyhow::Context,
	clap::Parser,
	es_eval::{
		evaluate::{self, EvaluationResult},
		report,
		Config,
		Device,
		Interrupt,
		Pipeline,
		Strategy,
		StrategyParams,
		Sweep,
		SystemRunner,
	},
	es_eval_util::logger,
	std::fs,
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append, args.verbosity);

	// Read the configuration
	let config = Config::from_file(&args.config_file).context("Unable to load configuration")?;
	let device = Device::from_file(&args.device_config_file).context("Unable to load device configuration")?;
	tracing::debug!(?config, ?device, "Loaded configuration");

	// Stop running commands on ctrl-c, letting cleanup finish
	let interrupt = Interrupt::default();
	ctrlc::set_handler({
		let interrupt = interrupt.clone();
		move || {
			tracing::warn!("Interrupted, stopping");
			interrupt.trigger();
		}
	})
	.context("Unable to install interrupt handler")?;

	match args.sub_cmd {
		SubCmd::RunStrategy(cmd_args) => {
			let strategy = Strategy::new(StrategyParams {
				eviction_counter:            cmd_args.eviction_counter,
				accesses_in_loop:            cmd_args.accesses_in_loop,
				different_addresses_in_loop: cmd_args.different_addresses_in_loop,
				step_size:                   cmd_args.step_size,
				mirroring:                   cmd_args.mirroring,
			})
			.context("Invalid strategy")?;

			let mut pipeline = Pipeline::new(&config, &device, SystemRunner::new(interrupt.clone()), args.force);
			let output = pipeline.run_strategy(&strategy, cmd_args.number_of_runs)?;

			match cmd_args.threshold.or(device.threshold) {
				Some(threshold) => {
					let result = evaluate::evaluate(&output.log_path, threshold as f64)
						.with_context(|| format!("Unable to evaluate {:?}", output.log_path))?;
					self::log_result(&result);
				},
				None => tracing::warn!("No threshold given and the device has none, skipping evaluation"),
			}
		},

		SubCmd::RunStrategies(cmd_args) => {
			let sweep = Sweep {
				max_eviction_counter:            cmd_args.max_eviction_counter,
				max_accesses_in_loop:            cmd_args.max_accesses_in_loop,
				max_different_addresses_in_loop: cmd_args.max_different_addresses_in_loop,
				max_step_size:                   cmd_args.max_step_size,
				with_mirroring:                  cmd_args.with_mirroring,
			};

			let mut pipeline = Pipeline::new(&config, &device, SystemRunner::new(interrupt.clone()), args.force);
			let summary = pipeline.run_sweep(&sweep, cmd_args.number_of_runs, cmd_args.fail_fast)?;
			if !summary.failed.is_empty() {
				for (strategy, err) in &summary.failed {
					tracing::error!("Strategy {strategy} failed: {err:#}");
				}
				anyhow::bail!(
					"{} of {} strategies failed",
					summary.failed.len(),
					summary.failed.len() + summary.succeeded.len()
				);
			}
		},

		SubCmd::EvaluateStrategy(cmd_args) => {
			let result = evaluate::evaluate(&cmd_args.log_file, cmd_args.threshold as f64)
				.with_context(|| format!("Unable to evaluate {:?}", cmd_args.log_file))?;
			self::log_result(&result);

			if let Some(output_file) = &cmd_args.output_file {
				let output = serde_json::to_string_pretty(&result).context("Unable to serialize result")?;
				fs::write(output_file, output).with_context(|| format!("Unable to write {output_file:?}"))?;
			}
		},

		SubCmd::EvaluateStrategies(cmd_args) => {
			let evaluation = evaluate::evaluate_dir(&cmd_args.log_dir, cmd_args.threshold as f64)?;
			tracing::info!(
				evaluated = evaluation.results.len(),
				skipped = evaluation.skipped.len(),
				"Evaluated logs"
			);

			report::write_csv_file(&cmd_args.csv_file, &evaluation.results).context("Unable to write csv report")?;
			report::write_sqlite(&cmd_args.db_file, &evaluation.results).context("Unable to write database report")?;
			if let Some(json_file) = &cmd_args.json_file {
				report::write_json(json_file, &evaluation.results).context("Unable to write json report")?;
			}
		},
	}

	Ok(())
}

/// Logs the headline numbers of an evaluation
fn log_result(result: &EvaluationResult) {
	tracing::info!(
		strategy = %result.strategy,
		samples = result.samples,
		"Rate: {:.2}%, Average runtime: {:.2}, Corrected runtime: {:.2}",
		result.rate,
		result.average_runtime,
		result.corrected_runtime,
	);
}
