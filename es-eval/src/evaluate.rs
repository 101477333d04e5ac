//! Measurement log evaluation

// Imports
use {
	crate::{
		log::{LogError, MeasurementLog},
		stats,
		strategy::StrategyName,
	},
	anyhow::Context,
	std::{
		fs,
		path::{Path, PathBuf},
	},
};

/// Result of evaluating a measurement log
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct EvaluationResult {
	/// Strategy name
	pub strategy: String,

	// Strategy fields, parsed back from the name
	pub number_of_addresses:         u32,
	pub accesses_in_loop:            u32,
	pub different_addresses_in_loop: u32,
	pub step_size:                   u32,
	pub mirroring:                   bool,

	/// Percentage of measurements above the miss threshold
	pub rate: f64,

	/// Mean runtime
	pub average_runtime: f64,

	/// Mean runtime, without the per-run overhead
	pub corrected_runtime: f64,

	/// Runs per batch
	pub batch_size: f64,

	/// Per-run overhead
	pub overhead: f64,

	/// Number of miss measurements the rate was computed from
	pub samples: usize,
}

/// Evaluates the measurement log at `path`.
///
/// The strategy is parsed from the file name.
pub fn evaluate(path: &Path, threshold: f64) -> Result<EvaluationResult, LogError> {
	let name = path
		.file_stem()
		.map(|name| name.to_string_lossy())
		.unwrap_or_default()
		.parse::<StrategyName>()
		.map_err(LogError::FileName)?;
	let log = MeasurementLog::from_path(path)?;

	self::evaluate_log(&name, &log, threshold)
}

/// Evaluates a measurement log of strategy `name`.
///
/// Every column is filtered of outliers independently, see [`stats::reject_outliers`].
/// The batch size is the ratio of the *unfiltered* miss and batch counts, while
/// the runtimes are the means of the filtered values.
pub fn evaluate_log(name: &StrategyName, log: &MeasurementLog, threshold: f64) -> Result<EvaluationResult, LogError> {
	let present = |column: &[Option<f64>]| column.iter().flatten().copied().collect::<Vec<_>>();
	let miss = present(&log.miss);
	let runtime = present(&log.runtime);
	let runtime_batch = present(&log.runtime_batch);

	if runtime_batch.is_empty() {
		return Err(LogError::Empty(MeasurementLog::RUNTIME_BATCH));
	}
	let batch_size = miss.len() as f64 / runtime_batch.len() as f64;

	let miss = stats::reject_outliers(&miss);
	let runtime = stats::reject_outliers(&runtime);
	let runtime_batch = stats::reject_outliers(&runtime_batch);

	if miss.is_empty() {
		return Err(LogError::Empty(MeasurementLog::MISS));
	}
	let misses = miss.iter().filter(|&&miss| miss > threshold).count();
	let rate = misses as f64 / miss.len() as f64 * 100.0;

	let average_runtime = stats::mean(&runtime).ok_or(LogError::Empty(MeasurementLog::RUNTIME))?;
	let average_runtime_batch = stats::mean(&runtime_batch).ok_or(LogError::Empty(MeasurementLog::RUNTIME_BATCH))?;
	let overhead = average_runtime - average_runtime_batch / batch_size;
	let corrected_runtime = average_runtime - overhead;

	Ok(EvaluationResult {
		strategy: name.to_string(),
		number_of_addresses: name.number_of_addresses,
		accesses_in_loop: name.accesses_in_loop,
		different_addresses_in_loop: name.different_addresses_in_loop,
		step_size: name.step_size,
		mirroring: name.mirroring,
		rate,
		average_runtime,
		corrected_runtime,
		batch_size,
		overhead,
		samples: miss.len(),
	})
}

/// Evaluation of every log in a directory
#[derive(Debug, Default)]
pub struct DirectoryEvaluation {
	/// Results, sorted by strategy name
	pub results: Vec<EvaluationResult>,

	/// Logs that couldn't be evaluated
	pub skipped: Vec<(PathBuf, anyhow::Error)>,
}

/// Evaluates every `*.log` file in `dir`.
///
/// Logs that can't be evaluated are reported and skipped.
pub fn evaluate_dir(dir: &Path, threshold: f64) -> Result<DirectoryEvaluation, anyhow::Error> {
	let mut paths = fs::read_dir(dir)
		.with_context(|| format!("Unable to read directory {dir:?}"))?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<Result<Vec<_>, _>>()
		.with_context(|| format!("Unable to read directory {dir:?}"))?;
	paths.retain(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"));
	paths.sort();

	let mut evaluation = DirectoryEvaluation::default();
	for path in paths {
		match self::evaluate(&path, threshold) {
			Ok(result) => evaluation.results.push(result),
			Err(err) => {
				let err = anyhow::Error::from(err);
				tracing::warn!(?path, "Skipping log: {err:#}");
				evaluation.skipped.push((path, err));
			},
		}
	}
	evaluation
		.results
		.sort_by(|lhs, rhs| lhs.strategy.cmp(&rhs.strategy));

	Ok(evaluation)
}

#[cfg(test)]
mod tests {
	use {super::*, crate::test_util::SAMPLE_LOG};

	fn name(s: &str) -> StrategyName {
		s.parse().expect("Name is valid")
	}

	fn log(miss: &[f64], runtime: &[f64], runtime_batch: &[f64]) -> MeasurementLog {
		let column = |values: &[f64]| values.iter().copied().map(Some).collect();
		MeasurementLog {
			miss:          column(miss),
			runtime:       column(runtime),
			runtime_batch: column(runtime_batch),
		}
	}

	#[test]
	fn rate_of_six_samples() {
		let log = MeasurementLog::from_reader(SAMPLE_LOG.as_bytes()).expect("Log is valid");
		let result = evaluate_log(&name("5-1-2-1-m"), &log, 5.0).expect("Evaluation should succeed");

		// Note: With 6 samples, no value can be 3 standard deviations away from the mean
		assert_eq!(result.samples, 6);
		assert!((result.rate - 4.0 / 6.0 * 100.0).abs() < 1e-9);
	}

	#[test]
	fn outlier_is_excluded_from_rate() {
		let mut miss = vec![0.0; 10];
		miss.extend([10.0; 10]);
		miss.push(10_000.0);
		let log = log(&miss, &[1.0], &[1.0]);

		let result = evaluate_log(&name("5-1-2-1-m"), &log, 5.0).expect("Evaluation should succeed");
		assert_eq!(result.samples, 20);
		assert_eq!(result.rate, 50.0);
	}

	#[test]
	fn runtime_is_corrected_by_batch_runtime() {
		let log = MeasurementLog::from_reader(SAMPLE_LOG.as_bytes()).expect("Log is valid");
		let result = evaluate_log(&name("5-1-2-1-M"), &log, 5.0).expect("Evaluation should succeed");

		// 6 runs over 3 batches of 300
		assert_eq!(result.batch_size, 2.0);
		assert_eq!(result.average_runtime, 100.0);
		assert_eq!(result.overhead, -50.0);
		assert_eq!(result.corrected_runtime, 150.0);
		assert!(result.mirroring);
	}

	#[test]
	fn batch_size_uses_unfiltered_counts() {
		let mut runtime_batch = vec![20.0; 20];
		runtime_batch.push(100_000.0);
		let log = log(&[0.0; 42], &[12.0; 42], &runtime_batch);

		let result = evaluate_log(&name("5-1-2-1-m"), &log, 5.0).expect("Evaluation should succeed");
		assert_eq!(result.batch_size, 2.0);
		assert_eq!(result.corrected_runtime, 10.0);
		assert_eq!(result.overhead, 2.0);
	}

	#[test]
	fn log_without_batches_is_rejected() {
		let log = log(&[1.0], &[1.0], &[]);
		let err = evaluate_log(&name("5-1-2-1-m"), &log, 5.0).expect_err("Evaluation should fail");
		assert!(matches!(err, LogError::Empty("RuntimeBatch")));
	}

	#[test]
	fn file_name_must_be_a_strategy_name() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		for file_name in ["5-1-2-m.log", "5-1-2-1-1-m.log", "5-1-2-1-x.log"] {
			let path = dir.path().join(file_name);
			fs::write(&path, SAMPLE_LOG).expect("Unable to write log");
			let err = evaluate(&path, 5.0).expect_err("Evaluation should fail");
			assert!(matches!(err, LogError::FileName(_)), "{file_name} should be rejected");
		}

		let path = dir.path().join("22-2-5-3-M.log");
		fs::write(&path, SAMPLE_LOG).expect("Unable to write log");
		let result = evaluate(&path, 5.0).expect("Evaluation should succeed");
		assert_eq!(
			(
				result.number_of_addresses,
				result.accesses_in_loop,
				result.different_addresses_in_loop,
				result.step_size,
				result.mirroring
			),
			(22, 2, 5, 3, true)
		);
	}

	#[test]
	fn directory_skips_bad_logs() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		for file_name in ["9-1-2-1-m.log", "10-1-2-1-m.log", "5-1-2-1-M.log"] {
			fs::write(dir.path().join(file_name), SAMPLE_LOG).expect("Unable to write log");
		}
		fs::write(dir.path().join("6-1-2-1-m.log"), "Miss,Runtime\n1,2\n").expect("Unable to write log");
		fs::write(dir.path().join("not-a-name.log"), SAMPLE_LOG).expect("Unable to write log");
		fs::write(dir.path().join("7-1-2-1-m.txt"), SAMPLE_LOG).expect("Unable to write log");

		let evaluation = evaluate_dir(dir.path(), 5.0).expect("Directory should be readable");
		let strategies = evaluation
			.results
			.iter()
			.map(|result| result.strategy.as_str())
			.collect::<Vec<_>>();
		assert_eq!(strategies, ["10-1-2-1-m", "5-1-2-1-M", "9-1-2-1-m"]);
		assert_eq!(evaluation.skipped.len(), 2);
	}
}
