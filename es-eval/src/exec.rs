//! Execution dispatch

// Imports
use {
	crate::{
		adb::Adb,
		cache::{self, CacheStatus},
		command::{Invocation, Runner},
		config::Config,
		device::{Device, RemoteTarget, Target},
		strategy::Strategy,
	},
	anyhow::Context,
	std::{
		fs,
		io,
		path::{Path, PathBuf},
	},
};

/// Runs strategy executables on a device and collects their logs
#[derive(Clone, Copy, Debug)]
pub struct Executor<'a> {
	/// Configuration
	config: &'a Config,

	/// Device
	device: &'a Device,
}

impl<'a> Executor<'a> {
	/// Creates a new executor
	pub fn new(config: &'a Config, device: &'a Device) -> Self {
		Self { config, device }
	}

	/// Returns the log path of `strategy`
	pub fn log_path(&self, strategy: &Strategy) -> PathBuf {
		strategy.cache_key(self.device).log_path(&self.config.log_dir)
	}

	/// Runs `executable` `number_of_runs` times and returns the log path.
	///
	/// Execution is skipped if the log already exists, unless `force` is set.
	/// The log is first written to a temporary path and only moved into place
	/// once every step succeeded.
	pub fn run(
		&self,
		runner: &mut impl Runner,
		strategy: &Strategy,
		executable: &Path,
		number_of_runs: u64,
		force: bool,
	) -> Result<RunOutput, anyhow::Error> {
		let log_path = self.log_path(strategy);
		if let Some(log_dir) = log_path.parent() {
			fs::create_dir_all(log_dir).with_context(|| format!("Unable to create log directory {log_dir:?}"))?;
		}

		if cache::is_reusable(&log_path, force) {
			tracing::info!("Strategy log already exists");
			return Ok(RunOutput {
				log_path,
				status: CacheStatus::Reused,
			});
		}

		let partial_path = self::partial_path(&log_path);
		self::remove_if_exists(&partial_path).context("Unable to remove stale partial log")?;

		let res = match &self.device.target {
			Target::Local => self.run_local(runner, executable, &partial_path, number_of_runs),
			Target::Remote(remote) => self.run_remote(runner, remote, strategy, executable, &partial_path, number_of_runs),
		};
		let res = res.and_then(|()| {
			anyhow::ensure!(partial_path.is_file(), "Executable did not produce a log");
			fs::rename(&partial_path, &log_path)
				.with_context(|| format!("Unable to move log {partial_path:?} to {log_path:?}"))
		});

		if let Err(err) = res {
			if let Err(remove_err) = self::remove_if_exists(&partial_path) {
				tracing::warn!(?partial_path, %remove_err, "Unable to remove partial log");
			}
			return Err(err);
		}

		Ok(RunOutput {
			log_path,
			status: CacheStatus::Produced,
		})
	}

	/// Runs the executable on this host
	fn run_local(
		&self,
		runner: &mut impl Runner,
		executable: &Path,
		log_path: &Path,
		number_of_runs: u64,
	) -> Result<(), anyhow::Error> {
		tracing::info!("Running measurements");
		let invocation = Invocation::new(executable)
			.arg("-n")
			.arg(number_of_runs.to_string())
			.arg(log_path)
			.timeout(self.config.execution_timeout);
		runner.run(&invocation).context("Unable to run executable")?;

		Ok(())
	}

	/// Runs the executable on a remote device.
	///
	/// Remote artifacts are removed afterwards, whether the run succeeded or not.
	fn run_remote(
		&self,
		runner: &mut impl Runner,
		remote: &RemoteTarget,
		strategy: &Strategy,
		executable: &Path,
		log_path: &Path,
		number_of_runs: u64,
	) -> Result<(), anyhow::Error> {
		let adb = Adb::new(&self.config.adb, &remote.adb_id, self.config.execution_timeout);
		let remote_executable = remote.executable_path(strategy.name());
		let remote_log = remote.log_path(&strategy.cache_key(self.device).log_file_name());

		let res = self::run_remote_steps(
			runner,
			&adb,
			executable,
			&remote_executable,
			&remote_log,
			log_path,
			number_of_runs,
		);

		// Note: Cleanup also runs after an interrupt, bounded by the execution timeout
		tracing::info!("Cleaning up");
		for remote_path in [&remote_executable, &remote_log] {
			if let Err(err) = runner.run(&adb.su(&format!("rm -f {remote_path}")).uninterruptible()) {
				tracing::warn!(%remote_path, %err, "Unable to remove remote file");
			}
		}

		res
	}
}

/// Uploads, runs and fetches the log of the executable on a remote device
fn run_remote_steps(
	runner: &mut impl Runner,
	adb: &Adb<'_>,
	executable: &Path,
	remote_executable: &str,
	remote_log: &str,
	log_path: &Path,
	number_of_runs: u64,
) -> Result<(), anyhow::Error> {
	tracing::info!("Uploading executable");
	runner
		.run(&adb.push(executable, remote_executable))
		.context("Unable to upload executable")?;
	runner
		.run(&adb.su(&format!("chmod 777 {remote_executable}")))
		.context("Unable to make executable runnable")?;

	tracing::info!("Running measurements");
	runner
		.run(&adb.su(&format!("{remote_executable} -n {number_of_runs} -c 0 {remote_log}")))
		.context("Unable to run executable")?;
	runner
		.run(&adb.su(&format!("chmod 777 {remote_log}")))
		.context("Unable to make log readable")?;

	tracing::info!("Fetching results");
	runner
		.run(&adb.pull(remote_log, log_path))
		.context("Unable to fetch log")?;

	Ok(())
}

/// Output of [`Executor::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Log path
	pub log_path: PathBuf,

	/// Whether the log was produced by this run
	pub status: CacheStatus,
}

/// Returns the temporary path a log is written to before it's complete
fn partial_path(log_path: &Path) -> PathBuf {
	let mut path = log_path.as_os_str().to_owned();
	path.push(".partial");
	PathBuf::from(path)
}

/// Removes a file, ignoring it if it doesn't exist
fn remove_if_exists(path: &Path) -> Result<(), io::Error> {
	match fs::remove_file(path) {
		Ok(()) => Ok(()),
		Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(err) => Err(err),
	}
}
