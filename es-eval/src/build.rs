//! Build orchestration

// Imports
use {
	crate::{
		cache::{self, CacheStatus},
		command::{Invocation, Runner},
		config::Config,
		device::Device,
		header,
		strategy::Strategy,
	},
	anyhow::Context,
	std::{
		fs,
		path::{Path, PathBuf},
	},
};

/// Builds strategy executables for a device
#[derive(Clone, Copy, Debug)]
pub struct Builder<'a> {
	/// Configuration
	config: &'a Config,

	/// Device
	device: &'a Device,
}

impl<'a> Builder<'a> {
	/// Creates a new builder
	pub fn new(config: &'a Config, device: &'a Device) -> Self {
		Self { config, device }
	}

	/// Returns the build directory of `strategy`
	pub fn build_dir(&self, strategy: &Strategy) -> PathBuf {
		strategy.cache_key(self.device).build_dir(&self.config.build_dir)
	}

	/// Returns the path of the executable of `strategy`
	pub fn executable_path(&self, strategy: &Strategy) -> PathBuf {
		self::executable_path(&self.build_dir(strategy))
	}

	/// Ensures the executable of `strategy` is built and returns its path.
	///
	/// The configuration header is always regenerated, but the native build
	/// is skipped if the executable already exists, unless `force` is set.
	pub fn ensure_built(&self, runner: &mut impl Runner, strategy: &Strategy, force: bool) -> Result<BuildOutput, anyhow::Error> {
		let build_dir = self.build_dir(strategy);
		fs::create_dir_all(&build_dir).with_context(|| format!("Unable to create build directory {build_dir:?}"))?;

		let header_path = build_dir.join("strategy.h");
		let header = header::render(self.device, strategy).context("Unable to render strategy header")?;
		if header::write_if_changed(&header_path, &header).context("Unable to write strategy header")? {
			tracing::debug!(?header_path, "Wrote strategy header");
		}

		let executable = self::executable_path(&build_dir);
		if cache::is_reusable(&executable, force) {
			tracing::info!("Executable has already been built");
			return Ok(BuildOutput {
				executable,
				status: CacheStatus::Reused,
			});
		}

		let dirs = BuildDirs::new(&build_dir)?;
		self.build_libflush(runner, &dirs, &header_path)
			.context("Unable to build libflush")?;
		self.build_executable(runner, &dirs)
			.context("Unable to build executable")?;

		anyhow::ensure!(
			executable.is_file(),
			"Build succeeded, but the executable {executable:?} doesn't exist"
		);

		Ok(BuildOutput {
			executable,
			status: CacheStatus::Produced,
		})
	}

	/// Builds the eviction library against the strategy header
	fn build_libflush(&self, runner: &mut impl Runner, dirs: &BuildDirs, header_path: &Path) -> Result<(), anyhow::Error> {
		tracing::info!("Building libflush...");

		let invocation = Invocation::new(&self.config.build_tool)
			.arg("-C")
			.arg(&self.config.libflush_source_dir)
			.var("ARCH", &self.device.arch)
			.var("BUILDDIR", &dirs.libflush)
			.var("DEPENDDIR", &dirs.depend)
			.var("DEVICE_CONFIGURATION", header_path)
			.var("USE_EVICTION", "1")
			.timeout(self.config.build_timeout);

		runner.run(&invocation.clone().arg("clean"))?;
		runner.run(&invocation)?;

		Ok(())
	}

	/// Builds the measurement executable, linking the library
	fn build_executable(&self, runner: &mut impl Runner, dirs: &BuildDirs) -> Result<(), anyhow::Error> {
		tracing::info!("Building executable...");

		let invocation = Invocation::new(&self.config.build_tool)
			.arg("-C")
			.arg(&self.config.executable_source_dir)
			.var("LIBFLUSH_SOURCE", &self.config.libflush_source_dir)
			.var("LIBFLUSH_INC", &self.config.libflush_source_dir)
			.var("LIBFLUSH_BUILDDIR", &dirs.libflush)
			.var("DEPENDDIR", &dirs.depend)
			.var("ARCH", &self.device.arch)
			.var("BUILDDIR", &dirs.executable)
			.timeout(self.config.build_timeout);

		runner.run(&invocation.clone().arg("clean"))?;
		runner.run(&invocation)?;

		Ok(())
	}
}

/// Output of [`Builder::ensure_built`]
#[derive(Clone, Debug)]
pub struct BuildOutput {
	/// Executable path
	pub executable: PathBuf,

	/// Whether the executable was rebuilt
	pub status: CacheStatus,
}

/// Intermediate directories of a build
#[derive(Debug)]
struct BuildDirs {
	libflush:   PathBuf,
	executable: PathBuf,
	depend:     PathBuf,
}

impl BuildDirs {
	/// Creates all intermediate directories inside `build_dir`
	fn new(build_dir: &Path) -> Result<Self, anyhow::Error> {
		let dirs = Self {
			libflush:   build_dir.join("libflush"),
			executable: build_dir.join("executable"),
			depend:     build_dir.join(".depend"),
		};
		for dir in [&dirs.libflush, &dirs.executable, &dirs.depend] {
			fs::create_dir_all(dir).with_context(|| format!("Unable to create {dir:?}"))?;
		}

		Ok(dirs)
	}
}

/// Returns the executable path inside `build_dir`
fn executable_path(build_dir: &Path) -> PathBuf {
	build_dir.join("executable").join("release").join("bin").join("executable")
}
