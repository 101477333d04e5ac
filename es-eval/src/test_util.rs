//! Test helpers

// Imports
use {
	crate::{
		command::{CommandError, Invocation, Runner},
		config::Config,
		device::{CacheGeometry, Device, RemoteTarget, Target},
	},
	itertools::Itertools,
	std::{
		ffi::{OsStr, OsString},
		fs,
		path::{Path, PathBuf},
		time::Duration,
	},
};

/// A measurement log, as written by the measurement executable
pub const SAMPLE_LOG: &str = "\
Miss,Runtime,RuntimeBatch
0,100,300
0,100,300
10,100,300
10,100,
10,100,
1000,100,
";

/// Returns a configuration rooted at `root`
pub fn config(root: &Path) -> Config {
	Config {
		libflush_source_dir:   root.join("libflush-src"),
		executable_source_dir: root.join("executable-src"),
		build_dir:             root.join("build"),
		build_tool:            "make".to_owned(),
		build_timeout:         Duration::from_secs(60),
		log_dir:               root.join("logs"),
		execution_timeout:     Duration::from_secs(60),
		adb:                   "adb".to_owned(),
	}
}

/// Returns a device running on this host
pub fn local_device() -> Device {
	Device {
		name:      Some("Test device".to_owned()),
		codename:  "test-device".to_owned(),
		arch:      "x86".to_owned(),
		threshold: Some(5),
		target:    Target::Local,
		cache:     CacheGeometry::new(512, 64).expect("Cache geometry is valid"),
	}
}

/// Returns a device reached through the transport
pub fn remote_device() -> Device {
	Device {
		target: Target::Remote(RemoteTarget {
			adb_id:         "serial".to_owned(),
			executable_dir: "/data/local/tmp".to_owned(),
			log_dir:        "/data/local/tmp".to_owned(),
		}),
		..self::local_device()
	}
}

/// Runner that records every invocation instead of spawning it.
///
/// Invocations are recorded with their arguments joined by spaces, unquoted.
pub struct RecordingRunner {
	/// Every invocation
	commands: Vec<String>,

	/// Whether to simulate the side effects of the toolchain and the executable
	simulate: bool,

	/// Invocations matching this fail
	fail_when: Option<Box<dyn Fn(&str) -> bool>>,

	/// Invocations matching this trigger an interrupt
	interrupt_when: Option<Box<dyn Fn(&str) -> bool>>,

	/// Whether an interrupt was triggered
	interrupted: bool,
}

impl RecordingRunner {
	/// Creates a runner where every invocation succeeds without side effects
	pub fn new() -> Self {
		Self {
			commands:       vec![],
			simulate:       false,
			fail_when:      None,
			interrupt_when: None,
			interrupted:    false,
		}
	}

	/// Creates a runner that produces the executable and the log like the real tools would
	pub fn simulating_tools() -> Self {
		Self {
			simulate: true,
			..Self::new()
		}
	}

	/// Like [`Self::simulating_tools`], but every invocation matching `fail_when` fails
	pub fn failing_when(fail_when: impl Fn(&str) -> bool + 'static) -> Self {
		Self {
			fail_when: Some(Box::new(fail_when)),
			..Self::simulating_tools()
		}
	}

	/// Like [`Self::simulating_tools`], but the first invocation matching `interrupt_when`
	/// is interrupted, along with every interruptible invocation after it
	pub fn interrupted_when(interrupt_when: impl Fn(&str) -> bool + 'static) -> Self {
		Self {
			interrupt_when: Some(Box::new(interrupt_when)),
			..Self::simulating_tools()
		}
	}

	/// Returns every recorded invocation
	pub fn commands(&self) -> Vec<String> {
		self.commands.clone()
	}

	fn simulate(invocation: &Invocation) {
		let args = invocation.get_args();
		let Some(last) = args.last() else {
			return;
		};

		let is_executable_build = args.iter().any(|arg| arg.to_string_lossy().starts_with("LIBFLUSH_BUILDDIR="));
		if is_executable_build {
			if last == "clean" {
				return;
			}
			let build_dir = args
				.iter()
				.find_map(|arg| arg.to_str()?.strip_prefix("BUILDDIR="))
				.map(PathBuf::from)
				.expect("Executable build is missing `BUILDDIR`");
			let bin_dir = build_dir.join("release").join("bin");
			fs::create_dir_all(&bin_dir).expect("Unable to create binary directory");
			fs::write(bin_dir.join("executable"), "").expect("Unable to create executable");
			return;
		}

		let is_local_run = Path::new(invocation.program())
			.file_name()
			.is_some_and(|name| name == OsStr::new("executable"));
		let is_pull = args.iter().any(|arg| arg == "pull");
		if is_local_run || is_pull {
			fs::write(last, SAMPLE_LOG).expect("Unable to write log");
		}
	}
}

impl Runner for RecordingRunner {
	fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
		// Note: Arguments are joined verbatim, so remote shell quoting stays readable
		let command = std::iter::once(invocation.program())
			.chain(invocation.get_args().iter().map(OsString::as_os_str))
			.map(OsStr::to_string_lossy)
			.join(" ");
		self.commands.push(command.clone());

		if self.interrupt_when.as_ref().is_some_and(|interrupt_when| interrupt_when(&command)) {
			self.interrupted = true;
		}
		if self.interrupted && invocation.is_interruptible() {
			return Err(CommandError::Interrupted { command });
		}

		if self.fail_when.as_ref().is_some_and(|fail_when| fail_when(&command)) {
			return Err(CommandError::Failed {
				command,
				status: "exit status: 1".to_owned(),
				stderr: String::new(),
			});
		}

		if self.simulate {
			Self::simulate(invocation);
		}

		Ok(())
	}
}
