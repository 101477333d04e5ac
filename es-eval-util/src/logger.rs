//! Logger

// Imports
use {
	std::{fs, io, path::Path, sync::Mutex},
	tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer},
};

/// Initializes the global logger.
///
/// Logs to stderr, filtered by `RUST_LOG` if set, or else by `verbosity`
/// (`0` is `info`, `1` is `debug`, anything higher is `trace`).
///
/// If `log_file` is given, additionally logs to it, filtered by `RUST_LOG_FILE`,
/// or `debug` if unset.
///
/// Any messages logged through [`pre_init`] are emitted once the logger is set up.
pub fn init(log_file: Option<&Path>, log_file_append: bool, verbosity: u8) {
	let stderr_default = match verbosity {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	let stderr_filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(stderr_default));
	let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(stderr_filter);

	let file_layer = match log_file {
		Some(path) => match self::open_log_file(path, log_file_append) {
			Ok(file) => {
				let file_filter =
					EnvFilter::try_from_env("RUST_LOG_FILE").unwrap_or_else(|_| EnvFilter::new("debug"));
				let layer = fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(file_filter);
				Some(layer)
			},
			Err(err) => {
				pre_init::warn(format!("Unable to open log file {path:?}: {err}"));
				None
			},
		},
		None => None,
	};

	tracing_subscriber::registry()
		.with(stderr_layer)
		.with(file_layer)
		.init();

	pre_init::flush();
}

/// Opens the log file, either truncating or appending to it
fn open_log_file(path: &Path, append: bool) -> Result<fs::File, io::Error> {
	let mut options = fs::OpenOptions::new();
	options.create(true);
	match append {
		true => options.append(true),
		false => options.write(true).truncate(true),
	};
	options.open(path)
}

/// Logging before the logger is initialized.
///
/// Messages are buffered and emitted in order by [`init`].
pub mod pre_init {
	// Imports
	use std::sync::{Mutex, PoisonError};

	/// Buffered messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Message level
	#[derive(Clone, Copy, Debug)]
	enum Level {
		Debug,
		Warn,
	}

	/// Buffers a debug message
	pub fn debug(message: impl Into<String>) {
		self::push(Level::Debug, message.into());
	}

	/// Buffers a warning message
	pub fn warn(message: impl Into<String>) {
		self::push(Level::Warn, message.into());
	}

	fn push(level: Level, message: String) {
		MESSAGES
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push((level, message));
	}

	/// Emits all buffered messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(PoisonError::into_inner));
		for (level, message) in messages {
			match level {
				Level::Debug => tracing::debug!("{message}"),
				Level::Warn => tracing::warn!("{message}"),
			}
		}
	}
}
