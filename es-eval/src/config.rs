//! Configuration

// Imports
use std::{
	fs,
	io,
	path::{Path, PathBuf},
	time::Duration,
};

/// Base configuration
#[derive(Clone, Debug)]
pub struct Config {
	/// Eviction library source directory
	pub libflush_source_dir: PathBuf,

	/// Measurement executable source directory
	pub executable_source_dir: PathBuf,

	/// Build cache root
	pub build_dir: PathBuf,

	/// Build tool
	pub build_tool: String,

	/// Timeout for each build tool invocation
	pub build_timeout: Duration,

	/// Log cache root
	pub log_dir: PathBuf,

	/// Timeout for each execution step
	pub execution_timeout: Duration,

	/// Remote transport program
	pub adb: String,
}

impl Config {
	/// Loads the configuration from a yaml file
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let contents = self::read_file(path)?;
		Self::from_yaml(&contents).map_err(|err| err.with_path(path))
	}

	/// Parses the configuration from a yaml document
	pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
		let raw = serde_yaml::from_str::<RawConfig>(contents).map_err(ConfigError::Parse)?;

		if raw.build.tool.is_empty() {
			return Err(ConfigError::Invalid("`build.tool` must not be empty".to_owned()));
		}
		if raw.execution.adb.is_empty() {
			return Err(ConfigError::Invalid("`execution.adb` must not be empty".to_owned()));
		}

		Ok(Self {
			libflush_source_dir:   raw.libflush.source_directory,
			executable_source_dir: raw.executable.source_directory,
			build_dir:             raw.build.directory,
			build_tool:            raw.build.tool,
			build_timeout:         Duration::from_secs(raw.build.timeout_secs),
			log_dir:               raw.logs.directory,
			execution_timeout:     Duration::from_secs(raw.execution.timeout_secs),
			adb:                   raw.execution.adb,
		})
	}
}

/// Reads a configuration file
pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
	fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_owned(),
		source,
	})
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("Unable to read {path:?}")]
	Read {
		path:   PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("Unable to parse configuration")]
	Parse(#[source] serde_yaml::Error),

	#[error("Invalid configuration: {0}")]
	Invalid(String),

	#[error("Invalid configuration file {path:?}")]
	File {
		path:   PathBuf,
		#[source]
		source: Box<ConfigError>,
	},
}

impl ConfigError {
	/// Attaches the file this error originated from
	pub(crate) fn with_path(self, path: &Path) -> Self {
		Self::File {
			path:   path.to_owned(),
			source: Box::new(self),
		}
	}
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
	libflush:   RawLibflush,
	build:      RawBuild,
	logs:       RawLogs,
	#[serde(default)]
	executable: RawExecutable,
	#[serde(default)]
	execution:  RawExecution,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawLibflush {
	source_directory: PathBuf,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawBuild {
	directory:    PathBuf,
	#[serde(default = "default_build_tool")]
	tool:         String,
	#[serde(default = "default_build_timeout_secs")]
	timeout_secs: u64,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawLogs {
	directory: PathBuf,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawExecutable {
	#[serde(default = "default_executable_source_directory")]
	source_directory: PathBuf,
}

impl Default for RawExecutable {
	fn default() -> Self {
		Self {
			source_directory: self::default_executable_source_directory(),
		}
	}
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawExecution {
	#[serde(default = "default_execution_timeout_secs")]
	timeout_secs: u64,
	#[serde(default = "default_adb")]
	adb:          String,
}

impl Default for RawExecution {
	fn default() -> Self {
		Self {
			timeout_secs: self::default_execution_timeout_secs(),
			adb:          self::default_adb(),
		}
	}
}

fn default_build_tool() -> String {
	"make".to_owned()
}

fn default_build_timeout_secs() -> u64 {
	30 * 60
}

fn default_executable_source_directory() -> PathBuf {
	PathBuf::from("source")
}

fn default_execution_timeout_secs() -> u64 {
	60 * 60
}

fn default_adb() -> String {
	"adb".to_owned()
}
