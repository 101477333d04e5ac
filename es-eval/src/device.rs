//! Device profile

// Imports
use {
	crate::config::{self, ConfigError},
	std::path::{Component, Path},
};

/// Device profile
#[derive(Clone, Debug)]
pub struct Device {
	/// Human readable name
	pub name: Option<String>,

	/// Codename, used as the cache directory of this device
	pub codename: String,

	/// Architecture passed to the build tool
	pub arch: String,

	/// Default miss threshold
	pub threshold: Option<i64>,

	/// Where the executable runs
	pub target: Target,

	/// Cache geometry
	pub cache: CacheGeometry,
}

impl Device {
	/// Loads a device profile from a yaml file
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let contents = config::read_file(path)?;
		Self::from_yaml(&contents).map_err(|err| err.with_path(path))
	}

	/// Parses a device profile from a yaml document
	pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
		let raw = serde_yaml::from_str::<RawDeviceProfile>(contents).map_err(ConfigError::Parse)?;
		let RawDeviceProfile { device, cache } = raw;

		// Note: The codename becomes a directory name in both caches
		let mut components = Path::new(&device.codename).components();
		let is_single_component = matches!(
			(components.next(), components.next()),
			(Some(Component::Normal(_)), None)
		);
		if !is_single_component {
			return Err(ConfigError::Invalid(format!(
				"`device.codename` must be a single path component, found {:?}",
				device.codename
			)));
		}

		let cache = CacheGeometry::new(cache.number_of_sets, cache.line_length)?;

		let target = match device.adb_id {
			Some(adb_id) => {
				let executable_dir = device.executable_directory.ok_or_else(|| {
					ConfigError::Invalid("`device.executable-directory` is required with `device.adb-id`".to_owned())
				})?;
				let log_dir = device.log_directory.unwrap_or_else(|| executable_dir.clone());
				Target::Remote(RemoteTarget {
					adb_id,
					executable_dir,
					log_dir,
				})
			},
			None => Target::Local,
		};

		Ok(Self {
			name: device.name,
			codename: device.codename,
			arch: device.arch,
			threshold: device.threshold,
			target,
			cache,
		})
	}
}

/// Execution target
#[derive(Clone, Debug)]
pub enum Target {
	/// Run on this host
	Local,

	/// Run on a remote device
	Remote(RemoteTarget),
}

/// Remote device reached through the transport
#[derive(Clone, Debug)]
pub struct RemoteTarget {
	/// Transport device id
	pub adb_id: String,

	/// Directory on the device the executable is pushed to
	pub executable_dir: String,

	/// Directory on the device the executable writes its log to
	pub log_dir: String,
}

impl RemoteTarget {
	/// Returns the remote path of `file_name` inside the executable directory
	pub fn executable_path(&self, file_name: &str) -> String {
		self::remote_join(&self.executable_dir, file_name)
	}

	/// Returns the remote path of `file_name` inside the log directory
	pub fn log_path(&self, file_name: &str) -> String {
		self::remote_join(&self.log_dir, file_name)
	}
}

/// Joins a remote (always `/`-separated) path
fn remote_join(dir: &str, file_name: &str) -> String {
	format!("{}/{file_name}", dir.trim_end_matches('/'))
}

/// Cache geometry
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct CacheGeometry {
	/// Number of sets
	number_of_sets: u32,

	/// Line length, in bytes. Always a power of two.
	line_length: u32,
}

impl CacheGeometry {
	/// Creates a cache geometry.
	///
	/// # Errors
	/// Returns an error if `number_of_sets` is zero or `line_length` isn't a power of two.
	pub fn new(number_of_sets: u32, line_length: u32) -> Result<Self, ConfigError> {
		if number_of_sets == 0 {
			return Err(ConfigError::Invalid("`cache.number-of-sets` must be at least 1".to_owned()));
		}
		if !line_length.is_power_of_two() {
			return Err(ConfigError::Invalid(format!(
				"`cache.line-length` must be a power of two, found {line_length}"
			)));
		}

		Ok(Self {
			number_of_sets,
			line_length,
		})
	}

	/// Returns the number of sets
	pub fn number_of_sets(&self) -> u32 {
		self.number_of_sets
	}

	/// Returns the line length
	pub fn line_length(&self) -> u32 {
		self.line_length
	}

	/// Returns the base-2 logarithm of the line length
	pub fn line_length_log2(&self) -> u32 {
		self.line_length.trailing_zeros()
	}
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
struct RawDeviceProfile {
	device: RawDevice,
	cache:  RawCache,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawDevice {
	#[serde(default)]
	name:                 Option<String>,
	codename:             String,
	arch:                 String,
	#[serde(default)]
	threshold:            Option<i64>,
	#[serde(default)]
	adb_id:               Option<String>,
	#[serde(default)]
	executable_directory: Option<String>,
	#[serde(default)]
	log_directory:        Option<String>,
}

#[derive(Debug)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawCache {
	number_of_sets: u32,
	line_length:    u32,
}
