//! Strategy identity

// Imports
use {
	crate::device::Device,
	std::{
		fmt,
		path::{Path, PathBuf},
		str::FromStr,
	},
};

/// Eviction strategy parameters, as chosen by the caller or a sweep
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StrategyParams {
	/// Number of congruent addresses used to evict a victim line
	pub eviction_counter: u32,

	/// Accesses performed per loop iteration
	pub accesses_in_loop: u32,

	/// Distinct addresses touched per loop iteration
	pub different_addresses_in_loop: u32,

	/// Stride between successive addresses
	pub step_size: u32,

	/// Whether addresses are accessed forward and then mirrored
	pub mirroring: bool,
}

/// A validated eviction strategy.
///
/// The name is derived once from the parameters and is the only key used for
/// build directories, log files and on-device artifacts.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Strategy {
	/// Parameters
	params: StrategyParams,

	/// Total number of addresses
	number_of_addresses: u32,

	/// Canonical name
	name: String,
}

impl Strategy {
	/// Validates `params` into a strategy.
	///
	/// # Errors
	/// Returns an error if any count is zero, if the number of addresses would be
	/// smaller than the addresses touched per loop, or if the step size exceeds the
	/// addresses touched per loop.
	pub fn new(params: StrategyParams) -> Result<Self, InvalidStrategy> {
		let counts = [
			("eviction counter", params.eviction_counter),
			("accesses in loop", params.accesses_in_loop),
			("different addresses in loop", params.different_addresses_in_loop),
			("step size", params.step_size),
		];
		if let Some(&(field, _)) = counts.iter().find(|(_, value)| *value == 0) {
			return Err(InvalidStrategy::Zero { field });
		}

		let number_of_addresses = params
			.eviction_counter
			.checked_add(params.different_addresses_in_loop - 1)
			.ok_or(InvalidStrategy::TooManyAddresses)?;
		if number_of_addresses < params.different_addresses_in_loop {
			return Err(InvalidStrategy::TooFewAddresses {
				number_of_addresses,
				different_addresses_in_loop: params.different_addresses_in_loop,
			});
		}
		if params.different_addresses_in_loop < params.step_size {
			return Err(InvalidStrategy::StepTooLarge {
				step_size:                   params.step_size,
				different_addresses_in_loop: params.different_addresses_in_loop,
			});
		}

		Ok(Self::from_validated(params, number_of_addresses))
	}

	fn from_validated(params: StrategyParams, number_of_addresses: u32) -> Self {
		let name = StrategyName {
			number_of_addresses,
			accesses_in_loop: params.accesses_in_loop,
			different_addresses_in_loop: params.different_addresses_in_loop,
			step_size: params.step_size,
			mirroring: params.mirroring,
		}
		.to_string();

		Self {
			params,
			number_of_addresses,
			name,
		}
	}

	/// Returns this strategy with mirroring set to `mirroring`
	#[must_use]
	pub fn with_mirroring(&self, mirroring: bool) -> Self {
		let params = StrategyParams { mirroring, ..self.params };
		Self::from_validated(params, self.number_of_addresses)
	}

	/// Returns the parameters
	pub fn params(&self) -> &StrategyParams {
		&self.params
	}

	/// Returns the total number of addresses, `eviction_counter + different_addresses_in_loop - 1`
	pub fn number_of_addresses(&self) -> u32 {
		self.number_of_addresses
	}

	/// Returns the canonical name
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the cache key of this strategy on `device`
	pub fn cache_key(&self, device: &Device) -> CacheKey {
		CacheKey {
			device_codename: device.codename.clone(),
			strategy_name:   self.name.clone(),
		}
	}
}

impl fmt::Display for Strategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(&self.name)
	}
}

/// Invalid strategy parameters
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum InvalidStrategy {
	#[error("The {field} must be at least 1")]
	Zero { field: &'static str },

	#[error("Number of addresses overflows")]
	TooManyAddresses,

	#[error("Number of addresses ({number_of_addresses}) is smaller than the different addresses in loop ({different_addresses_in_loop})")]
	TooFewAddresses {
		number_of_addresses:         u32,
		different_addresses_in_loop: u32,
	},

	#[error("Step size ({step_size}) is larger than the different addresses in loop ({different_addresses_in_loop})")]
	StepTooLarge {
		step_size:                   u32,
		different_addresses_in_loop: u32,
	},
}

/// Fields of a canonical strategy name.
///
/// Formats as `{number_of_addresses}-{accesses_in_loop}-{different_addresses_in_loop}-{step_size}-{M|m}`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StrategyName {
	pub number_of_addresses:         u32,
	pub accesses_in_loop:            u32,
	pub different_addresses_in_loop: u32,
	pub step_size:                   u32,
	pub mirroring:                   bool,
}

impl StrategyName {
	/// Recovers the eviction counter, if the name is consistent
	pub fn eviction_counter(&self) -> Option<u32> {
		self.number_of_addresses
			.checked_add(1)?
			.checked_sub(self.different_addresses_in_loop)
	}

	/// Recovers the strategy this name was derived from.
	///
	/// # Errors
	/// Returns an error if the fields don't describe a valid strategy.
	pub fn to_strategy(&self) -> Result<Strategy, InvalidStrategy> {
		let eviction_counter = self.eviction_counter().ok_or(InvalidStrategy::TooFewAddresses {
			number_of_addresses:         self.number_of_addresses,
			different_addresses_in_loop: self.different_addresses_in_loop,
		})?;

		Strategy::new(StrategyParams {
			eviction_counter,
			accesses_in_loop: self.accesses_in_loop,
			different_addresses_in_loop: self.different_addresses_in_loop,
			step_size: self.step_size,
			mirroring: self.mirroring,
		})
	}
}

impl fmt::Display for StrategyName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mirroring = match self.mirroring {
			true => 'M',
			false => 'm',
		};
		write!(
			f,
			"{}-{}-{}-{}-{mirroring}",
			self.number_of_addresses, self.accesses_in_loop, self.different_addresses_in_loop, self.step_size
		)
	}
}

impl FromStr for StrategyName {
	type Err = ParseNameError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let parts = s.split('-').collect::<Vec<_>>();
		let [number_of_addresses, accesses_in_loop, different_addresses_in_loop, step_size, mirroring] = parts[..]
		else {
			return Err(ParseNameError::FieldCount(parts.len()));
		};

		let parse_field = |field: &'static str, value: &str| {
			value.parse::<u32>().map_err(|_| ParseNameError::Field {
				field,
				value: value.to_owned(),
			})
		};

		Ok(Self {
			number_of_addresses:         parse_field("number of addresses", number_of_addresses)?,
			accesses_in_loop:            parse_field("accesses in loop", accesses_in_loop)?,
			different_addresses_in_loop: parse_field("different addresses in loop", different_addresses_in_loop)?,
			step_size:                   parse_field("step size", step_size)?,
			mirroring:                   match mirroring {
				"M" => true,
				"m" => false,
				_ => return Err(ParseNameError::Mirroring(mirroring.to_owned())),
			},
		})
	}
}

/// Error for [`StrategyName::from_str`]
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum ParseNameError {
	#[error("Expected 5 dash-separated fields, found {0}")]
	FieldCount(usize),

	#[error("Invalid {field}: {value:?}")]
	Field { field: &'static str, value: String },

	#[error("Invalid mirroring flag {0:?}, expected `M` or `m`")]
	Mirroring(String),
}

/// Key of every on-disk artifact of a strategy on a device
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct CacheKey {
	pub device_codename: String,
	pub strategy_name:   String,
}

impl CacheKey {
	/// Returns the build directory under `build_root`
	pub fn build_dir(&self, build_root: &Path) -> PathBuf {
		build_root.join(&self.device_codename).join(&self.strategy_name)
	}

	/// Returns the log directory under `log_root`
	pub fn log_dir(&self, log_root: &Path) -> PathBuf {
		log_root.join(&self.device_codename)
	}

	/// Returns the log file path under `log_root`
	pub fn log_path(&self, log_root: &Path) -> PathBuf {
		self.log_dir(log_root).join(self.log_file_name())
	}

	/// Returns the log file name
	pub fn log_file_name(&self) -> String {
		format!("{}.log", self.strategy_name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params(eviction_counter: u32, accesses: u32, different: u32, step: u32, mirroring: bool) -> StrategyParams {
		StrategyParams {
			eviction_counter,
			accesses_in_loop: accesses,
			different_addresses_in_loop: different,
			step_size: step,
			mirroring,
		}
	}

	#[test]
	fn number_of_addresses_and_name() {
		let strategy = Strategy::new(params(4, 3, 2, 1, false)).expect("Strategy is valid");
		assert_eq!(strategy.number_of_addresses(), 5);
		assert_eq!(strategy.name(), "5-3-2-1-m");

		let mirrored = strategy.with_mirroring(true);
		assert_eq!(mirrored.name(), "5-3-2-1-M");
		assert!(mirrored.params().mirroring);
	}

	#[test]
	fn name_round_trips() {
		for (e, a, d, s) in [(1, 1, 1, 1), (22, 2, 5, 3), (7, 10, 10, 10), (100, 1, 4, 2)] {
			for mirroring in [false, true] {
				let strategy = Strategy::new(params(e, a, d, s, mirroring)).expect("Strategy is valid");
				assert_eq!(strategy.number_of_addresses(), e + d - 1);

				let name = strategy.name().parse::<StrategyName>().expect("Name should parse");
				assert_eq!(name.number_of_addresses, strategy.number_of_addresses());
				assert_eq!(name.accesses_in_loop, a);
				assert_eq!(name.different_addresses_in_loop, d);
				assert_eq!(name.step_size, s);
				assert_eq!(name.mirroring, mirroring);
				assert_eq!(name.to_strategy().as_ref(), Ok(&strategy));
			}
		}
	}

	#[test]
	fn step_larger_than_loop_is_invalid() {
		assert_eq!(
			Strategy::new(params(4, 1, 3, 5, false)),
			Err(InvalidStrategy::StepTooLarge {
				step_size:                   5,
				different_addresses_in_loop: 3,
			})
		);
	}

	#[test]
	fn zero_counts_are_invalid() {
		assert_eq!(
			Strategy::new(params(0, 1, 1, 1, false)),
			Err(InvalidStrategy::Zero {
				field: "eviction counter",
			})
		);
		assert_eq!(
			Strategy::new(params(1, 1, 1, 0, false)),
			Err(InvalidStrategy::Zero { field: "step size" })
		);
	}

	#[test]
	fn names_with_wrong_field_count_are_rejected() {
		assert_eq!("5-1-2-m".parse::<StrategyName>(), Err(ParseNameError::FieldCount(4)));
		assert_eq!("5-1-2-1-1-m".parse::<StrategyName>(), Err(ParseNameError::FieldCount(6)));
	}

	#[test]
	fn names_with_bad_fields_are_rejected() {
		assert!(matches!(
			"5-x-2-1-m".parse::<StrategyName>(),
			Err(ParseNameError::Field {
				field: "accesses in loop",
				..
			})
		));
		assert_eq!(
			"5-1-2-1-q".parse::<StrategyName>(),
			Err(ParseNameError::Mirroring("q".to_owned()))
		);
	}

	#[test]
	fn cache_key_paths() {
		let key = CacheKey {
			device_codename: "zeroflte".to_owned(),
			strategy_name:   "5-1-2-1-m".to_owned(),
		};
		assert_eq!(
			key.build_dir(Path::new("/build")),
			Path::new("/build/zeroflte/5-1-2-1-m")
		);
		assert_eq!(
			key.log_path(Path::new("/logs")),
			Path::new("/logs/zeroflte/5-1-2-1-m.log")
		);
	}
}
