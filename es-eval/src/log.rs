//! Measurement logs

// Imports
use {
	crate::strategy::ParseNameError,
	std::{fs, io, path::Path},
};

/// Columns read from a measurement log.
///
/// Cells are optional, since batched columns have fewer rows than per-run ones.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct MeasurementLog {
	/// Per-run miss indicator (`Miss`)
	pub miss: Vec<Option<f64>>,

	/// Per-run runtime (`Runtime`)
	pub runtime: Vec<Option<f64>>,

	/// Per-batch runtime (`RuntimeBatch`)
	pub runtime_batch: Vec<Option<f64>>,
}

impl MeasurementLog {
	/// Column names
	pub const MISS: &'static str = "Miss";
	pub const RUNTIME: &'static str = "Runtime";
	pub const RUNTIME_BATCH: &'static str = "RuntimeBatch";

	/// Reads a measurement log from `path`
	pub fn from_path(path: &Path) -> Result<Self, LogError> {
		let file = fs::File::open(path).map_err(LogError::Io)?;
		Self::from_reader(file)
	}

	/// Reads a measurement log.
	///
	/// Columns are found by their header, any extra columns are ignored.
	pub fn from_reader(reader: impl io::Read) -> Result<Self, LogError> {
		let mut reader = csv::ReaderBuilder::new()
			.flexible(true)
			.trim(csv::Trim::All)
			.from_reader(reader);

		let headers = reader.headers()?.clone();
		let find_column = |name: &'static str| {
			headers
				.iter()
				.position(|header| header == name)
				.ok_or(LogError::MissingColumn(name))
		};
		let columns = [
			(Self::MISS, find_column(Self::MISS)?),
			(Self::RUNTIME, find_column(Self::RUNTIME)?),
			(Self::RUNTIME_BATCH, find_column(Self::RUNTIME_BATCH)?),
		];

		let mut log = Self::default();
		for record in reader.records() {
			let record = record?;
			let line = record.position().map_or(0, csv::Position::line);

			let mut values = [None; 3];
			for (value, &(column, idx)) in values.iter_mut().zip(&columns) {
				*value = match record.get(idx) {
					None | Some("") => None,
					Some(cell) => match cell.parse::<f64>() {
						// Note: `NaN` marks a missing measurement, like an empty cell
						Ok(value) if value.is_nan() => None,
						Ok(value) if value.is_finite() => Some(value),
						_ =>
							return Err(LogError::Value {
								line,
								column,
								value: cell.to_owned(),
							}),
					},
				};
			}

			let [miss, runtime, runtime_batch] = values;
			log.miss.push(miss);
			log.runtime.push(runtime);
			log.runtime_batch.push(runtime_batch);
		}

		Ok(log)
	}
}

/// Measurement log error
#[derive(Debug, thiserror::Error)]
pub enum LogError {
	#[error("Unable to read log")]
	Io(#[source] io::Error),

	#[error("Unable to parse log")]
	Csv(#[from] csv::Error),

	#[error("Log is missing column {0:?}")]
	MissingColumn(&'static str),

	#[error("Invalid {column:?} value {value:?} on line {line}")]
	Value {
		line:   u64,
		column: &'static str,
		value:  String,
	},

	#[error("Log file name isn't a strategy name")]
	FileName(#[source] ParseNameError),

	#[error("No {0:?} values remain")]
	Empty(&'static str),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_columns_by_header() {
		let log = MeasurementLog::from_reader(
			"Runtime, Extra, Miss, RuntimeBatch\n1.5, x, 0, 10\n2.5, y, 1,\n".as_bytes(),
		)
		.expect("Log is valid");
		assert_eq!(log.miss, [Some(0.0), Some(1.0)]);
		assert_eq!(log.runtime, [Some(1.5), Some(2.5)]);
		assert_eq!(log.runtime_batch, [Some(10.0), None]);
	}

	#[test]
	fn short_rows_have_missing_cells() {
		let log = MeasurementLog::from_reader("Miss,Runtime,RuntimeBatch\n1,2,3\n4,5\n".as_bytes())
			.expect("Log is valid");
		assert_eq!(log.runtime_batch, [Some(3.0), None]);
	}

	#[test]
	fn missing_column_is_rejected() {
		let err = MeasurementLog::from_reader("Miss,Runtime\n1,2\n".as_bytes()).expect_err("Log is invalid");
		assert!(matches!(err, LogError::MissingColumn("RuntimeBatch")));
	}

	#[test]
	fn non_numeric_value_is_rejected() {
		let err = MeasurementLog::from_reader("Miss,Runtime,RuntimeBatch\n1,2,3\nx,2,3\n".as_bytes())
			.expect_err("Log is invalid");
		match err {
			LogError::Value { line, column, value } => {
				assert_eq!(line, 3);
				assert_eq!(column, "Miss");
				assert_eq!(value, "x");
			},
			err => panic!("Unexpected error: {err:?}"),
		}
	}

	#[test]
	fn nan_cells_are_missing() {
		let log = MeasurementLog::from_reader("Miss,Runtime,RuntimeBatch
nan,2,NaN
1,NaN,3
".as_bytes())
			.expect("Log is valid");
		assert_eq!(log.miss, [None, Some(1.0)]);
		assert_eq!(log.runtime, [Some(2.0), None]);
		assert_eq!(log.runtime_batch, [None, Some(3.0)]);
	}

	#[test]
	fn infinite_value_is_rejected() {
		let err = MeasurementLog::from_reader("Miss,Runtime,RuntimeBatch
1,inf,3
".as_bytes())
			.expect_err("Log is invalid");
		match err {
			LogError::Value { line, column, value } => {
				assert_eq!(line, 2);
				assert_eq!(column, "Runtime");
				assert_eq!(value, "inf");
			},
			err => panic!("Unexpected error: {err:?}"),
		}
	}
}
