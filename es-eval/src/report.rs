//! Aggregated evaluation reports

// Imports
use {
	crate::evaluate::EvaluationResult,
	anyhow::Context,
	std::{
		fs,
		io::{self, Write},
		path::Path,
	},
};

/// Row of the aggregated table
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct ReportRow<'a> {
	#[serde(rename = "Strategy")]
	pub strategy:                    &'a str,
	#[serde(rename = "Number of addresses")]
	pub number_of_addresses:         u32,
	#[serde(rename = "Number of accesses in loop")]
	pub accesses_in_loop:            u32,
	#[serde(rename = "Different addresses in loop")]
	pub different_addresses_in_loop: u32,
	#[serde(rename = "Step size")]
	pub step_size:                   u32,
	#[serde(rename = "Mirrored")]
	pub mirrored:                    bool,
	#[serde(rename = "Rate")]
	pub rate:                        f64,
	#[serde(rename = "Average runtime")]
	pub average_runtime:             f64,
	#[serde(rename = "Corrected runtime")]
	pub corrected_runtime:           f64,
}

impl<'a> From<&'a EvaluationResult> for ReportRow<'a> {
	fn from(result: &'a EvaluationResult) -> Self {
		Self {
			strategy:                    &result.strategy,
			number_of_addresses:         result.number_of_addresses,
			accesses_in_loop:            result.accesses_in_loop,
			different_addresses_in_loop: result.different_addresses_in_loop,
			step_size:                   result.step_size,
			mirrored:                    result.mirroring,
			rate:                        result.rate,
			average_runtime:             result.average_runtime,
			corrected_runtime:           result.corrected_runtime,
		}
	}
}

/// Writes `results` as a csv table
pub fn write_csv(writer: impl io::Write, results: &[EvaluationResult]) -> Result<(), anyhow::Error> {
	let mut writer = csv::Writer::from_writer(writer);
	for result in results {
		writer
			.serialize(ReportRow::from(result))
			.with_context(|| format!("Unable to write row of {}", result.strategy))?;
	}
	writer.flush().context("Unable to flush csv")?;

	Ok(())
}

/// Writes `results` as a csv table to `path`
pub fn write_csv_file(path: &Path, results: &[EvaluationResult]) -> Result<(), anyhow::Error> {
	let file = fs::File::create(path).with_context(|| format!("Unable to create {path:?}"))?;
	self::write_csv(file, results).with_context(|| format!("Unable to write {path:?}"))
}

/// Writes `results` to the `strategies` table of the sqlite database at `path`.
///
/// Any existing table is replaced.
pub fn write_sqlite(path: &Path, results: &[EvaluationResult]) -> Result<(), anyhow::Error> {
	let mut connection =
		rusqlite::Connection::open(path).with_context(|| format!("Unable to open database {path:?}"))?;
	let transaction = connection.transaction().context("Unable to start transaction")?;

	transaction
		.execute_batch(
			"DROP TABLE IF EXISTS strategies;
			CREATE TABLE strategies (
				\"Strategy\" TEXT NOT NULL,
				\"Number of addresses\" INTEGER NOT NULL,
				\"Number of accesses in loop\" INTEGER NOT NULL,
				\"Different addresses in loop\" INTEGER NOT NULL,
				\"Step size\" INTEGER NOT NULL,
				\"Mirrored\" INTEGER NOT NULL,
				\"Rate\" REAL NOT NULL,
				\"Average runtime\" REAL NOT NULL,
				\"Corrected runtime\" REAL NOT NULL
			);",
		)
		.context("Unable to create table")?;

	{
		let mut statement = transaction
			.prepare("INSERT INTO strategies VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)")
			.context("Unable to prepare insert")?;
		for result in results {
			let row = ReportRow::from(result);
			statement
				.execute(rusqlite::params![
					row.strategy,
					row.number_of_addresses,
					row.accesses_in_loop,
					row.different_addresses_in_loop,
					row.step_size,
					row.mirrored,
					row.rate,
					row.average_runtime,
					row.corrected_runtime,
				])
				.with_context(|| format!("Unable to insert row of {}", row.strategy))?;
		}
	}

	transaction.commit().context("Unable to commit transaction")?;

	Ok(())
}

/// Writes `results` as json to `path`
pub fn write_json(path: &Path, results: &[EvaluationResult]) -> Result<(), anyhow::Error> {
	let file = fs::File::create(path).with_context(|| format!("Unable to create {path:?}"))?;
	let mut writer = io::BufWriter::new(file);
	serde_json::to_writer_pretty(&mut writer, results).with_context(|| format!("Unable to write {path:?}"))?;
	writer.flush().with_context(|| format!("Unable to flush {path:?}"))
}
