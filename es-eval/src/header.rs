//! Strategy configuration header generation

// Imports
use {
	crate::{device::Device, strategy::Strategy},
	anyhow::Context,
	std::{fs, io, path::Path},
};

/// Template of the header consumed by the eviction library
pub const TEMPLATE: &str = include_str!("../templates/strategy.h.in");

/// Renders the configuration header of `strategy` on `device`.
///
/// Identical inputs always render identical output.
pub fn render(device: &Device, strategy: &Strategy) -> Result<String, RenderError> {
	let params = strategy.params();
	let values = [
		("number_of_sets", device.cache.number_of_sets().to_string()),
		("line_length", device.cache.line_length().to_string()),
		("line_length_log2", device.cache.line_length_log2().to_string()),
		("eviction_counter", params.eviction_counter.to_string()),
		("accesses_in_loop", params.accesses_in_loop.to_string()),
		(
			"different_addresses_in_loop",
			params.different_addresses_in_loop.to_string(),
		),
		("step_size", params.step_size.to_string()),
		("mirroring", u8::from(params.mirroring).to_string()),
	];

	self::render_template(TEMPLATE, &values)
}

/// Renders `template`, replacing every `{{name}}` with its value in `values`
pub fn render_template(template: &str, values: &[(&str, String)]) -> Result<String, RenderError> {
	let mut output = String::with_capacity(template.len());
	let mut rest = template;
	while let Some(start) = rest.find("{{") {
		output.push_str(&rest[..start]);

		let after_open = &rest[start + 2..];
		let end = after_open.find("}}").ok_or(RenderError::Unterminated)?;
		let name = after_open[..end].trim();
		let (_, value) = values
			.iter()
			.find(|(value_name, _)| *value_name == name)
			.ok_or_else(|| RenderError::UnknownValue(name.to_owned()))?;
		output.push_str(value);

		rest = &after_open[end + 2..];
	}
	output.push_str(rest);

	Ok(output)
}

/// Writes `contents` to `path`, unless it already holds exactly them.
///
/// Returns whether the file was written.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<bool, anyhow::Error> {
	match fs::read_to_string(path) {
		Ok(existing) if existing == contents => return Ok(false),
		Ok(_) => (),
		Err(err) if err.kind() == io::ErrorKind::NotFound => (),
		Err(err) => return Err(err).with_context(|| format!("Unable to read {path:?}")),
	}

	fs::write(path, contents).with_context(|| format!("Unable to write {path:?}"))?;
	Ok(true)
}

/// Template rendering error
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum RenderError {
	#[error("Unterminated placeholder")]
	Unterminated,

	#[error("Unknown template value {0:?}")]
	UnknownValue(String),
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		crate::{strategy::StrategyParams, test_util},
	};

	fn strategy(mirroring: bool) -> Strategy {
		Strategy::new(StrategyParams {
			eviction_counter: 21,
			accesses_in_loop: 2,
			different_addresses_in_loop: 5,
			step_size: 2,
			mirroring,
		})
		.expect("Strategy is valid")
	}

	#[test]
	fn header_contains_geometry_and_parameters() {
		let device = test_util::local_device();
		let header = render(&device, &strategy(true)).expect("Unable to render header");

		for define in [
			"#define NUMBER_OF_SETS 512\n",
			"#define LINE_LENGTH 64\n",
			"#define LINE_LENGTH_LOG2 6\n",
			"#define ES_EVICTION_COUNTER 21\n",
			"#define ES_NUMBER_OF_ACCESSES_IN_LOOP 2\n",
			"#define ES_DIFFERENT_ADDRESSES_IN_LOOP 5\n",
			"#define ES_STEP_SIZE 2\n",
			"#define ES_MIRRORING 1\n",
		] {
			assert!(header.contains(define), "Missing {define:?} in:\n{header}");
		}
		assert!(!header.contains("{{"));
	}

	#[test]
	fn header_generation_is_idempotent() {
		let device = test_util::local_device();
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("strategy.h");

		let first = render(&device, &strategy(false)).expect("Unable to render header");
		assert!(write_if_changed(&path, &first).expect("Unable to write header"));
		let first_bytes = fs::read(&path).expect("Unable to read header");

		let second = render(&device, &strategy(false)).expect("Unable to render header");
		assert!(!write_if_changed(&path, &second).expect("Unable to write header"));
		assert_eq!(fs::read(&path).expect("Unable to read header"), first_bytes);

		let mirrored = render(&device, &strategy(true)).expect("Unable to render header");
		assert!(write_if_changed(&path, &mirrored).expect("Unable to write header"));
	}

	#[test]
	fn template_errors() {
		let values = [("a", "1".to_owned())];
		assert_eq!(render_template("x {{ a }} y", &values).as_deref(), Ok("x 1 y"));
		assert_eq!(
			render_template("{{b}}", &values),
			Err(RenderError::UnknownValue("b".to_owned()))
		);
		assert_eq!(render_template("{{a", &values), Err(RenderError::Unterminated));
	}
}
