//! Utilities

// Modules
pub mod logger;

// Imports
use {
	itertools::Itertools,
	std::{borrow::Cow, ffi::OsStr, fmt},
};

/// Extension trait to display a list of arguments as a shell command line
#[extend::ext(name = DisplayArgs)]
pub impl<T: AsRef<OsStr>> [T] {
	/// Returns a displayable command line for these arguments.
	///
	/// Arguments containing whitespace or quotes are single-quoted.
	fn display_args(&self) -> ArgsDisplay<'_, T> {
		ArgsDisplay(self)
	}
}

/// Display for [`DisplayArgs::display_args`]
pub struct ArgsDisplay<'a, T>(&'a [T]);

impl<T: AsRef<OsStr>> fmt::Display for ArgsDisplay<'_, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let args = self.0.iter().map(|arg| quote_arg(arg.as_ref().to_string_lossy()));
		write!(f, "{}", args.format(" "))
	}
}

/// Quotes `arg` if it would otherwise be split or misread by a shell
fn quote_arg(arg: Cow<'_, str>) -> Cow<'_, str> {
	let needs_quoting = arg.is_empty() || arg.chars().any(|ch| ch.is_whitespace() || matches!(ch, '\'' | '"' | '\\'));
	match needs_quoting {
		true => Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''"))),
		false => arg,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_args_are_joined_with_spaces() {
		let args = ["make", "-C", "/src/libflush", "ARCH=armv8"];
		assert_eq!(args.display_args().to_string(), "make -C /src/libflush ARCH=armv8");
	}

	#[test]
	fn args_with_spaces_are_quoted() {
		let args = ["su", "-c", "chmod 777 /data/local/tmp/5-1-2-1-m", ""];
		assert_eq!(
			args.display_args().to_string(),
			"su -c 'chmod 777 /data/local/tmp/5-1-2-1-m' ''"
		);
	}

	#[test]
	fn single_quotes_are_escaped() {
		let args = ["it's"];
		assert_eq!(args.display_args().to_string(), r"'it'\''s'");
	}
}
