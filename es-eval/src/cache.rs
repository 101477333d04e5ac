//! On-disk artifact cache.
//!
//! Build directories and measurement logs are keyed by [`CacheKey`](crate::strategy::CacheKey).
//! An artifact that exists is reused, unless forced.

// Imports
use std::path::Path;

/// Whether an artifact was reused or produced
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CacheStatus {
	/// Existing artifact was reused
	Reused,

	/// Artifact was (re)produced
	Produced,
}

/// Returns whether the artifact at `path` can be reused
pub fn is_reusable(path: &Path, force: bool) -> bool {
	match (path.exists(), force) {
		(true, false) => true,
		(true, true) => {
			tracing::debug!(?path, "Ignoring cached artifact");
			false
		},
		(false, _) => false,
	}
}

#[cfg(test)]
mod tests {
	use {super::*, std::fs};

	#[test]
	fn existing_artifacts_are_reused_unless_forced() {
		let dir = tempfile::tempdir().expect("Unable to create temporary directory");
		let path = dir.path().join("artifact");

		assert!(!is_reusable(&path, false));
		assert!(!is_reusable(&path, true));

		fs::write(&path, "").expect("Unable to create artifact");
		assert!(is_reusable(&path, false));
		assert!(!is_reusable(&path, true));
	}
}
