//! Statistics

// Imports
use average::{Mean, Variance};

/// Number of standard deviations beyond which a value is an outlier
pub const OUTLIER_SIGMAS: f64 = 3.0;

/// Removes every value further than 3 standard deviations from the mean.
///
/// This is a simple robust-statistics pass, not a rigorous outlier detector.
/// It uses the sample standard deviation and keeps values with
/// `|x - mean| <= 3 * std_dev`, in their original order.
/// Fewer than 2 values are returned unchanged.
pub fn reject_outliers(values: &[f64]) -> Vec<f64> {
	if values.len() < 2 {
		return values.to_vec();
	}

	let variance = values.iter().copied().collect::<Variance>();
	let mean = variance.mean();
	let max_deviation = OUTLIER_SIGMAS * variance.sample_variance().sqrt();

	values
		.iter()
		.copied()
		.filter(|value| (value - mean).abs() <= max_deviation)
		.collect()
}

/// Returns the mean of `values`, if any
pub fn mean(values: &[f64]) -> Option<f64> {
	match values.is_empty() {
		true => None,
		false => Some(values.iter().copied().collect::<Mean>().mean()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn six_samples_can_never_exceed_three_sigma() {
		let values = [0.0, 0.0, 10.0, 10.0, 10.0, 1000.0];
		assert_eq!(reject_outliers(&values), values);
	}

	#[test]
	fn genuine_outlier_is_removed() {
		let mut values = vec![10.0; 20];
		values.push(1000.0);
		values.push(12.0);
		let filtered = reject_outliers(&values);
		assert_eq!(filtered.len(), 21);
		assert!(!filtered.contains(&1000.0));
		assert_eq!(filtered.last(), Some(&12.0));
	}

	#[test]
	fn constant_values_are_kept() {
		assert_eq!(reject_outliers(&[5.0; 4]), [5.0; 4]);
	}

	#[test]
	fn small_inputs_are_unchanged() {
		assert_eq!(reject_outliers(&[]), Vec::<f64>::new());
		assert_eq!(reject_outliers(&[7.0]), [7.0]);
	}

	#[test]
	fn mean_of_values() {
		assert_eq!(mean(&[]), None);
		assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
	}
}
