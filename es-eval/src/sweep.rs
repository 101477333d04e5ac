//! Parameter sweep

// Imports
use crate::strategy::{Strategy, StrategyParams};

/// Upper bounds of a strategy sweep.
///
/// Every bound is enumerated downwards to 1.
#[derive(Clone, Copy, Debug)]
pub struct Sweep {
	pub max_eviction_counter:            u32,
	pub max_accesses_in_loop:            u32,
	pub max_different_addresses_in_loop: u32,
	pub max_step_size:                   u32,
	pub with_mirroring:                  bool,
}

impl Sweep {
	/// Returns all valid strategies of this sweep, in a deterministic order.
	///
	/// The loops are, from outermost to innermost, accesses in loop, different
	/// addresses in loop, step size and eviction counter. Each strategy is
	/// followed by its mirrored version when mirroring is enabled.
	pub fn strategies(&self) -> impl Iterator<Item = Strategy> {
		let with_mirroring = self.with_mirroring;
		itertools::iproduct!(
			(1..=self.max_accesses_in_loop).rev(),
			(1..=self.max_different_addresses_in_loop).rev(),
			(1..=self.max_step_size).rev(),
			(1..=self.max_eviction_counter).rev()
		)
		.filter_map(
			|(accesses_in_loop, different_addresses_in_loop, step_size, eviction_counter)| {
				let params = StrategyParams {
					eviction_counter,
					accesses_in_loop,
					different_addresses_in_loop,
					step_size,
					mirroring: false,
				};
				match Strategy::new(params) {
					Ok(strategy) => Some(strategy),
					Err(err) => {
						tracing::trace!(?params, %err, "Skipping invalid strategy");
						None
					},
				}
			},
		)
		.flat_map(move |strategy| {
			let mirrored = with_mirroring.then(|| strategy.with_mirroring(true));
			std::iter::once(strategy).chain(mirrored)
		})
	}
}
