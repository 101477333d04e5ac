//! Eviction strategy evaluator (`es-eval`)
//!
//! Builds a parameterized cache eviction executable for every strategy, runs it on
//! the host or on a remote device, and evaluates the resulting measurement logs.

// Modules
pub mod adb;
pub mod build;
pub mod cache;
pub mod command;
pub mod config;
pub mod device;
pub mod evaluate;
pub mod exec;
pub mod header;
pub mod log;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod strategy;
pub mod sweep;
#[cfg(test)]
mod test_util;

// Exports
pub use self::{
	build::Builder,
	command::{CommandError, Interrupt, Invocation, Runner, SystemRunner},
	config::{Config, ConfigError},
	device::Device,
	evaluate::EvaluationResult,
	exec::Executor,
	pipeline::Pipeline,
	strategy::{Strategy, StrategyName, StrategyParams},
	sweep::Sweep,
};
