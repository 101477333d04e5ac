//! Remote transport (`adb`)

// Imports
use {
	crate::command::Invocation,
	std::{path::Path, time::Duration},
};

/// Builds transport invocations for a single remote device
#[derive(Clone, Copy, Debug)]
pub struct Adb<'a> {
	/// Transport program
	program: &'a str,

	/// Device id
	device_id: &'a str,

	/// Timeout of every invocation
	timeout: Duration,
}

impl<'a> Adb<'a> {
	/// Creates a transport for `device_id`
	pub fn new(program: &'a str, device_id: &'a str, timeout: Duration) -> Self {
		Self {
			program,
			device_id,
			timeout,
		}
	}

	fn base(&self) -> Invocation {
		Invocation::new(self.program)
			.args(["-s", self.device_id])
			.timeout(self.timeout)
	}

	/// Uploads `local` to `remote`
	pub fn push(&self, local: &Path, remote: &str) -> Invocation {
		self.base().arg("push").arg(local).arg(remote)
	}

	/// Downloads `remote` to `local`
	pub fn pull(&self, remote: &str, local: &Path) -> Invocation {
		self.base().arg("pull").arg(remote).arg(local)
	}

	/// Runs `command` in a remote shell as the super user
	pub fn su(&self, command: &str) -> Invocation {
		self.base().args(["shell", "su", "-c"]).arg(format!("'{command}'"))
	}
}
