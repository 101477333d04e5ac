//! External commands

// Imports
use {
	es_eval_util::DisplayArgs,
	std::{
		collections::VecDeque,
		ffi::{OsStr, OsString},
		fmt,
		io::{self, BufRead},
		process::{Child, Command, Stdio},
		sync::{
			atomic::{self, AtomicBool},
			mpsc,
			Arc,
		},
		thread,
		time::{Duration, Instant},
	},
};

/// Number of trailing stderr lines kept for errors
const STDERR_TAIL_LINES: usize = 20;

/// Interval between checks on a running child
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long to wait for the output of a command without a timeout to close after it exits
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// An external command invocation
#[derive(Clone, Debug)]
pub struct Invocation {
	/// Program and arguments
	argv: Vec<OsString>,

	/// Timeout
	timeout: Option<Duration>,

	/// Whether an interrupt stops this invocation
	interruptible: bool,
}

impl Invocation {
	/// Creates an invocation of `program` with no arguments
	pub fn new(program: impl AsRef<OsStr>) -> Self {
		Self {
			argv:          vec![program.as_ref().to_owned()],
			timeout:       None,
			interruptible: true,
		}
	}

	/// Adds an argument
	#[must_use]
	pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
		self.argv.push(arg.as_ref().to_owned());
		self
	}

	/// Adds several arguments
	#[must_use]
	pub fn args<I>(mut self, args: I) -> Self
	where
		I: IntoIterator,
		I::Item: AsRef<OsStr>,
	{
		self.argv.extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
		self
	}

	/// Adds a `key=value` argument
	#[must_use]
	pub fn var(self, key: &str, value: impl AsRef<OsStr>) -> Self {
		let mut arg = OsString::from(key);
		arg.push("=");
		arg.push(value);
		self.arg(arg)
	}

	/// Sets the timeout
	#[must_use]
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Keeps this invocation running after an interrupt.
	///
	/// Used for cleanup steps, which are still bounded by the timeout.
	#[must_use]
	pub fn uninterruptible(mut self) -> Self {
		self.interruptible = false;
		self
	}

	/// Returns the program
	pub fn program(&self) -> &OsStr {
		&self.argv[0]
	}

	/// Returns the arguments, excluding the program
	pub fn get_args(&self) -> &[OsString] {
		&self.argv[1..]
	}

	/// Returns the timeout
	pub fn get_timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Returns whether an interrupt stops this invocation
	pub fn is_interruptible(&self) -> bool {
		self.interruptible
	}
}

impl fmt::Display for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.argv.display_args())
	}
}

/// Runs external commands
pub trait Runner {
	/// Runs `invocation` to completion.
	///
	/// # Errors
	/// Returns an error unless the command exits successfully within its timeout.
	fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
	fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
		(**self).run(invocation)
	}
}

/// Interrupt request, shared with a signal handler
#[derive(Clone, Default, Debug)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
	/// Requests every interruptible command to stop
	pub fn trigger(&self) {
		self.0.store(true, atomic::Ordering::SeqCst);
	}

	/// Returns whether an interrupt was requested
	pub fn is_triggered(&self) -> bool {
		self.0.load(atomic::Ordering::SeqCst)
	}
}

/// Runs commands as child processes of this process.
///
/// Each command runs in its own process group, which is killed as a whole on
/// timeout or interrupt. Output is forwarded to the log at debug level.
#[derive(Clone, Default, Debug)]
pub struct SystemRunner {
	/// Interrupt
	interrupt: Interrupt,
}

impl SystemRunner {
	/// Creates a runner that stops commands once `interrupt` is triggered
	pub fn new(interrupt: Interrupt) -> Self {
		Self { interrupt }
	}

	fn is_interrupted(&self, invocation: &Invocation) -> bool {
		invocation.is_interruptible() && self.interrupt.is_triggered()
	}
}

impl Runner for SystemRunner {
	fn run(&mut self, invocation: &Invocation) -> Result<(), CommandError> {
		let command = invocation.to_string();
		if self.is_interrupted(invocation) {
			return Err(CommandError::Interrupted { command });
		}
		tracing::debug!(%command, "Running command");

		let mut cmd = Command::new(invocation.program());
		cmd.args(invocation.get_args())
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());
		#[cfg(unix)]
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
		let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
			command: command.clone(),
			source,
		})?;

		if let Some(stdout) = child.stdout.take() {
			thread::spawn(move || self::forward_lines(stdout, "stdout"));
		}
		let stderr_tail = child.stderr.take().map(|stderr| {
			let (tail_tx, tail_rx) = mpsc::channel();
			thread::spawn(move || tail_tx.send(self::forward_lines(stderr, "stderr")));
			tail_rx
		});

		let start = Instant::now();
		let status = loop {
			match child.try_wait() {
				Ok(Some(status)) => break status,
				Ok(None) => (),
				Err(source) => {
					self::kill(&mut child, &command);
					return Err(CommandError::Wait { command, source });
				},
			}

			if self.is_interrupted(invocation) {
				self::kill(&mut child, &command);
				return Err(CommandError::Interrupted { command });
			}

			if let Some(timeout) = invocation.get_timeout() {
				if start.elapsed() >= timeout {
					self::kill(&mut child, &command);
					return Err(CommandError::Timeout { command, timeout });
				}
			}

			thread::sleep(POLL_INTERVAL);
		};

		// Note: Processes started by the command may keep its output open after it exits
		let drain_timeout = invocation
			.get_timeout()
			.map_or(OUTPUT_DRAIN_GRACE, |timeout| timeout.saturating_sub(start.elapsed()))
			.max(POLL_INTERVAL);
		let stderr_tail = match stderr_tail.map(|tail_rx| tail_rx.recv_timeout(drain_timeout)) {
			Some(Ok(tail)) => tail,
			Some(Err(mpsc::RecvTimeoutError::Timeout)) => {
				tracing::debug!(%command, "Command exited with its output still open, killing its process group");
				self::kill_group(&mut child, &command);
				VecDeque::new()
			},
			Some(Err(mpsc::RecvTimeoutError::Disconnected)) | None => VecDeque::new(),
		};

		match status.success() {
			true => Ok(()),
			false => Err(CommandError::Failed {
				command,
				status: status.to_string(),
				stderr: Vec::from(stderr_tail).join("\n"),
			}),
		}
	}
}

/// Kills `child` along with its process group and reaps it
fn kill(child: &mut Child, command: &str) {
	self::kill_group(child, command);
	if let Err(err) = child.wait() {
		tracing::warn!(%command, %err, "Unable to wait for killed command");
	}
}

/// Kills every process in the process group of `child`
#[cfg(unix)]
fn kill_group(child: &mut Child, command: &str) {
	let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
		return;
	};

	// SAFETY: `killpg` only sends a signal, it doesn't touch our memory
	if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
		let err = io::Error::last_os_error();
		if err.raw_os_error() != Some(libc::ESRCH) {
			tracing::warn!(%command, %err, "Unable to kill command");
		}
	}
}

/// Kills every process in the process group of `child`
#[cfg(not(unix))]
fn kill_group(child: &mut Child, command: &str) {
	if let Err(err) = child.kill() {
		tracing::warn!(%command, %err, "Unable to kill command");
	}
}

/// Forwards every line of `reader` to the log, returning the last few lines
fn forward_lines(reader: impl io::Read, stream: &'static str) -> VecDeque<String> {
	let mut reader = io::BufReader::new(reader);
	let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
	let mut line = vec![];
	loop {
		line.clear();
		match reader.read_until(b'\n', &mut line) {
			Ok(0) => break,
			Ok(_) => (),
			Err(err) => {
				tracing::warn!(stream, %err, "Unable to read command output");
				break;
			},
		}

		let line = String::from_utf8_lossy(&line).trim_end().to_owned();
		tracing::debug!(target: "es_eval::command::output", stream, "{line}");

		if tail.len() == STDERR_TAIL_LINES {
			tail.pop_front();
		}
		tail.push_back(line);
	}

	tail
}

/// Command error
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("Unable to spawn `{command}`")]
	Spawn {
		command: String,
		#[source]
		source:  io::Error,
	},

	#[error("Unable to wait for `{command}`")]
	Wait {
		command: String,
		#[source]
		source:  io::Error,
	},

	#[error("`{command}` timed out after {timeout:?}")]
	Timeout { command: String, timeout: Duration },

	#[error("`{command}` was interrupted")]
	Interrupted { command: String },

	#[error("`{command}` failed ({status}){}", DisplayStderr(.stderr))]
	Failed {
		command: String,
		status:  String,
		stderr:  String,
	},
}

impl CommandError {
	/// Returns whether `err` was caused by an interrupt
	pub fn is_interrupt(err: &anyhow::Error) -> bool {
		err.chain()
			.any(|cause| matches!(cause.downcast_ref::<Self>(), Some(Self::Interrupted { .. })))
	}
}

/// Displays the stderr tail of a failed command, if any
struct DisplayStderr<'a>(&'a str);

impl fmt::Display for DisplayStderr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.is_empty() {
			true => Ok(()),
			false => write!(f, ":\n{}", self.0),
		}
	}
}
