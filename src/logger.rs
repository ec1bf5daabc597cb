use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag};
use nix::libc;
use nix::unistd::{dup2, execvp, fork, pipe, ForkResult, Pid};

/// Program the supervised streams are piped into. Resolved through `PATH`.
pub const LOGGER_COMMAND: &str = "logger";

/// One of the two output streams a sink can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
	Stdout,
	Stderr,
}

impl Stream {
	pub fn fd(self) -> RawFd {
		match self {
			Stream::Stdout => libc::STDOUT_FILENO,
			Stream::Stderr => libc::STDERR_FILENO,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Stream::Stdout => "stdout",
			Stream::Stderr => "stderr",
		}
	}
}

/// Errors from attaching a log sink.
#[derive(Debug)]
pub enum AttachError {
	/// pipe(2) failed, typically descriptor exhaustion.
	Pipe(Errno),
	/// fork(2) failed, typically process-table exhaustion.
	Fork(Errno),
	/// Rewiring the stream onto the pipe failed in the supervisor.
	Redirect(Errno),
}

impl std::fmt::Display for AttachError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AttachError::Pipe(e) => write!(f, "couldn't create a pipe: {}", e),
			AttachError::Fork(e) => write!(f, "couldn't fork to start {}: {}", LOGGER_COMMAND, e),
			AttachError::Redirect(e) => {
				write!(f, "couldn't attach the pipe to {}: {}", LOGGER_COMMAND, e)
			}
		}
	}
}

impl std::error::Error for AttachError {}

/// Attach a fresh `logger -p <priority> -t <tag>` process to `stream`.
///
/// Whatever the stream pointed at before is closed, and writes to it flow
/// into the new sink's stdin from here on. The previous sink for the stream,
/// if any, sees end-of-input once its last open write descriptor is gone and
/// exits on its own; it is reaped incidentally by [`crate::target::wait_for`].
pub fn attach(stream: Stream, priority: &str, tag: &str) -> Result<Pid, AttachError> {
	let argv = sink_argv(priority, tag);
	let (write_end, sink) = spawn_sink(&argv)?;

	dup2_retry(write_end.as_raw_fd(), stream.fd()).map_err(AttachError::Redirect)?;
	tracing::debug!("{} sink attached (pid {})", stream.name(), sink);

	// write_end drops here: the stream descriptor now holds the write side
	Ok(sink)
}

/// Spawn a sink process reading from a fresh pipe. Returns the pipe's write
/// end and the sink's pid. `argv` must be non-empty; it is exec'd with its
/// inherited stdout and stderr marked close-on-exec (see [`set_cloexec`]).
pub fn spawn_sink(argv: &[CString]) -> Result<(OwnedFd, Pid), AttachError> {
	let (read_end, write_end) = pipe().map_err(AttachError::Pipe)?;

	match unsafe { fork() } {
		Ok(ForkResult::Child) => become_sink(read_end, write_end, argv),
		Ok(ForkResult::Parent { child }) => {
			// the supervisor only writes; the sink holds the read side
			drop(read_end);
			Ok((write_end, child))
		}
		Err(e) => Err(AttachError::Fork(e)),
	}
}

/// Sink side of an attachment. Never returns.
fn become_sink(read_end: OwnedFd, write_end: OwnedFd, argv: &[CString]) -> ! {
	// Our inherited stdout and stderr may point at the previous cycle's sink
	// pipes. A sink that carries its predecessor's pipe past exec keeps that
	// predecessor from ever seeing end-of-input, and the chain grows without
	// bound. Don't close them yet though: exec failure below still needs a
	// stderr to report to. Errors ignored, the descriptors may already be
	// closed.
	let _ = set_cloexec(libc::STDOUT_FILENO);
	let _ = set_cloexec(libc::STDERR_FILENO);

	if let Err(e) = dup2_retry(read_end.as_raw_fd(), libc::STDIN_FILENO) {
		eprintln!("couldn't attach the pipe to the sink input: {}", e);
		process::exit(1);
	}

	// stdin holds the read side now; the sink must not keep the write side
	// open or it would never see end-of-input
	drop(read_end);
	drop(write_end);

	if let Err(e) = execvp(&argv[0], argv) {
		eprintln!("couldn't execute {}: {}", argv[0].to_string_lossy(), e);
	}
	process::exit(1)
}

/// Mark a descriptor so it does not survive exec. The descriptor itself
/// stays open.
pub fn set_cloexec(fd: RawFd) -> nix::Result<()> {
	let flags = fcntl(fd, FcntlArg::F_GETFD)?;
	let flags = FdFlag::from_bits_retain(flags) | FdFlag::FD_CLOEXEC;
	fcntl(fd, FcntlArg::F_SETFD(flags))?;
	Ok(())
}

fn dup2_retry(oldfd: RawFd, newfd: RawFd) -> nix::Result<RawFd> {
	loop {
		match dup2(oldfd, newfd) {
			Err(Errno::EINTR) => {}
			other => return other,
		}
	}
}

fn sink_argv(priority: &str, tag: &str) -> Vec<CString> {
	// prepared before forking; argv strings come from exec and can't contain NUL
	[LOGGER_COMMAND, "-p", priority, "-t", tag]
		.iter()
		.map(|s| CString::new(*s).unwrap_or_default())
		.collect()
}
