use std::ffi::CString;
use std::process;

use nix::errno::Errno;
use nix::sys::wait::{wait, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};

/// How a supervised program came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetExit {
	/// Normal exit with the given status.
	Exited(i32),
	/// Killed by the given signal.
	Signaled(i32),
}

/// Spawn the target command. `command` must be non-empty; the first element
/// is resolved through `PATH`. The child inherits the currently attached
/// sinks on stdout and stderr.
pub fn spawn(command: &[String]) -> Result<Pid, String> {
	let argv = c_argv(command);

	match unsafe { fork() } {
		Ok(ForkResult::Child) => become_target(&argv),
		Ok(ForkResult::Parent { child }) => {
			tracing::debug!("target spawned (pid {})", child);
			Ok(child)
		}
		Err(e) => Err(format!("couldn't fork to start {}: {}", command[0], e)),
	}
}

/// Target side of a spawn. Never returns; an exec failure is reported on the
/// child's (redirected) stderr and surfaces to the supervisor as an ordinary
/// nonzero exit through the reap path, never as a supervisor failure.
fn become_target(argv: &[CString]) -> ! {
	if let Err(e) = execvp(&argv[0], argv) {
		eprintln!("couldn't execute {}: {}", argv[0].to_string_lossy(), e);
	}
	process::exit(4)
}

/// Block until `child` terminates and classify its end.
///
/// wait(2) reaps any finished child, and superseded sinks are also children
/// of the supervisor, so results for other identities are discarded rather
/// than waited on by pid: that is what reaps a sink that exited after losing
/// its feed.
pub fn wait_for(child: Pid) -> TargetExit {
	loop {
		match wait() {
			Ok(WaitStatus::Exited(pid, code)) if pid == child => {
				return TargetExit::Exited(code);
			}
			Ok(WaitStatus::Signaled(pid, signal, _)) if pid == child => {
				return TargetExit::Signaled(signal as i32);
			}
			// some other child finished, usually a superseded sink
			Ok(_) => {}
			Err(Errno::EINTR) => {}
			// only ECHILD remains, unreachable while the target is un-reaped
			Err(_) => {}
		}
	}
}

fn c_argv(command: &[String]) -> Vec<CString> {
	// prepared before forking; argv strings come from exec and can't contain NUL
	command
		.iter()
		.map(|s| CString::new(s.as_str()).unwrap_or_default())
		.collect()
}
