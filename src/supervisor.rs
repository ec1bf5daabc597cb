use std::thread;
use std::time::SystemTime;

use crate::backoff;
use crate::logger::{self, Stream};
use crate::target::{self, TargetExit};

/// Exit status when invoked with too few arguments.
pub const EXIT_USAGE: i32 = 100;
/// Exit status when the stdout sink couldn't be attached.
pub const EXIT_STDOUT_ATTACH: i32 = 1;
/// Exit status when the stderr sink couldn't be attached.
pub const EXIT_STDERR_ATTACH: i32 = 2;
/// Exit status when the target program couldn't be spawned.
pub const EXIT_TARGET_SPAWN: i32 = 3;

pub struct SupervisorConfig {
	/// Tag both sinks log under.
	pub tag: String,
	/// Syslog priority for the target's stdout, e.g. `user.info`.
	pub stdout_priority: String,
	/// Syslog priority for the target's stderr, e.g. `user.err`.
	pub stderr_priority: String,
	/// Target command line; must be non-empty.
	pub command: Vec<String>,
}

/// Supervise `config.command` forever: attach fresh sinks to stdout and
/// stderr, run the target, reap it, report how it ended, wait out the rest
/// of the respawn floor, repeat. Returns only on a fatal setup failure,
/// yielding the process exit status.
pub fn run(config: &SupervisorConfig) -> i32 {
	let program = &config.command[0];
	tracing::info!("supervising {} (pid {})", program, std::process::id());

	loop {
		if let Err(e) = logger::attach(Stream::Stdout, &config.stdout_priority, &config.tag) {
			eprintln!("failed to attach stdout logger: {}", e);
			return EXIT_STDOUT_ATTACH;
		}
		if let Err(e) = logger::attach(Stream::Stderr, &config.stderr_priority, &config.tag) {
			eprintln!("failed to attach stderr logger: {}", e);
			return EXIT_STDERR_ATTACH;
		}

		// both streams feed the freshly attached sinks from here
		println!("Running {}", program);
		let started = SystemTime::now();

		let child = match target::spawn(&config.command) {
			Ok(pid) => pid,
			Err(e) => {
				eprintln!("{}", e);
				return EXIT_TARGET_SPAWN;
			}
		};

		let exit = target::wait_for(child);
		tracing::debug!("target {} reaped: {:?}", child, exit);

		match exit {
			TargetExit::Exited(0) => println!("{} finished successfully", program),
			TargetExit::Exited(code) => eprintln!("{} exited with status {}", program, code),
			TargetExit::Signaled(signal) => {
				eprintln!("{} was terminated by signal {}", program, signal)
			}
		}

		if let Some(delay) = backoff::remaining_delay(started, SystemTime::now()) {
			println!("Waiting {}s before respawning {}", delay.as_secs(), program);
			thread::sleep(delay);
		}
	}
}
