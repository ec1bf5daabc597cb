use akaza::supervisor::{self, SupervisorConfig};
use owo_colors::OwoColorize;

fn main() {
	akaza::logging::init();

	let args: Vec<String> = std::env::args().skip(1).collect();
	if args.len() < 4 {
		print_usage();
		std::process::exit(supervisor::EXIT_USAGE);
	}

	let config = SupervisorConfig {
		tag: args[0].clone(),
		stdout_priority: args[1].clone(),
		stderr_priority: args[2].clone(),
		command: args[3..].to_vec(),
	};

	std::process::exit(supervisor::run(&config));
}

fn print_usage() {
	eprintln!(
		"{} {} — respawning process supervisor",
		"akaza".bold(),
		env!("CARGO_PKG_VERSION")
	);
	eprintln!();
	eprintln!(
		"usage: {} <tag> <stdout-priority> <stderr-priority> <command> [args...]",
		"akaza".bold()
	);
	eprintln!();
	eprintln!(
		"runs <command>, piping its stdout to `{}` and its",
		"logger -p <stdout-priority> -t <tag>".cyan()
	);
	eprintln!(
		"stderr to `{}`; restarts <command> if it dies,",
		"logger -p <stderr-priority> -t <tag>".cyan()
	);
	eprintln!("waiting for up to a minute first if it's dying quickly.");
	eprintln!();
	eprintln!("example:");
	eprintln!("  akaza someprogram user.info user.err /usr/bin/someprogram");
}
