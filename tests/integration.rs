use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant, SystemTime};

use akaza::backoff;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_dir(name: &str) -> PathBuf {
	let n = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
	let dir = std::env::temp_dir().join(format!("akaza-test-{}-{}", n, name));
	let _ = fs::create_dir_all(&dir);
	dir
}

fn akaza() -> Command {
	Command::new(env!("CARGO_BIN_EXE_akaza"))
}

// The supervisor resolves its sink with execvp, so a stub `logger` placed
// first on PATH captures everything a real one would send to syslog. It
// appends its stdin to <dir>/<priority>.log ($2 is the -p value).
fn write_stub_logger(dir: &Path) {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join("logger");
	fs::write(&path, "#!/bin/sh\nexec cat >> \"$AKAZA_TEST_DIR/$2.log\"\n").unwrap();
	let mut perms = fs::metadata(&path).unwrap().permissions();
	perms.set_mode(0o755);
	fs::set_permissions(&path, perms).unwrap();
}

fn spawn_supervised(dir: &Path, target: &[&str]) -> Child {
	write_stub_logger(dir);
	let path_env = format!(
		"{}:{}",
		dir.display(),
		std::env::var("PATH").unwrap_or_default()
	);

	let mut args = vec!["myapp", "user.info", "user.err"];
	args.extend_from_slice(target);

	akaza()
		.args(&args)
		.env("PATH", &path_env)
		.env("AKAZA_TEST_DIR", dir)
		.stdout(Stdio::piped())
		.spawn()
		.unwrap()
}

fn wait_for_line(path: &Path, needle: &str) -> String {
	let deadline = Instant::now() + Duration::from_secs(10);
	loop {
		let contents = fs::read_to_string(path).unwrap_or_default();
		if contents.contains(needle) || Instant::now() > deadline {
			return contents;
		}
		std::thread::sleep(Duration::from_millis(50));
	}
}

// --- Usage ---

#[test]
fn no_arguments_exits_100_with_usage() {
	let output = akaza().output().unwrap();
	assert_eq!(output.status.code(), Some(100));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("usage:"), "stderr was: {}", stderr);
	assert!(output.stdout.is_empty());
}

#[test]
fn three_arguments_exits_100_with_usage() {
	let output = akaza()
		.args(["myapp", "user.info", "user.err"])
		.output()
		.unwrap();
	assert_eq!(output.status.code(), Some(100));
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("usage:"), "stderr was: {}", stderr);
	assert!(output.stdout.is_empty());
}

// --- Supervision scenarios ---

#[test]
fn successful_run_reports_on_stdout_sink_then_waits() {
	let dir = temp_dir("success");
	let mut child = spawn_supervised(&dir, &["/bin/true"]);

	let out = wait_for_line(&dir.join("user.info.log"), "before respawning");
	let _ = child.kill();

	assert!(out.contains("Running /bin/true"), "stdout sink got: {}", out);
	assert!(
		out.contains("/bin/true finished successfully"),
		"stdout sink got: {}",
		out
	);

	// /bin/true exits in well under a minute, so nearly the whole floor remains
	let wait_line = out
		.lines()
		.find(|l| l.starts_with("Waiting"))
		.unwrap_or_else(|| panic!("no wait notice in: {}", out));
	assert!(wait_line.ends_with("before respawning /bin/true"));
	let secs: u64 = wait_line
		.strip_prefix("Waiting ")
		.unwrap()
		.split_once('s')
		.unwrap()
		.0
		.parse()
		.unwrap();
	assert!((50..=60).contains(&secs), "unexpected wait: {}", wait_line);

	// the stderr sink was attached too, and saw nothing
	assert_eq!(
		fs::read_to_string(dir.join("user.err.log")).unwrap_or_default(),
		""
	);

	// nothing leaked to the supervisor's original stdout
	let output = child.wait_with_output().unwrap();
	assert!(output.stdout.is_empty());

	let _ = fs::remove_dir_all(&dir);
}

#[test]
fn failing_run_reports_status_on_stderr_sink() {
	let dir = temp_dir("failure");
	let mut child = spawn_supervised(&dir, &["/bin/false"]);

	let err = wait_for_line(&dir.join("user.err.log"), "exited with status");
	let _ = child.kill();
	let _ = child.wait();

	assert!(
		err.contains("/bin/false exited with status 1"),
		"stderr sink got: {}",
		err
	);

	// the run notice goes to the stdout sink, the failure report does not
	let out = wait_for_line(&dir.join("user.info.log"), "Running /bin/false");
	assert!(out.contains("Running /bin/false"), "stdout sink got: {}", out);
	assert!(!out.contains("exited with status"), "stdout sink got: {}", out);

	let _ = fs::remove_dir_all(&dir);
}

#[test]
fn signalled_run_reports_signal_on_stderr_sink() {
	let dir = temp_dir("signal");
	let mut child = spawn_supervised(&dir, &["/bin/sh", "-c", "kill -TERM $$"]);

	let err = wait_for_line(&dir.join("user.err.log"), "terminated by signal");
	let _ = child.kill();
	let _ = child.wait();

	assert!(
		err.contains("/bin/sh was terminated by signal 15"),
		"stderr sink got: {}",
		err
	);

	let _ = fs::remove_dir_all(&dir);
}

// --- Backoff arithmetic ---

#[test]
fn backoff_short_attempt_waits_out_the_floor() {
	let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
	let end = start + Duration::from_secs(12);
	assert_eq!(
		backoff::remaining_delay(start, end),
		Some(Duration::from_secs(48))
	);
}

#[test]
fn backoff_instant_exit_waits_the_whole_floor() {
	let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
	assert_eq!(
		backoff::remaining_delay(start, start),
		Some(backoff::RESPAWN_FLOOR)
	);
}

#[test]
fn backoff_subsecond_precision() {
	let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
	let end = start + Duration::from_millis(59_500);
	assert_eq!(
		backoff::remaining_delay(start, end),
		Some(Duration::from_millis(500))
	);
}

#[test]
fn backoff_long_attempt_respawns_immediately() {
	let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
	assert_eq!(
		backoff::remaining_delay(start, start + Duration::from_secs(60)),
		None
	);
	assert_eq!(
		backoff::remaining_delay(start, start + Duration::from_secs(3600)),
		None
	);
}

#[test]
fn backoff_clock_gone_backwards_respawns_immediately() {
	let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
	let end = start - Duration::from_secs(5);
	assert_eq!(backoff::remaining_delay(start, end), None);
}
