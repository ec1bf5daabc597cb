use std::time::{Duration, SystemTime};

/// Minimum wall-clock length of one supervision cycle, measured from the
/// start of one attempt to the start of the next.
pub const RESPAWN_FLOOR: Duration = Duration::from_secs(60);

/// How long to hold off before the next attempt, given when the last one
/// started and ended. `None` means respawn immediately.
///
/// Wall-clock timestamps: `end` earlier than `start` means the clock was
/// reset mid-attempt, and the wait is skipped rather than computed from a
/// meaningless elapsed time.
pub fn remaining_delay(start: SystemTime, end: SystemTime) -> Option<Duration> {
	match end.duration_since(start) {
		Ok(elapsed) if elapsed < RESPAWN_FLOOR => Some(RESPAWN_FLOOR - elapsed),
		_ => None,
	}
}
