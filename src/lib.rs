//! # akaza
//!
//! Respawning process supervisor.
//!
//! Runs a target command with its stdout and stderr piped into separate
//! `logger(1)` processes (one syslog priority each, sharing one tag), reaps
//! the command when it dies, reports how it ended, and starts it again,
//! never more often than once a minute.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use akaza::supervisor::{self, SupervisorConfig};
//!
//! let config = SupervisorConfig {
//!     tag: "myapp".into(),
//!     stdout_priority: "user.info".into(),
//!     stderr_priority: "user.err".into(),
//!     command: vec!["/usr/bin/myapp".into()],
//! };
//! std::process::exit(supervisor::run(&config));
//! ```

pub mod backoff;
pub mod logger;
pub mod logging;
pub mod supervisor;
pub mod target;

pub use logger::{AttachError, Stream};
pub use supervisor::SupervisorConfig;
pub use target::TargetExit;
