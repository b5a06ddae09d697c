//! Diagnostic logging to stderr.

use crate::flags::LogLevel;

/// Installs the global subscriber. Without a level nothing is installed and
/// every event is dropped.
pub fn init(level: Option<LogLevel>, ansi: bool) {
    let Some(level) = level else {
        return;
    };
    // A second install, as in tests that run many commands, keeps the first.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}
