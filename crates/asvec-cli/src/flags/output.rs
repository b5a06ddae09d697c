use std::time::Duration;

use clap::Args;

use crate::output::RenderMode;

/// Hidden output selector. `1` renders CSV.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FormatArgs {
    #[arg(long, hide = true, default_value_t = 0)]
    pub format: u8,
}

impl FormatArgs {
    pub fn mode(&self) -> RenderMode {
        RenderMode::from_format(self.format)
    }
}

/// Re-run the command periodically and redraw its output in place.
#[derive(Args, Debug, Clone, Copy)]
pub struct WatchArgs {
    /// Redraw the output periodically until interrupted.
    #[arg(long)]
    pub watch: bool,

    /// Seconds between redraws.
    #[arg(
        long = "watch-interval",
        value_name = "seconds",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval: u64,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            watch: false,
            interval: 2,
        }
    }
}

impl WatchArgs {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval)
    }
}
