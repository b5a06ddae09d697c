//! Periodic re-rendering for `--watch`.

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::flags::WatchArgs;
use crate::view::View;

/// Moves the cursor up one line and clears it.
const CLEAR_LINE: &str = "\x1b[1A\x1b[2K";

/// Drives a command's render step, once or until shutdown.
pub struct Watch {
    /// The invocation, echoed under the watch header.
    pub argv: Vec<String>,
    pub shutdown: CancellationToken,
    /// Install SIGINT/SIGTERM handlers that trigger `shutdown`.
    pub signals: bool,
}

impl Watch {
    /// Runs `render` once, or with `--watch` every interval until shutdown.
    ///
    /// Each refresh erases the lines written by the previous one. A failed
    /// render stops the loop and is returned.
    pub async fn run<F>(&self, view: &mut View, args: &WatchArgs, mut render: F) -> Result<()>
    where
        F: AsyncFnMut(&mut View) -> Result<()>,
    {
        if !args.watch {
            return render(view).await;
        }
        if self.signals {
            listen_for_signals(self.shutdown.clone());
        }

        let mut ticker = tokio::time::interval(args.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let command = format!("> {}", strip_watch_flags(&self.argv).join(" "));
        view.reset_line_count();

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            view.write_raw(&CLEAR_LINE.repeat(view.line_count()));
            view.reset_line_count();
            view.print(format!(
                "Watch mode: refresh every {} seconds (press Ctrl+C to exit) - Last update: {}",
                args.interval,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
            view.print(&command);
            view.newline();

            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => return Ok(()),
                result = render(view) => result?,
            }
        }
    }
}

/// Drops `--watch` and `--watch-interval` from an argument list.
pub fn strip_watch_flags(argv: &[String]) -> Vec<String> {
    let mut kept = Vec::with_capacity(argv.len());
    let mut args = argv.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--watch" => {}
            "--watch-interval" => {
                args.next();
            }
            _ if arg.starts_with("--watch-interval=") => {}
            _ => kept.push(arg.clone()),
        }
    }
    kept
}

fn listen_for_signals(shutdown: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::debug!("shutdown signal received");
        shutdown.cancel();
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::error::CliError;
    use crate::view::SharedBuffer;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| (*a).to_string()).collect()
    }

    fn watch(shutdown: &CancellationToken) -> Watch {
        Watch {
            argv: argv(&["asvec", "node", "ls", "--watch", "--watch-interval", "1"]),
            shutdown: shutdown.clone(),
            signals: false,
        }
    }

    #[test]
    fn test_strip_watch_flags() {
        assert_eq!(
            strip_watch_flags(&argv(&["asvec", "index", "ls", "--watch", "--watch-interval", "5", "-v"])),
            argv(&["asvec", "index", "ls", "-v"])
        );
        assert_eq!(
            strip_watch_flags(&argv(&["asvec", "--watch-interval=3", "user", "ls"])),
            argv(&["asvec", "user", "ls"])
        );
    }

    proptest! {
        #[test]
        fn test_strip_is_idempotent(args in prop::collection::vec("(--watch|--watch-interval|-v|[a-z0-9=]{1,6})", 0..8)) {
            let once = strip_watch_flags(&args);
            prop_assert_eq!(strip_watch_flags(&once), once.clone());
            prop_assert!(once.iter().all(|a| a != "--watch" && a != "--watch-interval"));
        }

        #[test]
        fn test_strip_keeps_plain_args(args in prop::collection::vec("[a-z][a-z0-9-]{0,6}", 0..8)) {
            prop_assert_eq!(strip_watch_flags(&args), args);
        }
    }

    #[tokio::test]
    async fn test_single_render_without_watch() {
        let (out, err) = (SharedBuffer::new(), SharedBuffer::new());
        let mut view = View::captured(&out, &err);
        let shutdown = CancellationToken::new();
        let mut calls = 0;

        watch(&shutdown)
            .run(&mut view, &WatchArgs::default(), async |view: &mut View| {
                calls += 1;
                view.print("table");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(out.contents(), "table\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_until_cancelled() {
        let (out, err) = (SharedBuffer::new(), SharedBuffer::new());
        let mut view = View::captured(&out, &err);
        let shutdown = CancellationToken::new();
        let args = WatchArgs {
            watch: true,
            interval: 1,
        };
        let mut calls = 0;

        let token = shutdown.clone();
        watch(&shutdown)
            .run(&mut view, &args, async |view: &mut View| {
                calls += 1;
                view.print(format!("render {calls}"));
                if calls == 3 {
                    token.cancel();
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(calls, 3);
        let text = out.contents();
        assert_eq!(text.matches("Watch mode: refresh every 1 seconds").count(), 3);
        assert!(text.contains("> asvec node ls\n"));
        assert!(text.contains(&CLEAR_LINE.repeat(4)));
        assert!(text.ends_with("render 3\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_error_stops_loop() {
        let (out, err) = (SharedBuffer::new(), SharedBuffer::new());
        let mut view = View::captured(&out, &err);
        let shutdown = CancellationToken::new();
        let args = WatchArgs {
            watch: true,
            interval: 1,
        };

        let result = watch(&shutdown)
            .run(&mut view, &args, async |_view: &mut View| {
                Err(CliError::Arg("boom".to_string()))
            })
            .await;

        assert!(matches!(result, Err(CliError::Arg(_))));
    }
}
