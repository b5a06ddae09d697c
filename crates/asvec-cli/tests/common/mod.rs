//! Runs the tool in-process against a [`MemoryCluster`].

#![allow(dead_code)]

use asvec::Session;
use asvec::config::Env;
use asvec::prompt::Input;
use asvec::view::{SharedBuffer, View};
use asvec_client::memory::MemoryCluster;
use tokio_util::sync::CancellationToken;

/// What one invocation left behind.
#[derive(Debug)]
pub struct Outcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn assert_success(&self) -> &Self {
        assert_eq!(self.code, 0, "stdout:\n{}\nstderr:\n{}", self.stdout, self.stderr);
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert_eq!(self.code, 1, "stdout:\n{}\nstderr:\n{}", self.stdout, self.stderr);
        self
    }
}

/// Runs `asvec <args>` with no input and an empty environment.
pub async fn run(cluster: &MemoryCluster, args: &[&str]) -> Outcome {
    run_with(cluster, args, "", Env::default()).await
}

/// Runs `asvec <args>`, answering prompts from `input` line by line.
pub async fn run_with_input(cluster: &MemoryCluster, args: &[&str], input: &str) -> Outcome {
    run_with(cluster, args, input, Env::default()).await
}

pub async fn run_with(cluster: &MemoryCluster, args: &[&str], input: &str, env: Env) -> Outcome {
    let out = SharedBuffer::new();
    let err = SharedBuffer::new();
    let mut session = Session {
        view: View::captured(&out, &err),
        input: Input::scripted(input),
        env,
        connector: cluster,
        shutdown: CancellationToken::new(),
        argv: Vec::new(),
        signals: false,
    };

    let argv = std::iter::once("asvec")
        .chain(args.iter().copied())
        .map(String::from)
        .collect();
    let code = asvec::run(argv, &mut session).await;
    Outcome {
        code,
        stdout: out.contents(),
        stderr: err.contents(),
    }
}
