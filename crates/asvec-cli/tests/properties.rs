//! Invariants that hold across every combination of flags.

mod common;

use asvec_client::memory::MemoryCluster;
use proptest::prelude::*;

/// Required `index create` flags with a valid value each.
const CREATE_FLAGS: [(&str, &str, &str); 5] = [
    ("namespace", "-n", "test"),
    ("index-name", "-i", "idx"),
    ("vector-field", "-f", "v"),
    ("dimension", "-d", "8"),
    ("distance-metric", "-m", "COSINE"),
];

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_missing_create_flags_are_all_listed(present in proptest::collection::vec(any::<bool>(), 5)) {
        prop_assume!(present.iter().any(|p| !p));

        let mut args = vec!["index", "create", "-y"];
        let mut missing = Vec::new();
        for ((name, flag, value), present) in CREATE_FLAGS.iter().zip(&present) {
            if *present {
                args.extend([*flag, *value]);
            } else {
                missing.push(*name);
            }
        }
        missing.sort_unstable();
        let expected = format!(
            "required flag(s) {} not set",
            missing.iter().map(|m| format!("\"{m}\"")).collect::<Vec<_>>().join(", ")
        );

        let cluster = MemoryCluster::standalone();
        let outcome = block_on(common::run(&cluster, &args));
        prop_assert_eq!(outcome.code, 1);
        prop_assert!(outcome.stderr.contains(&expected), "{}", outcome.stderr);
        prop_assert!(cluster.requests().is_empty());
    }

    #[test]
    fn prop_yes_never_reads_input(name in "[a-z]{1,8}") {
        let cluster = MemoryCluster::standalone();
        cluster.add_user(&name, "pw", &["read-write"]);
        let outcome = block_on(common::run_with_input(
            &cluster,
            &["user", "drop", "-y", "--name", &name],
            "n\n",
        ));
        prop_assert_eq!(outcome.code, 0);
        prop_assert!(!outcome.stdout.contains("(y/n)"));
        prop_assert!(cluster.user_roles(&name).is_none());
    }
}
