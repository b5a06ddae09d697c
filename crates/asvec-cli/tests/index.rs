mod common;

use std::io::Write;

use asvec::output::yaml;
use asvec_client::memory::{MemoryCluster, Request};
use asvec_client::{DistanceMetric, HealerParams, HnswIndexUpdate, IndexDefinition, IndexId};
use chrono::DateTime;
use common::{run, run_with_input};
use pretty_assertions::assert_eq;

fn with_index(name: &str) -> MemoryCluster {
    let cluster = MemoryCluster::standalone();
    cluster.add_index(IndexDefinition::new(
        IndexId::new("test", name),
        "v",
        4,
        DistanceMetric::Cosine,
    ));
    cluster
}

fn mutations(cluster: &MemoryCluster) -> Vec<Request> {
    cluster
        .requests()
        .into_iter()
        .filter(Request::is_mutation)
        .collect()
}

#[tokio::test]
async fn test_create_then_list_csv() {
    let cluster = MemoryCluster::standalone();
    let created = run(
        &cluster,
        &[
            "index", "create", "-y", "-n", "test", "-i", "index0", "-d", "256", "-m",
            "SQUARED_EUCLIDEAN", "--vector-field", "v", "--index-labels", "model=a,foo=bar",
        ],
    )
    .await;
    created.assert_success();
    assert_eq!(created.stdout, "Successfully created index test.index0\n");

    let stored = cluster.index("test", "index0").unwrap();
    assert_eq!(stored.labels.get("model").map(String::as_str), Some("a"));
    assert_eq!(stored.labels.get("foo").map(String::as_str), Some("bar"));
    assert!(stored.hnsw_params.is_empty());

    let listed = run(&cluster, &["index", "list", "--format", "1"]).await;
    listed.assert_success();
    assert!(
        listed.stdout.contains(",index0,test,,v,256,SQUARED_EUCLIDEAN,0"),
        "{}",
        listed.stdout
    );
    assert_eq!(cluster.open_clients(), 0);
}

#[tokio::test]
async fn test_host_and_seeds_rejected_before_connecting() {
    let cluster = MemoryCluster::standalone();
    let outcome = run(
        &cluster,
        &["--host", "1.1.1.1:3001", "--seeds", "2.2.2.2:3000", "index", "list"],
    )
    .await;
    outcome.assert_failure();
    assert!(outcome.stderr.contains("only --seeds or --host allowed"));
    assert!(cluster.requests().is_empty());
}

#[tokio::test]
async fn test_create_lists_every_missing_flag() {
    let cluster = MemoryCluster::standalone();
    let outcome = run(&cluster, &["index", "create", "-y", "-n", "test"]).await;
    outcome.assert_failure();
    assert!(
        outcome.stderr.contains(
            "required flag(s) \"dimension\", \"distance-metric\", \"index-name\", \"vector-field\" not set"
        ),
        "{}",
        outcome.stderr
    );
    assert!(cluster.requests().is_empty());
}

#[tokio::test]
async fn test_zero_dimension_rejected_before_sending() {
    let cluster = MemoryCluster::standalone();
    let outcome = run(
        &cluster,
        &["index", "create", "-y", "-n", "test", "-i", "idx", "-d", "0", "-m", "COSINE", "-f", "v"],
    )
    .await;
    outcome.assert_failure();
    assert!(mutations(&cluster).is_empty());
}

#[tokio::test]
async fn test_update_sends_only_given_healer_field() {
    let cluster = with_index("idx");
    let outcome = run(
        &cluster,
        &["index", "update", "-y", "-n", "test", "-i", "idx", "--hnsw-healer-parallelism", "10"],
    )
    .await;
    outcome.assert_success();
    assert_eq!(outcome.stdout, "Successfully updated index test.idx\n");

    let expected = HnswIndexUpdate {
        healer_params: Some(HealerParams {
            parallelism: Some(10),
            ..HealerParams::default()
        }),
        ..HnswIndexUpdate::default()
    };
    assert_eq!(
        mutations(&cluster),
        vec![Request::IndexUpdate {
            id: IndexId::new("test", "idx"),
            labels: None,
            update: expected,
        }]
    );
}

#[tokio::test]
async fn test_drop_declined_sends_nothing() {
    let cluster = with_index("idx");
    let outcome = run_with_input(&cluster, &["index", "drop", "-n", "test", "-i", "idx"], "n\n").await;
    outcome.assert_success();
    assert_eq!(
        outcome.stdout,
        "Are you sure you want to drop the index test.idx? (y/n): "
    );
    assert!(cluster.requests().is_empty());
    assert!(cluster.index("test", "idx").is_some());
}

#[tokio::test]
async fn test_drop_confirmed() {
    let cluster = with_index("idx");
    let outcome = run_with_input(&cluster, &["index", "drop", "-n", "test", "-i", "idx"], "y\n").await;
    outcome.assert_success();
    assert!(outcome.stdout.ends_with("Successfully dropped index test.idx\n"));
    assert!(cluster.index("test", "idx").is_none());
}

#[tokio::test]
async fn test_drop_with_yes_reads_no_input() {
    let cluster = with_index("idx");
    // The scripted answer would decline; --yes must not consult it.
    let outcome = run_with_input(&cluster, &["index", "drop", "-y", "-n", "test", "-i", "idx"], "n\n").await;
    outcome.assert_success();
    assert_eq!(outcome.stdout, "Successfully dropped index test.idx\n");
    assert!(cluster.index("test", "idx").is_none());
}

#[tokio::test]
async fn test_gc_epoch_cutoff_is_sent() {
    let cluster = with_index("idx");
    let outcome = run(&cluster, &["index", "gc", "-n", "test", "-i", "idx", "-c", "0"]).await;
    outcome.assert_success();
    assert_eq!(
        cluster.last_gc("test", "idx"),
        Some(DateTime::UNIX_EPOCH)
    );
}

#[tokio::test]
async fn test_list_csv_is_stable() {
    let cluster = with_index("b");
    cluster.add_index(IndexDefinition::new(
        IndexId::new("test", "a"),
        "v",
        8,
        DistanceMetric::DotProduct,
    ));
    let first = run(&cluster, &["index", "ls", "--format", "1"]).await;
    let second = run(&cluster, &["index", "ls", "--format", "1"]).await;
    first.assert_success();
    assert_eq!(first.stdout, second.stdout);
    let a = first.stdout.find(",a,").unwrap();
    let b = first.stdout.find(",b,").unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn test_create_from_file_round_trips_through_yaml() {
    let text = "\
indices:
- id:
    namespace: test
    name: one
  field: v
  dimensions: 3
  distance_metric: COSINE
  labels:
    model: a
  hnsw_params:
    m: 32
    healer_params:
      parallelism: 2
- id:
    namespace: test
    name: two
  field: w
  dimensions: 2
  distance_metric: HAMMING
  set_filter: s
";
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let path = file.path().to_str().unwrap();

    let cluster = MemoryCluster::standalone();
    let created = run(&cluster, &["index", "create", "-y", "--file", path]).await;
    created.assert_success();
    assert!(created.stdout.contains("Created 2 of 2 indexes"));

    let listed = run(&cluster, &["index", "ls", "--yaml"]).await;
    listed.assert_success();
    assert_eq!(yaml::parse(&listed.stdout).unwrap(), yaml::parse(text).unwrap());
}

#[tokio::test]
async fn test_create_from_file_reports_partial_failure() {
    let cluster = with_index("one");
    let text = "\
indices:
- {id: {namespace: test, name: one}, field: v, dimensions: 3, distance_metric: COSINE}
- {id: {namespace: test, name: two}, field: v, dimensions: 3, distance_metric: COSINE}
";
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let outcome = run(
        &cluster,
        &["index", "create", "-y", "--file", file.path().to_str().unwrap()],
    )
    .await;
    outcome.assert_failure();
    assert!(outcome.stdout.contains("Successfully created index test.two"));
    assert!(outcome.stdout.contains("Created 1 of 2 indexes"));
    assert!(outcome.stderr.contains("Failed to create index test.one"));
}
