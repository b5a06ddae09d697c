mod common;

use std::collections::BTreeMap;

use asvec_client::memory::{MemoryCluster, Request};
use asvec_client::{DistanceMetric, IndexDefinition, IndexId, Key, Record, Value, Vector};
use common::run;

fn record(vector: Value) -> Record {
    Record {
        generation: 1,
        data: BTreeMap::from([("v".to_string(), vector), ("name".to_string(), Value::Str("x".into()))]),
        ..Record::default()
    }
}

/// Index `test.idx` over field `v` with three float records.
fn float_cluster() -> MemoryCluster {
    let cluster = MemoryCluster::standalone();
    cluster.add_index(IndexDefinition::new(
        IndexId::new("test", "idx"),
        "v",
        2,
        DistanceMetric::SquaredEuclidean,
    ));
    for (key, v) in [("k1", [0.0, 0.0]), ("k2", [1.0, 1.0]), ("k3", [5.0, 5.0])] {
        cluster.insert_record("test", None, Key::from(key), record(Value::FloatVector(v.to_vec())));
    }
    cluster
}

fn searches(cluster: &MemoryCluster) -> Vec<Vector> {
    cluster
        .requests()
        .into_iter()
        .filter_map(|request| match request {
            Request::VectorSearch { query, .. } => Some(query),
            _ => None,
        })
        .collect()
}

/// The record keys from `keys` that appear in `output`, in order of
/// appearance.
fn keys_in_order<'a>(output: &str, keys: &[&'a str]) -> Vec<&'a str> {
    let mut found: Vec<(usize, &str)> = keys
        .iter()
        .filter_map(|key| output.find(&format!(",{key},")).map(|at| (at, *key)))
        .collect();
    found.sort();
    found.into_iter().map(|(_, key)| key).collect()
}

const KEYS: [&str; 3] = ["k1", "k2", "k3"];

#[tokio::test]
async fn test_missing_index() {
    let cluster = float_cluster();
    let outcome = run(&cluster, &["query", "-i", "dne", "-n", "test"]).await;
    outcome.assert_failure();
    assert!(outcome.stderr.contains("Failed to get index definition"), "{}", outcome.stderr);
    assert_eq!(cluster.open_clients(), 0);
}

#[tokio::test]
async fn test_query_requires_index_id() {
    let cluster = float_cluster();
    let outcome = run(&cluster, &["query"]).await;
    outcome.assert_failure();
    assert!(outcome.stderr.contains("required flag(s) \"index-name\", \"namespace\" not set"));
    assert!(cluster.requests().is_empty());
}

#[tokio::test]
async fn test_query_with_vector() {
    let cluster = float_cluster();
    let outcome = run(
        &cluster,
        &["query", "-n", "test", "-i", "idx", "-v", "[4.5,4.5]", "--format", "1", "-r", "2"],
    )
    .await;
    outcome.assert_success();
    assert_eq!(keys_in_order(&outcome.stdout, &KEYS), ["k3", "k2"]);
    assert!(!outcome.stdout.contains("Hint:"));
    assert_eq!(searches(&cluster), [Vector::Float(vec![4.5, 4.5])]);
}

#[tokio::test]
async fn test_query_by_key_leaves_out_probe_record() {
    let cluster = float_cluster();
    let outcome = run(&cluster, &["query", "-n", "test", "-i", "idx", "-k", "k1", "--format", "1"]).await;
    outcome.assert_success();
    assert_eq!(keys_in_order(&outcome.stdout, &KEYS), ["k2", "k3"]);
    assert!(outcome.stderr.contains("No set was given"));
    assert_eq!(searches(&cluster), [Vector::Float(vec![0.0, 0.0])]);
}

#[tokio::test]
async fn test_query_by_key_with_largest_max_results() {
    let cluster = float_cluster();
    let outcome = run(
        &cluster,
        &["query", "-n", "test", "-i", "idx", "-k", "k1", "-r", "4294967295", "--format", "1"],
    )
    .await;
    outcome.assert_success();
    assert_eq!(keys_in_order(&outcome.stdout, &KEYS), ["k2", "k3"]);
    let limits: Vec<u32> = cluster
        .requests()
        .into_iter()
        .filter_map(|request| match request {
            Request::VectorSearch { limit, .. } => Some(limit),
            _ => None,
        })
        .collect();
    assert_eq!(limits, [u32::MAX]);
}

#[tokio::test]
async fn test_query_missing_key_falls_back_to_zero_vector() {
    let cluster = float_cluster();
    let outcome = run(
        &cluster,
        &["query", "-n", "test", "-i", "idx", "-t", "42", "-s", "other", "--format", "1"],
    )
    .await;
    outcome.assert_success();
    assert!(outcome.stderr.contains("The requested record was not found"));
    assert_eq!(keys_in_order(&outcome.stdout, &KEYS), ["k1", "k2", "k3"]);
}

#[tokio::test]
async fn test_zero_query_falls_back_to_bool_vector() {
    let cluster = MemoryCluster::standalone();
    cluster.add_index(IndexDefinition::new(
        IndexId::new("test", "bits"),
        "v",
        3,
        DistanceMetric::Hamming,
    ));
    cluster.insert_record("test", None, Key::from("b1"), record(Value::BoolVector(vec![true, false, false])));

    let outcome = run(&cluster, &["query", "-n", "test", "-i", "bits", "--format", "1"]).await;
    outcome.assert_success();
    assert_eq!(keys_in_order(&outcome.stdout, &["b1"]), ["b1"]);
    assert_eq!(
        searches(&cluster),
        [Vector::Float(vec![0.0; 3]), Vector::Bool(vec![false; 3])]
    );
}

#[tokio::test]
async fn test_set_without_key_warns() {
    let cluster = float_cluster();
    let outcome = run(&cluster, &["query", "-n", "test", "-i", "idx", "-s", "s1", "--format", "1"]).await;
    outcome.assert_success();
    assert!(outcome.stderr.contains(
        "The --set flag is only used when the --key-str or --key-int flag is set."
    ));
}

#[tokio::test]
async fn test_table_output_has_hints() {
    let cluster = float_cluster();
    let outcome = run(&cluster, &["query", "-n", "test", "-i", "idx"]).await;
    outcome.assert_success();
    assert!(outcome.stdout.contains("Query Results"));
    assert!(outcome.stdout.contains("--max-results"));
    assert!(outcome.stdout.contains("--fields"));
}

#[tokio::test]
async fn test_empty_results_warn() {
    let cluster = MemoryCluster::standalone();
    cluster.add_index(IndexDefinition::new(
        IndexId::new("test", "empty"),
        "v",
        2,
        DistanceMetric::Cosine,
    ));
    let outcome = run(&cluster, &["query", "-n", "test", "-i", "empty"]).await;
    outcome.assert_success();
    assert!(outcome.stderr.contains("Query returned zero results."));
    assert!(outcome.stdout.is_empty());
}

#[tokio::test]
async fn test_fields_and_ef_are_forwarded() {
    let cluster = float_cluster();
    let outcome = run(
        &cluster,
        &["query", "-n", "test", "-i", "idx", "--fields", "name", "--hnsw-ef", "64", "--format", "1"],
    )
    .await;
    outcome.assert_success();
    let forwarded = cluster.requests().into_iter().find_map(|request| match request {
        Request::VectorSearch { ef, include_fields, .. } => Some((ef, include_fields)),
        _ => None,
    });
    assert_eq!(forwarded, Some((Some(64), Some(vec!["name".to_string()]))));
}
