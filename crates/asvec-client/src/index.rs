//! Index definitions, HNSW tuning parameters and index status.
//!
//! Every tuning field is optional. `None` means "not supplied" and is never
//! sent to the service, which keeps its own default for that field. Sub-records
//! ([`BatchingParams`], [`CachingParams`], ...) are themselves optional and
//! only exist when at least one of their fields is set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Free-form index labels.
pub type Labels = BTreeMap<String, String>;

/// Identifies an index: a name within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexId {
    /// Namespace holding the index.
    pub namespace: String,
    /// Index name, unique within the namespace.
    pub name: String,
}

impl IndexId {
    /// Creates an id from a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// How the distance between two vectors is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistanceMetric {
    /// One minus the cosine similarity.
    Cosine,
    /// One minus the dot product.
    DotProduct,
    /// Number of differing components.
    Hamming,
    /// Sum of absolute differences.
    Manhattan,
    /// Sum of squared differences.
    SquaredEuclidean,
}

impl DistanceMetric {
    /// All metrics, in alphabetical order of their names.
    pub const ALL: [Self; 5] = [
        Self::Cosine,
        Self::DotProduct,
        Self::Hamming,
        Self::Manhattan,
        Self::SquaredEuclidean,
    ];

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::DotProduct => "DOT_PRODUCT",
            Self::Hamming => "HAMMING",
            Self::Manhattan => "MANHATTAN",
            Self::SquaredEuclidean => "SQUARED_EUCLIDEAN",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    /// Parses a canonical name. Matching is exact; callers normalize case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| format!("unrecognized distance metric {s:?}"))
    }
}

/// Where the index graph itself is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexStorage {
    /// Storage namespace. Defaults to the index namespace on the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Storage set. Defaults to the index name on the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
}

impl IndexStorage {
    /// True when neither field is set.
    pub fn is_empty(&self) -> bool {
        self.namespace.is_none() && self.set.is_none()
    }
}

/// Batching of graph construction work. Intervals are milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index_records: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_reindex_records: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reindex_interval: Option<u32>,
}

impl BatchingParams {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.max_index_records.is_none()
            && self.index_interval.is_none()
            && self.max_reindex_records.is_none()
            && self.reindex_interval.is_none()
    }
}

/// Cache sizing. `expiry` is milliseconds; `-1` means entries never expire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CachingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl CachingParams {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.max_entries.is_none() && self.expiry.is_none()
    }
}

/// Background healer that repairs the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealerParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scan_rate_per_node: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scan_page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reindex_percent: Option<f32>,
    /// Quartz cron expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<u32>,
}

impl HealerParams {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.max_scan_rate_per_node.is_none()
            && self.max_scan_page_size.is_none()
            && self.reindex_percent.is_none()
            && self.schedule.is_none()
            && self.parallelism.is_none()
    }
}

/// Parallelism of index merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_parallelism: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reindex_parallelism: Option<u32>,
}

impl MergeParams {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.index_parallelism.is_none() && self.reindex_parallelism.is_none()
    }
}

/// HNSW graph parameters supplied at index creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HnswParams {
    /// Maximum edges per graph node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ef_construction: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ef: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_mem_queue_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batching_params: Option<BatchingParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_caching_params: Option<CachingParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_caching_params: Option<CachingParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healer_params: Option<HealerParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_params: Option<MergeParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_vector_integrity_check: Option<bool>,
}

impl HnswParams {
    /// True when nothing is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the fields present in `update`, leaving the rest alone.
    pub fn apply(&mut self, update: &HnswIndexUpdate) {
        if update.max_mem_queue_size.is_some() {
            self.max_mem_queue_size = update.max_mem_queue_size;
        }
        if let Some(batching) = &update.batching_params {
            let current = self.batching_params.get_or_insert_with(Default::default);
            merge_option(&mut current.max_index_records, batching.max_index_records);
            merge_option(&mut current.index_interval, batching.index_interval);
            merge_option(&mut current.max_reindex_records, batching.max_reindex_records);
            merge_option(&mut current.reindex_interval, batching.reindex_interval);
        }
        for (current, incoming) in [
            (&mut self.index_caching_params, &update.index_caching_params),
            (&mut self.record_caching_params, &update.record_caching_params),
        ] {
            if let Some(incoming) = incoming {
                let current = current.get_or_insert_with(Default::default);
                merge_option(&mut current.max_entries, incoming.max_entries);
                merge_option(&mut current.expiry, incoming.expiry);
            }
        }
        if let Some(healer) = &update.healer_params {
            let current = self.healer_params.get_or_insert_with(Default::default);
            merge_option(
                &mut current.max_scan_rate_per_node,
                healer.max_scan_rate_per_node,
            );
            merge_option(&mut current.max_scan_page_size, healer.max_scan_page_size);
            merge_option(&mut current.reindex_percent, healer.reindex_percent);
            merge_option(&mut current.schedule, healer.schedule.clone());
            merge_option(&mut current.parallelism, healer.parallelism);
        }
        if let Some(merge) = &update.merge_params {
            let current = self.merge_params.get_or_insert_with(Default::default);
            merge_option(&mut current.index_parallelism, merge.index_parallelism);
            merge_option(&mut current.reindex_parallelism, merge.reindex_parallelism);
        }
        if update.enable_vector_integrity_check.is_some() {
            self.enable_vector_integrity_check = update.enable_vector_integrity_check;
        }
    }
}

fn merge_option<T>(current: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *current = incoming;
    }
}

/// The subset of HNSW parameters that can change after creation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HnswIndexUpdate {
    pub max_mem_queue_size: Option<u32>,
    pub batching_params: Option<BatchingParams>,
    pub index_caching_params: Option<CachingParams>,
    pub record_caching_params: Option<CachingParams>,
    pub healer_params: Option<HealerParams>,
    pub merge_params: Option<MergeParams>,
    pub enable_vector_integrity_check: Option<bool>,
}

impl HnswIndexUpdate {
    /// True when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A complete index definition, as created and as listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDefinition {
    pub id: IndexId,
    /// Record bin holding the vector.
    pub field: String,
    pub dimensions: u32,
    pub distance_metric: DistanceMetric,
    /// Only records in this set are indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_filter: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<IndexStorage>,
    #[serde(default, skip_serializing_if = "HnswParams::is_empty")]
    pub hnsw_params: HnswParams,
}

impl IndexDefinition {
    /// Creates a definition with no set filter, labels, storage or tuning.
    pub fn new(
        id: IndexId,
        field: impl Into<String>,
        dimensions: u32,
        distance_metric: DistanceMetric,
    ) -> Self {
        Self {
            id,
            field: field.into(),
            dimensions,
            distance_metric,
            set_filter: None,
            labels: Labels::new(),
            storage: None,
            hnsw_params: HnswParams::default(),
        }
    }
}

/// Lifecycle state of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexState {
    /// Serving queries.
    #[default]
    Ready,
    /// Still being built.
    Creating,
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ready => "READY",
            Self::Creating => "CREATING",
        })
    }
}

/// Runtime statistics for one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Records written but not yet merged into the graph.
    pub unmerged_record_count: i64,
    /// Records holding a vector that the index covers.
    pub index_healer_vector_records_indexed: i64,
    /// Valid vertices in the graph.
    pub index_healer_vertices_valid: i64,
    pub state: IndexState,
}
