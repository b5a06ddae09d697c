//! HNSW tuning flag groups.
//!
//! Each group converts into its remote sub-record only when at least one of
//! its flags was supplied, so an update never carries a sub-record full of
//! placeholders.

use asvec_client::{
    BatchingParams, CachingParams, HealerParams, HnswIndexUpdate, HnswParams, MergeParams,
};
use clap::{ArgAction, Args};

use super::{FlagDuration, InfDuration, parse};

/// Graph shape flags, fixed at creation.
#[derive(Args, Debug, Clone, Default)]
pub struct HnswGraphArgs {
    /// Maximum number of edges for a node in the HNSW graph. Defaults to 16.
    #[arg(long = "hnsw-max-edges", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_edges: Option<u32>,

    /// The default number of candidate nearest neighbors shortlisted during search. Defaults to 100.
    #[arg(long = "hnsw-ef", value_name = "uint32", value_parser = parse::<u32>)]
    pub ef: Option<u32>,

    /// The number of candidate nearest neighbors shortlisted during index creation. Defaults to 100.
    #[arg(long = "hnsw-ef-construction", value_name = "uint32", value_parser = parse::<u32>)]
    pub ef_construction: Option<u32>,
}

/// Batching flags.
#[derive(Args, Debug, Clone, Default)]
pub struct BatchingArgs {
    /// Maximum number of records to fit in a batch. Defaults to 100_000.
    #[arg(long = "hnsw-batch-max-index-records", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_index_records: Option<u32>,

    /// The maximum amount of time to wait before finalizing a batch. Defaults to 30s.
    #[arg(long = "hnsw-batch-index-interval", value_name = "duration", value_parser = parse::<FlagDuration>)]
    pub index_interval: Option<FlagDuration>,

    /// Maximum number of re-index records to fit in a batch.
    #[arg(long = "hnsw-batch-max-reindex-records", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_reindex_records: Option<u32>,

    /// The maximum amount of time to wait before finalizing a re-index batch.
    #[arg(long = "hnsw-batch-reindex-interval", value_name = "duration", value_parser = parse::<FlagDuration>)]
    pub reindex_interval: Option<FlagDuration>,
}

impl BatchingArgs {
    pub fn params(&self) -> Option<BatchingParams> {
        let params = BatchingParams {
            max_index_records: self.max_index_records,
            index_interval: self.index_interval.map(|d| d.as_millis_u32()),
            max_reindex_records: self.max_reindex_records,
            reindex_interval: self.reindex_interval.map(|d| d.as_millis_u32()),
        };
        (!params.is_empty()).then_some(params)
    }
}

/// Index cache flags.
#[derive(Args, Debug, Clone, Default)]
pub struct IndexCachingArgs {
    /// Maximum number of index entries to cache. Defaults to 2_000_000.
    #[arg(long = "hnsw-index-cache-max-entries", value_name = "uint64", value_parser = parse::<u64>)]
    pub index_cache_max_entries: Option<u64>,

    /// Time after which an index cache entry expires, or -1 to never expire. Defaults to 1h.
    #[arg(
        long = "hnsw-index-cache-expiry",
        value_name = "duration",
        allow_hyphen_values = true,
        value_parser = parse::<InfDuration>
    )]
    pub index_cache_expiry: Option<InfDuration>,
}

impl IndexCachingArgs {
    pub fn params(&self) -> Option<CachingParams> {
        caching_params(self.index_cache_max_entries, self.index_cache_expiry)
    }
}

/// Record cache flags.
#[derive(Args, Debug, Clone, Default)]
pub struct RecordCachingArgs {
    /// Maximum number of records to cache. Defaults to 2_000_000.
    #[arg(long = "hnsw-record-cache-max-entries", value_name = "uint64", value_parser = parse::<u64>)]
    pub record_cache_max_entries: Option<u64>,

    /// Time after which a record cache entry expires, or -1 to never expire. Defaults to 1h.
    #[arg(
        long = "hnsw-record-cache-expiry",
        value_name = "duration",
        allow_hyphen_values = true,
        value_parser = parse::<InfDuration>
    )]
    pub record_cache_expiry: Option<InfDuration>,
}

impl RecordCachingArgs {
    pub fn params(&self) -> Option<CachingParams> {
        caching_params(self.record_cache_max_entries, self.record_cache_expiry)
    }
}

fn caching_params(max_entries: Option<u64>, expiry: Option<InfDuration>) -> Option<CachingParams> {
    let params = CachingParams {
        max_entries,
        expiry: expiry.map(|e| e.as_millis_i64()),
    };
    (!params.is_empty()).then_some(params)
}

/// Healer flags.
#[derive(Args, Debug, Clone, Default)]
pub struct HealerArgs {
    /// Maximum allowed record scan rate per node. Defaults to 1_000.
    #[arg(long = "hnsw-healer-max-scan-rate-per-node", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_scan_rate_per_node: Option<u32>,

    /// Maximum number of records in a single scanned page. Defaults to 10_000.
    #[arg(long = "hnsw-healer-max-scan-page-size", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_scan_page_size: Option<u32>,

    /// Percentage of good records randomly selected for re-indexing in a healer cycle. Defaults to 10.
    #[arg(long = "hnsw-healer-reindex-percent", value_name = "float32", value_parser = parse::<f32>)]
    pub reindex_percent: Option<f32>,

    /// Quartz cron expression scheduling the healer cycle. Defaults to '0 0/15 * ? * * *'.
    #[arg(long = "hnsw-healer-schedule", value_name = "cron")]
    pub schedule: Option<String>,

    /// Maximum number of records to heal in parallel. Defaults to 1.
    #[arg(long = "hnsw-healer-parallelism", value_name = "uint32", value_parser = parse::<u32>)]
    pub parallelism: Option<u32>,
}

impl HealerArgs {
    pub fn params(&self) -> Option<HealerParams> {
        let params = HealerParams {
            max_scan_rate_per_node: self.max_scan_rate_per_node,
            max_scan_page_size: self.max_scan_page_size,
            reindex_percent: self.reindex_percent,
            schedule: self.schedule.clone(),
            parallelism: self.parallelism,
        };
        (!params.is_empty()).then_some(params)
    }
}

/// Merge flags.
#[derive(Args, Debug, Clone, Default)]
pub struct MergeArgs {
    /// Vectors merged in parallel from a batch index to the main index.
    #[arg(long = "hnsw-merge-index-parallelism", value_name = "uint32", value_parser = parse::<u32>)]
    pub index_parallelism: Option<u32>,

    /// Vectors merged in parallel from a re-index batch to the main index.
    #[arg(long = "hnsw-merge-reindex-parallelism", value_name = "uint32", value_parser = parse::<u32>)]
    pub reindex_parallelism: Option<u32>,
}

impl MergeArgs {
    pub fn params(&self) -> Option<MergeParams> {
        let params = MergeParams {
            index_parallelism: self.index_parallelism,
            reindex_parallelism: self.reindex_parallelism,
        };
        (!params.is_empty()).then_some(params)
    }
}

/// Tuning flags accepted by both `index create` and `index update`.
#[derive(Args, Debug, Clone, Default)]
pub struct HnswTuningArgs {
    /// Maximum size of the in-memory queue for records waiting to be indexed.
    #[arg(long = "hnsw-max-mem-queue-size", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_mem_queue_size: Option<u32>,

    /// Verify vector integrity when indexing.
    #[arg(
        long = "hnsw-vector-integrity-check",
        value_name = "bool",
        action = ArgAction::Set,
        value_parser = parse::<bool>
    )]
    pub vector_integrity_check: Option<bool>,

    #[command(flatten)]
    pub batching: BatchingArgs,

    #[command(flatten)]
    pub index_cache: IndexCachingArgs,

    #[command(flatten)]
    pub record_cache: RecordCachingArgs,

    #[command(flatten)]
    pub healer: HealerArgs,

    #[command(flatten)]
    pub merge: MergeArgs,
}

impl HnswTuningArgs {
    /// The update request for these flags. Unsupplied flags are absent.
    pub fn update(&self) -> HnswIndexUpdate {
        HnswIndexUpdate {
            max_mem_queue_size: self.max_mem_queue_size,
            batching_params: self.batching.params(),
            index_caching_params: self.index_cache.params(),
            record_caching_params: self.record_cache.params(),
            healer_params: self.healer.params(),
            merge_params: self.merge.params(),
            enable_vector_integrity_check: self.vector_integrity_check,
        }
    }

    /// Full creation parameters, combined with the graph shape flags.
    pub fn params(&self, graph: &HnswGraphArgs) -> HnswParams {
        let update = self.update();
        HnswParams {
            m: graph.max_edges,
            ef_construction: graph.ef_construction,
            ef: graph.ef,
            max_mem_queue_size: update.max_mem_queue_size,
            batching_params: update.batching_params,
            index_caching_params: update.index_caching_params,
            record_caching_params: update.record_caching_params,
            healer_params: update.healer_params,
            merge_params: update.merge_params,
            enable_vector_integrity_check: update.enable_vector_integrity_check,
        }
    }

    /// True when any tuning flag was supplied.
    pub fn any_set(&self) -> bool {
        !self.update().is_empty()
    }
}
