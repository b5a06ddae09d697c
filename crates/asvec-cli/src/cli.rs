//! Command-line definition.

use std::path::PathBuf;

use asvec_client::{DistanceMetric, Vector};
use clap::{Args, Parser, Subcommand};

use crate::flags::{
    ClientArgs, FormatArgs, HnswGraphArgs, HnswTuningArgs, LogLevel, UnixTimestamp, WatchArgs,
    parse, parse_label,
};

/// Aerospike Vector Search administration tool.
///
/// Manages indexes, users and roles, inspects cluster nodes and runs
/// ad-hoc vector queries. Connection flags can also be given as
/// ASVEC_* environment variables, for example ASVEC_HOST.
#[derive(Parser, Debug)]
#[command(name = "asvec")]
#[command(version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level for additional details and debugging. Logging is off when unset.
    #[arg(long = "log-level", value_name = "level", global = true, value_parser = parse::<LogLevel>)]
    pub log_level: Option<LogLevel>,

    /// Disable color in the output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage indexes
    #[command(subcommand)]
    Index(IndexCommand),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Inspect roles
    #[command(subcommand)]
    Role(RoleCommand),

    /// Inspect cluster nodes
    #[command(subcommand)]
    Node(NodeCommand),

    /// Run a vector search against an index
    Query(QueryArgs),
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Create one index from flags, or several from a YAML file
    Create(IndexCreateArgs),

    /// Update the labels and tuning of an index
    Update(IndexUpdateArgs),

    /// Drop an index
    Drop(IndexDropArgs),

    /// Garbage-collect vertices whose records changed before a cutoff
    Gc(IndexGcArgs),

    /// List indexes with their status
    #[command(visible_alias = "list")]
    Ls(IndexLsArgs),
}

/// Identifies one index.
#[derive(Args, Debug, Clone, Default)]
pub struct IndexIdArgs {
    /// The namespace of the index.
    #[arg(short = 'n', long, value_name = "namespace")]
    pub namespace: Option<String>,

    /// The name of the index.
    #[arg(short = 'i', long = "index-name", value_name = "name")]
    pub index_name: Option<String>,
}

impl IndexIdArgs {
    /// Names of the missing id flags, for `require`.
    pub fn presence(&self) -> [(&'static str, bool); 2] {
        [
            ("namespace", self.namespace.is_some()),
            ("index-name", self.index_name.is_some()),
        ]
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.index_name.as_deref().unwrap_or_default()
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexCreateArgs {
    #[command(flatten)]
    pub id: IndexIdArgs,

    /// The set to index. Records outside it are ignored.
    #[arg(short = 's', long = "sets", value_name = "set")]
    pub set_filter: Option<String>,

    /// The bin holding the vector.
    #[arg(short = 'f', long = "vector-field", value_name = "field")]
    pub vector_field: Option<String>,

    /// The dimensions of the vectors.
    #[arg(short = 'd', long = "dimension", value_name = "uint32", value_parser = parse::<u32>)]
    pub dimension: Option<u32>,

    /// The distance formula. One of COSINE, DOT_PRODUCT, HAMMING, MANHATTAN,
    /// SQUARED_EUCLIDEAN.
    #[arg(short = 'm', long = "distance-metric", value_name = "metric", value_parser = parse::<DistanceMetric>)]
    pub distance_metric: Option<DistanceMetric>,

    /// Labels to attach, as key=value pairs.
    #[arg(long = "index-labels", value_name = "key=value,...", value_delimiter = ',', value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Namespace holding the index graph. Defaults to the index namespace.
    #[arg(long = "storage-namespace", value_name = "namespace")]
    pub storage_namespace: Option<String>,

    /// Set holding the index graph. Defaults to the index name.
    #[arg(long = "storage-set", value_name = "set")]
    pub storage_set: Option<String>,

    #[command(flatten)]
    pub graph: HnswGraphArgs,

    #[command(flatten)]
    pub tuning: HnswTuningArgs,

    /// Create every index defined in a YAML file, such as the output of
    /// `index ls --yaml`.
    #[arg(
        long,
        value_name = "path",
        conflicts_with_all = [
            "namespace", "index_name", "set_filter", "vector_field", "dimension",
            "distance_metric", "labels", "storage_namespace", "storage_set",
            "max_edges", "ef", "ef_construction", "max_mem_queue_size", "vector_integrity_check",
            "max_index_records", "index_interval", "max_reindex_records", "reindex_interval",
            "index_cache_max_entries", "index_cache_expiry", "record_cache_max_entries",
            "record_cache_expiry", "max_scan_rate_per_node", "max_scan_page_size",
            "reindex_percent", "schedule", "parallelism", "index_parallelism",
            "reindex_parallelism",
        ]
    )]
    pub file: Option<PathBuf>,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexUpdateArgs {
    #[command(flatten)]
    pub id: IndexIdArgs,

    /// Replace the index labels with these key=value pairs.
    #[arg(long = "index-labels", value_name = "key=value,...", value_delimiter = ',', value_parser = parse_label)]
    pub labels: Option<Vec<(String, String)>>,

    #[command(flatten)]
    pub tuning: HnswTuningArgs,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexDropArgs {
    #[command(flatten)]
    pub id: IndexIdArgs,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexGcArgs {
    #[command(flatten)]
    pub id: IndexIdArgs,

    /// Vertices whose records were updated before this time are removed.
    #[arg(short = 'c', long = "cutoff-time", value_name = "unix-timestamp (sec)", allow_hyphen_values = true, value_parser = parse::<UnixTimestamp>)]
    pub cutoff_time: Option<UnixTimestamp>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct IndexLsArgs {
    /// Show storage, labels and HNSW parameters.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the definitions as YAML, usable with `index create --file`.
    #[arg(long, conflicts_with = "verbose")]
    pub yaml: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub watch: WatchArgs,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user
    Create(UserCreateArgs),

    /// Drop a user
    Drop(UserDropArgs),

    /// Grant roles to a user
    Grant(UserRolesArgs),

    /// Revoke roles from a user
    Revoke(UserRolesArgs),

    /// List users and their roles
    #[command(visible_alias = "list")]
    Ls(ListArgs),

    /// Change a user's password
    NewPassword(UserNewPasswordArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserCreateArgs {
    /// The user name.
    #[arg(long, value_name = "name")]
    pub name: Option<String>,

    /// The password. Prompted for when not given.
    #[arg(long = "new-password", value_name = "password")]
    pub new_password: Option<String>,

    /// Roles to grant.
    #[arg(long, value_name = "role,...", value_delimiter = ',')]
    pub roles: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserDropArgs {
    /// The user name.
    #[arg(long, value_name = "name")]
    pub name: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserRolesArgs {
    /// The user name.
    #[arg(long, value_name = "name")]
    pub name: Option<String>,

    /// Roles to grant or revoke.
    #[arg(long, value_name = "role,...", value_delimiter = ',')]
    pub roles: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UserNewPasswordArgs {
    /// The user name.
    #[arg(long, value_name = "name")]
    pub name: Option<String>,

    /// The new password. Prompted for when not given.
    #[arg(long = "new-password", value_name = "password")]
    pub new_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RoleCommand {
    /// List roles
    #[command(visible_alias = "list")]
    Ls(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum NodeCommand {
    /// List cluster nodes and check that they can see each other
    #[command(visible_alias = "list")]
    Ls(ListArgs),
}

/// Flags shared by the plain listing commands.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub watch: WatchArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    #[command(flatten)]
    pub id: IndexIdArgs,

    /// The query vector, such as [1,0,1] or [0.5,1.2]. Defaults to a zero vector.
    #[arg(
        short = 'v',
        long,
        value_name = "[]float32 or []bool",
        allow_hyphen_values = true,
        value_parser = parse::<Vector>,
        conflicts_with_all = ["key_str", "key_int"]
    )]
    pub vector: Option<Vector>,

    /// Query with the vector of the record with this string key.
    #[arg(short = 'k', long = "key-str", value_name = "key", conflicts_with = "key_int")]
    pub key_str: Option<String>,

    /// Query with the vector of the record with this integer key.
    #[arg(short = 't', long = "key-int", value_name = "int", allow_hyphen_values = true, value_parser = parse::<i64>)]
    pub key_int: Option<i64>,

    /// The set of the key record. Defaults to the index set filter.
    #[arg(short = 's', long, value_name = "set")]
    pub set: Option<String>,

    /// Maximum number of results. Defaults to 5.
    #[arg(short = 'r', long = "max-results", value_name = "uint32", value_parser = parse::<u32>)]
    pub max_results: Option<u32>,

    /// Maximum number of bins shown per record. Defaults to 5.
    #[arg(long = "max-keys", visible_alias = "max-data-keys", value_name = "int", value_parser = parse::<u32>)]
    pub max_keys: Option<u32>,

    /// Maximum width of each bin value. 0 is unlimited. Defaults to 50.
    #[arg(short = 'w', long = "max-width", value_name = "int", value_parser = parse::<u32>)]
    pub max_width: Option<u32>,

    /// Only fetch these bins.
    #[arg(long, value_name = "bin,...", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Candidate list size for this search. Defaults to the index setting.
    #[arg(long = "hnsw-ef", value_name = "uint32", value_parser = parse::<u32>)]
    pub hnsw_ef: Option<u32>,

    /// Browse results in a full-screen view and requery from a result.
    #[arg(short = 'I', long, conflicts_with = "watch")]
    pub interactive: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub watch: WatchArgs,
}
