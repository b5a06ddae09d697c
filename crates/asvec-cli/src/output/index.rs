use std::time::Duration;

use asvec_client::{HnswParams, IndexDefinition, IndexStatus};

use super::size::{DEFAULT_MAX_EDGES, calculate_index_size, format_bytes, unmerged_percent};
use super::{Cell, Render, RenderMode, TableWriter, remove_nil};
use crate::flags::format_duration;

const UNKNOWN: &str = "unknown";

/// Index definitions joined with their live status.
pub struct IndexWriter {
    table: TableWriter,
    verbose: bool,
}

impl IndexWriter {
    pub fn new(verbose: bool, color: bool) -> Self {
        let mut headers = vec![
            "Name",
            "Namespace",
            "Set",
            "Field",
            "Dimensions",
            "Distance Metric",
            "Unmerged",
            "Vector Records",
            "Size",
            "Unmerged %",
        ];
        if verbose {
            headers.extend(["Vertices", "Labels", "Storage", "Index Parameters"]);
        }
        headers.push("Status");

        let table = TableWriter::new(&headers)
            .with_title("Indexes")
            .with_color(color)
            .transform("Set", remove_nil)
            .transform("Labels", remove_nil)
            .sort_by(&["Namespace", "Set", "Name"]);
        Self { table, verbose }
    }

    /// Adds one index. A missing status renders its columns as `unknown`.
    pub fn append(&mut self, definition: &IndexDefinition, status: Option<&IndexStatus>) {
        let mut row: Vec<Cell> = vec![
            definition.id.name.as_str().into(),
            definition.id.namespace.as_str().into(),
            definition.set_filter.clone().into(),
            definition.field.as_str().into(),
            definition.dimensions.into(),
            definition.distance_metric.as_str().into(),
        ];

        match status {
            Some(status) => {
                let m = definition.hnsw_params.m.unwrap_or(DEFAULT_MAX_EDGES);
                let vertices = status.index_healer_vertices_valid;
                let size = calculate_index_size(m, definition.dimensions, vertices.max(0) as u64);
                row.push(status.unmerged_record_count.into());
                row.push(status.index_healer_vector_records_indexed.into());
                row.push(format_bytes(size).into());
                row.push(unmerged_percent(status.unmerged_record_count, vertices).into());
            }
            None => row.extend((0..4).map(|_| Cell::from(UNKNOWN))),
        }

        if self.verbose {
            row.push(match status {
                Some(status) => status.index_healer_vertices_valid.into(),
                None => UNKNOWN.into(),
            });
            row.push(labels(definition));
            row.push(storage(definition).into());
            row.push(hnsw_params(&definition.hnsw_params).into());
        }

        row.push(match status {
            Some(status) => status.state.to_string().into(),
            None => UNKNOWN.into(),
        });
        self.table.append_row(row);
    }
}

impl Render for IndexWriter {
    fn render(&self, mode: RenderMode) -> String {
        self.table.render(mode)
    }
}

fn labels(definition: &IndexDefinition) -> Cell {
    if definition.labels.is_empty() {
        return Cell::Unset;
    }
    definition
        .labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
        .into()
}

/// Storage location, showing the defaults the service applies.
fn storage(definition: &IndexDefinition) -> TableWriter {
    let stored = definition.storage.clone().unwrap_or_default();
    let mut table = TableWriter::key_value();
    table.append_row(vec![
        "Namespace".into(),
        stored.namespace.unwrap_or_else(|| definition.id.namespace.clone()).into(),
    ]);
    table.append_row(vec![
        "Set".into(),
        stored.set.unwrap_or_else(|| definition.id.name.clone()).into(),
    ]);
    table
}

fn hnsw_params(params: &HnswParams) -> TableWriter {
    let batching = params.batching_params.clone().unwrap_or_default();
    let index_cache = params.index_caching_params.clone().unwrap_or_default();
    let record_cache = params.record_caching_params.clone().unwrap_or_default();
    let healer = params.healer_params.clone().unwrap_or_default();
    let merge = params.merge_params.clone().unwrap_or_default();

    let rows: Vec<(&str, Cell)> = vec![
        ("Max Edges", params.m.into()),
        ("Ef", params.ef.into()),
        ("Construction Ef", params.ef_construction.into()),
        ("Max Mem Queue Size", params.max_mem_queue_size.into()),
        ("Batch Max Index Records", batching.max_index_records.into()),
        ("Batch Index Interval", millis(batching.index_interval)),
        ("Batch Max Reindex Records", batching.max_reindex_records.into()),
        ("Batch Reindex Interval", millis(batching.reindex_interval)),
        ("Index Cache Max Entries", index_cache.max_entries.into()),
        ("Index Cache Expiry", expiry(index_cache.expiry)),
        ("Record Cache Max Entries", record_cache.max_entries.into()),
        ("Record Cache Expiry", expiry(record_cache.expiry)),
        ("Healer Max Scan Rate / Node", healer.max_scan_rate_per_node.into()),
        ("Healer Max Scan Page Size", healer.max_scan_page_size.into()),
        ("Healer Reindex %", healer.reindex_percent.into()),
        ("Healer Schedule", healer.schedule.into()),
        ("Healer Parallelism", healer.parallelism.into()),
        ("Merge Index Parallelism", merge.index_parallelism.into()),
        ("Merge Reindex Parallelism", merge.reindex_parallelism.into()),
        ("Vector Integrity Check", params.enable_vector_integrity_check.into()),
    ];

    let mut table = TableWriter::key_value();
    for (key, value) in rows {
        table.append_row(vec![key.into(), value]);
    }
    table
}

fn millis(value: Option<u32>) -> Cell {
    value
        .map(|ms| format_duration(Duration::from_millis(u64::from(ms))))
        .into()
}

fn expiry(value: Option<i64>) -> Cell {
    match value {
        None => Cell::Unset,
        Some(ms) if ms < 0 => "never".into(),
        Some(ms) => format_duration(Duration::from_millis(ms as u64)).into(),
    }
}
