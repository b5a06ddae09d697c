//! HNSW index size estimates.

/// Max edges assumed when an index does not set `m`.
pub const DEFAULT_MAX_EDGES: u32 = 16;

const NODE_OVERHEAD_BYTES: u64 = 60;
const EDGE_BYTES: f64 = 20.0;
const EDGE_FACTOR: f64 = 1.5;
const FLOAT_BYTES: u64 = 4;

/// Vertices across every HNSW layer: each layer keeps `1/m` of the one below.
pub fn calculate_total_graph_nodes(m: u32, vertices: u64) -> u64 {
    if m < 2 {
        return vertices;
    }
    let mut total = 0;
    let mut layer = vertices;
    while layer > 0 {
        total += layer;
        layer /= u64::from(m);
    }
    total
}

/// Estimated bytes held by an index of `vertices` vectors.
pub fn calculate_index_size(m: u32, dimensions: u32, vertices: u64) -> u64 {
    let edges = (EDGE_FACTOR * f64::from(m) * EDGE_BYTES).round() as u64;
    let per_node = NODE_OVERHEAD_BYTES + edges + u64::from(dimensions) * FLOAT_BYTES;
    calculate_total_graph_nodes(m, vertices) * per_node
}

/// `512 B`, `82.38 KB`, `1.05 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// Unmerged records as a share of valid vertices.
pub fn unmerged_percent(unmerged: i64, vertices: i64) -> String {
    if vertices <= 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", unmerged as f64 / vertices as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_graph_nodes() {
        assert_eq!(calculate_total_graph_nodes(2, 8), 15);
        assert_eq!(calculate_total_graph_nodes(3, 1000), 1498);
        assert_eq!(calculate_total_graph_nodes(16, 0), 0);
        assert_eq!(calculate_total_graph_nodes(1, 7), 7);
    }

    #[test]
    fn test_index_size() {
        assert_eq!(calculate_index_size(10, 100, 100), 84360);
        assert_eq!(calculate_index_size(15, 200, 800_000), 1_122_854_710);
        assert_eq!(calculate_index_size(20, 100, 10), 10600);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(84360), "82.38 KB");
        assert_eq!(format_bytes(1_122_854_710), "1.05 GB");
    }

    #[test]
    fn test_unmerged_percent() {
        assert_eq!(unmerged_percent(5, 0), "0%");
        assert_eq!(unmerged_percent(1, 3), "33.33%");
        assert_eq!(unmerged_percent(0, 10), "0.00%");
    }
}
