use asvec_client::{Neighbor, Value};

use super::{Cell, Render, RenderMode, TableWriter, remove_nil, truncate};
use crate::flags::format_vector;

/// How much of each record's data a query prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLimits {
    /// Bins shown per record. `None` shows every bin.
    pub max_keys: Option<usize>,
    /// Character width of each bin value. Zero is unlimited.
    pub max_width: usize,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self {
            max_keys: Some(5),
            max_width: 50,
        }
    }
}

/// Query results, closest first.
pub struct NeighborWriter {
    table: TableWriter,
    limits: DataLimits,
}

impl NeighborWriter {
    pub fn new(limits: DataLimits, color: bool) -> Self {
        let table = TableWriter::new(&[
            "Namespace",
            "Set",
            "Key",
            "Distance",
            "Expiration",
            "Generation",
            "Data",
        ])
        .with_title("Query Results")
        .with_color(color)
        .suppress_empty_columns()
        .transform("Set", remove_nil)
        .sort_by(&["Distance"]);
        Self { table, limits }
    }

    pub fn append(&mut self, neighbor: &Neighbor) {
        let expiration = match neighbor.record.expiration {
            None => "Never".to_string(),
            Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        };
        self.table.append_row(vec![
            neighbor.namespace.as_str().into(),
            neighbor.set.clone().into(),
            neighbor.key.to_string().into(),
            neighbor.distance.into(),
            expiration.into(),
            neighbor.record.generation.into(),
            data_table(neighbor, self.limits).into(),
        ]);
    }

    pub fn append_all<'a>(&mut self, neighbors: impl IntoIterator<Item = &'a Neighbor>) {
        for neighbor in neighbors {
            self.append(neighbor);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Render for NeighborWriter {
    fn render(&self, mode: RenderMode) -> String {
        self.table.render(mode)
    }
}

/// Record bins as a key/value table, cut down to `limits`.
pub(crate) fn data_table(neighbor: &Neighbor, limits: DataLimits) -> TableWriter {
    let width = truncate(limits.max_width);
    let mut table = TableWriter::key_value()
        .transform("Value", move |cell| remove_nil(cell).or_else(|| width(cell)));

    let data = &neighbor.record.data;
    let shown = limits.max_keys.unwrap_or(data.len());
    for (name, value) in data.iter().take(shown) {
        table.append_row(vec![name.as_str().into(), value_text(value).into()]);
    }
    if data.len() > shown {
        table.append_row(vec!["...".into(), Cell::Unset]);
    }
    table
}

/// A bin value cut to `max_width` characters, as in the data table.
pub(crate) fn limited_text(value: &Value, max_width: usize) -> String {
    let text = value_text(value);
    truncate(max_width)(&Cell::from(text.as_str())).unwrap_or(text)
}

/// A bin value as shown to the user.
fn value_text(value: &Value) -> String {
    match value.as_vector() {
        Some(vector) => format_vector(&vector),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asvec_client::{Key, Record};
    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn neighbor(key: &str, distance: f32, bins: usize) -> Neighbor {
        let data: BTreeMap<String, Value> = (0..bins)
            .map(|i| (format!("bin{i}"), Value::Int(i as i64)))
            .collect();
        Neighbor {
            namespace: "test".to_string(),
            set: None,
            key: Key::from(key),
            distance,
            record: Record {
                generation: 1,
                expiration: None,
                data,
            },
        }
    }

    #[test]
    fn test_sorted_by_distance() {
        let mut writer = NeighborWriter::new(DataLimits::default(), false);
        writer.append(&neighbor("far", 10.0, 0));
        writer.append(&neighbor("near", 0.5, 0));
        writer.append(&neighbor("mid", 2.0, 0));

        let csv = writer.render(RenderMode::Csv);
        let keys: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(3).unwrap())
            .collect();
        assert_eq!(keys, vec!["near", "mid", "far"]);
    }

    #[test]
    fn test_max_keys_adds_ellipsis_row() {
        let limits = DataLimits {
            max_keys: Some(2),
            max_width: 50,
        };
        let table = data_table(&neighbor("k", 0.0, 4), limits);
        assert_eq!(table.len(), 3);
        assert_eq!(table.render(RenderMode::Csv), "bin0,0\nbin1,1\n...,");

        let unlimited = data_table(
            &neighbor("k", 0.0, 4),
            DataLimits {
                max_keys: None,
                max_width: 0,
            },
        );
        assert_eq!(unlimited.len(), 4);
    }

    #[test]
    fn test_values_are_truncated() {
        let mut n = neighbor("k", 0.0, 0);
        n.record
            .data
            .insert("text".to_string(), Value::Str("abcdefghijkl".to_string()));
        let limits = DataLimits {
            max_keys: None,
            max_width: 8,
        };
        assert_eq!(data_table(&n, limits).render(RenderMode::Csv), "text,abcde...");
    }

    #[test]
    fn test_vector_values_and_expiration() {
        let mut n = neighbor("k", 1.5, 0);
        n.record
            .data
            .insert("v".to_string(), Value::FloatVector(vec![1.0, 0.5]));
        n.record.expiration = DateTime::from_timestamp(0, 0);

        let mut writer = NeighborWriter::new(DataLimits::default(), false);
        writer.append(&n);
        let csv = writer.render(RenderMode::Csv);
        assert!(csv.contains("1970-01-01 00:00:00 UTC"), "{csv}");
        // the vector is quoted in the data table, then again in the row
        assert!(csv.contains(r#""v,""[1.0,0.5]""""#), "{csv}");
    }

    #[test]
    fn test_never_expires() {
        let mut writer = NeighborWriter::new(DataLimits::default(), false);
        writer.append(&neighbor("k", 0.0, 1));
        assert!(writer.render(RenderMode::Csv).contains(",Never,1,"));
    }
}
