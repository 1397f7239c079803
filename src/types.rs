use geo::Point;
use serde_json::Value;

/// Coordinate reference system shared by every point collection.
pub const CRS: &str = "EPSG:4326";

/// Flattened source data before any coordinate filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// One source row. `cells` is aligned with `Table::columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Option<Value>>,
    pub longitude: Option<Value>,
    pub latitude: Option<Value>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A located row: coordinates validated and turned into point geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub latitude: f64,
    pub longitude: f64,
    pub geometry: Point<f64>,
    // (column, value) in table column order
    pub attributes: Vec<(String, Option<Value>)>,
}

impl Record {
    pub fn attribute(&self, column: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_ref())
    }
}

/// Records that survived the geometry filter, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCollection {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl PointCollection {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Text shown for a cell in tables, chart labels and frequency keys.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
