use crate::types::{PointCollection, Record, Table};
use geo::Point;
use serde_json::Value;
use tracing::debug;

#[derive(Debug)]
pub struct FilterOutcome {
    pub collection: PointCollection,
    pub dropped: usize,
}

/// Keep the rows whose longitude and latitude are both usable and build
/// point geometry for them. Other rows are dropped without error.
pub fn locate_rows(table: &Table) -> FilterOutcome {
    let mut records = Vec::with_capacity(table.len());
    let mut dropped = 0;

    for (i, row) in table.rows.iter().enumerate() {
        let lon = coordinate(row.longitude.as_ref(), 180.0);
        let lat = coordinate(row.latitude.as_ref(), 90.0);

        let (longitude, latitude) = match (lon, lat) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => {
                debug!(row = i, "Dropping row without usable coordinates");
                dropped += 1;
                continue;
            }
        };

        records.push(Record {
            latitude,
            longitude,
            geometry: Point::new(longitude, latitude),
            attributes: table
                .columns
                .iter()
                .cloned()
                .zip(row.cells.iter().cloned())
                .collect(),
        });
    }

    debug!(kept = records.len(), dropped, "Geometry filter done");

    FilterOutcome {
        collection: PointCollection {
            columns: table.columns.clone(),
            records,
        },
        dropped,
    }
}

// Open data APIs commonly ship coordinates as strings.
fn coordinate(value: Option<&Value>, limit: f64) -> Option<f64> {
    let v = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (v.is_finite() && v.abs() <= limit).then_some(v)
}
