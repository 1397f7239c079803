use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::types::{Row, Table};
use geojson::GeoJson;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{info, warn};

const LONGITUDE: &str = "longitude";
const LATITUDE: &str = "latitude";

pub async fn load_data(source: &SourceConfig, client: &Client) -> Result<Table, FetchError> {
    let table = match source {
        SourceConfig::Static => static_cities(),
        SourceConfig::Remote { url, properties } => fetch_geojson(client, url, properties).await?,
    };
    info!(rows = table.len(), columns = table.columns.len(), "Loaded source table");
    Ok(table)
}

/// Five cities with a demo value each.
pub fn static_cities() -> Table {
    let lat = [37.76, 34.05, 40.71, 51.51, 48.85];
    let lon = [-122.4, -118.25, -74.01, -0.12, 2.35];
    let name = ["San Francisco", "Los Angeles", "New York", "London", "Paris"];
    let value = [10, 20, 15, 25, 30];

    let rows = (0..name.len())
        .map(|i| Row {
            cells: vec![Some(json!(name[i])), Some(json!(value[i]))],
            longitude: Some(json!(lon[i])),
            latitude: Some(json!(lat[i])),
        })
        .collect();

    Table {
        columns: vec!["name".to_string(), "value".to_string()],
        rows,
    }
}

async fn fetch_geojson(
    client: &Client,
    url: &str,
    properties: &[String],
) -> Result<Table, FetchError> {
    info!(%url, "Fetching GeoJSON");
    let response = client.get(url).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!(%url, status = status.as_u16(), "Data API returned an error status");
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.text().await?;
    table_from_geojson(&body, properties)
}

/// Flatten a FeatureCollection into a table of the requested properties.
///
/// A property becomes a column when at least one feature carries it; features
/// without it get an empty cell. Coordinates come from the `longitude` and
/// `latitude` properties, never from the geometry member.
pub fn table_from_geojson(body: &str, properties: &[String]) -> Result<Table, FetchError> {
    let geojson: GeoJson = body.parse()?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(FetchError::NotFeatureCollection),
    };

    let columns: Vec<String> = properties
        .iter()
        .filter(|p| collection.features.iter().any(|f| f.contains_property(p.as_str())))
        .cloned()
        .collect();

    let rows = collection
        .features
        .iter()
        .map(|feature| Row {
            cells: columns
                .iter()
                .map(|c| non_null(feature.property(c.as_str())))
                .collect(),
            longitude: non_null(feature.property(LONGITUDE)),
            latitude: non_null(feature.property(LATITUDE)),
        })
        .collect();

    Ok(Table { columns, rows })
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_upstream, THREE_COMPLAINTS};
    use axum::http::StatusCode as UpstreamStatus;

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn static_table_has_five_cities_in_order() {
        let table = static_cities();
        assert_eq!(table.columns, vec!["name", "value"]);
        let names: Vec<_> = table.rows.iter().map(|r| r.cells[0].clone().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                json!("San Francisco"),
                json!("Los Angeles"),
                json!("New York"),
                json!("London"),
                json!("Paris")
            ]
        );
    }

    #[test]
    fn absent_properties_are_omitted_not_errors() {
        let table = table_from_geojson(
            THREE_COMPLAINTS,
            &props(&["agency", "complaint_type", "descriptor"]),
        )
        .unwrap();

        // nobody carries "descriptor"
        assert_eq!(table.columns, vec!["agency", "complaint_type"]);
        assert_eq!(table.len(), 3);
        // third feature has no complaint_type
        assert_eq!(table.rows[2].cells[1], None);
    }

    #[test]
    fn coordinates_come_from_properties() {
        let table = table_from_geojson(THREE_COMPLAINTS, &props(&["agency"])).unwrap();
        assert_eq!(table.rows[0].longitude, Some(json!("-74.0071")));
        assert_eq!(table.rows[0].latitude, Some(json!("40.7255")));
        assert_eq!(table.rows[1].latitude, None);
    }

    #[test]
    fn rejects_non_collection_documents() {
        let point = r#"{"type":"Point","coordinates":[1.0,2.0]}"#;
        assert!(matches!(
            table_from_geojson(point, &[]),
            Err(FetchError::NotFeatureCollection)
        ));
        assert!(matches!(
            table_from_geojson("not json", &[]),
            Err(FetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn remote_source_fetches_and_flattens() {
        let url = spawn_upstream(UpstreamStatus::OK, THREE_COMPLAINTS).await;
        let source = SourceConfig::Remote {
            url,
            properties: props(&["agency"]),
        };
        let table = load_data(&source, &Client::new()).await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns, vec!["agency"]);
    }

    #[tokio::test]
    async fn non_ok_status_is_a_fetch_error() {
        let url = spawn_upstream(UpstreamStatus::INTERNAL_SERVER_ERROR, "boom").await;
        let source = SourceConfig::Remote {
            url,
            properties: props(&["agency"]),
        };
        let err = load_data(&source, &Client::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
    }
}
