use axum::{http::StatusCode, routing::get, Router};

/// Three complaints; the second one has no latitude, the third no complaint type.
pub(crate) const THREE_COMPLAINTS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [-74.0071, 40.7255]},
      "properties": {
        "created_date": "2024-03-01T10:00:00.000",
        "agency": "NYPD",
        "complaint_type": "Noise - Street/Sidewalk",
        "longitude": "-74.0071",
        "latitude": "40.7255"
      }
    },
    {
      "type": "Feature",
      "geometry": null,
      "properties": {
        "created_date": "2024-03-01T11:00:00.000",
        "agency": "DSNY",
        "complaint_type": "Dirty Condition",
        "longitude": "-74.0050"
      }
    },
    {
      "type": "Feature",
      "geometry": {"type": "Point", "coordinates": [-74.0090, 40.7260]},
      "properties": {
        "created_date": "2024-03-01T12:00:00.000",
        "agency": "NYPD",
        "longitude": -74.009,
        "latitude": 40.726
      }
    }
  ]
}"#;

/// Serve `body` with `status` on a throwaway local port and return its URL.
pub(crate) async fn spawn_upstream(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/resource.geojson", get(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/resource.geojson", addr)
}
