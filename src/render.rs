//! HTML rendering for the dashboard page and the fetch-failure page.
//!
//! The map itself is drawn in the browser by Leaflet. The page embeds the
//! composed view as JSON and a short script hands it to the widget.

use crate::config::DashboardConfig;
use crate::dashboard::{ChartPanel, Dashboard};
use crate::error::{ChartError, FetchError};
use crate::map::{Basemap, MapView, Panes, TileSource};
use crate::types::{display_value, Table};
use geojson::FeatureCollection;
use serde::Serialize;
use std::fmt::Write;
use tracing::warn;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const SIDE_BY_SIDE_JS: &str = "https://unpkg.com/leaflet-side-by-side@2.2.0/leaflet-side-by-side.min.js";

const STYLE: &str = r#"
body { margin: 0; font-family: sans-serif; display: flex; }
aside { width: 260px; padding: 1rem; background: #f0f2f6; min-height: 100vh; box-sizing: border-box; }
aside label { display: block; margin: 1rem 0 0.25rem; }
aside select { width: 100%; }
main { flex: 1; padding: 1rem 2rem; min-width: 0; }
.error { background: #ffe0e0; color: #8a1010; padding: 0.75rem 1rem; border-radius: 4px; }
.table-wrap { max-height: 400px; overflow: auto; }
table { border-collapse: collapse; font-size: 0.85rem; }
th, td { border: 1px solid #ddd; padding: 2px 6px; text-align: left; white-space: nowrap; }
"#;

// Reads the embedded view config and drives Leaflet.
const MAP_SCRIPT: &str = r#"
const cfg = JSON.parse(document.getElementById('map-config').textContent);
const map = L.map('map').setView(cfg.center, cfg.zoom);
const tiles = (t) => L.tileLayer(t.url, { attribution: t.attribution, maxZoom: t.max_zoom });
if (cfg.panes.mode === 'split') {
  const left = tiles(cfg.panes.left).addTo(map);
  const right = tiles(cfg.panes.right).addTo(map);
  L.control.sideBySide(left, right).addTo(map);
} else {
  tiles(cfg.panes.basemap).addTo(map);
}
const points = L.geoJSON(cfg.points, {
  onEachFeature: (feature, layer) => {
    const box = document.createElement('div');
    for (const [k, v] of Object.entries(feature.properties || {})) {
      const line = document.createElement('div');
      line.textContent = k + ': ' + (v === null ? '' : v);
      box.appendChild(line);
    }
    layer.bindPopup(box);
  }
}).addTo(map);
L.control.layers(null, { [cfg.layer_name]: points }).addTo(map);
"#;

#[derive(Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum PaneTiles {
    Single { basemap: TileSource },
    Split { left: TileSource, right: TileSource },
}

#[derive(Serialize)]
struct WidgetConfig<'a> {
    center: [f64; 2],
    zoom: u8,
    layer_name: &'a str,
    points: &'a FeatureCollection,
    panes: PaneTiles,
}

impl<'a> WidgetConfig<'a> {
    fn from_view(view: &'a MapView) -> Self {
        let panes = match view.panes() {
            Panes::Single { basemap } => PaneTiles::Single {
                basemap: basemap.tile_source(),
            },
            Panes::Split { left, right } => PaneTiles::Split {
                left: left.tile_source(),
                right: right.tile_source(),
            },
        };
        WidgetConfig {
            center: view.center,
            zoom: view.zoom,
            layer_name: &view.layer.label,
            points: &view.layer.features,
            panes,
        }
    }
}

pub fn dashboard_page(page: &DashboardConfig, dashboard: &Dashboard) -> String {
    let mut body = String::new();

    body.push_str(&sidebar(dashboard));
    body.push_str("<main>\n");
    let _ = writeln!(body, "<h1>{}</h1>", escape_text(&page.title));
    let _ = writeln!(body, "<p>{}</p>", escape_text(&page.description));

    let _ = writeln!(
        body,
        "<div id=\"map\" style=\"height: {}px;\"></div>",
        page.map_height
    );
    let _ = writeln!(
        body,
        "<script type=\"application/json\" id=\"map-config\">{}</script>",
        widget_json(&dashboard.map)
    );
    let _ = writeln!(body, "<script>{}</script>", MAP_SCRIPT);

    body.push_str("<h2>Dataset Information</h2>\n");
    body.push_str(&raw_table(&dashboard.raw));
    body.push_str(&chart_section(&dashboard.chart));
    body.push_str("</main>\n");

    let head = format!(
        "<link rel=\"stylesheet\" href=\"{}\">\n<script src=\"{}\"></script>\n<script src=\"{}\"></script>",
        LEAFLET_CSS, LEAFLET_JS, SIDE_BY_SIDE_JS
    );
    document(&page.title, &head, &body)
}

/// Page shown when the data could not be fetched. Carries one error message
/// and nothing that depends on the data.
pub fn failure_page(page: &DashboardConfig, err: &FetchError) -> String {
    let body = format!(
        "<main>\n<h1>{}</h1>\n<p>{}</p>\n<div class=\"error\">{}</div>\n<p>Please check the API URL or try again later.</p>\n</main>\n",
        escape_text(&page.title),
        escape_text(&page.description),
        escape_text(&err.to_string())
    );
    document(&page.title, "", &body)
}

fn document(title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n{}\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_text(title),
        head,
        STYLE,
        body
    )
}

fn widget_json(view: &MapView) -> String {
    embed_json(&WidgetConfig::from_view(view))
}

/// JSON safe to place inside a `<script>` element.
fn embed_json<T: Serialize>(value: &T) -> String {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize map config, the map will be empty: {}", e);
            "{}".to_string()
        }
    };
    // `</` would close the script element early
    json.replace("</", "<\\/")
}

fn sidebar(dashboard: &Dashboard) -> String {
    let ctx = &dashboard.context;
    let mut out = String::from("<aside>\n<h2>Map Controls</h2>\n<form method=\"get\" action=\"\">\n");

    out.push_str("<label for=\"basemap\">Select Basemap</label>\n");
    out.push_str("<select id=\"basemap\" name=\"basemap\" onchange=\"this.form.submit()\">\n");
    for basemap in Basemap::ALL {
        out.push_str(&option(basemap.name(), basemap == ctx.basemap));
    }
    out.push_str("</select>\n");

    if !dashboard.variables.is_empty() {
        out.push_str("<label for=\"variable\">Select Variable for Bar Chart</label>\n");
        out.push_str("<select id=\"variable\" name=\"variable\" onchange=\"this.form.submit()\">\n");
        for variable in &dashboard.variables {
            out.push_str(&option(variable, ctx.chart_variable.as_deref() == Some(variable.as_str())));
        }
        out.push_str("</select>\n");
    }

    let _ = writeln!(
        out,
        "<label><input type=\"checkbox\" name=\"split\" value=\"on\" onchange=\"this.form.submit()\"{}> Enable Split View</label>",
        if ctx.split_view { " checked" } else { "" }
    );
    out.push_str("</form>\n</aside>\n");
    out
}

fn option(value: &str, selected: bool) -> String {
    format!(
        "<option value=\"{0}\"{1}>{0}</option>\n",
        escape_text(value),
        if selected { " selected" } else { "" }
    )
}

fn raw_table(table: &Table) -> String {
    let mut out = String::from("<div class=\"table-wrap\">\n<table>\n<thead><tr>");
    for column in table.columns.iter().map(String::as_str).chain(["longitude", "latitude"]) {
        let _ = write!(out, "<th>{}</th>", escape_text(column));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row.cells.iter().chain([&row.longitude, &row.latitude]) {
            let text = cell.as_ref().map(display_value).unwrap_or_default();
            let _ = write!(out, "<td>{}</td>", escape_text(&text));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</div>\n");
    out
}

fn chart_section(panel: &ChartPanel) -> String {
    match panel {
        ChartPanel::Series { title, chart } => {
            format!("<h2>{}</h2>\n{}\n", escape_text(title), chart.to_svg())
        }
        ChartPanel::Frequency { table, chart } => {
            let mut out = format!(
                "<h2>Distribution of {}</h2>\n{}\n",
                escape_text(&table.column),
                chart.to_svg()
            );
            let _ = writeln!(out, "<h2>Top 10 {} Values</h2>", escape_text(&table.column));
            let _ = writeln!(
                out,
                "<table class=\"rank\">\n<thead><tr><th>Rank</th><th>{}</th><th>Count</th></tr></thead>\n<tbody>",
                escape_text(&table.column)
            );
            for (i, entry) in table.entries.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    i + 1,
                    escape_text(&entry.value),
                    entry.count
                );
            }
            out.push_str("</tbody>\n</table>\n");
            out
        }
        ChartPanel::Unavailable(err) => unavailable(err),
    }
}

fn unavailable(err: &ChartError) -> String {
    format!(
        "<h2>Distribution of {}</h2>\n<div class=\"error\">{}</div>\n",
        escape_text(err.column()),
        escape_text(&err.to_string())
    )
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{CITIES_TOML, COMPLAINTS_TOML};
    use crate::config::AppConfig;
    use crate::controls::{ControlParams, RenderContext};
    use crate::dashboard::assemble;
    use crate::data::{static_cities, table_from_geojson};
    use crate::testutil::THREE_COMPLAINTS;

    fn render(toml: &str, params: ControlParams, raw: Table) -> String {
        let config = AppConfig::from_toml(toml).unwrap();
        let ctx = RenderContext::resolve(&params, &config.chart).unwrap();
        dashboard_page(&config.dashboard, &assemble(&config, raw, &ctx))
    }

    #[test]
    fn cities_page_has_map_table_and_chart() {
        let html = render(CITIES_TOML, ControlParams::default(), static_cities());
        assert!(html.contains("<div id=\"map\""));
        assert!(html.contains("Dataset Information"));
        assert!(html.contains("<h2>Value by City</h2>"));
        assert!(html.contains("Scatterday &amp; Associates"));
        assert!(html.contains("<option value=\"OpenStreetMap\" selected>"));
        // no variable dropdown for the static demo
        assert!(!html.contains("Select Variable for Bar Chart"));
        assert!(html.contains("\"mode\":\"single\""));
    }

    #[test]
    fn complaints_page_has_rank_table() {
        let config = AppConfig::from_toml(COMPLAINTS_TOML).unwrap();
        let raw = table_from_geojson(THREE_COMPLAINTS, config.chart.variables()).unwrap();
        let params = ControlParams {
            variable: Some("agency".into()),
            split: Some("on".into()),
            ..Default::default()
        };
        let html = render(COMPLAINTS_TOML, params, raw);
        assert!(html.contains("<h2>Distribution of agency</h2>"));
        assert!(html.contains("<h2>Top 10 agency Values</h2>"));
        assert!(html.contains("<tr><td>1</td><td>NYPD</td><td>2</td></tr>"));
        assert!(html.contains("<option value=\"agency\" selected>"));
        assert!(html.contains("\"mode\":\"split\""));
        assert!(html.contains(" checked>"));
    }

    #[test]
    fn missing_variable_renders_placeholder_and_rest_of_page() {
        let config = AppConfig::from_toml(COMPLAINTS_TOML).unwrap();
        let raw = table_from_geojson(THREE_COMPLAINTS, config.chart.variables()).unwrap();
        let params = ControlParams {
            variable: Some("descriptor".into()),
            ..Default::default()
        };
        let html = render(COMPLAINTS_TOML, params, raw);
        assert!(html.contains("<div class=\"error\">No data available for descriptor</div>"));
        assert!(html.contains("<div id=\"map\""));
        assert!(html.contains("Dataset Information"));
    }

    #[test]
    fn failure_page_has_one_message_and_no_widgets() {
        let config = AppConfig::from_toml(COMPLAINTS_TOML).unwrap();
        let html = failure_page(&config.dashboard, &FetchError::Status(503));
        assert_eq!(html.matches("503").count(), 1);
        assert_eq!(html.matches("class=\"error\"").count(), 1);
        assert!(!html.contains("id=\"map\""));
        assert!(!html.contains("<table"));
        assert!(!html.contains("<svg"));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn serialization_failure_falls_back_to_empty_object() {
        assert_eq!(embed_json(&Unserializable), "{}");
        assert_eq!(embed_json(&"</b>"), "\"<\\/b>\"");
    }

    #[test]
    fn embedded_json_cannot_close_the_script() {
        let mut raw = static_cities();
        raw.rows[0].cells[0] = Some(serde_json::json!("</script><b>x"));
        let html = render(CITIES_TOML, ControlParams::default(), raw);
        let start = html.find("id=\"map-config\">").unwrap();
        let end = start + html[start..].find("</script>").unwrap();
        assert!(html[start..end].contains("<\\/script><b>x"));
        assert!(html.contains("<td>&lt;/script&gt;&lt;b&gt;x</td>"));
    }
}
