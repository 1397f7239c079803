//! One render pass: acquire, filter, compose the map, compute the chart.

use crate::chart::{BarChart, FrequencyTable};
use crate::config::{AppConfig, ChartConfig};
use crate::controls::RenderContext;
use crate::data::load_data;
use crate::error::{ChartError, FetchError};
use crate::filter::locate_rows;
use crate::map::MapView;
use crate::types::{PointCollection, Table};
use reqwest::Client;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ChartPanel {
    /// Top-10 bar chart plus its rank table.
    Frequency { table: FrequencyTable, chart: BarChart },
    Series { title: String, chart: BarChart },
    /// Shown in place of the chart; the rest of the page renders normally.
    Unavailable(ChartError),
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub context: RenderContext,
    pub variables: Vec<String>,
    pub raw: Table,
    pub points: PointCollection,
    pub map: MapView,
    pub chart: ChartPanel,
}

/// Run every stage for one page request. A failed fetch stops here and
/// nothing else is built.
pub async fn build(
    config: &AppConfig,
    client: &Client,
    ctx: &RenderContext,
) -> Result<Dashboard, FetchError> {
    let raw = load_data(&config.source, client).await.map_err(|e| {
        warn!(policy = ?e.policy(), "Data acquisition failed: {}", e);
        e
    })?;
    Ok(assemble(config, raw, ctx))
}

pub fn assemble(config: &AppConfig, raw: Table, ctx: &RenderContext) -> Dashboard {
    let outcome = locate_rows(&raw);
    info!(
        rows = raw.len(),
        located = outcome.collection.len(),
        dropped = outcome.dropped,
        "Built point collection"
    );
    let points = outcome.collection;

    let map = MapView::compose(&points, &config.map, ctx);
    info!(
        basemaps = ?map.panes().active(),
        features = map.layer.len(),
        "Composed map view"
    );
    let chart = chart_panel(&config.chart, &points, ctx);
    if let ChartPanel::Unavailable(e) = &chart {
        warn!(policy = ?e.policy(), "Chart unavailable: {}", e);
    }

    Dashboard {
        context: ctx.clone(),
        variables: config.chart.variables().to_vec(),
        raw,
        points,
        map,
        chart,
    }
}

fn chart_panel(chart: &ChartConfig, points: &PointCollection, ctx: &RenderContext) -> ChartPanel {
    let result = match chart {
        ChartConfig::ValueCounts { .. } => {
            let column = ctx.chart_variable.as_deref().unwrap_or_default();
            FrequencyTable::compute(points, column).map(|table| ChartPanel::Frequency {
                chart: BarChart::from_frequency(&table),
                table,
            })
        }
        ChartConfig::Series { label, value, title } => BarChart::from_series(points, label, value)
            .map(|chart| ChartPanel::Series {
                title: title.clone(),
                chart,
            }),
    };
    result.unwrap_or_else(ChartPanel::Unavailable)
}
