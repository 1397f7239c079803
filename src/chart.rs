use crate::error::ChartError;
use crate::types::{display_value, PointCollection};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use svg::node::element::{Line, Rectangle, Text};
use svg::Document;

/// Number of distinct values kept in a frequency table.
pub const TOP_N: usize = 10;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 110.0;
const MARGIN_TOP: f64 = 20.0;
const BAR_FILL: &str = "#1f77b4";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// Occurrence counts per distinct value of one column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyTable {
    pub column: String,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Count non-null values of `column`, sort by descending count and keep
    /// the top ten. Ties keep the order in which values were first seen.
    pub fn compute(collection: &PointCollection, column: &str) -> Result<Self, ChartError> {
        if collection.is_empty() {
            return Err(ChartError::EmptyCollection {
                column: column.to_string(),
            });
        }
        if !collection.has_column(column) {
            return Err(ChartError::MissingColumn {
                column: column.to_string(),
            });
        }

        // keyed by the JSON encoding so that 1 and "1" stay distinct
        let mut counts: IndexMap<String, (&Value, usize)> = IndexMap::new();
        for record in &collection.records {
            if let Some(value) = record.attribute(column).filter(|v| !v.is_null()) {
                counts.entry(value.to_string()).or_insert((value, 0)).1 += 1;
            }
        }

        let mut entries: Vec<FrequencyEntry> = counts
            .into_values()
            .map(|(value, count)| FrequencyEntry {
                value: display_value(value),
                count,
            })
            .collect();
        // stable sort
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(TOP_N);

        Ok(FrequencyTable {
            column: column.to_string(),
            entries,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn from_frequency(table: &FrequencyTable) -> Self {
        BarChart {
            x_label: table.column.clone(),
            y_label: "Count".to_string(),
            bars: table
                .entries
                .iter()
                .map(|e| Bar {
                    label: e.value.clone(),
                    value: e.count as f64,
                })
                .collect(),
        }
    }

    /// One bar per record, labelled by `label` with height taken from `value`.
    /// Records whose value is missing or not numeric get no bar.
    pub fn from_series(
        collection: &PointCollection,
        label: &str,
        value: &str,
    ) -> Result<Self, ChartError> {
        if collection.is_empty() {
            return Err(ChartError::EmptyCollection {
                column: value.to_string(),
            });
        }
        for column in [label, value] {
            if !collection.has_column(column) {
                return Err(ChartError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }

        let bars = collection
            .records
            .iter()
            .filter_map(|record| {
                let height = numeric(record.attribute(value)?)?;
                let name = record.attribute(label).map(display_value).unwrap_or_default();
                Some(Bar {
                    label: name,
                    value: height,
                })
            })
            .collect();

        Ok(BarChart {
            x_label: label.to_string(),
            y_label: value.to_string(),
            bars,
        })
    }

    pub fn to_svg(&self) -> Document {
        let plot_w = WIDTH - MARGIN_LEFT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let baseline = MARGIN_TOP + plot_h;
        let max = self.bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
        let slot = plot_w / self.bars.len().max(1) as f64;

        let mut document = Document::new()
            .set("viewBox", format!("0 0 {} {}", WIDTH, HEIGHT))
            .set("width", "100%")
            .set("class", "bar-chart")
            .add(axis(MARGIN_LEFT, MARGIN_TOP, MARGIN_LEFT, baseline))
            .add(axis(MARGIN_LEFT, baseline, WIDTH, baseline))
            .add(
                Text::new(self.y_label.clone())
                    .set("x", 4)
                    .set("y", MARGIN_TOP - 6.0)
                    .set("font-size", 12),
            );

        for (i, bar) in self.bars.iter().enumerate() {
            let h = if max > 0.0 { bar.value / max * plot_h } else { 0.0 };
            let x = MARGIN_LEFT + i as f64 * slot + slot * 0.1;
            let cx = x + slot * 0.4;

            document = document
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", baseline - h)
                        .set("width", slot * 0.8)
                        .set("height", h)
                        .set("fill", BAR_FILL),
                )
                .add(
                    Text::new(format_number(bar.value))
                        .set("x", cx)
                        .set("y", baseline - h - 4.0)
                        .set("font-size", 11)
                        .set("text-anchor", "middle"),
                )
                .add(
                    Text::new(bar.label.clone())
                        .set("x", cx)
                        .set("y", baseline + 14.0)
                        .set("font-size", 11)
                        .set("text-anchor", "end")
                        .set("transform", format!("rotate(-35 {} {})", cx, baseline + 14.0)),
                );
        }

        document
    }
}

fn axis(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", "#444")
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
