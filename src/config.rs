use crate::map::Basemap;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
    pub source: SourceConfig,
    pub map: MapSettings,
    pub chart: ChartConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub title: String,
    pub description: String,
    #[serde(default = "default_map_height")]
    pub map_height: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Static,
    Remote {
        url: String,
        /// Feature properties copied into table columns, in column order.
        #[serde(default = "default_properties")]
        properties: Vec<String>,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MapSettings {
    pub center: [f64; 2], // [lat, lon]
    pub zoom: u8,
    pub layer_name: String,
    #[serde(default = "default_split_left")]
    pub split_left: Basemap,
    #[serde(default = "default_split_right")]
    pub split_right: Basemap,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartConfig {
    /// Top-10 value counts over a user-selected column.
    ValueCounts { variables: Vec<String> },
    /// One bar per record: `label` column on x, `value` column on y.
    Series {
        label: String,
        value: String,
        title: String,
    },
}

impl ChartConfig {
    /// Options offered by the chart-variable dropdown. Empty for series charts.
    pub fn variables(&self) -> &[String] {
        match self {
            ChartConfig::ValueCounts { variables } => variables,
            ChartConfig::Series { .. } => &[],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

fn default_properties() -> Vec<String> {
    [
        "created_date",
        "agency",
        "complaint_type",
        "descriptor",
        "location_type",
        "incident_address",
        "community_board",
        "open_data_channel_type",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_map_height() -> u32 {
    600
}

fn default_split_left() -> Basemap {
    Basemap::OpenStreetMap
}

fn default_split_right() -> Basemap {
    Basemap::Satellite
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
