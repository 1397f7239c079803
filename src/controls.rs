use crate::config::ChartConfig;
use crate::error::ControlError;
use crate::map::Basemap;
use serde::Deserialize;

/// Raw sidebar values as they arrive from the page's form.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ControlParams {
    pub basemap: Option<String>,
    pub variable: Option<String>,
    pub split: Option<String>,
}

/// Control values for one render pass. Built once and passed by reference
/// through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub basemap: Basemap,
    /// `None` when the dashboard has no chart-variable dropdown.
    pub chart_variable: Option<String>,
    pub split_view: bool,
}

impl RenderContext {
    pub fn resolve(params: &ControlParams, chart: &ChartConfig) -> Result<Self, ControlError> {
        let basemap = match params.basemap.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => name
                .parse::<Basemap>()
                .map_err(ControlError::UnknownBasemap)?,
            None => Basemap::default(),
        };

        let chart_variable = match chart {
            ChartConfig::ValueCounts { variables } => params
                .variable
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| variables.first().cloned()),
            ChartConfig::Series { .. } => None,
        };

        let split_view = matches!(params.split.as_deref(), Some("on" | "true" | "1"));

        Ok(RenderContext {
            basemap,
            chart_variable,
            split_view,
        })
    }
}
