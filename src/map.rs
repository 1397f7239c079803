//! Map view composition: view state, point layer and basemap panes.
//!
//! The browser widget does the tiling and interaction. This module decides
//! what it should show: where to center, which points to draw, and which
//! basemap each pane uses.

use crate::config::MapSettings;
use crate::controls::RenderContext;
use crate::types::{PointCollection, CRS};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::MultiPoint;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Basemap {
    #[default]
    #[serde(rename = "OpenStreetMap")]
    OpenStreetMap,
    #[serde(rename = "SATELLITE")]
    Satellite,
    #[serde(rename = "Stamen.Terrain")]
    StamenTerrain,
}

/// Tile endpoint the widget loads for a basemap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileSource {
    pub url: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

impl Basemap {
    /// Dropdown order; the first entry is the default selection.
    pub const ALL: [Basemap; 3] = [
        Basemap::OpenStreetMap,
        Basemap::Satellite,
        Basemap::StamenTerrain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Basemap::OpenStreetMap => "OpenStreetMap",
            Basemap::Satellite => "SATELLITE",
            Basemap::StamenTerrain => "Stamen.Terrain",
        }
    }

    pub fn tile_source(self) -> TileSource {
        match self {
            Basemap::OpenStreetMap => TileSource {
                url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "&copy; OpenStreetMap contributors",
                max_zoom: 19,
            },
            Basemap::Satellite => TileSource {
                url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "Tiles &copy; Esri",
                max_zoom: 19,
            },
            Basemap::StamenTerrain => TileSource {
                url: "https://tiles.stadiamaps.com/tiles/stamen_terrain/{z}/{x}/{y}.png",
                attribution: "&copy; Stadia Maps &copy; Stamen Design &copy; OpenStreetMap contributors",
                max_zoom: 18,
            },
        }
    }
}

impl fmt::Display for Basemap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Basemap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Basemap::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Basemap arrangement: one pane, or two synchronized panes side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Panes {
    Single { basemap: Basemap },
    Split { left: Basemap, right: Basemap },
}

impl Panes {
    pub fn active(&self) -> Vec<Basemap> {
        match *self {
            Panes::Single { basemap } => vec![basemap],
            Panes::Split { left, right } => vec![left, right],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer {
    pub label: String,
    pub features: FeatureCollection,
}

impl PointLayer {
    /// One GeoJSON point per record, attributes as properties.
    pub fn from_collection(label: &str, collection: &PointCollection) -> Self {
        let features = collection
            .records
            .iter()
            .map(|record| {
                let properties: JsonObject = record
                    .attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone().unwrap_or_default()))
                    .collect();
                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(geojson::Value::Point(vec![
                        record.longitude,
                        record.latitude,
                    ]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let points = MultiPoint::new(collection.records.iter().map(|r| r.geometry).collect());
        let bbox = points
            .bounding_rect()
            .map(|rect| vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]);

        let mut crs = JsonObject::new();
        crs.insert("crs".to_string(), serde_json::Value::from(CRS));

        PointLayer {
            label: label.to_string(),
            features: FeatureCollection {
                bbox,
                features,
                foreign_members: Some(crs),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.features.features.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub layer: PointLayer,
    panes: Panes,
}

impl MapView {
    pub fn new(settings: &MapSettings, layer: PointLayer) -> Self {
        MapView {
            center: settings.center,
            zoom: settings.zoom,
            layer,
            panes: Panes::Single {
                basemap: Basemap::default(),
            },
        }
    }

    /// Build the view for one render pass from the current control values.
    pub fn compose(collection: &PointCollection, settings: &MapSettings, ctx: &RenderContext) -> Self {
        let layer = PointLayer::from_collection(&settings.layer_name, collection);
        let mut view = MapView::new(settings, layer);
        if ctx.split_view {
            view.split(settings.split_left, settings.split_right);
        } else {
            view.unsplit(ctx.basemap);
        }
        view
    }

    pub fn panes(&self) -> Panes {
        self.panes
    }

    /// Replace the active basemap. A split view collapses back to one pane.
    pub fn set_basemap(&mut self, basemap: Basemap) {
        self.panes = Panes::Single { basemap };
    }

    pub fn split(&mut self, left: Basemap, right: Basemap) {
        self.panes = Panes::Split { left, right };
    }

    /// Leave split mode. Whatever single-pane basemap existed before the
    /// split is gone; `basemap` becomes the active one.
    pub fn unsplit(&mut self, basemap: Basemap) {
        self.set_basemap(basemap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{tests::CITIES_TOML, AppConfig};
    use crate::data::static_cities;
    use crate::filter::locate_rows;

    fn settings() -> MapSettings {
        AppConfig::from_toml(CITIES_TOML).unwrap().map
    }

    fn ctx(basemap: Basemap, split_view: bool) -> RenderContext {
        RenderContext {
            basemap,
            chart_variable: None,
            split_view,
        }
    }

    #[test]
    fn basemap_names_round_trip_through_from_str() {
        for b in Basemap::ALL {
            assert_eq!(b.name().parse::<Basemap>(), Ok(b));
        }
        assert!("Mars".parse::<Basemap>().is_err());
        assert_eq!(Basemap::default(), Basemap::ALL[0]);
    }

    #[test]
    fn compose_uses_fixed_view_and_layer_label() {
        let collection = locate_rows(&static_cities()).collection;
        let view = MapView::compose(&collection, &settings(), &ctx(Basemap::StamenTerrain, false));
        assert_eq!(view.center, [40.0, -100.0]);
        assert_eq!(view.zoom, 3);
        assert_eq!(view.layer.label, "Cities");
        assert_eq!(view.layer.len(), 5);
        assert_eq!(
            view.panes(),
            Panes::Single {
                basemap: Basemap::StamenTerrain
            }
        );
    }

    #[test]
    fn layer_bbox_covers_all_points() {
        let collection = locate_rows(&static_cities()).collection;
        let layer = PointLayer::from_collection("Cities", &collection);
        assert_eq!(layer.features.bbox, Some(vec![-122.4, 34.05, 2.35, 51.51]));
    }

    #[test]
    fn selecting_same_basemap_twice_is_a_no_op() {
        let collection = locate_rows(&static_cities()).collection;
        let mut view = MapView::compose(&collection, &settings(), &ctx(Basemap::Satellite, false));
        let before = view.clone();
        view.set_basemap(Basemap::Satellite);
        assert_eq!(view, before);
        assert_eq!(view.panes().active(), vec![Basemap::Satellite]);
    }

    #[test]
    fn split_uses_configured_pair() {
        let collection = locate_rows(&static_cities()).collection;
        let view = MapView::compose(&collection, &settings(), &ctx(Basemap::StamenTerrain, true));
        assert_eq!(
            view.panes(),
            Panes::Split {
                left: Basemap::OpenStreetMap,
                right: Basemap::Satellite
            }
        );
        assert_eq!(view.panes().active().len(), 2);
    }

    #[test]
    fn toggling_split_off_restores_current_selection() {
        let collection = locate_rows(&static_cities()).collection;
        let mut view = MapView::compose(&collection, &settings(), &ctx(Basemap::OpenStreetMap, false));
        view.split(Basemap::OpenStreetMap, Basemap::Satellite);
        view.unsplit(Basemap::StamenTerrain);
        assert_eq!(
            view.panes(),
            Panes::Single {
                basemap: Basemap::StamenTerrain
            }
        );

        // a fresh render pass with split off reflects the dropdown, not the old pane
        let again = MapView::compose(&collection, &settings(), &ctx(Basemap::StamenTerrain, false));
        assert_eq!(again.panes(), view.panes());
    }
}
