pub mod dataset;

pub use dataset::{CountryRecord, LanguageTable};

use crate::geo::{ring_contains, Ring};
use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, JsonObject, Value};
use std::fs;
use std::path::Path;

/// Feature properties that may carry the country name, in priority order
pub const NAME_PROPERTIES: [&str; 3] = ["ADMIN", "admin", "NAME"];

/// One border feature: a named country made of one or more polygons
#[derive(Clone, Debug, PartialEq)]
pub struct Country {
    pub name: Option<String>,
    /// Outer rings only; holes are not kept
    pub polygons: Vec<Ring>,
}

impl Country {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// Whether (lon, lat) falls inside any of the country's polygons
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.polygons.iter().any(|ring| ring_contains(ring, lon, lat))
    }
}

/// Load the country border GeoJSON
pub fn load_borders(path: &Path) -> Result<Vec<Country>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_borders(&mut bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Parse border GeoJSON in place (simd-json rewrites the buffer)
pub fn parse_borders(bytes: &mut [u8]) -> Result<Vec<Country>> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;

    let countries = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.iter().filter_map(country_from_feature).collect(),
        GeoJson::Feature(f) => country_from_feature(&f).into_iter().collect(),
        GeoJson::Geometry(geometry) => {
            let polygons = outer_rings(&geometry.value);
            if polygons.is_empty() {
                Vec::new()
            } else {
                vec![Country { name: None, polygons }]
            }
        }
    };
    Ok(countries)
}

/// First string-valued name property, tried in `NAME_PROPERTIES` order
pub fn country_name(properties: Option<&JsonObject>) -> Option<String> {
    let props = properties?;
    NAME_PROPERTIES
        .iter()
        .find_map(|key| props.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn country_from_feature(feature: &Feature) -> Option<Country> {
    let geometry = feature.geometry.as_ref()?;
    let polygons = outer_rings(&geometry.value);
    if polygons.is_empty() {
        return None;
    }
    Some(Country {
        name: country_name(feature.properties.as_ref()),
        polygons,
    })
}

/// Outer ring of every polygon in the geometry
fn outer_rings(value: &Value) -> Vec<Ring> {
    match value {
        Value::Polygon(rings) => rings.first().map(|r| to_ring(r)).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first().map(|r| to_ring(r)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Convert GeoJSON positions to a ring, dropping the repeated closing vertex
fn to_ring(coords: &[Vec<f64>]) -> Ring {
    let mut ring: Ring = coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}
