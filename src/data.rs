use crate::types::{ColorAssignment, Palette, Region};
use anyhow::{anyhow, Context, Result};
use geo::{Geometry, GeometryCollection, MultiPolygon};
use geojson::{GeoJson, JsonObject};
use serde::{Deserialize, Serialize};
use shapefile::dbase::{FieldValue, Record};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_PLACEHOLDER: &str = "不明"; // "unknown"

/// The datasets the application ships property lists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    World,
    Tokyo23,
}

/// Reads a region identifier out of a feature's property bag.
///
/// Keys are tried in order and the first usable value wins: a non-empty
/// string, or a number. When nothing matches the placeholder is used, so a
/// region is never dropped for lacking a name. Distinct unnamed regions
/// therefore share one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    pub keys: Vec<String>,
    pub placeholder: String,
}

impl IdentifierPolicy {
    pub fn new(keys: Vec<String>, placeholder: impl Into<String>) -> Self {
        Self {
            keys,
            placeholder: placeholder.into(),
        }
    }

    pub fn for_dataset(kind: DatasetKind) -> Self {
        let keys: &[&str] = match kind {
            DatasetKind::World => &["ADMIN", "name"],
            DatasetKind::Tokyo23 => &["ADMIN", "name", "N03_004", "N03_003", "ward", "区名", "city"],
        };
        Self::new(keys.iter().map(|k| k.to_string()).collect(), DEFAULT_PLACEHOLDER)
    }

    fn resolve_with(&self, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
        self.keys
            .iter()
            .find_map(|key| lookup(key))
            .unwrap_or_else(|| self.placeholder.clone())
    }

    pub fn resolve(&self, properties: Option<&JsonObject>) -> String {
        self.resolve_with(|key| match properties?.get(key)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn resolve_record(&self, record: &Record) -> String {
        self.resolve_with(|key| match record.get(key)? {
            FieldValue::Character(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            FieldValue::Numeric(Some(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

fn empty_geometry() -> Geometry<f64> {
    Geometry::GeometryCollection(GeometryCollection::default())
}

pub fn regions_from_geojson(geojson: GeoJson, policy: &IdentifierPolicy) -> Result<Vec<Region>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut regions = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let id = policy.resolve(feature.properties.as_ref());

        // Keep the feature even when its geometry is unusable; it still needs
        // to be counted and painted.
        let geometry = match feature.geometry {
            Some(geom) => match Geometry::<f64>::try_from(geom.value) {
                Ok(g) => g,
                Err(e) => {
                    warn!(region = %id, error = %e, "unconvertible geometry, treating as empty");
                    empty_geometry()
                }
            },
            None => {
                warn!(region = %id, "feature has no geometry");
                empty_geometry()
            }
        };

        regions.push(Region { id, geometry });
    }

    report_duplicates(&regions, policy);
    Ok(regions)
}

fn report_duplicates(regions: &[Region], policy: &IdentifierPolicy) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for region in regions {
        *counts.entry(region.id.as_str()).or_default() += 1;
    }
    for (id, count) in counts.into_iter().filter(|(_, n)| *n > 1) {
        if id == policy.placeholder {
            warn!(count, placeholder = id, "regions without a recognised name share the placeholder id");
        } else {
            warn!(id, count, "duplicate region id; these regions share one color");
        }
    }
}

pub fn load_regions(path: &Path, policy: &IdentifierPolicy) -> Result<Vec<Region>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input geometry file has no extension"))?;

    let regions = match extension.as_str() {
        "shp" => load_shapefile(path, policy)?,
        "json" | "geojson" => load_geojson(path, policy)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    info!(path = ?path, regions = regions.len(), "loaded regions");
    Ok(regions)
}

fn load_geojson(path: &Path, policy: &IdentifierPolicy) -> Result<Vec<Region>> {
    let file = File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let geojson = GeoJson::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;
    regions_from_geojson(geojson, policy)
}

fn load_shapefile(path: &Path, policy: &IdentifierPolicy) -> Result<Vec<Region>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut regions = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let id = policy.resolve_record(&record);

        let converted: Result<MultiPolygon<f64>, String> = match shape {
            shapefile::Shape::Polygon(polygon) => polygon.try_into().map_err(|e| format!("{:?}", e)),
            shapefile::Shape::PolygonM(polygon) => polygon.try_into().map_err(|e| format!("{:?}", e)),
            shapefile::Shape::PolygonZ(polygon) => polygon.try_into().map_err(|e| format!("{:?}", e)),
            other => {
                warn!(region = %id, shape = ?other.shapetype(), "non-polygon shape, treating as empty");
                regions.push(Region { id, geometry: empty_geometry() });
                continue;
            }
        };

        let geometry = match converted {
            Ok(mp) => Geometry::MultiPolygon(mp),
            Err(e) => {
                warn!(region = %id, error = %e, "failed to convert polygon, treating as empty");
                empty_geometry()
            }
        };
        regions.push(Region { id, geometry });
    }

    report_duplicates(&regions, policy);
    Ok(regions)
}

pub fn parse_coloring(json: &str, palette: &Palette) -> Result<ColorAssignment> {
    let coloring: ColorAssignment =
        serde_json::from_str(json).context("Coloring must be a JSON object of region id to color index")?;

    if let Some((id, color)) = coloring.iter().find(|(_, c)| !palette.contains(*c)) {
        return Err(anyhow!(
            "Region '{}' has color {} but the palette only has {} colors",
            id,
            color,
            palette.len()
        ));
    }
    Ok(coloring)
}

pub fn load_coloring(path: &Path, palette: &Palette) -> Result<ColorAssignment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read coloring file: {:?}", path))?;
    parse_coloring(&content, palette)
}
