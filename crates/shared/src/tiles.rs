//! Mapbox Vector Tile decoding into render-ready features.

use std::collections::HashMap;

use geo::Simplify;
use geo_types::{Geometry, LineString};
use mvt_reader::feature::Value;
use mvt_reader::Reader;

use crate::error::TileError;
use crate::models::CompanyRef;

/// Coordinate extent of one tile. Every layer the API serves uses the MVT
/// default.
pub const TILE_EXTENT: f64 = 4096.0;

pub type Ring = Vec<(f64, f64)>;

/// Tile-local geometry in [`TILE_EXTENT`] units.
#[derive(Debug, Clone, PartialEq)]
pub enum TileGeometry {
    Points(Vec<(f64, f64)>),
    Lines(Vec<Ring>),
    /// Exterior and interior rings, to be filled with the even-odd rule.
    Polygons(Vec<Ring>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileFeature {
    pub geometry: TileGeometry,
    pub properties: HashMap<String, String>,
}

impl TileFeature {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Company identity of a point feature, if it carries a `cnpj`.
    pub fn company(&self) -> Option<CompanyRef> {
        let cnpj = self.property("cnpj").filter(|c| !c.is_empty())?;
        Some(CompanyRef {
            cnpj: cnpj.to_string(),
            tipo: self.property("tipo").unwrap_or_default().to_string(),
        })
    }
}

/// Decode every layer of a tile. Line and polygon rings are simplified with
/// Douglas-Peucker when `simplify_tolerance` is set.
pub fn decode_tile(
    bytes: Vec<u8>,
    simplify_tolerance: Option<f64>,
) -> Result<Vec<TileFeature>, TileError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let reader = Reader::new(bytes).map_err(|e| TileError::Malformed(format!("{e:?}")))?;
    let layer_names = reader
        .get_layer_names()
        .map_err(|e| TileError::Malformed(format!("{e:?}")))?;

    let mut features = Vec::new();
    for layer in 0..layer_names.len() {
        let decoded = reader
            .get_features(layer)
            .map_err(|e| TileError::Layer {
                layer,
                reason: format!("{e:?}"),
            })?;
        for feature in decoded {
            let Some(geometry) = convert_geometry(&feature.geometry, simplify_tolerance) else {
                continue;
            };
            let properties = feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, value)| property_string(value).map(|v| (key, v)))
                .collect();
            features.push(TileFeature {
                geometry,
                properties,
            });
        }
    }
    Ok(features)
}

fn property_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Int(i) => Some(i.to_string()),
        Value::SInt(i) => Some(i.to_string()),
        Value::UInt(u) => Some(u.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(d) => Some(d.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn ring(line: &LineString<f32>, tolerance: Option<f64>, min_len: usize) -> Option<Ring> {
    let line: LineString<f64> = line.coords().map(|c| (c.x as f64, c.y as f64)).collect();
    let line = match tolerance {
        Some(t) if t > 0.0 => line.simplify(&t),
        _ => line,
    };
    let points: Ring = line.coords().map(|c| (c.x, c.y)).collect();
    (points.len() >= min_len).then_some(points)
}

fn convert_geometry(geometry: &Geometry<f32>, tolerance: Option<f64>) -> Option<TileGeometry> {
    let geometry = match geometry {
        Geometry::Point(p) => TileGeometry::Points(vec![(p.x() as f64, p.y() as f64)]),
        Geometry::MultiPoint(mp) => TileGeometry::Points(
            mp.iter().map(|p| (p.x() as f64, p.y() as f64)).collect(),
        ),
        Geometry::LineString(ls) => TileGeometry::Lines(ring(ls, tolerance, 2).into_iter().collect()),
        Geometry::MultiLineString(mls) => TileGeometry::Lines(
            mls.iter().filter_map(|ls| ring(ls, tolerance, 2)).collect(),
        ),
        Geometry::Polygon(poly) => TileGeometry::Polygons(polygon_rings(poly, tolerance)),
        Geometry::MultiPolygon(mp) => TileGeometry::Polygons(
            mp.iter().flat_map(|poly| polygon_rings(poly, tolerance)).collect(),
        ),
        _ => return None,
    };
    let empty = match &geometry {
        TileGeometry::Points(points) => points.is_empty(),
        TileGeometry::Lines(rings) | TileGeometry::Polygons(rings) => rings.is_empty(),
    };
    (!empty).then_some(geometry)
}

fn polygon_rings(poly: &geo_types::Polygon<f32>, tolerance: Option<f64>) -> Vec<Ring> {
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .filter_map(|r| ring(r, tolerance, 4))
        .collect()
}
