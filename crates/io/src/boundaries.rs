//! Administrative boundary polygons from GeoJSON.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::IoError;
use crate::loader::BoundingBox;
use crate::records::AdminCode;

/// Closed ring of `(longitude, latitude)` vertices.
pub type Ring = Vec<(f64, f64)>;

/// A polygon with an exterior ring and zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Bounding box of the exterior ring.
    pub fn bounds(&self) -> Option<BoundingBox> {
        ring_bounds(&self.exterior)
    }
}

fn ring_bounds(ring: &[(f64, f64)]) -> Option<BoundingBox> {
    let (&(x0, y0), rest) = ring.split_first()?;
    let mut b = BoundingBox::new(x0, y0, x0, y0);
    for &(x, y) in rest {
        b.lon_min = b.lon_min.min(x);
        b.lon_max = b.lon_max.max(x);
        b.lat_min = b.lat_min.min(y);
        b.lat_max = b.lat_max.max(y);
    }
    Some(b)
}

/// One administrative region: its code and (multi)polygon geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminBoundary {
    pub code: AdminCode,
    pub polygons: Vec<Polygon>,
}

impl AdminBoundary {
    /// Bounding box of all polygons.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.polygons
            .iter()
            .filter_map(Polygon::bounds)
            .reduce(|a, b| a.union(&b))
    }
}

/// Bounding box of every boundary together.
pub fn total_bounds(boundaries: &[AdminBoundary]) -> Option<BoundingBox> {
    boundaries
        .iter()
        .filter_map(AdminBoundary::bounds)
        .reduce(|a, b| a.union(&b))
}

/// Read administrative boundaries from a GeoJSON FeatureCollection.
///
/// `code_property` names the feature property holding the admin code
/// (string or number). Only `Polygon` and `MultiPolygon` geometries are
/// accepted; features with a null geometry are skipped with a warning.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file is missing, and
/// [`IoError::Boundary`] if it is not valid GeoJSON or a feature lacks the
/// code property.
pub fn read_admin_boundaries(
    path: &Path,
    code_property: &str,
) -> Result<Vec<AdminBoundary>, IoError> {
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|e| boundary_err(path, e.to_string()))?;
    let boundaries = parse_admin_boundaries(&text, code_property)
        .map_err(|reason| boundary_err(path, reason))?;
    info!(
        path = %path.display(),
        boundaries = boundaries.len(),
        code_property,
        "read admin boundaries"
    );
    Ok(boundaries)
}

fn boundary_err(path: &Path, reason: String) -> IoError {
    IoError::Boundary {
        path: path.to_path_buf(),
        reason,
    }
}

/// Parse a GeoJSON FeatureCollection string.
pub(crate) fn parse_admin_boundaries(
    text: &str,
    code_property: &str,
) -> Result<Vec<AdminBoundary>, String> {
    let doc: Value = serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))?;
    let features = match doc.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => doc
            .get("features")
            .and_then(Value::as_array)
            .ok_or("FeatureCollection has no 'features' array")?,
        other => return Err(format!("expected a FeatureCollection, found {other:?}")),
    };

    let mut out = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let code = match feature.get("properties").and_then(|p| p.get(code_property)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(format!("feature {i} has no '{code_property}' property")),
        };
        let geometry = match feature.get("geometry") {
            Some(Value::Null) | None => {
                warn!(feature = i, code = %code, "skipping feature without geometry");
                continue;
            }
            Some(g) => g,
        };
        let polygons = parse_geometry(geometry).map_err(|e| format!("feature {i}: {e}"))?;
        out.push(AdminBoundary {
            code: AdminCode::new(code),
            polygons,
        });
    }
    Ok(out)
}

fn parse_geometry(geometry: &Value) -> Result<Vec<Polygon>, String> {
    let coords = geometry
        .get("coordinates")
        .ok_or("geometry has no coordinates")?;
    match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => Ok(vec![parse_polygon(coords)?]),
        Some("MultiPolygon") => coords
            .as_array()
            .ok_or("MultiPolygon coordinates must be an array")?
            .iter()
            .map(parse_polygon)
            .collect(),
        other => Err(format!("unsupported geometry type {other:?}")),
    }
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords.as_array().ok_or("polygon coordinates must be an array")?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or("polygon has no exterior ring")??;
    let holes = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, holes))
}

fn parse_ring(ring: &Value) -> Result<Ring, String> {
    let positions = ring.as_array().ok_or("ring must be an array")?;
    let ring = positions
        .iter()
        .map(|p| {
            let lon = p.get(0).and_then(Value::as_f64);
            let lat = p.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => Ok((lon, lat)),
                _ => Err(format!("invalid position {p}")),
            }
        })
        .collect::<Result<Ring, String>>()?;
    if ring.len() < 3 {
        return Err(format!("ring has {} positions, need at least 3", ring.len()));
    }
    Ok(ring)
}
