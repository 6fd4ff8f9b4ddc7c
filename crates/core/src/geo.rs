//! Working-area geometry: payload parsing and point containment.
//!
//! A working area arrives as a JSON string holding either a single
//! polygon (`[ring, ...]`) or a multi-polygon (`[polygon, ...]`); the
//! single-polygon shape is auto-wrapped on parse. Containment tests only
//! the outer ring (index 0) of each polygon; inner rings are holes and
//! are ignored.

use serde_json::Value;

/// An ordered sequence of `[longitude, latitude]` pairs, length >= 3.
pub type Ring = Vec<[f64; 2]>;

/// An ordered sequence of rings; index 0 is the outer boundary.
pub type Polygon = Vec<Ring>;

/// A normalized multi-polygon working area.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingArea {
    polygons: Vec<Polygon>,
}

/// Structural violations detected while parsing a working-area payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoParseError {
    #[error("working area is not valid JSON: {0}")]
    Json(String),

    #[error("working area must be a non-empty JSON array of polygons")]
    NotAPolygonArray,

    #[error("polygon {index} has no rings")]
    EmptyPolygon { index: usize },

    #[error("ring has {len} points, a ring needs at least 3")]
    ShortRing { len: usize },

    #[error("coordinate must be a numeric [longitude, latitude] pair")]
    BadCoordinate,
}

impl WorkingArea {
    /// Parse a JSON working-area string into a normalized multi-polygon.
    ///
    /// Accepts both `[polygon]`-shaped and `[polygon, polygon, ...]`-shaped
    /// input; a bare polygon (an array of rings) is wrapped into a
    /// one-polygon area. Any structural violation is a parse failure.
    pub fn parse(input: &str) -> Result<WorkingArea, GeoParseError> {
        let value: Value =
            serde_json::from_str(input).map_err(|e| GeoParseError::Json(e.to_string()))?;

        let outer = match value.as_array() {
            Some(outer) if !outer.is_empty() => outer,
            _ => return Err(GeoParseError::NotAPolygonArray),
        };

        // A polygon nests three arrays deep ([ring][point][coord]), a
        // multi-polygon four. Probe the first leaf to pick the shape,
        // then validate strictly below.
        let polygon_values: Vec<&Value> = match nesting_depth(&value) {
            4 => outer.iter().collect(),
            3 => vec![&value],
            _ => return Err(GeoParseError::NotAPolygonArray),
        };

        let mut polygons = Vec::with_capacity(polygon_values.len());
        for (index, polygon_value) in polygon_values.into_iter().enumerate() {
            polygons.push(parse_polygon(polygon_value, index)?);
        }

        Ok(WorkingArea { polygons })
    }

    /// True iff the point lies inside the outer ring of any polygon.
    /// Stops at the first match.
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        self.polygons.iter().any(|polygon| {
            polygon
                .first()
                .is_some_and(|outer| point_in_ring(longitude, latitude, outer))
        })
    }

    /// Number of polygons in the area.
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }
}

/// Depth of the first-element chain of nested arrays.
fn nesting_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => match items.first() {
            Some(inner) => 1 + nesting_depth(inner),
            None => 1,
        },
        _ => 0,
    }
}

fn parse_polygon(value: &Value, index: usize) -> Result<Polygon, GeoParseError> {
    let rings_value = value
        .as_array()
        .ok_or(GeoParseError::NotAPolygonArray)?;
    if rings_value.is_empty() {
        return Err(GeoParseError::EmptyPolygon { index });
    }

    let mut rings = Vec::with_capacity(rings_value.len());
    for ring_value in rings_value {
        rings.push(parse_ring(ring_value)?);
    }
    Ok(rings)
}

fn parse_ring(value: &Value) -> Result<Ring, GeoParseError> {
    let points_value = value.as_array().ok_or(GeoParseError::BadCoordinate)?;
    if points_value.len() < 3 {
        return Err(GeoParseError::ShortRing {
            len: points_value.len(),
        });
    }

    let mut points = Vec::with_capacity(points_value.len());
    for point_value in points_value {
        let pair = point_value.as_array().ok_or(GeoParseError::BadCoordinate)?;
        if pair.len() != 2 {
            return Err(GeoParseError::BadCoordinate);
        }
        let longitude = pair[0].as_f64().ok_or(GeoParseError::BadCoordinate)?;
        let latitude = pair[1].as_f64().ok_or(GeoParseError::BadCoordinate)?;
        points.push([longitude, latitude]);
    }
    Ok(points)
}

/// Ray-casting point-in-ring test.
///
/// Toggles the inside flag once per crossed edge. Edges are half-open;
/// behavior for points exactly on an edge is not part of the contract.
fn point_in_ring(x: f64, y: f64, ring: &[[f64; 2]]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i][0], ring[i][1]);
        let (xj, yj) = (ring[j][0], ring[j][1]);
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
