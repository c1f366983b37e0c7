//! Planar predicates on `(longitude, latitude)` coordinates in degrees.

use hindcast_io::{BoundingBox, Polygon};

/// Axis-aligned square of half-width `half` centred on a grid point
/// (a flat-capped point buffer).
pub(crate) fn square(latitude: f64, longitude: f64, half: f64) -> BoundingBox {
    BoundingBox::new(
        longitude - half,
        latitude - half,
        longitude + half,
        latitude + half,
    )
}

fn corners(b: &BoundingBox) -> [(f64, f64); 4] {
    [
        (b.lon_min, b.lat_min),
        (b.lon_max, b.lat_min),
        (b.lon_max, b.lat_max),
        (b.lon_min, b.lat_max),
    ]
}

fn contains_closed(b: &BoundingBox, (x, y): (f64, f64)) -> bool {
    x >= b.lon_min && x <= b.lon_max && y >= b.lat_min && y <= b.lat_max
}

/// Ray casting; points exactly on an edge may fall either way.
fn ring_contains(ring: &[(f64, f64)], (x, y): (f64, f64)) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Whether `point` lies in the polygon interior (inside the exterior ring
/// and outside every hole).
pub(crate) fn polygon_contains(polygon: &Polygon, point: (f64, f64)) -> bool {
    ring_contains(&polygon.exterior, point)
        && !polygon.holes.iter().any(|h| ring_contains(h, point))
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Closed segment intersection; touching endpoints and collinear overlap
/// count.
pub(crate) fn segments_intersect(
    p1: (f64, f64),
    p2: (f64, f64),
    q1: (f64, f64),
    q2: (f64, f64),
) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

fn edges(ring: &[(f64, f64)]) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Whether a closed square shares at least one point with a polygon.
///
/// Boundary contact counts. A square lying entirely inside a hole does not
/// intersect.
pub(crate) fn square_intersects_polygon(b: &BoundingBox, polygon: &Polygon) -> bool {
    match polygon.bounds() {
        Some(pb) if pb.intersects(b) => {}
        _ => return false,
    }

    let rings = || std::iter::once(&polygon.exterior).chain(polygon.holes.iter());

    if rings().flatten().any(|&v| contains_closed(b, v)) {
        return true;
    }
    let square_corners = corners(b);
    if square_corners.iter().any(|&c| polygon_contains(polygon, c)) {
        return true;
    }
    let square_edges: Vec<_> = edges(&square_corners).collect();
    rings().any(|ring| {
        edges(ring).any(|(a, c)| {
            square_edges
                .iter()
                .any(|&(s1, s2)| segments_intersect(s1, s2, a, c))
        })
    })
}
