//! Reference grid: links forecast pixels to the admin regions they touch.

use std::collections::{BTreeMap, BTreeSet};

use hindcast_io::{AdminBoundary, AdminCode, AdminLink, GridPoint, Location, PixelId};
use tracing::{info, warn};

use crate::error::GridError;
use crate::geometry;

/// Configuration for [`build_reference_grid`].
#[derive(Debug, Clone)]
pub struct ReferenceGridConfig {
    /// Half-width of the square cell around each grid point, in degrees.
    half_width: f64,
}

impl Default for ReferenceGridConfig {
    fn default() -> Self {
        Self { half_width: 0.5 }
    }
}

impl ReferenceGridConfig {
    /// Set the cell half-width in degrees.
    pub fn with_half_width(mut self, half_width: f64) -> Self {
        self.half_width = half_width;
        self
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// # Errors
    ///
    /// Returns [`GridError::Validation`] unless the half-width is finite and
    /// positive.
    pub fn validate(&self) -> Result<(), GridError> {
        if !(self.half_width.is_finite() && self.half_width > 0.0) {
            return Err(GridError::Validation {
                count: 1,
                details: format!("half_width must be positive, got {}", self.half_width),
            });
        }
        Ok(())
    }
}

/// Immutable many-to-many link table between pixels and admin codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceGrid {
    links: Vec<AdminLink>,
    by_pixel: BTreeMap<PixelId, Vec<AdminCode>>,
}

impl ReferenceGrid {
    /// Build from link rows (e.g. read back from Parquet). Duplicate rows are
    /// collapsed.
    pub fn from_links(links: Vec<AdminLink>) -> Self {
        let links: Vec<AdminLink> = links
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut by_pixel: BTreeMap<PixelId, Vec<AdminCode>> = BTreeMap::new();
        for link in &links {
            by_pixel
                .entry(link.point.id())
                .or_default()
                .push(link.adm_pcode.clone());
        }
        Self { links, by_pixel }
    }

    pub fn links(&self) -> &[AdminLink] {
        &self.links
    }

    /// Admin codes linked to a pixel; empty if the pixel is not linked.
    pub fn codes_for(&self, id: PixelId) -> &[AdminCode] {
        self.by_pixel.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: PixelId) -> bool {
        self.by_pixel.contains_key(&id)
    }

    /// Number of distinct linked pixels.
    pub fn n_pixels(&self) -> usize {
        self.by_pixel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Distinct linked pixels in id order.
    pub fn pixels(&self) -> Vec<GridPoint> {
        let mut seen = BTreeSet::new();
        self.links
            .iter()
            .filter(|l| seen.insert(l.point.id()))
            .map(|l| l.point)
            .collect()
    }
}

/// Distinct pixel locations, in id order. Admin locations are skipped.
pub fn unique_points<'a>(locations: impl Iterator<Item = &'a Location>) -> Vec<GridPoint> {
    locations
        .filter_map(|l| match l {
            Location::Pixel(p) => Some(*p),
            Location::Admin(_) => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Link every grid point to each admin polygon its square cell intersects.
///
/// A pixel touching two regions yields two rows. Pixels touching nothing are
/// counted and logged; an empty result is a warning, not an error.
///
/// # Errors
///
/// Returns [`GridError::Validation`] for an invalid configuration.
pub fn build_reference_grid(
    points: &[GridPoint],
    boundaries: &[AdminBoundary],
    config: &ReferenceGridConfig,
) -> Result<ReferenceGrid, GridError> {
    config.validate()?;

    let points: BTreeSet<GridPoint> = points.iter().copied().collect();
    let bounds: Vec<_> = boundaries.iter().map(AdminBoundary::bounds).collect();

    let mut links = Vec::new();
    let mut unlinked = 0usize;
    for point in &points {
        let cell = geometry::square(point.latitude(), point.longitude(), config.half_width);
        let before = links.len();
        for (boundary, b) in boundaries.iter().zip(&bounds) {
            if !b.is_some_and(|b| b.intersects(&cell)) {
                continue;
            }
            if boundary
                .polygons
                .iter()
                .any(|poly| geometry::square_intersects_polygon(&cell, poly))
            {
                links.push(AdminLink {
                    point: *point,
                    adm_pcode: boundary.code.clone(),
                });
            }
        }
        if links.len() == before {
            unlinked += 1;
        }
    }

    let grid = ReferenceGrid::from_links(links);
    if grid.is_empty() {
        warn!(
            pixels = points.len(),
            boundaries = boundaries.len(),
            "no grid cell intersects any admin boundary"
        );
    }
    info!(
        pixels = points.len(),
        linked_pixels = grid.n_pixels(),
        unlinked_pixels = unlinked,
        links = grid.links().len(),
        "built reference grid"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use hindcast_io::Polygon;

    use super::*;

    fn rect(code: &str, lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> AdminBoundary {
        AdminBoundary {
            code: AdminCode::new(code),
            polygons: vec![Polygon::new(
                vec![(lon0, lat0), (lon1, lat0), (lon1, lat1), (lon0, lat1), (lon0, lat0)],
                vec![],
            )],
        }
    }

    #[test]
    fn pixel_on_border_links_to_both_regions() {
        let boundaries = vec![
            rect("A", 0.0, 0.0, 2.0, 2.0),
            rect("B", 2.0, 0.0, 4.0, 2.0),
        ];
        let points = vec![GridPoint::new(1.0, 2.0), GridPoint::new(1.0, 0.5)];
        let grid =
            build_reference_grid(&points, &boundaries, &ReferenceGridConfig::default()).unwrap();
        let border = GridPoint::new(1.0, 2.0);
        let codes: Vec<_> = grid.codes_for(border.id()).iter().map(AdminCode::as_str).collect();
        assert_eq!(codes, vec!["A", "B"]);
        let inner = GridPoint::new(1.0, 0.5);
        assert_eq!(grid.codes_for(inner.id()).len(), 1);
        assert_eq!(grid.n_pixels(), 2);
    }

    #[test]
    fn buffer_catches_pixels_just_outside() {
        let boundaries = vec![rect("A", 0.0, 0.0, 1.0, 1.0)];
        // Centre 0.4 degrees east of the region; cell reaches back over it.
        let points = vec![GridPoint::new(0.5, 1.4), GridPoint::new(0.5, 1.6)];
        let grid =
            build_reference_grid(&points, &boundaries, &ReferenceGridConfig::default()).unwrap();
        assert!(grid.contains(GridPoint::new(0.5, 1.4).id()));
        assert!(!grid.contains(GridPoint::new(0.5, 1.6).id()));
    }

    #[test]
    fn no_overlap_gives_empty_grid() {
        let boundaries = vec![rect("A", 50.0, 50.0, 51.0, 51.0)];
        let points = vec![GridPoint::new(0.0, 0.0)];
        let grid =
            build_reference_grid(&points, &boundaries, &ReferenceGridConfig::default()).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn duplicate_points_are_linked_once() {
        let boundaries = vec![rect("A", 0.0, 0.0, 1.0, 1.0)];
        let p = GridPoint::new(0.5, 0.5);
        let grid = build_reference_grid(&[p, p], &boundaries, &ReferenceGridConfig::default())
            .unwrap();
        assert_eq!(grid.links().len(), 1);
    }

    #[test]
    fn invalid_half_width() {
        let config = ReferenceGridConfig::default().with_half_width(0.0);
        assert!(build_reference_grid(&[], &[], &config).is_err());
    }

    #[test]
    fn from_links_collapses_duplicates() {
        let p = GridPoint::new(0.5, 0.5);
        let link = AdminLink {
            point: p,
            adm_pcode: AdminCode::new("A"),
        };
        let grid = ReferenceGrid::from_links(vec![link.clone(), link]);
        assert_eq!(grid.links().len(), 1);
        assert_eq!(grid.pixels(), vec![p]);
    }
}
