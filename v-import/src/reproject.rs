//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

use anyhow::{Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj::Proj;

/// Reprojection de géométries entre deux systèmes de coordonnées
pub struct Reprojector {
    proj: Proj,
    source_epsg: u32,
    target_epsg: u32,
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).context(format!(
            "Failed to create projection from {} to {}",
            source, target
        ))?;

        Ok(Self {
            proj,
            source_epsg,
            target_epsg,
        })
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self
                .proj
                .convert((c.x, c.y))
                .context("Coordinate transformation failed")?;
            Ok(Coord { x, y })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    #[test]
    fn test_lambert93_to_wgs84() {
        let reprojector = Reprojector::new(2154, 4326).unwrap();

        let paris_l93 = Geometry::Point(Point::new(652381.0, 6862047.0));
        let paris_wgs84 = reprojector.transform_geometry(&paris_l93).unwrap();

        if let Geometry::Point(p) = paris_wgs84 {
            assert!(p.x() > 2.0 && p.x() < 3.0, "lon={}", p.x());
            assert!(p.y() > 48.0 && p.y() < 49.0, "lat={}", p.y());
        } else {
            panic!("Expected Point geometry");
        }
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(99999, 4326).is_err());
    }
}
