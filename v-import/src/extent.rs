//! Transfert de la région active de la location cible vers la location
//! temporaire : capture en polygone, reprojection, application comme région.

use geo::{coord, BoundingRect, Coord, LineString, Polygon, Rect};
use geostore::{Location, Region, RegionGeometry};
use tracing::{debug, info, warn};

use crate::backend::{GisBackend, RegionUpdate};
use crate::error::WorkflowError;
use crate::workspace::unique_name;

pub const REGION_PREFIX: &str = "vreg";

/// Segments par côté du rectangle : le contour reprojeté suit les bords courbes
const EDGE_SEGMENTS: usize = 32;

/// Contour densifié d'un rectangle, sens anti-horaire
pub fn region_outline(rect: Rect<f64>, segments: usize) -> Polygon<f64> {
    let segments = segments.max(1);
    let (min, max) = (rect.min(), rect.max());
    let corners = [
        coord! { x: min.x, y: min.y },
        coord! { x: max.x, y: min.y },
        coord! { x: max.x, y: max.y },
        coord! { x: min.x, y: max.y },
    ];

    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(4 * segments + 1);
    for (i, start) in corners.iter().enumerate() {
        let end = corners[(i + 1) % corners.len()];
        for step in 0..segments {
            let t = step as f64 / segments as f64;
            ring.push(coord! {
                x: start.x + (end.x - start.x) * t,
                y: start.y + (end.y - start.y) * t,
            });
        }
    }
    ring.push(corners[0]);

    Polygon::new(LineString::new(ring), vec![])
}

/// Géométrie de région stockée dans la location cible.
///
/// Le dataset est supprimé à la sortie de portée s'il ne l'a pas été
/// explicitement par `remove`.
pub struct RegionArtifact<'a, B: GisBackend> {
    backend: &'a B,
    location: Location,
    geometry: RegionGeometry,
    removed: bool,
}

impl<B: GisBackend> RegionArtifact<'_, B> {
    pub fn geometry(&self) -> &RegionGeometry {
        &self.geometry
    }

    pub fn remove(mut self) -> Result<(), WorkflowError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), WorkflowError> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match self.backend.remove_dataset(&self.location, &self.geometry.name) {
            Ok(()) => {
                debug!(
                    dataset = %self.geometry.name,
                    location = self.location.name(),
                    "Region artifact removed"
                );
                Ok(())
            }
            Err(e) => {
                let err = WorkflowError::cleanup(&self.geometry.name, e);
                warn!("{}", err);
                Err(err)
            }
        }
    }
}

impl<B: GisBackend> Drop for RegionArtifact<'_, B> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Convertit la région active de `target` en polygone stocké dans `target`
pub fn capture_active_region<'a, B: GisBackend>(
    backend: &'a B,
    target: &Location,
) -> Result<RegionArtifact<'a, B>, WorkflowError> {
    let name = unique_name(REGION_PREFIX, |n| backend.dataset_exists(target, n))
        .map_err(|e| WorkflowError::reprojection(REGION_PREFIX, target.name(), target.name(), e))?;
    let fail = |e| WorkflowError::reprojection(&name, target.name(), target.name(), e);

    let region = backend.active_region(target).map_err(fail)?;
    let geometry = RegionGeometry {
        name: name.clone(),
        polygon: region_outline(region.to_rect(), EDGE_SEGMENTS),
    };
    backend.store_geometry(&geometry, target).map_err(fail)?;

    debug!(dataset = %name, location = target.name(), "Active region captured");
    Ok(RegionArtifact {
        backend,
        location: target.clone(),
        geometry,
        removed: false,
    })
}

/// Reprojette la géométrie de région de `from` vers `to`
pub fn reproject<B: GisBackend>(
    backend: &B,
    geometry: &RegionGeometry,
    from: &Location,
    to: &Location,
) -> Result<RegionGeometry, WorkflowError> {
    info!("Reprojecting region from <{}> to <{}>...", from.name(), to.name());
    backend
        .reproject_geometry(geometry, from, to)
        .map_err(|e| WorkflowError::reprojection(&geometry.name, from.name(), to.name(), e))
}

/// Applique la géométrie comme région active de `location`.
///
/// Deux étapes dans cet ordre : résolution unitaire, puis calage des limites
/// sur l'emprise de la géométrie.
pub fn apply_as_region<B: GisBackend>(
    backend: &B,
    geometry: &RegionGeometry,
    location: &Location,
) -> Result<Region, WorkflowError> {
    let fail = |e| WorkflowError::reprojection(&geometry.name, location.name(), location.name(), e);

    let rect = geometry
        .polygon
        .bounding_rect()
        .ok_or_else(|| fail(anyhow::anyhow!("empty region geometry")))?;

    backend
        .set_active_region(location, RegionUpdate::Resolution(1.0))
        .map_err(fail)?;
    let region = backend
        .set_active_region(location, RegionUpdate::FitTo(rect))
        .map_err(fail)?;

    debug!(
        location = location.name(),
        north = region.north,
        south = region.south,
        east = region.east,
        west = region.west,
        "Region applied"
    );
    Ok(region)
}
