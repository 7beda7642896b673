//! Reprojection intelligente : reproject_lite en priorité, fallback sur proj
//!
//! Utilise automatiquement la meilleure option disponible.

use super::ReprojectorLite;
use anyhow::{bail, Result};
use geo::Geometry;
use geostore::CrsInfo;

/// Reprojection intelligente
///
/// Identité si les descripteurs canoniques sont égaux, puis reproject_lite
/// (pure Rust), puis proj si la feature `reproject` est activée.
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ (si feature activée)
    #[cfg(feature = "reproject")]
    Proj(crate::reproject::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un reprojector entre deux définitions de CRS
    pub fn between(source: &CrsInfo, target: &CrsInfo) -> Result<Self> {
        if source.canonical() == target.canonical() {
            return Ok(Self::Identity);
        }

        if source.is_unreferenced() || target.is_unreferenced() {
            bail!(
                "No transformation between <{}> and <{}>: unreferenced coordinate system",
                source.name,
                target.name
            );
        }

        let (Some(source_epsg), Some(target_epsg)) = (source.epsg, target.epsg) else {
            bail!(
                "No transformation between <{}> and <{}>: missing EPSG code",
                source.name,
                target.name
            );
        };

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            let lite = ReprojectorLite::new(source_epsg, target_epsg)?;
            return Ok(Self::Lite(lite));
        }

        #[cfg(feature = "reproject")]
        {
            let proj = crate::reproject::Reprojector::new(source_epsg, target_epsg)?;
            return Ok(Self::Proj(proj));
        }

        #[cfg(not(feature = "reproject"))]
        bail!(
            "Reprojection EPSG:{} -> EPSG:{} not supported.\n\
             Supported without PROJ: 4326, 4171, 2154, 3857, UTM WGS84 (326xx/327xx).\n\
             For other systems build with: cargo build --features reproject",
            source_epsg,
            target_epsg
        );
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (no reprojection)",
            Self::Lite(_) => "reproject_lite (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostore::srs::crs_from_epsg;

    #[test]
    fn test_identity() {
        let r = SmartReprojector::between(&crs_from_epsg(4326), &crs_from_epsg(4326)).unwrap();
        assert!(matches!(r, SmartReprojector::Identity));
    }

    #[test]
    fn test_lite() {
        let r = SmartReprojector::between(&crs_from_epsg(2154), &crs_from_epsg(32631)).unwrap();
        assert!(matches!(r, SmartReprojector::Lite(_)));
    }

    #[test]
    fn test_unreferenced_refused() {
        let r = SmartReprojector::between(&CrsInfo::unreferenced(), &crs_from_epsg(4326));
        assert!(r.is_err());
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_without_proj() {
        let r = SmartReprojector::between(&crs_from_epsg(27572), &crs_from_epsg(4326));
        assert!(r.is_err());
    }
}
