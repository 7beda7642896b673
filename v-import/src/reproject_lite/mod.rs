//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Projections supportées, dans les deux sens :
//! - WGS84 (EPSG:4326) et RGF93 géographique (EPSG:4171)
//! - Lambert 93 (EPSG:2154)
//! - Web Mercator (EPSG:3857)
//! - UTM WGS84, toutes zones (EPSG:32601-32660, 32701-32760)
//!
//! Toute transformation passe par les coordonnées géographiques. GRS80 et
//! WGS84 sont confondus (écart < 0.1mm).

mod ellipsoid;
mod lambert;
mod mercator;
mod smart;
mod utm;

pub use smart::SmartReprojector;

use anyhow::{bail, Result};
use geo::{Coord, Geometry, MapCoords};

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection identifiée par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    /// Longitude/latitude en degrés
    Geographic,
    Lambert93,
    WebMercator,
    Utm { zone: u32, south: bool },
}

impl Projection {
    fn from_epsg(epsg: u32) -> Option<Self> {
        if let Some((zone, south)) = geostore::srs::utm_zone(epsg) {
            return Some(Self::Utm { zone, south });
        }
        match epsg {
            4326 | 4171 => Some(Self::Geographic),
            2154 => Some(Self::Lambert93),
            3857 => Some(Self::WebMercator),
            _ => None,
        }
    }

    /// Coordonnées projetées → géographique
    fn unproject(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Geographic => Geographic::from_degrees(x, y),
            Self::Lambert93 => lambert::to_geographic(x, y),
            Self::WebMercator => mercator::from_web_mercator(x, y),
            Self::Utm { zone, south } => utm::to_geographic(x, y, zone, south),
        }
    }

    /// Géographique → coordonnées projetées
    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Geographic => geo.to_degrees(),
            Self::Lambert93 => lambert::from_geographic(geo),
            Self::WebMercator => mercator::to_web_mercator(geo),
            Self::Utm { zone, south } => utm::from_geographic(geo, zone, south),
        }
    }
}

/// Reprojection légère entre deux codes EPSG supportés
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source_epsg: u32,
    target_epsg: u32,
    source: Projection,
    target: Projection,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let Some(source) = Projection::from_epsg(source_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 4171, 2154, 3857, 326xx, 327xx",
                source_epsg
            );
        };
        let Some(target) = Projection::from_epsg(target_epsg) else {
            bail!(
                "EPSG:{} not supported. Supported: 4326, 4171, 2154, 3857, 326xx, 327xx",
                target_epsg
            );
        };

        Ok(Self {
            source_epsg,
            target_epsg,
            source,
            target,
        })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Projection::from_epsg(source).is_some() && Projection::from_epsg(target).is_some()
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let geo = self.source.unproject(x, y);
        let (tx, ty) = self.target.project(geo);

        if !tx.is_finite() || !ty.is_finite() {
            bail!(
                "Point ({}, {}) cannot be transformed from EPSG:{} to EPSG:{}",
                x,
                y,
                self.source_epsg,
                self.target_epsg
            );
        }
        Ok((tx, ty))
    }

    /// Transforme une géométrie (tous types)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        geom.try_map_coords(|c: Coord| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok(Coord { x, y })
        })
    }
}
