//! Types de données pour le crate geostore

use geo::{coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Nom du CRS sentinelle "non référencé" (plan XY sans géoréférencement)
pub const UNREFERENCED_NAME: &str = "xy_location_unprojected";

/// Région active d'une location : emprise rectangulaire + résolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    /// Résolution nord-sud
    pub ns_res: f64,
    /// Résolution est-ouest
    pub ew_res: f64,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
            ns_res: 1.0,
            ew_res: 1.0,
        }
    }
}

impl Region {
    /// Crée une région depuis une emprise, résolution 1
    pub fn from_rect(rect: Rect<f64>) -> Result<Self, StoreError> {
        let mut region = Self::default();
        region.fit_to(rect)?;
        Ok(region)
    }

    /// Nombre de lignes
    pub fn rows(&self) -> usize {
        ((self.north - self.south) / self.ns_res).round() as usize
    }

    /// Nombre de colonnes
    pub fn cols(&self) -> usize {
        ((self.east - self.west) / self.ew_res).round() as usize
    }

    /// Emprise de la région
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    /// Change la résolution en conservant l'emprise.
    ///
    /// La résolution est ensuite ajustée pour que l'emprise contienne un nombre
    /// entier de cellules.
    pub fn set_resolution(&mut self, res: f64) -> Result<(), StoreError> {
        if !res.is_finite() || res <= 0.0 {
            return Err(StoreError::InvalidRegion(format!(
                "resolution must be positive, got {}",
                res
            )));
        }
        self.ns_res = res;
        self.ew_res = res;
        self.adjust()
    }

    /// Cale l'emprise exactement sur `rect`, puis ajuste la résolution courante.
    pub fn fit_to(&mut self, rect: Rect<f64>) -> Result<(), StoreError> {
        let (min, max) = (rect.min(), rect.max());
        if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) {
            return Err(StoreError::InvalidRegion("non-finite extent".into()));
        }
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(StoreError::InvalidRegion(format!(
                "degenerate extent {}x{}",
                rect.width(),
                rect.height()
            )));
        }

        self.north = max.y;
        self.south = min.y;
        self.east = max.x;
        self.west = min.x;
        self.adjust()
    }

    /// Recalcule les résolutions pour un nombre entier (>= 1) de lignes/colonnes
    fn adjust(&mut self) -> Result<(), StoreError> {
        let height = self.north - self.south;
        let width = self.east - self.west;
        if height <= 0.0 || width <= 0.0 {
            return Err(StoreError::InvalidRegion(format!(
                "north <= south or east <= west ({}, {}, {}, {})",
                self.north, self.south, self.east, self.west
            )));
        }
        if self.ns_res <= 0.0 || self.ew_res <= 0.0 {
            return Err(StoreError::InvalidRegion("resolution must be positive".into()));
        }

        let rows = (height / self.ns_res).round().max(1.0);
        let cols = (width / self.ew_res).round().max(1.0);
        self.ns_res = height / rows;
        self.ew_res = width / cols;
        Ok(())
    }
}

/// Définition du CRS d'une location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsInfo {
    /// Nom lisible
    pub name: String,
    /// Code EPSG si connu
    pub epsg: Option<u32>,
    /// Définition proj4 (vide pour le CRS non référencé)
    pub proj4: String,
}

impl CrsInfo {
    /// CRS sentinelle : pas de correspondance plan → géodésique
    pub fn unreferenced() -> Self {
        Self {
            name: UNREFERENCED_NAME.to_string(),
            epsg: None,
            proj4: String::new(),
        }
    }

    pub fn is_unreferenced(&self) -> bool {
        self.name == UNREFERENCED_NAME || self.proj4.trim().is_empty()
    }

    /// Forme canonique sérialisée, comparée octet par octet
    pub fn canonical(&self) -> String {
        if self.is_unreferenced() {
            return "XY".to_string();
        }
        self.proj4.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Artefact polygonal transitoire (région active convertie en vecteur)
#[derive(Debug, Clone, PartialEq)]
pub struct RegionGeometry {
    /// Nom du dataset qui porte l'artefact
    pub name: String,
    pub polygon: Polygon<f64>,
}
