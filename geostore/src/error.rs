//! Types d'erreurs pour le crate geostore

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'accès à la base GIS ou à une source
#[derive(Debug, Error)]
pub enum StoreError {
    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur de (dé)sérialisation JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Nom de location ou de dataset illégal
    #[error("Illegal name <{0}>")]
    InvalidName(String),

    /// La location existe déjà
    #[error("Location <{0}> already exists")]
    LocationExists(String),

    /// Location introuvable
    #[error("Location <{0}> not found")]
    LocationNotFound(String),

    /// Collision de nom de dataset
    #[error("Dataset <{dataset}> already exists in location <{location}>")]
    DatasetExists { location: String, dataset: String },

    /// Dataset introuvable
    #[error("Dataset <{dataset}> not found in location <{location}>")]
    DatasetNotFound { location: String, dataset: String },

    /// Région invalide (emprise dégénérée, résolution nulle...)
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Système de coordonnées non reconnu
    #[error("Unknown coordinate reference system: {0}")]
    UnknownCrs(String),

    /// Les couches sélectionnées n'ont pas le même CRS
    #[error("Layers <{first}> and <{other}> use different coordinate reference systems")]
    MixedCrs { first: String, other: String },

    /// Couche demandée absente de la source
    #[error("Layer <{layer}> not found in datasource <{datasource}>")]
    MissingLayer { datasource: String, layer: String },

    /// Source sans aucune couche lisible
    #[error("No layer found in datasource <{0}>")]
    EmptyDatasource(String),

    /// Format de source invalide
    #[error("Invalid datasource <{datasource}>: {reason}")]
    InvalidDatasource { datasource: String, reason: String },

    /// Géométrie invalide ou non convertible
    #[error("Invalid geometry in layer <{layer}>: {reason}")]
    InvalidGeometry { layer: String, reason: String },
}

impl StoreError {
    /// Crée une erreur de source invalide avec contexte
    pub fn invalid_datasource(datasource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDatasource {
            datasource: datasource.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    /// Vrai si l'erreur signale une collision de nom
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::DatasetExists { .. } | Self::LocationExists(_))
    }
}
