//! Taxonomie des erreurs du workflow d'import

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::orchestrator::Stage;
use crate::report::ImportReport;

/// Côté dont le CRS est en cause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrsSide {
    /// La source de données (via la location temporaire)
    Input,
    /// La location cible
    Location,
}

impl fmt::Display for CrsSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Location => write!(f, "current location"),
        }
    }
}

/// Erreurs du workflow. Toutes sont fatales sauf `ResourceCleanup`,
/// qui n'est jamais propagée (journalisée seulement).
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Source illisible ou non supportée
    #[error("Unable to create location from datasource <{datasource}>: {reason}")]
    Datasource { datasource: String, reason: String },

    /// CRS non défini côté source ou cible
    #[error("Coordinate reference system not available for {side} <{name}>")]
    CrsUnavailable { side: CrsSide, name: String },

    /// Échec de l'outil d'import
    #[error("Unable to import datasource <{datasource}> into location <{location}>: {reason}")]
    Import {
        datasource: String,
        location: String,
        reason: String,
    },

    /// Échec de transformation (géométrie de région ou dataset)
    #[error("Unable to reproject <{name}> from <{from}> to <{to}>: {reason}")]
    Reprojection {
        name: String,
        from: String,
        to: String,
        reason: String,
    },

    /// Échec de suppression d'une ressource temporaire (non fatal)
    #[error("Unable to remove <{resource}>: {reason}")]
    ResourceCleanup { resource: String, reason: String },
}

impl WorkflowError {
    pub fn datasource(datasource: &str, err: anyhow::Error) -> Self {
        Self::Datasource {
            datasource: datasource.to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub fn import(datasource: &str, location: &str, err: anyhow::Error) -> Self {
        Self::Import {
            datasource: datasource.to_string(),
            location: location.to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub fn reprojection(name: &str, from: &str, to: &str, err: anyhow::Error) -> Self {
        Self::Reprojection {
            name: name.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason: format!("{:#}", err),
        }
    }

    pub fn cleanup(resource: &str, err: anyhow::Error) -> Self {
        Self::ResourceCleanup {
            resource: resource.to_string(),
            reason: format!("{:#}", err),
        }
    }

    /// Nom court de la catégorie, pour le rapport
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Datasource { .. } => "DatasourceError",
            Self::CrsUnavailable { .. } => "CRSUnavailableError",
            Self::Import { .. } => "ImportError",
            Self::Reprojection { .. } => "ReprojectionError",
            Self::ResourceCleanup { .. } => "ResourceCleanupError",
        }
    }
}

/// Workflow interrompu : dernière étape atteinte, cause et rapport partiel
#[derive(Debug, Error)]
#[error("import aborted after stage {stage}: {error}")]
pub struct Aborted {
    pub stage: Stage,
    #[source]
    pub error: WorkflowError,
    pub report: Box<ImportReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_resource() {
        let err = WorkflowError::CrsUnavailable {
            side: CrsSide::Location,
            name: "xy".into(),
        };
        assert_eq!(
            err.to_string(),
            "Coordinate reference system not available for current location <xy>"
        );
        assert_eq!(err.kind(), "CRSUnavailableError");

        let err = WorkflowError::import("roads.geojson", "lambert93", anyhow::anyhow!("collision"));
        assert!(err.to_string().contains("<roads.geojson>"));
        assert!(err.to_string().contains("<lambert93>"));
    }

    #[test]
    fn test_reason_keeps_context_chain() {
        let cause = anyhow::anyhow!("disk full").context("write failed");
        let err = WorkflowError::reprojection("roads", "tmp", "target", cause);
        assert!(err.to_string().contains("write failed: disk full"));
    }
}
