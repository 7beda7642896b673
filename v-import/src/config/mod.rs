//! Configuration : environnement SIG et requête d'import

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use geostore::{sanitize_name, GisDatabase, Location};
use serde::Serialize;

/// Emprise de l'import
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Extents {
    /// Emprise complète de la source
    Input,
    /// Limitée à la région active de la location cible
    Region,
}

/// Environnement SIG : base et location cible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GisEnv {
    pub gisdbase: PathBuf,
    pub location: Option<String>,
}

impl GisEnv {
    /// Lit `GISDBASE` et `LOCATION_NAME`
    pub fn from_env() -> Self {
        Self {
            gisdbase: std::env::var("GISDBASE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("grassdata")),
            location: std::env::var("LOCATION_NAME").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Les options de ligne de commande priment sur l'environnement
    pub fn apply_overrides(&mut self, gisdbase: Option<PathBuf>, location: Option<String>) {
        if let Some(gisdbase) = gisdbase {
            self.gisdbase = gisdbase;
        }
        if let Some(location) = location {
            self.location = Some(location);
        }
    }

    pub fn open_database(&self) -> Result<GisDatabase> {
        GisDatabase::open(&self.gisdbase)
            .with_context(|| format!("Failed to open GIS database {}", self.gisdbase.display()))
    }

    /// Ouvre la location cible
    pub fn open_location(&self, db: &GisDatabase) -> Result<Location> {
        let Some(name) = &self.location else {
            bail!("No target location: set LOCATION_NAME or use --location");
        };
        db.open_location(name)
            .with_context(|| format!("Failed to open location <{}>", name))
    }
}

/// Requête d'import, entièrement déterminée avant l'exécution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub datasource: String,
    /// Couches (vide = toutes)
    pub layers: Vec<String>,
    pub output: String,
    pub extents: Extents,
    pub overwrite: bool,
    /// Import direct même si les CRS diffèrent
    pub override_crs_check: bool,
}

impl ImportRequest {
    pub fn new(datasource: impl Into<String>, extents: Extents) -> Self {
        let datasource = datasource.into();
        let output = default_output_name(&datasource);
        Self {
            datasource,
            layers: Vec::new(),
            output,
            extents,
            overwrite: false,
            override_crs_check: false,
        }
    }

    pub fn region_limited(&self) -> bool {
        self.extents == Extents::Region
    }
}

/// Nom de dataset dérivé de la source : radical du fichier, nettoyé
pub fn default_output_name(datasource: &str) -> String {
    let path = Path::new(datasource.trim_end_matches('/'));
    let file = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(datasource);
    // roads.tar.bz2 → roads
    let stem = file.split('.').next().unwrap_or(file);
    sanitize_name(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_name() {
        assert_eq!(default_output_name("/data/roads.geojson"), "roads");
        assert_eq!(default_output_name("archives/bdtopo.tar.bz2"), "bdtopo");
        assert_eq!(default_output_name("data/layers/"), "layers");
    }

    #[test]
    fn test_request_defaults() {
        let request = ImportRequest::new("/data/roads.geojson", Extents::Region);
        assert_eq!(request.output, "roads");
        assert!(request.layers.is_empty());
        assert!(request.region_limited());
        assert!(!request.overwrite);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut env = GisEnv {
            gisdbase: PathBuf::from("/from/env"),
            location: Some("env_location".into()),
        };
        env.apply_overrides(None, Some("cli_location".into()));
        assert_eq!(env.gisdbase, PathBuf::from("/from/env"));
        assert_eq!(env.location.as_deref(), Some("cli_location"));

        env.apply_overrides(Some(PathBuf::from("/from/cli")), None);
        assert_eq!(env.gisdbase, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_missing_location_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let env = GisEnv {
            gisdbase: tmp.path().to_path_buf(),
            location: None,
        };
        let db = env.open_database().unwrap();
        let err = env.open_location(&db).unwrap_err();
        assert!(err.to_string().contains("LOCATION_NAME"));
    }
}
