//! Base GIS sur le système de fichiers : locations, régions et datasets
//!
//! Organisation sur disque :
//!
//! ```text
//! <gisdbase>/<location>/crs.json
//! <gisdbase>/<location>/region.json
//! <gisdbase>/<location>/vector/<dataset>.json
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::types::{CrsInfo, Region};
use crate::StoreError;

const CRS_FILE: &str = "crs.json";
const REGION_FILE: &str = "region.json";
const VECTOR_DIR: &str = "vector";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("valid regex"))
}

/// Vrai si le nom est utilisable comme location ou dataset
pub fn is_legal_name(name: &str) -> bool {
    name_pattern().is_match(name)
}

/// Valide un nom de location ou de dataset
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    if is_legal_name(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Transforme une chaîne quelconque (ex: nom de fichier) en nom légal
pub fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() || name.starts_with('.') || name.starts_with('-') {
        name.insert(0, '_');
    }
    name
}

/// Racine de la base GIS
#[derive(Debug, Clone)]
pub struct GisDatabase {
    root: PathBuf,
}

/// Une location : un CRS, une région active, des datasets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    name: String,
    path: PathBuf,
}

impl GisDatabase {
    /// Ouvre une base existante
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("GIS database {} is not a directory", root.display()),
            )));
        }
        Ok(Self { root })
    }

    /// Crée (si besoin) puis ouvre une base
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn location_exists(&self, name: &str) -> bool {
        self.root.join(name).join(CRS_FILE).is_file()
    }

    /// Crée une nouvelle location ; échoue si elle existe déjà
    pub fn create_location(
        &self,
        name: &str,
        crs: &CrsInfo,
        region: &Region,
    ) -> Result<Location, StoreError> {
        validate_name(name)?;
        let path = self.root.join(name);

        // create_dir (et non create_dir_all) : la création échoue si le nom est pris
        match std::fs::create_dir(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::LocationExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let location = Location {
            name: name.to_string(),
            path,
        };
        if let Err(e) = location.initialize(crs, region) {
            // Pas de location à moitié créée
            let _ = std::fs::remove_dir_all(&location.path);
            return Err(e);
        }

        debug!(location = name, crs = %crs.name, "Location created");
        Ok(location)
    }

    /// Ouvre une location existante
    pub fn open_location(&self, name: &str) -> Result<Location, StoreError> {
        validate_name(name)?;
        if !self.location_exists(name) {
            return Err(StoreError::LocationNotFound(name.to_string()));
        }
        Ok(Location {
            name: name.to_string(),
            path: self.root.join(name),
        })
    }

    /// Supprime une location et tout son contenu (idempotent)
    pub fn remove_location(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        match std::fs::remove_dir_all(self.root.join(name)) {
            Ok(()) => {
                debug!(location = name, "Location removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Noms des locations, triés
    pub fn list_locations(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = std::fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|n| self.location_exists(n))
            .collect();
        names.sort();
        Ok(names)
    }
}

impl Location {
    fn initialize(&self, crs: &CrsInfo, region: &Region) -> Result<(), StoreError> {
        std::fs::create_dir(self.path.join(VECTOR_DIR))?;
        write_json(&self.path.join(REGION_FILE), region)?;
        // Le CRS en dernier : sa présence marque une location complète
        write_json(&self.path.join(CRS_FILE), crs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn crs(&self) -> Result<CrsInfo, StoreError> {
        read_json(&self.path.join(CRS_FILE))
    }

    pub fn region(&self) -> Result<Region, StoreError> {
        read_json(&self.path.join(REGION_FILE))
    }

    pub fn set_region(&self, region: &Region) -> Result<(), StoreError> {
        write_json(&self.path.join(REGION_FILE), region)
    }

    fn dataset_path(&self, name: &str) -> PathBuf {
        self.path.join(VECTOR_DIR).join(format!("{}.json", name))
    }

    pub fn dataset_exists(&self, name: &str) -> bool {
        self.dataset_path(name).is_file()
    }

    /// Écrit un dataset.
    ///
    /// Sans `overwrite`, un dataset existant du même nom est une collision.
    /// L'écriture passe par un fichier temporaire renommé : un échec ne laisse
    /// jamais de dataset partiel.
    pub fn write_dataset(&self, dataset: &Dataset, overwrite: bool) -> Result<(), StoreError> {
        validate_name(&dataset.name)?;
        if !overwrite && self.dataset_exists(&dataset.name) {
            return Err(StoreError::DatasetExists {
                location: self.name.clone(),
                dataset: dataset.name.clone(),
            });
        }
        write_json(&self.dataset_path(&dataset.name), dataset)?;
        debug!(
            location = %self.name,
            dataset = %dataset.name,
            features = dataset.feature_count(),
            "Dataset written"
        );
        Ok(())
    }

    pub fn read_dataset(&self, name: &str) -> Result<Dataset, StoreError> {
        validate_name(name)?;
        let path = self.dataset_path(name);
        if !path.is_file() {
            return Err(StoreError::DatasetNotFound {
                location: self.name.clone(),
                dataset: name.to_string(),
            });
        }
        read_json(&path)
    }

    /// Supprime un dataset (idempotent)
    pub fn remove_dataset(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        match std::fs::remove_file(self.dataset_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Noms des datasets, triés
    pub fn list_datasets(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = std::fs::read_dir(self.path.join(VECTOR_DIR))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
