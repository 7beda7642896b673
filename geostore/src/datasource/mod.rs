//! Lecture des sources de données externes (GeoJSON)
//!
//! Un localisateur peut désigner :
//! - un fichier GeoJSON (une couche, nommée d'après le fichier)
//! - un répertoire (chaque `*.geojson` / `*.json` est une couche)
//! - une archive `.tar.bz2` de fichiers GeoJSON

pub mod archive;
pub mod layer;

use std::path::Path;

use geojson::FeatureCollection;
use rayon::prelude::*;
use tracing::debug;

use crate::dataset::Layer;
use crate::types::CrsInfo;
use crate::StoreError;

/// Couche lue depuis la source, avec son CRS découvert
#[derive(Debug, Clone)]
pub struct SourceLayer {
    pub name: String,
    pub crs: CrsInfo,
    pub collection: FeatureCollection,
}

/// Source de données ouverte
#[derive(Debug)]
pub struct Datasource {
    locator: String,
    layers: Vec<SourceLayer>,
}

/// Sous-ensemble de couches partageant un CRS
#[derive(Debug)]
pub struct Selection<'a> {
    pub crs: CrsInfo,
    pub layers: Vec<&'a SourceLayer>,
}

impl Datasource {
    /// Ouvre une source et lit toutes ses couches
    pub fn open(locator: &str) -> Result<Self, StoreError> {
        let path = Path::new(locator);
        if !path.exists() {
            return Err(StoreError::invalid_datasource(locator, "no such file or directory"));
        }

        let mut layers = Vec::new();

        if path.is_dir() {
            let mut files: Vec<_> = std::fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .filter_map(|p| archive::layer_name(&p).map(|name| (name, p)))
                .collect();
            files.sort_by(|a, b| a.0.cmp(&b.0));

            // Ordre conservé par collect
            layers = files
                .par_iter()
                .map(|(name, file)| {
                    let data = std::fs::read(file)?;
                    layer::parse_layer(locator, name, &data)
                })
                .collect::<Result<Vec<_>, _>>()?;
        } else if archive::is_archive(path) {
            layers = archive::extract(path)?
                .par_iter()
                .map(|(name, data)| layer::parse_layer(locator, name, data))
                .collect::<Result<Vec<_>, _>>()?;
        } else {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("layer")
                .to_string();
            let data = std::fs::read(path)?;
            layers.push(layer::parse_layer(locator, &name, &data)?);
        }

        if layers.is_empty() {
            return Err(StoreError::EmptyDatasource(locator.to_string()));
        }

        debug!(datasource = locator, layers = layers.len(), "Datasource opened");

        Ok(Self {
            locator: locator.to_string(),
            layers,
        })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Toutes les couches de la source
    pub fn layers(&self) -> &[SourceLayer] {
        &self.layers
    }

    /// Sélectionne des couches par nom (vide = toutes).
    ///
    /// Toutes les couches retenues doivent partager le même CRS.
    pub fn select(&self, names: &[String]) -> Result<Selection<'_>, StoreError> {
        let selected: Vec<&SourceLayer> = if names.is_empty() {
            self.layers.iter().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    self.layers
                        .iter()
                        .find(|l| &l.name == name)
                        .ok_or_else(|| StoreError::MissingLayer {
                            datasource: self.locator.clone(),
                            layer: name.clone(),
                        })
                })
                .collect::<Result<_, _>>()?
        };

        let first = selected
            .first()
            .ok_or_else(|| StoreError::EmptyDatasource(self.locator.clone()))?;

        if let Some(other) = selected
            .iter()
            .find(|l| l.crs.canonical() != first.crs.canonical())
        {
            return Err(StoreError::MixedCrs {
                first: first.name.clone(),
                other: other.name.clone(),
            });
        }

        Ok(Selection {
            crs: first.crs.clone(),
            layers: selected,
        })
    }
}

impl Selection<'_> {
    /// Couches prêtes à être stockées dans un dataset
    pub fn to_layers(&self) -> Vec<Layer> {
        self.layers
            .iter()
            .map(|l| Layer {
                name: l.name.clone(),
                collection: l.collection.clone(),
            })
            .collect()
    }
}
