//! Lecture des sources archivées (.tar.bz2 contenant des couches GeoJSON)

use bzip2::read::BzDecoder;
use std::io::Read;
use std::path::Path;
use tar::Archive;

use crate::StoreError;

/// Vrai si le chemin ressemble à une archive .tar.bz2
pub fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.bz2") || name.ends_with(".tbz2")
}

/// Extrait en mémoire les membres GeoJSON d'une archive.
///
/// Retourne des couples (nom de couche, contenu), triés par nom de couche.
pub fn extract(path: &Path) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
    let file = std::fs::File::open(path)?;
    let decoder = BzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut members = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let member = entry.path()?.into_owned();
        let Some(layer) = layer_name(&member) else {
            // Ignorer les autres fichiers (README, métadonnées...)
            continue;
        };

        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        members.push((layer, content));
    }

    members.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(members)
}

/// Nom de couche d'un fichier GeoJSON (stem), None pour les autres extensions
pub fn layer_name(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if extension != "geojson" && extension != "json" {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
