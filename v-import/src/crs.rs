//! Comparaison des CRS : description canonique, classification, égalité
//!
//! L'égalité est une égalité stricte des formes canoniques sérialisées :
//! deux définitions géodésiquement équivalentes mais écrites différemment
//! sont considérées comme différentes.

use std::fmt;

use geostore::CrsInfo;
use serde::Serialize;

/// Descripteur canonique d'un CRS
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CrsDescriptor(String);

/// Classe d'un CRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrsClass {
    Projected,
    Geographic,
    /// Plan/pixel sans correspondance géodésique : aucune reprojection possible
    Unreferenced,
}

impl CrsDescriptor {
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    /// Descripteur de la définition stockée dans une location
    pub fn from_crs(crs: &CrsInfo) -> Self {
        Self(crs.canonical())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classe un descripteur
pub fn classify(descriptor: &CrsDescriptor) -> CrsClass {
    let text = descriptor.as_str().trim();
    if text.is_empty() || text == "XY" {
        return CrsClass::Unreferenced;
    }

    let mut has_definition = false;
    for token in text.split_whitespace() {
        if let Some(proj) = token.strip_prefix("+proj=") {
            has_definition = true;
            if matches!(proj, "longlat" | "latlong" | "lonlat" | "latlon") {
                return CrsClass::Geographic;
            }
        } else if let Some(code) = token.strip_prefix("+init=epsg:") {
            has_definition = true;
            // Les CRS géographiques EPSG sont dans la plage 4000-4999
            if code.parse::<u32>().map_or(false, |c| (4000..5000).contains(&c)) {
                return CrsClass::Geographic;
            }
        }
    }

    if has_definition {
        CrsClass::Projected
    } else {
        CrsClass::Unreferenced
    }
}

/// Égalité stricte des formes canoniques
pub fn equal(a: &CrsDescriptor, b: &CrsDescriptor) -> bool {
    a.as_str() == b.as_str()
}
