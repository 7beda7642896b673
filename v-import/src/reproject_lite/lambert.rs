//! Projection Lambert 93 (EPSG:2154)
//!
//! Lambert Conformal Conic avec 2 parallèles standards, ellipsoïde GRS80

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::ellipsoid::GRS80;
use super::Geographic;

/// Paramètres Lambert 93
const LON0_DEG: f64 = 3.0;
const LAT0_DEG: f64 = 46.5;
const LAT1_DEG: f64 = 44.0;
const LAT2_DEG: f64 = 49.0;
const X0: f64 = 700000.0;
const Y0: f64 = 6600000.0;

/// Constantes dérivées du cône
struct Cone {
    /// Exposant de la projection
    n: f64,
    /// Constante C
    c: f64,
    /// Rayon à l'origine
    r0: f64,
}

/// Calcule la latitude isométrique
fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Calcule la latitude depuis la latitude isométrique (itératif)
fn latitude_from_isometric(iso_lat: f64, e: f64) -> f64 {
    let mut lat = 2.0 * iso_lat.exp().atan() - FRAC_PI_2;

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let term = ((1.0 + e * sin_lat) / (1.0 - e * sin_lat)).powf(e / 2.0);
        let new_lat = 2.0 * (iso_lat.exp() * term).atan() - FRAC_PI_2;

        if (new_lat - lat).abs() < 1e-12 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Grande normale (rayon de courbure dans le plan vertical)
fn grande_normale(lat: f64) -> f64 {
    GRS80::A / (1.0 - GRS80::E2 * lat.sin().powi(2)).sqrt()
}

fn cone() -> Cone {
    let e = GRS80::E;
    let (lat0, lat1, lat2) = (
        LAT0_DEG.to_radians(),
        LAT1_DEG.to_radians(),
        LAT2_DEG.to_radians(),
    );

    let n1 = grande_normale(lat1);
    let n2 = grande_normale(lat2);
    let iso_lat1 = isometric_latitude(lat1, e);
    let iso_lat2 = isometric_latitude(lat2, e);

    let n = ((n1 * lat1.cos()).ln() - (n2 * lat2.cos()).ln()) / (iso_lat2 - iso_lat1);
    let c = (n1 * lat1.cos() / n) * (n * iso_lat1).exp();
    let r0 = c * (-n * isometric_latitude(lat0, e)).exp();

    Cone { n, c, r0 }
}

/// Lambert 93 → géographique
pub fn to_geographic(x: f64, y: f64) -> Geographic {
    let Cone { n, c, r0 } = cone();

    let dx = x - X0;
    let dy = y - Y0;

    let r = (dx.powi(2) + (r0 - dy).powi(2)).sqrt();
    let r = if n < 0.0 { -r } else { r };
    let gamma = (dx / (r0 - dy)).atan();

    let iso_lat = -(r / c).ln() / n;
    let lat = latitude_from_isometric(iso_lat, GRS80::E);
    let lon = LON0_DEG.to_radians() + gamma / n;

    Geographic::new(lon, lat)
}

/// Géographique → Lambert 93
pub fn from_geographic(geo: Geographic) -> (f64, f64) {
    let Cone { n, c, r0 } = cone();

    let r = c * (-n * isometric_latitude(geo.lat, GRS80::E)).exp();
    let gamma = n * (geo.lon - LON0_DEG.to_radians());

    let x = X0 + r * gamma.sin();
    let y = Y0 + r0 - r * gamma.cos();
    (x, y)
}
