//! Projection Web Mercator (EPSG:3857)
//!
//! Modèle sphérique sur le rayon équatorial WGS84.

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude limite de la projection (évite l'infini aux pôles)
const MAX_LAT_DEG: f64 = 85.06;

/// Géographique → Web Mercator
pub fn to_web_mercator(geo: Geographic) -> (f64, f64) {
    let r = WGS84::A;
    let lat = geo
        .lat
        .clamp(-MAX_LAT_DEG.to_radians(), MAX_LAT_DEG.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator → géographique
pub fn from_web_mercator(x: f64, y: f64) -> Geographic {
    let r = WGS84::A;
    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;
    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paris_to_web_mercator() {
        let (x, y) = to_web_mercator(Geographic::from_degrees(2.35, 48.85));
        assert!((x - 261600.0).abs() < 1000.0, "x={}", x);
        assert!((y - 6250000.0).abs() < 10000.0, "y={}", y);
    }

    #[test]
    fn test_inverse() {
        let (x, y) = to_web_mercator(Geographic::from_degrees(-61.07, 14.6));
        let (lon, lat) = from_web_mercator(x, y).to_degrees();
        assert!((lon + 61.07).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 14.6).abs() < 1e-9, "lat={}", lat);
    }
}
