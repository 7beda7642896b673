//! Projection UTM (Universal Transverse Mercator), ellipsoïde WGS84
//!
//! Toutes les zones 1..=60, hémisphères nord (EPSG:326zz) et sud (EPSG:327zz).

use super::ellipsoid::WGS84;
use super::Geographic;

/// Facteur d'échelle
const K0: f64 = 0.9996;
/// False easting
const X0: f64 = 500000.0;
/// False northing de l'hémisphère sud
const Y0_SOUTH: f64 = 10000000.0;

/// Longitude centrale de la zone (radians)
fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Longueur d'arc du méridien depuis l'équateur
fn meridian_arc(lat: f64) -> f64 {
    let e2 = WGS84::E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    WGS84::A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// UTM → géographique
pub fn to_geographic(x: f64, y: f64, zone: u32, south: bool) -> Geographic {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    let x = x - X0;
    let y = if south { y - Y0_SOUTH } else { y };

    // Latitude du pied de la perpendiculaire (footprint latitude)
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

/// Géographique → UTM
pub fn from_geographic(geo: Geographic, zone: u32, south: bool) -> (f64, f64) {
    let a = WGS84::A;
    let e2 = WGS84::E2;
    let ep2 = WGS84::EP2;

    let lat = geo.lat;
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let aa = (geo.lon - central_meridian(zone)) * cos_lat;
    let m = meridian_arc(lat);

    let x = K0
        * n
        * (aa
            + (1.0 - t + c) * aa.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * aa.powi(5) / 120.0)
        + X0;

    let y = K0
        * (m + n
            * tan_lat
            * (aa.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * aa.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * aa.powi(6) / 720.0));

    let y = if south { y + Y0_SOUTH } else { y };
    (x, y)
}
