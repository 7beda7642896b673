//! Systèmes de référence spatiale connus et parsing des noms de CRS GeoJSON

use std::sync::OnceLock;

use regex::Regex;

use crate::types::CrsInfo;
use crate::StoreError;

/// Mapping EPSG → (nom, définition proj4)
const KNOWN: &[(u32, &str, &str)] = &[
    (4326, "WGS 84", "+proj=longlat +datum=WGS84 +no_defs"),
    (
        4171,
        "RGF93",
        "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs",
    ),
    (
        2154,
        "RGF93 / Lambert-93",
        "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    (
        3857,
        "WGS 84 / Pseudo-Mercator",
        "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs",
    ),
];

/// Zone UTM WGS 84 d'un code EPSG (326zz nord, 327zz sud)
pub fn utm_zone(epsg: u32) -> Option<(u32, bool)> {
    match epsg {
        32601..=32660 => Some((epsg - 32600, false)),
        32701..=32760 => Some((epsg - 32700, true)),
        _ => None,
    }
}

/// Vrai si le code EPSG est dans le registre (ou est une zone UTM WGS 84)
pub fn is_known(epsg: u32) -> bool {
    utm_zone(epsg).is_some() || KNOWN.iter().any(|&(code, _, _)| code == epsg)
}

/// Construit la définition de CRS d'un code EPSG.
///
/// Les codes absents du registre restent utilisables comme descripteur
/// (`+init=epsg:<code>`), la transformation dépendant alors du moteur.
pub fn crs_from_epsg(epsg: u32) -> CrsInfo {
    if let Some((zone, south)) = utm_zone(epsg) {
        let hemisphere = if south { " +south" } else { "" };
        return CrsInfo {
            name: format!("WGS 84 / UTM zone {}{}", zone, if south { "S" } else { "N" }),
            epsg: Some(epsg),
            proj4: format!(
                "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
                zone, hemisphere
            ),
        };
    }

    for &(code, name, proj4) in KNOWN {
        if code == epsg {
            return CrsInfo {
                name: name.to_string(),
                epsg: Some(code),
                proj4: proj4.to_string(),
            };
        }
    }

    CrsInfo {
        name: format!("EPSG:{}", epsg),
        epsg: Some(epsg),
        proj4: format!("+init=epsg:{}", epsg),
    }
}

fn epsg_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:)?EPSG:(?:[0-9.]*:)?(\d+)$").expect("valid regex")
    })
}

/// Parse un nom de CRS (membre `crs` GeoJSON de type `name`)
///
/// Formes reconnues : `EPSG:2154`, `urn:ogc:def:crs:EPSG::2154`,
/// `urn:ogc:def:crs:EPSG:6.6:2154`, `urn:ogc:def:crs:OGC:1.3:CRS84`.
pub fn parse_crs_name(name: &str) -> Result<CrsInfo, StoreError> {
    let name = name.trim();

    if name.eq_ignore_ascii_case("urn:ogc:def:crs:OGC:1.3:CRS84")
        || name.eq_ignore_ascii_case("CRS84")
    {
        return Ok(crs_from_epsg(4326));
    }

    let epsg = epsg_pattern()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(|| StoreError::UnknownCrs(name.to_string()))?;

    Ok(crs_from_epsg(epsg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs_names() {
        assert_eq!(parse_crs_name("EPSG:2154").unwrap().epsg, Some(2154));
        assert_eq!(
            parse_crs_name("urn:ogc:def:crs:EPSG::2154").unwrap().epsg,
            Some(2154)
        );
        assert_eq!(
            parse_crs_name("urn:ogc:def:crs:EPSG:6.6:32631").unwrap().epsg,
            Some(32631)
        );
        assert_eq!(
            parse_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap().epsg,
            Some(4326)
        );
        assert!(matches!(
            parse_crs_name("LAMB93"),
            Err(StoreError::UnknownCrs(_))
        ));
    }

    #[test]
    fn test_utm_zones() {
        assert_eq!(utm_zone(32631), Some((31, false)));
        assert_eq!(utm_zone(32740), Some((40, true)));
        assert_eq!(utm_zone(2154), None);

        let crs = crs_from_epsg(32740);
        assert!(crs.proj4.contains("+zone=40 +south"));
    }

    #[test]
    fn test_unknown_code_still_comparable() {
        let a = crs_from_epsg(27572);
        let b = crs_from_epsg(27572);
        assert!(!is_known(27572));
        assert_eq!(a.canonical(), b.canonical());
        assert!(!a.is_unreferenced());
    }
}
