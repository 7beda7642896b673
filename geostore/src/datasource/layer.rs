//! Parsing d'une couche GeoJSON et découverte de son CRS

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::srs;
use crate::types::CrsInfo;
use crate::StoreError;

use super::SourceLayer;

/// Parse le contenu d'une couche GeoJSON
pub fn parse_layer(datasource: &str, name: &str, data: &[u8]) -> Result<SourceLayer, StoreError> {
    let text = simdutf8::basic::from_utf8(data).map_err(|_| {
        StoreError::invalid_datasource(datasource, format!("layer <{}> is not UTF-8", name))
    })?;
    let geojson: GeoJson = text.parse().map_err(|e: geojson::Error| {
        StoreError::invalid_datasource(datasource, format!("layer <{}>: {}", name, e))
    })?;

    let (features, foreign_members) = match geojson {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(mut feature) => {
            let members = feature.foreign_members.take();
            (vec![feature], members)
        }
        GeoJson::Geometry(geometry) => (
            vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            None,
        ),
    };

    let crs = discover_crs(foreign_members.as_ref())?;

    Ok(SourceLayer {
        name: name.to_string(),
        crs,
        collection: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
    })
}

/// Lit le membre `crs` (GeoJSON 2008).
///
/// - absent : EPSG:4326 (défaut RFC 7946)
/// - `null` : CRS non référencé
/// - `{"type": "name", "properties": {"name": ...}}` : nom parsé
pub fn discover_crs(members: Option<&JsonObject>) -> Result<CrsInfo, StoreError> {
    let Some(crs) = members.and_then(|m| m.get("crs")) else {
        return Ok(srs::crs_from_epsg(4326));
    };

    match crs {
        JsonValue::Null => Ok(CrsInfo::unreferenced()),
        JsonValue::Object(obj) => {
            let kind = obj.get("type").and_then(JsonValue::as_str).unwrap_or("");
            if !kind.eq_ignore_ascii_case("name") {
                return Err(StoreError::UnknownCrs(format!("unsupported crs type <{}>", kind)));
            }
            let name = obj
                .get("properties")
                .and_then(|p| p.get("name"))
                .and_then(JsonValue::as_str)
                .ok_or_else(|| StoreError::UnknownCrs("crs without name".into()))?;
            srs::parse_crs_name(name)
        }
        other => Err(StoreError::UnknownCrs(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_crs_is_wgs84() {
        let layer = parse_layer(
            "src",
            "pts",
            br#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();
        assert_eq!(layer.crs.epsg, Some(4326));
    }

    #[test]
    fn test_named_crs() {
        let layer = parse_layer(
            "src",
            "parcelles",
            br#"{"type":"FeatureCollection","crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::2154"}},"features":[]}"#,
        )
        .unwrap();
        assert_eq!(layer.crs.epsg, Some(2154));
    }

    #[test]
    fn test_null_crs_is_unreferenced() {
        let layer = parse_layer(
            "src",
            "scan",
            br#"{"type":"FeatureCollection","crs":null,"features":[]}"#,
        )
        .unwrap();
        assert!(layer.crs.is_unreferenced());
    }

    #[test]
    fn test_single_geometry_becomes_feature() {
        let layer = parse_layer("src", "pt", br#"{"type":"Point","coordinates":[1.0,2.0]}"#).unwrap();
        assert_eq!(layer.collection.features.len(), 1);
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_layer("src", "broken", b"{not json").unwrap_err();
        assert!(matches!(err, StoreError::InvalidDatasource { .. }));
    }
}
