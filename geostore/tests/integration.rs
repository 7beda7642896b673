//! Tests d'intégration : source GeoJSON → dataset stocké dans une location

use geo::{coord, Rect};
use geostore::srs::crs_from_epsg;
use geostore::{Dataset, Datasource, GisDatabase, Region};

const ROADS: &str = r#"{"type":"FeatureCollection",
    "crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::2154"}},
    "features":[
        {"type":"Feature","properties":{"ref":"D1"},"geometry":{"type":"LineString","coordinates":[[650000,6860000],[652000,6860000]]}},
        {"type":"Feature","properties":{"ref":"D2"},"geometry":{"type":"LineString","coordinates":[[660000,6870000],[661000,6871000]]}}
    ]}"#;

#[test]
fn test_store_selection_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("roads.geojson");
    std::fs::write(&source_path, ROADS).unwrap();

    let db = GisDatabase::create(dir.path().join("gisdb")).unwrap();
    let location = db
        .create_location("lambert93", &crs_from_epsg(2154), &Region::default())
        .unwrap();

    let source = Datasource::open(source_path.to_str().unwrap()).unwrap();
    let selection = source.select(&[]).unwrap();
    assert_eq!(selection.crs.canonical(), location.crs().unwrap().canonical());

    let dataset = Dataset::new("roads", selection.crs.clone(), selection.to_layers());
    location.write_dataset(&dataset, false).unwrap();

    let reloaded = location.read_dataset("roads").unwrap();
    assert_eq!(reloaded.feature_count(), 2);
    assert_eq!(reloaded.checksum().unwrap(), dataset.checksum().unwrap());
}

#[test]
fn test_clip_to_active_region() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("roads.geojson");
    std::fs::write(&source_path, ROADS).unwrap();

    let db = GisDatabase::create(dir.path().join("gisdb")).unwrap();
    let region = Region::from_rect(Rect::new(
        coord! { x: 649000.0, y: 6859000.0 },
        coord! { x: 651000.0, y: 6861000.0 },
    ))
    .unwrap();
    let location = db
        .create_location("lambert93", &crs_from_epsg(2154), &region)
        .unwrap();

    let source = Datasource::open(source_path.to_str().unwrap()).unwrap();
    let window = location.region().unwrap().to_rect();
    let layers = source
        .select(&[])
        .unwrap()
        .to_layers()
        .iter()
        .map(|l| l.clip_to(window).unwrap())
        .collect::<Vec<_>>();
    let dataset = Dataset::new("roads_clip", crs_from_epsg(2154), layers);

    // Seule D1 traverse la région, coupée à x = 651000
    assert_eq!(dataset.feature_count(), 1);
    let bounds = dataset.bounds().unwrap().unwrap();
    assert!(bounds.max().x <= 651000.0 + 1e-6);
    assert!(bounds.min().x >= 650000.0 - 1e-6);
}
