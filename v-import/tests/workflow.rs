//! Tests d'intégration du workflow d'import sur une base SIG temporaire

use std::path::Path;

use geo::{coord, Rect};
use geostore::srs::crs_from_epsg;
use geostore::{CrsInfo, GisDatabase, Location, Region};
use v_import::error::CrsSide;
use v_import::report::ImportPath;
use v_import::{Extents, ImportRequest, LocalBackend, Orchestrator, Stage, WorkflowError};

/// Paris et Marseille en Lambert 93
const PARIS_L93: (f64, f64) = (652381.0, 6862047.0);
const MARSEILLE_L93: (f64, f64) = (892000.0, 6247000.0);

fn write_points(dir: &Path, name: &str, crs: Option<&str>, points: &[(f64, f64)]) -> String {
    let features: Vec<String> = points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| {
            format!(
                r#"{{"type":"Feature","properties":{{"id":{}}},"geometry":{{"type":"Point","coordinates":[{},{}]}}}}"#,
                i, x, y
            )
        })
        .collect();
    let crs = match crs {
        Some(name) => format!(r#""crs":{{"type":"name","properties":{{"name":"{}"}}}},"#, name),
        None => r#""crs":null,"#.to_string(),
    };
    let json = format!(
        r#"{{"type":"FeatureCollection",{}"features":[{}]}}"#,
        crs,
        features.join(",")
    );
    let path = dir.join(name);
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().to_string()
}

fn setup(dir: &Path, target_crs: &CrsInfo, region: Region) -> (LocalBackend, Location) {
    let db = GisDatabase::create(dir.join("gisdb")).unwrap();
    let target = db.create_location("target", target_crs, &region).unwrap();
    (LocalBackend::new(db), target)
}

fn leftover_workspaces(dir: &Path) -> usize {
    let pattern = format!("{}/gisdb/temp_import_location_*", dir.display());
    glob::glob(&pattern).unwrap().count()
}

#[test]
fn test_same_crs_imports_directly() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(tmp.path(), "pts.geojson", Some("EPSG:2154"), &[PARIS_L93]);
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(2154), Region::default());

    let request = ImportRequest::new(&source, Extents::Input);
    let report = Orchestrator::new(&backend, target.clone()).run(&request).unwrap();

    assert_eq!(report.path, Some(ImportPath::Fast));
    assert!(!report.stages.contains(&Stage::Reprojected));
    assert_eq!(report.features, 1);
    assert!(target.dataset_exists("pts"));
    assert_eq!(leftover_workspaces(tmp.path()), 0);
}

#[test]
fn test_different_crs_reprojects_into_target() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(
        tmp.path(),
        "pts.geojson",
        Some("urn:ogc:def:crs:EPSG::2154"),
        &[PARIS_L93, MARSEILLE_L93],
    );
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::default());

    let request = ImportRequest::new(&source, Extents::Input);
    let report = Orchestrator::new(&backend, target.clone()).run(&request).unwrap();

    assert_eq!(report.path, Some(ImportPath::Staged));
    assert_eq!(report.stages.last(), Some(&Stage::Done));
    assert_eq!(report.features, 2);

    let dataset = target.read_dataset("pts").unwrap();
    assert_eq!(dataset.crs, crs_from_epsg(4326));
    let bounds = dataset.bounds().unwrap().unwrap();
    assert!((bounds.min().x - 2.35).abs() < 0.1, "xmin={}", bounds.min().x);
    assert!((bounds.max().y - 48.85).abs() < 0.1, "ymax={}", bounds.max().y);

    assert_eq!(leftover_workspaces(tmp.path()), 0);
}

#[test]
fn test_region_limited_import_stays_in_region() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(
        tmp.path(),
        "pts.geojson",
        Some("EPSG:2154"),
        &[PARIS_L93, MARSEILLE_L93],
    );
    let window = Rect::new(coord! { x: 2.0, y: 48.5 }, coord! { x: 3.0, y: 49.2 });
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::from_rect(window).unwrap());

    let request = ImportRequest::new(&source, Extents::Region);
    let report = Orchestrator::new(&backend, target.clone()).run(&request).unwrap();

    assert!(report.stages.contains(&Stage::ExtentApplied));
    assert_eq!(report.features, 1);

    let bounds = target.read_dataset("pts").unwrap().bounds().unwrap().unwrap();
    let eps = 1e-6;
    assert!(bounds.min().x >= window.min().x - eps && bounds.max().x <= window.max().x + eps);
    assert!(bounds.min().y >= window.min().y - eps && bounds.max().y <= window.max().y + eps);

    // L'artefact de région a été supprimé de la cible, la région est inchangée
    assert_eq!(target.list_datasets().unwrap(), vec!["pts"]);
    assert_eq!(target.region().unwrap().to_rect(), window);
    assert_eq!(leftover_workspaces(tmp.path()), 0);
}

#[test]
fn test_unreferenced_target_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(tmp.path(), "pts.geojson", Some("EPSG:2154"), &[PARIS_L93]);
    let (backend, target) = setup(tmp.path(), &CrsInfo::unreferenced(), Region::default());

    let request = ImportRequest::new(&source, Extents::Input);
    let aborted = Orchestrator::new(&backend, target.clone())
        .run(&request)
        .unwrap_err();

    assert!(matches!(
        aborted.error,
        WorkflowError::CrsUnavailable { side: CrsSide::Location, .. }
    ));
    assert!(aborted.to_string().contains("<target>"));
    assert!(target.list_datasets().unwrap().is_empty());
    assert_eq!(leftover_workspaces(tmp.path()), 0);
}

#[test]
fn test_unreferenced_source_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(tmp.path(), "pts.geojson", None, &[(10.0, 20.0)]);
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(2154), Region::default());

    let request = ImportRequest::new(&source, Extents::Input);
    let aborted = Orchestrator::new(&backend, target.clone())
        .run(&request)
        .unwrap_err();

    assert!(matches!(
        aborted.error,
        WorkflowError::CrsUnavailable { side: CrsSide::Input, .. }
    ));
    assert!(target.list_datasets().unwrap().is_empty());
}

#[test]
fn test_second_run_collides_unless_overwrite() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_points(tmp.path(), "pts.geojson", Some("EPSG:2154"), &[PARIS_L93]);
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::default());
    let orchestrator = Orchestrator::new(&backend, target.clone());

    let mut request = ImportRequest::new(&source, Extents::Input);
    let first = orchestrator.run(&request).unwrap();

    let aborted = orchestrator.run(&request).unwrap_err();
    assert!(matches!(aborted.error, WorkflowError::Import { .. }));
    assert!(aborted.to_string().contains("already exists"));

    request.overwrite = true;
    let again = orchestrator.run(&request).unwrap();
    assert_eq!(first.checksum, again.checksum);
    assert_eq!(leftover_workspaces(tmp.path()), 0);
}

#[test]
fn test_missing_datasource_creates_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::default());

    let request = ImportRequest::new("/no/such/roads.geojson", Extents::Input);
    let aborted = Orchestrator::new(&backend, target).run(&request).unwrap_err();

    assert_eq!(aborted.stage, Stage::Init);
    assert!(matches!(aborted.error, WorkflowError::Datasource { .. }));
    assert!(aborted.to_string().contains("roads.geojson"));
    assert_eq!(
        backend.database().list_locations().unwrap(),
        vec!["target".to_string()]
    );
}

#[test]
fn test_selected_layer_from_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let src = tmp.path().join("src");
    std::fs::create_dir(&src).unwrap();
    write_points(&src, "paris.geojson", Some("EPSG:2154"), &[PARIS_L93]);
    write_points(&src, "marseille.geojson", Some("EPSG:2154"), &[MARSEILLE_L93]);
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::default());

    let mut request = ImportRequest::new(src.to_string_lossy(), Extents::Input);
    request.layers = vec!["paris".to_string()];
    let report = Orchestrator::new(&backend, target.clone()).run(&request).unwrap();

    assert_eq!(report.output, "src");
    assert_eq!(report.features, 1);
    let dataset = target.read_dataset("src").unwrap();
    assert_eq!(dataset.layers.len(), 1);
    assert_eq!(dataset.layers[0].name, "paris");
}

#[test]
fn test_override_keeps_coordinates_but_refuses_unreferenced_source() {
    let tmp = tempfile::tempdir().unwrap();
    let (backend, target) = setup(tmp.path(), &crs_from_epsg(4326), Region::default());
    let orchestrator = Orchestrator::new(&backend, target.clone());

    let unreferenced = write_points(tmp.path(), "raw.geojson", None, &[(10.0, 20.0)]);
    let mut request = ImportRequest::new(&unreferenced, Extents::Input);
    request.override_crs_check = true;
    let aborted = orchestrator.run(&request).unwrap_err();
    assert!(matches!(
        aborted.error,
        WorkflowError::CrsUnavailable { side: CrsSide::Input, .. }
    ));
    assert!(!target.dataset_exists("raw"));

    // Source référencée : import direct, coordonnées inchangées, avertissement
    let source = write_points(tmp.path(), "pts.geojson", Some("EPSG:4171"), &[(2.35, 48.85)]);
    let mut request = ImportRequest::new(&source, Extents::Input);
    request.override_crs_check = true;
    let report = orchestrator.run(&request).unwrap();

    assert_eq!(report.path, Some(ImportPath::Fast));
    assert_eq!(report.warnings.len(), 1);
    let bounds = target.read_dataset("pts").unwrap().bounds().unwrap().unwrap();
    assert_eq!(bounds.min().x, 2.35);
    assert_eq!(leftover_workspaces(tmp.path()), 0);
}
