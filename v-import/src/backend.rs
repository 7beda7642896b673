//! Interface des collaborateurs du workflow (import, reprojection, région)
//!
//! Le contexte de location est toujours passé explicitement : aucune
//! opération ne dépend d'une location « courante ».

use anyhow::{bail, Context, Result};
use geo::{Geometry, Rect};
use geojson::Feature;
use geostore::{Dataset, Datasource, GisDatabase, Layer, Location, Region, RegionGeometry};
use serde::Serialize;
use tracing::{debug, info};

use crate::crs::CrsDescriptor;
use crate::reproject_lite::SmartReprojector;

/// Nom de la couche portant la géométrie de région
const REGION_LAYER: &str = "region";

/// Paramètres d'un import de source
#[derive(Debug, Clone)]
pub struct ImportSpec<'a> {
    pub datasource: &'a str,
    /// Couches à importer (vide = toutes)
    pub layers: &'a [String],
    pub output: &'a str,
    /// Découpe à la région active de la location de destination
    pub region_limited: bool,
    pub overwrite: bool,
    /// Importe même si le CRS de la source diffère de celui de la location
    pub skip_crs_check: bool,
}

/// Mise à jour de la région active
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionUpdate {
    /// Change la résolution en gardant les limites
    Resolution(f64),
    /// Cale les limites sur un rectangle
    FitTo(Rect<f64>),
}

/// Résumé d'un dataset écrit
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub location: String,
    pub layers: usize,
    pub features: usize,
    /// [xmin, ymin, xmax, ymax]
    pub bounds: Option<[f64; 4]>,
    pub checksum: String,
}

impl DatasetSummary {
    fn of(dataset: &Dataset, location: &Location) -> Result<Self> {
        let bounds = dataset
            .bounds()?
            .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]);
        Ok(Self {
            name: dataset.name.clone(),
            location: location.name().to_string(),
            layers: dataset.layers.len(),
            features: dataset.feature_count(),
            bounds,
            checksum: dataset.checksum()?,
        })
    }
}

/// Opérations fournies au workflow par le système SIG
pub trait GisBackend {
    /// Crée une location dont le CRS est celui de la source (sans import)
    fn create_location_from_source(
        &self,
        datasource: &str,
        layers: &[String],
        name: &str,
    ) -> Result<Location>;

    fn location_exists(&self, name: &str) -> bool;

    fn describe_crs(&self, location: &Location) -> Result<CrsDescriptor>;

    fn import_dataset(&self, spec: &ImportSpec<'_>, location: &Location) -> Result<DatasetSummary>;

    /// Reprojette un dataset d'une location vers une autre, sous le même nom
    fn reproject_dataset(
        &self,
        name: &str,
        from: &Location,
        to: &Location,
        overwrite: bool,
    ) -> Result<DatasetSummary>;

    /// Enregistre une géométrie de région comme dataset de la location
    fn store_geometry(&self, geometry: &RegionGeometry, location: &Location) -> Result<()>;

    /// Reprojette une géométrie de région et la stocke dans `to`
    fn reproject_geometry(
        &self,
        geometry: &RegionGeometry,
        from: &Location,
        to: &Location,
    ) -> Result<RegionGeometry>;

    fn active_region(&self, location: &Location) -> Result<Region>;

    fn set_active_region(&self, location: &Location, update: RegionUpdate) -> Result<Region>;

    fn dataset_exists(&self, location: &Location, name: &str) -> bool;

    fn remove_location(&self, location: &Location) -> Result<()>;

    fn remove_dataset(&self, location: &Location, name: &str) -> Result<()>;
}

/// Implémentation sur une base SIG `geostore`
#[derive(Debug, Clone)]
pub struct LocalBackend {
    db: GisDatabase,
}

impl LocalBackend {
    pub fn new(db: GisDatabase) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &GisDatabase {
        &self.db
    }

    fn reprojector(&self, from: &Location, to: &Location) -> Result<SmartReprojector> {
        let source = from.crs()?;
        let target = to.crs()?;
        SmartReprojector::between(&source, &target)
    }
}

impl GisBackend for LocalBackend {
    fn create_location_from_source(
        &self,
        datasource: &str,
        layers: &[String],
        name: &str,
    ) -> Result<Location> {
        let source = Datasource::open(datasource)?;
        let selection = source.select(layers)?;

        let location = self
            .db
            .create_location(name, &selection.crs, &Region::default())
            .with_context(|| format!("Failed to create location <{}>", name))?;

        info!(location = name, crs = %selection.crs.name, "Location created from datasource");
        Ok(location)
    }

    fn location_exists(&self, name: &str) -> bool {
        self.db.location_exists(name)
    }

    fn describe_crs(&self, location: &Location) -> Result<CrsDescriptor> {
        let crs = location
            .crs()
            .with_context(|| format!("Failed to read CRS of location <{}>", location.name()))?;
        Ok(CrsDescriptor::from_crs(&crs))
    }

    fn import_dataset(&self, spec: &ImportSpec<'_>, location: &Location) -> Result<DatasetSummary> {
        if !spec.overwrite && location.dataset_exists(spec.output) {
            bail!(
                "Dataset <{}> already exists in location <{}> (use --overwrite)",
                spec.output,
                location.name()
            );
        }

        let source = Datasource::open(spec.datasource)?;
        let selection = source.select(spec.layers)?;
        let crs = location.crs()?;

        if !spec.skip_crs_check && selection.crs.canonical() != crs.canonical() {
            bail!(
                "Projection of dataset does not appear to match current location ({} vs {})",
                selection.crs.name,
                crs.name
            );
        }

        let mut layers = selection.to_layers();
        if spec.region_limited {
            let window = location.region()?.to_rect();
            layers = layers
                .iter()
                .map(|l| l.clip_to(window))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(
                west = window.min().x,
                south = window.min().y,
                east = window.max().x,
                north = window.max().y,
                "Import clipped to active region"
            );
        }

        let dataset = Dataset::new(spec.output, crs, layers);
        location.write_dataset(&dataset, spec.overwrite)?;

        let summary = DatasetSummary::of(&dataset, location)?;
        info!(
            dataset = spec.output,
            location = location.name(),
            features = summary.features,
            "Dataset imported"
        );
        Ok(summary)
    }

    fn reproject_dataset(
        &self,
        name: &str,
        from: &Location,
        to: &Location,
        overwrite: bool,
    ) -> Result<DatasetSummary> {
        if !overwrite && to.dataset_exists(name) {
            bail!(
                "Dataset <{}> already exists in location <{}> (use --overwrite)",
                name,
                to.name()
            );
        }

        let reprojector = self.reprojector(from, to)?;
        let source = from.read_dataset(name)?;

        let layers = source
            .layers
            .iter()
            .map(|layer| {
                layer
                    .try_map_geometries(|g| reprojector.transform_geometry(&g))
                    .with_context(|| format!("Failed to reproject layer <{}>", layer.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let dataset = Dataset::new(name, to.crs()?, layers);
        to.write_dataset(&dataset, overwrite)?;

        debug!(
            dataset = name,
            from = from.name(),
            to = to.name(),
            via = reprojector.description(),
            "Dataset reprojected"
        );
        DatasetSummary::of(&dataset, to)
    }

    fn store_geometry(&self, geometry: &RegionGeometry, location: &Location) -> Result<()> {
        let value = geojson::Value::from(&Geometry::Polygon(geometry.polygon.clone()));
        let feature = Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(value)),
            id: None,
            properties: None,
            foreign_members: None,
        };
        let dataset = Dataset::new(
            geometry.name.clone(),
            location.crs()?,
            vec![Layer::new(REGION_LAYER, vec![feature])],
        );
        location.write_dataset(&dataset, false)?;
        Ok(())
    }

    fn reproject_geometry(
        &self,
        geometry: &RegionGeometry,
        from: &Location,
        to: &Location,
    ) -> Result<RegionGeometry> {
        let reprojector = self.reprojector(from, to)?;
        let polygon = match reprojector.transform_geometry(&Geometry::Polygon(geometry.polygon.clone()))? {
            Geometry::Polygon(p) => p,
            other => bail!("Unexpected geometry after reprojection: {:?}", other),
        };

        let reprojected = RegionGeometry {
            name: geometry.name.clone(),
            polygon,
        };
        self.store_geometry(&reprojected, to)?;
        Ok(reprojected)
    }

    fn active_region(&self, location: &Location) -> Result<Region> {
        Ok(location.region()?)
    }

    fn set_active_region(&self, location: &Location, update: RegionUpdate) -> Result<Region> {
        let mut region = location.region()?;
        match update {
            RegionUpdate::Resolution(res) => region.set_resolution(res)?,
            RegionUpdate::FitTo(rect) => region.fit_to(rect)?,
        }
        location.set_region(&region)?;
        Ok(region)
    }

    fn dataset_exists(&self, location: &Location, name: &str) -> bool {
        location.dataset_exists(name)
    }

    fn remove_location(&self, location: &Location) -> Result<()> {
        self.db.remove_location(location.name())?;
        Ok(())
    }

    fn remove_dataset(&self, location: &Location, name: &str) -> Result<()> {
        location.remove_dataset(name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use geostore::srs::crs_from_epsg;
    use std::path::Path;

    fn write_source(dir: &Path, name: &str, crs_name: &str, points: &[(f64, f64)]) -> String {
        let features: Vec<String> = points
            .iter()
            .map(|(x, y)| {
                format!(
                    r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Point","coordinates":[{},{}]}}}}"#,
                    x, y
                )
            })
            .collect();
        let json = format!(
            r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"{}"}}}},"features":[{}]}}"#,
            crs_name,
            features.join(",")
        );
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path.to_string_lossy().to_string()
    }

    fn backend(dir: &Path) -> LocalBackend {
        LocalBackend::new(GisDatabase::create(dir.join("gisdb")).unwrap())
    }

    #[test]
    fn test_location_from_source_takes_source_crs() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(tmp.path(), "pts.geojson", "EPSG:2154", &[(650000.0, 6860000.0)]);
        let backend = backend(tmp.path());

        let location = backend
            .create_location_from_source(&source, &[], "from_source")
            .unwrap();

        assert_eq!(location.crs().unwrap(), crs_from_epsg(2154));
        // Aucune donnée importée
        assert!(location.list_datasets().unwrap().is_empty());
    }

    #[test]
    fn test_import_refuses_crs_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(tmp.path(), "pts.geojson", "EPSG:2154", &[(650000.0, 6860000.0)]);
        let backend = backend(tmp.path());
        let target = backend
            .database()
            .create_location("wgs", &crs_from_epsg(4326), &Region::default())
            .unwrap();

        let spec = ImportSpec {
            datasource: &source,
            layers: &[],
            output: "pts",
            region_limited: false,
            overwrite: false,
            skip_crs_check: false,
        };
        let err = backend.import_dataset(&spec, &target).unwrap_err();
        assert!(err.to_string().contains("does not appear to match"));
        assert!(!target.dataset_exists("pts"));

        let forced = ImportSpec {
            skip_crs_check: true,
            ..spec
        };
        assert_eq!(backend.import_dataset(&forced, &target).unwrap().features, 1);
    }

    #[test]
    fn test_import_collision_without_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(tmp.path(), "pts.geojson", "EPSG:2154", &[(650000.0, 6860000.0)]);
        let backend = backend(tmp.path());
        let target = backend
            .create_location_from_source(&source, &[], "lambert")
            .unwrap();

        let spec = ImportSpec {
            datasource: &source,
            layers: &[],
            output: "pts",
            region_limited: false,
            overwrite: false,
            skip_crs_check: false,
        };
        let first = backend.import_dataset(&spec, &target).unwrap();
        assert!(backend.import_dataset(&spec, &target).is_err());

        let again = backend
            .import_dataset(&ImportSpec { overwrite: true, ..spec }, &target)
            .unwrap();
        assert_eq!(first.checksum, again.checksum);
    }

    #[test]
    fn test_region_limited_import_drops_outside_points() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(
            tmp.path(),
            "pts.geojson",
            "EPSG:2154",
            &[(650000.0, 6860000.0), (900000.0, 6860000.0)],
        );
        let backend = backend(tmp.path());
        let target = backend
            .create_location_from_source(&source, &[], "lambert")
            .unwrap();
        backend
            .set_active_region(
                &target,
                RegionUpdate::FitTo(Rect::new(
                    coord! { x: 600000.0, y: 6800000.0 },
                    coord! { x: 700000.0, y: 6900000.0 },
                )),
            )
            .unwrap();

        let spec = ImportSpec {
            datasource: &source,
            layers: &[],
            output: "pts",
            region_limited: true,
            overwrite: false,
            skip_crs_check: false,
        };
        let summary = backend.import_dataset(&spec, &target).unwrap();
        assert_eq!(summary.features, 1);
    }

    #[test]
    fn test_reproject_dataset_into_other_location() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_source(tmp.path(), "pts.geojson", "EPSG:2154", &[(652381.0, 6862047.0)]);
        let backend = backend(tmp.path());
        let staging = backend
            .create_location_from_source(&source, &[], "staging")
            .unwrap();
        let target = backend
            .database()
            .create_location("wgs", &crs_from_epsg(4326), &Region::default())
            .unwrap();

        let spec = ImportSpec {
            datasource: &source,
            layers: &[],
            output: "pts",
            region_limited: false,
            overwrite: false,
            skip_crs_check: false,
        };
        backend.import_dataset(&spec, &staging).unwrap();
        let summary = backend.reproject_dataset("pts", &staging, &target, false).unwrap();

        let [xmin, ymin, _, _] = summary.bounds.unwrap();
        assert!((xmin - 2.35).abs() < 0.1, "xmin={}", xmin);
        assert!((ymin - 48.85).abs() < 0.1, "ymin={}", ymin);
        assert_eq!(target.read_dataset("pts").unwrap().crs, crs_from_epsg(4326));
    }

    #[test]
    fn test_set_active_region_steps() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = backend(tmp.path());
        let location = backend
            .database()
            .create_location("wgs", &crs_from_epsg(4326), &Region::default())
            .unwrap();

        let region = backend
            .set_active_region(&location, RegionUpdate::Resolution(1.0))
            .unwrap();
        assert_eq!(region.ns_res, 1.0);

        let rect = Rect::new(coord! { x: 2.2, y: 48.8 }, coord! { x: 2.5, y: 48.9 });
        let region = backend
            .set_active_region(&location, RegionUpdate::FitTo(rect))
            .unwrap();
        assert_eq!(region.to_rect(), rect);
        assert_eq!(backend.active_region(&location).unwrap(), region);
    }
}
