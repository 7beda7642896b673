//! Datasets vectoriels stockés dans une location

use geo::{
    BooleanOps, BoundingRect, Geometry, Intersects, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Polygon, Rect,
};
use geojson::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};

use crate::types::CrsInfo;
use crate::StoreError;

/// Un dataset vectoriel : une ou plusieurs couches dans le CRS de sa location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub crs: CrsInfo,
    pub layers: Vec<Layer>,
}

/// Une couche : collection de features GeoJSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub collection: FeatureCollection,
}

impl Dataset {
    pub fn new(name: impl Into<String>, crs: CrsInfo, layers: Vec<Layer>) -> Self {
        Self {
            name: name.into(),
            crs,
            layers,
        }
    }

    /// Nombre total de features
    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.collection.features.len()).sum()
    }

    /// Emprise de toutes les géométries (None si aucune géométrie)
    pub fn bounds(&self) -> Result<Option<Rect<f64>>, StoreError> {
        let mut acc: Option<Rect<f64>> = None;
        for layer in &self.layers {
            if let Some(rect) = layer.bounds()? {
                acc = Some(match acc {
                    Some(prev) => union(prev, rect),
                    None => rect,
                });
            }
        }
        Ok(acc)
    }

    /// Hash blake3 (hex) de la forme sérialisée
    pub fn checksum(&self) -> Result<String, StoreError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }
}

impl Layer {
    pub fn new(name: impl Into<String>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        }
    }

    /// Emprise de la couche
    pub fn bounds(&self) -> Result<Option<Rect<f64>>, StoreError> {
        let mut acc: Option<Rect<f64>> = None;
        for feature in &self.collection.features {
            let Some(geometry) = feature_geometry(&self.name, feature)? else {
                continue;
            };
            if let Some(rect) = geometry.bounding_rect() {
                acc = Some(match acc {
                    Some(prev) => union(prev, rect),
                    None => rect,
                });
            }
        }
        Ok(acc)
    }

    /// Découpe la couche sur une emprise rectangulaire.
    ///
    /// Les features sans géométrie ou entièrement hors emprise sont supprimées.
    pub fn clip_to(&self, rect: Rect<f64>) -> Result<Layer, StoreError> {
        let mut features = Vec::with_capacity(self.collection.features.len());

        for feature in &self.collection.features {
            let Some(geometry) = feature_geometry(&self.name, feature)? else {
                continue;
            };
            if let Some(clipped) = clip_geometry(&geometry, rect) {
                features.push(with_geometry(feature, &clipped));
            }
        }

        Ok(Layer::new(self.name.clone(), features))
    }

    /// Applique une transformation faillible à chaque géométrie (tout ou rien)
    pub fn try_map_geometries<E>(
        &self,
        mut f: impl FnMut(Geometry<f64>) -> Result<Geometry<f64>, E>,
    ) -> Result<Layer, E>
    where
        E: From<StoreError>,
    {
        let mut features = Vec::with_capacity(self.collection.features.len());
        for feature in &self.collection.features {
            match feature_geometry(&self.name, feature)? {
                Some(geometry) => {
                    let mapped = f(geometry)?;
                    features.push(with_geometry(feature, &mapped));
                }
                None => features.push(feature.clone()),
            }
        }
        Ok(Layer::new(self.name.clone(), features))
    }
}

/// Convertit la géométrie GeoJSON d'une feature en géométrie `geo`
pub fn feature_geometry(layer: &str, feature: &Feature) -> Result<Option<Geometry<f64>>, StoreError> {
    let Some(geometry) = &feature.geometry else {
        return Ok(None);
    };
    Geometry::<f64>::try_from(geometry.value.clone())
        .map(Some)
        .map_err(|e| StoreError::invalid_geometry(layer, e.to_string()))
}

fn with_geometry(feature: &Feature, geometry: &Geometry<f64>) -> Feature {
    let mut out = feature.clone();
    out.bbox = None;
    out.geometry = Some(geojson::Geometry::new(geojson::Value::from(geometry)));
    out
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

/// Découpe une géométrie ; None si le résultat est vide
fn clip_geometry(geometry: &Geometry<f64>, rect: Rect<f64>) -> Option<Geometry<f64>> {
    let window = rect.to_polygon();

    match geometry {
        Geometry::Point(p) => rect.intersects(p).then(|| Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => {
            let points: Vec<_> = mp.iter().filter(|p| rect.intersects(*p)).copied().collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint::new(points)))
        }
        Geometry::Line(line) => clip_lines(&window, MultiLineString::new(vec![LineString::from(*line)])),
        Geometry::LineString(ls) => clip_lines(&window, MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => clip_lines(&window, mls.clone()),
        Geometry::Polygon(poly) => clip_polygons(&window, MultiPolygon::new(vec![poly.clone()])),
        Geometry::MultiPolygon(mp) => clip_polygons(&window, mp.clone()),
        Geometry::Rect(r) => clip_polygons(&window, MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => clip_polygons(&window, MultiPolygon::new(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<_> = gc.iter().filter_map(|g| clip_geometry(g, rect)).collect();
            (!parts.is_empty()).then(|| Geometry::GeometryCollection(geo::GeometryCollection(parts)))
        }
    }
}

fn clip_lines(window: &Polygon<f64>, lines: MultiLineString<f64>) -> Option<Geometry<f64>> {
    let clipped = window.clip(&lines, false);
    let parts: Vec<_> = clipped.0.into_iter().filter(|ls| ls.0.len() >= 2).collect();
    (!parts.is_empty()).then(|| Geometry::MultiLineString(MultiLineString::new(parts)))
}

fn clip_polygons(window: &Polygon<f64>, polygons: MultiPolygon<f64>) -> Option<Geometry<f64>> {
    let clipped = polygons.intersection(&MultiPolygon::new(vec![window.clone()]));
    (!clipped.0.is_empty()).then(|| Geometry::MultiPolygon(clipped))
}
