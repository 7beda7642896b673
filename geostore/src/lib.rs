//! # geostore
//!
//! Stockage spatial de travail et lecture des sources vectorielles.
//!
//! ## Features
//!
//! - Base GIS sur disque : locations (un CRS, une région active, des datasets)
//! - Lecture de sources GeoJSON : fichier, répertoire ou archive `.tar.bz2`
//! - Découverte du CRS depuis le membre `crs` GeoJSON
//! - Types `geo` pour le découpage et les emprises
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geostore::{Datasource, GisDatabase};
//!
//! let db = GisDatabase::open("/data/gisdb")?;
//! let location = db.open_location("lambert93")?;
//! let source = Datasource::open("roads.geojson")?;
//! let selection = source.select(&[])?;
//! println!("CRS: {}", selection.crs.canonical());
//! ```

pub mod dataset;
pub mod datasource;
pub mod error;
pub mod location;
pub mod srs;
pub mod types;

pub use dataset::{Dataset, Layer};
pub use datasource::{Datasource, Selection, SourceLayer};
pub use error::StoreError;
pub use location::{sanitize_name, GisDatabase, Location};
pub use types::{CrsInfo, Region, RegionGeometry};
