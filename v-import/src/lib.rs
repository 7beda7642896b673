//! # v-import
//!
//! Import d'une source vecteur dans une location SIG, avec réconciliation
//! automatique des systèmes de coordonnées.
//!
//! ## Features
//!
//! - Import direct quand les CRS sont identiques
//! - Sinon : location temporaire dans le CRS de la source, import, puis
//!   reprojection dans la location cible
//! - Import limité à la région active, reprojetée dans le CRS de la source
//! - Nettoyage garanti des ressources temporaires
//! - Reprojection en Rust pur (feature `reproject` pour PROJ)
//!
//! ## Usage CLI
//!
//! ```bash
//! # Import complet dans la location courante (env GISDBASE / LOCATION_NAME)
//! v-import --input ./roads.geojson --extents input
//!
//! # Limité à la région active, couches choisies
//! v-import --input ./bdtopo.tar.bz2 --layer routes,voies_ferrees --extents region
//!
//! # Lister les couches
//! v-import --input ./bdtopo.tar.bz2 --list-layers
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod crs;
pub mod error;
pub mod extent;
pub mod orchestrator;
pub mod report;
#[cfg(feature = "reproject")]
pub mod reproject;
pub mod reproject_lite;
pub mod workspace;

pub use backend::{GisBackend, LocalBackend};
pub use config::{Extents, GisEnv, ImportRequest};
pub use error::{Aborted, WorkflowError};
pub use orchestrator::{Orchestrator, Stage};
pub use report::{ImportReport, ImportStatus};
