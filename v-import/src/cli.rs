//! Options et commandes CLI
//!
//! - import (défaut) : source → location cible, reprojetée si besoin
//! - `--list-layers` : liste les couches de la source, sans rien importer

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use geostore::Datasource;
use tracing::{info, warn};

use crate::backend::LocalBackend;
use crate::config::{Extents, GisEnv, ImportRequest};
use crate::orchestrator::Orchestrator;
use crate::report::ImportReport;

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Datasource: GeoJSON file, directory of GeoJSON files or .tar.bz2 archive
    #[arg(short, long)]
    pub input: String,

    /// Layers to import (comma separated, default: all)
    #[arg(long, value_delimiter = ',')]
    pub layer: Vec<String>,

    /// Output dataset name (default: derived from the input name)
    #[arg(long)]
    pub output: Option<String>,

    /// Import the full input extent or only the current region
    #[arg(long, value_enum, required_unless_present = "list_layers")]
    pub extents: Option<Extents>,

    /// Replace an existing dataset with the same name
    #[arg(long)]
    pub overwrite: bool,

    /// List available layers and exit
    #[arg(short = 'l', long)]
    pub list_layers: bool,

    /// Import without reprojection even if the CRS differ
    #[arg(short = 'o', long)]
    pub override_crs_check: bool,

    /// GIS database directory (default: env GISDBASE)
    #[arg(long)]
    pub gisdbase: Option<PathBuf>,

    /// Target location (default: env LOCATION_NAME)
    #[arg(long)]
    pub location: Option<String>,

    /// Save the JSON import report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ImportArgs {
    /// Construit la requête d'import
    pub fn to_request(&self) -> ImportRequest {
        let mut request = ImportRequest::new(&self.input, self.extents.unwrap_or(Extents::Input));
        request.layers = self.layer.clone();
        if let Some(output) = &self.output {
            request.output = output.clone();
        }
        request.overwrite = self.overwrite;
        request.override_crs_check = self.override_crs_check;
        request
    }
}

/// Liste les couches de la source
pub fn cmd_list_layers(input: &str) -> Result<()> {
    let datasource =
        Datasource::open(input).with_context(|| format!("Unable to open datasource <{}>", input))?;

    println!("Data source <{}> contains {} layers:", input, datasource.layers().len());
    for (i, layer) in datasource.layers().iter().enumerate() {
        println!(
            "  {}: {} ({} features, {})",
            i + 1,
            layer.name,
            layer.collection.features.len(),
            layer.crs.name
        );
    }
    Ok(())
}

/// Exécute la commande import
pub fn cmd_import(args: &ImportArgs) -> Result<()> {
    if args.list_layers {
        return cmd_list_layers(&args.input);
    }

    let mut env = GisEnv::from_env();
    env.apply_overrides(args.gisdbase.clone(), args.location.clone());

    let db = env.open_database()?;
    let target = env.open_location(&db)?;
    let backend = LocalBackend::new(db);
    let request = args.to_request();

    info!(
        input = %request.datasource,
        output = %request.output,
        location = target.name(),
        extents = ?request.extents,
        "Import"
    );

    match Orchestrator::new(&backend, target).run(&request) {
        Ok(report) => {
            finish_report(&report, args)?;
            println!("{}", report.summary());
            Ok(())
        }
        Err(aborted) => {
            // L'erreur d'import reste l'erreur de sortie
            if let Err(e) = finish_report(&aborted.report, args) {
                warn!("{:#}", e);
            }
            Err(aborted.into())
        }
    }
}

fn finish_report(report: &ImportReport, args: &ImportArgs) -> Result<()> {
    report.display();
    if let Some(path) = &args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }
    Ok(())
}
