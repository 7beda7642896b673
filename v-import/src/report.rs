//! Rapport d'import
//!
//! Collecte le chemin suivi, les étapes atteintes, les CRS comparés et le
//! dataset produit. Affiché sur la console et sauvegardable en JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::backend::DatasetSummary;
use crate::crs::{CrsClass, CrsDescriptor};
use crate::error::WorkflowError;
use crate::orchestrator::Stage;

/// Statut final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportStatus {
    /// Workflow en cours
    Running,
    Done,
    Aborted,
}

/// Chemin pris par l'orchestrateur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportPath {
    /// CRS identiques : import direct dans la location cible
    Fast,
    /// Import dans la location temporaire puis reprojection
    Staged,
}

/// Cause d'un abandon
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    /// Dernière étape atteinte avant l'échec
    pub stage: Stage,
    pub kind: String,
    pub message: String,
}

/// Rapport complet d'un import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub datasource: String,
    pub output: String,
    pub target_location: String,
    pub region_limited: bool,
    /// Location temporaire, si créée
    pub workspace: Option<String>,
    pub path: Option<ImportPath>,
    /// Étapes atteintes, dans l'ordre
    pub stages: Vec<Stage>,

    pub source_crs: Option<String>,
    pub source_class: Option<CrsClass>,
    pub target_crs: Option<String>,
    pub target_class: Option<CrsClass>,

    pub features: usize,
    pub checksum: Option<String>,
    /// [xmin, ymin, xmax, ymax] du dataset final
    pub bounds: Option<[f64; 4]>,

    pub duration_secs: f64,
    pub status: ImportStatus,
    pub failure: Option<Failure>,
    /// Problèmes non fatals (nettoyage, contrôle CRS forcé)
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn new(datasource: &str, output: &str, target_location: &str) -> Self {
        Self {
            datasource: datasource.to_string(),
            output: output.to_string(),
            target_location: target_location.to_string(),
            region_limited: false,
            workspace: None,
            path: None,
            stages: vec![Stage::Init],
            source_crs: None,
            source_class: None,
            target_crs: None,
            target_class: None,
            features: 0,
            checksum: None,
            bounds: None,
            duration_secs: 0.0,
            status: ImportStatus::Running,
            failure: None,
            warnings: Vec::new(),
        }
    }

    /// Enregistre une étape atteinte
    pub fn reach(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Dernière étape atteinte
    pub fn last_stage(&self) -> Stage {
        self.stages.last().copied().unwrap_or(Stage::Init)
    }

    pub fn record_crs(
        &mut self,
        source: &CrsDescriptor,
        source_class: CrsClass,
        target: &CrsDescriptor,
        target_class: CrsClass,
    ) {
        self.source_crs = Some(source.to_string());
        self.source_class = Some(source_class);
        self.target_crs = Some(target.to_string());
        self.target_class = Some(target_class);
    }

    /// Enregistre le dataset final
    pub fn record_output(&mut self, summary: &DatasetSummary) {
        self.features = summary.features;
        self.checksum = Some(summary.checksum.clone());
        self.bounds = summary.bounds;
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Marque le workflow comme terminé
    pub fn finish(&mut self) {
        self.status = ImportStatus::Done;
    }

    /// Marque le workflow comme abandonné après la dernière étape atteinte
    pub fn abort(&mut self, error: &WorkflowError) {
        self.status = ImportStatus::Aborted;
        self.failure = Some(Failure {
            stage: self.last_stage(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("IMPORT REPORT - {}", self.datasource);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Output: <{}> in location <{}>",
            self.output, self.target_location
        );
        if let Some(path) = self.path {
            println!("Path: {:?}", path);
        }
        if let Some(workspace) = &self.workspace {
            println!("Temporary location: {}", workspace);
        }
        let stages: Vec<String> = self.stages.iter().map(|s| s.to_string()).collect();
        println!("Stages: {}", stages.join(" -> "));
        println!("Features: {}", self.features);

        if self.source_crs.is_some() || self.target_crs.is_some() {
            println!("\n--- CRS ---");
            if let Some(crs) = &self.source_crs {
                println!("  input:  {}", crs);
            }
            if let Some(crs) = &self.target_crs {
                println!("  target: {}", crs);
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in &self.warnings {
                println!("  {}", w);
            }
        }

        if let Some(failure) = &self.failure {
            println!("\n--- FAILURE ---");
            println!("  [{}] after {}: {}", failure.kind, failure.stage, failure.message);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        match &self.failure {
            Some(failure) => format!(
                "{} -> {}: aborted after {} ({})",
                self.datasource, self.output, failure.stage, failure.kind
            ),
            None => format!(
                "{} -> {}: {} features imported into <{}>",
                self.datasource, self.output, self.features, self.target_location
            ),
        }
    }
}
