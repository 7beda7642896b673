//! Orchestration de l'import : location temporaire, comparaison des CRS,
//! transfert d'emprise, import puis reprojection dans la location cible.
//!
//! Les étapes sont strictement séquentielles. La location temporaire et la
//! géométrie de région sont des guards : elles sont supprimées sur tous les
//! chemins de sortie, succès comme échec.

use std::fmt;
use std::time::Instant;

use geostore::Location;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::backend::{GisBackend, ImportSpec};
use crate::config::ImportRequest;
use crate::crs::{self, CrsClass, CrsDescriptor};
use crate::error::{Aborted, CrsSide, WorkflowError};
use crate::extent;
use crate::report::{ImportPath, ImportReport};
use crate::workspace::EphemeralWorkspace;

/// Étapes du workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Init,
    WorkspaceCreated,
    CrsCompared,
    FastImport,
    StagedImport,
    ExtentApplied,
    Imported,
    Reprojected,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::WorkspaceCreated => "WorkspaceCreated",
            Self::CrsCompared => "CRSCompared",
            Self::FastImport => "FastImport",
            Self::StagedImport => "StagedImport",
            Self::ExtentApplied => "ExtentApplied",
            Self::Imported => "Imported",
            Self::Reprojected => "Reprojected",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Exécute un import vers une location cible
pub struct Orchestrator<'a, B: GisBackend> {
    backend: &'a B,
    target: Location,
}

impl<'a, B: GisBackend> Orchestrator<'a, B> {
    pub fn new(backend: &'a B, target: Location) -> Self {
        Self { backend, target }
    }

    pub fn target(&self) -> &Location {
        &self.target
    }

    /// Lance le workflow complet.
    ///
    /// En cas d'échec, l'erreur porte la dernière étape atteinte et le
    /// rapport partiel. Les ressources temporaires sont déjà supprimées.
    pub fn run(&self, request: &ImportRequest) -> Result<ImportReport, Aborted> {
        let start = Instant::now();
        let mut report =
            ImportReport::new(&request.datasource, &request.output, self.target.name());
        report.region_limited = request.region_limited();

        let result = self.execute(request, &mut report);
        report.set_duration(start.elapsed());

        match result {
            Ok(()) => {
                report.reach(Stage::Done);
                report.finish();
                info!(
                    dataset = %request.output,
                    location = self.target.name(),
                    features = report.features,
                    "Import done"
                );
                Ok(report)
            }
            Err(error) => {
                report.abort(&error);
                let stage = report.last_stage();
                error!(stage = %stage, kind = error.kind(), "{}", error);
                Err(Aborted {
                    stage,
                    error,
                    report: Box::new(report),
                })
            }
        }
    }

    fn execute(&self, request: &ImportRequest, report: &mut ImportReport) -> Result<(), WorkflowError> {
        let workspace =
            EphemeralWorkspace::create(self.backend, &request.datasource, &request.layers)?;
        report.workspace = Some(workspace.name().to_string());
        report.reach(Stage::WorkspaceCreated);

        let outcome = self.import_through(&workspace, request, report);

        // Le nettoyage ne masque jamais l'erreur principale
        if let Err(e) = workspace.destroy() {
            report.record_warning(e.to_string());
        }
        outcome
    }

    fn import_through(
        &self,
        workspace: &EphemeralWorkspace<'_, B>,
        request: &ImportRequest,
        report: &mut ImportReport,
    ) -> Result<(), WorkflowError> {
        let source = self.describe(workspace.location(), CrsSide::Input, &request.datasource)?;
        let target = self.describe(&self.target, CrsSide::Location, self.target.name())?;
        let source_class = crs::classify(&source);
        let target_class = crs::classify(&target);
        report.record_crs(&source, source_class, &target, target_class);
        report.reach(Stage::CrsCompared);

        let same_crs = crs::equal(&source, &target);
        if !same_crs {
            self.require_referenced(request, source_class, target_class)?;
        }
        if same_crs || request.override_crs_check {
            if !same_crs {
                let message = format!(
                    "Overriding CRS check: <{}> imported into <{}> without reprojection",
                    request.datasource,
                    self.target.name()
                );
                warn!("{}", message);
                report.record_warning(message);
            }
            report.path = Some(ImportPath::Fast);
            report.reach(Stage::FastImport);
            return self.fast_import(request, report);
        }

        report.path = Some(ImportPath::Staged);
        report.reach(Stage::StagedImport);
        self.staged_import(workspace, request, report)
    }

    /// Refuse une source ou une cible sans CRS, la cible d'abord
    fn require_referenced(
        &self,
        request: &ImportRequest,
        source_class: CrsClass,
        target_class: CrsClass,
    ) -> Result<(), WorkflowError> {
        if target_class == CrsClass::Unreferenced {
            return Err(WorkflowError::CrsUnavailable {
                side: CrsSide::Location,
                name: self.target.name().to_string(),
            });
        }
        if source_class == CrsClass::Unreferenced {
            return Err(WorkflowError::CrsUnavailable {
                side: CrsSide::Input,
                name: request.datasource.clone(),
            });
        }
        Ok(())
    }

    fn describe(
        &self,
        location: &Location,
        side: CrsSide,
        name: &str,
    ) -> Result<CrsDescriptor, WorkflowError> {
        self.backend.describe_crs(location).map_err(|e| {
            warn!(location = location.name(), "{:#}", e);
            WorkflowError::CrsUnavailable {
                side,
                name: name.to_string(),
            }
        })
    }

    fn fast_import(&self, request: &ImportRequest, report: &mut ImportReport) -> Result<(), WorkflowError> {
        info!("Importing <{}>...", request.datasource);
        let spec = ImportSpec {
            datasource: &request.datasource,
            layers: &request.layers,
            output: &request.output,
            region_limited: request.region_limited(),
            overwrite: request.overwrite,
            skip_crs_check: request.override_crs_check,
        };
        let summary = self
            .backend
            .import_dataset(&spec, &self.target)
            .map_err(|e| WorkflowError::import(&request.datasource, self.target.name(), e))?;

        report.record_output(&summary);
        report.reach(Stage::Imported);
        Ok(())
    }

    fn staged_import(
        &self,
        workspace: &EphemeralWorkspace<'_, B>,
        request: &ImportRequest,
        report: &mut ImportReport,
    ) -> Result<(), WorkflowError> {
        if !request.overwrite && self.backend.dataset_exists(&self.target, &request.output) {
            return Err(WorkflowError::import(
                &request.datasource,
                self.target.name(),
                anyhow::anyhow!(
                    "Dataset <{}> already exists (use --overwrite)",
                    request.output
                ),
            ));
        }

        let artifact = if request.region_limited() {
            let artifact = extent::capture_active_region(self.backend, &self.target)?;
            let geometry =
                extent::reproject(self.backend, artifact.geometry(), &self.target, workspace.location())?;
            extent::apply_as_region(self.backend, &geometry, workspace.location())?;
            report.reach(Stage::ExtentApplied);
            Some(artifact)
        } else {
            None
        };

        info!("Importing <{}>...", request.datasource);
        let spec = ImportSpec {
            datasource: &request.datasource,
            layers: &request.layers,
            output: &request.output,
            region_limited: request.region_limited(),
            overwrite: false,
            skip_crs_check: false,
        };
        self.backend
            .import_dataset(&spec, workspace.location())
            .map_err(|e| WorkflowError::import(&request.datasource, workspace.name(), e))?;
        report.reach(Stage::Imported);

        info!(
            "Reprojecting <{}> from <{}> to <{}>...",
            request.output,
            workspace.name(),
            self.target.name()
        );
        let summary = self
            .backend
            .reproject_dataset(&request.output, workspace.location(), &self.target, request.overwrite)
            .map_err(|e| {
                WorkflowError::reprojection(&request.output, workspace.name(), self.target.name(), e)
            })?;
        report.record_output(&summary);
        report.reach(Stage::Reprojected);

        if let Some(artifact) = artifact {
            if let Err(e) = artifact.remove() {
                report.record_warning(e.to_string());
            }
        }
        Ok(())
    }
}
