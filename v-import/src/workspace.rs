//! Location temporaire dans le CRS de la source
//!
//! La location est supprimée quand le guard sort de portée, y compris sur
//! les chemins d'erreur. Un échec de suppression est journalisé, jamais propagé.

use geostore::Location;
use tracing::{debug, info, warn};

use crate::backend::GisBackend;
use crate::error::WorkflowError;

pub const WORKSPACE_PREFIX: &str = "temp_import_location";

/// Nombre maximal de suffixes essayés avant d'abandonner
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Nom unique dérivé du PID, suffixé d'un compteur s'il est déjà pris
pub fn unique_name(prefix: &str, exists: impl Fn(&str) -> bool) -> anyhow::Result<String> {
    let base = format!("{}_{}", prefix, std::process::id());
    if !exists(&base) {
        return Ok(base);
    }
    for n in 1..=MAX_NAME_ATTEMPTS {
        let candidate = format!("{}_{}", base, n);
        if !exists(&candidate) {
            return Ok(candidate);
        }
    }
    anyhow::bail!(
        "No free name for <{}> after {} attempts",
        base,
        MAX_NAME_ATTEMPTS
    )
}

/// Location temporaire possédée par une exécution
pub struct EphemeralWorkspace<'a, B: GisBackend> {
    backend: &'a B,
    name: String,
    location: Option<Location>,
}

impl<'a, B: GisBackend> EphemeralWorkspace<'a, B> {
    /// Crée la location à partir du CRS de la source (aucune feature importée)
    pub fn create(
        backend: &'a B,
        datasource: &str,
        layers: &[String],
    ) -> Result<Self, WorkflowError> {
        let name = unique_name(WORKSPACE_PREFIX, |n| backend.location_exists(n))
            .map_err(|e| WorkflowError::datasource(datasource, e))?;
        info!("Creating temporary location for <{}>...", datasource);

        let location = backend
            .create_location_from_source(datasource, layers, &name)
            .map_err(|e| WorkflowError::datasource(datasource, e))?;

        debug!(workspace = %name, "Temporary location ready");
        Ok(Self {
            backend,
            name,
            location: Some(location),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location sous-jacente
    ///
    /// # Panics
    /// Jamais tant que le guard n'a pas été détruit (`destroy` consomme le guard).
    pub fn location(&self) -> &Location {
        match &self.location {
            Some(location) => location,
            None => unreachable!("workspace used after destroy"),
        }
    }

    /// Supprime la location ; l'erreur éventuelle est rendue pour le rapport
    pub fn destroy(mut self) -> Result<(), WorkflowError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), WorkflowError> {
        let Some(location) = self.location.take() else {
            return Ok(());
        };
        match self.backend.remove_location(&location) {
            Ok(()) => {
                debug!(workspace = %self.name, "Temporary location removed");
                Ok(())
            }
            Err(e) => {
                let err = WorkflowError::cleanup(&self.name, e);
                warn!("{}", err);
                Err(err)
            }
        }
    }
}

impl<B: GisBackend> Drop for EphemeralWorkspace<'_, B> {
    fn drop(&mut self) {
        // Déjà journalisé
        let _ = self.release();
    }
}
