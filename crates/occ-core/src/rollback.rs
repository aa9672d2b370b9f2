use crate::error::Result;
use crate::image::{self, ImageCatalog};
use crate::intent::{self, RollbackRequest};
use crate::provisioner::{self, ProvisionerClient, RegionConfig};
use serde::Serialize;
use serde_json::Value;

/// Where to look for images and which groups a launch spec gets.
#[derive(Debug, Clone)]
pub struct RollbackSettings {
    pub owner: String,
    pub regions: Vec<String>,
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RollbackOutcome {
    /// The commit message carries no rollback instruction.
    NotRequested,
    /// No published image matches the requested SHA.
    Aborted {
        request: RollbackRequest,
        available_shas: Vec<String>,
    },
    Planned {
        request: RollbackRequest,
        available_shas: Vec<String>,
        regions: Vec<RegionConfig>,
    },
}

/// Parse `message` and, when it asks for a rollback, plan it.
pub fn plan_rollback(
    message: &str,
    catalog: &dyn ImageCatalog,
    settings: &RollbackSettings,
) -> Result<RollbackOutcome> {
    match intent::rollback_request(message) {
        Some(request) => plan_for_request(request, catalog, settings),
        None => Ok(RollbackOutcome::NotRequested),
    }
}

/// Build the per-region launch configuration returning
/// `request.worker_type` to the images built from `request.sha`.
pub fn plan_for_request(
    request: RollbackRequest,
    catalog: &dyn ImageCatalog,
    settings: &RollbackSettings,
) -> Result<RollbackOutcome> {
    let patterns = vec![image::worker_type_pattern(&request.worker_type)];
    let images = image::list_images(catalog, &settings.owner, &settings.regions, &patterns)?;
    let available_shas = image::available_shas(&images);
    tracing::info!(
        worker_type = %request.worker_type,
        shas = %available_shas.join(", "),
        "rollback available"
    );

    let chosen = image::newest_per_region(image::filter_by_sha(&images, &request.sha));
    if chosen.is_empty() {
        tracing::warn!(
            worker_type = %request.worker_type,
            sha = %request.sha,
            "rollback aborted: no images match"
        );
        return Ok(RollbackOutcome::Aborted {
            request,
            available_shas,
        });
    }

    let mut regions = Vec::with_capacity(chosen.len());
    for (region, image) in chosen {
        let groups = catalog.describe_security_groups(&region, &settings.security_groups)?;
        tracing::debug!(region = %region, image_id = %image.image_id, "selected image");
        regions.push(RegionConfig::new(&region, &image.image_id, groups));
    }

    tracing::info!(
        worker_type = %request.worker_type,
        sha = %request.sha,
        regions = regions.len(),
        "rollback planned"
    );
    Ok(RollbackOutcome::Planned {
        request,
        available_shas,
        regions,
    })
}

/// What happened to the provisioner definition for a planned rollback.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub old_regions: Value,
    pub applied: bool,
}

/// Fetch the worker type's current definition and swap in the planned
/// regions. The new definition is only PUT back when `apply` is set.
///
/// Returns `None` for outcomes that carry no plan.
pub fn submit(
    provisioner: &ProvisionerClient,
    outcome: &RollbackOutcome,
    apply: bool,
) -> Result<Option<Submission>> {
    let RollbackOutcome::Planned {
        request, regions, ..
    } = outcome
    else {
        return Ok(None);
    };

    tracing::info!(
        worker_type = %request.worker_type,
        sha = %request.sha,
        "rollback in progress"
    );
    let definition = provisioner.get_worker_type(&request.worker_type)?;
    let reconciled = provisioner::reconcile(&request.worker_type, definition, regions)?;

    if apply {
        provisioner.put_worker_type(&request.worker_type, &reconciled.definition)?;
    } else {
        tracing::info!(worker_type = %request.worker_type, "dry run: new config not submitted");
    }

    Ok(Some(Submission {
        old_regions: reconciled.old_regions,
        applied: apply,
    }))
}
