//! The aws-provisioner worker-type definition and its `regions` array.

use crate::config::TaskclusterConfig;
use crate::error::{OccError, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    #[serde(rename = "ImageId")]
    pub image_id: String,
    #[serde(rename = "SecurityGroupIds")]
    pub security_group_ids: Vec<String>,
}

/// One entry of a worker type's `regions` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    pub launch_spec: LaunchSpec,
    pub region: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub secrets: Map<String, Value>,
    #[serde(default)]
    pub user_data: Map<String, Value>,
}

impl RegionConfig {
    pub fn new(region: &str, image_id: &str, security_group_ids: Vec<String>) -> Self {
        Self {
            launch_spec: LaunchSpec {
                image_id: image_id.to_string(),
                security_group_ids,
            },
            region: region.to_string(),
            scopes: Vec::new(),
            secrets: Map::new(),
            user_data: Map::new(),
        }
    }
}

/// Fields the provisioner sets itself and rejects on update.
const SERVER_MANAGED_FIELDS: &[&str] = &["workerType", "lastModified"];

/// Old and new region arrays of a worker-type definition.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciled {
    pub old_regions: Value,
    pub definition: Value,
}

/// Replace the `regions` of a fetched definition, dropping server-managed
/// fields so the result can be submitted as-is.
pub fn reconcile(
    worker_type: &str,
    mut definition: Value,
    regions: &[RegionConfig],
) -> Result<Reconciled> {
    let object = definition
        .as_object_mut()
        .ok_or_else(|| OccError::MissingRegions(worker_type.to_string()))?;
    for field in SERVER_MANAGED_FIELDS {
        object.remove(*field);
    }
    let old_regions = object
        .remove("regions")
        .ok_or_else(|| OccError::MissingRegions(worker_type.to_string()))?;
    object.insert("regions".to_string(), serde_json::to_value(regions)?);
    Ok(Reconciled {
        old_regions,
        definition,
    })
}

pub struct ProvisionerClient {
    client: Client,
    base_url: String,
}

impl ProvisionerClient {
    pub fn new(client: Client, config: &TaskclusterConfig) -> Self {
        Self {
            client,
            base_url: config.base_url(),
        }
    }

    pub fn worker_type_url(&self, worker_type: &str) -> String {
        format!(
            "{}/aws-provisioner/v1/worker-type/{}",
            self.base_url, worker_type
        )
    }

    pub fn get_worker_type(&self, worker_type: &str) -> Result<Value> {
        let response = self.client.get(self.worker_type_url(worker_type)).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OccError::WorkerTypeNotFound(worker_type.to_string())),
            s if s.is_success() => Ok(response.json()?),
            s => Err(OccError::Provisioner {
                worker_type: worker_type.to_string(),
                status: s.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
        }
    }

    pub fn put_worker_type(&self, worker_type: &str, definition: &Value) -> Result<Value> {
        let response = self
            .client
            .put(self.worker_type_url(worker_type))
            .json(definition)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OccError::Provisioner {
                worker_type: worker_type.to_string(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        tracing::info!(worker_type, "provisioner accepted new region config");
        Ok(response.json()?)
    }
}
