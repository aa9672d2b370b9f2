//! [`ImageCatalog`] backed by the EC2 API.
//!
//! The AWS SDK is async; the rest of the crate is not. The catalog owns a
//! current-thread runtime and blocks on each describe call, building one SDK
//! client per region on first use.

use crate::credentials::AwsCredentials;
use crate::error::{OccError, Result};
use crate::image::{ImageCatalog, ImageSummary};
use aws_config::BehaviorVersion;
use aws_sdk_ec2::config::{Credentials, Region};
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct Ec2Catalog {
    runtime: tokio::runtime::Runtime,
    credentials: AwsCredentials,
    clients: Mutex<HashMap<String, aws_sdk_ec2::Client>>,
}

impl Ec2Catalog {
    pub fn new(credentials: AwsCredentials) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            credentials,
            clients: Mutex::new(HashMap::new()),
        })
    }

    fn client(&self, region: &str) -> aws_sdk_ec2::Client {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(region) {
            return client.clone();
        }

        let loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        let loader = match &self.credentials {
            AwsCredentials::Static {
                access_key_id,
                secret_access_key,
                ..
            } => loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                "taskcluster-secrets",
            )),
            AwsCredentials::Profile { name } => loader.profile_name(name.clone()),
        };
        let config = self.runtime.block_on(loader.load());
        let client = aws_sdk_ec2::Client::new(&config);
        clients.insert(region.to_string(), client.clone());
        client
    }
}

fn ec2_error<E>(region: &str, err: E) -> OccError
where
    E: std::error::Error,
{
    OccError::Ec2 {
        region: region.to_string(),
        message: DisplayErrorContext(&err).to_string(),
    }
}

impl ImageCatalog for Ec2Catalog {
    fn describe_images(
        &self,
        region: &str,
        owners: &[String],
        name_patterns: &[String],
    ) -> Result<Vec<ImageSummary>> {
        let client = self.client(region);
        let filter = Filter::builder()
            .name("name")
            .set_values(Some(name_patterns.to_vec()))
            .build();
        let response = self
            .runtime
            .block_on(
                client
                    .describe_images()
                    .set_owners(Some(owners.to_vec()))
                    .filters(filter)
                    .send(),
            )
            .map_err(|e| ec2_error(region, e))?;

        Ok(response
            .images()
            .iter()
            .filter_map(|image| {
                Some(ImageSummary {
                    image_id: image.image_id()?.to_string(),
                    name: image.name()?.to_string(),
                    creation_date: image.creation_date().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    fn describe_security_groups(
        &self,
        region: &str,
        group_names: &[String],
    ) -> Result<Vec<String>> {
        let client = self.client(region);
        let response = self
            .runtime
            .block_on(
                client
                    .describe_security_groups()
                    .set_group_names(Some(group_names.to_vec()))
                    .send(),
            )
            .map_err(|e| ec2_error(region, e))?;

        Ok(response
            .security_groups()
            .iter()
            .filter_map(|g| g.group_id().map(str::to_string))
            .collect())
    }
}
