pub mod config;
pub mod deploy;
pub mod images;
pub mod intent;
pub mod rollback;

use anyhow::Context as _;
use occ_core::config::Config;
use occ_core::credentials::{self, AwsCredentials};
use occ_core::ec2::Ec2Catalog;
use occ_core::github::CommitResolver;
use occ_core::provisioner::ProvisionerClient;
use occ_core::taskcluster::SecretsClient;
use occ_core::{http, paths};
use std::path::PathBuf;

/// Effective settings for one invocation: loaded config plus flag and
/// environment overrides.
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub gh_token: Option<String>,
    pub json: bool,
}

impl Context {
    pub fn commits(&self) -> anyhow::Result<CommitResolver> {
        Ok(CommitResolver::new(
            http::client(self.config.http_timeout_secs)?,
            &self.config.github,
            self.gh_token.clone(),
        ))
    }

    pub fn secrets(&self) -> anyhow::Result<SecretsClient> {
        Ok(SecretsClient::new(
            http::client(self.config.http_timeout_secs)?,
            &self.config.taskcluster,
        ))
    }

    pub fn provisioner(&self) -> anyhow::Result<ProvisionerClient> {
        Ok(ProvisionerClient::new(
            http::client(self.config.http_timeout_secs)?,
            &self.config.taskcluster,
        ))
    }

    pub fn aws_credentials(&self) -> anyhow::Result<AwsCredentials> {
        let file = paths::user_aws_credentials();
        credentials::resolve(
            file.as_deref(),
            &self.config.aws.profile,
            &self.secrets()?,
            &self.config.taskcluster.aws_secret,
        )
        .context("failed to obtain aws credentials")
    }

    pub fn catalog(&self) -> anyhow::Result<(Ec2Catalog, AwsCredentials)> {
        let creds = self.aws_credentials()?;
        let catalog = Ec2Catalog::new(creds.clone()).context("failed to start ec2 client")?;
        Ok((catalog, creds))
    }
}
