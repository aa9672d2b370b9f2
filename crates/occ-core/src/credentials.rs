//! AWS credential resolution.
//!
//! A profile in the per-user credentials file takes precedence; without one
//! the credentials come from the taskcluster secrets broker.

use crate::error::Result;
use crate::taskcluster::SecretsClient;
use std::path::Path;

/// Owner filter meaning "images owned by the calling account".
pub const SELF_OWNER: &str = "self";

#[derive(Clone)]
pub enum AwsCredentials {
    Static {
        account_id: String,
        access_key_id: String,
        secret_access_key: String,
    },
    Profile {
        name: String,
    },
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AwsCredentials::Static {
                account_id,
                access_key_id,
                ..
            } => f
                .debug_struct("Static")
                .field("account_id", account_id)
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .finish(),
            AwsCredentials::Profile { name } => {
                f.debug_struct("Profile").field("name", name).finish()
            }
        }
    }
}

impl AwsCredentials {
    /// Value for the image `Owners` filter.
    pub fn owner(&self) -> String {
        match self {
            AwsCredentials::Static { account_id, .. } => account_id.clone(),
            AwsCredentials::Profile { .. } => SELF_OWNER.to_string(),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            AwsCredentials::Static { .. } => "secrets",
            AwsCredentials::Profile { .. } => "profile",
        }
    }
}

/// Whether the ini-formatted credentials file at `path` has a `[profile]`
/// section. A missing or unreadable file counts as no.
pub fn profile_in_file(path: &Path, profile: &str) -> bool {
    let Ok(content) = std::fs::read_to_string(path) else {
        return false;
    };
    let header = format!("[{profile}]");
    content.lines().any(|l| l.trim() == header)
}

/// Pick the credentials file profile when present, else ask the broker.
pub fn resolve(
    credentials_file: Option<&Path>,
    profile: &str,
    secrets: &SecretsClient,
    secret_key: &str,
) -> Result<AwsCredentials> {
    if let Some(path) = credentials_file {
        if profile_in_file(path, profile) {
            tracing::info!(path = %path.display(), profile, "using aws credentials profile");
            return Ok(AwsCredentials::Profile {
                name: profile.to_string(),
            });
        }
    }

    tracing::info!(secret = secret_key, "fetching aws credentials from secrets");
    let (account_id, access_key_id, secret_access_key) = secrets.aws_credentials(secret_key)?;
    Ok(AwsCredentials::Static {
        account_id,
        access_key_id,
        secret_access_key,
    })
}
