use thiserror::Error;

#[derive(Debug, Error)]
pub enum OccError {
    #[error("secret '{key}' unavailable (status {status}): {body}")]
    Secret {
        key: String,
        status: u16,
        body: String,
    },

    #[error("secret '{key}' is missing field '{field}'")]
    SecretField { key: String, field: String },

    #[error("worker type not found in provisioner: {0}")]
    WorkerTypeNotFound(String),

    #[error("provisioner request for '{worker_type}' failed (status {status}): {body}")]
    Provisioner {
        worker_type: String,
        status: u16,
        body: String,
    },

    #[error("provisioner config for '{0}' has no regions array")]
    MissingRegions(String),

    #[error("ec2 error in {region}: {message}")]
    Ec2 { region: String, message: String },

    #[error("tooltool lookup for {sha512} failed: {message}")]
    Tooltool { sha512: String, message: String },

    #[error("invalid manifest glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OccError>;
