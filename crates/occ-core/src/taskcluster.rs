//! Taskcluster secrets, reached through the taskcluster proxy.

use crate::config::TaskclusterConfig;
use crate::error::{OccError, Result};
use reqwest::blocking::Client;
use serde_json::Value;

pub struct SecretsClient {
    client: Client,
    base_url: String,
}

impl SecretsClient {
    pub fn new(client: Client, config: &TaskclusterConfig) -> Self {
        Self {
            client,
            base_url: config.base_url(),
        }
    }

    pub fn secret_url(&self, key: &str) -> String {
        format!("{}/secrets/v1/secret/{}", self.base_url, key)
    }

    /// The `secret` payload stored under `key`.
    pub fn get_secret(&self, key: &str) -> Result<Value> {
        let response = self.client.get(self.secret_url(key)).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(OccError::Secret {
                key: key.to_string(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }
        let mut body: Value = response.json()?;
        match body.get_mut("secret") {
            Some(secret) => Ok(secret.take()),
            None => Err(OccError::SecretField {
                key: key.to_string(),
                field: "secret".to_string(),
            }),
        }
    }

    /// Account id, access key and secret key from the AWS secret.
    pub fn aws_credentials(&self, key: &str) -> Result<(String, String, String)> {
        let secret = self.get_secret(key)?;
        Ok((
            string_field(&secret, key, &["aws_tc_account_id"])?,
            string_field(&secret, key, &["TASKCLUSTER_AWS_ACCESS_KEY"])?,
            string_field(&secret, key, &["TASKCLUSTER_AWS_SECRET_KEY"])?,
        ))
    }

    /// Internal upload token from the tooltool secret.
    pub fn tooltool_token(&self, key: &str) -> Result<String> {
        let secret = self.get_secret(key)?;
        string_field(&secret, key, &["tooltool", "upload", "internal"])
    }
}

fn string_field(secret: &Value, key: &str, path: &[&str]) -> Result<String> {
    let mut cursor = secret;
    for segment in path {
        cursor = cursor.get(segment).ok_or_else(|| OccError::SecretField {
            key: key.to_string(),
            field: path.join("."),
        })?;
    }
    match cursor {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(OccError::SecretField {
            key: key.to_string(),
            field: path.join("."),
        }),
    }
}
