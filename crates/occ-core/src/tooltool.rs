use crate::error::{OccError, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;

/// Decides whether a manifest component's sha512 is available for download.
pub trait ArtifactCheck: Sync {
    fn exists(&self, sha512: &str) -> Result<bool>;
}

/// Accepts every digest without asking anyone.
pub struct AcceptAll;

impl ArtifactCheck for AcceptAll {
    fn exists(&self, _sha512: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Looks digests up in a tooltool index.
pub struct TooltoolClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TooltoolClient {
    pub fn new(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

impl ArtifactCheck for TooltoolClient {
    fn exists(&self, sha512: &str) -> Result<bool> {
        let mut request = self.client.get(format!("{}/sha512/{}", self.base_url, sha512));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send()?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(OccError::Tooltool {
                sha512: sha512.to_string(),
                message: format!("status {}", s.as_u16()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_and_missing_digests() {
        let mut server = mockito::Server::new();
        let found = server
            .mock("GET", "/tooltool/sha512/aaaa")
            .match_header("authorization", "Bearer tt")
            .with_status(200)
            .with_body(r#"{"result": {"sha512": "aaaa"}}"#)
            .create();
        server
            .mock("GET", "/tooltool/sha512/bbbb")
            .with_status(404)
            .create();

        let tooltool = TooltoolClient::new(
            crate::http::client(5).unwrap(),
            &format!("{}/tooltool/", server.url()),
            Some("tt".to_string()),
        );
        assert!(tooltool.exists("aaaa").unwrap());
        assert!(!tooltool.exists("bbbb").unwrap());
        found.assert();
    }

    #[test]
    fn server_error_is_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/sha512/cccc")
            .with_status(500)
            .create();

        let tooltool = TooltoolClient::new(crate::http::client(5).unwrap(), &server.url(), None);
        let err = tooltool.exists("cccc").unwrap_err();
        assert!(err.to_string().contains("status 500"), "{err}");
    }
}
