use crate::config::GithubConfig;
use crate::error::Result;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Length of the SHA prefix used as the cache key.
const CACHE_KEY_LEN: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The `commit` object of a GitHub commit response.
///
/// A failed lookup is represented by [`Commit::default`]: every field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub committer: Committer,
}

#[derive(Deserialize)]
struct CommitResponse {
    commit: Commit,
}

/// Resolves commit SHAs to commits, caching successful lookups for the life
/// of the process.
pub struct CommitResolver {
    client: Client,
    api_url: String,
    org: String,
    repo: String,
    token: Option<String>,
    cache: Mutex<HashMap<String, Commit>>,
}

fn cache_key(sha: &str) -> String {
    sha.chars().take(CACHE_KEY_LEN).collect()
}

impl CommitResolver {
    pub fn new(client: Client, config: &GithubConfig, token: Option<String>) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            repo: config.repo.clone(),
            token: token.filter(|t| !t.is_empty()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn commit_url(&self, sha: &str) -> String {
        format!(
            "{}/repos/{}/{}/commits/{}",
            self.api_url, self.org, self.repo, sha
        )
    }

    /// Fetch the commit for `sha`.
    ///
    /// Non-success responses degrade to an empty [`Commit`] and are not
    /// cached; transport failures are returned as errors.
    pub fn get_commit(&self, sha: &str) -> Result<Commit> {
        let key = cache_key(sha);
        if let Some(hit) = self.lock_cache().get(&key) {
            return Ok(hit.clone());
        }

        let mut request = self
            .client
            .get(self.commit_url(sha))
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {token}"));
        }
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(sha, status = status.as_u16(), "commit lookup failed");
            return Ok(Commit::default());
        }

        let body: CommitResponse = response.json()?;
        self.lock_cache().insert(key, body.commit.clone());
        Ok(body.commit)
    }

    pub fn commit_message(&self, sha: &str) -> Result<Option<String>> {
        Ok(self.get_commit(sha)?.message)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, Commit>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
