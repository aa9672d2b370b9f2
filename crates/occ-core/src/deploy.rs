//! Per-manifest deployment decisions.
//!
//! Every worker-type manifest is evaluated on its own thread:
//!
//! ```text
//! manifest ──► json_loads ──► shas_exist ──► deploy_requested ──► DeployDecision
//!                                                 ▲
//!                          commit message ────────┘
//! ```
//!
//! Decisions are collected over a channel once all threads finish.

use crate::error::{OccError, Result};
use crate::github::CommitResolver;
use crate::intent;
use crate::paths;
use crate::tooltool::ArtifactCheck;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployDecision {
    pub worker_type: String,
    pub valid: bool,
    pub json_loads: bool,
    pub shas_exist: bool,
    pub deploy_requested: bool,
}

/// Source of the triggering commit's message.
pub trait CommitSource: Sync {
    fn commit_message(&self, sha: &str) -> Result<Option<String>>;
}

impl CommitSource for CommitResolver {
    fn commit_message(&self, sha: &str) -> Result<Option<String>> {
        CommitResolver::commit_message(self, sha)
    }
}

/// A manifest component pinned to a tooltool artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedComponent {
    pub component_type: String,
    pub component_name: String,
    pub sha512: String,
}

/// Manifests under `root` matching any of `globs`, sorted and de-duplicated.
pub fn find_manifests(root: &Path, globs: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for pattern in globs {
        // Only `pattern` is a glob; the root is matched literally.
        let full = Path::new(&glob::Pattern::escape(&root.to_string_lossy())).join(pattern);
        let entries = glob::glob(&full.to_string_lossy()).map_err(|e| OccError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => found.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable manifest path"),
            }
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

pub fn pinned_components(manifest: &Value) -> Vec<PinnedComponent> {
    let Some(components) = manifest.get("Components").and_then(Value::as_array) else {
        return Vec::new();
    };
    components
        .iter()
        .filter_map(|c| {
            let sha512 = c.get("sha512")?.as_str()?;
            let text = |key: &str| {
                c.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Some(PinnedComponent {
                component_type: text("ComponentType"),
                component_name: text("ComponentName"),
                sha512: sha512.to_string(),
            })
        })
        .collect()
}

fn check_shas(worker_type: &str, manifest: &Value, check: &dyn ArtifactCheck) -> bool {
    let mut all_present = true;
    for component in pinned_components(manifest) {
        tracing::info!(
            worker_type,
            "checking tooltool for {}/{} ({})",
            component.component_type,
            component.component_name,
            component.sha512
        );
        match check.exists(&component.sha512) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    worker_type,
                    sha512 = %component.sha512,
                    "artifact missing from tooltool"
                );
                all_present = false;
            }
            Err(e) => {
                tracing::warn!(worker_type, error = %e, "tooltool check failed");
                all_present = false;
            }
        }
    }
    all_present
}

/// Evaluate one manifest against the commit message.
pub fn evaluate_manifest(
    path: &Path,
    message: Option<&str>,
    check: &dyn ArtifactCheck,
) -> DeployDecision {
    let worker_type = paths::worker_type_from_manifest(path).unwrap_or_default();

    let parsed: Option<Value> = std::fs::read_to_string(path)
        .ok()
        .and_then(|data| serde_json::from_str(&data).ok());
    let json_loads = parsed.is_some();
    tracing::info!(worker_type = %worker_type, "manifest contains valid json: {json_loads}");

    let shas_exist = match &parsed {
        Some(manifest) => check_shas(&worker_type, manifest, check),
        None => false,
    };
    tracing::info!(
        worker_type = %worker_type,
        "manifest sha hashes exist in tooltool: {shas_exist}"
    );

    let deploy_requested = intent::deploy_requested(&worker_type, message);
    tracing::info!(
        worker_type = %worker_type,
        "deployment {}requested for: {worker_type}",
        if deploy_requested { "" } else { "not " }
    );

    DeployDecision {
        valid: json_loads && shas_exist,
        worker_type,
        json_loads,
        shas_exist,
        deploy_requested,
    }
}

/// Evaluate every manifest concurrently, one thread each.
///
/// Each thread resolves the commit itself; a lookup failure is logged and
/// treated as "no deployment requested". Results are sorted by worker type.
pub fn evaluate_all(
    manifests: &[PathBuf],
    sha: &str,
    commits: &dyn CommitSource,
    check: &dyn ArtifactCheck,
) -> Vec<DeployDecision> {
    let (tx, rx) = mpsc::channel();

    std::thread::scope(|scope| {
        for manifest in manifests {
            let tx = tx.clone();
            scope.spawn(move || {
                let message = match commits.commit_message(sha) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(sha, error = %e, "commit lookup failed");
                        None
                    }
                };
                let decision = evaluate_manifest(manifest, message.as_deref(), check);
                // Receiver outlives the scope; send cannot fail here.
                let _ = tx.send(decision);
            });
        }
    });
    drop(tx);

    let mut results: Vec<DeployDecision> = rx.into_iter().collect();
    results.sort_by(|a, b| a.worker_type.cmp(&b.worker_type));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltool::AcceptAll;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedMessage {
        message: Option<String>,
        calls: AtomicUsize,
    }

    impl FixedMessage {
        fn new(message: Option<&str>) -> Self {
            Self {
                message: message.map(str::to_string),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CommitSource for FixedMessage {
        fn commit_message(&self, _sha: &str) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.message.clone())
        }
    }

    struct KnownDigests(Vec<&'static str>);

    impl ArtifactCheck for KnownDigests {
        fn exists(&self, sha512: &str) -> Result<bool> {
            Ok(self.0.iter().any(|d| *d == sha512))
        }
    }

    const MANIFEST: &str = r#"{
        "Components": [
            {"ComponentName": "NodeJS", "ComponentType": "ExeInstall", "sha512": "abc"},
            {"ComponentName": "Paths", "ComponentType": "EnvironmentVariableSet"},
            {"ComponentName": "Rust", "ComponentType": "MsiInstall", "sha512": "def"}
        ]
    }"#;

    fn write_manifest(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let manifest_dir = dir.path().join("userdata/Manifest");
        std::fs::create_dir_all(&manifest_dir).unwrap();
        let path = manifest_dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn finds_manifests_by_glob() {
        let dir = TempDir::new().unwrap();
        write_manifest(&dir, "gecko-1-b-win2012-beta.json", "{}");
        write_manifest(&dir, "gecko-t-win7-32-gpu-b.json", "{}");
        write_manifest(&dir, "gecko-1-b-win2012.json", "{}");

        let globs = vec![
            "userdata/Manifest/gecko-*-beta.json".to_string(),
            "userdata/Manifest/gecko-*-gpu-b.json".to_string(),
            "userdata/Manifest/gecko-1-*-beta.json".to_string(),
        ];
        let found = find_manifests(dir.path(), &globs).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| paths::worker_type_from_manifest(p).unwrap())
            .collect();
        assert_eq!(names, vec!["gecko-1-b-win2012-beta", "gecko-t-win7-32-gpu-b"]);
    }

    #[test]
    fn root_with_glob_characters_is_literal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("ci[1]");
        let manifest_dir = root.join("userdata/Manifest");
        std::fs::create_dir_all(&manifest_dir).unwrap();
        std::fs::write(manifest_dir.join("gecko-1-b-win2012-beta.json"), "{}").unwrap();

        let globs = vec!["userdata/Manifest/gecko-*-beta.json".to_string()];
        let found = find_manifests(&root, &globs).unwrap();
        assert_eq!(found, vec![manifest_dir.join("gecko-1-b-win2012-beta.json")]);
    }

    #[test]
    fn invalid_glob_is_error() {
        let dir = TempDir::new().unwrap();
        let err = find_manifests(dir.path(), &["[".to_string()]).unwrap_err();
        assert!(matches!(err, OccError::InvalidGlob { .. }));
    }

    #[test]
    fn pinned_components_skip_unpinned() {
        let value: Value = serde_json::from_str(MANIFEST).unwrap();
        let pinned = pinned_components(&value);
        assert_eq!(pinned.len(), 2);
        assert_eq!(pinned[0].component_name, "NodeJS");
        assert_eq!(pinned[1].sha512, "def");
    }

    #[test]
    fn valid_manifest_with_deploy_request() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "gecko-1-b-win2012-beta.json", MANIFEST);
        let decision = evaluate_manifest(
            &path,
            Some("deploy: gecko-1-b-win2012-beta"),
            &AcceptAll,
        );
        assert_eq!(
            decision,
            DeployDecision {
                worker_type: "gecko-1-b-win2012-beta".to_string(),
                valid: true,
                json_loads: true,
                shas_exist: true,
                deploy_requested: true,
            }
        );
    }

    #[test]
    fn missing_artifact_invalidates_manifest() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "gecko-1-b-win2012-beta.json", MANIFEST);
        let decision = evaluate_manifest(&path, None, &KnownDigests(vec!["abc"]));
        assert!(decision.json_loads);
        assert!(!decision.shas_exist);
        assert!(!decision.valid);
        assert!(!decision.deploy_requested);
    }

    #[test]
    fn malformed_json_is_flagged_not_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_manifest(&dir, "gecko-2-b-win2012-beta.json", "{ \"Components\": [");
        let decision = evaluate_manifest(&path, Some("deploy: gecko-2-b-win2012-beta"), &AcceptAll);
        assert!(!decision.json_loads);
        assert!(!decision.shas_exist);
        assert!(!decision.valid);
        assert!(decision.deploy_requested);
    }

    #[test]
    fn evaluates_every_manifest_once() {
        let dir = TempDir::new().unwrap();
        let manifests = vec![
            write_manifest(&dir, "gecko-3-b-win2012-beta.json", MANIFEST),
            write_manifest(&dir, "gecko-1-b-win2012-beta.json", MANIFEST),
            write_manifest(&dir, "gecko-2-b-win2012-beta.json", "not json"),
        ];
        let commits = FixedMessage::new(Some(
            "bump\n\ndeploy: gecko-1-b-win2012-beta gecko-2-b-win2012-beta",
        ));

        let results = evaluate_all(&manifests, "23b390b", &commits, &AcceptAll);
        assert_eq!(commits.calls.load(Ordering::SeqCst), 3);
        let summary: Vec<_> = results
            .iter()
            .map(|d| (d.worker_type.as_str(), d.valid, d.deploy_requested))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("gecko-1-b-win2012-beta", true, true),
                ("gecko-2-b-win2012-beta", false, true),
                ("gecko-3-b-win2012-beta", true, false),
            ]
        );
    }

    #[test]
    fn no_manifests_no_results() {
        let commits = FixedMessage::new(None);
        assert!(evaluate_all(&[], "23b390b", &commits, &AcceptAll).is_empty());
        assert_eq!(commits.calls.load(Ordering::SeqCst), 0);
    }
}
