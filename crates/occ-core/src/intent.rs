//! Commit-message grammar for deploy and rollback requests.
//!
//! ```text
//! deploy: gecko-1-b-win2012 gecko-2-b-win2012
//! rollback: gecko-1-b-win2012 23b390b
//! ```
//!
//! Both tokens are matched case-insensitively anywhere in the message.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static DEPLOY_RE: OnceLock<Regex> = OnceLock::new();
static ROLLBACK_RE: OnceLock<Regex> = OnceLock::new();

fn deploy_re() -> &'static Regex {
    DEPLOY_RE.get_or_init(|| Regex::new(r"(?i)deploy:( )?([- a-z0-9]*)").unwrap())
}

fn rollback_re() -> &'static Regex {
    ROLLBACK_RE.get_or_init(|| {
        Regex::new(
            r"(?i)rollback: (gecko-[123]-b-win2012(-beta)?|gecko-t-win(7-32|10-64)(-[^ ])?) ([0-9a-f]{7,40})",
        )
        .unwrap()
    })
}

/// A request to return `worker_type` to the images built from `sha`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub worker_type: String,
    pub sha: String,
}

/// Worker types listed after the first `deploy:` token, in message order.
pub fn deploy_targets(message: &str) -> Vec<String> {
    deploy_re()
        .captures(message)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Whether the commit message authorizes a deployment of `worker_type`.
///
/// A missing message (failed commit lookup) never authorizes anything.
pub fn deploy_requested(worker_type: &str, message: Option<&str>) -> bool {
    let Some(message) = message else {
        return false;
    };
    deploy_targets(message).iter().any(|t| t == worker_type)
}

pub fn rollback_request(message: &str) -> Option<RollbackRequest> {
    let caps = rollback_re().captures(message)?;
    Some(RollbackRequest {
        worker_type: caps.get(1)?.as_str().to_string(),
        sha: caps.get(5)?.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_extracts_worker_type_and_sha() {
        let req = rollback_request("rollback: gecko-1-b-win2012 23b390b").unwrap();
        assert_eq!(req.worker_type, "gecko-1-b-win2012");
        assert_eq!(req.sha, "23b390b");
    }

    #[test]
    fn rollback_found_after_other_lines() {
        let msg = "fix the thing\n\nrollback: gecko-2-b-win2012-beta 23b390b1234abcd";
        let req = rollback_request(msg).unwrap();
        assert_eq!(req.worker_type, "gecko-2-b-win2012-beta");
        assert_eq!(req.sha, "23b390b1234abcd");
    }

    #[test]
    fn rollback_without_token_is_none() {
        assert!(rollback_request("gecko-1-b-win2012 23b390b").is_none());
        assert!(rollback_request("deploy: gecko-1-b-win2012").is_none());
    }

    #[test]
    fn rollback_is_case_insensitive() {
        let req = rollback_request("Rollback: GECKO-3-B-WIN2012 23B390B").unwrap();
        assert_eq!(req.worker_type, "GECKO-3-B-WIN2012");
        assert_eq!(req.sha, "23B390B");
    }

    #[test]
    fn rollback_accepts_tester_worker_types() {
        let req = rollback_request("rollback: gecko-t-win10-64 abcdef0").unwrap();
        assert_eq!(req.worker_type, "gecko-t-win10-64");

        let req = rollback_request("rollback: gecko-t-win7-32-g abcdef0").unwrap();
        assert_eq!(req.worker_type, "gecko-t-win7-32-g");
    }

    #[test]
    fn rollback_rejects_unknown_worker_type() {
        assert!(rollback_request("rollback: gecko-4-b-win2012 23b390b").is_none());
        assert!(rollback_request("rollback: linux-builder 23b390b").is_none());
    }

    #[test]
    fn rollback_rejects_short_sha() {
        assert!(rollback_request("rollback: gecko-1-b-win2012 23b390").is_none());
    }

    #[test]
    fn deploy_authorizes_listed_types_only() {
        let msg = "deploy: gecko-1-b-win2012 gecko-2-b-win2012";
        assert!(deploy_requested("gecko-1-b-win2012", Some(msg)));
        assert!(deploy_requested("gecko-2-b-win2012", Some(msg)));
        assert!(!deploy_requested("gecko-3-b-win2012", Some(msg)));
        assert!(!deploy_requested("gecko-1-b-win2012-beta", Some(msg)));
    }

    #[test]
    fn deploy_without_space_after_colon() {
        let msg = "Deploy:gecko-1-b-win2012";
        assert_eq!(deploy_targets(msg), vec!["gecko-1-b-win2012"]);
    }

    #[test]
    fn deploy_list_stops_at_line_end() {
        let msg = "deploy: gecko-1-b-win2012\ngecko-2-b-win2012";
        assert_eq!(deploy_targets(msg), vec!["gecko-1-b-win2012"]);
    }

    #[test]
    fn deploy_with_no_message_is_false() {
        assert!(!deploy_requested("gecko-1-b-win2012", None));
        assert!(deploy_targets("nothing here").is_empty());
    }
}
