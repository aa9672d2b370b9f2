use super::Context;
use crate::output::print_json;
use anyhow::Context as _;
use occ_core::intent;
use occ_core::rollback::{self, RollbackOutcome, RollbackSettings, Submission};
use serde_json::json;

pub fn run(
    ctx: &Context,
    sha: Option<String>,
    message: Option<String>,
    apply: bool,
) -> anyhow::Result<()> {
    let message = match (message, sha) {
        (Some(m), _) => m,
        (None, Some(sha)) => ctx
            .commits()?
            .commit_message(&sha)
            .with_context(|| format!("failed to resolve commit {sha}"))?
            .unwrap_or_default(),
        (None, None) => {
            tracing::warn!("environment variable GITHUB_HEAD_SHA not found");
            return report(ctx, &RollbackOutcome::NotRequested, None);
        }
    };

    let Some(request) = intent::rollback_request(&message) else {
        tracing::info!("rollback request not detected in commit syntax");
        return report(ctx, &RollbackOutcome::NotRequested, None);
    };

    let (catalog, creds) = ctx.catalog()?;
    let settings = RollbackSettings {
        owner: creds.owner(),
        regions: ctx.config.aws.regions.clone(),
        security_groups: ctx.config.aws.security_groups.clone(),
    };
    let outcome = rollback::plan_for_request(request, &catalog, &settings)?;
    let submission = match &outcome {
        RollbackOutcome::Planned { .. } => {
            rollback::submit(&ctx.provisioner()?, &outcome, apply)
                .context("failed to update worker type definition")?
        }
        _ => None,
    };
    if submission.is_some() && !apply {
        tracing::info!("pass --apply to submit the new config");
    }

    report(ctx, &outcome, submission.as_ref())
}

fn report(
    ctx: &Context,
    outcome: &RollbackOutcome,
    submission: Option<&Submission>,
) -> anyhow::Result<()> {
    let old_regions = submission.map(|s| &s.old_regions);
    let applied = submission.is_some_and(|s| s.applied);
    if ctx.json {
        return print_json(&json!({
            "outcome": outcome,
            "old_regions": old_regions,
            "applied": applied,
        }));
    }

    match outcome {
        RollbackOutcome::NotRequested => {
            println!("rollback request not detected in commit syntax.");
        }
        RollbackOutcome::Aborted {
            request,
            available_shas,
        } => {
            println!("rollback available for shas: {}", available_shas.join(", "));
            println!(
                "rollback aborted. no amis found matching worker type: {}, and git sha: {}",
                request.worker_type, request.sha
            );
        }
        RollbackOutcome::Planned {
            request,
            available_shas,
            regions,
        } => {
            println!("rollback available for shas: {}", available_shas.join(", "));
            println!(
                "rollback {} for worker type: {} to amis with git sha: {}",
                if applied { "applied" } else { "planned" },
                request.worker_type,
                request.sha
            );
            if let Some(old) = old_regions {
                println!("old config");
                println!("{}", serde_json::to_string_pretty(old)?);
            }
            println!("new config");
            println!("{}", serde_json::to_string_pretty(regions)?);
        }
    }
    Ok(())
}
