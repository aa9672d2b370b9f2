use super::Context;
use crate::output::{print_json, print_table, yes_no};
use anyhow::Context as _;
use occ_core::deploy::{self, DeployDecision};
use occ_core::http;
use occ_core::tooltool::{AcceptAll, ArtifactCheck, TooltoolClient};

pub fn run(
    ctx: &Context,
    sha: Option<String>,
    manifest_globs: Vec<String>,
    verify_tooltool: bool,
) -> anyhow::Result<()> {
    let sha = sha.context("environment variable GITHUB_HEAD_SHA not found")?;

    let globs = if manifest_globs.is_empty() {
        ctx.config.deploy.manifest_globs.clone()
    } else {
        manifest_globs
    };
    let manifests = deploy::find_manifests(&ctx.root, &globs)?;
    if manifests.is_empty() {
        tracing::warn!(root = %ctx.root.display(), "no manifests matched {}", globs.join(", "));
    }

    let check: Box<dyn ArtifactCheck> = if verify_tooltool {
        let token = ctx
            .secrets()?
            .tooltool_token(&ctx.config.taskcluster.tooltool_secret)
            .context("failed to fetch tooltool token")?;
        Box::new(TooltoolClient::new(
            http::client(ctx.config.http_timeout_secs)?,
            &ctx.config.deploy.tooltool_url,
            Some(token),
        ))
    } else {
        Box::new(AcceptAll)
    };

    let commits = ctx.commits()?;
    let results = deploy::evaluate_all(&manifests, &sha, &commits, check.as_ref());

    if ctx.json {
        print_json(&results)?;
    } else {
        print_decisions(&results);
    }
    Ok(())
}

fn print_decisions(results: &[DeployDecision]) {
    if results.is_empty() {
        println!("no manifests evaluated");
        return;
    }
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|d| {
            vec![
                d.worker_type.clone(),
                yes_no(d.valid),
                yes_no(d.json_loads),
                yes_no(d.shas_exist),
                yes_no(d.deploy_requested),
            ]
        })
        .collect();
    print_table(&["WORKER TYPE", "VALID", "JSON", "SHAS", "DEPLOY"], &rows);
}
