mod cmd;
mod output;
mod root;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use occ_core::config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "occ",
    about = "Deploy and rollback decisions for OpenCloudConfig worker types",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .occ/ or .git/)
    #[arg(long, global = true, env = "OCC_ROOT")]
    root: Option<PathBuf>,

    /// Config file (default: <root>/.occ/config.yaml when present)
    #[arg(long, global = true, env = "OCC_CONFIG")]
    config: Option<PathBuf>,

    /// Taskcluster proxy host for secrets and provisioner calls
    #[arg(long, global = true, env = "TC_PROXY")]
    tc_proxy: Option<String>,

    /// GitHub token for commit lookups
    #[arg(long, global = true, env = "GH_TOKEN", hide_env_values = true)]
    gh_token: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate worker-type manifests and report which may be deployed
    Deploy {
        /// Commit that triggered the run
        #[arg(long, env = "GITHUB_HEAD_SHA")]
        sha: Option<String>,

        /// Manifest glob relative to the root (repeatable; overrides config)
        #[arg(long = "manifest-glob", value_name = "GLOB")]
        manifest_globs: Vec<String>,

        /// Look every pinned sha512 up in tooltool
        #[arg(long)]
        verify_tooltool: bool,
    },

    /// Roll a worker type back to the images of an earlier commit
    Rollback {
        /// Commit whose message carries the rollback instruction
        #[arg(long, env = "GITHUB_HEAD_SHA")]
        sha: Option<String>,

        /// Use this text instead of fetching the commit message
        #[arg(long)]
        message: Option<String>,

        /// Submit the new region config to the provisioner
        #[arg(long)]
        apply: bool,
    },

    /// List published worker images
    Images {
        /// Worker type (omit to use the configured name patterns)
        worker_type: Option<String>,

        /// Region to query (repeatable; overrides config)
        #[arg(long = "region", value_name = "REGION")]
        regions: Vec<String>,

        /// Only images whose sha prefix-matches this one
        #[arg(long)]
        sha: Option<String>,
    },

    /// Show the deploy and rollback instructions in a commit message
    Intent {
        /// Commit message text
        message: String,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy { .. } | Commands::Rollback { .. } | Commands::Images { .. } => {
            tracing::Level::INFO
        }
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = root::resolve_root(cli.root.as_deref());
    let mut config =
        Config::discover(&root, cli.config.as_deref()).context("failed to load config")?;
    if let Some(proxy) = cli.tc_proxy.filter(|p| !p.is_empty()) {
        config.taskcluster.proxy = proxy;
    }

    let ctx = cmd::Context {
        root,
        config,
        gh_token: cli.gh_token,
        json: cli.json,
    };

    match cli.command {
        Commands::Deploy {
            sha,
            manifest_globs,
            verify_tooltool,
        } => cmd::deploy::run(&ctx, sha, manifest_globs, verify_tooltool),
        Commands::Rollback {
            sha,
            message,
            apply,
        } => cmd::rollback::run(&ctx, sha, message, apply),
        Commands::Images {
            worker_type,
            regions,
            sha,
        } => cmd::images::run(&ctx, worker_type, regions, sha),
        Commands::Intent { message } => cmd::intent::run(&ctx, &message),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    }
}
