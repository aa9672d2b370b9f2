use super::Context;
use crate::output::print_json;
use occ_core::intent;
use serde_json::json;

/// Show what a commit message asks for, without contacting any service.
pub fn run(ctx: &Context, message: &str) -> anyhow::Result<()> {
    let deploy = intent::deploy_targets(message);
    let rollback = intent::rollback_request(message);

    if ctx.json {
        return print_json(&json!({
            "deploy": deploy,
            "rollback": rollback,
        }));
    }

    if deploy.is_empty() {
        println!("deploy: none");
    } else {
        println!("deploy: {}", deploy.join(" "));
    }
    match rollback {
        Some(r) => println!("rollback: {} to {}", r.worker_type, r.sha),
        None => println!("rollback: none"),
    }
    Ok(())
}
