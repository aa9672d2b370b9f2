use super::Context;
use crate::output::{print_json, print_table};
use occ_core::image::{self, Image};

pub fn run(
    ctx: &Context,
    worker_type: Option<String>,
    regions: Vec<String>,
    sha: Option<String>,
) -> anyhow::Result<()> {
    let regions = if regions.is_empty() {
        ctx.config.aws.regions.clone()
    } else {
        regions
    };
    let patterns = match &worker_type {
        Some(wt) => vec![image::worker_type_pattern(wt)],
        None => ctx.config.aws.image_name_patterns.clone(),
    };

    let (catalog, creds) = ctx.catalog()?;
    let mut images = image::list_images(&catalog, &creds.owner(), &regions, &patterns)?;
    if let Some(sha) = &sha {
        images.retain(|i| image::sha_matches(&i.git_sha, sha));
    }
    // Newest first within each worker type and region.
    images.sort_by(|a, b| {
        a.worker_type
            .cmp(&b.worker_type)
            .then_with(|| a.region.cmp(&b.region))
            .then_with(|| b.cmp_created(a))
    });

    if ctx.json {
        return print_json(&images);
    }
    print_images(&images);
    Ok(())
}

fn print_images(images: &[Image]) {
    if images.is_empty() {
        println!("no images found");
        return;
    }
    let rows: Vec<Vec<String>> = images
        .iter()
        .map(|i| {
            vec![
                i.worker_type.clone(),
                i.region.clone(),
                i.image_id.clone(),
                i.git_sha.clone(),
                i.creation_date.clone(),
            ]
        })
        .collect();
    print_table(&["WORKER TYPE", "REGION", "IMAGE", "SHA", "CREATED"], &rows);
}
