use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Raw image description as returned by the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub image_id: String,
    pub name: String,
    pub creation_date: String,
}

/// A published worker image, keyed by the git SHA it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    pub creation_date: String,
    pub image_id: String,
    pub worker_type: String,
    pub git_sha: String,
    pub region: String,
}

/// Source of image and security-group descriptions, one region at a time.
pub trait ImageCatalog {
    fn describe_images(
        &self,
        region: &str,
        owners: &[String],
        name_patterns: &[String],
    ) -> Result<Vec<ImageSummary>>;

    fn describe_security_groups(&self, region: &str, group_names: &[String])
        -> Result<Vec<String>>;
}

/// Split an image name of the form `<workerType> version <gitSha>`.
///
/// The worker type is the first whitespace-separated token and the SHA the
/// last; a name with fewer than two tokens does not describe a worker image.
pub fn parse_image_name(name: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    Some((tokens[0].to_string(), tokens[tokens.len() - 1].to_string()))
}

impl Image {
    pub fn from_summary(summary: &ImageSummary, region: &str) -> Option<Self> {
        let (worker_type, git_sha) = parse_image_name(&summary.name)?;
        Some(Self {
            creation_date: summary.creation_date.clone(),
            image_id: summary.image_id.clone(),
            worker_type,
            git_sha,
            region: region.to_string(),
        })
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.creation_date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Order by creation instant. Unparseable dates fall back to comparing
    /// the raw strings.
    pub fn cmp_created(&self, other: &Image) -> Ordering {
        match (self.created_at(), other.created_at()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.creation_date.cmp(&other.creation_date),
        }
    }

    fn newer_than(&self, other: &Image) -> bool {
        self.cmp_created(other) == Ordering::Greater
    }
}

/// Name filter selecting every image of one worker type.
pub fn worker_type_pattern(worker_type: &str) -> String {
    format!("{worker_type} version *")
}

/// Enumerate images across `regions` owned by `owner` and matching any of
/// `name_patterns`.
pub fn list_images(
    catalog: &dyn ImageCatalog,
    owner: &str,
    regions: &[String],
    name_patterns: &[String],
) -> Result<Vec<Image>> {
    let owners = vec![owner.to_string()];
    let mut images = Vec::new();
    for region in regions {
        let summaries = catalog.describe_images(region, &owners, name_patterns)?;
        tracing::debug!(region = %region, count = summaries.len(), "described images");
        for summary in &summaries {
            match Image::from_summary(summary, region) {
                Some(image) => images.push(image),
                None => tracing::warn!(
                    region = %region,
                    image_id = %summary.image_id,
                    name = %summary.name,
                    "skipping image with unparseable name"
                ),
            }
        }
    }
    Ok(images)
}

/// True when either SHA is a prefix of the other, ignoring ASCII case.
pub fn sha_matches(image_sha: &str, requested: &str) -> bool {
    let image_sha = image_sha.to_ascii_lowercase();
    let requested = requested.to_ascii_lowercase();
    image_sha.starts_with(&requested) || requested.starts_with(&image_sha)
}

pub fn filter_by_sha<'a>(images: &'a [Image], sha: &'a str) -> impl Iterator<Item = &'a Image> {
    images.iter().filter(move |i| sha_matches(&i.git_sha, sha))
}

/// Distinct SHAs present in `images`, sorted.
pub fn available_shas(images: &[Image]) -> Vec<String> {
    images
        .iter()
        .map(|i| i.git_sha.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One image per region: the most recently created among `images`.
/// Ties keep the later entry.
pub fn newest_per_region<'a, I>(images: I) -> BTreeMap<String, &'a Image>
where
    I: IntoIterator<Item = &'a Image>,
{
    let mut by_region: BTreeMap<String, &'a Image> = BTreeMap::new();
    for image in images {
        match by_region.get(&image.region) {
            Some(existing) if existing.newer_than(image) => {}
            _ => {
                by_region.insert(image.region.clone(), image);
            }
        }
    }
    by_region
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog keyed by region.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub images: HashMap<String, Vec<ImageSummary>>,
        pub groups: HashMap<String, Vec<(String, String)>>,
        pub image_calls: Mutex<Vec<(String, Vec<String>, Vec<String>)>>,
    }

    impl FakeCatalog {
        pub fn with_image(mut self, region: &str, id: &str, name: &str, created: &str) -> Self {
            self.images
                .entry(region.to_string())
                .or_default()
                .push(ImageSummary {
                    image_id: id.to_string(),
                    name: name.to_string(),
                    creation_date: created.to_string(),
                });
            self
        }

        pub fn with_group(mut self, region: &str, name: &str, id: &str) -> Self {
            self.groups
                .entry(region.to_string())
                .or_default()
                .push((name.to_string(), id.to_string()));
            self
        }
    }

    fn glob_match(pattern: &str, name: &str) -> bool {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    }

    impl ImageCatalog for FakeCatalog {
        fn describe_images(
            &self,
            region: &str,
            owners: &[String],
            name_patterns: &[String],
        ) -> Result<Vec<ImageSummary>> {
            self.image_calls.lock().unwrap().push((
                region.to_string(),
                owners.to_vec(),
                name_patterns.to_vec(),
            ));
            Ok(self
                .images
                .get(region)
                .map(|v| {
                    v.iter()
                        .filter(|s| name_patterns.iter().any(|p| glob_match(p, &s.name)))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        }

        fn describe_security_groups(
            &self,
            region: &str,
            group_names: &[String],
        ) -> Result<Vec<String>> {
            Ok(self
                .groups
                .get(region)
                .map(|v| {
                    v.iter()
                        .filter(|(name, _)| group_names.contains(name))
                        .map(|(_, id)| id.clone())
                        .collect()
                })
                .unwrap_or_default())
        }
    }
}
