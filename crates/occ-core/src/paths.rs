use std::path::{Path, PathBuf};

pub const OCC_DIR: &str = ".occ";
pub const CONFIG_FILE: &str = ".occ/config.yaml";

/// Per-user AWS shared credentials file, relative to the home directory.
pub const AWS_CREDENTIALS_FILE: &str = ".aws/credentials";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn aws_credentials_path(home: &Path) -> PathBuf {
    home.join(AWS_CREDENTIALS_FILE)
}

/// The credentials file for the current user, if a home directory is known.
pub fn user_aws_credentials() -> Option<PathBuf> {
    home::home_dir().map(|h| aws_credentials_path(&h))
}

/// Worker type named by a manifest file: its stem.
pub fn worker_type_from_manifest(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
