use std::path::{Path, PathBuf};

/// Resolve the repository root that manifest globs and `.occ/config.yaml`
/// are relative to.
///
/// Priority:
/// 1. `--root` flag / `OCC_ROOT` env var
/// 2. nearest ancestor of the cwd containing `.occ/`
/// 3. nearest ancestor of the cwd containing `.git/`
/// 4. the cwd
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marked_ancestor(&cwd, occ_core::paths::OCC_DIR)
        .or_else(|| find_marked_ancestor(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_marked_ancestor(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
