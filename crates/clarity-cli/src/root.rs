use std::path::{Path, PathBuf};

/// Resolve the workspace root.
///
/// Priority: `--root` flag / `CLARITY_ROOT` env var, then the nearest
/// ancestor containing `.clarity/`, then the nearest containing `.git/`,
/// then the current directory.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    for marker in [".clarity", ".git"] {
        if let Some(found) = find_up(&cwd, marker) {
            return found;
        }
    }
    cwd
}

fn find_up(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(marker).is_dir() {
            return Some(dir);
        }
        dir = dir.parent()?.to_path_buf();
    }
}
