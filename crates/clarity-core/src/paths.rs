use crate::error::{ClarityError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CLARITY_DIR: &str = ".clarity";
pub const STAGES_FILE: &str = ".clarity/stages.yaml";

pub const README_MD: &str = "README.md";
pub const ARCHITECTURE_MD: &str = "architecture.md";
pub const PLAN_YML: &str = ".plan.yml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn clarity_dir(root: &Path) -> PathBuf {
    root.join(CLARITY_DIR)
}

/// One JSON file per project, keyed by project name. Two projects with the
/// same name overwrite each other; callers get no warning.
pub fn project_path(root: &Path, name: &str) -> PathBuf {
    clarity_dir(root).join(format!("{name}.json"))
}

pub fn stages_path(root: &Path) -> PathBuf {
    root.join(STAGES_FILE)
}

pub fn readme_path(root: &Path) -> PathBuf {
    root.join(README_MD)
}

pub fn architecture_path(root: &Path) -> PathBuf {
    root.join(ARCHITECTURE_MD)
}

pub fn plan_path(root: &Path) -> PathBuf {
    root.join(PLAN_YML)
}

// ---------------------------------------------------------------------------
// Project name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Project names double as file names under `.clarity/`, so they are held to
/// the same slug rule everywhere.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(ClarityError::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
