use crate::error::{ClarityError, Result};
use crate::paths;
use crate::types::PlannedTask;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ProjectRecord
// ---------------------------------------------------------------------------

/// The accumulated answer-set for one project being clarified.
///
/// Mutated only through stage handlers; persisted whole after every accepted
/// submission. On-disk keys are camelCase (`mvpFeatures`, `fileMap`, ...)
/// and this struct is the complete schema; no extra keys are written.
///
/// List fields are not deduplicated here: replace-semantics stages
/// (`tech_stack`, `file_map`, `tasks`) rebuild their field on every
/// submission, and that is the only uniqueness anyone gets. `decisions` keys
/// usually mirror `tech_stack` entries, but orphaned keys are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRecord {
    pub name: String,
    pub description: String,
    pub purpose: String,
    pub goals: Vec<String>,
    pub mvp_features: Vec<String>,
    pub excluded_features: Vec<String>,
    pub constraints: Vec<String>,
    pub target_user: String,
    pub tech_stack: Vec<String>,
    pub decisions: BTreeMap<String, String>,
    pub file_map: BTreeMap<String, String>,
    pub tasks: Vec<PlannedTask>,
}

impl ProjectRecord {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        paths::validate_name(&name)?;
        Ok(Self {
            name,
            ..Self::default()
        })
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn exists(root: &Path, name: &str) -> bool {
        paths::project_path(root, name).exists()
    }

    pub fn load(root: &Path, name: &str) -> Result<Self> {
        let path = paths::project_path(root, name);
        if !path.exists() {
            return Err(ClarityError::ProjectNotFound(name.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let record: ProjectRecord = serde_json::from_str(&data)?;
        Ok(record)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::project_path(root, &self.name);
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Names of all projects under `root/.clarity/`, sorted.
    pub fn list(root: &Path) -> Result<Vec<String>> {
        let dir = paths::clarity_dir(root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    // ---------------------------------------------------------------------------
    // Summaries
    // ---------------------------------------------------------------------------

    /// Compact textual summary fed to the assisted transition prompt.
    pub fn summary(&self) -> String {
        format!(
            "description: {}\ngoals: {} defined\nmvp features: {} defined\n\
             excluded features: {} defined\ntech stack: {}\nfile map: {} entries\ntasks: {} planned",
            if self.description.is_empty() {
                "not provided"
            } else {
                self.description.as_str()
            },
            self.goals.len(),
            self.mvp_features.len(),
            self.excluded_features.len(),
            if self.tech_stack.is_empty() {
                "not chosen".to_string()
            } else {
                self.tech_stack.join(", ")
            },
            self.file_map.len(),
            self.tasks.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
