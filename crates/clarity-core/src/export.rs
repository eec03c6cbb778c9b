use crate::error::Result;
use crate::io::atomic_write;
use crate::paths;
use crate::record::ProjectRecord;
use crate::types::PlannedTask;
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Writes the scaffolding artifacts for a finished clarification run:
/// `README.md`, `.plan.yml`, `architecture.md`, and the `.clarity/` JSON
/// snapshot. Output is best-effort human-readable; nothing reads these files
/// back.
pub struct Exporter<'a> {
    root: &'a Path,
}

#[derive(Serialize)]
struct PlanFile<'a> {
    plan: &'a [PlannedTask],
}

impl<'a> Exporter<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    pub fn export(&self, record: &ProjectRecord) -> Result<()> {
        record.save(self.root)?;
        self.export_plan(record)?;
        self.export_readme(record)?;
        self.export_architecture(record)?;
        Ok(())
    }

    fn export_plan(&self, record: &ProjectRecord) -> Result<()> {
        let data = serde_yaml::to_string(&PlanFile {
            plan: &record.tasks,
        })?;
        atomic_write(&paths::plan_path(self.root), data.as_bytes())
    }

    fn export_readme(&self, record: &ProjectRecord) -> Result<()> {
        let mut out = format!("# {}\n\n", record.name);
        if !record.description.is_empty() {
            out.push_str(&record.description);
            out.push_str("\n\n");
        }
        if !record.purpose.is_empty() {
            out.push_str(&record.purpose);
            out.push_str("\n\n");
        }

        out.push_str("## Features (MVP)\n\n");
        for feature in &record.mvp_features {
            out.push_str(&format!("- {feature}\n"));
        }

        if !record.tech_stack.is_empty() {
            out.push_str("\n## Tech Stack\n\n");
            for tech in &record.tech_stack {
                out.push_str(&format!("- {tech}\n"));
            }
        }
        if !record.excluded_features.is_empty() {
            out.push_str("\n## Not Included\n\n");
            for feature in &record.excluded_features {
                out.push_str(&format!("- {feature}\n"));
            }
        }
        if !record.file_map.is_empty() {
            out.push_str("\n## Project Structure\n\n");
            for (path, desc) in &record.file_map {
                out.push_str(&format!("- `{path}`: {desc}\n"));
            }
        }

        out.push_str("\n> Generated by clarity.\n");
        atomic_write(&paths::readme_path(self.root), out.as_bytes())
    }

    fn export_architecture(&self, record: &ProjectRecord) -> Result<()> {
        let mut out = format!("# {} — Architecture\n\n## Overview\n\n", record.name);
        if !record.description.is_empty() {
            out.push_str(&record.description);
            out.push('\n');
        }

        out.push_str("\n## Design Decisions\n\n");
        for (decision, reasoning) in &record.decisions {
            out.push_str(&format!("### {decision}\n\n{reasoning}\n\n"));
        }

        if !record.file_map.is_empty() {
            out.push_str("## File Structure\n\n");
            for (path, desc) in &record.file_map {
                out.push_str(&format!("- `{path}`: {desc}\n"));
            }
        }
        atomic_write(&paths::architecture_path(self.root), out.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ProjectRecord {
        let mut record = ProjectRecord::new("demo").unwrap();
        record.description = "A task tracker for small teams".to_string();
        record.mvp_features = vec!["task lists".to_string()];
        record.excluded_features = vec!["no billing".to_string()];
        record.tech_stack = vec!["React".to_string(), "Node.js".to_string()];
        record
            .decisions
            .insert("React".to_string(), "popular".to_string());
        record
            .file_map
            .insert("src/app.jsx".to_string(), "entry point".to_string());
        record.tasks.push(PlannedTask {
            title: "Setup repo".to_string(),
            file: "README.md".to_string(),
            estimate: "0.5h".to_string(),
            priority: 1,
        });
        record
    }

    #[test]
    fn export_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        Exporter::new(dir.path()).export(&sample()).unwrap();

        for file in ["README.md", ".plan.yml", "architecture.md", ".clarity/demo.json"] {
            let path = dir.path().join(file);
            assert!(path.exists(), "missing {file}");
            assert!(!std::fs::read_to_string(&path).unwrap().is_empty());
        }
    }

    #[test]
    fn readme_lists_features_and_exclusions() {
        let dir = TempDir::new().unwrap();
        Exporter::new(dir.path()).export(&sample()).unwrap();

        let readme = std::fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.contains("# demo"));
        assert!(readme.contains("- task lists"));
        assert!(readme.contains("## Not Included"));
        assert!(readme.contains("- no billing"));
        assert!(readme.contains("`src/app.jsx`"));
    }

    #[test]
    fn plan_yaml_parses_back() {
        let dir = TempDir::new().unwrap();
        Exporter::new(dir.path()).export(&sample()).unwrap();

        let plan = std::fs::read_to_string(dir.path().join(".plan.yml")).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&plan).unwrap();
        let tasks = parsed.get("plan").unwrap().as_sequence().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].get("title").unwrap(), "Setup repo");
    }

    #[test]
    fn architecture_lists_decisions() {
        let dir = TempDir::new().unwrap();
        Exporter::new(dir.path()).export(&sample()).unwrap();

        let arch = std::fs::read_to_string(dir.path().join("architecture.md")).unwrap();
        assert!(arch.contains("### React"));
        assert!(arch.contains("popular"));
    }
}
