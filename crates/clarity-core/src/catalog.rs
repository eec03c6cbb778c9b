use crate::error::{ClarityError, Result};
use crate::paths;
use crate::types::StageId;
use crate::validator::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// StageDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: StageId,
    pub label: String,
    pub purpose: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub retryable: bool,
    #[serde(default)]
    pub skippable: bool,
    /// Config-only flag carried from the catalog file; the web-search helper
    /// itself is outside this crate.
    #[serde(default)]
    pub web_search_enabled: bool,
    #[serde(default)]
    pub validation_rules: Vec<Rule>,
    /// Static transition target. `None` marks the terminal stage.
    #[serde(default)]
    pub default_next: Option<StageId>,
    /// Field whose text the validator scores. When absent, validation sees
    /// every submitted value concatenated with newlines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_field: Option<String>,
}

// ---------------------------------------------------------------------------
// StageCatalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCatalog {
    #[serde(default = "default_start")]
    start: StageId,
    stages: Vec<StageDefinition>,
}

fn default_start() -> StageId {
    StageId::Start
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self {
            start: StageId::Start,
            stages: builtin_stages(),
        }
    }
}

impl StageCatalog {
    /// Load `root/.clarity/stages.yaml` when present, else the compiled-in
    /// defaults. Either way the catalog is validated before use.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::stages_path(root);
        let catalog = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            Self::default()
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn reload(&mut self, root: &Path) -> Result<()> {
        *self = Self::load(root)?;
        Ok(())
    }

    pub fn start(&self) -> StageId {
        self.start
    }

    pub fn get(&self, id: StageId) -> Result<&StageDefinition> {
        self.stages
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ClarityError::UnknownStage(id.to_string()))
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Static transition rule: follow `default_next`. `Ok(None)` is the
    /// terminal sentinel.
    pub fn next_static(&self, from: StageId) -> Result<Option<StageId>> {
        let def = self.get(from)?;
        match def.default_next {
            Some(next) => {
                // A link to an id missing from the catalog is a config error.
                self.get(next).map_err(|_| ClarityError::UndefinedTransition {
                    from: from.to_string(),
                    to: next.to_string(),
                })?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    /// Walk `default_next` links from the start stage. Revisiting an id means
    /// the static chain loops, which is a configuration error rather than
    /// something to iterate through.
    pub fn get_order(&self) -> Result<Vec<StageId>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(self.start);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(ClarityError::TransitionCycle(id.to_string()));
            }
            order.push(id);
            current = self.next_static(id)?;
        }
        Ok(order)
    }

    /// Fatal-at-startup checks: the start stage exists, every link resolves,
    /// and the chain terminates.
    fn validate(&self) -> Result<()> {
        self.get(self.start)
            .map_err(|_| ClarityError::MissingStartStage(self.start.to_string()))?;
        self.get_order()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in stage chain
// ---------------------------------------------------------------------------

fn stage(
    id: StageId,
    label: &str,
    purpose: &str,
    rules: Vec<Rule>,
    next: Option<StageId>,
    primary_field: Option<&str>,
) -> StageDefinition {
    StageDefinition {
        id,
        label: label.to_string(),
        purpose: purpose.to_string(),
        optional: false,
        retryable: true,
        skippable: false,
        web_search_enabled: false,
        validation_rules: rules,
        default_next: next,
        primary_field: primary_field.map(str::to_string),
    }
}

fn builtin_stages() -> Vec<StageDefinition> {
    vec![
        stage(
            StageId::Start,
            "Starting Project",
            "Initializing project",
            vec![],
            Some(StageId::ClarifyIntent),
            None,
        ),
        stage(
            StageId::ClarifyIntent,
            "Project Intent",
            "Let's clarify what you are building and why.",
            vec![Rule::MinWords {
                threshold: 3,
                message: None,
            }],
            Some(StageId::NotBuilder),
            Some("description"),
        ),
        stage(
            StageId::NotBuilder,
            "Scope Reduction",
            "Let's identify what will NOT be included in the MVP to keep the scope focused.",
            vec![
                Rule::MinWords {
                    threshold: 2,
                    message: None,
                },
                Rule::MinExclusions {
                    threshold: 1,
                    message: None,
                },
            ],
            Some(StageId::MvpScoper),
            Some("excluded_features"),
        ),
        stage(
            StageId::MvpScoper,
            "MVP Feature Scoping",
            "Now, let's define the core features that will be included in the MVP.",
            vec![Rule::MinFeatures {
                threshold: 2,
                message: None,
            }],
            Some(StageId::StackSelector),
            Some("mvp_features"),
        ),
        {
            let mut def = stage(
                StageId::StackSelector,
                "Technology Stack Selection",
                "Select the technologies you plan to use for this project.",
                vec![Rule::TechCompleteness {
                    categories: vec![
                        "frontend".to_string(),
                        "backend".to_string(),
                        "database".to_string(),
                    ],
                    message: None,
                }],
                Some(StageId::Reasoner),
                None,
            );
            def.web_search_enabled = true;
            def
        },
        stage(
            StageId::Reasoner,
            "Technology Decision Reasoning",
            "Explain the reasoning behind your technology choices.",
            vec![],
            Some(StageId::FileMapBuilder),
            None,
        ),
        stage(
            StageId::FileMapBuilder,
            "File Structure Mapping",
            "Map your features to a file structure. Each line: path/to/file.ext: Description",
            vec![],
            Some(StageId::TaskPlanner),
            Some("file_map"),
        ),
        stage(
            StageId::TaskPlanner,
            "Development Task Planning",
            "Break the project into atomic tasks. Format: Title: file/path.ext: Estimate: Priority (1-5)",
            vec![],
            Some(StageId::Export),
            Some("tasks"),
        ),
        stage(
            StageId::Export,
            "Export Project Files",
            "Your project planning is complete! Submit to export all files.",
            vec![],
            None,
            None,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_order_is_the_full_chain() {
        let order = StageCatalog::default().get_order().unwrap();
        assert_eq!(order.first(), Some(&StageId::Start));
        assert_eq!(order.last(), Some(&StageId::Export));
        assert_eq!(order.len(), 9);
    }

    #[test]
    fn terminal_stage_has_no_next() {
        let catalog = StageCatalog::default();
        assert_eq!(catalog.next_static(StageId::Export).unwrap(), None);
        assert_eq!(
            catalog.next_static(StageId::Start).unwrap(),
            Some(StageId::ClarifyIntent)
        );
    }

    #[test]
    fn cycle_is_a_configuration_error() {
        let mut catalog = StageCatalog::default();
        // Point the last stage back at the first.
        catalog
            .stages
            .iter_mut()
            .find(|s| s.id == StageId::Export)
            .unwrap()
            .default_next = Some(StageId::ClarifyIntent);

        assert!(matches!(
            catalog.get_order(),
            Err(ClarityError::TransitionCycle(_))
        ));
    }

    #[test]
    fn dangling_link_is_a_configuration_error() {
        let mut catalog = StageCatalog::default();
        // Drop the reasoner stage but leave the link to it in place.
        catalog.stages.retain(|s| s.id != StageId::Reasoner);

        assert!(matches!(
            catalog.get_order(),
            Err(ClarityError::UndefinedTransition { .. })
        ));
    }

    #[test]
    fn load_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let catalog = StageCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.start(), StageId::Start);
        assert_eq!(catalog.stages().len(), 9);
    }

    #[test]
    fn load_reads_stage_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".clarity")).unwrap();
        let yaml = r#"
start: clarify_intent
stages:
  - id: clarify_intent
    label: Intent
    purpose: What are we building?
    validation_rules:
      - type: min_words
        threshold: 5
    default_next: export
  - id: export
    label: Export
    purpose: Done.
"#;
        std::fs::write(dir.path().join(".clarity/stages.yaml"), yaml).unwrap();

        let catalog = StageCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.start(), StageId::ClarifyIntent);
        assert_eq!(
            catalog.get_order().unwrap(),
            vec![StageId::ClarifyIntent, StageId::Export]
        );
        let intent = catalog.get(StageId::ClarifyIntent).unwrap();
        assert_eq!(intent.validation_rules.len(), 1);
    }

    #[test]
    fn load_rejects_cyclic_stage_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".clarity")).unwrap();
        let yaml = r#"
start: clarify_intent
stages:
  - id: clarify_intent
    label: Intent
    purpose: Loops forever.
    default_next: clarify_intent
"#;
        std::fs::write(dir.path().join(".clarity/stages.yaml"), yaml).unwrap();
        assert!(StageCatalog::load(dir.path()).is_err());
    }

    #[test]
    fn reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let mut catalog = StageCatalog::load(dir.path()).unwrap();
        assert_eq!(catalog.stages().len(), 9);

        std::fs::create_dir_all(dir.path().join(".clarity")).unwrap();
        let yaml = r#"
start: export
stages:
  - id: export
    label: Export
    purpose: Done.
"#;
        std::fs::write(dir.path().join(".clarity/stages.yaml"), yaml).unwrap();
        catalog.reload(dir.path()).unwrap();
        assert_eq!(catalog.stages().len(), 1);
    }
}
