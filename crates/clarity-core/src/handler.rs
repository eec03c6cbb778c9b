use crate::catalog::StageDefinition;
use crate::error::Result;
use crate::record::ProjectRecord;
use crate::suggest::{suggested_file_structure, suggested_tasks, Suggester};
use crate::types::{FieldKind, PlannedTask, ResponseValue, StageId};
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// PromptData
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptData {
    pub title: String,
    pub description: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub id: String,
    pub question: String,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub current: ResponseValue,
}

impl Field {
    fn text(id: &str, question: &str, current: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            kind: FieldKind::Text,
            options: Vec::new(),
            current: ResponseValue::Text(current.into()),
        }
    }

    fn select(id: &str, question: &str, options: &[&str], current: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            kind: FieldKind::Select,
            options: options.iter().map(|s| s.to_string()).collect(),
            current: ResponseValue::Text(current.unwrap_or_default().to_string()),
        }
    }

    fn multi_select(id: &str, question: &str, options: &[&str], current: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            kind: FieldKind::MultiSelect,
            options: options.iter().map(|s| s.to_string()).collect(),
            current: ResponseValue::Choices(current),
        }
    }
}

/// Submitted responses for one stage, keyed by field id.
pub type Responses = BTreeMap<String, ResponseValue>;

// ---------------------------------------------------------------------------
// Stack option tables
// ---------------------------------------------------------------------------

pub const FRONTEND_OPTIONS: &[&str] = &[
    "React", "Vue", "Angular", "Next.js", "Svelte", "HTML/CSS/JS", "Other",
];
pub const BACKEND_OPTIONS: &[&str] = &[
    "Node.js",
    "Python/Flask",
    "Python/FastAPI",
    "Python/Django",
    "Java/Spring",
    "Go",
    "Ruby on Rails",
    "PHP",
    "Other",
];
pub const DATABASE_OPTIONS: &[&str] = &[
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "SQLite",
    "Firebase",
    "DynamoDB",
    "Supabase",
    "Other",
];
pub const AI_OPTIONS: &[&str] = &[
    "OpenAI API",
    "Hugging Face",
    "LangChain",
    "TensorFlow",
    "PyTorch",
    "Other",
];

// ---------------------------------------------------------------------------
// Prompt production
// ---------------------------------------------------------------------------

/// True for stages that collect input. Stages without input fields skip
/// validation entirely on submit.
pub fn has_input(stage: StageId) -> bool {
    !matches!(stage, StageId::Start | StageId::Export)
}

/// Build the UI-facing prompt for a stage. Infallible: suggestion calls are
/// best-effort and everything else is derived from the record.
pub fn prompt_for(
    def: &StageDefinition,
    record: &ProjectRecord,
    suggester: &Suggester<'_>,
) -> PromptData {
    let title = def.label.clone();
    match def.id {
        StageId::Start => PromptData {
            title,
            description: format!("{}: {}", def.purpose, record.name),
            fields: Vec::new(),
        },
        StageId::ClarifyIntent => PromptData {
            title,
            description: format!(
                "{}\n\nSuggested goals:\n{}",
                def.purpose,
                suggester.goals(record)
            ),
            fields: vec![
                Field::text(
                    "description",
                    "What are you building? Describe the project in a few sentences.",
                    record.description.clone(),
                ),
                Field::text(
                    "purpose",
                    "What problem does it solve? Why does it need to exist?",
                    record.purpose.clone(),
                ),
                Field::text(
                    "goals",
                    "What are the main goals? (One per line)",
                    record.goals.join("\n"),
                ),
            ],
        },
        StageId::NotBuilder => PromptData {
            title,
            description: format!(
                "{}\n\nCommonly excluded:\n{}",
                def.purpose,
                suggester.exclusions(record)
            ),
            fields: vec![
                Field::text(
                    "excluded_features",
                    "What features or capabilities will NOT be included in the MVP? (One per line)",
                    record.excluded_features.join("\n"),
                ),
                Field::text(
                    "constraints",
                    "Are there any constraints or limitations to consider? (One per line)",
                    record.constraints.join("\n"),
                ),
            ],
        },
        StageId::MvpScoper => PromptData {
            title,
            description: format!(
                "{}\n\nSuggested features:\n{}",
                def.purpose,
                suggester.mvp_features(record)
            ),
            fields: vec![
                Field::text(
                    "mvp_features",
                    "What are the essential features for the MVP? (One per line)",
                    record.mvp_features.join("\n"),
                ),
                Field::text(
                    "target_user",
                    "Who is the target user for this MVP?",
                    record.target_user.clone(),
                ),
            ],
        },
        StageId::StackSelector => {
            let in_stack = |options: &[&str]| {
                record
                    .tech_stack
                    .iter()
                    .find(|t| options.contains(&t.as_str()))
                    .map(String::as_str)
            };
            let ai_selected: Vec<String> = record
                .tech_stack
                .iter()
                .filter(|t| AI_OPTIONS.contains(&t.as_str()))
                .cloned()
                .collect();
            PromptData {
                title,
                description: format!(
                    "{}\n\nRecommendation:\n{}",
                    def.purpose,
                    suggester.stack(record)
                ),
                fields: vec![
                    Field::select(
                        "frontend",
                        "Frontend Technology",
                        FRONTEND_OPTIONS,
                        in_stack(FRONTEND_OPTIONS),
                    ),
                    Field::select(
                        "backend",
                        "Backend Technology",
                        BACKEND_OPTIONS,
                        in_stack(BACKEND_OPTIONS),
                    ),
                    Field::select(
                        "database",
                        "Database Technology",
                        DATABASE_OPTIONS,
                        in_stack(DATABASE_OPTIONS),
                    ),
                    Field::multi_select(
                        "ai_ml",
                        "AI/ML Technologies (if applicable)",
                        AI_OPTIONS,
                        ai_selected,
                    ),
                    Field::text("other_tech", "Other Technologies (comma separated)", ""),
                ],
            }
        }
        StageId::Reasoner => {
            let mut fields: Vec<Field> = record
                .tech_stack
                .iter()
                .enumerate()
                .map(|(i, tech)| {
                    Field::text(
                        &format!("reason_{i}"),
                        &format!("Why did you choose {tech}?"),
                        record.decisions.get(tech).cloned().unwrap_or_default(),
                    )
                })
                .collect();
            fields.push(Field::text(
                "additional_decisions",
                "Any other architectural decisions to document? (Format: Decision: Reasoning)",
                "",
            ));
            PromptData {
                title,
                description: def.purpose.clone(),
                fields,
            }
        }
        StageId::FileMapBuilder => {
            let existing: String = record
                .file_map
                .iter()
                .map(|(path, desc)| format!("{path}: {desc}\n"))
                .collect();
            PromptData {
                title,
                description: def.purpose.clone(),
                fields: vec![Field::text(
                    "file_map",
                    "File Structure (suggested structure below):",
                    format!("{}{}", suggested_file_structure(record), existing),
                )],
            }
        }
        StageId::TaskPlanner => {
            let existing: String = record
                .tasks
                .iter()
                .map(|t| format!("{}: {}: {}: {}\n", t.title, t.file, t.estimate, t.priority))
                .collect();
            PromptData {
                title,
                description: def.purpose.clone(),
                fields: vec![Field::text(
                    "tasks",
                    "Development Tasks:",
                    format!("{}{}", suggested_tasks(record), existing),
                )],
            }
        }
        StageId::Export => PromptData {
            title,
            description: def.purpose.clone(),
            fields: Vec::new(),
        },
    }
}

// ---------------------------------------------------------------------------
// Response application
// ---------------------------------------------------------------------------

/// Mutate `record` with a stage's accepted responses. The engine calls this
/// on a scratch clone and commits only on `Ok`, so partial mutation here can
/// never leak into the live record.
pub fn apply(stage: StageId, record: &mut ProjectRecord, responses: &Responses) -> Result<()> {
    match stage {
        StageId::Start | StageId::Export => {}
        StageId::ClarifyIntent => {
            if let Some(text) = text_of(responses, "description") {
                record.description = text.trim().to_string();
            }
            if let Some(text) = text_of(responses, "purpose") {
                record.purpose = text.trim().to_string();
            }
            if let Some(text) = text_of(responses, "goals") {
                record.goals = list_lines(text);
            }
        }
        StageId::NotBuilder => {
            if let Some(text) = text_of(responses, "excluded_features") {
                record.excluded_features = list_lines(text);
            }
            if let Some(text) = text_of(responses, "constraints") {
                record.constraints = list_lines(text);
            }
        }
        StageId::MvpScoper => {
            if let Some(text) = text_of(responses, "mvp_features") {
                record.mvp_features = list_lines(text);
            }
            if let Some(text) = text_of(responses, "target_user") {
                record.target_user = text.trim().to_string();
            }
        }
        StageId::StackSelector => {
            record.tech_stack.clear();
            for key in ["frontend", "backend", "database"] {
                if let Some(choice) = text_of(responses, key) {
                    let choice = choice.trim();
                    if !choice.is_empty() && choice != "Other" {
                        record.tech_stack.push(choice.to_string());
                    }
                }
            }
            if let Some(ResponseValue::Choices(items)) = responses.get("ai_ml") {
                for tech in items {
                    if tech != "Other" {
                        record.tech_stack.push(tech.clone());
                    }
                }
            }
            if let Some(text) = text_of(responses, "other_tech") {
                record.tech_stack.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                );
            }
        }
        StageId::Reasoner => {
            for (i, tech) in record.tech_stack.clone().iter().enumerate() {
                if let Some(reason) = text_of(responses, &format!("reason_{i}")) {
                    let reason = reason.trim();
                    if !reason.is_empty() {
                        record.decisions.insert(tech.clone(), reason.to_string());
                    }
                }
            }
            if let Some(text) = text_of(responses, "additional_decisions") {
                for (key, value) in key_value_lines(text) {
                    record.decisions.insert(key, value);
                }
            }
        }
        StageId::FileMapBuilder => {
            record.file_map.clear();
            if let Some(text) = text_of(responses, "file_map") {
                for (path, desc) in key_value_lines(text) {
                    record.file_map.insert(path, desc);
                }
            }
        }
        StageId::TaskPlanner => {
            record.tasks.clear();
            if let Some(text) = text_of(responses, "tasks") {
                record.tasks = task_lines(text);
            }
        }
    }
    Ok(())
}

fn text_of<'a>(responses: &'a Responses, key: &str) -> Option<&'a str> {
    responses.get(key).and_then(ResponseValue::as_text)
}

// ---------------------------------------------------------------------------
// Shared line parsing
// ---------------------------------------------------------------------------

/// Strip a leading `- `, `* `, or `N. ` list marker.
fn strip_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return rest.trim_start();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(". ") {
            return rest.trim_start();
        }
    }
    line
}

/// Split into trimmed list items: empty lines and `#` comment lines are
/// dropped, list markers stripped.
pub fn list_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(strip_marker)
        .map(str::to_string)
        .collect()
}

/// Parse `key: value` lines; lines without a colon or starting with `#` are
/// skipped.
pub fn key_value_lines(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = strip_marker(key.trim()).trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Parse `title: file: estimate: priority` task lines. Lines with fewer than
/// four segments are skipped; a priority that fails integer parsing defaults
/// to 3.
pub fn task_lines(text: &str) -> Vec<PlannedTask> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && l.contains(':'))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(':').map(str::trim).collect();
            if parts.len() < 4 {
                return None;
            }
            Some(PlannedTask {
                title: strip_marker(parts[0]).to_string(),
                file: parts[1].to_string(),
                estimate: parts[2].to_string(),
                priority: parts[3].parse().unwrap_or(3),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StageCatalog;

    fn record() -> ProjectRecord {
        ProjectRecord::new("demo").unwrap()
    }

    fn text_responses(pairs: &[(&str, &str)]) -> Responses {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ResponseValue::text(*v)))
            .collect()
    }

    #[test]
    fn list_lines_strips_markers_and_comments() {
        let text = "# header\n- first\n* second\n3. third\n\nplain";
        assert_eq!(list_lines(text), vec!["first", "second", "third", "plain"]);
    }

    #[test]
    fn key_value_lines_split_on_first_colon() {
        let parsed = key_value_lines("src/api.rs: handlers: the routing layer\n# skipped\nbad line");
        assert_eq!(
            parsed,
            vec![("src/api.rs".to_string(), "handlers: the routing layer".to_string())]
        );
    }

    #[test]
    fn task_lines_default_priority() {
        let tasks = task_lines("Setup repo: README.md: 0.5h: 1\nBuild API: api.py: 3h: abc");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].priority, 1);
        assert_eq!(tasks[1].priority, 3);
        assert_eq!(tasks[1].title, "Build API");
    }

    #[test]
    fn task_lines_skip_short_lines() {
        assert!(task_lines("only: two: parts").is_empty());
    }

    #[test]
    fn clarify_intent_sets_intent_fields() {
        let mut rec = record();
        apply(
            StageId::ClarifyIntent,
            &mut rec,
            &text_responses(&[
                ("description", "A task tracker for small teams"),
                ("purpose", "Keep everyone aligned"),
                ("goals", "ship fast\nstay simple"),
            ]),
        )
        .unwrap();
        assert_eq!(rec.description, "A task tracker for small teams");
        assert_eq!(rec.goals, vec!["ship fast", "stay simple"]);
    }

    #[test]
    fn not_builder_keeps_negation_wording() {
        let mut rec = record();
        apply(
            StageId::NotBuilder,
            &mut rec,
            &text_responses(&[("excluded_features", "no mobile app\nno billing")]),
        )
        .unwrap();
        assert_eq!(rec.excluded_features, vec!["no mobile app", "no billing"]);
    }

    #[test]
    fn stack_selector_replaces_in_order() {
        let mut rec = record();
        rec.tech_stack = vec!["Svelte".to_string()];

        let mut responses = text_responses(&[
            ("frontend", "React"),
            ("backend", "Node.js"),
            ("database", "PostgreSQL"),
            ("other_tech", "Redis, Docker"),
        ]);
        responses.insert("ai_ml".to_string(), ResponseValue::choices(["LangChain"]));

        apply(StageId::StackSelector, &mut rec, &responses).unwrap();
        assert_eq!(
            rec.tech_stack,
            vec!["React", "Node.js", "PostgreSQL", "LangChain", "Redis", "Docker"]
        );
    }

    #[test]
    fn stack_selector_drops_other_sentinel() {
        let mut rec = record();
        apply(
            StageId::StackSelector,
            &mut rec,
            &text_responses(&[("frontend", "Other"), ("backend", "Go"), ("database", "SQLite")]),
        )
        .unwrap();
        assert_eq!(rec.tech_stack, vec!["Go", "SQLite"]);
    }

    #[test]
    fn reasoner_overwrites_decisions() {
        let mut rec = record();
        rec.tech_stack = vec!["React".to_string()];

        apply(
            StageId::Reasoner,
            &mut rec,
            &text_responses(&[("reason_0", "fast")]),
        )
        .unwrap();
        assert_eq!(rec.decisions["React"], "fast");

        apply(
            StageId::Reasoner,
            &mut rec,
            &text_responses(&[("reason_0", "popular")]),
        )
        .unwrap();
        assert_eq!(rec.decisions["React"], "popular");
        assert_eq!(rec.decisions.len(), 1);
    }

    #[test]
    fn reasoner_parses_additional_decisions() {
        let mut rec = record();
        apply(
            StageId::Reasoner,
            &mut rec,
            &text_responses(&[("additional_decisions", "Monorepo: keeps tooling in one place")]),
        )
        .unwrap();
        assert_eq!(rec.decisions["Monorepo"], "keeps tooling in one place");
    }

    #[test]
    fn file_map_replaces_and_drops_comments() {
        let mut rec = record();
        rec.file_map
            .insert("old.rs".to_string(), "stale".to_string());

        apply(
            StageId::FileMapBuilder,
            &mut rec,
            &text_responses(&[(
                "file_map",
                "# Suggested structure (edit as needed):\nsrc/main.rs: entry point",
            )]),
        )
        .unwrap();
        assert_eq!(rec.file_map.len(), 1);
        assert_eq!(rec.file_map["src/main.rs"], "entry point");
    }

    #[test]
    fn task_planner_replaces_tasks() {
        let mut rec = record();
        apply(
            StageId::TaskPlanner,
            &mut rec,
            &text_responses(&[("tasks", "First: a.rs: 1h: 1")]),
        )
        .unwrap();
        apply(
            StageId::TaskPlanner,
            &mut rec,
            &text_responses(&[("tasks", "Second: b.rs: 2h: 2")]),
        )
        .unwrap();
        assert_eq!(rec.tasks.len(), 1);
        assert_eq!(rec.tasks[0].title, "Second");
    }

    #[test]
    fn prompts_expose_expected_fields() {
        let catalog = StageCatalog::default();
        let suggester = Suggester::new(None);
        let rec = record();

        let intent = prompt_for(catalog.get(StageId::ClarifyIntent).unwrap(), &rec, &suggester);
        let ids: Vec<&str> = intent.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["description", "purpose", "goals"]);

        let stack = prompt_for(catalog.get(StageId::StackSelector).unwrap(), &rec, &suggester);
        assert_eq!(stack.fields.len(), 5);
        assert_eq!(stack.fields[0].kind, FieldKind::Select);
        assert_eq!(stack.fields[3].kind, FieldKind::MultiSelect);

        let export = prompt_for(catalog.get(StageId::Export).unwrap(), &rec, &suggester);
        assert!(export.fields.is_empty());
    }

    #[test]
    fn reasoner_prompt_prefills_existing_decisions() {
        let catalog = StageCatalog::default();
        let suggester = Suggester::new(None);
        let mut rec = record();
        rec.tech_stack = vec!["Go".to_string()];
        rec.decisions.insert("Go".to_string(), "simple".to_string());

        let prompt = prompt_for(catalog.get(StageId::Reasoner).unwrap(), &rec, &suggester);
        assert_eq!(prompt.fields[0].current, ResponseValue::text("simple"));
        assert_eq!(prompt.fields.last().unwrap().id, "additional_decisions");
    }
}
