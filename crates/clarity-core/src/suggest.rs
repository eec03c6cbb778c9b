use crate::port::{ChatMessage, CompletionPort};
use crate::record::ProjectRecord;
use tracing::warn;

// ---------------------------------------------------------------------------
// Static fallback tables
// ---------------------------------------------------------------------------

const FALLBACK_GOALS: &str = "\
1. Create an intuitive user interface for non-technical users
2. Implement secure data storage and retrieval
3. Enable seamless integration with existing systems
4. Provide comprehensive analytics and reporting
5. Ensure scalability to handle a growing user base";

const FALLBACK_FEATURES: &str = "\
1. User authentication and profile management
2. Core functionality for the primary use case
3. Basic dashboard with essential metrics
4. Simple data export capabilities
5. Minimal admin controls for oversight";

const FALLBACK_EXCLUSIONS: &str = "\
1. Advanced analytics and reporting
2. Third-party integrations beyond essential ones
3. Custom theming and white-labeling
4. Multi-language support
5. Offline functionality";

const FALLBACK_STACK: &str = "\
Frontend: React with Material UI
Backend: Node.js with Express
Database: PostgreSQL for structured data";

// ---------------------------------------------------------------------------
// Suggester
// ---------------------------------------------------------------------------

/// Wraps the completion port with per-stage prompt templates. All output is
/// advisory text for prompt descriptions and prefills; a port failure falls
/// back to the static tables above so prompts stay non-empty offline.
pub struct Suggester<'a> {
    port: Option<&'a dyn CompletionPort>,
}

impl<'a> Suggester<'a> {
    pub fn new(port: Option<&'a dyn CompletionPort>) -> Self {
        Self { port }
    }

    pub fn goals(&self, record: &ProjectRecord) -> String {
        self.ask(format!(
            "Suggest 3-5 concrete goals for this project.\n\nProject: {}\nDescription: {}",
            record.name, record.description
        ))
        .unwrap_or_else(|| FALLBACK_GOALS.to_string())
    }

    pub fn mvp_features(&self, record: &ProjectRecord) -> String {
        self.ask(format!(
            "Suggest 4-6 essential MVP features, one per line.\n\nDescription: {}\nGoals: {}",
            record.description,
            record.goals.join("; ")
        ))
        .unwrap_or_else(|| FALLBACK_FEATURES.to_string())
    }

    pub fn exclusions(&self, record: &ProjectRecord) -> String {
        self.ask(format!(
            "Suggest features to explicitly exclude from an MVP, one per line.\n\nDescription: {}",
            record.description
        ))
        .unwrap_or_else(|| FALLBACK_EXCLUSIONS.to_string())
    }

    pub fn stack(&self, record: &ProjectRecord) -> String {
        self.ask(format!(
            "Recommend a tech stack (frontend, backend, database) for this project.\n\n\
             Description: {}\nMVP features: {}",
            record.description,
            record.mvp_features.join("; ")
        ))
        .unwrap_or_else(|| FALLBACK_STACK.to_string())
    }

    fn ask(&self, prompt: String) -> Option<String> {
        let port = self.port?;
        let messages = [
            ChatMessage::system(
                "You are a planning assistant. Reply with short, plain-text suggestions only.",
            ),
            ChatMessage::user(prompt),
        ];
        match port.complete(&messages, 0.7) {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "suggestion call failed, using static fallback");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Deterministic generators
// ---------------------------------------------------------------------------

/// Suggested file layout derived from the chosen stack. Lines beginning with
/// `#` are comments and never survive parsing.
pub fn suggested_file_structure(record: &ProjectRecord) -> String {
    let mut out = String::from("# Suggested structure (edit as needed):\n");
    let stack = record.tech_stack.join(" ");

    let frontend = record
        .tech_stack
        .iter()
        .find(|t| ["React", "Vue", "Angular", "Next.js", "Svelte"].contains(&t.as_str()));
    match frontend.map(String::as_str) {
        Some("React") => {
            out.push_str("src/components/App.jsx: Main application component\n");
            out.push_str("src/pages/Home.jsx: Home page\n");
            out.push_str("src/styles/main.css: Main stylesheet\n");
        }
        Some("Next.js") => {
            out.push_str("pages/index.js: Home page\n");
            out.push_str("components/Layout.js: Layout component\n");
            out.push_str("styles/globals.css: Global styles\n");
        }
        _ => {}
    }

    let backend = record.tech_stack.iter().find(|t| {
        [
            "Node.js",
            "Python/Flask",
            "Python/FastAPI",
            "Python/Django",
            "Java/Spring",
            "Go",
            "Ruby on Rails",
        ]
        .contains(&t.as_str())
    });
    match backend.map(String::as_str) {
        Some("Python/Flask") => {
            out.push_str("app.py: Main Flask application\n");
            out.push_str("routes/api.py: API routes\n");
        }
        Some("Python/FastAPI") => {
            out.push_str("main.py: FastAPI application\n");
            out.push_str("routers/api.py: API routes\n");
        }
        Some("Node.js") => {
            out.push_str("server.js: Main server entry\n");
            out.push_str("routes/api.js: API routes\n");
        }
        _ => {}
    }

    out.push_str("README.md: Project documentation\n");
    if stack.contains("Python") {
        out.push_str("requirements.txt: Python dependencies\n");
    }
    if ["React", "Vue", "Angular", "Next.js", "Node.js"]
        .iter()
        .any(|t| stack.contains(t))
    {
        out.push_str("package.json: Node.js dependencies\n");
    }
    out
}

/// Suggested task list: setup, one task per MVP feature (pointed at a
/// related file when the file map mentions the feature), then test/doc tasks.
pub fn suggested_tasks(record: &ProjectRecord) -> String {
    let mut out = String::from("# Suggested tasks (edit as needed):\n");
    out.push_str("Project setup: README.md: 0.5h: 1\n");
    out.push_str("Create project structure: : 1h: 1\n");

    for (i, feature) in record.mvp_features.iter().enumerate() {
        let feature_lower = feature.to_lowercase();
        let related: Vec<&str> = record
            .file_map
            .iter()
            .filter(|(_, desc)| {
                feature_lower
                    .split_whitespace()
                    .any(|word| desc.to_lowercase().contains(word))
            })
            .map(|(path, _)| path.as_str())
            .collect();

        let priority = i + 2;
        if related.is_empty() {
            out.push_str(&format!("Implement {feature}: : 2h: {priority}\n"));
        } else {
            for path in related {
                out.push_str(&format!("Implement {feature}: {path}: 2h: {priority}\n"));
            }
        }
    }

    out.push_str("Write tests: : 3h: 4\n");
    out.push_str("Documentation: README.md: 1h: 5\n");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{FailingPort, StaticPort};

    fn record_with_stack(stack: &[&str]) -> ProjectRecord {
        let mut record = ProjectRecord::new("demo").unwrap();
        record.tech_stack = stack.iter().map(|s| s.to_string()).collect();
        record
    }

    #[test]
    fn suggester_prefers_the_port() {
        let port = StaticPort::new("1. Ship it");
        let suggester = Suggester::new(Some(&port));
        assert_eq!(suggester.goals(&record_with_stack(&[])), "1. Ship it");
    }

    #[test]
    fn suggester_falls_back_on_port_failure() {
        let suggester = Suggester::new(Some(&FailingPort));
        let goals = suggester.goals(&record_with_stack(&[]));
        assert!(goals.contains("intuitive user interface"));
    }

    #[test]
    fn suggester_without_port_is_static() {
        let suggester = Suggester::new(None);
        assert!(!suggester.exclusions(&record_with_stack(&[])).is_empty());
        assert!(suggester.stack(&record_with_stack(&[])).contains("PostgreSQL"));
    }

    #[test]
    fn file_structure_follows_stack() {
        let text = suggested_file_structure(&record_with_stack(&["React", "Node.js"]));
        assert!(text.starts_with("# Suggested structure"));
        assert!(text.contains("src/components/App.jsx"));
        assert!(text.contains("package.json"));
        assert!(!text.contains("requirements.txt"));
    }

    #[test]
    fn tasks_link_features_to_files() {
        let mut record = record_with_stack(&[]);
        record.mvp_features = vec!["search".to_string()];
        record
            .file_map
            .insert("src/search.rs".to_string(), "search endpoint".to_string());

        let text = suggested_tasks(&record);
        assert!(text.contains("Implement search: src/search.rs: 2h: 2"));
        assert!(text.contains("Write tests"));
    }
}
