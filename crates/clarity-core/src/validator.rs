use crate::port::{ChatMessage, CompletionPort};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// One clarity rule attached to a stage. Every rule carries an optional
/// feedback message overriding the built-in one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    MinWords {
        threshold: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinFeatures {
        threshold: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    MinExclusions {
        threshold: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    RequiredEntities {
        entities: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    TechCompleteness {
        categories: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Approval,
    SpecificityScore {
        threshold: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    /// Mean of individual rule scores, 0..=1.
    pub score: f32,
    /// Informational only: mean score at or above 0.7. `accepted` is the
    /// gate; a response can be accepted but not clear.
    pub clear: bool,
    pub feedback: String,
}

impl Verdict {
    fn reject(score: f32, feedback: impl Into<String>) -> Self {
        Self {
            accepted: false,
            score,
            clear: false,
            feedback: feedback.into(),
        }
    }

    fn accept(score: f32, feedback: impl Into<String>) -> Self {
        Self {
            accepted: true,
            score,
            clear: score >= CLARITY_THRESHOLD,
            feedback: feedback.into(),
        }
    }
}

const CLARITY_THRESHOLD: f32 = 0.7;

// ---------------------------------------------------------------------------
// Stage-level validation
// ---------------------------------------------------------------------------

/// Score `text` against a stage's rules. The first failing rule
/// short-circuits and its feedback is returned; when every rule passes, the
/// verdict carries the mean score. A stage with no rules falls back to
/// simple word-count validation.
pub fn validate(
    rules: &[Rule],
    text: &str,
    port: Option<&dyn CompletionPort>,
) -> Verdict {
    if rules.is_empty() {
        return simple_validation(text);
    }

    let mut total = 0.0;
    let mut feedback = Vec::new();
    for rule in rules {
        let (accepted, score, message) = apply_rule(rule, text, port);
        if !accepted {
            return Verdict::reject(score, message);
        }
        total += score;
        if !message.is_empty() {
            feedback.push(message);
        }
    }

    let mean = total / rules.len() as f32;
    let feedback = if feedback.is_empty() {
        "Response looks good!".to_string()
    } else {
        feedback.join(" ")
    };
    Verdict::accept(mean, feedback)
}

/// Fallback for stages with no declared rules.
fn simple_validation(text: &str) -> Verdict {
    match word_count(text) {
        0 | 1 => Verdict::reject(0.2, "Please provide more details"),
        2..=4 => Verdict::accept(0.6, "Consider adding more details"),
        _ => Verdict::accept(0.8, ""),
    }
}

// ---------------------------------------------------------------------------
// Individual rules
// ---------------------------------------------------------------------------

fn apply_rule(rule: &Rule, text: &str, port: Option<&dyn CompletionPort>) -> (bool, f32, String) {
    match rule {
        Rule::MinWords { threshold, message } => min_words(*threshold, message.as_deref(), text),
        Rule::MinFeatures { threshold, message } => {
            min_features(*threshold, message.as_deref(), text)
        }
        Rule::MinExclusions { threshold, message } => {
            min_exclusions(*threshold, message.as_deref(), text)
        }
        Rule::RequiredEntities { entities, message } => {
            required_entities(entities, message.as_deref(), text)
        }
        Rule::TechCompleteness {
            categories,
            message,
        } => tech_completeness(categories, message.as_deref(), text),
        Rule::Approval => approval(text, port),
        Rule::SpecificityScore { threshold, message } => {
            specificity(*threshold, message.as_deref(), text, port)
        }
    }
}

fn min_words(threshold: usize, message: Option<&str>, text: &str) -> (bool, f32, String) {
    let count = word_count(text);
    let threshold = threshold.max(1);
    let score = (count as f32 / (threshold * 2) as f32).min(1.0);
    if count < threshold {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Please provide at least {threshold} words"));
        return (false, score, msg);
    }
    (true, score, String::new())
}

fn min_features(threshold: usize, message: Option<&str>, text: &str) -> (bool, f32, String) {
    let threshold = threshold.max(1);
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    let commas = text.split(',').filter(|s| !s.trim().is_empty()).count();
    let count = lines.max(commas);
    let score = (count as f32 / threshold as f32).min(1.0);
    if count < threshold {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Please list at least {threshold} features"));
        return (false, score, msg);
    }
    (true, score, String::new())
}

static NEGATION_RE: OnceLock<Regex> = OnceLock::new();

fn negation_re() -> &'static Regex {
    NEGATION_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:not|no|exclude|without|don'?t|won'?t|skip)\s+\w+").unwrap()
    })
}

/// Counts both negation phrases ("no billing", "without auth") and explicit
/// line items, so a bare list of exclusions passes even with no negation
/// wording.
fn min_exclusions(threshold: usize, message: Option<&str>, text: &str) -> (bool, f32, String) {
    let threshold = threshold.max(1);
    let negations = negation_re().find_iter(text).count();
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    let count = negations + lines;
    let score = (count as f32 / threshold as f32).min(1.0);
    if count < threshold {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Please name at least {threshold} thing(s) to leave out"));
        return (false, score, msg);
    }
    (true, score, String::new())
}

fn required_entities(entities: &[String], message: Option<&str>, text: &str) -> (bool, f32, String) {
    if entities.is_empty() {
        return (true, 1.0, String::new());
    }
    let lower = text.to_lowercase();
    let missing: Vec<&str> = entities
        .iter()
        .filter(|e| !lower.contains(&e.to_lowercase()))
        .map(String::as_str)
        .collect();
    let found = entities.len() - missing.len();
    let score = found as f32 / entities.len() as f32;
    if !missing.is_empty() {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Please specify: {}", missing.join(", ")));
        return (false, score, msg);
    }
    (true, 1.0, String::new())
}

fn category_keywords(category: &str) -> Vec<&str> {
    match category {
        "frontend" => vec![
            "react", "vue", "angular", "frontend", "client", "ui", "html", "css", "javascript",
        ],
        "backend" => vec![
            "node", "python", "java", "backend", "server", "api", "express", "django", "flask",
        ],
        "database" => vec![
            "mysql", "postgres", "mongodb", "database", "db", "sql", "nosql", "redis",
        ],
        other => vec![other],
    }
}

fn tech_completeness(
    categories: &[String],
    message: Option<&str>,
    text: &str,
) -> (bool, f32, String) {
    if categories.is_empty() {
        return (true, 1.0, String::new());
    }
    let lower = text.to_lowercase();
    let missing: Vec<&str> = categories
        .iter()
        .filter(|c| {
            !category_keywords(c)
                .iter()
                .any(|keyword| lower.contains(keyword))
        })
        .map(String::as_str)
        .collect();
    let found = categories.len() - missing.len();
    let score = found as f32 / categories.len() as f32;
    if !missing.is_empty() {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Please specify: {}", missing.join(", ")));
        return (false, score, msg);
    }
    (true, 1.0, String::new())
}

const POSITIVE_LEXICON: &[&str] = &[
    "yes", "ok", "good", "approve", "confirm", "agree", "looks good", "perfect",
];
const NEGATIVE_LEXICON: &[&str] = &["no", "not", "change", "modify", "different", "wrong"];

fn approval(text: &str, port: Option<&dyn CompletionPort>) -> (bool, f32, String) {
    let lower = text.to_lowercase();
    let positive = POSITIVE_LEXICON.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_LEXICON.iter().filter(|w| lower.contains(*w)).count();

    if negative > positive {
        return (
            false,
            0.3,
            "Please let me know what you'd like to change".to_string(),
        );
    }
    if positive > 0 {
        return (true, 0.9, String::new());
    }
    // Neither lexicon fired; fall through to a specificity check.
    specificity(0.6, None, text, port)
}

fn specificity(
    threshold: f32,
    message: Option<&str>,
    text: &str,
    port: Option<&dyn CompletionPort>,
) -> (bool, f32, String) {
    let score = port
        .and_then(|p| ask_specificity(p, text))
        .unwrap_or_else(|| heuristic_specificity(text));
    if score < threshold {
        let msg = message
            .map(str::to_string)
            .unwrap_or_else(|| "Please be more specific".to_string());
        return (false, score, msg);
    }
    (true, score, String::new())
}

fn ask_specificity(port: &dyn CompletionPort, text: &str) -> Option<f32> {
    let messages = [
        ChatMessage::system(
            "You are an AI that rates text specificity. Return only a number between 0 and 1.",
        ),
        ChatMessage::user(format!(
            "Rate the specificity of the following response from 0 to 1.\n\nResponse: {text}"
        )),
    ];
    match port.complete(&messages, 0.3) {
        Ok(reply) => parse_score(&reply),
        Err(e) => {
            warn!(error = %e, "specificity call failed, using local heuristic");
            None
        }
    }
}

static SCORE_RE: OnceLock<Regex> = OnceLock::new();

/// First numeric token that looks like a 0..1 score. Explicitly `Option` so
/// fallback selection is visible at the call site.
pub(crate) fn parse_score(reply: &str) -> Option<f32> {
    let re = SCORE_RE.get_or_init(|| Regex::new(r"0?\.\d+|[01]\b").unwrap());
    re.find(reply)?.as_str().parse::<f32>().ok()
}

fn heuristic_specificity(text: &str) -> f32 {
    let words = word_count(text);
    let unique: HashSet<String> = text
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    ((words * unique.len()) as f32 / 100.0).min(1.0)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
