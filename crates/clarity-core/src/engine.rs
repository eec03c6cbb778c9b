use crate::catalog::{StageCatalog, StageDefinition};
use crate::error::{ClarityError, Result};
use crate::export::Exporter;
use crate::handler::{self, PromptData, Responses};
use crate::port::{ChatMessage, CompletionPort};
use crate::record::ProjectRecord;
use crate::suggest::Suggester;
use crate::types::{FieldKind, ResponseValue, StageId};
use crate::validator;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Policy and outcomes
// ---------------------------------------------------------------------------

/// How the next stage is chosen after an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Follow `default_next` links. Deterministic, recommended.
    #[default]
    Static,
    /// Ask the completion port to pick among valid stage ids; any failure or
    /// invalid reply falls back to the static link. Strictly an override,
    /// never a dependency.
    Assisted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation rejected the response; the stage did not advance and the
    /// record was not touched.
    Rejected { feedback: String, score: f32 },
    Advanced(StageId),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub fraction: f32,
}

#[derive(Debug, Clone)]
struct Turn {
    stage: StageId,
    summary: String,
}

const TRANSCRIPT_CAP: usize = 8;

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// Drives one project through the ordered stages, exactly one active stage
/// at a time. Owns the record; all mutation goes through `submit`.
pub struct WorkflowEngine {
    root: PathBuf,
    record: ProjectRecord,
    catalog: StageCatalog,
    current: StageId,
    complete: bool,
    exported: bool,
    policy: TransitionPolicy,
    port: Option<Box<dyn CompletionPort>>,
    transcript: Vec<Turn>,
    pending_feedback: Option<String>,
}

impl WorkflowEngine {
    pub fn new(
        root: &Path,
        name: &str,
        catalog: StageCatalog,
        port: Option<Box<dyn CompletionPort>>,
        policy: TransitionPolicy,
    ) -> Result<Self> {
        let record = if ProjectRecord::exists(root, name) {
            ProjectRecord::load(root, name)?
        } else {
            ProjectRecord::new(name)?
        };
        let current = catalog.start();
        Ok(Self {
            root: root.to_path_buf(),
            record,
            catalog,
            current,
            complete: false,
            exported: false,
            policy,
            port,
            transcript: Vec::new(),
            pending_feedback: None,
        })
    }

    /// Catalog from `root` (or built-in defaults), no completion port,
    /// static transitions.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        let catalog = StageCatalog::load(root)?;
        Self::new(root, name, catalog, None, TransitionPolicy::Static)
    }

    pub fn record(&self) -> &ProjectRecord {
        &self.record
    }

    pub fn current_stage(&self) -> StageId {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    // ---------------------------------------------------------------------------
    // Prompting
    // ---------------------------------------------------------------------------

    /// Prompt data for the active stage. Never fails and has no side
    /// effects: two calls without an intervening submit return the same data.
    pub fn current_prompt(&self) -> PromptData {
        if self.complete {
            return PromptData {
                title: "Complete".to_string(),
                description: format!(
                    "Project '{}' is fully clarified and exported.",
                    self.record.name
                ),
                fields: Vec::new(),
            };
        }

        let suggester = Suggester::new(self.port.as_deref());
        let mut data = match self.catalog.get(self.current) {
            Ok(def) => handler::prompt_for(def, &self.record, &suggester),
            Err(e) => {
                warn!(error = %e, "active stage missing from catalog, using fallback prompt");
                fallback_prompt()
            }
        };
        if let Some(feedback) = &self.pending_feedback {
            data.description = format!("{}\n\n{}", data.description, feedback);
        }
        data
    }

    // ---------------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------------

    pub fn submit(&mut self, stage: StageId, responses: &Responses) -> Result<SubmitOutcome> {
        if self.complete {
            return Err(ClarityError::WorkflowComplete);
        }
        if stage != self.current {
            return Err(ClarityError::StageNotActive {
                current: self.current.to_string(),
                got: stage.to_string(),
            });
        }

        let def = self.catalog.get(stage)?.clone();

        // Stages without input fields (start, export) have nothing to score.
        if handler::has_input(stage) {
            let text = primary_text(&def, responses);
            let verdict =
                validator::validate(&def.validation_rules, &text, self.port.as_deref());
            if !verdict.accepted {
                self.pending_feedback = Some(verdict.feedback.clone());
                return Ok(SubmitOutcome::Rejected {
                    feedback: verdict.feedback,
                    score: verdict.score,
                });
            }
        }

        // All-or-nothing apply: mutate a scratch copy, commit only on success.
        let mut scratch = self.record.clone();
        handler::apply(stage, &mut scratch, responses).map_err(|e| {
            ClarityError::HandlerApply {
                stage: stage.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.record = scratch;

        // Write-through; a failed write is surfaced, never swallowed.
        self.record.save(&self.root)?;
        self.pending_feedback = None;
        self.push_turn(stage, primary_text(&def, responses));

        match self.next_stage(stage)? {
            Some(next) => {
                debug!(from = %stage, to = %next, "stage advanced");
                self.current = next;
                Ok(SubmitOutcome::Advanced(next))
            }
            None => {
                self.complete = true;
                if !self.exported {
                    Exporter::new(&self.root).export(&self.record)?;
                    self.exported = true;
                }
                debug!(project = %self.record.name, "workflow complete, artifacts exported");
                Ok(SubmitOutcome::Complete)
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Progress
    // ---------------------------------------------------------------------------

    pub fn progress(&self) -> Progress {
        let order = self.catalog.get_order().unwrap_or_default();
        let total = order.len();
        let completed = if self.complete {
            total
        } else {
            order.iter().position(|s| *s == self.current).unwrap_or(0)
        };
        let fraction = if total <= 1 {
            if self.complete {
                1.0
            } else {
                0.0
            }
        } else {
            (completed as f32 / (total - 1) as f32).min(1.0)
        };
        Progress {
            completed,
            total,
            fraction,
        }
    }

    // ---------------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------------

    fn next_stage(&self, from: StageId) -> Result<Option<StageId>> {
        let fallback = self.catalog.next_static(from)?;
        if self.policy == TransitionPolicy::Static {
            return Ok(fallback);
        }
        let Some(port) = self.port.as_deref() else {
            return Ok(fallback);
        };

        let candidates: Vec<&str> = self
            .catalog
            .stages()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        let recent: String = self
            .transcript
            .iter()
            .map(|t| format!("- {}: {}\n", t.stage, t.summary))
            .collect();
        let messages = [
            ChatMessage::system(
                "You choose the next step of a project clarification workflow. \
                 Reply with exactly one stage id from the provided list, or 'complete'.",
            ),
            ChatMessage::user(format!(
                "Current stage: {from}\n\nProject state:\n{}\n\nRecent turns:\n{recent}\n\
                 Valid stage ids: {}",
                self.record.summary(),
                candidates.join(", ")
            )),
        ];

        match port.complete(&messages, 0.3) {
            Ok(reply) => match parse_stage_reply(&reply, &candidates) {
                Some(choice) => Ok(choice),
                None => {
                    warn!(reply = %reply, "assisted transition named no valid stage, using static next");
                    Ok(fallback)
                }
            },
            Err(e) => {
                warn!(error = %e, "assisted transition failed, using static next");
                Ok(fallback)
            }
        }
    }

    fn push_turn(&mut self, stage: StageId, text: String) {
        let mut summary: String = text.chars().take(200).collect();
        if summary.is_empty() {
            summary = "(no input)".to_string();
        }
        self.transcript.push(Turn { stage, summary });
        if self.transcript.len() > TRANSCRIPT_CAP {
            self.transcript.remove(0);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The text validation runs against: the configured primary field when
/// present, otherwise every submitted value joined with newlines.
fn primary_text(def: &StageDefinition, responses: &Responses) -> String {
    if let Some(field) = &def.primary_field {
        return responses
            .get(field)
            .map(ResponseValue::joined)
            .unwrap_or_default();
    }
    responses
        .values()
        .map(ResponseValue::joined)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Some(Some(id))` for a reply naming a valid stage, `Some(None)` for an
/// explicit 'complete', `None` when nothing valid was named.
fn parse_stage_reply(reply: &str, candidates: &[&str]) -> Option<Option<StageId>> {
    for token in reply.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        if token.eq_ignore_ascii_case("complete") {
            return Some(None);
        }
        if candidates.contains(&token) {
            return StageId::from_str(token).ok().map(Some);
        }
    }
    None
}

fn fallback_prompt() -> PromptData {
    PromptData {
        title: "Tell me more".to_string(),
        description: "Tell me more about your project.".to_string(),
        fields: vec![crate::handler::Field {
            id: "details".to_string(),
            question: "What else should I know?".to_string(),
            kind: FieldKind::Text,
            options: Vec::new(),
            current: ResponseValue::default(),
        }],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
