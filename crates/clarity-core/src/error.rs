use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClarityError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("invalid project name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidProjectName(String),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("stage '{got}' is not active (current stage is '{current}')")]
    StageNotActive { current: String, got: String },

    #[error("workflow is already complete")]
    WorkflowComplete,

    #[error("stage '{from}' transitions to undefined stage '{to}'")]
    UndefinedTransition { from: String, to: String },

    #[error("transition cycle detected at stage '{0}'")]
    TransitionCycle(String),

    #[error("stage catalog has no start stage '{0}'")]
    MissingStartStage(String),

    #[error("handler for stage '{stage}' failed: {reason}")]
    HandlerApply { stage: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ClarityError>;
