//! End-to-end walkthroughs of the clarification workflow.

use clarity_core::engine::{SubmitOutcome, TransitionPolicy, WorkflowEngine};
use clarity_core::catalog::StageCatalog;
use clarity_core::handler::Responses;
use clarity_core::port::FailingPort;
use clarity_core::record::ProjectRecord;
use clarity_core::types::{ResponseValue, StageId};
use tempfile::TempDir;

fn text_responses(pairs: &[(&str, &str)]) -> Responses {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ResponseValue::text(*v)))
        .collect()
}

fn submit_ok(engine: &mut WorkflowEngine, stage: StageId, responses: &Responses) -> SubmitOutcome {
    let outcome = engine.submit(stage, responses).unwrap();
    assert!(
        !matches!(outcome, SubmitOutcome::Rejected { .. }),
        "unexpected rejection at {stage}"
    );
    outcome
}

/// Drive a full run from start to export.
fn run_to_completion(engine: &mut WorkflowEngine) {
    submit_ok(engine, StageId::Start, &Responses::new());
    submit_ok(
        engine,
        StageId::ClarifyIntent,
        &text_responses(&[
            ("description", "A task tracker for small teams"),
            ("purpose", "Keep distributed teams aligned on daily work"),
            ("goals", "fast onboarding\nlow maintenance"),
        ]),
    );
    submit_ok(
        engine,
        StageId::NotBuilder,
        &text_responses(&[
            ("excluded_features", "no mobile app\nno billing"),
            ("constraints", "single region deployment"),
        ]),
    );
    submit_ok(
        engine,
        StageId::MvpScoper,
        &text_responses(&[
            ("mvp_features", "task lists\nassignees\ndue dates"),
            ("target_user", "small software teams"),
        ]),
    );

    let mut stack = text_responses(&[
        ("frontend", "React"),
        ("backend", "Node.js"),
        ("database", "PostgreSQL"),
        ("other_tech", ""),
    ]);
    stack.insert("ai_ml".to_string(), ResponseValue::Choices(Vec::new()));
    submit_ok(engine, StageId::StackSelector, &stack);

    submit_ok(
        engine,
        StageId::Reasoner,
        &text_responses(&[
            ("reason_0", "large ecosystem and team familiarity"),
            ("reason_1", "shared language across the stack"),
            ("reason_2", "relational data with strong constraints"),
        ]),
    );
    submit_ok(
        engine,
        StageId::FileMapBuilder,
        &text_responses(&[(
            "file_map",
            "src/App.jsx: root component\nserver.js: API entry\nschema.sql: database schema",
        )]),
    );
    submit_ok(
        engine,
        StageId::TaskPlanner,
        &text_responses(&[(
            "tasks",
            "Setup repo: README.md: 0.5h: 1\nBuild API: api.py: 3h: abc",
        )]),
    );

    let outcome = engine.submit(StageId::Export, &Responses::new()).unwrap();
    assert_eq!(outcome, SubmitOutcome::Complete);
}

#[test]
fn full_walkthrough_reaches_complete() {
    let dir = TempDir::new().unwrap();
    let mut engine = WorkflowEngine::open(dir.path(), "demo").unwrap();

    run_to_completion(&mut engine);
    assert!(engine.is_complete());
    assert_eq!(engine.progress().fraction, 1.0);

    let record = engine.record();
    assert_eq!(record.tech_stack, vec!["React", "Node.js", "PostgreSQL"]);
    assert_eq!(record.excluded_features, vec!["no mobile app", "no billing"]);
    assert_eq!(record.tasks.len(), 2);
    assert_eq!(record.tasks[0].priority, 1);
    // "abc" fails integer parsing and defaults to 3.
    assert_eq!(record.tasks[1].priority, 3);
}

#[test]
fn completion_port_failure_still_completes_with_artifacts() {
    let dir = TempDir::new().unwrap();
    let catalog = StageCatalog::load(dir.path()).unwrap();
    let mut engine = WorkflowEngine::new(
        dir.path(),
        "demo",
        catalog,
        Some(Box::new(FailingPort)),
        TransitionPolicy::Assisted,
    )
    .unwrap();

    run_to_completion(&mut engine);
    assert!(engine.is_complete());

    for file in ["README.md", ".plan.yml", "architecture.md", ".clarity/demo.json"] {
        let content = std::fs::read_to_string(dir.path().join(file)).unwrap();
        assert!(!content.is_empty(), "{file} should not be empty");
    }
}

#[test]
fn rejection_then_acceptance_scenario() {
    let dir = TempDir::new().unwrap();
    let mut engine = WorkflowEngine::open(dir.path(), "demo").unwrap();

    engine.submit(StageId::Start, &Responses::new()).unwrap();
    let outcome = engine
        .submit(
            StageId::ClarifyIntent,
            &text_responses(&[("description", "A task tracker for small teams")]),
        )
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Advanced(StageId::NotBuilder));

    // Empty submission fails validation; the stage does not move.
    let rejected = engine
        .submit(
            StageId::NotBuilder,
            &text_responses(&[("excluded_features", ""), ("constraints", "")]),
        )
        .unwrap();
    assert!(matches!(rejected, SubmitOutcome::Rejected { .. }));
    assert_eq!(engine.current_stage(), StageId::NotBuilder);
    assert!(engine.record().excluded_features.is_empty());

    let accepted = engine
        .submit(
            StageId::NotBuilder,
            &text_responses(&[("excluded_features", "no mobile app\nno billing")]),
        )
        .unwrap();
    assert_eq!(accepted, SubmitOutcome::Advanced(StageId::MvpScoper));
    assert_eq!(
        engine.record().excluded_features,
        vec!["no mobile app", "no billing"]
    );
}

#[test]
fn saved_record_round_trips_after_completion() {
    let dir = TempDir::new().unwrap();
    let mut engine = WorkflowEngine::open(dir.path(), "demo").unwrap();
    run_to_completion(&mut engine);

    let loaded = ProjectRecord::load(dir.path(), "demo").unwrap();
    assert_eq!(&loaded, engine.record());
}

#[test]
fn reopening_a_project_resumes_its_record() {
    let dir = TempDir::new().unwrap();
    {
        let mut engine = WorkflowEngine::open(dir.path(), "demo").unwrap();
        engine.submit(StageId::Start, &Responses::new()).unwrap();
        engine
            .submit(
                StageId::ClarifyIntent,
                &text_responses(&[("description", "A task tracker for small teams")]),
            )
            .unwrap();
    }

    let engine = WorkflowEngine::open(dir.path(), "demo").unwrap();
    assert_eq!(engine.record().description, "A task tracker for small teams");
    // The wizard itself restarts from the beginning.
    assert_eq!(engine.current_stage(), StageId::Start);
}
