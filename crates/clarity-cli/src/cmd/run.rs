use anyhow::Context;
use clarity_core::catalog::StageCatalog;
use clarity_core::engine::{SubmitOutcome, TransitionPolicy, WorkflowEngine};
use clarity_core::handler::{Field, Responses};
use clarity_core::port::CompletionPort;
use clarity_core::types::{FieldKind, ResponseValue};
use colored::Colorize;
use dialoguer::{MultiSelect, Select};
use openrouter_client::OpenRouterClient;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub fn run(root: &Path, name: &str, assisted: bool) -> anyhow::Result<()> {
    let catalog = StageCatalog::load(root).context("failed to load stage catalog")?;
    let port: Option<Box<dyn CompletionPort>> = match OpenRouterClient::from_env() {
        Some(client) => Some(Box::new(client)),
        None => {
            tracing::warn!("OPENROUTER_API_KEY not set; running with static suggestions only");
            None
        }
    };
    let policy = if assisted {
        TransitionPolicy::Assisted
    } else {
        TransitionPolicy::Static
    };

    let mut engine = WorkflowEngine::new(root, name, catalog, port, policy)
        .with_context(|| format!("failed to open project '{name}'"))?;

    while !engine.is_complete() {
        let prompt = engine.current_prompt();
        println!("\n{}", prompt.title.bold());
        println!("{}\n", prompt.description.dimmed());

        let mut responses = Responses::new();
        if prompt.fields.is_empty() {
            wait_for_enter()?;
        } else {
            for field in &prompt.fields {
                responses.insert(field.id.clone(), ask_field(field)?);
            }
        }

        match engine.submit(engine.current_stage(), &responses)? {
            SubmitOutcome::Rejected { .. } => {
                println!("{}", "Let's try that again.".yellow());
            }
            SubmitOutcome::Advanced(_) => {
                let p = engine.progress();
                println!("{}", format!("[{}/{}]", p.completed, p.total).green());
            }
            SubmitOutcome::Complete => {
                println!(
                    "{}",
                    "Done. Wrote README.md, .plan.yml, architecture.md.".green()
                );
            }
        }
    }
    Ok(())
}

fn ask_field(field: &Field) -> anyhow::Result<ResponseValue> {
    match field.kind {
        FieldKind::Select => {
            let default = field
                .current
                .as_text()
                .and_then(|c| field.options.iter().position(|o| o == c))
                .unwrap_or(0);
            let idx = Select::new()
                .with_prompt(&field.question)
                .items(&field.options)
                .default(default)
                .interact()?;
            Ok(ResponseValue::text(field.options[idx].clone()))
        }
        FieldKind::MultiSelect => {
            let checked: Vec<bool> = match &field.current {
                ResponseValue::Choices(current) => field
                    .options
                    .iter()
                    .map(|o| current.contains(o))
                    .collect(),
                ResponseValue::Text(_) => vec![false; field.options.len()],
            };
            let picked = MultiSelect::new()
                .with_prompt(&field.question)
                .items(&field.options)
                .defaults(&checked)
                .interact()?;
            Ok(ResponseValue::choices(
                picked.into_iter().map(|i| field.options[i].clone()),
            ))
        }
        FieldKind::Text => ask_text(field),
    }
}

/// Multi-line free text, terminated by a blank line. An immediately blank
/// submission keeps the field's current value, so re-runs don't wipe
/// earlier answers.
fn ask_text(field: &Field) -> anyhow::Result<ResponseValue> {
    println!("{} {}", field.question.cyan(), "(finish with an empty line)".dimmed());
    if let Some(current) = field.current.as_text() {
        if !current.is_empty() {
            println!("{}", "Current value (kept if you submit nothing):".dimmed());
            for line in current.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }
    print!("> ");
    io::stdout().flush()?;

    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
        print!("> ");
        io::stdout().flush()?;
    }

    if lines.is_empty() {
        if let Some(current) = field.current.as_text() {
            if !current.is_empty() {
                return Ok(ResponseValue::text(current));
            }
        }
    }
    Ok(ResponseValue::text(lines.join("\n")))
}

fn wait_for_enter() -> anyhow::Result<()> {
    print!("{}", "Press Enter to continue... ".dimmed());
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(())
}
