use crate::output::{heading, print_json, print_pairs};
use anyhow::Context;
use clarity_core::export::Exporter;
use clarity_core::record::ProjectRecord;
use std::path::Path;

pub fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let names = ProjectRecord::list(root).context("failed to list projects")?;

    if json {
        return print_json(&names);
    }
    if names.is_empty() {
        println!("No projects yet. Start one with: clarity run <name>");
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

pub fn show(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let record =
        ProjectRecord::load(root, name).with_context(|| format!("project '{name}' not found"))?;

    if json {
        return print_json(&record);
    }

    heading(&record.name);
    let mut rows = vec![
        ("description".to_string(), record.description.clone()),
        ("purpose".to_string(), record.purpose.clone()),
        ("target user".to_string(), record.target_user.clone()),
        ("goals".to_string(), record.goals.join("; ")),
        ("mvp features".to_string(), record.mvp_features.join("; ")),
        ("excluded".to_string(), record.excluded_features.join("; ")),
        ("constraints".to_string(), record.constraints.join("; ")),
        ("tech stack".to_string(), record.tech_stack.join(", ")),
    ];
    rows.retain(|(_, v)| !v.is_empty());
    print_pairs(&rows);

    if !record.decisions.is_empty() {
        heading("Decisions");
        let rows: Vec<(String, String)> = record
            .decisions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        print_pairs(&rows);
    }
    if !record.file_map.is_empty() {
        heading("File map");
        let rows: Vec<(String, String)> = record
            .file_map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        print_pairs(&rows);
    }
    if !record.tasks.is_empty() {
        heading("Tasks");
        for task in &record.tasks {
            println!(
                "[P{}] {} ({}, {})",
                task.priority, task.title, task.file, task.estimate
            );
        }
    }
    Ok(())
}

pub fn export(root: &Path, name: &str) -> anyhow::Result<()> {
    let record =
        ProjectRecord::load(root, name).with_context(|| format!("project '{name}' not found"))?;
    Exporter::new(root)
        .export(&record)
        .context("failed to export artifacts")?;
    println!("Exported README.md, .plan.yml, architecture.md for '{name}'.");
    Ok(())
}
