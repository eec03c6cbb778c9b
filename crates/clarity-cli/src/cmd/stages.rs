use crate::output::print_json;
use anyhow::Context;
use clarity_core::catalog::StageCatalog;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let catalog = StageCatalog::load(root).context("failed to load stage catalog")?;
    let order = catalog.get_order().context("invalid stage catalog")?;

    if json {
        let entries: Vec<_> = order
            .iter()
            .map(|id| {
                let def = catalog.get(*id).expect("ordered stage is in catalog");
                serde_json::json!({
                    "id": id.as_str(),
                    "label": def.label,
                    "rules": def.validation_rules.len(),
                    "optional": def.optional,
                })
            })
            .collect();
        return print_json(&entries);
    }

    for (i, id) in order.iter().enumerate() {
        let def = catalog.get(*id).expect("ordered stage is in catalog");
        println!("{}. {} — {}", i + 1, id, def.label);
    }
    Ok(())
}
