use crate::output::{print_json, print_table};
use anyhow::Context;
use mozu_actions_core::catalog::{ActionDefinition, Catalog, CatalogOptions};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct DomainOutput<'a> {
    domain: &'a str,
    actions: Vec<&'a ActionDefinition>,
}

pub fn run(internal: bool, timeout: Option<u64>, json: bool) -> anyhow::Result<()> {
    let catalog = Catalog::load(&CatalogOptions {
        internal,
        remote_url: None,
        timeout: timeout.map(Duration::from_secs),
    })
    .context("failed to load action definitions")?;

    if json {
        let domains: Vec<DomainOutput> = catalog
            .domains()
            .iter()
            .map(|d| DomainOutput {
                domain: d,
                actions: catalog.actions_in(d).collect(),
            })
            .collect();
        return print_json(&domains);
    }

    let rows: Vec<Vec<String>> = catalog
        .actions()
        .map(|a| {
            vec![
                a.domain.clone(),
                a.action_id.to_string(),
                if a.supports_multiple_custom_functions {
                    "yes".to_string()
                } else {
                    String::new()
                },
                if a.beta { "beta".to_string() } else { String::new() },
            ]
        })
        .collect();
    print_table(&["DOMAIN", "ACTION", "MULTIPLE", ""], rows);
    Ok(())
}
