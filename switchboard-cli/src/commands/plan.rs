//! `switchboard plan` — preview model → connection resolution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use switchboard_core::{
    check_shape, find_owner, AdapterSource, ConnectionShape, ModelName, ResolutionRule,
};

use super::load_manifest;

/// Arguments for `switchboard plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the YAML manifest.
    pub manifest: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let declarations = load_manifest(&self.manifest)?;
        let shapes = declarations
            .connections
            .iter()
            .map(|(name, decl)| check_shape(name, decl))
            .collect::<Result<Vec<_>, _>>()
            .context("manifest has invalid connections; run `switchboard check` for details")?;

        let plan = build_plan(&shapes, &declarations.models);
        let unresolved = plan.unresolved_count();
        if self.json {
            print_json(&self.manifest, &shapes, plan)?;
        } else {
            print_table(&self.manifest, &shapes, plan);
        }

        if unresolved > 0 {
            bail!("{unresolved} model(s) could not be resolved to a connection");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Resolved(ResolutionRule),
    Unresolved,
    /// No connections are declared, so the pipeline leaves models unwired.
    Unwired,
}

#[derive(Debug, Clone)]
struct PlannedModel {
    model: ModelName,
    connection: Option<usize>,
    status: Status,
}

#[derive(Debug, Clone)]
struct Plan {
    models: Vec<PlannedModel>,
    /// Assigned model names per connection index, in resolution order.
    assigned: Vec<Vec<ModelName>>,
}

impl Plan {
    fn unresolved_count(&self) -> usize {
        self.models
            .iter()
            .filter(|m| m.status == Status::Unresolved)
            .count()
    }
}

fn build_plan(shapes: &[ConnectionShape], models: &[(ModelName, Value)]) -> Plan {
    let routes: Vec<_> = shapes.iter().map(|shape| &shape.route).collect();
    let mut assigned = vec![Vec::new(); shapes.len()];
    let models = models
        .iter()
        .map(|(model, _)| {
            if shapes.is_empty() {
                return PlannedModel {
                    model: model.clone(),
                    connection: None,
                    status: Status::Unwired,
                };
            }
            match find_owner(model.as_str(), &routes) {
                Some(resolution) => {
                    assigned[resolution.index].push(model.clone());
                    PlannedModel {
                        model: model.clone(),
                        connection: Some(resolution.index),
                        status: Status::Resolved(resolution.rule),
                    }
                }
                None => PlannedModel {
                    model: model.clone(),
                    connection: None,
                    status: Status::Unresolved,
                },
            }
        })
        .collect();
    Plan { models, assigned }
}

fn adapter_label(source: &AdapterSource) -> String {
    match source {
        AdapterSource::Named(name) => name.clone(),
        AdapterSource::Instance(_) => "<instance>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlanJson {
    manifest: String,
    summary: SummaryJson,
    connections: Vec<ConnectionJson>,
    models: Vec<ModelJson>,
}

#[derive(Serialize)]
struct SummaryJson {
    connections: usize,
    models: usize,
    unresolved: usize,
}

#[derive(Serialize)]
struct ConnectionJson {
    name: String,
    adapter: String,
    default: bool,
    matchers: Vec<Value>,
    models: Vec<String>,
}

#[derive(Serialize)]
struct ModelJson {
    model: String,
    connection: Option<String>,
    rule: Option<ResolutionRule>,
    status: &'static str,
}

fn print_json(manifest: &Path, shapes: &[ConnectionShape], plan: Plan) -> Result<()> {
    let unresolved = plan.unresolved_count();
    let payload = PlanJson {
        manifest: manifest.display().to_string(),
        summary: SummaryJson {
            connections: shapes.len(),
            models: plan.models.len(),
            unresolved,
        },
        connections: shapes
            .iter()
            .zip(&plan.assigned)
            .map(|(shape, assigned)| ConnectionJson {
                name: shape.name.0.clone(),
                adapter: adapter_label(&shape.adapter),
                default: shape.route.is_default,
                matchers: shape.route.matchers.iter().map(|m| m.to_value()).collect(),
                models: assigned.iter().map(|m| m.0.clone()).collect(),
            })
            .collect(),
        models: plan
            .models
            .into_iter()
            .map(|row| ModelJson {
                model: row.model.0,
                connection: row.connection.map(|i| shapes[i].name.0.clone()),
                rule: match row.status {
                    Status::Resolved(rule) => Some(rule),
                    Status::Unresolved | Status::Unwired => None,
                },
                status: status_key(row.status),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "model")]
    model: String,
    #[tabled(rename = "connection")]
    connection: String,
    #[tabled(rename = "rule")]
    rule: String,
    #[tabled(rename = "status")]
    status: String,
}

fn print_table(manifest: &Path, shapes: &[ConnectionShape], plan: Plan) {
    println!(
        "Switchboard v{} | {} | {} connections | {} models | {} unresolved",
        env!("CARGO_PKG_VERSION"),
        manifest.display(),
        shapes.len(),
        plan.models.len(),
        plan.unresolved_count(),
    );

    if plan.models.is_empty() {
        println!("No models declared.");
        return;
    }
    if shapes.is_empty() {
        println!("No connections declared; models stay unwired.");
    }

    let rows: Vec<PlanTableRow> = plan
        .models
        .into_iter()
        .map(|row| PlanTableRow {
            model: row.model.0,
            connection: row
                .connection
                .map(|i| {
                    let shape = &shapes[i];
                    format!("{} ({})", shape.name, adapter_label(&shape.adapter))
                })
                .unwrap_or_else(|| "-".to_string()),
            rule: match row.status {
                Status::Resolved(rule) => rule.to_string(),
                Status::Unresolved | Status::Unwired => "-".to_string(),
            },
            status: status_indicator(row.status),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn status_key(status: Status) -> &'static str {
    match status {
        Status::Resolved(_) => "resolved",
        Status::Unresolved => "unresolved",
        Status::Unwired => "unwired",
    }
}

fn status_indicator(status: Status) -> String {
    let label = status_key(status).to_uppercase();
    match status {
        Status::Resolved(_) => label.green().to_string(),
        Status::Unresolved => label.red().bold().to_string(),
        Status::Unwired => label.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchboard_core::{ConnectionDeclaration, ConnectionName, ModelMatcher};

    fn shape(name: &str, decl: ConnectionDeclaration) -> ConnectionShape {
        check_shape(&ConnectionName::from(name), &decl.adapter_name("memory")).expect("valid shape")
    }

    fn models(names: &[&str]) -> Vec<(ModelName, Value)> {
        names.iter().map(|n| (ModelName::from(*n), json!({}))).collect()
    }

    #[test]
    fn plan_records_rules_and_assignments() {
        let shapes = vec![
            shape(
                "mongo",
                ConnectionDeclaration::new().models([ModelMatcher::exact("post")]),
            ),
            shape("mysql", ConnectionDeclaration::new().default_connection(true)),
        ];
        let plan = build_plan(&shapes, &models(&["post", "user"]));

        assert_eq!(plan.models[0].status, Status::Resolved(ResolutionRule::Matched));
        assert_eq!(plan.models[1].status, Status::Resolved(ResolutionRule::Default));
        assert_eq!(plan.assigned[0], vec![ModelName::from("post")]);
        assert_eq!(plan.assigned[1], vec![ModelName::from("user")]);
        assert_eq!(plan.unresolved_count(), 0);
    }

    #[test]
    fn unmatched_models_are_unresolved() {
        let shapes = vec![
            shape("a", ConnectionDeclaration::new().models([ModelMatcher::exact("post")])),
            shape("b", ConnectionDeclaration::new()),
        ];
        let plan = build_plan(&shapes, &models(&["post", "ghost"]));
        assert_eq!(plan.models[1].status, Status::Unresolved);
        assert_eq!(plan.models[1].connection, None);
        assert_eq!(plan.unresolved_count(), 1);
    }

    #[test]
    fn without_connections_models_are_unwired_not_unresolved() {
        let plan = build_plan(&[], &models(&["post"]));
        assert_eq!(plan.models[0].status, Status::Unwired);
        assert_eq!(plan.unresolved_count(), 0);
    }
}
