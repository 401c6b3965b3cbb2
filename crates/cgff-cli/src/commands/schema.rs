use crate::cli::{GlobalArgs, SchemaArgs};
use crate::config::{CliOverrides, build_config};
use crate::error::{CliError, Result};
use cgff::core::schema::registry::{PotentialSchema, SchemaRegistry};
use std::fmt::Write;

pub fn run(global: &GlobalArgs, args: &SchemaArgs) -> Result<()> {
    let app = build_config(global, &CliOverrides::default())?;
    let text = match &args.name {
        Some(name) => describe(&app.registry, name)?,
        None => list(&app.registry),
    };
    print!("{}", text);
    Ok(())
}

fn list(registry: &SchemaRegistry) -> String {
    let mut out = String::new();
    for name in registry.names() {
        if let Some(schema) = registry.get(name) {
            let _ = writeln!(
                out,
                "{:<28} arity {}  {}",
                schema.name, schema.arity, schema.ordering
            );
        }
    }
    out
}

fn describe(registry: &SchemaRegistry, name: &str) -> Result<String> {
    let schema = registry
        .get(name)
        .ok_or_else(|| CliError::Argument(format!("Unknown potential type '{}'", name)))?;
    Ok(render_schema(schema))
}

fn render_schema(schema: &PotentialSchema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", schema.name);
    let _ = writeln!(out, "  arity:    {}", schema.arity);
    let _ = writeln!(out, "  ordering: {}", schema.ordering);
    let _ = writeln!(out, "  parameters:");
    for spec in &schema.parameters {
        let role = if spec.is_derived() {
            "derived"
        } else if spec.fixed {
            "fixed"
        } else {
            "free"
        };
        let _ = writeln!(out, "    {:<12} default {:<8} {}", spec.name, spec.default, role);
    }
    out
}
