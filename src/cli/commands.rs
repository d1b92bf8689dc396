//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the operation
//! 3. Prints the result as pretty JSON on stdout
//!
//! Handlers do NOT touch the catalog or graph directly; every state
//! change flows through [`RegistryEngine`]. One engine is opened per
//! invocation and closed (flushed) before exit.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::args::{Cli, Command, LineageCommand, ProductCommand, StatsCommand};
use crate::core::catalog::ProductFilter;
use crate::core::config::Config;
use crate::core::lineage::{EdgeDraft, LineageFilter};
use crate::core::product::{ProductDraft, ProductPatch};
use crate::core::types::Page;
use crate::engine::RegistryEngine;

/// Dispatch a command to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let engine = RegistryEngine::open(&config).context("failed to open registry")?;

    let result = match cli.command {
        Command::Product(cmd) => product(&engine, cmd),
        Command::Lineage(cmd) => lineage(&engine, cmd),
        Command::Stats(cmd) => stats(&engine, cmd),
        Command::Status => status(&engine, &config),
    };

    // Flush even after a failed command; earlier mutations may be
    // waiting under the on-shutdown policy.
    let closed = engine.close().context("failed to flush registry");
    result.and(closed)
}

/// Resolve configuration from flags and the standard locations.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from '{}'", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    if let Some(data_dir) = &cli.data_dir {
        config.registry.data_dir = Some(data_dir.clone());
    }
    Ok(config)
}

fn product(engine: &RegistryEngine, cmd: ProductCommand) -> Result<()> {
    match cmd {
        ProductCommand::Register {
            name,
            domain,
            owner,
            description,
            schema,
            version,
            status,
            tags,
        } => {
            let mut draft = ProductDraft::new(name, domain, owner, description).with_tags(tags);
            if let Some(raw) = schema {
                draft = draft.with_schema(parse_object("schema", &raw)?);
            }
            if let Some(version) = version {
                draft = draft.with_version(version);
            }
            if let Some(status) = status {
                draft = draft.with_status(status);
            }
            print_json(&engine.register_product(draft)?)
        }

        ProductCommand::Get { name } => print_json(&engine.get_product(&name)?),

        ProductCommand::List {
            domain,
            status,
            tag,
            offset,
            limit,
        } => {
            let filter = ProductFilter {
                domain,
                status,
                tag,
            };
            print_json(&engine.list_products(&filter, Page::new(offset, limit))?)
        }

        ProductCommand::Update {
            name,
            domain,
            owner,
            description,
            schema,
            status,
            version,
            tags,
        } => {
            let patch = ProductPatch {
                domain,
                owner,
                description,
                schema: schema
                    .map(|raw| parse_object("schema", &raw))
                    .transpose()?,
                status,
                version,
                tags,
            };
            if patch.is_empty() {
                bail!("nothing to update: pass at least one field flag");
            }
            print_json(&engine.update_product(&name, patch)?)
        }

        ProductCommand::Delete { name } => {
            let deleted = engine.delete_product(&name)?;
            println!("deleted '{}'", deleted.name);
            Ok(())
        }
    }
}

fn lineage(engine: &RegistryEngine, cmd: LineageCommand) -> Result<()> {
    match cmd {
        LineageCommand::Add {
            source,
            target,
            transformation,
            lineage_type,
            confidence,
            metadata,
        } => {
            let mut draft = EdgeDraft::new(source, target, transformation);
            if let Some(lineage_type) = lineage_type {
                draft = draft.with_type(lineage_type);
            }
            if let Some(confidence) = confidence {
                draft = draft.with_confidence(confidence);
            }
            if let Some(raw) = metadata {
                draft = draft.with_metadata(parse_object("metadata", &raw)?);
            }
            print_json(&engine.register_lineage(draft)?)
        }

        LineageCommand::Query {
            source,
            target,
            lineage_type,
            offset,
            limit,
        } => {
            let filter = LineageFilter {
                source,
                target,
                lineage_type,
            };
            print_json(&engine.query_lineage(&filter, Page::new(offset, limit))?)
        }

        LineageCommand::Upstream { name, max_depth } => {
            print_json(&engine.upstream(&name, max_depth)?)
        }

        LineageCommand::Downstream { name, max_depth } => {
            print_json(&engine.downstream(&name, max_depth)?)
        }
    }
}

fn stats(engine: &RegistryEngine, cmd: StatsCommand) -> Result<()> {
    match cmd {
        StatsCommand::Domains => print_json(&engine.domain_distribution()?),
        StatsCommand::Lineage => print_json(&engine.lineage_stats()?),
    }
}

fn status(engine: &RegistryEngine, config: &Config) -> Result<()> {
    let counts = engine.counts()?;
    let limits = config.limits();
    print_json(&serde_json::json!({
        "data_dir": config.data_dir(),
        "config_file": config.loaded_from(),
        "products": counts.products,
        "edges": counts.edges,
        "max_products": limits.max_products,
        "max_lineage_entries": limits.max_lineage_entries,
    }))
}

/// Parse a `--schema` / `--metadata` argument into a JSON object.
fn parse_object(label: &str, raw: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("--{label} is not valid JSON"))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("--{label} must be a JSON object"),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}
