// Config Export Builder - Main Entry Point
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Config Export Builder
//!
//! Command-line driver: loads a server snapshot, adds the selected roots,
//! waits for dependency resolution and saves or publishes the bundle.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use uuid::Uuid;

use config_export_builder::models::{
    EntityKind, Error, Result, RootSelection, TemplateSelection,
};
use config_export_builder::session::{ServerSnapshot, SnapshotSession};
use config_export_builder::storage::DataStore;
use config_export_builder::{ExportBuilder, APP_NAME, VERSION};

/// Print version information and exit.
fn print_version() {
    println!("{} {}", APP_NAME, VERSION);
    println!("Copyright (C) 2026 Christos A. Daggas");
    println!("License: MIT");
    println!();
    println!("Dependency-closure builder for network-monitoring configuration exports.");
}

/// Print help information and exit.
fn print_help() {
    println!(
        "Usage: {} --snapshot FILE [SELECTION]... [OPTIONS]",
        env::args()
            .next()
            .unwrap_or_else(|| "config-export-builder".to_string())
    );
    println!();
    println!("Builds a configuration export with everything the selected objects depend on.");
    println!();
    println!("Selection (each may be repeated or given a comma-separated list):");
    println!("  --template ID            Template");
    println!("  --template-group ID      Template group, including nested groups");
    println!("  --event CODE             Event template");
    println!("  --trap ID                SNMP trap mapping");
    println!("  --rule GUID              Event processing rule");
    println!("  --script ID              Library script");
    println!("  --tool ID                Object tool");
    println!("  --summary-table ID       DCI summary table");
    println!("  --action ID              Server action");
    println!("  --web-service ID         Web service definition");
    println!("  --asset-attribute NAME   Asset management attribute");
    println!();
    println!("Options:");
    println!("  -s, --snapshot FILE      Server snapshot (JSON)");
    println!("      --description TEXT   Export description");
    println!("  -o, --output FILE        Save the bundle to FILE (default from settings)");
    println!("      --publish REPO_ID    Publish the bundle to a repository instead");
    println!("  -h, --help               Show this help message and exit");
    println!("  -v, --version            Show version information and exit");
    println!("  -d, --debug              Enable debug logging");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG                 Set log level (trace, debug, info, warn, error)");
}

/// Parsed command line.
#[derive(Debug, Default)]
struct Options {
    snapshot: Option<PathBuf>,
    templates: Vec<u32>,
    template_groups: Vec<u32>,
    events: Vec<u32>,
    traps: Vec<u32>,
    rules: Vec<Uuid>,
    scripts: Vec<u32>,
    tools: Vec<u32>,
    summary_tables: Vec<u32>,
    actions: Vec<u32>,
    web_services: Vec<u32>,
    asset_attributes: Vec<String>,
    description: String,
    output: Option<PathBuf>,
    publish: Option<i32>,
    debug: bool,
}

enum Command {
    Run(Options),
    Help,
    Version,
}

fn parse_list<T: std::str::FromStr>(option: &str, value: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| Error::Other(format!("Invalid value for {}: {}", option, v)))
        })
        .collect()
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| Error::Other(format!("Option {} requires a value", arg)))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-d" | "--debug" => options.debug = true,
            "-s" | "--snapshot" => options.snapshot = Some(PathBuf::from(value()?)),
            "-o" | "--output" => options.output = Some(PathBuf::from(value()?)),
            "--description" => options.description = value()?,
            "--publish" => {
                let id = value()?;
                options.publish = Some(
                    id.parse()
                        .map_err(|_| Error::Other(format!("Invalid repository id: {}", id)))?,
                );
            }
            "--template" => options.templates.extend(parse_list::<u32>(arg, &value()?)?),
            "--template-group" => options
                .template_groups
                .extend(parse_list::<u32>(arg, &value()?)?),
            "--event" => options.events.extend(parse_list::<u32>(arg, &value()?)?),
            "--trap" => options.traps.extend(parse_list::<u32>(arg, &value()?)?),
            "--rule" => options.rules.extend(parse_list::<Uuid>(arg, &value()?)?),
            "--script" => options.scripts.extend(parse_list::<u32>(arg, &value()?)?),
            "--tool" => options.tools.extend(parse_list::<u32>(arg, &value()?)?),
            "--summary-table" => options
                .summary_tables
                .extend(parse_list::<u32>(arg, &value()?)?),
            "--action" => options.actions.extend(parse_list::<u32>(arg, &value()?)?),
            "--web-service" => options
                .web_services
                .extend(parse_list::<u32>(arg, &value()?)?),
            "--asset-attribute" => options
                .asset_attributes
                .extend(parse_list::<String>(arg, &value()?)?),
            other => {
                return Err(Error::Other(format!("Unknown option: {}", other)));
            }
        }
    }

    Ok(Command::Run(options))
}

fn missing(kind: &str, key: impl ToString) -> Error {
    Error::unknown_object(kind, key)
}

/// Turn the command-line selection into root selections.
///
/// Templates, groups and the other fully described objects are looked up in
/// the snapshot. Traps, rules and actions go by id; the builder resolves them.
fn selections(options: &Options, snapshot: &ServerSnapshot) -> Result<Vec<RootSelection>> {
    let mut templates = Vec::new();
    for id in &options.templates {
        let details = snapshot.template(*id).ok_or_else(|| missing("template", id))?;
        templates.push(TemplateSelection::Template(details.template.clone()));
    }
    for id in &options.template_groups {
        let group = snapshot
            .template_group(*id)
            .ok_or_else(|| missing("template group", id))?;
        templates.push(TemplateSelection::Group(group.clone()));
    }

    let events = options
        .events
        .iter()
        .map(|code| snapshot.event(*code).cloned().ok_or_else(|| missing("event", code)))
        .collect::<Result<Vec<_>>>()?;
    let scripts = options
        .scripts
        .iter()
        .map(|id| snapshot.script(*id).cloned().ok_or_else(|| missing("script", id)))
        .collect::<Result<Vec<_>>>()?;
    let tools = options
        .tools
        .iter()
        .map(|id| snapshot.tool(*id).cloned().ok_or_else(|| missing("object tool", id)))
        .collect::<Result<Vec<_>>>()?;
    let summary_tables = options
        .summary_tables
        .iter()
        .map(|id| {
            snapshot
                .summary_table(*id)
                .cloned()
                .ok_or_else(|| missing("summary table", id))
        })
        .collect::<Result<Vec<_>>>()?;
    let web_services = options
        .web_services
        .iter()
        .map(|id| {
            snapshot
                .web_service(*id)
                .cloned()
                .ok_or_else(|| missing("web service", id))
        })
        .collect::<Result<Vec<_>>>()?;
    let asset_attributes = options
        .asset_attributes
        .iter()
        .map(|name| {
            snapshot
                .asset_attribute(name)
                .cloned()
                .ok_or_else(|| missing("asset attribute", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let selections = vec![
        RootSelection::Templates(templates),
        RootSelection::Events(events),
        RootSelection::SnmpTraps(options.traps.clone()),
        RootSelection::Rules(options.rules.clone()),
        RootSelection::Scripts(scripts),
        RootSelection::ObjectTools(tools),
        RootSelection::SummaryTables(summary_tables),
        RootSelection::Actions(options.actions.clone()),
        RootSelection::WebServices(web_services),
        RootSelection::AssetAttributes(asset_attributes),
    ];
    Ok(selections.into_iter().filter(|s| !s.is_empty()).collect())
}

async fn run(options: Options, store: DataStore) -> Result<()> {
    let snapshot_path = options
        .snapshot
        .clone()
        .ok_or_else(|| Error::Other("No server snapshot given (use --snapshot)".to_string()))?;

    let session = SnapshotSession::open(&snapshot_path)?;
    let roots = selections(&options, session.snapshot())?;
    if roots.is_empty() {
        tracing::warn!("Nothing selected, the bundle will be empty");
    }

    let builder = ExportBuilder::new(Arc::new(session), store.settings());
    let mut rounds = Vec::new();
    for root in roots {
        rounds.push(builder.add_root(root).await?);
    }
    for round in rounds {
        let report = round.wait().await?;
        for script in &report.unresolved_scripts {
            tracing::warn!("Referenced script '{}' not found in the library", script);
        }
    }

    println!("Export contents:");
    for (kind, count) in builder.current_counts() {
        if count > 0 || kind == EntityKind::Template {
            println!("  {:<28} {}", kind.display_name(), count);
        }
    }

    match options.publish {
        Some(repository_id) => {
            builder.publish(&options.description, repository_id).await?;
            println!("Published to repository {}", repository_id);
        }
        None => {
            let path = options
                .output
                .clone()
                .unwrap_or_else(|| store.default_export_path());
            let path = builder.save(&options.description, &path).await?;
            println!("Saved to {}", path.display());
        }
    }

    builder.close();
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(Command::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            print_version();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run(options)) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Try '--help' for more information.");
            return ExitCode::FAILURE;
        }
    };

    let store = DataStore::new();
    let settings = store.settings();

    // Initialize logging with appropriate level
    let log_level = if options.debug {
        tracing::Level::DEBUG
    } else {
        settings
            .log_level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(options, store)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_selection_lists() {
        let command = parse_args(&args(&[
            "--snapshot",
            "server.json",
            "--template",
            "1,2",
            "--template",
            "3",
            "--asset-attribute",
            "serial",
            "-d",
        ]))
        .unwrap();
        let Command::Run(options) = command else {
            panic!("expected run command");
        };
        assert_eq!(options.snapshot, Some(PathBuf::from("server.json")));
        assert_eq!(options.templates, vec![1, 2, 3]);
        assert_eq!(options.asset_attributes, vec!["serial".to_string()]);
        assert!(options.debug);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(&args(&["--trap", "x"])).is_err());
        assert!(parse_args(&args(&["--rule", "not-a-guid"])).is_err());
        assert!(parse_args(&args(&["--output"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
        assert!(matches!(parse_args(&args(&["-h"])), Ok(Command::Help)));
    }

    #[test]
    fn test_unknown_template_is_reported() {
        let options = Options {
            templates: vec![9],
            ..Options::default()
        };
        let err = selections(&options, &ServerSnapshot::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownObject { .. }));
    }

    #[test]
    fn test_id_selections_pass_through() {
        let options = Options {
            traps: vec![4],
            ..Options::default()
        };
        let roots = selections(&options, &ServerSnapshot::default()).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].kind(), EntityKind::SnmpTrap);
    }
}
