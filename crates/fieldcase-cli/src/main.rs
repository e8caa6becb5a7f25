//! `fieldcase` command-line tool
//!
//! Migrates field-name casing in portal dashboards, online or on local files.

mod backup;
mod commands;
mod config;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use commands::{MigrateArgs, MigrationOverrides, RewriteArgs};
use config::Settings;
use fieldcase_core::{CasePolicy, DatasetRef};
use fieldcase_portal::PortalConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("fieldcase")
        .version(fieldcase_core::VERSION)
        .about("Migrate dashboard field references to canonical casing")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: ./fieldcase.toml if present)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging unless RUST_LOG is set"),
        )
        .subcommand(
            Command::new("migrate")
                .about("Migrate portal items and push the results")
                .arg(
                    Arg::new("item")
                        .long("item")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("Dashboard item id (repeatable)"),
                )
                .args(dataset_args())
                .args(migration_args())
                .arg(
                    Arg::new("retarget")
                        .long("retarget")
                        .help("Re-point bound item data sources to this dataset id"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show changes without pushing"),
                )
                .arg(
                    Arg::new("backup-dir")
                        .long("backup-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write original and migrated documents here"),
                )
                .arg(Arg::new("portal-url").long("portal-url").help("Sharing REST root URL"))
                .arg(Arg::new("username").long("username").help("Portal account name"))
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_parser(value_parser!(u64))
                        .help("Per-request timeout in seconds"),
                ),
        )
        .subcommand(
            Command::new("rewrite")
                .about("Migrate a local dashboard JSON file")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Dashboard JSON file"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file (default: stdout)"),
                )
                .args(dataset_args())
                .args(migration_args())
                .arg(
                    Arg::new("field")
                        .long("field")
                        .action(ArgAction::Append)
                        .help("Field name of the dataset layer (repeatable)"),
                )
                .arg(
                    Arg::new("fields")
                        .long("fields")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with the layer's fields"),
                ),
        )
        .subcommand(
            Command::new("scopes")
                .about("List scopes bound to a dataset in a local file")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Dashboard JSON file"),
                )
                .arg(
                    Arg::new("dataset")
                        .long("dataset")
                        .required(true)
                        .help("Dataset item id"),
                ),
        )
}

fn dataset_args() -> [Arg; 2] {
    [
        Arg::new("dataset")
            .long("dataset")
            .required(true)
            .help("Dataset item id the fields belong to"),
        Arg::new("layer")
            .long("layer")
            .default_value("0")
            .value_parser(value_parser!(u32))
            .help("Layer index within the dataset"),
    ]
}

fn migration_args() -> [Arg; 2] {
    [
        Arg::new("unsafe")
            .long("unsafe")
            .action(ArgAction::SetTrue)
            .help("Treat the whole document as one scope"),
        Arg::new("case")
            .long("case")
            .value_parser(["lowercase", "authoritative"])
            .help("Casing written back (default: lowercase)"),
    ]
}

fn dataset(args: &ArgMatches) -> DatasetRef {
    let item_id = args.get_one::<String>("dataset").cloned().unwrap_or_default();
    let layer = args.get_one::<u32>("layer").copied().unwrap_or_default();
    DatasetRef::new(item_id, layer)
}

fn overrides(args: &ArgMatches) -> MigrationOverrides {
    MigrationOverrides {
        unsafe_mode: args.get_flag("unsafe"),
        case_policy: args.get_one::<String>("case").map(|case| match case.as_str() {
            "authoritative" => CasePolicy::Authoritative,
            _ => CasePolicy::Lowercase,
        }),
        retarget: args.try_get_one::<String>("retarget").ok().flatten().cloned(),
    }
}

fn portal_config(args: &ArgMatches, mut portal: PortalConfig) -> PortalConfig {
    if let Some(url) = args.get_one::<String>("portal-url") {
        portal = portal.with_url(url.as_str());
    }
    if let Some(secs) = args.get_one::<u64>("timeout") {
        portal = portal.with_timeout_secs(*secs);
    }
    if let Some(username) = args.get_one::<String>("username") {
        portal.username = Some(username.clone());
    }
    portal
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));
    let mut settings = Settings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("migrate", args)) => {
            settings.portal = portal_config(args, settings.portal);
            let migrate_args = MigrateArgs {
                items: args.get_many::<String>("item").into_iter().flatten().cloned().collect(),
                dataset: dataset(args),
                dry_run: args.get_flag("dry-run"),
                backup_dir: args.get_one::<PathBuf>("backup-dir").cloned(),
                overrides: overrides(args),
            };
            if !commands::migrate(settings, migrate_args).await? {
                std::process::exit(1);
            }
        }
        Some(("rewrite", args)) => {
            let rewrite_args = RewriteArgs {
                input: args.get_one::<PathBuf>("input").cloned().unwrap_or_default(),
                output: args.get_one::<PathBuf>("output").cloned(),
                dataset: dataset(args),
                fields: args.get_many::<String>("field").into_iter().flatten().cloned().collect(),
                fields_file: args.get_one::<PathBuf>("fields").cloned(),
                overrides: overrides(args),
            };
            commands::rewrite(settings, rewrite_args).await?;
        }
        Some(("scopes", args)) => {
            let input = args.get_one::<PathBuf>("input").cloned().unwrap_or_default();
            let dataset_id = args.get_one::<String>("dataset").cloned().unwrap_or_default();
            commands::scopes(&input, &dataset_id).await?;
        }
        _ => {}
    }
    Ok(())
}
