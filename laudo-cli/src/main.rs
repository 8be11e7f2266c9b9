//! Command-line interface for laudo
//! This binary fills .docx report templates from a JSON dataset and lists what a template expects.
//!
//! Usage:
//!   laudo generate `<template>` --data `<json>` --output `<docx>` [--attachments `<json>`] [--config `<toml>`]
//!   laudo placeholders `<template>` [--data `<json>`] [--config `<toml>`]
//!   laudo blocks [--config `<toml>`]
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default: `warn`).

mod manifest;

use clap::{Arg, ArgMatches, Command};
use laudo_config::{LaudoConfig, Loader};
use laudo_engine::config::{BlockCatalog, CatalogEntry, DynamicRule, EmptyPolicy};
use laudo_engine::template::{scan_placeholders, Placeholder};
use laudo_engine::{Attachments, Dataset, Document, DocumentAssembler};
use std::path::{Path, PathBuf};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_arg = || {
        Arg::new("config")
            .long("config")
            .short('c')
            .help("TOML file layered over the built-in settings")
    };
    let matches = Command::new("laudo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate expert reports from .docx templates")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("generate")
                .about("Fill a template and write the finished document")
                .arg(
                    Arg::new("template")
                        .help("Path to the .docx template")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("data")
                        .long("data")
                        .short('d')
                        .help("JSON object with the report data")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Where to write the generated .docx")
                        .required(true),
                )
                .arg(
                    Arg::new("attachments")
                        .long("attachments")
                        .short('a')
                        .help("JSON manifest with appendices, answer images and attachments"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("placeholders")
                .about("List the placeholders of a template")
                .arg(
                    Arg::new("template")
                        .help("Path to the .docx template")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("data")
                        .long("data")
                        .short('d')
                        .help("JSON dataset to check the placeholders against"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("blocks")
                .about("List the configured block markers")
                .arg(config_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("generate", sub)) => handle_generate_command(sub),
        Some(("placeholders", sub)) => handle_placeholders_command(sub),
        Some(("blocks", sub)) => handle_blocks_command(sub),
        _ => unreachable!("subcommand is required"),
    }
}

/// Handle the generate command
fn handle_generate_command(matches: &ArgMatches) {
    let config = load_config(matches);
    let template = required_path(matches, "template");
    let output = required_path(matches, "output");
    let dataset = load_dataset(&required_path(matches, "data"));
    let attachments = match matches.get_one::<String>("attachments") {
        Some(path) => manifest::load(Path::new(path)).unwrap_or_else(|e| fail(e)),
        None => Attachments::new(),
    };

    let assembler = DocumentAssembler::new(config.engine);
    let report = assembler
        .generate(&template, &dataset, &attachments, &output)
        .unwrap_or_else(|e| fail(e));

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    println!("{}", report.output.display());
}

/// Handle the placeholders command
fn handle_placeholders_command(matches: &ArgMatches) {
    let config = load_config(matches);
    let template = required_path(matches, "template");
    let document = Document::open(&template).unwrap_or_else(|e| fail(e));
    let dataset = match matches.get_one::<String>("data") {
        Some(path) => Some(load_dataset(Path::new(path))),
        None => None,
    };

    let catalog = BlockCatalog::from_config(&config.engine);
    let empty = Dataset::new();
    let reports = scan_placeholders(&document, &catalog, dataset.as_ref().unwrap_or(&empty));
    if reports.is_empty() {
        println!("No placeholders found.");
        return;
    }
    for report in reports {
        let kind = match report.placeholder {
            Placeholder::Simple(_) => "simple",
            Placeholder::ListMarker(_) => "list",
            Placeholder::BlockMarker(_) => "block",
        };
        let status = match (&dataset, report.resolves) {
            (None, _) => "",
            (Some(_), true) => "  ok",
            (Some(_), false) => "  missing",
        };
        println!(
            "{:<12} {:<8} {}{}",
            report.location.to_string(),
            kind,
            report.token,
            status
        );
    }
}

/// Handle the blocks command
fn handle_blocks_command(matches: &ArgMatches) {
    let config = load_config(matches);
    let catalog = BlockCatalog::from_config(&config.engine);
    for (marker, entry) in catalog.entries() {
        let description = match entry {
            CatalogEntry::Header(header) => format!("header, {} lines", header.lines.len()),
            CatalogEntry::List(list) => match list.empty {
                EmptyPolicy::Fallback => "list, fallback when empty".to_string(),
                EmptyPolicy::Omit => "list, omitted when empty".to_string(),
            },
            CatalogEntry::Dynamic(block) => match &block.rule {
                DynamicRule::RecordList { .. } => format!("record list ({})", block.label),
                DynamicRule::Prose { .. } => format!("prose ({})", block.label),
                DynamicRule::Questions { skip_flag, .. } => {
                    format!("questions ({}), skipped by {}", block.label, skip_flag)
                }
            },
        };
        println!("  {:<22} {}", marker, description);
    }
}

fn load_config(matches: &ArgMatches) -> LaudoConfig {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| fail(e))
}

fn load_dataset(path: &Path) -> Dataset {
    let source = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read dataset {}: {}", path.display(), e)));
    Dataset::from_json_str(&source).unwrap_or_else(|e| fail(e))
}

fn required_path(matches: &ArgMatches, name: &str) -> PathBuf {
    matches
        .get_one::<String>(name)
        .map(PathBuf::from)
        .unwrap_or_else(|| fail(format!("missing argument {}", name)))
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", error);
    std::process::exit(1);
}
