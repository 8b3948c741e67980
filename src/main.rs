// SPDX-License-Identifier: PMPL-1.0-or-later

//! hexloc: inspect, validate and ship hex-token localization catalogs
//!
//! Thin command-line front end over the `hexloc` library: catalog QA for CI,
//! text-to-binary export for release builds, and authoring helpers.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use hexloc::check::{CheckReport, Severity, Verdict};
use hexloc::config::Config;
use hexloc::{check, locale, marshal, tokengen, Engine};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexloc")]
#[command(version)]
#[command(about = "Hex-token localization catalogs: check, export and query")]
#[command(long_about = None)]
struct Cli {
    /// Catalog file (text or binary); defaults to `catalog` from the config
    #[arg(short, long, global = true)]
    catalog: Option<PathBuf>,

    /// Config file (default: ./hexloc.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Load catalogs in strict mode
    #[arg(long, global = true)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate placeholders and references; exits with the check status
    Check {
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        /// Also write the report to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print every entry as a table
    Dump,

    /// Search entry texts and labels (case-insensitive)
    Find {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Resolve a token
    Translate {
        #[arg(value_name = "TOKEN")]
        token: String,

        /// Positional arguments for %0, %1, ... (prefix with '=' for literals)
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        /// Select the plural variant for this count
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,
    },

    /// Write the catalog as a binary v2 catalog
    Export {
        /// Output file (default: config `export`, else the catalog path with .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show catalog metadata
    Info,

    /// Write the reference graph in Graphviz DOT format
    Graph {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate hex tokens not yet used by any catalog under PATH
    NewToken {
        /// Catalog file or directory scanned for *.txt catalogs
        #[arg(value_name = "PATH", default_value = "locale")]
        path: PathBuf,

        /// Token length (6-32; default: config `token_length`)
        #[arg(short, long)]
        length: Option<usize>,

        /// Number of tokens
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?.with_env_overrides(),
        None => Config::load_default(),
    };
    let strict = cli.strict || config.strict;

    match cli.command {
        Commands::Check { json, output } => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            let report = engine.check_report();
            let rendered = if json {
                report.to_json().context("serializing check report")?
            } else {
                report.render()
            };

            if json {
                println!("{}", rendered);
            } else {
                print_check(&report);
            }
            if let Some(path) = output {
                write_output(&path, rendered.as_bytes())?;
                eprintln!("Report saved to: {}", path.display());
            }
            if report.status != 0 {
                std::process::exit(report.status);
            }
        }

        Commands::Dump => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            print!("{}", engine.dump());
        }

        Commands::Find { query } => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            print!("{}", engine.find(&query));
        }

        Commands::Translate { token, args, count } => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            let text = match count {
                Some(count) => engine.translate_plural(&token, count, &args),
                None => engine.translate(&token, &args),
            };
            println!("{}", text);
        }

        Commands::Export { output } => {
            let source = catalog_path(cli.catalog.as_deref(), &config)?;
            let engine = Engine::new();
            let entries = engine
                .load_file(&source, strict)
                .with_context(|| format!("loading {}", source.display()))?;
            let target = output
                .or_else(|| config.export.clone())
                .unwrap_or_else(|| source.with_extension("bin"));
            if target == source {
                bail!("refusing to overwrite the source catalog {}", source.display());
            }
            engine
                .export_binary(&target)
                .with_context(|| format!("exporting to {}", target.display()))?;
            println!(
                "{} {} ({} entries)",
                "Binary catalog written to:".green(),
                target.display(),
                entries
            );
        }

        Commands::Info => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            print_info(&engine);
        }

        Commands::Graph { output } => {
            let engine = open_catalog(cli.catalog.as_deref(), &config, strict)?;
            let catalog = engine.catalog().context("no catalog loaded")?;
            let dot = check::graph::to_dot(&catalog);
            match output {
                Some(path) => {
                    write_output(&path, dot.as_bytes())?;
                    println!("Graph saved to: {}", path.display());
                    println!("Render with: dot -Tpng {} -o graph.png", path.display());
                }
                None => print!("{}", dot),
            }
        }

        Commands::NewToken {
            path,
            length,
            count,
        } => {
            let length = length.unwrap_or(config.token_length);
            let mut taken = tokengen::existing_tokens(&path)?;
            for token in tokengen::generate_unique(length, count, &mut taken)? {
                println!("{}", token);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn catalog_path(cli: Option<&Path>, config: &Config) -> Result<PathBuf> {
    match cli.map(Path::to_path_buf).or_else(|| config.catalog.clone()) {
        Some(path) => Ok(path),
        None => bail!("no catalog given (use --catalog or set `catalog` in hexloc.yaml)"),
    }
}

fn open_catalog(cli: Option<&Path>, config: &Config, strict: bool) -> Result<Engine> {
    let path = catalog_path(cli, config)?;
    let engine = Engine::new();
    engine
        .load_file(&path, strict)
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(engine)
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_check(report: &CheckReport) {
    if report.verdict == Verdict::Empty {
        print!("{}", report.render().red());
        return;
    }

    println!("{}", "CHECK: REPORT".bold().cyan());
    println!("------------------------------");
    for finding in &report.findings {
        let line = finding.to_string();
        match finding.severity() {
            Severity::Warn => println!("{}", line.yellow()),
            Severity::Error => println!("{}", line.red()),
        }
    }
    println!("------------------------------");
    println!("Tokens: {}", report.tokens);
    println!("Warnings: {}", report.warnings);
    println!("Errors: {}", report.errors);
    let headline = report.verdict.headline();
    match report.verdict {
        Verdict::Ok => println!("{}", headline.green().bold()),
        Verdict::OkWithWarnings => println!("{}", headline.yellow().bold()),
        Verdict::Fail | Verdict::Empty => println!("{}", headline.red().bold()),
    }
}

fn print_info(engine: &Engine) {
    let entries = engine.catalog().map(|c| c.len()).unwrap_or(0);
    println!("{}", "CATALOG".bold().yellow());
    println!("  Entries: {}", entries);
    print_locale("Locale", &engine.locale());
    print_locale("Fallback", &engine.fallback());
    let note = engine.note();
    if !note.is_empty() {
        println!("  Note: {}", note);
    }
    println!("  Plural rule: {}", engine.plural_rule());
    println!(
        "  ABI version: {} (binary formats up to v{})",
        marshal::ABI_VERSION,
        marshal::BINARY_VERSION_SUPPORTED_MAX
    );
}

fn print_locale(field: &str, tag: &str) {
    let Some(info) = locale::describe(tag) else {
        println!("  {}: {}", field, "(not set)".dimmed());
        return;
    };

    match (info.valid, info.name, info.native) {
        (true, Some(name), Some(native)) if name != native => {
            println!("  {}: {} ({}, {})", field, info.tag, name, native)
        }
        (true, Some(name), _) => println!("  {}: {} ({})", field, info.tag, name),
        (true, None, _) => println!("  {}: {}", field, info.tag),
        (false, _, _) => println!(
            "  {}: {} {}",
            field,
            info.tag,
            format!("(unknown language code '{}')", info.language).yellow()
        ),
    }
}
