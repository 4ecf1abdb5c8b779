mod config;
mod error;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use allowlist::{CapabilitySet, ContextRegistry, Loader};
use clap::{Parser, Subcommand};
use tracing::debug;

use config::{Config, ContextConfig};
use error::{Error, Result};

const CONFIG_FILE: &str = "allowlist.toml";

#[derive(Parser)]
#[command(name = "allowlistc")]
#[command(about = "Check and inspect script capability allowlists", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log merge details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and merge declaration files, then print a summary
    Check {
        /// Declaration sources
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Do not include the built-in base set
        #[arg(long)]
        no_base: bool,
    },
    /// Print the capability set of a configured context as JSON
    Dump {
        /// Context name (optional when only one is configured)
        #[arg(long)]
        context: Option<String>,
    },
    /// List configured contexts
    Contexts,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { files, no_base } => cmd_check(&files, !no_base),
        Commands::Dump { context } => cmd_dump(&cli.config, context.as_deref()),
        Commands::Contexts => cmd_contexts(&cli.config),
    }
}

fn cmd_check(files: &[PathBuf], base: bool) -> Result<()> {
    let set = load_sources(files, base)?;
    print_summary(&set);
    Ok(())
}

fn cmd_dump(config_path: &Path, context: Option<&str>) -> Result<()> {
    println!("{}", dump(config_path, context)?);
    Ok(())
}

fn cmd_contexts(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    if config.contexts.is_empty() {
        println!("No contexts configured in {}.", config_path.display());
        return Ok(());
    }

    println!("{:<20} {:>5} {:>8} {:>8}", "CONTEXT", "BASE", "SOURCES", "CLASSES");
    println!("{}", "-".repeat(44));
    for row in context_rows(&config)? {
        println!(
            "{:<20} {:>5} {:>8} {:>8}",
            row.name,
            if row.base { "yes" } else { "no" },
            row.sources,
            row.classes
        );
    }
    Ok(())
}

/// The pretty-printed JSON of one configured context.
fn dump(config_path: &Path, context: Option<&str>) -> Result<String> {
    let config = Config::load(config_path)?;
    let context = match context {
        Some(name) => config.context(name).ok_or_else(|| Error::UnknownContext {
            name: name.to_string(),
            config: config_path.display().to_string(),
        })?,
        None => match config.contexts.as_slice() {
            [only] => only,
            contexts => {
                return Err(Error::AmbiguousContext {
                    contexts: contexts.iter().map(|c| c.name.clone()).collect(),
                });
            }
        },
    };

    let registry = ContextRegistry::default();
    register(&registry, context)?;
    let Some(set) = registry.lookup(&context.name) else {
        return Err(Error::UnknownContext {
            name: context.name.clone(),
            config: config_path.display().to_string(),
        });
    };
    Ok(serde_json::to_string_pretty(&*set)?)
}

/// One line of the `contexts` listing.
#[derive(Debug, PartialEq)]
struct ContextRow {
    name: String,
    base: bool,
    sources: usize,
    classes: usize,
}

fn context_rows(config: &Config) -> Result<Vec<ContextRow>> {
    let registry = ContextRegistry::default();
    for context in &config.contexts {
        register(&registry, context)?;
    }

    let mut rows = Vec::new();
    for name in registry.contexts() {
        let (Some(context), Some(set)) = (config.context(&name), registry.lookup(&name)) else {
            continue;
        };
        rows.push(ContextRow {
            name,
            base: context.base,
            sources: context.sources.len(),
            classes: set.classes().len(),
        });
    }
    Ok(rows)
}

fn register(registry: &ContextRegistry, context: &ContextConfig) -> Result<()> {
    debug!(context = %context.name, sources = context.sources.len(), "loading context");
    let set = load_sources(&context.sources, context.base)?;
    registry.register(context.name.clone(), vec![Arc::new(set)])?;
    Ok(())
}

fn load_sources(files: &[PathBuf], base: bool) -> Result<CapabilitySet> {
    let mut loader = Loader::new();
    if base {
        let base = allowlist::base()?;
        loader = loader.include(&base);
    }
    for file in files {
        loader = loader.file(file)?;
    }
    Ok(loader.load()?)
}

fn print_summary(set: &CapabilitySet) {
    let members: usize = set
        .classes()
        .iter()
        .map(|c| c.constructors().len() + c.methods().len() + c.fields().len())
        .sum();
    println!("{} classes, {} members", set.classes().len(), members);
    println!("{} script type names", set.aliases().count());
    println!(
        "{} imported methods, {} class bindings, {} instance bindings",
        set.imported_methods().len(),
        set.class_bindings().len(),
        set.instance_bindings().len()
    );
}
