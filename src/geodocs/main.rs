use clap::Parser;
use colored::*;
use geodocs::api::DocumentStore;
use geodocs::config::GeodocsConfig;
use geodocs::error::Result;
use geodocs::store::SqliteBackend;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "geodocs=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = GeodocsConfig::load(cli.config.as_deref())?;
    let store = DocumentStore::open(&config)?;

    match cli.command {
        Commands::Save { file, format, user } => handle_save(&store, &file, &format, &user),
        Commands::Load {
            name,
            format,
            output,
        } => handle_load(&store, &name, &format, output),
        Commands::List { format, user } => handle_list(&store, &format, &user),
        Commands::Delete { hash, format, user } => handle_delete(&store, &hash, &format, &user),
        Commands::Formats => handle_formats(&store),
    }
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

fn handle_save(
    store: &DocumentStore<SqliteBackend>,
    file: &Path,
    format: &str,
    user: &str,
) -> Result<()> {
    let content = read_input(file)?;
    let name = store.format(format)?.save(&content, user)?;
    println!("{}", name);
    Ok(())
}

fn handle_load(
    store: &DocumentStore<SqliteBackend>,
    name: &str,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let doc = store.format(format)?.load(name)?;
    match output {
        Some(path) => {
            std::fs::write(&path, doc.content())?;
            eprintln!("{} {} -> {}", "Loaded".green(), doc.name(), path.display());
        }
        None => print!("{}", doc.content()),
    }
    Ok(())
}

fn handle_list(store: &DocumentStore<SqliteBackend>, format: &str, user: &str) -> Result<()> {
    let entries = store.format(format)?.list(user);
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn handle_delete(
    store: &DocumentStore<SqliteBackend>,
    hash: &str,
    format: &str,
    user: &str,
) -> Result<()> {
    store.format(format)?.delete(hash, user)?;
    println!("{} {}", "Deleted".green(), hash);
    Ok(())
}

fn handle_formats(store: &DocumentStore<SqliteBackend>) -> Result<()> {
    for format in store.formats().iter() {
        println!(
            "{:<4} {:<5} {}",
            format.tag().bold(),
            format.extension(),
            format.mime_type().dimmed()
        );
    }
    Ok(())
}
