use clap::{Parser, Subcommand};
use geodocs::model::ANONYMOUS_USER;
use std::path::PathBuf;

/// Returns the version string, with git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "geodocs", version = get_version())]
#[command(about = "Store and retrieve geospatial context documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to geodocs.toml in the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a document and print its name
    #[command(alias = "s")]
    Save {
        /// File to read, or - for stdin
        file: PathBuf,

        /// Format tag (wmc, sld, kml, gpx)
        #[arg(short, long)]
        format: String,

        /// Owner of the document
        #[arg(short, long, default_value = ANONYMOUS_USER)]
        user: String,
    },

    /// Load a document by name
    #[command(alias = "get")]
    Load {
        /// Name returned by save, or a legacy filename
        name: String,

        #[arg(short, long)]
        format: String,

        /// Write the content here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List a user's documents of one format as JSON
    #[command(alias = "ls")]
    List {
        #[arg(short, long)]
        format: String,

        #[arg(short, long, default_value = ANONYMOUS_USER)]
        user: String,
    },

    /// Delete a document by hash
    #[command(alias = "rm")]
    Delete {
        /// 32-character document hash
        hash: String,

        #[arg(short, long)]
        format: String,

        #[arg(short, long, default_value = ANONYMOUS_USER)]
        user: String,
    },

    /// Show supported formats
    Formats,
}
