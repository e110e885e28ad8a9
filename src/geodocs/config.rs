//! # Configuration
//!
//! Configuration is loaded with [`confique`], layered in priority order:
//! 1. **Environment variables**: `GEODOCS_DATABASE`, `GEODOCS_WMC_SCHEMA`, etc.
//! 2. **Config file**: `--config <FILE>`, else `geodocs.toml` in the OS config
//!    directory (via the `directories` crate) when it exists.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `database` | `geodocs.db` | SQLite file of the relational backend (`:memory:` allowed) |
//! | `legacy_dir` | `legacy` | Directory of legacy documents, created if missing |
//! | `schema_cache_ttl_secs` | `3600` | How long a fetched schema is reused; `0` disables caching |
//! | `schema_fetch_timeout_secs` | `30` | Timeout for fetching remote schemas |
//! | `wmc_schema`, `sld_schema`, `kml_schema`, `gpx_schema` | unset | Schema location per format; unset skips validation |

use crate::error::{GeodocError, Result};
use crate::formats::SchemaLocations;
use crate::schema::ValidatorOptions;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "geodocs.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GeodocsConfig {
    /// SQLite database file holding the `geodocs` table.
    #[config(default = "geodocs.db", env = "GEODOCS_DATABASE")]
    pub database: PathBuf,

    /// Directory of documents stored before the relational backend existed.
    #[config(default = "legacy", env = "GEODOCS_LEGACY_DIR")]
    pub legacy_dir: PathBuf,

    #[config(default = 3600, env = "GEODOCS_SCHEMA_CACHE_TTL_SECS")]
    pub schema_cache_ttl_secs: u64,

    #[config(default = 30, env = "GEODOCS_SCHEMA_FETCH_TIMEOUT_SECS")]
    pub schema_fetch_timeout_secs: u64,

    #[config(env = "GEODOCS_WMC_SCHEMA")]
    pub wmc_schema: Option<String>,

    #[config(env = "GEODOCS_SLD_SCHEMA")]
    pub sld_schema: Option<String>,

    #[config(env = "GEODOCS_KML_SCHEMA")]
    pub kml_schema: Option<String>,

    #[config(env = "GEODOCS_GPX_SCHEMA")]
    pub gpx_schema: Option<String>,
}

impl Default for GeodocsConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("geodocs.db"),
            legacy_dir: PathBuf::from("legacy"),
            schema_cache_ttl_secs: 3600,
            schema_fetch_timeout_secs: 30,
            wmc_schema: None,
            sld_schema: None,
            kml_schema: None,
            gpx_schema: None,
        }
    }
}

impl GeodocsConfig {
    /// Load from the environment over `file` (which must exist) or, without one,
    /// over the default config file if present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let path = match file {
            Some(path) if !path.is_file() => {
                return Err(GeodocError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )))
            }
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|p| p.is_file()),
        };

        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| GeodocError::Config(e.to_string()))
    }

    pub fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            cache_ttl: Duration::from_secs(self.schema_cache_ttl_secs),
            fetch_timeout: Duration::from_secs(self.schema_fetch_timeout_secs),
        }
    }

    pub fn schema_locations(&self) -> SchemaLocations {
        SchemaLocations {
            wmc: self.wmc_schema.clone(),
            sld: self.sld_schema.clone(),
            kml: self.kml_schema.clone(),
            gpx: self.gpx_schema.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "georchestra", "geodocs")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
