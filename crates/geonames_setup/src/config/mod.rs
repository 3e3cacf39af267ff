use std::{
    env, fs,
    path::{self, Path, PathBuf},
};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::ProvisionError;

pub const DEFAULT_GEONAMES_URL: &str = "http://download.geonames.org/export/dump/allCountries.zip";
pub const DEFAULT_REDIS_URL: &str = "http://download.redis.io/releases/redis-4.0.9.tar.gz";
pub const DEFAULT_MAVEN_URL: &str = "http://apache.mirror.rafal.ca/maven/maven-3/3.5.3/binaries/apache-maven-3.5.3-bin.tar.gz";
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6384;

const DATASET_DIR: [&str; 2] = ["data", "gazetteer"];
const TOOLS_DIR: &str = "tools";

/// Command-line settings, parsed once at startup and passed to every stage.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "geonames-setup",
    version,
    about = "Downloads GeoNames, Redis and Maven, then runs the GeoNames importer"
)]
pub struct Settings {
    /// GeoNames data URL to download
    #[arg(long, alias = "geonames_url", default_value = DEFAULT_GEONAMES_URL)]
    pub geonames_url: String,

    /// Skip the Redis installation (not recommended)
    #[arg(long, alias = "no_redis", default_value_t = false)]
    pub no_redis: bool,

    /// Redis host handed to the importer
    #[arg(long, alias = "redis_host", default_value = DEFAULT_REDIS_HOST)]
    pub redis_host: String,

    /// Redis port, written into redis.conf and handed to the importer
    #[arg(long, alias = "redis_port", default_value_t = DEFAULT_REDIS_PORT)]
    pub redis_port: u16,

    /// Redis source tarball URL
    #[arg(long, alias = "redis_url", default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    /// Apache Maven binary tarball URL
    #[arg(long, alias = "maven_url", default_value = DEFAULT_MAVEN_URL)]
    pub maven_url: String,

    /// Project root holding data/ and tools/ (defaults to the current directory)
    #[arg(long, value_name = "DIR", env = "GEONAMES_SETUP_ROOT")]
    pub root: Option<PathBuf>,

    /// Java executable used for the version check
    #[arg(long, value_name = "PROGRAM", env = "GEONAMES_SETUP_JAVA", default_value = "java")]
    pub java: String,

    /// Also write stage timings as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl Settings {
    /// Absolute project root; a relative `--root` is resolved against the
    /// current directory.
    pub fn root_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(path::absolute(root)?),
            None => Ok(env::current_dir()?),
        }
    }
}

/// Fixed on-disk layout under an absolute project root.
///
/// Tools run with their own working directory, so every path here must stay
/// valid regardless of the current one.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub dataset_dir: PathBuf,
    pub tools_dir: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = path::absolute(&root).unwrap_or(root);
        let dataset_dir = DATASET_DIR.iter().fold(root.clone(), |path, part| path.join(part));
        let tools_dir = root.join(TOOLS_DIR);
        Self {
            root,
            dataset_dir,
            tools_dir,
        }
    }

    pub fn ensure(&self) -> Result<(), ProvisionError> {
        for dir in [&self.dataset_dir, &self.tools_dir] {
            fs::create_dir_all(dir)
                .map_err(|err| ProvisionError::io(format!("creating dir {:?}", dir), err))?;
        }
        Ok(())
    }

    /// `path` relative to the root, for arguments handed to tools that run in the root.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
