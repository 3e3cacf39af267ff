//! Redis download, configuration and daemon launch.

use std::{
    fs,
    path::{Path, PathBuf},
};

use lazy_regex::regex;
use tracing::{error, info};

use crate::{
    archive::{self, ArchiveFormat, NormalizePolicy},
    config::{Layout, Settings},
    error::{DownloadError, ProvisionError},
    fetch::Downloader,
    process::{self, CommandRunner, CommandSpec},
};

pub const REDIS_ARCHIVE: &str = "redis.tar.gz";
pub const REDIS_DIR: &str = "redis";
pub const REDIS_CONF: &str = "redis.conf";
pub const REDIS_SERVER_BIN: &str = "src/redis-server";
const REDIS_PREFIX: &str = "redis";
const TCP_BACKLOG: u32 = 3000;

/// Rewrites the four keys the importer depends on. Each substitution works on
/// whole lines; a pattern that matches nothing leaves the text unchanged.
pub fn patch_redis_conf(conf: &str, port: u16) -> String {
    let backlog = format!("tcp-backlog {TCP_BACKLOG}");
    let pidfile = format!("pidfile redis_{port}.pid");
    let port_line = format!("port {port}");

    let conf = regex!(r"(?m)^tcp-backlog [0-9]+$").replace_all(conf, backlog.as_str());
    let conf = regex!(r"(?m)^daemonize no$").replace_all(&conf, "daemonize yes");
    let conf = regex!(r"(?m)^pidfile .*\.pid$").replace_all(&conf, pidfile.as_str());
    let conf = regex!(r"(?m)^port [0-9]+$").replace_all(&conf, port_line.as_str());
    conf.into_owned()
}

/// Downloads, builds and starts Redis, returning the normalized install dir.
pub async fn prepare_redis(
    settings: &Settings,
    layout: &Layout,
    downloader: &Downloader,
    runner: &dyn CommandRunner,
) -> Result<PathBuf, ProvisionError> {
    let archive_path = layout.tools_dir.join(REDIS_ARCHIVE);

    info!(url = %settings.redis_url, "downloading Redis");
    if let Err(err) = downloader.fetch_to(&settings.redis_url, &archive_path).await {
        match &err {
            DownloadError::NotFound { .. } => error!(
                url = %settings.redis_url,
                "the provided URL seems to be broken; please find a URL for Redis"
            ),
            other => error!(error = %other, "Redis download failed"),
        }
        return Err(ProvisionError::Download {
            component: "Redis",
            source: err,
        });
    }

    archive::extract_and_remove(&archive_path, &layout.tools_dir, ArchiveFormat::TarGz).await?;

    let extracted = archive::find_prefixed_dir(&layout.tools_dir, REDIS_PREFIX, Some(REDIS_DIR))?
        .ok_or_else(|| ProvisionError::Layout {
            dir: layout.tools_dir.clone(),
            prefix: REDIS_PREFIX,
        })?;
    let redis_dir = layout.tools_dir.join(REDIS_DIR);
    let outcome = archive::normalize_dir(&extracted, &redis_dir, NormalizePolicy::KeepExisting)?;
    info!(dir = ?redis_dir, ?outcome, "Redis sources in place");

    let conf_path = redis_dir.join(REDIS_CONF);
    let conf = fs::read_to_string(&conf_path)
        .map_err(|err| ProvisionError::io(format!("reading {:?}", conf_path), err))?;
    fs::write(&conf_path, patch_redis_conf(&conf, settings.redis_port))
        .map_err(|err| ProvisionError::io(format!("writing {:?}", conf_path), err))?;

    info!("installing Redis");
    process::run_checked(runner, &CommandSpec::new("make").current_dir(&redis_dir)).await?;

    info!(port = settings.redis_port, "starting Redis");
    process::run_checked(runner, &server_command(&redis_dir)).await?;

    Ok(redis_dir)
}

/// `redis-server redis.conf`, run from inside the install dir.
pub fn server_command(redis_dir: &Path) -> CommandSpec {
    CommandSpec::new(redis_dir.join(REDIS_SERVER_BIN))
        .arg(REDIS_CONF)
        .current_dir(redis_dir)
}
