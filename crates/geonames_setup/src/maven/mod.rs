use std::path::PathBuf;

use tracing::{error, info};

use crate::{
    archive::{self, ArchiveFormat, NormalizePolicy},
    config::{Layout, Settings},
    error::{DownloadError, ProvisionError},
    fetch::Downloader,
};

pub const MAVEN_ARCHIVE: &str = "apache-maven.tar.gz";
pub const MAVEN_DIR: &str = "maven";
const MAVEN_PREFIX: &str = "apache-maven";

/// Downloads Apache Maven into `tools/maven`, replacing any earlier copy.
pub async fn prepare_maven(
    settings: &Settings,
    layout: &Layout,
    downloader: &Downloader,
) -> Result<PathBuf, ProvisionError> {
    let archive_path = layout.tools_dir.join(MAVEN_ARCHIVE);

    info!(url = %settings.maven_url, "downloading Apache Maven");
    if let Err(err) = downloader.fetch_to(&settings.maven_url, &archive_path).await {
        match &err {
            DownloadError::NotFound { .. } => error!(
                url = %settings.maven_url,
                "the provided URL seems to be broken; please find a URL for Apache Maven"
            ),
            other => error!(error = %other, "Apache Maven download failed"),
        }
        return Err(ProvisionError::Download {
            component: "Apache Maven",
            source: err,
        });
    }

    archive::extract_and_remove(&archive_path, &layout.tools_dir, ArchiveFormat::TarGz).await?;

    let extracted = archive::find_prefixed_dir(&layout.tools_dir, MAVEN_PREFIX, None)?
        .ok_or_else(|| ProvisionError::Layout {
            dir: layout.tools_dir.clone(),
            prefix: MAVEN_PREFIX,
        })?;
    let maven_dir = layout.tools_dir.join(MAVEN_DIR);
    let outcome = archive::normalize_dir(&extracted, &maven_dir, NormalizePolicy::Replace)?;
    info!(dir = ?maven_dir, ?outcome, "Apache Maven is ready");

    Ok(maven_dir)
}
