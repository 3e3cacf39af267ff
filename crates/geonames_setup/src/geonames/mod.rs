use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::{
    archive::{self, ArchiveFormat},
    config::{Layout, Settings},
    error::{DownloadError, ProvisionError},
    fetch::Downloader,
};

pub const GEONAMES_ARCHIVE: &str = "allCountries.zip";
pub const GEONAMES_FILE: &str = "allCountries.txt";

/// Downloads and unpacks the GeoNames dump, returning the path of the
/// extracted `allCountries.txt`.
///
/// A failed download stops the stage before extraction is attempted, so no
/// partial archive is ever left in the dataset directory.
pub async fn prepare_geonames(
    settings: &Settings,
    layout: &Layout,
    downloader: &Downloader,
) -> Result<PathBuf, ProvisionError> {
    let archive_path = layout.dataset_dir.join(GEONAMES_ARCHIVE);

    info!(url = %settings.geonames_url, "downloading GeoNames");
    if let Err(err) = downloader
        .fetch_to(&settings.geonames_url, &archive_path)
        .await
    {
        match &err {
            DownloadError::NotFound { .. } => error!(
                url = %settings.geonames_url,
                "the provided URL seems to be broken; please find a URL for the GeoNames data file, named {GEONAMES_ARCHIVE}"
            ),
            DownloadError::Status { status, .. } => {
                error!(code = status, "GeoNames download failed")
            }
            other => error!(error = %other, "GeoNames download failed"),
        }
        return Err(ProvisionError::Download {
            component: "GeoNames",
            source: err,
        });
    }

    archive::extract_and_remove(&archive_path, &layout.dataset_dir, ArchiveFormat::Zip).await?;

    let dataset = layout.dataset_dir.join(GEONAMES_FILE);
    if dataset.is_file() {
        info!(path = ?dataset, "GeoNames is ready");
    } else {
        warn!(path = ?dataset, "archive did not contain {GEONAMES_FILE}; the importer will not find it");
    }
    Ok(dataset)
}
