use std::path::Path;

use anyhow::Result;
use clap::Parser;
use geonames_setup::config::Settings;
use httpmock::prelude::*;

pub const GEONAMES_PATH: &str = "/export/dump/allCountries.zip";
pub const REDIS_PATH: &str = "/releases/redis-4.0.9.tar.gz";
pub const MAVEN_PATH: &str = "/maven/apache-maven-3.5.3-bin.tar.gz";

/// Settings pointing every download at `server` and every file at `root`.
pub fn settings_for(server: &MockServer, root: &Path, extra: &[&str]) -> Result<Settings> {
    let mut args = vec![
        "geonames-setup".to_string(),
        "--geonames-url".to_string(),
        server.url(GEONAMES_PATH),
        "--redis-url".to_string(),
        server.url(REDIS_PATH),
        "--maven-url".to_string(),
        server.url(MAVEN_PATH),
        "--root".to_string(),
        root.display().to_string(),
    ];
    args.extend(extra.iter().map(|arg| arg.to_string()));
    Ok(Settings::try_parse_from(args)?)
}

pub async fn serve(server: &MockServer, path: &str, body: Vec<u8>) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("content-type", "application/octet-stream")
                .body(body);
        })
        .await;
}

pub async fn serve_status(server: &MockServer, path: &str, status: u16) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(status);
        })
        .await;
}

pub fn dir_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}
