use std::fs;

use anyhow::Result;
use geonames_setup::{
    config::Layout,
    error::{DownloadError, ProvisionError},
    fetch::Downloader,
    fixtures, geonames, maven,
    process::{CommandOutput, RecordingRunner},
    redis,
};
use httpmock::prelude::*;
use tempfile::TempDir;

mod common;

fn layout(root: &TempDir) -> Result<Layout> {
    let layout = Layout::new(root.path());
    layout.ensure()?;
    Ok(layout)
}

#[tokio::test]
async fn geonames_archive_is_replaced_by_its_contents() -> Result<()> {
    let server = MockServer::start_async().await;
    let dump = b"2657896\tZurich\tZurich\t\t47.36667\t8.55\n".repeat(64);
    common::serve(
        &server,
        common::GEONAMES_PATH,
        fixtures::zip_archive(&[("allCountries.txt", dump.as_slice())])?,
    )
    .await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let dataset = geonames::prepare_geonames(&settings, &layout, &Downloader::new()?).await?;

    assert_eq!(dataset, layout.dataset_dir.join("allCountries.txt"));
    assert_eq!(common::dir_names(&layout.dataset_dir)?, ["allCountries.txt"]);
    assert_eq!(fs::metadata(&dataset)?.len(), dump.len() as u64);
    Ok(())
}

#[tokio::test]
async fn geonames_not_found_fails_before_extraction() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve_status(&server, common::GEONAMES_PATH, 404).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let err = geonames::prepare_geonames(&settings, &layout, &Downloader::new()?)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProvisionError::Download {
            source: DownloadError::NotFound { .. },
            ..
        }
    ));
    assert!(common::dir_names(&layout.dataset_dir)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn geonames_corrupt_archive_is_an_extraction_error() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(
        &server,
        common::GEONAMES_PATH,
        b"<html>mirror maintenance</html>".to_vec(),
    )
    .await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let err = geonames::prepare_geonames(&settings, &layout, &Downloader::new()?)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Extraction { .. }));
    Ok(())
}

#[tokio::test]
async fn redis_not_found_aborts_before_extraction() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve_status(&server, common::REDIS_PATH, 404).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;
    let runner = RecordingRunner::new();

    let err = redis::prepare_redis(&settings, &layout, &Downloader::new()?, &runner)
        .await
        .unwrap_err();

    assert!(err.is_download());
    assert!(common::dir_names(&layout.tools_dir)?.is_empty());
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn redis_is_patched_built_and_started() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(&server, common::REDIS_PATH, fixtures::redis_release("redis-4.0.9")?).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &["--redis-port", "6390"])?;
    let layout = layout(&tmp)?;
    let runner = RecordingRunner::new();

    let redis_dir = redis::prepare_redis(&settings, &layout, &Downloader::new()?, &runner).await?;

    assert_eq!(redis_dir, layout.tools_dir.join("redis"));
    assert_eq!(common::dir_names(&layout.tools_dir)?, ["redis"]);

    let conf = fs::read_to_string(redis_dir.join("redis.conf"))?;
    let lines: Vec<&str> = conf.lines().collect();
    for expected in [
        "tcp-backlog 3000",
        "daemonize yes",
        "pidfile redis_6390.pid",
        "port 6390",
    ] {
        assert!(lines.contains(&expected), "{expected}");
    }

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].program.to_str(), Some("make"));
    assert_eq!(calls[0].current_dir.as_ref(), Some(&redis_dir));
    assert_eq!(calls[1].program, redis_dir.join("src/redis-server"));
    assert_eq!(calls[1].args, ["redis.conf"]);
    Ok(())
}

#[tokio::test]
async fn redis_rerun_keeps_existing_install() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(&server, common::REDIS_PATH, fixtures::redis_release("redis-5.0.0")?).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let existing = layout.tools_dir.join("redis");
    fs::create_dir_all(existing.join("src"))?;
    let patched = redis::patch_redis_conf(fixtures::SAMPLE_REDIS_CONF, settings.redis_port);
    fs::write(existing.join("redis.conf"), &patched)?;
    fs::write(existing.join("src/redis-server"), b"compiled")?;

    redis::prepare_redis(&settings, &layout, &Downloader::new()?, &RecordingRunner::new()).await?;

    assert_eq!(common::dir_names(&layout.tools_dir)?, ["redis"]);
    assert_eq!(common::dir_names(&existing)?, ["redis.conf", "src"]);
    assert_eq!(fs::read_to_string(existing.join("redis.conf"))?, patched);
    assert_eq!(fs::read(existing.join("src/redis-server"))?, b"compiled");
    Ok(())
}

#[tokio::test]
async fn redis_build_failure_stops_before_launch() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(&server, common::REDIS_PATH, fixtures::redis_release("redis-4.0.9")?).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;
    let runner = RecordingRunner::new();
    runner.push_output(CommandOutput::failure(2, "cc: command not found"));

    let err = redis::prepare_redis(&settings, &layout, &Downloader::new()?, &runner)
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Subprocess { .. }));
    assert_eq!(runner.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn tarball_without_expected_directory_is_a_layout_error() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(
        &server,
        common::MAVEN_PATH,
        fixtures::tar_gz_archive(&[("gradle-8.5/bin/gradle", b"#!/bin/sh".as_slice())])?,
    )
    .await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let err = maven::prepare_maven(&settings, &layout, &Downloader::new()?)
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Layout { prefix: "apache-maven", .. }));
    Ok(())
}

#[tokio::test]
async fn maven_rerun_replaces_existing_install() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve(
        &server,
        common::MAVEN_PATH,
        fixtures::maven_release("apache-maven-3.5.3")?,
    )
    .await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let existing = layout.tools_dir.join("maven");
    fs::create_dir_all(existing.join("lib"))?;
    fs::write(existing.join("NOTICE"), b"apache-maven-3.3.9")?;
    fs::write(existing.join("lib/stale.jar"), b"old")?;

    let maven_dir = maven::prepare_maven(&settings, &layout, &Downloader::new()?).await?;

    assert_eq!(maven_dir, existing);
    assert_eq!(common::dir_names(&layout.tools_dir)?, ["maven"]);
    assert_eq!(common::dir_names(&maven_dir)?, ["NOTICE", "bin"]);
    assert_eq!(fs::read(maven_dir.join("NOTICE"))?, b"apache-maven-3.5.3");
    assert!(maven_dir.join("bin/mvn").is_file());
    Ok(())
}

#[tokio::test]
async fn maven_server_error_is_fatal() -> Result<()> {
    let server = MockServer::start_async().await;
    common::serve_status(&server, common::MAVEN_PATH, 500).await;

    let tmp = TempDir::new()?;
    let settings = common::settings_for(&server, tmp.path(), &[])?;
    let layout = layout(&tmp)?;

    let err = maven::prepare_maven(&settings, &layout, &Downloader::new()?)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProvisionError::Download {
            source: DownloadError::Status { status: 500, .. },
            ..
        }
    ));
    Ok(())
}
