use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use geonames_setup::{
    config::{self, Layout, Settings},
    fetch::Downloader,
    pipeline::Pipeline,
    prereq,
    process::SystemRunner,
};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    config::init_tracing();
    let settings = Settings::parse();
    let runner = Arc::new(SystemRunner);

    if let Err(err) = prereq::check_java(runner.as_ref(), &settings.java).await {
        error!(error = %err, "{}", err.hint());
        return Ok(ExitCode::from(1));
    }

    let layout = Layout::new(settings.root_dir()?);
    let report_path = settings.report.clone();
    let pipeline = Pipeline::new(settings, layout, Downloader::new()?, runner);
    let timings = pipeline.run().await?;

    for line in timings.summary_lines() {
        println!("{line}");
    }
    if let Some(path) = report_path {
        timings.write_report(&path)?;
    }
    println!("Installation complete.");

    Ok(ExitCode::SUCCESS)
}
