use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    archive,
    config::{Layout, Settings},
    error::ProvisionError,
    fetch::Downloader,
    geonames, importer, maven,
    process::CommandRunner,
    redis,
    timing::{Stage, StageTimings},
};

/// Runs the provisioning stages one after another, timing each of them.
pub struct Pipeline {
    settings: Settings,
    layout: Layout,
    downloader: Downloader,
    runner: Arc<dyn CommandRunner>,
}

impl Pipeline {
    pub fn new(
        settings: Settings,
        layout: Layout,
        downloader: Downloader,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            layout,
            downloader,
            runner,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub async fn run(&self) -> Result<StageTimings, ProvisionError> {
        let mut timings = StageTimings::new();
        self.layout.ensure()?;

        let guard = timings.start(Stage::GeoNames);
        geonames::prepare_geonames(&self.settings, &self.layout, &self.downloader).await?;
        timings.finish(guard);

        let guard = timings.start(Stage::Redis);
        if self.settings.no_redis {
            info!("skipping Redis installation");
        } else {
            redis::prepare_redis(
                &self.settings,
                &self.layout,
                &self.downloader,
                self.runner.as_ref(),
            )
            .await?;
        }
        timings.finish(guard);

        let guard = timings.start(Stage::Maven);
        maven::prepare_maven(&self.settings, &self.layout, &self.downloader).await?;
        timings.finish(guard);

        let guard = timings.start(Stage::Importer);
        importer::run_importer(&self.settings, &self.layout, self.runner.as_ref()).await?;
        timings.finish(guard);

        timings.finish_run();

        for leftover in archive::leftover_archives(&self.layout.tools_dir)
            .into_iter()
            .chain(archive::leftover_archives(&self.layout.dataset_dir))
        {
            warn!(path = ?leftover, "archive left behind after provisioning");
        }

        Ok(timings)
    }
}
