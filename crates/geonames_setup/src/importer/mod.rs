use tracing::info;

use crate::{
    config::{Layout, Settings},
    error::ProvisionError,
    geonames::GEONAMES_FILE,
    maven::MAVEN_DIR,
    process::{self, CommandRunner, CommandSpec},
};

const IMPORT_PROFILE: &str = "-Pimport";

/// The build and import invocations, both run from the project root.
pub fn importer_commands(settings: &Settings, layout: &Layout) -> [CommandSpec; 2] {
    let mvn = layout.tools_dir.join(MAVEN_DIR).join("bin").join("mvn");
    let dataset = layout.relative(&layout.dataset_dir).join(GEONAMES_FILE);

    let build = CommandSpec::new(&mvn)
        .args(["clean", "compile"])
        .current_dir(&layout.root);
    let import = CommandSpec::new(&mvn)
        .args(["exec:exec", IMPORT_PROFILE])
        .arg(format!("-Darg.geonames.path={}", dataset.display()))
        .arg(format!("-Darg.redis.host={}", settings.redis_host))
        .arg(format!("-Darg.redis.port={}", settings.redis_port))
        .current_dir(&layout.root);
    [build, import]
}

/// Compiles the project, then runs the GeoNames import profile. A failed
/// build skips the import.
pub async fn run_importer(
    settings: &Settings,
    layout: &Layout,
    runner: &dyn CommandRunner,
) -> Result<(), ProvisionError> {
    let [build, import] = importer_commands(settings, layout);

    info!("building the source");
    process::run_checked(runner, &build).await?;

    info!("running importer");
    process::run_checked(runner, &import).await?;
    Ok(())
}
