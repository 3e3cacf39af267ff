//! Java runtime check that gates the whole run.

use lazy_regex::regex_captures;
use tracing::info;

use crate::{
    error::PrerequisiteError,
    process::{CommandRunner, CommandSpec},
};

pub const MIN_JAVA_MAJOR: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaVersion {
    pub major: u32,
    pub raw: String,
}

/// Parses the banner printed by `java -version`.
///
/// Two shapes are accepted: the legacy `"1.8.*"` numbering, and
/// `"<major>.<minor>.<patch>[_<build>]"` with a major version of at least 8.
pub fn parse_java_version(output: &str) -> Result<JavaVersion, PrerequisiteError> {
    let text = output.trim_start();

    if let Some((_, raw)) = regex_captures!(r#"^(?i)(?:java|openjdk) version "(1\.8\.[^"]*)""#, text)
    {
        return Ok(JavaVersion {
            major: 8,
            raw: raw.to_string(),
        });
    }

    if let Some((_, raw, major, _)) = regex_captures!(
        r#"^(?i)(?:java|openjdk) version "((\d+)\.\d+\.\d+(_\d+)?)""#,
        text
    ) {
        // Digits only, so the parse can fail on overflow alone.
        let major: u32 = major.parse().unwrap_or(0);
        if major < MIN_JAVA_MAJOR {
            return Err(PrerequisiteError::TooOld {
                version: raw.to_string(),
            });
        }
        return Ok(JavaVersion {
            major,
            raw: raw.to_string(),
        });
    }

    Err(PrerequisiteError::Unrecognized {
        output: output.trim().to_string(),
    })
}

/// Runs `<java> -version` and checks the reported version.
pub async fn check_java(
    runner: &dyn CommandRunner,
    java: &str,
) -> Result<JavaVersion, PrerequisiteError> {
    let output = runner
        .run(&CommandSpec::new(java).arg("-version"))
        .await
        .map_err(|source| PrerequisiteError::Missing {
            program: java.to_string(),
            source,
        })?;

    let version = parse_java_version(&output.combined())?;
    info!(version = %version.raw, "java runtime found");
    Ok(version)
}
