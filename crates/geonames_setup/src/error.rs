use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrerequisiteError {
    #[error("could not run `{program} -version`: {source}")]
    Missing {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("unrecognized java version output: {output:?}")]
    Unrecognized { output: String },
    #[error("java {version} is older than 8")]
    TooOld { version: String },
}

impl PrerequisiteError {
    /// The one-line hint shown to the operator before exiting.
    pub fn hint(&self) -> &'static str {
        match self {
            PrerequisiteError::TooOld { .. } => "Java version must be at least 8",
            PrerequisiteError::Missing { .. } | PrerequisiteError::Unrecognized { .. } => {
                "Please install Java 8 to proceed"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{url} returned 404 Not Found")]
    NotFound { url: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("requesting {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("writing download to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("downloading {component}: {source}")]
    Download {
        component: &'static str,
        #[source]
        source: DownloadError,
    },
    #[error("extracting {archive:?}: {source}")]
    Extraction {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no directory starting with '{prefix}' in {dir:?}")]
    Layout { dir: PathBuf, prefix: &'static str },
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed with {status}")]
    Subprocess {
        command: String,
        status: String,
        output: String,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ProvisionError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_download(&self) -> bool {
        matches!(self, ProvisionError::Download { .. })
    }
}
