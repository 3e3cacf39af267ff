pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod fixtures;
pub mod geonames;
pub mod importer;
pub mod maven;
pub mod pipeline;
pub mod prereq;
pub mod process;
pub mod redis;
pub mod timing;
