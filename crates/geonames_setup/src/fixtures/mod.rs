use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};
use zip::write::FileOptions;

/// Sample `redis.conf` holding the four keys the installer rewrites plus a
/// few lines it must leave alone.
pub const SAMPLE_REDIS_CONF: &str = "\
# Redis configuration file example.
bind 127.0.0.1
protected-mode yes
port 6379
tcp-backlog 511
timeout 0
# By default Redis does not run as a daemon.
daemonize no
supervised no
pidfile /var/run/redis_6379.pid
loglevel notice
# replicaof <masterip> <masterport>
";

/// Build an in-memory zip archive from `(path, contents)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .with_context(|| format!("adding zip entry {name}"))?;
        writer.write_all(contents)?;
    }
    Ok(writer.finish().context("finishing zip")?.into_inner())
}

/// Build an in-memory gzip-compressed tarball from `(path, contents)` pairs.
///
/// Parent directories are implied by the entry paths, the same way release
/// tarballs such as `redis-4.0.9.tar.gz` are laid out.
pub fn tar_gz_archive(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *contents)
            .with_context(|| format!("adding tar entry {path}"))?;
    }
    let encoder = builder.into_inner().context("finishing tar")?;
    Ok(encoder.finish()?)
}

/// A Redis release tarball rooted at `dir_name` with a sample config.
pub fn redis_release(dir_name: &str) -> Result<Vec<u8>> {
    let conf = format!("{dir_name}/redis.conf");
    let makefile = format!("{dir_name}/Makefile");
    tar_gz_archive(&[
        (conf.as_str(), SAMPLE_REDIS_CONF.as_bytes()),
        (makefile.as_str(), b"all:\n\t$(MAKE) -C src\n".as_slice()),
    ])
}

/// A Maven binary tarball rooted at `dir_name`.
pub fn maven_release(dir_name: &str) -> Result<Vec<u8>> {
    let mvn = format!("{dir_name}/bin/mvn");
    let notice = format!("{dir_name}/NOTICE");
    tar_gz_archive(&[
        (mvn.as_str(), b"#!/bin/sh\nexec java -jar boot.jar \"$@\"\n".as_slice()),
        (notice.as_str(), dir_name.as_bytes()),
    ])
}
