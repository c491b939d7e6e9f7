//! Version listing and manifest retrieval from the manifest service.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    error::{Error, Result},
    transport::Transport,
};

/// Where the official manifest service lives
pub const DEFAULT_BASE_URL: &str = "https://manifest.simplyblk.xyz";

/// Separator between the release prefix and the version id in a version label
pub const VERSION_LABEL_SEPARATOR: char = '-';

/// Field of the split label that holds the version id
pub const VERSION_LABEL_FIELD: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Output path relative to the download root, may contain nested folders
    pub relative_path: String,
    /// Chunks to decompress and concatenate, in this order
    pub chunk_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub version: String,
    /// Declared sum of the decompressed sizes of every file
    pub total_size: u64,
    pub files: Vec<FileEntry>,
}

// Wire format of `{version}.manifest`
#[derive(Debug, Deserialize)]
struct ManifestFile {
    size: u64,
    chunks: Vec<ManifestChunks>,
}

#[derive(Debug, Deserialize)]
struct ManifestChunks {
    file: String,
    #[serde(rename = "chunksIds")]
    chunks_ids: Vec<u32>,
}

/// Parse a base URL, making sure relative joins append to its path rather than replace the
/// last segment
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| Error::parse(format!("base URL {raw:?}"), e))?;
    if url.cannot_be_a_base() {
        return Err(Error::parse(
            format!("base URL {raw:?}"),
            "URL cannot be used as a base",
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// `{base}/{folders..}/{file}`, each part pushed as a single percent-encoded path segment so a
/// version id can't change the scheme, host or path of the URL
pub(crate) fn file_url(base_url: &Url, folders: &[&str], file: &str) -> Result<Url> {
    let invalid = |part: &str| Error::parse(format!("URL path segment {part:?}"), "not a file name");
    for &part in folders.iter().chain([&file]) {
        if matches!(part, "" | "." | "..") {
            return Err(invalid(part));
        }
    }

    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| Error::parse(format!("base URL {base_url}"), "URL cannot be used as a base"))?
        .pop_if_empty()
        .extend(folders)
        .push(file);

    Ok(url)
}

/// Pull the version id out of a label such as `release-1.2.3`
pub fn parse_version_label(label: &str) -> Result<&str> {
    label
        .split(VERSION_LABEL_SEPARATOR)
        .nth(VERSION_LABEL_FIELD)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            Error::parse(
                format!("version label {label:?}"),
                format!("expected <name>{VERSION_LABEL_SEPARATOR}<version>"),
            )
        })
}

/// Parse the body of `{version}.manifest`
pub fn parse_manifest(version: &str, body: &[u8]) -> Result<Manifest> {
    let wire: ManifestFile = serde_json::from_slice(body)
        .map_err(|e| Error::parse(format!("manifest for version {version}"), e))?;

    Ok(Manifest {
        version: version.to_string(),
        total_size: wire.size,
        files: wire
            .chunks
            .into_iter()
            .map(|c| FileEntry {
                relative_path: c.file,
                chunk_ids: c.chunks_ids,
            })
            .collect(),
    })
}

pub struct ManifestClient {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl ManifestClient {
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    /// List every version label the service offers, newest first as served
    pub fn list_versions(&self) -> Result<Vec<String>> {
        let url = file_url(&self.base_url, &[], "versions.json")?;
        let body = self.transport.get(&url)?;

        serde_json::from_slice(&body).map_err(|e| Error::parse("version list", e))
    }

    /// Fetch and parse the manifest for a version id (not a label, see [parse_version_label])
    pub fn get_manifest(&self, version: &str) -> Result<Manifest> {
        let url = file_url(&self.base_url, &[version], &format!("{version}.manifest"))?;
        let body = self.transport.get(&url)?;

        let manifest = parse_manifest(version, &body)?;
        debug!(
            "Manifest {} lists {} files, {} bytes",
            version,
            manifest.files.len(),
            manifest.total_size
        );
        Ok(manifest)
    }
}
