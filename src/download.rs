//! Drives a whole download: every file of a manifest, in order, with aggregate progress.

use std::{fs, path::Path, sync::Arc};

use tracing::{info, warn};
use url::Url;

use crate::{
    cancel::CancelToken,
    chunk::ChunkFetcher,
    decompress::DEFAULT_BLOCK_SIZE,
    error::{Error, Result},
    manifest::{Manifest, ManifestClient},
    reconstruct::FileReconstructor,
    transport::Transport,
};

/// Bytes written so far against the manifest's declared total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub bytes_completed: u64,
    pub bytes_total: u64,
}

impl ProgressState {
    /// Completion in percent. Can go past 100 if the manifest under-declares its size.
    pub fn percent(&self) -> f64 {
        if self.bytes_total == 0 {
            return 100.0;
        }
        self.bytes_completed as f64 / self.bytes_total as f64 * 100.0
    }
}

pub struct DownloadOrchestrator {
    manifests: ManifestClient,
    chunks: ChunkFetcher,
    block_size: usize,
}

impl DownloadOrchestrator {
    /// Both the manifest service and the chunks are reached through the same transport
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            manifests: ManifestClient::new(base_url.clone(), transport.clone()),
            chunks: ChunkFetcher::new(base_url, transport),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn manifests(&self) -> &ManifestClient {
        &self.manifests
    }

    /// Fetch the manifest for `version` and download everything it lists
    pub fn download(
        &self,
        version: &str,
        output_root: &Path,
        cancel: &CancelToken,
        on_progress: impl FnMut(u64, u64),
    ) -> Result<ProgressState> {
        let manifest = self.manifests.get_manifest(version)?;
        self.run(&manifest, output_root, cancel, on_progress)
    }

    /// Reconstruct every file of the manifest under `output_root`.
    ///
    /// `on_progress(done, total)` is called on this thread after every block written. The run
    /// stops at the first failing file: files before it are complete, it is left partially
    /// written and the files after it are never touched.
    pub fn run(
        &self,
        manifest: &Manifest,
        output_root: &Path,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<ProgressState> {
        fs::create_dir_all(output_root).map_err(|e| Error::filesystem(output_root, e))?;

        let mut progress = ProgressState {
            bytes_completed: 0,
            bytes_total: manifest.total_size,
        };
        let reconstructor = FileReconstructor::new(&self.chunks, self.block_size);

        for entry in &manifest.files {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            reconstructor.reconstruct(&manifest.version, entry, output_root, cancel, |written| {
                progress.bytes_completed += written;
                on_progress(progress.bytes_completed, progress.bytes_total);
            })?;
        }

        if progress.bytes_completed != progress.bytes_total {
            warn!(
                "Manifest {} declared {} bytes but {} were written",
                manifest.version, progress.bytes_total, progress.bytes_completed
            );
        }
        info!(
            "Downloaded {} files ({} bytes) for version {}",
            manifest.files.len(),
            progress.bytes_completed,
            manifest.version
        );

        Ok(progress)
    }
}
