//! Rebuilds one output file from its ordered chunk list.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    cancel::CancelToken,
    chunk::ChunkFetcher,
    decompress::DecompressionStream,
    error::{Error, Result},
    manifest::FileEntry,
};

/// Join a manifest path onto the output folder. Both `/` and `\` count as separators, and the
/// path may not climb out of the output folder.
pub fn resolve_output_path(output_root: &Path, relative_path: &str) -> Result<PathBuf> {
    let escapes = |reason: &str| {
        Error::filesystem(
            output_root.join(relative_path),
            io::Error::new(io::ErrorKind::InvalidInput, reason.to_string()),
        )
    };

    if relative_path.starts_with(['/', '\\']) {
        return Err(escapes("absolute path in manifest"));
    }

    let mut path = output_root.to_path_buf();
    let mut pushed = false;
    for (i, part) in relative_path.split(['/', '\\']).enumerate() {
        match part {
            "" | "." => continue,
            ".." => return Err(escapes("parent directory in manifest path")),
            // Windows drive prefix, eg. `C:`
            p if i == 0 && p.ends_with(':') => {
                return Err(escapes("absolute path in manifest"));
            }
            p => {
                path.push(p);
                pushed = true;
            }
        }
    }

    if !pushed {
        return Err(escapes("empty path in manifest"));
    }

    Ok(path)
}

pub struct FileReconstructor<'a> {
    fetcher: &'a ChunkFetcher,
    block_size: usize,
}

impl<'a> FileReconstructor<'a> {
    pub fn new(fetcher: &'a ChunkFetcher, block_size: usize) -> Self {
        Self {
            fetcher,
            block_size: block_size.max(1),
        }
    }

    /// Write the file described by `entry` under `output_root`, truncating whatever was there.
    ///
    /// `on_bytes_written` is called with the size of every block once it has been written. On
    /// failure the file is left holding whatever was written before the failing chunk.
    ///
    /// Returns the number of decompressed bytes written.
    pub fn reconstruct(
        &self,
        version: &str,
        entry: &FileEntry,
        output_root: &Path,
        cancel: &CancelToken,
        mut on_bytes_written: impl FnMut(u64),
    ) -> Result<u64> {
        let out_path = resolve_output_path(output_root, &entry.relative_path)?;
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }

        info!("Downloading file: {}", entry.relative_path);
        let mut file = File::create(&out_path).map_err(|e| Error::filesystem(&out_path, e))?;

        // Allocated lazily so empty files don't pay for a block buffer
        let mut buf = Vec::new();
        let mut written = 0;

        for &chunk_id in &entry.chunk_ids {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let compressed = self.fetcher.fetch(version, chunk_id)?;
            if buf.is_empty() {
                buf = vec![0; self.block_size];
            }

            let mut stream = DecompressionStream::new(chunk_id, compressed, &mut buf);
            while let Some(block) = stream.next_block()? {
                file.write_all(block)
                    .map_err(|e| Error::filesystem(&out_path, e))?;

                let len = block.len() as u64;
                written += len;
                on_bytes_written(len);
            }
            debug!("Chunk {} appended to {}", chunk_id, entry.relative_path);
        }

        file.flush().map_err(|e| Error::filesystem(&out_path, e))?;

        Ok(written)
    }
}
