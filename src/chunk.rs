use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::{error::Result, manifest::file_url, transport::Transport};

/// Fetches compressed chunks, addressed by version id and chunk id
pub struct ChunkFetcher {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl ChunkFetcher {
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    pub fn chunk_url(&self, version: &str, chunk_id: u32) -> Result<Url> {
        file_url(&self.base_url, &[version], &format!("{chunk_id}.chunk"))
    }

    /// Fetch the raw (still compressed) contents of a chunk
    pub fn fetch(&self, version: &str, chunk_id: u32) -> Result<Bytes> {
        let url = self.chunk_url(version, chunk_id)?;
        let bytes = self.transport.get(&url)?;
        debug!("Fetched chunk {} ({} bytes compressed)", chunk_id, bytes.len());

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, manifest::parse_base_url, transport::MemoryTransport};

    #[test]
    fn fetches_by_version_and_id() {
        let mut transport = MemoryTransport::new();
        transport.insert("https://cdn.example.com/patch/1.2.3/42.chunk", &b"abc"[..]);
        let fetcher = ChunkFetcher::new(
            parse_base_url("https://cdn.example.com/patch").unwrap(),
            Arc::new(transport),
        );

        assert_eq!(fetcher.fetch("1.2.3", 42).unwrap(), Bytes::from_static(b"abc"));
        assert!(matches!(
            fetcher.fetch("1.2.3", 43),
            Err(Error::Transport { .. })
        ));
    }

    #[test]
    fn url_syntax_in_version_is_escaped() {
        let fetcher = ChunkFetcher::new(
            parse_base_url("https://h.example/patch").unwrap(),
            Arc::new(MemoryTransport::new()),
        );
        let url = |version: &str| fetcher.chunk_url(version, 5).unwrap().to_string();

        assert_eq!(url("1.2.3"), "https://h.example/patch/1.2.3/5.chunk");
        assert_eq!(url("rc:1"), "https://h.example/patch/rc:1/5.chunk");
        assert_eq!(
            url("//evil.example"),
            "https://h.example/patch/%2F%2Fevil.example/5.chunk"
        );
        assert_eq!(url("../x"), "https://h.example/patch/..%2Fx/5.chunk");
        assert_eq!(url("1#2"), "https://h.example/patch/1%232/5.chunk");
        assert!(matches!(
            fetcher.chunk_url("", 5),
            Err(Error::Parse { .. })
        ));
    }
}
