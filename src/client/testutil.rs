use std::collections::{HashMap, HashSet};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::{error::Error, FtpResult};

/// In-memory stand-in for a real control connection.
///
/// Existence probes can be forced to a fixed answer for navigation
/// tests, or left to consult the set of created directories. Listings
/// are canned lines; uploads and downloads go through a plain map.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    /// Fixed probe answer; `None` consults `dirs`
    pub forced_exists: Option<bool>,
    pub reject_creation: bool,
    pub dirs: HashSet<String>,
    pub files: HashMap<String, Vec<u8>>,
    pub listing: Vec<String>,
    pub probes: usize,
    pub creations: usize,
    pub changes: usize,
    pub deletions: usize,
}

impl MockTransport {
    pub fn with_exists(exists: bool) -> Self {
        Self {
            forced_exists: Some(exists),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn probe_exists(&mut self, path: &str) -> FtpResult<bool> {
        self.probes += 1;
        Ok(self
            .forced_exists
            .unwrap_or_else(|| self.dirs.contains(path)))
    }

    async fn create_dir(&mut self, path: &str) -> FtpResult<()> {
        self.creations += 1;
        if self.reject_creation {
            return Err(Error::Creation(
                path.to_owned(),
                "permission denied".to_owned(),
            ));
        }
        let _ = self.dirs.insert(path.to_owned());
        Ok(())
    }

    async fn change_dir(&mut self, _path: &str) -> FtpResult<()> {
        self.changes += 1;
        Ok(())
    }

    async fn list_raw(&mut self, _path: &str) -> FtpResult<Vec<String>> {
        Ok(self.listing.clone())
    }

    async fn delete(&mut self, path: &str) -> FtpResult<bool> {
        self.deletions += 1;
        Ok(self.files.remove(path).is_some() || self.dirs.remove(path))
    }

    async fn upload<R>(&mut self, path: &str, mut source: R) -> FtpResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut contents = Vec::new();
        let written = source.read_to_end(&mut contents).await?;
        let _ = self.files.insert(path.to_owned(), contents);
        Ok(written as u64)
    }

    async fn download<W>(&mut self, path: &str, mut sink: W) -> FtpResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let contents = self
            .files
            .get(path)
            .ok_or_else(|| Error::NotFound(path.to_owned()))?;
        sink.write_all(contents).await?;
        Ok(contents.len() as u64)
    }
}
