use std::io::Cursor;

use bytes::Bytes;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::Mutex,
};

use super::{Navigator, Transport};
use crate::{
    listing::{self, DirectoryEntry},
    FtpResult,
};

/// High-level convenience layer over a transfer session.
///
/// Couples a [`Transport`] with a [`Navigator`] so that every remote
/// path is resolved against the tracked working directory before it
/// reaches the wire. The transport lock is held for the whole of each
/// call, which keeps multi-segment walks from interleaving with other
/// calls on the same session.
pub struct FtpSession<T: Transport> {
    transport: Mutex<T>,
    navigator: Mutex<Navigator>,
}

impl<T: Transport> FtpSession<T> {
    /// Wraps an already connected and authenticated transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            navigator: Mutex::new(Navigator::new()),
        }
    }

    /// Consumes the session, returning the underlying transport.
    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }

    /// Changes the tracked working directory, verifying every segment.
    pub async fn cd(&self, path: &str) -> FtpResult<String> {
        let mut transport = self.transport.lock().await;
        self.navigator
            .lock()
            .await
            .change_dir(&mut *transport, path)
            .await
    }

    /// Walks into `path`, creating missing directories when asked to.
    pub async fn descend(&self, path: &str, make_dirs: bool) -> FtpResult<String> {
        let mut transport = self.transport.lock().await;
        self.navigator
            .lock()
            .await
            .descend(&mut *transport, path, make_dirs)
            .await
    }

    /// Tracked working directory relative to the session root.
    pub async fn pwd(&self) -> String {
        self.navigator.lock().await.current_path()
    }

    /// Fetches and parses the listing of `path`, or of the working
    /// directory when `None`.
    ///
    /// `.` and `..` entries are kept; callers that want them gone
    /// opt in through [`listing::remove_relative_paths`].
    pub async fn list(&self, path: Option<&str>) -> FtpResult<Vec<DirectoryEntry>> {
        let target = self.navigator.lock().await.resolve(path.unwrap_or("."));
        let lines = self.transport.lock().await.list_raw(&target).await?;
        Ok(listing::parse_lines(lines))
    }

    /// Downloads a remote file into memory.
    pub async fn get(&self, remote: &str) -> FtpResult<Bytes> {
        let target = self.navigator.lock().await.resolve(remote);
        self.transport.lock().await.download_bytes(&target).await
    }

    /// Downloads a remote file into `sink`, returning bytes written.
    pub async fn get_to<W>(&self, remote: &str, sink: W) -> FtpResult<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let target = self.navigator.lock().await.resolve(remote);
        self.transport.lock().await.download(&target, sink).await
    }

    /// Streams `source` into the remote path, creating missing parent
    /// directories first. Returns bytes written.
    pub async fn put<R>(&self, source: R, remote: &str) -> FtpResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut transport = self.transport.lock().await;
        let mut navigator = self.navigator.lock().await;
        let target = navigator.resolve(remote);

        if let Some((parent, _)) = target.rsplit_once('/') {
            if !parent.is_empty() {
                let _ = navigator.ensure_tree(&mut *transport, parent).await?;
            }
        }

        transport.upload(&target, source).await
    }

    /// Uploads an in-memory buffer to the remote path.
    pub async fn put_bytes(&self, remote: &str, contents: &[u8]) -> FtpResult<u64> {
        self.put(Cursor::new(contents), remote).await
    }

    /// Deletes a remote path and evicts it from the navigator's
    /// existence cache, returning whether anything was removed.
    pub async fn delete(&self, remote: &str) -> FtpResult<bool> {
        let mut transport = self.transport.lock().await;
        let mut navigator = self.navigator.lock().await;
        let target = navigator.resolve(remote);

        let removed = transport.delete(&target).await?;
        navigator.invalidate(&target);
        Ok(removed)
    }
}

#[cfg(test)]
mod test_session {
    use anyhow::Result;

    use super::super::testutil::MockTransport;
    use super::*;

    #[tokio::test]
    async fn test_cd_and_pwd() -> Result<()> {
        let session = FtpSession::new(MockTransport::with_exists(true));

        let _ = session.cd("photos/nature/mountains").await?;
        assert_eq!(session.pwd().await, "photos/nature/mountains");

        let _ = session.cd("../..").await?;
        assert_eq!(session.pwd().await, "photos");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_parses_canned_lines() -> Result<()> {
        let mut transport = MockTransport::with_exists(true);
        transport.listing = vec![
            "-rw-rw-r-- 1 rharrigan www   47 Feb 20 11:39 Cool.txt".to_owned(),
            "drwxr-xr-t 2 rharrigan rharrigan 4096 Jan 31 2019 dist".to_owned(),
        ];
        let session = FtpSession::new(transport);

        let entries = session.list(None).await?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Cool.txt");
        assert!(entries[1].is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_keeps_relative_entries_unless_asked() -> Result<()> {
        let mut transport = MockTransport::with_exists(true);
        transport.listing = vec![
            "drwxr-xr-x 2 root wheel 4096 Feb 20 2013 .".to_owned(),
            "drwxr-xr-x 4 root wheel 4096 Feb 20 2013 ..".to_owned(),
            "-rw-r--r-- 1 root wheel   10 Feb 20 2013 a.txt".to_owned(),
        ];
        let session = FtpSession::new(transport);

        let entries = session.list(None).await?;
        assert_eq!(entries.len(), 3);

        let entries = listing::remove_relative_paths(entries);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
        Ok(())
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() -> Result<()> {
        let session = FtpSession::new(MockTransport::with_exists(true));

        let written = session.put_bytes("hello.txt", b"hello_put").await?;
        assert_eq!(written, 9);

        let contents = session.get("hello.txt").await?;
        assert_eq!(&contents[..], b"hello_put");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_to_sink() -> Result<()> {
        let session = FtpSession::new(MockTransport::with_exists(true));
        let _ = session.put_bytes("file.bin", b"payload").await?;

        let mut sink = Vec::new();
        let read = session
            .get_to("file.bin", std::io::Cursor::new(&mut sink))
            .await?;
        assert_eq!(read, 7);
        assert_eq!(sink, b"payload");
        Ok(())
    }

    #[tokio::test]
    async fn test_put_creates_missing_parents_once() -> Result<()> {
        let session = FtpSession::new(MockTransport::with_exists(false));

        let _ = session.put_bytes("tree/bar/baz.txt", b"another message").await?;
        let _ = session.put_bytes("tree/bar/qux.txt", b"message").await?;

        let transport = session.into_inner();
        assert_eq!(transport.creations, 2); // /tree and /tree/bar
        assert!(transport.files.contains_key("/tree/bar/baz.txt"));
        assert!(transport.files.contains_key("/tree/bar/qux.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn test_put_resolves_against_cwd() -> Result<()> {
        let session = FtpSession::new(MockTransport::with_exists(true));

        let _ = session.cd("photos").await?;
        let _ = session.put_bytes("shot.jpg", b"jpg").await?;

        let transport = session.into_inner();
        assert!(transport.files.contains_key("/photos/shot.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_file_is_not_found() {
        let session = FtpSession::new(MockTransport::with_exists(true));
        let error = session.get("nope.txt").await.unwrap_err();
        assert!(matches!(error, crate::Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_evicts_cache_entry() -> Result<()> {
        let session = FtpSession::new(MockTransport::default());

        let _ = session.descend("tmp", true).await?;
        let _ = session.cd("/").await?;
        assert!(session.delete("tmp").await?);

        // the next walk has to probe again and now sees nothing
        assert!(session.cd("tmp").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reports_missing_target() -> Result<()> {
        let session = FtpSession::new(MockTransport::default());
        assert!(!session.delete("ghost.txt").await?);
        Ok(())
    }
}
