use std::io::Cursor;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::FtpResult;

/// Capability set of the underlying transfer session. This is `async_trait`
///
/// The crate owns no wire protocol of its own: connecting, logging in
/// and issuing the actual protocol commands all live behind this trait.
/// A control connection handles one command at a time, so every method
/// takes `&mut self` and callers serialize access themselves.
#[async_trait]
pub trait Transport: Send {
    /// Checks whether a remote path exists, typically by attempting to
    /// change into or list it and reading a server rejection as "no".
    async fn probe_exists(&mut self, path: &str) -> FtpResult<bool>;

    /// Creates a remote directory. Fails with [`Error::Creation`] when
    /// the server rejects the request.
    ///
    /// [`Error::Creation`]: crate::Error::Creation
    async fn create_dir(&mut self, path: &str) -> FtpResult<()>;

    /// Changes the remote working directory. Fails with
    /// [`Error::NotFound`] on server rejection.
    ///
    /// [`Error::NotFound`]: crate::Error::NotFound
    async fn change_dir(&mut self, path: &str) -> FtpResult<()>;

    /// Returns the raw long-format listing lines for a path.
    async fn list_raw(&mut self, path: &str) -> FtpResult<Vec<String>>;

    /// Deletes a remote path, returning whether anything was removed.
    async fn delete(&mut self, path: &str) -> FtpResult<bool>;

    /// Streams `source` into the remote path, returning bytes written.
    async fn upload<R>(&mut self, path: &str, source: R) -> FtpResult<u64>
    where
        R: AsyncRead + Unpin + Send;

    /// Streams a remote file into `sink`, returning bytes read.
    async fn download<W>(&mut self, path: &str, sink: W) -> FtpResult<u64>
    where
        W: AsyncWrite + Unpin + Send;

    /// Downloads a remote file into memory, for callers without a sink.
    async fn download_bytes(&mut self, path: &str) -> FtpResult<Bytes> {
        let mut sink = Cursor::new(Vec::new());
        let _ = self.download(path, &mut sink).await?;
        Ok(Bytes::from(sink.into_inner()))
    }
}
