use std::collections::HashMap;

use super::Transport;
use crate::{error::Error, FtpResult};

/// Stateful path navigation over a transfer session.
///
/// Owns the logical current directory (segments relative to the session
/// root) and a memoized map of existence probes keyed by normalized
/// absolute path. Probing the remote side costs a full round trip per
/// segment, so repeated navigation into a shared prefix should hit the
/// cache instead. The cache is only ever invalidated through
/// [`invalidate`](Self::invalidate); out-of-band deletion of a cached
/// directory is the caller's problem.
///
/// The transport is a parameter of each call rather than an owned
/// field, so one navigator instance never hides shared session state.
#[derive(Debug, Default)]
pub struct Navigator {
    cwd: Vec<String>,
    exists: HashMap<String, bool>,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical current directory relative to the session root.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.cwd.join("/")
    }

    /// Changes the logical current directory.
    ///
    /// Supports absolute and relative paths including `.` and `..`
    /// segments; `..` at the root is a no-op. Every plain segment is
    /// checked for existence through the cache, and one remote
    /// change-directory is issued once the whole path has been
    /// verified. On any failure `cwd` keeps its pre-call value.
    pub async fn change_dir<T: Transport>(
        &mut self,
        transport: &mut T,
        path: &str,
    ) -> FtpResult<String> {
        let mut scratch = self.base(path);

        for part in path.split('/') {
            match part {
                "" | "." => (),
                ".." => {
                    let _ = scratch.pop();
                }
                part => {
                    let target = join_absolute(&scratch, part);
                    if !self.check_exists(transport, &target).await? {
                        return Err(Error::NotFound(target));
                    }
                    scratch.push(part.to_owned());
                }
            }
        }

        transport.change_dir(&absolute(&scratch)).await?;
        self.cwd = scratch;
        Ok(self.current_path())
    }

    /// Walks into `path` segment by segment, creating missing
    /// directories along the way when `make_dirs` is set.
    ///
    /// Each segment consults the cache first and probes the transport
    /// on a miss. An absent segment is created and entered when
    /// `make_dirs` is set, and fails with [`Error::NotFound`]
    /// otherwise. Every successfully entered segment is cached as
    /// existing; `cwd` is committed only after the whole walk succeeds.
    pub async fn descend<T: Transport>(
        &mut self,
        transport: &mut T,
        path: &str,
        make_dirs: bool,
    ) -> FtpResult<String> {
        let mut scratch = self.base(path);

        for part in path.split('/') {
            match part {
                "" | "." => (),
                ".." => {
                    let _ = scratch.pop();
                }
                part => {
                    let target = join_absolute(&scratch, part);
                    if !self.check_exists(transport, &target).await? {
                        if !make_dirs {
                            return Err(Error::NotFound(target));
                        }
                        transport.create_dir(&target).await?;
                        debug!("created remote directory {}", target);
                    }
                    transport.change_dir(&target).await?;
                    let _ = self.exists.insert(target, true);
                    scratch.push(part.to_owned());
                }
            }
        }

        self.cwd = scratch;
        Ok(self.current_path())
    }

    /// Evicts a path from the existence cache. Callers are responsible
    /// for invoking this after deleting a remote path.
    pub fn invalidate(&mut self, path: &str) {
        let target = self.resolve(path);
        let _ = self.exists.remove(&target);
    }

    /// Resolves `path` against the current directory into a normalized
    /// absolute path, folding out `.` and `..` segments.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        let mut segments = self.base(path);

        for part in path.split('/') {
            match part {
                "" | "." => (),
                ".." => {
                    let _ = segments.pop();
                }
                part => segments.push(part.to_owned()),
            }
        }

        absolute(&segments)
    }

    /// Creates any missing directories along `path` without moving the
    /// current directory. Returns the normalized absolute path.
    pub(crate) async fn ensure_tree<T: Transport>(
        &mut self,
        transport: &mut T,
        path: &str,
    ) -> FtpResult<String> {
        let mut segments = self.base(path);

        for part in path.split('/') {
            match part {
                "" | "." => (),
                ".." => {
                    let _ = segments.pop();
                }
                part => {
                    let target = join_absolute(&segments, part);
                    if !self.check_exists(transport, &target).await? {
                        transport.create_dir(&target).await?;
                        debug!("created remote directory {}", target);
                        let _ = self.exists.insert(target.clone(), true);
                    }
                    segments.push(part.to_owned());
                }
            }
        }

        Ok(absolute(&segments))
    }

    async fn check_exists<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &str,
    ) -> FtpResult<bool> {
        if let Some(&known) = self.exists.get(target) {
            debug!("existence cache hit for {}: {}", target, known);
            return Ok(known);
        }

        let found = transport.probe_exists(target).await?;
        let _ = self.exists.insert(target.to_owned(), found);
        Ok(found)
    }

    fn base(&self, path: &str) -> Vec<String> {
        if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.clone()
        }
    }
}

fn absolute(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

fn join_absolute(segments: &[String], part: &str) -> String {
    if segments.is_empty() {
        format!("/{}", part)
    } else {
        format!("/{}/{}", segments.join("/"), part)
    }
}
