//! Client side of the crate: the capability set a transfer session must
//! provide, the stateful path navigator built on top of it, and a
//! high-level session wrapper for easy interaction with a remote host.

mod navigator;
mod session;
mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use navigator::Navigator;
pub use session::FtpSession;
pub use transport::Transport;
