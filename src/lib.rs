#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate async_trait;

/// Client side: transport capability trait, navigator and session
pub mod client;
mod error;
/// Long-format listing parser
pub mod listing;

pub use error::{Error, FtpResult};
