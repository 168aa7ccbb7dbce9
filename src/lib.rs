#![doc = include_str!("../README.md")]

pub(crate) mod internal_prelude {
    #![allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

pub mod abeid;
pub mod client;
pub mod config;
pub mod errcode;
pub mod error;
pub mod flags;
pub mod message;
pub mod session;
pub mod soap;
pub mod sso;
pub mod tls;

/// Client implementation version, advertised in the user agent of every
/// request.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol client version sent in the `clientVersion` field at logon.
pub const CLIENT_VERSION: &str = "8.7.0";

pub use abeid::{EntryId, MapiType, MUIDECSAB};
pub use client::Client;
pub use config::Config;
pub use errcode::ErrorCode;
pub use error::Error;
pub use flags::{Capabilities, LogonFlags};
pub use message::{LogonResponse, SessionId, User};
pub use session::{Session, SessionOptions};
pub use sso::SsoType;
pub use tls::{load_client_auth, ClientAuth};
