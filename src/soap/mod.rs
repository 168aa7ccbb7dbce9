//! Everything needed to talk SOAP to the server.
//!
//! The wire protocol is a SOAP 1.1 style envelope sent via HTTP POST, or via
//! the server's local unix socket which answers with plain HTTP response
//! framing over the raw stream.
//!
//! [`envelope`](envelope::envelope) wraps an operation fragment in the fixed
//! envelope, [`Transport`](transport::Transport) implementations perform the
//! round trip and [`decode_body`](envelope::decode_body) extracts the typed
//! result from the response.

pub mod envelope;
pub(crate) mod request;
pub mod transport;

pub use envelope::{decode_body, envelope};
pub use transport::{HttpTransport, Transport, UnixSocketTransport};
