//! The transport implementations performing SOAP round trips.
//!
//! Two variants exist: [`HttpTransport`] speaks HTTP(S) through a shared,
//! pooled client, [`UnixSocketTransport`] dials the server's local socket
//! per request. The server answers with regular HTTP response framing on
//! both.
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Url;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::Error;
use crate::internal_prelude::*;
use crate::soap::envelope::envelope;
use crate::tls::ClientAuth;

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Upper bound for response headers on the socket transport.
const MAX_HEADER_SIZE: usize = 16 * 1024;

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), crate::VERSION)
}

/// A capability for sending one enveloped request and receiving the raw
/// response bytes.
///
/// Implementations wrap the operation fragment in the protocol envelope
/// before transmission and fail with a content-level error when the outer
/// transport status is not a success. Dropping the returned future aborts
/// the request.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform one round trip with the given operation fragment.
    async fn send(&self, payload: &str) -> Result<Vec<u8>, Error>;

    /// Attach a mutual-TLS client certificate used by subsequent requests.
    ///
    /// Only supported on transports whose URI scheme carries TLS; everything
    /// else fails with a usage error. Calling this while requests are in
    /// flight is allowed, the last writer wins for subsequent requests.
    fn set_client_auth(&self, auth: ClientAuth) -> Result<(), Error>;
}

/// SOAP over HTTP(S) through a shared connection-pooled client.
#[derive(Debug)]
pub struct HttpTransport {
    uri: Url,
    config: Config,
    user_agent: String,
    client: RwLock<reqwest::Client>,
}

impl HttpTransport {
    pub fn new(uri: Url, config: &Config) -> Result<HttpTransport, Error> {
        let client = build_http_client(config, None)?;
        Ok(HttpTransport {
            uri,
            config: config.clone(),
            user_agent: user_agent(),
            client: RwLock::new(client),
        })
    }

    fn client(&self) -> reqwest::Client {
        self.client
            .read()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}

/// Build the pooled client. Proxies are picked up from the environment by
/// the builder itself.
fn build_http_client(config: &Config, auth: Option<&ClientAuth>) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(config.http_timeout())
        .connect_timeout(config.http_dial_timeout())
        .tcp_keepalive(config.http_keepalive())
        .pool_idle_timeout(config.http_idle_conn_timeout())
        .pool_max_idle_per_host(config.http_max_idle_conns_per_host);

    if config.danger_insecure_tls {
        warn!("TLS certificate verification is disabled for this transport");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(auth) = auth {
        builder = builder.identity(auth.identity().clone());
    }

    builder.build().map_err(Error::Http)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &str) -> Result<Vec<u8>, Error> {
        let body = envelope(payload);
        debug!("Sending SOAP request to {}", self.uri);

        let response = self
            .client()
            .post(self.uri.clone())
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header(USER_AGENT, self.user_agent.as_str())
            .body(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    Error::Timeout("waiting for the HTTP response".to_string())
                } else {
                    Error::Http(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(Error::Http)?;
        Ok(bytes.to_vec())
    }

    fn set_client_auth(&self, auth: ClientAuth) -> Result<(), Error> {
        if self.uri.scheme() != "https" {
            return Err(Error::InvalidUsage(
                "client certificates require an https transport".to_string(),
            ));
        }

        let client = build_http_client(&self.config, Some(&auth))?;
        *self.client.write().unwrap_or_else(|err| err.into_inner()) = client;
        Ok(())
    }
}

/// SOAP over the server's local unix socket.
///
/// A fresh connection is dialed per request and dropped afterwards; there is
/// no keep-alive over the socket. The request is written as the bare
/// envelope, the response comes back with HTTP framing.
#[derive(Debug)]
pub struct UnixSocketTransport {
    path: PathBuf,
    timeout: Duration,
}

impl UnixSocketTransport {
    pub fn new(path: PathBuf, config: &Config) -> UnixSocketTransport {
        UnixSocketTransport {
            path,
            timeout: config.socket_timeout(),
        }
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn send(&self, payload: &str) -> Result<Vec<u8>, Error> {
        let body = envelope(payload);
        debug!("Sending SOAP request to socket {:?}", self.path);

        let mut stream = timeout(self.timeout, UnixStream::connect(&self.path))
            .await
            .map_err(|_| Error::Timeout(format!("connecting to socket {:?}", self.path)))?
            .map_err(|err| Error::IoPathError(self.path.clone(), "connecting to socket", err))?;

        timeout(self.timeout, async {
            stream.write_all(body.as_bytes()).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout("writing the request to the socket".to_string()))?
        .map_err(|err| Error::IoError("writing the request to the socket".to_string(), err))?;

        let response = timeout(self.timeout, read_http_response(&mut stream))
            .await
            .map_err(|_| Error::Timeout("reading the response from the socket".to_string()))??;

        if !(200..300).contains(&response.status) {
            return Err(Error::UnexpectedStatus(response.status));
        }

        Ok(response.body)
    }

    fn set_client_auth(&self, _auth: ClientAuth) -> Result<(), Error> {
        Err(Error::InvalidUsage(
            "client certificates require an https transport".to_string(),
        ))
    }
}

struct RawResponse {
    status: u16,
    body: Vec<u8>,
}

/// Read one HTTP/1.x response off a raw stream.
///
/// Understands Content-Length delimited bodies and falls back to
/// read-until-close without one. Chunked transfer encoding is not spoken by
/// the server and rejected.
async fn read_http_response<S>(stream: &mut S) -> Result<RawResponse, Error>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(position) = find_subsequence(&buffer, b"\r\n\r\n") {
            break position;
        }
        if buffer.len() > MAX_HEADER_SIZE {
            return Err(Error::Connection("Oversized response header.".to_string()));
        }

        let received = stream
            .read(&mut chunk)
            .await
            .map_err(|err| Error::IoError("reading response headers".to_string(), err))?;
        if received == 0 {
            return Err(Error::Connection(
                "Connection went away while reading response headers.".to_string(),
            ));
        }
        buffer.extend_from_slice(&chunk[..received]);
    };

    let head = std::str::from_utf8(&buffer[..header_end])
        .map_err(|_| Error::Connection("Response header is not valid UTF-8.".to_string()))?;
    let mut lines = head.split("\r\n");
    let status = parse_status_line(lines.next().unwrap_or_default())?;

    let mut content_length: Option<usize> = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = Some(value.parse().map_err(|_| {
                Error::Connection(format!("Invalid Content-Length header: {value}"))
            })?);
        } else if name.eq_ignore_ascii_case("transfer-encoding")
            && value.eq_ignore_ascii_case("chunked")
        {
            return Err(Error::Connection(
                "Chunked response framing is not supported on the socket transport.".to_string(),
            ));
        }
    }

    let mut body = buffer[header_end + 4..].to_vec();
    match content_length {
        Some(length) => {
            while body.len() < length {
                let received = stream
                    .read(&mut chunk)
                    .await
                    .map_err(|err| Error::IoError("reading the response body".to_string(), err))?;
                if received == 0 {
                    return Err(Error::Connection(
                        "Connection went away while receiving the response body.".to_string(),
                    ));
                }
                body.extend_from_slice(&chunk[..received]);
            }
            body.truncate(length);
        }
        None => loop {
            // Without a length the peer signals the end by closing.
            let received = stream
                .read(&mut chunk)
                .await
                .map_err(|err| Error::IoError("reading the response body".to_string(), err))?;
            if received == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..received]);
        },
    }

    Ok(RawResponse { status, body })
}

fn parse_status_line(line: &str) -> Result<u16, Error> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(Error::Connection(format!("Malformed status line: {line}")));
    }

    parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| Error::Connection(format!("Malformed status line: {line}")))
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
